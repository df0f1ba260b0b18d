use crate::helper::public_helpers;
use crate::models::ContentKind;
use crate::routes::ApiResponse;
use actix_web::{web, HttpResponse, Responder};
use redb::Database;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct FeedQuery {
    kind: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/is_server_active", web::get().to(is_server_active))
            .route("/content/latest", web::get().to(get_latest_content))
            .route("/content/{id}", web::get().to(get_content_by_id))
            .route("/press/latest", web::get().to(get_latest_press_releases))
            .route("/press/{id}", web::get().to(get_press_release_by_id))
            .route("/pages/{slug}", web::get().to(get_page_by_slug)),
    );
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

async fn get_latest_content(
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
    query: web::Query<FeedQuery>,
) -> impl Responder {
    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on public feed: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    let kind = match query.kind.as_deref() {
        Some(raw) => match ContentKind::parse(raw) {
            Some(kind) => Some(kind),
            None => {
                return HttpResponse::BadRequest()
                    .json(ApiResponse::<()>::err(format!("Unknown kind '{}'.", raw)))
            }
        },
        None => None,
    };

    let limit = query
        .limit
        .unwrap_or_else(|| public_helpers::default_page_size(&conn));
    let offset = query.offset.unwrap_or(0);

    match public_helpers::fetch_latest_public_content(&conn, &db, kind, limit, offset) {
        Ok(items) => HttpResponse::Ok().json(items),
        Err(e) => {
            log::error!("Failed to fetch latest public content: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn get_content_by_id(
    id: web::Path<String>,
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
) -> impl Responder {
    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on public content read: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    match public_helpers::fetch_public_content_item(&conn, &db, &id) {
        Ok(Some(item)) => HttpResponse::Ok().json(item),
        Ok(None) => HttpResponse::NotFound().body("Content not found"),
        Err(e) => {
            log::error!("Failed to fetch content item {}: {}", id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn get_latest_press_releases(
    pool: web::Data<crate::DbPool>,
    query: web::Query<FeedQuery>,
) -> impl Responder {
    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on press listing: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };
    let limit = query
        .limit
        .unwrap_or_else(|| public_helpers::default_page_size(&conn));
    let offset = query.offset.unwrap_or(0);

    match public_helpers::fetch_latest_press_releases(&conn, limit, offset) {
        Ok(releases) => HttpResponse::Ok().json(releases),
        Err(e) => {
            log::error!("Failed to fetch press releases: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn get_press_release_by_id(
    id: web::Path<String>,
    pool: web::Data<crate::DbPool>,
) -> impl Responder {
    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on press read: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };
    match public_helpers::fetch_press_release(&conn, &id) {
        Ok(Some(release)) => HttpResponse::Ok().json(release),
        Ok(None) => HttpResponse::NotFound().body("Press release not found"),
        Err(e) => {
            log::error!("Failed to fetch press release {}: {}", id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn get_page_by_slug(
    slug: web::Path<String>,
    pool: web::Data<crate::DbPool>,
) -> impl Responder {
    let conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Database pool error on page read: {}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };
    match public_helpers::fetch_page(&conn, &slug) {
        Ok(Some(page)) => HttpResponse::Ok().json(page),
        Ok(None) => HttpResponse::NotFound().body("Page not found"),
        Err(e) => {
            log::error!("Failed to fetch page '{}': {}", slug, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
