use crate::helper::{notification_helpers, public_helpers, sanitization_helpers, workflow_helpers};
use crate::middleware::AuthenticatedUser;
use crate::models::db_operations::{site_db_operations, users_db_operations};
use crate::models::{ContentKind, Profile};
use crate::routes::{workflow_error_response, ApiResponse};
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use redb::Database;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct CreateContentRequest {
    #[serde(flatten)]
    draft: workflow_helpers::ContentDraft,
    /// When set, the item is submitted for review in the same request.
    reviewer_id: Option<i64>,
}

#[derive(Deserialize)]
struct SubmitRequest {
    reviewer_id: i64,
}

#[derive(Deserialize)]
struct RejectRequest {
    reason: String,
}

#[derive(Deserialize)]
struct MessageRequest {
    body: String,
}

#[derive(Deserialize)]
struct PaginationQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Deserialize)]
struct FeedQuery {
    kind: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Serialize)]
struct ReviewerInfo {
    id: i64,
    username: String,
}

// --- Route Configuration ---

pub fn config_login(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::post().to(handle_member_login))
        .route("/logout", web::post().to(handle_member_logout));
}

pub fn config_workspace(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/me", web::get().to(get_me))
            .route("/feed", web::get().to(get_member_feed))
            .route("/reviewers", web::get().to(get_reviewers))
            .route("/content", web::post().to(create_content_action))
            .route("/content/{id}", web::get().to(get_content_details))
            .route("/content/{id}/update", web::post().to(update_content_action))
            .route("/content/{id}/submit", web::post().to(submit_content_action))
            .route("/content/{id}/delete", web::post().to(delete_content_action))
            .route("/mine", web::get().to(get_my_content))
            .route("/review/queue", web::get().to(get_review_queue))
            .route("/review/{id}/approve", web::post().to(approve_content_action))
            .route("/review/{id}/reject", web::post().to(reject_content_action))
            .route("/notifications", web::get().to(get_notifications))
            .route("/notifications/unread_count", web::get().to(get_unread_count))
            .route("/notifications/{id}/read", web::post().to(mark_notification_read))
            .route("/channels", web::get().to(get_channels))
            .route("/channels/{id}/messages", web::get().to(get_channel_messages))
            .route("/channels/{id}/messages", web::post().to(post_channel_message)),
    );
}

// --- Utilities ---

fn get_conn(
    pool: &web::Data<crate::DbPool>,
) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>, HttpResponse> {
    pool.get().map_err(|e| {
        log::error!("Database pool error: {}", e);
        HttpResponse::InternalServerError()
            .json(json!({ "success": false, "error": "A database connection error occurred." }))
    })
}

/// Resolves the session identity to a live profile. A ban takes effect on the
/// next request even if the session cookie is still around.
fn get_current_user(
    auth_user: &AuthenticatedUser,
    conn: &rusqlite::Connection,
) -> Result<Profile, HttpResponse> {
    let profile = users_db_operations::read_user_by_username(conn, &auth_user.username)
        .ok_or_else(|| {
            HttpResponse::InternalServerError()
                .json(json!({ "success": false, "error": "Authenticated user not found." }))
        })?;
    if profile.is_banned {
        return Err(HttpResponse::Forbidden()
            .json(json!({ "success": false, "error": "This account is suspended." })));
    }
    Ok(profile)
}

fn paginate(page: Option<u32>, limit: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10);
    (limit, (page - 1) * limit)
}

// --- Login/Logout Handlers ---

async fn handle_member_login(
    session: Session,
    pool: web::Data<crate::DbPool>,
    payload: web::Json<LoginRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match public_helpers::verify_member_credentials(&conn, &payload.username, &payload.password) {
        Some(profile) => {
            if session.insert("username", profile.username.clone()).is_err()
                || session.insert("role", profile.role.clone()).is_err()
            {
                return HttpResponse::InternalServerError()
                    .json(json!({ "success": false, "error": "Failed to establish a session." }));
            }
            users_db_operations::update_last_login_time(&conn, &profile.username).ok();
            HttpResponse::Ok().json(json!({
                "success": true,
                "username": profile.username,
                "role": profile.role
            }))
        }
        None => HttpResponse::Unauthorized().json(json!({
            "success": false,
            "error": "Invalid credentials or account suspended."
        })),
    }
}

async fn handle_member_logout(session: Session) -> impl Responder {
    session.clear();
    HttpResponse::Ok().json(json!({ "success": true }))
}

// --- Profile / feed ---

async fn get_me(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let unread = notification_helpers::fetch_unread_count(&conn, user.id).unwrap_or(0);
    HttpResponse::Ok().json(json!({ "success": true, "profile": user, "unread_notifications": unread }))
}

async fn get_member_feed(
    auth_user: AuthenticatedUser,
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
    query: web::Query<FeedQuery>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
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
    let (limit, offset) = paginate(query.page, query.limit);

    match workflow_helpers::fetch_feed_for_actor(&db, &conn, &user, kind, limit, offset) {
        Ok(items) => HttpResponse::Ok().json(ApiResponse::ok(items)),
        Err(e) => workflow_error_response(e),
    }
}

/// Directory of profiles an author may pick a reviewer from.
async fn get_reviewers(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = get_current_user(&auth_user, &conn) {
        return resp;
    }
    match users_db_operations::read_reviewers(&conn) {
        Ok(reviewers) => {
            let listing: Vec<ReviewerInfo> = reviewers
                .into_iter()
                .map(|p| ReviewerInfo {
                    id: p.id,
                    username: p.username,
                })
                .collect();
            HttpResponse::Ok().json(ApiResponse::ok(listing))
        }
        Err(e) => {
            log::error!("Failed to list reviewers: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to retrieve reviewers."))
        }
    }
}

// --- Content Handlers ---

async fn create_content_action(
    auth_user: AuthenticatedUser,
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
    payload: web::Json<CreateContentRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let item_id = match workflow_helpers::create_item(&db, &conn, &user, &payload.draft) {
        Ok(id) => id,
        Err(e) => return workflow_error_response(e),
    };

    if let Some(reviewer_id) = payload.reviewer_id {
        if let Err(e) =
            workflow_helpers::submit_for_review(&db, &conn, &user, &item_id, reviewer_id)
        {
            // The draft exists; report the submission failure alongside its id.
            let resp = workflow_error_response(e);
            log::warn!(
                "Item {} was created but immediate submission failed.",
                item_id
            );
            return resp;
        }
    }

    HttpResponse::Ok().json(json!({ "success": true, "item_id": item_id }))
}

async fn get_content_details(
    auth_user: AuthenticatedUser,
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
    path: web::Path<String>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match workflow_helpers::read_item_for_actor(&db, &conn, &user, &path) {
        Ok(full) => HttpResponse::Ok().json(ApiResponse::ok(full)),
        Err(e) => workflow_error_response(e),
    }
}

async fn update_content_action(
    auth_user: AuthenticatedUser,
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
    path: web::Path<String>,
    payload: web::Json<workflow_helpers::ContentDraft>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match workflow_helpers::update_item(&db, &conn, &user, &path, &payload) {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true, "message": "Item updated." })),
        Err(e) => workflow_error_response(e),
    }
}

async fn submit_content_action(
    auth_user: AuthenticatedUser,
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
    path: web::Path<String>,
    payload: web::Json<SubmitRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match workflow_helpers::submit_for_review(&db, &conn, &user, &path, payload.reviewer_id) {
        Ok(()) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Submitted for review."
        })),
        Err(e) => workflow_error_response(e),
    }
}

async fn delete_content_action(
    auth_user: AuthenticatedUser,
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
    path: web::Path<String>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match workflow_helpers::delete_item(&db, &conn, &user, &path) {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true, "message": "Item deleted." })),
        Err(e) => workflow_error_response(e),
    }
}

async fn get_my_content(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    query: web::Query<PaginationQuery>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let (limit, offset) = paginate(query.page, query.limit);
    match workflow_helpers::fetch_own_items(&conn, &user, limit, offset) {
        Ok(items) => HttpResponse::Ok().json(ApiResponse::ok(items)),
        Err(e) => workflow_error_response(e),
    }
}

// --- Review Handlers ---

async fn get_review_queue(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    query: web::Query<PaginationQuery>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let (limit, offset) = paginate(query.page, query.limit);
    match workflow_helpers::fetch_review_queue(&conn, &user, limit, offset) {
        Ok(items) => HttpResponse::Ok().json(ApiResponse::ok(items)),
        Err(e) => workflow_error_response(e),
    }
}

async fn approve_content_action(
    auth_user: AuthenticatedUser,
    db: web::Data<Database>,
    pool: web::Data<crate::DbPool>,
    path: web::Path<String>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match workflow_helpers::approve(&db, &conn, &user, &path) {
        Ok(()) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Item approved and published."
        })),
        Err(e) => workflow_error_response(e),
    }
}

async fn reject_content_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    path: web::Path<String>,
    payload: web::Json<RejectRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match workflow_helpers::reject(&conn, &user, &path, &payload.reason) {
        Ok(()) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Item rejected and returned to its author."
        })),
        Err(e) => workflow_error_response(e),
    }
}

// --- Notification Handlers ---

async fn get_notifications(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    query: web::Query<PaginationQuery>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let (limit, offset) = paginate(query.page, query.limit);
    match notification_helpers::fetch_notifications(&conn, user.id, limit, offset) {
        Ok(notifications) => HttpResponse::Ok().json(ApiResponse::ok(notifications)),
        Err(e) => {
            log::error!("Failed to fetch notifications for user {}: {}", user.id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to retrieve notifications."))
        }
    }
}

async fn get_unread_count(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match notification_helpers::fetch_unread_count(&conn, user.id) {
        Ok(count) => HttpResponse::Ok().json(json!({ "success": true, "unread": count })),
        Err(e) => {
            log::error!("Failed to count notifications for user {}: {}", user.id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to count notifications."))
        }
    }
}

async fn mark_notification_read(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    path: web::Path<i64>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match notification_helpers::mark_notification_read(&conn, user.id, *path) {
        Ok(true) => HttpResponse::Ok().json(json!({ "success": true })),
        Ok(false) => HttpResponse::NotFound()
            .json(json!({ "success": false, "error": "Notification not found." })),
        Err(e) => {
            log::error!("Failed to mark notification {} read: {}", path, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to update notification."))
        }
    }
}

// --- Channel Handlers ---

async fn get_channels(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = get_current_user(&auth_user, &conn) {
        return resp;
    }
    match site_db_operations::list_channels(&conn, false) {
        Ok(channels) => HttpResponse::Ok().json(ApiResponse::ok(channels)),
        Err(e) => {
            log::error!("Failed to list channels: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to retrieve channels."))
        }
    }
}

async fn get_channel_messages(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    path: web::Path<String>,
    query: web::Query<PaginationQuery>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = get_current_user(&auth_user, &conn) {
        return resp;
    }
    let (limit, offset) = paginate(query.page, query.limit);
    match site_db_operations::read_channel_messages(&conn, &path, limit, offset) {
        Ok(messages) => HttpResponse::Ok().json(ApiResponse::ok(messages)),
        Err(e) => {
            log::error!("Failed to fetch messages for channel {}: {}", path, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to retrieve messages."))
        }
    }
}

async fn post_channel_message(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    path: web::Path<String>,
    payload: web::Json<MessageRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let user = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let body = sanitization_helpers::sanitize_markdown_content(payload.body.trim());
    if body.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "Message body cannot be empty." }));
    }

    let channel = match site_db_operations::read_channel(&conn, &path) {
        Ok(Some(channel)) => channel,
        Ok(None) => {
            return HttpResponse::NotFound()
                .json(json!({ "success": false, "error": "Channel not found." }))
        }
        Err(e) => {
            log::error!("Failed to read channel {}: {}", path, e);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to read channel."));
        }
    };
    if channel.is_archived {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "This channel is archived." }));
    }

    match site_db_operations::post_channel_message(&conn, &channel.id, user.id, &body) {
        Ok(id) => HttpResponse::Ok().json(json!({ "success": true, "message_id": id })),
        Err(e) => {
            log::error!("Failed to post message to channel {}: {}", channel.id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to post message."))
        }
    }
}
