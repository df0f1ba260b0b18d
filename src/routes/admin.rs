use crate::helper::{admin_helpers, public_helpers, sanitization_helpers};
use crate::middleware::AuthenticatedUser;
use crate::models::authority;
use crate::models::db_operations::{site_db_operations, users_db_operations};
use crate::models::Profile;
use crate::routes::{admin_error_response, ApiResponse};
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct CreateUserRequest {
    username: String,
    password: String,
    role: String,
}

#[derive(Deserialize)]
struct UpdateRoleRequest {
    user_id: i64,
    role: String,
}

#[derive(Deserialize)]
struct BanRequest {
    user_id: i64,
    banned: bool,
    reason: Option<String>,
}

#[derive(Deserialize)]
struct DeactivateRequest {
    user_id: i64,
}

#[derive(Deserialize)]
struct CreateRoleRequest {
    name: String,
    description: Option<String>,
}

#[derive(Deserialize)]
struct PageUpsertRequest {
    slug: String,
    title_en: String,
    #[serde(default)]
    title_ne: String,
    #[serde(default)]
    body_en: String,
    #[serde(default)]
    body_ne: String,
}

#[derive(Deserialize)]
struct PressRequest {
    title_en: String,
    #[serde(default)]
    title_ne: String,
    #[serde(default)]
    body_en: String,
    #[serde(default)]
    body_ne: String,
}

#[derive(Deserialize)]
struct CreateChannelRequest {
    name: String,
    description: Option<String>,
}

#[derive(Deserialize)]
struct ArchiveChannelRequest {
    archived: bool,
}

#[derive(Deserialize)]
struct SettingRequest {
    key: String,
    value: String,
}

// --- Route Configuration ---

pub fn config_login(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::post().to(handle_admin_login))
        .route("/logout", web::post().to(handle_admin_logout));
}

pub fn config_portal(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/users", web::get().to(list_users))
            .route("/users", web::post().to(create_user_action))
            .route("/users/role", web::post().to(update_role_action))
            .route("/users/ban", web::post().to(toggle_ban_action))
            .route("/users/deactivate", web::post().to(deactivate_user_action))
            .route("/roles", web::get().to(list_roles))
            .route("/roles", web::post().to(create_role_action))
            .route("/roles/{name}/delete", web::post().to(delete_role_action))
            .route("/pages", web::get().to(list_pages))
            .route("/pages", web::post().to(upsert_page_action))
            .route("/press", web::post().to(create_press_action))
            .route("/press/{id}/update", web::post().to(update_press_action))
            .route("/press/{id}/delete", web::post().to(delete_press_action))
            .route("/channels", web::get().to(list_all_channels))
            .route("/channels", web::post().to(create_channel_action))
            .route("/channels/{id}/archive", web::post().to(archive_channel_action))
            .route("/settings", web::get().to(get_settings))
            .route("/settings", web::post().to(update_setting_action)),
    );
}

// --- Utilities ---

fn get_conn(
    pool: &web::Data<crate::DbPool>,
) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>, HttpResponse> {
    pool.get().map_err(|e| {
        log::error!("Database pool error on management action: {}", e);
        HttpResponse::InternalServerError()
            .json(json!({ "success": false, "error": "A database connection error occurred." }))
    })
}

fn get_current_user(
    auth_user: &AuthenticatedUser,
    conn: &rusqlite::Connection,
) -> Result<Profile, HttpResponse> {
    users_db_operations::read_user_by_username(conn, &auth_user.username).ok_or_else(|| {
        HttpResponse::InternalServerError()
            .json(json!({ "success": false, "error": "Authenticated user not found." }))
    })
}

fn forbidden(msg: &str) -> HttpResponse {
    HttpResponse::Forbidden().json(json!({ "success": false, "error": msg }))
}

// --- Login/Logout Handlers ---

async fn handle_admin_login(
    session: Session,
    pool: web::Data<crate::DbPool>,
    payload: web::Json<LoginRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match public_helpers::verify_member_credentials(&conn, &payload.username, &payload.password) {
        Some(profile) if authority::is_staff(&profile.role) => {
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
        Some(_) => forbidden("Access denied. This portal is for management roles only."),
        None => HttpResponse::Unauthorized().json(json!({
            "success": false,
            "error": "Invalid credentials or account suspended."
        })),
    }
}

async fn handle_admin_logout(session: Session) -> impl Responder {
    session.purge();
    HttpResponse::Ok().json(json!({ "success": true }))
}

// --- User administration ---

async fn list_users(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match admin_helpers::fetch_all_users(&conn, &actor) {
        Ok(users) => HttpResponse::Ok().json(ApiResponse::ok(users)),
        Err(e) => admin_error_response(e),
    }
}

async fn create_user_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    payload: web::Json<CreateUserRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match admin_helpers::create_new_user(
        &conn,
        &actor,
        &payload.username,
        &payload.password,
        &payload.role,
    ) {
        Ok(user_id) => HttpResponse::Ok().json(json!({ "success": true, "user_id": user_id })),
        Err(admin_helpers::AdminHelperError::Database(e)) => {
            log::error!("Failed to create user '{}': {}", payload.username, e);
            HttpResponse::BadRequest()
                .json(json!({ "success": false, "error": "Username already exists." }))
        }
        Err(e) => admin_error_response(e),
    }
}

async fn update_role_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    payload: web::Json<UpdateRoleRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match admin_helpers::update_user_role(&conn, &actor, payload.user_id, &payload.role) {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true, "message": "Role updated." })),
        Err(e) => admin_error_response(e),
    }
}

async fn toggle_ban_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    payload: web::Json<BanRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match admin_helpers::toggle_ban(
        &conn,
        &actor,
        payload.user_id,
        payload.banned,
        payload.reason.as_deref(),
    ) {
        Ok(()) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": if payload.banned { "User banned." } else { "User unbanned." }
        })),
        Err(e) => admin_error_response(e),
    }
}

async fn deactivate_user_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    payload: web::Json<DeactivateRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match admin_helpers::deactivate_user(&conn, &actor, payload.user_id) {
        Ok(()) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "User deactivated. Their published content remains."
        })),
        Err(e) => admin_error_response(e),
    }
}

// --- Role administration ---

async fn list_roles(pool: web::Data<crate::DbPool>) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match admin_helpers::fetch_all_roles(&conn) {
        Ok(roles) => HttpResponse::Ok().json(ApiResponse::ok(roles)),
        Err(e) => admin_error_response(e),
    }
}

async fn create_role_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    payload: web::Json<CreateRoleRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match admin_helpers::create_role(&conn, &actor, &payload.name, payload.description.as_deref())
    {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true, "message": "Role created." })),
        Err(e) => admin_error_response(e),
    }
}

async fn delete_role_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    path: web::Path<String>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    match admin_helpers::delete_role(&conn, &actor, &path) {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true, "message": "Role deleted." })),
        Err(e) => admin_error_response(e),
    }
}

// --- CMS pages ---

async fn list_pages(pool: web::Data<crate::DbPool>) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match site_db_operations::list_pages(&conn) {
        Ok(pages) => HttpResponse::Ok().json(ApiResponse::ok(pages)),
        Err(e) => {
            log::error!("Failed to list pages: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to retrieve pages."))
        }
    }
}

async fn upsert_page_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    payload: web::Json<PageUpsertRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    // Page editing is deliberately withheld from central_committee even though
    // that role manages press releases.
    if !authority::can_manage_cms(&actor.role) {
        return forbidden("Your role may not edit site pages.");
    }

    let slug = payload.slug.trim();
    if slug.is_empty()
        || !slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "Page slugs use lowercase letters, digits, and hyphens."
        }));
    }
    let title_en = sanitization_helpers::strip_all_html(payload.title_en.trim());
    if title_en.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "A page title is required." }));
    }

    match site_db_operations::upsert_page(
        &conn,
        slug,
        &title_en,
        &sanitization_helpers::strip_all_html(payload.title_ne.trim()),
        &sanitization_helpers::sanitize_markdown_content(&payload.body_en),
        &sanitization_helpers::sanitize_markdown_content(&payload.body_ne),
        actor.id,
    ) {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true, "message": "Page saved." })),
        Err(e) => {
            log::error!("Failed to save page '{}': {}", slug, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to save page."))
        }
    }
}

// --- Press releases ---

async fn create_press_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    payload: web::Json<PressRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !authority::can_manage_press_releases(&actor.role) {
        return forbidden("Your role may not manage press releases.");
    }
    let title_en = sanitization_helpers::strip_all_html(payload.title_en.trim());
    if title_en.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "A title is required." }));
    }

    match site_db_operations::create_press_release(
        &conn,
        &title_en,
        &sanitization_helpers::strip_all_html(payload.title_ne.trim()),
        &sanitization_helpers::sanitize_markdown_content(&payload.body_en),
        &sanitization_helpers::sanitize_markdown_content(&payload.body_ne),
        actor.id,
    ) {
        Ok(id) => HttpResponse::Ok().json(json!({ "success": true, "press_id": id })),
        Err(e) => {
            log::error!("Failed to create press release: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to create press release."))
        }
    }
}

async fn update_press_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    path: web::Path<String>,
    payload: web::Json<PressRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !authority::can_manage_press_releases(&actor.role) {
        return forbidden("Your role may not manage press releases.");
    }
    let title_en = sanitization_helpers::strip_all_html(payload.title_en.trim());
    if title_en.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "A title is required." }));
    }

    match site_db_operations::update_press_release(
        &conn,
        &path,
        &title_en,
        &sanitization_helpers::strip_all_html(payload.title_ne.trim()),
        &sanitization_helpers::sanitize_markdown_content(&payload.body_en),
        &sanitization_helpers::sanitize_markdown_content(&payload.body_ne),
    ) {
        Ok(0) => HttpResponse::NotFound()
            .json(json!({ "success": false, "error": "Press release not found." })),
        Ok(_) => HttpResponse::Ok().json(json!({ "success": true, "message": "Press release updated." })),
        Err(e) => {
            log::error!("Failed to update press release {}: {}", path, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to update press release."))
        }
    }
}

async fn delete_press_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    path: web::Path<String>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !authority::can_manage_press_releases(&actor.role) {
        return forbidden("Your role may not manage press releases.");
    }
    match site_db_operations::delete_press_release(&conn, &path) {
        Ok(0) => HttpResponse::NotFound()
            .json(json!({ "success": false, "error": "Press release not found." })),
        Ok(_) => HttpResponse::Ok().json(json!({ "success": true, "message": "Press release deleted." })),
        Err(e) => {
            log::error!("Failed to delete press release {}: {}", path, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to delete press release."))
        }
    }
}

// --- Channels ---

async fn list_all_channels(pool: web::Data<crate::DbPool>) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match site_db_operations::list_channels(&conn, true) {
        Ok(channels) => HttpResponse::Ok().json(ApiResponse::ok(channels)),
        Err(e) => {
            log::error!("Failed to list channels: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to retrieve channels."))
        }
    }
}

async fn create_channel_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    payload: web::Json<CreateChannelRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !authority::can_manage_channels(&actor.role) {
        return forbidden("Your role may not manage channels.");
    }
    let name = sanitization_helpers::strip_all_html(payload.name.trim());
    if name.is_empty() {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "A channel name is required." }));
    }

    match site_db_operations::create_channel(&conn, &name, payload.description.as_deref(), actor.id)
    {
        Ok(id) => HttpResponse::Ok().json(json!({ "success": true, "channel_id": id })),
        Err(e) => {
            log::error!("Failed to create channel '{}': {}", name, e);
            HttpResponse::BadRequest()
                .json(json!({ "success": false, "error": "Channel name already exists." }))
        }
    }
}

async fn archive_channel_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    path: web::Path<String>,
    payload: web::Json<ArchiveChannelRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !authority::can_manage_channels(&actor.role) {
        return forbidden("Your role may not manage channels.");
    }
    match site_db_operations::set_channel_archived(&conn, &path, payload.archived) {
        Ok(0) => HttpResponse::NotFound()
            .json(json!({ "success": false, "error": "Channel not found." })),
        Ok(_) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(e) => {
            log::error!("Failed to archive channel {}: {}", path, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to update channel."))
        }
    }
}

// --- Settings ---

async fn get_settings(pool: web::Data<crate::DbPool>) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let default_page_size =
        users_db_operations::read_setting(&conn, "default_page_size").unwrap_or_default();
    let press_contact_email =
        users_db_operations::read_setting(&conn, "press_contact_email").unwrap_or_default();
    HttpResponse::Ok().json(json!({
        "success": true,
        "settings": {
            "default_page_size": default_page_size,
            "press_contact_email": press_contact_email,
        }
    }))
}

async fn update_setting_action(
    auth_user: AuthenticatedUser,
    pool: web::Data<crate::DbPool>,
    payload: web::Json<SettingRequest>,
) -> impl Responder {
    let conn = match get_conn(&pool) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let actor = match get_current_user(&auth_user, &conn) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if !authority::can_manage_cms(&actor.role) {
        return forbidden("Your role may not change site settings.");
    }
    if !matches!(payload.key.as_str(), "default_page_size" | "press_contact_email") {
        return HttpResponse::BadRequest()
            .json(json!({ "success": false, "error": "Unknown setting key." }));
    }
    if payload.key == "default_page_size" && payload.value.parse::<u32>().is_err() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "default_page_size must be a whole number."
        }));
    }

    match users_db_operations::update_setting(&conn, &payload.key, payload.value.trim()) {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true, "message": "Setting updated." })),
        Err(e) => {
            log::error!("Failed to update setting '{}': {}", payload.key, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::err("Failed to update setting."))
        }
    }
}
