use crate::models::db_operations::{content_db_operations, site_db_operations, users_db_operations};
use crate::models::{
    ContentItem, ContentKind, ContentStatus, FullContentItem, Page, PressRelease, Profile,
    Visibility,
};
use redb::Database;
use rusqlite::Connection;

pub fn verify_member_credentials(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Option<Profile> {
    users_db_operations::verify_credentials(conn, username, password)
}

/// Latest publicly visible published content, newest first.
pub fn fetch_latest_public_content(
    conn: &Connection,
    db: &Database,
    kind: Option<ContentKind>,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContentItem>, content_db_operations::DbError> {
    content_db_operations::read_latest_published(
        conn,
        db,
        &[Visibility::Public],
        kind,
        limit,
        offset,
    )
}

/// A single item for an anonymous reader: published and public, or nothing.
pub fn fetch_public_content_item(
    conn: &Connection,
    db: &Database,
    id: &str,
) -> Result<Option<FullContentItem>, content_db_operations::DbError> {
    let item = match content_db_operations::read_item(conn, id)? {
        Some(item) => item,
        None => return Ok(None),
    };
    if item.status != ContentStatus::Published || item.visibility != Visibility::Public {
        return Ok(None);
    }
    let body = content_db_operations::read_body(db, id)?.unwrap_or_default();
    Ok(Some(FullContentItem { item, body }))
}

pub fn fetch_latest_press_releases(
    conn: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<PressRelease>, rusqlite::Error> {
    site_db_operations::read_latest_press_releases(conn, limit, offset)
}

pub fn fetch_press_release(
    conn: &Connection,
    id: &str,
) -> Result<Option<PressRelease>, rusqlite::Error> {
    site_db_operations::read_press_release(conn, id)
}

pub fn fetch_page(conn: &Connection, slug: &str) -> Result<Option<Page>, rusqlite::Error> {
    site_db_operations::read_page(conn, slug)
}

pub fn default_page_size(conn: &Connection) -> u32 {
    users_db_operations::read_setting(conn, "default_page_size")
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(10)
}
