use crate::models::{Channel, ChannelMessage, Page, PressRelease};
use chrono::Utc;
use rusqlite::{params, Connection, Error as RusqliteError, OptionalExtension};
use uuid::Uuid;

// --- CMS pages ---

pub fn upsert_page(
    conn: &Connection,
    slug: &str,
    title_en: &str,
    title_ne: &str,
    body_en: &str,
    body_ne: &str,
    updated_by: i64,
) -> Result<(), RusqliteError> {
    let updated_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR REPLACE INTO pages (slug, title_en, title_ne, body_en, body_ne, updated_by, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![slug, title_en, title_ne, body_en, body_ne, updated_by, updated_at],
    )?;
    Ok(())
}

pub fn read_page(conn: &Connection, slug: &str) -> Result<Option<Page>, RusqliteError> {
    conn.query_row(
        "SELECT slug, title_en, title_ne, body_en, body_ne, updated_by, updated_at
         FROM pages WHERE slug = ?1",
        [slug],
        |row| {
            Ok(Page {
                slug: row.get(0)?,
                title_en: row.get(1)?,
                title_ne: row.get(2)?,
                body_en: row.get(3)?,
                body_ne: row.get(4)?,
                updated_by: row.get(5)?,
                updated_at: row.get(6)?,
            })
        },
    )
    .optional()
}

pub fn list_pages(conn: &Connection) -> Result<Vec<Page>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT slug, title_en, title_ne, body_en, body_ne, updated_by, updated_at
         FROM pages ORDER BY slug",
    )?;
    let iter = stmt.query_map([], |row| {
        Ok(Page {
            slug: row.get(0)?,
            title_en: row.get(1)?,
            title_ne: row.get(2)?,
            body_en: row.get(3)?,
            body_ne: row.get(4)?,
            updated_by: row.get(5)?,
            updated_at: row.get(6)?,
        })
    })?;
    Ok(iter.filter_map(|p| p.ok()).collect())
}

// --- Press releases ---

pub fn create_press_release(
    conn: &Connection,
    title_en: &str,
    title_ne: &str,
    body_en: &str,
    body_ne: &str,
    created_by: i64,
) -> Result<String, RusqliteError> {
    let id = Uuid::new_v4().to_string();
    let released_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO press_releases (id, title_en, title_ne, body_en, body_ne, released_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![id, title_en, title_ne, body_en, body_ne, released_at, created_by],
    )?;
    Ok(id)
}

pub fn update_press_release(
    conn: &Connection,
    id: &str,
    title_en: &str,
    title_ne: &str,
    body_en: &str,
    body_ne: &str,
) -> Result<usize, RusqliteError> {
    conn.execute(
        "UPDATE press_releases SET title_en = ?1, title_ne = ?2, body_en = ?3, body_ne = ?4
         WHERE id = ?5",
        params![title_en, title_ne, body_en, body_ne, id],
    )
}

pub fn delete_press_release(conn: &Connection, id: &str) -> Result<usize, RusqliteError> {
    conn.execute("DELETE FROM press_releases WHERE id = ?1", [id])
}

fn press_from_row(row: &rusqlite::Row) -> rusqlite::Result<PressRelease> {
    Ok(PressRelease {
        id: row.get(0)?,
        title_en: row.get(1)?,
        title_ne: row.get(2)?,
        body_en: row.get(3)?,
        body_ne: row.get(4)?,
        released_at: row.get(5)?,
        created_by: row.get(6)?,
    })
}

pub fn read_press_release(conn: &Connection, id: &str) -> Result<Option<PressRelease>, RusqliteError> {
    conn.query_row(
        "SELECT id, title_en, title_ne, body_en, body_ne, released_at, created_by
         FROM press_releases WHERE id = ?1",
        [id],
        press_from_row,
    )
    .optional()
}

pub fn read_latest_press_releases(
    conn: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<PressRelease>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, title_en, title_ne, body_en, body_ne, released_at, created_by
         FROM press_releases ORDER BY released_at DESC LIMIT ?1 OFFSET ?2",
    )?;
    let iter = stmt.query_map(params![limit, offset], press_from_row)?;
    Ok(iter.filter_map(|p| p.ok()).collect())
}

// --- Channels ---

pub fn create_channel(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    created_by: i64,
) -> Result<String, RusqliteError> {
    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO channels (id, name, description, created_by, is_archived, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![id, name, description, created_by, created_at],
    )?;
    Ok(id)
}

pub fn set_channel_archived(
    conn: &Connection,
    id: &str,
    archived: bool,
) -> Result<usize, RusqliteError> {
    conn.execute(
        "UPDATE channels SET is_archived = ?1 WHERE id = ?2",
        params![archived, id],
    )
}

fn channel_from_row(row: &rusqlite::Row) -> rusqlite::Result<Channel> {
    Ok(Channel {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_by: row.get(3)?,
        is_archived: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn read_channel(conn: &Connection, id: &str) -> Result<Option<Channel>, RusqliteError> {
    conn.query_row(
        "SELECT id, name, description, created_by, is_archived, created_at
         FROM channels WHERE id = ?1",
        [id],
        channel_from_row,
    )
    .optional()
}

pub fn list_channels(conn: &Connection, include_archived: bool) -> Result<Vec<Channel>, RusqliteError> {
    let sql = if include_archived {
        "SELECT id, name, description, created_by, is_archived, created_at FROM channels ORDER BY name"
    } else {
        "SELECT id, name, description, created_by, is_archived, created_at FROM channels
         WHERE is_archived = 0 ORDER BY name"
    };
    let mut stmt = conn.prepare(sql)?;
    let iter = stmt.query_map([], channel_from_row)?;
    Ok(iter.filter_map(|c| c.ok()).collect())
}

pub fn post_channel_message(
    conn: &Connection,
    channel_id: &str,
    author_id: i64,
    body: &str,
) -> Result<i64, RusqliteError> {
    let created_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO channel_messages (channel_id, author_id, body, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![channel_id, author_id, body, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_channel_messages(
    conn: &Connection,
    channel_id: &str,
    limit: u32,
    offset: u32,
) -> Result<Vec<ChannelMessage>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.channel_id, m.author_id, p.username, m.body, m.created_at
         FROM channel_messages m JOIN profiles p ON p.id = m.author_id
         WHERE m.channel_id = ?1 ORDER BY m.id DESC LIMIT ?2 OFFSET ?3",
    )?;
    let iter = stmt.query_map(params![channel_id, limit, offset], |row| {
        Ok(ChannelMessage {
            id: row.get(0)?,
            channel_id: row.get(1)?,
            author_id: row.get(2)?,
            author_name: row.get(3)?,
            body: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;
    Ok(iter.filter_map(|m| m.ok()).collect())
}
