use crate::models::{ContentBody, ContentItem, ContentKind, ContentStatus, Visibility};
use chrono::{DateTime, Utc};
use redb::{
    CommitError, Database, ReadableTable, StorageError, TableDefinition, TableError,
    TransactionError,
};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Redb storage error: {0}")]
    RedbStorage(#[from] StorageError),
    #[error("Redb transaction error: {0}")]
    RedbTransaction(#[from] TransactionError),
    #[error("Redb table error: {0}")]
    RedbTable(#[from] TableError),
    #[error("Redb commit error: {0}")]
    RedbCommit(#[from] CommitError),
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("UUID parse error: {0}")]
    Uuid(#[from] uuid::Error),
    #[error("Timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error("Item not found in database: {0}")]
    NotFound(String),
}

/// Bilingual body payloads, keyed by item UUID, serialized as JSON.
pub const CONTENT_BODIES: TableDefinition<&[u8; 16], &str> =
    TableDefinition::new("content_bodies");

/// Newest-first ordering index over published items. The key stores the
/// negated publication timestamp so a forward range scan yields most recent
/// items first.
pub const PUBLISHED_INDEX: TableDefinition<(i64, &[u8; 16]), ()> =
    TableDefinition::new("published_index");

const ITEM_COLUMNS: &str = "id, kind, title_en, title_ne, author_id, status, visibility, \
     pending_reviewer_id, created_at, updated_at, published_at";

fn bad_column(idx: usize, what: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("invalid {} value '{}'", what, value).into(),
    )
}

fn item_from_row(row: &rusqlite::Row) -> rusqlite::Result<ContentItem> {
    let kind_str: String = row.get(1)?;
    let status_str: String = row.get(5)?;
    let visibility_str: String = row.get(6)?;
    Ok(ContentItem {
        id: row.get(0)?,
        kind: ContentKind::parse(&kind_str).ok_or_else(|| bad_column(1, "kind", &kind_str))?,
        title_en: row.get(2)?,
        title_ne: row.get(3)?,
        author_id: row.get(4)?,
        status: ContentStatus::parse(&status_str)
            .ok_or_else(|| bad_column(5, "status", &status_str))?,
        visibility: Visibility::parse(&visibility_str)
            .ok_or_else(|| bad_column(6, "visibility", &visibility_str))?,
        pending_reviewer_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        published_at: row.get(10)?,
    })
}

fn write_body(db: &Database, id_bytes: &[u8; 16], body: &ContentBody) -> Result<(), DbError> {
    let body_json = serde_json::to_string(body)?;
    let write_txn = db.begin_write()?;
    {
        let mut bodies_table = write_txn.open_table(CONTENT_BODIES)?;
        bodies_table.insert(id_bytes, body_json.as_str())?;
    }
    write_txn.commit()?;
    Ok(())
}

fn published_index_ts(published_at: &str) -> Result<i64, DbError> {
    let ts = DateTime::parse_from_rfc3339(published_at)?.with_timezone(&Utc);
    Ok(-ts.timestamp())
}

// ====================================================================
// ======================== ITEM OPERATIONS ===========================
// ====================================================================

pub fn create_item(
    conn: &Connection,
    db: &Database,
    author_id: i64,
    kind: ContentKind,
    title_en: &str,
    title_ne: &str,
    visibility: Visibility,
    body: &ContentBody,
) -> Result<String, DbError> {
    let item_uuid = Uuid::new_v4();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO content_items (id, kind, title_en, title_ne, author_id, status, visibility, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'draft', ?6, ?7)",
        params![
            item_uuid.to_string(),
            kind.as_str(),
            title_en,
            title_ne,
            author_id,
            visibility.as_str(),
            created_at
        ],
    )?;

    // Body write failure must not leave a ghost row behind.
    if let Err(e) = write_body(db, &item_uuid.into_bytes(), body) {
        log::error!(
            "Body store write failed while creating item {}. Rolling back the record.",
            item_uuid
        );
        conn.execute(
            "DELETE FROM content_items WHERE id = ?1",
            [item_uuid.to_string()],
        )?;
        return Err(e);
    }

    Ok(item_uuid.to_string())
}

pub fn read_item(conn: &Connection, id: &str) -> Result<Option<ContentItem>, DbError> {
    let item = conn
        .query_row(
            &format!("SELECT {} FROM content_items WHERE id = ?1", ITEM_COLUMNS),
            [id],
            item_from_row,
        )
        .optional()?;
    Ok(item)
}

pub fn read_body(db: &Database, id: &str) -> Result<Option<ContentBody>, DbError> {
    let item_uuid = Uuid::parse_str(id)?;
    let id_bytes = item_uuid.into_bytes();

    let read_txn = db.begin_read()?;
    let bodies_table = read_txn.open_table(CONTENT_BODIES)?;

    let result = match bodies_table.get(&id_bytes)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    };
    result
}

pub fn update_item_content(
    conn: &Connection,
    db: &Database,
    id: &str,
    title_en: &str,
    title_ne: &str,
    visibility: Visibility,
    body: &ContentBody,
) -> Result<(), DbError> {
    let updated_at = Utc::now().to_rfc3339();
    let changed = conn.execute(
        "UPDATE content_items SET title_en = ?1, title_ne = ?2, visibility = ?3, updated_at = ?4
         WHERE id = ?5",
        params![title_en, title_ne, visibility.as_str(), updated_at, id],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound(id.to_string()));
    }
    write_body(db, &Uuid::parse_str(id)?.into_bytes(), body)
}

// --- Status writes ---
//
// These writes are deliberately unconditional: the transition guards run at
// read time in the workflow layer, and there is no version column or status
// predicate here. Two reviewers racing on the same submitted item will both
// succeed, and the later write's status prevails (last write wins).

pub fn mark_submitted(conn: &Connection, id: &str, reviewer_id: i64) -> Result<(), DbError> {
    let changed = conn.execute(
        "UPDATE content_items SET status = 'submitted', pending_reviewer_id = ?1 WHERE id = ?2",
        params![reviewer_id, id],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound(id.to_string()));
    }
    Ok(())
}

pub fn mark_drafted(conn: &Connection, id: &str) -> Result<(), DbError> {
    let changed = conn.execute(
        "UPDATE content_items SET status = 'draft', pending_reviewer_id = NULL WHERE id = ?1",
        [id],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound(id.to_string()));
    }
    Ok(())
}

pub fn mark_rejected(conn: &Connection, id: &str) -> Result<(), DbError> {
    let changed = conn.execute(
        "UPDATE content_items SET status = 'rejected', pending_reviewer_id = NULL WHERE id = ?1",
        [id],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound(id.to_string()));
    }
    Ok(())
}

/// Publishes an item: status flip and `published_at` in SQLite first, then the
/// ordering index entry in the content store. If the index write fails the
/// SQLite row is restored to its prior state. `published_at` is set only the
/// first time an item is published; a re-publish after edit + resubmit reuses
/// the original timestamp, which also keeps the index entry unique.
pub fn mark_published(conn: &Connection, db: &Database, id: &str) -> Result<(), DbError> {
    let prior = read_item(conn, id)?.ok_or_else(|| DbError::NotFound(id.to_string()))?;

    let published_at = match &prior.published_at {
        Some(ts) => ts.clone(),
        None => Utc::now().to_rfc3339(),
    };

    conn.execute(
        "UPDATE content_items SET status = 'published', published_at = ?1, pending_reviewer_id = NULL
         WHERE id = ?2",
        params![published_at, id],
    )?;

    let index_result = (|| -> Result<(), DbError> {
        let id_bytes = Uuid::parse_str(id)?.into_bytes();
        let ts = published_index_ts(&published_at)?;
        let write_txn = db.begin_write()?;
        {
            let mut index = write_txn.open_table(PUBLISHED_INDEX)?;
            index.insert((ts, &id_bytes), ())?;
        }
        write_txn.commit()?;
        Ok(())
    })();

    if let Err(e) = index_result {
        log::error!(
            "Published-index write failed while publishing item {}. Restoring prior status '{}'.",
            id,
            prior.status.as_str()
        );
        conn.execute(
            "UPDATE content_items SET status = ?1, published_at = ?2, pending_reviewer_id = ?3
             WHERE id = ?4",
            params![
                prior.status.as_str(),
                prior.published_at,
                prior.pending_reviewer_id,
                id
            ],
        )?;
        return Err(e);
    }

    Ok(())
}

pub fn delete_item(conn: &Connection, db: &Database, id: &str) -> Result<(), DbError> {
    let item = read_item(conn, id)?.ok_or_else(|| DbError::NotFound(id.to_string()))?;
    let id_bytes = Uuid::parse_str(id)?.into_bytes();

    // SQLite first, mirroring the publish ordering.
    conn.execute("DELETE FROM content_items WHERE id = ?1", [id])?;

    let write_txn = db.begin_write()?;
    {
        let mut bodies_table = write_txn.open_table(CONTENT_BODIES)?;
        bodies_table.remove(&id_bytes)?;

        if let Some(published_at) = &item.published_at {
            let mut index = write_txn.open_table(PUBLISHED_INDEX)?;
            index.remove((published_index_ts(published_at)?, &id_bytes))?;
        }
    }
    write_txn.commit()?;
    Ok(())
}

// --- Listings ---

pub fn read_items_by_author(
    conn: &Connection,
    author_id: i64,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContentItem>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM content_items WHERE author_id = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
        ITEM_COLUMNS
    ))?;
    let iter = stmt.query_map(params![author_id, limit, offset], item_from_row)?;
    Ok(iter.filter_map(|i| i.ok()).collect())
}

pub fn read_submitted_items(
    conn: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContentItem>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM content_items WHERE status = 'submitted' ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
        ITEM_COLUMNS
    ))?;
    let iter = stmt.query_map(params![limit, offset], item_from_row)?;
    Ok(iter.filter_map(|i| i.ok()).collect())
}

/// Newest-first published items, walked through the ordering index. Every hit
/// is re-checked against the workflow record: an item that was resubmitted
/// after publication still has an index entry but is no longer servable.
pub fn read_latest_published(
    conn: &Connection,
    db: &Database,
    allowed: &[Visibility],
    kind: Option<ContentKind>,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContentItem>, DbError> {
    let read_txn = db.begin_read()?;
    let index = read_txn.open_table(PUBLISHED_INDEX)?;

    let mut items = Vec::new();
    let mut skipped = 0u32;

    for entry in index.iter()? {
        let (key, _) = entry?;
        let item_uuid = Uuid::from_bytes(*key.value().1);

        let item = match read_item(conn, &item_uuid.to_string())? {
            Some(item) => item,
            None => continue,
        };
        if item.status != ContentStatus::Published || !allowed.contains(&item.visibility) {
            continue;
        }
        if let Some(wanted) = kind {
            if item.kind != wanted {
                continue;
            }
        }
        if skipped < offset {
            skipped += 1;
            continue;
        }
        items.push(item);
        if items.len() as u32 >= limit {
            break;
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::db_operations::users_db_operations;
    use crate::setup::db_setup;
    use redb::backends::InMemoryBackend;

    fn test_stores() -> (Connection, Database) {
        let mut conn = Connection::open_in_memory().expect("in-memory sqlite");
        db_setup::setup_party_db(&mut conn).expect("schema");
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .expect("in-memory redb");
        db_setup::setup_content_db(&db).expect("content schema");
        (conn, db)
    }

    fn make_item(conn: &Connection, db: &Database) -> String {
        let author = users_db_operations::create_user(conn, "lekhak", "pw", "party_member")
            .expect("author");
        create_item(
            conn,
            db,
            author,
            ContentKind::Article,
            "Land reform, explained",
            "",
            Visibility::Public,
            &ContentBody {
                body_en: "Full text".into(),
                ..ContentBody::default()
            },
        )
        .expect("item")
    }

    #[test]
    fn create_and_read_round_trip() {
        let (conn, db) = test_stores();
        let id = make_item(&conn, &db);

        let item = read_item(&conn, &id).unwrap().unwrap();
        assert_eq!(item.status, ContentStatus::Draft);
        assert_eq!(item.title_en, "Land reform, explained");
        assert!(item.published_at.is_none());

        let body = read_body(&db, &id).unwrap().unwrap();
        assert_eq!(body.body_en, "Full text");
    }

    // Documents the current (known, accepted) behavior under racing reviewers:
    // status writes carry no predicate, so both a publish and a reject against
    // the same item succeed without contention and the later write prevails.
    #[test]
    fn racing_status_writes_are_last_write_wins() {
        let (conn, db) = test_stores();
        let id = make_item(&conn, &db);
        mark_submitted(&conn, &id, 1).unwrap();

        mark_published(&conn, &db, &id).expect("first write succeeds");
        mark_rejected(&conn, &id).expect("second write also succeeds, no lock error");

        let item = read_item(&conn, &id).unwrap().unwrap();
        assert_eq!(item.status, ContentStatus::Rejected);
    }

    #[test]
    fn published_at_is_set_exactly_once() {
        let (conn, db) = test_stores();
        let id = make_item(&conn, &db);

        mark_submitted(&conn, &id, 1).unwrap();
        mark_published(&conn, &db, &id).unwrap();
        let first = read_item(&conn, &id).unwrap().unwrap().published_at.unwrap();

        // edit + resubmit + second approval keeps the original timestamp
        mark_submitted(&conn, &id, 1).unwrap();
        mark_published(&conn, &db, &id).unwrap();
        let second = read_item(&conn, &id).unwrap().unwrap().published_at.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn resubmitted_item_disappears_from_published_listing() {
        let (conn, db) = test_stores();
        let id = make_item(&conn, &db);
        mark_submitted(&conn, &id, 1).unwrap();
        mark_published(&conn, &db, &id).unwrap();

        let listed =
            read_latest_published(&conn, &db, &[Visibility::Public], None, 10, 0).unwrap();
        assert_eq!(listed.len(), 1);

        mark_submitted(&conn, &id, 1).unwrap();
        let listed =
            read_latest_published(&conn, &db, &[Visibility::Public], None, 10, 0).unwrap();
        assert!(listed.is_empty(), "a resubmitted item must not be servable");
    }

    #[test]
    fn delete_removes_row_body_and_index_entry() {
        let (conn, db) = test_stores();
        let id = make_item(&conn, &db);
        mark_submitted(&conn, &id, 1).unwrap();
        mark_published(&conn, &db, &id).unwrap();

        delete_item(&conn, &db, &id).unwrap();
        assert!(read_item(&conn, &id).unwrap().is_none());
        assert!(read_body(&db, &id).unwrap().is_none());
        let listed =
            read_latest_published(&conn, &db, &[Visibility::Public], None, 10, 0).unwrap();
        assert!(listed.is_empty());
    }
}
