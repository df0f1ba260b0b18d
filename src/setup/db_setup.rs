use crate::models::authority::Role;
use redb::{CommitError, Database, StorageError, TableError, TransactionError};
use rusqlite::{Connection, Result as RusqliteResult, Transaction};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("Redb storage error: {0}")]
    RedbStorage(#[from] StorageError),
    #[error("Redb transaction error: {0}")]
    RedbTransaction(#[from] TransactionError),
    #[error("Redb table error: {0}")]
    RedbTable(#[from] TableError),
    #[error("Redb commit error: {0}")]
    RedbCommit(#[from] CommitError),
}

pub fn setup_party_db(conn: &mut Connection) -> Result<(), SetupError> {
    let tx = conn.transaction()?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_public INTEGER NOT NULL DEFAULT 1,
            is_banned INTEGER NOT NULL DEFAULT 0,
            ban_reason TEXT,
            last_login_time TEXT
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS roles (
            name TEXT PRIMARY KEY,
            description TEXT,
            is_system INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS content_items (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL CHECK(kind IN ('article', 'interview', 'speech', 'statement')),
            title_en TEXT NOT NULL,
            title_ne TEXT NOT NULL DEFAULT '',
            author_id INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft'
                CHECK(status IN ('draft', 'submitted', 'published', 'rejected')),
            visibility TEXT NOT NULL DEFAULT 'public'
                CHECK(visibility IN ('public', 'party', 'team')),
            pending_reviewer_id INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT,
            published_at TEXT,
            FOREIGN KEY (author_id) REFERENCES profiles(id)
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            link TEXT,
            actor_id INTEGER,
            is_read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES profiles(id) ON DELETE CASCADE
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS pages (
            slug TEXT PRIMARY KEY,
            title_en TEXT NOT NULL,
            title_ne TEXT NOT NULL DEFAULT '',
            body_en TEXT NOT NULL DEFAULT '',
            body_ne TEXT NOT NULL DEFAULT '',
            updated_by INTEGER,
            updated_at TEXT
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS press_releases (
            id TEXT PRIMARY KEY,
            title_en TEXT NOT NULL,
            title_ne TEXT NOT NULL DEFAULT '',
            body_en TEXT NOT NULL DEFAULT '',
            body_ne TEXT NOT NULL DEFAULT '',
            released_at TEXT NOT NULL,
            created_by INTEGER NOT NULL,
            FOREIGN KEY (created_by) REFERENCES profiles(id)
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS channels (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            created_by INTEGER NOT NULL,
            is_archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY (created_by) REFERENCES profiles(id)
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS channel_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            channel_id TEXT NOT NULL,
            author_id INTEGER NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (channel_id) REFERENCES channels(id) ON DELETE CASCADE,
            FOREIGN KEY (author_id) REFERENCES profiles(id)
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    seed_built_in_roles(&tx)?;
    seed_initial_settings(&tx)?;

    tx.commit()?;
    Ok(())
}

fn seed_built_in_roles(tx: &Transaction) -> RusqliteResult<()> {
    for role in Role::BUILT_IN {
        tx.execute(
            "INSERT OR IGNORE INTO roles (name, is_system) VALUES (?1, 1)",
            [role.as_str()],
        )?;
    }
    Ok(())
}

fn seed_initial_settings(tx: &Transaction) -> RusqliteResult<()> {
    tx.execute(
        "INSERT OR IGNORE INTO settings (key, value) VALUES ('default_page_size', '10')",
        [],
    )?;
    tx.execute(
        "INSERT OR IGNORE INTO settings (key, value) VALUES ('press_contact_email', '')",
        [],
    )?;
    Ok(())
}

pub fn setup_content_db(db: &Database) -> Result<(), SetupError> {
    use crate::models::db_operations::content_db_operations::{CONTENT_BODIES, PUBLISHED_INDEX};

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(CONTENT_BODIES)?;
        write_txn.open_table(PUBLISHED_INDEX)?;
    }
    write_txn.commit()?;
    Ok(())
}
