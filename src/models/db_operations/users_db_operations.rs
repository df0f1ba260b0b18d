use crate::models::authority;
use crate::models::{Profile, RoleRow};
use bcrypt::{hash, verify, BcryptError};
use chrono::Utc;
use rusqlite::{params, Connection, Error as RusqliteError, OptionalExtension};

fn bcrypt_to_rusqlite_error(e: BcryptError) -> RusqliteError {
    RusqliteError::ToSqlConversionFailure(Box::new(e))
}

const PROFILE_COLUMNS: &str =
    "id, username, role, is_active, is_public, is_banned, ban_reason, last_login_time";

fn profile_from_row(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        username: row.get(1)?,
        role: row.get(2)?,
        is_active: row.get(3)?,
        is_public: row.get(4)?,
        is_banned: row.get(5)?,
        ban_reason: row.get(6)?,
        last_login_time: row.get(7)?,
    })
}

pub fn create_user(
    conn: &Connection,
    username: &str,
    password: &str,
    role: &str,
) -> Result<i64, RusqliteError> {
    let hashed_password = hash(password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "INSERT INTO profiles (username, password_hash, role) VALUES (?1, ?2, ?3)",
        params![username, hashed_password, role],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_all_users(conn: &Connection) -> Result<Vec<Profile>, RusqliteError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM profiles ORDER BY id",
        PROFILE_COLUMNS
    ))?;
    let user_iter = stmt.query_map([], profile_from_row)?;
    Ok(user_iter.filter_map(|u| u.ok()).collect())
}

pub fn read_user_by_username(conn: &Connection, username: &str) -> Option<Profile> {
    conn.query_row(
        &format!("SELECT {} FROM profiles WHERE username = ?1", PROFILE_COLUMNS),
        [username],
        profile_from_row,
    )
    .ok()
}

pub fn read_user_by_id(conn: &Connection, user_id: i64) -> Result<Option<Profile>, RusqliteError> {
    conn.query_row(
        &format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLUMNS),
        [user_id],
        profile_from_row,
    )
    .optional()
}

/// Profiles whose role qualifies them to review submissions. Filtered in Rust
/// because the capability set lives in code, not in the database.
pub fn read_reviewers(conn: &Connection) -> Result<Vec<Profile>, RusqliteError> {
    let all = read_all_users(conn)?;
    Ok(all
        .into_iter()
        .filter(|p| p.is_active && !p.is_banned && authority::can_review_content(&p.role))
        .collect())
}

/// Checks credentials for login. Suspended and banned accounts fail here the
/// same way a wrong password does.
pub fn verify_credentials(conn: &Connection, username: &str, password: &str) -> Option<Profile> {
    let res: rusqlite::Result<String> = conn.query_row(
        "SELECT password_hash FROM profiles WHERE username = ?1",
        [username],
        |row| row.get(0),
    );

    if let Ok(password_hash) = res {
        if verify(password, &password_hash).unwrap_or(false) {
            let profile = read_user_by_username(conn, username)?;
            if profile.is_active && !profile.is_banned {
                return Some(profile);
            }
        }
    }
    None
}

pub fn update_last_login_time(conn: &Connection, username: &str) -> Result<(), RusqliteError> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE profiles SET last_login_time = ?1 WHERE username = ?2",
        params![now, username],
    )?;
    Ok(())
}

pub fn update_user_role(
    conn: &Connection,
    user_id: i64,
    new_role: &str,
) -> Result<usize, RusqliteError> {
    conn.execute(
        "UPDATE profiles SET role = ?1 WHERE id = ?2",
        params![new_role, user_id],
    )
}

pub fn set_ban_status(
    conn: &Connection,
    user_id: i64,
    banned: bool,
    reason: Option<&str>,
) -> Result<usize, RusqliteError> {
    conn.execute(
        "UPDATE profiles SET is_banned = ?1, ban_reason = ?2 WHERE id = ?3",
        params![banned, reason, user_id],
    )
}

/// Strips the profile to the lowest privilege role and hides it. Authored
/// content is left untouched; deactivation must never be a destructive delete.
pub fn deactivate_profile(conn: &Connection, user_id: i64) -> Result<usize, RusqliteError> {
    conn.execute(
        "UPDATE profiles SET role = ?1, is_public = 0 WHERE id = ?2",
        params![authority::LOWEST_PRIVILEGE_ROLE, user_id],
    )
}

pub fn change_password(
    conn: &Connection,
    username: &str,
    new_password: &str,
) -> Result<usize, RusqliteError> {
    let hashed = hash(new_password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "UPDATE profiles SET password_hash = ?1 WHERE username = ?2",
        params![hashed, username],
    )
}

pub fn change_username(
    conn: &Connection,
    old_username: &str,
    new_username: &str,
) -> Result<usize, RusqliteError> {
    conn.execute(
        "UPDATE profiles SET username = ?1 WHERE username = ?2",
        params![new_username, old_username],
    )
}

// --- Role table operations ---

pub fn list_roles(conn: &Connection) -> Result<Vec<RoleRow>, RusqliteError> {
    let mut stmt =
        conn.prepare("SELECT name, description, is_system FROM roles ORDER BY name")?;
    let iter = stmt.query_map([], |row| {
        Ok(RoleRow {
            name: row.get(0)?,
            description: row.get(1)?,
            is_system: row.get(2)?,
        })
    })?;
    Ok(iter.filter_map(|r| r.ok()).collect())
}

pub fn role_exists(conn: &Connection, name: &str) -> bool {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM roles WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )
    .unwrap_or(false)
}

pub fn read_role(conn: &Connection, name: &str) -> Result<Option<RoleRow>, RusqliteError> {
    conn.query_row(
        "SELECT name, description, is_system FROM roles WHERE name = ?1",
        [name],
        |row| {
            Ok(RoleRow {
                name: row.get(0)?,
                description: row.get(1)?,
                is_system: row.get(2)?,
            })
        },
    )
    .optional()
}

pub fn create_role(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
) -> Result<(), RusqliteError> {
    conn.execute(
        "INSERT INTO roles (name, description, is_system) VALUES (?1, ?2, 0)",
        params![name, description],
    )?;
    Ok(())
}

pub fn delete_role(conn: &Connection, name: &str) -> Result<usize, RusqliteError> {
    conn.execute("DELETE FROM roles WHERE name = ?1", [name])
}

// --- Settings ---

pub fn read_setting(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
        row.get(0)
    })
    .optional()
    .unwrap_or(None)
}

pub fn update_setting(conn: &Connection, key: &str, value: &str) -> Result<(), RusqliteError> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}
