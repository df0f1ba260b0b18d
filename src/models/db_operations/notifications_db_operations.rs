use crate::models::{Notification, NotificationKind};
use chrono::Utc;
use rusqlite::{params, Connection, Error as RusqliteError};

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub actor_id: Option<i64>,
}

pub fn create_notification(
    conn: &Connection,
    notification: &NewNotification,
) -> Result<i64, RusqliteError> {
    let created_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO notifications (user_id, kind, title, body, link, actor_id, is_read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        params![
            notification.user_id,
            notification.kind.as_str(),
            notification.title,
            notification.body,
            notification.link,
            notification.actor_id,
            created_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_notifications_for_user(
    conn: &Connection,
    user_id: i64,
    limit: u32,
    offset: u32,
) -> Result<Vec<Notification>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, kind, title, body, link, actor_id, is_read, created_at
         FROM notifications WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2 OFFSET ?3",
    )?;
    let iter = stmt.query_map(params![user_id, limit, offset], |row| {
        Ok(Notification {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: row.get(2)?,
            title: row.get(3)?,
            body: row.get(4)?,
            link: row.get(5)?,
            actor_id: row.get(6)?,
            is_read: row.get(7)?,
            created_at: row.get(8)?,
        })
    })?;
    Ok(iter.filter_map(|n| n.ok()).collect())
}

pub fn unread_count(conn: &Connection, user_id: i64) -> Result<i64, RusqliteError> {
    conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
        [user_id],
        |row| row.get(0),
    )
}

/// Marks a notification read. The recipient check is part of the statement,
/// so nobody can flip another user's notifications; returns whether a row
/// actually changed.
pub fn mark_read(
    conn: &Connection,
    user_id: i64,
    notification_id: i64,
) -> Result<bool, RusqliteError> {
    let changed = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
        params![notification_id, user_id],
    )?;
    Ok(changed == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().expect("in-memory sqlite");
        db_setup::setup_party_db(&mut conn).expect("schema");
        conn
    }

    fn sample(user_id: i64) -> NewNotification {
        NewNotification {
            user_id,
            kind: NotificationKind::BlogApproved,
            title: "Your article was published".into(),
            body: "A reviewer approved your submission.".into(),
            link: Some("/member/content/abc".into()),
            actor_id: Some(9),
        }
    }

    #[test]
    fn create_list_and_count() {
        let conn = test_conn();
        create_notification(&conn, &sample(4)).unwrap();
        create_notification(&conn, &sample(4)).unwrap();
        create_notification(&conn, &sample(7)).unwrap();

        let list = read_notifications_for_user(&conn, 4, 10, 0).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].kind, "blog_approved");
        assert!(!list[0].is_read);
        assert_eq!(unread_count(&conn, 4).unwrap(), 2);
    }

    #[test]
    fn mark_read_is_recipient_only() {
        let conn = test_conn();
        let id = create_notification(&conn, &sample(4)).unwrap();

        assert!(!mark_read(&conn, 5, id).unwrap(), "wrong recipient");
        assert_eq!(unread_count(&conn, 4).unwrap(), 1);

        assert!(mark_read(&conn, 4, id).unwrap());
        assert_eq!(unread_count(&conn, 4).unwrap(), 0);
    }
}
