use crate::models::db_operations::notifications_db_operations::{self, NewNotification};
use crate::models::Notification;
use rusqlite::Connection;

/// Best-effort notification write. The caller's primary mutation has already
/// committed by the time this runs; a failed insert is logged and swallowed,
/// never propagated.
pub fn dispatch(conn: &Connection, notification: NewNotification) {
    if let Err(e) = notifications_db_operations::create_notification(conn, &notification) {
        log::error!(
            "Failed to write '{}' notification for user {}: {}",
            notification.kind.as_str(),
            notification.user_id,
            e
        );
    }
}

pub fn fetch_notifications(
    conn: &Connection,
    user_id: i64,
    limit: u32,
    offset: u32,
) -> Result<Vec<Notification>, rusqlite::Error> {
    notifications_db_operations::read_notifications_for_user(conn, user_id, limit, offset)
}

pub fn fetch_unread_count(conn: &Connection, user_id: i64) -> Result<i64, rusqlite::Error> {
    notifications_db_operations::unread_count(conn, user_id)
}

pub fn mark_notification_read(
    conn: &Connection,
    user_id: i64,
    notification_id: i64,
) -> Result<bool, rusqlite::Error> {
    notifications_db_operations::mark_read(conn, user_id, notification_id)
}
