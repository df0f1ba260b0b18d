use crate::helper::notification_helpers;
use crate::models::authority;
use crate::models::db_operations::notifications_db_operations::NewNotification;
use crate::models::db_operations::users_db_operations;
use crate::models::{NotificationKind, Profile, RoleRow};
use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminHelperError {
    #[error("permission denied: {0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("User not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

fn read_target(conn: &Connection, user_id: i64) -> Result<Profile, AdminHelperError> {
    users_db_operations::read_user_by_id(conn, user_id)?.ok_or(AdminHelperError::NotFound)
}

pub fn create_new_user(
    conn: &Connection,
    actor: &Profile,
    username: &str,
    password: &str,
    role: &str,
) -> Result<i64, AdminHelperError> {
    if !authority::can_manage_users(&actor.role) {
        return Err(AdminHelperError::Forbidden("your role may not manage users"));
    }
    if username.trim().is_empty() || password.is_empty() {
        return Err(AdminHelperError::Validation(
            "Username and password are required.".to_string(),
        ));
    }
    if !users_db_operations::role_exists(conn, role) {
        return Err(AdminHelperError::Validation(format!(
            "Unknown role '{}'.",
            role
        )));
    }
    Ok(users_db_operations::create_user(
        conn,
        username.trim(),
        password,
        role,
    )?)
}

pub fn fetch_all_users(conn: &Connection, actor: &Profile) -> Result<Vec<Profile>, AdminHelperError> {
    if !authority::can_manage_users(&actor.role) {
        return Err(AdminHelperError::Forbidden("your role may not manage users"));
    }
    Ok(users_db_operations::read_all_users(conn)?)
}

/// Role assignment is deliberately narrower than user management: yantrik and
/// board run the membership desk but may not hand out roles.
pub fn update_user_role(
    conn: &Connection,
    actor: &Profile,
    user_id: i64,
    new_role: &str,
) -> Result<(), AdminHelperError> {
    if !authority::can_change_role(&actor.role) {
        return Err(AdminHelperError::Forbidden(
            "only party administrators may change roles",
        ));
    }
    if !users_db_operations::role_exists(conn, new_role) {
        return Err(AdminHelperError::Validation(format!(
            "Unknown role '{}'.",
            new_role
        )));
    }
    read_target(conn, user_id)?;
    users_db_operations::update_user_role(conn, user_id, new_role)?;
    Ok(())
}

/// Bans or unbans an account. The target is told what happened through the
/// same best-effort dispatch the workflow uses; a lost notification never
/// blocks the ban itself.
pub fn toggle_ban(
    conn: &Connection,
    actor: &Profile,
    user_id: i64,
    banned: bool,
    reason: Option<&str>,
) -> Result<(), AdminHelperError> {
    if !authority::can_manage_users(&actor.role) {
        return Err(AdminHelperError::Forbidden("your role may not manage users"));
    }
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    if banned && reason.is_none() {
        return Err(AdminHelperError::Validation(
            "A ban reason is required.".to_string(),
        ));
    }
    let target = read_target(conn, user_id)?;
    users_db_operations::set_ban_status(conn, user_id, banned, reason)?;

    let (kind, title, body) = if banned {
        (
            NotificationKind::AccountBanned,
            "Your account has been suspended".to_string(),
            format!("Reason: {}", reason.unwrap_or_default()),
        )
    } else {
        (
            NotificationKind::AccountUnbanned,
            "Your account has been reinstated".to_string(),
            "You can sign in again.".to_string(),
        )
    };
    notification_helpers::dispatch(
        conn,
        NewNotification {
            user_id: target.id,
            kind,
            title,
            body,
            link: None,
            actor_id: Some(actor.id),
        },
    );
    Ok(())
}

/// Strips a profile to the lowest privilege role and hides it. Authored
/// content stays exactly where it is.
pub fn deactivate_user(
    conn: &Connection,
    actor: &Profile,
    user_id: i64,
) -> Result<(), AdminHelperError> {
    if !authority::can_manage_users(&actor.role) {
        return Err(AdminHelperError::Forbidden("your role may not manage users"));
    }
    read_target(conn, user_id)?;
    users_db_operations::deactivate_profile(conn, user_id)?;
    Ok(())
}

// --- Role administration ---

pub fn fetch_all_roles(conn: &Connection) -> Result<Vec<RoleRow>, AdminHelperError> {
    Ok(users_db_operations::list_roles(conn)?)
}

pub fn create_role(
    conn: &Connection,
    actor: &Profile,
    name: &str,
    description: Option<&str>,
) -> Result<(), AdminHelperError> {
    if !authority::can_change_role(&actor.role) {
        return Err(AdminHelperError::Forbidden(
            "only party administrators may manage roles",
        ));
    }
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
        return Err(AdminHelperError::Validation(
            "Role names use lowercase letters and underscores.".to_string(),
        ));
    }
    if users_db_operations::role_exists(conn, name) {
        return Err(AdminHelperError::Validation(format!(
            "Role '{}' already exists.",
            name
        )));
    }
    users_db_operations::create_role(conn, name, description)?;
    Ok(())
}

/// Built-in roles are load-bearing for every capability check and cannot be
/// deleted, no matter who asks.
pub fn delete_role(conn: &Connection, actor: &Profile, name: &str) -> Result<(), AdminHelperError> {
    if !authority::can_change_role(&actor.role) {
        return Err(AdminHelperError::Forbidden(
            "only party administrators may manage roles",
        ));
    }
    if authority::is_system_role(name) {
        return Err(AdminHelperError::Forbidden("built-in roles cannot be deleted"));
    }
    match users_db_operations::read_role(conn, name)? {
        Some(row) if row.is_system => {
            Err(AdminHelperError::Forbidden("built-in roles cannot be deleted"))
        }
        Some(_) => {
            users_db_operations::delete_role(conn, name)?;
            Ok(())
        }
        None => Err(AdminHelperError::Validation(format!(
            "Role '{}' does not exist.",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::workflow_helpers::{self, ContentDraft};
    use crate::models::db_operations::content_db_operations;
    use crate::models::{ContentKind, ContentStatus, Visibility};
    use crate::setup::db_setup;
    use redb::backends::InMemoryBackend;
    use redb::Database;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().expect("in-memory sqlite");
        db_setup::setup_party_db(&mut conn).expect("schema");
        conn
    }

    fn add_user(conn: &Connection, username: &str, role: &str) -> Profile {
        let id = users_db_operations::create_user(conn, username, "pw", role).expect("user");
        users_db_operations::read_user_by_id(conn, id).unwrap().unwrap()
    }

    #[test]
    fn only_admin_and_admin_party_change_roles() {
        let conn = test_conn();
        let target = add_user(&conn, "target", "member");

        for role in ["yantrik", "board", "central_committee", "member"] {
            let actor = add_user(&conn, &format!("actor_{}", role), role);
            assert!(matches!(
                update_user_role(&conn, &actor, target.id, "volunteer"),
                Err(AdminHelperError::Forbidden(_))
            ));
        }

        let admin = add_user(&conn, "the_admin", "admin_party");
        update_user_role(&conn, &admin, target.id, "volunteer").unwrap();
        let target = users_db_operations::read_user_by_id(&conn, target.id).unwrap().unwrap();
        assert_eq!(target.role, "volunteer");
    }

    #[test]
    fn role_change_rejects_unknown_roles() {
        let conn = test_conn();
        let admin = add_user(&conn, "the_admin", "admin");
        let target = add_user(&conn, "target", "member");
        assert!(matches!(
            update_user_role(&conn, &admin, target.id, "emperor"),
            Err(AdminHelperError::Validation(_))
        ));
    }

    #[test]
    fn ban_requires_reason_and_notifies_the_target() {
        let conn = test_conn();
        let admin = add_user(&conn, "the_admin", "board");
        let target = add_user(&conn, "target", "member");

        assert!(matches!(
            toggle_ban(&conn, &admin, target.id, true, None),
            Err(AdminHelperError::Validation(_))
        ));

        toggle_ban(&conn, &admin, target.id, true, Some("Spamming the channels")).unwrap();
        let banned = users_db_operations::read_user_by_id(&conn, target.id).unwrap().unwrap();
        assert!(banned.is_banned);
        assert_eq!(banned.ban_reason.as_deref(), Some("Spamming the channels"));
        assert!(
            users_db_operations::verify_credentials(&conn, "target", "pw").is_none(),
            "banned accounts must not log in"
        );

        let inbox = notification_helpers::fetch_notifications(&conn, target.id, 10, 0).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, "account_banned");
        assert!(inbox[0].body.contains("Spamming the channels"));

        toggle_ban(&conn, &admin, target.id, false, None).unwrap();
        let unbanned = users_db_operations::read_user_by_id(&conn, target.id).unwrap().unwrap();
        assert!(!unbanned.is_banned);
        assert!(users_db_operations::verify_credentials(&conn, "target", "pw").is_some());
    }

    #[test]
    fn deactivation_strips_role_and_hides_profile_but_keeps_content() {
        let conn = test_conn();
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .unwrap();
        db_setup::setup_content_db(&db).unwrap();

        let admin = add_user(&conn, "the_admin", "admin");
        let author = add_user(&conn, "author", "party_member");

        let draft = ContentDraft {
            kind: ContentKind::Statement,
            title_en: "On the coalition".to_string(),
            title_ne: String::new(),
            visibility: Visibility::Public,
            body_en: "Statement text.".to_string(),
            body_ne: String::new(),
            attachments: vec![],
            references: vec![],
        };
        let item_id = workflow_helpers::create_item(&db, &conn, &author, &draft).unwrap();
        workflow_helpers::submit_for_review(&db, &conn, &author, &item_id, admin.id).unwrap();
        workflow_helpers::approve(&db, &conn, &admin, &item_id).unwrap();

        deactivate_user(&conn, &admin, author.id).unwrap();

        let after = users_db_operations::read_user_by_id(&conn, author.id).unwrap().unwrap();
        assert_eq!(after.role, "guest");
        assert!(!after.is_public);

        // the published item survives, still attributed and still servable
        let item = content_db_operations::read_item(&conn, &item_id).unwrap().unwrap();
        assert_eq!(item.status, ContentStatus::Published);
        assert_eq!(item.author_id, author.id);
        let listed = content_db_operations::read_latest_published(
            &conn,
            &db,
            &[Visibility::Public],
            None,
            10,
            0,
        )
        .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn system_roles_cannot_be_deleted() {
        let conn = test_conn();
        let admin = add_user(&conn, "the_admin", "admin");

        for role in ["admin", "guest", "board", "central_committee"] {
            assert!(matches!(
                delete_role(&conn, &admin, role),
                Err(AdminHelperError::Forbidden(_))
            ));
        }

        create_role(&conn, &admin, "press_volunteer", Some("Helps the press desk")).unwrap();
        delete_role(&conn, &admin, "press_volunteer").unwrap();
    }

    #[test]
    fn custom_roles_hold_no_capability() {
        let conn = test_conn();
        let admin = add_user(&conn, "the_admin", "admin");
        create_role(&conn, &admin, "press_volunteer", None).unwrap();

        let target = add_user(&conn, "target", "member");
        update_user_role(&conn, &admin, target.id, "press_volunteer").unwrap();
        let target = users_db_operations::read_user_by_id(&conn, target.id).unwrap().unwrap();

        assert!(!crate::models::authority::can_manage_users(&target.role));
        assert!(!crate::models::authority::can_review_content(&target.role));
        assert!(!crate::models::authority::can_author_content(&target.role));
    }
}
