use crate::helper::{notification_helpers, sanitization_helpers};
use crate::models::authority;
use crate::models::db_operations::notifications_db_operations::NewNotification;
use crate::models::db_operations::{content_db_operations, users_db_operations};
use crate::models::{
    ContentBody, ContentItem, ContentKind, ContentStatus, FullContentItem, NotificationKind,
    Profile, SubmittedItemWithAuthor, Visibility,
};
use redb::Database;
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("permission denied: {0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("content item not found: {0}")]
    NotFound(String),
    #[error("content store error: {0}")]
    Store(#[from] content_db_operations::DbError),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Incoming content fields, as written by the author. Everything is sanitized
/// before it reaches either store.
#[derive(Debug, Deserialize)]
pub struct ContentDraft {
    pub kind: ContentKind,
    pub title_en: String,
    #[serde(default)]
    pub title_ne: String,
    pub visibility: Visibility,
    #[serde(default)]
    pub body_en: String,
    #[serde(default)]
    pub body_ne: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
}

struct CleanDraft {
    kind: ContentKind,
    title_en: String,
    title_ne: String,
    visibility: Visibility,
    body: ContentBody,
}

fn sanitize_draft(draft: &ContentDraft) -> Result<CleanDraft, WorkflowError> {
    let title_en = sanitization_helpers::strip_all_html(draft.title_en.trim());
    let title_ne = sanitization_helpers::strip_all_html(draft.title_ne.trim());
    if title_en.is_empty() {
        return Err(WorkflowError::Validation("A title is required.".to_string()));
    }
    Ok(CleanDraft {
        kind: draft.kind,
        title_en,
        title_ne,
        visibility: draft.visibility,
        body: ContentBody {
            body_en: sanitization_helpers::sanitize_markdown_content(&draft.body_en),
            body_ne: sanitization_helpers::sanitize_markdown_content(&draft.body_ne),
            attachments: draft
                .attachments
                .iter()
                .map(|a| sanitization_helpers::strip_all_html(a.trim()))
                .filter(|a| !a.is_empty())
                .collect(),
            references: draft
                .references
                .iter()
                .map(|r| sanitization_helpers::strip_all_html(r.trim()))
                .filter(|r| !r.is_empty())
                .collect(),
        },
    })
}

fn read_item_or_not_found(conn: &Connection, item_id: &str) -> Result<ContentItem, WorkflowError> {
    content_db_operations::read_item(conn, item_id)?
        .ok_or_else(|| WorkflowError::NotFound(item_id.to_string()))
}

/// Creates a new item in `draft`. Any role permitted to write content may do
/// this; the item is invisible outside the author's workspace until approved.
pub fn create_item(
    db: &Database,
    conn: &Connection,
    actor: &Profile,
    draft: &ContentDraft,
) -> Result<String, WorkflowError> {
    if !authority::can_author_content(&actor.role) {
        return Err(WorkflowError::Forbidden("your role may not author content"));
    }
    let clean = sanitize_draft(draft)?;
    let item_id = content_db_operations::create_item(
        conn,
        db,
        actor.id,
        clean.kind,
        &clean.title_en,
        &clean.title_ne,
        clean.visibility,
        &clean.body,
    )?;
    Ok(item_id)
}

/// Edits an item the actor authored. An item under review cannot be edited;
/// editing a published item pulls it out of publication into `draft`, so the
/// change goes through review again before going live.
pub fn update_item(
    db: &Database,
    conn: &Connection,
    actor: &Profile,
    item_id: &str,
    draft: &ContentDraft,
) -> Result<(), WorkflowError> {
    let item = read_item_or_not_found(conn, item_id)?;
    if item.author_id != actor.id {
        return Err(WorkflowError::Forbidden("only the author may edit this item"));
    }
    if item.status == ContentStatus::Submitted {
        return Err(WorkflowError::Validation(
            "This item is awaiting review and cannot be edited.".to_string(),
        ));
    }
    let clean = sanitize_draft(draft)?;
    content_db_operations::update_item_content(
        conn,
        db,
        item_id,
        &clean.title_en,
        &clean.title_ne,
        clean.visibility,
        &clean.body,
    )?;
    if item.status == ContentStatus::Published {
        content_db_operations::mark_drafted(conn, item_id)?;
    }
    Ok(())
}

/// Hands an item to the review queue. The author picks a reviewer from the set
/// of profiles that hold the review capability; that pick is advisory, not a
/// lock, and any qualified reviewer may act on the submission. Resubmission
/// after rejection or publication is the identical operation; the prior
/// rejection reason is not retained on the item.
pub fn submit_for_review(
    db: &Database,
    conn: &Connection,
    actor: &Profile,
    item_id: &str,
    reviewer_id: i64,
) -> Result<(), WorkflowError> {
    let item = read_item_or_not_found(conn, item_id)?;
    if item.author_id != actor.id {
        return Err(WorkflowError::Forbidden("only the author may submit this item"));
    }
    match item.status {
        ContentStatus::Draft | ContentStatus::Rejected | ContentStatus::Published => {}
        ContentStatus::Submitted => {
            return Err(WorkflowError::Validation(
                "This item is already awaiting review.".to_string(),
            ));
        }
    }
    if item.title_en.trim().is_empty() {
        return Err(WorkflowError::Validation("A title is required.".to_string()));
    }
    if item.kind == ContentKind::Article {
        let body = content_db_operations::read_body(db, item_id)?.unwrap_or_default();
        if body.body_en.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "Articles need a body before they can be submitted.".to_string(),
            ));
        }
    }

    let reviewer = users_db_operations::read_user_by_id(conn, reviewer_id)?.ok_or_else(|| {
        WorkflowError::Validation("The chosen reviewer does not exist.".to_string())
    })?;
    if !authority::can_review_content(&reviewer.role) {
        return Err(WorkflowError::Validation(
            "The chosen user cannot review content.".to_string(),
        ));
    }

    content_db_operations::mark_submitted(conn, item_id, reviewer.id)?;

    notification_helpers::dispatch(
        conn,
        NewNotification {
            user_id: reviewer.id,
            kind: NotificationKind::ReviewRequested,
            title: "A submission is waiting for your review".to_string(),
            body: format!("{} submitted \"{}\" for review.", actor.username, item.title_en),
            link: Some(format!("/member/review/{}", item_id)),
            actor_id: Some(actor.id),
        },
    );
    Ok(())
}

/// Publishes a submission. Any reviewer may approve, including one the author
/// did not pick. The notification to the author is best-effort: once the
/// status write has committed, a failed notification cannot undo it.
pub fn approve(
    db: &Database,
    conn: &Connection,
    actor: &Profile,
    item_id: &str,
) -> Result<(), WorkflowError> {
    if !authority::can_review_content(&actor.role) {
        return Err(WorkflowError::Forbidden("your role may not review content"));
    }
    let item = read_item_or_not_found(conn, item_id)?;
    if !matches!(item.status, ContentStatus::Draft | ContentStatus::Submitted) {
        return Err(WorkflowError::Validation(format!(
            "Only a draft or submitted item can be published; this one is {}.",
            item.status.as_str()
        )));
    }

    content_db_operations::mark_published(conn, db, item_id)?;

    notification_helpers::dispatch(
        conn,
        NewNotification {
            user_id: item.author_id,
            kind: NotificationKind::BlogApproved,
            title: "Your submission was published".to_string(),
            body: format!("\"{}\" was approved and is now live.", item.title_en),
            link: Some(format!("/content/{}", item_id)),
            actor_id: Some(actor.id),
        },
    );
    Ok(())
}

/// Sends a submission back to its author. A reason is required; it travels in
/// the notification body and is not stored on the item itself.
pub fn reject(
    conn: &Connection,
    actor: &Profile,
    item_id: &str,
    reason: &str,
) -> Result<(), WorkflowError> {
    if !authority::can_review_content(&actor.role) {
        return Err(WorkflowError::Forbidden("your role may not review content"));
    }
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(WorkflowError::Validation(
            "A rejection reason is required.".to_string(),
        ));
    }
    let item = read_item_or_not_found(conn, item_id)?;
    if item.status != ContentStatus::Submitted {
        return Err(WorkflowError::Validation(format!(
            "Only a submitted item can be rejected; this one is {}.",
            item.status.as_str()
        )));
    }

    content_db_operations::mark_rejected(conn, item_id)?;

    notification_helpers::dispatch(
        conn,
        NewNotification {
            user_id: item.author_id,
            kind: NotificationKind::BlogRejected,
            title: "Your submission was rejected".to_string(),
            body: format!("\"{}\" was rejected: {}", item.title_en, reason),
            link: Some(format!("/member/content/{}", item_id)),
            actor_id: Some(actor.id),
        },
    );
    Ok(())
}

/// Removes an item. Authors may delete their own work as long as it is not
/// live; anything beyond that needs the delete capability.
pub fn delete_item(
    db: &Database,
    conn: &Connection,
    actor: &Profile,
    item_id: &str,
) -> Result<(), WorkflowError> {
    let item = read_item_or_not_found(conn, item_id)?;
    let own_unpublished = item.author_id == actor.id && item.status != ContentStatus::Published;
    if !own_unpublished && !authority::can_delete_content(&actor.role) {
        return Err(WorkflowError::Forbidden(
            "you do not have permission to delete this item",
        ));
    }
    content_db_operations::delete_item(conn, db, item_id)?;
    Ok(())
}

/// Full item for a specific reader: the author and any reviewer always see
/// it, everyone else only once it is published and their role passes the
/// visibility check.
pub fn read_item_for_actor(
    db: &Database,
    conn: &Connection,
    actor: &Profile,
    item_id: &str,
) -> Result<FullContentItem, WorkflowError> {
    let item = read_item_or_not_found(conn, item_id)?;
    let privileged = item.author_id == actor.id || authority::can_review_content(&actor.role);
    let readable = privileged
        || (item.status == ContentStatus::Published
            && authority::can_view_visibility(&actor.role, item.visibility));
    if !readable {
        return Err(WorkflowError::Forbidden("you may not view this item"));
    }
    let body = content_db_operations::read_body(db, item_id)?.unwrap_or_default();
    Ok(FullContentItem { item, body })
}

pub fn fetch_own_items(
    conn: &Connection,
    actor: &Profile,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContentItem>, WorkflowError> {
    Ok(content_db_operations::read_items_by_author(
        conn, actor.id, limit, offset,
    )?)
}

/// The review queue, with author names resolved for display. An item whose
/// author record has vanished is logged and skipped rather than failing the
/// whole listing.
pub fn fetch_review_queue(
    conn: &Connection,
    actor: &Profile,
    limit: u32,
    offset: u32,
) -> Result<Vec<SubmittedItemWithAuthor>, WorkflowError> {
    if !authority::can_review_content(&actor.role) {
        return Err(WorkflowError::Forbidden("your role may not review content"));
    }
    let items = content_db_operations::read_submitted_items(conn, limit, offset)?;
    let mut results = Vec::new();
    for item in items {
        match users_db_operations::read_user_by_id(conn, item.author_id)? {
            Some(author) => results.push(SubmittedItemWithAuthor {
                item,
                author_name: author.username,
            }),
            None => {
                log::warn!(
                    "Submitted item {} has no author profile and will be skipped.",
                    item.id
                );
            }
        }
    }
    Ok(results)
}

/// Published feed for a logged-in reader, widened to whatever visibility
/// levels their role grants.
pub fn fetch_feed_for_actor(
    db: &Database,
    conn: &Connection,
    actor: &Profile,
    kind: Option<ContentKind>,
    limit: u32,
    offset: u32,
) -> Result<Vec<ContentItem>, WorkflowError> {
    let mut allowed = vec![Visibility::Public];
    if authority::can_view_visibility(&actor.role, Visibility::Party) {
        allowed.push(Visibility::Party);
    }
    if authority::can_view_visibility(&actor.role, Visibility::Team) {
        allowed.push(Visibility::Team);
    }
    Ok(content_db_operations::read_latest_published(
        conn, db, &allowed, kind, limit, offset,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::notification_helpers;
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

    fn add_user(conn: &Connection, username: &str, role: &str) -> Profile {
        let id = users_db_operations::create_user(conn, username, "pw", role).expect("user");
        users_db_operations::read_user_by_id(conn, id).unwrap().unwrap()
    }

    fn article_draft() -> ContentDraft {
        ContentDraft {
            kind: ContentKind::Article,
            title_en: "Why the budget matters".to_string(),
            title_ne: "".to_string(),
            visibility: Visibility::Public,
            body_en: "A long explanation of the budget.".to_string(),
            body_ne: String::new(),
            attachments: vec![],
            references: vec![],
        }
    }

    fn status_of(conn: &Connection, id: &str) -> ContentStatus {
        content_db_operations::read_item(conn, id).unwrap().unwrap().status
    }

    #[test]
    fn non_reviewer_roles_cannot_approve_or_reject() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "party_member");
        let reviewer = add_user(&conn, "reviewer", "board");
        let id = create_item(&db, &conn, &author, &article_draft()).unwrap();
        submit_for_review(&db, &conn, &author, &id, reviewer.id).unwrap();

        for role in ["member", "party_member", "volunteer", "team_member", "central_committee", "supporter", "guest", "unknown_role"] {
            let outsider = add_user(&conn, &format!("u_{}", role), role);
            assert!(matches!(
                approve(&db, &conn, &outsider, &id),
                Err(WorkflowError::Forbidden(_))
            ));
            assert!(matches!(
                reject(&conn, &outsider, &id, "no"),
                Err(WorkflowError::Forbidden(_))
            ));
            assert_eq!(status_of(&conn, &id), ContentStatus::Submitted);
        }
    }

    #[test]
    fn guest_and_supporter_cannot_author() {
        let (conn, db) = test_stores();
        for role in ["guest", "supporter"] {
            let actor = add_user(&conn, &format!("a_{}", role), role);
            assert!(matches!(
                create_item(&db, &conn, &actor, &article_draft()),
                Err(WorkflowError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn submit_requires_an_eligible_reviewer() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "party_member");
        let plain = add_user(&conn, "plain", "member");
        let id = create_item(&db, &conn, &author, &article_draft()).unwrap();

        // nonexistent reviewer
        assert!(matches!(
            submit_for_review(&db, &conn, &author, &id, 9999),
            Err(WorkflowError::Validation(_))
        ));
        // reviewer without the capability
        assert!(matches!(
            submit_for_review(&db, &conn, &author, &id, plain.id),
            Err(WorkflowError::Validation(_))
        ));
        assert_eq!(status_of(&conn, &id), ContentStatus::Draft);
    }

    #[test]
    fn only_the_author_may_submit() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "party_member");
        let other = add_user(&conn, "other", "party_member");
        let reviewer = add_user(&conn, "reviewer", "yantrik");
        let id = create_item(&db, &conn, &author, &article_draft()).unwrap();

        assert!(matches!(
            submit_for_review(&db, &conn, &other, &id, reviewer.id),
            Err(WorkflowError::Forbidden(_))
        ));
        assert_eq!(status_of(&conn, &id), ContentStatus::Draft);
    }

    #[test]
    fn article_without_body_fails_submission() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "party_member");
        let reviewer = add_user(&conn, "reviewer", "admin");
        let mut draft = article_draft();
        draft.body_en = String::new();
        let id = create_item(&db, &conn, &author, &draft).unwrap();

        assert!(matches!(
            submit_for_review(&db, &conn, &author, &id, reviewer.id),
            Err(WorkflowError::Validation(_))
        ));
        assert_eq!(status_of(&conn, &id), ContentStatus::Draft);
    }

    #[test]
    fn approval_publishes_and_notifies_the_author() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "party_member");
        let reviewer = add_user(&conn, "reviewer", "admin_party");
        let id = create_item(&db, &conn, &author, &article_draft()).unwrap();
        submit_for_review(&db, &conn, &author, &id, reviewer.id).unwrap();

        // submission notified the chosen reviewer
        let reviewer_inbox =
            notification_helpers::fetch_notifications(&conn, reviewer.id, 10, 0).unwrap();
        assert_eq!(reviewer_inbox.len(), 1);
        assert_eq!(reviewer_inbox[0].kind, "review_requested");

        approve(&db, &conn, &reviewer, &id).unwrap();

        let item = content_db_operations::read_item(&conn, &id).unwrap().unwrap();
        assert_eq!(item.status, ContentStatus::Published);
        assert!(item.published_at.is_some());
        assert!(item.pending_reviewer_id.is_none());

        let author_inbox =
            notification_helpers::fetch_notifications(&conn, author.id, 10, 0).unwrap();
        assert_eq!(author_inbox.len(), 1);
        assert_eq!(author_inbox[0].kind, "blog_approved");
        assert_eq!(author_inbox[0].user_id, author.id);
    }

    #[test]
    fn notification_failure_never_rolls_back_the_transition() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "party_member");
        let reviewer = add_user(&conn, "reviewer", "board");
        let id = create_item(&db, &conn, &author, &article_draft()).unwrap();
        submit_for_review(&db, &conn, &author, &id, reviewer.id).unwrap();

        // Break the notification store; the primary status write must survive.
        conn.execute("DROP TABLE notifications", []).unwrap();

        approve(&db, &conn, &reviewer, &id).expect("approval must still succeed");
        assert_eq!(status_of(&conn, &id), ContentStatus::Published);
    }

    #[test]
    fn rejection_requires_a_reason_and_carries_it_to_the_author() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "party_member");
        let reviewer = add_user(&conn, "reviewer", "yantrik");
        let id = create_item(&db, &conn, &author, &article_draft()).unwrap();
        submit_for_review(&db, &conn, &author, &id, reviewer.id).unwrap();

        assert!(matches!(
            reject(&conn, &reviewer, &id, "   "),
            Err(WorkflowError::Validation(_))
        ));
        assert_eq!(status_of(&conn, &id), ContentStatus::Submitted);

        reject(&conn, &reviewer, &id, "Sources are missing.").unwrap();

        let item = content_db_operations::read_item(&conn, &id).unwrap().unwrap();
        assert_eq!(item.status, ContentStatus::Rejected);
        assert!(item.pending_reviewer_id.is_none());

        let inbox = notification_helpers::fetch_notifications(&conn, author.id, 10, 0).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, "blog_rejected");
        assert!(inbox[0].body.contains("Sources are missing."));
    }

    #[test]
    fn draft_submit_reject_resubmit_publish_round_trip() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "volunteer");
        let reviewer = add_user(&conn, "reviewer", "admin");
        let id = create_item(&db, &conn, &author, &article_draft()).unwrap();

        let published_at = |conn: &Connection| {
            content_db_operations::read_item(conn, &id)
                .unwrap()
                .unwrap()
                .published_at
        };

        submit_for_review(&db, &conn, &author, &id, reviewer.id).unwrap();
        assert_eq!(status_of(&conn, &id), ContentStatus::Submitted);
        assert!(published_at(&conn).is_none());

        reject(&conn, &reviewer, &id, "Tighten the second half.").unwrap();
        assert_eq!(status_of(&conn, &id), ContentStatus::Rejected);
        assert!(published_at(&conn).is_none());

        submit_for_review(&db, &conn, &author, &id, reviewer.id).unwrap();
        assert_eq!(status_of(&conn, &id), ContentStatus::Submitted);
        assert!(published_at(&conn).is_none());

        approve(&db, &conn, &reviewer, &id).unwrap();
        assert_eq!(status_of(&conn, &id), ContentStatus::Published);
        assert!(published_at(&conn).is_some());
    }

    #[test]
    fn editing_a_published_item_pulls_it_back_to_draft() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "party_member");
        let reviewer = add_user(&conn, "reviewer", "admin");
        let id = create_item(&db, &conn, &author, &article_draft()).unwrap();
        submit_for_review(&db, &conn, &author, &id, reviewer.id).unwrap();
        approve(&db, &conn, &reviewer, &id).unwrap();

        let mut edited = article_draft();
        edited.body_en = "A sharper explanation of the budget.".to_string();
        update_item(&db, &conn, &author, &id, &edited).unwrap();

        let item = content_db_operations::read_item(&conn, &id).unwrap().unwrap();
        assert_eq!(item.status, ContentStatus::Draft);
        // the original publication timestamp survives the round trip
        assert!(item.published_at.is_some());

        // while submitted, further edits are blocked
        submit_for_review(&db, &conn, &author, &id, reviewer.id).unwrap();
        assert!(matches!(
            update_item(&db, &conn, &author, &id, &edited),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn approving_an_already_published_item_is_a_validation_error() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "party_member");
        let reviewer = add_user(&conn, "reviewer", "admin");
        let id = create_item(&db, &conn, &author, &article_draft()).unwrap();
        submit_for_review(&db, &conn, &author, &id, reviewer.id).unwrap();
        approve(&db, &conn, &reviewer, &id).unwrap();

        assert!(matches!(
            approve(&db, &conn, &reviewer, &id),
            Err(WorkflowError::Validation(_))
        ));
        assert!(matches!(
            reject(&conn, &reviewer, &id, "too late"),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn any_qualified_reviewer_may_act_not_just_the_chosen_one() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "party_member");
        let chosen = add_user(&conn, "chosen", "board");
        let other = add_user(&conn, "other", "yantrik");
        let id = create_item(&db, &conn, &author, &article_draft()).unwrap();
        submit_for_review(&db, &conn, &author, &id, chosen.id).unwrap();

        approve(&db, &conn, &other, &id).expect("assignment is advisory");
        assert_eq!(status_of(&conn, &id), ContentStatus::Published);
    }

    #[test]
    fn author_may_delete_own_draft_but_not_own_published_item() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "party_member");
        let reviewer = add_user(&conn, "reviewer", "admin");

        let draft_id = create_item(&db, &conn, &author, &article_draft()).unwrap();
        delete_item(&db, &conn, &author, &draft_id).expect("own draft");

        let live_id = create_item(&db, &conn, &author, &article_draft()).unwrap();
        submit_for_review(&db, &conn, &author, &live_id, reviewer.id).unwrap();
        approve(&db, &conn, &reviewer, &live_id).unwrap();

        assert!(matches!(
            delete_item(&db, &conn, &author, &live_id),
            Err(WorkflowError::Forbidden(_))
        ));
        // board reviews but cannot delete either
        let board = add_user(&conn, "boarder", "board");
        assert!(matches!(
            delete_item(&db, &conn, &board, &live_id),
            Err(WorkflowError::Forbidden(_))
        ));
        // yantrik holds the delete capability
        let yantrik = add_user(&conn, "tech", "yantrik");
        delete_item(&db, &conn, &yantrik, &live_id).unwrap();
    }

    #[test]
    fn visibility_gates_the_feed() {
        let (conn, db) = test_stores();
        let author = add_user(&conn, "author", "team_member");
        let reviewer = add_user(&conn, "reviewer", "admin");

        for (title, vis) in [
            ("open", Visibility::Public),
            ("internal", Visibility::Party),
            ("core", Visibility::Team),
        ] {
            let mut draft = article_draft();
            draft.title_en = title.to_string();
            draft.visibility = vis;
            let id = create_item(&db, &conn, &author, &draft).unwrap();
            submit_for_review(&db, &conn, &author, &id, reviewer.id).unwrap();
            approve(&db, &conn, &reviewer, &id).unwrap();
        }

        let plain = add_user(&conn, "plain", "member");
        let feed = fetch_feed_for_actor(&db, &conn, &plain, None, 10, 0).unwrap();
        let titles: Vec<_> = feed.iter().map(|i| i.title_en.as_str()).collect();
        assert!(titles.contains(&"open") && titles.contains(&"internal"));
        assert!(!titles.contains(&"core"));

        let insider = add_user(&conn, "insider", "team_member");
        let feed = fetch_feed_for_actor(&db, &conn, &insider, None, 10, 0).unwrap();
        assert_eq!(feed.len(), 3);
    }
}
