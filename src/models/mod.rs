use serde::{Deserialize, Serialize};

pub mod authority;
pub mod db_operations;

/// Lifecycle state of a content item. The review workflow only ever moves
/// between these four states; anything else in the database is a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Submitted,
    Published,
    Rejected,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Submitted => "submitted",
            ContentStatus::Published => "published",
            ContentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ContentStatus::Draft),
            "submitted" => Some(ContentStatus::Submitted),
            "published" => Some(ContentStatus::Published),
            "rejected" => Some(ContentStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Article,
    Interview,
    Speech,
    Statement,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Article => "article",
            ContentKind::Interview => "interview",
            ContentKind::Speech => "speech",
            ContentKind::Statement => "statement",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "article" => Some(ContentKind::Article),
            "interview" => Some(ContentKind::Interview),
            "speech" => Some(ContentKind::Speech),
            "statement" => Some(ContentKind::Statement),
            _ => None,
        }
    }
}

/// Read-access axis, independent of the workflow status. A published item is
/// still only served to readers whose role may see its visibility level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Party,
    Team,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Party => "party",
            Visibility::Team => "team",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "party" => Some(Visibility::Party),
            "team" => Some(Visibility::Team),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub is_active: bool,
    pub is_public: bool,
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    pub last_login_time: Option<String>,
}

/// Workflow record of a content item. Bodies live in the content store and
/// are opaque to the state machine.
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    pub id: String,
    pub kind: ContentKind,
    pub title_en: String,
    pub title_ne: String,
    pub author_id: i64,
    pub status: ContentStatus,
    pub visibility: Visibility,
    pub pending_reviewer_id: Option<i64>,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub published_at: Option<String>,
}

/// Bilingual payload of a content item, stored as JSON in the content store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentBody {
    pub body_en: String,
    pub body_ne: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FullContentItem {
    #[serde(flatten)]
    pub item: ContentItem,
    pub body: ContentBody,
}

#[derive(Debug, Serialize)]
pub struct SubmittedItemWithAuthor {
    pub item: ContentItem,
    pub author_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ReviewRequested,
    BlogApproved,
    BlogRejected,
    AccountBanned,
    AccountUnbanned,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ReviewRequested => "review_requested",
            NotificationKind::BlogApproved => "blog_approved",
            NotificationKind::BlogRejected => "blog_rejected",
            NotificationKind::AccountBanned => "account_banned",
            NotificationKind::AccountUnbanned => "account_unbanned",
        }
    }
}

/// A persisted notification. Created once by the dispatch boundary, then only
/// ever touched again by its recipient marking it read.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub actor_id: Option<i64>,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleRow {
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub slug: String,
    pub title_en: String,
    pub title_ne: String,
    pub body_en: String,
    pub body_ne: String,
    pub updated_by: Option<i64>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PressRelease {
    pub id: String,
    pub title_en: String,
    pub title_ne: String,
    pub body_en: String,
    pub body_ne: String,
    pub released_at: String,
    pub created_by: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: i64,
    pub is_archived: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelMessage {
    pub id: i64,
    pub channel_id: String,
    pub author_id: i64,
    pub author_name: String,
    pub body: String,
    pub created_at: String,
}
