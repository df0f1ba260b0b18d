pub mod admin_helpers;
pub mod notification_helpers;
pub mod public_helpers;
pub mod sanitization_helpers;
pub mod workflow_helpers;
