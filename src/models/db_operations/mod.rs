pub mod content_db_operations;
pub mod notifications_db_operations;
pub mod site_db_operations;
pub mod users_db_operations;
