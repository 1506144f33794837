pub mod account_handlers;
pub mod health_handlers;
pub mod meeting_handlers;
pub mod upload_handlers;
