//! Backend for meeting and document analysis: owner-scoped meeting and
//! analysis records, validated uploads with progress reporting, and
//! full account erasure.

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod task_group;
pub mod validation;
