//! Defines routes for record, upload and account operations.
//!
//! ## Structure
//! - **Meetings**
//!   - `GET    /meetings`: list the caller's meetings, newest first
//!   - `POST   /meetings`: create a meeting
//!   - `GET    /meetings/{id}`: fetch one meeting
//!   - `PATCH  /meetings/{id}`: partial update
//!   - `DELETE /meetings/{id}`: cascade delete (meeting + analyses)
//!   - `GET    /meetings/{id}/analysis`: the meeting's analysis
//!   - `POST   /meetings/{id}/analysis`: record an analysis
//!   - `DELETE /analysis/{id}`: delete one analysis
//!
//! - **Objects**
//!   - `PUT    /uploads/{kind}`: validated upload (`audio`, `pdf`, `docx`)
//!   - `GET    /objects/{*path}`: download an owned object
//!
//! - **Account**
//!   - `DELETE /account`: erase all of the caller's data
//!   - `POST   /account/registration-check`: sign-up form rules

use crate::{
    handlers::{
        account_handlers::{erase_account, registration_check},
        health_handlers::{healthz, readyz},
        meeting_handlers::{
            create_analysis, create_meeting, delete_analysis, delete_meeting, get_analysis,
            get_meeting, list_meetings, update_meeting,
        },
        upload_handlers::{get_object, upload},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Build the router; the caller attaches `AppState` with `with_state`.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Records
        .route("/meetings", get(list_meetings).post(create_meeting))
        .route(
            "/meetings/{id}",
            get(get_meeting).patch(update_meeting).delete(delete_meeting),
        )
        .route(
            "/meetings/{id}/analysis",
            get(get_analysis).post(create_analysis),
        )
        .route("/analysis/{id}", delete(delete_analysis))
        // Objects
        // Upload size is bounded by the validated Content-Length.
        .route("/uploads/{kind}", put(upload))
        .route("/objects/{*path}", get(get_object))
        // Account
        .route("/account", delete(erase_account))
        .route("/account/registration-check", post(registration_check))
}
