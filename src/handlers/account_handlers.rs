//! Account-level handlers: full data erasure and sign-up form checks.

use crate::{
    auth::{RegistrationForm, Session},
    errors::AppError,
    services::erasure::ErasureReport,
    state::AppState,
};
use axum::{Json, extract::State, http::StatusCode};

/// `DELETE /account`: remove every record and object the caller owns.
pub async fn erase_account(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ErasureReport>, AppError> {
    Ok(Json(state.erasure.erase_user(&session.user_id).await?))
}

/// `POST /account/registration-check`
///
/// Runs the sign-up form rules before the client hands credentials to the
/// identity provider.
pub async fn registration_check(
    Json(form): Json<RegistrationForm>,
) -> Result<StatusCode, AppError> {
    form.validate()?;
    Ok(StatusCode::NO_CONTENT)
}
