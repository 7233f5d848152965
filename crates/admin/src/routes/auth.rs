//! Admin sign-in and sign-out.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use sage_kitchen_core::account::Password;
use sage_kitchen_core::{Email, GatewayError};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Sign-in request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: Password,
}

/// Sign in. Valid credentials are not enough: the user must also be an admin.
#[instrument(skip(state, session, request))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>> {
    let gateways = state.gateways();
    let email = Email::parse(&request.email).map_err(|_| GatewayError::InvalidCredentials)?;
    let identity = gateways.identity.sign_in(&email, &request.password).await?;

    if !gateways.identity.is_admin(identity.user_id).await? {
        tracing::warn!(user_id = %identity.user_id, "Non-admin attempted admin login");
        return Err(AppError::Forbidden(
            "You must be an admin to access this page".to_string(),
        ));
    }

    let admin = CurrentAdmin::from(identity);
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    tracing::info!(admin_id = %admin.id, "Admin signed in");

    Ok(Json(admin))
}

#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
