//! Sign-up, sign-in and sign-out.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use sage_kitchen_core::{Email, GatewayError};
use sage_kitchen_core::account::{Password, SignUp};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Sign-up request.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: Password,
    pub full_name: Option<String>,
}

/// Sign-in request.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: Password,
}

/// Create an account and sign in.
#[instrument(skip(state, session, request))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<CurrentUser>)> {
    let sign_up = SignUp {
        email: Email::parse(&request.email)?,
        password: Password::new(request.password.expose())?,
        full_name: request
            .full_name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty()),
    };

    let identity = state.gateways().identity.sign_up(sign_up).await?;
    let user = CurrentUser::from(identity);
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok((StatusCode::CREATED, Json(user)))
}

/// Sign in with email and password.
#[instrument(skip(state, session, request))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SignInRequest>,
) -> Result<Json<CurrentUser>> {
    let email = Email::parse(&request.email).map_err(|_| GatewayError::InvalidCredentials)?;
    let identity = state
        .gateways()
        .identity
        .sign_in(&email, &request.password)
        .await?;

    let user = CurrentUser::from(identity);
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "User signed in");

    Ok(Json(user))
}

/// Sign out and drop the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
