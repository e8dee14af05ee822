use axum::{
    extract::{FromRef, State},
    http::header,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LogoutResponse, TokenRequest, TokenResponse},
        jwt::{cleared_cookie, is_valid_email, JwtKeys},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/jwt", post(issue_token))
        .route("/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(mut payload): Json<TokenRequest>,
) -> AppResult<impl IntoResponse> {
    payload.email = payload.email.trim().to_string();
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::bad_input("Invalid email"));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&payload.email)?;
    let cookie = keys.session_cookie(&token, state.config.production);

    info!(email = %payload.email, "token issued");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse {
            success: true,
            token,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, cleared_cookie(state.config.production))],
        Json(LogoutResponse { success: true }),
    )
}
