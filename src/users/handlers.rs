use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AdminStatus, CreateUserResponse, PackageRequest, UserSearch},
    repo::{self, User},
};
use crate::{
    auth::{
        extractors::{ensure_self, AdminUser, AuthUser},
        jwt::is_valid_email,
    },
    error::{AppError, AppResult},
    state::AppState,
    store::UpdateResult,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/user/:email", get(get_user))
        .route("/user/admin/:key", get(admin_status).patch(make_admin))
        .route("/user/package/:email", patch(update_package))
}

#[instrument(skip(state, user))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut user): Json<User>,
) -> AppResult<Json<CreateUserResponse>> {
    user.email = user.email.trim().to_string();
    if !is_valid_email(&user.email) {
        warn!(email = %user.email, "invalid email");
        return Err(AppError::bad_input("Invalid email"));
    }

    if repo::find_by_email(state.store.as_ref(), &user.email)
        .await?
        .is_some()
    {
        return Ok(Json(CreateUserResponse {
            message: Some("user already exist"),
            inserted_id: None,
        }));
    }

    // roles are only granted through the admin route
    user.id = None;
    user.role = None;
    let id = repo::create(state.store.as_ref(), &user).await?;
    info!(user_id = %id, email = %user.email, "user created");
    Ok(Json(CreateUserResponse {
        message: None,
        inserted_id: Some(id),
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(email): Path<String>,
) -> AppResult<Json<Option<User>>> {
    let user = repo::find_by_email(state.store.as_ref(), &email).await?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<UserSearch>,
) -> AppResult<Json<Vec<User>>> {
    let users = repo::search(
        state.store.as_ref(),
        q.email.as_deref().filter(|s| !s.is_empty()),
        q.name.as_deref().filter(|s| !s.is_empty()),
    )
    .await?;
    Ok(Json(users))
}

/// GET /user/admin/:email
#[instrument(skip(state))]
pub async fn admin_status(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(email): Path<String>,
) -> AppResult<Json<AdminStatus>> {
    ensure_self(&caller, &email)?;
    let admin = repo::find_by_email(state.store.as_ref(), &email)
        .await?
        .map(|u| u.is_admin())
        .unwrap_or(false);
    Ok(Json(AdminStatus { admin }))
}

/// PATCH /user/admin/:id
#[instrument(skip(state))]
pub async fn make_admin(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UpdateResult>> {
    let result = repo::promote_to_admin(state.store.as_ref(), id).await?;
    info!(user_id = %id, by = %admin, modified = result.modified_count, "admin role granted");
    Ok(Json(result))
}

#[instrument(skip(state, body))]
pub async fn update_package(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(email): Path<String>,
    Json(body): Json<PackageRequest>,
) -> AppResult<Json<UpdateResult>> {
    let result = repo::set_package(state.store.as_ref(), &email, &body.package).await?;
    info!(email = %email, package = %body.package, "package updated");
    Ok(Json(result))
}
