use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo::{MealRequest, DELIVERED};
use crate::{
    auth::extractors::{ensure_self, AdminUser, AuthUser},
    error::AppResult,
    state::AppState,
    store::{
        from_documents, to_document, Collection, DeleteResult, Filter, FindOptions, InsertResult,
        Update, UpdateResult,
    },
};

pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/requested-meal",
            get(all_requests).post(create_request),
        )
        .route(
            "/requested-meal/:key",
            get(requests_by_user)
                .patch(mark_delivered)
                .delete(delete_request),
        )
}

#[instrument(skip(state, body))]
pub async fn create_request(
    State(state): State<AppState>,
    Json(mut body): Json<MealRequest>,
) -> AppResult<Json<InsertResult>> {
    body.id = None;
    let id = state
        .store
        .insert_one(Collection::RequestedMeals, to_document(&body)?)
        .await?;
    info!(request_id = %id, email = %body.user_email, "meal requested");
    Ok(Json(InsertResult { inserted_id: id }))
}

#[instrument(skip(state))]
pub async fn all_requests(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<MealRequest>>> {
    let docs = state
        .store
        .find_many(Collection::RequestedMeals, &Filter::all(), &FindOptions::default())
        .await?;
    Ok(Json(from_documents(docs)?))
}

/// GET /requested-meal/:email
#[instrument(skip(state))]
pub async fn requests_by_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(email): Path<String>,
) -> AppResult<Json<Vec<MealRequest>>> {
    ensure_self(&caller, &email)?;
    let docs = state
        .store
        .find_many(
            Collection::RequestedMeals,
            &Filter::all().eq("userEmail", email),
            &FindOptions::default(),
        )
        .await?;
    Ok(Json(from_documents(docs)?))
}

/// PATCH /requested-meal/:id
#[instrument(skip(state))]
pub async fn mark_delivered(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UpdateResult>> {
    let result = state
        .store
        .update_one(
            Collection::RequestedMeals,
            &Filter::by_id(id),
            &Update::new().set("status", DELIVERED),
        )
        .await?;
    Ok(Json(result))
}

/// DELETE /requested-meal/:id
#[instrument(skip(state))]
pub async fn delete_request(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResult>> {
    let result = state
        .store
        .delete_one(Collection::RequestedMeals, &Filter::by_id(id))
        .await?;
    Ok(Json(result))
}
