use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateReviewRequest, EditReviewRequest},
    repo::{self, by_meal, Review},
    services,
};
use crate::{
    auth::extractors::{ensure_self, AdminUser, AuthUser},
    error::{AppError, AppResult},
    state::AppState,
    store::{Collection, DeleteResult, Filter, Update, UpdateResult},
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/review", post(create_review))
        .route(
            "/review/:key",
            get(reviews_by_author).put(sync_review_counters).delete(delete_review),
        )
        .route("/reviews/:meal_id", get(reviews_for_meal))
        .route("/single-review/:id", get(get_review).patch(edit_review))
        .route("/all-reviews", get(all_reviews))
}

#[instrument(skip(state, body))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
    Json(body): Json<CreateReviewRequest>,
) -> AppResult<Json<Review>> {
    let input = body.validate()?;
    let review = services::record(state.store.as_ref(), &author, input).await?;
    Ok(Json(review))
}

/// PUT /review/:mealId
#[instrument(skip(state))]
pub async fn sync_review_counters(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(meal_id): Path<Uuid>,
) -> AppResult<Json<UpdateResult>> {
    let result = services::sync_counters(state.store.as_ref(), meal_id).await?;
    Ok(Json(result))
}

/// DELETE /review/:id
#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResult>> {
    let result = services::remove(state.store.as_ref(), id).await?;
    Ok(Json(result))
}

/// GET /review/:email
#[instrument(skip(state))]
pub async fn reviews_by_author(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(email): Path<String>,
) -> AppResult<Json<Vec<Review>>> {
    ensure_self(&caller, &email)?;
    let reviews = repo::list(state.store.as_ref(), &Filter::all().eq("email", email)).await?;
    Ok(Json(reviews))
}

#[instrument(skip(state))]
pub async fn reviews_for_meal(
    State(state): State<AppState>,
    Path(meal_id): Path<Uuid>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = repo::list(state.store.as_ref(), &by_meal(meal_id)).await?;
    Ok(Json(reviews))
}

#[instrument(skip(state))]
pub async fn get_review(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Review>> {
    repo::find(state.store.as_ref(), id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("review"))
}

#[instrument(skip(state, body))]
pub async fn edit_review(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<EditReviewRequest>,
) -> AppResult<Json<UpdateResult>> {
    let result = state
        .store
        .update_one(
            Collection::Reviews,
            &Filter::by_id(id),
            &Update::new().set("text", body.new_text),
        )
        .await?;
    Ok(Json(result))
}

#[instrument(skip(state))]
pub async fn all_reviews(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = repo::list(state.store.as_ref(), &Filter::all()).await?;
    Ok(Json(reviews))
}
