use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CatalogQuery, CountResponse, PromoteRequest, PromoteResponse},
    repo::{self, Meal, MealSource},
    services::{self, catalog_filter, catalog_page, Promotion},
};
use crate::{
    auth::extractors::AdminUser,
    error::{AppError, AppResult},
    state::AppState,
    store::{DeleteResult, Document, Filter, InsertResult, Update, UpdateResult, ID_FIELD},
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals))
        .route("/mealsCount", get(count_meals))
        .route("/meal/:id", get(get_meal))
        .route("/upcoming-meals", get(list_upcoming))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meal", post(create_meal))
        .route("/meal/:id", patch(update_meal).delete(delete_meal))
        .route("/upcoming-meal/:id", patch(promote_meal))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Query(q): Query<CatalogQuery>,
) -> AppResult<Json<Vec<Meal>>> {
    let filter = catalog_filter(q.filter.as_deref(), q.price_range.as_deref())?;
    let meals = repo::list(
        state.store.as_ref(),
        MealSource::Active,
        &filter,
        &catalog_page(q.page, q.limit),
    )
    .await?;
    Ok(Json(meals))
}

#[instrument(skip(state))]
pub async fn count_meals(
    State(state): State<AppState>,
    Query(q): Query<CatalogQuery>,
) -> AppResult<Json<CountResponse>> {
    let filter = catalog_filter(q.filter.as_deref(), q.price_range.as_deref())?;
    let count = state
        .store
        .count(MealSource::Active.collection(), &filter)
        .await?;
    Ok(Json(CountResponse { count }))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Meal>> {
    services::locate(state.store.as_ref(), id)
        .await?
        .map(|found| Json(found.meal))
        .ok_or(AppError::NotFound("meal"))
}

#[instrument(skip(state))]
pub async fn list_upcoming(State(state): State<AppState>) -> AppResult<Json<Vec<Meal>>> {
    let meals = repo::list_upcoming_by_likes(state.store.as_ref()).await?;
    Ok(Json(meals))
}

#[instrument(skip(state, meal))]
pub async fn create_meal(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(mut meal): Json<Meal>,
) -> AppResult<Json<InsertResult>> {
    meal.id = None;
    let (source, id) = repo::insert(state.store.as_ref(), &meal).await?;
    info!(meal_id = %id, source = ?source, by = %admin, "meal added");
    Ok(Json(InsertResult { inserted_id: id }))
}

#[instrument(skip(state, fields))]
pub async fn update_meal(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(mut fields): Json<Document>,
) -> AppResult<Json<UpdateResult>> {
    fields.remove(ID_FIELD);
    let result = state
        .store
        .update_one(
            MealSource::Active.collection(),
            &Filter::by_id(id),
            &Update::new().set_all(fields),
        )
        .await?;
    Ok(Json(result))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResult>> {
    let result = state
        .store
        .delete_one(MealSource::Active.collection(), &Filter::by_id(id))
        .await?;
    info!(meal_id = %id, by = %admin, deleted = result.deleted_count, "meal deleted");
    Ok(Json(result))
}

/// PATCH /upcoming-meal/:id { category }
#[instrument(skip(state, body))]
pub async fn promote_meal(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<PromoteRequest>,
) -> AppResult<Json<PromoteResponse>> {
    let response = match services::promote(state.store.as_ref(), id, &body.category).await? {
        Promotion::Moved { relabel, .. } => PromoteResponse {
            message: "meal moved",
            result: Some(relabel),
        },
        Promotion::Failed => PromoteResponse {
            message: "something wrong",
            result: None,
        },
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::build_app,
        auth::jwt::JwtKeys,
        store::{Collection, DocumentStore, MemoryStore},
    };
    use axum::{
        body::{to_bytes, Body},
        extract::FromRef,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
        let res = build_app(state.clone()).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn bearer(state: &AppState, email: &str) -> String {
        format!("Bearer {}", JwtKeys::from_ref(state).sign(email).unwrap())
    }

    async fn with_admin(store: &MemoryStore) {
        let admin = json!({"email": "admin@uni.edu", "role": "admin"});
        store
            .insert_one(Collection::Users, admin.as_object().cloned().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn upcoming_meals_are_added_to_their_own_store_and_served_by_id() {
        let store = Arc::new(MemoryStore::new());
        with_admin(&store).await;
        let state = AppState::fake_with_store(store.clone());

        let req = Request::post("/api/v1/meal")
            .header("authorization", bearer(&state, "admin@uni.edu"))
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"name": "Ramen", "category": "upcoming", "price": 9.5}).to_string(),
            ))
            .unwrap();
        let (status, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["inserted_id"].as_str().unwrap().to_string();

        assert_eq!(
            store.count(Collection::UpcomingMeals, &Filter::all()).await.unwrap(),
            1
        );
        let (status, meal) = send(
            &state,
            Request::get(format!("/api/v1/meal/{}", id)).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(meal["name"], "Ramen");
        assert_eq!(meal["likes"], 0);
    }

    #[tokio::test]
    async fn unknown_meal_is_not_found() {
        let state = AppState::fake();
        let (status, body) = send(
            &state,
            Request::get(format!("/api/v1/meal/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "meal not found");
    }

    #[tokio::test]
    async fn promotion_requires_admin_role() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::fake_with_store(store.clone());
        let req = Request::patch(format!("/api/v1/upcoming-meal/{}", Uuid::new_v4()))
            .header("authorization", bearer(&state, "student@uni.edu"))
            .header("content-type", "application/json")
            .body(Body::from(json!({"category": "Lunch"}).to_string()))
            .unwrap();
        let (status, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn promotion_of_unknown_meal_reports_generic_failure() {
        let store = Arc::new(MemoryStore::new());
        with_admin(&store).await;
        let state = AppState::fake_with_store(store.clone());
        let req = Request::patch(format!("/api/v1/upcoming-meal/{}", Uuid::new_v4()))
            .header("authorization", bearer(&state, "admin@uni.edu"))
            .header("content-type", "application/json")
            .body(Body::from(json!({"category": "Lunch"}).to_string()))
            .unwrap();
        let (status, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "something wrong"}));
    }

    #[tokio::test]
    async fn catalog_past_the_last_page_is_empty() {
        let state = AppState::fake();
        let (status, body) = send(
            &state,
            Request::get(format!("/api/v1/meals?page={}&limit=2", u64::MAX))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn catalog_rejects_malformed_price_range() {
        let state = AppState::fake();
        let (status, _) = send(
            &state,
            Request::get("/api/v1/meals?priceRange=cheap")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
