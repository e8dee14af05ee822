use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{LikeRequest, LikeResponse, LikedQuery, LikedResponse},
    services::{self, LikeOutcome, UnlikeOutcome},
};
use crate::{auth::extractors::AuthUser, error::AppResult, state::AppState};

pub fn like_routes() -> Router<AppState> {
    Router::new()
        .route("/like/:meal_id", post(like_meal))
        .route("/unlike/:meal_id", post(unlike_meal))
        .route("/liked/:meal_id", get(check_liked))
}

#[instrument(skip(state, body))]
pub async fn like_meal(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(meal_id): Path<Uuid>,
    Json(body): Json<LikeRequest>,
) -> AppResult<Json<LikeResponse>> {
    let response = match services::like(state.store.as_ref(), meal_id, &body.email).await? {
        LikeOutcome::AlreadyLiked => LikeResponse {
            message: "already liked",
            result: None,
        },
        LikeOutcome::Liked(result) => LikeResponse {
            message: "Liked successfully",
            result: Some(result),
        },
    };
    Ok(Json(response))
}

#[instrument(skip(state, body))]
pub async fn unlike_meal(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(meal_id): Path<Uuid>,
    Json(body): Json<LikeRequest>,
) -> AppResult<Json<LikeResponse>> {
    let response =
        match services::unlike(state.store.as_ref(), meal_id, &body.email, &caller).await? {
            UnlikeOutcome::Skipped => LikeResponse {
                message: "nothing to undo",
                result: None,
            },
            UnlikeOutcome::Unliked(result) => LikeResponse {
                message: "Unliked successfully",
                result: Some(result),
            },
        };
    Ok(Json(response))
}

#[instrument(skip(state))]
pub async fn check_liked(
    State(state): State<AppState>,
    Path(meal_id): Path<Uuid>,
    Query(q): Query<LikedQuery>,
) -> AppResult<Json<LikedResponse>> {
    let liked = services::is_liked(state.store.as_ref(), meal_id, &q.email).await?;
    Ok(Json(LikedResponse { liked }))
}

#[cfg(test)]
mod tests {
    use crate::{
        app::build_app,
        auth::jwt::JwtKeys,
        state::AppState,
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
    use uuid::Uuid;

    #[tokio::test]
    async fn like_requires_authentication() {
        let state = AppState::fake();
        let req = Request::post(format!("/api/v1/like/{}", Uuid::new_v4()))
            .header("content-type", "application/json")
            .body(Body::from(json!({"email": "a@uni.edu"}).to_string()))
            .unwrap();
        let res = build_app(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn mismatched_unlike_is_answered_without_error() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state).sign("mallory@uni.edu").unwrap();
        let req = Request::post(format!("/api/v1/unlike/{}", Uuid::new_v4()))
            .header("cookie", format!("token={}", token))
            .header("content-type", "application/json")
            .body(Body::from(json!({"email": "a@uni.edu"}).to_string()))
            .unwrap();
        let res = build_app(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value =
            serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body, json!({"message": "nothing to undo"}));
    }

    #[tokio::test]
    async fn mixed_case_caller_can_undo_their_like() {
        let store = Arc::new(MemoryStore::new());
        let meal = json!({"name": "Halim", "category": "Dinner", "likes": 0});
        let meal_id = store
            .insert_one(Collection::Meals, meal.as_object().cloned().unwrap())
            .await
            .unwrap();
        let state = AppState::fake_with_store(store);

        let login = Request::post("/api/v1/jwt")
            .header("content-type", "application/json")
            .body(Body::from(json!({"email": "Rafi@Uni.edu"}).to_string()))
            .unwrap();
        let res = build_app(state.clone()).oneshot(login).await.unwrap();
        let body: Value =
            serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
        let token = body["token"].as_str().unwrap().to_string();

        for (action, expected) in [("like", "Liked successfully"), ("unlike", "Unliked successfully")] {
            let req = Request::post(format!("/api/v1/{}/{}", action, meal_id))
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(json!({"email": "Rafi@Uni.edu"}).to_string()))
                .unwrap();
            let res = build_app(state.clone()).oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            let body: Value =
                serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap())
                    .unwrap();
            assert_eq!(body["message"], expected);
        }
    }

    #[tokio::test]
    async fn liked_check_is_public() {
        let state = AppState::fake();
        let req = Request::get(format!("/api/v1/liked/{}?email=a@uni.edu", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        let res = build_app(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value =
            serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body, json!({"liked": false}));
    }
}
