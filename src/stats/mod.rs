use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::{
    error::AppResult,
    state::AppState,
    store::{Collection, Filter},
};

#[derive(Debug, Serialize)]
pub struct Stats {
    pub success: bool,
    pub total_users: u64,
    pub total_requested_meals: u64,
    pub total_earnings: f64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}

#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<Stats>> {
    let store = state.store.as_ref();
    let all = Filter::all();
    let (total_users, total_requested_meals, total_earnings) = tokio::try_join!(
        store.count(Collection::Users, &all),
        store.count(Collection::RequestedMeals, &all),
        store.sum(Collection::RequestedMeals, "price"),
    )?;
    Ok(Json(Stats {
        success: true,
        total_users,
        total_requested_meals,
        total_earnings,
    }))
}
