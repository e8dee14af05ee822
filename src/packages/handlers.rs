use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::{from_document, from_documents, Collection, Document, Filter, FindOptions},
};

/// Subscription tier offered to students.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(flatten)]
    pub perks: Document,
}

pub fn package_routes() -> Router<AppState> {
    Router::new()
        .route("/package", get(list_packages))
        .route("/package/:id", get(get_package))
}

#[instrument(skip(state))]
pub async fn list_packages(State(state): State<AppState>) -> AppResult<Json<Vec<Package>>> {
    let docs = state
        .store
        .find_many(Collection::Packages, &Filter::all(), &FindOptions::default())
        .await?;
    Ok(Json(from_documents(docs)?))
}

#[instrument(skip(state))]
pub async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Package>> {
    let doc = state
        .store
        .find_one(Collection::Packages, &Filter::by_id(id))
        .await?
        .ok_or(AppError::NotFound("package"))?;
    Ok(Json(from_document(doc)?))
}
