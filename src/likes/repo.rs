use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{to_document, Collection, DeleteResult, DocumentStore, Filter};

/// "This user currently likes this meal"; at most one per (email, meal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub email: String,
    #[serde(rename = "mealId")]
    pub meal_id: Uuid,
}

fn key(email: &str, meal_id: Uuid) -> Filter {
    Filter::all()
        .eq("email", email)
        .eq("mealId", meal_id.to_string())
}

pub async fn exists(store: &dyn DocumentStore, email: &str, meal_id: Uuid) -> anyhow::Result<bool> {
    Ok(store
        .find_one(Collection::Likes, &key(email, meal_id))
        .await?
        .is_some())
}

pub async fn create(store: &dyn DocumentStore, like: &Like) -> anyhow::Result<Uuid> {
    store.insert_one(Collection::Likes, to_document(like)?).await
}

pub async fn delete(
    store: &dyn DocumentStore,
    email: &str,
    meal_id: Uuid,
) -> anyhow::Result<DeleteResult> {
    store
        .delete_one(Collection::Likes, &key(email, meal_id))
        .await
}
