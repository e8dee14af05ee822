use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{
    from_document, from_documents, Collection, Document, DocumentStore, Filter, FindOptions,
};

/// Review record. `reviews_count`/`likes` mirror the parent meal's counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(rename = "mealId")]
    pub meal_id: Uuid,
    // counter-only documents created by the sync upsert carry no rating
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
    /// Display fields (meal title, reviewer name and photo...).
    #[serde(flatten)]
    pub extra: Document,
}

pub fn by_meal(meal_id: Uuid) -> Filter {
    Filter::all().eq("mealId", meal_id.to_string())
}

pub async fn find(store: &dyn DocumentStore, id: Uuid) -> anyhow::Result<Option<Review>> {
    store
        .find_one(Collection::Reviews, &Filter::by_id(id))
        .await?
        .map(from_document)
        .transpose()
}

pub async fn list(store: &dyn DocumentStore, filter: &Filter) -> anyhow::Result<Vec<Review>> {
    let docs = store
        .find_many(Collection::Reviews, filter, &FindOptions::default())
        .await?;
    from_documents(docs)
}
