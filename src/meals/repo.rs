use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{
    from_documents, to_document, Collection, Document, DocumentStore, Filter, FindOptions,
    SortOrder,
};

/// Category label of meals staged in the upcoming collection.
pub const UPCOMING_CATEGORY: &str = "upcoming";

/// Meal record; `rating`, `reviews_count` and `likes` are derived counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews_count: i64,
    /// May dip below zero under racing unlikes.
    #[serde(default)]
    pub likes: i64,
    /// Descriptive fields (image, description, ingredients, distributor...).
    #[serde(flatten)]
    pub details: Document,
}

/// Lifecycle state of a meal, i.e. which collection holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSource {
    Active,
    Upcoming,
}

impl MealSource {
    /// Lookup order across lifecycle states.
    pub const LOOKUP_ORDER: [MealSource; 2] = [MealSource::Active, MealSource::Upcoming];

    pub fn collection(self) -> Collection {
        match self {
            MealSource::Active => Collection::Meals,
            MealSource::Upcoming => Collection::UpcomingMeals,
        }
    }

    pub fn for_category(category: &str) -> Self {
        if category == UPCOMING_CATEGORY {
            MealSource::Upcoming
        } else {
            MealSource::Active
        }
    }
}

pub async fn list(
    store: &dyn DocumentStore,
    source: MealSource,
    filter: &Filter,
    opts: &FindOptions,
) -> anyhow::Result<Vec<Meal>> {
    let docs = store.find_many(source.collection(), filter, opts).await?;
    from_documents(docs)
}

pub async fn list_upcoming_by_likes(store: &dyn DocumentStore) -> anyhow::Result<Vec<Meal>> {
    list(
        store,
        MealSource::Upcoming,
        &Filter::all(),
        &FindOptions::sorted("likes", SortOrder::Desc),
    )
    .await
}

pub async fn insert(store: &dyn DocumentStore, meal: &Meal) -> anyhow::Result<(MealSource, Uuid)> {
    let source = MealSource::for_category(&meal.category);
    let id = store
        .insert_one(source.collection(), to_document(meal)?)
        .await?;
    Ok((source, id))
}
