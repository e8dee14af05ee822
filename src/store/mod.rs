use anyhow::Context;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod postgres;
mod query;

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use query::{
    Condition, DeleteResult, Document, Filter, FindOptions, InsertResult, SortOrder, Update,
    UpdateResult,
};

/// Field holding the store-assigned identity of every document.
pub const ID_FIELD: &str = "_id";

/// Logical collections of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Meals,
    UpcomingMeals,
    Users,
    Reviews,
    Likes,
    Payments,
    RequestedMeals,
    Packages,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Meals => "meals",
            Collection::UpcomingMeals => "upcomingMeals",
            Collection::Users => "users",
            Collection::Reviews => "reviews",
            Collection::Likes => "likes",
            Collection::Payments => "payments",
            Collection::RequestedMeals => "requestedMeals",
            Collection::Packages => "package",
        }
    }
}

/// Document store collaborator. Every call is one round trip; nothing is cached
/// and no call is isolated from concurrent writers beyond the single operation.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, coll: Collection, filter: &Filter) -> anyhow::Result<Option<Document>>;

    async fn find_many(
        &self,
        coll: Collection,
        filter: &Filter,
        opts: &FindOptions,
    ) -> anyhow::Result<Vec<Document>>;

    async fn count(&self, coll: Collection, filter: &Filter) -> anyhow::Result<u64>;

    /// Sum of a numeric field over the whole collection; non-numeric values are skipped.
    async fn sum(&self, coll: Collection, field: &str) -> anyhow::Result<f64>;

    /// Inserts `doc` under a freshly issued identity. Any `_id` already present is replaced.
    async fn insert_one(&self, coll: Collection, doc: Document) -> anyhow::Result<Uuid>;

    async fn update_one(
        &self,
        coll: Collection,
        filter: &Filter,
        update: &Update,
    ) -> anyhow::Result<UpdateResult>;

    async fn update_many(
        &self,
        coll: Collection,
        filter: &Filter,
        update: &Update,
    ) -> anyhow::Result<UpdateResult>;

    async fn delete_one(&self, coll: Collection, filter: &Filter) -> anyhow::Result<DeleteResult>;
}

pub fn to_document<T: Serialize>(value: &T) -> anyhow::Result<Document> {
    match serde_json::to_value(value).context("serialize document")? {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!("expected an object document, got {}", other),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> anyhow::Result<T> {
    serde_json::from_value(serde_json::Value::Object(doc)).context("deserialize document")
}

pub fn from_documents<T: DeserializeOwned>(docs: Vec<Document>) -> anyhow::Result<Vec<T>> {
    docs.into_iter().map(from_document).collect()
}
