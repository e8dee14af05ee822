use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{
    from_document, from_documents, to_document, Collection, Document, DocumentStore, Filter,
    FindOptions, Update, UpdateResult,
};

pub const ADMIN_ROLE: &str = "admin";

/// User record in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Subscription package the user bought, e.g. "gold".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(flatten)]
    pub profile: Document,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

pub async fn find_by_email(store: &dyn DocumentStore, email: &str) -> anyhow::Result<Option<User>> {
    store
        .find_one(Collection::Users, &Filter::all().eq("email", email))
        .await?
        .map(from_document)
        .transpose()
}

pub async fn create(store: &dyn DocumentStore, user: &User) -> anyhow::Result<Uuid> {
    store.insert_one(Collection::Users, to_document(user)?).await
}

pub async fn search(
    store: &dyn DocumentStore,
    email: Option<&str>,
    name: Option<&str>,
) -> anyhow::Result<Vec<User>> {
    let mut filter = Filter::all();
    if let Some(email) = email {
        filter = filter.contains("email", email);
    }
    if let Some(name) = name {
        filter = filter.contains("name", name);
    }
    let docs = store
        .find_many(Collection::Users, &filter, &FindOptions::default())
        .await?;
    from_documents(docs)
}

pub async fn promote_to_admin(store: &dyn DocumentStore, id: Uuid) -> anyhow::Result<UpdateResult> {
    store
        .update_one(
            Collection::Users,
            &Filter::by_id(id),
            &Update::new().set("role", ADMIN_ROLE),
        )
        .await
}

pub async fn set_package(
    store: &dyn DocumentStore,
    email: &str,
    package: &str,
) -> anyhow::Result<UpdateResult> {
    store
        .update_one(
            Collection::Users,
            &Filter::all().eq("email", email),
            &Update::new().set("package", package),
        )
        .await
}
