use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Document;

pub const DELIVERED: &str = "Delivered";

/// A user's request for a meal delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealRequest {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(rename = "userEmail")]
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(flatten)]
    pub details: Document,
}
