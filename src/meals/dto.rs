use serde::{Deserialize, Serialize};

use crate::store::UpdateResult;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    /// Category equality.
    pub filter: Option<String>,
    #[serde(rename = "priceRange")]
    pub price_range: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default)]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct PromoteResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<UpdateResult>,
}
