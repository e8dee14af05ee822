use serde::{Deserialize, Serialize};

use crate::store::UpdateResult;

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LikedQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<UpdateResult>,
}

#[derive(Debug, Serialize)]
pub struct LikedResponse {
    pub liked: bool,
}
