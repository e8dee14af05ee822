use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::Document;

#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    #[serde(default)]
    pub price: Option<Value>,
}

impl IntentRequest {
    /// Price in the smallest currency unit. Accepts numbers and numeric strings.
    pub fn amount_cents(&self) -> AppResult<i64> {
        let price = match &self.price {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|p| p.is_finite())
        .ok_or_else(|| AppError::bad_input("price is required"))?;

        let cents = (price * 100.0).round() as i64;
        if cents < 1 {
            return Err(AppError::bad_input("price must be at least 0.01"));
        }
        Ok(cents)
    }
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub client_secret: String,
}

/// Settled payment as reported by the client after checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub email: String,
    #[serde(default)]
    pub price: f64,
    #[serde(flatten)]
    pub details: Document,
}
