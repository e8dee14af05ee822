use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::StripeConfig;

const STRIPE_PAYMENT_INTENTS_URL: &str = "https://api.stripe.com/v1/payment_intents";

/// Payment-intent collaborator: amount in cents in, client secret out.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, amount_cents: i64) -> anyhow::Result<String>;
}

pub struct StripeGateway {
    http_client: reqwest::Client,
    secret_key: String,
    currency: String,
}

impl StripeGateway {
    pub fn new(cfg: &StripeConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            secret_key: cfg.secret_key.clone(),
            currency: cfg.currency.clone(),
        }
    }
}

#[derive(Deserialize)]
struct PaymentIntent {
    client_secret: String,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, amount_cents: i64) -> anyhow::Result<String> {
        let amount = amount_cents.to_string();
        let response = self
            .http_client
            .post(STRIPE_PAYMENT_INTENTS_URL)
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", self.currency.as_str()),
                ("automatic_payment_methods[enabled]", "true"),
            ])
            .send()
            .await
            .context("stripe create payment intent")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "stripe error");
            anyhow::bail!("stripe responded with {}", status);
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .context("decode stripe payment intent")?;
        debug!(amount_cents, "payment intent created");
        Ok(intent.client_secret)
    }
}
