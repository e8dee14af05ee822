use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{IntentRequest, IntentResponse, Payment};
use crate::{
    auth::extractors::{ensure_self, AuthUser},
    error::AppResult,
    state::AppState,
    store::{
        from_documents, to_document, Collection, Filter, FindOptions, InsertResult, SortOrder,
    },
};

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/payments", post(record_payment))
        .route("/my-payments/:email", get(my_payments))
}

#[instrument(skip(state, body))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(body): Json<IntentRequest>,
) -> AppResult<Json<IntentResponse>> {
    let cents = body.amount_cents()?;
    let client_secret = state.payments.create_intent(cents).await?;
    info!(email = %caller, cents, "payment intent issued");
    Ok(Json(IntentResponse { client_secret }))
}

#[instrument(skip(state, payment))]
pub async fn record_payment(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Json(mut payment): Json<Payment>,
) -> AppResult<Json<InsertResult>> {
    payment.id = None;
    let id = state
        .store
        .insert_one(Collection::Payments, to_document(&payment)?)
        .await?;
    info!(payment_id = %id, email = %payment.email, price = payment.price, "payment recorded");
    Ok(Json(InsertResult { inserted_id: id }))
}

#[instrument(skip(state))]
pub async fn my_payments(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(email): Path<String>,
) -> AppResult<Json<Vec<Payment>>> {
    ensure_self(&caller, &email)?;
    let docs = state
        .store
        .find_many(
            Collection::Payments,
            &Filter::all().eq("email", email),
            &FindOptions::sorted("date", SortOrder::Desc),
        )
        .await?;
    Ok(Json(from_documents(docs)?))
}
