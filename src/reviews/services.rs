use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo::{self, by_meal, Review};
use crate::{
    error::{AppError, AppResult},
    meals::repo::{Meal, MealSource},
    store::{
        from_document, to_document, Collection, DeleteResult, Document, DocumentStore, Filter,
        Update, UpdateResult, ID_FIELD,
    },
};

/// Validated input for a new review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub meal_id: Uuid,
    pub rating: f64,
    pub text: String,
    pub extra: Document,
}

/// Running mean after adding `rating` to `count` ratings averaging `mean`.
pub fn next_mean(mean: f64, count: i64, rating: f64) -> f64 {
    if count <= 0 {
        return rating;
    }
    let count = count as f64;
    (mean * count + rating) / (count + 1.0)
}

async fn active_meal(store: &dyn DocumentStore, meal_id: Uuid) -> AppResult<Meal> {
    let doc = store
        .find_one(MealSource::Active.collection(), &Filter::by_id(meal_id))
        .await?
        .ok_or(AppError::NotFound("meal"))?;
    Ok(from_document(doc)?)
}

/// Folds the rating into the meal's aggregate, then stores the review.
///
/// The aggregate is written first; if the review insert fails afterwards the
/// meal keeps counting a review that does not exist.
pub async fn record(store: &dyn DocumentStore, author: &str, input: NewReview) -> AppResult<Review> {
    let meal = active_meal(store, input.meal_id).await?;
    let mean = next_mean(meal.rating, meal.reviews_count, input.rating);

    store
        .update_one(
            MealSource::Active.collection(),
            &Filter::by_id(input.meal_id),
            &Update::new()
                .set("rating", Value::from(mean))
                .inc("reviews_count", 1),
        )
        .await?;

    let mut extra = input.extra;
    for reserved in [ID_FIELD, "email", "reviews_count", "likes"] {
        extra.remove(reserved);
    }
    let mut review = Review {
        id: None,
        meal_id: input.meal_id,
        rating: input.rating,
        text: input.text,
        email: author.to_string(),
        reviews_count: None,
        likes: None,
        extra,
    };
    let id = store
        .insert_one(Collection::Reviews, to_document(&review)?)
        .await?;
    review.id = Some(id);

    info!(review_id = %id, meal_id = %review.meal_id, rating = review.rating, mean, "review recorded");
    Ok(review)
}

/// Deletes a review and takes it out of the counters.
///
/// Only `reviews_count` moves; the meal's `rating` keeps the deleted review's
/// contribution.
pub async fn remove(store: &dyn DocumentStore, id: Uuid) -> AppResult<DeleteResult> {
    let review = repo::find(store, id)
        .await?
        .ok_or(AppError::NotFound("review"))?;

    let result = store
        .delete_one(Collection::Reviews, &Filter::by_id(id))
        .await?;
    if result.deleted_count == 1 {
        let dec = Update::new().inc("reviews_count", -1);
        store
            .update_many(Collection::Reviews, &by_meal(review.meal_id), &dec)
            .await?;
        store
            .update_one(
                MealSource::Active.collection(),
                &Filter::by_id(review.meal_id),
                &dec,
            )
            .await?;
        info!(review_id = %id, meal_id = %review.meal_id, "review deleted");
    } else {
        warn!(review_id = %id, "review disappeared before delete");
    }
    Ok(result)
}

/// Copies the meal's current `reviews_count` and `likes` onto its reviews.
/// Upserts, so a meal without reviews gains a counters-only review document.
pub async fn sync_counters(store: &dyn DocumentStore, meal_id: Uuid) -> AppResult<UpdateResult> {
    let meal = active_meal(store, meal_id).await?;
    let result = store
        .update_many(
            Collection::Reviews,
            &by_meal(meal_id),
            &Update::new()
                .set("reviews_count", meal.reviews_count)
                .set("likes", meal.likes)
                .upsert(),
        )
        .await?;
    Ok(result)
}
