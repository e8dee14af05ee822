use tracing::{debug, info};
use uuid::Uuid;

use super::repo::{self, Like};
use crate::{
    error::{AppError, AppResult},
    meals::services::locate,
    store::{DocumentStore, Filter, Update, UpdateResult},
};

#[derive(Debug, Clone, PartialEq)]
pub enum LikeOutcome {
    AlreadyLiked,
    Liked(UpdateResult),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnlikeOutcome {
    /// Identity mismatch or nothing to undo.
    Skipped,
    Unliked(UpdateResult),
}

/// Adds `by` to the counter of the meal, in whichever store holds it.
async fn bump_likes(store: &dyn DocumentStore, meal_id: Uuid, by: i64) -> AppResult<UpdateResult> {
    let found = locate(store, meal_id)
        .await?
        .ok_or(AppError::NotFound("meal"))?;
    let result = store
        .update_one(
            found.source.collection(),
            &Filter::by_id(meal_id),
            &Update::new().inc("likes", by),
        )
        .await?;
    Ok(result)
}

/// Record then count; the two writes are independent, so a failure in
/// between leaves a like that the counter never saw.
pub async fn like(store: &dyn DocumentStore, meal_id: Uuid, email: &str) -> AppResult<LikeOutcome> {
    if repo::exists(store, email, meal_id).await? {
        debug!(meal_id = %meal_id, email = %email, "already liked");
        return Ok(LikeOutcome::AlreadyLiked);
    }

    repo::create(
        store,
        &Like {
            email: email.to_string(),
            meal_id,
        },
    )
    .await?;
    let result = bump_likes(store, meal_id, 1).await?;
    info!(meal_id = %meal_id, email = %email, "meal liked");
    Ok(LikeOutcome::Liked(result))
}

/// Only the owner of the like may undo it; anyone else gets a silent no-op.
pub async fn unlike(
    store: &dyn DocumentStore,
    meal_id: Uuid,
    email: &str,
    caller: &str,
) -> AppResult<UnlikeOutcome> {
    if email != caller {
        debug!(meal_id = %meal_id, email = %email, caller = %caller, "unlike for someone else ignored");
        return Ok(UnlikeOutcome::Skipped);
    }
    if !repo::exists(store, email, meal_id).await? {
        return Ok(UnlikeOutcome::Skipped);
    }

    repo::delete(store, email, meal_id).await?;
    let result = bump_likes(store, meal_id, -1).await?;
    info!(meal_id = %meal_id, email = %email, "meal unliked");
    Ok(UnlikeOutcome::Unliked(result))
}

pub async fn is_liked(store: &dyn DocumentStore, meal_id: Uuid, email: &str) -> AppResult<bool> {
    Ok(repo::exists(store, email, meal_id).await?)
}
