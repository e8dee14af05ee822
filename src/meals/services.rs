use tracing::{info, warn};
use uuid::Uuid;

use super::repo::{Meal, MealSource};
use crate::error::{AppError, AppResult};
use crate::store::{from_document, DocumentStore, Filter, FindOptions, Update, UpdateResult, ID_FIELD};

/// A meal together with the lifecycle state it was found in.
#[derive(Debug, Clone)]
pub struct LocatedMeal {
    pub source: MealSource,
    pub meal: Meal,
}

/// Finds a meal by id, trying the active store before the upcoming one.
pub async fn locate(store: &dyn DocumentStore, id: Uuid) -> anyhow::Result<Option<LocatedMeal>> {
    let filter = Filter::by_id(id);
    for source in MealSource::LOOKUP_ORDER {
        if let Some(doc) = store.find_one(source.collection(), &filter).await? {
            return Ok(Some(LocatedMeal {
                source,
                meal: from_document(doc)?,
            }));
        }
    }
    Ok(None)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Promotion {
    Moved { relabel: UpdateResult, new_id: Uuid },
    Failed,
}

/// Moves an upcoming meal into the active store under `category`.
///
/// Relabel in place, copy into the active store, then delete the original.
/// Nothing is rolled back: a failed copy leaves the relabelled original in the
/// upcoming store, and a failed delete leaves the meal in both stores.
pub async fn promote(
    store: &dyn DocumentStore,
    id: Uuid,
    category: &str,
) -> anyhow::Result<Promotion> {
    let filter = Filter::by_id(id);
    let upcoming = MealSource::Upcoming.collection();

    let relabel = store
        .update_one(upcoming, &filter, &Update::new().set("category", category))
        .await?;
    if relabel.modified_count != 1 {
        warn!(meal_id = %id, matched = relabel.matched_count, "promotion relabel modified nothing");
        return Ok(Promotion::Failed);
    }

    let Some(mut doc) = store.find_one(upcoming, &filter).await? else {
        warn!(meal_id = %id, "relabelled meal vanished before copy");
        return Ok(Promotion::Failed);
    };
    doc.remove(ID_FIELD);

    let new_id = match store.insert_one(MealSource::Active.collection(), doc).await {
        Ok(new_id) => new_id,
        Err(e) => {
            warn!(error = %e, meal_id = %id, "promotion copy failed; meal stays upcoming");
            return Ok(Promotion::Failed);
        }
    };

    store.delete_one(upcoming, &filter).await?;
    info!(meal_id = %id, new_id = %new_id, category = %category, "meal promoted");
    Ok(Promotion::Moved { relabel, new_id })
}

/// `min-max`, inclusive.
pub fn parse_price_range(raw: &str) -> AppResult<(f64, f64)> {
    let (min, max) = raw
        .split_once('-')
        .ok_or_else(|| AppError::bad_input("priceRange must look like min-max"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|_| AppError::bad_input("priceRange bounds must be numbers"))
    };
    Ok((parse(min)?, parse(max)?))
}

pub fn catalog_filter(category: Option<&str>, price_range: Option<&str>) -> AppResult<Filter> {
    let mut filter = Filter::all();
    if let Some(category) = category.filter(|c| !c.is_empty()) {
        filter = filter.eq("category", category);
    }
    if let Some(range) = price_range.filter(|r| !r.is_empty()) {
        let (min, max) = parse_price_range(range)?;
        filter = filter.between("price", min, max);
    }
    Ok(filter)
}

/// `limit == 0` disables paging.
pub fn catalog_page(page: u64, limit: u64) -> FindOptions {
    if limit == 0 {
        return FindOptions::default();
    }
    FindOptions::page(page.max(1).saturating_sub(1).saturating_mul(limit), limit)
}
