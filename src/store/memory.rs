use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::query::compare_values;
use super::{
    Collection, DeleteResult, Document, DocumentStore, Filter, FindOptions, SortOrder, Update,
    UpdateResult, ID_FIELD,
};

/// Write operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    Insert,
    Delete,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<Collection, Vec<Document>>,
    failing: HashSet<(Collection, WriteOp)>,
}

/// Process-local document store, kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `op` against `coll` return an error.
    pub async fn fail_on(&self, coll: Collection, op: WriteOp) {
        self.inner.write().await.failing.insert((coll, op));
    }

    pub async fn recover(&self, coll: Collection, op: WriteOp) {
        self.inner.write().await.failing.remove(&(coll, op));
    }

    fn check(inner: &Inner, coll: Collection, op: WriteOp) -> anyhow::Result<()> {
        if inner.failing.contains(&(coll, op)) {
            anyhow::bail!("{:?} into {} rejected", op, coll.as_str());
        }
        Ok(())
    }

    fn update(
        inner: &mut Inner,
        coll: Collection,
        filter: &Filter,
        update: &Update,
        many: bool,
    ) -> anyhow::Result<UpdateResult> {
        let docs = inner.collections.entry(coll).or_default();
        let mut result = UpdateResult::default();
        for doc in docs.iter_mut().filter(|d| filter.matches(d)) {
            result.matched_count += 1;
            if update.apply(doc) {
                result.modified_count += 1;
            }
            if !many {
                break;
            }
        }

        if result.matched_count == 0 && update.upsert {
            Self::check(inner, coll, WriteOp::Insert)?;
            let id = Uuid::new_v4();
            let mut doc = update.seed(filter);
            doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            inner.collections.entry(coll).or_default().push(doc);
            result.upserted_id = Some(id);
        }
        Ok(result)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(&self, coll: Collection, filter: &Filter) -> anyhow::Result<Option<Document>> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(&coll)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn find_many(
        &self,
        coll: Collection,
        filter: &Filter,
        opts: &FindOptions,
    ) -> anyhow::Result<Vec<Document>> {
        let inner = self.inner.read().await;
        let mut docs: Vec<Document> = inner
            .collections
            .get(&coll)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();

        if let Some((field, order)) = &opts.sort {
            // missing fields sort last in either direction, like NULLS LAST
            docs.sort_by(|a, b| match (a.get(field), b.get(field)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (x, y) => {
                    let ord = compare_values(x, y);
                    match order {
                        SortOrder::Asc => ord,
                        SortOrder::Desc => ord.reverse(),
                    }
                }
            });
        }

        let limit = opts.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(docs
            .into_iter()
            .skip(opts.skip as usize)
            .take(limit)
            .collect())
    }

    async fn count(&self, coll: Collection, filter: &Filter) -> anyhow::Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(&coll)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count() as u64)
            .unwrap_or(0))
    }

    async fn sum(&self, coll: Collection, field: &str) -> anyhow::Result<f64> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(&coll)
            .map(|docs| docs.iter().filter_map(|d| d.get(field)?.as_f64()).sum::<f64>())
            .unwrap_or(0.0))
    }

    async fn insert_one(&self, coll: Collection, mut doc: Document) -> anyhow::Result<Uuid> {
        let mut inner = self.inner.write().await;
        Self::check(&inner, coll, WriteOp::Insert)?;
        let id = Uuid::new_v4();
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        inner.collections.entry(coll).or_default().push(doc);
        Ok(id)
    }

    async fn update_one(
        &self,
        coll: Collection,
        filter: &Filter,
        update: &Update,
    ) -> anyhow::Result<UpdateResult> {
        let mut inner = self.inner.write().await;
        Self::update(&mut inner, coll, filter, update, false)
    }

    async fn update_many(
        &self,
        coll: Collection,
        filter: &Filter,
        update: &Update,
    ) -> anyhow::Result<UpdateResult> {
        let mut inner = self.inner.write().await;
        Self::update(&mut inner, coll, filter, update, true)
    }

    async fn delete_one(&self, coll: Collection, filter: &Filter) -> anyhow::Result<DeleteResult> {
        let mut inner = self.inner.write().await;
        Self::check(&inner, coll, WriteOp::Delete)?;
        let docs = inner.collections.entry(coll).or_default();
        match docs.iter().position(|d| filter.matches(d)) {
            Some(pos) => {
                docs.remove(pos);
                Ok(DeleteResult { deleted_count: 1 })
            }
            None => Ok(DeleteResult { deleted_count: 0 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_issues_fresh_identity() {
        let store = MemoryStore::new();
        let id = store
            .insert_one(Collection::Meals, doc(json!({"_id": "stale", "name": "X"})))
            .await
            .unwrap();
        let found = store
            .find_one(Collection::Meals, &Filter::by_id(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["name"], "X");
        assert!(store
            .find_one(Collection::Meals, &Filter::all().eq("_id", "stale"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn find_many_sorts_then_pages() {
        let store = MemoryStore::new();
        for likes in [1, 7, 3, 5] {
            store
                .insert_one(Collection::UpcomingMeals, doc(json!({"likes": likes})))
                .await
                .unwrap();
        }
        let opts = FindOptions {
            skip: 1,
            limit: Some(2),
            sort: Some(("likes".into(), SortOrder::Desc)),
        };
        let docs = store
            .find_many(Collection::UpcomingMeals, &Filter::all(), &opts)
            .await
            .unwrap();
        let likes: Vec<i64> = docs.iter().map(|d| d["likes"].as_i64().unwrap()).collect();
        assert_eq!(likes, vec![5, 3]);
    }

    #[tokio::test]
    async fn missing_sort_field_comes_last_both_ways() {
        let store = MemoryStore::new();
        for d in [json!({"name": "none"}), json!({"likes": 2}), json!({"likes": 9})] {
            store.insert_one(Collection::UpcomingMeals, doc(d)).await.unwrap();
        }
        for (order, expected) in [
            (SortOrder::Desc, vec![json!(9), json!(2), Value::Null]),
            (SortOrder::Asc, vec![json!(2), json!(9), Value::Null]),
        ] {
            let docs = store
                .find_many(
                    Collection::UpcomingMeals,
                    &Filter::all(),
                    &FindOptions::sorted("likes", order),
                )
                .await
                .unwrap();
            let likes: Vec<Value> = docs
                .iter()
                .map(|d| d.get("likes").cloned().unwrap_or(Value::Null))
                .collect();
            assert_eq!(likes, expected);
        }
    }

    #[tokio::test]
    async fn update_one_touches_first_match_only() {
        let store = MemoryStore::new();
        for _ in 0..2 {
            store
                .insert_one(Collection::Reviews, doc(json!({"mealId": "m", "likes": 0})))
                .await
                .unwrap();
        }
        let res = store
            .update_one(
                Collection::Reviews,
                &Filter::all().eq("mealId", "m"),
                &Update::new().inc("likes", 1),
            )
            .await
            .unwrap();
        assert_eq!(res.matched_count, 1);
        assert_eq!(store.sum(Collection::Reviews, "likes").await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn update_many_upserts_when_nothing_matches() {
        let store = MemoryStore::new();
        let res = store
            .update_many(
                Collection::Reviews,
                &Filter::all().eq("mealId", "m"),
                &Update::new().set("reviews_count", 2).upsert(),
            )
            .await
            .unwrap();
        assert_eq!(res.matched_count, 0);
        assert!(res.upserted_id.is_some());
        assert_eq!(
            store
                .count(Collection::Reviews, &Filter::all().eq("reviews_count", 2))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn injected_failures_reject_writes_until_recovered() {
        let store = MemoryStore::new();
        store.fail_on(Collection::Meals, WriteOp::Insert).await;
        assert!(store
            .insert_one(Collection::Meals, Document::new())
            .await
            .is_err());
        store.recover(Collection::Meals, WriteOp::Insert).await;
        assert!(store.insert_one(Collection::Meals, Document::new()).await.is_ok());
    }
}
