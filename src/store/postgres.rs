use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    Collection, Condition, DeleteResult, Document, DocumentStore, Filter, FindOptions, SortOrder,
    Update, UpdateResult, ID_FIELD,
};

/// Every collection lives in the `documents` table as JSONB, keyed by `collection`.
#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

impl PgDocumentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn update(
        &self,
        coll: Collection,
        filter: &Filter,
        update: &Update,
        many: bool,
    ) -> anyhow::Result<UpdateResult> {
        let mut qb = QueryBuilder::<Postgres>::new("WITH target AS (SELECT id, body FROM documents WHERE ");
        push_filter(&mut qb, coll, filter);
        qb.push(" ORDER BY created_at");
        if !many {
            qb.push(" LIMIT 1");
        }
        qb.push("), changed AS (UPDATE documents d SET body = ");
        push_update_expr(&mut qb, update, "t.body");
        qb.push(" FROM target t WHERE d.id = t.id AND t.body IS DISTINCT FROM ");
        push_update_expr(&mut qb, update, "t.body");
        qb.push(
            " RETURNING d.id) \
             SELECT (SELECT count(*) FROM target), (SELECT count(*) FROM changed)",
        );

        let (matched, modified) = qb
            .build_query_as::<(i64, i64)>()
            .fetch_one(&self.db)
            .await
            .with_context(|| format!("update {}", coll.as_str()))?;

        let mut result = UpdateResult {
            matched_count: matched as u64,
            modified_count: modified as u64,
            upserted_id: None,
        };
        if matched == 0 && update.upsert {
            let id = self.insert_one(coll, update.seed(filter)).await?;
            result.upserted_id = Some(id);
        }
        Ok(result)
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, coll: Collection, filter: &Filter) {
    qb.push("collection = ").push_bind(coll.as_str());

    let equalities = filter.equalities();
    if !equalities.is_empty() {
        qb.push(" AND body @> ").push_bind(Json(Value::Object(equalities)));
    }

    for (field, cond) in &filter.conditions {
        match cond {
            Condition::Eq(_) => {}
            Condition::Between(min, max) => {
                qb.push(" AND CASE WHEN jsonb_typeof(body -> ")
                    .push_bind(field.clone())
                    .push(") = 'number' THEN (body ->> ")
                    .push_bind(field.clone())
                    .push(")::float8 END BETWEEN ")
                    .push_bind(*min)
                    .push(" AND ")
                    .push_bind(*max);
            }
            Condition::Contains(needle) => {
                qb.push(" AND body ->> ")
                    .push_bind(field.clone())
                    .push(" ILIKE ")
                    .push_bind(format!("%{}%", escape_like(needle)));
            }
        }
    }
}

/// `base || set`, then one `jsonb_set` per increment.
fn push_update_expr(qb: &mut QueryBuilder<'_, Postgres>, update: &Update, base: &str) {
    let mut set = update.set.clone();
    set.remove(ID_FIELD);

    for _ in &update.inc {
        qb.push("jsonb_set(");
    }
    qb.push("(")
        .push(base)
        .push(" || ")
        .push_bind(Json(Value::Object(set)))
        .push(")");
    for (field, by) in &update.inc {
        qb.push(", ARRAY[")
            .push_bind(field.clone())
            .push("]::text[], to_jsonb(COALESCE(CASE WHEN jsonb_typeof(")
            .push(base)
            .push(" -> ")
            .push_bind(field.clone())
            .push(") = 'number' THEN (")
            .push(base)
            .push(" ->> ")
            .push_bind(field.clone())
            .push(")::numeric END, 0) + ")
            .push_bind(*by)
            .push("), true)");
    }
}

/// Postgres LIMIT/OFFSET are signed; clamp instead of wrapping negative.
fn to_bigint(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_one(&self, coll: Collection, filter: &Filter) -> anyhow::Result<Option<Document>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT body FROM documents WHERE ");
        push_filter(&mut qb, coll, filter);
        qb.push(" ORDER BY created_at LIMIT 1");
        let row = qb
            .build_query_scalar::<Json<Document>>()
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("find_one {}", coll.as_str()))?;
        Ok(row.map(|Json(doc)| doc))
    }

    async fn find_many(
        &self,
        coll: Collection,
        filter: &Filter,
        opts: &FindOptions,
    ) -> anyhow::Result<Vec<Document>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT body FROM documents WHERE ");
        push_filter(&mut qb, coll, filter);
        qb.push(" ORDER BY ");
        if let Some((field, order)) = &opts.sort {
            qb.push("body -> ").push_bind(field.clone());
            qb.push(match order {
                #[cfg(test)]
                SortOrder::Asc => " ASC NULLS LAST, ",
                SortOrder::Desc => " DESC NULLS LAST, ",
            });
        }
        qb.push("created_at");
        if let Some(limit) = opts.limit {
            qb.push(" LIMIT ").push_bind(to_bigint(limit));
        }
        qb.push(" OFFSET ").push_bind(to_bigint(opts.skip));

        let rows = qb
            .build_query_scalar::<Json<Document>>()
            .fetch_all(&self.db)
            .await
            .with_context(|| format!("find_many {}", coll.as_str()))?;
        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn count(&self, coll: Collection, filter: &Filter) -> anyhow::Result<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT count(*) FROM documents WHERE ");
        push_filter(&mut qb, coll, filter);
        let n = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await
            .with_context(|| format!("count {}", coll.as_str()))?;
        Ok(n as u64)
    }

    async fn sum(&self, coll: Collection, field: &str) -> anyhow::Result<f64> {
        let total = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT COALESCE(SUM(CASE WHEN jsonb_typeof(body -> $2) = 'number'
                                     THEN (body ->> $2)::float8 END), 0)::float8
            FROM documents
            WHERE collection = $1
            "#,
        )
        .bind(coll.as_str())
        .bind(field)
        .fetch_one(&self.db)
        .await
        .with_context(|| format!("sum {}.{}", coll.as_str(), field))?;
        Ok(total)
    }

    async fn insert_one(&self, coll: Collection, mut doc: Document) -> anyhow::Result<Uuid> {
        let id = Uuid::new_v4();
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        sqlx::query(
            r#"
            INSERT INTO documents (id, collection, body)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(coll.as_str())
        .bind(Json(doc))
        .execute(&self.db)
        .await
        .with_context(|| format!("insert into {}", coll.as_str()))?;
        Ok(id)
    }

    async fn update_one(
        &self,
        coll: Collection,
        filter: &Filter,
        update: &Update,
    ) -> anyhow::Result<UpdateResult> {
        self.update(coll, filter, update, false).await
    }

    async fn update_many(
        &self,
        coll: Collection,
        filter: &Filter,
        update: &Update,
    ) -> anyhow::Result<UpdateResult> {
        self.update(coll, filter, update, true).await
    }

    async fn delete_one(&self, coll: Collection, filter: &Filter) -> anyhow::Result<DeleteResult> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "DELETE FROM documents WHERE id = (SELECT id FROM documents WHERE ",
        );
        push_filter(&mut qb, coll, filter);
        qb.push(" ORDER BY created_at LIMIT 1)");
        let res = qb
            .build()
            .execute(&self.db)
            .await
            .with_context(|| format!("delete from {}", coll.as_str()))?;
        Ok(DeleteResult {
            deleted_count: res.rows_affected(),
        })
    }
}
