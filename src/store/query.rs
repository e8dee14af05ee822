#[cfg(test)]
use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use super::ID_FIELD;

pub type Document = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    /// Inclusive numeric range.
    Between(f64, f64),
    /// Case-insensitive substring match on a string field.
    Contains(String),
}

/// Conjunction of per-field conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<(String, Condition)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: Uuid) -> Self {
        Self::all().eq(ID_FIELD, id.to_string())
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Eq(value.into())));
        self
    }

    pub fn between(mut self, field: &str, min: f64, max: f64) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Between(min, max)));
        self
    }

    pub fn contains(mut self, field: &str, needle: &str) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Contains(needle.to_string())));
        self
    }

    #[cfg(test)]
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|(field, cond)| {
            let value = doc.get(field);
            match cond {
                Condition::Eq(expected) => value == Some(expected),
                Condition::Between(min, max) => value
                    .and_then(Value::as_f64)
                    .map(|v| v >= *min && v <= *max)
                    .unwrap_or(false),
                Condition::Contains(needle) => value
                    .and_then(Value::as_str)
                    .map(|s| s.to_lowercase().contains(&needle.to_lowercase()))
                    .unwrap_or(false),
            }
        })
    }

    /// Equality fields, used to seed a document on upsert.
    pub fn equalities(&self) -> Document {
        self.conditions
            .iter()
            .filter_map(|(field, cond)| match cond {
                Condition::Eq(v) => Some((field.clone(), v.clone())),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    #[cfg(test)]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub skip: u64,
    pub limit: Option<u64>,
    pub sort: Option<(String, SortOrder)>,
}

impl FindOptions {
    pub fn page(skip: u64, limit: u64) -> Self {
        Self {
            skip,
            limit: Some(limit),
            sort: None,
        }
    }

    pub fn sorted(field: &str, order: SortOrder) -> Self {
        Self {
            sort: Some((field.to_string(), order)),
            ..Self::default()
        }
    }
}

/// `$set` and `$inc` in one update, optionally upserting.
#[derive(Debug, Clone, Default)]
pub struct Update {
    pub set: Document,
    pub inc: Vec<(String, i64)>,
    pub upsert: bool,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set.insert(field.to_string(), value.into());
        self
    }

    pub fn set_all(mut self, fields: Document) -> Self {
        self.set.extend(fields);
        self
    }

    pub fn inc(mut self, field: &str, by: i64) -> Self {
        self.inc.push((field.to_string(), by));
        self
    }

    pub fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }

    /// Applies the update in place. Returns whether the document changed.
    pub fn apply(&self, doc: &mut Document) -> bool {
        let before = doc.clone();
        for (field, value) in &self.set {
            if field != ID_FIELD {
                doc.insert(field.clone(), value.clone());
            }
        }
        for (field, by) in &self.inc {
            let next = increment(doc.get(field), *by);
            doc.insert(field.clone(), next);
        }
        *doc != before
    }

    /// Document created when an upsert matched nothing.
    pub fn seed(&self, filter: &Filter) -> Document {
        let mut doc = filter.equalities();
        doc.remove(ID_FIELD);
        self.apply(&mut doc);
        doc
    }
}

fn increment(current: Option<&Value>, by: i64) -> Value {
    match current {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Value::from(i + by),
            None => n
                .as_f64()
                .and_then(|f| Number::from_f64(f + by as f64))
                .map(Value::Number)
                .unwrap_or(Value::from(by)),
        },
        _ => Value::from(by),
    }
}

/// Ordering used for sorted reads: numbers, then strings, then everything else.
#[cfg(test)]
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            Some(Value::Number(_)) => 0,
            Some(Value::String(_)) => 1,
            _ => 2,
        }
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsertResult {
    pub inserted_id: Uuid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    pub deleted_count: u64,
}
