//! In-process [`SearchEngine`] evaluating the query DSL of [`crate::search::query`].
//!
//! Used by tests and local tooling. Field paths are dotted and walk through
//! arrays, so `excerpt.tags.id` matches any tag of the document.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::error::AppError;
use crate::search::engine::{Hit, SearchEngine, SearchResponse};

const DEFAULT_SIZE: u64 = 10;

type Documents = BTreeMap<String, Value>;

#[derive(Default)]
pub struct MemoryEngine {
    indexes: Mutex<HashMap<String, Documents>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_index<T>(
        &self,
        index: &str,
        f: impl FnOnce(&mut Documents) -> T,
    ) -> Result<T, AppError> {
        let mut indexes = self
            .indexes
            .lock()
            .map_err(|_| AppError::Internal("memory engine lock poisoned".into()))?;
        let documents = indexes
            .get_mut(index)
            .ok_or_else(|| AppError::IndexMissing(index.to_string()))?;
        Ok(f(documents))
    }
}

#[async_trait]
impl SearchEngine for MemoryEngine {
    async fn exists(&self, index: &str) -> Result<bool, AppError> {
        let indexes = self
            .indexes
            .lock()
            .map_err(|_| AppError::Internal("memory engine lock poisoned".into()))?;
        Ok(indexes.contains_key(index))
    }

    async fn create(&self, index: &str, _definition: &Value) -> Result<(), AppError> {
        let mut indexes = self
            .indexes
            .lock()
            .map_err(|_| AppError::Internal("memory engine lock poisoned".into()))?;
        if indexes.contains_key(index) {
            return Err(AppError::Search(format!("index {index} already exists")));
        }
        indexes.insert(index.to_string(), Documents::new());
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), AppError> {
        let mut indexes = self
            .indexes
            .lock()
            .map_err(|_| AppError::Internal("memory engine lock poisoned".into()))?;
        indexes
            .remove(index)
            .map(|_| ())
            .ok_or_else(|| AppError::IndexMissing(index.to_string()))
    }

    async fn search(&self, index: &str, body: &Value) -> Result<SearchResponse, AppError> {
        self.with_index(index, |documents| {
            let documents = &*documents;
            let query = body.get("query").cloned().unwrap_or(Value::Null);
            let mut matched: Vec<(&String, &Value)> = documents
                .iter()
                .filter(|(id, source)| matches(&query, id, source, documents))
                .collect();

            let total = matched.len() as u64;
            if let Some(sort) = body.get("sort").and_then(Value::as_array) {
                matched.sort_by(|a, b| compare_by_sort(sort, a.1, b.1));
                if let Some(cursor) = body.get("search_after").and_then(Value::as_array) {
                    matched.retain(|(_, source)| after_cursor(sort, source, cursor));
                }
            }

            let from = body.get("from").and_then(Value::as_u64).unwrap_or(0) as usize;
            let size = body
                .get("size")
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_SIZE) as usize;

            let hits = matched
                .into_iter()
                .skip(from)
                .take(size)
                .map(|(id, source)| Hit {
                    id: id.clone(),
                    source: source.clone(),
                })
                .collect();

            SearchResponse { total, hits }
        })
    }

    async fn count(&self, index: &str, query: &Value) -> Result<u64, AppError> {
        self.with_index(index, |documents| {
            let documents = &*documents;
            documents
                .iter()
                .filter(|(id, source)| matches(query, id, source, documents))
                .count() as u64
        })
    }

    async fn get(&self, index: &str, id: &str) -> Result<Option<Value>, AppError> {
        self.with_index(index, |documents| documents.get(id).cloned())
    }

    async fn index(&self, index: &str, id: &str, source: &Value) -> Result<(), AppError> {
        self.with_index(index, |documents| {
            documents.insert(id.to_string(), source.clone());
        })
    }

    async fn delete(&self, index: &str, id: &str) -> Result<(), AppError> {
        self.with_index(index, |documents| {
            documents.remove(id);
        })
    }

    async fn refresh(&self, index: &str) -> Result<(), AppError> {
        self.with_index(index, |_| ())
    }
}

/// Keyword sub-field of a text field; it addresses the same source value.
const RAW_SUFFIX: &str = ".raw";

/// Values at a dotted path, flattening arrays on the way.
fn values_at<'a>(source: &'a Value, path: &str) -> Vec<&'a Value> {
    let path = path.strip_suffix(RAW_SUFFIX).unwrap_or(path);
    let mut current = vec![source];
    for segment in path.split('.') {
        current = current
            .into_iter()
            .flat_map(|value| match value {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .filter_map(|value| value.get(segment))
            .collect();
    }
    current
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .filter(|value| !value.is_null())
        .collect()
}

/// Single-entry object `{ field: spec }` as a pair.
fn field_entry(clause: &Value) -> Option<(&String, &Value)> {
    clause.as_object().and_then(|map| map.iter().next())
}

/// Unwraps the `{ "value": x }` / `{ "query": x }` long forms.
fn inner<'a>(spec: &'a Value, key: &str) -> &'a Value {
    spec.get(key).unwrap_or(spec)
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(x), Value::Number(y)) | (Value::Number(y), Value::String(x)) => {
            *x == y.to_string()
        }
        _ => a == b,
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn field_tokens(source: &Value, fields: &[String]) -> Vec<String> {
    fields
        .iter()
        .flat_map(|field| values_at(source, field))
        .filter_map(Value::as_str)
        .flat_map(tokens)
        .collect()
}

fn clause_list(spec: &Value, key: &str) -> Vec<Value> {
    match spec.get(key) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single.clone()],
    }
}

fn matches(query: &Value, id: &str, source: &Value, documents: &Documents) -> bool {
    let Some((kind, spec)) = field_entry(query) else {
        // an absent query matches everything
        return true;
    };

    match kind.as_str() {
        "match_all" => true,
        "bool" => {
            let must = clause_list(spec, "must");
            let filter = clause_list(spec, "filter");
            let must_not = clause_list(spec, "must_not");
            let should = clause_list(spec, "should");

            let required = spec
                .get("minimum_should_match")
                .and_then(Value::as_u64)
                .unwrap_or(if must.is_empty() && filter.is_empty() { 1 } else { 0 })
                as usize;

            must.iter()
                .chain(filter.iter())
                .all(|q| matches(q, id, source, documents))
                && !must_not.iter().any(|q| matches(q, id, source, documents))
                && (should.is_empty()
                    || should
                        .iter()
                        .filter(|q| matches(q, id, source, documents))
                        .count()
                        >= required)
        }
        "term" => field_entry(spec).is_some_and(|(field, expected)| {
            let expected = inner(expected, "value");
            values_at(source, field)
                .into_iter()
                .any(|v| same_value(v, expected))
        }),
        "terms" => field_entry(spec).is_some_and(|(field, expected)| {
            let expected = expected.as_array().cloned().unwrap_or_default();
            values_at(source, field)
                .into_iter()
                .any(|v| expected.iter().any(|e| same_value(v, e)))
        }),
        "ids" => spec
            .get("values")
            .and_then(Value::as_array)
            .is_some_and(|ids| ids.iter().any(|v| v.as_str() == Some(id))),
        "range" => field_entry(spec).is_some_and(|(field, bounds)| {
            values_at(source, field)
                .into_iter()
                .any(|v| within_range(v, bounds))
        }),
        "match" => field_entry(spec).is_some_and(|(field, text)| {
            let wanted = inner(text, "query").as_str().map(tokens).unwrap_or_default();
            let present = field_tokens(source, &[field.clone()]);
            wanted.iter().any(|t| present.contains(t))
        }),
        "prefix" => field_entry(spec).is_some_and(|(field, prefix)| {
            let prefix = inner(prefix, "value").as_str().unwrap_or_default();
            values_at(source, field)
                .into_iter()
                .filter_map(Value::as_str)
                .any(|v| v.starts_with(prefix))
        }),
        "more_like_this" => more_like_this(spec, id, source, documents),
        _ => false,
    }
}

fn more_like_this(spec: &Value, id: &str, source: &Value, documents: &Documents) -> bool {
    let fields: Vec<String> = spec
        .get("fields")
        .and_then(Value::as_array)
        .map(|f| f.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    let liked: HashSet<&str> = spec
        .get("like")
        .and_then(Value::as_array)
        .map(|l| l.iter().filter_map(|v| v.get("_id")?.as_str()).collect())
        .unwrap_or_default();
    if liked.contains(id) {
        return false;
    }
    let min_term_freq = spec.get("min_term_freq").and_then(Value::as_u64).unwrap_or(2) as usize;
    let min_doc_freq = spec.get("min_doc_freq").and_then(Value::as_u64).unwrap_or(5) as usize;

    let mut term_freq: HashMap<String, usize> = HashMap::new();
    for liked_id in &liked {
        if let Some(doc) = documents.get(*liked_id) {
            for token in field_tokens(doc, &fields) {
                *term_freq.entry(token).or_default() += 1;
            }
        }
    }

    let candidate = field_tokens(source, &fields);
    term_freq
        .into_iter()
        .filter(|(_, freq)| *freq >= min_term_freq)
        .filter(|(term, _)| {
            documents
                .values()
                .filter(|doc| field_tokens(doc, &fields).contains(term))
                .count()
                >= min_doc_freq
        })
        .any(|(term, _)| candidate.contains(&term))
}

fn as_instant(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => match (as_instant(a), as_instant(b)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => Some(a.as_str()?.cmp(b.as_str()?)),
        },
    }
}

fn within_range(value: &Value, bounds: &Value) -> bool {
    let check = |key: &str, accept: fn(Ordering) -> bool| {
        bounds
            .get(key)
            .map(|bound| compare_values(value, bound).is_some_and(accept))
            .unwrap_or(true)
    };
    check("gte", |o| o != Ordering::Less)
        && check("gt", |o| o == Ordering::Greater)
        && check("lte", |o| o != Ordering::Greater)
        && check("lt", |o| o == Ordering::Less)
}

fn compare_by_sort(sort: &[Value], a: &Value, b: &Value) -> Ordering {
    for clause in sort {
        let Some((field, spec)) = field_entry(clause) else {
            continue;
        };
        let left = values_at(a, field).into_iter().next();
        let right = values_at(b, field).into_iter().next();
        let ordering = compare_sort_values(spec, left, right);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Whether `source` sorts strictly after the `search_after` cursor.
fn after_cursor(sort: &[Value], source: &Value, cursor: &[Value]) -> bool {
    for (clause, bound) in sort.iter().zip(cursor) {
        let Some((field, spec)) = field_entry(clause) else {
            continue;
        };
        let value = values_at(source, field).into_iter().next();
        let bound = Some(bound).filter(|b| !b.is_null());
        match compare_sort_values(spec, value, bound) {
            Ordering::Equal => continue,
            ordering => return ordering == Ordering::Greater,
        }
    }
    false
}

fn compare_sort_values(spec: &Value, left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let descending = inner(spec, "order").as_str() == Some("desc");
    match (left, right) {
        (Some(l), Some(r)) => {
            let o = compare_values(l, r).unwrap_or(Ordering::Equal);
            if descending {
                o.reverse()
            } else {
                o
            }
        }
        // missing values sort last in both directions
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
