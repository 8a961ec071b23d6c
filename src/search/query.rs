//! Query DSL fragments and the search envelope.
//!
//! Queries are built as a typed tree and rendered to Elasticsearch JSON with
//! [`Query::to_json`]; the in-memory engine evaluates the same JSON.

use serde_json::{json, Value};

use crate::models::filter::{Operator, SortOrder};

/// Compound boolean query.
///
/// A non-empty `should` list always requires at least one match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub should: Vec<Query>,
    pub must_not: Vec<Query>,
    pub filter: Vec<Query>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    pub fn should(mut self, query: Query) -> Self {
        self.should.push(query);
        self
    }

    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    pub fn filter(mut self, query: Query) -> Self {
        self.filter.push(query);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }

    fn to_json(&self) -> Value {
        let mut body = json!({});
        if !self.must.is_empty() {
            body["must"] = render(&self.must);
        }
        if !self.should.is_empty() {
            body["should"] = render(&self.should);
            body["minimum_should_match"] = json!(1);
        }
        if !self.must_not.is_empty() {
            body["must_not"] = render(&self.must_not);
        }
        if !self.filter.is_empty() {
            body["filter"] = render(&self.filter);
        }
        json!({ "bool": body })
    }
}

fn render(queries: &[Query]) -> Value {
    Value::Array(queries.iter().map(Query::to_json).collect())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    Bool(BoolQuery),
    Term {
        field: String,
        value: Value,
    },
    Terms {
        field: String,
        values: Vec<Value>,
    },
    Ids(Vec<String>),
    /// Inclusive range; either bound may be open.
    Range {
        field: String,
        gte: Option<Value>,
        lte: Option<Value>,
    },
    Match {
        field: String,
        text: String,
    },
    Prefix {
        field: String,
        value: String,
    },
    /// Documents similar to the liked document ids on `fields`.
    MoreLikeThis {
        fields: Vec<String>,
        like: Vec<String>,
        min_term_freq: u32,
        min_doc_freq: u32,
    },
}

impl Query {
    pub fn term(field: &str, value: impl Into<Value>) -> Self {
        Query::Term {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn terms<V: Into<Value>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Query::Terms {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ids<S: AsRef<str>>(ids: &[S]) -> Self {
        Query::Ids(ids.iter().map(|id| id.as_ref().to_string()).collect())
    }

    pub fn range(field: &str, gte: Option<Value>, lte: Option<Value>) -> Self {
        Query::Range {
            field: field.to_string(),
            gte,
            lte,
        }
    }

    pub fn match_text(field: &str, text: &str) -> Self {
        Query::Match {
            field: field.to_string(),
            text: text.to_string(),
        }
    }

    pub fn prefix(field: &str, value: &str) -> Self {
        Query::Prefix {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// One term per value on `field`, OR'ed or AND'ed per `operator`.
    pub fn terms_with_operator<V: Into<Value>>(
        field: &str,
        values: impl IntoIterator<Item = V>,
        operator: Operator,
    ) -> Self {
        let bool_query = values
            .into_iter()
            .fold(BoolQuery::new(), |q, value| match operator {
                Operator::Or => q.should(Query::term(field, value)),
                Operator::And => q.must(Query::term(field, value)),
            });
        Query::Bool(bool_query)
    }

    pub fn to_json(&self) -> Value {
        match self {
            Query::MatchAll => json!({ "match_all": {} }),
            Query::Bool(bool_query) => bool_query.to_json(),
            Query::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            Query::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            Query::Ids(ids) => json!({ "ids": { "values": ids } }),
            Query::Range { field, gte, lte } => {
                let mut bounds = json!({});
                if let Some(gte) = gte {
                    bounds["gte"] = gte.clone();
                }
                if let Some(lte) = lte {
                    bounds["lte"] = lte.clone();
                }
                json!({ "range": { field.as_str(): bounds } })
            }
            Query::Match { field, text } => json!({ "match": { field.as_str(): text } }),
            Query::Prefix { field, value } => json!({ "prefix": { field.as_str(): value } }),
            Query::MoreLikeThis {
                fields,
                like,
                min_term_freq,
                min_doc_freq,
            } => {
                let like: Vec<Value> = like.iter().map(|id| json!({ "_id": id })).collect();
                json!({
                    "more_like_this": {
                        "fields": fields,
                        "like": like,
                        "min_term_freq": min_term_freq,
                        "min_doc_freq": min_doc_freq,
                    }
                })
            }
        }
    }
}

impl From<BoolQuery> for Query {
    fn from(query: BoolQuery) -> Self {
        Query::Bool(query)
    }
}

/// A complete search request: query, window and sort.
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    pub query: Query,
    pub from: Option<u64>,
    pub size: Option<u64>,
    pub sort: Vec<(String, SortOrder)>,
    /// Sort values of the last hit of the previous page.
    pub search_after: Option<Vec<Value>>,
}

impl Search {
    pub fn new(query: impl Into<Query>) -> Self {
        Self {
            query: query.into(),
            from: None,
            size: None,
            sort: Vec::new(),
            search_after: None,
        }
    }

    pub fn from(mut self, from: u64) -> Self {
        self.from = Some(from);
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort.push((field.to_string(), order));
        self
    }

    /// Continues after the hit with the given sort values; replaces `from`.
    pub fn search_after(mut self, values: Vec<Value>) -> Self {
        self.search_after = Some(values);
        self
    }

    pub fn paginate(self, pagination: Pagination) -> Self {
        self.from(pagination.offset).size(pagination.size)
    }

    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "query": self.query.to_json(),
            "track_total_hits": true,
        });
        if let Some(from) = self.from {
            body["from"] = json!(from);
        }
        if let Some(size) = self.size {
            body["size"] = json!(size);
        }
        if !self.sort.is_empty() {
            let sort: Vec<Value> = self
                .sort
                .iter()
                .map(|(field, order)| json!({ field.as_str(): { "order": order.as_str() } }))
                .collect();
            body["sort"] = Value::Array(sort);
        }
        if let Some(values) = &self.search_after {
            body["search_after"] = Value::Array(values.clone());
        }
        body
    }
}

/// Result window derived from page, page size and limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u64,
    pub size: u64,
}

impl Pagination {
    /// The window never reaches past `limit` (or `default_limit` without one).
    pub fn compute(
        page: u64,
        page_size: Option<u64>,
        limit: Option<u64>,
        default_limit: u64,
    ) -> Self {
        let page_size = page_size.filter(|size| *size > 0);
        let offset = page_size
            .map(|size| page.saturating_sub(1).saturating_mul(size))
            .unwrap_or(0);
        let limit = limit.unwrap_or(default_limit);

        let size = match page_size {
            Some(size) if offset.saturating_add(size) <= limit => size,
            _ => limit.saturating_sub(offset),
        };

        Self { offset, size }
    }
}

/// Whether a page after `page` exists, with `total` capped at `limit`.
pub fn has_next_page(total: u64, limit: Option<u64>, page: u64, page_size: Option<u64>) -> bool {
    let capped = match limit {
        Some(limit) if limit > 0 && limit < total => limit,
        _ => total,
    };
    capped > page.saturating_mul(page_size.unwrap_or(0))
}
