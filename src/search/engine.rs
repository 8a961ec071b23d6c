use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;

/// One search hit: the engine id and the stored source.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub source: Value,
}

/// Raw search result: hits of the requested window plus the total match count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResponse {
    pub total: u64,
    pub hits: Vec<Hit>,
}

/// Client-side contract of the physical search index.
///
/// Every document operation against a missing index fails with
/// [`AppError::IndexMissing`]; indexes are only created through [`SearchEngine::create`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn exists(&self, index: &str) -> Result<bool, AppError>;

    /// Create `index` with the given settings/mappings body.
    async fn create(&self, index: &str, definition: &Value) -> Result<(), AppError>;

    async fn delete_index(&self, index: &str) -> Result<(), AppError>;

    /// Execute a search body (`query`, `from`, `size`, `sort`).
    async fn search(&self, index: &str, body: &Value) -> Result<SearchResponse, AppError>;

    async fn count(&self, index: &str, query: &Value) -> Result<u64, AppError>;

    /// Source of the document with `id`, or `None` when it does not exist.
    async fn get(&self, index: &str, id: &str) -> Result<Option<Value>, AppError>;

    /// Insert or fully replace the document with `id`.
    async fn index(&self, index: &str, id: &str, source: &Value) -> Result<(), AppError>;

    /// Delete the document with `id`; deleting a missing document is not an error.
    async fn delete(&self, index: &str, id: &str) -> Result<(), AppError>;

    /// Make every preceding write visible to search.
    async fn refresh(&self, index: &str) -> Result<(), AppError>;
}
