//! Elasticsearch implementation of [`SearchEngine`].

use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{
    IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesRefreshParts,
};
use elasticsearch::params::Refresh;
use elasticsearch::{CountParts, DeleteParts, Elasticsearch, GetParts, IndexParts, SearchParts};
use serde_json::{json, Value};

use crate::config::IndexSettings;
use crate::error::AppError;
use crate::search::engine::{Hit, SearchEngine, SearchResponse};

pub struct ElasticsearchEngine {
    client: Elasticsearch,
    refresh_on_write: bool,
}

fn search_error(context: &str, err: impl std::fmt::Display) -> AppError {
    AppError::Search(format!("{context}: {err}"))
}

impl ElasticsearchEngine {
    /// Connects to the first configured node.
    pub fn new(settings: &IndexSettings) -> Result<Self, AppError> {
        let url = settings
            .nodes
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost:9200".to_string());

        let parsed_url: elasticsearch::http::Url = url
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid Elasticsearch URL {url}: {e}")))?;

        let transport = TransportBuilder::new(SingleNodeConnectionPool::new(parsed_url))
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()
            .map_err(|e| search_error("Failed to build transport", e))?;

        Ok(Self {
            client: Elasticsearch::new(transport),
            refresh_on_write: settings.refresh_on_write,
        })
    }

    fn write_refresh(&self) -> Refresh {
        if self.refresh_on_write {
            Refresh::True
        } else {
            Refresh::False
        }
    }

    /// Maps a failed response onto [`AppError`], detecting missing indexes.
    async fn failure(index: &str, context: &str, response: Response) -> AppError {
        let status = response.status_code();
        let body = response.text().await.unwrap_or_default();
        if body.contains("index_not_found_exception") {
            return AppError::IndexMissing(index.to_string());
        }
        AppError::Search(format!("{context} (status {status}): {body}"))
    }
}

#[async_trait]
impl SearchEngine for ElasticsearchEngine {
    async fn exists(&self, index: &str) -> Result<bool, AppError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| search_error("Failed to check index existence", e))?;

        Ok(response.status_code().is_success())
    }

    async fn create(&self, index: &str, definition: &Value) -> Result<(), AppError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(definition.clone())
            .send()
            .await
            .map_err(|e| search_error("Failed to create index", e))?;

        if !response.status_code().is_success() {
            return Err(Self::failure(index, "Failed to create index", response).await);
        }

        tracing::debug!("Created Elasticsearch index '{}'", index);
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), AppError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| search_error("Failed to delete index", e))?;

        if !response.status_code().is_success() {
            return Err(Self::failure(index, "Failed to delete index", response).await);
        }

        tracing::debug!("Deleted Elasticsearch index '{}'", index);
        Ok(())
    }

    async fn search(&self, index: &str, body: &Value) -> Result<SearchResponse, AppError> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body.clone())
            .send()
            .await
            .map_err(|e| search_error("Search failed", e))?;

        if !response.status_code().is_success() {
            return Err(Self::failure(index, "Search failed", response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| search_error("Failed to parse search response", e))?;

        let total = body
            .get("hits")
            .and_then(|h| h.get("total"))
            .and_then(|t| t.get("value"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let hits = body
            .get("hits")
            .and_then(|h| h.get("hits"))
            .and_then(|h| h.as_array())
            .map(|hits| {
                hits.iter()
                    .filter_map(|hit| {
                        Some(Hit {
                            id: hit.get("_id")?.as_str()?.to_string(),
                            source: hit.get("_source")?.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(SearchResponse { total, hits })
    }

    async fn count(&self, index: &str, query: &Value) -> Result<u64, AppError> {
        let response = self
            .client
            .count(CountParts::Index(&[index]))
            .body(json!({ "query": query }))
            .send()
            .await
            .map_err(|e| search_error("Count failed", e))?;

        if !response.status_code().is_success() {
            return Err(Self::failure(index, "Count failed", response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| search_error("Failed to parse count response", e))?;

        Ok(body.get("count").and_then(|c| c.as_u64()).unwrap_or(0))
    }

    async fn get(&self, index: &str, id: &str) -> Result<Option<Value>, AppError> {
        let response = self
            .client
            .get(GetParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| search_error("Failed to get document", e))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            let body = response.text().await.unwrap_or_default();
            if body.contains("index_not_found_exception") {
                return Err(AppError::IndexMissing(index.to_string()));
            }
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Self::failure(index, "Failed to get document", response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| search_error("Failed to parse document", e))?;

        Ok(body.get("_source").cloned())
    }

    async fn index(&self, index: &str, id: &str, source: &Value) -> Result<(), AppError> {
        // the index API would auto-create a missing index
        if !self.exists(index).await? {
            return Err(AppError::IndexMissing(index.to_string()));
        }

        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .refresh(self.write_refresh())
            .body(source.clone())
            .send()
            .await
            .map_err(|e| search_error("Failed to index document", e))?;

        if !response.status_code().is_success() {
            return Err(Self::failure(index, "Failed to index document", response).await);
        }

        Ok(())
    }

    async fn delete(&self, index: &str, id: &str) -> Result<(), AppError> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .refresh(self.write_refresh())
            .send()
            .await
            .map_err(|e| search_error("Failed to delete document", e))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            let body = response.text().await.unwrap_or_default();
            if body.contains("index_not_found_exception") {
                return Err(AppError::IndexMissing(index.to_string()));
            }
            return Ok(());
        }
        if !status.is_success() {
            return Err(Self::failure(index, "Failed to delete document", response).await);
        }

        Ok(())
    }

    async fn refresh(&self, index: &str) -> Result<(), AppError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| search_error("Failed to refresh index", e))?;

        if !response.status_code().is_success() {
            return Err(Self::failure(index, "Failed to refresh index", response).await);
        }

        Ok(())
    }
}
