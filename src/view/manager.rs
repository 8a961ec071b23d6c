use std::sync::Arc;

use serde_json::Value;

use crate::error::AppError;
use crate::models::view::ViewDocument;
use crate::search::engine::{Hit, SearchEngine};
use crate::search::query::{Query, Search};
use crate::view::schema;

/// Documents of one search window plus the total match count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchPage {
    pub documents: Vec<ViewDocument>,
    pub total: u64,
}

/// Sole gateway between view documents and one physical index.
#[derive(Clone)]
pub struct ViewManager {
    engine: Arc<dyn SearchEngine>,
    name: String,
    definition: Value,
}

impl ViewManager {
    pub fn new(engine: Arc<dyn SearchEngine>, name: impl Into<String>) -> Self {
        Self {
            engine,
            name: name.into(),
            definition: schema::default_definition(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn search(&self, search: &Search) -> Result<SearchPage, AppError> {
        let response = self.engine.search(&self.name, &search.to_body()).await?;
        let documents = response
            .hits
            .into_iter()
            .map(Self::from_hit)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SearchPage {
            documents,
            total: response.total,
        })
    }

    pub async fn count(&self, query: &Query) -> Result<u64, AppError> {
        self.engine.count(&self.name, &query.to_json()).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<ViewDocument>, AppError> {
        match self.engine.get(&self.name, id).await? {
            Some(source) => Ok(Some(Self::from_hit(Hit {
                id: id.to_string(),
                source,
            })?)),
            None => Ok(None),
        }
    }

    /// Full overwrite of the document stored under `document.id`.
    pub async fn index(&self, document: &ViewDocument) -> Result<(), AppError> {
        let source = Self::to_source(document)?;
        self.engine.index(&self.name, &document.id, &source).await?;
        tracing::debug!(index = %self.name, id = %document.id, "Indexed view document");
        Ok(())
    }

    pub async fn delete(&self, document: &ViewDocument) -> Result<(), AppError> {
        self.delete_by_id(&document.id).await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        self.engine.delete(&self.name, id).await?;
        tracing::debug!(index = %self.name, id = %id, "Deleted view document");
        Ok(())
    }

    /// Makes preceding writes visible to the next search.
    pub async fn refresh(&self) -> Result<(), AppError> {
        self.engine.refresh(&self.name).await
    }

    pub async fn index_exists(&self) -> Result<bool, AppError> {
        self.engine.exists(&self.name).await
    }

    /// Creates the index unless it already exists.
    pub async fn create(&self) -> Result<(), AppError> {
        if self.index_exists().await? {
            return Ok(());
        }
        self.engine.create(&self.name, &self.definition).await?;
        tracing::info!(index = %self.name, "Created index");
        Ok(())
    }

    /// Drops the index if it exists.
    pub async fn drop(&self) -> Result<(), AppError> {
        if !self.index_exists().await? {
            return Ok(());
        }
        self.engine.delete_index(&self.name).await?;
        tracing::info!(index = %self.name, "Dropped index");
        Ok(())
    }

    pub async fn drop_and_create(&self) -> Result<(), AppError> {
        self.drop().await?;
        self.create().await
    }

    pub fn to_source(document: &ViewDocument) -> Result<Value, AppError> {
        Ok(serde_json::to_value(document)?)
    }

    pub fn from_hit(hit: Hit) -> Result<ViewDocument, AppError> {
        let mut document: ViewDocument = serde_json::from_value(hit.source)?;
        document.id = hit.id;
        Ok(document)
    }
}
