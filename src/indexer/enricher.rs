use async_trait::async_trait;

use crate::error::AppError;
use crate::models::content::ContentDocument;
use crate::models::view::ViewDocument;

/// Hook run after a view document is populated and before it is persisted.
///
/// Enrichers run in registration order and may add or overwrite fields.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexEnricher: Send + Sync {
    async fn enrich(
        &self,
        source: &ContentDocument,
        view: &mut ViewDocument,
    ) -> Result<(), AppError>;
}
