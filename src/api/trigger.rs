use serde::Deserialize;

use crate::db::repository::ContentRepository;
use crate::error::AppError;
use crate::indexer::article::ArticleIndexer;
use crate::models::content::{ContentDocument, FindOptions};
use crate::models::filter::split_list;
use crate::models::identity::view_document_id;

/// Workflow operations an editor can trigger on an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    Unpublish,
    RemoveDraft,
    CopyLocale,
    Copy,
    Order,
}

impl TriggerAction {
    pub fn parse(action: &str) -> Result<Self, AppError> {
        match action {
            "unpublish" => Ok(TriggerAction::Unpublish),
            "remove-draft" => Ok(TriggerAction::RemoveDraft),
            "copy-locale" => Ok(TriggerAction::CopyLocale),
            "copy" => Ok(TriggerAction::Copy),
            "order" => Ok(TriggerAction::Order),
            other => Err(AppError::BadRequest(format!("Unrecognized action: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TriggerRequest {
    pub uuid: String,
    pub locale: String,
    pub action: String,
    /// Comma separated destination locales of `copy-locale`.
    #[serde(default)]
    pub dest: Option<String>,
    /// New page sequence of `order`.
    #[serde(default)]
    pub pages: Vec<String>,
}

/// Index pair kept in step with the content repository.
pub struct TriggerIndexes<'a> {
    pub draft: &'a ArticleIndexer,
    pub live: &'a ArticleIndexer,
}

/// Runs a trigger action against the content repository and updates the
/// indexes; returns the article the caller should display afterwards.
pub async fn process_trigger(
    content: &dyn ContentRepository,
    indexes: TriggerIndexes<'_>,
    request: TriggerRequest,
) -> Result<ContentDocument, AppError> {
    // 1. Reject unknown actions before anything is touched
    let action = TriggerAction::parse(&request.action)?;
    let uuid = request.uuid.as_str();
    let locale = request.locale.as_str();

    // 2. Mutate content, then re-project what changed
    let displayed = match action {
        TriggerAction::Unpublish => {
            load(content, uuid, locale).await?;
            content.unpublish(uuid, locale).await?;

            indexes
                .live
                .view_manager()
                .delete_by_id(&view_document_id(uuid, locale))
                .await?;
            indexes.draft.set_unpublished(uuid, locale).await?;

            load(content, uuid, locale).await?
        }
        TriggerAction::RemoveDraft => {
            load(content, uuid, locale).await?;
            content.remove_draft(uuid, locale).await?;

            let restored = load(content, uuid, locale).await?;
            indexes.draft.index(&restored).await?;
            restored
        }
        TriggerAction::CopyLocale => {
            let destinations = request
                .dest
                .as_deref()
                .map(split_list)
                .filter(|d| !d.is_empty())
                .ok_or_else(|| AppError::BadRequest("Missing parameter: dest".into()))?;

            content.copy_locale(uuid, locale, &destinations).await?;
            for destination in &destinations {
                let copied = load(content, uuid, destination).await?;
                indexes.draft.index(&copied).await?;
            }

            load(content, uuid, locale).await?
        }
        TriggerAction::Copy => {
            load(content, uuid, locale).await?;
            let copied_uuid = content.copy(uuid, locale).await?;

            let copied = load(content, &copied_uuid, locale).await?;
            indexes.draft.index(&copied).await?;
            copied
        }
        TriggerAction::Order => {
            if request.pages.is_empty() {
                return Err(AppError::BadRequest("Missing parameter: pages".into()));
            }
            content.reorder(&request.pages, locale).await?;

            let reordered = load(content, uuid, locale).await?;
            indexes.draft.index(&reordered).await?;
            reordered
        }
    };

    tracing::info!(uuid = %uuid, locale = %locale, action = ?action, "Processed trigger");
    Ok(displayed)
}

async fn load(
    content: &dyn ContentRepository,
    uuid: &str,
    locale: &str,
) -> Result<ContentDocument, AppError> {
    content
        .find(uuid, locale, FindOptions::default())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Article {uuid} in {locale}")))
}
