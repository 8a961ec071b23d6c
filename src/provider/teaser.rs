use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::AppError;
use crate::models::identity::view_document_ids;
use crate::models::view::ViewDocument;
use crate::search::query::{Query, Search};
use crate::view::manager::ViewManager;

pub const TEASER_TYPE: &str = "article";

/// Presentation card of one article.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teaser {
    pub id: String,
    #[serde(rename = "type")]
    pub teaser_type: String,
    pub locale: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub more_text: Option<String>,
    pub media_id: Option<i64>,
    pub url: Option<String>,
    pub attributes: BTreeMap<String, Option<String>>,
}

impl From<ViewDocument> for Teaser {
    fn from(document: ViewDocument) -> Self {
        let excerpt = &document.excerpt;
        let title = non_empty(&excerpt.title).or_else(|| document.title.clone());
        let description =
            non_empty(&excerpt.description).or_else(|| document.teaser_description.clone());
        let media_id = excerpt
            .images
            .first()
            .map(|media| media.id)
            .or(document.teaser_media_id);

        let attributes = BTreeMap::from([
            ("structureType".to_string(), document.structure_type.clone()),
            ("type".to_string(), document.article_type.clone()),
        ]);

        Teaser {
            id: document.uuid.clone(),
            teaser_type: TEASER_TYPE.to_string(),
            locale: document.locale.clone(),
            title,
            description,
            more_text: excerpt.more.clone(),
            media_id,
            url: document.route_path.clone(),
            attributes,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

#[derive(Clone)]
pub struct TeaserProvider {
    view_manager: ViewManager,
}

impl TeaserProvider {
    pub fn new(view_manager: ViewManager) -> Self {
        Self { view_manager }
    }

    /// Teasers of the indexed `ids` in `locale`; unknown ids are skipped.
    pub async fn find(&self, ids: &[String], locale: &str) -> Result<Vec<Teaser>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let search = Search::new(Query::ids(&view_document_ids(ids, locale))).size(ids.len() as u64);
        let page = self.view_manager.search(&search).await?;

        Ok(page.documents.into_iter().map(Teaser::from).collect())
    }
}
