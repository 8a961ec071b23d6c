use serde::Serialize;

use crate::error::AppError;
use crate::models::identity::view_document_ids;
use crate::search::query::{Query, Search};
use crate::view::manager::ViewManager;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkItem {
    pub id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub published: bool,
}

/// Resolves article links for the editor, from the live index when only
/// published targets are wanted.
#[derive(Clone)]
pub struct LinkProvider {
    default_manager: ViewManager,
    live_manager: ViewManager,
}

impl LinkProvider {
    pub fn new(default_manager: ViewManager, live_manager: ViewManager) -> Self {
        Self {
            default_manager,
            live_manager,
        }
    }

    pub async fn preload(
        &self,
        hrefs: &[String],
        locale: &str,
        published: bool,
    ) -> Result<Vec<LinkItem>, AppError> {
        if hrefs.is_empty() {
            return Ok(Vec::new());
        }

        let manager = if published {
            &self.live_manager
        } else {
            &self.default_manager
        };
        let search = Search::new(Query::ids(&view_document_ids(hrefs, locale)))
            .size(hrefs.len() as u64);
        let page = manager.search(&search).await?;

        let mut items: Vec<LinkItem> = page
            .documents
            .into_iter()
            .map(|document| LinkItem {
                id: document.uuid,
                title: document.title,
                url: document.route_path,
                published: document.published.is_some(),
            })
            .collect();
        items.sort_by_key(|item| hrefs.iter().position(|href| *href == item.id));

        Ok(items)
    }
}
