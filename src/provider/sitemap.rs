use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::filter::SortOrder;
use crate::search::query::{Query, Search};
use crate::view::manager::ViewManager;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternateLink {
    pub href: String,
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapUrl {
    pub loc: String,
    pub locale: String,
    pub last_mod: Option<DateTime<Utc>>,
    pub alternates: Vec<AlternateLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sitemap {
    pub alias: String,
    pub max_page: u64,
}

/// Lists every article that is not hidden from the sitemap.
#[derive(Clone)]
pub struct SitemapProvider {
    view_manager: ViewManager,
    page_size: u64,
}

impl SitemapProvider {
    pub fn new(view_manager: ViewManager, page_size: u64) -> Self {
        Self {
            view_manager,
            page_size: page_size.max(1),
        }
    }

    fn visible() -> Query {
        Query::term("seo.hideInSitemap", false)
    }

    /// Every locale variant of an article lists all its siblings as alternates.
    ///
    /// Pages follow a `search_after` cursor on `(uuid, locale)`, so the walk is
    /// not bounded by the engine's result window.
    pub async fn build(&self) -> Result<Vec<SitemapUrl>, AppError> {
        let mut urls: Vec<SitemapUrl> = Vec::new();
        let mut by_uuid: HashMap<String, Vec<usize>> = HashMap::new();
        let mut cursor: Option<Vec<Value>> = None;

        loop {
            let mut search = Search::new(Self::visible())
                .size(self.page_size)
                .sort("uuid", SortOrder::Asc)
                .sort("locale", SortOrder::Asc);
            if let Some(values) = cursor.take() {
                search = search.search_after(values);
            }
            let page = self.view_manager.search(&search).await?;
            let fetched = page.documents.len() as u64;
            cursor = page
                .documents
                .last()
                .map(|last| vec![json!(last.uuid), json!(last.locale)]);

            for document in page.documents {
                // articles without a route have no address to list
                let Some(loc) = document.route_path else {
                    continue;
                };
                let mut url = SitemapUrl {
                    loc,
                    locale: document.locale,
                    last_mod: document.changed,
                    alternates: Vec::new(),
                };

                let siblings = by_uuid.entry(document.uuid).or_default();
                for &sibling in siblings.iter() {
                    let other = &mut urls[sibling];
                    other.alternates.push(AlternateLink {
                        href: url.loc.clone(),
                        locale: url.locale.clone(),
                    });
                    url.alternates.push(AlternateLink {
                        href: other.loc.clone(),
                        locale: other.locale.clone(),
                    });
                }
                siblings.push(urls.len());
                urls.push(url);
            }

            if fetched < self.page_size {
                break;
            }
        }

        tracing::debug!(urls = urls.len(), "Built article sitemap");
        Ok(urls)
    }

    pub async fn max_page(&self) -> Result<u64, AppError> {
        let total = self.view_manager.count(&Self::visible()).await?;
        Ok(total.div_ceil(self.page_size))
    }

    pub async fn create_sitemap(&self, alias: &str) -> Result<Sitemap, AppError> {
        Ok(Sitemap {
            alias: alias.to_string(),
            max_page: self.max_page().await?,
        })
    }
}
