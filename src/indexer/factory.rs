use std::sync::Arc;

use crate::db::repository::{CategoryRepository, MediaRepository, TagRepository};
use crate::error::AppError;
use crate::models::content::{ExcerptData, MediaSelection, SeoData};
use crate::models::view::{CategoryView, ExcerptView, MediaView, SeoView, TagView};

/// Resolves raw excerpt data into self-contained view objects.
#[derive(Clone)]
pub struct ExcerptFactory {
    categories: Arc<dyn CategoryRepository>,
    tags: Arc<dyn TagRepository>,
    media: Arc<dyn MediaRepository>,
}

impl ExcerptFactory {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        tags: Arc<dyn TagRepository>,
        media: Arc<dyn MediaRepository>,
    ) -> Self {
        Self {
            categories,
            tags,
            media,
        }
    }

    /// Lists keep the order of the source ids and names.
    pub async fn create(&self, data: &ExcerptData, locale: &str) -> Result<ExcerptView, AppError> {
        let categories = if data.categories.is_empty() {
            Vec::new()
        } else {
            let found = self.categories.find_by_ids(&data.categories, locale).await?;
            in_source_order(found, &data.categories, |c| &c.id)
                .into_iter()
                .map(CategoryView::from)
                .collect()
        };

        let tags = if data.tags.is_empty() {
            Vec::new()
        } else {
            let found = self.tags.find_by_names(&data.tags).await?;
            in_source_order(found, &data.tags, |t| &t.name)
                .into_iter()
                .map(TagView::from)
                .collect()
        };

        Ok(ExcerptView {
            title: data.title.clone(),
            description: data.description.clone(),
            more: data.more.clone(),
            categories,
            tags,
            icon: self.media_collection(&data.icon, locale).await?,
            images: self.media_collection(&data.images, locale).await?,
        })
    }

    async fn media_collection(
        &self,
        selection: &MediaSelection,
        locale: &str,
    ) -> Result<Vec<MediaView>, AppError> {
        if selection.ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = self.media.find_by_ids(&selection.ids, locale).await?;
        Ok(in_source_order(found, &selection.ids, |m| &m.id)
            .into_iter()
            .map(MediaView::from)
            .collect())
    }
}

/// Reorders `items` to follow `keys`; items without a key position are dropped.
fn in_source_order<T, K: PartialEq>(items: Vec<T>, keys: &[K], key: impl Fn(&T) -> &K) -> Vec<T> {
    let mut slots: Vec<Option<T>> = keys.iter().map(|_| None).collect();
    for item in items {
        if let Some(position) = keys.iter().position(|k| k == key(&item)) {
            if slots[position].is_none() {
                slots[position] = Some(item);
            }
        }
    }
    slots.into_iter().flatten().collect()
}

pub fn seo_view(data: &SeoData) -> SeoView {
    SeoView {
        title: data.title.clone(),
        description: data.description.clone(),
        keywords: data.keywords.clone(),
        canonical_url: data.canonical_url.clone(),
        no_index: data.no_index,
        no_follow: data.no_follow,
        hide_in_sitemap: data.hide_in_sitemap,
    }
}
