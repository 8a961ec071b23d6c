use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::identity::view_document_id;

/// Whether a view materializes real content for its locale or borrows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocalizationKind {
    #[default]
    Localized,
    Ghost,
    Shadow,
}

impl fmt::Display for LocalizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalizationKind::Localized => write!(f, "localized"),
            LocalizationKind::Ghost => write!(f, "ghost"),
            LocalizationKind::Shadow => write!(f, "shadow"),
        }
    }
}

/// Localization state of a view: the kind plus the locale content is borrowed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LocalizationState {
    pub state: LocalizationKind,
    /// Fallback locale; `None` for localized views.
    pub locale: Option<String>,
}

impl LocalizationState {
    pub fn localized() -> Self {
        Self::default()
    }

    pub fn new(state: LocalizationKind, source_locale: &str) -> Self {
        let locale = match state {
            LocalizationKind::Localized => None,
            _ => Some(source_locale.to_string()),
        };
        Self { state, locale }
    }

    pub fn is_ghost(&self) -> bool {
        self.state == LocalizationKind::Ghost
    }
}

/// Denormalized media reference (excerpt icon / images).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MediaView {
    pub id: i64,
    pub title: Option<String>,
    pub copyright: Option<String>,
    pub url: Option<String>,
    /// Image format name to URL.
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CategoryView {
    pub id: i64,
    pub key: Option<String>,
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TagView {
    pub id: i64,
    pub name: String,
}

/// Excerpt overrides and taxonomy of an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExcerptView {
    pub title: Option<String>,
    pub description: Option<String>,
    pub more: Option<String>,
    #[serde(default)]
    pub categories: Vec<CategoryView>,
    #[serde(default)]
    pub tags: Vec<TagView>,
    #[serde(default)]
    pub icon: Vec<MediaView>,
    #[serde(default)]
    pub images: Vec<MediaView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeoView {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub no_index: bool,
    #[serde(default)]
    pub no_follow: bool,
    #[serde(default)]
    pub hide_in_sitemap: bool,
}

/// One child page of a multi-page article, flattened into its parent view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub uuid: String,
    pub title: Option<String>,
    pub route_path: Option<String>,
    pub page_number: u32,
    /// JSON snapshot of the page's structured content.
    pub content_data: Option<String>,
}

/// Flat, index-persisted projection of one article in one locale.
///
/// The `id` is derived from `uuid` and `locale` and is never part of the
/// persisted source; it is restored from the hit id on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDocument {
    #[serde(skip)]
    pub id: String,
    pub uuid: String,
    pub locale: String,
    pub title: Option<String>,
    pub route_path: Option<String>,
    pub parent_page_uuid: Option<String>,
    #[serde(rename = "type")]
    pub article_type: Option<String>,
    pub type_translation: Option<String>,
    pub structure_type: Option<String>,

    pub changed: Option<DateTime<Utc>>,
    pub changer_contact_id: Option<i64>,
    pub changer_full_name: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub creator_contact_id: Option<i64>,
    pub creator_full_name: Option<String>,
    pub authored: Option<DateTime<Utc>>,
    pub author_id: Option<i64>,
    pub author_full_name: Option<String>,
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_state: bool,

    pub content_data: Option<String>,
    pub teaser_media_id: Option<i64>,
    pub teaser_description: Option<String>,

    #[serde(default)]
    pub localization_state: LocalizationState,
    #[serde(default)]
    pub excerpt: ExcerptView,
    #[serde(default)]
    pub seo: SeoView,
    #[serde(default)]
    pub pages: Vec<PageView>,
}

impl ViewDocument {
    /// Fresh, empty view seeded with its identity.
    pub fn new(uuid: &str, locale: &str) -> Self {
        Self {
            id: view_document_id(uuid, locale),
            uuid: uuid.to_string(),
            locale: locale.to_string(),
            title: None,
            route_path: None,
            parent_page_uuid: None,
            article_type: None,
            type_translation: None,
            structure_type: None,
            changed: None,
            changer_contact_id: None,
            changer_full_name: None,
            created: None,
            creator_contact_id: None,
            creator_full_name: None,
            authored: None,
            author_id: None,
            author_full_name: None,
            published: None,
            published_state: false,
            content_data: None,
            teaser_media_id: None,
            teaser_description: None,
            localization_state: LocalizationState::localized(),
            excerpt: ExcerptView::default(),
            seo: SeoView::default(),
            pages: Vec::new(),
        }
    }

    /// Clears the workflow fields so the view reads as unpublished.
    pub fn mark_unpublished(&mut self) {
        self.published = None;
        self.published_state = false;
    }
}
