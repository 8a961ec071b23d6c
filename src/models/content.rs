use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tag marking the property whose value is the teaser description.
pub const TEASER_DESCRIPTION_TAG: &str = "teaser.description";
/// Tag marking the property whose value is the teaser media selection.
pub const TEASER_MEDIA_TAG: &str = "teaser.media";
/// Tag marking the routing property of an article.
pub const ROUTE_TAG: &str = "article.route";
/// Property name used for routing when no property carries [`ROUTE_TAG`].
pub const ROUTE_FIELD: &str = "routePath";
/// Property type of routes anchored below a page of the page tree.
pub const PAGE_TREE_ROUTE_TYPE: &str = "page_tree_route";

/// Publish lifecycle stage of a content document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStage {
    #[default]
    Test,
    Published,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PropertyMetadata {
    pub fn new(name: &str, property_type: &str) -> Self {
        Self {
            name: name.to_string(),
            property_type: property_type.to_string(),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }
}

/// Structure template of a content document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StructureMetadata {
    /// Article type declared by the template; `None` means "default".
    pub article_type: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyMetadata>,
}

impl StructureMetadata {
    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_by_tag(&self, tag: &str) -> Option<&PropertyMetadata> {
        self.properties
            .iter()
            .find(|p| p.tags.iter().any(|t| t == tag))
    }

    pub fn article_type(&self) -> &str {
        self.article_type.as_deref().unwrap_or("default")
    }
}

/// Selection of media ids as stored in content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MediaSelection {
    #[serde(default)]
    pub ids: Vec<i64>,
}

/// Raw excerpt extension data: ids and names still to be resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExcerptData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub more: Option<String>,
    #[serde(default)]
    pub categories: Vec<i64>,
    /// Tag names.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub icon: MediaSelection,
    #[serde(default)]
    pub images: MediaSelection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeoData {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Extensions {
    pub excerpt: Option<ExcerptData>,
    pub seo: Option<SeoData>,
}

/// Child page of a multi-page article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPage {
    pub uuid: String,
    pub page_title: Option<String>,
    pub route_path: Option<String>,
    pub page_number: u32,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Optional behaviours of a content document, resolved once when it is loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum Capability {
    /// Routable; carries the resolved route path.
    HasRoute(String),
    /// Multi-page article; carries its child pages.
    HasChildren(Vec<ContentPage>),
    /// Template provides tagged teaser properties.
    HasTeaserFields,
}

/// Authoritative content document as loaded from the content repository.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDocument {
    pub uuid: String,
    /// Locale the document was requested in.
    pub locale: String,
    /// Locale the content was actually loaded from, when it differs.
    pub original_locale: Option<String>,
    pub title: Option<String>,
    pub structure_type: String,
    pub structure: StructureMetadata,
    /// Property values by property name.
    pub properties: Map<String, Value>,
    pub extensions: Extensions,
    pub workflow_stage: WorkflowStage,
    pub published: Option<DateTime<Utc>>,
    pub creator: Option<i64>,
    pub changer: Option<i64>,
    /// Contact id of the author.
    pub author: Option<i64>,
    pub created: Option<DateTime<Utc>>,
    pub changed: Option<DateTime<Utc>>,
    pub authored: Option<DateTime<Utc>>,
    /// Locale mirrored by this document when shadowing is enabled.
    pub shadow_locale: Option<String>,
    pub capabilities: Vec<Capability>,
}

impl ContentDocument {
    pub fn new(uuid: &str, locale: &str, structure_type: &str) -> Self {
        Self {
            uuid: uuid.to_string(),
            locale: locale.to_string(),
            original_locale: None,
            title: None,
            structure_type: structure_type.to_string(),
            structure: StructureMetadata::default(),
            properties: Map::new(),
            extensions: Extensions::default(),
            workflow_stage: WorkflowStage::Test,
            published: None,
            creator: None,
            changer: None,
            author: None,
            created: None,
            changed: None,
            authored: None,
            shadow_locale: None,
            capabilities: Vec::new(),
        }
    }

    /// Locale the content of this document comes from.
    pub fn source_locale(&self) -> &str {
        self.original_locale.as_deref().unwrap_or(&self.locale)
    }

    pub fn route_path(&self) -> Option<&str> {
        self.capabilities.iter().find_map(|c| match c {
            Capability::HasRoute(path) => Some(path.as_str()),
            _ => None,
        })
    }

    pub fn children(&self) -> &[ContentPage] {
        self.capabilities
            .iter()
            .find_map(|c| match c {
                Capability::HasChildren(pages) => Some(pages.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn has_teaser_fields(&self) -> bool {
        self.capabilities
            .iter()
            .any(|c| matches!(c, Capability::HasTeaserFields))
    }

    pub fn is_published(&self) -> bool {
        self.workflow_stage == WorkflowStage::Published
    }

    /// Value of the property carrying `tag`, if the template declares one.
    pub fn value_by_tag(&self, tag: &str) -> Option<&Value> {
        self.structure
            .property_by_tag(tag)
            .and_then(|p| self.properties.get(&p.name))
    }
}

/// Options for loading a document from the content repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindOptions {
    pub load_ghost_content: bool,
    pub load_shadow_content: bool,
}
