use std::collections::BTreeMap;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Environment prefix; `ARTICLE_INDEX__DEFAULT_LIMIT=20` sets `default_limit`.
pub const ENV_PREFIX: &str = "ARTICLE_INDEX";
/// Settings file looked up when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "article-index";

/// Per article type configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSettings {
    /// Translation key of the human readable type name.
    pub translation_key: String,
}

/// Runtime settings of the article index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Elasticsearch node URLs; the first one is used.
    #[serde(default = "default_nodes")]
    pub nodes: Vec<String>,

    /// Draft index, holding every indexed article.
    #[serde(default = "default_index")]
    pub default_index: String,

    /// Live index, holding published articles only.
    #[serde(default = "default_live_index")]
    pub live_index: String,

    #[serde(default = "default_limit")]
    pub default_limit: u64,

    /// Fields searched by free-text list queries and similarity lookups.
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<String>,

    #[serde(default)]
    pub types: BTreeMap<String, TypeSettings>,

    /// Locales of the webspace; ghosts are projected into each of them.
    #[serde(default)]
    pub locales: Vec<String>,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Page size of the clear loop.
    #[serde(default = "default_clear_page_size")]
    pub clear_page_size: u64,

    /// Page size of the remove-by-uuid loop.
    #[serde(default = "default_remove_page_size")]
    pub remove_page_size: u64,

    #[serde(default = "default_sitemap_page_size")]
    pub sitemap_page_size: u64,

    /// Make writes visible to search immediately (`refresh=true`).
    #[serde(default)]
    pub refresh_on_write: bool,
}

fn default_nodes() -> Vec<String> {
    vec!["http://localhost:9200".to_string()]
}

fn default_index() -> String {
    "articles".to_string()
}

fn default_live_index() -> String {
    "articles_live".to_string()
}

fn default_limit() -> u64 {
    100
}

fn default_search_fields() -> Vec<String> {
    vec![
        "title".to_string(),
        "excerpt.title".to_string(),
        "excerpt.description".to_string(),
        "seo.title".to_string(),
        "seo.description".to_string(),
        "seo.keywords".to_string(),
        "teaserDescription".to_string(),
    ]
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_clear_page_size() -> u64 {
    500
}

fn default_remove_page_size() -> u64 {
    1000
}

fn default_sitemap_page_size() -> u64 {
    1000
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            default_index: default_index(),
            live_index: default_live_index(),
            default_limit: default_limit(),
            search_fields: default_search_fields(),
            types: BTreeMap::new(),
            locales: Vec::new(),
            request_timeout_ms: default_request_timeout_ms(),
            clear_page_size: default_clear_page_size(),
            remove_page_size: default_remove_page_size(),
            sitemap_page_size: default_sitemap_page_size(),
            refresh_on_write: false,
        }
    }
}

impl IndexSettings {
    /// Layers the optional settings file under `ARTICLE_INDEX__*` variables.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("nodes")
                    .with_list_parse_key("search_fields")
                    .with_list_parse_key("locales"),
            )
            .build()?;

        let settings: IndexSettings = settings.try_deserialize()?;
        tracing::debug!(
            default_index = %settings.default_index,
            live_index = %settings.live_index,
            "Loaded index settings"
        );
        Ok(settings)
    }

    /// Translation key configured for `article_type`, if any.
    pub fn type_translation_key(&self, article_type: &str) -> Option<&str> {
        self.types
            .get(article_type)
            .map(|t| t.translation_key.as_str())
    }
}
