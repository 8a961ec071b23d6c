pub mod models {
    pub mod content;
    pub mod filter;
    pub mod identity;
    pub mod view;
}
pub mod config;
pub mod error;
pub mod services;
pub mod search {
    #[cfg(feature = "elasticsearch")]
    pub mod elasticsearch;
    pub mod engine;
    pub mod memory;
    pub mod query;
}
pub mod view {
    pub mod manager;
    pub mod schema;
}
pub mod db {
    pub mod models;
    pub mod repository;
}
pub mod indexer {
    pub mod article;
    pub mod enricher;
    pub mod factory;
}
pub mod provider {
    pub mod data_provider;
    pub mod link;
    pub mod list;
    pub mod repository;
    pub mod sitemap;
    pub mod teaser;
}
pub mod builder;
pub mod api {
    pub mod trigger;
}
