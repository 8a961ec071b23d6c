#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use article_index::config::IndexSettings;
use article_index::db::models::{Category, Contact, Media, PageNode, Tag, User};
use article_index::db::repository::{
    ActorDirectory, CategoryRepository, ContentRepository, MediaRepository, TagRepository,
};
use article_index::error::AppError;
use article_index::indexer::article::{ArticleIndexer, IndexerServices};
use article_index::models::content::{
    Capability, ContentDocument, ContentPage, ExcerptData, FindOptions, WorkflowStage,
};
use article_index::search::memory::MemoryEngine;
use article_index::services::Translator;
use article_index::view::manager::ViewManager;

/// Content store keyed by `(uuid, locale)`.
#[derive(Default)]
pub struct FakeContentRepository {
    documents: Mutex<HashMap<(String, String), ContentDocument>>,
    pages: Mutex<HashMap<String, PageNode>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeContentRepository {
    pub fn insert(&self, document: ContentDocument) {
        self.documents
            .lock()
            .unwrap()
            .insert((document.uuid.clone(), document.locale.clone()), document);
    }

    pub fn insert_page(&self, page: PageNode) {
        self.pages.lock().unwrap().insert(page.uuid.clone(), page);
    }

    pub fn get(&self, uuid: &str, locale: &str) -> Option<ContentDocument> {
        self.documents
            .lock()
            .unwrap()
            .get(&(uuid.to_string(), locale.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ContentRepository for FakeContentRepository {
    async fn find(
        &self,
        uuid: &str,
        locale: &str,
        _options: FindOptions,
    ) -> Result<Option<ContentDocument>, AppError> {
        Ok(self.get(uuid, locale))
    }

    async fn find_page(&self, uuid: &str, _locale: &str) -> Result<Option<PageNode>, AppError> {
        Ok(self.pages.lock().unwrap().get(uuid).cloned())
    }

    async fn unpublish(&self, uuid: &str, locale: &str) -> Result<(), AppError> {
        self.record(format!("unpublish {uuid} {locale}"));
        let mut documents = self.documents.lock().unwrap();
        if let Some(document) = documents.get_mut(&(uuid.to_string(), locale.to_string())) {
            document.workflow_stage = WorkflowStage::Test;
            document.published = None;
        }
        Ok(())
    }

    async fn remove_draft(&self, uuid: &str, locale: &str) -> Result<(), AppError> {
        self.record(format!("remove-draft {uuid} {locale}"));
        Ok(())
    }

    async fn copy_locale(
        &self,
        uuid: &str,
        source_locale: &str,
        destination_locales: &[String],
    ) -> Result<(), AppError> {
        self.record(format!("copy-locale {uuid} {source_locale}"));
        let source = self
            .get(uuid, source_locale)
            .ok_or_else(|| AppError::NotFound(uuid.to_string()))?;
        for locale in destination_locales {
            let mut copy = source.clone();
            copy.locale = locale.clone();
            self.insert(copy);
        }
        Ok(())
    }

    async fn copy(&self, uuid: &str, locale: &str) -> Result<String, AppError> {
        self.record(format!("copy {uuid} {locale}"));
        let mut copy = self
            .get(uuid, locale)
            .ok_or_else(|| AppError::NotFound(uuid.to_string()))?;
        copy.uuid = uuid::Uuid::new_v4().to_string();
        let new_uuid = copy.uuid.clone();
        self.insert(copy);
        Ok(new_uuid)
    }

    async fn reorder(&self, page_uuids: &[String], locale: &str) -> Result<(), AppError> {
        self.record(format!("order {locale}"));
        let mut documents = self.documents.lock().unwrap();
        for ((_, doc_locale), document) in documents.iter_mut() {
            if doc_locale != locale {
                continue;
            }
            for capability in &mut document.capabilities {
                if let Capability::HasChildren(pages) = capability {
                    for page in pages.iter_mut() {
                        if let Some(position) = page_uuids.iter().position(|u| *u == page.uuid) {
                            page.page_number = position as u32 + 2;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeActors {
    pub users: Vec<User>,
    pub contacts: Vec<Contact>,
}

#[async_trait]
impl ActorDirectory for FakeActors {
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_contact(&self, id: i64) -> Result<Option<Contact>, AppError> {
        Ok(self.contacts.iter().find(|c| c.id == id).cloned())
    }
}

/// Categories, tags and media whose names derive from their ids.
pub struct FakeTaxonomy;

#[async_trait]
impl CategoryRepository for FakeTaxonomy {
    async fn find_by_ids(&self, ids: &[i64], _locale: &str) -> Result<Vec<Category>, AppError> {
        Ok(ids
            .iter()
            .map(|id| Category {
                id: *id,
                key: Some(format!("category-{id}")),
                name: format!("Category {id}"),
                keywords: Vec::new(),
            })
            .collect())
    }
}

#[async_trait]
impl TagRepository for FakeTaxonomy {
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Tag>, AppError> {
        Ok(names
            .iter()
            .filter_map(|name| {
                name.trim_start_matches("tag-")
                    .parse()
                    .ok()
                    .map(|id| Tag {
                        id,
                        name: name.clone(),
                    })
            })
            .collect())
    }
}

#[async_trait]
impl MediaRepository for FakeTaxonomy {
    async fn find_by_ids(&self, ids: &[i64], _locale: &str) -> Result<Vec<Media>, AppError> {
        Ok(ids
            .iter()
            .map(|id| Media {
                id: *id,
                title: Some(format!("Media {id}")),
                copyright: None,
                url: Some(format!("/media/{id}.jpg")),
                formats: Default::default(),
            })
            .collect())
    }
}

pub struct EchoTranslator;

impl Translator for EchoTranslator {
    fn translate(&self, key: &str, locale: &str) -> String {
        format!("{key}@{locale}")
    }
}

/// In-memory default and live indexes with their indexers.
pub struct TestEnv {
    pub engine: Arc<MemoryEngine>,
    pub settings: Arc<IndexSettings>,
    pub content: Arc<FakeContentRepository>,
    pub default_manager: ViewManager,
    pub live_manager: ViewManager,
    pub draft: ArticleIndexer,
    pub live: ArticleIndexer,
}

impl TestEnv {
    pub async fn start() -> Self {
        Self::with_settings(IndexSettings {
            clear_page_size: 5,
            remove_page_size: 5,
            sitemap_page_size: 3,
            locales: vec!["de".into(), "en".into()],
            ..IndexSettings::default()
        })
        .await
    }

    pub async fn with_settings(settings: IndexSettings) -> Self {
        let engine = Arc::new(MemoryEngine::new());
        let settings = Arc::new(settings);
        let content = Arc::new(FakeContentRepository::default());

        let default_manager = ViewManager::new(engine.clone(), settings.default_index.as_str());
        let live_manager = ViewManager::new(engine.clone(), settings.live_index.as_str());
        default_manager.create().await.expect("Failed to create default index");
        live_manager.create().await.expect("Failed to create live index");

        let actors = FakeActors {
            users: vec![User {
                id: 1,
                full_name: "Max Mustermann".into(),
                contact_id: Some(11),
            }],
            contacts: vec![Contact {
                id: 11,
                full_name: "Max Mustermann".into(),
            }],
        };
        let services = IndexerServices {
            actors: Arc::new(actors),
            categories: Arc::new(FakeTaxonomy),
            tags: Arc::new(FakeTaxonomy),
            media: Arc::new(FakeTaxonomy),
            translator: Arc::new(EchoTranslator),
        };

        let draft = ArticleIndexer::new(default_manager.clone(), services.clone(), settings.clone());
        let live = ArticleIndexer::new(live_manager.clone(), services, settings.clone());

        Self {
            engine,
            settings,
            content,
            default_manager,
            live_manager,
            draft,
            live,
        }
    }

    /// Stores `document` in the content repository and indexes it as a draft.
    pub async fn publish_draft(&self, document: ContentDocument) {
        self.content.insert(document.clone());
        self.draft
            .index(&document)
            .await
            .expect("Failed to index draft");
    }

    /// Stores `document` and indexes it in both indexes.
    pub async fn publish(&self, mut document: ContentDocument) {
        document.workflow_stage = WorkflowStage::Published;
        document.published.get_or_insert(timestamp(2024, 1, 1));
        self.publish_draft(document.clone()).await;
        self.live
            .index(&document)
            .await
            .expect("Failed to index live");
    }
}

pub fn timestamp(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

/// Article with a route, one author and a blog template.
pub fn article(uuid: &str, locale: &str, title: &str) -> ContentDocument {
    let mut document = ContentDocument::new(uuid, locale, "default");
    document.title = Some(title.to_string());
    document.structure.article_type = Some("blog".into());
    document.capabilities = vec![Capability::HasRoute(format!("/{locale}/articles/{uuid}"))];
    document.creator = Some(1);
    document.changer = Some(1);
    document.author = Some(11);
    document.created = Some(timestamp(2024, 1, 1));
    document.changed = Some(timestamp(2024, 1, 2));
    document.authored = Some(timestamp(2024, 1, 1));
    document
}

pub fn with_excerpt(mut document: ContentDocument, categories: &[i64], tags: &[i64]) -> ContentDocument {
    document.extensions.excerpt = Some(ExcerptData {
        categories: categories.to_vec(),
        tags: tags.iter().map(|id| format!("tag-{id}")).collect(),
        ..ExcerptData::default()
    });
    document
}

pub fn with_pages(mut document: ContentDocument, pages: &[&str]) -> ContentDocument {
    let children = pages
        .iter()
        .enumerate()
        .map(|(i, uuid)| ContentPage {
            uuid: uuid.to_string(),
            page_title: Some(format!("Page {}", i + 2)),
            route_path: Some(format!("/articles/{uuid}")),
            page_number: i as u32 + 2,
            properties: Default::default(),
        })
        .collect();
    document.capabilities.push(Capability::HasChildren(children));
    document
}
