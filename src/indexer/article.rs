use std::sync::Arc;

use serde_json::Value;

use crate::config::IndexSettings;
use crate::db::repository::{ActorDirectory, CategoryRepository, MediaRepository, TagRepository};
use crate::error::AppError;
use crate::indexer::enricher::IndexEnricher;
use crate::indexer::factory::{seo_view, ExcerptFactory};
use crate::models::content::{
    ContentDocument, PAGE_TREE_ROUTE_TYPE, ROUTE_FIELD, ROUTE_TAG, TEASER_DESCRIPTION_TAG,
    TEASER_MEDIA_TAG,
};
use crate::models::identity::view_document_id;
use crate::models::view::{LocalizationKind, LocalizationState, PageView, ViewDocument};
use crate::search::query::{Query, Search};
use crate::services::Translator;
use crate::view::manager::ViewManager;

/// External services the indexer resolves references through.
#[derive(Clone)]
pub struct IndexerServices {
    pub actors: Arc<dyn ActorDirectory>,
    pub categories: Arc<dyn CategoryRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub media: Arc<dyn MediaRepository>,
    pub translator: Arc<dyn Translator>,
}

/// Outcome of a paged scan-and-delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkDeleteSummary {
    /// Pages fetched, including the final empty one.
    pub pages_scanned: usize,
    pub deleted: usize,
}

/// Projects content documents into one view index.
#[derive(Clone)]
pub struct ArticleIndexer {
    view_manager: ViewManager,
    actors: Arc<dyn ActorDirectory>,
    translator: Arc<dyn Translator>,
    excerpts: ExcerptFactory,
    settings: Arc<IndexSettings>,
    enrichers: Vec<Arc<dyn IndexEnricher>>,
}

impl ArticleIndexer {
    pub fn new(
        view_manager: ViewManager,
        services: IndexerServices,
        settings: Arc<IndexSettings>,
    ) -> Self {
        Self {
            view_manager,
            actors: services.actors,
            translator: services.translator,
            excerpts: ExcerptFactory::new(services.categories, services.tags, services.media),
            settings,
            enrichers: Vec::new(),
        }
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn IndexEnricher>) -> Self {
        self.enrichers.push(enricher);
        self
    }

    pub fn view_manager(&self) -> &ViewManager {
        &self.view_manager
    }

    /// Indexes `document` in its own locale.
    pub async fn index(&self, document: &ContentDocument) -> Result<Option<ViewDocument>, AppError> {
        let state = if document.shadow_locale.is_some() {
            LocalizationKind::Shadow
        } else {
            LocalizationKind::Localized
        };
        self.index_with_state(document, &document.locale, state).await
    }

    /// Projects `document` into `locale` with the given localization state.
    ///
    /// Returns `Ok(None)` without writing when a ghost would replace a
    /// document that is not a ghost itself.
    pub async fn index_with_state(
        &self,
        document: &ContentDocument,
        locale: &str,
        state: LocalizationKind,
    ) -> Result<Option<ViewDocument>, AppError> {
        let Some(mut view) = self.find_or_create(document, locale, state).await? else {
            return Ok(None);
        };

        self.populate(document, state, &mut view).await?;

        for enricher in &self.enrichers {
            enricher.enrich(document, &mut view).await?;
        }
        tracing::debug!(
            uuid = %view.uuid,
            locale = %view.locale,
            state = %state,
            "Projected article"
        );

        self.view_manager.index(&view).await?;
        Ok(Some(view))
    }

    /// Indexes ghosts of `document` into every other locale of `locales`.
    ///
    /// Returns the number of ghosts written.
    pub async fn index_ghosts(
        &self,
        document: &ContentDocument,
        locales: &[String],
    ) -> Result<usize, AppError> {
        let mut written = 0;
        for locale in locales.iter().filter(|l| **l != document.locale) {
            if self
                .index_with_state(document, locale, LocalizationKind::Ghost)
                .await?
                .is_some()
            {
                written += 1;
            }
        }
        Ok(written)
    }

    async fn find_or_create(
        &self,
        document: &ContentDocument,
        locale: &str,
        state: LocalizationKind,
    ) -> Result<Option<ViewDocument>, AppError> {
        let id = view_document_id(&document.uuid, locale);
        match self.view_manager.get(&id).await? {
            Some(existing)
                if state == LocalizationKind::Ghost && !existing.localization_state.is_ghost() =>
            {
                tracing::debug!(id = %id, "Skipped ghost over localized article");
                Ok(None)
            }
            Some(existing) => Ok(Some(existing)),
            None => Ok(Some(ViewDocument::new(&document.uuid, locale))),
        }
    }

    async fn populate(
        &self,
        document: &ContentDocument,
        state: LocalizationKind,
        view: &mut ViewDocument,
    ) -> Result<(), AppError> {
        let article_type = document.structure.article_type().to_string();

        view.uuid = document.uuid.clone();
        view.title = document.title.clone();
        view.route_path = document.route_path().map(str::to_string);
        if let Some(parent) = parent_page_uuid(document) {
            view.parent_page_uuid = Some(parent);
        }
        view.changed = document.changed;
        view.created = document.created;
        view.authored = document.authored;

        if let Some(author) = document.author {
            if let Some(contact) = self.actors.find_contact(author).await? {
                view.author_full_name = Some(contact.full_name);
                view.author_id = Some(contact.id);
            }
        }
        if let Some(changer) = document.changer {
            if let Some(user) = self.actors.find_user(changer).await? {
                view.changer_full_name = Some(user.full_name);
                view.changer_contact_id = user.contact_id;
            }
        }
        if let Some(creator) = document.creator {
            if let Some(user) = self.actors.find_user(creator).await? {
                view.creator_full_name = Some(user.full_name);
                view.creator_contact_id = user.contact_id;
            }
        }

        view.type_translation = Some(self.type_translation(&article_type, &document.locale));
        view.article_type = Some(article_type);
        view.structure_type = Some(document.structure_type.clone());
        view.published = document.published;
        view.published_state = document.is_published();

        let fallback_locale = match state {
            LocalizationKind::Shadow => document
                .shadow_locale
                .as_deref()
                .unwrap_or_else(|| document.source_locale()),
            _ => document.source_locale(),
        };
        view.localization_state = LocalizationState::new(state, fallback_locale);

        if let Some(excerpt) = &document.extensions.excerpt {
            view.excerpt = self.excerpts.create(excerpt, &document.locale).await?;
        }
        if let Some(seo) = &document.extensions.seo {
            view.seo = seo_view(seo);
        }

        if document.has_teaser_fields() {
            if let Some(description) = document.value_by_tag(TEASER_DESCRIPTION_TAG) {
                view.teaser_description = description.as_str().map(str::to_string);
            }
            if let Some(media) = document.value_by_tag(TEASER_MEDIA_TAG) {
                view.teaser_media_id = first_media_id(media);
            }
        }

        view.content_data = Some(serde_json::to_string(&document.properties)?);
        view.pages = pages(document)?;

        Ok(())
    }

    fn type_translation(&self, article_type: &str, locale: &str) -> String {
        match self.settings.type_translation_key(article_type) {
            Some(key) => self.translator.translate(key, locale),
            None => capitalize(article_type),
        }
    }

    /// Deletes every locale of `document` from the index.
    pub async fn remove(&self, document: &ContentDocument) -> Result<usize, AppError> {
        let query = Query::term("uuid", document.uuid.as_str());
        let summary =
            delete_matching(&self.view_manager, query, self.settings.remove_page_size).await?;
        tracing::info!(
            uuid = %document.uuid,
            deleted = summary.deleted,
            index = %self.view_manager.name(),
            "Removed article from index"
        );
        Ok(summary.deleted)
    }

    /// Deletes every document of the index, page by page.
    pub async fn clear(&self) -> Result<BulkDeleteSummary, AppError> {
        let summary =
            delete_matching(&self.view_manager, Query::MatchAll, self.settings.clear_page_size)
                .await?;
        tracing::info!(
            pages = summary.pages_scanned,
            deleted = summary.deleted,
            index = %self.view_manager.name(),
            "Cleared index"
        );
        Ok(summary)
    }

    /// Clears the workflow fields of an indexed article in place.
    pub async fn set_unpublished(
        &self,
        uuid: &str,
        locale: &str,
    ) -> Result<Option<ViewDocument>, AppError> {
        let id = view_document_id(uuid, locale);
        let Some(mut view) = self.view_manager.get(&id).await? else {
            return Ok(None);
        };

        view.mark_unpublished();
        self.view_manager.index(&view).await?;
        Ok(Some(view))
    }

    pub async fn create_index(&self) -> Result<(), AppError> {
        self.view_manager.create().await
    }

    pub async fn drop_index(&self) -> Result<(), AppError> {
        self.view_manager.drop().await
    }
}

/// Paged scan-and-delete of every document matching `query`.
///
/// Each page is deleted in full and the index refreshed before the next
/// fetch, so stale hits never come back; the loop ends on the first empty page.
pub async fn delete_matching(
    view_manager: &ViewManager,
    query: Query,
    page_size: u64,
) -> Result<BulkDeleteSummary, AppError> {
    let search = Search::new(query).size(page_size);
    let mut summary = BulkDeleteSummary::default();

    loop {
        let page = view_manager.search(&search).await?;
        summary.pages_scanned += 1;
        if page.documents.is_empty() {
            return Ok(summary);
        }

        for document in &page.documents {
            view_manager
                .delete(document)
                .await
                .map_err(|e| AppError::IncompleteBulkDelete {
                    deleted: summary.deleted,
                    message: e.to_string(),
                })?;
            summary.deleted += 1;
        }
        view_manager.refresh().await?;
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// First id of a media selection value (`{"ids": [..]}`).
fn first_media_id(value: &Value) -> Option<i64> {
    value
        .get("ids")
        .and_then(Value::as_array)
        .and_then(|ids| ids.first())
        .and_then(Value::as_i64)
}

/// Parent page of a page-tree route (`{"page": {"uuid": ..}}`).
fn parent_page_uuid(document: &ContentDocument) -> Option<String> {
    let structure = &document.structure;
    let property = structure
        .property_by_tag(ROUTE_TAG)
        .or_else(|| structure.property(ROUTE_FIELD))?;
    if property.property_type != PAGE_TREE_ROUTE_TYPE {
        return None;
    }

    document
        .properties
        .get(&property.name)?
        .get("page")?
        .get("uuid")?
        .as_str()
        .map(str::to_string)
}

fn pages(document: &ContentDocument) -> Result<Vec<PageView>, AppError> {
    let mut children: Vec<_> = document.children().iter().collect();
    children.sort_by_key(|child| child.page_number);

    children
        .into_iter()
        .map(|child| {
            Ok(PageView {
                uuid: child.uuid.clone(),
                title: child.page_title.clone(),
                route_path: child.route_path.clone(),
                page_number: child.page_number,
                content_data: Some(serde_json::to_string(&child.properties)?),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Contact, User};
    use crate::db::repository::{
        MockActorDirectory, MockCategoryRepository, MockMediaRepository, MockTagRepository,
    };
    use crate::indexer::enricher::MockIndexEnricher;
    use crate::models::content::{
        Capability, ContentPage, PropertyMetadata, SeoData, WorkflowStage,
    };
    use crate::search::engine::{Hit, MockSearchEngine, SearchResponse};
    use crate::search::memory::MemoryEngine;
    use crate::services::MockTranslator;
    use mockall::predicate::eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn services(actors: MockActorDirectory, translator: MockTranslator) -> IndexerServices {
        IndexerServices {
            actors: Arc::new(actors),
            categories: Arc::new(MockCategoryRepository::new()),
            tags: Arc::new(MockTagRepository::new()),
            media: Arc::new(MockMediaRepository::new()),
            translator: Arc::new(translator),
        }
    }

    async fn indexer_with(actors: MockActorDirectory, translator: MockTranslator) -> ArticleIndexer {
        let manager = ViewManager::new(Arc::new(MemoryEngine::new()), "articles");
        manager.create().await.unwrap();
        let settings: IndexSettings = serde_json::from_value(json!({
            "types": { "blog": { "translation_key": "article.type.blog" } }
        }))
        .unwrap();
        ArticleIndexer::new(manager, services(actors, translator), Arc::new(settings))
    }

    async fn indexer() -> ArticleIndexer {
        indexer_with(MockActorDirectory::new(), MockTranslator::new()).await
    }

    fn article(uuid: &str, locale: &str) -> ContentDocument {
        let mut doc = ContentDocument::new(uuid, locale, "default");
        doc.title = Some(format!("Article {uuid}"));
        doc
    }

    #[tokio::test]
    async fn test_ghost_does_not_replace_localized_view() {
        let indexer = indexer().await;
        let doc = article("a1", "de");

        indexer
            .index_with_state(&doc, "en", LocalizationKind::Localized)
            .await
            .unwrap();
        let skipped = indexer
            .index_with_state(&doc, "en", LocalizationKind::Ghost)
            .await
            .unwrap();

        assert!(skipped.is_none());
        let stored = indexer.view_manager().get("a1-en").await.unwrap().unwrap();
        assert_eq!(stored.localization_state.state, LocalizationKind::Localized);
    }

    #[tokio::test]
    async fn test_localized_replaces_ghost_view() {
        let indexer = indexer().await;
        let mut doc = article("a1", "de");

        indexer
            .index_with_state(&doc, "en", LocalizationKind::Ghost)
            .await
            .unwrap();
        doc.title = Some("Localized".into());
        indexer
            .index_with_state(&doc, "en", LocalizationKind::Localized)
            .await
            .unwrap();

        let stored = indexer.view_manager().get("a1-en").await.unwrap().unwrap();
        assert_eq!(stored.localization_state, LocalizationState::localized());
        assert_eq!(stored.title.as_deref(), Some("Localized"));
    }

    #[tokio::test]
    async fn test_ghost_replaces_ghost_view() {
        let indexer = indexer().await;
        let doc = article("a1", "de");

        indexer
            .index_with_state(&doc, "en", LocalizationKind::Ghost)
            .await
            .unwrap();
        let again = indexer
            .index_with_state(&doc, "en", LocalizationKind::Ghost)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(again.localization_state.state, LocalizationKind::Ghost);
        assert_eq!(again.localization_state.locale.as_deref(), Some("de"));
    }

    #[tokio::test]
    async fn test_index_populates_view() {
        let mut actors = MockActorDirectory::new();
        actors.expect_find_contact().returning(|id| {
            Ok(Some(Contact {
                id,
                full_name: "Ada Author".into(),
            }))
        });
        actors.expect_find_user().returning(|id| {
            Ok(Some(User {
                id,
                full_name: format!("User {id}"),
                contact_id: Some(id * 10),
            }))
        });
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .returning(|key, locale| format!("{key}@{locale}"));

        let indexer = indexer_with(actors, translator).await;

        let mut doc = article("a1", "de");
        doc.structure.article_type = Some("blog".into());
        doc.structure.properties = vec![
            PropertyMetadata::new("routePath", PAGE_TREE_ROUTE_TYPE),
            PropertyMetadata::new("description", "text_area").with_tag(TEASER_DESCRIPTION_TAG),
            PropertyMetadata::new("cover", "media_selection").with_tag(TEASER_MEDIA_TAG),
        ];
        doc.properties.insert(
            "routePath".into(),
            json!({ "page": { "uuid": "parent-1", "path": "/news" }, "path": "/news/a1" }),
        );
        doc.properties.insert("description".into(), json!("Teaser text"));
        doc.properties.insert("cover".into(), json!({ "ids": [4, 5] }));
        doc.capabilities = vec![
            Capability::HasRoute("/news/a1".into()),
            Capability::HasTeaserFields,
            Capability::HasChildren(vec![
                ContentPage {
                    uuid: "p3".into(),
                    page_title: Some("Third".into()),
                    route_path: Some("/news/a1/page-3".into()),
                    page_number: 3,
                    properties: Default::default(),
                },
                ContentPage {
                    uuid: "p2".into(),
                    page_title: Some("Second".into()),
                    route_path: Some("/news/a1/page-2".into()),
                    page_number: 2,
                    properties: Default::default(),
                },
            ]),
        ];
        doc.author = Some(7);
        doc.changer = Some(2);
        doc.creator = Some(3);
        doc.workflow_stage = WorkflowStage::Published;
        doc.extensions.seo = Some(SeoData {
            hide_in_sitemap: true,
            ..SeoData::default()
        });

        let view = indexer.index(&doc).await.unwrap().unwrap();

        assert_eq!(view.id, "a1-de");
        assert_eq!(view.route_path.as_deref(), Some("/news/a1"));
        assert_eq!(view.parent_page_uuid.as_deref(), Some("parent-1"));
        assert_eq!(view.article_type.as_deref(), Some("blog"));
        assert_eq!(view.type_translation.as_deref(), Some("article.type.blog@de"));
        assert_eq!(view.author_full_name.as_deref(), Some("Ada Author"));
        assert_eq!(view.author_id, Some(7));
        assert_eq!(view.changer_contact_id, Some(20));
        assert_eq!(view.creator_full_name.as_deref(), Some("User 3"));
        assert!(view.published_state);
        assert_eq!(view.teaser_description.as_deref(), Some("Teaser text"));
        assert_eq!(view.teaser_media_id, Some(4));
        assert!(view.seo.hide_in_sitemap);
        assert_eq!(
            view.pages.iter().map(|p| p.page_number).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert_eq!(view.localization_state, LocalizationState::localized());

        let stored = indexer.view_manager().get("a1-de").await.unwrap().unwrap();
        assert_eq!(stored, view);
    }

    #[tokio::test]
    async fn test_missing_actors_leave_fields_empty() {
        let mut actors = MockActorDirectory::new();
        actors.expect_find_contact().returning(|_| Ok(None));
        actors.expect_find_user().returning(|_| Ok(None));
        let indexer = indexer_with(actors, MockTranslator::new()).await;

        let mut doc = article("a1", "de");
        doc.author = Some(99);
        doc.changer = Some(98);

        let view = indexer.index(&doc).await.unwrap().unwrap();
        assert!(view.author_full_name.is_none());
        assert!(view.author_id.is_none());
        assert!(view.changer_full_name.is_none());
        assert_eq!(view.type_translation.as_deref(), Some("Default"));
    }

    #[tokio::test]
    async fn test_teaser_media_without_ids_is_none() {
        let indexer = indexer().await;
        let mut doc = article("a1", "de");
        doc.structure.properties =
            vec![PropertyMetadata::new("cover", "media_selection").with_tag(TEASER_MEDIA_TAG)];
        doc.properties.insert("cover".into(), json!({ "ids": [] }));
        doc.capabilities = vec![Capability::HasTeaserFields];

        let view = indexer.index(&doc).await.unwrap().unwrap();
        assert!(view.teaser_media_id.is_none());
    }

    #[tokio::test]
    async fn test_shadow_document_records_shadowed_locale() {
        let indexer = indexer().await;
        let mut doc = article("a1", "de");
        doc.shadow_locale = Some("en".into());

        let view = indexer.index(&doc).await.unwrap().unwrap();
        assert_eq!(view.localization_state.state, LocalizationKind::Shadow);
        assert_eq!(view.localization_state.locale.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_enrichers_run_before_persisting() {
        let mut enricher = MockIndexEnricher::new();
        enricher.expect_enrich().times(1).returning(|_, view| {
            view.teaser_description = Some("enriched".into());
            Ok(())
        });

        let indexer = indexer().await.with_enricher(Arc::new(enricher));
        indexer.index(&article("a1", "de")).await.unwrap();

        let stored = indexer.view_manager().get("a1-de").await.unwrap().unwrap();
        assert_eq!(stored.teaser_description.as_deref(), Some("enriched"));
    }

    #[tokio::test]
    async fn test_set_unpublished() {
        let indexer = indexer().await;
        let mut doc = article("a1", "de");
        doc.workflow_stage = WorkflowStage::Published;
        doc.published = Some(chrono::Utc::now());
        indexer.index(&doc).await.unwrap();

        let view = indexer.set_unpublished("a1", "de").await.unwrap().unwrap();
        assert!(view.published.is_none());
        assert!(!view.published_state);
        assert!(indexer.set_unpublished("zz", "de").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_index_ghosts_skips_own_locale() {
        let indexer = indexer().await;
        let doc = article("a1", "de");
        indexer.index(&doc).await.unwrap();

        let locales = vec!["de".to_string(), "en".to_string(), "fr".to_string()];
        let written = indexer.index_ghosts(&doc, &locales).await.unwrap();
        assert_eq!(written, 2);

        let de = indexer.view_manager().get("a1-de").await.unwrap().unwrap();
        assert_eq!(de.localization_state.state, LocalizationKind::Localized);
        let fr = indexer.view_manager().get("a1-fr").await.unwrap().unwrap();
        assert!(fr.localization_state.is_ghost());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("blog"), "Blog");
        assert_eq!(capitalize(""), "");
    }

    fn hits(uuids: &[&str]) -> SearchResponse {
        let hits = uuids
            .iter()
            .map(|uuid| {
                let document = ViewDocument::new(uuid, "de");
                Hit {
                    id: document.id.clone(),
                    source: ViewManager::to_source(&document).unwrap(),
                }
            })
            .collect::<Vec<_>>();
        SearchResponse {
            total: hits.len() as u64,
            hits,
        }
    }

    #[tokio::test]
    async fn test_delete_matching_refreshes_between_pages() {
        let refreshed = Arc::new(AtomicBool::new(false));
        let mut engine = MockSearchEngine::new();
        let visible = refreshed.clone();
        engine.expect_search().times(2).returning(move |_, _| {
            if visible.load(Ordering::SeqCst) {
                Ok(SearchResponse::default())
            } else {
                Ok(hits(&["a1", "a2"]))
            }
        });
        engine.expect_delete().times(2).returning(|_, _| Ok(()));
        let flag = refreshed.clone();
        engine
            .expect_refresh()
            .with(eq("articles"))
            .times(1)
            .returning(move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            });

        let manager = ViewManager::new(Arc::new(engine), "articles");
        let summary = delete_matching(&manager, Query::MatchAll, 500).await.unwrap();

        assert_eq!(
            summary,
            BulkDeleteSummary {
                pages_scanned: 2,
                deleted: 2
            }
        );
    }

    #[tokio::test]
    async fn test_failed_delete_aborts_as_incomplete() {
        let mut engine = MockSearchEngine::new();
        engine
            .expect_search()
            .times(1)
            .returning(|_, _| Ok(hits(&["a1", "a2", "a3"])));
        engine
            .expect_delete()
            .with(eq("articles"), eq("a1-de"))
            .times(1)
            .returning(|_, _| Ok(()));
        engine
            .expect_delete()
            .with(eq("articles"), eq("a2-de"))
            .times(1)
            .returning(|_, _| Err(AppError::Search("node unavailable".into())));
        engine.expect_refresh().times(0);

        let manager = ViewManager::new(Arc::new(engine), "articles");
        let err = delete_matching(&manager, Query::MatchAll, 500)
            .await
            .unwrap_err();

        match err {
            AppError::IncompleteBulkDelete { deleted, message } => {
                assert_eq!(deleted, 1);
                assert!(message.contains("node unavailable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
