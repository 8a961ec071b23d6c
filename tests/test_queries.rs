mod common;

use article_index::models::content::ExcerptData;
use article_index::models::filter::SortOrder;
use article_index::provider::link::LinkProvider;
use article_index::provider::list::{ArticleListQuery, ListParams};
use article_index::provider::repository::ArticleViewRepository;
use article_index::provider::teaser::TeaserProvider;

use common::{article, timestamp, with_excerpt, TestEnv};

async fn seed(env: &TestEnv) {
    let mut rust = with_excerpt(article("a1", "de", "Rust async runtime"), &[10], &[1]);
    rust.authored = Some(timestamp(2024, 3, 1));
    env.publish(rust).await;

    let mut traits = article("a2", "de", "Async traits explained");
    traits.authored = Some(timestamp(2024, 1, 15));
    traits.author = None;
    traits.creator = None;
    traits.changer = None;
    env.publish_draft(traits).await;

    let mut garden = article("a3", "de", "Gardening tips");
    garden.authored = Some(timestamp(2023, 6, 1));
    garden.structure.article_type = Some("video".into());
    env.publish(garden).await;

    env.publish(article("a1", "en", "Rust async runtime")).await;
}

fn list_query(env: &TestEnv) -> ArticleListQuery {
    ArticleListQuery::new(
        env.default_manager.clone(),
        env.settings.search_fields.clone(),
        env.settings.default_limit,
    )
}

fn uuids(documents: &[article_index::models::view::ViewDocument]) -> Vec<&str> {
    documents.iter().map(|d| d.uuid.as_str()).collect()
}

#[tokio::test]
async fn list_filters_by_locale_and_sorts() {
    let env = TestEnv::start().await;
    seed(&env).await;

    let mut params = ListParams::new("de");
    params.sort_by = Some("authored".into());
    params.sort_order = SortOrder::Desc;
    let result = list_query(&env).execute(&params).await.unwrap();

    assert_eq!(result.total, 3);
    assert_eq!(uuids(&result.documents), vec!["a1", "a2", "a3"]);
}

#[tokio::test]
async fn list_ids_keep_requested_order() {
    let env = TestEnv::start().await;
    seed(&env).await;

    let mut params = ListParams::new("de");
    params.ids = vec!["a3".into(), "a1".into()];
    let result = list_query(&env).execute(&params).await.unwrap();

    assert_eq!(result.limit, 2);
    assert_eq!(uuids(&result.documents), vec!["a3", "a1"]);
}

#[tokio::test]
async fn list_search_pattern_matches_any_search_field() {
    let env = TestEnv::start().await;
    seed(&env).await;

    let mut params = ListParams::new("de");
    params.search_pattern = Some("async".into());
    params.sort_by = Some("title".into());
    let result = list_query(&env).execute(&params).await.unwrap();

    assert_eq!(uuids(&result.documents), vec!["a2", "a1"]);
}

#[tokio::test]
async fn list_filters_combine() {
    let env = TestEnv::start().await;
    seed(&env).await;
    let query = list_query(&env);

    let mut by_contact = ListParams::new("de");
    by_contact.contact_id = Some(11);
    let mut contacts = uuids(&query.execute(&by_contact).await.unwrap().documents)
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    contacts.sort();
    assert_eq!(contacts, vec!["a1", "a3"]);

    let mut by_type = ListParams::new("de");
    by_type.article_type = Some("video".into());
    assert_eq!(uuids(&query.execute(&by_type).await.unwrap().documents), vec!["a3"]);

    let mut by_taxonomy = ListParams::new("de");
    by_taxonomy.category_id = Some(10);
    by_taxonomy.tag_id = Some(1);
    assert_eq!(
        uuids(&query.execute(&by_taxonomy).await.unwrap().documents),
        vec!["a1"]
    );

    let mut drafts = ListParams::new("de");
    drafts.workflow_stage = Some("test".into());
    assert_eq!(uuids(&query.execute(&drafts).await.unwrap().documents), vec!["a2"]);

    let mut authored = ListParams::new("de");
    authored.authored_from = Some("2024-01-01".into());
    authored.authored_to = Some("2024-02-01".into());
    assert_eq!(uuids(&query.execute(&authored).await.unwrap().documents), vec!["a2"]);
}

#[tokio::test]
async fn list_pages_through_results() {
    let env = TestEnv::start().await;
    seed(&env).await;

    let mut params = ListParams::new("de");
    params.sort_by = Some("title".into());
    params.limit = Some(2);
    params.page = 2;
    let result = list_query(&env).execute(&params).await.unwrap();

    assert_eq!(result.total, 3);
    assert_eq!(result.pages(), 2);
    assert_eq!(uuids(&result.documents), vec!["a1"]);
}

#[tokio::test]
async fn teaser_prefers_excerpt_values() {
    let env = TestEnv::start().await;
    let mut document = article("a1", "de", "Artikel");
    document.extensions.excerpt = Some(ExcerptData {
        title: Some("Kurz".into()),
        more: Some("Weiterlesen".into()),
        images: article_index::models::content::MediaSelection { ids: vec![42, 43] },
        ..ExcerptData::default()
    });
    env.publish_draft(document).await;
    env.publish_draft(article("a2", "de", "Zweiter")).await;

    let teasers = TeaserProvider::new(env.default_manager.clone())
        .find(&["a1".into(), "a2".into(), "missing".into()], "de")
        .await
        .unwrap();

    assert_eq!(teasers.len(), 2);
    let first = teasers.iter().find(|t| t.id == "a1").unwrap();
    assert_eq!(first.title.as_deref(), Some("Kurz"));
    assert_eq!(first.more_text.as_deref(), Some("Weiterlesen"));
    assert_eq!(first.media_id, Some(42));
    assert_eq!(first.url.as_deref(), Some("/de/articles/a1"));
    let second = teasers.iter().find(|t| t.id == "a2").unwrap();
    assert_eq!(second.title.as_deref(), Some("Zweiter"));
    assert_eq!(second.media_id, None);
}

#[tokio::test]
async fn links_come_from_the_live_index_when_published() {
    let env = TestEnv::start().await;
    seed(&env).await;
    let links = LinkProvider::new(env.default_manager.clone(), env.live_manager.clone());
    let hrefs = vec!["a2".to_string(), "a1".to_string()];

    let drafts = links.preload(&hrefs, "de", false).await.unwrap();
    assert_eq!(
        drafts.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(),
        vec!["a2", "a1"]
    );
    assert!(!drafts[0].published);
    assert!(drafts[1].published);

    let live = links.preload(&hrefs, "de", true).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].id, "a1");
    assert_eq!(live[0].url.as_deref(), Some("/de/articles/a1"));
}

#[tokio::test]
async fn recent_articles_are_newest_first() {
    let env = TestEnv::start().await;
    seed(&env).await;
    let repository =
        ArticleViewRepository::new(env.default_manager.clone(), env.settings.search_fields.clone());

    let recent = repository
        .find_recent(Some("a1"), None, &[], Some("de"))
        .await
        .unwrap();
    assert_eq!(uuids(&recent), vec!["a2", "a3"]);

    let videos = repository
        .find_recent(None, Some(1), &["video".to_string()], Some("de"))
        .await
        .unwrap();
    assert_eq!(uuids(&videos), vec!["a3"]);
}

#[tokio::test]
async fn similar_articles_share_terms() {
    let env = TestEnv::start().await;
    seed(&env).await;
    let repository =
        ArticleViewRepository::new(env.default_manager.clone(), env.settings.search_fields.clone());

    let similar = repository.find_similar("a1", None, &[], "de").await.unwrap();

    assert_eq!(uuids(&similar), vec!["a2"]);
}
