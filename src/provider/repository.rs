use crate::error::AppError;
use crate::models::filter::SortOrder;
use crate::models::identity::view_document_id;
use crate::models::view::ViewDocument;
use crate::search::query::{BoolQuery, Query, Search};
use crate::view::manager::ViewManager;

pub const DEFAULT_LIMIT: u64 = 5;

/// Recent and similar article lookups on one view index.
#[derive(Clone)]
pub struct ArticleViewRepository {
    view_manager: ViewManager,
    search_fields: Vec<String>,
}

impl ArticleViewRepository {
    pub fn new(view_manager: ViewManager, search_fields: Vec<String>) -> Self {
        Self {
            view_manager,
            search_fields,
        }
    }

    /// Most recently authored articles, newest first.
    pub async fn find_recent(
        &self,
        exclude_uuid: Option<&str>,
        limit: Option<u64>,
        types: &[String],
        locale: Option<&str>,
    ) -> Result<Vec<ViewDocument>, AppError> {
        let mut query = Self::base_query(types, locale);
        if let Some(uuid) = exclude_uuid {
            query = query.must_not(Query::term("uuid", uuid));
        }
        if query.must.is_empty() {
            query = query.must(Query::MatchAll);
        }

        let search = Search::new(query)
            .size(limit.unwrap_or(DEFAULT_LIMIT))
            .sort("authored", SortOrder::Desc);
        Ok(self.view_manager.search(&search).await?.documents)
    }

    /// Articles similar to `uuid` in `locale`, excluding the article itself.
    pub async fn find_similar(
        &self,
        uuid: &str,
        limit: Option<u64>,
        types: &[String],
        locale: &str,
    ) -> Result<Vec<ViewDocument>, AppError> {
        let query = Self::base_query(types, Some(locale)).must(Query::MoreLikeThis {
            fields: self.search_fields.clone(),
            like: vec![view_document_id(uuid, locale)],
            min_term_freq: 1,
            min_doc_freq: 2,
        });

        let search = Search::new(query).size(limit.unwrap_or(DEFAULT_LIMIT));
        Ok(self.view_manager.search(&search).await?.documents)
    }

    fn base_query(types: &[String], locale: Option<&str>) -> BoolQuery {
        let mut query = BoolQuery::new();
        if let Some(locale) = locale {
            query = query.filter(Query::term("locale", locale));
        }
        if !types.is_empty() {
            let types = types
                .iter()
                .fold(BoolQuery::new(), |q, t| q.should(Query::term("type", t.as_str())));
            query = query.must(types.into());
        }
        query
    }
}
