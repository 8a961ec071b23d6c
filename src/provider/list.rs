use serde_json::Value;

use crate::error::AppError;
use crate::models::filter::SortOrder;
use crate::models::identity::view_document_ids;
use crate::models::view::ViewDocument;
use crate::provider::data_provider::sort_field;
use crate::search::query::{BoolQuery, Query, Search};
use crate::view::manager::ViewManager;

/// Parameters of the admin article list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub locale: String,
    pub ids: Vec<String>,
    pub search_pattern: Option<String>,
    /// Fields searched by `search_pattern`; configured search fields when empty.
    pub search_fields: Vec<String>,
    pub article_type: Option<String>,
    pub contact_id: Option<i64>,
    pub category_id: Option<i64>,
    pub tag_id: Option<i64>,
    pub page_id: Option<String>,
    pub workflow_stage: Option<String>,
    pub authored_from: Option<String>,
    pub authored_to: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub page: u64,
    pub limit: Option<u64>,
}

impl ListParams {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            ids: Vec::new(),
            search_pattern: None,
            search_fields: Vec::new(),
            article_type: None,
            contact_id: None,
            category_id: None,
            tag_id: None,
            page_id: None,
            workflow_stage: None,
            authored_from: None,
            authored_to: None,
            sort_by: None,
            sort_order: SortOrder::Asc,
            page: 1,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListResult {
    pub documents: Vec<ViewDocument>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

impl ListResult {
    pub fn pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit)
    }
}

#[derive(Clone)]
pub struct ArticleListQuery {
    view_manager: ViewManager,
    search_fields: Vec<String>,
    default_limit: u64,
}

impl ArticleListQuery {
    pub fn new(view_manager: ViewManager, search_fields: Vec<String>, default_limit: u64) -> Self {
        Self {
            view_manager,
            search_fields,
            default_limit,
        }
    }

    pub fn build_query(&self, params: &ListParams) -> Query {
        let mut query = BoolQuery::new();

        if !params.ids.is_empty() {
            query = query.must(Query::ids(&view_document_ids(&params.ids, &params.locale)));
        }

        query = query.must(Query::term("locale", params.locale.as_str()));

        if let Some(pattern) = params.search_pattern.as_deref().filter(|p| !p.is_empty()) {
            let fields = if params.search_fields.is_empty() {
                &self.search_fields
            } else {
                &params.search_fields
            };
            let text = fields
                .iter()
                .fold(BoolQuery::new(), |q, field| q.should(Query::match_text(field, pattern)));
            if !text.is_empty() {
                query = query.must(text.into());
            }
        }

        if let Some(article_type) = params.article_type.as_deref() {
            query = query.must(Query::term("type", article_type));
        }

        if let Some(contact_id) = params.contact_id {
            let contact = ["changerContactId", "creatorContactId", "authorId"]
                .into_iter()
                .fold(BoolQuery::new(), |q, field| q.should(Query::term(field, contact_id)));
            query = query.must(contact.into());
        }

        if let Some(category_id) = params.category_id {
            query = query.must(Query::term("excerpt.categories.id", category_id));
        }

        if let Some(tag_id) = params.tag_id {
            query = query.must(Query::term("excerpt.tags.id", tag_id));
        }

        if let Some(page_id) = params.page_id.as_deref() {
            query = query.must(Query::term("parentPageUuid", page_id));
        }

        if let Some(stage) = params.workflow_stage.as_deref() {
            query = query.must(Query::term("publishedState", stage == "published"));
        }

        if params.authored_from.is_some() || params.authored_to.is_some() {
            query = query.must(Query::range(
                "authored",
                params.authored_from.clone().map(Value::String),
                params.authored_to.clone().map(Value::String),
            ));
        }

        query.into()
    }

    pub async fn execute(&self, params: &ListParams) -> Result<ListResult, AppError> {
        let limit = if params.ids.is_empty() {
            params.limit.unwrap_or(self.default_limit)
        } else {
            params.ids.len() as u64
        };
        let page = params.page.max(1);

        let mut search = Search::new(self.build_query(params))
            .from((page - 1).saturating_mul(limit))
            .size(limit);
        if let Some(column) = params.sort_by.as_deref() {
            match sort_field(column) {
                Some(field) => search = search.sort(field, params.sort_order),
                None => return Err(AppError::BadRequest(format!("Unknown sort field: {column}"))),
            }
        }

        let result = self.view_manager.search(&search).await?;
        let documents = if params.ids.is_empty() {
            result.documents
        } else {
            in_requested_order(result.documents, &params.ids)
        };

        Ok(ListResult {
            documents,
            page,
            limit,
            total: result.total,
        })
    }
}

fn in_requested_order(mut documents: Vec<ViewDocument>, ids: &[String]) -> Vec<ViewDocument> {
    documents.sort_by_key(|d| {
        ids.iter()
            .position(|id| *id == d.uuid)
            .unwrap_or(usize::MAX)
    });
    documents
}
