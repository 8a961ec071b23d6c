//! Smart-content style data providers over the view index.

use std::sync::Arc;

use crate::db::repository::ContentRepository;
use crate::error::AppError;
use crate::models::filter::{split_list, ArticleFilters};
use crate::models::view::ViewDocument;
use crate::search::query::{has_next_page, BoolQuery, Pagination, Query, Search};
use crate::services::ReferenceStore;
use crate::view::manager::ViewManager;

/// Parameters configured on the content property using the provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyParameters {
    /// Comma separated article types.
    pub types: Option<String>,
    /// Skip articles already delivered earlier in the same request.
    pub exclude_duplicates: bool,
}

/// Requested result window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<u64>,
    pub page: u64,
    pub page_size: Option<u64>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: None,
            page: 1,
            page_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDataItem {
    pub id: String,
    pub title: Option<String>,
    pub document: ViewDocument,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataProviderResult<T> {
    pub items: Vec<T>,
    pub has_next_page: bool,
}

impl<T> DataProviderResult<T> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_next_page: false,
        }
    }
}

/// Selected data source, shown next to the property in the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasourceItem {
    pub id: String,
    pub title: Option<String>,
    pub url: Option<String>,
}

/// Index field used to sort by a list column; `None` for unknown columns.
///
/// Accepts `camelCase` and `snake_case` column names.
pub fn sort_field(column: &str) -> Option<&'static str> {
    let normalized: String = column
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_lowercase();

    match normalized.as_str() {
        "title" => Some("title.raw"),
        "typetranslation" => Some("typeTranslation.raw"),
        "creatorfullname" => Some("creatorFullName.raw"),
        "changerfullname" => Some("changerFullName.raw"),
        "authorfullname" => Some("authorFullName.raw"),
        "created" => Some("created"),
        "changed" => Some("changed"),
        "authored" => Some("authored"),
        "published" => Some("published"),
        _ => None,
    }
}

/// Compiles typed filters into the provider query.
///
/// Taxonomy dimensions AND together; an empty taxonomy matches everything.
pub fn create_search_query(filters: &ArticleFilters, locale: Option<&str>) -> BoolQuery {
    let mut search_query = BoolQuery::new();

    for uuid in &filters.excluded {
        search_query = search_query.must_not(Query::term("uuid", uuid.as_str()));
    }

    if let Some(locale) = locale {
        search_query = search_query.must(Query::term("locale", locale));
    }

    if !filters.types.is_empty() {
        let types = filters
            .types
            .iter()
            .fold(BoolQuery::new(), |q, t| q.should(Query::term("type", t.as_str())));
        search_query = search_query.must(types.into());
    }

    if !filters.has_taxonomy() {
        return search_query.must(Query::MatchAll);
    }

    let dimensions = [
        (&filters.tags, filters.tag_operator, "excerpt.tags.id"),
        (&filters.website_tags, filters.website_tags_operator, "excerpt.tags.id"),
        (&filters.categories, filters.category_operator, "excerpt.categories.id"),
        (
            &filters.website_categories,
            filters.website_categories_operator,
            "excerpt.categories.id",
        ),
    ];
    let taxonomy = dimensions
        .into_iter()
        .filter(|(values, _, _)| !values.is_empty())
        .fold(BoolQuery::new(), |query, (values, operator, field)| {
            query.must(Query::terms_with_operator(field, values.iter().copied(), operator))
        });

    search_query.must(taxonomy.into())
}

#[derive(Clone)]
pub struct ArticleDataProvider {
    view_manager: ViewManager,
    reference_store: Arc<dyn ReferenceStore>,
    default_limit: u64,
}

impl ArticleDataProvider {
    pub fn new(
        view_manager: ViewManager,
        reference_store: Arc<dyn ReferenceStore>,
        default_limit: u64,
    ) -> Self {
        Self {
            view_manager,
            reference_store,
            default_limit,
        }
    }

    pub async fn resolve_data_items(
        &self,
        filters: &ArticleFilters,
        parameters: &PropertyParameters,
        locale: &str,
        request: PageRequest,
    ) -> Result<DataProviderResult<ArticleDataItem>, AppError> {
        let filters = self.prepare_filters(filters, parameters);
        let query = create_search_query(&filters, Some(locale));
        let result = self.execute(query, &filters, request).await?;

        Ok(DataProviderResult {
            items: result
                .items
                .into_iter()
                .map(|document| ArticleDataItem {
                    id: document.uuid.clone(),
                    title: document.title.clone(),
                    document,
                })
                .collect(),
            has_next_page: result.has_next_page,
        })
    }

    /// Like [`Self::resolve_data_items`], recording every delivered uuid in the
    /// reference store.
    pub async fn resolve_resource_items(
        &self,
        filters: &ArticleFilters,
        parameters: &PropertyParameters,
        locale: &str,
        request: PageRequest,
    ) -> Result<DataProviderResult<ViewDocument>, AppError> {
        let filters = self.prepare_filters(filters, parameters);
        let query = create_search_query(&filters, Some(locale));
        let result = self.execute(query, &filters, request).await?;
        self.record_references(&result.items);
        Ok(result)
    }

    /// Plain providers have no data source.
    pub fn resolve_datasource(&self) -> Option<DatasourceItem> {
        None
    }

    fn record_references(&self, documents: &[ViewDocument]) {
        for document in documents {
            self.reference_store.add(&document.uuid);
        }
    }

    fn prepare_filters(
        &self,
        filters: &ArticleFilters,
        parameters: &PropertyParameters,
    ) -> ArticleFilters {
        let mut filters = filters.clone();
        filters.types = parameters
            .types
            .as_deref()
            .map(split_list)
            .unwrap_or_default();
        if parameters.exclude_duplicates {
            filters.excluded.extend(self.reference_store.all());
        }
        filters
    }

    async fn execute(
        &self,
        query: BoolQuery,
        filters: &ArticleFilters,
        request: PageRequest,
    ) -> Result<DataProviderResult<ViewDocument>, AppError> {
        let pagination = Pagination::compute(
            request.page,
            request.page_size,
            request.limit,
            self.default_limit,
        );
        let mut search = Search::new(query).paginate(pagination);
        for column in &filters.sort_by {
            match sort_field(column) {
                Some(field) => search = search.sort(field, filters.sort_method),
                None => tracing::warn!(column = %column, "Ignoring unknown sort column"),
            }
        }

        let page = self.view_manager.search(&search).await?;
        Ok(DataProviderResult {
            has_next_page: has_next_page(
                page.total,
                request.limit,
                request.page,
                request.page_size,
            ),
            items: page.documents,
        })
    }
}

/// Data provider scoped to the articles routed below a page of the page tree.
#[derive(Clone)]
pub struct PageTreeDataProvider {
    inner: ArticleDataProvider,
    content: Arc<dyn ContentRepository>,
}

impl PageTreeDataProvider {
    pub fn new(inner: ArticleDataProvider, content: Arc<dyn ContentRepository>) -> Self {
        Self { inner, content }
    }

    /// `None` without a data source; resolved data-source queries get a
    /// route prefix constraint.
    async fn create_search_query(
        &self,
        filters: &ArticleFilters,
        locale: &str,
    ) -> Result<Option<BoolQuery>, AppError> {
        let Some(data_source) = filters.data_source.as_deref() else {
            return Ok(None);
        };

        let mut query = create_search_query(filters, Some(locale));
        match self.content.find_page(data_source, locale).await? {
            Some(page) => {
                if let Some(route_path) = page.route_path.as_deref() {
                    query = query.must(Query::prefix("routePath", route_path));
                }
            }
            // the selected data source may have been removed
            None => tracing::warn!(data_source = %data_source, "Data source not found"),
        }
        Ok(Some(query))
    }

    pub async fn resolve_data_items(
        &self,
        filters: &ArticleFilters,
        parameters: &PropertyParameters,
        locale: &str,
        request: PageRequest,
    ) -> Result<DataProviderResult<ArticleDataItem>, AppError> {
        let filters = self.inner.prepare_filters(filters, parameters);
        let Some(query) = self.create_search_query(&filters, locale).await? else {
            return Ok(DataProviderResult::empty());
        };
        let result = self.inner.execute(query, &filters, request).await?;

        Ok(DataProviderResult {
            items: result
                .items
                .into_iter()
                .map(|document| ArticleDataItem {
                    id: document.uuid.clone(),
                    title: document.title.clone(),
                    document,
                })
                .collect(),
            has_next_page: result.has_next_page,
        })
    }

    pub async fn resolve_resource_items(
        &self,
        filters: &ArticleFilters,
        parameters: &PropertyParameters,
        locale: &str,
        request: PageRequest,
    ) -> Result<DataProviderResult<ViewDocument>, AppError> {
        let filters = self.inner.prepare_filters(filters, parameters);
        let Some(query) = self.create_search_query(&filters, locale).await? else {
            return Ok(DataProviderResult::empty());
        };
        let result = self.inner.execute(query, &filters, request).await?;
        self.inner.record_references(&result.items);
        Ok(result)
    }

    pub async fn resolve_datasource(
        &self,
        data_source: Option<&str>,
        locale: &str,
    ) -> Result<Option<DatasourceItem>, AppError> {
        let Some(data_source) = data_source.filter(|d| !d.is_empty()) else {
            return Ok(None);
        };

        Ok(self
            .content
            .find_page(data_source, locale)
            .await?
            .map(|page| DatasourceItem {
                id: page.uuid,
                title: page.title,
                url: page.route_path,
            }))
    }
}
