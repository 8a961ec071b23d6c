use serde_json::Value;

static NULL: Value = Value::Null;

/// Sort direction of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// How the terms of one filter dimension combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    #[default]
    Or,
    And,
}

impl Operator {
    /// `"or"` in any casing is OR; every other value is AND.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("or") {
            Operator::Or
        } else {
            Operator::And
        }
    }
}

/// Typed filter set of the data providers.
///
/// Built once from the untrusted filter bag; keys of the wrong shape are
/// dropped instead of failing the request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArticleFilters {
    pub tags: Vec<i64>,
    pub tag_operator: Operator,
    pub website_tags: Vec<i64>,
    pub website_tags_operator: Operator,
    pub categories: Vec<i64>,
    pub category_operator: Operator,
    pub website_categories: Vec<i64>,
    pub website_categories_operator: Operator,
    pub types: Vec<String>,
    pub excluded: Vec<String>,
    pub data_source: Option<String>,
    pub sort_by: Vec<String>,
    pub sort_method: SortOrder,
}

impl ArticleFilters {
    pub fn from_value(value: &Value) -> Self {
        let Some(bag) = value.as_object() else {
            return Self::default();
        };
        let get = |key: &str| bag.get(key).unwrap_or(&NULL);

        Self {
            tags: id_list(get("tags")),
            tag_operator: operator(get("tagOperator")),
            website_tags: id_list(get("websiteTags")),
            website_tags_operator: operator(get("websiteTagsOperator")),
            categories: id_list(get("categories")),
            category_operator: operator(get("categoryOperator")),
            website_categories: id_list(get("websiteCategories")),
            website_categories_operator: operator(get("websiteCategoriesOperator")),
            types: string_list(get("types")),
            excluded: string_list(get("excluded")),
            data_source: non_empty_string(get("dataSource")),
            sort_by: string_list(get("sortBy")),
            sort_method: get("sortMethod")
                .as_str()
                .map(SortOrder::parse)
                .unwrap_or_default(),
        }
    }

    pub fn has_taxonomy(&self) -> bool {
        !(self.tags.is_empty()
            && self.website_tags.is_empty()
            && self.categories.is_empty()
            && self.website_categories.is_empty())
    }
}

fn operator(value: &Value) -> Operator {
    value.as_str().map(Operator::parse).unwrap_or_default()
}

fn non_empty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts an array of numbers or numeric strings; anything else is skipped.
fn id_list(value: &Value) -> Vec<i64> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect()
}

/// Accepts an array of strings or a comma separated string.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(non_empty_string).collect(),
        Value::String(s) => split_list(s),
        _ => Vec::new(),
    }
}

/// Splits a comma separated list, dropping blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
