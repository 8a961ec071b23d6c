use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::view::{CategoryView, MediaView, TagView};

/// A backend user; changer and creator of content are users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    /// Contact record behind the user account.
    pub contact_id: Option<i64>,
}

/// A contact; authors are contacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub key: Option<String>,
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Media asset as returned for one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: i64,
    pub title: Option<String>,
    pub copyright: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
}

/// Node of the page tree, used as a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNode {
    pub uuid: String,
    pub title: Option<String>,
    pub route_path: Option<String>,
}

impl From<Category> for CategoryView {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            key: category.key,
            name: category.name,
            keywords: category.keywords,
        }
    }
}

impl From<Tag> for TagView {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

impl From<Media> for MediaView {
    fn from(media: Media) -> Self {
        Self {
            id: media.id,
            title: media.title,
            copyright: media.copyright,
            url: media.url,
            formats: media.formats,
        }
    }
}
