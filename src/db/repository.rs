use async_trait::async_trait;

use crate::db::models::{Category, Contact, Media, PageNode, Tag, User};
use crate::error::AppError;
use crate::models::content::{ContentDocument, FindOptions};

/// Authoritative store of article content.
///
/// Implementations own versioning and the content tree; the index only
/// reads from it and delegates workflow mutations to it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Load the article `uuid` in `locale`.
    async fn find(
        &self,
        uuid: &str,
        locale: &str,
        options: FindOptions,
    ) -> Result<Option<ContentDocument>, AppError>;

    /// Load a page of the page tree, used to scope data sources.
    async fn find_page(&self, uuid: &str, locale: &str) -> Result<Option<PageNode>, AppError>;

    /// Remove the published version of the article in `locale`.
    async fn unpublish(&self, uuid: &str, locale: &str) -> Result<(), AppError>;

    /// Discard the draft and restore the published version in `locale`.
    async fn remove_draft(&self, uuid: &str, locale: &str) -> Result<(), AppError>;

    /// Copy the content of `source_locale` into every destination locale.
    async fn copy_locale(
        &self,
        uuid: &str,
        source_locale: &str,
        destination_locales: &[String],
    ) -> Result<(), AppError>;

    /// Duplicate the article next to the original; returns the new uuid.
    async fn copy(&self, uuid: &str, locale: &str) -> Result<String, AppError>;

    /// Reorder the child pages of an article to the given sequence.
    async fn reorder(&self, page_uuids: &[String], locale: &str) -> Result<(), AppError>;
}

/// Lookup of users and contacts for actor names.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_contact(&self, id: i64) -> Result<Option<Contact>, AppError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Categories with the given ids, in any order; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[i64], locale: &str) -> Result<Vec<Category>, AppError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Tags with the given names, in any order; unknown names are skipped.
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Tag>, AppError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Media with the given ids in `locale`, in any order; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[i64], locale: &str) -> Result<Vec<Media>, AppError>;
}
