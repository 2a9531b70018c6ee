use page_core::PageError;
use thiserror::Error;

/// Errors that are safe to expose to callers of the catalog module.
///
/// The not-found family and `Validation` map to client errors and are never
/// worth retrying; `Storage` is raised only after the surrounding transaction
/// has been rolled back, so the whole operation may be retried safely.
#[derive(Error, Debug, Clone)]
pub enum CatalogError {
    #[error("Movie not found: {id}")]
    MovieNotFound { id: i64 },

    #[error("Director not found: {id}")]
    DirectorNotFound { id: i64 },

    #[error("Unknown genre ids: {missing:?} (existing ids -> {found:?})")]
    GenreNotFound { missing: Vec<i64>, found: Vec<i64> },

    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error("Movie with title '{title}' already exists")]
    TitleExists { title: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl CatalogError {
    pub fn movie_not_found(id: i64) -> Self {
        Self::MovieNotFound { id }
    }

    pub fn director_not_found(id: i64) -> Self {
        Self::DirectorNotFound { id }
    }

    pub fn genre_not_found(missing: Vec<i64>, found: Vec<i64>) -> Self {
        Self::GenreNotFound { missing, found }
    }

    pub fn user_not_found(id: i64) -> Self {
        Self::UserNotFound { id }
    }

    pub fn title_exists(title: impl Into<String>) -> Self {
        Self::TitleExists {
            title: title.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl From<crate::domain::error::DomainError> for CatalogError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            MovieNotFound { id } => Self::movie_not_found(id),
            DirectorNotFound { id } => Self::director_not_found(id),
            GenreNotFound { missing, found } => Self::genre_not_found(missing, found),
            UserNotFound { id } => Self::user_not_found(id),
            TitleExists { title } => Self::title_exists(title),
            Validation { message } => Self::validation(message),
            Database { message } => Self::storage(message),
            Media { message } => Self::storage(message),
        }
    }
}

impl From<PageError> for CatalogError {
    fn from(page_error: PageError) -> Self {
        match page_error {
            PageError::Db(message) => Self::storage(message),
            other => Self::validation(other.to_string()),
        }
    }
}
