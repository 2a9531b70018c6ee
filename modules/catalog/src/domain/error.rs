use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
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

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Media storage error: {message}")]
    Media { message: String },
}

impl DomainError {
    pub fn movie_not_found(id: i64) -> Self {
        Self::MovieNotFound { id }
    }

    pub fn director_not_found(id: i64) -> Self {
        Self::DirectorNotFound { id }
    }

    /// `missing` are the requested ids without a genre row; `found` the ones
    /// that do exist. Both go into the message so the caller can fix the
    /// request without another round trip.
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

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn media(message: impl Into<String>) -> Self {
        Self::Media {
            message: message.into(),
        }
    }
}
