use chrono::{DateTime, NaiveDate, Utc};
use page_core::SortSpec;

/// Shared audit columns carried by every catalog record. The version counter
/// is bumped on every row update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Director {
    pub id: i64,
    pub name: String,
    pub dob: NaiveDate,
    pub nationality: String,
    pub stamps: Stamps,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub stamps: Stamps,
}

/// Full movie aggregate: the movie row joined with its owned detail, its
/// director and its genre set. A movie never exists without its detail row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub detail: String,
    pub director: Director,
    pub genres: Vec<Genre>,
    pub creator_id: Option<i64>,
    pub like_count: i64,
    pub dislike_count: i64,
    pub movie_file_path: String,
    pub stamps: Stamps,
}

/// Compact row for paginated listings. `like_status` is only populated when
/// the listing is made on behalf of a known user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieListItem {
    pub id: i64,
    pub title: String,
    pub director_id: i64,
    pub like_count: i64,
    pub dislike_count: i64,
    pub movie_file_path: String,
    pub like_status: Option<bool>,
    pub stamps: Stamps,
}

/// Data for creating a new movie aggregate. `movie_file_name` names a file
/// previously uploaded into the temp area; creating the movie moves it to
/// permanent storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMovie {
    pub title: String,
    pub detail: String,
    pub director_id: i64,
    pub genre_ids: Vec<i64>,
    pub movie_file_name: String,
}

/// Partial update of a movie aggregate. `genre_ids`, when supplied, replaces
/// the whole genre set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub detail: Option<String>,
    pub director_id: Option<i64>,
    pub genre_ids: Option<Vec<i64>>,
}

/// One page worth of list-query input. `cursor` is the opaque token from a
/// previous page; when present, the order embedded in it supersedes `order`.
#[derive(Debug, Clone, Default)]
pub struct MovieListQuery {
    pub cursor: Option<String>,
    pub order: SortSpec,
    pub take: Option<u64>,
    pub title: Option<String>,
}

/// Post-transition like state of one (movie, user) pair. `None` means the
/// user currently has no opinion recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeStatus {
    pub is_like: Option<bool>,
}
