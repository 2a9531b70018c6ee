use std::collections::HashMap;

use async_trait::async_trait;
use page_core::{Page, PageError};

use crate::contract::model::{Director, Genre, Movie, MovieListItem, MovieListQuery};

/// Row data for inserting a movie, after its detail row already exists.
#[derive(Debug, Clone)]
pub struct NewMovieRow {
    pub title: String,
    pub detail_id: i64,
    pub director_id: i64,
    pub creator_id: i64,
    pub movie_file_path: String,
}

/// Scalar movie-row changes applied in one UPDATE statement.
#[derive(Debug, Clone, Default)]
pub struct MovieRowPatch {
    pub title: Option<String>,
    pub director_id: Option<i64>,
}

/// Current shape of a movie row plus its relation keys, as loaded at the
/// start of an update or delete.
#[derive(Debug, Clone)]
pub struct MovieSnapshot {
    pub id: i64,
    pub title: String,
    pub detail_id: i64,
    pub director_id: i64,
    pub genre_ids: Vec<i64>,
}

/// Port for the domain layer: read-side persistence operations that need no
/// transaction. Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// One page of movies via keyset pagination. Decodes the cursor token,
    /// composes the keyset query and derives the next cursor.
    async fn list_movies_page(
        &self,
        query: &MovieListQuery,
    ) -> Result<Page<MovieListItem>, PageError>;

    /// Load the full aggregate (movie + detail + director + genres).
    async fn find_aggregate(&self, id: i64) -> anyhow::Result<Option<Movie>>;

    /// Newest movies first, at most `take` of them.
    async fn find_recent(&self, take: u64) -> anyhow::Result<Vec<MovieListItem>>;

    /// The like/dislike opinions one user holds over a set of movies.
    async fn like_statuses(
        &self,
        movie_ids: &[i64],
        user_id: i64,
    ) -> anyhow::Result<HashMap<i64, bool>>;

    async fn user_exists(&self, id: i64) -> anyhow::Result<bool>;

    /// Check title uniqueness before inserting.
    async fn title_exists(&self, title: &str) -> anyhow::Result<bool>;

    /// Recompute like_count/dislike_count on every movie from the stored
    /// like records. Called by the external scheduler; per-toggle counts are
    /// eventually consistent by design.
    async fn recount_likes(&self) -> anyhow::Result<()>;
}

/// Port producing one transaction per aggregate write.
#[async_trait]
pub trait CatalogUnitOfWork: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn CatalogTx>>;
}

/// One open database transaction over the catalog tables.
///
/// Every method sees the transaction's own writes. Dropping the value
/// without calling `commit` must leave no trace (implementations roll back
/// on drop); the service still calls `rollback` explicitly on failure paths.
#[async_trait]
pub trait CatalogTx: Send {
    async fn find_director(&self, id: i64) -> anyhow::Result<Option<Director>>;

    /// The subset of `ids` that exist, as full rows. The caller compares
    /// lengths to detect unknown ids before mutating anything.
    async fn find_genres(&self, ids: &[i64]) -> anyhow::Result<Vec<Genre>>;

    /// Insert the owned detail row, returning its generated id.
    async fn insert_detail(&self, detail: &str) -> anyhow::Result<i64>;

    /// Insert the movie row, returning its generated id.
    async fn insert_movie(&self, row: NewMovieRow) -> anyhow::Result<i64>;

    /// Create the movie↔genre links for a freshly inserted movie.
    async fn link_genres(&self, movie_id: i64, genre_ids: &[i64]) -> anyhow::Result<()>;

    async fn load_movie(&self, id: i64) -> anyhow::Result<Option<MovieSnapshot>>;

    /// Apply scalar changes (and a staged director) in one statement.
    async fn update_movie(&self, id: i64, patch: MovieRowPatch) -> anyhow::Result<()>;

    async fn update_detail(&self, detail_id: i64, detail: &str) -> anyhow::Result<()>;

    /// Adjust the genre link set by adding and removing in one operation,
    /// never by clearing and re-inserting.
    async fn sync_genres(&self, movie_id: i64, add: &[i64], remove: &[i64])
        -> anyhow::Result<()>;

    async fn delete_movie(&self, id: i64) -> anyhow::Result<()>;

    async fn delete_detail(&self, detail_id: i64) -> anyhow::Result<()>;

    /// Load the full aggregate through this transaction (read-your-writes).
    async fn find_aggregate(&self, id: i64) -> anyhow::Result<Option<Movie>>;

    async fn movie_exists(&self, id: i64) -> anyhow::Result<bool>;

    async fn user_exists(&self, id: i64) -> anyhow::Result<bool>;

    /// Check title uniqueness with this transaction's view of the table.
    async fn title_exists(&self, title: &str) -> anyhow::Result<bool>;

    /// Current like opinion of (movie, user), if any.
    async fn find_like(&self, movie_id: i64, user_id: i64) -> anyhow::Result<Option<bool>>;

    async fn insert_like(&self, movie_id: i64, user_id: i64, is_like: bool)
        -> anyhow::Result<()>;

    async fn update_like(&self, movie_id: i64, user_id: i64, is_like: bool)
        -> anyhow::Result<()>;

    async fn delete_like(&self, movie_id: i64, user_id: i64) -> anyhow::Result<()>;

    async fn commit(self: Box<Self>) -> anyhow::Result<()>;

    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;
}
