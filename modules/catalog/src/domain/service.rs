use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use tracing::{debug, info, instrument, warn};

use crate::contract::error::CatalogError;
use crate::contract::model::{
    CreateMovie, LikeStatus, Movie, MovieListItem, MovieListQuery, MoviePatch,
};
use crate::domain::error::DomainError;
use crate::domain::ports::MediaStore;
use crate::domain::repo::{
    CatalogRepository, CatalogTx, CatalogUnitOfWork, MovieRowPatch, NewMovieRow,
};
use page_core::Page;

/// Domain service with the catalog business rules: the paginated list use
/// cases, the transactional movie-aggregate write pipeline and the like
/// toggle. Depends only on ports, not on infra types.
pub struct Service {
    repo: Arc<dyn CatalogRepository>,
    uow: Arc<dyn CatalogUnitOfWork>,
    media: Arc<dyn MediaStore>,
    config: ServiceConfig,
    recent_cache: ArcSwapOption<(Instant, Vec<MovieListItem>)>,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub recent_take: u64,
    pub recent_ttl: Duration,
    pub temp_max_age: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            recent_take: 10,
            recent_ttl: Duration::from_secs(30),
            temp_max_age: Duration::from_secs(24 * 60 * 60),
        }
    }
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(e.to_string())
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        repo: Arc<dyn CatalogRepository>,
        uow: Arc<dyn CatalogUnitOfWork>,
        media: Arc<dyn MediaStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            uow,
            media,
            config,
            recent_cache: ArcSwapOption::empty(),
        }
    }

    /// List movies with cursor-based pagination. When `viewer` is set, the
    /// items carry that user's like/dislike status, looked up in one batch
    /// after the page is fetched.
    #[instrument(name = "catalog.service.list_movies_page", skip(self, query))]
    pub async fn list_movies_page(
        &self,
        query: MovieListQuery,
        viewer: Option<i64>,
    ) -> Result<Page<MovieListItem>, CatalogError> {
        debug!("Listing movies with cursor pagination");

        let page = self.repo.list_movies_page(&query).await?;

        if let Some(user_id) = viewer {
            if !page.items.is_empty() {
                let movie_ids: Vec<i64> = page.items.iter().map(|m| m.id).collect();
                let statuses = self
                    .repo
                    .like_statuses(&movie_ids, user_id)
                    .await
                    .map_err(db_err)?;
                return Ok(page.map_items(|mut item| {
                    item.like_status = statuses.get(&item.id).copied();
                    item
                }));
            }
        }

        debug!("Successfully listed {} movies in page", page.items.len());
        Ok(page)
    }

    /// The newest movies, newest first, behind a short-lived cache.
    #[instrument(name = "catalog.service.recent_movies", skip(self))]
    pub async fn recent_movies(&self) -> Result<Vec<MovieListItem>, CatalogError> {
        if let Some(cached) = self.recent_cache.load_full() {
            if cached.0.elapsed() < self.config.recent_ttl {
                debug!("Serving recent movies from cache");
                return Ok(cached.1.clone());
            }
        }

        let items = self
            .repo
            .find_recent(self.config.recent_take)
            .await
            .map_err(db_err)?;
        self.recent_cache
            .store(Some(Arc::new((Instant::now(), items.clone()))));
        Ok(items)
    }

    #[instrument(name = "catalog.service.get_movie", skip(self), fields(movie_id = %id))]
    pub async fn get_movie(&self, id: i64) -> Result<Movie, CatalogError> {
        debug!("Getting movie aggregate by id");

        let movie = self
            .repo
            .find_aggregate(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::movie_not_found(id))?;
        Ok(movie)
    }

    /// Create the movie aggregate: validate references, insert the detail
    /// row, insert the movie row, promote the uploaded file, link genres —
    /// all inside one transaction that rolls back on the first failure.
    ///
    /// The file move is not part of the database transaction. Promoting
    /// before commit guarantees no committed row ever points at a missing
    /// file; a promote-then-rollback failure can leave a stray file behind
    /// for the temp sweeper.
    #[instrument(
        name = "catalog.service.create_movie",
        skip(self, dto),
        fields(title = %dto.title, actor_user_id)
    )]
    pub async fn create_movie(
        &self,
        dto: CreateMovie,
        actor_user_id: i64,
    ) -> Result<Movie, CatalogError> {
        info!("Creating movie aggregate");

        self.validate_create(&dto)?;

        if self
            .repo
            .title_exists(&dto.title)
            .await
            .map_err(db_err)?
        {
            return Err(DomainError::title_exists(&dto.title).into());
        }

        let tx = self.uow.begin().await.map_err(db_err)?;

        let created = match self.create_in_tx(tx.as_ref(), &dto, actor_user_id).await {
            Ok(movie) => movie,
            Err(e) => {
                rollback_quietly(tx).await;
                return Err(e.into());
            }
        };

        tx.commit().await.map_err(db_err)?;
        self.recent_cache.store(None);

        info!(movie_id = created.id, "Successfully created movie");
        Ok(created)
    }

    async fn create_in_tx(
        &self,
        tx: &dyn CatalogTx,
        dto: &CreateMovie,
        actor_user_id: i64,
    ) -> Result<Movie, DomainError> {
        let director = tx
            .find_director(dto.director_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::director_not_found(dto.director_id))?;

        let genres = tx.find_genres(&dto.genre_ids).await.map_err(db_err)?;
        if genres.len() != dto.genre_ids.len() {
            let found: Vec<i64> = genres.iter().map(|g| g.id).collect();
            let missing: Vec<i64> = dto
                .genre_ids
                .iter()
                .copied()
                .filter(|id| !found.contains(id))
                .collect();
            return Err(DomainError::genre_not_found(missing, found));
        }

        let detail_id = tx.insert_detail(&dto.detail).await.map_err(db_err)?;

        let movie_file_path = self.media.permanent_path(&dto.movie_file_name);
        let movie_id = tx
            .insert_movie(NewMovieRow {
                title: dto.title.clone(),
                detail_id,
                director_id: director.id,
                creator_id: actor_user_id,
                movie_file_path,
            })
            .await
            .map_err(db_err)?;

        // The file must be reachable at the permanent path before this
        // transaction is allowed to commit.
        self.media
            .promote(&dto.movie_file_name)
            .await
            .map_err(|e| DomainError::media(e.to_string()))?;

        tx.link_genres(movie_id, &dto.genre_ids)
            .await
            .map_err(db_err)?;

        tx.find_aggregate(movie_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::database("created movie aggregate is missing"))
    }

    /// Update the movie aggregate. Reference changes are re-validated before
    /// anything is written; the genre set is adjusted by symmetric
    /// difference so the link set never passes through empty.
    #[instrument(name = "catalog.service.update_movie", skip(self, patch), fields(movie_id = %id))]
    pub async fn update_movie(&self, id: i64, patch: MoviePatch) -> Result<Movie, CatalogError> {
        info!("Updating movie aggregate");

        self.validate_patch(&patch)?;

        let tx = self.uow.begin().await.map_err(db_err)?;

        let updated = match self.update_in_tx(tx.as_ref(), id, &patch).await {
            Ok(movie) => movie,
            Err(e) => {
                rollback_quietly(tx).await;
                return Err(e.into());
            }
        };

        tx.commit().await.map_err(db_err)?;
        self.recent_cache.store(None);

        info!("Successfully updated movie");
        Ok(updated)
    }

    async fn update_in_tx(
        &self,
        tx: &dyn CatalogTx,
        id: i64,
        patch: &MoviePatch,
    ) -> Result<Movie, DomainError> {
        let snapshot = tx
            .load_movie(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::movie_not_found(id))?;

        let staged_director = match patch.director_id {
            Some(director_id) => {
                let director = tx
                    .find_director(director_id)
                    .await
                    .map_err(db_err)?
                    .ok_or_else(|| DomainError::director_not_found(director_id))?;
                Some(director.id)
            }
            None => None,
        };

        let staged_genres = match &patch.genre_ids {
            Some(ids) => {
                let genres = tx.find_genres(ids).await.map_err(db_err)?;
                if genres.len() != ids.len() {
                    let found: Vec<i64> = genres.iter().map(|g| g.id).collect();
                    let missing: Vec<i64> =
                        ids.iter().copied().filter(|id| !found.contains(id)).collect();
                    return Err(DomainError::genre_not_found(missing, found));
                }
                Some(ids.clone())
            }
            None => None,
        };

        if let Some(title) = &patch.title {
            if *title != snapshot.title && tx.title_exists(title).await.map_err(db_err)? {
                return Err(DomainError::title_exists(title));
            }
        }

        if patch.title.is_some() || staged_director.is_some() {
            tx.update_movie(
                id,
                MovieRowPatch {
                    title: patch.title.clone(),
                    director_id: staged_director,
                },
            )
            .await
            .map_err(db_err)?;
        }

        if let Some(detail) = &patch.detail {
            tx.update_detail(snapshot.detail_id, detail)
                .await
                .map_err(db_err)?;
        }

        if let Some(new_ids) = staged_genres {
            let add: Vec<i64> = new_ids
                .iter()
                .copied()
                .filter(|g| !snapshot.genre_ids.contains(g))
                .collect();
            let remove: Vec<i64> = snapshot
                .genre_ids
                .iter()
                .copied()
                .filter(|g| !new_ids.contains(g))
                .collect();
            if !add.is_empty() || !remove.is_empty() {
                tx.sync_genres(id, &add, &remove).await.map_err(db_err)?;
            }
        }

        tx.find_aggregate(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::database("updated movie aggregate is missing"))
    }

    /// Delete the movie and its owned detail row. The detail has no
    /// independent lifecycle, so it goes in the same transaction.
    #[instrument(name = "catalog.service.delete_movie", skip(self), fields(movie_id = %id))]
    pub async fn delete_movie(&self, id: i64) -> Result<i64, CatalogError> {
        info!("Deleting movie aggregate");

        let tx = self.uow.begin().await.map_err(db_err)?;

        let result: Result<(), DomainError> = async {
            let snapshot = tx
                .load_movie(id)
                .await
                .map_err(db_err)?
                .ok_or_else(|| DomainError::movie_not_found(id))?;
            tx.delete_movie(id).await.map_err(db_err)?;
            tx.delete_detail(snapshot.detail_id).await.map_err(db_err)?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            rollback_quietly(tx).await;
            return Err(e.into());
        }

        tx.commit().await.map_err(db_err)?;
        self.recent_cache.store(None);

        info!("Successfully deleted movie");
        Ok(id)
    }

    /// Toggle the like/dislike record of (movie, user): no record inserts
    /// the requested opinion, the same opinion removes it, the opposite
    /// opinion flips it. The read-then-write sequence runs inside one
    /// transaction so two concurrent toggles from the same user serialize.
    #[instrument(
        name = "catalog.service.toggle_like",
        skip(self),
        fields(movie_id, user_id, is_like)
    )]
    pub async fn toggle_like(
        &self,
        movie_id: i64,
        user_id: i64,
        is_like: bool,
    ) -> Result<LikeStatus, CatalogError> {
        debug!("Toggling like record");

        let tx = self.uow.begin().await.map_err(db_err)?;

        let status = match toggle_in_tx(tx.as_ref(), movie_id, user_id, is_like).await {
            Ok(status) => status,
            Err(e) => {
                rollback_quietly(tx).await;
                return Err(e.into());
            }
        };

        tx.commit().await.map_err(db_err)?;
        Ok(status)
    }

    /// Recompute per-movie like/dislike counters from the stored records.
    /// Invoked by the external scheduler at the cadence configured in
    /// `CatalogConfig::like_recount_interval`.
    #[instrument(name = "catalog.service.recount_likes", skip(self))]
    pub async fn recount_likes(&self) -> Result<(), CatalogError> {
        self.repo.recount_likes().await.map_err(db_err)?;
        info!("Recomputed like/dislike counters");
        Ok(())
    }

    /// Remove stale files from the media temp area. Invoked by the external
    /// scheduler; picks up leftovers of uploads that never became movies and
    /// of creates that rolled back after promotion.
    #[instrument(name = "catalog.service.sweep_temp_files", skip(self))]
    pub async fn sweep_temp_files(&self) -> Result<usize, CatalogError> {
        let removed = self
            .media
            .sweep_temp(self.config.temp_max_age)
            .await
            .map_err(|e| DomainError::media(e.to_string()))?;
        if removed > 0 {
            info!(removed, "Swept stale temp files");
        }
        Ok(removed)
    }

    // --- validation helpers ---

    fn validate_create(&self, dto: &CreateMovie) -> Result<(), DomainError> {
        if dto.title.trim().is_empty() {
            return Err(DomainError::validation("title cannot be empty"));
        }
        if dto.detail.trim().is_empty() {
            return Err(DomainError::validation("detail cannot be empty"));
        }
        validate_genre_ids(&dto.genre_ids)?;
        validate_file_name(&dto.movie_file_name)?;
        Ok(())
    }

    fn validate_patch(&self, patch: &MoviePatch) -> Result<(), DomainError> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(DomainError::validation("title cannot be empty"));
            }
        }
        if let Some(detail) = &patch.detail {
            if detail.trim().is_empty() {
                return Err(DomainError::validation("detail cannot be empty"));
            }
        }
        if let Some(ids) = &patch.genre_ids {
            validate_genre_ids(ids)?;
        }
        Ok(())
    }
}

async fn toggle_in_tx(
    tx: &dyn CatalogTx,
    movie_id: i64,
    user_id: i64,
    is_like: bool,
) -> Result<LikeStatus, DomainError> {
    if !tx.movie_exists(movie_id).await.map_err(db_err)? {
        return Err(DomainError::movie_not_found(movie_id));
    }
    if !tx.user_exists(user_id).await.map_err(db_err)? {
        return Err(DomainError::user_not_found(user_id));
    }

    match tx.find_like(movie_id, user_id).await.map_err(db_err)? {
        None => tx
            .insert_like(movie_id, user_id, is_like)
            .await
            .map_err(db_err)?,
        Some(existing) if existing == is_like => {
            tx.delete_like(movie_id, user_id).await.map_err(db_err)?
        }
        Some(_) => tx
            .update_like(movie_id, user_id, is_like)
            .await
            .map_err(db_err)?,
    }

    // Report the state that was actually persisted, not the requested one.
    let is_like = tx.find_like(movie_id, user_id).await.map_err(db_err)?;
    Ok(LikeStatus { is_like })
}

async fn rollback_quietly(tx: Box<dyn CatalogTx>) {
    if let Err(e) = tx.rollback().await {
        warn!("Transaction rollback failed: {e:#}");
    }
}

fn validate_genre_ids(ids: &[i64]) -> Result<(), DomainError> {
    if ids.is_empty() {
        return Err(DomainError::validation("genre_ids cannot be empty"));
    }
    let mut seen = ids.to_vec();
    seen.sort_unstable();
    seen.dedup();
    if seen.len() != ids.len() {
        return Err(DomainError::validation("genre_ids cannot contain duplicates"));
    }
    Ok(())
}

fn validate_file_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("movie_file_name cannot be empty"));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(DomainError::validation(
            "movie_file_name must be a bare file name",
        ));
    }
    Ok(())
}
