//! SeaORM-backed adapters for the catalog ports.
//!
//! [`SeaOrmCatalogRepository`] serves the read side straight off the pooled
//! connection; it also implements the unit-of-work port, handing out one
//! [`SeaOrmCatalogTx`] per aggregate write. The aggregate loaders are generic
//! over `ConnectionTrait` so the same code runs on the pool and inside a
//! transaction (read-your-writes).

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use cinevault_db::{paginate, FieldKind, FieldMap, LimitCfg};
use page_core::{CursorV1, Page, PageError, PageQuery, SortDir};

use crate::config::CatalogConfig;
use crate::contract::model::{Director, Genre, Movie, MovieListItem, MovieListQuery};
use crate::domain::repo::{
    CatalogRepository, CatalogTx, CatalogUnitOfWork, MovieRowPatch, MovieSnapshot, NewMovieRow,
};
use crate::infra::storage::entity;
use crate::infra::storage::filter_hash::short_filter_hash;
use crate::infra::storage::mapper;

/// SeaORM repository adapter over the shared connection pool.
pub struct SeaOrmCatalogRepository {
    db: DatabaseConnection,
    limits: LimitCfg,
}

impl SeaOrmCatalogRepository {
    pub fn new(db: DatabaseConnection, config: &CatalogConfig) -> Self {
        Self {
            db,
            limits: LimitCfg {
                default: config.default_page_size,
                max: config.max_page_size,
            },
        }
    }
}

/// Sortable-attribute whitelist of the movie listing, with the cursor key
/// extractors for each field.
fn movie_field_map() -> FieldMap<entity::movie::Entity> {
    use entity::movie::Column;

    FieldMap::new()
        .insert_with_extractor("id", Column::Id, FieldKind::I64, |m: &entity::movie::Model| m.id.to_string())
        .insert_with_extractor("title", Column::Title, FieldKind::String, |m: &entity::movie::Model| {
            m.title.clone()
        })
        .insert_with_extractor("like_count", Column::LikeCount, FieldKind::I64, |m: &entity::movie::Model| {
            m.like_count.to_string()
        })
        .insert_with_extractor("dislike_count", Column::DislikeCount, FieldKind::I64, |m: &entity::movie::Model| {
            m.dislike_count.to_string()
        })
        .insert_with_extractor("created_at", Column::CreatedAt, FieldKind::DateTimeUtc, |m: &entity::movie::Model| {
            m.created_at.to_rfc3339()
        })
        .insert_with_extractor("updated_at", Column::UpdatedAt, FieldKind::DateTimeUtc, |m: &entity::movie::Model| {
            m.updated_at.to_rfc3339()
        })
}

#[async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn list_movies_page(
        &self,
        query: &MovieListQuery,
    ) -> Result<Page<MovieListItem>, PageError> {
        let mut select = entity::movie::Entity::find();
        if let Some(title) = query.title.as_deref() {
            select = select.filter(entity::movie::Column::Title.contains(title));
        }

        let mut page_query = PageQuery::new().with_order(query.order.clone());
        if let Some(token) = query.cursor.as_deref() {
            page_query = page_query.with_cursor(CursorV1::decode(token)?);
        }
        if let Some(take) = query.take {
            page_query = page_query.with_limit(take);
        }
        if let Some(hash) = short_filter_hash(query.title.as_deref()) {
            page_query = page_query.with_filter_hash(hash);
        }

        paginate(
            select,
            &self.db,
            &page_query,
            &movie_field_map(),
            ("id", SortDir::Desc),
            self.limits,
            mapper::movie_to_list_item,
        )
        .await
    }

    async fn find_aggregate(&self, id: i64) -> anyhow::Result<Option<Movie>> {
        load_aggregate(&self.db, id).await
    }

    async fn find_recent(&self, take: u64) -> anyhow::Result<Vec<MovieListItem>> {
        let rows = entity::movie::Entity::find()
            .order_by_desc(entity::movie::Column::CreatedAt)
            .order_by_desc(entity::movie::Column::Id)
            .limit(take)
            .all(&self.db)
            .await
            .context("find_recent failed")?;
        Ok(rows.into_iter().map(mapper::movie_to_list_item).collect())
    }

    async fn like_statuses(
        &self,
        movie_ids: &[i64],
        user_id: i64,
    ) -> anyhow::Result<HashMap<i64, bool>> {
        if movie_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = entity::movie_user_like::Entity::find()
            .filter(entity::movie_user_like::Column::MovieId.is_in(movie_ids.iter().copied()))
            .filter(entity::movie_user_like::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .context("like_statuses failed")?;
        Ok(rows.into_iter().map(|r| (r.movie_id, r.is_like)).collect())
    }

    async fn user_exists(&self, id: i64) -> anyhow::Result<bool> {
        user_exists(&self.db, id).await
    }

    async fn title_exists(&self, title: &str) -> anyhow::Result<bool> {
        title_exists(&self.db, title).await
    }

    async fn recount_likes(&self) -> anyhow::Result<()> {
        self.db
            .execute_unprepared(
                "UPDATE movie SET like_count = \
                 (SELECT COUNT(*) FROM movie_user_like mul \
                  WHERE mul.movie_id = movie.id AND mul.is_like = TRUE)",
            )
            .await
            .context("recount like_count failed")?;
        self.db
            .execute_unprepared(
                "UPDATE movie SET dislike_count = \
                 (SELECT COUNT(*) FROM movie_user_like mul \
                  WHERE mul.movie_id = movie.id AND mul.is_like = FALSE)",
            )
            .await
            .context("recount dislike_count failed")?;
        Ok(())
    }
}

#[async_trait]
impl CatalogUnitOfWork for SeaOrmCatalogRepository {
    async fn begin(&self) -> anyhow::Result<Box<dyn CatalogTx>> {
        let txn = self
            .db
            .begin()
            .await
            .context("begin transaction failed")?;
        Ok(Box::new(SeaOrmCatalogTx { txn }))
    }
}

/// One open SeaORM transaction over the catalog tables. Dropping the value
/// without committing rolls the transaction back.
pub struct SeaOrmCatalogTx {
    txn: DatabaseTransaction,
}

#[async_trait]
impl CatalogTx for SeaOrmCatalogTx {
    async fn find_director(&self, id: i64) -> anyhow::Result<Option<Director>> {
        let found = entity::director::Entity::find_by_id(id)
            .one(&self.txn)
            .await
            .context("find_director failed")?;
        Ok(found.map(mapper::director_to_contract))
    }

    async fn find_genres(&self, ids: &[i64]) -> anyhow::Result<Vec<Genre>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = entity::genre::Entity::find()
            .filter(entity::genre::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(entity::genre::Column::Id)
            .all(&self.txn)
            .await
            .context("find_genres failed")?;
        Ok(rows.into_iter().map(mapper::genre_to_contract).collect())
    }

    async fn insert_detail(&self, detail: &str) -> anyhow::Result<i64> {
        let now = Utc::now();
        let inserted = entity::movie_detail::ActiveModel {
            detail: Set(detail.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            version: Set(1),
            ..Default::default()
        }
        .insert(&self.txn)
        .await
        .context("insert_detail failed")?;
        Ok(inserted.id)
    }

    async fn insert_movie(&self, row: NewMovieRow) -> anyhow::Result<i64> {
        let now = Utc::now();
        let inserted = entity::movie::ActiveModel {
            title: Set(row.title),
            detail_id: Set(row.detail_id),
            director_id: Set(row.director_id),
            creator_id: Set(Some(row.creator_id)),
            like_count: Set(0),
            dislike_count: Set(0),
            movie_file_path: Set(row.movie_file_path),
            created_at: Set(now),
            updated_at: Set(now),
            version: Set(1),
            ..Default::default()
        }
        .insert(&self.txn)
        .await
        .context("insert_movie failed")?;
        Ok(inserted.id)
    }

    async fn link_genres(&self, movie_id: i64, genre_ids: &[i64]) -> anyhow::Result<()> {
        if genre_ids.is_empty() {
            return Ok(());
        }
        let links = genre_ids
            .iter()
            .map(|genre_id| entity::movie_genre::ActiveModel {
                movie_id: Set(movie_id),
                genre_id: Set(*genre_id),
            });
        entity::movie_genre::Entity::insert_many(links)
            .exec(&self.txn)
            .await
            .context("link_genres failed")?;
        Ok(())
    }

    async fn load_movie(&self, id: i64) -> anyhow::Result<Option<MovieSnapshot>> {
        let Some(movie) = entity::movie::Entity::find_by_id(id)
            .one(&self.txn)
            .await
            .context("load_movie failed")?
        else {
            return Ok(None);
        };
        let genre_ids = entity::movie_genre::Entity::find()
            .filter(entity::movie_genre::Column::MovieId.eq(id))
            .all(&self.txn)
            .await
            .context("load_movie genre links failed")?
            .into_iter()
            .map(|link| link.genre_id)
            .collect();
        Ok(Some(MovieSnapshot {
            id: movie.id,
            title: movie.title,
            detail_id: movie.detail_id,
            director_id: movie.director_id,
            genre_ids,
        }))
    }

    async fn update_movie(&self, id: i64, patch: MovieRowPatch) -> anyhow::Result<()> {
        use entity::movie::Column;

        let mut update = entity::movie::Entity::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .col_expr(Column::Version, Expr::col(Column::Version).add(1));
        if let Some(title) = patch.title {
            update = update.col_expr(Column::Title, Expr::value(title));
        }
        if let Some(director_id) = patch.director_id {
            update = update.col_expr(Column::DirectorId, Expr::value(director_id));
        }
        update
            .filter(Column::Id.eq(id))
            .exec(&self.txn)
            .await
            .context("update_movie failed")?;
        Ok(())
    }

    async fn update_detail(&self, detail_id: i64, detail: &str) -> anyhow::Result<()> {
        use entity::movie_detail::Column;

        entity::movie_detail::Entity::update_many()
            .col_expr(Column::Detail, Expr::value(detail))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .col_expr(Column::Version, Expr::col(Column::Version).add(1))
            .filter(Column::Id.eq(detail_id))
            .exec(&self.txn)
            .await
            .context("update_detail failed")?;
        Ok(())
    }

    async fn sync_genres(
        &self,
        movie_id: i64,
        add: &[i64],
        remove: &[i64],
    ) -> anyhow::Result<()> {
        if !add.is_empty() {
            let links = add.iter().map(|genre_id| entity::movie_genre::ActiveModel {
                movie_id: Set(movie_id),
                genre_id: Set(*genre_id),
            });
            entity::movie_genre::Entity::insert_many(links)
                .exec(&self.txn)
                .await
                .context("sync_genres add failed")?;
        }
        if !remove.is_empty() {
            entity::movie_genre::Entity::delete_many()
                .filter(entity::movie_genre::Column::MovieId.eq(movie_id))
                .filter(entity::movie_genre::Column::GenreId.is_in(remove.iter().copied()))
                .exec(&self.txn)
                .await
                .context("sync_genres remove failed")?;
        }
        Ok(())
    }

    async fn delete_movie(&self, id: i64) -> anyhow::Result<()> {
        entity::movie::Entity::delete_by_id(id)
            .exec(&self.txn)
            .await
            .context("delete_movie failed")?;
        Ok(())
    }

    async fn delete_detail(&self, detail_id: i64) -> anyhow::Result<()> {
        entity::movie_detail::Entity::delete_by_id(detail_id)
            .exec(&self.txn)
            .await
            .context("delete_detail failed")?;
        Ok(())
    }

    async fn find_aggregate(&self, id: i64) -> anyhow::Result<Option<Movie>> {
        load_aggregate(&self.txn, id).await
    }

    async fn movie_exists(&self, id: i64) -> anyhow::Result<bool> {
        let count = entity::movie::Entity::find_by_id(id)
            .count(&self.txn)
            .await
            .context("movie_exists failed")?;
        Ok(count > 0)
    }

    async fn user_exists(&self, id: i64) -> anyhow::Result<bool> {
        user_exists(&self.txn, id).await
    }

    async fn title_exists(&self, title: &str) -> anyhow::Result<bool> {
        title_exists(&self.txn, title).await
    }

    async fn find_like(&self, movie_id: i64, user_id: i64) -> anyhow::Result<Option<bool>> {
        let record = entity::movie_user_like::Entity::find_by_id((movie_id, user_id))
            .one(&self.txn)
            .await
            .context("find_like failed")?;
        Ok(record.map(|r| r.is_like))
    }

    async fn insert_like(
        &self,
        movie_id: i64,
        user_id: i64,
        is_like: bool,
    ) -> anyhow::Result<()> {
        entity::movie_user_like::ActiveModel {
            movie_id: Set(movie_id),
            user_id: Set(user_id),
            is_like: Set(is_like),
        }
        .insert(&self.txn)
        .await
        .context("insert_like failed")?;
        Ok(())
    }

    async fn update_like(
        &self,
        movie_id: i64,
        user_id: i64,
        is_like: bool,
    ) -> anyhow::Result<()> {
        use entity::movie_user_like::Column;

        entity::movie_user_like::Entity::update_many()
            .col_expr(Column::IsLike, Expr::value(is_like))
            .filter(Column::MovieId.eq(movie_id))
            .filter(Column::UserId.eq(user_id))
            .exec(&self.txn)
            .await
            .context("update_like failed")?;
        Ok(())
    }

    async fn delete_like(&self, movie_id: i64, user_id: i64) -> anyhow::Result<()> {
        entity::movie_user_like::Entity::delete_by_id((movie_id, user_id))
            .exec(&self.txn)
            .await
            .context("delete_like failed")?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.txn.commit().await.context("commit failed")
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        self.txn.rollback().await.context("rollback failed")
    }
}

/// Load the full aggregate (movie + detail + director + genres) through any
/// connection, pooled or transactional.
async fn load_aggregate<C: ConnectionTrait>(conn: &C, id: i64) -> anyhow::Result<Option<Movie>> {
    let Some(movie) = entity::movie::Entity::find_by_id(id)
        .one(conn)
        .await
        .context("find movie failed")?
    else {
        return Ok(None);
    };

    let detail = entity::movie_detail::Entity::find_by_id(movie.detail_id)
        .one(conn)
        .await
        .context("find movie detail failed")?
        .with_context(|| format!("movie {} has no detail row", movie.id))?;

    let director = entity::director::Entity::find_by_id(movie.director_id)
        .one(conn)
        .await
        .context("find director failed")?
        .with_context(|| format!("movie {} references missing director", movie.id))?;

    let genres = movie
        .find_related(entity::genre::Entity)
        .order_by_asc(entity::genre::Column::Id)
        .all(conn)
        .await
        .context("find genres failed")?;

    Ok(Some(mapper::assemble_aggregate(
        movie, detail, director, genres,
    )))
}

async fn user_exists<C: ConnectionTrait>(conn: &C, id: i64) -> anyhow::Result<bool> {
    let count = entity::user::Entity::find_by_id(id)
        .count(conn)
        .await
        .context("user_exists failed")?;
    Ok(count > 0)
}

async fn title_exists<C: ConnectionTrait>(conn: &C, title: &str) -> anyhow::Result<bool> {
    let count = entity::movie::Entity::find()
        .filter(entity::movie::Column::Title.eq(title))
        .count(conn)
        .await
        .context("title_exists failed")?;
    Ok(count > 0)
}
