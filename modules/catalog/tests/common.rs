//! Shared test harness: a fresh file-backed SQLite database per test plus a
//! temp media area, wired into the domain service the same way a deployment
//! would wire the pooled connection.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Schema, Set};
use tempfile::TempDir;

use catalog::config::CatalogConfig;
use catalog::domain::service::Service;
use catalog::infra::media::FsMediaStore;
use catalog::infra::storage::entity;
use catalog::infra::storage::SeaOrmCatalogRepository;

pub struct TestCatalog {
    pub service: Arc<Service>,
    pub db: DatabaseConnection,
    pub temp_dir: PathBuf,
    pub media_dir: PathBuf,
    _root: TempDir,
}

/// Create a fresh database (file-backed SQLite in a temp dir, so the pool
/// shares one database) and build the schema from the entities.
pub async fn create_test_db(root: &TempDir) -> DatabaseConnection {
    let db_path = root.path().join("catalog.db");
    let db = Database::connect(format!("sqlite://{}?mode=rwc", db_path.display()))
        .await
        .expect("Failed to connect to test database");

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    // Referenced tables first
    let statements = [
        schema.create_table_from_entity(entity::user::Entity),
        schema.create_table_from_entity(entity::director::Entity),
        schema.create_table_from_entity(entity::genre::Entity),
        schema.create_table_from_entity(entity::movie_detail::Entity),
        schema.create_table_from_entity(entity::movie::Entity),
        schema.create_table_from_entity(entity::movie_genre::Entity),
        schema.create_table_from_entity(entity::movie_user_like::Entity),
    ];
    for statement in statements {
        db.execute(backend.build(&statement))
            .await
            .expect("Failed to create table");
    }
    db
}

/// Opt-in log output for test debugging: `RUST_LOG=debug cargo test`.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Bring up the full module: repository, media store and domain service.
pub async fn bring_up_catalog() -> TestCatalog {
    init_tracing();
    let root = TempDir::new().expect("temp dir");
    let db = create_test_db(&root).await;

    let config = CatalogConfig {
        temp_dir: root.path().join("temp"),
        media_dir: root.path().join("movie"),
        ..CatalogConfig::default()
    };

    let repo = Arc::new(SeaOrmCatalogRepository::new(db.clone(), &config));
    let media = Arc::new(FsMediaStore::new(&config.temp_dir, &config.media_dir));
    let service = Arc::new(Service::new(
        repo.clone(),
        repo,
        media,
        config.service_config(),
    ));

    TestCatalog {
        service,
        db,
        temp_dir: config.temp_dir,
        media_dir: config.media_dir,
        _root: root,
    }
}

impl TestCatalog {
    /// Put a fake upload into the temp area, as the upload collaborator
    /// would before a create call.
    pub async fn stage_upload(&self, file_name: &str) {
        tokio::fs::create_dir_all(&self.temp_dir)
            .await
            .expect("create temp dir");
        tokio::fs::write(self.temp_dir.join(file_name), b"fake movie bytes")
            .await
            .expect("stage upload");
    }
}

pub async fn seed_user(db: &DatabaseConnection, email: &str) -> i64 {
    let now = Utc::now();
    entity::user::ActiveModel {
        email: Set(email.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        version: Set(1),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed user")
    .id
}

pub async fn seed_director(db: &DatabaseConnection, name: &str) -> i64 {
    let now = Utc::now();
    entity::director::ActiveModel {
        name: Set(name.to_string()),
        dob: Set(chrono::NaiveDate::from_ymd_opt(1970, 5, 14).unwrap()),
        nationality: Set("US".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        version: Set(1),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed director")
    .id
}

pub async fn seed_genre(db: &DatabaseConnection, name: &str) -> i64 {
    let now = Utc::now();
    entity::genre::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        version: Set(1),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed genre")
    .id
}

/// Insert a movie row (with its detail row) directly, bypassing the service.
/// Pagination tests need full control over the sort-key values.
pub async fn seed_movie(
    db: &DatabaseConnection,
    title: &str,
    director_id: i64,
    like_count: i64,
) -> i64 {
    let now = Utc::now();
    let detail = entity::movie_detail::ActiveModel {
        detail: Set(format!("{title} detail")),
        created_at: Set(now),
        updated_at: Set(now),
        version: Set(1),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed detail");

    entity::movie::ActiveModel {
        title: Set(title.to_string()),
        detail_id: Set(detail.id),
        director_id: Set(director_id),
        creator_id: Set(None),
        like_count: Set(like_count),
        dislike_count: Set(0),
        movie_file_path: Set(format!("public/movie/{title}.mp4")),
        created_at: Set(now),
        updated_at: Set(now),
        version: Set(1),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed movie")
    .id
}

pub async fn count_rows<E>(db: &DatabaseConnection, _entity: E) -> u64
where
    E: sea_orm::EntityTrait,
    E::Model: Send + Sync,
{
    use sea_orm::PaginatorTrait;
    E::find().count(db).await.expect("count rows")
}
