//! Transactional behavior of the movie-aggregate write pipeline: reference
//! validation before any mutation, full rollback on every failure path
//! (including a failed media promotion), symmetric-difference genre sync and
//! the owned lifecycle of the detail row.

mod common;

use catalog::contract::error::CatalogError;
use catalog::contract::model::{CreateMovie, MoviePatch};
use catalog::infra::storage::entity;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use common::{bring_up_catalog, count_rows, seed_director, seed_genre, seed_user};

fn create_dto(director_id: i64, genre_ids: Vec<i64>, title: &str) -> CreateMovie {
    CreateMovie {
        title: title.to_string(),
        detail: format!("{title} - plot and production notes"),
        director_id,
        genre_ids,
        movie_file_name: format!("{title}.mp4"),
    }
}

async fn linked_genre_ids(catalog: &common::TestCatalog, movie_id: i64) -> Vec<i64> {
    let mut ids: Vec<i64> = entity::movie_genre::Entity::find()
        .filter(entity::movie_genre::Column::MovieId.eq(movie_id))
        .all(&catalog.db)
        .await
        .expect("links")
        .into_iter()
        .map(|l| l.genre_id)
        .collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn create_returns_full_aggregate_and_promotes_file() {
    let catalog = bring_up_catalog().await;
    let director = seed_director(&catalog.db, "Ridley Scott").await;
    let scifi = seed_genre(&catalog.db, "sci-fi").await;
    let horror = seed_genre(&catalog.db, "horror").await;
    let user = seed_user(&catalog.db, "creator@example.com").await;

    catalog.stage_upload("Alien.mp4").await;

    let movie = catalog
        .service
        .create_movie(create_dto(director, vec![scifi, horror], "Alien"), user)
        .await
        .expect("create");

    assert_eq!(movie.title, "Alien");
    assert_eq!(movie.detail, "Alien - plot and production notes");
    assert_eq!(movie.director.id, director);
    assert_eq!(movie.director.name, "Ridley Scott");
    let mut genre_ids: Vec<i64> = movie.genres.iter().map(|g| g.id).collect();
    genre_ids.sort_unstable();
    assert_eq!(genre_ids, vec![scifi, horror]);
    assert_eq!(movie.creator_id, Some(user));
    assert_eq!(movie.like_count, 0);
    assert!(movie.movie_file_path.ends_with("Alien.mp4"));

    // The upload left the temp area and is durable at the permanent path.
    assert!(!catalog.temp_dir.join("Alien.mp4").exists());
    assert!(catalog.media_dir.join("Alien.mp4").exists());
}

#[tokio::test]
async fn create_with_missing_director_leaves_no_rows() {
    let catalog = bring_up_catalog().await;
    let genre = seed_genre(&catalog.db, "drama").await;
    let user = seed_user(&catalog.db, "u@example.com").await;
    catalog.stage_upload("Ghost.mp4").await;

    let result = catalog
        .service
        .create_movie(create_dto(999, vec![genre], "Ghost"), user)
        .await;

    assert!(matches!(
        result,
        Err(CatalogError::DirectorNotFound { id: 999 })
    ));
    assert_eq!(count_rows(&catalog.db, entity::movie::Entity).await, 0);
    assert_eq!(count_rows(&catalog.db, entity::movie_detail::Entity).await, 0);
}

#[tokio::test]
async fn create_with_one_missing_genre_fails_before_any_write() {
    let catalog = bring_up_catalog().await;
    let director = seed_director(&catalog.db, "Jane Campion").await;
    let real_genre = seed_genre(&catalog.db, "drama").await;
    let user = seed_user(&catalog.db, "u@example.com").await;
    catalog.stage_upload("Piano.mp4").await;

    let result = catalog
        .service
        .create_movie(create_dto(director, vec![real_genre, 777], "Piano"), user)
        .await;

    match result {
        Err(CatalogError::GenreNotFound { missing, found }) => {
            assert_eq!(missing, vec![777]);
            assert_eq!(found, vec![real_genre]);
        }
        other => panic!("expected GenreNotFound, got {other:?}"),
    }
    assert_eq!(count_rows(&catalog.db, entity::movie::Entity).await, 0);
    assert_eq!(count_rows(&catalog.db, entity::movie_detail::Entity).await, 0);
    // The upload stays in temp: validation failed before promotion.
    assert!(catalog.temp_dir.join("Piano.mp4").exists());
}

#[tokio::test]
async fn create_rolls_back_when_promotion_fails() {
    let catalog = bring_up_catalog().await;
    let director = seed_director(&catalog.db, "Wes Anderson").await;
    let genre = seed_genre(&catalog.db, "comedy").await;
    let user = seed_user(&catalog.db, "u@example.com").await;

    // No staged upload: the rename fails after the detail and movie rows
    // were inserted, so the whole transaction must roll back.
    let result = catalog
        .service
        .create_movie(create_dto(director, vec![genre], "Rushmore"), user)
        .await;

    assert!(matches!(result, Err(CatalogError::Storage { .. })));
    assert_eq!(count_rows(&catalog.db, entity::movie::Entity).await, 0);
    assert_eq!(count_rows(&catalog.db, entity::movie_detail::Entity).await, 0);
    assert_eq!(count_rows(&catalog.db, entity::movie_genre::Entity).await, 0);
    assert!(!catalog.media_dir.join("Rushmore.mp4").exists());
}

#[tokio::test]
async fn create_rejects_duplicate_title() {
    let catalog = bring_up_catalog().await;
    let director = seed_director(&catalog.db, "Ridley Scott").await;
    let genre = seed_genre(&catalog.db, "sci-fi").await;
    let user = seed_user(&catalog.db, "u@example.com").await;

    catalog.stage_upload("Alien.mp4").await;
    catalog
        .service
        .create_movie(create_dto(director, vec![genre], "Alien"), user)
        .await
        .expect("first create");

    catalog.stage_upload("Alien2.mp4").await;
    let mut dto = create_dto(director, vec![genre], "Alien");
    dto.movie_file_name = "Alien2.mp4".to_string();
    let result = catalog.service.create_movie(dto, user).await;

    assert!(matches!(result, Err(CatalogError::TitleExists { .. })));
    assert_eq!(count_rows(&catalog.db, entity::movie::Entity).await, 1);
}

#[tokio::test]
async fn create_validates_input_shape() {
    let catalog = bring_up_catalog().await;
    let director = seed_director(&catalog.db, "Someone").await;
    let genre = seed_genre(&catalog.db, "noir").await;
    let user = seed_user(&catalog.db, "u@example.com").await;

    let mut empty_genres = create_dto(director, vec![], "NoGenres");
    empty_genres.genre_ids = vec![];
    assert!(matches!(
        catalog.service.create_movie(empty_genres, user).await,
        Err(CatalogError::Validation { .. })
    ));

    let mut dup_genres = create_dto(director, vec![genre, genre], "DupGenres");
    dup_genres.genre_ids = vec![genre, genre];
    assert!(matches!(
        catalog.service.create_movie(dup_genres, user).await,
        Err(CatalogError::Validation { .. })
    ));

    let mut traversal = create_dto(director, vec![genre], "Sneaky");
    traversal.movie_file_name = "../../etc/passwd".to_string();
    assert!(matches!(
        catalog.service.create_movie(traversal, user).await,
        Err(CatalogError::Validation { .. })
    ));

    assert_eq!(count_rows(&catalog.db, entity::movie::Entity).await, 0);
}

#[tokio::test]
async fn update_replaces_genres_by_symmetric_difference() {
    let catalog = bring_up_catalog().await;
    let director = seed_director(&catalog.db, "Ridley Scott").await;
    let g1 = seed_genre(&catalog.db, "sci-fi").await;
    let g2 = seed_genre(&catalog.db, "horror").await;
    let g3 = seed_genre(&catalog.db, "thriller").await;
    let user = seed_user(&catalog.db, "u@example.com").await;

    catalog.stage_upload("Alien.mp4").await;
    let movie = catalog
        .service
        .create_movie(create_dto(director, vec![g1, g2], "Alien"), user)
        .await
        .expect("create");

    let updated = catalog
        .service
        .update_movie(
            movie.id,
            MoviePatch {
                genre_ids: Some(vec![g2, g3]),
                ..MoviePatch::default()
            },
        )
        .await
        .expect("update");

    let mut updated_ids: Vec<i64> = updated.genres.iter().map(|g| g.id).collect();
    updated_ids.sort_unstable();
    assert_eq!(updated_ids, vec![g2, g3]);
    assert_eq!(linked_genre_ids(&catalog, movie.id).await, vec![g2, g3]);
}

#[tokio::test]
async fn update_applies_scalars_detail_and_director() {
    let catalog = bring_up_catalog().await;
    let director = seed_director(&catalog.db, "Original Director").await;
    let new_director = seed_director(&catalog.db, "New Director").await;
    let genre = seed_genre(&catalog.db, "drama").await;
    let user = seed_user(&catalog.db, "u@example.com").await;

    catalog.stage_upload("First.mp4").await;
    let movie = catalog
        .service
        .create_movie(create_dto(director, vec![genre], "First"), user)
        .await
        .expect("create");

    let updated = catalog
        .service
        .update_movie(
            movie.id,
            MoviePatch {
                title: Some("First Cut".to_string()),
                detail: Some("re-edited plot".to_string()),
                director_id: Some(new_director),
                genre_ids: None,
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.title, "First Cut");
    assert_eq!(updated.detail, "re-edited plot");
    assert_eq!(updated.director.id, new_director);
    // Untouched relations survive.
    assert_eq!(linked_genre_ids(&catalog, movie.id).await, vec![genre]);
    // The movie row version moved on.
    assert!(updated.stamps.version > movie.stamps.version);
}

#[tokio::test]
async fn update_missing_movie_is_not_found() {
    let catalog = bring_up_catalog().await;

    let result = catalog
        .service
        .update_movie(
            4242,
            MoviePatch {
                title: Some("Nope".to_string()),
                ..MoviePatch::default()
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(CatalogError::MovieNotFound { id: 4242 })
    ));
}

#[tokio::test]
async fn update_rolls_back_wholesale_on_bad_genre() {
    let catalog = bring_up_catalog().await;
    let director = seed_director(&catalog.db, "Ridley Scott").await;
    let genre = seed_genre(&catalog.db, "sci-fi").await;
    let user = seed_user(&catalog.db, "u@example.com").await;

    catalog.stage_upload("Alien.mp4").await;
    let movie = catalog
        .service
        .create_movie(create_dto(director, vec![genre], "Alien"), user)
        .await
        .expect("create");

    let result = catalog
        .service
        .update_movie(
            movie.id,
            MoviePatch {
                title: Some("Alien: Director's Cut".to_string()),
                genre_ids: Some(vec![genre, 888]),
                ..MoviePatch::default()
            },
        )
        .await;

    assert!(matches!(result, Err(CatalogError::GenreNotFound { .. })));

    // Nothing of the patch became visible.
    let unchanged = catalog.service.get_movie(movie.id).await.expect("reload");
    assert_eq!(unchanged.title, "Alien");
    assert_eq!(linked_genre_ids(&catalog, movie.id).await, vec![genre]);
}

#[tokio::test]
async fn delete_removes_movie_with_owned_detail() {
    let catalog = bring_up_catalog().await;
    let director = seed_director(&catalog.db, "Ridley Scott").await;
    let genre = seed_genre(&catalog.db, "sci-fi").await;
    let user = seed_user(&catalog.db, "u@example.com").await;

    catalog.stage_upload("Alien.mp4").await;
    let movie = catalog
        .service
        .create_movie(create_dto(director, vec![genre], "Alien"), user)
        .await
        .expect("create");

    let deleted_id = catalog.service.delete_movie(movie.id).await.expect("delete");
    assert_eq!(deleted_id, movie.id);

    assert_eq!(count_rows(&catalog.db, entity::movie::Entity).await, 0);
    assert_eq!(count_rows(&catalog.db, entity::movie_detail::Entity).await, 0);
    assert_eq!(count_rows(&catalog.db, entity::movie_genre::Entity).await, 0);

    assert!(matches!(
        catalog.service.get_movie(movie.id).await,
        Err(CatalogError::MovieNotFound { .. })
    ));
}

#[tokio::test]
async fn delete_missing_movie_is_not_found() {
    let catalog = bring_up_catalog().await;

    assert!(matches!(
        catalog.service.delete_movie(9000).await,
        Err(CatalogError::MovieNotFound { id: 9000 })
    ));
}
