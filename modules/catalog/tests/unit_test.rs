use std::time::Duration;

use chrono::{NaiveDate, Utc};

use catalog::config::CatalogConfig;
use catalog::contract::{error::CatalogError, model::*};
use catalog::domain::error::DomainError;
// Note: These internal module imports are only for testing
// External consumers should only use the `contract` module

fn stamps() -> Stamps {
    Stamps {
        created_at: Utc::now(),
        updated_at: Utc::now(),
        version: 1,
    }
}

#[test]
fn test_contract_models() {
    let director = Director {
        id: 1,
        name: "Ridley Scott".to_string(),
        dob: NaiveDate::from_ymd_opt(1937, 11, 30).unwrap(),
        nationality: "GB".to_string(),
        stamps: stamps(),
    };

    let movie = Movie {
        id: 10,
        title: "Alien".to_string(),
        detail: "A commercial crew answers a distress call.".to_string(),
        director: director.clone(),
        genres: vec![Genre {
            id: 3,
            name: "sci-fi".to_string(),
            stamps: stamps(),
        }],
        creator_id: Some(7),
        like_count: 0,
        dislike_count: 0,
        movie_file_path: "public/movie/Alien.mp4".to_string(),
        stamps: stamps(),
    };

    assert_eq!(movie.title, "Alien");
    assert_eq!(movie.director.name, "Ridley Scott");
    assert_eq!(movie.genres.len(), 1);

    let dto = CreateMovie {
        title: "Alien".to_string(),
        detail: "plot".to_string(),
        director_id: 1,
        genre_ids: vec![3, 4],
        movie_file_name: "Alien.mp4".to_string(),
    };
    assert_eq!(dto.genre_ids, vec![3, 4]);

    let patch = MoviePatch {
        title: Some("Aliens".to_string()),
        ..MoviePatch::default()
    };
    assert_eq!(patch.title, Some("Aliens".to_string()));
    assert_eq!(patch.genre_ids, None);

    let status = LikeStatus { is_like: None };
    assert_eq!(status.is_like, None);
}

#[test]
fn test_contract_errors() {
    let error = CatalogError::movie_not_found(42);
    match error {
        CatalogError::MovieNotFound { id } => assert_eq!(id, 42),
        _ => panic!("Expected MovieNotFound error"),
    }

    let error = CatalogError::genre_not_found(vec![9], vec![1, 2]);
    match &error {
        CatalogError::GenreNotFound { missing, found } => {
            assert_eq!(missing, &vec![9]);
            assert_eq!(found, &vec![1, 2]);
        }
        _ => panic!("Expected GenreNotFound error"),
    }
    // The offending ids end up in the message.
    let rendered = error.to_string();
    assert!(rendered.contains("[9]"));
    assert!(rendered.contains("[1, 2]"));

    let error = CatalogError::title_exists("Alien");
    match error {
        CatalogError::TitleExists { title } => assert_eq!(title, "Alien"),
        _ => panic!("Expected TitleExists error"),
    }
}

#[test]
fn test_domain_errors_map_to_contract() {
    let mapped: CatalogError = DomainError::director_not_found(5).into();
    assert!(matches!(mapped, CatalogError::DirectorNotFound { id: 5 }));

    let mapped: CatalogError = DomainError::user_not_found(6).into();
    assert!(matches!(mapped, CatalogError::UserNotFound { id: 6 }));

    let mapped: CatalogError = DomainError::validation("bad input").into();
    assert!(matches!(mapped, CatalogError::Validation { .. }));

    // Database and media failures both surface as retriable storage errors.
    let mapped: CatalogError = DomainError::database("connection lost").into();
    assert!(matches!(mapped, CatalogError::Storage { .. }));

    let mapped: CatalogError = DomainError::media("rename failed").into();
    assert!(matches!(mapped, CatalogError::Storage { .. }));
}

#[test]
fn test_page_errors_map_to_contract() {
    let mapped: CatalogError = page_core::PageError::CursorInvalidBase64.into();
    assert!(matches!(mapped, CatalogError::Validation { .. }));

    let mapped: CatalogError = page_core::PageError::Db("boom".to_string()).into();
    assert!(matches!(mapped, CatalogError::Storage { .. }));
}

#[test]
fn test_config_defaults() {
    let config = CatalogConfig::default();
    assert_eq!(config.default_page_size, 5);
    assert_eq!(config.max_page_size, 100);
    assert_eq!(config.recent_take, 10);
    assert_eq!(config.like_recount_interval, Duration::from_secs(60));
    assert_eq!(config.temp_max_age, Duration::from_secs(24 * 60 * 60));

    let service_config = config.service_config();
    assert_eq!(service_config.recent_take, 10);
    assert_eq!(service_config.recent_ttl, config.recent_ttl);
}

#[test]
fn test_config_parses_humantime_durations() {
    let config: CatalogConfig = serde_json::from_value(serde_json::json!({
        "recent_ttl": "45s",
        "like_recount_interval": "5m",
        "temp_max_age": "2days"
    }))
    .expect("parse config");

    assert_eq!(config.recent_ttl, Duration::from_secs(45));
    assert_eq!(config.like_recount_interval, Duration::from_secs(300));
    assert_eq!(config.temp_max_age, Duration::from_secs(2 * 24 * 60 * 60));
    // Untouched fields keep their defaults.
    assert_eq!(config.default_page_size, 5);
}

#[test]
fn test_config_rejects_unknown_fields() {
    let result: Result<CatalogConfig, _> = serde_json::from_value(serde_json::json!({
        "page_size": 9
    }));
    assert!(result.is_err());
}
