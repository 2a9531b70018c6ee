use crate::contract::model::{Director, Genre, Movie, MovieListItem, Stamps};
use crate::infra::storage::entity;

/// Convert database entities to contract models.
pub fn director_to_contract(entity: entity::director::Model) -> Director {
    Director {
        id: entity.id,
        name: entity.name,
        dob: entity.dob,
        nationality: entity.nationality,
        stamps: Stamps {
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            version: entity.version,
        },
    }
}

pub fn genre_to_contract(entity: entity::genre::Model) -> Genre {
    Genre {
        id: entity.id,
        name: entity.name,
        stamps: Stamps {
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            version: entity.version,
        },
    }
}

pub fn movie_to_list_item(entity: entity::movie::Model) -> MovieListItem {
    MovieListItem {
        id: entity.id,
        title: entity.title,
        director_id: entity.director_id,
        like_count: entity.like_count,
        dislike_count: entity.dislike_count,
        movie_file_path: entity.movie_file_path,
        like_status: None,
        stamps: Stamps {
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            version: entity.version,
        },
    }
}

/// Assemble the full aggregate from its already-loaded pieces.
pub fn assemble_aggregate(
    movie: entity::movie::Model,
    detail: entity::movie_detail::Model,
    director: entity::director::Model,
    genres: Vec<entity::genre::Model>,
) -> Movie {
    Movie {
        id: movie.id,
        title: movie.title,
        detail: detail.detail,
        director: director_to_contract(director),
        genres: genres.into_iter().map(genre_to_contract).collect(),
        creator_id: movie.creator_id,
        like_count: movie.like_count,
        dislike_count: movie.dislike_count,
        movie_file_path: movie.movie_file_path,
        stamps: Stamps {
            created_at: movie.created_at,
            updated_at: movie.updated_at,
            version: movie.version,
        },
    }
}
