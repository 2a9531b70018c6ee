//! SeaORM entities for the catalog tables.

pub mod director;
pub mod genre;
pub mod movie;
pub mod movie_detail;
pub mod movie_genre;
pub mod movie_user_like;
pub mod user;
