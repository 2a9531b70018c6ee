pub mod error;
pub mod model;

pub use error::CatalogError;
pub use model::{
    CreateMovie, Director, Genre, LikeStatus, Movie, MovieListItem, MovieListQuery, MoviePatch,
    Stamps,
};
