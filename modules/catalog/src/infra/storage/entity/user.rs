use sea_orm::entity::prelude::*;

/// Minimal account row. Credentials and token issuance live in the external
/// auth collaborator; the catalog only references users by id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub email: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie::Entity")]
    CreatedMovies,
    #[sea_orm(has_many = "super::movie_user_like::Entity")]
    LikedMovies,
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreatedMovies.def()
    }
}

impl Related<super::movie_user_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LikedMovies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
