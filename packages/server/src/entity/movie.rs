use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub title: String,

    // Stored paths (`{area}/{hash}.{ext}`).
    pub poster: String,
    pub banner: String,
    pub file: String,
    pub trailer: String,

    pub year: String,
    pub runtime: String,
    #[sea_orm(column_type = "Text")]
    pub plot: String,
    pub director: String,

    #[sea_orm(has_many, via = "movie_genre")]
    pub genres: HasMany<super::genre::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
