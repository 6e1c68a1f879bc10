use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Link row between a movie and a genre. `movie_id` is always copied from the
/// owning movie record, never taken from request input.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movie_genre")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub movie_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub genre_id: i32,
    #[sea_orm(belongs_to, from = "movie_id", to = "id")]
    pub movie: Option<super::movie::Entity>,
    #[sea_orm(belongs_to, from = "genre_id", to = "id")]
    pub genre: Option<super::genre::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
