use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::genre;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub struct GenreResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Drama")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<genre::Model> for GenreResponse {
    fn from(g: genre::Model) -> Self {
        Self {
            id: g.id,
            name: g.name,
            created_at: g.created_at,
        }
    }
}

/// Genre selection posted by the page forms as repeated `genre_id[]` fields.
#[derive(Deserialize, Debug, Default)]
pub struct GenreSelection {
    #[serde(rename = "genre_id[]", default)]
    pub genre_ids: Vec<i32>,
}
