use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::info;

use crate::entity::genre;

/// Genres available on a fresh install.
pub const DEFAULT_GENRES: &[&str] = &[
    "Acción",
    "Aventura",
    "Animación",
    "Comedia",
    "Ciencia ficción",
    "Documental",
    "Drama",
    "Fantasía",
    "Romance",
    "Suspenso",
    "Terror",
];

/// Seed the `genre` table with [`DEFAULT_GENRES`]. Existing names are kept.
pub async fn seed_genres(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for &name in DEFAULT_GENRES {
        let model = genre::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let result = genre::Entity::insert(model)
            .on_conflict(
                OnConflict::column(genre::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(rows) if rows > 0 => inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new genres", inserted);
    }

    Ok(())
}
