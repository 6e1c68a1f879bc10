//! Movie catalog operations shared by the JSON API and the HTML pages.
//!
//! Handlers parse the request, call into this module and pick a response
//! shape. Everything that touches the database or the blob store for a movie
//! lives here.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::Utc;
use common::storage::{BlobStore, ContentHash, StorageError, StoredPath};
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::*;
use tokio::fs::File;
use tracing::{debug, info, instrument, warn};

use crate::entity::{genre, movie, movie_genre};
use crate::error::{AppError, FieldErrors};
use crate::models::movie::{
    AssetRule, AssetSlot, AssetUpload, MovieFields, MovieInput, MovieSubmission,
};
use crate::models::shared::{GENRE_FIELD, validate_genre_ids};
use crate::state::AppState;

pub const TITLE_TAKEN: &str = "The title has already been taken.";

/// Movies newest first. With a `limit`, the most recently created ones.
pub async fn list_movies<C: ConnectionTrait>(
    db: &C,
    limit: Option<u64>,
) -> Result<Vec<movie::Model>, AppError> {
    let query = match limit {
        Some(n) => movie::Entity::find()
            .order_by_desc(movie::Column::CreatedAt)
            .order_by_desc(movie::Column::Id)
            .limit(Some(n)),
        None => movie::Entity::find().order_by_desc(movie::Column::Id),
    };
    Ok(query.all(db).await?)
}

pub async fn list_genres<C: ConnectionTrait>(db: &C) -> Result<Vec<genre::Model>, AppError> {
    Ok(genre::Entity::find()
        .order_by_asc(genre::Column::Id)
        .all(db)
        .await?)
}

pub async fn find_movie<C: ConnectionTrait>(db: &C, id: i32) -> Result<movie::Model, AppError> {
    movie::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".into()))
}

async fn find_movie_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<movie::Model, AppError> {
    movie::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".into()))
}

/// Genres linked to a movie, by id.
pub async fn movie_genres<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
) -> Result<Vec<genre::Model>, AppError> {
    let rows = movie_genre::Entity::find()
        .filter(movie_genre::Column::MovieId.eq(movie_id))
        .find_also_related(genre::Entity)
        .order_by_asc(movie_genre::Column::GenreId)
        .all(db)
        .await?;

    Ok(rows.into_iter().filter_map(|(_, g)| g).collect())
}

#[instrument(skip(state, input), fields(title = input.title.as_deref().unwrap_or_default()))]
pub async fn create_movie(state: &AppState, input: MovieInput) -> Result<movie::Model, AppError> {
    let submission = validate_submission(&state.db, input, AssetRule::Required, None).await?;
    let MovieSubmission {
        fields,
        assets,
        genre_ids,
    } = submission;

    let mut stored = StoredAssets::default();
    let result = {
        let _writing = state.asset_lock.read().await;
        match store_assets(state, assets, &mut stored).await {
            Ok(()) => insert_movie(&state.db, &fields, &stored, &genre_ids).await,
            Err(e) => Err(e),
        }
    };
    match result {
        Ok(model) => {
            info!(movie_id = model.id, title = %model.title, "Movie created");
            Ok(model)
        }
        Err(e) => {
            discard_unreferenced(state, &stored.fresh).await;
            Err(e)
        }
    }
}

async fn insert_movie(
    db: &DatabaseConnection,
    fields: &MovieFields,
    stored: &StoredAssets,
    genre_ids: &[i32],
) -> Result<movie::Model, AppError> {
    let path = |slot: AssetSlot| {
        stored
            .path_for(slot)
            .map(|p| p.to_string())
            .ok_or_else(|| AppError::Internal(format!("{} was not stored", slot.field())))
    };

    let now = Utc::now();
    let active = movie::ActiveModel {
        title: Set(fields.title.clone()),
        poster: Set(path(AssetSlot::Poster)?),
        banner: Set(path(AssetSlot::Banner)?),
        file: Set(path(AssetSlot::File)?),
        trailer: Set(path(AssetSlot::Trailer)?),
        year: Set(fields.year.clone()),
        runtime: Set(fields.runtime.clone()),
        plot: Set(fields.plot.clone()),
        director: Set(fields.director.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let txn = db.begin().await?;
    let model = active.insert(&txn).await.map_err(title_conflict)?;
    link_genres(&txn, model.id, genre_ids).await?;
    txn.commit().await?;

    Ok(model)
}

#[instrument(skip(state, input), fields(movie_id = id))]
pub async fn update_movie(
    state: &AppState,
    id: i32,
    mut input: MovieInput,
) -> Result<movie::Model, AppError> {
    find_movie(&state.db, id).await?;

    // Update never touches associations.
    input.genre_ids.clear();
    let submission = validate_submission(&state.db, input, AssetRule::Optional, Some(id)).await?;
    let MovieSubmission { fields, assets, .. } = submission;

    let mut stored = StoredAssets::default();
    let result = {
        let _writing = state.asset_lock.read().await;
        match store_assets(state, assets, &mut stored).await {
            Ok(()) => apply_update(&state.db, id, fields, &stored).await,
            Err(e) => Err(e),
        }
    };
    match result {
        Ok((model, superseded)) => {
            info!(movie_id = id, replaced = stored.paths.len(), "Movie updated");
            if state.config.catalog.reclaim_orphaned_assets {
                discard_unreferenced(state, &superseded).await;
            }
            Ok(model)
        }
        Err(e) => {
            discard_unreferenced(state, &stored.fresh).await;
            Err(e)
        }
    }
}

/// Write the update and return the new model with the paths it replaced.
async fn apply_update(
    db: &DatabaseConnection,
    id: i32,
    fields: MovieFields,
    stored: &StoredAssets,
) -> Result<(movie::Model, Vec<StoredPath>), AppError> {
    let txn = db.begin().await?;
    let existing = find_movie_for_update(&txn, id).await?;

    let mut superseded = Vec::new();
    for (slot, path) in &stored.paths {
        let old = slot.path_of(&existing);
        if old != path.to_string() {
            match StoredPath::from_str(old) {
                Ok(old) => superseded.push(old),
                Err(e) => warn!(movie_id = id, path = old, error = %e, "Unparseable asset path"),
            }
        }
    }

    let mut active: movie::ActiveModel = existing.into();
    active.title = Set(fields.title);
    active.year = Set(fields.year);
    active.runtime = Set(fields.runtime);
    active.plot = Set(fields.plot);
    active.director = Set(fields.director);
    for (slot, path) in &stored.paths {
        let value = Set(path.to_string());
        match slot {
            AssetSlot::Poster => active.poster = value,
            AssetSlot::Banner => active.banner = value,
            AssetSlot::File => active.file = value,
            AssetSlot::Trailer => active.trailer = value,
        }
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&txn).await.map_err(title_conflict)?;
    txn.commit().await?;

    Ok((model, superseded))
}

#[instrument(skip(state), fields(movie_id = id))]
pub async fn delete_movie(state: &AppState, id: i32) -> Result<(), AppError> {
    let txn = state.db.begin().await?;
    let existing = find_movie_for_update(&txn, id).await?;

    let unlinked = movie_genre::Entity::delete_many()
        .filter(movie_genre::Column::MovieId.eq(id))
        .exec(&txn)
        .await?
        .rows_affected;
    movie::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    info!(movie_id = id, unlinked, "Movie deleted");

    if state.config.catalog.reclaim_orphaned_assets {
        let paths: Vec<StoredPath> = AssetSlot::ALL
            .iter()
            .filter_map(|slot| StoredPath::from_str(slot.path_of(&existing)).ok())
            .collect();
        discard_unreferenced(state, &paths).await;
    }

    Ok(())
}

/// Link genres to a movie. Genres already linked are left as they are.
#[instrument(skip(db, genre_ids), fields(movie_id = id, count = genre_ids.len()))]
pub async fn attach_genres(
    db: &DatabaseConnection,
    id: i32,
    genre_ids: &[i32],
) -> Result<Vec<genre::Model>, AppError> {
    find_movie(db, id).await?;

    let mut errors = FieldErrors::new();
    validate_genre_ids(genre_ids, true, &mut errors);
    if errors.is_empty() {
        check_genres_exist(db, genre_ids, &mut errors).await?;
    }
    errors.into_result()?;

    let txn = db.begin().await?;
    let movie = find_movie_for_update(&txn, id).await?;
    link_genres(&txn, movie.id, genre_ids).await?;
    txn.commit().await?;

    movie_genres(db, id).await
}

/// Unlink genres from a movie. Ids that are not linked are ignored.
#[instrument(skip(db, genre_ids), fields(movie_id = id, count = genre_ids.len()))]
pub async fn detach_genres(
    db: &DatabaseConnection,
    id: i32,
    genre_ids: &[i32],
) -> Result<Vec<genre::Model>, AppError> {
    find_movie(db, id).await?;

    let mut errors = FieldErrors::new();
    validate_genre_ids(genre_ids, true, &mut errors);
    errors.into_result()?;

    let txn = db.begin().await?;
    let movie = find_movie_for_update(&txn, id).await?;
    let removed = movie_genre::Entity::delete_many()
        .filter(movie_genre::Column::MovieId.eq(movie.id))
        .filter(movie_genre::Column::GenreId.is_in(genre_ids.iter().copied()))
        .exec(&txn)
        .await?
        .rows_affected;
    txn.commit().await?;

    debug!(movie_id = id, removed, "Genres detached");
    movie_genres(db, id).await
}

/// Insert link rows for `movie_id`, skipping pairs that already exist.
async fn link_genres<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    genre_ids: &[i32],
) -> Result<(), AppError> {
    if genre_ids.is_empty() {
        return Ok(());
    }

    let rows = genre_ids.iter().map(|&genre_id| movie_genre::ActiveModel {
        movie_id: Set(movie_id),
        genre_id: Set(genre_id),
    });

    let result = movie_genre::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([movie_genre::Column::MovieId, movie_genre::Column::GenreId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Run field validation plus the checks that need the database.
async fn validate_submission(
    db: &DatabaseConnection,
    input: MovieInput,
    rule: AssetRule,
    exclude_id: Option<i32>,
) -> Result<MovieSubmission, AppError> {
    let title = input
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);
    let genre_ids = input.genre_ids.clone();

    let mut errors = FieldErrors::new();
    let submission = input.validate(rule).map_err(|e| errors.merge(e)).ok();

    if let Some(title) = title
        && !errors.contains("title")
        && title_taken(db, &title, exclude_id).await?
    {
        errors.add("title", TITLE_TAKEN);
    }
    if !errors.contains(GENRE_FIELD) {
        check_genres_exist(db, &genre_ids, &mut errors).await?;
    }

    errors.into_result()?;
    submission.ok_or_else(|| AppError::Internal("validated submission missing".into()))
}

async fn title_taken<C: ConnectionTrait>(
    db: &C,
    title: &str,
    exclude_id: Option<i32>,
) -> Result<bool, AppError> {
    let mut query = movie::Entity::find().filter(movie::Column::Title.eq(title));
    if let Some(id) = exclude_id {
        query = query.filter(movie::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

async fn check_genres_exist<C: ConnectionTrait>(
    db: &C,
    genre_ids: &[i32],
    errors: &mut FieldErrors,
) -> Result<(), AppError> {
    if genre_ids.is_empty() {
        return Ok(());
    }

    let found: HashSet<i32> = genre::Entity::find()
        .filter(genre::Column::Id.is_in(genre_ids.iter().copied()))
        .select_only()
        .column(genre::Column::Id)
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    for id in genre_ids.iter().filter(|id| !found.contains(id)) {
        errors.add(GENRE_FIELD, format!("The selected {GENRE_FIELD} {id} is invalid."));
    }
    Ok(())
}

/// A unique violation on write means another request took the title after
/// validation ran.
fn title_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            debug!(%detail, "Title lost a concurrent write");
            let mut errors = FieldErrors::new();
            errors.add("title", TITLE_TAKEN);
            AppError::InvalidFields(errors)
        }
        _ => err.into(),
    }
}

/// Blobs written for one request.
#[derive(Debug, Default)]
struct StoredAssets {
    paths: Vec<(AssetSlot, StoredPath)>,
    /// Paths that did not exist before this request.
    fresh: Vec<StoredPath>,
}

impl StoredAssets {
    fn path_for(&self, slot: AssetSlot) -> Option<&StoredPath> {
        self.paths.iter().find(|(s, _)| *s == slot).map(|(_, p)| p)
    }
}

/// Store every asset, recording each path in `stored` as it lands.
///
/// Callers hold `asset_lock` shared from here until the row referencing the
/// paths has committed or failed.
async fn store_assets(
    state: &AppState,
    assets: Vec<AssetUpload>,
    stored: &mut StoredAssets,
) -> Result<(), AppError> {
    for asset in assets {
        let (path, fresh) = store_asset(&*state.blob_store, &asset).await?;
        debug!(slot = asset.slot.field(), %path, fresh, "Asset stored");
        if fresh {
            stored.fresh.push(path.clone());
        }
        stored.paths.push((asset.slot, path));
    }
    Ok(())
}

async fn store_asset(
    blob_store: &dyn BlobStore,
    asset: &AssetUpload,
) -> Result<(StoredPath, bool), AppError> {
    let area = asset.slot.area();
    let extension = asset.media_type.extension();

    let file = File::open(asset.contents.path())
        .await
        .map_err(StorageError::from)?;
    let hash = ContentHash::compute_reader(file)
        .await
        .map_err(StorageError::from)?;
    let existed = blob_store
        .exists(&StoredPath::new(area, hash, extension)?)
        .await?;

    let file = File::open(asset.contents.path())
        .await
        .map_err(StorageError::from)?;
    let path = blob_store
        .put_stream(area, extension, Box::new(file))
        .await?;
    Ok((path, !existed))
}

/// Delete each blob in `paths` that no movie references. Failures are logged.
///
/// Holds `asset_lock` exclusively, so a request that has stored one of these
/// paths but not yet committed its movie row is waited for and then counted.
async fn discard_unreferenced(state: &AppState, paths: &[StoredPath]) {
    if paths.is_empty() {
        return;
    }
    let _reclaiming = state.asset_lock.write().await;
    let mut seen = HashSet::new();
    for path in paths.iter().filter(|p| seen.insert(p.to_string())) {
        match reference_count(&state.db, path).await {
            Ok(0) => match state.blob_store.delete(path).await {
                Ok(true) => info!(%path, "Reclaimed unreferenced asset"),
                Ok(false) => {}
                Err(e) => warn!(%path, error = %e, "Failed to delete unreferenced asset"),
            },
            Ok(count) => debug!(%path, count, "Asset still referenced"),
            Err(e) => warn!(%path, error = %e, "Failed to count asset references"),
        }
    }
}

/// Number of movies whose poster, banner, file or trailer is `path`.
async fn reference_count<C: ConnectionTrait>(db: &C, path: &StoredPath) -> Result<u64, DbErr> {
    let path = path.to_string();
    movie::Entity::find()
        .filter(
            Condition::any()
                .add(movie::Column::Poster.eq(&path))
                .add(movie::Column::Banner.eq(&path))
                .add(movie::Column::File.eq(&path))
                .add(movie::Column::Trailer.eq(&path)),
        )
        .count(db)
        .await
}
