use std::num::IntErrorKind;

use axum_typed_multipart::{FieldData, TryFromMultipart};
use chrono::{DateTime, Utc};
use common::storage::{StorageArea, StorageError};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;

use super::genre::GenreResponse;
use super::shared::{validate_genre_ids, validate_required};
use crate::entity::movie;
use crate::error::{AppError, FieldErrors};
use crate::utils::media_type::MediaType;

pub const TITLE_MAX_CHARS: usize = 255;

/// Multipart body of the create and update forms.
///
/// Everything is optional at the extraction layer so that validation can
/// report every missing field at once. File parts are spooled to temporary
/// files; the body limit on the upload routes bounds their total size.
#[derive(TryFromMultipart)]
pub struct MovieForm {
    pub title: Option<String>,
    pub year: Option<String>,
    pub runtime: Option<String>,
    pub plot: Option<String>,
    pub director: Option<String>,
    #[form_data(limit = "unlimited")]
    pub poster: Option<FieldData<NamedTempFile>>,
    #[form_data(limit = "unlimited")]
    pub banner: Option<FieldData<NamedTempFile>>,
    #[form_data(limit = "unlimited")]
    pub file: Option<FieldData<NamedTempFile>>,
    #[form_data(limit = "unlimited")]
    pub trailer: Option<FieldData<NamedTempFile>>,
    #[form_data(field_name = "genre_id[]")]
    pub genre_ids: Vec<i32>,
}

impl MovieInput {
    pub async fn from_form(form: MovieForm) -> Result<Self, AppError> {
        async fn upload(
            field: Option<FieldData<NamedTempFile>>,
        ) -> Result<Option<RawUpload>, AppError> {
            match field {
                Some(f) => Ok(Some(RawUpload::open(f.contents).await?)),
                None => Ok(None),
            }
        }

        Ok(Self {
            title: form.title,
            year: form.year,
            runtime: form.runtime,
            plot: form.plot,
            director: form.director,
            poster: upload(form.poster).await?,
            banner: upload(form.banner).await?,
            file: upload(form.file).await?,
            trailer: upload(form.trailer).await?,
            genre_ids: form.genre_ids,
        })
    }
}

/// An uploaded file part before validation.
#[derive(Debug)]
pub struct RawUpload {
    /// Leading bytes, enough to identify the media type.
    pub head: Vec<u8>,
    pub len: u64,
    pub contents: NamedTempFile,
}

impl RawUpload {
    /// Longest signature prefix checked by [`MediaType::sniff`], rounded up.
    pub const HEAD_LEN: u64 = 16;

    pub async fn open(contents: NamedTempFile) -> Result<Self, StorageError> {
        let mut file = tokio::fs::File::open(contents.path()).await?;
        let len = file.metadata().await?.len();
        let mut head = Vec::with_capacity(Self::HEAD_LEN as usize);
        (&mut file).take(Self::HEAD_LEN).read_to_end(&mut head).await?;
        Ok(Self {
            head,
            len,
            contents,
        })
    }
}

/// Submitted movie form, detached from the multipart extractor.
#[derive(Debug, Default)]
pub struct MovieInput {
    pub title: Option<String>,
    pub year: Option<String>,
    pub runtime: Option<String>,
    pub plot: Option<String>,
    pub director: Option<String>,
    pub poster: Option<RawUpload>,
    pub banner: Option<RawUpload>,
    pub file: Option<RawUpload>,
    pub trailer: Option<RawUpload>,
    pub genre_ids: Vec<i32>,
}

/// Whether the four assets must be present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetRule {
    Required,
    Optional,
}

/// One of the four asset fields of a movie.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetSlot {
    Poster,
    Banner,
    File,
    Trailer,
}

impl AssetSlot {
    pub const ALL: [AssetSlot; 4] = [Self::Poster, Self::Banner, Self::File, Self::Trailer];

    /// Form field and column name.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Poster => "poster",
            Self::Banner => "banner",
            Self::File => "file",
            Self::Trailer => "trailer",
        }
    }

    pub fn area(&self) -> StorageArea {
        match self {
            Self::Poster | Self::Banner => StorageArea::Images,
            Self::File => StorageArea::Media,
            Self::Trailer => StorageArea::Trailer,
        }
    }

    pub fn accepts(&self) -> &'static [MediaType] {
        match self {
            Self::Poster | Self::Banner => MediaType::IMAGES,
            Self::File | Self::Trailer => MediaType::AUDIO_VIDEO,
        }
    }

    fn type_message(&self) -> String {
        let types = match self {
            Self::Poster | Self::Banner => "jpg, jpeg, bmp, png",
            Self::File | Self::Trailer => "mp4, mp3, wav",
        };
        format!("The {} must be a file of type: {types}.", self.field())
    }

    /// Current stored path of this slot on `model`.
    pub fn path_of<'a>(&self, model: &'a movie::Model) -> &'a str {
        match self {
            Self::Poster => &model.poster,
            Self::Banner => &model.banner,
            Self::File => &model.file,
            Self::Trailer => &model.trailer,
        }
    }
}

/// A validated upload waiting to be stored.
#[derive(Debug)]
pub struct AssetUpload {
    pub slot: AssetSlot,
    pub media_type: MediaType,
    pub contents: NamedTempFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieFields {
    pub title: String,
    pub year: String,
    pub runtime: String,
    pub plot: String,
    pub director: String,
}

/// A create or update request that passed field-level validation. Title
/// uniqueness still has to be checked against the database.
#[derive(Debug)]
pub struct MovieSubmission {
    pub fields: MovieFields,
    pub assets: Vec<AssetUpload>,
    pub genre_ids: Vec<i32>,
}

/// Text input echoed back to a re-rendered form.
#[derive(Serialize, Debug, Default, Clone)]
pub struct OldInput {
    pub title: Option<String>,
    pub year: Option<String>,
    pub runtime: Option<String>,
    pub plot: Option<String>,
    pub director: Option<String>,
    pub genre_id: Vec<i32>,
}

impl MovieInput {
    pub fn old_input(&self) -> OldInput {
        OldInput {
            title: self.title.clone(),
            year: self.year.clone(),
            runtime: self.runtime.clone(),
            plot: self.plot.clone(),
            director: self.director.clone(),
            genre_id: self.genre_ids.clone(),
        }
    }

    fn take_asset(&mut self, slot: AssetSlot) -> Option<RawUpload> {
        let field = match slot {
            AssetSlot::Poster => self.poster.take(),
            AssetSlot::Banner => self.banner.take(),
            AssetSlot::File => self.file.take(),
            AssetSlot::Trailer => self.trailer.take(),
        };
        // Browsers submit an empty part for an untouched file input.
        field.filter(|f| f.len > 0)
    }

    pub fn validate(mut self, rule: AssetRule) -> Result<MovieSubmission, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = validate_required("title", self.title.take(), &mut errors);
        if let Some(ref t) = title
            && t.chars().count() > TITLE_MAX_CHARS
        {
            errors.add(
                "title",
                format!("The title may not be greater than {TITLE_MAX_CHARS} characters."),
            );
        }
        let year = validate_required("year", self.year.take(), &mut errors);
        let runtime = validate_required("runtime", self.runtime.take(), &mut errors);
        let plot = validate_required("plot", self.plot.take(), &mut errors);
        let director = validate_required("director", self.director.take(), &mut errors);

        let mut assets = Vec::new();
        for slot in AssetSlot::ALL {
            match self.take_asset(slot) {
                Some(upload) => match MediaType::sniff(&upload.head) {
                    Some(media_type) if slot.accepts().contains(&media_type) => {
                        assets.push(AssetUpload {
                            slot,
                            media_type,
                            contents: upload.contents,
                        });
                    }
                    _ => errors.add(slot.field(), slot.type_message()),
                },
                None if rule == AssetRule::Required => {
                    errors.add(
                        slot.field(),
                        format!("The {} field is required.", slot.field()),
                    );
                }
                None => {}
            }
        }

        validate_genre_ids(&self.genre_ids, false, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        match (title, year, runtime, plot, director) {
            (Some(title), Some(year), Some(runtime), Some(plot), Some(director)) => {
                Ok(MovieSubmission {
                    fields: MovieFields {
                        title,
                        year,
                        runtime,
                        plot,
                        director,
                    },
                    assets,
                    genre_ids: self.genre_ids,
                })
            }
            // Every `None` above recorded an error.
            _ => Err(errors),
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovieListQuery {
    /// Return only the N most recently created movies. Empty or `0` means all.
    #[param(example = "10")]
    pub cantidad: Option<String>,
}

impl MovieListQuery {
    /// Largest row count the database accepts for `LIMIT`. Anything above it
    /// already covers every movie.
    pub const MAX_LIMIT: u64 = i64::MAX as u64;

    pub fn limit(&self) -> Result<Option<u64>, AppError> {
        let raw = match self.cantidad.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(raw) => raw,
        };
        match raw.parse::<u64>() {
            Ok(0) => Ok(None),
            Ok(n) => Ok(Some(n.min(Self::MAX_LIMIT))),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(Some(Self::MAX_LIMIT)),
            Err(_) => Err(AppError::Validation("cantidad must be a positive integer".into())),
        }
    }
}

/// Genre ids for the add/remove genre endpoints.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct GenreIdsRequest {
    #[schema(example = json!([1, 3]))]
    pub genre_ids: Vec<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub struct MovieResponse {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "El laberinto del fauno")]
    pub title: String,
    /// Stored path of the poster image.
    #[schema(example = "images/9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08.jpg")]
    pub poster: String,
    pub banner: String,
    /// Stored path of the media file.
    pub file: String,
    pub trailer: String,
    #[schema(example = "2006")]
    pub year: String,
    #[schema(example = "118")]
    pub runtime: String,
    pub plot: String,
    #[schema(example = "Guillermo del Toro")]
    pub director: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<movie::Model> for MovieResponse {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            poster: m.poster,
            banner: m.banner,
            file: m.file,
            trailer: m.trailer,
            year: m.year,
            runtime: m.runtime,
            plot: m.plot,
            director: m.director,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A movie together with its linked genres.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MovieDetailResponse {
    #[serde(flatten)]
    pub movie: MovieResponse,
    pub genres: Vec<GenreResponse>,
}

/// Data for populating an edit form.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MovieEditResponse {
    pub movie: MovieResponse,
    /// Every genre, for selection.
    pub genres: Vec<GenreResponse>,
}
