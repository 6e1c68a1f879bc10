use axum_typed_multipart::BaseMultipart;

use crate::error::AppError;

/// Typed multipart body whose rejections surface as [`AppError`].
pub type AppMultipart<T> = BaseMultipart<T, AppError>;
