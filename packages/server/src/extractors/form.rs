use axum::extract::{FromRequest, Request};
use axum_extra::extract::{Form, FormRejection};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// URL-encoded form body. Backed by `axum_extra`'s `Form` so repeated keys
/// such as `genre_id[]=1&genre_id[]=2` collect into a `Vec`.
pub struct AppForm<T>(pub T);

impl<S, T> FromRequest<S> for AppForm<T>
where
    Form<T>: FromRequest<S, Rejection = FormRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Form::<T>::from_request(req, state)
            .await
            .map(|Form(value)| AppForm(value))
            .map_err(|e| AppError::Validation(format!("Invalid form body: {e}")))
    }
}
