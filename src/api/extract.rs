//! Request extractors
//! Mission: JSON body extraction with the API's uniform error shape

use axum::extract::{rejection::JsonRejection, FromRequest, Request};

use crate::error::ApiError;

/// `axum::Json` with the crate's rejection: a body that fails to parse
/// surfaces as a 400 `{error, status}` like every other validation failure,
/// instead of axum's plain-text default.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}
