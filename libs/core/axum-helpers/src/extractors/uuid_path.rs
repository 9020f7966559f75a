//! UUID path parameter extractor with automatic validation.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// Extractor for `N` UUID path parameters, in route order.
///
/// A malformed value is answered with a JSON `INVALID_UUID` error instead of
/// axum's plain-text rejection.
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use axum::routing::delete;
/// use axum_helpers::extractors::UuidPath;
///
/// async fn unlink(UuidPath([user_id, id]): UuidPath<2>) -> String {
///     format!("{user_id}/{id}")
/// }
///
/// let app = Router::new().route("/users/{user_id}/linked-accounts/{id}", delete(unlink));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UuidPath<const N: usize>(pub [Uuid; N]);

impl<S, const N: usize> FromRequestParts<S> for UuidPath<N>
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<Vec<String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        let ids = raw
            .iter()
            .map(|value| {
                Uuid::parse_str(value).map_err(|_| AppError::InvalidUuid(value.clone()).into_response())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = ids.len();
        ids.try_into().map(UuidPath).map_err(|_| {
            AppError::InternalServerError(format!("Expected {} path parameters, found {}", N, count))
                .into_response()
        })
    }
}
