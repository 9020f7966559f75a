use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Linked account not found: {0}")]
    NotFound(Uuid),

    #[error("Access denied to linked account {0}")]
    Forbidden(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Code exchange failed: {0}")]
    Exchange(String),

    #[error("Session carries no provider access token")]
    MissingProviderToken,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AccountResult<T> = Result<T, AccountError>;

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        AccountError::Internal(format!("Database error: {}", err))
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(id) => {
                AppError::NotFound(format!("Linked account {} not found", id))
            }
            AccountError::Forbidden(id) => {
                AppError::Forbidden(format!("Access denied to linked account {}", id))
            }
            AccountError::Validation(msg) => AppError::BadRequest(msg),
            AccountError::Exchange(msg) => AppError::BadGateway(msg),
            AccountError::MissingProviderToken => {
                AppError::Unauthorized("Provider access token missing".to_string())
            }
            AccountError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Failure of a single social-graph call.
///
/// These never abort a linking run; they are logged and recorded against the
/// page or account they concern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Graph request timed out")]
    Timeout,

    #[error("Graph transport error: {0}")]
    Transport(String),

    #[error("Graph API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode graph response: {0}")]
    Decode(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GraphError::Timeout
        } else if err.is_decode() {
            GraphError::Decode(err.to_string())
        } else {
            GraphError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AccountError::NotFound(Uuid::nil()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        let response = AccountError::Forbidden(Uuid::nil()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_exchange_maps_to_bad_gateway() {
        let response = AccountError::Exchange("invalid grant".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_graph_status_display() {
        let err = GraphError::Status {
            status: 400,
            message: "Invalid OAuth access token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Graph API returned 400: Invalid OAuth access token"
        );
    }
}
