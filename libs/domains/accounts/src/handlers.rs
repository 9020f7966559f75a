use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{delete, get},
};
use axum_helpers::UuidPath;
use oauth2::PkceCodeChallenge;
use serde::Deserialize;

use crate::auth::AuthSessionProvider;
use crate::config::PublicOrigin;
use crate::error::{AccountError, AccountResult};
use crate::graph::SocialGraph;
use crate::models::LinkedAccountResponse;
use crate::repository::LinkedAccountRepository;
use crate::service::{AccountLinkingService, CallbackRequest};

pub const PKCE_COOKIE: &str = "cf_pkce_verifier";
const PKCE_COOKIE_MAX_AGE: u32 = 600;

/// Shared state for the account routes.
pub struct AccountsState<A, G, R>
where
    A: AuthSessionProvider,
    G: SocialGraph,
    R: LinkedAccountRepository,
{
    pub service: AccountLinkingService<A, G, R>,
    /// Frontend origin redirect paths are resolved against.
    pub public_origin: PublicOrigin,
    /// Mark cookies `Secure` (production, behind HTTPS).
    pub secure_cookies: bool,
}

impl<A, G, R> Clone for AccountsState<A, G, R>
where
    A: AuthSessionProvider,
    G: SocialGraph,
    R: LinkedAccountRepository,
{
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            public_origin: self.public_origin.clone(),
            secure_cookies: self.secure_cookies,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

/// Provider redirect target. Always answers `303 See Other`.
async fn callback<A, G, R>(
    State(state): State<AccountsState<A, G, R>>,
    query: Result<Query<CallbackQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Response
where
    A: AuthSessionProvider,
    G: SocialGraph,
    R: LinkedAccountRepository,
{
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed auth callback query");
            CallbackQuery::default()
        }
    };

    let request = CallbackRequest {
        code: query.code,
        next: query.next,
        code_verifier: cookie_value(&headers, PKCE_COOKIE),
    };

    let outcome = state.service.complete_callback(request).await;
    let location = outcome.location(state.public_origin.as_str());

    see_other(&location, clear_pkce_cookie(state.secure_cookies))
}

/// Start the provider consent flow with a fresh PKCE pair.
async fn connect<A, G, R>(State(state): State<AccountsState<A, G, R>>) -> AccountResult<Response>
where
    A: AuthSessionProvider,
    G: SocialGraph,
    R: LinkedAccountRepository,
{
    let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
    let redirect_to = format!("{}/api/auth/callback", state.public_origin.as_str());

    let authorize_url = state
        .service
        .auth()
        .authorize_url(&redirect_to, challenge.as_str())?;

    let secure = if state.secure_cookies { " Secure;" } else { "" };
    let cookie = format!(
        "{}={}; HttpOnly;{} SameSite=Lax; Path=/api/auth; Max-Age={}",
        PKCE_COOKIE,
        verifier.secret(),
        secure,
        PKCE_COOKIE_MAX_AGE
    );
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| AccountError::Internal(format!("Failed to create cookie: {}", e)))?;

    Ok(see_other(&authorize_url, cookie))
}

async fn list_linked_accounts<A, G, R>(
    State(state): State<AccountsState<A, G, R>>,
    UuidPath([user_id]): UuidPath<1>,
) -> AccountResult<Json<Vec<LinkedAccountResponse>>>
where
    A: AuthSessionProvider,
    G: SocialGraph,
    R: LinkedAccountRepository,
{
    let accounts = state.service.list_linked_accounts(user_id).await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

async fn unlink_account<A, G, R>(
    State(state): State<AccountsState<A, G, R>>,
    UuidPath([user_id, id]): UuidPath<2>,
) -> AccountResult<StatusCode>
where
    A: AuthSessionProvider,
    G: SocialGraph,
    R: LinkedAccountRepository,
{
    state.service.unlink_account(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn see_other(location: &str, cookie: HeaderValue) -> Response {
    match HeaderValue::from_str(location) {
        Ok(location) => (
            StatusCode::SEE_OTHER,
            AppendHeaders([(header::LOCATION, location), (header::SET_COOKIE, cookie)]),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Invalid redirect location, falling back to site root");
            (
                StatusCode::SEE_OTHER,
                AppendHeaders([
                    (header::LOCATION, HeaderValue::from_static("/")),
                    (header::SET_COOKIE, cookie),
                ]),
            )
                .into_response()
        }
    }
}

fn clear_pkce_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("cf_pkce_verifier=; HttpOnly; Secure; SameSite=Lax; Path=/api/auth; Max-Age=0")
    } else {
        HeaderValue::from_static("cf_pkce_verifier=; HttpOnly; SameSite=Lax; Path=/api/auth; Max-Age=0")
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}

/// Account routes, to be nested under `/api`.
pub fn router<A, G, R>(state: AccountsState<A, G, R>) -> Router
where
    A: AuthSessionProvider + 'static,
    G: SocialGraph + 'static,
    R: LinkedAccountRepository + 'static,
{
    Router::new()
        .route("/auth/callback", get(callback::<A, G, R>))
        .route("/auth/connect", get(connect::<A, G, R>))
        .route(
            "/users/{user_id}/linked-accounts",
            get(list_linked_accounts::<A, G, R>),
        )
        .route(
            "/users/{user_id}/linked-accounts/{id}",
            delete(unlink_account::<A, G, R>),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; cf_pkce_verifier=abc123; other=1"),
        );
        assert_eq!(cookie_value(&headers, PKCE_COOKIE).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cookie_value_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(cookie_value(&headers, PKCE_COOKIE), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("cf_pkce_verifier="));
        assert_eq!(cookie_value(&headers, PKCE_COOKIE), None);
    }

    #[test]
    fn test_see_other_falls_back_to_root_on_bad_location() {
        let response = see_other("/settings\nX: y", clear_pkce_cookie(false));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert!(response.headers().contains_key(header::SET_COOKIE));

        let response = see_other("https://app.example.com/settings", clear_pkce_cookie(false));
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://app.example.com/settings"
        );
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_pkce_cookie(true);
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("cf_pkce_verifier=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Secure"));
        assert!(!clear_pkce_cookie(false).to_str().unwrap().contains("Secure"));
    }
}
