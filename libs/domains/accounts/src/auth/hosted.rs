use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthSessionProvider, CONNECT_SCOPES};
use crate::config::HostedAuthConfig;
use crate::error::{AccountError, AccountResult};
use crate::models::{CodeExchange, ProviderSession};

const PROVIDER: &str = "facebook";

/// [`AuthSessionProvider`] for a GoTrue-compatible hosted auth service.
#[derive(Clone)]
pub struct HostedAuthClient {
    http_client: Client,
    config: HostedAuthConfig,
}

#[derive(Debug, Serialize)]
struct PkceGrant<'a> {
    auth_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_verifier: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    provider_token: Option<String>,
    user: SessionUser,
}

#[derive(Debug, Deserialize)]
struct SessionUser {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    #[serde(alias = "error_description", alias = "msg")]
    message: Option<String>,
}

impl HostedAuthClient {
    pub fn new(config: HostedAuthConfig) -> AccountResult<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AccountError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl AuthSessionProvider for HostedAuthClient {
    async fn exchange(&self, request: CodeExchange) -> AccountResult<ProviderSession> {
        let response = self
            .http_client
            .post(format!("{}/auth/v1/token", self.config.url))
            .query(&[("grant_type", "pkce")])
            .header("apikey", &self.config.anon_key)
            .json(&PkceGrant {
                auth_code: &request.code,
                code_verifier: request.code_verifier.as_deref(),
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AccountError::Exchange("Hosted auth request timed out".to_string())
                } else {
                    AccountError::Exchange(format!("Hosted auth request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<AuthErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.to_string());
            return Err(AccountError::Exchange(format!(
                "Hosted auth returned {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| AccountError::Exchange(format!("Failed to parse session: {}", e)))?;

        let provider_access_token = session
            .provider_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(AccountError::MissingProviderToken)?;

        tracing::debug!(user_id = %session.user.id, "Exchanged authorization code");

        Ok(ProviderSession {
            user_id: session.user.id,
            provider_access_token,
        })
    }

    fn authorize_url(&self, redirect_to: &str, code_challenge: &str) -> AccountResult<String> {
        if code_challenge.is_empty() {
            return Err(AccountError::Validation("PKCE challenge is empty".to_string()));
        }

        let params = [
            ("provider", PROVIDER),
            ("redirect_to", redirect_to),
            ("scopes", CONNECT_SCOPES),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "s256"),
            ("auth_type", "rerequest"),
            ("display", "popup"),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!("{}/auth/v1/authorize?{}", self.config.url, query))
    }
}
