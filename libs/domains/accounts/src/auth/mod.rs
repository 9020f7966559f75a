//! Hosted auth backend: code-for-session exchange and the authorize redirect.

mod hosted;

pub use hosted::HostedAuthClient;

use async_trait::async_trait;

use crate::error::AccountResult;
use crate::models::{CodeExchange, ProviderSession};

/// Scopes requested from the social provider when connecting.
pub const CONNECT_SCOPES: &str = "instagram_basic,instagram_content_publish,pages_show_list,pages_read_engagement,instagram_manage_insights";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthSessionProvider: Send + Sync {
    /// Exchange an authorization code for a session.
    ///
    /// A session without a provider token is
    /// [`AccountError::MissingProviderToken`](crate::error::AccountError::MissingProviderToken).
    async fn exchange(&self, request: CodeExchange) -> AccountResult<ProviderSession>;

    /// URL that starts the provider consent flow and returns to `redirect_to`.
    fn authorize_url(&self, redirect_to: &str, code_challenge: &str) -> AccountResult<String>;
}
