use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthSessionProvider;
use crate::config::LinkingConfig;
use crate::error::{AccountError, AccountResult, GraphError, GraphResult};
use crate::graph::SocialGraph;
use crate::models::{CodeExchange, LinkedAccount, ProviderSession, RemotePage, UpsertLinkedAccount};
use crate::report::{LinkReport, PageOutcome, PageReport};
use crate::repository::LinkedAccountRepository;

/// Query parameters of the redirect callback, plus the PKCE verifier cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackRequest {
    pub code: Option<String>,
    pub next: Option<String>,
    pub code_verifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Session established. Linking may still have skipped some pages.
    Success { next: String, report: LinkReport },
    /// No usable session. `destination` never carries error detail.
    Failure { destination: String },
}

impl CallbackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallbackOutcome::Success { .. })
    }

    /// Absolute redirect target under `origin`.
    pub fn location(&self, origin: &str) -> String {
        let path = match self {
            CallbackOutcome::Success { next, .. } => next,
            CallbackOutcome::Failure { destination } => destination,
        };
        format!("{}{}", origin.trim_end_matches('/'), path)
    }
}

/// Keep `next` only when it is a same-origin relative path that is safe to
/// put in a `Location` header.
pub fn sanitize_next(next: Option<&str>, default: &str) -> String {
    match next {
        Some(path)
            if path.starts_with('/')
                && path.is_ascii()
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.chars().any(char::is_control) =>
        {
            path.to_string()
        }
        _ => default.to_string(),
    }
}

/// Orchestrates the account-linking flow and linked-account management.
///
/// Collaborators are injected. Provider failures during discovery are
/// recorded per page and never abort the run.
pub struct AccountLinkingService<A, G, R>
where
    A: AuthSessionProvider,
    G: SocialGraph,
    R: LinkedAccountRepository,
{
    auth: Arc<A>,
    graph: Arc<G>,
    repository: Arc<R>,
    config: LinkingConfig,
}

impl<A, G, R> Clone for AccountLinkingService<A, G, R>
where
    A: AuthSessionProvider,
    G: SocialGraph,
    R: LinkedAccountRepository,
{
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            graph: Arc::clone(&self.graph),
            repository: Arc::clone(&self.repository),
            config: self.config.clone(),
        }
    }
}

impl<A, G, R> AccountLinkingService<A, G, R>
where
    A: AuthSessionProvider,
    G: SocialGraph,
    R: LinkedAccountRepository,
{
    pub fn new(auth: A, graph: G, repository: R, config: LinkingConfig) -> Self {
        Self {
            auth: Arc::new(auth),
            graph: Arc::new(graph),
            repository: Arc::new(repository),
            config,
        }
    }

    pub fn config(&self) -> &LinkingConfig {
        &self.config
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    /// Handle the provider redirect: exchange the code, then link accounts.
    ///
    /// Graph and store are only touched once a session with a provider token exists.
    pub async fn complete_callback(&self, request: CallbackRequest) -> CallbackOutcome {
        let failure = || CallbackOutcome::Failure {
            destination: self.config.failure_path.clone(),
        };

        let Some(code) = request.code.filter(|c| !c.trim().is_empty()) else {
            tracing::warn!("Auth callback without authorization code");
            return failure();
        };

        let next = sanitize_next(request.next.as_deref(), &self.config.success_path);

        let session = match self
            .auth
            .exchange(CodeExchange {
                code,
                code_verifier: request.code_verifier,
            })
            .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Code exchange failed");
                return failure();
            }
        };

        if session.provider_access_token.trim().is_empty() {
            tracing::warn!(user_id = %session.user_id, "{}", AccountError::MissingProviderToken);
            return failure();
        }

        let report = self.link_accounts(&session).await;

        CallbackOutcome::Success { next, report }
    }

    /// Discover every business account reachable through the session and upsert it.
    ///
    /// Never fails: a listing error yields an empty report, and per-page
    /// failures are recorded without stopping the remaining pages.
    pub async fn link_accounts(&self, session: &ProviderSession) -> LinkReport {
        let token = session.provider_access_token.as_str();

        let pages = match self.bounded(self.graph.list_managed_pages(token)).await {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(user_id = %session.user_id, error = %e, "Failed to list managed pages");
                return LinkReport::listing_failed(&e);
            }
        };

        if pages.is_empty() {
            tracing::info!(user_id = %session.user_id, "No managed pages to link");
        }

        let report: LinkReport = futures::stream::iter(pages)
            .map(|page| self.link_page(session, page))
            .buffered(self.config.page_concurrency.max(1))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect();

        tracing::info!(
            user_id = %session.user_id,
            pages_seen = report.pages_seen,
            accounts_found = report.accounts_found,
            accounts_persisted = report.accounts_persisted,
            accounts_skipped = report.accounts_skipped,
            "Account linking finished"
        );

        report
    }

    async fn link_page(&self, session: &ProviderSession, page: RemotePage) -> PageReport {
        let token = session.provider_access_token.as_str();
        let page_id = page.page_id;

        let account = match self
            .bounded(self.graph.linked_business_account(&page_id, token))
            .await
        {
            Ok(Some(account)) => account,
            Ok(None) => {
                tracing::debug!(page_id = %page_id, "Page has no business account");
                return PageReport::new(page_id, PageOutcome::NoBusinessAccount);
            }
            Err(e) => {
                tracing::warn!(page_id = %page_id, error = %e, "Business account lookup failed");
                return PageReport::new(page_id, PageOutcome::lookup_failed(&e));
            }
        };

        let remote_account_id = account.remote_account_id.clone();

        let detail = match self
            .bounded(self.graph.account_detail(&remote_account_id, token))
            .await
        {
            Ok(detail) => detail,
            Err(e) => {
                tracing::warn!(
                    page_id = %page_id,
                    remote_account_id = %remote_account_id,
                    error = %e,
                    "Account detail fetch failed"
                );
                return PageReport::new(
                    page_id,
                    PageOutcome::DetailFailed {
                        remote_account_id,
                        error: e.to_string(),
                    },
                );
            }
        };

        let input = UpsertLinkedAccount::from_detail(session.user_id, account, detail, token);

        // Store writes share the provider call budget
        let persisted =
            tokio::time::timeout(self.config.request_timeout, self.repository.upsert(input))
                .await
                .unwrap_or_else(|_| {
                    Err(AccountError::Internal("Linked account write timed out".to_string()))
                });

        match persisted {
            Ok(linked) => PageReport::new(
                page_id,
                PageOutcome::Linked {
                    account_id: linked.id,
                    remote_account_id,
                },
            ),
            Err(e) => {
                tracing::error!(
                    page_id = %page_id,
                    remote_account_id = %remote_account_id,
                    error = %e,
                    "Failed to persist linked account"
                );
                PageReport::new(
                    page_id,
                    PageOutcome::PersistFailed {
                        remote_account_id,
                        error: e.to_string(),
                    },
                )
            }
        }
    }

    async fn bounded<T>(&self, call: impl Future<Output = GraphResult<T>>) -> GraphResult<T> {
        tokio::time::timeout(self.config.request_timeout, call)
            .await
            .unwrap_or(Err(GraphError::Timeout))
    }

    pub async fn list_linked_accounts(&self, user_id: Uuid) -> AccountResult<Vec<LinkedAccount>> {
        self.repository.list_by_user(user_id).await
    }

    /// Delete a linked account, verifying it belongs to `user_id`.
    pub async fn unlink_account(&self, user_id: Uuid, id: Uuid) -> AccountResult<()> {
        let account = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id))?;

        if account.user_id != user_id {
            return Err(AccountError::Forbidden(id));
        }

        if !self.repository.delete(id).await? {
            return Err(AccountError::NotFound(id));
        }

        tracing::info!(user_id = %user_id, account_id = %id, "Unlinked account");
        Ok(())
    }
}
