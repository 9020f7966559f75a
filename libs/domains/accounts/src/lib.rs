//! Accounts Domain
//!
//! Links social business accounts to platform users after the OAuth redirect,
//! and lets users list or disconnect them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Handlers   │  ← /auth/callback, /auth/connect, linked-account CRUD
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │   Service    │  ← code exchange, discovery fold, upsert
//! └──┬───┬───┬───┘
//!    │   │   │
//!    │   │   └──► LinkedAccountRepository (Postgres / in-memory)
//!    │   └──────► SocialGraph (Graph API)
//!    └──────────► AuthSessionProvider (hosted auth)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_accounts::{
//!     AccountLinkingService, AccountsState, GraphApiClient, HostedAuthClient,
//!     InMemoryLinkedAccountRepository, LinkingConfig, handlers,
//!     config::{GraphConfig, HostedAuthConfig, PublicOrigin},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = AccountLinkingService::new(
//!     HostedAuthClient::new(HostedAuthConfig::new("https://auth.example.com", "anon-key"))?,
//!     GraphApiClient::new(GraphConfig::default())?,
//!     InMemoryLinkedAccountRepository::new(),
//!     LinkingConfig::default(),
//! );
//!
//! let router = handlers::router(AccountsState {
//!     service,
//!     public_origin: PublicOrigin::parse("http://localhost:3000")?,
//!     secure_cookies: false,
//! });
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod entity;
pub mod error;
pub mod graph;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod report;
pub mod repository;
pub mod service;

pub use auth::{AuthSessionProvider, HostedAuthClient};
pub use config::{LinkingConfig, PublicOrigin};
pub use error::{AccountError, AccountResult, GraphError, GraphResult};
pub use graph::{GraphApiClient, SocialGraph};
pub use handlers::AccountsState;
pub use models::{
    AccountDetail, BusinessAccountRef, CodeExchange, LinkedAccount, LinkedAccountResponse,
    ProviderSession, RemotePage, UpsertLinkedAccount,
};
pub use postgres::PgLinkedAccountRepository;
pub use report::{LinkReport, PageOutcome, PageReport};
pub use repository::{InMemoryLinkedAccountRepository, LinkedAccountRepository};
pub use service::{AccountLinkingService, CallbackOutcome, CallbackRequest};
