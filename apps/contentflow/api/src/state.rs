//! Shared application state.

use database::postgres::DatabaseConnection;
use domain_accounts::{
    AccountLinkingService, GraphApiClient, HostedAuthClient, PgLinkedAccountRepository,
};

pub type LinkingService =
    AccountLinkingService<HostedAuthClient, GraphApiClient, PgLinkedAccountRepository>;

/// Cloned per handler; everything inside is an `Arc` or a pooled connection.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub db: DatabaseConnection,
    pub linking: LinkingService,
}

impl AppState {
    pub fn new(config: crate::config::Config, db: DatabaseConnection) -> eyre::Result<Self> {
        let auth = HostedAuthClient::new(config.hosted_auth.clone())?;
        let graph = GraphApiClient::new(config.graph.clone())?;
        let repository = PgLinkedAccountRepository::new(db.clone());

        let linking =
            AccountLinkingService::new(auth, graph, repository, config.linking.clone());

        Ok(Self {
            config,
            db,
            linking,
        })
    }
}
