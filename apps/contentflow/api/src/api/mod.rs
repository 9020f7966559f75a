use axum::Router;
use domain_accounts::{AccountsState, handlers};

use crate::state::AppState;

pub mod health;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper.
pub fn routes(state: &AppState) -> Router {
    handlers::router(AccountsState {
        service: state.linking.clone(),
        public_origin: state.config.public_origin.clone(),
        secure_cookies: state.config.environment.use_https(),
    })
}

/// Router with the `/ready` endpoint, merged next to the stateless app router.
pub fn ready_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
