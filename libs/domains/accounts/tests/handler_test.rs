//! Handler tests for the Accounts domain
//!
//! Drive the account router with in-process fakes for the hosted auth backend
//! and the social graph, and the in-memory repository.

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use domain_accounts::*;
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt; // For oneshot()
use uuid::Uuid;

const ORIGIN: &str = "http://localhost:3000";

#[derive(Clone)]
struct FakeAuth {
    sessions: HashMap<String, ProviderSession>,
    exchanges: Arc<AtomicUsize>,
    last_verifier: Arc<std::sync::Mutex<Option<String>>>,
}

#[async_trait]
impl AuthSessionProvider for FakeAuth {
    async fn exchange(&self, request: CodeExchange) -> AccountResult<ProviderSession> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        *self.last_verifier.lock().unwrap() = request.code_verifier;
        self.sessions
            .get(&request.code)
            .cloned()
            .ok_or_else(|| AccountError::Exchange("invalid grant".to_string()))
    }

    fn authorize_url(&self, redirect_to: &str, code_challenge: &str) -> AccountResult<String> {
        Ok(format!(
            "https://auth.example.com/auth/v1/authorize?redirect_to={}&code_challenge={}",
            urlencode(redirect_to),
            code_challenge
        ))
    }
}

fn urlencode(value: &str) -> String {
    value.replace(':', "%3A").replace('/', "%2F")
}

/// Pages keyed by id, each mapping to an optional business account.
#[derive(Clone, Default)]
struct FakeGraph {
    pages: Vec<(String, Option<String>)>,
    details: HashMap<String, AccountDetail>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SocialGraph for FakeGraph {
    async fn list_managed_pages(&self, _token: &str) -> GraphResult<Vec<RemotePage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pages.iter().map(|(id, _)| RemotePage::new(id.clone())).collect())
    }

    async fn linked_business_account(
        &self,
        page_id: &str,
        _token: &str,
    ) -> GraphResult<Option<BusinessAccountRef>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (_, account) = self
            .pages
            .iter()
            .find(|(id, _)| id == page_id)
            .ok_or_else(|| GraphError::Status {
                status: 404,
                message: "Unknown page".to_string(),
            })?;
        Ok(account.clone().map(BusinessAccountRef::new))
    }

    async fn account_detail(&self, remote_account_id: &str, _token: &str) -> GraphResult<AccountDetail> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .get(remote_account_id)
            .cloned()
            .ok_or_else(|| GraphError::Transport("connection reset".to_string()))
    }
}

struct Harness {
    app: Router,
    repository: InMemoryLinkedAccountRepository,
    exchanges: Arc<AtomicUsize>,
    graph_calls: Arc<AtomicUsize>,
    last_verifier: Arc<std::sync::Mutex<Option<String>>>,
}

fn harness(user_id: Uuid) -> Harness {
    let auth = FakeAuth {
        sessions: HashMap::from([(
            "abc".to_string(),
            ProviderSession {
                user_id,
                provider_access_token: "T1".to_string(),
            },
        )]),
        exchanges: Arc::new(AtomicUsize::new(0)),
        last_verifier: Arc::new(std::sync::Mutex::new(None)),
    };
    let graph = FakeGraph {
        pages: vec![
            ("P1".to_string(), Some("IG1".to_string())),
            ("P2".to_string(), None),
        ],
        details: HashMap::from([(
            "IG1".to_string(),
            AccountDetail {
                handle: "brand_one".to_string(),
                display_name: Some("Brand One".to_string()),
                avatar_url: None,
            },
        )]),
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let repository = InMemoryLinkedAccountRepository::new();

    let exchanges = auth.exchanges.clone();
    let last_verifier = auth.last_verifier.clone();
    let graph_calls = graph.calls.clone();

    let service = AccountLinkingService::new(auth, graph, repository.clone(), LinkingConfig::default());
    let app = handlers::router(AccountsState {
        service,
        public_origin: PublicOrigin::parse(ORIGIN).unwrap(),
        secure_cookies: false,
    });

    Harness {
        app,
        repository,
        exchanges,
        graph_calls,
        last_verifier,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_callback_links_account_and_redirects_to_settings() {
    let user_id = Uuid::now_v7();
    let h = harness(user_id);

    let response = h.app.oneshot(get("/auth/callback?code=abc")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "http://localhost:3000/settings");

    let accounts = h.repository.list_by_user(user_id).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].remote_account_id, "IG1");
    assert_eq!(accounts[0].handle, "brand_one");
    assert_eq!(accounts[0].access_token, "T1");
}

#[tokio::test]
async fn test_callback_forwards_pkce_cookie_and_clears_it() {
    let h = harness(Uuid::now_v7());

    let request = Request::builder()
        .uri("/auth/callback?code=abc&next=%2Flist")
        .header(header::COOKIE, "cf_pkce_verifier=verifier-xyz")
        .body(Body::empty())
        .unwrap();
    let response = h.app.oneshot(request).await.unwrap();

    assert_eq!(location(&response), "http://localhost:3000/list");
    assert_eq!(h.last_verifier.lock().unwrap().as_deref(), Some("verifier-xyz"));

    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("cf_pkce_verifier=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_callback_with_bad_code_redirects_to_failure() {
    let h = harness(Uuid::now_v7());

    let response = h.app.oneshot(get("/auth/callback?code=stale")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "http://localhost:3000/login?error=auth_failed");
    assert_eq!(h.exchanges.load(Ordering::SeqCst), 1);
    assert_eq!(h.graph_calls.load(Ordering::SeqCst), 0);
    assert!(h.repository.is_empty().await);
}

#[tokio::test]
async fn test_callback_without_code_skips_exchange() {
    let h = harness(Uuid::now_v7());

    let response = h
        .app
        .oneshot(get("/auth/callback?error=access_denied"))
        .await
        .unwrap();

    assert_eq!(location(&response), "http://localhost:3000/login?error=auth_failed");
    assert_eq!(h.exchanges.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_callback_ignores_off_site_next() {
    let h = harness(Uuid::now_v7());

    let response = h
        .app
        .oneshot(get("/auth/callback?code=abc&next=%2F%2Fevil.example"))
        .await
        .unwrap();

    assert_eq!(location(&response), "http://localhost:3000/settings");
}

#[tokio::test]
async fn test_connect_redirects_with_pkce_cookie() {
    let h = harness(Uuid::now_v7());

    let response = h.app.oneshot(get("/auth/connect")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response);
    assert!(target.starts_with("https://auth.example.com/auth/v1/authorize"));
    assert!(target.contains("redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fcallback"));
    assert!(target.contains("code_challenge="));

    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("cf_pkce_verifier="));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_list_linked_accounts_omits_tokens() {
    let user_id = Uuid::now_v7();
    let h = harness(user_id);

    h.app
        .clone()
        .oneshot(get("/auth/callback?code=abc"))
        .await
        .unwrap();

    let response = h
        .app
        .oneshot(get(&format!("/users/{}/linked-accounts", user_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let accounts = body.as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["handle"], "brand_one");
    assert!(accounts[0].get("access_token").is_none());
    assert!(!body.to_string().contains("T1"));
}

#[tokio::test]
async fn test_delete_linked_account() {
    let user_id = Uuid::now_v7();
    let h = harness(user_id);

    h.app
        .clone()
        .oneshot(get("/auth/callback?code=abc"))
        .await
        .unwrap();
    let account = h.repository.find_by_remote_id("IG1").await.unwrap();

    let delete = |owner: Uuid| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/users/{}/linked-accounts/{}", owner, account.id))
            .body(Body::empty())
            .unwrap()
    };

    let response = h.app.clone().oneshot(delete(Uuid::now_v7())).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = h.app.clone().oneshot(delete(user_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(h.repository.is_empty().await);

    let response = h.app.oneshot(delete(user_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_ids_are_json_errors() {
    let h = harness(Uuid::now_v7());

    let response = h
        .app
        .clone()
        .oneshot(get("/users/not-a-uuid/linked-accounts"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "INVALID_UUID");

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/users/{}/linked-accounts/42", Uuid::now_v7()))
        .body(Body::empty())
        .unwrap();
    let response = h.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "INVALID_UUID");
    assert!(body["message"].as_str().unwrap().contains("42"));
}
