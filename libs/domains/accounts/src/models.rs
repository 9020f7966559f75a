use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Result of exchanging an authorization code with the hosted auth backend.
///
/// Lives only for one callback invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub user_id: Uuid,
    pub provider_access_token: String,
}

impl fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSession")
            .field("user_id", &self.user_id)
            .field("provider_access_token", &"[REDACTED]")
            .finish()
    }
}

/// Input to [`AuthSessionProvider::exchange`](crate::auth::AuthSessionProvider::exchange).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeExchange {
    pub code: String,
    pub code_verifier: Option<String>,
}

/// A page the user manages on the social graph.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemotePage {
    #[serde(rename = "id")]
    pub page_id: String,
}

impl RemotePage {
    pub fn new(page_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
        }
    }
}

/// Business account attached to a page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BusinessAccountRef {
    #[serde(rename = "id")]
    pub remote_account_id: String,
}

impl BusinessAccountRef {
    pub fn new(remote_account_id: impl Into<String>) -> Self {
        Self {
            remote_account_id: remote_account_id.into(),
        }
    }
}

/// Public profile of a business account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountDetail {
    #[serde(rename = "username")]
    pub handle: String,
    #[serde(rename = "name")]
    pub display_name: Option<String>,
    #[serde(rename = "profile_picture_url")]
    pub avatar_url: Option<String>,
}

/// A business account linked to a platform user. One row per `remote_account_id`.
#[derive(Clone, PartialEq, Eq)]
pub struct LinkedAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub remote_account_id: String,
    pub handle: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for LinkedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedAccount")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("remote_account_id", &self.remote_account_id)
            .field("handle", &self.handle)
            .field("display_name", &self.display_name)
            .field("avatar_url", &self.avatar_url)
            .field("access_token", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Insert-or-refresh payload keyed by `remote_account_id`.
#[derive(Clone, PartialEq, Eq)]
pub struct UpsertLinkedAccount {
    pub user_id: Uuid,
    pub remote_account_id: String,
    pub handle: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub access_token: String,
    pub updated_at: DateTime<Utc>,
}

impl UpsertLinkedAccount {
    pub fn from_detail(
        user_id: Uuid,
        account: BusinessAccountRef,
        detail: AccountDetail,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            remote_account_id: account.remote_account_id,
            handle: detail.handle,
            display_name: detail.display_name,
            avatar_url: detail.avatar_url,
            access_token: access_token.into(),
            updated_at: Utc::now(),
        }
    }

    /// Build a fresh row. Used when no row exists for `remote_account_id`.
    pub fn into_new_account(self) -> LinkedAccount {
        LinkedAccount {
            id: Uuid::now_v7(),
            user_id: self.user_id,
            remote_account_id: self.remote_account_id,
            handle: self.handle,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            access_token: self.access_token,
            created_at: self.updated_at,
            updated_at: self.updated_at,
        }
    }
}

impl fmt::Debug for UpsertLinkedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpsertLinkedAccount")
            .field("user_id", &self.user_id)
            .field("remote_account_id", &self.remote_account_id)
            .field("handle", &self.handle)
            .field("access_token", &"[REDACTED]")
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl LinkedAccount {
    /// Overwrite the refreshable columns. `id` and `created_at` are kept.
    pub fn refresh(&mut self, input: UpsertLinkedAccount) {
        self.user_id = input.user_id;
        self.handle = input.handle;
        self.display_name = input.display_name;
        self.avatar_url = input.avatar_url;
        self.access_token = input.access_token;
        self.updated_at = input.updated_at;
    }
}

/// Outward JSON view of a [`LinkedAccount`]. Never carries the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedAccountResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub remote_account_id: String,
    pub handle: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LinkedAccount> for LinkedAccountResponse {
    fn from(account: LinkedAccount) -> Self {
        Self {
            id: account.id,
            user_id: account.user_id,
            remote_account_id: account.remote_account_id,
            handle: account.handle,
            display_name: account.display_name,
            avatar_url: account.avatar_url,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_upsert() -> UpsertLinkedAccount {
        UpsertLinkedAccount::from_detail(
            Uuid::now_v7(),
            BusinessAccountRef::new("IG1"),
            AccountDetail {
                handle: "brand_one".to_string(),
                display_name: Some("Brand One".to_string()),
                avatar_url: None,
            },
            "T1",
        )
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = ProviderSession {
            user_id: Uuid::nil(),
            provider_access_token: "EAAB-secret".to_string(),
        };
        let printed = format!("{:?}", session);
        assert!(!printed.contains("EAAB-secret"));
        assert!(printed.contains("REDACTED"));
    }

    #[test]
    fn test_response_omits_access_token() {
        let account = sample_upsert().into_new_account();
        let json = serde_json::to_value(LinkedAccountResponse::from(account)).unwrap();
        assert!(json.get("access_token").is_none());
        assert_eq!(json["handle"], "brand_one");
        assert!(!json.to_string().contains("T1"));
    }

    #[test]
    fn test_refresh_keeps_identity() {
        let mut account = sample_upsert().into_new_account();
        let id = account.id;
        let created_at = account.created_at;

        let mut again = sample_upsert();
        again.handle = "brand_renamed".to_string();
        again.access_token = "T2".to_string();
        account.refresh(again);

        assert_eq!(account.id, id);
        assert_eq!(account.created_at, created_at);
        assert_eq!(account.handle, "brand_renamed");
        assert_eq!(account.access_token, "T2");
    }

    #[test]
    fn test_detail_decodes_graph_field_names() {
        let detail: AccountDetail = serde_json::from_value(serde_json::json!({
            "id": "IG1",
            "username": "brand_one",
            "name": "Brand One",
            "profile_picture_url": "https://cdn.example.com/p.jpg"
        }))
        .unwrap();
        assert_eq!(detail.handle, "brand_one");
        assert_eq!(detail.display_name.as_deref(), Some("Brand One"));
    }
}
