use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::SocialGraph;
use crate::config::GraphConfig;
use crate::error::{GraphError, GraphResult};
use crate::models::{AccountDetail, BusinessAccountRef, RemotePage};

/// reqwest-backed [`SocialGraph`] for the Graph API.
///
/// The token travels as the `access_token` query parameter. Every request is
/// bounded by [`GraphConfig::request_timeout`].
#[derive(Clone)]
pub struct GraphApiClient {
    client: Client,
    config: GraphConfig,
}

#[derive(Debug, Deserialize)]
struct PagesEnvelope {
    #[serde(default)]
    data: Vec<RemotePage>,
}

#[derive(Debug, Deserialize)]
struct PageFields {
    instagram_business_account: Option<BusinessAccountRef>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GraphApiClient {
    pub fn new(config: GraphConfig) -> GraphResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GraphError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.config.base_url, self.config.version, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: Option<&str>,
        access_token: &str,
    ) -> GraphResult<T> {
        let mut query: Vec<(&str, &str)> = Vec::with_capacity(2);
        if let Some(fields) = fields {
            query.push(("fields", fields));
        }
        query.push(("access_token", access_token));

        let response = self.client.get(self.url(path)).query(&query).send().await?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> GraphResult<T> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        return Err(GraphError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&body).map_err(|e| GraphError::Decode(e.to_string()))
}

#[async_trait]
impl SocialGraph for GraphApiClient {
    async fn list_managed_pages(&self, access_token: &str) -> GraphResult<Vec<RemotePage>> {
        let envelope: PagesEnvelope = self.get("me/accounts", None, access_token).await?;
        Ok(envelope.data)
    }

    async fn linked_business_account(
        &self,
        page_id: &str,
        access_token: &str,
    ) -> GraphResult<Option<BusinessAccountRef>> {
        let fields: PageFields = self
            .get(
                &urlencoding::encode(page_id),
                Some("instagram_business_account"),
                access_token,
            )
            .await?;
        Ok(fields.instagram_business_account)
    }

    async fn account_detail(
        &self,
        remote_account_id: &str,
        access_token: &str,
    ) -> GraphResult<AccountDetail> {
        self.get(
            &urlencoding::encode(remote_account_id),
            Some("username,name,profile_picture_url"),
            access_token,
        )
        .await
    }
}
