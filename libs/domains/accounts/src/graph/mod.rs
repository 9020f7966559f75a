//! Social-graph access: the pages a user manages, the business account behind
//! each page, and that account's public profile.

mod client;

pub use client::GraphApiClient;

use async_trait::async_trait;

use crate::error::GraphResult;
use crate::models::{AccountDetail, BusinessAccountRef, RemotePage};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialGraph: Send + Sync {
    /// Pages the token's owner manages. An empty list is not an error.
    async fn list_managed_pages(&self, access_token: &str) -> GraphResult<Vec<RemotePage>>;

    /// `None` when the page has no business account attached.
    async fn linked_business_account(
        &self,
        page_id: &str,
        access_token: &str,
    ) -> GraphResult<Option<BusinessAccountRef>>;

    async fn account_detail(
        &self,
        remote_account_id: &str,
        access_token: &str,
    ) -> GraphResult<AccountDetail>;
}
