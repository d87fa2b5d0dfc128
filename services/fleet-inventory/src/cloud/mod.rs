//! Cloud Control-Plane Client
//!
//! REST client for the resource-manager, managed Kubernetes and IAM APIs.
//! Every request goes through the shared [`RetryPolicy`] and, apart from
//! the token exchange itself, carries the run's IAM token.

pub mod iam;
pub mod kubernetes;
pub mod resource_manager;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::auth::{Credential, ServiceAccountKey};
use crate::error::CloudError;
use crate::pager::{Page, PageSource};
use crate::retry::RetryPolicy;

pub use iam::{IamToken, TokenSource};
pub use kubernetes::{Cluster, EndpointKind};
pub use resource_manager::Folder;

pub const DEFAULT_IAM_TOKEN_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";
pub const DEFAULT_RESOURCE_MANAGER_URL: &str =
    "https://resource-manager.api.cloud.yandex.net/resource-manager/v1";
pub const DEFAULT_KUBERNETES_URL: &str = "https://mks.api.cloud.yandex.net/managed-kubernetes/v1";

const USER_AGENT: &str = concat!("fleet-inventory/", env!("CARGO_PKG_VERSION"));

/// Base URLs of the cloud APIs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Token-issuance URL; also the JWT audience
    pub iam_token_url: String,
    pub resource_manager: String,
    pub kubernetes: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            iam_token_url: DEFAULT_IAM_TOKEN_URL.to_string(),
            resource_manager: DEFAULT_RESOURCE_MANAGER_URL.to_string(),
            kubernetes: DEFAULT_KUBERNETES_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// All three APIs served from one base URL (mock servers, proxies)
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            iam_token_url: format!("{}/iam/v1/tokens", base),
            resource_manager: format!("{}/resource-manager/v1", base),
            kubernetes: format!("{}/managed-kubernetes/v1", base),
        }
    }
}

/// Client settings independent of the credential
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    pub retry: RetryPolicy,
    /// Forwarded as `pageSize` on list calls
    pub page_size: Option<u32>,
}

/// Authenticated cloud API client
pub struct CloudClient {
    http: Client,
    config: ClientConfig,
    source: TokenSource,
    token: OnceCell<IamToken>,
}

/// Error body returned by the cloud APIs
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

impl CloudClient {
    /// Build a client; no request is sent until the first API call
    pub fn new(source: TokenSource, config: ClientConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            config,
            source,
            token: OnceCell::new(),
        })
    }

    /// Build a client from a resolved CLI credential
    ///
    /// Reads the key file for service account credentials; does not touch
    /// the network.
    pub fn from_credential(credential: &Credential, config: ClientConfig) -> anyhow::Result<Self> {
        let source = match credential {
            Credential::ServiceAccountFile(path) => {
                TokenSource::ServiceAccount(ServiceAccountKey::from_file(path)?)
            }
            Credential::OAuthToken(token) => TokenSource::OAuth(token.clone()),
        };
        Self::new(source, config)
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.config.endpoints
    }

    /// The run's IAM token, obtained on first use and then reused
    pub async fn iam_token(&self) -> Result<&IamToken, CloudError> {
        self.token
            .get_or_try_init(|| async {
                let token = self.obtain_token().await?;
                debug!(expires_at = %token.expires_at, "IAM token obtained");
                Ok::<_, CloudError>(token)
            })
            .await
    }

    /// Authenticated GET decoded as JSON
    pub(crate) async fn get_json<T>(&self, url: &str, query: &[(&str, String)]) -> Result<T, CloudError>
    where
        T: DeserializeOwned,
    {
        let token = self.iam_token().await?;

        let response = self
            .config
            .retry
            .execute(url, || {
                self.http
                    .get(url)
                    .query(query)
                    .bearer_auth(&token.iam_token)
            })
            .await?;

        decode(url, response).await
    }

    /// Unauthenticated POST decoded as JSON
    pub(crate) async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, CloudError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .config
            .retry
            .execute(url, || self.http.post(url).json(body))
            .await?;

        decode(url, response).await
    }

    /// Paginated list under `url`, scoped by one query parameter
    pub fn list_pages<R>(&self, url: String, scope: (&'static str, String)) -> ListPages<'_, R>
    where
        R: ListResponse,
    {
        ListPages {
            client: self,
            url,
            scope,
            _response: PhantomData,
        }
    }
}

/// Turn a response into `T`, or into a typed error for non-success statuses
async fn decode<T>(url: &str, response: Response) -> Result<T, CloudError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|source| CloudError::Transport {
            url: url.to_string(),
            source,
        })?;

    if !status.is_success() {
        return Err(CloudError::Api {
            url: url.to_string(),
            status,
            message: error_message(&body),
        });
    }

    serde_json::from_slice(&body).map_err(|source| CloudError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Server-provided message if the body is a JSON error, raw text otherwise
fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            message: Some(message),
            code,
        }) => match code {
            Some(code) => format!("{} (code {})", message, code),
            None => message,
        },
        _ => String::from_utf8_lossy(body).trim().to_string(),
    }
}

/// A list response that can be split into a page
pub trait ListResponse: DeserializeOwned + Send + 'static {
    type Item: Send;

    fn into_page(self) -> Page<Self::Item>;
}

/// Page source over a cloud list endpoint
pub struct ListPages<'a, R> {
    client: &'a CloudClient,
    url: String,
    scope: (&'static str, String),
    _response: PhantomData<fn() -> R>,
}

#[async_trait]
impl<R> PageSource for ListPages<'_, R>
where
    R: ListResponse,
{
    type Item = R::Item;
    type Error = CloudError;

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<Page<R::Item>, CloudError> {
        let mut query = vec![(self.scope.0, self.scope.1.clone())];
        if let Some(size) = self.client.config.page_size {
            query.push(("pageSize", size.to_string()));
        }
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        debug!(url = %self.url, scope = %self.scope.1, page_token = ?page_token, "Fetching page");

        let response: R = self.client.get_json(&self.url, &query).await?;
        Ok(response.into_page())
    }

    fn stalled(&self, token: &str) -> CloudError {
        CloudError::PaginationStalled {
            token: token.to_string(),
        }
    }
}
