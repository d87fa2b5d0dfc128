//! IAM Token Exchange
//!
//! Exchanges either a signed service-account JWT or a user OAuth token for
//! a short-lived IAM bearer token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::CloudClient;
use crate::auth::{sign_jwt, unix_now, ServiceAccountKey};
use crate::error::CloudError;

/// Where the run's IAM token comes from
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// Sign a JWT with this key and exchange it
    ServiceAccount(ServiceAccountKey),
    /// Exchange a user OAuth token
    OAuth(String),
    /// Use an already issued token as-is
    Static(IamToken),
}

/// Short-lived IAM bearer credential
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamToken {
    pub iam_token: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for IamToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamToken")
            .field("iam_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl IamToken {
    pub fn new(iam_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            iam_token: iam_token.into(),
            expires_at,
        }
    }
}

/// Body of the token-creation call
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum CreateTokenRequest<'a> {
    Jwt {
        jwt: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    OAuth {
        yandex_passport_oauth_token: &'a str,
    },
}

impl CloudClient {
    /// Sign a JWT with the service account key and exchange it for a token
    pub async fn mint_token(&self, key: &ServiceAccountKey) -> Result<IamToken, CloudError> {
        let audience = &self.endpoints().iam_token_url;
        let jwt = sign_jwt(key, audience, unix_now())?;

        debug!(
            service_account_id = %key.service_account_id,
            key_id = %key.id,
            "Exchanging signed JWT for IAM token"
        );

        let token: IamToken = self
            .post_json(audience, &CreateTokenRequest::Jwt { jwt: &jwt })
            .await?;

        info!(
            service_account_id = %key.service_account_id,
            expires_at = %token.expires_at,
            "🔑 IAM token minted"
        );
        Ok(token)
    }

    /// Exchange a user OAuth token for an IAM token
    pub async fn exchange_oauth_token(&self, oauth_token: &str) -> Result<IamToken, CloudError> {
        debug!("Exchanging OAuth token for IAM token");

        let request = CreateTokenRequest::OAuth {
            yandex_passport_oauth_token: oauth_token,
        };
        let token: IamToken = self
            .post_json(&self.endpoints().iam_token_url, &request)
            .await?;

        info!(expires_at = %token.expires_at, "🔑 IAM token obtained from OAuth token");
        Ok(token)
    }

    pub(super) async fn obtain_token(&self) -> Result<IamToken, CloudError> {
        match &self.source {
            TokenSource::ServiceAccount(key) => self.mint_token(key).await,
            TokenSource::OAuth(oauth_token) => self.exchange_oauth_token(oauth_token).await,
            TokenSource::Static(token) => Ok(token.clone()),
        }
    }
}
