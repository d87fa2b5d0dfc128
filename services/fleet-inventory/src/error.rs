//! Error Types
//!
//! Typed failures for credential loading and cloud API access. Orchestration
//! code wraps these in `anyhow` with the folder/cluster being processed.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving credentials, before any network call
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Both a key file and an OAuth token were supplied
    #[error("Conflicting credentials: use either --sa-json-path or --token, not both")]
    Conflicting,

    /// Neither a key file nor an OAuth token was supplied
    #[error("Missing credentials: one of --sa-json-path or --token is required")]
    Missing,

    /// Key file could not be read
    #[error("Failed to read service account key {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key file is not valid service account key JSON
    #[error("Malformed service account key {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Private key could not be used for signing
    #[error("Unusable private key for key {key_id}: {source}")]
    InvalidKey {
        key_id: String,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

/// Errors raised by calls to the cloud control plane
#[derive(Debug, Error)]
pub enum CloudError {
    /// Request could not be sent or the body could not be read
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status that is not retried
    #[error("Cloud API error ({status}) from {url}: {message}")]
    Api {
        url: String,
        status: reqwest::StatusCode,
        message: String,
    },

    /// Retry budget exhausted on a retriable status
    #[error("Service unavailable at {url} after {attempts} attempts: {message}")]
    Unavailable {
        url: String,
        attempts: u32,
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Server handed back the page token it was just given
    #[error("Pagination stalled: server repeated page token {token:?}")]
    PaginationStalled { token: String },

    /// JWT for the token exchange could not be produced
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl CloudError {
    /// Whether the failure is an authentication or authorization rejection
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            CloudError::Api { status, .. }
                if *status == reqwest::StatusCode::UNAUTHORIZED
                    || *status == reqwest::StatusCode::FORBIDDEN
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_classification() {
        let err = CloudError::Api {
            url: "https://example.test".to_string(),
            status: reqwest::StatusCode::UNAUTHORIZED,
            message: "bad token".to_string(),
        };
        assert!(err.is_auth());

        let err = CloudError::PaginationStalled {
            token: "abc".to_string(),
        };
        assert!(!err.is_auth());
    }

    #[test]
    fn test_unavailable_message_names_attempts() {
        let err = CloudError::Unavailable {
            url: "https://example.test/folders".to_string(),
            attempts: 6,
            message: "503 Service Unavailable".to_string(),
        };
        assert!(err.to_string().contains("after 6 attempts"));
    }
}
