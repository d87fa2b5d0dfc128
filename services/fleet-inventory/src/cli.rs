//! Command-line arguments shared by the binaries

use clap::{Args, Parser};
use std::path::PathBuf;

use crate::auth::Credential;
use crate::cloud::{
    ClientConfig, EndpointKind, Endpoints, DEFAULT_IAM_TOKEN_URL, DEFAULT_KUBERNETES_URL,
    DEFAULT_RESOURCE_MANAGER_URL,
};
use crate::error::CredentialError;
use crate::inventory::{DeploymentReportOptions, FolderFilter};
use crate::retry::{RetryPolicy, DEFAULT_MAX_RETRY_COUNT};

/// Cloud account and API settings
#[derive(Args, Debug, Clone)]
pub struct CloudArgs {
    /// Cloud ID whose folders are enumerated
    #[arg(long, env = "YC_CLOUD_ID")]
    pub cloud_id: String,

    /// Page size for folder and cluster list calls (server default if unset)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Retries on "service unavailable" after the first attempt
    #[arg(long, default_value_t = DEFAULT_MAX_RETRY_COUNT)]
    pub max_retries: u32,

    /// IAM token-issuance URL (also the JWT audience)
    #[arg(long, env = "YC_IAM_ENDPOINT", default_value = DEFAULT_IAM_TOKEN_URL)]
    pub iam_endpoint: String,

    /// Resource manager API base URL
    #[arg(long, env = "YC_RESOURCE_MANAGER_ENDPOINT", default_value = DEFAULT_RESOURCE_MANAGER_URL)]
    pub resource_manager_endpoint: String,

    /// Managed Kubernetes API base URL
    #[arg(long, env = "YC_MKS_ENDPOINT", default_value = DEFAULT_KUBERNETES_URL)]
    pub kubernetes_endpoint: String,
}

impl CloudArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoints: Endpoints {
                iam_token_url: self.iam_endpoint.clone(),
                resource_manager: self.resource_manager_endpoint.clone(),
                kubernetes: self.kubernetes_endpoint.clone(),
            },
            retry: RetryPolicy::new(self.max_retries),
            page_size: self.page_size,
        }
    }
}

/// Logging switches
#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit log lines as JSON
    #[arg(long)]
    pub log_json: bool,
}

/// Exactly one credential source
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct CredentialArgs {
    /// Path to the service account key JSON file.
    /// Create one with: yc iam key create --output sa.json --service-account-id <id>
    #[arg(long)]
    pub sa_json_path: Option<PathBuf>,

    /// OAuth token. A non-empty YC_OAUTH_TOKEN counts as passing --token,
    /// so unset it when using --sa-json-path
    #[arg(long, env = "YC_OAUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl CredentialArgs {
    pub fn resolve(self) -> Result<Credential, CredentialError> {
        Credential::resolve(self.sa_json_path, self.token)
    }
}

/// List folders of a cloud and the managed Kubernetes clusters in each
#[derive(Parser, Debug)]
#[command(name = "list-clusters")]
#[command(about = "List folders and their managed Kubernetes clusters")]
#[command(version)]
pub struct ListClustersArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(flatten)]
    pub cloud: CloudArgs,

    /// Only folders whose name contains this substring
    #[arg(long, default_value = "")]
    pub filter_folder: String,

    #[command(flatten)]
    pub log: LogArgs,
}

/// List deployments of every managed Kubernetes cluster in a cloud
#[derive(Parser, Debug)]
#[command(name = "list-deployments")]
#[command(about = "List deployments across the managed Kubernetes clusters of a cloud")]
#[command(version)]
pub struct ListDeploymentsArgs {
    /// Path to the service account key JSON file
    #[arg(long)]
    pub sa_json_path: PathBuf,

    #[command(flatten)]
    pub cloud: CloudArgs,

    /// Only folders whose name contains this substring
    #[arg(long, default_value = "")]
    pub filter_folder: String,

    /// Connect to clusters through their external endpoint
    #[arg(long)]
    pub external: bool,

    /// Clusters of one folder queried concurrently
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub parallel_clusters: u16,

    #[command(flatten)]
    pub log: LogArgs,
}

impl ListDeploymentsArgs {
    pub fn credential(&self) -> Credential {
        Credential::ServiceAccountFile(self.sa_json_path.clone())
    }

    pub fn report_options(&self) -> DeploymentReportOptions {
        DeploymentReportOptions {
            filter: FolderFilter::new(self.filter_folder.clone()),
            endpoint_kind: if self.external {
                EndpointKind::External
            } else {
                EndpointKind::Internal
            },
            parallel_clusters: usize::from(self.parallel_clusters),
        }
    }
}
