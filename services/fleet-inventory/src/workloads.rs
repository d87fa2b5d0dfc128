//! Cluster Workloads
//!
//! Builds a Kubernetes API client per managed cluster and lists its
//! deployments across all namespaces.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{
    api::{Api, ListParams},
    config::AuthInfo,
    Client, Config, ResourceExt,
};
use tabled::Tabled;
use tracing::debug;

use crate::cloud::{Cluster, EndpointKind, IamToken};
use crate::pager::{self, Page, PageSource};

/// Deployments requested per Kubernetes list call
pub const DEFAULT_DEPLOYMENT_PAGE_SIZE: u32 = 500;

/// Deployment projection shown in reports
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct DeploymentSummary {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Namespace")]
    pub namespace: String,
}

impl DeploymentSummary {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl From<&Deployment> for DeploymentSummary {
    fn from(deployment: &Deployment) -> Self {
        Self {
            name: deployment.name_any(),
            namespace: deployment.namespace().unwrap_or_default(),
        }
    }
}

/// DER certificates from a PEM bundle
pub fn ca_certificates(ca_pem: &str) -> Result<Vec<Vec<u8>>> {
    let certs: Vec<Vec<u8>> = pem::parse_many(ca_pem)
        .context("Failed to parse cluster CA certificate PEM")?
        .into_iter()
        .filter(|p| p.tag() == "CERTIFICATE")
        .map(|p| p.into_contents())
        .collect();

    if certs.is_empty() {
        bail!("Cluster CA bundle contains no certificates");
    }
    Ok(certs)
}

/// In-memory client configuration for one cluster
///
/// The CA goes straight into the TLS trust roots and certificate
/// verification stays on.
pub fn cluster_config(endpoint: &str, ca_pem: &str, token: &str) -> Result<Config> {
    if endpoint.is_empty() {
        bail!("Cluster has no endpoint");
    }

    let cluster_url = endpoint
        .parse()
        .with_context(|| format!("Invalid cluster endpoint: {}", endpoint))?;

    let mut config = Config::new(cluster_url);
    config.root_cert = Some(ca_certificates(ca_pem)?);
    config.accept_invalid_certs = false;
    config.auth_info = AuthInfo {
        token: Some(token.to_string().into()),
        ..Default::default()
    };

    Ok(config)
}

/// Page source over all deployments visible to `api`
pub struct DeploymentPages {
    api: Api<Deployment>,
    page_size: u32,
}

impl DeploymentPages {
    pub fn new(client: Client, page_size: u32) -> Self {
        Self {
            api: Api::all(client),
            page_size,
        }
    }
}

#[async_trait]
impl PageSource for DeploymentPages {
    type Item = DeploymentSummary;
    type Error = anyhow::Error;

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<Page<DeploymentSummary>> {
        let mut params = ListParams::default().limit(self.page_size);
        if let Some(token) = page_token {
            params = params.continue_token(token);
        }

        let list = self
            .api
            .list(&params)
            .await
            .context("Failed to list deployments")?;

        debug!(
            count = list.items.len(),
            more = list.metadata.continue_.is_some(),
            "Fetched deployment page"
        );

        let items = list.items.iter().map(DeploymentSummary::from).collect();
        Ok(Page::new(items, list.metadata.continue_))
    }

    fn stalled(&self, token: &str) -> anyhow::Error {
        anyhow!("Deployment listing stalled on continue token {:?}", token)
    }
}

/// All deployments across namespaces, in server order
pub async fn list_deployments(client: Client) -> Result<Vec<DeploymentSummary>> {
    list_deployments_paged(client, DEFAULT_DEPLOYMENT_PAGE_SIZE).await
}

pub async fn list_deployments_paged(client: Client, page_size: u32) -> Result<Vec<DeploymentSummary>> {
    pager::collect_all(&DeploymentPages::new(client, page_size)).await
}

/// Lists the workloads of a managed cluster
#[async_trait]
pub trait WorkloadLister: Send + Sync {
    async fn list_deployments(
        &self,
        cluster: &Cluster,
        token: &IamToken,
    ) -> Result<Vec<DeploymentSummary>>;
}

/// Lists deployments through each cluster's Kubernetes API
#[derive(Debug, Clone)]
pub struct KubeWorkloads {
    endpoint_kind: EndpointKind,
}

impl Default for KubeWorkloads {
    fn default() -> Self {
        Self::new(EndpointKind::Internal)
    }
}

impl KubeWorkloads {
    pub fn new(endpoint_kind: EndpointKind) -> Self {
        Self { endpoint_kind }
    }

    /// Kubernetes client for `cluster`, authenticated with `token`
    pub fn client_for(&self, cluster: &Cluster, token: &IamToken) -> Result<Client> {
        let endpoint = cluster.endpoint(self.endpoint_kind);
        if endpoint.is_empty() {
            bail!(
                "Cluster {} has no {} endpoint",
                cluster.name,
                self.endpoint_kind
            );
        }

        let config = cluster_config(endpoint, cluster.ca_certificate(), &token.iam_token)
            .with_context(|| format!("Failed to configure client for cluster {}", cluster.name))?;

        Client::try_from(config)
            .with_context(|| format!("Failed to create client for cluster {}", cluster.name))
    }
}

#[async_trait]
impl WorkloadLister for KubeWorkloads {
    async fn list_deployments(
        &self,
        cluster: &Cluster,
        token: &IamToken,
    ) -> Result<Vec<DeploymentSummary>> {
        let client = self.client_for(cluster, token)?;

        debug!(
            cluster = %cluster.name,
            endpoint = %cluster.endpoint(self.endpoint_kind),
            "Listing deployments"
        );

        list_deployments(client).await
    }
}
