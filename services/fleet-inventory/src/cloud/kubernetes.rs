//! Managed Kubernetes: cluster enumeration

use serde::Deserialize;

use super::{CloudClient, ListPages, ListResponse};
use crate::error::CloudError;
use crate::pager::{self, Page};

/// Which master endpoint to connect to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointKind {
    /// Address reachable from inside the cluster's network
    #[default]
    Internal,
    /// Public address, if the cluster has one
    External,
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointKind::Internal => write!(f, "internal"),
            EndpointKind::External => write!(f, "external"),
        }
    }
}

/// Managed Kubernetes cluster descriptor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub folder_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub master: Master,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Master {
    #[serde(default)]
    pub endpoints: MasterEndpoints,
    #[serde(default)]
    pub master_auth: MasterAuth,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterEndpoints {
    #[serde(default)]
    pub internal_v4_endpoint: String,
    #[serde(default)]
    pub external_v4_endpoint: String,
}

/// Only meaningful together with the endpoint it validates
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterAuth {
    /// PEM text
    #[serde(default)]
    pub cluster_ca_certificate: String,
}

impl Cluster {
    pub fn internal_endpoint(&self) -> &str {
        &self.master.endpoints.internal_v4_endpoint
    }

    /// Endpoint of the requested kind; empty when the cluster has none
    pub fn endpoint(&self, kind: EndpointKind) -> &str {
        match kind {
            EndpointKind::Internal => &self.master.endpoints.internal_v4_endpoint,
            EndpointKind::External => &self.master.endpoints.external_v4_endpoint,
        }
    }

    pub fn ca_certificate(&self) -> &str {
        &self.master.master_auth.cluster_ca_certificate
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClustersResponse {
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl ListResponse for ListClustersResponse {
    type Item = Cluster;

    fn into_page(self) -> Page<Cluster> {
        Page::new(self.clusters, self.next_page_token)
    }
}

impl CloudClient {
    /// Page source over the clusters of a folder
    pub fn cluster_pages(&self, folder_id: &str) -> ListPages<'_, ListClustersResponse> {
        let url = format!("{}/clusters", self.endpoints().kubernetes);
        self.list_pages(url, ("folderId", folder_id.to_string()))
    }

    /// All clusters of a folder, in server order
    pub async fn list_clusters(&self, folder_id: &str) -> Result<Vec<Cluster>, CloudError> {
        pager::collect_all(&self.cluster_pages(folder_id)).await
    }
}
