//! Inventory Runs
//!
//! Straight-line batch runs: folders, then clusters per folder, then
//! (for deployment reports) workloads per cluster. Any failure aborts the
//! run; lines already written stay written.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::io::Write;
use tracing::{debug, info};

use crate::cloud::{CloudClient, EndpointKind, Folder};
use crate::report::Reporter;
use crate::workloads::WorkloadLister;

/// Case-sensitive substring match on folder names; empty matches all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderFilter(String);

impl FolderFilter {
    pub fn new(substring: impl Into<String>) -> Self {
        Self(substring.into())
    }

    pub fn matches(&self, folder: &Folder) -> bool {
        folder.name.contains(&self.0)
    }
}

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub folders_seen: usize,
    pub folders_matched: usize,
    pub clusters: usize,
    pub deployments: usize,
}

impl RunSummary {
    pub fn log(&self) {
        info!(
            folders_seen = self.folders_seen,
            folders_matched = self.folders_matched,
            clusters = self.clusters,
            deployments = self.deployments,
            "✅ Inventory complete"
        );
    }
}

/// Deployment report settings
#[derive(Debug, Clone)]
pub struct DeploymentReportOptions {
    pub filter: FolderFilter,
    pub endpoint_kind: EndpointKind,
    /// Clusters of one folder listed concurrently; 1 is fully sequential
    pub parallel_clusters: usize,
}

impl Default for DeploymentReportOptions {
    fn default() -> Self {
        Self {
            filter: FolderFilter::default(),
            endpoint_kind: EndpointKind::Internal,
            parallel_clusters: 1,
        }
    }
}

/// Folders matching `filter`, after listing all folders of the cloud
async fn matching_folders(
    client: &CloudClient,
    cloud_id: &str,
    filter: &FolderFilter,
    summary: &mut RunSummary,
) -> Result<Vec<Folder>> {
    let folders = client
        .list_folders(cloud_id)
        .await
        .with_context(|| format!("Failed to list folders of cloud {}", cloud_id))?;

    summary.folders_seen = folders.len();
    debug!(cloud_id, count = folders.len(), "Listed folders");

    let matched: Vec<Folder> = folders
        .into_iter()
        .filter(|folder| {
            let keep = filter.matches(folder);
            if !keep {
                debug!(folder = %folder.name, "Skipping folder");
            }
            keep
        })
        .collect();

    summary.folders_matched = matched.len();
    Ok(matched)
}

/// Print every folder with its cluster names
pub async fn report_clusters<W: Write>(
    client: &CloudClient,
    cloud_id: &str,
    filter: &FolderFilter,
    reporter: &mut Reporter<W>,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for folder in matching_folders(client, cloud_id, filter, &mut summary).await? {
        reporter.folder(&folder)?;

        let clusters = client
            .list_clusters(&folder.id)
            .await
            .with_context(|| format!("Failed to list clusters of folder {}", folder.name))?;

        for cluster in &clusters {
            reporter.cluster(cluster)?;
        }
        summary.clusters += clusters.len();
    }

    reporter.flush()?;
    Ok(summary)
}

/// Print every matching folder's clusters with their deployments
///
/// One IAM token is obtained up front and shared by every cluster in the
/// run. A cluster is printed only once its deployments are listed.
pub async fn report_deployments<W, L>(
    client: &CloudClient,
    cloud_id: &str,
    options: &DeploymentReportOptions,
    lister: &L,
    reporter: &mut Reporter<W>,
) -> Result<RunSummary>
where
    W: Write,
    L: WorkloadLister,
{
    let token = client
        .iam_token()
        .await
        .context("Failed to obtain IAM token")?;

    let mut summary = RunSummary::default();

    for folder in matching_folders(client, cloud_id, &options.filter, &mut summary).await? {
        reporter.folder(&folder)?;

        let clusters = client
            .list_clusters(&folder.id)
            .await
            .with_context(|| format!("Failed to list clusters of folder {}", folder.name))?;

        let folder_name = folder.name.as_str();
        let mut listed = stream::iter(clusters.iter())
            .map(|cluster| async move {
                let deployments = lister
                    .list_deployments(cluster, token)
                    .await
                    .with_context(|| {
                        format!(
                            "Failed to list deployments of cluster {} in folder {}",
                            cluster.name, folder_name
                        )
                    })?;
                Ok::<_, anyhow::Error>((cluster, deployments))
            })
            .buffered(options.parallel_clusters.max(1));

        while let Some(result) = listed.next().await {
            let (cluster, deployments) = result?;
            reporter.cluster_deployments(
                cluster,
                cluster.endpoint(options.endpoint_kind),
                &deployments,
            )?;
            summary.clusters += 1;
            summary.deployments += deployments.len();
        }
    }

    reporter.flush()?;
    Ok(summary)
}
