//! Fleet Inventory Library
//!
//! Rust tooling for inventorying managed Kubernetes clusters across the
//! folders of a cloud.
//!
//! ## Binaries
//!
//! - `list-clusters`: Print every folder with its cluster names
//! - `list-deployments`: Print every cluster with a table of its deployments
//!
//! ## Usage
//!
//! Both tools run the same pipeline:
//!
//! 1. Exchange a service account key (signed PS256 JWT) or OAuth token for an IAM token
//! 2. Page through the folders of the cloud, keeping those matching `--filter-folder`
//! 3. Page through the clusters of each kept folder
//! 4. For `list-deployments`, connect to each cluster and list its deployments
//!
//! ## Example Pipeline
//!
//! ```bash
//! # Cluster tree using an OAuth token
//! YC_OAUTH_TOKEN=y0_... list-clusters --cloud-id b1g...
//!
//! # Deployments of production clusters, through their public endpoints
//! list-deployments \
//!   --sa-json-path ./sa.json \
//!   --cloud-id b1g... \
//!   --filter-folder prod \
//!   --external
//! ```

pub mod auth;
pub mod cli;
pub mod cloud;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod pager;
pub mod report;
pub mod retry;
pub mod workloads;

pub use auth::{Credential, ServiceAccountKey};
pub use cloud::{ClientConfig, CloudClient, Cluster, EndpointKind, Endpoints, Folder, IamToken};
pub use error::{CloudError, CredentialError};
pub use inventory::{report_clusters, report_deployments, DeploymentReportOptions, FolderFilter};
pub use report::Reporter;
pub use retry::RetryPolicy;
pub use workloads::{DeploymentSummary, KubeWorkloads, WorkloadLister};
