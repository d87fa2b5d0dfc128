//! Folder and Cluster Lister
//!
//! Prints every folder of a cloud followed by the names of its managed
//! Kubernetes clusters.
//!
//! ## Usage
//! ```bash
//! # With a service account key
//! list-clusters --cloud-id b1g... --sa-json-path ./sa.json
//!
//! # With an OAuth token from the environment
//! YC_OAUTH_TOKEN=y0_... YC_CLOUD_ID=b1g... list-clusters --filter-folder prod
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use tracing::info;

use fleet_inventory::cli::ListClustersArgs;
use fleet_inventory::{inventory, logging, CloudClient, FolderFilter, Reporter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ListClustersArgs::parse();
    logging::init(args.log.verbose, args.log.log_json)?;

    let credential = args.credentials.clone().resolve()?;
    let client = CloudClient::from_credential(&credential, args.cloud.client_config())
        .context("Failed to initialize cloud client")?;

    info!("🔎 Listing clusters of cloud {}", args.cloud.cloud_id);

    let filter = FolderFilter::new(args.filter_folder.clone());
    let mut reporter = Reporter::new(io::stdout().lock());
    let summary =
        inventory::report_clusters(&client, &args.cloud.cloud_id, &filter, &mut reporter).await?;

    summary.log();
    Ok(())
}
