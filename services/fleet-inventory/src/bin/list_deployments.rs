//! Deployment Lister
//!
//! Connects to every managed Kubernetes cluster of a cloud with a service
//! account's IAM token and prints a table of its deployments.
//!
//! ## Usage
//! ```bash
//! list-deployments \
//!   --sa-json-path ./sa.json \
//!   --cloud-id b1g... \
//!   --filter-folder prod \
//!   --parallel-clusters 4
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use tracing::info;

use fleet_inventory::cli::ListDeploymentsArgs;
use fleet_inventory::{inventory, logging, CloudClient, KubeWorkloads, Reporter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ListDeploymentsArgs::parse();
    logging::init(args.log.verbose, args.log.log_json)?;

    let client = CloudClient::from_credential(&args.credential(), args.cloud.client_config())
        .context("Failed to initialize cloud client")?;

    let options = args.report_options();
    info!(
        "🚀 Listing deployments of cloud {} ({} endpoints)",
        args.cloud.cloud_id, options.endpoint_kind
    );

    let lister = KubeWorkloads::new(options.endpoint_kind);
    let mut reporter = Reporter::new(io::stdout().lock());
    let summary = inventory::report_deployments(
        &client,
        &args.cloud.cloud_id,
        &options,
        &lister,
        &mut reporter,
    )
    .await?;

    summary.log();
    Ok(())
}
