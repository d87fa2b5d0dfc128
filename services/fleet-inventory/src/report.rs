//! Plain-text inventory reports
//!
//! Output goes to any writer so the binaries can print to stdout and tests
//! can capture into a buffer.

use std::io::{self, Write};
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table,
};

use crate::cloud::{Cluster, Folder};
use crate::workloads::DeploymentSummary;

/// Bordered table of deployments: Name left-aligned, Namespace centred
pub fn deployment_table(deployments: &[DeploymentSummary]) -> String {
    let mut table = Table::new(deployments);
    table
        .with(Style::ascii())
        .with(Modify::new(Columns::single(0)).with(Alignment::left()))
        .with(Modify::new(Columns::single(1)).with(Alignment::center()));
    table.to_string()
}

pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn folder(&mut self, folder: &Folder) -> io::Result<()> {
        writeln!(self.out, "{}:", folder.name)
    }

    /// Cluster name only, indented under its folder
    pub fn cluster(&mut self, cluster: &Cluster) -> io::Result<()> {
        writeln!(self.out, "  {}", cluster.name)
    }

    /// Cluster line with endpoint, its deployment table and a blank separator
    pub fn cluster_deployments(
        &mut self,
        cluster: &Cluster,
        endpoint: &str,
        deployments: &[DeploymentSummary],
    ) -> io::Result<()> {
        writeln!(self.out, "  {}: {}", cluster.name, endpoint)?;
        writeln!(self.out, "{}", deployment_table(deployments))?;
        writeln!(self.out)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
