//! End-to-end report runs over a mock cloud API

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use fleet_inventory::cloud::TokenSource;
use fleet_inventory::{
    report_clusters, report_deployments, ClientConfig, CloudClient, Cluster, DeploymentReportOptions,
    DeploymentSummary, EndpointKind, Endpoints, FolderFilter, IamToken, Reporter, RetryPolicy,
    WorkloadLister,
};
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FOLDERS: &str = "/resource-manager/v1/folders";
const CLUSTERS: &str = "/managed-kubernetes/v1/clusters";

fn client(server: &MockServer) -> CloudClient {
    let config = ClientConfig {
        endpoints: Endpoints::single_host(&server.uri()),
        retry: RetryPolicy::default().with_backoff(Duration::ZERO),
        page_size: None,
    };
    let token = IamToken::new("t1.static", Utc::now() + chrono::Duration::hours(1));
    CloudClient::new(TokenSource::Static(token), config).unwrap()
}

fn cluster(id: &str, name: &str, internal: &str, external: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "status": "RUNNING",
        "master": {
            "endpoints": {
                "internalV4Endpoint": internal,
                "externalV4Endpoint": external
            },
            "masterAuth": {"clusterCaCertificate": "CERT1"}
        }
    })
}

async fn mount_folders(server: &MockServer, folders: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(FOLDERS))
        .and(query_param("cloudId", "b1g"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "folders": folders })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_clusters(server: &MockServer, folder_id: &str, clusters: serde_json::Value, times: u64) {
    Mock::given(method("GET"))
        .and(path(CLUSTERS))
        .and(query_param("folderId", folder_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "clusters": clusters })))
        .expect(times)
        .mount(server)
        .await;
}

/// Deployments keyed by cluster name; any other cluster fails
struct StubWorkloads {
    deployments: Vec<(&'static str, Vec<DeploymentSummary>)>,
    delays: Vec<(&'static str, Duration)>,
    seen: Mutex<Vec<(String, String)>>,
    events: Mutex<Vec<String>>,
}

impl StubWorkloads {
    fn new(deployments: Vec<(&'static str, Vec<DeploymentSummary>)>) -> Self {
        Self {
            deployments,
            delays: Vec::new(),
            seen: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Make listing `cluster` take `delay`
    fn with_delay(mut self, cluster: &'static str, delay: Duration) -> Self {
        self.delays.push((cluster, delay));
        self
    }

    fn event_index(&self, event: &str) -> usize {
        let events = self.events.lock().unwrap();
        events.iter().position(|e| e == event).unwrap()
    }
}

#[async_trait]
impl WorkloadLister for StubWorkloads {
    async fn list_deployments(
        &self,
        cluster: &Cluster,
        token: &IamToken,
    ) -> Result<Vec<DeploymentSummary>> {
        self.seen
            .lock()
            .unwrap()
            .push((cluster.name.clone(), token.iam_token.clone()));
        self.events
            .lock()
            .unwrap()
            .push(format!("start {}", cluster.name));

        if let Some((_, delay)) = self.delays.iter().find(|(name, _)| *name == cluster.name) {
            tokio::time::sleep(*delay).await;
        }

        self.events
            .lock()
            .unwrap()
            .push(format!("end {}", cluster.name));

        match self.deployments.iter().find(|(name, _)| *name == cluster.name) {
            Some((_, deployments)) => Ok(deployments.clone()),
            None => bail!("connection refused"),
        }
    }
}

#[tokio::test]
async fn test_cluster_report_applies_folder_filter() {
    let server = MockServer::start().await;

    mount_folders(
        &server,
        json!([
            {"id": "f1", "name": "prod-eu"},
            {"id": "f2", "name": "staging"},
            {"id": "f3", "name": "prod-us"}
        ]),
    )
    .await;
    mount_clusters(&server, "f1", json!([cluster("c1", "web", "https://10.0.0.5", "")]), 1).await;
    mount_clusters(&server, "f2", json!([]), 0).await;
    mount_clusters(
        &server,
        "f3",
        json!([
            cluster("c2", "api", "https://10.1.0.5", ""),
            cluster("c3", "batch", "https://10.1.0.6", "")
        ]),
        1,
    )
    .await;

    let mut reporter = Reporter::new(Vec::new());
    let summary = report_clusters(&client(&server), "b1g", &FolderFilter::new("prod"), &mut reporter)
        .await
        .unwrap();

    let out = String::from_utf8(reporter.into_inner()).unwrap();
    assert_eq!(out, "prod-eu:\n  web\nprod-us:\n  api\n  batch\n");
    assert_eq!(summary.folders_seen, 3);
    assert_eq!(summary.folders_matched, 2);
    assert_eq!(summary.clusters, 3);
}

#[tokio::test]
async fn test_folder_without_clusters_still_printed() {
    let server = MockServer::start().await;

    mount_folders(&server, json!([{"id": "f1", "name": "empty"}])).await;
    mount_clusters(&server, "f1", json!([]), 1).await;

    let mut reporter = Reporter::new(Vec::new());
    report_clusters(&client(&server), "b1g", &FolderFilter::default(), &mut reporter)
        .await
        .unwrap();

    assert_eq!(String::from_utf8(reporter.into_inner()).unwrap(), "empty:\n");
}

#[tokio::test]
async fn test_deployment_report() {
    let server = MockServer::start().await;

    mount_folders(&server, json!([{"id": "f1", "name": "team-a"}])).await;
    mount_clusters(
        &server,
        "f1",
        json!([cluster("c1", "web", "https://10.0.0.5:443", "https://51.250.1.2")]),
        1,
    )
    .await;

    let lister = StubWorkloads::new(vec![(
        "web",
        vec![
            DeploymentSummary::new("nginx", "default"),
            DeploymentSummary::new("api", "team-a"),
        ],
    )]);

    let mut reporter = Reporter::new(Vec::new());
    let summary = report_deployments(
        &client(&server),
        "b1g",
        &DeploymentReportOptions::default(),
        &lister,
        &mut reporter,
    )
    .await
    .unwrap();

    let out = String::from_utf8(reporter.into_inner()).unwrap();
    assert!(out.starts_with("team-a:\n  web: https://10.0.0.5:443\n+"));
    assert!(out.ends_with("+\n\n"));

    let rows: Vec<Vec<&str>> = out
        .lines()
        .filter(|line| line.starts_with('|'))
        .map(|line| {
            line.trim_matches('|')
                .split('|')
                .map(str::trim)
                .collect()
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            vec!["Name", "Namespace"],
            vec!["nginx", "default"],
            vec!["api", "team-a"],
        ]
    );

    assert_eq!(summary.clusters, 1);
    assert_eq!(summary.deployments, 2);

    let seen = lister.seen.lock().unwrap();
    assert_eq!(*seen, vec![("web".to_string(), "t1.static".to_string())]);
}

#[tokio::test]
async fn test_deployment_report_uses_external_endpoint() {
    let server = MockServer::start().await;

    mount_folders(&server, json!([{"id": "f1", "name": "team-a"}])).await;
    mount_clusters(
        &server,
        "f1",
        json!([cluster("c1", "web", "https://10.0.0.5:443", "https://51.250.1.2")]),
        1,
    )
    .await;

    let lister = StubWorkloads::new(vec![("web", vec![])]);
    let options = DeploymentReportOptions {
        endpoint_kind: EndpointKind::External,
        ..Default::default()
    };

    let mut reporter = Reporter::new(Vec::new());
    report_deployments(&client(&server), "b1g", &options, &lister, &mut reporter)
        .await
        .unwrap();

    let out = String::from_utf8(reporter.into_inner()).unwrap();
    assert!(out.contains("  web: https://51.250.1.2\n"));
}

#[tokio::test]
async fn test_failed_cluster_aborts_without_partial_block() {
    let server = MockServer::start().await;

    mount_folders(&server, json!([{"id": "f1", "name": "team-a"}])).await;
    mount_clusters(
        &server,
        "f1",
        json!([
            cluster("c1", "web", "https://10.0.0.5", ""),
            cluster("c2", "broken", "https://10.0.0.6", "")
        ]),
        1,
    )
    .await;

    let lister = StubWorkloads::new(vec![("web", vec![DeploymentSummary::new("nginx", "default")])]);

    let mut reporter = Reporter::new(Vec::new());
    let err = report_deployments(
        &client(&server),
        "b1g",
        &DeploymentReportOptions::default(),
        &lister,
        &mut reporter,
    )
    .await
    .unwrap_err();

    assert!(format!("{:#}", err).contains("broken"));

    let out = String::from_utf8(reporter.into_inner()).unwrap();
    assert!(out.contains("  web: https://10.0.0.5\n"));
    assert!(!out.contains("broken"));
}

#[tokio::test]
async fn test_parallel_listing_keeps_cluster_order() {
    let server = MockServer::start().await;

    mount_folders(&server, json!([{"id": "f1", "name": "team-a"}])).await;
    mount_clusters(
        &server,
        "f1",
        json!([
            cluster("c1", "alpha", "https://10.0.0.1", ""),
            cluster("c2", "beta", "https://10.0.0.2", ""),
            cluster("c3", "gamma", "https://10.0.0.3", "")
        ]),
        1,
    )
    .await;

    // Later clusters finish first
    let lister = StubWorkloads::new(vec![
        ("alpha", vec![DeploymentSummary::new("a", "default")]),
        ("beta", vec![DeploymentSummary::new("b", "default")]),
        ("gamma", vec![DeploymentSummary::new("c", "default")]),
    ])
    .with_delay("alpha", Duration::from_millis(150))
    .with_delay("beta", Duration::from_millis(50));
    let options = DeploymentReportOptions {
        parallel_clusters: 3,
        ..Default::default()
    };

    let mut reporter = Reporter::new(Vec::new());
    let summary = report_deployments(&client(&server), "b1g", &options, &lister, &mut reporter)
        .await
        .unwrap();

    let out = String::from_utf8(reporter.into_inner()).unwrap();
    let alpha = out.find("  alpha:").unwrap();
    let beta = out.find("  beta:").unwrap();
    let gamma = out.find("  gamma:").unwrap();
    assert!(alpha < beta && beta < gamma);
    assert_eq!(summary.deployments, 3);

    assert!(lister.event_index("start beta") < lister.event_index("end alpha"));
    assert!(lister.event_index("end gamma") < lister.event_index("end alpha"));
}
