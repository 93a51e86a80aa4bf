//! Test doubles for the cluster collaborators.
//!
//! `RecordingRunner` stands in for the process runner and captures exact
//! argument vectors. `FakeCluster` and `FakeHelm` stand in one level higher,
//! for tool tests, and count every call they receive.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, RawContent};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cluster::*;
use crate::core::config::ClusterConfig;
use crate::domains::tools::{ToolContext, ToolName};

// ============================================================================
// Result helpers
// ============================================================================

/// Text of the first content block.
pub fn result_text(result: &CallToolResult) -> &str {
    match &result.content[0].raw {
        RawContent::Text(text) => &text.text,
        _ => panic!("Expected text content"),
    }
}

/// First content block decoded as JSON.
pub fn result_json(result: &CallToolResult) -> Value {
    serde_json::from_str(result_text(result)).expect("result is not JSON")
}

/// Settings with polling shortened for tests.
pub fn test_settings() -> ClusterConfig {
    ClusterConfig {
        debug_timeout_secs: 1,
        debug_poll_interval_secs: 0,
        ..ClusterConfig::default()
    }
}

pub fn tool_context(cluster: Arc<FakeCluster>, helm: Arc<FakeHelm>) -> ToolContext {
    ToolContext::new(cluster, helm, test_settings())
}

/// Smallest argument payload each tool accepts.
pub fn minimal_arguments(tool: ToolName) -> Value {
    match tool {
        ToolName::SwitchContext => json!({"context": "kind-mesh"}),
        ToolName::TestConnectivity => json!({
            "source_pod": "sleep-1",
            "target_service": "httpbin",
            "target_port": 8000
        }),
        ToolName::GetPodLogs | ToolName::GetIstioProxyLogs | ToolName::GetIptablesRules => {
            json!({"pod_name": "sleep-1"})
        }
        ToolName::ExecPodCommand => json!({"pod_name": "sleep-1", "command": ["ls"]}),
        ToolName::TraceNetworkPath => json!({"source_pod": "sleep-1", "target_host": "httpbin"}),
        _ => json!({}),
    }
}

// ============================================================================
// Object builders
// ============================================================================

pub fn pod(namespace: &str, name: &str, containers: &[&str]) -> Pod {
    Pod {
        metadata: ObjectMeta::named(name).in_namespace(namespace),
        spec: PodSpec {
            containers: containers
                .iter()
                .map(|c| Container {
                    name: c.to_string(),
                    image: None,
                })
                .collect(),
            node_name: Some("node-1".to_string()),
        },
        status: PodStatus {
            pod_ip: Some("10.244.0.12".to_string()),
        },
    }
}

pub fn deployment(namespace: &str, name: &str, image: &str, replicas: i32, ready: i32) -> Deployment {
    Deployment {
        metadata: ObjectMeta::named(name).in_namespace(namespace),
        spec: DeploymentSpec {
            template: PodTemplate {
                spec: PodSpec {
                    containers: vec![Container {
                        name: name.to_string(),
                        image: Some(image.to_string()),
                    }],
                    node_name: None,
                },
            },
        },
        status: DeploymentStatus {
            replicas,
            ready_replicas: ready,
            available_replicas: ready,
        },
    }
}

fn selector_matches(selector: &str, metadata: &ObjectMeta) -> bool {
    selector
        .split(',')
        .filter(|s| !s.is_empty())
        .all(|pair| match pair.split_once('=') {
            Some((key, value)) => metadata.labels.get(key).map(String::as_str) == Some(value),
            None => metadata.labels.contains_key(pair),
        })
}

// ============================================================================
// RecordingRunner
// ============================================================================

/// Replays queued outputs and records every command it is asked to run.
/// An empty queue answers with empty successful output.
#[derive(Default)]
pub struct RecordingRunner {
    outputs: Mutex<VecDeque<ClusterResult<CommandOutput>>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, output: CommandOutput) {
        self.outputs.lock().unwrap().push_back(Ok(output));
    }

    pub fn push_error(&self, error: ClusterError) {
        self.outputs.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: CommandSpec) -> ClusterResult<CommandOutput> {
        self.calls.lock().unwrap().push(spec);
        self.outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CommandOutput::ok("")))
    }
}

// ============================================================================
// FakeCluster
// ============================================================================

/// In-memory cluster. Objects are configured up front; mutations are recorded.
#[derive(Default)]
pub struct FakeCluster {
    pub(crate) calls: AtomicUsize,
    pub kubeconfig: KubeConfigView,
    pub namespaces: Vec<Namespace>,
    pub nodes: Vec<Node>,
    pub pods: Vec<Pod>,
    pub services: Vec<Service>,
    pub deployments: Vec<Deployment>,
    pub daemon_sets: Vec<DaemonSet>,
    pub policies: Vec<NetworkPolicy>,
    pub crds: Vec<String>,
    pub logs: String,
    /// Output for exec calls once `exec_script` is exhausted.
    pub exec_default: String,
    pub exec_script: Mutex<VecDeque<ClusterResult<String>>>,
    pub applied: Mutex<Vec<Value>>,
    pub deleted: Mutex<Vec<(ResourceKind, String)>>,
    pub executed: Mutex<Vec<(String, Vec<String>)>>,
    pub log_requests: Mutex<Vec<LogRequest>>,
    pub debug_requests: Mutex<Vec<DebugRequest>>,
    pub used_context: Mutex<Option<String>>,
}

impl FakeCluster {
    /// A cluster with a running mesh, both sample apps and healthy output
    /// for every read.
    pub fn populated() -> Self {
        let mut sleep = pod("default", "sleep-1", &["sleep", "istio-proxy"]);
        sleep.metadata = sleep.metadata.with_label("app", "sleep");
        let mut httpbin = pod("default", "httpbin-1", &["httpbin", "istio-proxy"]);
        httpbin.metadata = httpbin.metadata.with_label("app", "httpbin");

        let mut istiod = deployment("istio-system", "istiod", "docker.io/istio/pilot:1.24.0", 1, 1);
        istiod.metadata = istiod.metadata.with_label("app", "istiod");
        let mut sail = deployment(
            "sail-operator",
            "sail-operator",
            "quay.io/sail-dev/sail-operator:1.0.0",
            1,
            1,
        );
        sail.metadata = sail
            .metadata
            .with_label("app.kubernetes.io/name", "sail-operator");

        Self {
            kubeconfig: KubeConfigView {
                current_context: "kind-mesh".to_string(),
                contexts: vec![
                    NamedContext {
                        name: "kind-mesh".to_string(),
                        context: ContextRef {
                            cluster: "kind-mesh".to_string(),
                            user: "kind-mesh".to_string(),
                            namespace: None,
                        },
                    },
                    NamedContext {
                        name: "kind-edge".to_string(),
                        context: ContextRef {
                            cluster: "kind-edge".to_string(),
                            user: "kind-edge".to_string(),
                            namespace: Some("edge".to_string()),
                        },
                    },
                ],
                clusters: vec![NamedCluster {
                    name: "kind-mesh".to_string(),
                    cluster: ClusterEndpoint {
                        server: "https://127.0.0.1:6443".to_string(),
                    },
                }],
            },
            namespaces: ["default", "istio-system", "sail-operator"]
                .iter()
                .map(|n| Namespace {
                    metadata: ObjectMeta::named(*n),
                })
                .collect(),
            nodes: vec![Node {
                metadata: ObjectMeta::named("node-1"),
            }],
            pods: vec![sleep, httpbin],
            services: vec![Service {
                metadata: ObjectMeta::named("httpbin").in_namespace("default"),
                spec: ServiceSpec {
                    cluster_ip: Some("10.96.0.20".to_string()),
                },
            }],
            deployments: vec![istiod, sail],
            daemon_sets: Vec::new(),
            policies: vec![NetworkPolicy {
                metadata: ObjectMeta::named("deny-all").in_namespace("default"),
                spec: NetworkPolicySpec::default(),
            }],
            crds: vec![
                "virtualservices.networking.istio.io".to_string(),
                "certificates.cert-manager.io".to_string(),
            ],
            logs: "2024-05-01T10:00:00.000000000Z info ready\n".to_string(),
            exec_default: "ok\nHTTP_CODE:200\nTIME_TOTAL:0.004\n".to_string(),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn script_exec(&self, output: ClusterResult<String>) {
        self.exec_script.lock().unwrap().push_back(output);
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn not_found(kind: &str, name: &str) -> ClusterError {
        ClusterError::NotFound(format!("{} \"{}\" not found", kind, name))
    }
}

fn in_namespace(metadata: &ObjectMeta, namespace: &str) -> bool {
    metadata.namespace.as_deref() == Some(namespace)
}

#[async_trait]
impl ClusterClient for FakeCluster {
    fn context_name(&self) -> &str {
        "kind-mesh"
    }

    async fn kubeconfig(&self) -> ClusterResult<KubeConfigView> {
        self.record();
        Ok(self.kubeconfig.clone())
    }

    async fn use_context(&self, name: &str) -> ClusterResult<()> {
        self.record();
        *self.used_context.lock().unwrap() = Some(name.to_string());
        Ok(())
    }

    async fn server_version(&self) -> ClusterResult<String> {
        self.record();
        Ok("v1.30.0".to_string())
    }

    async fn list_nodes(&self) -> ClusterResult<Vec<Node>> {
        self.record();
        Ok(self.nodes.clone())
    }

    async fn list_namespaces(&self) -> ClusterResult<Vec<Namespace>> {
        self.record();
        Ok(self.namespaces.clone())
    }

    async fn get_namespace(&self, name: &str) -> ClusterResult<Namespace> {
        self.record();
        self.namespaces
            .iter()
            .find(|n| n.metadata.name == name)
            .cloned()
            .ok_or_else(|| Self::not_found("namespaces", name))
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> ClusterResult<Pod> {
        self.record();
        self.pods
            .iter()
            .find(|p| p.metadata.name == name && in_namespace(&p.metadata, namespace))
            .cloned()
            .ok_or_else(|| Self::not_found("pods", name))
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> ClusterResult<Vec<Pod>> {
        self.record();
        Ok(self
            .pods
            .iter()
            .filter(|p| in_namespace(&p.metadata, namespace) && selector_matches(selector, &p.metadata))
            .cloned()
            .collect())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> ClusterResult<Service> {
        self.record();
        self.services
            .iter()
            .find(|s| s.metadata.name == name && in_namespace(&s.metadata, namespace))
            .cloned()
            .ok_or_else(|| Self::not_found("services", name))
    }

    async fn list_deployments(
        &self,
        namespace: &str,
        selector: &str,
    ) -> ClusterResult<Vec<Deployment>> {
        self.record();
        Ok(self
            .deployments
            .iter()
            .filter(|d| in_namespace(&d.metadata, namespace) && selector_matches(selector, &d.metadata))
            .cloned()
            .collect())
    }

    async fn get_daemon_set(&self, namespace: &str, name: &str) -> ClusterResult<DaemonSet> {
        self.record();
        self.daemon_sets
            .iter()
            .find(|d| d.metadata.name == name && in_namespace(&d.metadata, namespace))
            .cloned()
            .ok_or_else(|| Self::not_found("daemonsets.apps", name))
    }

    async fn list_network_policies(
        &self,
        namespace: &str,
        selector: Option<&str>,
    ) -> ClusterResult<Vec<NetworkPolicy>> {
        self.record();
        Ok(self
            .policies
            .iter()
            .filter(|p| {
                in_namespace(&p.metadata, namespace)
                    && selector.is_none_or(|s| selector_matches(s, &p.metadata))
            })
            .cloned()
            .collect())
    }

    async fn list_crds(&self) -> ClusterResult<Vec<String>> {
        self.record();
        Ok(self.crds.clone())
    }

    async fn apply(&self, manifest: &Value) -> ClusterResult<()> {
        self.record();
        self.applied.lock().unwrap().push(manifest.clone());
        Ok(())
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        _namespace: Option<&str>,
        name: &str,
    ) -> ClusterResult<()> {
        self.record();
        self.deleted.lock().unwrap().push((kind, name.to_string()));
        Ok(())
    }

    async fn pod_logs(
        &self,
        _namespace: &str,
        _pod: &str,
        request: &LogRequest,
    ) -> ClusterResult<String> {
        self.record();
        self.log_requests.lock().unwrap().push(request.clone());
        Ok(self.logs.clone())
    }

    async fn exec(
        &self,
        _namespace: &str,
        _pod: &str,
        container: &str,
        command: &[String],
        _timeout: Option<Duration>,
    ) -> ClusterResult<String> {
        self.record();
        self.executed
            .lock()
            .unwrap()
            .push((container.to_string(), command.to_vec()));
        self.exec_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.exec_default.clone()))
    }

    async fn start_debug_container(
        &self,
        _namespace: &str,
        _pod: &str,
        request: &DebugRequest,
    ) -> ClusterResult<()> {
        self.record();
        self.debug_requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

// ============================================================================
// FakeHelm
// ============================================================================

#[derive(Default)]
pub struct FakeHelm {
    pub(crate) calls: AtomicUsize,
    pub unavailable: bool,
    pub releases: Vec<Release>,
    /// Releases whose install fails.
    pub failing_installs: Vec<String>,
    /// Releases whose uninstall reports "not found".
    pub missing_releases: Vec<String>,
    pub repos: Mutex<Vec<String>>,
    pub installs: Mutex<Vec<InstallRequest>>,
    pub uninstalls: Mutex<Vec<UninstallRequest>>,
}

impl FakeHelm {
    pub fn with_istio_releases() -> Self {
        Self {
            releases: vec![
                Release {
                    name: "istiod".to_string(),
                    namespace: "istio-system".to_string(),
                    chart: "istiod-1.24.0".to_string(),
                    app_version: "1.24.0".to_string(),
                    status: "deployed".to_string(),
                    ..Default::default()
                },
                Release {
                    name: "sail-operator".to_string(),
                    namespace: "sail-operator".to_string(),
                    chart: "sail-operator-1.0.0".to_string(),
                    app_version: "1.0.0".to_string(),
                    status: "deployed".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn installed(&self) -> Vec<InstallRequest> {
        self.installs.lock().unwrap().clone()
    }

    pub fn uninstalled(&self) -> Vec<String> {
        self.uninstalls
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.release.clone())
            .collect()
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PackageManager for FakeHelm {
    async fn ensure_available(&self) -> ClusterResult<()> {
        self.record();
        if self.unavailable {
            return Err(ClusterError::Spawn {
                program: "helm".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            });
        }
        Ok(())
    }

    async fn add_repo(&self, repo: &ChartRepo) -> ClusterResult<()> {
        self.record();
        self.repos.lock().unwrap().push(repo.name.to_string());
        Ok(())
    }

    async fn install(&self, request: &InstallRequest) -> ClusterResult<()> {
        self.record();
        self.installs.lock().unwrap().push(request.clone());
        if self.failing_installs.contains(&request.release) {
            return Err(ClusterError::CommandFailed {
                program: "helm".to_string(),
                message: format!("Error: INSTALLATION FAILED: {} timed out", request.release),
            });
        }
        Ok(())
    }

    async fn uninstall(&self, request: &UninstallRequest) -> ClusterResult<()> {
        self.record();
        self.uninstalls.lock().unwrap().push(request.clone());
        if self.missing_releases.contains(&request.release) {
            return Err(ClusterError::NotFound(format!(
                "uninstall: Release not loaded: {}: release: not found",
                request.release
            )));
        }
        Ok(())
    }

    async fn list_releases(&self, namespace: &str, filter: &str) -> ClusterResult<Vec<Release>> {
        self.record();
        Ok(self
            .releases
            .iter()
            .filter(|r| r.namespace == namespace && r.name.contains(filter))
            .cloned()
            .collect())
    }
}
