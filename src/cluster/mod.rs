//! Cluster collaborators.
//!
//! The tools never talk to Kubernetes directly. They go through two narrow
//! interfaces:
//!
//! - [`ClusterClient`]: get/list/apply/delete objects, read logs, exec into
//!   containers. Backed by `kubectl` ([`KubectlClient`]).
//! - [`PackageManager`]: install, uninstall and list chart releases. Backed by
//!   `helm` ([`HelmCli`]).
//!
//! Both are driven through a [`CommandRunner`] so tests can substitute fakes
//! at either level.

pub mod command;
mod error;
pub mod helm;
pub mod kubectl;
pub mod model;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub use command::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner};
pub use error::{ClusterError, ClusterResult};
pub use helm::{ChartRepo, HelmCli, InstallRequest, PackageManager, Release, UninstallRequest};
pub use kubectl::KubectlClient;
pub use model::*;

/// Options for reading container logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogRequest {
    pub container: String,
    pub tail_lines: u64,
    /// Go-style duration (`30m`, `1h`) bounding how far back to read.
    pub since: Option<String>,
    pub previous: bool,
    pub timestamps: bool,
}

/// Ephemeral debug container attached to a running pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugRequest {
    pub container_name: String,
    pub image: String,
    pub command: Vec<String>,
}

/// Kinds of objects the tools delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Deployment,
    Service,
    ServiceAccount,
    CustomResourceDefinition,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::Service => "service",
            Self::ServiceAccount => "serviceaccount",
            Self::CustomResourceDefinition => "customresourcedefinition",
        }
    }

    /// Whether objects of this kind live inside a namespace.
    pub fn is_namespaced(&self) -> bool {
        !matches!(self, Self::CustomResourceDefinition)
    }
}

/// Access to the Kubernetes API.
///
/// Implementations must be safe to call concurrently; a single instance is
/// shared by every tool for the life of the process.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Name of the context this client is bound to.
    fn context_name(&self) -> &str;

    /// The merged kubeconfig.
    async fn kubeconfig(&self) -> ClusterResult<KubeConfigView>;

    /// Persist `name` as the kubeconfig's current context.
    async fn use_context(&self, name: &str) -> ClusterResult<()>;

    /// Git version reported by the API server.
    async fn server_version(&self) -> ClusterResult<String>;

    async fn list_nodes(&self) -> ClusterResult<Vec<Node>>;
    async fn list_namespaces(&self) -> ClusterResult<Vec<Namespace>>;
    async fn get_namespace(&self, name: &str) -> ClusterResult<Namespace>;

    async fn get_pod(&self, namespace: &str, name: &str) -> ClusterResult<Pod>;
    async fn list_pods(&self, namespace: &str, selector: &str) -> ClusterResult<Vec<Pod>>;
    async fn get_service(&self, namespace: &str, name: &str) -> ClusterResult<Service>;
    async fn list_deployments(&self, namespace: &str, selector: &str)
    -> ClusterResult<Vec<Deployment>>;
    async fn get_daemon_set(&self, namespace: &str, name: &str) -> ClusterResult<DaemonSet>;
    async fn list_network_policies(
        &self,
        namespace: &str,
        selector: Option<&str>,
    ) -> ClusterResult<Vec<NetworkPolicy>>;

    /// Names of all installed custom resource definitions.
    async fn list_crds(&self) -> ClusterResult<Vec<String>>;

    /// Create or update the object described by `manifest`.
    async fn apply(&self, manifest: &Value) -> ClusterResult<()>;

    /// Delete one object. Missing objects surface as [`ClusterError::NotFound`].
    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> ClusterResult<()>;

    /// Read container logs (never follows).
    async fn pod_logs(&self, namespace: &str, pod: &str, request: &LogRequest)
    -> ClusterResult<String>;

    /// Run `command` in a container and return its stdout.
    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
        timeout: Option<Duration>,
    ) -> ClusterResult<String>;

    /// Start an ephemeral debug container; does not wait for it to finish.
    async fn start_debug_container(
        &self,
        namespace: &str,
        pod: &str,
        request: &DebugRequest,
    ) -> ClusterResult<()>;
}
