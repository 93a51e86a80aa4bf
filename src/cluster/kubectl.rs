//! `kubectl`-backed [`ClusterClient`].
//!
//! Every invocation pins `--context` to the context that was current when the
//! client connected, so persisting a different current-context in the
//! kubeconfig does not move a running server to another cluster.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::command::{CommandRunner, CommandSpec};
use super::error::{ClusterError, ClusterResult};
use super::model::*;
use super::{ClusterClient, DebugRequest, LogRequest, ResourceKind};
use crate::core::config::ClusterConfig;

/// Cluster client that shells out to `kubectl`.
pub struct KubectlClient {
    runner: Arc<dyn CommandRunner>,
    binary: String,
    kubeconfig: Option<PathBuf>,
    context: String,
    request_timeout: Duration,
    debug_timeout: Duration,
}

impl KubectlClient {
    /// Resolve the context to use and verify the kubeconfig is readable.
    ///
    /// The context comes from the configuration when set, otherwise from the
    /// kubeconfig's `current-context`.
    pub async fn connect(
        runner: Arc<dyn CommandRunner>,
        config: &ClusterConfig,
    ) -> ClusterResult<Self> {
        let mut client = Self {
            runner,
            binary: config.kubectl_path.clone(),
            kubeconfig: config.kubeconfig.clone(),
            context: String::new(),
            request_timeout: config.request_timeout(),
            debug_timeout: config.debug_timeout(),
        };

        let context = match &config.context {
            Some(context) => context.clone(),
            None => client
                .run(vec!["config".into(), "current-context".into()], false)
                .await?
                .trim()
                .to_string(),
        };

        if context.is_empty() {
            return Err(ClusterError::CommandFailed {
                program: client.binary.clone(),
                message: "kubeconfig has no current context".to_string(),
            });
        }

        info!("Using Kubernetes context '{}'", context);
        client.context = context;
        Ok(client)
    }

    /// Build the full argument list, prefixed with the connection flags.
    fn args(&self, args: Vec<String>, pin_context: bool) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 4);
        if let Some(path) = &self.kubeconfig {
            full.push("--kubeconfig".to_string());
            full.push(path.display().to_string());
        }
        if pin_context && !self.context.is_empty() {
            full.push("--context".to_string());
            full.push(self.context.clone());
        }
        full.extend(args);
        full
    }

    async fn run(&self, args: Vec<String>, pin_context: bool) -> ClusterResult<String> {
        let spec = CommandSpec::new(&self.binary, self.args(args, pin_context))
            .with_timeout(Some(self.request_timeout));
        self.runner.run(spec).await?.into_stdout(&self.binary)
    }

    async fn kubectl(&self, args: Vec<String>) -> ClusterResult<String> {
        self.run(args, true).await
    }

    async fn kubectl_json<T: DeserializeOwned>(&self, what: &str, args: Vec<String>) -> ClusterResult<T> {
        let stdout = self.kubectl(args).await?;
        serde_json::from_str(&stdout).map_err(|e| ClusterError::parse(what, e))
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, namespace: Option<&str>, name: &str) -> ClusterResult<T> {
        let mut args = vec!["get".to_string(), resource.to_string(), name.to_string()];
        if let Some(ns) = namespace {
            args.extend(["-n".to_string(), ns.to_string()]);
        }
        args.extend(["-o".to_string(), "json".to_string()]);
        self.kubectl_json(resource, args).await
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        namespace: Option<&str>,
        selector: Option<&str>,
    ) -> ClusterResult<Vec<T>> {
        let mut args = vec!["get".to_string(), resource.to_string()];
        if let Some(ns) = namespace {
            args.extend(["-n".to_string(), ns.to_string()]);
        }
        if let Some(selector) = selector.filter(|s| !s.is_empty()) {
            args.extend(["-l".to_string(), selector.to_string()]);
        }
        args.extend(["-o".to_string(), "json".to_string()]);
        let list: ObjectList<T> = self.kubectl_json(resource, args).await?;
        Ok(list.items)
    }
}

#[async_trait]
impl ClusterClient for KubectlClient {
    fn context_name(&self) -> &str {
        &self.context
    }

    async fn kubeconfig(&self) -> ClusterResult<KubeConfigView> {
        // Unpinned, unminified: every context, not just ours.
        let stdout = self
            .run(
                vec!["config".into(), "view".into(), "-o".into(), "json".into()],
                false,
            )
            .await?;
        serde_json::from_str(&stdout).map_err(|e| ClusterError::parse("kubeconfig", e))
    }

    async fn use_context(&self, name: &str) -> ClusterResult<()> {
        self.run(
            vec!["config".into(), "use-context".into(), name.to_string()],
            false,
        )
        .await
        .map(|_| ())
    }

    async fn server_version(&self) -> ClusterResult<String> {
        let version: Value = self
            .kubectl_json("server version", vec!["version".into(), "-o".into(), "json".into()])
            .await?;
        version
            .pointer("/serverVersion/gitVersion")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ClusterError::parse("server version", "serverVersion.gitVersion missing"))
    }

    async fn list_nodes(&self) -> ClusterResult<Vec<Node>> {
        self.list("nodes", None, None).await
    }

    async fn list_namespaces(&self) -> ClusterResult<Vec<Namespace>> {
        self.list("namespaces", None, None).await
    }

    async fn get_namespace(&self, name: &str) -> ClusterResult<Namespace> {
        self.get("namespace", None, name).await
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> ClusterResult<Pod> {
        self.get("pod", Some(namespace), name).await
    }

    async fn list_pods(&self, namespace: &str, selector: &str) -> ClusterResult<Vec<Pod>> {
        self.list("pods", Some(namespace), Some(selector)).await
    }

    async fn get_service(&self, namespace: &str, name: &str) -> ClusterResult<Service> {
        self.get("service", Some(namespace), name).await
    }

    async fn list_deployments(&self, namespace: &str, selector: &str) -> ClusterResult<Vec<Deployment>> {
        self.list("deployments", Some(namespace), Some(selector)).await
    }

    async fn get_daemon_set(&self, namespace: &str, name: &str) -> ClusterResult<DaemonSet> {
        self.get("daemonset", Some(namespace), name).await
    }

    async fn list_network_policies(
        &self,
        namespace: &str,
        selector: Option<&str>,
    ) -> ClusterResult<Vec<NetworkPolicy>> {
        self.list("networkpolicies", Some(namespace), selector).await
    }

    async fn list_crds(&self) -> ClusterResult<Vec<String>> {
        let stdout = self
            .kubectl(vec!["get".into(), "crd".into(), "-o".into(), "name".into()])
            .await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| l.rsplit('/').next().unwrap_or(l).to_string())
            .collect())
    }

    async fn apply(&self, manifest: &Value) -> ClusterResult<()> {
        let body = serde_json::to_string(manifest).map_err(|e| ClusterError::parse("manifest", e))?;
        let spec = CommandSpec::new(
            &self.binary,
            self.args(vec!["apply".into(), "-f".into(), "-".into()], true),
        )
        .with_stdin(body)
        .with_timeout(Some(self.request_timeout));
        let stdout = self.runner.run(spec).await?.into_stdout(&self.binary)?;
        debug!("kubectl apply: {}", stdout.trim());
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, namespace: Option<&str>, name: &str) -> ClusterResult<()> {
        let mut args = vec!["delete".to_string(), kind.as_str().to_string(), name.to_string()];
        if let Some(ns) = namespace.filter(|_| kind.is_namespaced()) {
            args.extend(["-n".to_string(), ns.to_string()]);
        }
        self.kubectl(args).await.map(|_| ())
    }

    async fn pod_logs(&self, namespace: &str, pod: &str, request: &LogRequest) -> ClusterResult<String> {
        let mut args = vec![
            "logs".to_string(),
            pod.to_string(),
            "-n".to_string(),
            namespace.to_string(),
            "-c".to_string(),
            request.container.clone(),
            format!("--tail={}", request.tail_lines),
        ];
        if request.timestamps {
            args.push("--timestamps".to_string());
        }
        if let Some(since) = &request.since {
            args.push(format!("--since={}", since));
        }
        if request.previous {
            args.push("--previous".to_string());
        }
        self.kubectl(args).await
    }

    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
        timeout: Option<Duration>,
    ) -> ClusterResult<String> {
        let mut args = vec![
            "exec".to_string(),
            pod.to_string(),
            "-n".to_string(),
            namespace.to_string(),
            "-c".to_string(),
            container.to_string(),
            "--".to_string(),
        ];
        args.extend(command.iter().cloned());

        let spec = CommandSpec::new(&self.binary, self.args(args, true)).with_timeout(timeout);
        let output = self.runner.run(spec).await?;
        if output.success() {
            return Ok(output.stdout);
        }
        Err(ClusterError::CommandFailed {
            program: self.binary.clone(),
            message: format!(
                "command failed with {}, stderr: {}",
                output
                    .status
                    .map(|c| format!("exit code {}", c))
                    .unwrap_or_else(|| "signal".to_string()),
                output.stderr.trim()
            ),
        })
    }

    async fn start_debug_container(&self, namespace: &str, pod: &str, request: &DebugRequest) -> ClusterResult<()> {
        let mut args = vec![
            "debug".to_string(),
            pod.to_string(),
            "-n".to_string(),
            namespace.to_string(),
            format!("--image={}", request.image),
            "--profile=sysadmin".to_string(),
            "--quiet".to_string(),
            "--attach=false".to_string(),
            "--stdin=false".to_string(),
            "-c".to_string(),
            request.container_name.clone(),
            "--".to_string(),
        ];
        args.extend(request.command.iter().cloned());

        let spec = CommandSpec::new(&self.binary, self.args(args, true))
            .with_timeout(Some(self.debug_timeout));
        self.runner.run(spec).await?.into_stdout(&self.binary).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::command::CommandOutput;
    use crate::testing::RecordingRunner;
    use serde_json::json;

    fn config() -> ClusterConfig {
        ClusterConfig {
            kubeconfig: Some(PathBuf::from("/tmp/kubeconfig")),
            ..ClusterConfig::default()
        }
    }

    async fn connected(runner: Arc<RecordingRunner>) -> KubectlClient {
        runner.push(CommandOutput::ok("kind-mesh\n"));
        KubectlClient::connect(runner, &config()).await.unwrap()
    }

    #[tokio::test]
    async fn test_connect_reads_current_context() {
        let runner = Arc::new(RecordingRunner::new());
        let client = connected(runner.clone()).await;

        assert_eq!(client.context_name(), "kind-mesh");
        assert_eq!(
            runner.calls()[0].args,
            vec!["--kubeconfig", "/tmp/kubeconfig", "config", "current-context"]
        );
    }

    #[tokio::test]
    async fn test_connect_fails_without_kubeconfig() {
        let runner = Arc::new(RecordingRunner::new());
        runner.push(CommandOutput::failed(1, "error: current-context is not set"));
        let result = KubectlClient::connect(runner, &config()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_calls_are_pinned_to_context() {
        let runner = Arc::new(RecordingRunner::new());
        let client = connected(runner.clone()).await;
        runner.push(CommandOutput::ok(
            json!({"metadata": {"name": "sleep-1", "namespace": "default"}}).to_string(),
        ));

        let pod = client.get_pod("default", "sleep-1").await.unwrap();
        assert_eq!(pod.metadata.name, "sleep-1");
        assert_eq!(
            runner.calls()[1].args,
            vec![
                "--kubeconfig", "/tmp/kubeconfig", "--context", "kind-mesh", "get", "pod",
                "sleep-1", "-n", "default", "-o", "json"
            ]
        );
    }

    #[tokio::test]
    async fn test_list_with_selector() {
        let runner = Arc::new(RecordingRunner::new());
        let client = connected(runner.clone()).await;
        runner.push(CommandOutput::ok(r#"{"items":[{"metadata":{"name":"istiod"}}]}"#));

        let deployments = client.list_deployments("istio-system", "app=istiod").await.unwrap();
        assert_eq!(deployments.len(), 1);
        let args = &runner.calls()[1].args;
        assert!(args.windows(2).any(|w| w == ["-l", "app=istiod"]));
    }

    #[tokio::test]
    async fn test_apply_sends_manifest_on_stdin() {
        let runner = Arc::new(RecordingRunner::new());
        let client = connected(runner.clone()).await;
        let manifest = json!({"apiVersion": "v1", "kind": "Namespace", "metadata": {"name": "demo"}});

        client.apply(&manifest).await.unwrap();
        let call = &runner.calls()[1];
        assert!(call.args.ends_with(&["apply".to_string(), "-f".to_string(), "-".to_string()]));
        let sent: Value = serde_json::from_str(call.stdin.as_deref().unwrap()).unwrap();
        assert_eq!(sent, manifest);
    }

    #[tokio::test]
    async fn test_crd_names_are_stripped() {
        let runner = Arc::new(RecordingRunner::new());
        let client = connected(runner.clone()).await;
        runner.push(CommandOutput::ok(
            "customresourcedefinition.apiextensions.k8s.io/gateways.networking.istio.io\n\
             customresourcedefinition.apiextensions.k8s.io/certificates.cert-manager.io\n",
        ));

        let crds = client.list_crds().await.unwrap();
        assert_eq!(crds, vec!["gateways.networking.istio.io", "certificates.cert-manager.io"]);
    }

    #[tokio::test]
    async fn test_exec_failure_carries_stderr() {
        let runner = Arc::new(RecordingRunner::new());
        let client = connected(runner.clone()).await;
        runner.push(CommandOutput::failed(7, "curl: (7) Failed to connect"));

        let command = vec!["curl".to_string(), "http://httpbin:8000".to_string()];
        let err = client
            .exec("default", "sleep-1", "sleep", &command, Some(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to connect"));
        assert_eq!(runner.calls()[1].timeout, Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_logs_flags() {
        let runner = Arc::new(RecordingRunner::new());
        let client = connected(runner.clone()).await;
        runner.push(CommandOutput::ok("line\n"));

        let request = LogRequest {
            container: "istio-proxy".to_string(),
            tail_lines: 50,
            since: Some("10m".to_string()),
            previous: true,
            timestamps: true,
        };
        client.pod_logs("default", "httpbin-1", &request).await.unwrap();
        let args = &runner.calls()[1].args;
        for flag in ["--tail=50", "--timestamps", "--since=10m", "--previous"] {
            assert!(args.contains(&flag.to_string()), "missing {}", flag);
        }
    }
}
