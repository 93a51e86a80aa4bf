//! Chart installation through the `helm` CLI.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::command::{CommandRunner, CommandSpec};
use super::error::{ClusterError, ClusterResult};
use crate::core::config::ClusterConfig;

/// A chart repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRepo {
    pub name: &'static str,
    pub url: &'static str,
}

/// A single `helm install`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallRequest {
    pub release: String,
    pub chart: String,
    pub namespace: String,
    pub version: Option<String>,
    pub create_namespace: bool,
    /// Top-level value keys, each passed as `--set-json key=<json>`.
    pub values: BTreeMap<String, Value>,
    pub wait: bool,
    /// Go-style duration passed to `--timeout`.
    pub timeout: String,
}

impl InstallRequest {
    pub fn new(
        release: impl Into<String>,
        chart: impl Into<String>,
        namespace: impl Into<String>,
        timeout: impl Into<String>,
    ) -> Self {
        Self {
            release: release.into(),
            chart: chart.into(),
            namespace: namespace.into(),
            version: None,
            create_namespace: false,
            values: BTreeMap::new(),
            wait: true,
            timeout: timeout.into(),
        }
    }

    pub fn create_namespace(mut self) -> Self {
        self.create_namespace = true;
        self
    }

    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = version.filter(|v| !v.is_empty());
        self
    }

    pub fn values(mut self, values: BTreeMap<String, Value>) -> Self {
        self.values = values;
        self
    }

    /// Arguments for `helm`, without connection flags.
    pub fn to_args(&self) -> ClusterResult<Vec<String>> {
        let mut args = vec![
            "install".to_string(),
            self.release.clone(),
            self.chart.clone(),
            "--namespace".to_string(),
            self.namespace.clone(),
        ];
        if self.create_namespace {
            args.push("--create-namespace".to_string());
        }
        if let Some(version) = &self.version {
            args.extend(["--version".to_string(), version.clone()]);
        }
        if self.wait {
            args.push("--wait".to_string());
            if !self.timeout.is_empty() {
                args.extend(["--timeout".to_string(), self.timeout.clone()]);
            }
        }
        for (key, value) in &self.values {
            let json = serde_json::to_string(value).map_err(|e| ClusterError::parse(format!("value for key {}", key), e))?;
            args.extend(["--set-json".to_string(), format!("{}={}", key, json)]);
        }
        Ok(args)
    }
}

/// A single `helm uninstall`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UninstallRequest {
    pub release: String,
    pub namespace: String,
    pub wait: bool,
    pub timeout: String,
}

impl UninstallRequest {
    pub fn new(release: impl Into<String>, namespace: impl Into<String>, timeout: impl Into<String>) -> Self {
        Self {
            release: release.into(),
            namespace: namespace.into(),
            wait: true,
            timeout: timeout.into(),
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "uninstall".to_string(),
            self.release.clone(),
            "--namespace".to_string(),
            self.namespace.clone(),
        ];
        if self.wait {
            args.push("--wait".to_string());
            if !self.timeout.is_empty() {
                args.extend(["--timeout".to_string(), self.timeout.clone()]);
            }
        }
        args
    }
}

/// One entry of `helm list --output json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub chart: String,
    #[serde(default)]
    pub app_version: String,
}

impl Release {
    /// Chart version when known, else the app version.
    pub fn version(&self) -> Option<&str> {
        [self.chart.as_str(), self.app_version.as_str()]
            .into_iter()
            .find(|v| !v.is_empty())
    }
}

/// Installs and removes chart releases.
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Fail when the package manager cannot be run at all.
    async fn ensure_available(&self) -> ClusterResult<()>;

    /// Register a repository (tolerating an existing one) and refresh its index.
    async fn add_repo(&self, repo: &ChartRepo) -> ClusterResult<()>;

    async fn install(&self, request: &InstallRequest) -> ClusterResult<()>;

    /// Missing releases surface as [`ClusterError::NotFound`].
    async fn uninstall(&self, request: &UninstallRequest) -> ClusterResult<()>;

    async fn list_releases(&self, namespace: &str, filter: &str) -> ClusterResult<Vec<Release>>;
}

/// Package manager that shells out to `helm`.
pub struct HelmCli {
    runner: Arc<dyn CommandRunner>,
    binary: String,
    kubeconfig: Option<PathBuf>,
    kube_context: String,
}

impl HelmCli {
    /// Create a helm client bound to the same kube context as the cluster client.
    pub fn new(runner: Arc<dyn CommandRunner>, config: &ClusterConfig, kube_context: impl Into<String>) -> Self {
        Self {
            runner,
            binary: config.helm_path.clone(),
            kubeconfig: config.kubeconfig.clone(),
            kube_context: kube_context.into(),
        }
    }

    async fn helm(&self, args: Vec<String>, with_cluster: bool) -> ClusterResult<String> {
        let mut full = Vec::with_capacity(args.len() + 4);
        if with_cluster {
            if let Some(path) = &self.kubeconfig {
                full.extend(["--kubeconfig".to_string(), path.display().to_string()]);
            }
            if !self.kube_context.is_empty() {
                full.extend(["--kube-context".to_string(), self.kube_context.clone()]);
            }
        }
        full.extend(args);
        let output = self.runner.run(CommandSpec::new(&self.binary, full)).await?;

        // helm prints its errors on stderr but some progress on stdout; keep both.
        if output.success() {
            Ok(output.stdout)
        } else {
            let combined = format!("{}{}", output.stdout, output.stderr);
            Err(ClusterError::from_stderr(&self.binary, &combined))
        }
    }
}

#[async_trait]
impl PackageManager for HelmCli {
    async fn ensure_available(&self) -> ClusterResult<()> {
        let version = self.helm(vec!["version".into(), "--short".into()], false).await?;
        debug!("helm version: {}", version.trim());
        Ok(())
    }

    async fn add_repo(&self, repo: &ChartRepo) -> ClusterResult<()> {
        match self
            .helm(
                vec!["repo".into(), "add".into(), repo.name.into(), repo.url.into()],
                false,
            )
            .await
        {
            Ok(_) => info!("Added helm repository {}", repo.name),
            Err(e) if e.is_already_exists() => debug!("helm repository {} already present", repo.name),
            Err(e) => return Err(e),
        }
        self.helm(vec!["repo".into(), "update".into(), repo.name.into()], false)
            .await
            .map(|_| ())
    }

    async fn install(&self, request: &InstallRequest) -> ClusterResult<()> {
        let output = self.helm(request.to_args()?, true).await?;
        info!("helm install {}: {}", request.release, output.trim());
        Ok(())
    }

    async fn uninstall(&self, request: &UninstallRequest) -> ClusterResult<()> {
        let output = self.helm(request.to_args(), true).await?;
        info!("helm uninstall {}: {}", request.release, output.trim());
        Ok(())
    }

    async fn list_releases(&self, namespace: &str, filter: &str) -> ClusterResult<Vec<Release>> {
        let stdout = self
            .helm(
                vec![
                    "list".into(),
                    "--namespace".into(),
                    namespace.into(),
                    "--filter".into(),
                    filter.into(),
                    "--output".into(),
                    "json".into(),
                ],
                true,
            )
            .await?;
        serde_json::from_str(&stdout).map_err(|e| ClusterError::parse("helm releases", e))
    }
}
