//! Manifests for the sleep and httpbin sample applications.

use serde_json::{Value, json};

use crate::cluster::ResourceKind;

/// Port httpbin listens on, in the container and on its Service.
pub const HTTPBIN_PORT: u16 = 8000;

/// The two workloads used for mesh connectivity testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleApp {
    /// A curl client that idles; the source of connectivity tests.
    Sleep,
    /// An HTTP echo server exposed through a Service.
    Httpbin,
}

impl SampleApp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::Httpbin => "httpbin",
        }
    }

    /// Label `istio-injection=enabled` onto the namespace, creating it if needed.
    pub fn namespace(namespace: &str) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": {
                "name": namespace,
                "labels": {"istio-injection": "enabled"}
            }
        })
    }

    fn labels(&self) -> Value {
        json!({"app": self.name(), "version": "v1"})
    }

    pub fn service_account(&self, namespace: &str) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {
                "name": self.name(),
                "namespace": namespace,
                "labels": self.labels()
            }
        })
    }

    pub fn deployment(&self, namespace: &str, replicas: u32) -> Value {
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": self.name(),
                "namespace": namespace,
                "labels": self.labels()
            },
            "spec": {
                "replicas": replicas,
                "selector": {"matchLabels": {"app": self.name()}},
                "template": {
                    "metadata": {"labels": self.labels()},
                    "spec": self.pod_spec()
                }
            }
        })
    }

    fn pod_spec(&self) -> Value {
        match self {
            Self::Sleep => json!({
                "serviceAccountName": "sleep",
                "containers": [{
                    "name": "sleep",
                    "image": "curlimages/curl:8.5.0",
                    "command": ["/bin/sleep", "infinity"],
                    "imagePullPolicy": "IfNotPresent",
                    "volumeMounts": [{"mountPath": "/etc/sleep/tls", "name": "secret-volume"}],
                    "resources": {
                        "requests": {"cpu": "10m", "memory": "32Mi"},
                        "limits": {"cpu": "100m", "memory": "128Mi"}
                    }
                }],
                "volumes": [{
                    "name": "secret-volume",
                    "secret": {"secretName": "sleep-secret", "optional": true}
                }]
            }),
            Self::Httpbin => json!({
                "serviceAccountName": "httpbin",
                "containers": [{
                    "name": "httpbin",
                    "image": "quay.io/sridhargaddam/kong/httpbin:latest",
                    "imagePullPolicy": "IfNotPresent",
                    "command": ["gunicorn", "-b", "[::]:8000", "httpbin:app", "-k", "gevent"],
                    "ports": [{"containerPort": HTTPBIN_PORT, "name": "http", "protocol": "TCP"}],
                    "resources": {
                        "requests": {"cpu": "10m", "memory": "64Mi"},
                        "limits": {"cpu": "100m", "memory": "256Mi"}
                    }
                }]
            }),
        }
    }

    /// The Service fronting the app, if it has one.
    pub fn service(&self, namespace: &str) -> Option<Value> {
        match self {
            Self::Sleep => None,
            Self::Httpbin => Some(json!({
                "apiVersion": "v1",
                "kind": "Service",
                "metadata": {
                    "name": "httpbin",
                    "namespace": namespace,
                    "labels": {"app": "httpbin", "service": "httpbin"}
                },
                "spec": {
                    "ports": [{
                        "name": "http",
                        "port": HTTPBIN_PORT,
                        "targetPort": HTTPBIN_PORT,
                        "protocol": "TCP"
                    }],
                    "selector": {"app": "httpbin"}
                }
            })),
        }
    }

    /// Objects to remove on undeploy, in deletion order.
    pub fn owned_resources(&self) -> &'static [ResourceKind] {
        match self {
            Self::Sleep => &[ResourceKind::Deployment, ResourceKind::ServiceAccount],
            Self::Httpbin => &[
                ResourceKind::Deployment,
                ResourceKind::Service,
                ResourceKind::ServiceAccount,
            ],
        }
    }
}
