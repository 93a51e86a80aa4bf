//! Istio control plane lifecycle through the upstream Helm charts.

mod install;
mod status;
mod uninstall;

pub use install::{InstallIstioParams, InstallIstioTool};
pub use status::{CheckIstioStatusParams, CheckIstioStatusTool};
pub use uninstall::{UninstallIstioParams, UninstallIstioTool};

use crate::cluster::ChartRepo;

pub(crate) const ISTIO_REPO: ChartRepo = ChartRepo {
    name: "istio",
    url: "https://istio-release.storage.googleapis.com/charts",
};

const BASE_RELEASE: &str = "istio-base";
const ISTIOD_RELEASE: &str = "istiod";
const CNI_RELEASE: &str = "istio-cni";
const GATEWAY_RELEASE: &str = "istio-ingress";

fn default_istio_namespace() -> String {
    "istio-system".to_string()
}

fn default_gateway_namespace() -> String {
    "istio-ingress".to_string()
}
