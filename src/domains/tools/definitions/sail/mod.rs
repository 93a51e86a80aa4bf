//! Sail operator lifecycle.

mod install;
mod status;
mod uninstall;

pub use install::{InstallSailOperatorParams, InstallSailOperatorTool};
pub use status::{CheckSailStatusParams, CheckSailStatusTool};
pub use uninstall::{UninstallSailOperatorParams, UninstallSailOperatorTool};

use crate::cluster::ChartRepo;

pub(crate) const SAIL_REPO: ChartRepo = ChartRepo {
    name: "sail-operator",
    url: "https://istio-ecosystem.github.io/sail-operator",
};

const SAIL_CHART: &str = "sail-operator/sail-operator";

fn default_sail_namespace() -> String {
    "sail-operator".to_string()
}

fn default_release_name() -> String {
    "sail-operator".to_string()
}
