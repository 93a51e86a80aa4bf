//! Tool definitions module.
//!
//! This module exports all available tool definitions, grouped by area.
//! Each tool is defined in its own file.

mod common;

pub mod apps;
pub mod cluster;
pub mod connectivity;
pub mod istio;
pub mod logs;
pub mod network;
pub mod sail;

pub use apps::{
    DeployAppParams, DeployHttpbinAppTool, DeploySleepAppTool, UndeployAppParams,
    UndeployHttpbinAppTool, UndeploySleepAppTool,
};
pub use cluster::{GetClusterInfoTool, ListContextsTool, SwitchContextParams, SwitchContextTool};
pub use connectivity::{
    Protocol, TestConnectivityParams, TestConnectivityTool, TestSleepToHttpbinParams,
    TestSleepToHttpbinTool,
};
pub use istio::{CheckIstioStatusTool, InstallIstioParams, InstallIstioTool, UninstallIstioTool};
pub use logs::{
    ExecPodCommandParams, ExecPodCommandTool, GetIstioProxyLogsParams, GetIstioProxyLogsTool,
    GetPodLogsParams, GetPodLogsTool,
};
pub use network::{
    GetIptablesRulesParams, GetIptablesRulesTool, GetNetworkPoliciesParams,
    GetNetworkPoliciesTool, TraceNetworkPathParams, TraceNetworkPathTool,
};
pub use sail::{CheckSailStatusTool, InstallSailOperatorParams, InstallSailOperatorTool, UninstallSailOperatorTool};
