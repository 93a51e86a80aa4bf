//! Container logs and ad-hoc commands.

mod exec;
mod pod_logs;
mod proxy_logs;

pub use exec::{ExecPodCommandParams, ExecPodCommandTool};
pub use pod_logs::{GetPodLogsParams, GetPodLogsTool};
pub use proxy_logs::{GetIstioProxyLogsParams, GetIstioProxyLogsTool, LogLevel};
