//! Kubeconfig and cluster inspection tools.

mod cluster_info;
mod list_contexts;
mod switch_context;

pub use cluster_info::{GetClusterInfoParams, GetClusterInfoTool};
pub use list_contexts::{ListContextsParams, ListContextsTool};
pub use switch_context::{SwitchContextParams, SwitchContextTool};
