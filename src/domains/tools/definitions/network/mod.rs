//! Network inspection inside pods: packet filter rules, policies and routes.

mod iptables;
mod policies;
mod trace;

pub use iptables::{GetIptablesRulesParams, GetIptablesRulesTool, IptablesTable};
pub use policies::{GetNetworkPoliciesParams, GetNetworkPoliciesTool};
pub use trace::{TraceNetworkPathParams, TraceNetworkPathTool};
