//! In-mesh connectivity checks run from inside a client pod.

mod attempt;
mod sleep_to_httpbin;
mod test_connectivity;

pub use sleep_to_httpbin::{TestSleepToHttpbinParams, TestSleepToHttpbinTool};
pub use test_connectivity::{Protocol, TestConnectivityParams, TestConnectivityTool};

pub(crate) use attempt::client_container;
