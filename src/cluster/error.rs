//! Errors raised by the cluster collaborators.
//!
//! `kubectl` and `helm` report failures as free text on stderr. The variants
//! below are the handful of outcomes the tools branch on; everything else is
//! carried through verbatim in [`ClusterError::CommandFailed`].

use std::time::Duration;
use thiserror::Error;

/// Result type for cluster operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors that can occur while talking to the cluster or the package manager.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The requested object or release does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The credentials in use are not allowed to perform the operation.
    #[error("{0}")]
    Forbidden(String),

    /// The object or repository being created already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// The external command exited unsuccessfully.
    #[error("{program} failed: {message}")]
    CommandFailed { program: String, message: String },

    /// The external command did not finish in time.
    #[error("{program} timed out after {}s", after.as_secs())]
    Timeout { program: String, after: Duration },

    /// The external command could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command output could not be decoded.
    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },
}

impl ClusterError {
    /// Classify the stderr of a failed command.
    pub fn from_stderr(program: impl Into<String>, stderr: &str) -> Self {
        let message = stderr.trim().to_string();
        let lower = message.to_lowercase();

        if lower.contains("(notfound)") || lower.contains("not found") {
            Self::NotFound(message)
        } else if lower.contains("(forbidden)") || lower.contains("forbidden") {
            Self::Forbidden(message)
        } else if lower.contains("(alreadyexists)") || lower.contains("already exists") {
            Self::AlreadyExists(message)
        } else {
            Self::CommandFailed {
                program: program.into(),
                message,
            }
        }
    }

    /// Create a parse error.
    pub fn parse(what: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error means the target does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error means the target already exists.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_kubectl_not_found() {
        let err = ClusterError::from_stderr(
            "kubectl",
            "Error from server (NotFound): pods \"sleep-abcde\" not found\n",
        );
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Error from server (NotFound): pods \"sleep-abcde\" not found"
        );
    }

    #[test]
    fn test_classify_helm_release_not_found() {
        let err = ClusterError::from_stderr("helm", "Error: uninstall: Release not loaded: istio-ingress: release: not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_classify_repo_already_exists() {
        let err = ClusterError::from_stderr(
            "helm",
            "Error: repository name (istio) already exists, please specify a different name",
        );
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_classify_forbidden() {
        let err = ClusterError::from_stderr(
            "kubectl",
            "Error from server (Forbidden): nodes is forbidden: User \"dev\" cannot list resource",
        );
        assert!(matches!(err, ClusterError::Forbidden(_)));
    }

    #[test]
    fn test_unclassified_keeps_program_and_message() {
        let err = ClusterError::from_stderr("kubectl", "error: unable to upgrade connection");
        assert_eq!(
            err.to_string(),
            "kubectl failed: error: unable to upgrade connection"
        );
    }
}
