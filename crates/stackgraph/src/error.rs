//! Error types for stack compilation and execution.
//!
//! Compilation errors (everything except [`Error::Apply`] and
//! [`Error::UnresolvedReference`]) are raised before any resource is applied.
//! Apply errors are split into retryable and fatal so the executor can decide
//! whether to back off and try again.

use thiserror::Error;

/// Error returned by a [`Provider`](crate::Provider) when applying a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// Transient failure (throttling, timeouts); worth retrying
    #[error("retryable: {message}")]
    Retryable {
        /// Details from the provider
        message: String,
    },

    /// Permanent failure; aborts the remaining plan
    #[error("fatal: {message}")]
    Fatal {
        /// Details from the provider
        message: String,
    },
}

impl ApplyError {
    /// Create a retryable error.
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Retryable {
            message: message.into(),
        }
    }

    /// Create a fatal error.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }
}

/// Errors that can occur while declaring, compiling or applying a stack.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Two nodes were declared with the same id
    #[error("duplicate node id: {id}")]
    DuplicateNodeId {
        /// The repeated id
        id: String,
    },

    /// An attribute references a node that was never declared
    #[error("node '{node}' references undeclared node '{target}'")]
    DanglingReference {
        /// Node holding the reference
        node: String,
        /// Missing target
        target: String,
    },

    /// A node depends on itself
    #[error("invalid dependency: node '{node}' depends on itself")]
    InvalidDependency {
        /// The self-dependent node
        node: String,
    },

    /// The dependency graph contains a cycle
    #[error("dependency cycle: {}", format_cycle(.cycle))]
    Cycle {
        /// Node ids forming the cycle; the last one depends back on the first
        cycle: Vec<String>,
    },

    /// A reference was resolved before its target produced outputs
    #[error("unresolved reference: {target}.{output}")]
    UnresolvedReference {
        /// Target node
        target: String,
        /// Output key on the target
        output: String,
    },

    /// An operation named a node that is not declared
    #[error("unknown node: {id}")]
    UnknownNode {
        /// The unknown id
        id: String,
    },

    /// A reference asks for an output the target's kind does not produce
    #[error("node '{node}' references output '{output}' which kind '{kind}' of '{target}' does not produce")]
    UnknownOutput {
        /// Node holding the reference
        node: String,
        /// Target node
        target: String,
        /// Kind of the target node
        kind: String,
        /// Requested output key
        output: String,
    },

    /// Applying a node failed
    #[error("failed to apply '{node}': {source}")]
    Apply {
        /// Node that failed
        node: String,
        /// Provider error
        #[source]
        source: ApplyError,
    },
}

impl Error {
    /// Whether this error is raised during compilation, before any apply.
    pub fn is_compile_error(&self) -> bool {
        !matches!(self, Self::Apply { .. } | Self::UnresolvedReference { .. })
    }
}

fn format_cycle(cycle: &[String]) -> String {
    let mut out = cycle.join(" -> ");
    if let Some(first) = cycle.first() {
        out.push_str(" -> ");
        out.push_str(first);
    }
    out
}

/// Result type for stack operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_error_retryable() {
        assert!(ApplyError::retryable("throttled").is_retryable());
        assert!(!ApplyError::fatal("access denied").is_retryable());
    }

    #[test]
    fn test_cycle_display_closes_loop() {
        let err = Error::Cycle {
            cycle: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle: a -> b -> a");
    }

    #[test]
    fn test_compile_error_classification() {
        assert!(Error::DuplicateNodeId { id: "x".into() }.is_compile_error());
        assert!(
            !Error::Apply {
                node: "x".into(),
                source: ApplyError::fatal("boom"),
            }
            .is_compile_error()
        );
    }
}
