//! # stackgraph
//!
//! Declarative resource graphs compiled into ordered provisioning plans.
//!
//! Resources are declared with typed attributes. An attribute may hold a
//! [`Reference`] to an output of another resource (an ARN, a role name, a
//! subnet id) that only exists once that resource has been applied. The
//! graph builder turns references into dependency edges, merges explicit
//! ordering constraints, and the planner produces a deterministic
//! topological order that an executor applies.
//!
//! ## Core Concepts
//!
//! - **ResourceNode**: One declared infrastructure object
//! - **Reference**: A pointer to another node's not-yet-known output
//! - **DependencyGraph**: Nodes plus implicit and explicit edges
//! - **ProvisioningPlan**: Topologically ordered nodes, grouped in layers
//! - **SuppressionSet**: Policy exceptions, never affecting order
//! - **Executor**: Applies a plan through a [`Provider`], layer by layer
//!
//! ## Example
//!
//! ```
//! use stackgraph::{Reference, ResourceNode, Stack};
//!
//! let mut stack = Stack::new("demo");
//! stack.declare(ResourceNode::new("role", "iam:role")).unwrap();
//! stack
//!     .declare(
//!         ResourceNode::new("profile", "iam:instance_profile")
//!             .with_attr("roles", vec![Reference::new("role", "role_name")]),
//!     )
//!     .unwrap();
//! stack.declare(ResourceNode::new("cluster", "emr:cluster")).unwrap();
//! stack.depends_on("profile", "cluster");
//! stack.suppress("cluster", "AwsSolutions-EMR2", "no S3 logging").unwrap();
//!
//! let compiled = stack.compile().unwrap();
//! assert_eq!(compiled.plan.order(), vec!["role", "profile", "cluster"]);
//! ```
//!
//! ## Provider Traits
//!
//! - [`Provider`]: Creates resources and returns their outputs
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This allows the crate to be used without hard dependencies on a
//! specific cloud API or UI framework.

pub mod annotator;
pub mod context;
pub mod error;
pub mod executor;
pub mod graph;
pub mod planner;
pub mod render;
pub mod resolver;
pub mod resource;
pub mod retry;
pub mod stack;
pub mod types;

// Re-export main types at crate root
pub use annotator::{NodeSet, NodeSuppressions, RuleSuppression, SuppressionSet};
pub use context::{
    ApplyResult, AutoConfirm, AutoDecline, ConfirmCallback, LogRetry, NoProgress,
    ProgressCallback, Provider, RetryCallback,
};
pub use error::{ApplyError, Error, Result};
pub use executor::{ExecutionReport, FailedNode, execute, execute_simple};
pub use graph::DependencyGraph;
pub use planner::{ProvisioningPlan, generate};
pub use resolver::ReferenceResolver;
pub use resource::{KindRegistry, ResourceNode};
pub use retry::with_retry;
pub use stack::{CompiledStack, Stack};
pub use types::{
    AttrValue, Attributes, Edge, EdgeKind, ExecuteOptions, Outputs, OutputsTable, Reference,
    RetryConfig, SuppressionRecord,
};
