//! Core types for declarative resource graphs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Attribute mapping of a resource node
pub type Attributes = BTreeMap<String, AttrValue>;

/// Outputs produced by applying one node (e.g. `role_arn`, `stream_arn`)
pub type Outputs = BTreeMap<String, String>;

/// Outputs of every applied node, keyed by node id
pub type OutputsTable = BTreeMap<String, Outputs>;

/// A symbolic pointer to an output of another node
///
/// The value only exists once the target has been applied. Carrying the
/// pointer as a value (rather than an interpolated string) lets the graph
/// builder discover dependency edges statically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    /// Id of the node producing the value
    #[serde(rename = "node")]
    pub target: String,
    /// Output key on the target node
    pub output: String,
}

impl Reference {
    /// Create a reference to `output` on node `target`
    pub fn new(target: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            output: output.into(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.output)
    }
}

/// A literal attribute value or a reference to another node's output
///
/// Serialized as plain JSON/TOML values; a map with the single key `ref`
/// holding `{ node, output }` is read back as a [`Reference`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AttrRepr", into = "AttrRepr")]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
    Ref(Reference),
}

impl AttrValue {
    /// Collect every reference in this value, depth first
    pub fn collect_references<'a>(&'a self, out: &mut Vec<&'a Reference>) {
        match self {
            Self::Ref(r) => out.push(r),
            Self::List(items) => items.iter().for_each(|v| v.collect_references(out)),
            Self::Map(entries) => entries.values().for_each(|v| v.collect_references(out)),
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_) => {}
        }
    }

    /// Check whether this value contains any reference
    pub fn has_references(&self) -> bool {
        match self {
            Self::Ref(_) => true,
            Self::List(items) => items.iter().any(Self::has_references),
            Self::Map(entries) => entries.values().any(Self::has_references),
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_) => false,
        }
    }

    /// Get the value as a string slice, if it is a string literal
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Ref(r) => write!(f, "${{{r}}}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k} = {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Reference> for AttrValue {
    fn from(v: Reference) -> Self {
        Self::Ref(v)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// Wire form of [`AttrValue`]
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AttrRepr {
    Ref(RefMarker),
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RefMarker {
    #[serde(rename = "ref")]
    reference: Reference,
}

impl From<AttrRepr> for AttrValue {
    fn from(repr: AttrRepr) -> Self {
        match repr {
            AttrRepr::Ref(m) => Self::Ref(m.reference),
            AttrRepr::Bool(b) => Self::Bool(b),
            AttrRepr::Int(i) => Self::Int(i),
            AttrRepr::Float(x) => Self::Float(x),
            AttrRepr::Str(s) => Self::Str(s),
            AttrRepr::List(items) => Self::List(items),
            AttrRepr::Map(entries) => Self::Map(entries),
        }
    }
}

impl From<AttrValue> for AttrRepr {
    fn from(value: AttrValue) -> Self {
        match value {
            AttrValue::Ref(reference) => Self::Ref(RefMarker { reference }),
            AttrValue::Bool(b) => Self::Bool(b),
            AttrValue::Int(i) => Self::Int(i),
            AttrValue::Float(x) => Self::Float(x),
            AttrValue::Str(s) => Self::Str(s),
            AttrValue::List(items) => Self::List(items),
            AttrValue::Map(entries) => Self::Map(entries),
        }
    }
}

/// How an edge entered the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Derived from a reference in the dependent node's attributes
    Implicit,
    /// Declared manually as an ordering constraint
    Explicit,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Implicit => write!(f, "implicit"),
            EdgeKind::Explicit => write!(f, "explicit"),
        }
    }
}

/// A dependency edge: `from` must be applied before `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl Edge {
    /// Create an explicit ordering edge
    pub fn explicit(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Explicit,
        }
    }

    /// Create an implicit (reference-derived) edge
    pub fn implicit(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Implicit,
        }
    }
}

/// Metadata justifying why a policy rule is intentionally not satisfied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionRecord {
    pub node: String,
    pub rule: String,
    pub reason: String,
}

/// Retry configuration with exponential backoff
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        // from_secs_f64 panics on negative input
        let capped = delay.min(self.max_delay.as_secs_f64()).max(0.0);
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't apply anything, just report what would happen
    pub dry_run: bool,
    /// Number of parallel jobs per plan layer (1 = strict plan order)
    pub jobs: usize,
    /// Retry policy for retryable apply errors
    pub retry: RetryConfig,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            retry: RetryConfig::default(),
        }
    }
}
