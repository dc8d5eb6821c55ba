//! Resource nodes and the kind registry
//!
//! A [`ResourceNode`] is the declaration of one infrastructure object. Its
//! kind is a free-form tag (kinds form an open set); a [`KindRegistry`]
//! optionally documents which outputs a kind produces, so references to
//! outputs that will never exist are caught at build time.

use crate::types::{AttrValue, Attributes, Outputs, Reference};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Declaration of one infrastructure object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Logical name, unique within a stack
    pub id: String,
    /// Resource kind tag (e.g. "iam:role")
    pub kind: String,
    /// Attribute values, literal or references
    #[serde(default)]
    pub attributes: Attributes,
    /// Outputs, present only after the node has been applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Outputs>,
}

impl ResourceNode {
    /// Create a node with no attributes
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            attributes: Attributes::new(),
            outputs: None,
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// All references held in this node's attributes, in attribute order
    pub fn references(&self) -> Vec<&Reference> {
        let mut refs = Vec::new();
        for value in self.attributes.values() {
            value.collect_references(&mut refs);
        }
        refs
    }

    /// Whether the node has been applied
    pub fn is_applied(&self) -> bool {
        self.outputs.is_some()
    }

    /// Record the outputs of a successful apply
    ///
    /// Outputs are written once; returns `false` (and keeps the first
    /// outputs) if the node was already applied.
    pub fn record_outputs(&mut self, outputs: Outputs) -> bool {
        if self.outputs.is_some() {
            return false;
        }
        self.outputs = Some(outputs);
        true
    }
}

/// Registry documenting the outputs each resource kind produces
///
/// Kinds not present in the registry are accepted with any output key.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: BTreeMap<String, BTreeSet<String>>,
}

impl KindRegistry {
    /// Create an empty (fully permissive) registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Document the outputs of a kind, replacing any previous entry
    pub fn register<I, S>(&mut self, kind: impl Into<String>, outputs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kinds
            .insert(kind.into(), outputs.into_iter().map(Into::into).collect());
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_kind<I, S>(mut self, kind: impl Into<String>, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(kind, outputs);
        self
    }

    /// Check whether `kind` documents `output`
    ///
    /// Returns `None` when the kind is not registered.
    pub fn documents(&self, kind: &str, output: &str) -> Option<bool> {
        self.kinds.get(kind).map(|outputs| outputs.contains(output))
    }

    /// Documented outputs of a kind, if registered
    pub fn outputs(&self, kind: &str) -> Option<impl Iterator<Item = &str>> {
        self.kinds.get(kind).map(|o| o.iter().map(String::as_str))
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_references_in_attribute_order() {
        let node = ResourceNode::new("profile", "iam:instance_profile")
            .with_attr("roles", vec![Reference::new("job_role", "role_name")])
            .with_attr("name", "emr-profile")
            .with_attr("arn", Reference::new("admin", "role_arn"));

        let targets: Vec<_> = node.references().iter().map(|r| r.target.as_str()).collect();
        // attributes are ordered by key: arn, name, roles
        assert_eq!(targets, vec!["admin", "job_role"]);
    }

    #[test]
    fn test_outputs_recorded_once() {
        let mut node = ResourceNode::new("vpc", "ec2:vpc");
        assert!(!node.is_applied());
        assert!(node.record_outputs(Outputs::from([("vpc_id".into(), "vpc-1".into())])));
        assert!(!node.record_outputs(Outputs::from([("vpc_id".into(), "vpc-2".into())])));
        assert_eq!(node.outputs.unwrap()["vpc_id"], "vpc-1");
    }

    #[test]
    fn test_registry_documents() {
        let registry = KindRegistry::new().with_kind("iam:role", ["role_arn", "role_name"]);
        assert_eq!(registry.documents("iam:role", "role_arn"), Some(true));
        assert_eq!(registry.documents("iam:role", "stream_arn"), Some(false));
        assert_eq!(registry.documents("custom:thing", "anything"), None);
        assert_eq!(registry.kinds().collect::<Vec<_>>(), vec!["iam:role"]);
    }
}
