//! Reference resolution
//!
//! The resolver records which references each node holds at declaration
//! time and, once targets have been applied, turns references into concrete
//! values. Resolution is a pure lookup against a caller-supplied outputs
//! table.

use crate::error::{Error, Result};
use crate::types::{AttrValue, Attributes, OutputsTable, Reference};
use std::collections::HashMap;

/// Records the references of declared nodes and resolves them against outputs
#[derive(Debug, Clone, Default)]
pub struct ReferenceResolver {
    references: HashMap<String, Vec<Reference>>,
}

impl ReferenceResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node's attributes, recording the references they contain
    ///
    /// Nothing is resolved here; a later declaration with the same id
    /// replaces the recorded references.
    pub fn declare(&mut self, node_id: &str, attributes: &Attributes) {
        let mut found = Vec::new();
        for value in attributes.values() {
            value.collect_references(&mut found);
        }
        log::trace!("declared '{}' with {} reference(s)", node_id, found.len());
        self.references
            .insert(node_id.to_string(), found.into_iter().cloned().collect());
    }

    /// References recorded for a node, in attribute order
    pub fn references(&self, node_id: &str) -> &[Reference] {
        self.references
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve `output` of node `target` against the outputs table
    pub fn resolve<'a>(
        &self,
        target: &str,
        output: &str,
        outputs: &'a OutputsTable,
    ) -> Result<&'a str> {
        outputs
            .get(target)
            .and_then(|o| o.get(output))
            .map(String::as_str)
            .ok_or_else(|| Error::UnresolvedReference {
                target: target.to_string(),
                output: output.to_string(),
            })
    }

    /// Copy an attribute map, replacing every reference with its value
    ///
    /// Fails on the first reference whose target has not produced the
    /// requested output.
    pub fn resolve_attributes(
        &self,
        attributes: &Attributes,
        outputs: &OutputsTable,
    ) -> Result<Attributes> {
        let mut resolved = Attributes::new();
        for (key, value) in attributes {
            resolved.insert(key.clone(), self.resolve_value(value, outputs)?);
        }
        Ok(resolved)
    }

    fn resolve_value(&self, value: &AttrValue, outputs: &OutputsTable) -> Result<AttrValue> {
        Ok(match value {
            AttrValue::Ref(r) => {
                AttrValue::Str(self.resolve(&r.target, &r.output, outputs)?.to_string())
            }
            AttrValue::List(items) => AttrValue::List(
                items
                    .iter()
                    .map(|v| self.resolve_value(v, outputs))
                    .collect::<Result<Vec<_>>>()?,
            ),
            AttrValue::Map(entries) => AttrValue::Map(self.resolve_attributes(entries, outputs)?),
            literal => literal.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outputs;

    fn table() -> OutputsTable {
        OutputsTable::from([(
            "job_role".to_string(),
            Outputs::from([("role_name".to_string(), "emr-job-role".to_string())]),
        )])
    }

    #[test]
    fn test_declare_records_references() {
        let mut resolver = ReferenceResolver::new();
        let attrs = Attributes::from([
            ("name".to_string(), AttrValue::from("profile")),
            (
                "roles".to_string(),
                AttrValue::from(vec![Reference::new("job_role", "role_name")]),
            ),
        ]);
        resolver.declare("profile", &attrs);

        assert_eq!(
            resolver.references("profile"),
            &[Reference::new("job_role", "role_name")]
        );
        assert!(resolver.references("unknown").is_empty());
    }

    #[test]
    fn test_resolve_present_output() {
        let resolver = ReferenceResolver::new();
        let outputs = table();
        assert_eq!(
            resolver.resolve("job_role", "role_name", &outputs).unwrap(),
            "emr-job-role"
        );
    }

    #[test]
    fn test_resolve_missing_output() {
        let resolver = ReferenceResolver::new();
        let outputs = table();
        let err = resolver.resolve("job_role", "role_arn", &outputs).unwrap_err();
        assert_eq!(
            err,
            Error::UnresolvedReference {
                target: "job_role".into(),
                output: "role_arn".into(),
            }
        );
        assert!(resolver.resolve("vpc", "vpc_id", &outputs).is_err());
    }

    #[test]
    fn test_resolve_attributes_nested() {
        let resolver = ReferenceResolver::new();
        let attrs = Attributes::from([
            ("count".to_string(), AttrValue::Int(1)),
            (
                "roles".to_string(),
                AttrValue::from(vec![Reference::new("job_role", "role_name")]),
            ),
        ]);

        let resolved = resolver.resolve_attributes(&attrs, &table()).unwrap();
        assert_eq!(resolved["count"], AttrValue::Int(1));
        assert_eq!(
            resolved["roles"],
            AttrValue::List(vec![AttrValue::from("emr-job-role")])
        );
        assert!(!resolved.values().any(AttrValue::has_references));
    }
}
