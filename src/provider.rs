//! Simulated provider
//!
//! Fabricates outputs without touching any cloud API. Values are derived from
//! a blake3 digest of the node id, kind and resolved attributes, so applying
//! the same input twice yields the same outputs.

use stackgraph::{ApplyError, AttrValue, Attributes, KindRegistry, Outputs, Provider, ResourceNode};

/// Output key reported for kinds the registry doesn't document
const DEFAULT_OUTPUT: &str = "id";

pub struct SimulatedProvider {
    registry: KindRegistry,
    account: String,
    region: String,
}

impl SimulatedProvider {
    pub fn new(registry: KindRegistry) -> Self {
        Self {
            registry,
            account: "000000000000".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    fn digest(node: &ResourceNode, resolved: &Attributes) -> Result<String, ApplyError> {
        let attrs = serde_json::to_string(resolved)
            .map_err(|e| ApplyError::fatal(format!("could not encode attributes: {e}")))?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(node.id.as_bytes());
        hasher.update(&[0]);
        hasher.update(node.kind.as_bytes());
        hasher.update(&[0]);
        hasher.update(attrs.as_bytes());
        Ok(hasher.finalize().to_hex().to_string())
    }

    fn fabricate(&self, node: &ResourceNode, resolved: &Attributes, key: &str, digest: &str) -> String {
        // Names chosen by the declaration are echoed back
        if let Some(value) = resolved.get(key).and_then(AttrValue::as_str) {
            return value.to_string();
        }

        let short = &digest[..12];
        if key.ends_with("_arn") {
            let service = node.kind.split(':').next().unwrap_or("sim");
            let resource = node.kind.rsplit(':').next().unwrap_or("resource");
            format!(
                "arn:aws:{service}:{}:{}:{resource}/{}-{short}",
                self.region, self.account, node.id
            )
        } else if key.ends_with("_name") {
            format!("{}-{short}", node.id)
        } else {
            let prefix = key.strip_suffix("_id").unwrap_or(key).replace('_', "-");
            format!("{prefix}-{short}")
        }
    }
}

impl Provider for SimulatedProvider {
    fn apply(&self, node: &ResourceNode, resolved: &Attributes) -> Result<Outputs, ApplyError> {
        if resolved.values().any(AttrValue::has_references) {
            return Err(ApplyError::fatal(format!(
                "'{}' received unresolved references",
                node.id
            )));
        }

        let digest = Self::digest(node, resolved)?;
        let keys: Vec<&str> = match self.registry.outputs(&node.kind) {
            Some(outputs) => outputs.collect(),
            None => vec![DEFAULT_OUTPUT],
        };

        let outputs: Outputs = keys
            .into_iter()
            .map(|key| (key.to_string(), self.fabricate(node, resolved, key, &digest)))
            .collect();
        log::debug!("simulated '{}' -> {:?}", node.id, outputs);
        Ok(outputs)
    }
}
