//! Stack manifests
//!
//! A manifest declares resources, explicit ordering and suppressions in a
//! TOML or JSON file. The format is chosen by file extension.

use serde::{Deserialize, Serialize};
use stackgraph::{Attributes, KindRegistry, ResourceNode, Stack};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::stacks::kinds;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Could not read manifest {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported manifest extension for {path} (expected .toml or .json)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid TOML in {path}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid stack declaration")]
    Declaration(#[from] stackgraph::Error),
}

/// Manifest file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Json,
}

impl ManifestFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

// ============================================================================
// Schema
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackManifest {
    /// Stack name; defaults to the file stem
    #[serde(default)]
    pub name: Option<String>,

    /// Extra kinds and the outputs they document
    #[serde(default)]
    pub kinds: Vec<KindDecl>,

    #[serde(default)]
    pub resources: Vec<ResourceDecl>,

    #[serde(default)]
    pub depends_on: Vec<DependencyDecl>,

    #[serde(default)]
    pub suppressions: Vec<SuppressionDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KindDecl {
    pub name: String,
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceDecl {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyDecl {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuppressionDecl {
    pub node: String,
    pub rule: String,
    pub reason: String,
}

impl StackManifest {
    /// Load a manifest from disk
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let format = ManifestFormat::from_path(path).ok_or_else(|| {
            ManifestError::UnsupportedFormat {
                path: path.to_path_buf(),
            }
        })?;
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut manifest = Self::parse(&content, format, path)?;
        if manifest.name.is_none() {
            manifest.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string);
        }
        Ok(manifest)
    }

    /// Parse manifest content; `path` is used only in error messages
    pub fn parse(content: &str, format: ManifestFormat, path: &Path) -> Result<Self, ManifestError> {
        match format {
            ManifestFormat::Toml => toml::from_str(content).map_err(|source| ManifestError::Toml {
                path: path.to_path_buf(),
                source,
            }),
            ManifestFormat::Json => {
                serde_json::from_str(content).map_err(|source| ManifestError::Json {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    /// Kind registry: the built-in kinds plus any declared by the manifest
    pub fn registry(&self) -> KindRegistry {
        let mut registry = kinds::registry();
        for kind in &self.kinds {
            registry.register(kind.name.clone(), kind.outputs.iter().cloned());
        }
        registry
    }

    /// Turn the manifest into an uncompiled stack
    ///
    /// Resources are declared first, so suppressions and explicit edges may
    /// name any resource regardless of where it appears in the file.
    pub fn into_stack(self) -> Result<Stack, ManifestError> {
        let registry = self.registry();
        let name = self.name.unwrap_or_else(|| "stack".to_string());
        let mut stack = Stack::new(name).with_registry(registry);

        for decl in self.resources {
            let mut node = ResourceNode::new(decl.id, decl.kind);
            node.attributes = decl.attributes;
            stack.declare(node)?;
        }
        for dep in self.depends_on {
            stack.depends_on(dep.from, dep.to);
        }
        for s in &self.suppressions {
            stack.suppress(&s.node, &s.rule, &s.reason)?;
        }

        Ok(stack)
    }
}
