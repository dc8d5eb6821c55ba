use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stackgraph::{CompiledStack, ExecutionReport, Outputs};
use std::fs;
use std::path::Path;

// ============================================================================
// Run Report
// ============================================================================

/// JSON record of one apply run
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunReport {
    /// Stack name
    pub stack: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Whether the run was a dry run
    #[serde(default)]
    pub dry_run: bool,

    /// Applied nodes with their outputs, in completion order
    #[serde(default)]
    pub applied: Vec<AppliedNode>,

    /// The node that stopped the run, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureRecord>,

    /// Nodes that were never attempted
    #[serde(default)]
    pub skipped: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppliedNode {
    pub id: String,
    pub kind: String,
    pub outputs: Outputs,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub node: String,
    pub error: String,
    pub attempts: u32,
}

impl RunReport {
    /// Build a report from the executed stack and its execution report
    pub fn new(
        stack: &CompiledStack,
        execution: &ExecutionReport,
        started_at: DateTime<Utc>,
        dry_run: bool,
    ) -> Self {
        let applied = execution
            .applied
            .iter()
            .filter_map(|id| {
                let position = stack.plan.position(id)?;
                let node = &stack.plan.nodes[position];
                Some(AppliedNode {
                    id: node.id.clone(),
                    kind: node.kind.clone(),
                    outputs: node.outputs.clone().unwrap_or_default(),
                })
            })
            .collect();

        let failure = execution.first_failure().map(|f| FailureRecord {
            node: f.id.clone(),
            error: f.error.to_string(),
            attempts: f.attempts,
        });

        Self {
            stack: stack.name.clone(),
            started_at,
            finished_at: Utc::now(),
            dry_run,
            applied,
            failure,
            skipped: execution.skipped.clone(),
        }
    }

    /// Write the report as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize run report")?;
        fs::write(path, content)
            .with_context(|| format!("Could not write run report: {}", path.display()))?;
        Ok(())
    }
}
