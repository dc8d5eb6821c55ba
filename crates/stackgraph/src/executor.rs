//! Execution engine - applies a compiled plan layer by layer

use crate::context::{
    ApplyResult, AutoConfirm, ConfirmCallback, LogRetry, NoProgress, ProgressCallback, Provider,
};
use crate::error::Error;
use crate::resolver::ReferenceResolver;
use crate::resource::ResourceNode;
use crate::retry::with_retry;
use crate::stack::CompiledStack;
use crate::types::{ExecuteOptions, Outputs, OutputsTable, RetryConfig};
use rayon::prelude::*;

/// A node whose apply failed
#[derive(Debug, Clone)]
pub struct FailedNode {
    pub id: String,
    pub error: Error,
    pub attempts: u32,
}

/// What happened during one execution
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// Applied node ids, in plan order within each batch
    pub applied: Vec<String>,
    /// Nodes that failed; the run stopped after their batch
    pub failed: Vec<FailedNode>,
    /// Nodes not attempted (dry run, declined, aborted, or applied by an
    /// earlier run)
    pub skipped: Vec<String>,
    /// Number of batches fully settled
    pub batches_completed: usize,
}

impl ExecutionReport {
    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Last node to complete successfully
    pub fn last_completed(&self) -> Option<&str> {
        self.applied.last().map(String::as_str)
    }

    /// First failure, in plan order
    pub fn first_failure(&self) -> Option<&FailedNode> {
        self.failed.first()
    }

    /// Total number of nodes accounted for
    pub fn total(&self) -> usize {
        self.applied.len() + self.failed.len() + self.skipped.len()
    }
}

/// Execute a compiled stack with the given options and callbacks
///
/// With `jobs > 1` every plan layer is applied concurrently on a pool of
/// `jobs` threads and the whole layer settles before the next one starts.
/// With `jobs == 1` nodes are applied one at a time in plan order. Outputs of
/// each applied node are recorded on the plan and feed the references of
/// later nodes. The first failure stops the run once its batch settles.
pub fn execute<P, C>(
    stack: &mut CompiledStack,
    provider: &dyn Provider,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> ExecutionReport
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let mut report = ExecutionReport::default();
    let plan = &mut stack.plan;
    let resolver = stack.graph.resolver();

    if plan.is_empty() {
        return report;
    }

    if opts.dry_run {
        skip_all(plan.nodes.iter(), "dry run", &mut report, progress);
        return report;
    }

    if !confirm.confirm(&format!("Apply {} resources?", plan.len())) {
        skip_all(plan.nodes.iter(), "declined", &mut report, progress);
        return report;
    }

    let pool = if opts.jobs > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(opts.jobs).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!("could not create apply thread pool ({e}); applying sequentially");
                None
            }
        }
    } else {
        None
    };

    let batches: Vec<Vec<usize>> = if pool.is_some() {
        plan.layers.clone()
    } else {
        (0..plan.len()).map(|i| vec![i]).collect()
    };

    for (index, batch) in batches.iter().enumerate() {
        if !report.failed.is_empty() {
            skip_all(
                batch.iter().map(|&i| &plan.nodes[i]),
                "aborted",
                &mut report,
                progress,
            );
            continue;
        }

        progress.on_batch_start(index, batch.len());
        let (done, pending): (Vec<usize>, Vec<usize>) =
            batch.iter().partition(|&&i| plan.nodes[i].is_applied());
        skip_all(
            done.iter().map(|&i| &plan.nodes[i]),
            "already applied",
            &mut report,
            progress,
        );

        let table = plan.outputs_table();
        let nodes = &plan.nodes;

        let results: Vec<(usize, NodeOutcome)> = match &pool {
            Some(pool) if pending.len() > 1 => pool.install(|| {
                pending
                    .par_iter()
                    .map(|&i| (i, apply_node(&nodes[i], resolver, &table, provider, &opts.retry)))
                    .collect()
            }),
            _ => pending
                .iter()
                .map(|&i| (i, apply_node(&nodes[i], resolver, &table, provider, &opts.retry)))
                .collect(),
        };

        for (i, outcome) in results {
            let node = &mut plan.nodes[i];
            let result = match outcome {
                Ok((outputs, attempts)) => {
                    if !node.record_outputs(outputs) {
                        log::warn!("'{}' already has outputs; keeping the first", node.id);
                    }
                    report.applied.push(node.id.clone());
                    ApplyResult::Applied { attempts }
                }
                Err((error, attempts)) => {
                    log::error!("'{}' failed: {}", node.id, error);
                    let result = ApplyResult::Failed {
                        error: error.to_string(),
                        attempts,
                    };
                    report.failed.push(FailedNode {
                        id: node.id.clone(),
                        error,
                        attempts,
                    });
                    result
                }
            };
            progress.on_node_complete(&node.id, &result);
        }

        progress.on_batch_complete();
        report.batches_completed += 1;
    }

    log::info!(
        "execution finished: {} applied, {} failed, {} skipped",
        report.applied.len(),
        report.failed.len(),
        report.skipped.len()
    );
    report
}

type NodeOutcome = Result<(Outputs, u32), (Error, u32)>;

/// Resolve a node's attributes and apply it with retry
fn apply_node(
    node: &ResourceNode,
    resolver: &ReferenceResolver,
    outputs: &OutputsTable,
    provider: &dyn Provider,
    retry: &RetryConfig,
) -> NodeOutcome {
    let resolved = resolver
        .resolve_attributes(&node.attributes, outputs)
        .map_err(|e| (e, 0))?;

    let mut attempts = 0;
    let callback = LogRetry { node: &node.id };
    with_retry(retry, Some(&callback), || {
        attempts += 1;
        log::debug!("applying '{}' ({}), attempt {}", node.id, node.kind, attempts);
        provider.apply(node, &resolved)
    })
    .map(|outputs| (outputs, attempts))
    .map_err(|source| {
        (
            Error::Apply {
                node: node.id.clone(),
                source,
            },
            attempts,
        )
    })
}

fn skip_all<'a, P: ProgressCallback>(
    nodes: impl Iterator<Item = &'a ResourceNode>,
    reason: &str,
    report: &mut ExecutionReport,
    progress: &mut P,
) {
    let result = ApplyResult::Skipped {
        reason: reason.to_string(),
    };
    for node in nodes {
        progress.on_node_complete(&node.id, &result);
        report.skipped.push(node.id.clone());
    }
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple(
    stack: &mut CompiledStack,
    provider: &dyn Provider,
    opts: &ExecuteOptions,
) -> ExecutionReport {
    execute(stack, provider, opts, &mut NoProgress, &mut AutoConfirm)
}
