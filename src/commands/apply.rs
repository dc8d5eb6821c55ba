//! `stackplan apply` - execute a compiled plan against the simulated provider

use anyhow::{Result, bail};
use chrono::Utc;
use stackgraph::{CompiledStack, ExecuteOptions, ExecutionReport, execute};

use crate::Context;
use crate::cli::ApplyArgs;
use crate::config::{self, Settings};
use crate::progress::{BarProgress, PromptConfirm};
use crate::provider::SimulatedProvider;
use crate::report::RunReport;
use crate::ui;

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let settings = Settings::load()?;
    let mut compiled = super::compile_stack(&args.source)?;

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: settings.apply.jobs(args.jobs),
        retry: settings.apply.retry_config(args.max_attempts),
    };

    if !ctx.quiet {
        ui::header(&format!("Apply: {}", compiled.name));
        ui::kv("resources", &compiled.plan.len().to_string());
        ui::kv("layers", &compiled.plan.layers.len().to_string());
        ui::kv("jobs", &opts.jobs.to_string());
        ui::kv("max attempts", &opts.retry.max_attempts.to_string());
        println!();
    }

    if opts.dry_run {
        ui::info("Dry run - nothing will be applied");
        for (index, layer) in compiled.plan.layer_ids().iter().enumerate() {
            ui::dim(&format!("layer {index}: {}", layer.join(", ")));
        }
    }

    let provider = SimulatedProvider::new(compiled.registry.clone());
    let mut progress = BarProgress::new(compiled.plan.len(), ctx.quiet || opts.dry_run);
    let mut confirm = PromptConfirm {
        assume_yes: args.yes,
    };

    let started_at = Utc::now();
    let report = execute(&mut compiled, &provider, &opts, &mut progress, &mut confirm);
    progress.finish();

    if let Some(path) = &args.report {
        let path = config::expand_path(path)?;
        RunReport::new(&compiled, &report, started_at, opts.dry_run).save(&path)?;
        log::info!("run report written to {}", path.display());
    }

    summarize(ctx, &compiled, &report, opts.dry_run)
}

fn summarize(
    ctx: &Context,
    compiled: &CompiledStack,
    report: &ExecutionReport,
    dry_run: bool,
) -> Result<()> {
    if let Some(failure) = report.first_failure() {
        ui::error(&format!(
            "'{}' failed after {}: {}",
            failure.id,
            ui::count(failure.attempts as usize, "attempt"),
            failure.error
        ));
        if !report.applied.is_empty() {
            ui::warn(&format!(
                "Already applied ({}): {}",
                report.applied.len(),
                report.applied.join(", ")
            ));
        }
        bail!(
            "Apply of stack '{}' stopped at '{}'",
            compiled.name,
            failure.id
        );
    }

    if dry_run {
        ui::info(&format!("Would apply {}", ui::count(report.skipped.len(), "resource")));
        return Ok(());
    }

    if report.applied.is_empty() && !report.skipped.is_empty() {
        ui::warn("Cancelled");
        return Ok(());
    }

    if ctx.verbose > 0 {
        for node in &compiled.plan.nodes {
            let Some(outputs) = &node.outputs else {
                continue;
            };
            ui::section(&node.id);
            for (key, value) in outputs {
                ui::kv(key, value);
            }
        }
        println!();
    }

    ui::success(&format!(
        "Applied {}",
        ui::count(report.applied.len(), "resource")
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacks::emr_spark_kinesis;
    use stackgraph::{ApplyError, Error, FailedNode, execute_simple};

    fn ctx() -> Context {
        Context {
            verbose: 0,
            quiet: true,
        }
    }

    #[test]
    fn test_builtin_applies_with_simulated_provider() {
        let mut compiled = emr_spark_kinesis::build().unwrap().compile().unwrap();
        let provider = SimulatedProvider::new(compiled.registry.clone());
        let opts = ExecuteOptions {
            jobs: 4,
            ..Default::default()
        };

        let report = execute_simple(&mut compiled, &provider, &opts);
        assert!(report.is_success());
        assert_eq!(report.applied.len(), 8);
        assert_eq!(report.last_completed(), Some("emr_cluster"));

        let cluster = &compiled.plan.nodes[compiled.plan.position("emr_cluster").unwrap()];
        assert!(cluster.outputs.as_ref().unwrap()["cluster_id"].starts_with("cluster-"));
        assert!(summarize(&ctx(), &compiled, &report, false).is_ok());
    }

    #[test]
    fn test_failure_is_an_error() {
        let compiled = emr_spark_kinesis::build().unwrap().compile().unwrap();
        let report = ExecutionReport {
            applied: vec!["vpc".into()],
            failed: vec![FailedNode {
                id: "source_stream".into(),
                error: Error::Apply {
                    node: "source_stream".into(),
                    source: ApplyError::fatal("limit exceeded"),
                },
                attempts: 1,
            }],
            skipped: vec![],
            batches_completed: 0,
        };

        let err = summarize(&ctx(), &compiled, &report, false).unwrap_err();
        assert!(err.to_string().contains("stopped at 'source_stream'"));
    }
}
