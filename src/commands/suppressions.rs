//! `stackplan suppressions` - the report handed to compliance auditors

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use stackgraph::CompiledStack;

use crate::Context;
use crate::cli::{ReportFormat, SuppressionsArgs};
use crate::ui;

pub fn run(ctx: &Context, args: &SuppressionsArgs) -> Result<()> {
    let compiled = super::compile_stack(&args.source)?;

    match args.format {
        ReportFormat::Json => {
            let json = compiled
                .suppressions
                .to_json(&compiled.graph)
                .context("Failed to serialize suppression report")?;
            println!("{json}");
        }
        ReportFormat::Text => print_text(ctx, &compiled),
    }
    Ok(())
}

fn print_text(ctx: &Context, compiled: &CompiledStack) {
    let report = compiled.suppressions.report(&compiled.graph);

    ui::header(&format!("Suppressions: {}", compiled.name));
    if report.is_empty() {
        ui::info("No suppressions declared");
        return;
    }

    for entry in &report {
        ui::section(&format!("{} ({})", entry.node, entry.kind));
        for s in &entry.suppressions {
            println!("  {} {}", s.rule.yellow(), s.reason);
        }
    }

    if !ctx.quiet {
        println!();
        ui::info(&format!(
            "{} on {}",
            ui::count(compiled.suppressions.len(), "suppression"),
            ui::count(report.len(), "resource"),
        ));
    }
}
