//! `stackplan plan` - print the ordered provisioning plan

use anyhow::{Context as AnyhowContext, Result};
use serde::Serialize;
use stackgraph::{CompiledStack, EdgeKind, ResourceNode, render};

use crate::Context;
use crate::cli::{PlanArgs, ReportFormat};
use crate::ui;

#[derive(Serialize)]
struct PlanOutput<'a> {
    stack: &'a str,
    order: Vec<&'a str>,
    layers: Vec<Vec<&'a str>>,
    resources: &'a [ResourceNode],
}

pub fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let compiled = super::compile_stack(&args.source)?;

    match args.format {
        ReportFormat::Json => println!("{}", to_json(&compiled)?),
        ReportFormat::Text => print_text(ctx, &compiled),
    }
    Ok(())
}

fn to_json(compiled: &CompiledStack) -> Result<String> {
    let output = PlanOutput {
        stack: &compiled.name,
        order: compiled.plan.order(),
        layers: compiled.plan.layer_ids(),
        resources: &compiled.plan.nodes,
    };
    serde_json::to_string_pretty(&output).context("Failed to serialize plan")
}

fn print_text(ctx: &Context, compiled: &CompiledStack) {
    let plan = &compiled.plan;
    let graph = &compiled.graph;

    ui::header(&format!("Plan: {}", compiled.name));
    for (position, id) in plan.order().iter().enumerate() {
        let kind = graph.node(id).map_or("?", |n| n.kind.as_str());
        println!("  {:>3}. {id} ({kind})", position + 1);
    }

    if ctx.verbose > 0 {
        ui::section("Layers");
        print!("{}", render::to_text(graph, plan));
    }

    if !ctx.quiet {
        println!();
        ui::success(&format!(
            "{} in {}, {} implicit and {} explicit edges, {}",
            ui::count(plan.len(), "resource"),
            ui::count(plan.layers.len(), "layer"),
            graph.edge_count(EdgeKind::Implicit),
            graph.edge_count(EdgeKind::Explicit),
            ui::count(compiled.suppressions.len(), "suppression"),
        ));
    }
}
