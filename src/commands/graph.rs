//! `stackplan graph` - render the dependency graph

use anyhow::Result;
use stackgraph::render;

use crate::cli::{GraphArgs, GraphFormat};

pub fn run(args: &GraphArgs) -> Result<()> {
    let compiled = super::compile_stack(&args.source)?;

    let rendered = match args.format {
        GraphFormat::Text => render::to_text(&compiled.graph, &compiled.plan),
        GraphFormat::Dot => render::to_dot(&compiled.graph, &compiled.name),
    };
    print!("{rendered}");
    Ok(())
}
