pub mod apply;
pub mod builtins;
pub mod graph;
pub mod plan;
pub mod suppressions;

use anyhow::{Context as AnyhowContext, Result, bail};
use stackgraph::{CompiledStack, Stack};

use crate::cli::SourceArgs;
use crate::config;
use crate::manifest::StackManifest;
use crate::stacks;

/// Load an uncompiled stack from a manifest path or a built-in name
pub fn load_stack(source: &SourceArgs) -> Result<Stack> {
    if let Some(name) = &source.builtin {
        let Some(builtin) = stacks::find(name) else {
            bail!("Unknown built-in stack '{name}' (see `stackplan builtins`)");
        };
        log::debug!("using built-in stack '{name}'");
        return (builtin.build)().with_context(|| format!("Invalid built-in stack '{name}'"));
    }

    let Some(manifest) = &source.manifest else {
        bail!("Either a manifest path or --builtin is required");
    };
    let path = config::expand_path(manifest)?;
    log::debug!("loading manifest {}", path.display());
    let manifest = StackManifest::load(&path)?;
    manifest
        .into_stack()
        .with_context(|| format!("Invalid stack declaration in {}", path.display()))
}

/// Load and compile a stack; compilation errors carry the stack name
pub fn compile_stack(source: &SourceArgs) -> Result<CompiledStack> {
    let stack = load_stack(source)?;
    let name = stack.name().to_string();
    stack
        .compile()
        .with_context(|| format!("Failed to compile stack '{name}'"))
}
