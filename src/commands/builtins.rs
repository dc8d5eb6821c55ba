//! `stackplan builtins` - list stacks bundled with the binary

use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::stacks::BUILTINS;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    if !ctx.quiet {
        ui::header("Built-in stacks");
    }
    for builtin in BUILTINS {
        println!("  {}  {}", builtin.name.bold(), builtin.description.dimmed());
    }
    Ok(())
}
