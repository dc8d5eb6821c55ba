use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "stackplan")]
#[command(version)]
#[command(about = "Compile declarative infrastructure stacks into provisioning plans", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile a stack and print the ordered provisioning plan
    Plan(PlanArgs),

    /// Render the dependency graph
    Graph(GraphArgs),

    /// Print the suppression report consumed by compliance auditors
    Suppressions(SuppressionsArgs),

    /// Compile a stack and apply it against the simulated provider
    Apply(ApplyArgs),

    /// List built-in stacks
    Builtins,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Stack Source
// ============================================================================

/// Where a stack comes from: a manifest file or a built-in
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Path to a stack manifest (.toml or .json)
    #[arg(required_unless_present = "builtin", conflicts_with = "builtin")]
    pub manifest: Option<String>,

    /// Use a built-in stack instead of a manifest
    #[arg(short, long, value_name = "NAME")]
    pub builtin: Option<String>,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Args)]
pub struct GraphArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: GraphFormat,
}

#[derive(Args)]
pub struct SuppressionsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of parallel jobs (1 applies in plan order)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Dry run - compile and show what would be applied
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Attempts per node before giving up on retryable errors
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan_with_manifest() {
        let cli = Cli::try_parse_from(["stackplan", "plan", "stack.toml", "--format", "json"]).unwrap();
        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(args.source.manifest.as_deref(), Some("stack.toml"));
        assert_eq!(args.format, ReportFormat::Json);
    }

    #[test]
    fn test_parse_apply_with_builtin() {
        let cli = Cli::try_parse_from([
            "stackplan",
            "-vv",
            "apply",
            "--builtin",
            "emr-spark-kinesis",
            "--jobs",
            "1",
            "--yes",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.source.builtin.as_deref(), Some("emr-spark-kinesis"));
        assert_eq!(args.jobs, Some(1));
        assert!(args.yes);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_source_is_required() {
        assert!(Cli::try_parse_from(["stackplan", "graph"]).is_err());
        assert!(Cli::try_parse_from(["stackplan", "graph", "a.toml", "--builtin", "x"]).is_err());
    }
}
