//! Built-in stacks declared in code

use stackgraph::Stack;

pub mod emr_spark_kinesis;
pub mod kinds;

/// A stack bundled with the binary
pub struct Builtin {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn() -> stackgraph::Result<Stack>,
}

/// All built-in stacks
pub const BUILTINS: &[Builtin] = &[Builtin {
    name: emr_spark_kinesis::NAME,
    description: "EMR Spark cluster with Kinesis source/sink streams, IAM roles and a VPC",
    build: emr_spark_kinesis::build,
}];

/// Find a built-in stack by name
pub fn find(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}
