//! Resource kinds used by the bundled stacks, with the outputs each produces

use stackgraph::KindRegistry;

pub const VPC: &str = "ec2:vpc";
pub const STREAM: &str = "kinesis:stream";
pub const STREAM_CONSUMER: &str = "kinesis:stream_consumer";
pub const ROLE: &str = "iam:role";
pub const INSTANCE_PROFILE: &str = "iam:instance_profile";
pub const EMR_CLUSTER: &str = "emr:cluster";

/// Registry documenting the outputs of the known kinds
///
/// Kinds outside this list stay accepted with any output key.
pub fn registry() -> KindRegistry {
    KindRegistry::new()
        .with_kind(VPC, ["vpc_id", "public_subnet_id", "private_subnet_id"])
        .with_kind(STREAM, ["stream_arn", "stream_name"])
        .with_kind(STREAM_CONSUMER, ["consumer_arn", "consumer_name"])
        .with_kind(ROLE, ["role_arn", "role_name"])
        .with_kind(
            INSTANCE_PROFILE,
            ["instance_profile_arn", "instance_profile_name"],
        )
        .with_kind(EMR_CLUSTER, ["cluster_id", "master_public_dns"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_bundled_kinds() {
        let registry = registry();
        for kind in [VPC, STREAM, STREAM_CONSUMER, ROLE, INSTANCE_PROFILE, EMR_CLUSTER] {
            assert!(registry.outputs(kind).is_some(), "{kind} not registered");
        }
        assert_eq!(registry.documents(ROLE, "role_name"), Some(true));
        assert_eq!(registry.documents(ROLE, "stream_arn"), Some(false));
    }
}
