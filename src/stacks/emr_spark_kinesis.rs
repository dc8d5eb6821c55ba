//! EMR Spark cluster reading from and writing to Kinesis streams
//!
//! A VPC with public and private subnets, source and sink streams, the EMR
//! service and job-flow roles, an instance profile, the cluster itself and an
//! enhanced fan-out consumer on the source stream.

use stackgraph::{AttrValue, Reference, ResourceNode, Result, Stack};
use std::collections::BTreeMap;

use super::kinds;

pub const NAME: &str = "emr-spark-kinesis";

const KINESIS_ACTIONS: [&str; 6] = [
    "kinesis:DescribeStream",
    "kinesis:GetShardIterator",
    "kinesis:GetRecords",
    "kinesis:PutRecord",
    "kinesis:PutRecords",
    "kinesis:ListShards",
];

fn map<const N: usize>(entries: [(&str, AttrValue); N]) -> AttrValue {
    AttrValue::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn instance_group(instance_type: &str, count: i64) -> AttrValue {
    map([
        ("instance_type", instance_type.into()),
        ("instance_count", count.into()),
    ])
}

fn subnet(name: &str, subnet_type: &str) -> AttrValue {
    map([
        ("name", name.into()),
        ("cidr_mask", 24_i64.into()),
        ("subnet_type", subnet_type.into()),
    ])
}

pub fn build() -> Result<Stack> {
    let mut stack = Stack::new(NAME).with_registry(kinds::registry());

    stack.declare(
        ResourceNode::new("vpc", kinds::VPC)
            .with_attr("enable_dns_hostnames", true)
            .with_attr("enable_dns_support", true)
            .with_attr("max_azs", 3_i64)
            .with_attr("nat_gateways", 1_i64)
            .with_attr(
                "subnets",
                vec![
                    subnet("public-subnet-1", "PUBLIC"),
                    subnet("private-subnet", "PRIVATE_WITH_EGRESS"),
                ],
            ),
    )?;
    stack.suppress(
        "vpc",
        "AwsSolutions-VPC7",
        "VPC flow logs are not used for cost purposes",
    )?;

    for (id, stream_name) in [("source_stream", "kinesis-source"), ("sink_stream", "kinesis-sink")] {
        stack.declare(
            ResourceNode::new(id, kinds::STREAM)
                .with_attr("stream_name", stream_name)
                .with_attr("stream_mode", "ON_DEMAND"),
        )?;
    }

    stack.declare(
        ResourceNode::new("emr_service_role", kinds::ROLE)
            .with_attr("assumed_by", "elasticmapreduce.amazonaws.com")
            .with_attr(
                "managed_policies",
                vec!["service-role/AmazonElasticMapReduceRole"],
            ),
    )?;
    stack.suppress(
        "emr_service_role",
        "AwsSolutions-IAM4",
        "The EMR service role is required to execute EMR steps",
    )?;

    let kinesis_policy = map([
        ("actions", KINESIS_ACTIONS.to_vec().into()),
        (
            "resources",
            vec![
                Reference::new("source_stream", "stream_arn"),
                Reference::new("sink_stream", "stream_arn"),
            ]
            .into(),
        ),
    ]);
    stack.declare(
        ResourceNode::new("emr_job_flow_role", kinds::ROLE)
            .with_attr("assumed_by", "ec2.amazonaws.com")
            .with_attr("inline_policies", map([("kinesis_policy", kinesis_policy)]))
            .with_attr(
                "managed_policies",
                vec![
                    "service-role/AmazonElasticMapReduceforEC2Role",
                    "AmazonSSMManagedInstanceCore",
                    "AmazonSSMManagedEC2InstanceDefaultPolicy",
                ],
            ),
    )?;
    stack.suppress(
        "emr_job_flow_role",
        "AwsSolutions-IAM4",
        "SSM managed policies are needed to use Session Manager",
    )?;

    stack.declare(
        ResourceNode::new("emr_instance_profile", kinds::INSTANCE_PROFILE)
            .with_attr("instance_profile_name", "emr-instance-profile-spark-kinesis")
            .with_attr(
                "roles",
                vec![Reference::new("emr_job_flow_role", "role_name")],
            ),
    )?;

    stack.declare(
        ResourceNode::new("emr_cluster", kinds::EMR_CLUSTER)
            .with_attr("name", "emr-spark-kinesis")
            .with_attr("release_label", "emr-7.1.0")
            .with_attr(
                "job_flow_role",
                Reference::new("emr_instance_profile", "instance_profile_name"),
            )
            .with_attr(
                "service_role",
                Reference::new("emr_service_role", "role_name"),
            )
            .with_attr(
                "instances",
                map([
                    ("core_instance_group", instance_group("m5.xlarge", 1)),
                    ("master_instance_group", instance_group("m5.xlarge", 1)),
                    (
                        "ec2_subnet_id",
                        Reference::new("vpc", "public_subnet_id").into(),
                    ),
                ]),
            )
            .with_attr("applications", vec!["Spark", "Hive", "Hadoop"]),
    )?;
    // the job-flow role is only named through the profile
    stack.depends_on("emr_instance_profile", "emr_cluster");
    stack.depends_on("emr_service_role", "emr_cluster");
    stack.depends_on("emr_job_flow_role", "emr_cluster");

    for (rule, reason) in [
        ("AwsSolutions-EMR2", "S3 logging is not used for cost purposes"),
        (
            "AwsSolutions-EMR4",
            "Local disk encryption is not used for cost purposes",
        ),
        (
            "AwsSolutions-EMR5",
            "Encryption in transit is not used for cost purposes",
        ),
        (
            "AwsSolutions-EMR6",
            "Not needed, the cluster is accessed through SSM",
        ),
    ] {
        stack.suppress("emr_cluster", rule, reason)?;
    }

    stack.declare(
        ResourceNode::new("stream_consumer", kinds::STREAM_CONSUMER)
            .with_attr("consumer_name", "efo-consumer")
            .with_attr("stream_arn", Reference::new("source_stream", "stream_arn")),
    )?;

    Ok(stack)
}
