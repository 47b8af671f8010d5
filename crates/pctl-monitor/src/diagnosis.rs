use std::fmt;

use pctl_cloud::StackEvent;

/// Type-specific hint used by both stuck detection and Failure Diagnosis.
pub fn type_hint(resource_type: &str) -> &'static str {
    match resource_type {
        "AWS::EC2::VPC" => "check the account's VPC quota for this region",
        "AWS::EC2::Subnet" => "verify the subnet CIDR does not overlap an existing subnet",
        "AWS::EC2::SecurityGroup" => "check the account's security group quota",
        "AWS::IAM::Role" | "AWS::IAM::Policy" => "confirm the calling principal can create IAM roles and policies",
        "AWS::EC2::Instance" => "check instance type availability and the account's vCPU quota in this region",
        "AWS::EC2::Volume" => "check EBS volume size and IOPS limits for this account",
        "AWS::Lambda::Function" => "verify the Lambda execution role exists before the function resource runs",
        "AWS::CloudFormation::WaitCondition" => "a dependent resource's signal never arrived; check its own status first",
        _ => "check the orchestrator console for this resource's full event history",
    }
}

fn reason_hints(reason: &str) -> Vec<&'static str> {
    let lower = reason.to_lowercase();
    let mut hints = Vec::new();
    if lower.contains("subnet") {
        hints.push("check the subnet id passed to the orchestrator configuration");
    }
    if lower.contains("quota") || lower.contains("limit exceeded") {
        hints.push("request a service quota increase for this resource type");
    }
    if lower.contains("key pair") || lower.contains("keypair") {
        hints.push("confirm the key pair name exists in this region");
    }
    if lower.contains("ami") || lower.contains("image") {
        hints.push("confirm the AMI or custom image id is available in this region");
    }
    if lower.contains("already exists") {
        hints.push("a resource with this name already exists; delete it or rename the cluster");
    }
    hints
}

#[derive(Debug, Clone)]
pub struct FailureDiagnosis {
    pub logical_resource_id: String,
    pub resource_type: String,
    pub reason: String,
    pub timestamp: String,
    pub console_url: String,
    pub log_url: String,
    pub hints: Vec<String>,
}

impl fmt::Display for FailureDiagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) — {}", self.logical_resource_id, self.resource_type, self.reason)
    }
}

/// §4.I Failure Diagnosis: walks events chronologically and reports the
/// *oldest* `CREATE_FAILED` resource, since in a CloudFormation rollback the
/// first failure is the root cause and everything after it is a symptom of
/// the rollback itself (dependent resources failing because the stack is
/// already unwinding).
pub fn diagnose(cluster_name: &str, region: &str, chronological_events: &[StackEvent]) -> Option<FailureDiagnosis> {
    let failed = chronological_events.iter().find(|e| e.resource_status == "CREATE_FAILED")?;

    let reason = failed.resource_status_reason.clone().unwrap_or_else(|| "no reason reported".to_string());
    let mut hints = vec![type_hint(&failed.resource_type).to_string()];
    hints.extend(reason_hints(&reason).into_iter().map(str::to_string));
    hints.dedup();

    Some(FailureDiagnosis {
        logical_resource_id: failed.logical_resource_id.clone(),
        resource_type: failed.resource_type.clone(),
        reason,
        timestamp: failed.timestamp.clone(),
        console_url: format!(
            "https://{region}.console.aws.amazon.com/cloudformation/home?region={region}#/stacks?filteringText={cluster_name}"
        ),
        log_url: format!("https://console.aws.amazon.com/cloudwatch/home?region={region}#logsV2:log-groups/log-group/{cluster_name}"),
        hints,
    })
}
