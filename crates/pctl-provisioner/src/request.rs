use std::path::PathBuf;

/// Operator-supplied parameters a `create` needs beyond the seed file
/// itself. None of these are derivable from the seed: they're either
/// infrastructure the caller already owns (`subnet_id`) or credentials the
/// seed deliberately never carries (`key_name`).
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub seed_path: PathBuf,
    pub key_name: String,
    /// When `None`, the Provisioner creates and owns a full VPC via the
    /// Network Manager; when `Some`, the caller's subnet is used as-is and
    /// no network resources are tracked for teardown.
    pub subnet_id: Option<String>,
}
