use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The Provisioner's own lifecycle state, per the state machine in §4.H.
///
/// `Ready` is the persisted terminal-success value; it plays the same role
/// the orchestrator's own `CREATE_COMPLETE` plays for the cloud stack, but
/// names the *local* record, not the remote one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterStatus {
    #[default]
    Idle,
    Validating,
    Networking,
    Uploading,
    Launching,
    Monitoring,
    Ready,
    Rejected,
    CleanupNet,
    CleanupAll,
    Failed,
}

impl std::fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ClusterStatus::Idle => "IDLE",
            ClusterStatus::Validating => "VALIDATING",
            ClusterStatus::Networking => "NETWORKING",
            ClusterStatus::Uploading => "UPLOADING",
            ClusterStatus::Launching => "LAUNCHING",
            ClusterStatus::Monitoring => "MONITORING",
            ClusterStatus::Ready => "READY",
            ClusterStatus::Rejected => "REJECTED",
            ClusterStatus::CleanupNet => "CLEANUP_NET",
            ClusterStatus::CleanupAll => "CLEANUP_ALL",
            ClusterStatus::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

impl ClusterStatus {
    /// States from which a retried `create` should be refused outright —
    /// the preflight check in §4.H ("stack already exists in CREATE_FAILED
    /// or DELETE_FAILED... tell the user to delete first").
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, ClusterStatus::Rejected | ClusterStatus::Failed)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            ClusterStatus::Validating
                | ClusterStatus::Networking
                | ClusterStatus::Uploading
                | ClusterStatus::Launching
                | ClusterStatus::Monitoring
                | ClusterStatus::CleanupNet
                | ClusterStatus::CleanupAll
        )
    }
}

/// Every resource id the Network Manager (component G) created, so cleanup
/// never has to re-derive them. `None` fields mean that resource wasn't
/// created by this system (e.g. an externally supplied subnet).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkResources {
    pub vpc_id: Option<String>,
    pub public_subnet_id: Option<String>,
    pub private_subnet_id: Option<String>,
    pub internet_gateway_id: Option<String>,
    pub route_table_id: Option<String>,
    pub security_group_id: Option<String>,
}

impl NetworkResources {
    /// Resource ids in the reverse-dependency-order a teardown should visit
    /// them: security group, route table, gateway, subnets, then the VPC
    /// that contains them all.
    pub fn teardown_order(&self) -> Vec<(&'static str, &str)> {
        let mut order = Vec::new();
        if let Some(id) = &self.security_group_id {
            order.push(("security-group", id.as_str()));
        }
        if let Some(id) = &self.route_table_id {
            order.push(("route-table", id.as_str()));
        }
        if let Some(id) = &self.internet_gateway_id {
            order.push(("internet-gateway", id.as_str()));
        }
        if let Some(id) = &self.public_subnet_id {
            order.push(("public-subnet", id.as_str()));
        }
        if let Some(id) = &self.private_subnet_id {
            order.push(("private-subnet", id.as_str()));
        }
        if let Some(id) = &self.vpc_id {
            order.push(("vpc", id.as_str()));
        }
        order
    }
}

/// The persisted per-cluster lifecycle record (§3). Immutable identity
/// (`name`, `region`, `stack_name`) plus a status that advances through
/// [`ClusterStatus`] as the Provisioner drives creation or deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterState {
    pub name: String,
    pub region: String,
    pub status: ClusterStatus,
    pub stack_name: String,
    pub seed_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub custom_image_id: Option<String>,
    pub key_name: String,
    #[serde(default)]
    pub bootstrap_script_uri: Option<String>,
    #[serde(default)]
    pub head_node_ip: Option<String>,
    #[serde(default)]
    pub network_resources: Option<NetworkResources>,
    pub network_managed_by_system: bool,
}

impl ClusterState {
    pub fn new(name: impl Into<String>, region: impl Into<String>, seed_path: impl Into<String>, key_name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            stack_name: name.clone(),
            name,
            region: region.into(),
            status: ClusterStatus::Idle,
            seed_path: seed_path.into(),
            created_at: now,
            updated_at: now,
            custom_image_id: None,
            key_name: key_name.into(),
            bootstrap_script_uri: None,
            head_node_ip: None,
            network_resources: None,
            network_managed_by_system: false,
        }
    }

    pub fn transition(&mut self, status: ClusterStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
