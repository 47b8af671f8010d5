use serde::{Deserialize, Serialize};

// ── Identifiers ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterName(pub String);

impl ClusterName {
    pub fn new(s: impl Into<String>) -> Self {
        ClusterName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClusterName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Enums ─────────────────────────────────────────────────────────────────────

/// Base operating system for the head node and compute fleet.
///
/// `Al2023` is the default when a seed omits `cluster.os`. `Alinux2` and the
/// `rhel8`/`rocky8` family are accepted but surface a validation warning — they
/// are still supported by the orchestrator but are the legacy vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Al2023,
    Ubuntu2404,
    Ubuntu2204,
    Alinux2,
    Rhel8,
    Rocky8,
    Rhel9,
    Rocky9,
}

impl Default for Os {
    fn default() -> Self {
        Os::Al2023
    }
}

impl Os {
    /// Every os variant, in a stable, deterministic order — used by the
    /// fingerprint and by validation's enumerated error messages.
    pub const ALL: &'static [Os] = &[
        Os::Al2023,
        Os::Ubuntu2404,
        Os::Ubuntu2204,
        Os::Alinux2,
        Os::Rhel8,
        Os::Rocky8,
        Os::Rhel9,
        Os::Rocky9,
    ];

    /// Whether this OS is considered legacy (still supported, but deprecated).
    pub fn is_legacy(&self) -> bool {
        matches!(self, Os::Alinux2 | Os::Rhel8 | Os::Rocky8)
    }

    /// Normalize to the orchestrator's own OS vocabulary. Part of the
    /// fingerprint input (§3) — this mapping must never change for a given
    /// variant without changing every fingerprint that depends on it.
    pub fn orchestrator_name(&self) -> &'static str {
        match self {
            Os::Al2023 => "alinux2023",
            Os::Ubuntu2404 => "ubuntu2404",
            Os::Ubuntu2204 => "ubuntu2204",
            Os::Alinux2 => "alinux2",
            Os::Rhel8 => "rhel8",
            Os::Rocky8 => "rocky8",
            Os::Rhel9 => "rhel9",
            Os::Rocky9 => "rocky9",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Os::Al2023 => "al2023",
            Os::Ubuntu2404 => "ubuntu2404",
            Os::Ubuntu2204 => "ubuntu2204",
            Os::Alinux2 => "alinux2",
            Os::Rhel8 => "rhel8",
            Os::Rocky8 => "rocky8",
            Os::Rhel9 => "rhel9",
            Os::Rocky9 => "rocky9",
        };
        write!(f, "{}", s)
    }
}

// ── Core structs ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub name: String,
    pub region: String,
    #[serde(default)]
    pub os: Os,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub name: String,
    pub instance_types: Vec<String>,
    #[serde(default)]
    pub min_count: u32,
    pub max_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compute {
    pub head_node: String,
    pub queues: Vec<Queue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SoftwareConfig {
    #[serde(default)]
    pub spack_packages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Mount {
    pub bucket: String,
    pub mount_point: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DataConfig {
    #[serde(default)]
    pub s3_mounts: Vec<S3Mount>,
}

/// The declarative root entity — a fully parsed and (for the merged form)
/// inheritance-resolved cluster seed. Immutable after parsing; merging two
/// seeds yields a new `Seed` rather than mutating either input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub cluster: ClusterConfig,
    pub compute: Compute,
    #[serde(default)]
    pub software: SoftwareConfig,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub data: DataConfig,
    /// Path or URL to a parent seed. Resolved and stripped by `pctl-fingerprint`;
    /// a merged `Seed` never carries this field forward.
    #[serde(default)]
    pub extends: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_default_is_al2023() {
        assert_eq!(Os::default(), Os::Al2023);
    }

    #[test]
    fn os_orchestrator_name_matches_vocabulary() {
        assert_eq!(Os::Al2023.orchestrator_name(), "alinux2023");
        assert_eq!(Os::Ubuntu2204.orchestrator_name(), "ubuntu2204");
    }

    #[test]
    fn legacy_os_flagged() {
        assert!(Os::Alinux2.is_legacy());
        assert!(Os::Rhel8.is_legacy());
        assert!(!Os::Al2023.is_legacy());
    }
}
