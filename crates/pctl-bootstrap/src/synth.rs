use std::fmt::Write as _;

use pctl_seed::{Os, Seed};

/// Runtime knobs the synthesizer needs beyond what's in the seed itself.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Package manager installs under `/shared/<pkgmgr>` instead of `/opt/<pkgmgr>`.
    pub shared_storage: bool,
    /// A pre-built image already carries the software stack; if the seed also
    /// has no users or mounts to configure, no script is needed at all.
    pub prebuilt_image: bool,
    /// User that owns the package manager installation.
    pub admin_user: String,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self { shared_storage: false, prebuilt_image: false, admin_user: "ec2-user".to_string() }
    }
}

const PKGMGR: &str = "spack";
const PKGMGR_VERSION: &str = crate::PKGMGR_VERSION;
const MODSYS_VERSION: &str = crate::MODSYS_VERSION;

/// Produce the bootstrap shell program for `seed`, or `None` if nothing needs
/// doing (empty software/users/data sections on a pre-built image).
///
/// The result is a pure function of `(seed, opts)`: the same inputs always
/// produce the same bytes, so callers can fingerprint or diff it directly.
pub fn synthesize(seed: &Seed, opts: &BootstrapOptions) -> Option<String> {
    let has_software = !seed.software.spack_packages.is_empty();
    let has_users = !seed.users.is_empty();
    let has_mounts = !seed.data.s3_mounts.is_empty();

    if opts.prebuilt_image && !has_software && !has_users && !has_mounts {
        return None;
    }

    let mut s = String::new();

    write_header(&mut s);
    write_disk_usage(&mut s, "before");
    write_toolchain(&mut s);

    if has_software {
        write_pkgmgr_install(&mut s, opts);
        write_binary_mirror(&mut s, opts);
        write_package_installs(&mut s, seed, opts);
        write_module_generation(&mut s, opts);
        write_profile_snippet(&mut s, opts);
    }

    if has_users {
        write_users(&mut s, seed);
    }

    if has_mounts {
        write_mounts(&mut s, seed);
    }

    write_disk_usage(&mut s, "after");

    Some(s)
}

fn pkgmgr_root(opts: &BootstrapOptions) -> &'static str {
    if opts.shared_storage {
        "/shared/spack"
    } else {
        "/opt/spack"
    }
}

fn write_header(s: &mut String) {
    writeln!(s, "#!/bin/bash").unwrap();
    writeln!(s, "# Generated by pctl — do not edit").unwrap();
    writeln!(s, "set -e").unwrap();
    writeln!(s).unwrap();
}

fn write_disk_usage(s: &mut String, phase: &str) {
    writeln!(s, "# --- disk usage ({phase}) ---").unwrap();
    writeln!(
        s,
        "df -BG / | awk 'NR==2 {{ gsub(\"G\",\"\",$2); gsub(\"G\",\"\",$3); pct=$3*100/$2; printf \"PCTL_DISK_USAGE:USED:%sG TOTAL:%sG PCT:%d%%\\n\", $3, $2, pct }}'"
    )
    .unwrap();
    writeln!(s).unwrap();
}

fn write_toolchain(s: &mut String) {
    writeln!(s, "# --- build toolchain ---").unwrap();
    writeln!(s, "if ! command -v git >/dev/null 2>&1; then").unwrap();
    writeln!(s, "  if command -v dnf >/dev/null 2>&1; then").unwrap();
    writeln!(s, "    dnf install -y git gcc gcc-c++ make python3 tar gzip bzip2 patch unzip").unwrap();
    writeln!(s, "  elif command -v apt-get >/dev/null 2>&1; then").unwrap();
    writeln!(s, "    apt-get update -y && apt-get install -y git build-essential python3 tar gzip bzip2 patch unzip").unwrap();
    writeln!(s, "  fi").unwrap();
    writeln!(s, "fi").unwrap();
    writeln!(s).unwrap();
}

fn write_pkgmgr_install(s: &mut String, opts: &BootstrapOptions) {
    let root = pkgmgr_root(opts);
    writeln!(s, "# --- package manager ---").unwrap();
    writeln!(s, "if [ ! -d \"{root}\" ]; then").unwrap();
    writeln!(s, "  git clone --depth 1 --branch v{PKGMGR_VERSION} https://github.com/spack/spack.git \"{root}\"").unwrap();
    writeln!(s, "  chown -R {}:{} \"{root}\"", opts.admin_user, opts.admin_user).unwrap();
    writeln!(s, "fi").unwrap();
    writeln!(s, "source \"{root}/share/{PKGMGR}/setup-env.sh\"").unwrap();
    writeln!(s).unwrap();
}

fn write_binary_mirror(s: &mut String, opts: &BootstrapOptions) {
    let root = pkgmgr_root(opts);
    writeln!(s, "# --- binary mirror ---").unwrap();
    writeln!(s, "source \"{root}/share/{PKGMGR}/setup-env.sh\"").unwrap();
    writeln!(s, "if ! {PKGMGR} mirror list | grep -q pctl-binaries; then").unwrap();
    writeln!(s, "  {PKGMGR} mirror add pctl-binaries https://binaries.pctl.example.com/{PKGMGR}").unwrap();
    writeln!(s, "  {PKGMGR} buildcache keys --install --trust").unwrap();
    writeln!(s, "fi").unwrap();
    writeln!(s).unwrap();
}

fn write_package_installs(s: &mut String, seed: &Seed, opts: &BootstrapOptions) {
    let root = pkgmgr_root(opts);
    let n = seed.software.spack_packages.len();

    writeln!(s, "# --- package installs ---").unwrap();
    writeln!(s, "source \"{root}/share/{PKGMGR}/setup-env.sh\"").unwrap();
    for (i, pkg) in seed.software.spack_packages.iter().enumerate() {
        let idx = i + 1;
        writeln!(s, "echo \"PCTL_PKG_START:{pkg}:{idx}/{n}\"").unwrap();
        writeln!(
            s,
            "if {PKGMGR} install --cache-only {pkg} 2>/dev/null; then",
        )
        .unwrap();
        writeln!(s, "  echo \"PCTL_PKG_END:{pkg}:binary\"").unwrap();
        writeln!(s, "else").unwrap();
        writeln!(s, "  {PKGMGR} install {pkg}").unwrap();
        writeln!(s, "  echo \"PCTL_PKG_END:{pkg}:source\"").unwrap();
        writeln!(s, "fi").unwrap();
    }
    writeln!(s).unwrap();
}

fn write_module_generation(s: &mut String, opts: &BootstrapOptions) {
    let root = pkgmgr_root(opts);
    writeln!(s, "# --- module files ---").unwrap();
    writeln!(s, "source \"{root}/share/{PKGMGR}/setup-env.sh\"").unwrap();
    writeln!(s, "# module system: {MODSYS_VERSION}").unwrap();
    writeln!(s, "{PKGMGR} module lmod refresh -y --delete-tree").unwrap();
    writeln!(s).unwrap();
}

fn write_profile_snippet(s: &mut String, opts: &BootstrapOptions) {
    let root = pkgmgr_root(opts);
    writeln!(s, "# --- profile snippet ---").unwrap();
    writeln!(s, "cat > /etc/profile.d/pctl-spack.sh <<'PCTL_EOF'").unwrap();
    writeln!(s, "source \"{root}/share/{PKGMGR}/setup-env.sh\"").unwrap();
    writeln!(s, "PCTL_EOF").unwrap();
    writeln!(s).unwrap();
}

fn write_users(s: &mut String, seed: &Seed) {
    writeln!(s, "# --- users ---").unwrap();
    for user in &seed.users {
        let name = &user.name;
        let uid = user.uid;
        let gid = user.gid;
        writeln!(s, "if ! getent group {gid} >/dev/null 2>&1; then").unwrap();
        writeln!(s, "  groupadd -g {gid} {name}").unwrap();
        writeln!(s, "fi").unwrap();
        writeln!(s, "if ! id -u {name} >/dev/null 2>&1; then").unwrap();
        writeln!(s, "  useradd -m -u {uid} -g {gid} {name}").unwrap();
        writeln!(s, "fi").unwrap();
    }
    writeln!(s).unwrap();
}

fn write_mounts(s: &mut String, seed: &Seed) {
    writeln!(s, "# --- object-store mounts ---").unwrap();
    writeln!(s, "TOKEN=$(curl -sf -X PUT \"http://169.254.169.254/latest/api/token\" -H \"X-aws-ec2-metadata-token-ttl-seconds: 21600\")").unwrap();
    writeln!(s, "if ! command -v mount-s3 >/dev/null 2>&1; then").unwrap();
    writeln!(s, "  curl -sf -o /tmp/mount-s3.rpm https://s3.amazonaws.com/mountpoint-s3-release/latest/x86_64/mount-s3.rpm").unwrap();
    writeln!(s, "  (dnf install -y /tmp/mount-s3.rpm || apt-get install -y /tmp/mount-s3.rpm)").unwrap();
    writeln!(s, "fi").unwrap();
    for mount in &seed.data.s3_mounts {
        let bucket = &mount.bucket;
        let point = &mount.mount_point;
        writeln!(s, "mkdir -p \"{point}\"").unwrap();
        writeln!(s, "if ! mountpoint -q \"{point}\"; then").unwrap();
        writeln!(
            s,
            "  mount-s3 --iam-role -H \"X-aws-ec2-metadata-token: $TOKEN\" {bucket} \"{point}\""
        )
        .unwrap();
        writeln!(s, "fi").unwrap();
    }
    writeln!(s).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pctl_seed::{ClusterConfig, Compute, DataConfig, Queue, S3Mount, SoftwareConfig, User};

    fn seed() -> Seed {
        Seed {
            cluster: ClusterConfig { name: "demo".into(), region: "us-west-2".into(), os: Os::Al2023 },
            compute: Compute { head_node: "c5.xlarge".into(), queues: vec![Queue { name: "compute".into(), instance_types: vec!["c5.large".into()], min_count: 0, max_count: 4 }] },
            software: SoftwareConfig { spack_packages: vec!["gcc@11.3.0".into(), "openmpi@4.1.4%gcc@11.3.0".into()] },
            users: vec![User { name: "researcher".into(), uid: 2000, gid: 2000 }],
            data: DataConfig { s3_mounts: vec![S3Mount { bucket: "demo-bucket".into(), mount_point: "/shared".into() }] },
            extends: None,
        }
    }

    #[test]
    fn synthesis_is_deterministic() {
        let opts = BootstrapOptions::default();
        let a = synthesize(&seed(), &opts).unwrap();
        let b = synthesize(&seed(), &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_seed_with_prebuilt_image_produces_no_script() {
        let mut bare = seed();
        bare.software.spack_packages.clear();
        bare.users.clear();
        bare.data.s3_mounts.clear();
        let opts = BootstrapOptions { prebuilt_image: true, ..Default::default() };
        assert!(synthesize(&bare, &opts).is_none());
    }

    #[test]
    fn empty_seed_without_prebuilt_image_still_produces_a_script() {
        let mut bare = seed();
        bare.software.spack_packages.clear();
        bare.users.clear();
        bare.data.s3_mounts.clear();
        let opts = BootstrapOptions::default();
        let script = synthesize(&bare, &opts).unwrap();
        assert!(script.starts_with("#!/bin/bash"));
    }

    #[test]
    fn script_has_set_dash_e() {
        let script = synthesize(&seed(), &BootstrapOptions::default()).unwrap();
        assert!(script.contains("set -e"));
    }

    #[test]
    fn package_markers_are_indexed_and_bounded() {
        let script = synthesize(&seed(), &BootstrapOptions::default()).unwrap();
        assert!(script.contains("PCTL_PKG_START:gcc@11.3.0:1/2"));
        assert!(script.contains("PCTL_PKG_START:openmpi@4.1.4%gcc@11.3.0:2/2"));
    }

    #[test]
    fn shared_storage_changes_pkgmgr_root() {
        let opts = BootstrapOptions { shared_storage: true, ..Default::default() };
        let script = synthesize(&seed(), &opts).unwrap();
        assert!(script.contains("/shared/spack"));
        assert!(!script.contains("/opt/spack"));
    }

    #[test]
    fn mounts_use_token_challenge_not_legacy_metadata_tool() {
        let script = synthesize(&seed(), &BootstrapOptions::default()).unwrap();
        assert!(script.contains("X-aws-ec2-metadata-token-ttl-seconds"));
        assert!(!script.contains("ec2-metadata"));
    }

    #[test]
    fn disk_usage_markers_present_before_and_after() {
        let script = synthesize(&seed(), &BootstrapOptions::default()).unwrap();
        assert_eq!(script.matches("PCTL_DISK_USAGE").count(), 2);
    }
}
