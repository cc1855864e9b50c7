//! OCI runtime spec synthesis
//!
//! Pure functions from (privilege level, target argv, root path) to an
//! immutable configuration value: a baseline known-good spec, a rootless
//! transform for unprivileged users, and the final composition used by
//! the bundle builder. No filesystem side effects here.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// OCI Runtime Spec version this launcher emits.
pub const OCI_VERSION: &str = "1.2.0";

/// OCI Runtime Spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    pub oci_version: String,
    pub process: Process,
    pub root: Root,
    pub hostname: String,
    pub mounts: Vec<Mount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linux: Option<Linux>,
}

/// Container process definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub terminal: bool,
    pub user: User,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub cwd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub rlimits: Vec<Rlimit>,
    pub no_new_privileges: bool,
}

/// In-container user identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub uid: u32,
    pub gid: u32,
}

/// Capability sets for the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    pub bounding: Vec<String>,
    pub effective: Vec<String>,
    pub permitted: Vec<String>,
}

/// POSIX resource limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rlimit {
    #[serde(rename = "type")]
    pub kind: String,
    pub hard: u64,
    pub soft: u64,
}

/// Root filesystem reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Root {
    pub path: String,
    pub readonly: bool,
}

/// Filesystem mount entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mount {
    pub destination: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub options: Vec<String>,
}

impl Mount {
    fn new(destination: &str, kind: &str, source: &str, options: &[&str]) -> Self {
        Self {
            destination: destination.to_string(),
            kind: kind.to_string(),
            source: source.to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Linux-specific configuration block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Linux {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub uid_mappings: Vec<IdMapping>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub gid_mappings: Vec<IdMapping>,
    pub namespaces: Vec<Namespace>,
    pub masked_paths: Vec<String>,
    pub readonly_paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
}

/// Mapping between container and host ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdMapping {
    #[serde(rename = "containerID")]
    pub container_id: u32,
    #[serde(rename = "hostID")]
    pub host_id: u32,
    pub size: u32,
}

/// Namespace membership entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Namespace {
    fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            path: None,
        }
    }
}

/// Cgroup resource settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resources {
    pub devices: Vec<DeviceCgroup>,
}

/// Device cgroup rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCgroup {
    pub allow: bool,
    pub access: String,
}

/// Baseline known-good minimal spec.
///
/// Runs `sh` in a read-only rootfs with the standard mount table, a
/// minimal capability set and all five isolation namespaces.
pub fn example() -> Spec {
    Spec {
        oci_version: OCI_VERSION.to_string(),
        process: Process {
            terminal: false,
            user: User { uid: 0, gid: 0 },
            args: vec!["sh".to_string()],
            env: vec![
                "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin".to_string(),
                "TERM=xterm".to_string(),
            ],
            cwd: "/".to_string(),
            capabilities: Some(Capabilities {
                bounding: default_capabilities(),
                effective: default_capabilities(),
                permitted: default_capabilities(),
            }),
            rlimits: vec![Rlimit {
                kind: "RLIMIT_NOFILE".to_string(),
                hard: 1024,
                soft: 1024,
            }],
            no_new_privileges: true,
        },
        root: Root {
            path: "rootfs".to_string(),
            readonly: true,
        },
        hostname: "cradle".to_string(),
        mounts: vec![
            Mount::new("/proc", "proc", "proc", &[]),
            Mount::new(
                "/dev",
                "tmpfs",
                "tmpfs",
                &["nosuid", "strictatime", "mode=755", "size=65536k"],
            ),
            Mount::new(
                "/dev/pts",
                "devpts",
                "devpts",
                &[
                    "nosuid",
                    "noexec",
                    "newinstance",
                    "ptmxmode=0666",
                    "mode=0620",
                    "gid=5",
                ],
            ),
            Mount::new(
                "/dev/shm",
                "tmpfs",
                "shm",
                &["nosuid", "noexec", "nodev", "mode=1777", "size=65536k"],
            ),
            Mount::new("/dev/mqueue", "mqueue", "mqueue", &["nosuid", "noexec", "nodev"]),
            Mount::new("/sys", "sysfs", "sysfs", &["nosuid", "noexec", "nodev", "ro"]),
            Mount::new(
                "/sys/fs/cgroup",
                "cgroup",
                "cgroup",
                &["nosuid", "noexec", "nodev", "relatime", "ro"],
            ),
        ],
        linux: Some(Linux {
            uid_mappings: vec![],
            gid_mappings: vec![],
            namespaces: vec![
                Namespace::new("pid"),
                Namespace::new("network"),
                Namespace::new("ipc"),
                Namespace::new("uts"),
                Namespace::new("mount"),
            ],
            masked_paths: [
                "/proc/acpi",
                "/proc/asound",
                "/proc/kcore",
                "/proc/keys",
                "/proc/latency_stats",
                "/proc/timer_list",
                "/proc/timer_stats",
                "/proc/sched_debug",
                "/sys/firmware",
                "/proc/scsi",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            readonly_paths: [
                "/proc/bus",
                "/proc/fs",
                "/proc/irq",
                "/proc/sys",
                "/proc/sysrq-trigger",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            resources: Some(Resources {
                devices: vec![DeviceCgroup {
                    allow: false,
                    access: "rwm".to_string(),
                }],
            }),
        }),
    }
}

fn default_capabilities() -> Vec<String> {
    vec![
        "CAP_AUDIT_WRITE".to_string(),
        "CAP_KILL".to_string(),
        "CAP_NET_BIND_SERVICE".to_string(),
    ]
}

/// Transform a spec into its rootless-compatible variant.
///
/// Adds a user namespace mapping container root to the invoking user
/// (range size one), drops mounts that require real root (`/sys` is
/// re-added as a recursive bind from the host), strips `uid=`/`gid=`
/// mount options, and clears cgroup resource settings.
pub fn to_rootless(spec: &mut Spec, uid: u32, gid: u32) {
    let Some(linux) = spec.linux.as_mut() else {
        return;
    };

    linux.namespaces.push(Namespace::new("user"));
    linux.uid_mappings = vec![IdMapping {
        container_id: 0,
        host_id: uid,
        size: 1,
    }];
    linux.gid_mappings = vec![IdMapping {
        container_id: 0,
        host_id: gid,
        size: 1,
    }];
    linux.resources = None;

    let mut mounts: Vec<Mount> = Vec::with_capacity(spec.mounts.len());
    for mut mount in spec.mounts.drain(..) {
        if mount.destination.starts_with("/sys") {
            continue;
        }
        mount
            .options
            .retain(|o| !o.starts_with("uid=") && !o.starts_with("gid="));
        mounts.push(mount);
    }
    mounts.push(Mount::new(
        "/sys",
        "none",
        "/sys",
        &["rbind", "nosuid", "noexec", "nodev", "ro"],
    ));
    spec.mounts = mounts;
}

/// Synthesize the runtime configuration for one invocation.
///
/// Pure composition: baseline template, rootless transform when the
/// invoking user is unprivileged, then argv/root/hostname overrides.
pub fn build(
    rootless: bool,
    uid: u32,
    gid: u32,
    argv: &[String],
    root_path: &Path,
    hostname: &str,
) -> Spec {
    let mut spec = example();

    if rootless {
        to_rootless(&mut spec, uid, gid);
    }

    spec.process.args = argv.to_vec();
    spec.root = Root {
        path: root_path.to_string_lossy().to_string(),
        readonly: true,
    };
    spec.hostname = hostname.to_string();

    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn example_is_internally_consistent() {
        let spec = example();
        assert_eq!(spec.oci_version, OCI_VERSION);
        assert!(spec.root.readonly);

        let linux = spec.linux.as_ref().unwrap();
        let kinds: Vec<&str> = linux.namespaces.iter().map(|n| n.kind.as_str()).collect();
        assert_eq!(kinds, ["pid", "network", "ipc", "uts", "mount"]);
        assert!(linux.uid_mappings.is_empty());
        assert!(linux.resources.is_some());

        let caps = spec.process.capabilities.as_ref().unwrap();
        assert_eq!(caps.bounding, caps.effective);
        assert!(caps.bounding.contains(&"CAP_KILL".to_string()));
    }

    #[test]
    fn rootless_maps_container_root_to_invoking_user() {
        let spec = build(
            true,
            1000,
            1000,
            &argv(&["sleep", "3"]),
            &PathBuf::from("/cache/bundle/rootfs"),
            "cradle",
        );
        let linux = spec.linux.as_ref().unwrap();

        assert!(linux.namespaces.iter().any(|n| n.kind == "user"));
        assert_eq!(
            linux.uid_mappings,
            vec![IdMapping {
                container_id: 0,
                host_id: 1000,
                size: 1
            }]
        );
        assert_eq!(linux.gid_mappings[0].host_id, 1000);
        assert_eq!(linux.gid_mappings[0].size, 1);
    }

    #[test]
    fn rooted_spec_has_no_user_namespace() {
        let spec = build(
            false,
            0,
            0,
            &argv(&["sleep", "3"]),
            &PathBuf::from("/cache/bundle/rootfs"),
            "cradle",
        );
        let linux = spec.linux.as_ref().unwrap();

        assert!(!linux.namespaces.iter().any(|n| n.kind == "user"));
        assert!(linux.uid_mappings.is_empty());
        assert!(linux.gid_mappings.is_empty());
        assert!(linux.resources.is_some());
    }

    #[test]
    fn rootless_strips_privileged_mount_options() {
        let mut spec = example();
        to_rootless(&mut spec, 1000, 1000);

        let devpts = spec
            .mounts
            .iter()
            .find(|m| m.destination == "/dev/pts")
            .unwrap();
        assert!(!devpts.options.iter().any(|o| o.starts_with("gid=")));

        // /sys becomes a recursive bind from the host, cgroup mount is gone
        assert!(!spec.mounts.iter().any(|m| m.destination == "/sys/fs/cgroup"));
        let sys = spec.mounts.iter().find(|m| m.destination == "/sys").unwrap();
        assert_eq!(sys.kind, "none");
        assert!(sys.options.contains(&"rbind".to_string()));

        assert!(spec.linux.as_ref().unwrap().resources.is_none());
    }

    #[test]
    fn build_overrides_argv_and_root() {
        let spec = build(
            true,
            1000,
            1000,
            &argv(&["sh", "-c", "id"]),
            &PathBuf::from("/x/rootfs"),
            "box",
        );
        assert_eq!(spec.process.args, ["sh", "-c", "id"]);
        assert_eq!(spec.root.path, "/x/rootfs");
        assert!(spec.root.readonly);
        assert_eq!(spec.hostname, "box");
        // Environment and rlimits come from the template untouched
        assert!(spec.process.env.iter().any(|e| e.starts_with("PATH=")));
        assert_eq!(spec.process.rlimits[0].kind, "RLIMIT_NOFILE");
    }

    #[test]
    fn serializes_with_oci_field_casing() {
        let spec = build(
            true,
            1000,
            1000,
            &argv(&["sleep", "3"]),
            &PathBuf::from("rootfs"),
            "cradle",
        );
        let json = serde_json::to_string_pretty(&spec).unwrap();

        assert!(json.contains("\"ociVersion\""));
        assert!(json.contains("\"noNewPrivileges\""));
        assert!(json.contains("\"maskedPaths\""));
        assert!(json.contains("\"uidMappings\""));
        assert!(json.contains("\"containerID\""));
        assert!(json.contains("\"type\": \"user\""));

        // Round-trips cleanly
        let parsed: Spec = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.process.args, ["sleep", "3"]);
    }
}
