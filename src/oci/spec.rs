use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of the OCI runtime specification the generated documents follow.
pub const OCI_VERSION: &str = "1.1.0";

/// Rootfs location relative to the bundle directory. Every sandbox spec uses
/// it, read-only.
pub const RELATIVE_ROOTFS_PATH: &str = "rootfs";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    pub oci_version: String,
    pub root: Root,
    pub process: Process,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(default)]
    pub mounts: Vec<Mount>,
    pub linux: Linux,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub path: String,
    #[serde(default)]
    pub readonly: bool,
}

impl Root {
    pub fn sandbox() -> Self {
        Self {
            path: RELATIVE_ROOTFS_PATH.to_string(),
            readonly: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub user: User,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub cwd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oom_score_adj: Option<i32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub selinux_label: String,
}

/// User and group ids for the sandbox process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: u32,
    pub gid: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_gids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    pub destination: String,
    #[serde(rename = "type")]
    pub mount_type: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Linux {
    pub namespaces: Vec<LinuxNamespace>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cgroups_path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sysctl: BTreeMap<String, String>,
    #[serde(default)]
    pub resources: LinuxResources,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mount_label: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    Pid,
    Network,
    Ipc,
    Uts,
    Mount,
    Cgroup,
}

impl std::fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NamespaceKind::Pid => "pid",
            NamespaceKind::Network => "network",
            NamespaceKind::Ipc => "ipc",
            NamespaceKind::Uts => "uts",
            NamespaceKind::Mount => "mount",
            NamespaceKind::Cgroup => "cgroup",
        };
        write!(f, "{}", name)
    }
}

/// A namespace the sandbox process gets. An empty path asks the runtime for
/// a fresh namespace, a non-empty one joins an existing namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinuxNamespace {
    #[serde(rename = "type")]
    pub kind: NamespaceKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

impl LinuxNamespace {
    pub fn new(kind: NamespaceKind) -> Self {
        Self {
            kind,
            path: String::new(),
        }
    }

    pub fn with_path(kind: NamespaceKind, path: &str) -> Self {
        Self {
            kind,
            path: path.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinuxResources {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<LinuxCpu>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<LinuxMemory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinuxCpu {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinuxMemory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl Spec {
    pub fn namespace(&self, kind: NamespaceKind) -> Option<&LinuxNamespace> {
        self.linux.namespaces.iter().find(|ns| ns.kind == kind)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_oci_field_names() {
        let mut spec = Spec {
            oci_version: OCI_VERSION.to_string(),
            root: Root::sandbox(),
            ..Spec::default()
        };
        spec.process.oom_score_adj = Some(-998);
        spec.linux.cgroups_path = "/kubepods/abc".to_string();
        spec.linux
            .namespaces
            .push(LinuxNamespace::with_path(NamespaceKind::Network, "/ns"));

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["ociVersion"], "1.1.0");
        assert_eq!(value["root"]["path"], "rootfs");
        assert_eq!(value["root"]["readonly"], true);
        assert_eq!(value["process"]["oomScoreAdj"], -998);
        assert_eq!(value["linux"]["cgroupsPath"], "/kubepods/abc");
        assert_eq!(value["linux"]["namespaces"][0]["type"], "network");
        assert_eq!(value["linux"]["namespaces"][0]["path"], "/ns");
        assert!(value["linux"]["resources"].get("cpu").is_none());
        assert!(value.get("annotations").is_none());
    }
}
