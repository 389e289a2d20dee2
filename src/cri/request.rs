use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// The pod sandbox half of a CRI `RunPodSandbox` call. The sandbox id and
/// the network namespace path travel next to it rather than inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxRequest {
    pub metadata: SandboxMetadata,
    pub hostname: String,
    pub log_directory: String,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub linux: LinuxSandboxOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxMetadata {
    pub name: String,
    pub uid: String,
    pub namespace: String,
    pub attempt: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinuxSandboxOptions {
    pub cgroup_parent: String,
    pub security_context: SecurityContext,
    pub sysctls: HashMap<String, String>,
    pub resources: Option<SandboxResources>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityContext {
    pub namespace_options: NamespaceOptions,
    pub supplemental_groups: Vec<u32>,
    pub selinux_options: Option<SelinuxOptions>,
}

/// Whether a namespace kind belongs to the pod or is shared with the node.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum NamespaceMode {
    #[default]
    Pod,
    Node,
}

impl NamespaceMode {
    pub fn is_host(self) -> bool {
        self == NamespaceMode::Node
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceOptions {
    pub network: NamespaceMode,
    pub pid: NamespaceMode,
    pub ipc: NamespaceMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelinuxOptions {
    pub user: String,
    pub role: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub level: String,
}

/// Pod-level resource limits. A negative quota means "no quota".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxResources {
    pub cpu_period: i64,
    pub cpu_quota: i64,
    pub cpu_shares: u64,
    pub memory_limit_in_bytes: i64,
}

impl SandboxRequest {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let request_json = std::fs::read_to_string(path).context(format!(
            "Failed to read sandbox request from {}",
            path.display()
        ))?;
        let request: SandboxRequest = serde_json::from_str(&request_json)
            .context(format!(
                "Failed to parse sandbox request {}",
                path.display()
            ))?;
        Ok(request)
    }

    pub fn namespace_options(&self) -> &NamespaceOptions {
        &self.linux.security_context.namespace_options
    }
}
