use super::impls::deserialize_level_filter;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf};

pub const DEFAULT_SANDBOX_CPU_SHARES: u64 = 2;
pub const DEFAULT_SANDBOX_OOM_SCORE_ADJ: i32 = -998;
pub const DEFAULT_ROOT_DIR: &str = "/var/lib/sandbox-spec";
pub const DEFAULT_STATE_DIR: &str = "/run/sandbox-spec";

/// Process-wide settings that shape every sandbox spec. Resolved once at
/// startup and handed to the builder by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorSettings {
    pub enable_unprivileged_ports: bool,
    pub enable_unprivileged_icmp: bool,
    pub disable_cgroup: bool,
    pub default_sandbox_cpu_shares: u64,
    pub default_sandbox_oom_score_adj: i32,
    pub enable_selinux: bool,
    pub root_dir: PathBuf,
    pub state_dir: PathBuf,
    /// Glob patterns selecting which request annotations reach the runtime spec.
    /// `None` lets every annotation through.
    pub pod_annotations: Option<Vec<String>>,
}

impl Default for OperatorSettings {
    fn default() -> Self {
        Self {
            enable_unprivileged_ports: false,
            enable_unprivileged_icmp: false,
            disable_cgroup: false,
            default_sandbox_cpu_shares: DEFAULT_SANDBOX_CPU_SHARES,
            default_sandbox_oom_score_adj: DEFAULT_SANDBOX_OOM_SCORE_ADJ,
            enable_selinux: false,
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            pod_annotations: None,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct PartialConfig {
    #[serde(deserialize_with = "deserialize_level_filter", default)]
    pub log_level: Option<log::LevelFilter>,
    pub enable_unprivileged_ports: Option<bool>,
    pub enable_unprivileged_icmp: Option<bool>,
    pub disable_cgroup: Option<bool>,
    pub default_sandbox_cpu_shares: Option<u64>,
    pub default_sandbox_oom_score_adj: Option<i32>,
    pub enable_selinux: Option<bool>,
    pub root_dir: Option<String>,
    pub state_dir: Option<String>,
    pub pod_annotations: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: log::LevelFilter,
    pub settings: OperatorSettings,
    pub sources: HashMap<String, String>,
    pub config_files: Vec<PathBuf>,
}
