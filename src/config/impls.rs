use super::structs::OperatorSettings;

use serde::Deserialize;
use std::{
    fmt::{self, Display},
    str::FromStr,
};

impl OperatorSettings {
    /// Every key `get` understands, in display order.
    pub const KEYS: [&'static str; 9] = [
        "enable_unprivileged_ports",
        "enable_unprivileged_icmp",
        "disable_cgroup",
        "default_sandbox_cpu_shares",
        "default_sandbox_oom_score_adj",
        "enable_selinux",
        "root_dir",
        "state_dir",
        "pod_annotations",
    ];

    /// String form of a single setting, accepting `-` or `_` separators.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key.replace('-', "_").as_str() {
            "enable_unprivileged_ports" => {
                self.enable_unprivileged_ports.to_string()
            }
            "enable_unprivileged_icmp" => {
                self.enable_unprivileged_icmp.to_string()
            }
            "disable_cgroup" => self.disable_cgroup.to_string(),
            "default_sandbox_cpu_shares" => {
                self.default_sandbox_cpu_shares.to_string()
            }
            "default_sandbox_oom_score_adj" => {
                self.default_sandbox_oom_score_adj.to_string()
            }
            "enable_selinux" => self.enable_selinux.to_string(),
            "root_dir" => self.root_dir.display().to_string(),
            "state_dir" => self.state_dir.display().to_string(),
            "pod_annotations" => match &self.pod_annotations {
                Some(patterns) => patterns.join(","),
                None => "*".to_string(),
            },
            _ => return None,
        };
        Some(value)
    }
}

impl Display for OperatorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in Self::KEYS {
            if let Some(value) = self.get(key) {
                writeln!(f, "{}={}", key, value)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn deserialize_level_filter<'de, D>(
    deserializer: D,
) -> Result<Option<log::LevelFilter>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    s.map_or(Ok(None), |s| {
        log::LevelFilter::from_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom)
    })
}
