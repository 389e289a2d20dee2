use super::{HostSecurity, SelinuxLabels, running_in_user_namespace};
use crate::cri::SelinuxOptions;
use anyhow::{Context, Result, anyhow};
use log::{debug, trace};
use nix::errno::Errno;
use nix::sys::statfs::statfs;
use rand::Rng;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

const SELINUXFS_MOUNT: &str = "/sys/fs/selinux";
const SELINUXFS_MAGIC: i64 = 0xf97c_ff8c;

const DEFAULT_USER: &str = "system_u";
const DEFAULT_ROLE: &str = "system_r";
const DEFAULT_PROCESS_TYPE: &str = "container_t";
const MOUNT_CONTEXT_PREFIX: &str = "system_u:object_r:container_file_t";

const MCS_CATEGORIES: u32 = 1024;
const MAX_RESERVE_ATTEMPTS: usize = 1000;

/// The real host. SELinux labeling only happens when it is switched on in
/// the operator settings and the kernel actually enforces a policy.
pub struct Host {
    selinux_requested: bool,
    selinuxfs: PathBuf,
    reserved_levels: Mutex<HashSet<String>>,
}

impl Host {
    pub fn new(selinux_requested: bool) -> Self {
        Self {
            selinux_requested,
            selinuxfs: PathBuf::from(SELINUXFS_MOUNT),
            reserved_levels: Mutex::new(HashSet::new()),
        }
    }

    /// Returns a label's MCS level to the pool once its sandbox is gone.
    pub fn release_labels(&self, labels: &SelinuxLabels) -> Result<()> {
        let Some(level) = level_of(&labels.process) else {
            return Ok(());
        };
        self.reserved_levels
            .lock()
            .map_err(|_| anyhow!("MCS level registry is poisoned"))?
            .remove(level);
        Ok(())
    }

    fn reserve_level(&self, requested: &str) -> Result<String> {
        let mut reserved = self
            .reserved_levels
            .lock()
            .map_err(|_| anyhow!("MCS level registry is poisoned"))?;

        if !requested.is_empty() {
            // A caller-chosen level may be shared on purpose
            reserved.insert(requested.to_string());
            return Ok(requested.to_string());
        }

        let mut rng = rand::rng();
        for _ in 0..MAX_RESERVE_ATTEMPTS {
            let first = rng.random_range(0..MCS_CATEGORIES);
            let second = rng.random_range(0..MCS_CATEGORIES);
            if first == second {
                continue;
            }
            let level = format!(
                "s0:c{},c{}",
                first.min(second),
                first.max(second)
            );
            if reserved.insert(level.clone()) {
                return Ok(level);
            }
        }
        Err(anyhow!(
            "Unable to reserve a unique MCS level after {} attempts",
            MAX_RESERVE_ATTEMPTS
        ))
    }
}

impl HostSecurity for Host {
    fn selinux_enabled(&self) -> Result<bool> {
        if !self.selinux_requested {
            return Ok(false);
        }

        let stat = match statfs(self.selinuxfs.as_path()) {
            Ok(stat) => stat,
            Err(Errno::ENOENT) => {
                trace!("{} does not exist", self.selinuxfs.display());
                return Ok(false);
            }
            Err(e) => {
                return Err(anyhow!(
                    "Failed to statfs {}: {}",
                    self.selinuxfs.display(),
                    e
                ));
            }
        };
        if (stat.filesystem_type().0 as i64) & 0xffff_ffff != SELINUXFS_MAGIC {
            trace!("{} is not selinuxfs", self.selinuxfs.display());
            return Ok(false);
        }

        let current = std::fs::read_to_string("/proc/self/attr/current")
            .context("Failed to read the current SELinux context")?;
        let enabled = current.trim_end_matches('\0').trim() != "kernel";
        debug!("SELinux enabled: {}", enabled);
        Ok(enabled)
    }

    fn allocate_labels(
        &self,
        options: Option<&SelinuxOptions>,
    ) -> Result<SelinuxLabels> {
        let defaults = SelinuxOptions::default();
        let options = options.unwrap_or(&defaults);
        for (field, value) in [
            ("user", &options.user),
            ("role", &options.role),
            ("type", &options.kind),
        ] {
            if value.contains(':') {
                return Err(anyhow!(
                    "Invalid SELinux {} {:?}: must not contain ':'",
                    field,
                    value
                ));
            }
        }

        let level = self.reserve_level(&options.level)?;
        let labels = SelinuxLabels {
            process: format!(
                "{}:{}:{}:{}",
                or_default(&options.user, DEFAULT_USER),
                or_default(&options.role, DEFAULT_ROLE),
                or_default(&options.kind, DEFAULT_PROCESS_TYPE),
                level
            ),
            mount: format!("{}:{}", MOUNT_CONTEXT_PREFIX, level),
        };
        trace!("Allocated SELinux labels {:?}", labels);
        Ok(labels)
    }

    fn in_user_namespace(&self) -> bool {
        running_in_user_namespace()
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

/// The level is everything after the third ':' of a context.
fn level_of(label: &str) -> Option<&str> {
    label.splitn(4, ':').nth(3).filter(|level| !level.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_host_skips_selinuxfs() {
        let host = Host {
            selinux_requested: false,
            selinuxfs: PathBuf::from("/definitely/not/here"),
            reserved_levels: Mutex::new(HashSet::new()),
        };
        assert!(!host.selinux_enabled().unwrap());
    }

    #[test]
    fn test_missing_selinuxfs_means_disabled() {
        let host = Host {
            selinux_requested: true,
            selinuxfs: PathBuf::from("/definitely/not/here"),
            reserved_levels: Mutex::new(HashSet::new()),
        };
        assert!(!host.selinux_enabled().unwrap());
    }

    #[test]
    fn test_default_labels() {
        let host = Host::new(true);
        let labels = host.allocate_labels(None).unwrap();
        assert!(labels.process.starts_with("system_u:system_r:container_t:s0:c"));
        assert!(labels.mount.starts_with(MOUNT_CONTEXT_PREFIX));
        assert_eq!(level_of(&labels.process), level_of(&labels.mount));
    }

    #[test]
    fn test_levels_are_unique_until_released() {
        let host = Host::new(true);
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let labels = host.allocate_labels(None).unwrap();
            let level = level_of(&labels.process).unwrap().to_string();
            assert!(seen.insert(level));
        }
        let labels = host.allocate_labels(None).unwrap();
        host.release_labels(&labels).unwrap();
        let level = level_of(&labels.process).unwrap();
        assert!(!host.reserved_levels.lock().unwrap().contains(level));
    }

    #[test]
    fn test_releasing_unlabeled_spec_is_noop() {
        let host = Host::new(false);
        host.release_labels(&SelinuxLabels::default()).unwrap();
        assert!(host.reserved_levels.lock().unwrap().is_empty());
    }

    #[test]
    fn test_requested_options_are_honored() {
        let host = Host::new(true);
        let options = SelinuxOptions {
            user: "user_u".to_string(),
            role: String::new(),
            kind: "spc_t".to_string(),
            level: "s0:c1,c2".to_string(),
        };
        let labels = host.allocate_labels(Some(&options)).unwrap();
        assert_eq!(labels.process, "user_u:system_r:spc_t:s0:c1,c2");
        assert_eq!(labels.mount, "system_u:object_r:container_file_t:s0:c1,c2");
    }

    #[test]
    fn test_invalid_options_fail() {
        let host = Host::new(true);
        let options = SelinuxOptions {
            kind: "bad:type".to_string(),
            ..SelinuxOptions::default()
        };
        assert!(host.allocate_labels(Some(&options)).is_err());
    }
}
