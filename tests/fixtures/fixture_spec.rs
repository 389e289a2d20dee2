use anyhow::{Result, anyhow};
use rand::Rng;
use rstest::*;
use sandbox_spec::config::OperatorSettings;
use sandbox_spec::cri::{
    ImageProcessDefaults, SandboxMetadata, SandboxRequest, SelinuxOptions,
};
use sandbox_spec::host::{HostSecurity, SelinuxLabels};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const NETNS_PATH: &str = "/var/run/netns/test-cni";

pub fn rid() -> String {
    let mut rng = rand::rng();
    (0..10)
        .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
        .collect()
}

#[fixture]
pub fn sandbox_id() -> String {
    format!("test-{}", rid().to_lowercase())
}

#[fixture]
pub fn request() -> SandboxRequest {
    let mut request = SandboxRequest {
        metadata: SandboxMetadata {
            name: "test-name".to_string(),
            uid: "test-uid".to_string(),
            namespace: "test-ns".to_string(),
            attempt: 1,
        },
        hostname: "test-hostname".to_string(),
        log_directory: "test-log-directory".to_string(),
        labels: HashMap::from([("a".to_string(), "b".to_string())]),
        annotations: HashMap::from([("c".to_string(), "d".to_string())]),
        ..SandboxRequest::default()
    };
    request.linux.cgroup_parent = "/test/cgroup/parent".to_string();
    request
}

#[fixture]
pub fn image() -> ImageProcessDefaults {
    ImageProcessDefaults {
        env: vec!["a=b".to_string(), "c=d".to_string()],
        entrypoint: vec!["/pause".to_string()],
        cmd: vec!["forever".to_string()],
        working_dir: "/workspace".to_string(),
    }
}

#[fixture]
pub fn settings() -> OperatorSettings {
    OperatorSettings {
        enable_unprivileged_ports: true,
        enable_unprivileged_icmp: true,
        ..OperatorSettings::default()
    }
}

/// Scripted stand-in for the host: SELinux state, label allocation and user
/// namespace detection are all fixed up front.
#[derive(Default)]
pub struct FakeHost {
    pub selinux: bool,
    pub fail_query: bool,
    pub fail_allocation: bool,
    pub labels: SelinuxLabels,
    pub user_namespace: bool,
    pub allocations: AtomicUsize,
}

impl FakeHost {
    pub fn with_selinux(process: &str, mount: &str) -> Self {
        Self {
            selinux: true,
            labels: SelinuxLabels {
                process: process.to_string(),
                mount: mount.to_string(),
            },
            ..Self::default()
        }
    }
}

impl HostSecurity for FakeHost {
    fn selinux_enabled(&self) -> Result<bool> {
        if self.fail_query {
            return Err(anyhow!("selinuxfs unreadable"));
        }
        Ok(self.selinux)
    }

    fn allocate_labels(
        &self,
        _options: Option<&SelinuxOptions>,
    ) -> Result<SelinuxLabels> {
        self.allocations.fetch_add(1, Ordering::SeqCst);
        if self.fail_allocation {
            return Err(anyhow!("no MCS levels left"));
        }
        Ok(self.labels.clone())
    }

    fn in_user_namespace(&self) -> bool {
        self.user_namespace
    }
}

#[fixture]
pub fn host() -> FakeHost {
    FakeHost::default()
}
