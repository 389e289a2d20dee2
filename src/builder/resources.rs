use super::cgroups::cgroups_enabled;
use crate::annotations;
use crate::config::OperatorSettings;
use crate::cri::SandboxResources;
use crate::oci::{LinuxCpu, LinuxMemory, LinuxResources};

/// Sizing annotations recording what the request asked for. They are written
/// whenever resources were supplied, even with cgroups disabled, so later
/// stats collection can recover the requested limits.
pub fn resource_annotations(
    resources: Option<&SandboxResources>,
) -> Vec<(&'static str, String)> {
    let Some(resources) = resources else {
        return vec![];
    };
    vec![
        (annotations::SANDBOX_CPU_PERIOD, resources.cpu_period.to_string()),
        (annotations::SANDBOX_CPU_QUOTA, resources.cpu_quota.to_string()),
        (annotations::SANDBOX_CPU_SHARES, resources.cpu_shares.to_string()),
        (
            annotations::SANDBOX_MEM,
            resources.memory_limit_in_bytes.to_string(),
        ),
    ]
}

/// Shares the request asked for, if it asked at all. Zero means "unset".
fn requested_cpu_shares(resources: Option<&SandboxResources>) -> Option<u64> {
    resources.map(|r| r.cpu_shares).filter(|shares| *shares != 0)
}

pub fn cpu_shares(
    settings: &OperatorSettings,
    resources: Option<&SandboxResources>,
) -> u64 {
    requested_cpu_shares(resources)
        .unwrap_or(settings.default_sandbox_cpu_shares)
}

/// OCI resource limits. Nothing is set when cgroups are disabled.
pub fn linux_resources(
    settings: &OperatorSettings,
    resources: Option<&SandboxResources>,
) -> LinuxResources {
    if !cgroups_enabled(settings) {
        return LinuxResources::default();
    }

    let cpu = LinuxCpu {
        shares: Some(cpu_shares(settings, resources)),
        period: resources.and_then(|r| u64::try_from(r.cpu_period).ok()),
        quota: resources.map(|r| r.cpu_quota).filter(|quota| *quota >= 0),
    };
    let memory = resources.map(|r| LinuxMemory {
        limit: Some(r.memory_limit_in_bytes),
    });

    LinuxResources {
        cpu: Some(cpu),
        memory,
    }
}
