use crate::config::OperatorSettings;
use log::trace;
use std::collections::{BTreeMap, HashMap};

pub const UNPRIVILEGED_PORT_START: &str = "net.ipv4.ip_unprivileged_port_start";
pub const PING_GROUP_RANGE: &str = "net.ipv4.ping_group_range";

const ALL_PORTS: &str = "0";
const ALL_GROUPS: &str = "0 2147483647";

/// Network sysctls only make sense in the pod's own network namespace.
fn network_defaults_apply(network_is_host: bool) -> bool {
    !network_is_host
}

/// `ping_group_range` cannot be written from inside a user namespace.
fn icmp_default_applies(settings: &OperatorSettings, in_user_ns: bool) -> bool {
    settings.enable_unprivileged_icmp && !in_user_ns
}

pub fn default_sysctls(
    settings: &OperatorSettings,
    network_is_host: bool,
    in_user_ns: bool,
) -> BTreeMap<String, String> {
    let mut sysctls = BTreeMap::new();
    if !network_defaults_apply(network_is_host) {
        return sysctls;
    }
    if settings.enable_unprivileged_ports {
        sysctls.insert(UNPRIVILEGED_PORT_START.to_string(), ALL_PORTS.into());
    }
    if icmp_default_applies(settings, in_user_ns) {
        sysctls.insert(PING_GROUP_RANGE.to_string(), ALL_GROUPS.into());
    }
    sysctls
}

/// Built-in defaults overlaid with the request's own sysctls. A requested
/// key replaces the default outright.
pub fn effective_sysctls(
    settings: &OperatorSettings,
    requested: &HashMap<String, String>,
    network_is_host: bool,
    in_user_ns: bool,
) -> BTreeMap<String, String> {
    let mut sysctls = default_sysctls(settings, network_is_host, in_user_ns);
    for (key, value) in requested {
        if let Some(default) = sysctls.insert(key.clone(), value.clone()) {
            trace!("Sysctl {}={} overrides default {}", key, value, default);
        }
    }
    sysctls
}
