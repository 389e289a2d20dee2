//! Annotation keys stamped onto sandbox specs. Other components look
//! sandboxes up by these keys, so their values never change.

pub const CONTAINER_TYPE: &str = "io.kubernetes.cri.container-type";
pub const CONTAINER_TYPE_SANDBOX: &str = "sandbox";

pub const SANDBOX_ID: &str = "io.kubernetes.cri.sandbox-id";
pub const SANDBOX_NAME: &str = "io.kubernetes.cri.sandbox-name";
pub const SANDBOX_NAMESPACE: &str = "io.kubernetes.cri.sandbox-namespace";
pub const SANDBOX_UID: &str = "io.kubernetes.cri.sandbox-uid";
pub const SANDBOX_LOG_DIR: &str = "io.kubernetes.cri.sandbox-log-directory";

pub const SANDBOX_CPU_PERIOD: &str = "io.kubernetes.cri.sandbox-cpu-period";
pub const SANDBOX_CPU_QUOTA: &str = "io.kubernetes.cri.sandbox-cpu-quota";
pub const SANDBOX_CPU_SHARES: &str = "io.kubernetes.cri.sandbox-cpu-shares";
pub const SANDBOX_MEM: &str = "io.kubernetes.cri.sandbox-memory";

pub const RESERVED: [&str; 6] = [
    SANDBOX_ID,
    CONTAINER_TYPE,
    SANDBOX_NAMESPACE,
    SANDBOX_UID,
    SANDBOX_NAME,
    SANDBOX_LOG_DIR,
];

pub fn is_reserved(key: &str) -> bool {
    RESERVED.contains(&key)
}

/// Keys recording the requested pod sizing. Only the resource translator
/// writes them.
pub const SIZING: [&str; 4] = [
    SANDBOX_CPU_PERIOD,
    SANDBOX_CPU_QUOTA,
    SANDBOX_CPU_SHARES,
    SANDBOX_MEM,
];

pub fn is_sizing(key: &str) -> bool {
    SIZING.contains(&key)
}
