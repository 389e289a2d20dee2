use crate::config::OperatorSettings;
use crate::oci::Mount;
use std::path::{Path, PathBuf};

pub const DEV_SHM: &str = "/dev/shm";
pub const RESOLV_CONF: &str = "/etc/resolv.conf";

const SANDBOX_BIND_OPTIONS: [&str; 5] = ["rbind", "ro", "nosuid", "nodev", "noexec"];

fn mount(destination: &str, mount_type: &str, source: &str, options: &[&str]) -> Mount {
    Mount {
        destination: destination.to_string(),
        mount_type: mount_type.to_string(),
        source: source.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
    }
}

/// Directory holding a sandbox's persistent files.
pub fn sandbox_root_dir(settings: &OperatorSettings, id: &str) -> PathBuf {
    settings.root_dir.join("sandboxes").join(id)
}

/// Directory holding a sandbox's volatile files.
pub fn sandbox_state_dir(settings: &OperatorSettings, id: &str) -> PathBuf {
    settings.state_dir.join("sandboxes").join(id)
}

pub fn sandbox_dev_shm(settings: &OperatorSettings, id: &str, ipc_is_host: bool) -> PathBuf {
    if ipc_is_host {
        PathBuf::from(DEV_SHM)
    } else {
        sandbox_state_dir(settings, id).join("shm")
    }
}

pub fn sandbox_resolv_conf(settings: &OperatorSettings, id: &str) -> PathBuf {
    sandbox_root_dir(settings, id).join("resolv.conf")
}

fn bind(destination: &str, source: &Path) -> Mount {
    mount(
        destination,
        "bind",
        &source.to_string_lossy(),
        &SANDBOX_BIND_OPTIONS,
    )
}

/// Kernel filesystems every sandbox gets, followed by the per-sandbox
/// `/dev/shm` and `resolv.conf` binds. The sources of those binds need not
/// exist yet.
pub fn sandbox_mounts(settings: &OperatorSettings, id: &str, ipc_is_host: bool) -> Vec<Mount> {
    vec![
        mount("/proc", "proc", "proc", &["nosuid", "noexec", "nodev"]),
        mount(
            "/dev",
            "tmpfs",
            "tmpfs",
            &["nosuid", "strictatime", "mode=755", "size=65536k"],
        ),
        mount(
            "/dev/pts",
            "devpts",
            "devpts",
            &["nosuid", "noexec", "newinstance", "ptmxmode=0666", "mode=0620", "gid=5"],
        ),
        mount("/dev/mqueue", "mqueue", "mqueue", &["nosuid", "noexec", "nodev"]),
        mount("/sys", "sysfs", "sysfs", &["nosuid", "noexec", "nodev", "ro"]),
        bind(DEV_SHM, &sandbox_dev_shm(settings, id, ipc_is_host)),
        bind(RESOLV_CONF, &sandbox_resolv_conf(settings, id)),
    ]
}
