use crate::cri::{NamespaceMode, NamespaceOptions};
use crate::oci::{LinuxNamespace, NamespaceKind};
use log::trace;

/// Per-kind namespace decision for a sandbox. Mount and cgroup namespaces
/// are not part of the plan: the sandbox always gets its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespacePlan {
    pub network: NamespaceMode,
    pub uts: NamespaceMode,
    pub pid: NamespaceMode,
    pub ipc: NamespaceMode,
}

impl NamespacePlan {
    pub fn from_options(options: &NamespaceOptions) -> Self {
        Self {
            network: options.network,
            // A private hostname needs a private network identity
            uts: options.network,
            pid: options.pid,
            ipc: options.ipc,
        }
    }

    pub fn network_is_host(&self) -> bool {
        self.network.is_host()
    }

    pub fn ipc_is_host(&self) -> bool {
        self.ipc.is_host()
    }

    pub fn mode(&self, kind: NamespaceKind) -> NamespaceMode {
        match kind {
            NamespaceKind::Network => self.network,
            NamespaceKind::Uts => self.uts,
            NamespaceKind::Pid => self.pid,
            NamespaceKind::Ipc => self.ipc,
            NamespaceKind::Mount | NamespaceKind::Cgroup => NamespaceMode::Pod,
        }
    }

    /// The namespace list for the runtime spec. Host-shared kinds are left out; the
    /// network entry joins the prepared namespace at `netns_path`.
    pub fn namespaces(&self, netns_path: &str) -> Vec<LinuxNamespace> {
        [
            NamespaceKind::Pid,
            NamespaceKind::Network,
            NamespaceKind::Ipc,
            NamespaceKind::Uts,
            NamespaceKind::Mount,
            NamespaceKind::Cgroup,
        ]
        .into_iter()
        .filter(|kind| {
            let host = self.mode(*kind).is_host();
            if host {
                trace!("Sharing the host {} namespace", kind);
            }
            !host
        })
        .map(|kind| match kind {
            NamespaceKind::Network => LinuxNamespace::with_path(kind, netns_path),
            _ => LinuxNamespace::new(kind),
        })
        .collect()
    }
}
