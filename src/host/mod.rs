mod selinux;
mod userns;

pub use selinux::*;
pub use userns::*;

use crate::cri::SelinuxOptions;
use anyhow::Result;

/// Process and mount labels for one sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelinuxLabels {
    pub process: String,
    pub mount: String,
}

/// What the spec builder needs to know about, and ask of, the host it runs
/// on. Implementations may do I/O; the builder only calls through this trait.
pub trait HostSecurity: Send + Sync {
    fn selinux_enabled(&self) -> Result<bool>;

    fn allocate_labels(
        &self,
        options: Option<&SelinuxOptions>,
    ) -> Result<SelinuxLabels>;

    fn in_user_namespace(&self) -> bool;
}
