pub mod annotations;
pub mod cgroups;
pub mod mounts;
pub mod namespaces;
pub mod process;
pub mod resources;
mod sandbox_spec;
pub mod sysctls;

pub use cgroups::cgroups_path_for;
pub use namespaces::NamespacePlan;
pub use sandbox_spec::build_sandbox_spec;
