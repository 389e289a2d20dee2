#![allow(
    clippy::collapsible_else_if,
    clippy::collapsible_if,
    clippy::module_inception,
    clippy::useless_format
)]
#![deny(
    clippy::get_unwrap,
    clippy::panic,
    clippy::print_stdout,
    clippy::unwrap_used,
    clippy::used_underscore_binding,
    clippy::used_underscore_items
)]

//! Turns a CRI pod sandbox request, the sandbox image's process defaults and
//! the operator's settings into the OCI runtime spec of the sandbox
//! container.

pub mod actions;
pub mod annotations;
pub mod builder;
pub mod config;
pub mod cri;
pub mod host;
pub mod logger;
pub mod oci;
pub mod util;

pub use builder::build_sandbox_spec;
