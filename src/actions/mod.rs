mod build;
mod config;

pub use build::*;
pub use config::*;
