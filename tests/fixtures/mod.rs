#![allow(dead_code)]

mod fixture_cli;
mod fixture_spec;

pub use fixture_cli::*;
pub use fixture_spec::*;
