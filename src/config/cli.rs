use crate::config::OperatorSettings;
use clap::Parser;
use clap_complete::engine::{ArgValueCompleter, CompletionCandidate};
use std::path::PathBuf;

#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /**********************/
    /* Flags and settings */
    /**********************/
    /// Set the log level to one of trace, debug, info, warn, or error.
    /// `-v` is shorthand for enabling verbose (trace) logging.
    #[arg(short = 'v',
        long,
        global = true,
        default_missing_value = "trace",
        num_args = 0..=1,
        require_equals = true,
        value_parser = parse_log_level
    )]
    pub log_level: Option<log::LevelFilter>,

    /// Additional config file, applied after the system and user files
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Do not load config files.
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub no_config: bool,

    /// Formats action output as a JSON blob.
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub json: bool,

    /// Leave cgroups out of generated specs entirely
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub disable_cgroup: bool,

    /// Default `net.ipv4.ip_unprivileged_port_start` to 0 in pod networks
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub enable_unprivileged_ports: bool,

    /// Default `net.ipv4.ping_group_range` to all groups in pod networks
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub enable_unprivileged_icmp: bool,

    /// Label sandboxes when SELinux is enabled on the host
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub enable_selinux: bool,

    /// Persistent per-sandbox files live under this directory
    #[arg(long, global = true)]
    pub root_dir: Option<String>,

    /// Volatile per-sandbox files live under this directory
    #[arg(long, global = true)]
    pub state_dir: Option<String>,

    /***************/
    /* Subcommands */
    /***************/
    #[command(subcommand)]
    pub action: Action,
}

#[derive(clap::Subcommand, Clone, Debug)]
#[command(subcommand_help_heading = "Actions")]
pub enum Action {
    /// Generate the OCI runtime spec for a pod sandbox
    Build {
        /// CRI pod sandbox config, as JSON
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        request: PathBuf,

        /// OCI image config of the sandbox (pause) image
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        image: Option<PathBuf>,

        /// Sandbox id, generated when omitted
        #[arg(long)]
        id: Option<String>,

        /// Path of the already prepared network namespace
        #[arg(long, default_value = "")]
        netns: String,

        /// Write the runtime spec here instead of stdout
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Get current configuration options
    Config {
        /// The keys to get from the configuration
        #[arg(value_name = "KEYS", num_args = 0.., add = ArgValueCompleter::new(config_key_completion))]
        keys: Option<Vec<String>>,
    },
}

pub fn config_key_completion(
    current: &std::ffi::OsStr,
) -> Vec<CompletionCandidate> {
    let Some(current) = current.to_str() else {
        return vec![];
    };

    ["log_level", "config_files"]
        .into_iter()
        .chain(OperatorSettings::KEYS)
        .filter(|key| key.starts_with(current))
        .map(CompletionCandidate::new)
        .collect()
}

fn parse_log_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse::<log::LevelFilter>().map_err(|e| e.to_string())
}
