#![deny(
    clippy::get_unwrap,
    clippy::panic,
    clippy::print_stdout,
    clippy::unwrap_used,
    clippy::use_debug
)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser};
use clap_complete::CompleteEnv;
use log::Log;
use sandbox_spec::actions::{self, BuildArgs};
use sandbox_spec::config::{cli, resolve_config};
use sandbox_spec::logger::SpecLogger;
use sandbox_spec::util::{print_json_output, set_json_mode};

pub fn main() -> Result<()> {
    // Does not return when the shell asked for completions
    CompleteEnv::with_factory(cli::Args::command).complete();

    let logger = SpecLogger::new(log::LevelFilter::Trace)
        .init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;
    let cli = cli::Args::parse();

    logger.set_level(cli.log_level.unwrap_or(log::LevelFilter::Info));

    let config = resolve_config(&cli).context("Resolving config");
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            logger.print_deferred();
            return Err(e);
        }
    };

    // The config may have changed the level; replay what was held back
    logger.set_level(config.log_level);
    logger.print_deferred();

    set_json_mode(cli.json);

    let result = match cli.action {
        cli::Action::Build {
            request,
            image,
            id,
            netns,
            output,
        } => actions::build(
            &config,
            BuildArgs {
                request,
                image,
                id,
                netns,
                output,
            },
        ),
        cli::Action::Config { keys } => actions::config(&config, keys),
    };

    if cli.json {
        print_json_output(&result)?;
        logger.flush();
        if result.is_err() {
            std::process::exit(1);
        }
        return Ok(());
    }
    logger.flush();
    result
}
