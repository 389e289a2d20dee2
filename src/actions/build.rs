use crate::builder::build_sandbox_spec;
use crate::config::Config;
use crate::cri::{ImageProcessDefaults, SandboxRequest};
use crate::host::{Host, SelinuxLabels};
use crate::outln;
use crate::util::{json_mode, set_json_output};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub struct BuildArgs {
    pub request: PathBuf,
    pub image: Option<PathBuf>,
    pub id: Option<String>,
    pub netns: String,
    pub output: Option<PathBuf>,
}

fn new_sandbox_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn load_image(image: Option<&Path>) -> Result<ImageProcessDefaults> {
    match image {
        Some(path) => ImageProcessDefaults::load_from_file(path),
        None => {
            debug!("No image config given, using empty process defaults");
            Ok(ImageProcessDefaults::default())
        }
    }
}

pub fn build(config: &Config, args: BuildArgs) -> Result<()> {
    let request = SandboxRequest::load_from_file(&args.request)?;
    let image = load_image(args.image.as_deref())?;
    let id = args.id.unwrap_or_else(new_sandbox_id);

    let host = Host::new(config.settings.enable_selinux);
    let spec = build_sandbox_spec(
        &id,
        &request,
        &image,
        &config.settings,
        &args.netns,
        &host,
    )
    .context(format!("Failed to build spec for sandbox {}", id))?;

    set_json_output("id", Value::String(id.clone()));

    if let Some(output) = &args.output {
        let written = spec
            .to_json()
            .and_then(|json| Ok(std::fs::write(output, json + "\n")?))
            .context(format!("Failed to write spec to {}", output.display()));
        if let Err(e) = written {
            // Nobody will run this sandbox, its MCS level is free again
            let labels = SelinuxLabels {
                process: spec.process.selinux_label.clone(),
                mount: spec.linux.mount_label.clone(),
            };
            if let Err(release_error) = host.release_labels(&labels) {
                warn!("Failed to release labels of {}: {}", id, release_error);
            }
            return Err(e);
        }
        info!("Wrote spec for sandbox {} to {}", id, output.display());
        set_json_output("output", Value::String(output.display().to_string()));
    } else if json_mode() {
        let spec = serde_json::to_value(&spec)
            .context("Failed to serialize sandbox spec")?;
        set_json_output("spec", spec);
    } else {
        outln!("{}", spec.to_json()?);
    }

    Ok(())
}
