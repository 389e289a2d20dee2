use crate::config::OperatorSettings;
use crate::cri::{ImageProcessDefaults, SandboxRequest};
use crate::host::{HostSecurity, SelinuxLabels};
use crate::oci::{Process, User};
use anyhow::{Context, Result, anyhow};
use log::trace;

pub const DEFAULT_PATH_ENV: &str =
    "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// The sandbox command line: the image's entrypoint followed by its cmd.
pub fn process_args(image: &ImageProcessDefaults) -> Vec<String> {
    image
        .entrypoint
        .iter()
        .chain(image.cmd.iter())
        .cloned()
        .collect()
}

fn env_key(entry: &str) -> &str {
    entry.split_once('=').map_or(entry, |(key, _)| key)
}

/// Applies `overrides` on top of `base`. An override replaces the entry with
/// the same key where it stands, or is appended. A bare `KEY` without `=`
/// removes the key.
pub fn merge_env(base: &[String], overrides: &[String]) -> Vec<String> {
    let mut env = base.to_vec();
    for entry in overrides {
        let key = env_key(entry);
        let existing = env.iter().position(|e| env_key(e) == key);
        match (existing, entry.contains('=')) {
            (Some(index), true) => env[index] = entry.clone(),
            (Some(index), false) => {
                env.remove(index);
            }
            (None, true) => env.push(entry.clone()),
            (None, false) => {}
        }
    }
    env
}

/// Labels for the sandbox, or empty labels when SELinux is not enforcing.
pub fn selinux_labels(
    host: &dyn HostSecurity,
    request: &SandboxRequest,
) -> Result<SelinuxLabels> {
    if !host
        .selinux_enabled()
        .context("Failed to query SELinux state")?
    {
        return Ok(SelinuxLabels::default());
    }

    let options = request.linux.security_context.selinux_options.as_ref();
    let labels = host.allocate_labels(options).context(format!(
        "Failed to init SELinux labels from options {:?}",
        options
    ))?;
    if labels.process.is_empty() || labels.mount.is_empty() {
        return Err(anyhow!(
            "SELinux is enabled but label allocation returned {:?}",
            labels
        ));
    }
    Ok(labels)
}

pub fn sandbox_process(
    request: &SandboxRequest,
    image: &ImageProcessDefaults,
    settings: &OperatorSettings,
    labels: &SelinuxLabels,
) -> Process {
    let args = process_args(image);
    trace!("Sandbox process args: {:?}", args);

    Process {
        user: User {
            uid: 0,
            gid: 0,
            additional_gids: request
                .linux
                .security_context
                .supplemental_groups
                .clone(),
        },
        args,
        env: merge_env(&[DEFAULT_PATH_ENV.to_string()], &image.env),
        cwd: image.working_dir.clone(),
        oom_score_adj: Some(settings.default_sandbox_oom_score_adj),
        selinux_label: labels.process.clone(),
    }
}
