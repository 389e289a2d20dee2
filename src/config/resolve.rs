use super::cli::Args;
use super::{Config, OperatorSettings, PartialConfig};
use anyhow::{Context, Result, anyhow};
use log::trace;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub fn resolve_config(cli: &Args) -> Result<Config> {
    let (mut partial_config, mut sources, config_files) =
        load_partial(cli.no_config, cli.config.as_deref())?;

    // Environment overrides config files
    apply_env_overrides(&mut partial_config, &mut sources, |key| {
        std::env::var(key).ok()
    })?;

    // CLI args have the highest precedence
    apply_cli_overrides(&mut partial_config, &mut sources, cli);

    let config = finalize(partial_config, sources, config_files);
    validate_config(&config)?;

    trace!("Operator settings: {:?}", config.settings);
    Ok(config)
}

pub fn load_partial(
    no_config: bool,
    extra_config: Option<&Path>,
) -> Result<(PartialConfig, HashMap<String, String>, Vec<PathBuf>)> {
    let mut config_paths = if no_config {
        vec![]
    } else {
        find_config_files()
    };
    // An explicitly requested file must exist, even with --no-config
    if let Some(extra_config) = extra_config {
        if !extra_config.exists() {
            return Err(anyhow!(
                "Config file does not exist: {}",
                extra_config.display()
            ));
        }
        config_paths.push(extra_config.to_path_buf());
    }

    let mut sources = HashMap::new();
    if config_paths.is_empty() {
        trace!("No config files found, using default config");
        return Ok((PartialConfig::default(), sources, config_paths));
    }

    let mut merged_config = PartialConfig::default();
    for path in config_paths.iter() {
        let config_str = std::fs::read_to_string(path).context(format!(
            "Failed to read config file {}",
            path.display()
        ))?;

        let config: PartialConfig = toml::from_str(&config_str).context(
            format!("Failed to parse config file {}", path.display()),
        )?;

        merge_configs(
            &mut merged_config,
            &mut sources,
            config,
            &path.display().to_string(),
        );
        trace!("Loaded config file: {}", path.display());
    }

    Ok((merged_config, sources, config_paths))
}

/** Returns the existing config files, lowest precedence first */
fn find_config_files() -> Vec<PathBuf> {
    let mut paths_to_check = vec![PathBuf::from("/etc/sandbox-spec.toml")];
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            paths_to_check.push(
                Path::new(&home).join(".config/sandbox-spec/config.toml"),
            );
        }
    }

    paths_to_check
        .into_iter()
        .filter(|path| path.is_file())
        .collect()
}

fn merge_configs(
    base: &mut PartialConfig,
    sources: &mut HashMap<String, String>,
    override_config: PartialConfig,
    source: &str,
) {
    if let Some(log_level) = override_config.log_level {
        base.log_level = Some(log_level);
        sources.insert("log_level".into(), source.into());
    }
    if let Some(value) = override_config.enable_unprivileged_ports {
        base.enable_unprivileged_ports = Some(value);
        sources.insert("enable_unprivileged_ports".into(), source.into());
    }
    if let Some(value) = override_config.enable_unprivileged_icmp {
        base.enable_unprivileged_icmp = Some(value);
        sources.insert("enable_unprivileged_icmp".into(), source.into());
    }
    if let Some(value) = override_config.disable_cgroup {
        base.disable_cgroup = Some(value);
        sources.insert("disable_cgroup".into(), source.into());
    }
    if let Some(value) = override_config.default_sandbox_cpu_shares {
        base.default_sandbox_cpu_shares = Some(value);
        sources.insert("default_sandbox_cpu_shares".into(), source.into());
    }
    if let Some(value) = override_config.default_sandbox_oom_score_adj {
        base.default_sandbox_oom_score_adj = Some(value);
        sources.insert("default_sandbox_oom_score_adj".into(), source.into());
    }
    if let Some(value) = override_config.enable_selinux {
        base.enable_selinux = Some(value);
        sources.insert("enable_selinux".into(), source.into());
    }
    if let Some(root_dir) = override_config.root_dir {
        base.root_dir = Some(root_dir);
        sources.insert("root_dir".into(), source.into());
    }
    if let Some(state_dir) = override_config.state_dir {
        base.state_dir = Some(state_dir);
        sources.insert("state_dir".into(), source.into());
    }
    // Annotation patterns accumulate across files
    if let Some(patterns) = override_config.pod_annotations {
        match &mut base.pod_annotations {
            Some(existing) => existing.extend(patterns),
            None => base.pod_annotations = Some(patterns),
        }
        sources.insert("pod_annotations".into(), source.into());
    }
}

fn parse_env_bool(key: &str, value: &str) -> Result<bool> {
    bool::from_str(value)
        .map_err(|_| anyhow!("Invalid value for {}: {}", key, value))
}

pub fn apply_env_overrides<F>(
    partial_config: &mut PartialConfig,
    sources: &mut HashMap<String, String>,
    lookup: F,
) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

    if let Some(log_level) = lookup("SANDBOX_SPEC_LOG_LEVEL") {
        let log_level = log::LevelFilter::from_str(&log_level)
            .map_err(|_| anyhow!("Invalid log level: {}", log_level))?;
        partial_config.log_level = Some(log_level);
        sources.insert("log_level".into(), "environment".into());
    }

    let bool_settings: [(&str, &str, &mut Option<bool>); 4] = [
        (
            "SANDBOX_SPEC_ENABLE_UNPRIVILEGED_PORTS",
            "enable_unprivileged_ports",
            &mut partial_config.enable_unprivileged_ports,
        ),
        (
            "SANDBOX_SPEC_ENABLE_UNPRIVILEGED_ICMP",
            "enable_unprivileged_icmp",
            &mut partial_config.enable_unprivileged_icmp,
        ),
        (
            "SANDBOX_SPEC_DISABLE_CGROUP",
            "disable_cgroup",
            &mut partial_config.disable_cgroup,
        ),
        (
            "SANDBOX_SPEC_ENABLE_SELINUX",
            "enable_selinux",
            &mut partial_config.enable_selinux,
        ),
    ];
    for (env_key, key, slot) in bool_settings {
        if let Some(value) = lookup(env_key) {
            *slot = Some(parse_env_bool(env_key, &value)?);
            sources.insert(key.into(), "environment".into());
        }
    }

    if let Some(shares) = lookup("SANDBOX_SPEC_DEFAULT_SANDBOX_CPU_SHARES") {
        partial_config.default_sandbox_cpu_shares =
            Some(shares.parse::<u64>().map_err(|_| {
                anyhow!(
                    "Invalid value for SANDBOX_SPEC_DEFAULT_SANDBOX_CPU_SHARES: {}",
                    shares
                )
            })?);
        sources.insert("default_sandbox_cpu_shares".into(), "environment".into());
    }
    if let Some(adj) = lookup("SANDBOX_SPEC_DEFAULT_SANDBOX_OOM_SCORE_ADJ") {
        partial_config.default_sandbox_oom_score_adj =
            Some(adj.parse::<i32>().map_err(|_| {
                anyhow!(
                    "Invalid value for SANDBOX_SPEC_DEFAULT_SANDBOX_OOM_SCORE_ADJ: {}",
                    adj
                )
            })?);
        sources
            .insert("default_sandbox_oom_score_adj".into(), "environment".into());
    }

    if let Some(root_dir) = lookup("SANDBOX_SPEC_ROOT_DIR") {
        partial_config.root_dir = Some(root_dir);
        sources.insert("root_dir".into(), "environment".into());
    }
    if let Some(state_dir) = lookup("SANDBOX_SPEC_STATE_DIR") {
        partial_config.state_dir = Some(state_dir);
        sources.insert("state_dir".into(), "environment".into());
    }

    // Handle annotation patterns from environment variable (additive)
    if let Some(patterns) = lookup("SANDBOX_SPEC_POD_ANNOTATIONS") {
        let env_patterns: Vec<String> = patterns
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !env_patterns.is_empty() {
            match &mut partial_config.pod_annotations {
                Some(existing) => existing.extend(env_patterns),
                None => partial_config.pod_annotations = Some(env_patterns),
            }
            sources.insert("pod_annotations".into(), "environment".into());
        }
    }

    Ok(())
}

fn apply_cli_overrides(
    partial_config: &mut PartialConfig,
    sources: &mut HashMap<String, String>,
    cli: &Args,
) {
    if let Some(log_level) = cli.log_level {
        partial_config.log_level = Some(log_level);
        sources.insert("log_level".into(), "cli".into());
    }
    if cli.enable_unprivileged_ports {
        partial_config.enable_unprivileged_ports = Some(true);
        sources.insert("enable_unprivileged_ports".into(), "cli".into());
    }
    if cli.enable_unprivileged_icmp {
        partial_config.enable_unprivileged_icmp = Some(true);
        sources.insert("enable_unprivileged_icmp".into(), "cli".into());
    }
    if cli.disable_cgroup {
        partial_config.disable_cgroup = Some(true);
        sources.insert("disable_cgroup".into(), "cli".into());
    }
    if cli.enable_selinux {
        partial_config.enable_selinux = Some(true);
        sources.insert("enable_selinux".into(), "cli".into());
    }
    if let Some(root_dir) = &cli.root_dir {
        partial_config.root_dir = Some(root_dir.clone());
        sources.insert("root_dir".into(), "cli".into());
    }
    if let Some(state_dir) = &cli.state_dir {
        partial_config.state_dir = Some(state_dir.clone());
        sources.insert("state_dir".into(), "cli".into());
    }
}

/// Fills in defaults for everything nobody set.
fn finalize(
    partial_config: PartialConfig,
    mut sources: HashMap<String, String>,
    config_files: Vec<PathBuf>,
) -> Config {
    let defaults = OperatorSettings::default();
    let settings = OperatorSettings {
        enable_unprivileged_ports: partial_config
            .enable_unprivileged_ports
            .unwrap_or(defaults.enable_unprivileged_ports),
        enable_unprivileged_icmp: partial_config
            .enable_unprivileged_icmp
            .unwrap_or(defaults.enable_unprivileged_icmp),
        disable_cgroup: partial_config
            .disable_cgroup
            .unwrap_or(defaults.disable_cgroup),
        default_sandbox_cpu_shares: partial_config
            .default_sandbox_cpu_shares
            .unwrap_or(defaults.default_sandbox_cpu_shares),
        default_sandbox_oom_score_adj: partial_config
            .default_sandbox_oom_score_adj
            .unwrap_or(defaults.default_sandbox_oom_score_adj),
        enable_selinux: partial_config
            .enable_selinux
            .unwrap_or(defaults.enable_selinux),
        root_dir: partial_config
            .root_dir
            .map(PathBuf::from)
            .unwrap_or(defaults.root_dir),
        state_dir: partial_config
            .state_dir
            .map(PathBuf::from)
            .unwrap_or(defaults.state_dir),
        pod_annotations: partial_config.pod_annotations,
    };

    for key in OperatorSettings::KEYS.into_iter().chain(["log_level"]) {
        if !sources.contains_key(key) {
            sources.insert(key.into(), "default".into());
        }
    }

    Config {
        log_level: partial_config.log_level.unwrap_or(log::LevelFilter::Info),
        settings,
        sources,
        config_files,
    }
}

fn validate_config(config: &Config) -> Result<()> {
    let settings = &config.settings;
    if !settings.root_dir.is_absolute() {
        return Err(anyhow!(
            "root_dir must be an absolute path: {}",
            settings.root_dir.display()
        ));
    }
    if !settings.state_dir.is_absolute() {
        return Err(anyhow!(
            "state_dir must be an absolute path: {}",
            settings.state_dir.display()
        ));
    }
    if !(-1000..=1000).contains(&settings.default_sandbox_oom_score_adj) {
        return Err(anyhow!(
            "default_sandbox_oom_score_adj must be within -1000..=1000, got {}",
            settings.default_sandbox_oom_score_adj
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| pairs.get(key).cloned()
    }

    #[test]
    fn test_merge_configs() {
        let mut base = PartialConfig {
            pod_annotations: Some(vec!["io.kubernetes.*".to_string()]),
            ..PartialConfig::default()
        };
        let mut sources = HashMap::new();

        let override_config = PartialConfig {
            log_level: Some(LevelFilter::Debug),
            disable_cgroup: Some(true),
            default_sandbox_cpu_shares: Some(10),
            root_dir: Some("/srv/sandboxes".to_string()),
            pod_annotations: Some(vec!["example.com/*".to_string()]),
            ..PartialConfig::default()
        };

        merge_configs(&mut base, &mut sources, override_config, "test-config");

        assert_eq!(base.log_level, Some(LevelFilter::Debug));
        assert_eq!(base.disable_cgroup, Some(true));
        assert_eq!(base.default_sandbox_cpu_shares, Some(10));
        assert_eq!(base.root_dir, Some("/srv/sandboxes".to_string()));
        assert_eq!(base.enable_unprivileged_ports, None);
        assert_eq!(
            base.pod_annotations,
            Some(vec![
                "io.kubernetes.*".to_string(),
                "example.com/*".to_string()
            ])
        );

        assert_eq!(sources.get("log_level"), Some(&"test-config".to_string()));
        assert_eq!(
            sources.get("disable_cgroup"),
            Some(&"test-config".to_string())
        );
        assert_eq!(sources.get("enable_unprivileged_ports"), None);
    }

    #[test]
    fn test_env_overrides() {
        let mut partial = PartialConfig {
            disable_cgroup: Some(true),
            ..PartialConfig::default()
        };
        let mut sources = HashMap::new();
        let env = env_from(&[
            ("SANDBOX_SPEC_DISABLE_CGROUP", "false"),
            ("SANDBOX_SPEC_ENABLE_UNPRIVILEGED_ICMP", "true"),
            ("SANDBOX_SPEC_DEFAULT_SANDBOX_OOM_SCORE_ADJ", "-500"),
            ("SANDBOX_SPEC_POD_ANNOTATIONS", "a/*, b/*,"),
            ("SANDBOX_SPEC_ROOT_DIR", ""),
        ]);

        apply_env_overrides(&mut partial, &mut sources, env).unwrap();

        assert_eq!(partial.disable_cgroup, Some(false));
        assert_eq!(partial.enable_unprivileged_icmp, Some(true));
        assert_eq!(partial.default_sandbox_oom_score_adj, Some(-500));
        assert_eq!(
            partial.pod_annotations,
            Some(vec!["a/*".to_string(), "b/*".to_string()])
        );
        // empty values are ignored
        assert_eq!(partial.root_dir, None);
        assert_eq!(sources.get("disable_cgroup"), Some(&"environment".to_string()));
        assert_eq!(sources.get("root_dir"), None);
    }

    #[test]
    fn test_env_rejects_bad_values() {
        let mut sources = HashMap::new();
        let bad_inputs = [
            ("SANDBOX_SPEC_DISABLE_CGROUP", "yes"),
            ("SANDBOX_SPEC_LOG_LEVEL", "loud"),
            ("SANDBOX_SPEC_DEFAULT_SANDBOX_CPU_SHARES", "-3"),
        ];
        for (key, value) in bad_inputs {
            let mut partial = PartialConfig::default();
            let result = apply_env_overrides(
                &mut partial,
                &mut sources,
                env_from(&[(key, value)]),
            );
            assert!(result.is_err(), "{}={} should be rejected", key, value);
        }
    }

    #[test]
    fn test_finalize_defaults() {
        let config =
            finalize(PartialConfig::default(), HashMap::new(), Vec::new());
        assert_eq!(config.settings, OperatorSettings::default());
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(
            config.sources.get("disable_cgroup"),
            Some(&"default".to_string())
        );
        assert_eq!(config.sources.get("log_level"), Some(&"default".to_string()));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_toml_partial_config() {
        let partial: PartialConfig = toml::from_str(
            r#"
            log_level = "debug"
            enable_unprivileged_ports = true
            default_sandbox_cpu_shares = 1024
            pod_annotations = ["io.katacontainers.*"]
            "#,
        )
        .unwrap();
        assert_eq!(partial.log_level, Some(LevelFilter::Debug));
        assert_eq!(partial.enable_unprivileged_ports, Some(true));
        assert_eq!(partial.default_sandbox_cpu_shares, Some(1024));
        assert_eq!(
            partial.pod_annotations,
            Some(vec!["io.katacontainers.*".to_string()])
        );
        assert!(toml::from_str::<PartialConfig>("log_level = \"x\"").is_err());
    }

    #[test]
    fn test_validate_config() {
        let mut config =
            finalize(PartialConfig::default(), HashMap::new(), Vec::new());
        config.settings.root_dir = PathBuf::from("relative/root");
        assert!(validate_config(&config).is_err());

        config.settings.root_dir = PathBuf::from("/var/lib/x");
        config.settings.default_sandbox_oom_score_adj = -1001;
        assert!(validate_config(&config).is_err());

        config.settings.default_sandbox_oom_score_adj = 1000;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let result = load_partial(
            true,
            Some(Path::new("/nonexistent/sandbox-spec/config.toml")),
        );
        assert!(result.is_err());
    }
}
