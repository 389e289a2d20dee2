use crate::config::{Config, OperatorSettings};
use crate::outln;
use crate::util::set_json_output;
use anyhow::{Result, anyhow};
use log::debug;
use serde_json::Value;

fn lookup(config: &Config, key: &str) -> Option<(String, String)> {
    let normalized = key.replace('-', "_");
    let value = match normalized.as_str() {
        "log_level" => config.log_level.to_string(),
        "config_files" => config
            .config_files
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(","),
        _ => config.settings.get(&normalized)?,
    };
    Some((normalized, value))
}

pub fn config(config: &Config, keys: Option<Vec<String>>) -> Result<()> {
    let keys = keys.unwrap_or_else(|| {
        ["log_level", "config_files"]
            .into_iter()
            .chain(OperatorSettings::KEYS)
            .map(String::from)
            .collect()
    });
    let multi_line = keys.len() > 1;

    for key in keys {
        let (key, value) =
            lookup(config, &key).ok_or_else(|| anyhow!("Unknown key: {}", key))?;
        if let Some(source) = config.sources.get(&key) {
            debug!("{}={} set from {}", key, value, source);
        }
        set_json_output(&key, Value::String(value.clone()));

        if multi_line {
            outln!("{}={}", key, value);
        } else {
            outln!("{}", value);
        }
    }

    Ok(())
}
