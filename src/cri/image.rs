use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Process defaults embedded in the pause image's OCI image config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ImageProcessDefaults {
    #[serde(deserialize_with = "null_as_default")]
    pub env: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub entrypoint: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub cmd: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub working_dir: String,
}

/// Image builders write `null` for unset fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A full image config document wraps the process defaults under `config`.
#[derive(Deserialize)]
struct ImageConfigDocument {
    config: ImageProcessDefaults,
}

impl ImageProcessDefaults {
    /// Accepts either a bare image config or a full image config document.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).context("Invalid image config JSON")?;
        if value.get("config").is_some() {
            let document: ImageConfigDocument = serde_json::from_value(value)
                .context("Failed to parse image config document")?;
            return Ok(document.config);
        }
        Ok(serde_json::from_value(value)
            .context("Failed to parse image config")?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).context(format!(
            "Failed to read image config from {}",
            path.display()
        ))?;
        Self::from_json(&json)
            .context(format!("Loading image config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_config() {
        let image = ImageProcessDefaults::from_json(
            r#"{"Env": ["PATH=/bin"], "Entrypoint": ["/pause"], "WorkingDir": "/"}"#,
        )
        .unwrap();
        assert_eq!(image.env, vec!["PATH=/bin"]);
        assert_eq!(image.entrypoint, vec!["/pause"]);
        assert!(image.cmd.is_empty());
        assert_eq!(image.working_dir, "/");
    }

    #[test]
    fn test_full_document() {
        let image = ImageProcessDefaults::from_json(
            r#"{
                "architecture": "amd64",
                "os": "linux",
                "config": {"Cmd": ["forever"], "Entrypoint": null}
            }"#,
        )
        .unwrap();
        assert!(image.entrypoint.is_empty());
        assert_eq!(image.cmd, vec!["forever"]);

        let image = ImageProcessDefaults::from_json(
            r#"{"os": "linux", "config": {"Cmd": ["forever"]}}"#,
        )
        .unwrap();
        assert_eq!(image.cmd, vec!["forever"]);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(ImageProcessDefaults::from_json("not json").is_err());
        assert!(ImageProcessDefaults::from_json(r#"{"Cmd": "/pause"}"#).is_err());
    }
}
