use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use quill_core::DEFAULT_SESSION_TTL_SECS;

#[derive(Debug, Serialize, Deserialize)]
pub struct QuillConfig {
    pub vault: VaultSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<SetupSection>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VaultSection {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: i64,
}

/// The expected setup token for a vault that has not been initialized yet.
/// Operators place this in the config before running `quill setup`; it is
/// never written by the CLI itself.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetupSection {
    pub token: String,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

fn default_ttl_seconds() -> i64 {
    DEFAULT_SESSION_TTL_SECS
}

impl QuillConfig {
    pub fn new(vault_path: PathBuf, ttl_seconds: i64) -> Self {
        Self {
            vault: VaultSection {
                path: vault_path.to_string_lossy().to_string(),
            },
            session: SessionSection { ttl_seconds },
            setup: None,
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_vault_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("quill.db"))
}

pub fn read_config(path: &Path) -> anyhow::Result<QuillConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &QuillConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("quill"));
        }
    }
    Ok(home_dir()?.join(".config").join("quill"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("quill"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("quill"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_config_omits_setup_section() {
        let config = QuillConfig::new(PathBuf::from("/tmp/quill.db"), 3600);
        let rendered = toml::to_string_pretty(&config).unwrap();

        assert!(rendered.contains("[vault]"));
        assert!(rendered.contains("[session]"));
        assert!(!rendered.contains("[setup]"));

        let parsed: QuillConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.vault.path, "/tmp/quill.db");
        assert_eq!(parsed.session.ttl_seconds, 3600);
        assert!(parsed.setup.is_none());
    }

    #[test]
    fn test_parses_setup_token_when_present() {
        let parsed: QuillConfig = toml::from_str(
            "[vault]\npath = \"/tmp/quill.db\"\n\n[setup]\ntoken = \"pre-shared\"\n",
        )
        .unwrap();

        assert_eq!(parsed.setup.unwrap().token, "pre-shared");
    }

    #[test]
    fn test_session_section_defaults_when_missing() {
        let parsed: QuillConfig = toml::from_str("[vault]\npath = \"/tmp/quill.db\"\n").unwrap();

        assert_eq!(parsed.session.ttl_seconds, DEFAULT_SESSION_TTL_SECS);
    }
}
