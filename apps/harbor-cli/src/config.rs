//! CLI configuration loading.
//!
//! Configuration is stored as TOML at `~/.config/harbor/config.toml`
//! (`%APPDATA%/harbor/config.toml` on Windows). The `HARBOR_TOKEN`
//! environment variable overrides the token from the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use harbor_client::HarborConfig;

pub const TOKEN_ENV: &str = "HARBOR_TOKEN";

/// Loads the configuration from `explicit`, or from the default location.
///
/// An explicit path must exist; a missing default file yields the built-in
/// defaults.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<HarborConfig> {
    let mut config = match explicit {
        Some(path) => read(path)?,
        None => {
            let path = config_path();
            if path.exists() {
                read(&path)?
            } else {
                tracing::debug!(path = %path.display(), "no configuration file, using defaults");
                HarborConfig::default()
            }
        }
    };

    apply_token_override(&mut config, std::env::var(TOKEN_ENV).ok());
    config.validate()?;
    Ok(config)
}

fn read(path: &Path) -> anyhow::Result<HarborConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading configuration {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("parsing configuration {}", path.display()))?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

fn apply_token_override(config: &mut HarborConfig, token: Option<String>) {
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        config.token = Some(token);
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("harbor").join("config.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("harbor")
            .join("config.toml")
    }
}
