//! Application configuration backed by a TOML file and environment overrides.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory name used under the platform config/data roots.
pub const APP_DIR: &str = "flagquiz";
/// Name of the configuration file inside [`APP_DIR`].
pub const CONFIG_FILE: &str = "config.toml";
/// Fixed storage slot for the persisted leaderboard.
pub const LEADERBOARD_FILE: &str = "flagMasterScores.json";
/// Prefix for environment overrides, e.g. `FLAGQUIZ_SEED=7`.
pub const ENV_PREFIX: &str = "FLAGQUIZ";

const DEFAULT_CONFIG: &str = r#"# Flag Master configuration.
#
# Every key is optional; environment variables prefixed with FLAGQUIZ_
# take precedence over this file.

# Directory holding the leaderboard and other runtime data.
# data_root = "/home/you/.local/share/flagquiz"

# Replace the bundled flag catalog with a JSON file of your own.
# catalog_path = "/home/you/flags.json"

# Leaderboard file, resolved against data_root when relative.
# leaderboard_path = "flagMasterScores.json"

# Fixed seed for round selection (useful for reproducible runs).
# seed = 42
"#;

/// Runtime settings for the quiz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory for persisted data.
    pub data_root: PathBuf,
    /// Optional user-supplied catalog; the bundled catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    /// Leaderboard location, relative paths are joined onto `data_root`.
    pub leaderboard_path: PathBuf,
    /// Seed for the round picker. Entropy is used when unset.
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            catalog_path: None,
            leaderboard_path: PathBuf::from(LEADERBOARD_FILE),
            seed: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration using `path` as the (optional) TOML source.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_layered(path.as_ref(), Environment::with_prefix(ENV_PREFIX))
    }

    fn load_layered(path: &Path, environment: Environment) -> Result<Self> {
        let settings = Config::builder()
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(environment.try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("failed to parse configuration {}", path.display()))?;
        Ok(config)
    }

    /// Absolute path of the leaderboard file.
    pub fn leaderboard_file(&self) -> PathBuf {
        if self.leaderboard_path.is_absolute() {
            self.leaderboard_path.clone()
        } else {
            self.data_root.join(&self.leaderboard_path)
        }
    }
}

/// Location of the configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Default data directory under the user's data dir.
pub fn default_data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write a commented default configuration when none exists yet.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(config_path())
}

fn write_default_config(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.catalog_path, None);
        assert_eq!(config.leaderboard_path, PathBuf::from(LEADERBOARD_FILE));
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "data_root = \"/tmp/quiz\"\nleaderboard_path = \"scores.json\"\nseed = 42\n",
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.leaderboard_file(), PathBuf::from("/tmp/quiz/scores.json"));
        Ok(())
    }

    #[test]
    fn environment_overrides_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "seed = 42\ndata_root = \"/tmp/quiz\"\n")?;

        let vars = config::Map::from([
            ("FLAGQUIZ_SEED".to_string(), "7".to_string()),
            ("FLAGQUIZ_DATA_ROOT".to_string(), "/srv/quiz".to_string()),
            ("OTHERAPP_SEED".to_string(), "99".to_string()),
        ]);
        let environment = Environment::with_prefix(ENV_PREFIX).source(Some(vars));

        let config = AppConfig::load_layered(&path, environment)?;
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.data_root, PathBuf::from("/srv/quiz"));
        assert_eq!(
            config.leaderboard_file(),
            PathBuf::from("/srv/quiz").join(LEADERBOARD_FILE)
        );
        Ok(())
    }

    #[test]
    fn absolute_leaderboard_path_is_kept() {
        let config = AppConfig {
            leaderboard_path: PathBuf::from("/var/lib/scores.json"),
            ..AppConfig::default()
        };
        assert_eq!(config.leaderboard_file(), PathBuf::from("/var/lib/scores.json"));
    }

    #[test]
    fn default_config_is_written_once() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);

        write_default_config(&path)?;
        let written = fs::read_to_string(&path)?;
        assert!(written.contains("FLAGQUIZ_"));

        fs::write(&path, "seed = 1\n")?;
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "seed = 1\n");

        // The commented template must parse as an empty configuration.
        let fresh = dir.path().join("fresh.toml");
        write_default_config(&fresh)?;
        let config = AppConfig::load_from(&fresh)?;
        assert_eq!(config.seed, None);
        Ok(())
    }
}
