//! Configuration initialization and hierarchy management

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::TomlConfigAdapter;
use crate::cli::Cli;
use crate::domain::errors::DomainError;
use crate::ports::{ConfigPort, LogLevel};

/// Prefix of environment overrides, e.g. `CUTFRAME_VIDEO_CRF`
pub const ENV_PREFIX: &str = "CUTFRAME_";

/// Every key the `[cutframe]` section understands
pub const CONFIG_KEYS: &[&str] = &[
    "log_level",
    "app_data_dir",
    "gallery_dir",
    "gallery_folder",
    "source_dirs",
    "video_crf",
    "video_preset",
    "contrast",
];

/// Typed view of the resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub log_level: LogLevel,
    /// App-private directory for working files
    pub app_data_dir: PathBuf,
    /// Root of the shared media collection
    pub gallery_dir: PathBuf,
    /// Folder inside the collection new entries go to
    pub gallery_folder: String,
    /// Folders the picker browses
    pub source_dirs: Vec<PathBuf>,
    pub video_crf: u8,
    pub video_preset: String,
    pub contrast: f32,
    /// File the values were read from, if any
    pub config_file: Option<PathBuf>,
}

impl Settings {
    /// Read typed values from `config`, filling directory defaults from `home`
    pub async fn from_config(config: &TomlConfigAdapter, home: &Path) -> Result<Self, DomainError> {
        let dir = |key: &'static str, default: PathBuf| async move {
            config
                .get_config(key)
                .await
                .map(|value| value.map(PathBuf::from).unwrap_or(default))
        };

        let log_level = LogLevel::parse(&config.get_config_or_default("log_level", "info").await?)?;
        let app_data_dir = dir("app_data_dir", home.join(".local/share/cutframe")).await?;
        let gallery_dir = dir("gallery_dir", home.to_path_buf()).await?;
        let gallery_folder = config
            .get_config_or_default("gallery_folder", "Movies/VideoEditor")
            .await?;

        let source_dirs = match config.get_config("source_dirs").await? {
            Some(dirs) => dirs
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(PathBuf::from)
                .collect(),
            None => vec![home.join("Movies"), home.join("Videos")],
        };

        let video_crf = config
            .get_config_or_default("video_crf", "23")
            .await?
            .parse()
            .map_err(|e| DomainError::ConfigError(format!("Invalid CRF value: {}", e)))?;
        let video_preset = config.get_config_or_default("video_preset", "medium").await?;
        let contrast = config
            .get_config_or_default("contrast", "2.0")
            .await?
            .parse()
            .map_err(|e| DomainError::ConfigError(format!("Invalid contrast value: {}", e)))?;

        Ok(Self {
            log_level,
            app_data_dir,
            gallery_dir,
            gallery_folder,
            source_dirs,
            video_crf,
            video_preset,
            contrast,
            config_file: config.config_file_path(),
        })
    }
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub async fn initialize_configuration_hierarchy(config: &TomlConfigAdapter, cli: &Cli) -> Result<Settings> {
    let env: HashMap<String, String> = std::env::vars().collect();
    resolve_settings(config, cli.config.as_deref(), cli.log_level.as_deref(), &env).await
}

/// Apply the hierarchy with explicit inputs
pub async fn resolve_settings(
    config: &TomlConfigAdapter,
    config_path: Option<&Path>,
    cli_log_level: Option<&str>,
    env: &HashMap<String, String>,
) -> Result<Settings> {
    // Step 1: Defaults are seeded by TomlConfigAdapter::new()
    // Step 2: Config file
    load_config_file(config, config_path).await?;

    // Step 3: Environment variables
    let overrides = apply_environment(config, env).await?;
    if overrides > 0 {
        info!("Applied {} environment overrides", overrides);
    }

    // Step 4: CLI arguments
    if let Some(level) = cli_log_level {
        config.set_config("log_level", level).await?;
    }

    config
        .validate_config()
        .await
        .context("Invalid configuration")?;

    let home = env
        .get("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(Settings::from_config(config, &home).await?)
}

/// Load an explicit config file, or `cutframe.toml` if one sits in the working directory
async fn load_config_file(config: &TomlConfigAdapter, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = TomlConfigAdapter::default_config_path();
            if !default.exists() {
                return Ok(());
            }
            default
        }
    };

    config
        .load_config(&path.to_string_lossy())
        .await
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Copy `CUTFRAME_<KEY>` variables into the config; returns how many applied
async fn apply_environment(config: &TomlConfigAdapter, env: &HashMap<String, String>) -> Result<usize> {
    let mut applied = 0;
    for key in CONFIG_KEYS {
        let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
        if let Some(value) = env.get(&var) {
            config.set_config(key, value).await?;
            applied += 1;
        }
    }
    Ok(applied)
}
