// TOML config adapter - Configuration management using TOML files

use crate::domain::errors::*;
use crate::ports::*;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Section name inside the TOML file
const SECTION: &str = "cutframe";

/// Default configuration values
const DEFAULTS: &[(&str, &str)] = &[
    ("log_level", "info"),
    ("gallery_folder", "Movies/VideoEditor"),
    ("video_crf", "23"),
    ("video_preset", "medium"),
    ("contrast", "2.0"),
];

/// TOML configuration adapter
pub struct TomlConfigAdapter {
    config: Arc<RwLock<BTreeMap<String, String>>>,
    config_file_path: Arc<RwLock<Option<PathBuf>>>,
}

impl TomlConfigAdapter {
    /// Create new TOML config adapter seeded with defaults
    pub fn new() -> Self {
        let config = DEFAULTS
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Self {
            config: Arc::new(RwLock::new(config)),
            config_file_path: Arc::new(RwLock::new(None)),
        }
    }

    /// Default config file looked up in the working directory
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("cutframe.toml")
    }

    /// Path of the last loaded or saved file
    pub fn config_file_path(&self) -> Option<PathBuf> {
        self.config_file_path
            .read()
            .ok()
            .and_then(|path| path.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, String>>, DomainError> {
        self.config
            .read()
            .map_err(|_| DomainError::InternalError("Config lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, String>>, DomainError> {
        self.config
            .write()
            .map_err(|_| DomainError::InternalError("Config lock poisoned".to_string()))
    }

    fn remember_path(&self, path: PathBuf) {
        if let Ok(mut config_path) = self.config_file_path.write() {
            *config_path = Some(path);
        }
    }

    /// Serialize config to TOML string
    fn serialize_config(&self) -> Result<String, DomainError> {
        let config = self.read()?;
        let mut section = toml::map::Map::new();
        for (key, value) in config.iter() {
            section.insert(key.clone(), toml::Value::String(value.clone()));
        }
        let mut root = toml::map::Map::new();
        root.insert(SECTION.to_string(), toml::Value::Table(section));

        toml::to_string(&toml::Value::Table(root))
            .map_err(|e| DomainError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Deserialize config from TOML string
    fn deserialize_config(&self, toml_content: &str) -> Result<(), DomainError> {
        let parsed: toml::Value = toml::from_str(toml_content)
            .map_err(|e| DomainError::ConfigError(format!("Failed to parse TOML config: {}", e)))?;

        let mut config = self.write()?;
        if let Some(table) = parsed.get(SECTION).and_then(|section| section.as_table()) {
            for (key, value) in table {
                // Numbers and booleans are accepted unquoted
                let value = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    toml::Value::Array(items) => items
                        .iter()
                        .filter_map(|item| item.as_str())
                        .collect::<Vec<_>>()
                        .join(","),
                    _ => continue,
                };
                config.insert(key.clone(), value);
            }
        }

        Ok(())
    }
}

impl Default for TomlConfigAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigPort for TomlConfigAdapter {
    async fn get_config(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, DomainError> {
        Ok(self
            .read()?
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.write()?.insert(key.to_string(), value.to_string());
        tracing::debug!("Set config {} = {}", key, value);
        Ok(())
    }

    async fn load_config(&self, file_path: &str) -> Result<(), DomainError> {
        let path = PathBuf::from(file_path);

        if !path.exists() {
            return Err(DomainError::FsFail(format!(
                "Config file does not exist: {}",
                file_path
            )));
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| DomainError::FsFail(format!("Failed to read config file: {}", e)))?;

        self.deserialize_config(&content)?;
        self.remember_path(path);

        Ok(())
    }

    async fn save_config(&self, file_path: &str) -> Result<(), DomainError> {
        let path = PathBuf::from(file_path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::FsFail(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = self.serialize_config()?;
        std::fs::write(&path, content)
            .map_err(|e| DomainError::FsFail(format!("Failed to write config file: {}", e)))?;

        self.remember_path(path);
        Ok(())
    }

    async fn validate_config(&self) -> Result<(), DomainError> {
        let config = self.read()?;

        if let Some(log_level) = config.get("log_level") {
            LogLevel::parse(log_level)?;
        }

        if let Some(crf) = config.get("video_crf") {
            let crf_value: u8 = crf
                .parse()
                .map_err(|e| DomainError::ConfigError(format!("Invalid CRF value: {}", e)))?;
            if crf_value > 51 {
                return Err(DomainError::ConfigError(
                    "CRF value cannot exceed 51".to_string(),
                ));
            }
        }

        if let Some(contrast) = config.get("contrast") {
            let contrast: f32 = contrast
                .parse()
                .map_err(|e| DomainError::ConfigError(format!("Invalid contrast value: {}", e)))?;
            if !(contrast > 0.0 && contrast.is_finite()) {
                return Err(DomainError::ConfigError(
                    "Contrast must be a positive number".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_defaults_are_seeded() {
        let adapter = TomlConfigAdapter::new();
        assert_eq!(
            adapter.get_config("gallery_folder").await.unwrap().as_deref(),
            Some("Movies/VideoEditor")
        );
        assert_eq!(
            adapter.get_config_or_default("missing", "fallback").await.unwrap(),
            "fallback"
        );
        adapter.validate_config().await.unwrap();
    }

    #[tokio::test]
    async fn test_load_reads_section_with_typed_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cutframe.toml");
        std::fs::write(
            &path,
            "[cutframe]\nvideo_crf = 18\ncontrast = 1.5\nsource_dirs = [\"/a\", \"/b\"]\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let adapter = TomlConfigAdapter::new();
        adapter.load_config(path.to_str().unwrap()).await.unwrap();

        assert_eq!(adapter.get_config("video_crf").await.unwrap().as_deref(), Some("18"));
        assert_eq!(adapter.get_config("contrast").await.unwrap().as_deref(), Some("1.5"));
        assert_eq!(adapter.get_config("source_dirs").await.unwrap().as_deref(), Some("/a,/b"));
        assert_eq!(adapter.config_file_path(), Some(path));
        adapter.validate_config().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cutframe.toml");

        let adapter = TomlConfigAdapter::new();
        adapter.set_config("gallery_dir", "/srv/gallery").await.unwrap();
        adapter.save_config(path.to_str().unwrap()).await.unwrap();

        let reloaded = TomlConfigAdapter::new();
        reloaded.load_config(path.to_str().unwrap()).await.unwrap();
        assert_eq!(
            reloaded.get_config("gallery_dir").await.unwrap().as_deref(),
            Some("/srv/gallery")
        );
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_values() {
        let adapter = TomlConfigAdapter::new();
        adapter.set_config("video_crf", "60").await.unwrap();
        assert!(adapter.validate_config().await.is_err());

        let adapter = TomlConfigAdapter::new();
        adapter.set_config("log_level", "loud").await.unwrap();
        assert!(adapter.validate_config().await.is_err());

        let adapter = TomlConfigAdapter::new();
        adapter.set_config("contrast", "-1").await.unwrap();
        assert!(adapter.validate_config().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let adapter = TomlConfigAdapter::new();
        assert!(adapter.load_config("/definitely/not/here.toml").await.is_err());
    }
}
