//! Configuration loading for mediastore.
//!
//! Layers, later ones winning:
//! 1. built-in defaults,
//! 2. a TOML file (explicit path, else `config.toml` in the platform config
//!    directory if it exists),
//! 3. environment variables prefixed `MEDIASTORE_`, with `__` separating
//!    nested keys (`MEDIASTORE_DATABASE__COLLECTION=videos`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use mediastore_store::quota::{QuotaEstimator, estimator_for};
use mediastore_store::{DEFAULT_COLLECTION, DEFAULT_DATABASE_NAME, DEFAULT_DATABASE_VERSION, DatabaseConfig, Location};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "MEDIASTORE_";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub quota: QuotaSettings,
    pub picker: PickerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Where database files live. Defaults to the platform data directory.
    pub directory: Option<PathBuf>,
    pub name: String,
    pub version: u32,
    pub collection: String,
    /// Keep everything in memory; nothing survives the process.
    pub in_memory: bool,
}
impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            directory: None,
            name: DEFAULT_DATABASE_NAME.to_string(),
            version: DEFAULT_DATABASE_VERSION,
            collection: DEFAULT_COLLECTION.to_string(),
            in_memory: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct QuotaSettings {
    /// Storage quota for the data directory. Defaults to what the filesystem
    /// holding it can still take.
    pub bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PickerSettings {
    /// Default accept filter for file selection.
    pub accept: String,
}
impl Default for PickerSettings {
    fn default() -> Self {
        Self { accept: "video/*".to_string() }
    }
}

impl Settings {
    /// Load settings from all layers.
    ///
    /// An explicit `path` must exist; the default config file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path))
    }

    /// The layered provider, before extraction.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = match path {
            Some(path) => Some(Toml::file_exact(path).required(true)),
            None => project_dirs().map(|dirs| Toml::file_exact(dirs.config_dir().join(CONFIG_FILE))),
        };
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(file) = file {
            figment = figment.merge(file);
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment.extract().or_raise(|| ErrorKind::Load)?;
        tracing::debug!(?settings, "Configuration loaded");
        Ok(settings)
    }

    /// The store configuration these settings describe.
    pub fn database_config(&self) -> Result<DatabaseConfig> {
        let location = match (&self.database.directory, self.database.in_memory) {
            (_, true) => Location::InMemory,
            (Some(dir), false) => Location::Directory(dir.clone()),
            (None, false) => {
                let dirs = project_dirs().ok_or_raise(|| ErrorKind::NoDataDir)?;
                Location::Directory(dirs.data_dir().to_path_buf())
            },
        };
        Ok(DatabaseConfig::new(location)
            .with_name(&self.database.name)
            .with_version(self.database.version)
            .with_collection(&self.database.collection))
    }

    /// The quota estimator matching a database opened from these settings.
    pub fn estimator(&self, config: &DatabaseConfig) -> Box<dyn QuotaEstimator> {
        estimator_for(config, self.quota.bytes)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "mediastore")
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_figment(Figment::from(Serialized::defaults(Settings::default()))).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.database.name, "MediaDatabase");
        assert_eq!(settings.database.collection, "media");
        assert_eq!(settings.picker.accept, "video/*");
        assert!(settings.quota.bytes.is_none());
    }

    #[test]
    fn test_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "mediastore.toml",
                r#"
                    [database]
                    directory = "/srv/media"
                    collection = "videos"

                    [quota]
                    bytes = 1048576
                "#,
            )?;
            jail.set_env("MEDIASTORE_DATABASE__COLLECTION", "clips");
            jail.set_env("MEDIASTORE_PICKER__ACCEPT", ".mkv");

            let settings = Settings::load(Some(Path::new("mediastore.toml"))).unwrap();
            assert_eq!(settings.database.directory.as_deref(), Some(Path::new("/srv/media")));
            assert_eq!(settings.database.collection, "clips");
            assert_eq!(settings.database.version, 1);
            assert_eq!(settings.quota.bytes, Some(1048576));
            assert_eq!(settings.picker.accept, ".mkv");
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&temp_dir.path().join("missing.toml"))).unwrap_err();
        assert_eq!(*err, ErrorKind::Load);
    }

    #[test]
    fn test_invalid_value() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "[database]\nversion = \"one\"\n").unwrap();
        let err = Settings::load(Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::Load);
    }

    #[test]
    fn test_database_config() {
        let mut settings = Settings::default();
        settings.database.directory = Some(PathBuf::from("/srv/media"));
        settings.database.collection = "videos".to_string();
        let config = settings.database_config().unwrap();
        assert_eq!(config.location, Location::Directory(PathBuf::from("/srv/media")));
        assert_eq!(config.collection, "videos");
        assert_eq!(config.name, "MediaDatabase");

        settings.database.in_memory = true;
        assert_eq!(settings.database_config().unwrap().location, Location::InMemory);
    }
}
