//! Configuration for office-records

use crate::export::RegionCodes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime configuration shared by the CLI, the terminal UI and the API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Directory export files are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Province code written into every survey export row
    #[serde(default = "default_province_code")]
    pub province_code: String,

    /// Regency code written into every survey export row
    #[serde(default = "default_regency_code")]
    pub regency_code: String,

    /// Survey opened by default in the terminal UI
    #[serde(default = "default_survey")]
    pub default_survey: String,

    /// Bind address for the API server
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("office-records.db")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_province_code() -> String {
    "14".to_string()
}

fn default_regency_code() -> String {
    "05".to_string()
}

fn default_survey() -> String {
    "ssn_m25".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            export_dir: default_export_dir(),
            province_code: default_province_code(),
            regency_code: default_regency_code(),
            default_survey: default_survey(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl Config {
    /// Load config from a TOML file; missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Region codes stamped on survey exports
    pub fn region(&self) -> RegionCodes {
        RegionCodes {
            province: self.province_code.clone(),
            regency: self.regency_code.clone(),
        }
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, std::io::Error> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("office.toml");
        std::fs::write(&path, "regency_code = \"71\"\n").unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.regency_code, "71");
        assert_eq!(config.province_code, "14");
        assert_eq!(config.default_survey, "ssn_m25");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("office.toml");

        let mut config = Config::default();
        config.bind_addr = "127.0.0.1:8080".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.bind_addr, "127.0.0.1:8080");
        assert_eq!(loaded.database_path, PathBuf::from("office-records.db"));
    }

    #[test]
    fn test_invalid_toml_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "regency_code = [").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
