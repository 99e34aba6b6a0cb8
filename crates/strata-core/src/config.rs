use crate::compliance::DEFAULT_SOON_WINDOW_DAYS;
use crate::error::{Result, StrataError};
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ComplianceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Lookahead in days within which an upcoming expiry is flagged.
    #[serde(default = "default_soon_window")]
    pub soon_window_days: i64,
}

fn default_soon_window() -> i64 {
    DEFAULT_SOON_WINDOW_DAYS
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            soon_window_days: default_soon_window(),
        }
    }
}

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// When false, saving a recurring work order leaves schedules untouched.
    #[serde(default = "default_sync_enabled")]
    pub enabled: bool,
}

fn default_sync_enabled() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_sync_enabled(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: String,
    #[serde(default)]
    pub compliance: ComplianceConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: project.into(),
            compliance: ComplianceConfig::default(),
            sync: SyncConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(StrataError::NotInitialized);
        }
        io::read_yaml(&path)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        io::write_yaml(&paths::config_path(root), self)
    }

    /// Write this config unless one already exists. Returns whether it wrote.
    pub fn save_if_missing(&self, root: &Path) -> Result<bool> {
        io::write_yaml_if_missing(&paths::config_path(root), self)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let window = self.compliance.soon_window_days;

        if window < 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("compliance.soon_window_days is negative ({window})"),
            });
        } else if window == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "compliance.soon_window_days is 0: nothing is flagged as expiring soon"
                    .to_string(),
            });
        } else if window > 365 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "compliance.soon_window_days={window} (more than a year is unusual)"
                ),
            });
        }

        if !self.sync.enabled {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "sync.enabled is false: recurring work orders will not produce schedules"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::new("harbour-view");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.project, "harbour-view");
        assert_eq!(parsed.compliance.soon_window_days, 30);
        assert!(parsed.sync.enabled);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let parsed: Config = serde_yaml::from_str("project: tower\n").unwrap();
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.compliance.soon_window_days, DEFAULT_SOON_WINDOW_DAYS);
        assert!(parsed.sync.enabled);
    }

    #[test]
    fn load_without_init_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(StrataError::NotInitialized)
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new("tower");
        cfg.compliance.soon_window_days = 14;
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.compliance.soon_window_days, 14);
    }

    #[test]
    fn validate_flags_unusual_windows() {
        let mut cfg = Config::new("tower");
        assert!(cfg.validate().is_empty());

        cfg.compliance.soon_window_days = 0;
        assert_eq!(cfg.validate()[0].level, WarnLevel::Warning);

        cfg.compliance.soon_window_days = -3;
        assert_eq!(cfg.validate()[0].level, WarnLevel::Error);

        cfg.compliance.soon_window_days = 400;
        assert_eq!(cfg.validate().len(), 1);
    }
}
