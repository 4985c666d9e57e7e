//! TOML configuration.
//!
//! ```toml
//! [general]
//! cur_month = "11-2025"
//! activation_str = "triggered up operation SmartTapDivert-EU1"
//! csv_file_prefix = "database_EA_"
//! csv_file_suffix = ".csv"
//! window_months = 6
//! input_dir = "input"
//! output_dir = "output"
//! alert_log = "alert.txt"
//! device_names = "device_names.json"
//!
//! [filters]
//! excluded_attack_names = ["Name A", "Name B"]
//! ```
//!
//! Every key except `activation_str` has a default. `activation_str` is only
//! needed by the activation report. `excluded_attack_names` may also be
//! given as one comma-separated string. When `cur_month` is absent the
//! current local month is used.

use crate::analysis::window::DEFAULT_WINDOW_MONTHS;
use crate::error::{ConfigError, ReportError};
use crate::events::types::Period;
use crate::utils::time::parse_month;
use chrono::Local;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "report.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub general: GeneralSettings,
    pub filters: FilterSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    pub cur_month: Option<String>,
    pub activation_str: Option<String>,
    pub csv_file_prefix: String,
    pub csv_file_suffix: String,
    pub window_months: u32,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Relative paths resolve against `input_dir`.
    pub alert_log: PathBuf,
    pub device_names: PathBuf,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            cur_month: None,
            activation_str: None,
            csv_file_prefix: "database_EA_".to_string(),
            csv_file_suffix: ".csv".to_string(),
            window_months: DEFAULT_WINDOW_MONTHS,
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            alert_log: PathBuf::from("alert.txt"),
            device_names: PathBuf::from("device_names.json"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub excluded_attack_names: NameList,
}

/// A list of names, written either as a TOML array or a comma-separated
/// string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    List(Vec<String>),
    Joined(String),
}

impl Default for NameList {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl NameList {
    /// Trimmed, non-empty names in configured order.
    pub fn names(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Self::List(items) => items.iter().map(String::as_str).collect(),
            Self::Joined(text) => text.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl ReportConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// The month the report is run for.
    pub fn current_month(&self) -> Result<Period, ReportError> {
        match self.general.cur_month.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => parse_month(value),
            _ => Ok(Period::of(Local::now().date_naive())),
        }
    }

    /// Activation text exactly as configured; blank text counts as missing.
    pub fn activation(&self) -> Result<&str, ReportError> {
        self.general
            .activation_str
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .ok_or(ReportError::MissingSetting("general.activation_str"))
    }

    pub fn excluded_attack_names(&self) -> Vec<String> {
        self.filters.excluded_attack_names.names()
    }

    /// `<prefix><mm>_<yyyy><suffix>`
    pub fn monthly_csv_name(&self, period: Period) -> String {
        format!(
            "{}{}{}",
            self.general.csv_file_prefix,
            period.label(),
            self.general.csv_file_suffix
        )
    }

    pub fn alert_log_path(&self) -> PathBuf {
        // `join` keeps an absolute `alert_log` as is
        self.general.input_dir.join(&self.general.alert_log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_apply_to_empty_file() {
        let config = ReportConfig::from_toml_str("").unwrap();
        assert_eq!(config.general.csv_file_prefix, "database_EA_");
        assert_eq!(config.general.window_months, 6);
        assert_eq!(config.general.input_dir, PathBuf::from("input"));
        assert!(config.excluded_attack_names().is_empty());
        assert!(config.activation().is_err());
    }

    #[test]
    fn test_full_file() {
        let config = ReportConfig::from_toml_str(
            r#"
            [general]
            cur_month = "11-2025"
            activation_str = "triggered up operation SmartTapDivert-EU1"
            csv_file_prefix = "export_"

            [filters]
            excluded_attack_names = [" Name A ", "", "Name B"]
            "#,
        )
        .unwrap();

        assert_eq!(config.current_month().unwrap(), Period::new(2025, 11).unwrap());
        assert_eq!(
            config.activation().unwrap(),
            "triggered up operation SmartTapDivert-EU1"
        );
        assert_eq!(config.excluded_attack_names(), vec!["Name A", "Name B"]);
        assert_eq!(
            config.monthly_csv_name(Period::new(2025, 10).unwrap()),
            "export_10_2025.csv"
        );
    }

    #[test]
    fn test_activation_keeps_surrounding_spaces() {
        let config =
            ReportConfig::from_toml_str("[general]\nactivation_str = \" operation X \"\n").unwrap();
        assert_eq!(config.activation().unwrap(), " operation X ");

        let blank = ReportConfig::from_toml_str("[general]\nactivation_str = \"  \"\n").unwrap();
        assert!(matches!(
            blank.activation(),
            Err(ReportError::MissingSetting(_))
        ));
    }

    #[test]
    fn test_excluded_names_as_joined_string() {
        let config = ReportConfig::from_toml_str(
            "[filters]\nexcluded_attack_names = \"Name A, Name B,,\"\n",
        )
        .unwrap();
        assert_eq!(config.excluded_attack_names(), vec!["Name A", "Name B"]);
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        let config = ReportConfig::from_toml_str("[general]\ncur_month = \"2025\"\n").unwrap();
        assert!(matches!(
            config.current_month(),
            Err(ReportError::InvalidMonth(_))
        ));
    }

    #[test]
    fn test_alert_log_resolves_against_input_dir() {
        let config = ReportConfig::default();
        assert_eq!(config.alert_log_path(), PathBuf::from("input").join("alert.txt"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ReportConfig::load(&dir.path().join("report.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.toml");
        std::fs::write(&path, "[general\n").unwrap();
        assert!(matches!(
            ReportConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
