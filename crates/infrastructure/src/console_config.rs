use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use formvault_application::{ExportLimits, ExportOptions, PipelineConfig};
use formvault_core::{AppError, AppResult};

use crate::FileDownloadTarget;

const PAGE_SIZE: &str = "FORMVAULT_PAGE_SIZE";
const MAX_PAGE_SIZE: &str = "FORMVAULT_MAX_PAGE_SIZE";
const EXPORT_MAX_RECORDS: &str = "FORMVAULT_EXPORT_MAX_RECORDS";
const EXPORT_WARN_RECORDS: &str = "FORMVAULT_EXPORT_WARN_RECORDS";
const EXPORT_DIR: &str = "FORMVAULT_EXPORT_DIR";
const CSV_BOM: &str = "FORMVAULT_CSV_BOM";

/// Runtime settings for the submissions console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Initial rows per page.
    pub page_size: usize,
    /// Largest page size a user may pick.
    pub max_page_size: usize,
    /// Hard limit on records per export.
    pub export_max_records: usize,
    /// Record count above which exports carry a warning.
    pub export_warn_records: usize,
    /// Directory file exports are written to.
    pub export_dir: PathBuf,
    /// Prefix CSV exports with a byte-order mark.
    pub csv_bom: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let limits = ExportLimits::default();
        let pipeline = PipelineConfig::default();
        Self {
            page_size: pipeline.page_size,
            max_page_size: pipeline.max_page_size,
            export_max_records: limits.max_records,
            export_warn_records: limits.warn_records,
            export_dir: PathBuf::from("exports"),
            csv_bom: false,
        }
    }
}

impl ConsoleConfig {
    /// Loads settings from the process environment and an optional `.env` file.
    pub fn load() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let defaults = Self::default();

        let page_size = parse_or(&lookup, PAGE_SIZE, defaults.page_size)?;
        let max_page_size = parse_or(&lookup, MAX_PAGE_SIZE, defaults.max_page_size)?;
        if page_size == 0 {
            return Err(AppError::Validation(format!(
                "{PAGE_SIZE} must be at least 1"
            )));
        }
        if page_size > max_page_size {
            return Err(AppError::Validation(format!(
                "{PAGE_SIZE} ({page_size}) must not exceed {MAX_PAGE_SIZE} ({max_page_size})"
            )));
        }

        let export_max_records =
            parse_or(&lookup, EXPORT_MAX_RECORDS, defaults.export_max_records)?;
        let export_warn_records =
            parse_or(&lookup, EXPORT_WARN_RECORDS, defaults.export_warn_records)?;
        if export_max_records == 0 {
            return Err(AppError::Validation(format!(
                "{EXPORT_MAX_RECORDS} must be at least 1"
            )));
        }

        let export_dir = lookup(EXPORT_DIR)
            .filter(|value| !value.trim().is_empty())
            .map_or(defaults.export_dir, PathBuf::from);

        let csv_bom = match lookup(CSV_BOM) {
            None => defaults.csv_bom,
            Some(value) => parse_flag(CSV_BOM, value.as_str())?,
        };

        Ok(Self {
            page_size,
            max_page_size,
            export_max_records,
            export_warn_records,
            export_dir,
            csv_bom,
        })
    }

    /// Returns the pipeline paging settings.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            page_size: self.page_size,
            max_page_size: self.max_page_size,
        }
    }

    /// Returns the export size limits.
    #[must_use]
    pub fn export_limits(&self) -> ExportLimits {
        ExportLimits {
            max_records: self.export_max_records,
            warn_records: self.export_warn_records,
        }
    }

    /// Returns default export options with configured overrides applied.
    #[must_use]
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            include_bom: self.csv_bom,
            ..ExportOptions::default()
        }
    }

    /// Returns a download target writing into the export directory.
    #[must_use]
    pub fn download_target(&self) -> FileDownloadTarget {
        FileDownloadTarget::new(self.export_dir.clone())
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
        _ => Ok(default),
    }
}

fn parse_flag(name: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        other => Err(AppError::Validation(format!(
            "{name} must be true or false, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use formvault_core::AppError;

    use super::ConsoleConfig;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ConsoleConfig, AppError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ConsoleConfig::from_lookup(|name| values.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap_or_else(|_| unreachable!());
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.page_size, 10);
        assert_eq!(config.export_limits().max_records, 10_000);
        assert_eq!(config.export_dir, PathBuf::from("exports"));
        assert!(!config.export_options().include_bom);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("FORMVAULT_PAGE_SIZE", "25"),
            ("FORMVAULT_MAX_PAGE_SIZE", "200"),
            ("FORMVAULT_EXPORT_MAX_RECORDS", "500"),
            ("FORMVAULT_EXPORT_WARN_RECORDS", " 50 "),
            ("FORMVAULT_EXPORT_DIR", "/tmp/formvault"),
            ("FORMVAULT_CSV_BOM", "TRUE"),
        ])
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(config.pipeline_config().page_size, 25);
        assert_eq!(config.pipeline_config().max_page_size, 200);
        assert_eq!(config.export_limits().warn_records, 50);
        assert_eq!(
            config.download_target().directory(),
            PathBuf::from("/tmp/formvault").as_path()
        );
        assert!(config.export_options().include_bom);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        for pairs in [
            [("FORMVAULT_PAGE_SIZE", "ten")],
            [("FORMVAULT_PAGE_SIZE", "0")],
            [("FORMVAULT_PAGE_SIZE", "5000")],
            [("FORMVAULT_EXPORT_MAX_RECORDS", "-1")],
            [("FORMVAULT_CSV_BOM", "maybe")],
        ] {
            let Err(AppError::Validation(message)) = config_from(&pairs) else {
                unreachable!("expected validation error for {pairs:?}");
            };
            assert!(message.contains(pairs[0].0), "{message}");
        }
    }
}
