use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants;
use crate::domain::JoinStyle;
use crate::error::{NotesError, Result};

/// Runtime settings shared by every subcommand.
///
/// Precedence, lowest to highest: built-in defaults, the TOML file,
/// `CLINICAL_NOTES_*` environment variables (a `.env` file is honoured),
/// then explicit CLI flags applied by the binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub out_path: PathBuf,
    pub batch_size: usize,
    pub stream_chunk_size: usize,
    pub join_style: String,
    pub source_tag: String,
    pub log_dir: PathBuf,
    pub explore_sample_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(constants::DEFAULT_CSV_PATH),
            db_path: PathBuf::from(constants::DEFAULT_DB_PATH),
            out_path: PathBuf::from(constants::DEFAULT_OUT_PATH),
            batch_size: constants::DEFAULT_BATCH_SIZE,
            stream_chunk_size: constants::DEFAULT_STREAM_CHUNK_SIZE,
            join_style: JoinStyle::Plain.as_str().to_string(),
            source_tag: constants::DEFAULT_SOURCE_TAG.to_string(),
            log_dir: PathBuf::from(constants::DEFAULT_LOG_DIR),
            explore_sample_size: constants::DEFAULT_EXPLORE_SAMPLE_SIZE,
        }
    }
}

impl AppConfig {
    /// Load configuration from `CLINICAL_NOTES_CONFIG` (must exist if set) or
    /// `clinical_notes.toml` in the working directory (optional), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var("CLINICAL_NOTES_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let default_path = Path::new(constants::DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            NotesError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply `CLINICAL_NOTES_*` overrides obtained through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CLINICAL_NOTES_CSV") {
            self.csv_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("CLINICAL_NOTES_DB") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("CLINICAL_NOTES_OUT") {
            self.out_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("CLINICAL_NOTES_BATCH_SIZE") {
            self.batch_size = parse_usize("CLINICAL_NOTES_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("CLINICAL_NOTES_STREAM_CHUNK_SIZE") {
            self.stream_chunk_size = parse_usize("CLINICAL_NOTES_STREAM_CHUNK_SIZE", &v)?;
        }
        if let Some(v) = lookup("CLINICAL_NOTES_JOIN_STYLE") {
            self.join_style = v;
        }
        if let Some(v) = lookup("CLINICAL_NOTES_SOURCE_TAG") {
            self.source_tag = v;
        }
        if let Some(v) = lookup("CLINICAL_NOTES_LOG_DIR") {
            self.log_dir = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(NotesError::Config("batch_size must be greater than 0".to_string()));
        }
        if self.stream_chunk_size == 0 {
            return Err(NotesError::Config(
                "stream_chunk_size must be greater than 0".to_string(),
            ));
        }
        self.join_style()?;
        Ok(())
    }

    pub fn join_style(&self) -> Result<JoinStyle> {
        JoinStyle::from_str(&self.join_style)
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|e| NotesError::Config(format!("{key}={value:?} is not a valid count: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 5_000);
        assert_eq!(config.join_style().unwrap(), JoinStyle::Plain);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            db_path = "/tmp/notes.db"
            join_style = "chatml"
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/notes.db"));
        assert_eq!(config.join_style().unwrap(), JoinStyle::ChatMl);
        assert_eq!(config.stream_chunk_size, 1_000);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = AppConfig::from_toml_str("batchsize = 10").unwrap_err();
        assert!(matches!(err, NotesError::Toml(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CLINICAL_NOTES_BATCH_SIZE", "250"),
            ("CLINICAL_NOTES_SOURCE_TAG", "local/test"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.source_tag, "local/test");
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|k| (k == "CLINICAL_NOTES_BATCH_SIZE").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, NotesError::Config(_)));

        let config = AppConfig {
            join_style: "markdown".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(NotesError::Config(_))));

        let config = AppConfig {
            batch_size: 0,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(NotesError::Config(_))));
    }
}
