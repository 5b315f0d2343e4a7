//! # Config Loader
//!
//! Worker settings loading and validation.
//!
//! Responsibilities:
//! - Parse TOML/JSON settings files
//! - Overlay environment variables (`CACHE_CLIENT_HOST`, `MAX_RETRY_QUEUING`, ...)
//! - Validate settings legality
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let settings = ConfigLoader::load(Some(Path::new("worker.toml"))).unwrap();
//! println!("Cache endpoint: {}", settings.cache.endpoint());
//! ```

pub mod env;
mod parser;
mod validator;

pub use contracts::WorkerSettings;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Settings loader
///
/// Provides static methods to load settings from files, strings or the environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from an optional file, overlaid with the process environment
    ///
    /// Without a file, defaults are used as the base layer.
    ///
    /// # Errors
    /// - File read / parse failure
    /// - Malformed environment value
    /// - Validation failure
    pub fn load(path: Option<&Path>) -> Result<WorkerSettings, ContractError> {
        Self::load_layered(path, &env::process_env)
    }

    /// Same as [`ConfigLoader::load`] with an explicit environment lookup
    pub fn load_layered(
        path: Option<&Path>,
        lookup: env::EnvLookup<'_>,
    ) -> Result<WorkerSettings, ContractError> {
        let mut settings = match path {
            Some(path) => {
                let format = Self::detect_format(path)?;
                let content = Self::read_file(path)?;
                parser::parse(&content, format)?
            }
            None => WorkerSettings::default(),
        };
        env::apply(&mut settings, lookup)?;
        validator::validate(&settings)?;
        Ok(settings)
    }

    /// Load settings from file path only
    ///
    /// Automatically detects format from file extension (.toml / .json).
    pub fn load_from_path(path: &Path) -> Result<WorkerSettings, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load settings from string
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<WorkerSettings, ContractError> {
        let settings = parser::parse(content, format)?;
        validator::validate(&settings)?;
        Ok(settings)
    }

    /// Load settings from the process environment only
    pub fn load_from_env() -> Result<WorkerSettings, ContractError> {
        Self::load_layered(None, &env::process_env)
    }

    /// Serialize WorkerSettings to TOML string
    pub fn to_toml(settings: &WorkerSettings) -> Result<String, ContractError> {
        toml::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize WorkerSettings to JSON string
    pub fn to_json(settings: &WorkerSettings) -> Result<String, ContractError> {
        serde_json::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer settings format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read settings file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}
