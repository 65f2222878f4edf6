//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a `CoalescerBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("coalescer.toml")).unwrap();
//! println!("Subscribers: {}", blueprint.subscribers.len());
//! ```

mod parser;
mod validator;

pub use contracts::CoalescerBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Format is detected from the file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<CoalescerBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<CoalescerBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Re-run validation, e.g. after CLI overrides were applied
    pub fn validate(blueprint: &CoalescerBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    /// Serialize a blueprint to TOML
    pub fn to_toml(blueprint: &CoalescerBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a blueprint to JSON
    pub fn to_json(blueprint: &CoalescerBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ClockKind, SinkType};

    const MINIMAL_TOML: &str = r#"
[clock]
kind = "interval"
interval_ms = 16.0

[[subscribers]]
id = "hud"
sink_type = "log"

[[subscribers]]
id = "recorder"
sink_type = "file"
queue_capacity = 8
params = { base_path = "./frames" }
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.clock.kind, ClockKind::Interval);
        assert_eq!(bp.subscribers.len(), 2);
        assert_eq!(bp.subscribers[1].sink_type, SinkType::File);
    }

    #[test]
    fn test_json_output_loads_back() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.subscriber_ids(), bp2.subscriber_ids());
        assert_eq!(bp2.subscribers[1].queue_capacity, 8);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[[subscribers]]
id = "hud"
sink_type = "log"

[[subscribers]]
id = "hud"
sink_type = "memory"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coalescer.toml");
        std::fs::write(&path, MINIMAL_TOML).unwrap();

        let bp = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(bp.subscribers[0].id, "hud");

        let bad = dir.path().join("coalescer.yaml");
        std::fs::write(&bad, MINIMAL_TOML).unwrap();
        assert!(matches!(
            ConfigLoader::load_from_path(&bad),
            Err(ContractError::ConfigParse { .. })
        ));
    }
}
