//! `flowscribe check-config`.

use std::path::Path;

use flowscribe_config::{Config, ConfigValidator};

pub(crate) fn run(path: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        println!("{} not found, using defaults", path.display());
    }

    let result = ConfigValidator::validate_for_extraction(config);
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    println!("{}", serde_json::to_string_pretty(config)?);

    if result.is_valid() {
        Ok(())
    } else {
        Err(format!("{} configuration error(s)", result.errors.len()).into())
    }
}
