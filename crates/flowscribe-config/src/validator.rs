//! Configuration validation.

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// First error as a [`ConfigError`], if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_renderer(config, &mut result);
        Self::validate_canvas(config, &mut result);
        Self::validate_selectors(config, &mut result);
        Self::validate_timing(config, &mut result);

        result
    }

    /// Validate everything plus the fields an extraction run needs.
    pub fn validate_for_extraction(config: &Config) -> ValidationResult {
        let mut result = Self::validate(config);
        let url = &config.extraction.editor_url;
        if url.is_empty() {
            result.add_error(ValidationError::new(
                "extraction.editor_url",
                "editor_url must be set",
            ));
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            result.add_error(ValidationError::new(
                "extraction.editor_url",
                "editor_url must start with http:// or https://",
            ));
        }
        result
    }

    fn validate_renderer(config: &Config, result: &mut ValidationResult) {
        let endpoint = &config.renderer.endpoint;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            result.add_error(ValidationError::new(
                "renderer.endpoint",
                "endpoint must start with http:// or https://",
            ));
        }

        if config.renderer.call_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "renderer.call_timeout_secs",
                "call_timeout_secs must be greater than 0",
            ));
        }
    }

    fn validate_canvas(config: &Config, result: &mut ValidationResult) {
        let canvas = &config.extraction.canvas;
        if !canvas.min_x.is_finite() || canvas.min_x < 0.0 {
            result.add_error(ValidationError::new(
                "extraction.canvas.min_x",
                "min_x must be a finite, non-negative number",
            ));
        }

        if let Some(max_x) = canvas.max_x {
            if max_x <= canvas.min_x {
                result.add_error(ValidationError::new(
                    "extraction.canvas.max_x",
                    format!("max_x ({}) must be greater than min_x ({})", max_x, canvas.min_x),
                ));
            }
        }

        let neutral = config.extraction.neutral_point;
        if neutral.x < 0.0 || neutral.y < 0.0 {
            result.add_error(ValidationError::new(
                "extraction.neutral_point",
                "neutral_point coordinates must be non-negative",
            ));
        }
    }

    fn validate_selectors(config: &Config, result: &mut ValidationResult) {
        let selectors = &config.extraction.selectors;
        for (path, value) in [
            ("extraction.selectors.nav_item", &selectors.nav_item),
            ("extraction.selectors.step", &selectors.step),
            ("extraction.selectors.panel", &selectors.panel),
            ("extraction.selectors.page", &selectors.page),
            ("extraction.selectors.wf_item_attribute", &selectors.wf_item_attribute),
        ] {
            if value.trim().is_empty() {
                result.add_error(ValidationError::new(path, "selector cannot be empty"));
            }
        }

        if let Err(e) = Regex::new(&selectors.step_pattern) {
            result.add_error(ValidationError::new(
                "extraction.selectors.step_pattern",
                format!("invalid regular expression: {}", e),
            ));
        } else if !selectors.step_pattern.contains(r"\d") {
            result.add_warning(ValidationWarning::new(
                "extraction.selectors.step_pattern",
                "pattern does not match a step number; steps are numbered from their label",
            ));
        }
    }

    fn validate_timing(config: &Config, result: &mut ValidationResult) {
        let timing = &config.extraction.timing;
        if timing.click_settle_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "extraction.timing.click_settle_ms",
                "click_settle_ms is 0, panels may be read before they render",
            ));
        }

        if timing.retry_settle_ms <= timing.click_settle_ms && timing.click_settle_ms > 0 {
            result.add_warning(ValidationWarning::new(
                "extraction.timing.retry_settle_ms",
                "retry_settle_ms should be longer than click_settle_ms",
            ));
        }

        if timing.navigation_settle_ms > 60_000 {
            result.add_warning(ValidationWarning::new(
                "extraction.timing.navigation_settle_ms",
                "navigation_settle_ms is over a minute",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
