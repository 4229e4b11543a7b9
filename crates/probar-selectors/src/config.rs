//! Selector Configuration
//!
//! Process-level switches read by the built-in selectors and the resolver.

use serde::{Deserialize, Serialize};

use crate::result::{ProbarError, ProbarResult};

/// Name of the selector used when auto-detection finds no match
pub const DEFAULT_SELECTOR: &str = "css";

/// Configuration for selector synthesis and resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Also match form fields by their `aria-label` attribute
    pub enable_aria_label: bool,
    /// Render `is` conditions as equality instead of containment
    pub exact: bool,
    /// Require exactly one element from `Resolver::find`
    pub strict: bool,
    /// Selector used when no auto-detection predicate accepts a locator
    pub default_selector: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            enable_aria_label: false,
            exact: false,
            strict: true,
            default_selector: DEFAULT_SELECTOR.to_string(),
        }
    }
}

impl SelectorConfig {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> SelectorConfigBuilder {
        SelectorConfigBuilder::default()
    }

    /// Load configuration from YAML
    pub fn from_yaml_str(yaml: &str) -> ProbarResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from JSON
    pub fn from_json_str(json: &str) -> ProbarResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for unusable values
    pub fn validate(&self) -> ProbarResult<()> {
        if self.default_selector.trim().is_empty() {
            return Err(ProbarError::InvalidConfig {
                message: "default_selector must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for `SelectorConfig`
#[derive(Debug, Clone, Default)]
pub struct SelectorConfigBuilder {
    config: SelectorConfig,
}

impl SelectorConfigBuilder {
    /// Enable/disable aria-label matching for fields
    #[must_use]
    pub fn enable_aria_label(mut self, enabled: bool) -> Self {
        self.config.enable_aria_label = enabled;
        self
    }

    /// Enable/disable exact text matching
    #[must_use]
    pub fn exact(mut self, exact: bool) -> Self {
        self.config.exact = exact;
        self
    }

    /// Enable/disable strict single-element resolution
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Set the fallback selector for auto-detection
    #[must_use]
    pub fn default_selector(mut self, name: impl Into<String>) -> Self {
        self.config.default_selector = name.into();
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> ProbarResult<SelectorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
