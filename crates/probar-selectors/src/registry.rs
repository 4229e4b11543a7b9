//! Selector registry.
//!
//! Owns every registered [`Selector`] together with the shared
//! [`FilterSetRegistry`] they pull filters from. Registries are explicit
//! values: build one (usually with [`SelectorRegistry::with_builtins`]) and
//! pass it to whatever resolves queries.

use std::collections::HashMap;

use crate::builtin;
use crate::config::SelectorConfig;
use crate::filter_set::FilterSetRegistry;
use crate::result::{ProbarError, ProbarResult};
use crate::selector::{Selector, SelectorBuilder};

/// Canonical registry key: trimmed, lowercase, `-` folded to `_`
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('-', "_")
}

/// Registry of named selectors
#[derive(Debug, Clone, Default)]
pub struct SelectorRegistry {
    config: SelectorConfig,
    selectors: HashMap<String, Selector>,
    order: Vec<String>,
    filter_sets: FilterSetRegistry,
}

impl SelectorRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Create a registry holding the built-in selectors
    pub fn with_builtins(config: SelectorConfig) -> ProbarResult<Self> {
        let mut registry = Self::new(config);
        builtin::register(&mut registry)?;
        Ok(registry)
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Shared filter sets
    #[must_use]
    pub fn filter_sets(&self) -> &FilterSetRegistry {
        &self.filter_sets
    }

    /// Shared filter sets, for registering new ones
    pub fn filter_sets_mut(&mut self) -> &mut FilterSetRegistry {
        &mut self.filter_sets
    }

    /// Register a selector, replacing any selector with the same name.
    ///
    /// `configure` runs immediately against a fresh builder; if it fails
    /// nothing is registered.
    pub fn add<F>(&mut self, name: &str, configure: F) -> ProbarResult<&Selector>
    where
        F: FnOnce(&mut SelectorBuilder<'_>) -> ProbarResult<()>,
    {
        let key = normalize_name(name);
        let mut builder = SelectorBuilder::new(key.clone(), &self.filter_sets);
        configure(&mut builder)?;
        let selector = builder.build();
        tracing::debug!(selector = %key, format = ?selector.format(), "selector registered");
        Ok(self.store(key, selector))
    }

    /// Re-open a registered selector for further configuration.
    ///
    /// The stored selector is only replaced when `configure` succeeds.
    pub fn update<F>(&mut self, name: &str, configure: F) -> ProbarResult<&Selector>
    where
        F: FnOnce(&mut SelectorBuilder<'_>) -> ProbarResult<()>,
    {
        let key = normalize_name(name);
        let existing = self
            .selectors
            .get(&key)
            .cloned()
            .ok_or_else(|| ProbarError::UnknownSelector {
                name: name.to_string(),
            })?;
        let mut builder = existing.into_builder(&self.filter_sets);
        configure(&mut builder)?;
        let selector = builder.build();
        tracing::debug!(selector = %key, "selector updated");
        Ok(self.store(key, selector))
    }

    fn store(&mut self, key: String, selector: Selector) -> &Selector {
        if !self.selectors.contains_key(&key) {
            self.order.push(key.clone());
        }
        let _ = self.selectors.insert(key.clone(), selector);
        &self.selectors[&key]
    }

    /// Remove a selector; absent names are ignored
    pub fn remove(&mut self, name: &str) -> Option<Selector> {
        let key = normalize_name(name);
        let removed = self.selectors.remove(&key);
        if removed.is_some() {
            self.order.retain(|k| k != &key);
            tracing::debug!(selector = %key, "selector removed");
        }
        removed
    }

    /// Look up a selector by name
    pub fn get(&self, name: &str) -> ProbarResult<&Selector> {
        self.selectors
            .get(&normalize_name(name))
            .ok_or_else(|| ProbarError::UnknownSelector {
                name: name.to_string(),
            })
    }

    /// Whether a selector is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.selectors.contains_key(&normalize_name(name))
    }

    /// All selectors keyed by name
    #[must_use]
    pub fn all(&self) -> &HashMap<String, Selector> {
        &self.selectors
    }

    /// Selector names in registration order
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Selectors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Selector> {
        self.order.iter().filter_map(|k| self.selectors.get(k))
    }

    /// Pick the selector for a bare locator.
    ///
    /// The first selector (in registration order) whose match predicate
    /// accepts the locator wins; otherwise the configured default selector.
    pub fn detect(&self, locator: &str) -> ProbarResult<&Selector> {
        if let Some(selector) = self.iter().find(|s| s.matches(locator)) {
            tracing::debug!(selector = %selector.name(), locator, "selector detected");
            return Ok(selector);
        }
        self.get(&self.config.default_selector)
    }
}
