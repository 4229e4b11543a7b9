//! Named post-query filters.
//!
//! A filter decides whether a node returned by query evaluation satisfies an
//! option value. Validation (allowed values, defaults, skip values) happens
//! here so every matcher only ever sees a usable value.

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::driver::Node;
use crate::options::{inspect, Options};
use crate::result::{ProbarError, ProbarResult};

/// Filter callback: `(node, option value, all options) -> accepted`
pub type FilterMatcher = Arc<dyn Fn(&dyn Node, &Value, &Options) -> bool + Send + Sync>;

/// Positional type tags for filter definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// Boolean-valued filter; restricts values to `true`/`false` unless
    /// explicit valid values are given
    Boolean,
    /// Accepts `{"pattern": "<regex>"}` values; the pattern must compile
    Pattern,
}

/// Validation rules for a filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    boolean: bool,
    pattern: bool,
    valid_values: Option<Vec<Value>>,
    default: Option<Value>,
    skip_if: Option<Value>,
}

impl FilterOptions {
    /// Rules with no constraints
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for a boolean filter
    #[must_use]
    pub fn boolean() -> Self {
        Self::default().with_type(FilterType::Boolean)
    }

    /// Rules built from positional type tags
    #[must_use]
    pub fn from_types(types: &[FilterType]) -> Self {
        types
            .iter()
            .fold(Self::default(), |opts, ty| opts.with_type(*ty))
    }

    /// Apply a type tag
    #[must_use]
    pub fn with_type(mut self, ty: FilterType) -> Self {
        match ty {
            FilterType::Boolean => self.boolean = true,
            FilterType::Pattern => self.pattern = true,
        }
        self
    }

    /// Restrict option values to a finite set
    #[must_use]
    pub fn valid_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.valid_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Value used when the option is omitted
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Value for which the filter is not applied
    #[must_use]
    pub fn skip_if(mut self, value: impl Into<Value>) -> Self {
        self.skip_if = Some(value.into());
        self
    }
}

/// A single named filter
#[derive(Clone)]
pub struct Filter {
    name: String,
    options: FilterOptions,
    matcher: FilterMatcher,
}

impl Filter {
    /// Create a filter
    pub fn new<F>(name: impl Into<String>, options: FilterOptions, matcher: F) -> Self
    where
        F: Fn(&dyn Node, &Value, &Options) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            options,
            matcher: Arc::new(matcher),
        }
    }

    /// Filter name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is a boolean filter
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.options.boolean
    }

    /// Whether `{"pattern": ...}` values are accepted
    #[must_use]
    pub fn accepts_pattern(&self) -> bool {
        self.options.pattern
    }

    /// Whether a default value is declared
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.options.default.is_some()
    }

    /// Declared default value
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.options.default.as_ref()
    }

    /// Declared skip value
    #[must_use]
    pub fn skip_value(&self) -> Option<&Value> {
        self.options.skip_if.as_ref()
    }

    /// Effective set of allowed values, `None` when unrestricted
    #[must_use]
    pub fn valid_values(&self) -> Option<Vec<Value>> {
        match (&self.options.valid_values, self.options.boolean) {
            (Some(values), _) => Some(values.clone()),
            (None, true) => Some(vec![Value::Bool(true), Value::Bool(false)]),
            (None, false) => None,
        }
    }

    /// Whether `value` is the skip value
    #[must_use]
    pub fn skip(&self, value: &Value) -> bool {
        self.options.skip_if.as_ref() == Some(value)
    }

    /// Whether `value` is allowed
    #[must_use]
    pub fn is_valid(&self, value: &Value) -> bool {
        self.valid_values()
            .map_or(true, |allowed| allowed.contains(value))
    }

    /// Check the option value this filter would act on.
    ///
    /// Omitted values resolve to the default first; the skip value always
    /// passes.
    pub fn validate(&self, value: Option<&Value>) -> ProbarResult<()> {
        let Some(value) = value.or(self.options.default.as_ref()) else {
            return Ok(());
        };
        if self.skip(value) {
            return Ok(());
        }
        if let Some(allowed) = self.valid_values() {
            if !allowed.contains(value) {
                let allowed = allowed.iter().map(inspect).collect::<Vec<_>>().join(", ");
                tracing::warn!(
                    filter = %self.name,
                    value = %inspect(value),
                    allowed = %allowed,
                    "invalid filter option value"
                );
                return Err(ProbarError::InvalidOptionValue {
                    filter: self.name.clone(),
                    value: inspect(value),
                    allowed,
                });
            }
        }
        if self.options.pattern {
            if let Some(pattern) = value.get("pattern").and_then(Value::as_str) {
                let _ = Regex::new(pattern).map_err(|e| ProbarError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
            }
        }
        Ok(())
    }

    /// Decide whether `node` satisfies this filter for the supplied option value.
    ///
    /// An omitted value falls back to the default; without a default the
    /// filter accepts every node.
    pub fn apply(
        &self,
        node: &dyn Node,
        value: Option<&Value>,
        options: &Options,
    ) -> ProbarResult<bool> {
        self.validate(value)?;
        Ok(self.accepts(node, value, options))
    }

    /// Run the matcher on a value that already passed [`Filter::validate`]
    #[must_use]
    pub fn accepts(&self, node: &dyn Node, value: Option<&Value>, options: &Options) -> bool {
        let Some(value) = value.or(self.options.default.as_ref()) else {
            return true;
        };
        self.skip(value) || (self.matcher)(node, value, options)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
