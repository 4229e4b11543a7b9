//! Selectors: named query definitions with their own filters.
//!
//! A [`Selector`] is immutable once registered. Configuration happens on a
//! [`SelectorBuilder`], which the registry hands to a registration closure
//! and finalizes when the closure returns.
//!
//! ```ignore
//! registry.add("link", |s| {
//!     s.label("link")
//!         .xpath(&["href"], |locator, _opts| {
//!             Expression::descendant(["a"]).predicate(attr("href"))
//!         })
//!         .filter("href", FilterOptions::new(), |node, value, _| {
//!             node.attribute("href").as_deref() == value.as_str()
//!         });
//!     Ok(())
//! })?;
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::driver::Node;
use crate::filter::{Filter, FilterOptions};
use crate::filter_set::{FilterSet, FilterSetRegistry};
use crate::options::Options;
use crate::query::{Query, QueryFormat};
use crate::result::{ProbarError, ProbarResult};
use crate::xpath::Expression;

/// Tree-query generator: `(locator, options) -> expression`
pub type XPathGenerator = Arc<dyn Fn(Option<&str>, &Options) -> Expression + Send + Sync>;

/// Flat-query generator: `(locator, options) -> CSS selector`
pub type CssGenerator = Arc<dyn Fn(Option<&str>, &Options) -> String + Send + Sync>;

/// Auto-detection predicate over a locator
pub type MatchPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// The single active expression definition of a selector
#[derive(Clone, Default)]
pub enum ExpressionGenerator {
    /// No generator configured yet
    #[default]
    Unset,
    /// Tree-query generator
    XPath(XPathGenerator),
    /// Flat-query generator
    Css(CssGenerator),
}

impl ExpressionGenerator {
    /// Dialect of the active generator
    #[must_use]
    pub const fn format(&self) -> Option<QueryFormat> {
        match self {
            Self::Unset => None,
            Self::XPath(_) => Some(QueryFormat::XPath),
            Self::Css(_) => Some(QueryFormat::Css),
        }
    }

    /// Run the generator, `None` when unset
    #[must_use]
    pub fn generate(&self, locator: Option<&str>, options: &Options) -> Option<Query> {
        match self {
            Self::Unset => None,
            Self::XPath(generator) => Some(Query::XPath(generator(locator, options))),
            Self::Css(generator) => Some(Query::Css(generator(locator, options))),
        }
    }
}

impl fmt::Debug for ExpressionGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format() {
            Some(format) => write!(f, "ExpressionGenerator::{format}"),
            None => f.write_str("ExpressionGenerator::Unset"),
        }
    }
}

/// A registered selector
#[derive(Clone)]
pub struct Selector {
    name: String,
    label: Option<String>,
    expression: ExpressionGenerator,
    expression_filters: Vec<String>,
    match_predicate: Option<MatchPredicate>,
    filters: FilterSet,
}

impl Selector {
    fn empty(name: String) -> Self {
        Self {
            filters: FilterSet::new(name.clone()),
            name,
            label: None,
            expression: ExpressionGenerator::Unset,
            expression_filters: Vec::new(),
            match_predicate: None,
        }
    }

    /// Registry key
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Dialect of the active expression generator
    #[must_use]
    pub fn format(&self) -> Option<QueryFormat> {
        self.expression.format()
    }

    /// Active expression generator
    #[must_use]
    pub fn expression(&self) -> &ExpressionGenerator {
        &self.expression
    }

    /// XPath generator, only while the active format is XPath
    #[must_use]
    pub fn xpath_generator(&self) -> Option<&XPathGenerator> {
        match &self.expression {
            ExpressionGenerator::XPath(generator) => Some(generator),
            _ => None,
        }
    }

    /// CSS generator, only while the active format is CSS
    #[must_use]
    pub fn css_generator(&self) -> Option<&CssGenerator> {
        match &self.expression {
            ExpressionGenerator::Css(generator) => Some(generator),
            _ => None,
        }
    }

    /// Filter names the expression generator already encodes
    #[must_use]
    pub fn expression_filters(&self) -> &[String] {
        &self.expression_filters
    }

    /// Whether an auto-detection predicate is configured
    #[must_use]
    pub fn has_match_predicate(&self) -> bool {
        self.match_predicate.is_some()
    }

    /// Own filters keyed by name
    #[must_use]
    pub fn custom_filters(&self) -> &HashMap<String, Filter> {
        self.filters.filters()
    }

    /// Own filter set
    #[must_use]
    pub fn filter_set(&self) -> &FilterSet {
        &self.filters
    }

    /// Build the structural query for a locator.
    ///
    /// The generator receives the whole option bag.
    pub fn call(&self, locator: Option<&str>, options: &Options) -> ProbarResult<Query> {
        match self.expression.generate(locator, options) {
            Some(query) => {
                tracing::debug!(
                    selector = %self.name,
                    format = %query.format(),
                    locator = ?locator,
                    "query generated"
                );
                Ok(query)
            }
            None => {
                tracing::warn!(selector = %self.name, "selector called without an xpath or css expression");
                Err(ProbarError::NoExpressionGenerator {
                    selector: self.name.clone(),
                })
            }
        }
    }

    /// Whether this selector claims the locator for auto-detection
    #[must_use]
    pub fn matches(&self, locator: &str) -> bool {
        self.match_predicate
            .as_ref()
            .is_some_and(|predicate| predicate(locator))
    }

    /// Description of the options, as rendered by the own filter set
    #[must_use]
    pub fn description(&self, options: &Options) -> String {
        self.filters.description(options)
    }

    /// Whether a node passes every own filter
    pub fn matches_filters(&self, node: &dyn Node, options: &Options) -> ProbarResult<bool> {
        self.filters.matches(node, options)
    }

    /// Validate option values against this selector's filters
    pub fn validate_options(&self, options: &Options) -> ProbarResult<()> {
        self.filters.validate(options)
    }

    /// Whether `node` passes every filter, for options already validated
    #[must_use]
    pub fn accepts(&self, node: &dyn Node, options: &Options) -> bool {
        self.filters.accepts(node, options)
    }

    /// Explanation used when nothing matched, e.g. `field "Dog" that is checked`
    #[must_use]
    pub fn failure_message(&self, locator: Option<&str>, options: &Options) -> String {
        let mut message = self.label.as_deref().unwrap_or(&self.name).to_string();
        if let Some(locator) = locator {
            message.push(' ');
            message.push_str(&Value::from(locator).to_string());
        }
        let description = self.description(options);
        if !description.is_empty() {
            message.push(' ');
            message.push_str(&description);
        }
        message
    }

    /// Re-open this selector for further configuration
    #[must_use]
    pub fn into_builder(self, filter_sets: &FilterSetRegistry) -> SelectorBuilder<'_> {
        SelectorBuilder {
            filter_sets,
            selector: self,
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("expression", &self.expression)
            .field("expression_filters", &self.expression_filters)
            .field("match_predicate", &self.match_predicate.is_some())
            .field("filters", &self.filters)
            .finish()
    }
}

/// Configuration surface handed to registration closures
pub struct SelectorBuilder<'a> {
    filter_sets: &'a FilterSetRegistry,
    selector: Selector,
}

impl<'a> SelectorBuilder<'a> {
    /// Start configuring a new selector
    #[must_use]
    pub fn new(name: impl Into<String>, filter_sets: &'a FilterSetRegistry) -> Self {
        Self {
            filter_sets,
            selector: Selector::empty(name.into()),
        }
    }

    /// Selector name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.selector.name
    }

    /// Make an XPath generator the active expression
    pub fn xpath<F>(&mut self, expression_filters: &[&str], generator: F) -> &mut Self
    where
        F: Fn(Option<&str>, &Options) -> Expression + Send + Sync + 'static,
    {
        self.selector.expression = ExpressionGenerator::XPath(Arc::new(generator));
        self.set_expression_filters(expression_filters);
        self
    }

    /// Make a CSS generator the active expression
    pub fn css<F>(&mut self, expression_filters: &[&str], generator: F) -> &mut Self
    where
        F: Fn(Option<&str>, &Options) -> String + Send + Sync + 'static,
    {
        self.selector.expression = ExpressionGenerator::Css(Arc::new(generator));
        self.set_expression_filters(expression_filters);
        self
    }

    fn set_expression_filters(&mut self, names: &[&str]) {
        self.selector.expression_filters = names.iter().map(|n| (*n).to_string()).collect();
    }

    /// XPath generator, only while the active format is XPath
    #[must_use]
    pub fn xpath_generator(&self) -> Option<&XPathGenerator> {
        self.selector.xpath_generator()
    }

    /// CSS generator, only while the active format is CSS
    #[must_use]
    pub fn css_generator(&self) -> Option<&CssGenerator> {
        self.selector.css_generator()
    }

    /// Set the auto-detection predicate
    pub fn match_when<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.selector.match_predicate = Some(Arc::new(predicate));
        self
    }

    /// Set the display label
    pub fn label(&mut self, label: impl Into<String>) -> &mut Self {
        self.selector.label = Some(label.into());
        self
    }

    /// Define an own filter, replacing any filter with the same name
    pub fn filter<F>(&mut self, name: impl Into<String>, options: FilterOptions, matcher: F) -> &mut Self
    where
        F: Fn(&dyn Node, &Value, &Options) -> bool + Send + Sync + 'static,
    {
        let _ = self.selector.filters.filter(name, options, matcher);
        self
    }

    /// Pull filters and descriptions from a shared filter set.
    ///
    /// `names` restricts which filters are copied; descriptions are always
    /// copied in full.
    pub fn filter_set(&mut self, set: &str, names: Option<&[&str]>) -> ProbarResult<&mut Self> {
        let shared = self.filter_sets.get(set)?;
        let _ = self.selector.filters.merge(shared, names);
        Ok(self)
    }

    /// Append a description fragment
    pub fn describe<F>(&mut self, fragment: F) -> &mut Self
    where
        F: Fn(&Options) -> String + Send + Sync + 'static,
    {
        let _ = self.selector.filters.describe(fragment);
        self
    }

    /// Finish configuration
    #[must_use]
    pub fn build(self) -> Selector {
        self.selector
    }
}

impl fmt::Debug for SelectorBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorBuilder")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ElementHandle;
    use crate::xpath::attr;
    use serde_json::json;

    fn builder(sets: &FilterSetRegistry) -> SelectorBuilder<'_> {
        SelectorBuilder::new("thing", sets)
    }

    mod expression_tests {
        use super::*;

        #[test]
        fn test_xpath_sets_format_and_filters() {
            let sets = FilterSetRegistry::new();
            let mut b = builder(&sets);
            b.xpath(&["id", "class"], |_, _| Expression::descendant(["div"]));
            let selector = b.build();
            assert_eq!(selector.format(), Some(QueryFormat::XPath));
            assert_eq!(selector.expression_filters(), &["id", "class"]);
            assert!(selector.xpath_generator().is_some());
            assert!(selector.css_generator().is_none());
        }

        #[test]
        fn test_css_replaces_xpath() {
            let sets = FilterSetRegistry::new();
            let mut b = builder(&sets);
            b.xpath(&["id"], |_, _| Expression::descendant(["div"]));
            b.css(&[], |locator, _| locator.unwrap_or("*").to_string());
            assert!(b.xpath_generator().is_none());
            assert!(b.css_generator().is_some());
            let selector = b.build();
            assert_eq!(selector.format(), Some(QueryFormat::Css));
            assert!(selector.expression_filters().is_empty());
        }

        #[test]
        fn test_call_passes_full_options() {
            let sets = FilterSetRegistry::new();
            let mut b = builder(&sets);
            b.css(&[], |locator, opts| {
                format!("{}.{}", locator.unwrap_or("div"), opts.get_str("extra").unwrap_or(""))
            });
            let selector = b.build();
            let query = selector
                .call(Some("span"), &Options::new().with("extra", "x"))
                .unwrap();
            assert_eq!(query, Query::css("span.x"));
        }

        #[test]
        fn test_call_without_generator_fails() {
            let sets = FilterSetRegistry::new();
            let selector = builder(&sets).build();
            assert!(selector.format().is_none());
            assert!(matches!(
                selector.call(Some("x"), &Options::new()),
                Err(ProbarError::NoExpressionGenerator { .. })
            ));
        }

        #[test]
        fn test_call_is_deterministic() {
            let sets = FilterSetRegistry::new();
            let mut b = builder(&sets);
            b.xpath(&[], |locator, _| {
                Expression::descendant(["div"]).predicate(attr("id").equals(locator.unwrap_or("")))
            });
            let selector = b.build();
            let opts = Options::new();
            assert_eq!(
                selector.call(Some("a"), &opts).unwrap(),
                selector.call(Some("a"), &opts).unwrap()
            );
        }
    }

    mod configuration_tests {
        use super::*;

        #[test]
        fn test_label_and_match() {
            let sets = FilterSetRegistry::new();
            let mut b = builder(&sets);
            b.label("thing label").match_when(|l| l.starts_with('#'));
            let selector = b.build();
            assert_eq!(selector.label(), Some("thing label"));
            assert!(selector.matches("#x"));
            assert!(!selector.matches("x"));
            assert!(selector.has_match_predicate());
        }

        #[test]
        fn test_no_predicate_never_matches() {
            let sets = FilterSetRegistry::new();
            let selector = builder(&sets).build();
            assert!(!selector.matches("anything"));
        }

        #[test]
        fn test_filter_overwrites_same_name() {
            let sets = FilterSetRegistry::new();
            let mut b = builder(&sets);
            b.filter("f", FilterOptions::new(), |_, _, _| false);
            b.filter("f", FilterOptions::new(), |_, _, _| true);
            let selector = b.build();
            assert_eq!(selector.custom_filters().len(), 1);
            let el = ElementHandle::new("e", "div");
            let opts = Options::new().with("f", 1);
            assert!(selector.matches_filters(&el, &opts).unwrap());
        }

        #[test]
        fn test_filter_set_unknown() {
            let sets = FilterSetRegistry::new();
            let mut b = builder(&sets);
            assert!(matches!(
                b.filter_set("missing", None),
                Err(ProbarError::UnknownFilterSet { .. })
            ));
        }

        #[test]
        fn test_filter_set_subset() {
            let mut sets = FilterSetRegistry::new();
            sets.define("_shared", |set| {
                set.filter("a", FilterOptions::boolean(), |_, _, _| true)
                    .filter("b", FilterOptions::boolean(), |_, _, _| true)
                    .describe(|_| "from a".to_string())
                    .describe(|_| "from b".to_string());
            });
            let mut b = builder(&sets);
            b.filter_set("_shared", Some(&["a"])).unwrap();
            let selector = b.build();
            assert!(selector.custom_filters().contains_key("a"));
            assert!(!selector.custom_filters().contains_key("b"));
            assert_eq!(selector.description(&Options::new()), "from a from b");
        }

        #[test]
        fn test_into_builder_keeps_configuration() {
            let sets = FilterSetRegistry::new();
            let mut b = builder(&sets);
            b.label("thing").css(&[], |_, _| "div".to_string());
            let selector = b.build();
            let mut reopened = selector.into_builder(&sets);
            reopened.describe(|_| "extra".to_string());
            let selector = reopened.build();
            assert_eq!(selector.label(), Some("thing"));
            assert_eq!(selector.format(), Some(QueryFormat::Css));
            assert_eq!(selector.description(&Options::new()), "extra");
        }
    }

    mod failure_message_tests {
        use super::*;

        #[test]
        fn test_uses_label_and_quoted_locator() {
            let sets = FilterSetRegistry::new();
            let mut b = builder(&sets);
            b.label("form field").describe(|opts| {
                opts.get("with")
                    .map(|v| format!("with value {v}"))
                    .unwrap_or_default()
            });
            let selector = b.build();
            let opts = Options::new().with("with", json!("x"));
            assert_eq!(
                selector.failure_message(Some("Dog"), &opts),
                "form field \"Dog\" with value \"x\""
            );
        }

        #[test]
        fn test_falls_back_to_name() {
            let sets = FilterSetRegistry::new();
            let selector = builder(&sets).build();
            assert_eq!(selector.failure_message(None, &Options::new()), "thing");
        }
    }
}
