//! Query resolution.
//!
//! Runs a selector end to end: generate the query, evaluate it, then keep the
//! nodes every own filter accepts.

use crate::driver::QueryEvaluator;
use crate::options::Options;
use crate::registry::SelectorRegistry;
use crate::result::{ProbarError, ProbarResult};
use crate::selector::Selector;

/// Option key overriding the configured exact-matching mode per call
pub const EXACT_OPTION: &str = "exact";

/// Resolves selectors against a query evaluator
#[derive(Debug)]
pub struct Resolver<'r, E: QueryEvaluator> {
    registry: &'r SelectorRegistry,
    evaluator: &'r E,
}

impl<'r, E: QueryEvaluator> Resolver<'r, E> {
    /// Create a resolver
    #[must_use]
    pub const fn new(registry: &'r SelectorRegistry, evaluator: &'r E) -> Self {
        Self {
            registry,
            evaluator,
        }
    }

    /// Registry this resolver reads from
    #[must_use]
    pub const fn registry(&self) -> &'r SelectorRegistry {
        self.registry
    }

    /// Selector auto-detected for a bare locator
    pub fn detect(&self, locator: &str) -> ProbarResult<&'r Selector> {
        self.registry.detect(locator)
    }

    /// Every node the selector matches, in document order
    pub fn find_all(
        &self,
        selector: &str,
        locator: Option<&str>,
        options: &Options,
    ) -> ProbarResult<Vec<E::Node>> {
        self.find_all_within(selector, locator, options, None)
    }

    /// Like [`Resolver::find_all`], restricted to the subtree under `scope`
    pub fn find_all_within(
        &self,
        selector: &str,
        locator: Option<&str>,
        options: &Options,
        scope: Option<&E::Node>,
    ) -> ProbarResult<Vec<E::Node>> {
        let selector = self.registry.get(selector)?;
        let query = selector.call(locator, options)?;
        selector.validate_options(options)?;
        let exact = options
            .get_bool(EXACT_OPTION)
            .unwrap_or(self.registry.config().exact);
        let candidates = self.evaluator.evaluate(&query, exact, scope)?;
        let total = candidates.len();

        let matched: Vec<E::Node> = candidates
            .into_iter()
            .filter(|node| selector.accepts(node, options))
            .collect();
        tracing::debug!(
            selector = %selector.name(),
            query = %query.render(exact),
            candidates = total,
            matched = matched.len(),
            "query resolved"
        );
        Ok(matched)
    }

    /// The single node the selector matches.
    ///
    /// With strict resolution more than one match is an error; otherwise the
    /// first match wins.
    pub fn find(
        &self,
        selector: &str,
        locator: Option<&str>,
        options: &Options,
    ) -> ProbarResult<E::Node> {
        let mut matched = self.find_all(selector, locator, options)?;
        let describe = || -> ProbarResult<String> {
            Ok(self.registry.get(selector)?.failure_message(locator, options))
        };
        match matched.len() {
            0 => Err(ProbarError::ElementNotFound {
                description: describe()?,
            }),
            1 => Ok(matched.remove(0)),
            count if self.registry.config().strict => Err(ProbarError::AmbiguousMatch {
                count,
                description: describe()?,
            }),
            _ => Ok(matched.remove(0)),
        }
    }

    /// Resolve a bare locator with the auto-detected selector
    pub fn find_detected(&self, locator: &str, options: &Options) -> ProbarResult<E::Node> {
        let selector = self.detect(locator)?;
        self.find(selector.name(), Some(locator), options)
    }
}
