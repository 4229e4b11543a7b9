//! Probar Selectors: Named, Filterable Element Queries
//!
//! A registry of named selectors (`field`, `link`, `button`, ...). Each
//! selector turns a locator string plus an option bag into a structural
//! query (XPath or CSS) and carries named filters that narrow the evaluated
//! matches afterwards.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  SELECTOR RESOLUTION PIPELINE                    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Selector   │    │ Query      │    │ Filters    │            │
//! │   │ Registry   │───►│ Evaluator  │───►│ (post-     │───► nodes  │
//! │   │ (call)     │    │ (CDP/mock) │    │  match)    │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use probar_selectors::prelude::*;
//!
//! let registry = SelectorRegistry::with_builtins(SelectorConfig::default())?;
//! let query = registry.get("field")?.call(Some("Email"), &Options::new())?;
//! assert!(query.render(false).contains("(./@id = 'Email')"));
//! # Ok::<(), ProbarError>(())
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Built-in selector catalogue
#[allow(clippy::too_many_lines, clippy::missing_errors_doc)]
pub mod builtin;
#[allow(clippy::missing_errors_doc)]
mod config;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod driver;
/// Form-field expression helper
pub mod field;
#[allow(clippy::missing_errors_doc)]
mod filter;
#[allow(clippy::missing_errors_doc)]
mod filter_set;
mod options;
mod query;
#[allow(clippy::missing_errors_doc)]
mod registry;
#[allow(clippy::missing_errors_doc)]
mod resolve;
mod result;
#[allow(clippy::missing_errors_doc, clippy::return_self_not_must_use)]
mod selector;

/// Tree-query construction and rendering
pub mod xpath;

pub use config::{SelectorConfig, SelectorConfigBuilder, DEFAULT_SELECTOR};
pub use driver::{ElementHandle, MockDriver, Node, QueryEvaluator};
pub use field::locate_field;
pub use filter::{Filter, FilterMatcher, FilterOptions, FilterType};
pub use filter_set::{DescriptionFragment, FilterSet, FilterSetRegistry};
pub use options::{inspect, is_truthy, value_strings, Options};
pub use query::{Query, QueryFormat};
pub use registry::{normalize_name, SelectorRegistry};
pub use resolve::{Resolver, EXACT_OPTION};
pub use result::{ProbarError, ProbarResult};
pub use selector::{
    CssGenerator, ExpressionGenerator, MatchPredicate, Selector, SelectorBuilder, XPathGenerator,
};
pub use xpath::{attr, normalized_text, quote_literal, Expression, Renderer};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::filter::*;
    pub use super::filter_set::*;
    pub use super::options::Options;
    pub use super::query::*;
    pub use super::registry::*;
    pub use super::resolve::*;
    pub use super::result::*;
    pub use super::selector::*;
    pub use super::xpath::{attr, normalized_text, quote_literal, Expression};
}

#[cfg(test)]
mod tests {
    use super::*;

    mod prelude_tests {
        use crate::prelude::*;

        #[test]
        fn test_prelude_covers_registration() {
            let mut registry = SelectorRegistry::new(SelectorConfig::default());
            registry
                .add("heading", |s| {
                    s.xpath(&[], |locator, _| {
                        Expression::descendant(["h1", "h2"])
                            .predicate_opt(locator.map(|l| normalized_text().is(l)))
                    })
                    .filter("level", FilterOptions::new().valid_values(["h1", "h2"]), |node, value, _| {
                        value.as_str() == Some(node.tag_name().as_str())
                    });
                    Ok(())
                })
                .unwrap();
            let query = registry
                .get("heading")
                .unwrap()
                .call(Some("Intro"), &Options::new())
                .unwrap();
            assert_eq!(query.format(), QueryFormat::XPath);
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_probar_error_display() {
            let err = ProbarError::UnknownSelector {
                name: "widget".to_string(),
            };
            assert!(err.to_string().contains("widget"));
        }

        #[test]
        fn test_no_generator_display() {
            let err = ProbarError::NoExpressionGenerator {
                selector: "thing".to_string(),
            };
            assert!(err.to_string().contains("thing"));
        }
    }
}
