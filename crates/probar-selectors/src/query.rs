//! Structural queries produced by selectors.
//!
//! A selector's expression generator yields a [`Query`] in one of two
//! dialects. The query is handed to a [`QueryEvaluator`](crate::QueryEvaluator)
//! as-is; the JavaScript helpers below are what a CDP-backed evaluator runs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::xpath::Expression;

/// Dialect of a structural query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryFormat {
    /// Tree-query (XPath)
    XPath,
    /// Flat-query (CSS)
    Css,
}

impl QueryFormat {
    /// Short name of the dialect
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::XPath => "xpath",
            Self::Css => "css",
        }
    }
}

impl fmt::Display for QueryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural query ready for evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    /// XPath expression tree
    XPath(Expression),
    /// CSS selector text
    Css(String),
}

impl Query {
    /// Create a CSS query
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Dialect of this query
    #[must_use]
    pub const fn format(&self) -> QueryFormat {
        match self {
            Self::XPath(_) => QueryFormat::XPath,
            Self::Css(_) => QueryFormat::Css,
        }
    }

    /// The expression tree, for XPath queries
    #[must_use]
    pub const fn as_xpath(&self) -> Option<&Expression> {
        match self {
            Self::XPath(expr) => Some(expr),
            Self::Css(_) => None,
        }
    }

    /// Serialize the query; `exact` only affects XPath `is` conditions
    #[must_use]
    pub fn render(&self, exact: bool) -> String {
        match self {
            Self::XPath(expr) => expr.to_xpath_exact(exact),
            Self::Css(css) => css.clone(),
        }
    }

    /// JavaScript returning every matched element, in document order
    #[must_use]
    pub fn to_js(&self, exact: bool) -> String {
        match self {
            Self::XPath(_) => {
                let xpath = self.render(exact);
                format!(
                    "(() => {{ const r = document.evaluate({xpath:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); return Array.from({{ length: r.snapshotLength }}, (_, i) => r.snapshotItem(i)); }})()"
                )
            }
            Self::Css(css) => format!("Array.from(document.querySelectorAll({css:?}))"),
        }
    }

    /// JavaScript returning the number of matched elements
    #[must_use]
    pub fn to_count_js(&self, exact: bool) -> String {
        match self {
            Self::XPath(_) => {
                let xpath = self.render(exact);
                format!("document.evaluate({xpath:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength")
            }
            Self::Css(css) => format!("document.querySelectorAll({css:?}).length"),
        }
    }
}

impl From<Expression> for Query {
    fn from(expr: Expression) -> Self {
        Self::XPath(expr)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::normalized_text;

    #[test]
    fn test_format() {
        assert_eq!(Query::css("a").format(), QueryFormat::Css);
        assert_eq!(
            Query::from(Expression::descendant(["a"])).format(),
            QueryFormat::XPath
        );
        assert_eq!(QueryFormat::XPath.to_string(), "xpath");
    }

    #[test]
    fn test_render_exact_only_affects_xpath() {
        let q = Query::from(Expression::descendant(["label"]).predicate(normalized_text().is("Dog")));
        assert!(q.render(false).contains("contains("));
        assert!(q.render(true).contains(" = 'Dog'"));
        assert_eq!(Query::css("a.b").render(true), "a.b");
    }

    #[test]
    fn test_css_js() {
        let q = Query::css("button.primary");
        assert!(q.to_js(false).contains("querySelectorAll"));
        assert!(q.to_count_js(false).contains(".length"));
    }

    #[test]
    fn test_xpath_js() {
        let q = Query::from(Expression::descendant(["button"]));
        let js = q.to_js(false);
        assert!(js.contains("document.evaluate"));
        assert!(js.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
        assert!(js.contains(".//button"));
        assert!(q.to_count_js(false).contains("snapshotLength"));
    }

    #[test]
    fn test_as_xpath() {
        assert!(Query::css("a").as_xpath().is_none());
        assert!(Query::from(Expression::this()).as_xpath().is_some());
    }
}
