//! Tree-query expression tree and composition DSL.
//!
//! Expressions are plain values: composing never mutates an existing
//! expression, so a base fragment can be reused across several queries.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::renderer::Renderer;

/// A node in an XPath expression tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expression {
    /// The context node (`.`)
    This,
    /// Elements with any of the given names anywhere in the document
    Anywhere(Vec<String>),
    /// Descendant elements of `on` with any of the given names
    Descendant {
        /// Expression the step starts from
        on: Box<Expression>,
        /// Element names (`*` matches any)
        names: Vec<String>,
    },
    /// Child elements of `on` with any of the given names
    Child {
        /// Expression the step starts from
        on: Box<Expression>,
        /// Element names (`*` matches any)
        names: Vec<String>,
    },
    /// `on` constrained by a bracketed predicate
    Where {
        /// Constrained expression
        on: Box<Expression>,
        /// Predicate
        condition: Box<Expression>,
    },
    /// Attribute of `on`
    Attribute {
        /// Owner expression
        on: Box<Expression>,
        /// Attribute name
        name: String,
    },
    /// Quoted string literal
    Literal(String),
    /// Pre-rendered XPath text, emitted verbatim
    Raw(String),
    /// String value of an expression
    StringOf(Box<Expression>),
    /// Whitespace-normalized value of an expression
    NormalizeSpace(Box<Expression>),
    /// Equality comparison
    Equality(Box<Expression>, Box<Expression>),
    /// Substring containment
    Contains(Box<Expression>, Box<Expression>),
    /// Equality when rendering exactly, containment otherwise
    Is(Box<Expression>, Box<Expression>),
    /// Conjunction
    And(Box<Expression>, Box<Expression>),
    /// Disjunction
    Or(Box<Expression>, Box<Expression>),
    /// Negation
    Not(Box<Expression>),
    /// Node-set union
    Union(Vec<Expression>),
    /// String concatenation
    Concat(Vec<Expression>),
}

impl Expression {
    /// The context node
    #[must_use]
    pub const fn this() -> Self {
        Self::This
    }

    /// Descendants of the context node with any of the given names
    #[must_use]
    pub fn descendant<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::This.descendants(names)
    }

    /// Elements with any of the given names anywhere in the document
    #[must_use]
    pub fn anywhere<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Anywhere(collect_names(names))
    }

    /// A string literal
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Verbatim XPath text
    #[must_use]
    pub fn raw(xpath: impl Into<String>) -> Self {
        Self::Raw(xpath.into())
    }

    /// A condition that renders to nothing
    #[must_use]
    pub fn empty() -> Self {
        Self::Raw(String::new())
    }

    /// Fold conditions into a disjunction; no conditions yields an empty condition
    #[must_use]
    pub fn any_of<I: IntoIterator<Item = Expression>>(conditions: I) -> Self {
        conditions
            .into_iter()
            .reduce(Expression::or)
            .unwrap_or_else(Self::empty)
    }

    /// Fold conditions into a conjunction; no conditions yields an empty condition
    #[must_use]
    pub fn all_of<I: IntoIterator<Item = Expression>>(conditions: I) -> Self {
        conditions
            .into_iter()
            .reduce(Expression::and)
            .unwrap_or_else(Self::empty)
    }

    /// Descendant step from this expression
    #[must_use]
    pub fn descendants<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Descendant {
            on: Box::new(self),
            names: collect_names(names),
        }
    }

    /// Child step from this expression
    #[must_use]
    pub fn child<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Child {
            on: Box::new(self),
            names: collect_names(names),
        }
    }

    /// Constrain this expression by a predicate
    #[must_use]
    pub fn predicate(self, condition: Expression) -> Self {
        Self::Where {
            on: Box::new(self),
            condition: Box::new(condition),
        }
    }

    /// Constrain this expression when a predicate is given, otherwise keep it as is
    #[must_use]
    pub fn predicate_opt(self, condition: Option<Expression>) -> Self {
        match condition {
            Some(condition) => self.predicate(condition),
            None => self,
        }
    }

    /// Attribute of this expression
    #[must_use]
    pub fn attr(self, name: impl Into<String>) -> Self {
        Self::Attribute {
            on: Box::new(self),
            name: name.into(),
        }
    }

    /// String value of this expression
    #[must_use]
    pub fn string(self) -> Self {
        Self::StringOf(Box::new(self))
    }

    /// Whitespace-normalized value of this expression
    #[must_use]
    pub fn normalize(self) -> Self {
        Self::NormalizeSpace(Box::new(self))
    }

    /// Equality with another expression or a literal
    #[must_use]
    pub fn equals(self, other: impl Into<Expression>) -> Self {
        Self::Equality(Box::new(self), Box::new(other.into()))
    }

    /// Substring containment
    #[must_use]
    pub fn contains(self, other: impl Into<Expression>) -> Self {
        Self::Contains(Box::new(self), Box::new(other.into()))
    }

    /// Exact-or-partial comparison, decided at render time
    #[must_use]
    pub fn is(self, other: impl Into<Expression>) -> Self {
        Self::Is(Box::new(self), Box::new(other.into()))
    }

    /// Equality with any of the given literals
    #[must_use]
    pub fn one_of<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::any_of(
            values
                .into_iter()
                .map(|value| self.clone().equals(Self::literal(value))),
        )
    }

    /// Whitespace-delimited token containment, as used for `class` lists
    #[must_use]
    pub fn contains_word(self, word: &str) -> Self {
        Self::Concat(vec![Self::literal(" "), self.normalize(), Self::literal(" ")])
            .contains(Self::literal(format!(" {word} ")))
    }

    /// Conjunction
    #[must_use]
    pub fn and(self, other: Expression) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Disjunction
    #[must_use]
    pub fn or(self, other: Expression) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Negation
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Node-set union with another expression
    #[must_use]
    pub fn union(self, other: Expression) -> Self {
        match self {
            Self::Union(mut members) => {
                members.push(other);
                Self::Union(members)
            }
            first => Self::Union(vec![first, other]),
        }
    }

    /// Re-root the location path of this expression at `root`.
    ///
    /// Only the step chain is rewritten; the context node inside predicates
    /// keeps referring to the step it constrains.
    #[must_use]
    pub fn rooted_at(self, root: &Expression) -> Self {
        match self {
            Self::This => root.clone(),
            Self::Descendant { on, names } => Self::Descendant {
                on: Box::new(on.rooted_at(root)),
                names,
            },
            Self::Child { on, names } => Self::Child {
                on: Box::new(on.rooted_at(root)),
                names,
            },
            Self::Where { on, condition } => Self::Where {
                on: Box::new(on.rooted_at(root)),
                condition,
            },
            Self::Attribute { on, name } => Self::Attribute {
                on: Box::new(on.rooted_at(root)),
                name,
            },
            Self::Union(members) => {
                Self::Union(members.into_iter().map(|m| m.rooted_at(root)).collect())
            }
            other => other,
        }
    }

    /// Render with partial matching for `is`
    #[must_use]
    pub fn to_xpath(&self) -> String {
        Renderer::new(false).render(self)
    }

    /// Render with the given matching mode for `is`
    #[must_use]
    pub fn to_xpath_exact(&self, exact: bool) -> String {
        Renderer::new(exact).render(self)
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xpath())
    }
}

/// Attribute of the context node
#[must_use]
pub fn attr(name: impl Into<String>) -> Expression {
    Expression::This.attr(name)
}

/// Whitespace-normalized string value of the context node
#[must_use]
pub fn normalized_text() -> Expression {
    Expression::This.string().normalize()
}

fn collect_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_of_empty_is_empty_condition() {
        assert_eq!(Expression::any_of(Vec::new()), Expression::empty());
        assert_eq!(Expression::all_of(Vec::new()), Expression::empty());
    }

    #[test]
    fn test_any_of_single() {
        let cond = attr("id").equals("a");
        assert_eq!(Expression::any_of(vec![cond.clone()]), cond);
    }

    #[test]
    fn test_union_flattens() {
        let u = Expression::descendant(["a"])
            .union(Expression::descendant(["b"]))
            .union(Expression::descendant(["c"]));
        assert!(matches!(u, Expression::Union(ref members) if members.len() == 3));
    }

    #[test]
    fn test_predicate_opt_none_keeps_expression() {
        let base = Expression::descendant(["input"]);
        assert_eq!(base.clone().predicate_opt(None), base);
    }

    #[test]
    fn test_composition_does_not_mutate_base() {
        let base = Expression::descendant(["input"]);
        let narrowed = base.clone().predicate(attr("id").equals("x"));
        assert_ne!(base, narrowed);
        assert_eq!(base.to_xpath(), ".//input");
    }

    #[test]
    fn test_rooted_at_rewrites_step_chain_only() {
        let base = Expression::descendant(["input"]).predicate(attr("type").equals("text"));
        let rooted = base.rooted_at(&Expression::descendant(["label"]));
        assert_eq!(
            rooted.to_xpath(),
            ".//label//input[(./@type = 'text')]"
        );
    }

    #[test]
    fn test_rooted_at_leaves_anywhere_alone() {
        let e = Expression::anywhere(["label"]);
        assert_eq!(e.clone().rooted_at(&Expression::descendant(["form"])), e);
    }

    #[test]
    fn test_contains_word() {
        assert_eq!(
            attr("class").contains_word("foo").to_xpath(),
            "contains(concat(' ', normalize-space(./@class), ' '), ' foo ')"
        );
    }

    #[test]
    fn test_display_matches_to_xpath() {
        let e = Expression::descendant(["a"]).predicate(attr("href"));
        assert_eq!(e.to_string(), e.to_xpath());
    }
}
