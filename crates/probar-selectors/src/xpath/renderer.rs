//! XPath 1.0 serialization of expression trees.
//!
//! Conditions that serialize to an empty string are dropped: a predicate
//! over an empty condition renders as the bare base expression (never
//! `base[]`), and an empty operand of `and`/`or` leaves the other operand.
//! Functions and comparisons over an empty operand render empty themselves,
//! so the emptiness reaches the enclosing predicate.

use super::expression::Expression;

/// Renders expressions to XPath text
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    exact: bool,
}

impl Renderer {
    /// Create a renderer; `exact` turns `is` into equality instead of containment
    #[must_use]
    pub const fn new(exact: bool) -> Self {
        Self { exact }
    }

    /// Whether `is` renders as equality
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        self.exact
    }

    /// Render an expression
    #[must_use]
    pub fn render(&self, expr: &Expression) -> String {
        match expr {
            Expression::This => ".".to_string(),
            Expression::Anywhere(names) => element_step("//", names),
            Expression::Descendant { on, names } => {
                element_step(&format!("{}//", self.render(on)), names)
            }
            Expression::Child { on, names } => {
                element_step(&format!("{}/", self.render(on)), names)
            }
            Expression::Where { on, condition } => self.where_(on, condition),
            Expression::Attribute { on, name } => format!("{}/@{name}", self.render(on)),
            Expression::Literal(value) => quote_literal(value),
            Expression::Raw(xpath) => xpath.clone(),
            Expression::StringOf(on) => self.call("string", &[on.as_ref()]),
            Expression::NormalizeSpace(on) => self.call("normalize-space", &[on.as_ref()]),
            Expression::Equality(a, b) => self.equality(a, b),
            Expression::Contains(a, b) => self.contains(a, b),
            Expression::Is(a, b) => {
                if self.exact {
                    self.equality(a, b)
                } else {
                    self.contains(a, b)
                }
            }
            Expression::And(a, b) => self.binary("and", a, b),
            Expression::Or(a, b) => self.binary("or", a, b),
            Expression::Not(e) => self.call("not", &[e.as_ref()]),
            Expression::Union(members) => {
                let rendered: Vec<String> = members
                    .iter()
                    .map(|m| self.render(m))
                    .filter(|s| !s.is_empty())
                    .collect();
                match rendered.len() {
                    0 => String::new(),
                    1 => rendered.into_iter().next().unwrap_or_default(),
                    _ => format!("({})", rendered.join(" | ")),
                }
            }
            Expression::Concat(parts) => {
                let parts: Vec<&Expression> = parts.iter().collect();
                self.call("concat", &parts)
            }
        }
    }

    fn where_(&self, on: &Expression, condition: &Expression) -> String {
        let on = self.render(on);
        let condition = self.render(condition);
        if condition.is_empty() {
            on
        } else {
            format!("{on}[{condition}]")
        }
    }

    fn equality(&self, a: &Expression, b: &Expression) -> String {
        let (a, b) = (self.render(a), self.render(b));
        if a.is_empty() || b.is_empty() {
            String::new()
        } else {
            format!("({a} = {b})")
        }
    }

    fn contains(&self, a: &Expression, b: &Expression) -> String {
        self.call("contains", &[a, b])
    }

    /// Function call; empty when any argument renders empty
    fn call(&self, function: &str, args: &[&Expression]) -> String {
        let mut rendered = Vec::with_capacity(args.len());
        for arg in args {
            let arg = self.render(arg);
            if arg.is_empty() {
                return String::new();
            }
            rendered.push(arg);
        }
        format!("{function}({})", rendered.join(", "))
    }

    fn binary(&self, op: &str, a: &Expression, b: &Expression) -> String {
        let a = self.render(a);
        let b = self.render(b);
        match (a.is_empty(), b.is_empty()) {
            (true, _) => b,
            (_, true) => a,
            _ => format!("({a} {op} {b})"),
        }
    }
}

fn element_step(prefix: &str, names: &[String]) -> String {
    match names {
        [] => format!("{prefix}*"),
        [name] => format!("{prefix}{name}"),
        _ => {
            let alternatives: Vec<String> = names.iter().map(|n| format!("self::{n}")).collect();
            format!("{prefix}*[{}]", alternatives.join(" | "))
        }
    }
}

/// Quote a string as an XPath literal.
///
/// XPath 1.0 has no escape sequences, so values holding both quote kinds
/// are split and joined with `concat()`.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{part}'"))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::expression::{attr, normalized_text};

    mod step_tests {
        use super::*;

        #[test]
        fn test_single_descendant() {
            assert_eq!(Expression::descendant(["input"]).to_xpath(), ".//input");
        }

        #[test]
        fn test_multiple_descendants() {
            assert_eq!(
                Expression::descendant(["input", "textarea"]).to_xpath(),
                ".//*[self::input | self::textarea]"
            );
        }

        #[test]
        fn test_anywhere() {
            assert_eq!(Expression::anywhere(["label"]).to_xpath(), "//label");
        }

        #[test]
        fn test_child_and_attribute() {
            let e = Expression::descendant(["select"])
                .child(["option"])
                .attr("value");
            assert_eq!(e.to_xpath(), ".//select/option/@value");
        }

        #[test]
        fn test_wildcard_when_no_names() {
            let names: Vec<String> = Vec::new();
            assert_eq!(Expression::descendant(names).to_xpath(), ".//*");
        }
    }

    mod condition_tests {
        use super::*;

        #[test]
        fn test_equality() {
            let e = Expression::descendant(["input"]).predicate(attr("id").equals("Dog"));
            assert_eq!(e.to_xpath(), ".//input[(./@id = 'Dog')]");
        }

        #[test]
        fn test_is_partial_and_exact() {
            let e = normalized_text().is("Dog");
            assert_eq!(
                e.to_xpath_exact(false),
                "contains(normalize-space(string(.)), 'Dog')"
            );
            assert_eq!(
                e.to_xpath_exact(true),
                "(normalize-space(string(.)) = 'Dog')"
            );
        }

        #[test]
        fn test_or_and_not() {
            let e = attr("a").equals("1").or(attr("b").equals("2")).not();
            assert_eq!(e.to_xpath(), "not(((./@a = '1') or (./@b = '2')))");
        }

        #[test]
        fn test_one_of() {
            let e = attr("type").one_of(["submit", "image"]);
            assert_eq!(
                e.to_xpath(),
                "((./@type = 'submit') or (./@type = 'image'))"
            );
        }

        #[test]
        fn test_union() {
            let e = Expression::descendant(["a"]).union(Expression::descendant(["b"]));
            assert_eq!(e.to_xpath(), "(.//a | .//b)");
        }
    }

    mod empty_condition_tests {
        use super::*;

        #[test]
        fn test_empty_predicate_renders_base() {
            let e = Expression::descendant(["input"]).predicate(Expression::any_of(vec![]));
            assert_eq!(e.to_xpath(), ".//input");
            assert!(!e.to_xpath().contains("[]"));
        }

        #[test]
        fn test_raw_empty_predicate_renders_base() {
            let e = Expression::descendant(["input"]).predicate(Expression::raw(""));
            assert_eq!(e.to_xpath(), ".//input");
        }

        #[test]
        fn test_empty_operand_dropped() {
            let e = Expression::empty().or(attr("id").equals("x"));
            assert_eq!(e.to_xpath(), "(./@id = 'x')");
            let e = attr("id").equals("x").and(Expression::empty());
            assert_eq!(e.to_xpath(), "(./@id = 'x')");
        }

        #[test]
        fn test_not_of_empty_condition_dropped() {
            let e = Expression::descendant(["input"])
                .predicate(attr("type").one_of(Vec::<String>::new()).not());
            assert_eq!(e.to_xpath(), ".//input");
        }

        #[test]
        fn test_comparisons_with_empty_operand_dropped() {
            let base = || Expression::descendant(["input"]);
            let empty = Expression::empty;
            assert_eq!(base().predicate(empty().equals("x")).to_xpath(), ".//input");
            assert_eq!(base().predicate(attr("id").equals(empty())).to_xpath(), ".//input");
            assert_eq!(base().predicate(empty().contains("x")).to_xpath(), ".//input");
            assert_eq!(base().predicate(empty().is("x")).to_xpath_exact(false), ".//input");
            assert_eq!(base().predicate(empty().is("x")).to_xpath_exact(true), ".//input");
        }

        #[test]
        fn test_functions_of_empty_operand_dropped() {
            let base = || Expression::descendant(["input"]);
            let e = base().predicate(Expression::empty().string().contains("x"));
            assert_eq!(e.to_xpath(), ".//input");
            let e = base().predicate(Expression::empty().normalize().is("x"));
            assert_eq!(e.to_xpath(), ".//input");
            let e = base().predicate(Expression::empty().contains_word("x"));
            assert_eq!(e.to_xpath(), ".//input");
            assert_eq!(Expression::Concat(vec![Expression::empty()]).to_xpath(), "");
        }

        #[test]
        fn test_empty_operand_inside_conjunction_keeps_sibling() {
            let e = Expression::descendant(["input"]).predicate(
                attr("name")
                    .equals("q")
                    .and(attr("type").one_of(Vec::<String>::new()).not()),
            );
            assert_eq!(e.to_xpath(), ".//input[(./@name = 'q')]");
        }

        #[test]
        fn test_nested_empty_predicates() {
            let e = Expression::descendant(["input"])
                .predicate(Expression::empty())
                .predicate(attr("name").equals("q"))
                .predicate(Expression::empty());
            assert_eq!(e.to_xpath(), ".//input[(./@name = 'q')]");
        }
    }

    mod literal_tests {
        use super::*;

        #[test]
        fn test_plain() {
            assert_eq!(quote_literal("Dog"), "'Dog'");
        }

        #[test]
        fn test_single_quote() {
            assert_eq!(quote_literal("Dog's"), "\"Dog's\"");
        }

        #[test]
        fn test_both_quotes() {
            assert_eq!(
                quote_literal(r#"a'b"c"#),
                r#"concat('a', "'", 'b"c')"#
            );
        }

        #[test]
        fn test_empty() {
            assert_eq!(quote_literal(""), "''");
        }
    }
}
