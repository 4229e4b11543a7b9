//! Form-field location.
//!
//! [`locate_field`] narrows a base fragment (e.g. `.//input`) to the fields a
//! locator names, then applies the generic attribute options in a fixed
//! order: `id`, `name`, `placeholder`, `class`.

use serde_json::Value;

use crate::options::{value_strings, Options};
use crate::xpath::{attr, normalized_text, Expression};

/// Builds the condition for one attribute option, `None` when the value
/// yields no constraint
pub type AttributeConditionBuilder = fn(&str, &Value) -> Option<Expression>;

/// Attribute options understood by [`locate_field`], in application order
pub const ATTRIBUTE_FILTERS: [(&str, AttributeConditionBuilder); 4] = [
    ("id", attribute_equals),
    ("name", attribute_equals),
    ("placeholder", attribute_equals),
    ("class", class_contains),
];

/// Compose a field query from `base`.
///
/// With a locator, `base` is constrained to nodes whose `id`, `name` or
/// `placeholder` equals it, or whose `id` is the `for` target of a `<label>`
/// with that text (and `aria-label` when enabled). Fields wrapped by such a
/// label are unioned in. Without a locator the locator constraint is empty
/// and renders as the bare base.
///
/// Label text and `aria-label` are compared with `is`: containment by
/// default, equality only when the query is rendered exact. The
/// `id`/`name`/`placeholder` comparisons are always equality.
#[must_use]
pub fn locate_field(
    base: Expression,
    locator: Option<&str>,
    options: &Options,
    enable_aria_label: bool,
) -> Expression {
    let located = match locator {
        Some(locator) => {
            let constrained = base.clone().predicate(locator_matchers(locator, enable_aria_label));
            let wrapping_label = Expression::descendant(["label"]).predicate(normalized_text().is(locator));
            constrained.union(base.rooted_at(&wrapping_label))
        }
        None => base.predicate(Expression::any_of(Vec::new())),
    };

    ATTRIBUTE_FILTERS
        .iter()
        .fold(located, |expr, (name, _)| {
            expr.predicate_opt(attribute_condition(name, options))
        })
}

/// Disjunction of everything a locator may name a field by
#[must_use]
pub fn locator_matchers(locator: &str, enable_aria_label: bool) -> Expression {
    let label_for = Expression::anywhere(["label"])
        .predicate(normalized_text().is(locator))
        .attr("for");
    let mut matchers = vec![
        attr("id").equals(locator),
        attr("name").equals(locator),
        attr("placeholder").equals(locator),
        attr("id").equals(label_for),
    ];
    if enable_aria_label {
        matchers.push(attr("aria-label").is(locator));
    }
    Expression::any_of(matchers)
}

/// Condition for one attribute option, looked up in [`ATTRIBUTE_FILTERS`].
///
/// Absent or empty options, and attributes outside the table, yield `None`.
#[must_use]
pub fn attribute_condition(attribute: &str, options: &Options) -> Option<Expression> {
    if !options.is_present(attribute) {
        return None;
    }
    let value = options.get(attribute)?;
    let (_, build) = ATTRIBUTE_FILTERS
        .iter()
        .find(|(name, _)| *name == attribute)?;
    build(attribute, value)
}

/// Equality with the option value, or with any of its values when it is a list
#[must_use]
pub fn attribute_equals(attribute: &str, value: &Value) -> Option<Expression> {
    let values = value_strings(value);
    if values.is_empty() {
        return None;
    }
    Some(attr(attribute).one_of(values))
}

fn class_contains(attribute: &str, value: &Value) -> Option<Expression> {
    let classes = value_strings(value);
    if classes.is_empty() {
        return None;
    }
    Some(Expression::all_of(
        classes
            .iter()
            .map(|class| attr(attribute).contains_word(class)),
    ))
}
