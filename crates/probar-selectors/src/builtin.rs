//! Built-in selectors.
//!
//! [`register`] installs the standard catalogue (`field`, `link`, `button`,
//! ...) and the shared `_field` filter set into a registry. Registration order
//! matters for auto-detection: earlier selectors are asked first.

use std::sync::{Mutex, PoisonError};

use regex::Regex;
use serde_json::Value;

use crate::driver::Node;
use crate::field::{attribute_equals, locate_field};
use crate::filter::{FilterOptions, FilterType};
use crate::filter_set::FilterSet;
use crate::options::{inspect, is_truthy, value_strings, Options};
use crate::registry::SelectorRegistry;
use crate::result::{ProbarError, ProbarResult};
use crate::selector::XPathGenerator;
use crate::xpath::{attr, normalized_text, Expression};

/// Name of the shared form-field filter set
pub const FIELD_FILTER_SET: &str = "_field";

/// Locators claimed by the `id` selector
pub const ID_LOCATOR_PATTERN: &str = r"^#[A-Za-z_][\w-]*$";

/// Install the built-in filter sets and selectors
pub fn register(registry: &mut SelectorRegistry) -> ProbarResult<()> {
    let aria = registry.config().enable_aria_label;
    let _ = registry
        .filter_sets_mut()
        .define(FIELD_FILTER_SET, field_filters);

    registry.add("xpath", |s| {
        s.xpath(&[], |locator, _| Expression::raw(locator.unwrap_or_default()));
        Ok(())
    })?;

    registry.add("css", |s| {
        s.css(&[], |locator, _| locator.unwrap_or_default().to_string());
        Ok(())
    })?;

    let id_pattern = Regex::new(ID_LOCATOR_PATTERN).map_err(|e| ProbarError::InvalidPattern {
        pattern: ID_LOCATOR_PATTERN.to_string(),
        message: e.to_string(),
    })?;
    registry.add("id", move |s| {
        s.xpath(&[], |locator, _| {
            let id = locator.unwrap_or_default();
            Expression::descendant(["*"]).predicate(attr("id").equals(id.strip_prefix('#').unwrap_or(id)))
        })
        .match_when(move |locator| id_pattern.is_match(locator));
        Ok(())
    })?;

    registry.add("field", |s| {
        s.xpath(&["id", "name", "placeholder", "type", "class"], move |locator, options| {
            let mut base = Expression::descendant(["input", "textarea", "select"])
                .predicate(attr("type").one_of(["submit", "image", "hidden"]).not());
            if let Some(ty) = first_string(options, "type") {
                base = if matches!(ty.as_str(), "textarea" | "select") {
                    Expression::descendant([ty])
                } else {
                    base.predicate(attr("type").equals(ty))
                };
            }
            locate_field(base, locator, options, aria)
        })
        .filter_set(FIELD_FILTER_SET, None)?
        .filter("readonly", FilterOptions::boolean(), |node, value, _| {
            value.as_bool() == Some(node.is_readonly())
        })
        .filter("with", pattern_options(), {
            let patterns = PatternCache::default();
            move |node, value, _| value_matches(&patterns, node.value().as_deref(), value)
        })
        .describe(|options| {
            let mut parts = describe_attributes(options, &["id", "name", "placeholder", "class"]);
            if let Some(ty) = options.get("type").filter(|v| is_truthy(v)) {
                parts.push(format!("of type {}", inspect(ty)));
            }
            parts.extend(describe_with(options));
            parts.join(" ")
        });
        Ok(())
    })?;

    registry.add("fieldset", |s| {
        s.xpath(&["legend"], |locator, options| {
            let mut xpath = Expression::descendant(["fieldset"]);
            if let Some(locator) = locator {
                xpath = xpath.predicate(
                    attr("id")
                        .equals(locator)
                        .or(legend_is(locator)),
                );
            }
            if let Some(legend) = first_string(options, "legend") {
                xpath = xpath.predicate(legend_is(&legend));
            }
            xpath
        });
        Ok(())
    })?;

    registry.add("link", |s| {
        s.xpath(&["title", "alt"], move |locator, options| {
            let has_href = attr("href");
            let mut xpath = Expression::descendant(["a"]);
            xpath = match options.get("href") {
                Some(href) if !is_truthy(href) => xpath.predicate(has_href.not()),
                _ => xpath.predicate(has_href),
            };
            if let Some(locator) = locator {
                let mut matchers = vec![
                    attr("id").equals(locator),
                    normalized_text().is(locator),
                    attr("title").is(locator),
                    Expression::descendant(["img"]).predicate(attr("alt").is(locator)),
                ];
                if aria {
                    matchers.push(attr("aria-label").is(locator));
                }
                xpath = xpath.predicate(Expression::any_of(matchers));
            }
            xpath = xpath.predicate_opt(present_equals(options, "title"));
            if let Some(alt) = first_string(options, "alt") {
                xpath = xpath.predicate(Expression::descendant(["img"]).predicate(attr("alt").equals(alt)));
            }
            xpath
        })
        .filter("href", pattern_options(), {
            let patterns = PatternCache::default();
            move |node, value, _| match value {
                Value::Null | Value::Bool(_) => true,
                other => value_matches(&patterns, node.attribute("href").as_deref(), other),
            }
        })
        .describe(|options| match options.get("href") {
            Some(href) if is_truthy(href) && !href.is_boolean() => format!("with href {}", inspect(href)),
            Some(href) if !is_truthy(href) => "and no href attribute".to_string(),
            _ => String::new(),
        });
        Ok(())
    })?;

    registry.add("button", |s| {
        s.xpath(&["id", "value", "title"], move |locator, options| {
            let mut input_button = Expression::descendant(["input"])
                .predicate(attr("type").one_of(["submit", "reset", "image", "button"]));
            let mut button = Expression::descendant(["button"]);
            let mut image_button = Expression::descendant(["input"]).predicate(attr("type").equals("image"));

            if let Some(locator) = locator {
                let mut locator_matches = attr("id")
                    .equals(locator)
                    .or(attr("value").is(locator))
                    .or(attr("title").is(locator));
                let mut alt_matches = attr("alt").is(locator);
                if aria {
                    locator_matches = locator_matches.or(attr("aria-label").is(locator));
                    alt_matches = alt_matches.or(attr("aria-label").is(locator));
                }
                input_button = input_button.predicate(locator_matches.clone());
                button = button.predicate(
                    locator_matches
                        .or(normalized_text().is(locator))
                        .or(Expression::descendant(["img"]).predicate(attr("alt").is(locator))),
                );
                image_button = image_button.predicate(alt_matches);
            }

            let union = input_button.union(button).union(image_button);
            narrow_by_attributes(union, &["id", "value", "title"], options)
        })
        .filter("disabled", disabled_options(), |node, value, _| {
            value.as_bool() == Some(node.is_disabled())
        })
        .describe(|options| {
            let mut parts = Vec::new();
            if options.get_bool("disabled") == Some(true) {
                parts.push("that is disabled".to_string());
            }
            parts.extend(describe_attributes(options, &["id", "value", "title"]));
            parts.join(" ")
        });
        Ok(())
    })?;

    let link = xpath_generator(registry, "link")?;
    let button = xpath_generator(registry, "button")?;
    registry.add("link_or_button", move |s| {
        s.label("link or button")
            .xpath(&[], move |locator, options| {
                link(locator, options).union(button(locator, options))
            })
            .filter("disabled", disabled_options(), |node, value, _| {
                node.tag_name() == "a" || value.as_bool() == Some(node.is_disabled())
            })
            .describe(|options| {
                if options.get_bool("disabled") == Some(true) {
                    "that is disabled".to_string()
                } else {
                    String::new()
                }
            });
        Ok(())
    })?;

    registry.add("fillable_field", |s| {
        s.label("field")
            .xpath(&["id", "name", "placeholder", "class"], move |locator, options| {
                let base = Expression::descendant(["input", "textarea"]).predicate(
                    attr("type")
                        .one_of(["submit", "image", "radio", "checkbox", "hidden", "file"])
                        .not(),
                );
                locate_field(base, locator, options, aria)
            })
            .filter_set(FIELD_FILTER_SET, Some(&["disabled"]))?
            .filter("with", pattern_options(), {
                let patterns = PatternCache::default();
                move |node, value, _| value_matches(&patterns, node.value().as_deref(), value)
            })
            .describe(|options| {
                let mut parts = describe_attributes(options, &["id", "name", "placeholder", "class"]);
                parts.extend(describe_with(options));
                parts.join(" ")
            });
        Ok(())
    })?;

    for (name, label, input_type) in [
        ("radio_button", "radio button", "radio"),
        ("checkbox", "checkbox", "checkbox"),
    ] {
        registry.add(name, move |s| {
            s.label(label)
                .xpath(&["id", "name", "class"], move |locator, options| {
                    let base = Expression::descendant(["input"]).predicate(attr("type").equals(input_type));
                    locate_field(base, locator, options, aria)
                })
                .filter_set(FIELD_FILTER_SET, Some(&["checked", "unchecked", "disabled"]))?
                .filter("option", pattern_options(), {
                    let patterns = PatternCache::default();
                    move |node, value, _| value_matches(&patterns, node.value().as_deref(), value)
                })
                .describe(|options| {
                    let mut parts = describe_attributes(options, &["id", "name", "class"]);
                    if let Some(option) = options.get("option") {
                        parts.push(format!("with value {}", inspect(option)));
                    }
                    parts.join(" ")
                });
            Ok(())
        })?;
    }

    registry.add("select", |s| {
        s.label("select box")
            .xpath(&["id", "name", "placeholder", "class"], move |locator, options| {
                locate_field(Expression::descendant(["select"]), locator, options, aria)
            })
            .filter_set(FIELD_FILTER_SET, Some(&["disabled", "multiple"]))?
            .filter("options", FilterOptions::new(), |node, value, _| {
                sorted(option_texts(node, false)) == sorted(value_strings(value))
            })
            .filter("with_options", FilterOptions::new(), |node, value, _| {
                let actual = option_texts(node, false);
                value_strings(value).iter().all(|wanted| actual.contains(wanted))
            })
            .filter("selected", FilterOptions::new(), |node, value, _| {
                sorted(option_texts(node, true)) == sorted(value_strings(value))
            })
            .describe(|options| {
                let mut parts = describe_attributes(options, &["id", "name", "placeholder", "class"]);
                if let Some(wanted) = options.get("options") {
                    parts.push(format!("with options {}", inspect(wanted)));
                }
                if let Some(wanted) = options.get("with_options") {
                    parts.push(format!("with at least options {}", inspect(wanted)));
                }
                if let Some(selected) = options.get("selected") {
                    parts.push(format!("with {} selected", inspect(selected)));
                }
                parts.join(" ")
            });
        Ok(())
    })?;

    registry.add("option", |s| {
        s.xpath(&[], |locator, _| {
            Expression::descendant(["option"]).predicate_opt(locator.map(|l| normalized_text().is(l)))
        })
        .filter("disabled", FilterOptions::boolean(), |node, value, _| {
            value.as_bool() == Some(node.is_disabled())
        })
        .filter("selected", FilterOptions::boolean(), |node, value, _| {
            value.as_bool() == Some(node.is_selected())
        })
        .describe(|options| {
            ["disabled", "selected"]
                .iter()
                .filter_map(|state| {
                    options.get_bool(state).map(|on| {
                        if on {
                            format!("that is {state}")
                        } else {
                            format!("that is not {state}")
                        }
                    })
                })
                .collect::<Vec<_>>()
                .join(" ")
        });
        Ok(())
    })?;

    registry.add("file_field", |s| {
        s.label("file field")
            .xpath(&["id", "name", "class"], move |locator, options| {
                let base = Expression::descendant(["input"]).predicate(attr("type").equals("file"));
                locate_field(base, locator, options, aria)
            })
            .filter_set(FIELD_FILTER_SET, Some(&["disabled", "multiple"]))?
            .describe(|options| describe_attributes(options, &["id", "name", "class"]).join(" "));
        Ok(())
    })?;

    registry.add("label", |s| {
        s.xpath(&[], |locator, _| {
            Expression::descendant(["label"]).predicate_opt(
                locator.map(|l| normalized_text().is(l).or(attr("id").equals(l))),
            )
        });
        Ok(())
    })?;

    registry.add("table", |s| {
        s.xpath(&["caption"], |locator, options| {
            let caption = || Expression::descendant(["caption"]).string().normalize();
            let mut xpath = Expression::descendant(["table"]);
            if let Some(locator) = locator {
                xpath = xpath.predicate(attr("id").equals(locator).or(caption().is(locator)));
            }
            if let Some(text) = first_string(options, "caption") {
                xpath = xpath.predicate(caption().equals(text));
            }
            xpath
        });
        Ok(())
    })?;

    registry.add("frame", |s| {
        s.xpath(&["name"], |locator, options| {
            let xpath = Expression::descendant(["iframe"])
                .union(Expression::descendant(["frame"]))
                .predicate_opt(locator.map(|l| attr("id").equals(l).or(attr("name").equals(l))));
            narrow_by_attributes(xpath, &["name"], options)
        });
        Ok(())
    })?;

    tracing::debug!(selectors = registry.names().len(), "built-in selectors registered");
    Ok(())
}

fn field_filters(set: &mut FilterSet) {
    set.filter("checked", FilterOptions::boolean(), |node, value, _| {
        value.as_bool() == Some(node.is_checked())
    })
    .filter("unchecked", FilterOptions::boolean(), |node, value, _| {
        value.as_bool() == Some(!node.is_checked())
    })
    .filter("disabled", disabled_options(), |node, value, _| {
        value.as_bool() == Some(node.is_disabled())
    })
    .filter("multiple", FilterOptions::boolean(), |node, value, _| {
        value.as_bool() == Some(node.is_multiple())
    })
    .describe(|options| {
        let checked = options.get_bool("checked");
        let unchecked = options.get_bool("unchecked");
        let mut states = Vec::new();
        if checked == Some(true) || unchecked == Some(false) {
            states.push("checked");
        }
        if unchecked == Some(true) || checked == Some(false) {
            states.push("not checked");
        }
        if options.get_bool("disabled") == Some(true) {
            states.push("disabled");
        }
        let mut parts = Vec::new();
        if !states.is_empty() {
            parts.push(format!("that is {}", states.join(" and ")));
        }
        match options.get_bool("multiple") {
            Some(true) => parts.push("with the multiple attribute".to_string()),
            Some(false) => parts.push("without the multiple attribute".to_string()),
            None => {}
        }
        parts.join(" ")
    });
}

fn disabled_options() -> FilterOptions {
    FilterOptions::boolean().default_value(false).skip_if("all")
}

fn xpath_generator(registry: &SelectorRegistry, name: &str) -> ProbarResult<XPathGenerator> {
    registry
        .get(name)?
        .xpath_generator()
        .cloned()
        .ok_or_else(|| ProbarError::NoExpressionGenerator {
            selector: name.to_string(),
        })
}

fn legend_is(text: &str) -> Expression {
    Expression::this()
        .child(["legend"])
        .predicate(normalized_text().is(text))
}

fn first_string(options: &Options, key: &str) -> Option<String> {
    if !options.is_present(key) {
        return None;
    }
    options.get_strings(key).into_iter().next()
}

fn present_equals(options: &Options, key: &str) -> Option<Expression> {
    if !options.is_present(key) {
        return None;
    }
    attribute_equals(key, options.get(key)?)
}

fn narrow_by_attributes(xpath: Expression, names: &[&str], options: &Options) -> Expression {
    names
        .iter()
        .fold(xpath, |xpath, name| xpath.predicate_opt(present_equals(options, name)))
}

fn pattern_options() -> FilterOptions {
    FilterOptions::new().with_type(FilterType::Pattern)
}

/// Last compiled `{"pattern": ...}` regex of one filter.
///
/// Resolution applies the same option value to every candidate, so the
/// pattern is compiled once per distinct value instead of once per node.
#[derive(Default)]
struct PatternCache(Mutex<Option<(String, Regex)>>);

impl PatternCache {
    fn is_match(&self, pattern: &str, haystack: &str) -> bool {
        let mut last = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_ref().map_or(true, |(cached, _)| cached != pattern) {
            // Invalid patterns are rejected by filter validation.
            let Ok(re) = Regex::new(pattern) else {
                return false;
            };
            *last = Some((pattern.to_string(), re));
        }
        last.as_ref().is_some_and(|(_, re)| re.is_match(haystack))
    }
}

/// Compare a node value with an option: a string, or `{"pattern": "..."}`
fn value_matches(patterns: &PatternCache, actual: Option<&str>, expected: &Value) -> bool {
    match expected {
        Value::Object(map) => match map.get("pattern").and_then(Value::as_str) {
            Some(pattern) => patterns.is_match(pattern, actual.unwrap_or_default()),
            None => false,
        },
        Value::String(s) => actual == Some(s.as_str()),
        Value::Null => actual.is_none(),
        other => actual == Some(other.to_string().as_str()),
    }
}

fn option_texts(node: &dyn Node, selected_only: bool) -> Vec<String> {
    let mut texts = Vec::new();
    for child in node.child_nodes() {
        if child.tag_name() == "option" {
            if !selected_only || child.is_selected() {
                texts.push(child.text());
            }
        } else {
            texts.extend(option_texts(child, selected_only));
        }
    }
    texts
}

fn sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values
}

fn describe_attributes(options: &Options, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .filter_map(|name| {
            options.get(name).map(|value| match value {
                Value::String(s) => format!("with {name} {s}"),
                other => format!("with {name} {}", inspect(other)),
            })
        })
        .collect()
}

fn describe_with(options: &Options) -> Option<String> {
    options.get("with").map(|with| match with {
        Value::String(_) => format!("with value {}", inspect(with)),
        Value::Object(map) => match map.get("pattern").and_then(Value::as_str) {
            Some(pattern) => format!("with value matching /{pattern}/"),
            None => format!("with value {}", inspect(with)),
        },
        other => format!("with value {}", inspect(&Value::from(other.to_string()))),
    })
}
