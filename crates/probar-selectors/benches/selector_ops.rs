//! Selector Operations Benchmarks
//!
//! Benchmarks for query synthesis, XPath rendering, filter application and
//! end-to-end resolution against the mock evaluator.
//!
//! Run with: `cargo bench --bench selector_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use probar_selectors::prelude::*;
use serde_json::json;

fn registry() -> SelectorRegistry {
    SelectorRegistry::with_builtins(SelectorConfig::default()).unwrap()
}

fn bench_query_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_synthesis");
    let registry = registry();

    let cases = vec![
        ("field", Some("Email")),
        ("field_no_locator", None),
        ("link", Some("Home")),
        ("button", Some("Save")),
        ("link_or_button", Some("Continue")),
        ("select", Some("Country")),
    ];

    for (name, locator) in cases {
        let selector_name = name.trim_end_matches("_no_locator");
        let selector = registry.get(selector_name).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &locator, |bench, loc| {
            bench.iter(|| {
                let query = selector.call(black_box(*loc), &Options::new()).unwrap();
                black_box(query);
            });
        });
    }

    group.finish();
}

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("xpath_rendering");
    let registry = registry();
    let options = Options::new().with("class", json!(["primary", "wide"]));

    for exact in [false, true] {
        let query = registry
            .get("field")
            .unwrap()
            .call(Some("Email"), &options)
            .unwrap();
        group.bench_with_input(BenchmarkId::new("field", exact), &exact, |bench, exact| {
            bench.iter(|| black_box(query.render(*exact)));
        });
    }

    let literals = vec![
        ("plain", "Dog"),
        ("single_quote", "Dog's"),
        ("both_quotes", r#"say "Dog's""#),
    ];
    for (name, literal) in literals {
        group.bench_with_input(BenchmarkId::new("literal", name), &literal, |bench, lit| {
            bench.iter(|| black_box(probar_selectors::quote_literal(black_box(lit))));
        });
    }

    group.finish();
}

fn bench_filter_application(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_application");
    let registry = registry();
    let checkbox = registry.get("checkbox").unwrap();
    let node = ElementHandle::new("c", "input")
        .with_attribute("type", "checkbox")
        .with_attribute("value", "yes")
        .with_flag("checked");

    let cases = vec![
        ("no_options", Options::new()),
        ("checked", Options::new().with("checked", true)),
        (
            "checked_option",
            Options::new().with("checked", true).with("option", "yes"),
        ),
        ("skip_disabled", Options::new().with("disabled", "all")),
    ];

    for (name, options) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &options, |bench, opts| {
            bench.iter(|| black_box(checkbox.matches_filters(&node, opts).unwrap()));
        });
    }

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    let registry = registry();

    for count in [10_usize, 100, 1000] {
        let mut driver = MockDriver::new();
        for i in 0..count {
            let mut el = ElementHandle::new(format!("cb{i}"), "input").with_attribute("type", "checkbox");
            if i % 2 == 0 {
                el = el.with_flag("checked");
            }
            driver.add_element(el);
        }
        let resolver = Resolver::new(&registry, &driver);
        let options = Options::new().with("checked", true);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bench, _| {
            bench.iter(|| {
                let found = resolver.find_all("checkbox", None, &options).unwrap();
                black_box(found);
            });
        });
    }

    group.finish();
}

fn bench_registration(c: &mut Criterion) {
    c.bench_function("register_builtins", |bench| {
        bench.iter(|| black_box(registry()));
    });
}

criterion_group!(
    benches,
    bench_query_synthesis,
    bench_rendering,
    bench_filter_application,
    bench_resolution,
    bench_registration,
);
criterion_main!(benches);
