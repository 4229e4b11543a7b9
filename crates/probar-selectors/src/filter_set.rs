//! Reusable bundles of filters and description fragments.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::driver::Node;
use crate::filter::{Filter, FilterOptions};
use crate::options::Options;
use crate::registry::normalize_name;
use crate::result::{ProbarError, ProbarResult};

/// Description callback: renders one fragment of a failure explanation
pub type DescriptionFragment = Arc<dyn Fn(&Options) -> String + Send + Sync>;

/// A named set of filters plus the description fragments that explain them
#[derive(Clone, Default)]
pub struct FilterSet {
    name: String,
    filters: HashMap<String, Filter>,
    descriptions: Vec<DescriptionFragment>,
}

impl FilterSet {
    /// Create an empty filter set
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: HashMap::new(),
            descriptions: Vec::new(),
        }
    }

    /// Set name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Define a filter, replacing any filter with the same name
    pub fn filter<F>(&mut self, name: impl Into<String>, options: FilterOptions, matcher: F) -> &mut Self
    where
        F: Fn(&dyn Node, &Value, &Options) -> bool + Send + Sync + 'static,
    {
        self.add_filter(Filter::new(name, options, matcher))
    }

    /// Store a filter, replacing any filter with the same name
    pub fn add_filter(&mut self, filter: Filter) -> &mut Self {
        let _ = self.filters.insert(filter.name().to_string(), filter);
        self
    }

    /// Append a description fragment
    pub fn describe<F>(&mut self, fragment: F) -> &mut Self
    where
        F: Fn(&Options) -> String + Send + Sync + 'static,
    {
        self.descriptions.push(Arc::new(fragment));
        self
    }

    /// Append an already shared description fragment
    pub fn add_description(&mut self, fragment: DescriptionFragment) -> &mut Self {
        self.descriptions.push(fragment);
        self
    }

    /// Filter by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Filter> {
        self.filters.get(name)
    }

    /// All filters keyed by name
    #[must_use]
    pub fn filters(&self) -> &HashMap<String, Filter> {
        &self.filters
    }

    /// Description fragments in registration order
    #[must_use]
    pub fn descriptions(&self) -> &[DescriptionFragment] {
        &self.descriptions
    }

    /// Copy filters and every description fragment from `other`.
    ///
    /// With `names`, only the listed filters are copied; the description
    /// fragments are still copied in full.
    pub fn merge(&mut self, other: &FilterSet, names: Option<&[&str]>) -> &mut Self {
        for (name, filter) in &other.filters {
            if names.map_or(true, |wanted| wanted.contains(&name.as_str())) {
                let _ = self.filters.insert(name.clone(), filter.clone());
            }
        }
        if let Some(wanted) = names {
            for missing in wanted.iter().filter(|n| !other.filters.contains_key(**n)) {
                tracing::debug!(set = %other.name, filter = %missing, "requested filter not in set");
            }
        }
        self.descriptions
            .extend(other.descriptions.iter().cloned());
        self
    }

    /// Join every non-empty description fragment with single spaces
    #[must_use]
    pub fn description(&self, options: &Options) -> String {
        self.descriptions
            .iter()
            .map(|fragment| fragment(options))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Filters ordered by name
    #[must_use]
    pub fn sorted_filters(&self) -> Vec<&Filter> {
        let mut filters: Vec<&Filter> = self.filters.values().collect();
        filters.sort_by(|a, b| a.name().cmp(b.name()));
        filters
    }

    /// Validate every option value a filter in this set would act on.
    ///
    /// Filters are checked in name order, so the error always names the
    /// same filter for the same options.
    pub fn validate(&self, options: &Options) -> ProbarResult<()> {
        for filter in self.sorted_filters() {
            filter.validate(options.get(filter.name()))?;
        }
        Ok(())
    }

    /// Whether `node` passes every filter, for options already checked by
    /// [`FilterSet::validate`]
    #[must_use]
    pub fn accepts(&self, node: &dyn Node, options: &Options) -> bool {
        self.sorted_filters()
            .into_iter()
            .all(|filter| filter.accepts(node, options.get(filter.name()), options))
    }

    /// Whether `node` passes every filter for the supplied options.
    ///
    /// An invalid value is reported even when another filter rejects the node.
    pub fn matches(&self, node: &dyn Node, options: &Options) -> ProbarResult<bool> {
        self.validate(options)?;
        Ok(self.accepts(node, options))
    }
}

impl fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.filters.keys().collect();
        names.sort();
        f.debug_struct("FilterSet")
            .field("name", &self.name)
            .field("filters", &names)
            .field("descriptions", &self.descriptions.len())
            .finish()
    }
}

/// Named registry of shared filter sets
#[derive(Debug, Default, Clone)]
pub struct FilterSetRegistry {
    sets: HashMap<String, FilterSet>,
}

impl FilterSetRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the set with this name, creating it when absent
    pub fn add(&mut self, name: &str) -> &mut FilterSet {
        let key = normalize_name(name);
        self.sets.entry(key).or_insert_with_key(|key| {
            tracing::debug!(set = %key, "filter set created");
            FilterSet::new(key.clone())
        })
    }

    /// Fetch or create a set and configure it
    pub fn define<F>(&mut self, name: &str, configure: F) -> &FilterSet
    where
        F: FnOnce(&mut FilterSet),
    {
        let set = self.add(name);
        configure(&mut *set);
        set
    }

    /// Look up a set by name
    pub fn get(&self, name: &str) -> ProbarResult<&FilterSet> {
        self.sets
            .get(&normalize_name(name))
            .ok_or_else(|| ProbarError::UnknownFilterSet {
                name: name.to_string(),
            })
    }

    /// Whether a set is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sets.contains_key(&normalize_name(name))
    }

    /// Remove a set; absent names are ignored
    pub fn remove(&mut self, name: &str) -> Option<FilterSet> {
        self.sets.remove(&normalize_name(name))
    }

    /// All registered sets
    #[must_use]
    pub fn all(&self) -> &HashMap<String, FilterSet> {
        &self.sets
    }
}
