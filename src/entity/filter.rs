/// Filter predicate chain
use super::{Record, StatusTag};
use std::collections::{BTreeMap, BTreeSet};

/// Sentinel value that disables a categorical filter
pub const ALL: &str = "all";

/// The active filters of a list screen
///
/// Search terms are matched case-insensitively as substrings of any search
/// field; facets are matched by exact equality. Every term and every facet
/// must match for a record to be kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    search: Vec<String>,
    facets: BTreeMap<String, BTreeSet<String>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a search term; an empty term matches everything
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        if !term.is_empty() {
            let needle = term.to_lowercase();
            if !self.search.contains(&needle) {
                self.search.push(needle);
            }
        }
        self
    }

    /// Require a categorical field to equal `value`; `"all"` in any case is a no-op
    pub fn facet(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.eq_ignore_ascii_case(ALL) {
            self.facets.entry(name.into()).or_default().insert(value);
        }
        self
    }

    pub fn status<S: StatusTag>(self, status: S) -> Self {
        self.facet("status", status.as_str())
    }

    /// Conjunction of two filter states
    pub fn and(mut self, other: FilterState) -> Self {
        for term in other.search {
            if !self.search.contains(&term) {
                self.search.push(term);
            }
        }
        for (name, values) in other.facets {
            self.facets.entry(name).or_default().extend(values);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.facets.is_empty()
    }

    /// Names of the facets this filter constrains
    pub fn facet_names(&self) -> impl Iterator<Item = &str> {
        self.facets.keys().map(String::as_str)
    }

    /// Values requested for one facet
    pub fn facet_values(&self, name: &str) -> impl Iterator<Item = &str> {
        self.facets
            .get(name)
            .into_iter()
            .flat_map(|values| values.iter().map(String::as_str))
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        let fields = if self.search.is_empty() {
            Vec::new()
        } else {
            record
                .search_fields()
                .into_iter()
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        };

        let search_ok = self
            .search
            .iter()
            .all(|needle| fields.iter().any(|field| field.contains(needle.as_str())));

        search_ok
            && self.facets.iter().all(|(name, values)| {
                let actual = record.facet_value(name);
                values.iter().all(|wanted| actual == Some(wanted.as_str()))
            })
    }

    /// Stable filter: keeps input order, never duplicates or inserts
    pub fn apply<'a, R: Record>(&self, records: &'a [R]) -> Vec<&'a R> {
        records.iter().filter(|record| self.matches(*record)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::subscriptions::{Subscription, SubscriptionStatus};
    use chrono::Utc;

    fn ids<'a>(records: &[&'a Subscription]) -> Vec<&'a str> {
        records.iter().map(|s| s.id.as_str()).collect()
    }

    fn fixtures() -> Vec<Subscription> {
        Subscription::mock_data(Utc::now())
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let subs = fixtures();
        let filtered = FilterState::new().search("").facet("plan", ALL).apply(&subs);
        assert_eq!(filtered.len(), subs.len());
        for (kept, source) in filtered.iter().zip(subs.iter()) {
            assert_eq!(kept.id, source.id);
        }
    }

    #[test]
    fn test_all_sentinel_ignores_case() {
        let subs = fixtures();
        for sentinel in ["All", "ALL", "aLl"] {
            let filter = FilterState::new().facet("plan", sentinel);
            assert!(filter.is_empty());
            assert_eq!(filter.apply(&subs).len(), subs.len());
        }
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let subs = fixtures();

        let by_name = FilterState::new().search("ACME").apply(&subs);
        assert!(!by_name.is_empty());
        assert!(by_name
            .iter()
            .all(|s| s.customer_name.to_lowercase().contains("acme")
                || s.customer_email.to_lowercase().contains("acme")));

        let by_email = FilterState::new().search("@globex").apply(&subs);
        assert_eq!(ids(&by_email), vec!["sub_002"]);
    }

    #[test]
    fn test_filters_are_anded() {
        let subs = fixtures();
        let filter = FilterState::new()
            .status(SubscriptionStatus::Active)
            .facet("plan", "enterprise");
        for s in filter.apply(&subs) {
            assert_eq!(s.status, SubscriptionStatus::Active);
            assert_eq!(s.plan.as_str(), "enterprise");
        }
    }

    #[test]
    fn test_result_is_ordered_subsequence() {
        let subs = fixtures();
        let filtered = FilterState::new().search("o").apply(&subs);
        let positions: Vec<usize> = filtered
            .iter()
            .map(|s| subs.iter().position(|o| o.id == s.id).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_composition_matches_conjunction() {
        let subs = fixtures();
        let f1 = FilterState::new().search("a");
        let f2 = FilterState::new().status(SubscriptionStatus::Active);

        let first: Vec<Subscription> = f1.apply(&subs).into_iter().cloned().collect();
        let nested = ids(&f2.apply(&first));
        let combined = ids(&f1.clone().and(f2).apply(&subs));
        assert_eq!(nested, combined);
    }

    #[test]
    fn test_conflicting_facets_match_nothing() {
        let subs = fixtures();
        let filter = FilterState::new()
            .status(SubscriptionStatus::Active)
            .and(FilterState::new().status(SubscriptionStatus::Paused));
        assert!(filter.apply(&subs).is_empty());
    }

    #[test]
    fn test_unknown_facet_matches_nothing() {
        let subs = fixtures();
        let filtered = FilterState::new().facet("colour", "blue").apply(&subs);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_no_results_is_not_an_error() {
        let subs = fixtures();
        let filtered = FilterState::new().search("no such customer").apply(&subs);
        assert!(filtered.is_empty());
    }
}
