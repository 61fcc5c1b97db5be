/// Derived aggregates
///
/// Pure reductions over an entity store. Snapshots are recomputed on every
/// request and never stored.
use super::{Record, StatusTag};
use serde::Serialize;
use std::collections::BTreeMap;

/// Dashboard card figures for one entity store
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<S> {
    pub total: usize,
    /// One entry per status, zero counts included
    pub by_status: BTreeMap<&'static str, usize>,
    pub summary: S,
}

impl<S> Snapshot<S> {
    pub fn count(&self, status: &str) -> usize {
        self.by_status.get(status).copied().unwrap_or(0)
    }
}

pub fn snapshot<R: Record>(records: &[R]) -> Snapshot<R::Summary> {
    Snapshot {
        total: records.len(),
        by_status: count_by_status(records),
        summary: R::summarize(records),
    }
}

pub fn count_by_status<R: Record>(records: &[R]) -> BTreeMap<&'static str, usize> {
    let mut counts: BTreeMap<&'static str, usize> =
        R::Status::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for record in records {
        *counts.entry(record.status().as_str()).or_insert(0) += 1;
    }
    counts
}

pub fn count_status<R: Record>(records: &[R], status: R::Status) -> usize {
    records.iter().filter(|r| r.status() == status).count()
}

pub fn count_where<R>(records: &[R], pred: impl Fn(&R) -> bool) -> usize {
    records.iter().filter(|r| pred(*r)).count()
}

pub fn sum_by<R>(records: &[R], value: impl Fn(&R) -> f64) -> f64 {
    records.iter().map(value).sum()
}

pub fn sum_where<R>(
    records: &[R],
    pred: impl Fn(&R) -> bool,
    value: impl Fn(&R) -> f64,
) -> f64 {
    records.iter().filter(|r| pred(*r)).map(value).sum()
}

/// Percentage of `part` in `total`; 0 when `total` is 0
pub fn rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Round to one decimal place for display
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::payments::{Payment, PaymentStatus};
    use crate::admin::subscriptions::Subscription;
    use chrono::Utc;

    #[test]
    fn test_rate_never_divides_by_zero() {
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(7, 0), 0.0);
        assert!(rate(7, 0).is_finite());
        assert_eq!(rate(1, 4), 25.0);
        assert_eq!(rate(3, 3), 100.0);
    }

    #[test]
    fn test_status_counts_partition_total() {
        let subs = Subscription::mock_data(Utc::now());
        let counts = count_by_status(&subs);
        assert_eq!(counts.values().sum::<usize>(), subs.len());

        let payments = Payment::mock_data(Utc::now());
        let snap = snapshot(&payments);
        assert_eq!(snap.by_status.values().sum::<usize>(), snap.total);
        assert_eq!(snap.total, payments.len());
    }

    #[test]
    fn test_empty_store_snapshot() {
        let snap = snapshot::<Payment>(&[]);
        assert_eq!(snap.total, 0);
        assert_eq!(snap.count(PaymentStatus::Success.as_str()), 0);
        assert_eq!(snap.by_status.len(), PaymentStatus::ALL.len());
        assert_eq!(snap.summary.success_rate, 0.0);
    }

    #[test]
    fn test_sum_helpers() {
        let values = [1.5, 2.5, 4.0];
        assert_eq!(sum_by(&values, |v| *v), 8.0);
        assert_eq!(sum_where(&values, |v| *v > 2.0, |v| *v), 6.5);
        assert_eq!(count_where(&values, |v| *v < 3.0), 2);
        assert_eq!(round1(66.666), 66.7);
    }
}
