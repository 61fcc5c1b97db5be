/// Entity Core
///
/// The list-management pattern shared by every admin screen: an ordered
/// in-memory store of records, a filter predicate chain over it, a guarded
/// status transition table, and aggregates derived from the full store.

pub mod aggregate;
pub mod filter;
pub mod format;
pub mod store;
pub mod transition;

pub use aggregate::{rate, Snapshot};
pub use filter::FilterState;
pub use format::{format_currency, format_number};
pub use store::{EntityStore, TenantStores};
pub use transition::{Notice, StatusCatalogue, Transition, TransitionInput, TransitionOutcome};

use crate::error::{HubError, HubResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

/// Display metadata for a status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusStyle {
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,
}

impl StatusStyle {
    pub const fn new(color: &'static str, icon: &'static str) -> Self {
        Self {
            color,
            icon: Some(icon),
        }
    }

    pub const fn plain(color: &'static str) -> Self {
        Self { color, icon: None }
    }
}

/// A closed status enumeration
pub trait StatusTag:
    Copy + Eq + Hash + Debug + Serialize + Send + Sync + 'static
{
    /// Human name used in error messages ("subscription status")
    const KIND: &'static str;

    /// Every variant, in display order
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn style(&self) -> StatusStyle;

    /// Parse a wire value, case-insensitively
    fn parse(value: &str) -> HubResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| HubError::Validation(format!("Invalid {}: {}", Self::KIND, value)))
    }
}

/// An identifiable record managed by an admin screen
pub trait Record: Clone + Serialize + Send + Sync + 'static {
    type Status: StatusTag;
    type Summary: Serialize + Send;

    /// Singular entity name ("subscription")
    const ENTITY: &'static str;

    /// Collection name used in routes and metrics ("subscriptions")
    const COLLECTION: &'static str;

    /// Categorical fields a filter may target, besides `status`
    const FACETS: &'static [&'static str];

    /// `(action, undo)` pairs whose second action returns a record to where
    /// the first one took it from. Every other transition moves toward a
    /// terminal status.
    const REVERSIBLE: &'static [(&'static str, &'static str)] = &[];

    fn id(&self) -> &str;

    fn status(&self) -> Self::Status;

    /// Replace the status and bump `updated_at`
    fn set_status(&mut self, status: Self::Status, at: DateTime<Utc>);

    /// Text fields matched by the search box
    fn search_fields(&self) -> Vec<&str>;

    /// Value of a categorical field named in `FACETS`
    fn facet(&self, name: &str) -> Option<&str>;

    fn transitions() -> &'static [Transition<Self>];

    fn summarize(records: &[Self]) -> Self::Summary;

    /// Records a fresh tenant starts with when mock seeding is enabled
    fn mock_data(_now: DateTime<Utc>) -> Vec<Self> {
        Vec::new()
    }

    /// Categorical lookup including the implicit `status` facet
    fn facet_value(&self, name: &str) -> Option<&str> {
        if name == "status" {
            Some(self.status().as_str())
        } else {
            self.facet(name)
        }
    }
}
