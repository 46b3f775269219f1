use crate::models::Asset;
use time::UtcDateTime;

/// How a filter bound compares against the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Comparison {
    /// `value > bound`
    #[default]
    Strict,
    /// `value >= bound`
    Inclusive,
}

impl Comparison {
    pub(crate) fn operator(self) -> &'static str {
        match self {
            Self::Strict => ">",
            Self::Inclusive => ">=",
        }
    }

    fn holds<T: PartialOrd>(self, value: &T, bound: &T) -> bool {
        match self {
            Self::Strict => value > bound,
            Self::Inclusive => value >= bound,
        }
    }
}

/// What happens when both a revision and a timestamp bound are supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Combine {
    /// Both bounds must hold.
    #[default]
    All,
    /// Only the timestamp bound is applied; the revision bound is dropped.
    LastWins,
}

/// A single active predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Revision(i64),
    LastUpdate(UtcDateTime),
}

/// Filter for listing assets.
///
/// An empty filter matches every asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetFilter {
    pub revision: Option<i64>,
    pub last_update: Option<UtcDateTime>,
    pub comparison: Comparison,
    pub combine: Combine,
}

impl AssetFilter {
    pub fn revision_greater_than(revision: i64) -> Self {
        Self { revision: Some(revision), ..Self::default() }
    }

    pub fn last_update_greater_than(last_update: UtcDateTime) -> Self {
        Self { last_update: Some(last_update), ..Self::default() }
    }

    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn with_combine(mut self, combine: Combine) -> Self {
        self.combine = combine;
        self
    }

    /// The predicates that are actually in effect, after the [`Combine`]
    /// policy has been applied.
    pub fn predicates(&self) -> Vec<Predicate> {
        let revision = self.revision.map(Predicate::Revision);
        let last_update = self.last_update.map(Predicate::LastUpdate);
        match (self.combine, revision, last_update) {
            (Combine::LastWins, _, Some(last_update)) => vec![last_update],
            (_, revision, last_update) => revision.into_iter().chain(last_update).collect(),
        }
    }

    /// In-memory evaluation of the filter, equivalent to the SQL the
    /// repository generates.
    pub fn matches(&self, asset: &Asset) -> bool {
        self.predicates().iter().all(|predicate| match predicate {
            Predicate::Revision(bound) => self.comparison.holds(&asset.revision, bound),
            // Stored timestamps only have one-second resolution.
            Predicate::LastUpdate(bound) => self
                .comparison
                .holds(&asset.last_update.unix_timestamp(), &bound.unix_timestamp()),
        })
    }
}
