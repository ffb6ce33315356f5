//! Compiles sparse listing criteria into a conjunctive predicate.

use chrono::{DateTime, Utc};

use crate::domain::{Architecture, OperatingSystem, Release, ReleaseType};

/// Listing criteria. Every field is optional and absent fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseFilter {
    pub operating_system: Option<OperatingSystem>,
    pub architecture: Option<Architecture>,
    pub release_type: Option<ReleaseType>,
    /// Inclusive lower bound on the creation date.
    pub date_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the creation date.
    pub date_before: Option<DateTime<Utc>>,
}

/// One condition a release must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseConstraint {
    OperatingSystem(OperatingSystem),
    Architecture(Architecture),
    Type(ReleaseType),
    /// Closed range on `date`; either bound may be open.
    DateRange {
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
}

impl ReleaseConstraint {
    #[must_use]
    pub fn matches(&self, release: &Release) -> bool {
        match *self {
            Self::OperatingSystem(os) => release.environment().operating_system == os,
            Self::Architecture(arch) => release.environment().architecture == arch,
            Self::Type(kind) => release.release_type() == kind,
            Self::DateRange { from, to } => {
                let date = release.date();
                from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
            }
        }
    }
}

/// Conjunction of constraints. An empty predicate matches every release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleasePredicate {
    constraints: Vec<ReleaseConstraint>,
}

impl ReleasePredicate {
    /// Predicate that matches everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn constraints(&self) -> &[ReleaseConstraint] {
        &self.constraints
    }

    #[must_use]
    pub fn matches(&self, release: &Release) -> bool {
        self.constraints.iter().all(|c| c.matches(release))
    }
}

/// Translate criteria into a predicate, one constraint per present field.
///
/// Both date bounds fold into a single [`ReleaseConstraint::DateRange`].
///
/// # Examples
/// ```
/// use backend::domain::filter::{compile, ReleaseConstraint, ReleaseFilter};
/// use backend::domain::ReleaseType;
///
/// let predicate = compile(&ReleaseFilter {
///     release_type: Some(ReleaseType::Nightly),
///     ..ReleaseFilter::default()
/// });
/// assert_eq!(predicate.constraints(), [ReleaseConstraint::Type(ReleaseType::Nightly)]);
/// assert!(compile(&ReleaseFilter::default()).constraints().is_empty());
/// ```
#[must_use]
pub fn compile(filter: &ReleaseFilter) -> ReleasePredicate {
    let mut constraints = Vec::new();
    if let Some(kind) = filter.release_type {
        constraints.push(ReleaseConstraint::Type(kind));
    }
    if let Some(os) = filter.operating_system {
        constraints.push(ReleaseConstraint::OperatingSystem(os));
    }
    if let Some(arch) = filter.architecture {
        constraints.push(ReleaseConstraint::Architecture(arch));
    }
    if filter.date_after.is_some() || filter.date_before.is_some() {
        constraints.push(ReleaseConstraint::DateRange {
            from: filter.date_after,
            to: filter.date_before,
        });
    }
    ReleasePredicate { constraints }
}
