//! Listing filters shared by the list operations.
//!
//! These mirror the common query parameters: `q`/`exact`, `visibility`,
//! `created_by`, `created_at_start`, `created_at_end`, `observatory_id`,
//! `organization_id`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    ContributorId, ObservatoryId, OrganizationId, Resource, Statement, Thing, ThingId,
    VisibilityFilter,
};
use crate::{Error, Result};

/// Parse an ISO-8601 timestamp with offset, e.g. `2023-04-12T13:05:22+02:00`.
pub fn parse_timestamp(name: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidParameter { name: name.into(), reason: e.to_string() })
}

// ============================================================================
// SearchString
// ============================================================================

/// Label search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchString {
    /// Whole label, compared case-insensitively after collapsing whitespace.
    Exact(String),
    /// Every token must appear somewhere in the label.
    Fuzzy(Vec<String>),
}

impl SearchString {
    pub fn of(q: &str, exact: bool) -> Self {
        let normalized = normalize(q);
        if exact {
            SearchString::Exact(normalized)
        } else {
            SearchString::Fuzzy(normalized.split(' ').filter(|t| !t.is_empty()).map(String::from).collect())
        }
    }

    pub fn matches(&self, label: &str) -> bool {
        let label = normalize(label);
        match self {
            SearchString::Exact(term) => label == *term,
            SearchString::Fuzzy(tokens) => tokens.iter().all(|t| label.contains(t.as_str())),
        }
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

// ============================================================================
// ResourceQuery
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceQuery {
    pub label: Option<SearchString>,
    pub visibility: Option<VisibilityFilter>,
    pub created_by: Option<ContributorId>,
    pub created_at_start: Option<DateTime<Utc>>,
    pub created_at_end: Option<DateTime<Utc>>,
    pub observatory_id: Option<ObservatoryId>,
    pub organization_id: Option<OrganizationId>,
    pub include_classes: BTreeSet<ThingId>,
    pub exclude_classes: BTreeSet<ThingId>,
}

impl ResourceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_class(class: ThingId) -> Self {
        Self { include_classes: BTreeSet::from([class]), ..Self::default() }
    }

    pub fn with_label(mut self, q: &str, exact: bool) -> Self {
        self.label = Some(SearchString::of(q, exact));
        self
    }

    pub fn with_visibility(mut self, visibility: VisibilityFilter) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_created_by(mut self, contributor: ContributorId) -> Self {
        self.created_by = Some(contributor);
        self
    }

    pub fn with_created_between(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.created_at_start = start;
        self.created_at_end = end;
        self
    }

    pub fn with_observatory(mut self, observatory: ObservatoryId) -> Self {
        self.observatory_id = Some(observatory);
        self
    }

    pub fn with_organization(mut self, organization: OrganizationId) -> Self {
        self.organization_id = Some(organization);
        self
    }

    pub fn matches(&self, r: &Resource) -> bool {
        self.label.as_ref().is_none_or(|s| s.matches(&r.label))
            && self.visibility.is_none_or(|v| v.matches(r.visibility))
            && self.created_by.is_none_or(|c| r.created_by == c)
            && self.created_at_start.is_none_or(|t| r.created_at >= t)
            && self.created_at_end.is_none_or(|t| r.created_at <= t)
            && self.observatory_id.is_none_or(|o| r.observatory_id == o)
            && self.organization_id.is_none_or(|o| r.organization_id == o)
            && self.include_classes.iter().all(|c| r.classes.contains(c))
            && !self.exclude_classes.iter().any(|c| r.classes.contains(c))
    }
}

// ============================================================================
// StatementQuery
// ============================================================================

/// Filters over statements. At most [`StatementQuery::MAX_PARAMETERS`]
/// optional parameters may be combined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementQuery {
    pub subject_classes: BTreeSet<ThingId>,
    pub subject_id: Option<ThingId>,
    pub subject_label: Option<String>,
    pub predicate_id: Option<ThingId>,
    pub created_by: Option<ContributorId>,
    pub created_at_start: Option<DateTime<Utc>>,
    pub created_at_end: Option<DateTime<Utc>>,
    pub object_classes: BTreeSet<ThingId>,
    pub object_id: Option<ThingId>,
    pub object_label: Option<String>,
}

impl StatementQuery {
    pub const MAX_PARAMETERS: usize = 6;

    const PARAMETER_NAMES: &'static str = "subject_classes, subject_id, subject_label, predicate_id, \
        created_by, created_at_start, created_at_end, object_classes, object_id, object_label";

    pub fn parameter_count(&self) -> usize {
        [
            !self.subject_classes.is_empty(),
            self.subject_id.is_some(),
            self.subject_label.is_some(),
            self.predicate_id.is_some(),
            self.created_by.is_some(),
            self.created_at_start.is_some(),
            self.created_at_end.is_some(),
            !self.object_classes.is_empty(),
            self.object_id.is_some(),
            self.object_label.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    pub fn validate(&self) -> Result<()> {
        let actual = self.parameter_count();
        if actual > Self::MAX_PARAMETERS {
            return Err(Error::TooManyParameters {
                max: Self::MAX_PARAMETERS,
                actual,
                names: Self::PARAMETER_NAMES.into(),
            });
        }
        Ok(())
    }

    pub fn matches(&self, s: &Statement) -> bool {
        is_instance_of_all(&s.subject, &self.subject_classes)
            && self.subject_id.as_ref().is_none_or(|id| s.subject.id() == id)
            && self.subject_label.as_deref().is_none_or(|l| s.subject.label() == l)
            && self.predicate_id.as_ref().is_none_or(|id| &s.predicate.id == id)
            && self.created_by.is_none_or(|c| s.created_by == c)
            && self.created_at_start.is_none_or(|t| s.created_at >= t)
            && self.created_at_end.is_none_or(|t| s.created_at <= t)
            && is_instance_of_all(&s.object, &self.object_classes)
            && self.object_id.as_ref().is_none_or(|id| s.object.id() == id)
            && self.object_label.as_deref().is_none_or(|l| s.object.label() == l)
    }
}

/// Class membership, treating the thing kinds `Resource`, `Predicate`,
/// `Class` and `Literal` as implicit classes.
fn is_instance_of_all(thing: &Thing, classes: &BTreeSet<ThingId>) -> bool {
    use crate::model::vocab::classes as c;
    classes.iter().all(|class| match thing {
        Thing::Resource(r) => class == c::RESOURCE || r.classes.contains(class),
        Thing::Predicate(_) => class == "Predicate",
        Thing::Class(_) => class == "Class",
        Thing::Literal(_) => class == c::LITERAL,
    })
}
