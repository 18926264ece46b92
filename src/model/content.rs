//! Content types layered on top of the plain graph: templates, rosetta-stone
//! templates and statements, snapshots and the saved search filters of
//! observatories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use smallvec::SmallVec;

use super::{
    ContributorId, ObservatoryFilterId, ObservatoryId, Resource, SnapshotId, Statement, ThingId, Visibility,
};
use crate::search::{FilterValue, SearchFilter};
use crate::Result;

/// One property constraint of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateProperty {
    pub label: String,
    /// Predicate the property describes.
    pub path: ThingId,
    pub min_count: Option<u32>,
    pub max_count: Option<u32>,
    /// Expected class of resource objects.
    pub class: Option<ThingId>,
    /// Expected datatype class of literal objects.
    pub datatype: Option<ThingId>,
}

impl TemplateProperty {
    pub fn new(label: impl Into<String>, path: ThingId) -> Self {
        Self { label: label.into(), path, min_count: None, max_count: None, class: None, datatype: None }
    }

    pub fn with_counts(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_count = min;
        self.max_count = max;
        self
    }

    pub fn with_class(mut self, class: ThingId) -> Self {
        self.class = Some(class);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: ThingId,
    pub label: String,
    pub description: Option<String>,
    pub target_class: ThingId,
    pub properties: Vec<TemplateProperty>,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub visibility: Visibility,
}

/// A resource seen through a template: the resource plus the statements
/// whose predicates the template describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInstance {
    pub root: Resource,
    pub statements: Vec<Statement>,
}

/// Immutable, point-in-time materialization of a template instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub resource_id: ThingId,
    pub template_id: ThingId,
    pub data: TemplateInstance,
    pub handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosettaStoneTemplate {
    pub id: ThingId,
    pub label: String,
    pub description: String,
    /// Label pattern with `{i}` placeholders, one per input position.
    pub formatted_label: String,
    pub target_class: ThingId,
    /// Input positions; the first one is the subject position.
    pub properties: Vec<TemplateProperty>,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub modifiable: bool,
}

impl RosettaStoneTemplate {
    /// Render the formatted label with one label per input position.
    pub fn format_label(&self, inputs: &[Vec<String>]) -> String {
        inputs.iter().enumerate().fold(self.formatted_label.clone(), |acc, (i, labels)| {
            acc.replace(&format!("{{{i}}}"), &labels.join(", "))
        })
    }
}

/// One version of a rosetta-stone statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosettaStoneStatement {
    pub id: ThingId,
    pub version_id: ThingId,
    pub template_id: ThingId,
    pub context: Option<ThingId>,
    /// Things per input position, in template order.
    pub input_positions: Vec<Vec<ThingId>>,
    pub certainty: Certainty,
    pub negated: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub visibility: Visibility,
    pub modifiable: bool,
    pub deleted_by: Option<ContributorId>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Certainty {
    #[default]
    High,
    Moderate,
    Low,
}

/// Part of the edit timeline of a resource, truncated to the minute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceContributor {
    pub created_by: ContributorId,
    pub created_at: String,
}

/// A group curating papers of one research field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observatory {
    pub id: ObservatoryId,
    pub name: String,
    pub description: String,
    pub research_field: Option<ThingId>,
    pub members: Vec<ContributorId>,
    /// Url-safe name, e.g. `semantic_web`.
    pub display_id: String,
}

/// A named search filter saved by an observatory. It carries the path,
/// range and exactness of a [`SearchFilter`]; the values are supplied when
/// it is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservatoryFilter {
    pub id: ObservatoryFilterId,
    pub observatory_id: ObservatoryId,
    pub label: String,
    pub created_by: ContributorId,
    pub created_at: DateTime<Utc>,
    pub path: SmallVec<[ThingId; 4]>,
    pub range: ThingId,
    pub exact: bool,
    pub featured: bool,
}

impl ObservatoryFilter {
    /// The search filter selecting targets that satisfy any of `values`.
    pub fn search_filter(&self, values: impl IntoIterator<Item = FilterValue>) -> Result<SearchFilter> {
        SearchFilter::new(self.path.iter().cloned(), self.range.clone(), values, self.exact)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateUsage {
    pub id: ThingId,
    pub count: u64,
}
