//! Things: the four kinds of node in the knowledge graph.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::vocab::xsd;
use super::{ContributorId, ObservatoryId, OrganizationId, ThingId, Visibility};

/// A resource: an instance of zero or more classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ThingId,
    pub label: String,
    pub classes: BTreeSet<ThingId>,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub observatory_id: ObservatoryId,
    pub organization_id: OrganizationId,
    pub extraction_method: ExtractionMethod,
    pub visibility: Visibility,
    pub verified: bool,
    pub modifiable: bool,
}

/// How a resource entered the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionMethod {
    Automatic,
    Manual,
    #[default]
    Unknown,
}

impl Resource {
    pub fn new(id: ThingId, label: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            label: label.into(),
            classes: BTreeSet::new(),
            created_at,
            created_by: ContributorId::UNKNOWN,
            observatory_id: ObservatoryId::UNKNOWN,
            organization_id: OrganizationId::UNKNOWN,
            extraction_method: ExtractionMethod::Unknown,
            visibility: Visibility::Default,
            verified: false,
            modifiable: true,
        }
    }

    pub fn with_classes(mut self, classes: impl IntoIterator<Item = ThingId>) -> Self {
        self.classes = classes.into_iter().collect();
        self
    }

    pub fn with_created_by(mut self, contributor: ContributorId) -> Self {
        self.created_by = contributor;
        self
    }

    pub fn with_observatory(mut self, observatory: ObservatoryId) -> Self {
        self.observatory_id = observatory;
        self
    }

    pub fn with_organization(mut self, organization: OrganizationId) -> Self {
        self.organization_id = organization;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub id: ThingId,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub modifiable: bool,
}

impl Predicate {
    pub fn new(id: ThingId, label: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            label: label.into(),
            created_at,
            created_by: ContributorId::UNKNOWN,
            modifiable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: ThingId,
    pub label: String,
    pub uri: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub modifiable: bool,
}

impl Class {
    pub fn new(id: ThingId, label: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            label: label.into(),
            uri: None,
            created_at,
            created_by: ContributorId::UNKNOWN,
            modifiable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub id: ThingId,
    pub label: String,
    pub datatype: String,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub modifiable: bool,
}

impl Literal {
    pub fn new(id: ThingId, label: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            label: label.into(),
            datatype: xsd::STRING.to_string(),
            created_at,
            created_by: ContributorId::UNKNOWN,
            modifiable: true,
        }
    }

    pub fn with_datatype(mut self, datatype: &str) -> Self {
        self.datatype = xsd::normalize(datatype);
        self
    }
}

/// Any node of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_class", rename_all = "snake_case")]
pub enum Thing {
    Resource(Resource),
    Predicate(Predicate),
    Class(Class),
    Literal(Literal),
}

impl Thing {
    pub fn id(&self) -> &ThingId {
        match self {
            Thing::Resource(r) => &r.id,
            Thing::Predicate(p) => &p.id,
            Thing::Class(c) => &c.id,
            Thing::Literal(l) => &l.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Thing::Resource(r) => &r.label,
            Thing::Predicate(p) => &p.label,
            Thing::Class(c) => &c.label,
            Thing::Literal(l) => &l.label,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Thing::Resource(r) => r.created_at,
            Thing::Predicate(p) => p.created_at,
            Thing::Class(c) => c.created_at,
            Thing::Literal(l) => l.created_at,
        }
    }

    pub fn created_by(&self) -> ContributorId {
        match self {
            Thing::Resource(r) => r.created_by,
            Thing::Predicate(p) => p.created_by,
            Thing::Class(c) => c.created_by,
            Thing::Literal(l) => l.created_by,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Thing::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Thing::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Whether a resource carries one of the classes that delimit a subgraph
    /// (papers, problems and research fields are never expanded into).
    pub fn is_subgraph_boundary(&self) -> bool {
        use super::vocab::classes;
        self.as_resource().is_some_and(|r| {
            r.has_class(classes::PAPER)
                || r.has_class(classes::PROBLEM)
                || r.has_class(classes::RESEARCH_FIELD)
        })
    }
}

impl From<Resource> for Thing {
    fn from(r: Resource) -> Self {
        Thing::Resource(r)
    }
}

impl From<Predicate> for Thing {
    fn from(p: Predicate) -> Self {
        Thing::Predicate(p)
    }
}

impl From<Class> for Thing {
    fn from(c: Class) -> Self {
        Thing::Class(c)
    }
}

impl From<Literal> for Thing {
    fn from(l: Literal) -> Self {
        Thing::Literal(l)
    }
}
