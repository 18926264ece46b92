//! # Knowledge Graph Model
//!
//! Plain data types shared by storage, queries and use cases.
//! This module is pure data: no I/O, no state, no async.

pub mod ids;
pub mod content;
pub mod thing;
pub mod statement;
pub mod value;
pub mod visibility;
pub mod vocab;

pub use ids::{ContributorId, ObservatoryFilterId, ObservatoryId, OrganizationId, SnapshotId, StatementId, ThingId};
pub use thing::{Class, ExtractionMethod, Literal, Predicate, Resource, Thing};
pub use statement::Statement;
pub use value::TypedValue;
pub use content::{
    Certainty, Observatory, ObservatoryFilter, PredicateUsage, ResourceContributor, RosettaStoneStatement, RosettaStoneTemplate,
    Snapshot, Template, TemplateInstance, TemplateProperty,
};
pub use visibility::{Visibility, VisibilityFilter};
