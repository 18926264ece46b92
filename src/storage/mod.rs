//! # Graph Repository Trait
//!
//! The contract between the use cases and any storage engine. Every query a
//! list endpoint needs is defined here; backends return
//! `Error::Storage("... not supported")` for content stores they do not
//! provide rather than splitting the contract into many optional traits.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryGraph` | `memory` | In-memory for testing/embedding |

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::paging::{Page, PageRequest, Sort, SortDirection, SortKey};
use crate::query::{ResourceQuery, StatementQuery};
use crate::search::SearchFilter;
use crate::{Error, Result};

pub use memory::MemoryGraph;

// ============================================================================
// Backend Configuration
// ============================================================================

/// Which storage backend to open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-memory (no persistence)
    #[default]
    Memory,
}

// ============================================================================
// Bundle configuration
// ============================================================================

/// Bounds for fetching the statement bundle of a root thing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Statements at or above this level are traversed but not returned.
    pub min_level: Option<usize>,
    /// Statements below this level are not traversed.
    pub max_level: Option<usize>,
    /// Object classes that stop the expansion.
    #[serde(default)]
    pub blacklist: Vec<ThingId>,
    /// When non-empty, only objects of these classes are followed.
    #[serde(default)]
    pub whitelist: Vec<ThingId>,
}

// ============================================================================
// GraphRepository Trait
// ============================================================================

#[async_trait]
pub trait GraphRepository: Send + Sync + 'static {
    // ========================================================================
    // Things
    // ========================================================================

    /// Insert or replace a thing.
    async fn save_thing(&self, thing: Thing) -> Result<()>;

    async fn find_thing(&self, id: &ThingId) -> Result<Option<Thing>>;

    /// Allocate a fresh resource id (`R<n>`).
    async fn next_thing_id(&self) -> Result<ThingId>;

    async fn find_resource(&self, id: &ThingId) -> Result<Option<Resource>> {
        Ok(match self.find_thing(id).await? {
            Some(Thing::Resource(r)) => Some(r),
            _ => None,
        })
    }

    async fn find_predicate(&self, id: &ThingId) -> Result<Option<Predicate>> {
        Ok(match self.find_thing(id).await? {
            Some(Thing::Predicate(p)) => Some(p),
            _ => None,
        })
    }

    async fn find_class(&self, id: &ThingId) -> Result<Option<Class>> {
        Ok(match self.find_thing(id).await? {
            Some(Thing::Class(c)) => Some(c),
            _ => None,
        })
    }

    async fn exists(&self, id: &ThingId) -> Result<bool> {
        Ok(self.find_thing(id).await?.is_some())
    }

    /// Resources matching `query`. Sortable by `id`, `label`, `created_at`
    /// and `created_by`; defaults to newest first.
    async fn find_resources(&self, query: &ResourceQuery, page: &PageRequest) -> Result<Page<Resource>>;

    // ========================================================================
    // Statements
    // ========================================================================

    async fn save_statement(&self, statement: Statement) -> Result<()>;

    async fn find_statement(&self, id: &StatementId) -> Result<Option<Statement>>;

    /// Delete a statement. Returns true if it existed.
    async fn delete_statement(&self, id: &StatementId) -> Result<bool>;

    async fn next_statement_id(&self) -> Result<StatementId>;

    /// Statements matching `query`; see [`STATEMENT_SORT_PROPERTIES`].
    async fn find_statements(&self, query: &StatementQuery, page: &PageRequest) -> Result<Page<Statement>>;

    /// Number of statements pointing at `id`.
    async fn count_incoming(&self, id: &ThingId) -> Result<u64>;

    // ========================================================================
    // Graph queries
    // ========================================================================

    /// Papers whose contributions satisfy all `filters`.
    async fn find_papers_by_filters(
        &self,
        observatory: Option<ObservatoryId>,
        filters: &[SearchFilter],
        visibility: VisibilityFilter,
        page: &PageRequest,
    ) -> Result<Page<Resource>>;

    /// Statements of the subgraph below `root`, bounded by `config`.
    async fn fetch_bundle(&self, root: &ThingId, config: &BundleConfig) -> Result<Vec<Statement>>;

    /// Everyone who created part of the subgraph of `resource`.
    async fn find_contributors(&self, resource: &ThingId, page: &PageRequest) -> Result<Page<ContributorId>>;

    /// Edits of the subgraph of `resource`, newest first.
    async fn find_timeline(&self, resource: &ThingId, page: &PageRequest) -> Result<Page<ResourceContributor>>;

    /// Newest resource of one of `classes` carrying `doi` (case-insensitive).
    async fn find_by_doi(&self, doi: &str, classes: &[ThingId]) -> Result<Option<Resource>>;

    /// Problems addressed by contributions of papers of an observatory.
    async fn find_problems_by_observatory(&self, observatory: ObservatoryId, page: &PageRequest) -> Result<Page<Resource>>;

    /// Statement counts per predicate, most used first.
    async fn count_predicate_usage(&self, page: &PageRequest) -> Result<Page<PredicateUsage>>;

    // ========================================================================
    // Content stores
    // ========================================================================

    async fn save_template(&self, _template: Template) -> Result<()> {
        Err(Error::Storage("templates not supported".into()))
    }

    async fn find_template(&self, _id: &ThingId) -> Result<Option<Template>> {
        Err(Error::Storage("templates not supported".into()))
    }

    async fn find_template_by_target_class(&self, _class: &ThingId) -> Result<Option<Template>> {
        Err(Error::Storage("templates not supported".into()))
    }

    async fn save_snapshot(&self, _snapshot: Snapshot) -> Result<()> {
        Err(Error::Storage("snapshots not supported".into()))
    }

    async fn find_snapshot(&self, _id: &SnapshotId) -> Result<Option<Snapshot>> {
        Err(Error::Storage("snapshots not supported".into()))
    }

    async fn find_snapshots_by_resource(&self, _resource: &ThingId, _page: &PageRequest) -> Result<Page<Snapshot>> {
        Err(Error::Storage("snapshots not supported".into()))
    }

    async fn save_rosetta_template(&self, _template: RosettaStoneTemplate) -> Result<()> {
        Err(Error::Storage("rosetta stone templates not supported".into()))
    }

    async fn find_rosetta_template(&self, _id: &ThingId) -> Result<Option<RosettaStoneTemplate>> {
        Err(Error::Storage("rosetta stone templates not supported".into()))
    }

    /// Append a new version of a rosetta-stone statement.
    async fn save_rosetta_statement(&self, _version: RosettaStoneStatement) -> Result<()> {
        Err(Error::Storage("rosetta stone statements not supported".into()))
    }

    /// All versions of a rosetta-stone statement, oldest first.
    async fn find_rosetta_statement_versions(&self, _id: &ThingId) -> Result<Vec<RosettaStoneStatement>> {
        Err(Error::Storage("rosetta stone statements not supported".into()))
    }

    /// Latest versions of all statements, filtered and paged.
    async fn find_rosetta_statements(
        &self,
        _template: Option<&ThingId>,
        _visibility: VisibilityFilter,
        _page: &PageRequest,
    ) -> Result<Page<RosettaStoneStatement>> {
        Err(Error::Storage("rosetta stone statements not supported".into()))
    }

    async fn save_observatory(&self, _observatory: Observatory) -> Result<()> {
        Err(Error::Storage("observatories not supported".into()))
    }

    async fn find_observatory(&self, _id: ObservatoryId) -> Result<Option<Observatory>> {
        Err(Error::Storage("observatories not supported".into()))
    }

    /// Insert or replace a saved filter.
    async fn save_observatory_filter(&self, _filter: ObservatoryFilter) -> Result<()> {
        Err(Error::Storage("observatory filters not supported".into()))
    }

    async fn find_observatory_filter(&self, _id: ObservatoryFilterId) -> Result<Option<ObservatoryFilter>> {
        Err(Error::Storage("observatory filters not supported".into()))
    }

    /// Filters of an observatory, newest first, optionally only (non-)featured ones.
    async fn find_observatory_filters(
        &self,
        _observatory: ObservatoryId,
        _featured: Option<bool>,
        _page: &PageRequest,
    ) -> Result<Page<ObservatoryFilter>> {
        Err(Error::Storage("observatory filters not supported".into()))
    }

    /// Delete a saved filter. Returns true if it existed.
    async fn delete_observatory_filter(&self, _id: ObservatoryFilterId) -> Result<bool> {
        Err(Error::Storage("observatory filters not supported".into()))
    }
}

/// Sort properties understood by thing listings.
pub const THING_SORT_PROPERTIES: &[&str] = &["id", "label", "created_at", "created_by"];

/// Sort properties understood by statement listings.
pub const STATEMENT_SORT_PROPERTIES: &[&str] = &[
    "id", "created_at", "created_by", "index",
    "sub.id", "sub.label", "sub.created_at", "sub.created_by",
    "obj.id", "obj.label", "obj.created_at", "obj.created_by",
];

/// Sort key of a resource for the properties in [`THING_SORT_PROPERTIES`].
pub(crate) fn resource_sort_key(resource: &Resource, property: &str) -> Option<SortKey> {
    match property {
        "id" => Some(resource.id.as_str().into()),
        "label" => Some(resource.label.as_str().into()),
        "created_at" => Some(resource.created_at.into()),
        "created_by" => Some(resource.created_by.to_string().into()),
        _ => None,
    }
}

/// Order resources by the requested sort, newest first when none is given.
pub(crate) fn sort_resources(mut resources: Vec<Resource>, page: &PageRequest) -> Result<Vec<Resource>> {
    page.sort.validate(THING_SORT_PROPERTIES)?;
    let sort = page.sort.or_else(|| Sort::by("created_at", SortDirection::Desc));
    resources.sort_by(|a, b| sort.compare(a, b, resource_sort_key));
    Ok(resources)
}
