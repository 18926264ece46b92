//! # orkg-graph: Scholarly Knowledge Graph Core
//!
//! An in-memory scholarly knowledge graph (papers, contributions, research
//! problems and fields, templates, rosetta-stone statements, snapshots) with
//! the query conventions every listing shares: search filters over
//! contribution subgraphs, visibility filters, paged and sorted results and a
//! uniform error envelope.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `GraphRepository` is the contract between use cases and storage
//! 2. **Plain DTOs**: `Resource`, `Statement`, `Page` cross all boundaries
//! 3. **Descriptors are data**: `SearchFilter`, `ResourceQuery` and `PageRequest` hold no state
//! 4. **One error type**: every failure maps to a status code in one place
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use orkg_graph::{Orkg, ContributorId, PageRequest, VisibilityFilter};
//! use orkg_graph::content::CreatePaperCommand;
//! use orkg_graph::search::parse_filters;
//!
//! # async fn example() -> orkg_graph::Result<()> {
//! let orkg = Orkg::open_memory().await?;
//!
//! let id = orkg
//!     .papers()
//!     .create(CreatePaperCommand::new("Attention is all you need", ContributorId::random()))
//!     .await?;
//!
//! let filters = parse_filters(r#"[{"path": ["P32"], "range": "Resources", "values": [{"op": "EQ", "value": "R12"}]}]"#)?;
//! let page = orkg
//!     .papers()
//!     .list_by_filters(None, &filters, VisibilityFilter::AllListed, &PageRequest::default())
//!     .await?;
//! println!("{id}: {} matching papers", page.total_elements());
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Backends
//!
//! | Backend | Config | Description |
//! |---------|--------|-------------|
//! | Memory | `kind = "memory"` | In-memory graph for testing/embedding |

// ============================================================================
// Modules
// ============================================================================

pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod model;
pub mod paging;
pub mod query;
pub mod search;
pub mod storage;

use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Re-exports
// ============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::OrkgConfig;
pub use error::{Error, ErrorResponse, Result};
pub use model::{
    Class, ContributorId, Literal, ObservatoryFilterId, ObservatoryId, OrganizationId, Predicate, Resource, SnapshotId,
    Statement, StatementId, Thing, ThingId, Visibility, VisibilityFilter,
};
pub use paging::{Page, PageRequest, Sort, SortDirection};
pub use query::{ResourceQuery, StatementQuery};
pub use search::{FilterValue, Operator, SearchFilter};
pub use storage::{BackendConfig, GraphRepository, MemoryGraph};

use content::*;
use model::vocab::{classes, predicates};

// ============================================================================
// Top-level Orkg handle
// ============================================================================

/// The primary entry point. An `Orkg` wraps a storage backend and hands out
/// the use-case services, all sharing one clock and configuration.
pub struct Orkg<B: GraphRepository> {
    ctx: ServiceContext<B>,
}

impl<B: GraphRepository> Orkg<B> {
    /// Create a handle over `backend`, seeding the well-known predicates
    /// and classes when missing.
    pub async fn with_backend(backend: B, clock: Arc<dyn Clock>, config: OrkgConfig) -> Result<Self> {
        let ctx = ServiceContext::new(Arc::new(backend), clock, Arc::new(config));
        let orkg = Self { ctx };
        orkg.seed_vocabulary().await?;
        Ok(orkg)
    }

    async fn seed_vocabulary(&self) -> Result<()> {
        let repo = &self.ctx.repository;
        let now = self.ctx.now();
        let mut seeded = 0usize;
        for &(id, label) in WELL_KNOWN_PREDICATES {
            let id = ThingId::from_static(id);
            if !repo.exists(&id).await? {
                repo.save_thing(Predicate::new(id, label, now).into()).await?;
                seeded += 1;
            }
        }
        for &(id, label) in WELL_KNOWN_CLASSES {
            let id = ThingId::from_static(id);
            if !repo.exists(&id).await? {
                repo.save_thing(Class::new(id, label, now).into()).await?;
                seeded += 1;
            }
        }
        tracing::debug!(seeded, "seeded vocabulary");
        Ok(())
    }

    /// Access the underlying backend (for advanced use).
    pub fn repository(&self) -> &B {
        &self.ctx.repository
    }

    pub fn config(&self) -> &OrkgConfig {
        &self.ctx.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.ctx.clock.as_ref()
    }

    /// Render `error` as the JSON error envelope for a request to `path`.
    pub fn error_response(&self, error: &Error, path: &str) -> ErrorResponse {
        ErrorResponse::from_error(error, path, self.clock())
    }

    // ========================================================================
    // Services
    // ========================================================================

    pub fn papers(&self) -> PaperService<B> {
        PaperService::new(self.ctx.clone())
    }

    pub fn dois(&self) -> DoiService<B> {
        DoiService::new(self.ctx.clone())
    }

    pub fn research_problems(&self) -> ResearchProblemService<B> {
        ResearchProblemService::new(self.ctx.clone())
    }

    pub fn research_fields(&self) -> ResearchFieldService<B> {
        ResearchFieldService::new(self.ctx.clone())
    }

    pub fn observatories(&self) -> ObservatoryService<B> {
        ObservatoryService::new(self.ctx.clone())
    }

    pub fn observatory_filters(&self) -> ObservatoryFilterService<B> {
        ObservatoryFilterService::new(self.ctx.clone())
    }

    pub fn templates(&self) -> TemplateService<B> {
        TemplateService::new(self.ctx.clone())
    }

    pub fn snapshots(&self) -> SnapshotService<B> {
        SnapshotService::new(self.ctx.clone())
    }

    pub fn rosetta_templates(&self) -> RosettaStoneTemplateService<B> {
        RosettaStoneTemplateService::new(self.ctx.clone())
    }

    pub fn rosetta_statements(&self) -> RosettaStoneStatementService<B> {
        RosettaStoneStatementService::new(self.ctx.clone())
    }

    pub fn tables(&self) -> TableService<B> {
        TableService::new(self.ctx.clone())
    }

    pub fn visualizations(&self) -> VisualizationService<B> {
        VisualizationService::new(self.ctx.clone())
    }

    pub fn benchmarks(&self) -> BenchmarkService<B> {
        BenchmarkService::new(self.ctx.clone())
    }

    pub fn statistics(&self) -> StatisticsService<B> {
        StatisticsService::new(self.ctx.clone())
    }

    // ========================================================================
    // Plain graph operations
    // ========================================================================

    /// Create a resource of one class.
    pub async fn create_resource(&self, label: &str, class: &str) -> Result<ThingId> {
        let resource = self.ctx.create_resource(label, [ThingId::new(class)?], ContributorId::UNKNOWN).await?;
        Ok(resource.id)
    }

    pub async fn create_class(&self, label: &str) -> Result<ThingId> {
        let id = self.ctx.repository.next_thing_id().await?;
        self.ctx.repository.save_thing(Class::new(id.clone(), label, self.ctx.now()).into()).await?;
        Ok(id)
    }

    pub async fn create_predicate(&self, label: &str) -> Result<ThingId> {
        let id = self.ctx.repository.next_thing_id().await?;
        self.ctx.repository.save_thing(Predicate::new(id.clone(), label, self.ctx.now()).into()).await?;
        Ok(id)
    }

    /// Create a string literal.
    pub async fn create_literal(&self, label: &str) -> Result<ThingId> {
        Ok(self.ctx.create_string_literal(label, ContributorId::UNKNOWN).await?.id)
    }

    /// Create a literal of an XSD datatype, e.g. `xsd:integer`.
    pub async fn create_typed_literal(&self, label: &str, datatype: &str) -> Result<ThingId> {
        Ok(self.ctx.create_literal(label, datatype, ContributorId::UNKNOWN).await?.id)
    }

    pub async fn link(&self, subject: &ThingId, predicate: &ThingId, object: &ThingId) -> Result<StatementId> {
        self.ctx.link(subject, predicate, object, ContributorId::UNKNOWN).await
    }

    /// Statements matching `query`, newest first unless sorted otherwise.
    pub async fn list_statements(&self, query: &StatementQuery, page: &PageRequest) -> Result<Page<Statement>> {
        self.ctx.repository.find_statements(query, &self.ctx.page(page)).await
    }

    pub async fn delete_statement(&self, id: &StatementId) -> Result<()> {
        let statement = self
            .ctx
            .repository
            .find_statement(id)
            .await?
            .ok_or_else(|| Error::StatementNotFound(id.clone()))?;
        if !statement.modifiable {
            return Err(Error::StatementNotModifiable(id.clone()));
        }
        self.ctx.repository.delete_statement(id).await?;
        tracing::info!(statement = %id, "deleted statement");
        Ok(())
    }
}

/// In-memory graph for testing and embedding.
impl Orkg<MemoryGraph> {
    pub async fn open_memory() -> Result<Self> {
        Self::open(OrkgConfig::default()).await
    }

    /// Open the backend named by `config`.
    pub async fn open(config: OrkgConfig) -> Result<Self> {
        match config.backend {
            BackendConfig::Memory => Self::with_backend(MemoryGraph::new(), Arc::new(SystemClock), config).await,
        }
    }

    /// Open with configuration from a TOML file; a missing file means defaults.
    pub async fn open_with_config_file(path: &Path) -> Result<Self> {
        Self::open(OrkgConfig::load(path)?).await
    }
}

const WELL_KNOWN_PREDICATES: &[(&str, &str)] = &[
    (predicates::HAS_DOI, "has DOI"),
    (predicates::HAS_RESEARCH_FIELD, "has research field"),
    (predicates::HAS_CONTRIBUTION, "has contribution"),
    (predicates::HAS_RESEARCH_PROBLEM, "has research problem"),
    (predicates::HAS_SUBFIELD, "has subfield"),
    (predicates::HAS_BENCHMARK, "has benchmark"),
    (predicates::HAS_DATASET, "has dataset"),
    (predicates::HAS_SOURCE_CODE, "has source code"),
    (predicates::COMPARES_CONTRIBUTION, "compares contribution"),
    (predicates::DESCRIPTION, "description"),
    (predicates::HAS_ROW, "rows"),
];

const WELL_KNOWN_CLASSES: &[(&str, &str)] = &[
    (classes::PAPER, "Paper"),
    (classes::CONTRIBUTION, "Contribution"),
    (classes::PROBLEM, "Problem"),
    (classes::RESEARCH_FIELD, "Research field"),
    (classes::COMPARISON, "Comparison"),
    (classes::VISUALIZATION, "Visualization"),
    (classes::TABLE, "Table"),
    (classes::ROW, "Row"),
    (classes::DATASET, "Dataset"),
    (classes::BENCHMARK, "Benchmark"),
    (classes::NODE_SHAPE, "Node shape"),
    (classes::ROSETTA_NODE_SHAPE, "Rosetta node shape"),
    (classes::ROSETTA_STONE_STATEMENT, "Rosetta stone statement"),
    (classes::RESOURCE, "Resource"),
    (classes::RESOURCES, "Resources"),
    (classes::PREDICATES, "Predicates"),
    (classes::CLASSES, "Classes"),
    (classes::LITERAL, "Literal"),
    (classes::STRING, "String"),
    (classes::INTEGER, "Integer"),
    (classes::DECIMAL, "Decimal"),
    (classes::FLOAT, "Float"),
    (classes::BOOLEAN, "Boolean"),
    (classes::DATE, "Date"),
    (classes::URI, "URI"),
];
