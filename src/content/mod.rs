//! # Use Cases
//!
//! Domain services over a [`GraphRepository`]. Each service owns a clone of
//! the [`ServiceContext`]: the repository, the clock and the configuration.
//!
//! | Service | Module |
//! |---------|--------|
//! | `PaperService` | `papers` |
//! | `DoiService` | `doi` |
//! | `ObservatoryService`, `ObservatoryFilterService` | `observatories` |
//! | `ResearchProblemService`, `ResearchFieldService` | `problems` |
//! | `TemplateService` | `templates` |
//! | `SnapshotService` | `snapshots` |
//! | `RosettaStoneTemplateService`, `RosettaStoneStatementService` | `rosetta` |
//! | `TableService`, `VisualizationService` | `tables` |
//! | `BenchmarkService` | `benchmarks` |
//! | `StatisticsService` | `statistics` |

pub mod benchmarks;
pub mod doi;
pub mod observatories;
pub mod papers;
pub mod problems;
pub mod rosetta;
pub mod snapshots;
pub mod statistics;
pub mod tables;
pub mod templates;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::config::OrkgConfig;
use crate::model::vocab::xsd;
use crate::model::*;
use crate::paging::{Page, PageRequest, Sort, SortDirection};
use crate::query::StatementQuery;
use crate::storage::GraphRepository;
use crate::{Error, Result};

pub use benchmarks::{BenchmarkService, BenchmarkSummary};
pub use doi::{Doi, DoiService};
pub use observatories::{
    CreateObservatoryCommand, CreateObservatoryFilterCommand, ObservatoryFilterService, ObservatoryService,
    UpdateObservatoryFilterCommand,
};
pub use papers::{CreateContributionCommand, CreatePaperCommand, PaperService, UpdatePaperCommand};
pub use problems::{ResearchFieldService, ResearchProblemService};
pub use rosetta::{
    CreateRosettaStoneStatementCommand, CreateRosettaStoneTemplateCommand,
    RosettaStoneStatementService, RosettaStoneTemplateService, UpdateRosettaStoneStatementCommand,
};
pub use snapshots::{CreateSnapshotCommand, SnapshotService};
pub use statistics::{ContributorRecord, StatisticsService};
pub use tables::{TableService, VisualizationService};
pub use templates::{CreateTemplateCommand, TemplateService};

// ============================================================================
// ServiceContext
// ============================================================================

/// Everything a service needs.
pub struct ServiceContext<B: GraphRepository> {
    pub repository: Arc<B>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<OrkgConfig>,
}

impl<B: GraphRepository> Clone for ServiceContext<B> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: GraphRepository> ServiceContext<B> {
    pub fn new(repository: Arc<B>, clock: Arc<dyn Clock>, config: Arc<OrkgConfig>) -> Self {
        Self { repository, clock, config }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Apply configured page size defaults and limits.
    pub fn page(&self, request: &PageRequest) -> PageRequest {
        self.config.page(request.clone())
    }

    // ========================================================================
    // Graph writes shared by the services
    // ========================================================================

    pub(crate) async fn create_resource(
        &self,
        label: impl Into<String>,
        classes: impl IntoIterator<Item = ThingId>,
        contributor: ContributorId,
    ) -> Result<Resource> {
        let id = self.repository.next_thing_id().await?;
        let resource = Resource::new(id, label, self.now())
            .with_classes(classes)
            .with_created_by(contributor);
        self.repository.save_thing(resource.clone().into()).await?;
        Ok(resource)
    }

    pub(crate) async fn create_literal(
        &self,
        label: impl Into<String>,
        datatype: &str,
        contributor: ContributorId,
    ) -> Result<Literal> {
        let id = self.repository.next_thing_id().await?;
        let mut literal = Literal::new(id, label, self.now()).with_datatype(datatype);
        literal.created_by = contributor;
        self.repository.save_thing(literal.clone().into()).await?;
        Ok(literal)
    }

    pub(crate) async fn create_string_literal(&self, label: impl Into<String>, contributor: ContributorId) -> Result<Literal> {
        self.create_literal(label, xsd::STRING, contributor).await
    }

    /// Add `subject --predicate--> object`; all three must exist.
    pub(crate) async fn link(
        &self,
        subject: &ThingId,
        predicate: &ThingId,
        object: &ThingId,
        contributor: ContributorId,
    ) -> Result<StatementId> {
        let repo = &self.repository;
        let subject = repo.find_thing(subject).await?.ok_or_else(|| Error::ThingNotFound(subject.clone()))?;
        let predicate = repo
            .find_predicate(predicate)
            .await?
            .ok_or_else(|| Error::PredicateNotFound(predicate.clone()))?;
        let object = repo.find_thing(object).await?.ok_or_else(|| Error::ThingNotFound(object.clone()))?;
        let id = repo.next_statement_id().await?;
        let statement = Statement::new(id.clone(), subject, predicate, object, self.now()).with_created_by(contributor);
        repo.save_statement(statement).await?;
        Ok(id)
    }

    /// Check that a statement over `predicate` to `object` could be added,
    /// before anything is written.
    pub(crate) async fn ensure_linkable(&self, predicate: &ThingId, object: &ThingId) -> Result<()> {
        if self.repository.find_predicate(predicate).await?.is_none() {
            return Err(Error::PredicateNotFound(predicate.clone()));
        }
        if !self.repository.exists(object).await? {
            return Err(Error::ThingNotFound(object.clone()));
        }
        Ok(())
    }

    /// All statements of `subject` over `predicate`, oldest first.
    pub(crate) async fn outgoing(&self, subject: &ThingId, predicate: &str) -> Result<Vec<Statement>> {
        let query = StatementQuery {
            subject_id: Some(subject.clone()),
            predicate_id: Some(ThingId::new(predicate)?),
            ..StatementQuery::default()
        };
        self.statements(&query).await
    }

    /// All statements pointing at `object` over `predicate`, oldest first.
    pub(crate) async fn incoming(&self, object: &ThingId, predicate: &str) -> Result<Vec<Statement>> {
        let query = StatementQuery {
            object_id: Some(object.clone()),
            predicate_id: Some(ThingId::new(predicate)?),
            ..StatementQuery::default()
        };
        self.statements(&query).await
    }

    async fn statements(&self, query: &StatementQuery) -> Result<Vec<Statement>> {
        let page = PageRequest::unpaged().with_sort(
            Sort::by("created_at", SortDirection::Asc).then("index", SortDirection::Asc).then("id", SortDirection::Asc),
        );
        Ok(self.repository.find_statements(query, &page).await?.content)
    }

    /// A resource that must carry `class`; `missing` builds the not-found error.
    pub(crate) async fn find_classed(
        &self,
        id: &ThingId,
        class: &str,
        missing: impl FnOnce(ThingId) -> Error,
    ) -> Result<Resource> {
        match self.repository.find_resource(id).await? {
            Some(r) if r.has_class(class) => Ok(r),
            _ => Err(missing(id.clone())),
        }
    }
}

/// Sort and cut a page of resources the way the repository does.
pub(crate) fn page_resources(resources: Vec<Resource>, page: &PageRequest) -> Result<Page<Resource>> {
    Ok(crate::paging::paged(crate::storage::sort_resources(resources, page)?, page))
}
