//! Papers and their contributions.
//!
//! A paper is a `Paper` resource linked to its research fields (`P30`), its
//! DOI literal (`P26`) and its contributions (`P31`). Contributions point at
//! the research problems they address (`P32`).

use super::doi::{Doi, DOI_PREFIX};
use super::{page_resources, ServiceContext};
use crate::model::vocab::{classes, predicates};
use crate::model::*;
use crate::paging::{Page, PageRequest};
use crate::query::ResourceQuery;
use crate::search::SearchFilter;
use crate::storage::GraphRepository;
use crate::{Error, Result};

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CreateContributionCommand {
    pub label: String,
    pub research_problems: Vec<ThingId>,
    /// Additional `(predicate, object)` pairs of the contribution.
    pub statements: Vec<(ThingId, ThingId)>,
}

#[derive(Debug, Clone, Default)]
pub struct CreatePaperCommand {
    pub title: String,
    pub contributor: ContributorId,
    pub research_fields: Vec<ThingId>,
    pub doi: Option<String>,
    pub observatory: ObservatoryId,
    pub organization: OrganizationId,
    pub extraction_method: ExtractionMethod,
    pub contributions: Vec<CreateContributionCommand>,
}

impl CreatePaperCommand {
    pub fn new(title: impl Into<String>, contributor: ContributorId) -> Self {
        Self { title: title.into(), contributor, ..Self::default() }
    }

    pub fn with_research_field(mut self, field: ThingId) -> Self {
        self.research_fields.push(field);
        self
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn with_observatory(mut self, observatory: ObservatoryId) -> Self {
        self.observatory = observatory;
        self
    }

    pub fn with_contribution(mut self, contribution: CreateContributionCommand) -> Self {
        self.contributions.push(contribution);
        self
    }
}

#[derive(Debug, Clone)]
pub struct UpdatePaperCommand {
    pub paper_id: ThingId,
    pub contributor: ContributorId,
    pub title: Option<String>,
    pub research_fields: Option<Vec<ThingId>>,
    pub visibility: Option<Visibility>,
}

impl UpdatePaperCommand {
    pub fn new(paper_id: ThingId, contributor: ContributorId) -> Self {
        Self { paper_id, contributor, title: None, research_fields: None, visibility: None }
    }
}

// ============================================================================
// PaperService
// ============================================================================

pub struct PaperService<B: GraphRepository> {
    ctx: ServiceContext<B>,
}

impl<B: GraphRepository> PaperService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, command: CreatePaperCommand) -> Result<ThingId> {
        let title = command.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidParameter { name: "title".into(), reason: "must not be blank".into() });
        }
        self.ensure_title_unused(title, None).await?;
        let doi = command.doi.as_deref().map(Doi::parse).transpose()?;
        if let Some(doi) = &doi {
            if self.find_by_doi(doi).await?.is_some() {
                return Err(Error::PaperIdentifierAlreadyExists(doi.to_string()));
            }
        }
        for field in &command.research_fields {
            self.ctx.find_classed(field, classes::RESEARCH_FIELD, Error::ResearchFieldNotFound).await?;
        }
        for contribution in &command.contributions {
            for problem in &contribution.research_problems {
                self.ctx.find_classed(problem, classes::PROBLEM, Error::ResearchProblemNotFound).await?;
            }
            for (predicate, object) in &contribution.statements {
                self.ctx.ensure_linkable(predicate, object).await?;
            }
        }

        let contributor = command.contributor;
        let id = self.ctx.repository.next_thing_id().await?;
        let mut paper = Resource::new(id.clone(), title, self.ctx.now())
            .with_classes([ThingId::from_static(classes::PAPER)])
            .with_created_by(contributor)
            .with_observatory(command.observatory)
            .with_organization(command.organization);
        paper.extraction_method = command.extraction_method;
        self.ctx.repository.save_thing(paper.into()).await?;

        let has_field = ThingId::from_static(predicates::HAS_RESEARCH_FIELD);
        for field in &command.research_fields {
            self.ctx.link(&id, &has_field, field, contributor).await?;
        }
        if let Some(doi) = doi {
            self.attach_doi(&id, &doi, contributor).await?;
        }
        for contribution in &command.contributions {
            self.create_contribution(&id, contribution, contributor).await?;
        }

        tracing::info!(paper = %id, %contributor, contributions = command.contributions.len(), "created paper");
        Ok(id)
    }

    async fn create_contribution(
        &self,
        paper: &ThingId,
        command: &CreateContributionCommand,
        contributor: ContributorId,
    ) -> Result<ThingId> {
        let contribution = self
            .ctx
            .create_resource(&command.label, [ThingId::from_static(classes::CONTRIBUTION)], contributor)
            .await?;
        let id = contribution.id;
        self.ctx
            .link(paper, &ThingId::from_static(predicates::HAS_CONTRIBUTION), &id, contributor)
            .await?;
        let has_problem = ThingId::from_static(predicates::HAS_RESEARCH_PROBLEM);
        for problem in &command.research_problems {
            self.ctx.link(&id, &has_problem, problem, contributor).await?;
        }
        for (predicate, object) in &command.statements {
            self.ctx.link(&id, predicate, object, contributor).await?;
        }
        Ok(id)
    }

    async fn attach_doi(&self, paper: &ThingId, doi: &Doi, contributor: ContributorId) -> Result<()> {
        let literal = self.ctx.create_string_literal(doi.as_str(), contributor).await?;
        self.ctx
            .link(paper, &ThingId::from_static(predicates::HAS_DOI), &literal.id, contributor)
            .await?;
        Ok(())
    }

    async fn find_by_doi(&self, doi: &Doi) -> Result<Option<Resource>> {
        self.ctx
            .repository
            .find_by_doi(doi.as_str(), &[ThingId::from_static(classes::PAPER)])
            .await
    }

    async fn ensure_title_unused(&self, title: &str, except: Option<&ThingId>) -> Result<()> {
        let query = ResourceQuery::of_class(ThingId::from_static(classes::PAPER)).with_label(title, true);
        let existing = self.ctx.repository.find_resources(&query, &PageRequest::unpaged()).await?;
        if existing.content.iter().any(|p| Some(&p.id) != except) {
            return Err(Error::PaperTitleAlreadyExists(title.to_string()));
        }
        Ok(())
    }

    pub async fn find(&self, id: &ThingId) -> Result<Resource> {
        self.ctx.find_classed(id, classes::PAPER, Error::PaperNotFound).await
    }

    /// The DOI of a paper, if it has been published.
    pub async fn doi(&self, id: &ThingId) -> Result<Option<String>> {
        self.find(id).await?;
        Ok(self
            .ctx
            .outgoing(id, predicates::HAS_DOI)
            .await?
            .into_iter()
            .find_map(|s| s.object.as_literal().map(|l| l.label.clone())))
    }

    pub async fn contributions(&self, id: &ThingId) -> Result<Vec<Resource>> {
        self.find(id).await?;
        Ok(self
            .ctx
            .outgoing(id, predicates::HAS_CONTRIBUTION)
            .await?
            .into_iter()
            .filter_map(|s| s.object.as_resource().cloned())
            .collect())
    }

    pub async fn list(&self, mut query: ResourceQuery, page: &PageRequest) -> Result<Page<Resource>> {
        query.include_classes.insert(ThingId::from_static(classes::PAPER));
        self.ctx.repository.find_resources(&query, &self.ctx.page(page)).await
    }

    /// Papers with a contribution satisfying all `filters`.
    pub async fn list_by_filters(
        &self,
        observatory: Option<ObservatoryId>,
        filters: &[SearchFilter],
        visibility: VisibilityFilter,
        page: &PageRequest,
    ) -> Result<Page<Resource>> {
        for filter in filters {
            filter.validate()?;
        }
        self.ctx
            .repository
            .find_papers_by_filters(observatory, filters, visibility, &self.ctx.page(page))
            .await
    }

    pub async fn update(&self, command: UpdatePaperCommand) -> Result<()> {
        let mut paper = self.find(&command.paper_id).await?;
        if !paper.modifiable {
            return Err(Error::PaperNotModifiable(paper.id));
        }
        if let Some(title) = command.title.as_deref().map(str::trim) {
            if title.is_empty() {
                return Err(Error::InvalidParameter { name: "title".into(), reason: "must not be blank".into() });
            }
            if title != paper.label {
                self.ensure_title_unused(title, Some(&paper.id)).await?;
                paper.label = title.to_string();
            }
        }
        if let Some(visibility) = command.visibility {
            paper.visibility = visibility;
        }
        if let Some(fields) = &command.research_fields {
            for field in fields {
                self.ctx.find_classed(field, classes::RESEARCH_FIELD, Error::ResearchFieldNotFound).await?;
            }
            for statement in self.ctx.outgoing(&paper.id, predicates::HAS_RESEARCH_FIELD).await? {
                self.ctx.repository.delete_statement(&statement.id).await?;
            }
            let has_field = ThingId::from_static(predicates::HAS_RESEARCH_FIELD);
            for field in fields {
                self.ctx.link(&paper.id, &has_field, field, command.contributor).await?;
            }
        }
        let id = paper.id.clone();
        self.ctx.repository.save_thing(paper.into()).await?;
        tracing::info!(paper = %id, contributor = %command.contributor, "updated paper");
        Ok(())
    }

    /// Assign a DOI to the paper. A paper can only be published once.
    pub async fn publish(&self, id: &ThingId, contributor: ContributorId) -> Result<Doi> {
        let paper = self.find(id).await?;
        if self.doi(id).await?.is_some() {
            return Err(Error::PaperAlreadyPublished(paper.id));
        }
        let doi = Doi::parse(&format!("{DOI_PREFIX}/{}", paper.id))?;
        self.attach_doi(&paper.id, &doi, contributor).await?;
        tracing::info!(paper = %paper.id, %doi, "published paper");
        Ok(doi)
    }

    pub async fn contributors(&self, id: &ThingId, page: &PageRequest) -> Result<Page<ContributorId>> {
        self.find(id).await?;
        self.ctx.repository.find_contributors(id, &self.ctx.page(page)).await
    }

    pub async fn timeline(&self, id: &ThingId, page: &PageRequest) -> Result<Page<ResourceContributor>> {
        self.find(id).await?;
        self.ctx.repository.find_timeline(id, &self.ctx.page(page)).await
    }

    /// Papers listed under `field`.
    pub async fn list_by_research_field(
        &self,
        field: &ThingId,
        visibility: VisibilityFilter,
        page: &PageRequest,
    ) -> Result<Page<Resource>> {
        let papers = self
            .ctx
            .incoming(field, predicates::HAS_RESEARCH_FIELD)
            .await?
            .into_iter()
            .filter_map(|s| s.subject.as_resource().cloned())
            .filter(|r| r.has_class(classes::PAPER) && visibility.matches(r.visibility))
            .collect();
        page_resources(papers, &self.ctx.page(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Orkg;
    use pretty_assertions::assert_eq;

    async fn setup() -> (Orkg<crate::storage::MemoryGraph>, ThingId) {
        let orkg = Orkg::open_memory().await.unwrap();
        let field = orkg.create_resource("Computer Science", classes::RESEARCH_FIELD).await.unwrap();
        (orkg, field)
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (orkg, field) = setup().await;
        let alice = ContributorId::random();
        let id = orkg
            .papers()
            .create(CreatePaperCommand::new("A paper", alice).with_research_field(field.clone()))
            .await
            .unwrap();
        let paper = orkg.papers().find(&id).await.unwrap();
        assert_eq!(paper.label, "A paper");
        assert_eq!(paper.created_by, alice);
        assert!(paper.has_class(classes::PAPER));

        let in_field = orkg
            .papers()
            .list_by_research_field(&field, VisibilityFilter::AllListed, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(in_field.content.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_title_and_doi() {
        let (orkg, _) = setup().await;
        let alice = ContributorId::random();
        orkg.papers()
            .create(CreatePaperCommand::new("Unique", alice).with_doi("10.1000/abc"))
            .await
            .unwrap();

        let err = orkg.papers().create(CreatePaperCommand::new("  unique ", alice)).await.unwrap_err();
        assert!(matches!(err, Error::PaperTitleAlreadyExists(_)));

        let err = orkg
            .papers()
            .create(CreatePaperCommand::new("Other", alice).with_doi("https://doi.org/10.1000/ABC"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PaperIdentifierAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_unknown_research_field() {
        let (orkg, _) = setup().await;
        let err = orkg
            .papers()
            .create(CreatePaperCommand::new("X", ContributorId::UNKNOWN).with_research_field(ThingId::from_static("R999")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), 404);
        assert!(matches!(err, Error::ResearchFieldNotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_create_writes_nothing() {
        let (orkg, _) = setup().await;
        let who = ContributorId::random();
        let known = orkg.create_predicate("uses").await.unwrap();
        let object = orkg.create_literal("value").await.unwrap();
        let things = orkg.repository().thing_count();
        let statements = orkg.repository().statement_count();

        let contribution = |predicate: &str, object: &ThingId| CreateContributionCommand {
            label: "Contribution 1".into(),
            research_problems: Vec::new(),
            statements: vec![(ThingId::new(predicate).unwrap(), object.clone())],
        };
        let err = orkg
            .papers()
            .create(CreatePaperCommand::new("Half written", who).with_contribution(contribution("P_MISSING", &object)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PredicateNotFound(ref p) if p.as_str() == "P_MISSING"));
        let err = orkg
            .papers()
            .create(
                CreatePaperCommand::new("Half written", who)
                    .with_contribution(contribution(known.as_str(), &ThingId::from_static("R404"))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ThingNotFound(_)));
        assert_eq!(orkg.repository().thing_count(), things);
        assert_eq!(orkg.repository().statement_count(), statements);

        // the title is still free
        let id = orkg
            .papers()
            .create(CreatePaperCommand::new("Half written", who).with_contribution(contribution(known.as_str(), &object)))
            .await
            .unwrap();
        assert_eq!(orkg.papers().contributions(&id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_non_paper_is_not_found() {
        let (orkg, field) = setup().await;
        let err = orkg.papers().find(&field).await.unwrap_err();
        assert!(matches!(err, Error::PaperNotFound(id) if id == field));
    }

    #[tokio::test]
    async fn test_update_unmodifiable_paper() {
        let (orkg, _) = setup().await;
        let id = orkg.papers().create(CreatePaperCommand::new("Frozen", ContributorId::UNKNOWN)).await.unwrap();
        let mut paper = orkg.papers().find(&id).await.unwrap();
        paper.modifiable = false;
        orkg.repository().save_thing(paper.into()).await.unwrap();

        let mut command = UpdatePaperCommand::new(id.clone(), ContributorId::UNKNOWN);
        command.title = Some("Thawed".into());
        let err = orkg.papers().update(command).await.unwrap_err();
        assert!(matches!(err, Error::PaperNotModifiable(_)));
        assert_eq!(err.status(), 403);
    }

    #[tokio::test]
    async fn test_publish_once() {
        let (orkg, _) = setup().await;
        let id = orkg.papers().create(CreatePaperCommand::new("To publish", ContributorId::UNKNOWN)).await.unwrap();
        let doi = orkg.papers().publish(&id, ContributorId::UNKNOWN).await.unwrap();
        assert_eq!(doi.as_str(), format!("10.48366/{id}"));
        assert_eq!(orkg.papers().doi(&id).await.unwrap(), Some(doi.to_string()));

        let err = orkg.papers().publish(&id, ContributorId::UNKNOWN).await.unwrap_err();
        assert!(matches!(err, Error::PaperAlreadyPublished(_)));
    }
}
