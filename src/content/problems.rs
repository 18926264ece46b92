//! Research problems and research fields.

use hashbrown::HashSet;

use super::{page_resources, ServiceContext};
use crate::model::vocab::{classes, predicates};
use crate::model::*;
use crate::paging::{Page, PageRequest};
use crate::storage::GraphRepository;
use crate::{Error, Result};

pub struct ResearchProblemService<B: GraphRepository> {
    ctx: ServiceContext<B>,
}

impl<B: GraphRepository> ResearchProblemService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, label: &str, contributor: ContributorId) -> Result<ThingId> {
        let problem = self
            .ctx
            .create_resource(label, [ThingId::from_static(classes::PROBLEM)], contributor)
            .await?;
        tracing::info!(problem = %problem.id, "created research problem");
        Ok(problem.id)
    }

    pub async fn find(&self, id: &ThingId) -> Result<Resource> {
        self.ctx.find_classed(id, classes::PROBLEM, Error::ResearchProblemNotFound).await
    }

    /// Problems addressed by the papers of an observatory.
    pub async fn list_by_observatory(&self, observatory: ObservatoryId, page: &PageRequest) -> Result<Page<Resource>> {
        self.ctx
            .repository
            .find_problems_by_observatory(observatory, &self.ctx.page(page))
            .await
    }

    /// Contributions addressing a problem.
    pub async fn contributions(&self, id: &ThingId) -> Result<Vec<Resource>> {
        self.find(id).await?;
        Ok(self
            .ctx
            .incoming(id, predicates::HAS_RESEARCH_PROBLEM)
            .await?
            .into_iter()
            .filter_map(|s| s.subject.as_resource().cloned())
            .filter(|r| r.has_class(classes::CONTRIBUTION))
            .collect())
    }

    /// Papers with a contribution addressing the problem.
    pub async fn papers(&self, id: &ThingId, visibility: VisibilityFilter, page: &PageRequest) -> Result<Page<Resource>> {
        let mut seen = HashSet::new();
        let mut papers = Vec::new();
        for contribution in self.contributions(id).await? {
            for statement in self.ctx.incoming(&contribution.id, predicates::HAS_CONTRIBUTION).await? {
                if let Some(paper) = statement.subject.as_resource() {
                    if paper.has_class(classes::PAPER)
                        && visibility.matches(paper.visibility)
                        && seen.insert(paper.id.clone())
                    {
                        papers.push(paper.clone());
                    }
                }
            }
        }
        page_resources(papers, &self.ctx.page(page))
    }
}

pub struct ResearchFieldService<B: GraphRepository> {
    ctx: ServiceContext<B>,
}

impl<B: GraphRepository> ResearchFieldService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        Self { ctx }
    }

    /// Create a field, optionally as subfield of `parent`.
    pub async fn create(&self, label: &str, parent: Option<&ThingId>, contributor: ContributorId) -> Result<ThingId> {
        if let Some(parent) = parent {
            self.find(parent).await?;
        }
        let field = self
            .ctx
            .create_resource(label, [ThingId::from_static(classes::RESEARCH_FIELD)], contributor)
            .await?;
        if let Some(parent) = parent {
            self.ctx
                .link(parent, &ThingId::from_static(predicates::HAS_SUBFIELD), &field.id, contributor)
                .await?;
        }
        tracing::info!(field = %field.id, parent = ?parent, "created research field");
        Ok(field.id)
    }

    pub async fn find(&self, id: &ThingId) -> Result<Resource> {
        self.ctx.find_classed(id, classes::RESEARCH_FIELD, Error::ResearchFieldNotFound).await
    }

    /// Direct subfields.
    pub async fn subfields(&self, id: &ThingId) -> Result<Vec<Resource>> {
        self.find(id).await?;
        Ok(self
            .ctx
            .outgoing(id, predicates::HAS_SUBFIELD)
            .await?
            .into_iter()
            .filter_map(|s| s.object.as_resource().cloned())
            .filter(|r| r.has_class(classes::RESEARCH_FIELD))
            .collect())
    }

    /// The field and, transitively, all its subfields.
    pub async fn descendants(&self, id: &ThingId) -> Result<Vec<ThingId>> {
        self.find(id).await?;
        let mut seen: HashSet<ThingId> = HashSet::from_iter([id.clone()]);
        let mut result = vec![id.clone()];
        let mut frontier = vec![id.clone()];
        while let Some(next) = frontier.pop() {
            for statement in self.ctx.outgoing(&next, predicates::HAS_SUBFIELD).await? {
                let child = statement.object.id();
                if seen.insert(child.clone()) {
                    result.push(child.clone());
                    frontier.push(child.clone());
                }
            }
        }
        Ok(result)
    }

    /// Papers of a field, optionally including papers of all subfields.
    pub async fn papers(
        &self,
        id: &ThingId,
        include_subfields: bool,
        visibility: VisibilityFilter,
        page: &PageRequest,
    ) -> Result<Page<Resource>> {
        let fields = if include_subfields { self.descendants(id).await? } else { vec![self.find(id).await?.id] };
        let mut seen = HashSet::new();
        let mut papers = Vec::new();
        for field in &fields {
            for statement in self.ctx.incoming(field, predicates::HAS_RESEARCH_FIELD).await? {
                if let Some(paper) = statement.subject.as_resource() {
                    if paper.has_class(classes::PAPER)
                        && visibility.matches(paper.visibility)
                        && seen.insert(paper.id.clone())
                    {
                        papers.push(paper.clone());
                    }
                }
            }
        }
        tracing::debug!(field = %id, fields = fields.len(), papers = papers.len(), "listed papers of research field");
        page_resources(papers, &self.ctx.page(page))
    }

    /// Research problems addressed by papers of the field.
    pub async fn problems(&self, id: &ThingId, page: &PageRequest) -> Result<Page<Resource>> {
        let papers = self.papers(id, false, VisibilityFilter::AllListed, &PageRequest::unpaged()).await?;
        let mut seen = HashSet::new();
        let mut problems = Vec::new();
        for paper in papers.content {
            for contribution in self.ctx.outgoing(&paper.id, predicates::HAS_CONTRIBUTION).await? {
                for statement in self.ctx.outgoing(contribution.object.id(), predicates::HAS_RESEARCH_PROBLEM).await? {
                    if let Some(problem) = statement.object.as_resource() {
                        if seen.insert(problem.id.clone()) {
                            problems.push(problem.clone());
                        }
                    }
                }
            }
        }
        page_resources(problems, &self.ctx.page(page))
    }
}
