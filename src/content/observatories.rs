//! Observatories and their saved search filters.
//!
//! An observatory keeps named filters that its members reuse when searching
//! the observatory's papers. A saved filter fixes the path, range and
//! exactness of a [`SearchFilter`](crate::search::SearchFilter); the values
//! are supplied per search.

use super::papers::PaperService;
use super::ServiceContext;
use crate::model::vocab::classes;
use crate::model::*;
use crate::paging::{Page, PageRequest};
use crate::search::{FilterValue, MAX_PATH_LENGTH};
use crate::storage::GraphRepository;
use crate::{Error, Result};

// ============================================================================
// Observatories
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CreateObservatoryCommand {
    pub id: Option<ObservatoryId>,
    pub name: String,
    pub description: String,
    pub research_field: Option<ThingId>,
    pub members: Vec<ContributorId>,
}

impl CreateObservatoryCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_research_field(mut self, field: ThingId) -> Self {
        self.research_field = Some(field);
        self
    }
}

pub struct ObservatoryService<B: GraphRepository> {
    ctx: ServiceContext<B>,
}

impl<B: GraphRepository> ObservatoryService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, command: CreateObservatoryCommand) -> Result<ObservatoryId> {
        let name = command.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidParameter { name: "name".into(), reason: "must not be blank".into() });
        }
        if let Some(field) = &command.research_field {
            self.ctx.find_classed(field, classes::RESEARCH_FIELD, Error::ResearchFieldNotFound).await?;
        }
        let id = command.id.unwrap_or_else(ObservatoryId::random);
        let observatory = Observatory {
            id,
            name: name.to_string(),
            description: command.description,
            research_field: command.research_field,
            members: command.members,
            display_id: display_id(name),
        };
        self.ctx.repository.save_observatory(observatory).await?;
        tracing::info!(observatory = %id, "created observatory");
        Ok(id)
    }

    pub async fn find(&self, id: ObservatoryId) -> Result<Observatory> {
        self.ctx
            .repository
            .find_observatory(id)
            .await?
            .ok_or(Error::ObservatoryNotFound(id))
    }
}

/// Lowercase the name and join its words with underscores.
fn display_id(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

// ============================================================================
// Saved filters
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreateObservatoryFilterCommand {
    /// Use this id instead of a fresh one.
    pub id: Option<ObservatoryFilterId>,
    pub observatory_id: ObservatoryId,
    pub label: String,
    pub contributor: ContributorId,
    pub path: Vec<ThingId>,
    pub range: ThingId,
    pub exact: bool,
    pub featured: bool,
}

/// Fields left as `None` keep their current value.
#[derive(Debug, Clone)]
pub struct UpdateObservatoryFilterCommand {
    pub id: ObservatoryFilterId,
    pub label: Option<String>,
    pub path: Option<Vec<ThingId>>,
    pub range: Option<ThingId>,
    pub exact: Option<bool>,
    pub featured: Option<bool>,
}

impl UpdateObservatoryFilterCommand {
    pub fn new(id: ObservatoryFilterId) -> Self {
        Self { id, label: None, path: None, range: None, exact: None, featured: None }
    }
}

pub struct ObservatoryFilterService<B: GraphRepository> {
    ctx: ServiceContext<B>,
    observatories: ObservatoryService<B>,
    papers: PaperService<B>,
}

impl<B: GraphRepository> ObservatoryFilterService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        let observatories = ObservatoryService::new(ctx.clone());
        let papers = PaperService::new(ctx.clone());
        Self { ctx, observatories, papers }
    }

    /// Checks run in order: observatory, range class, path predicates, id.
    pub async fn create(&self, command: CreateObservatoryFilterCommand) -> Result<ObservatoryFilterId> {
        self.observatories.find(command.observatory_id).await?;
        let label = valid_label(&command.label)?;
        self.ensure_range(&command.range).await?;
        self.ensure_path(&command.path).await?;
        let id = match command.id {
            Some(id) => {
                if self.ctx.repository.find_observatory_filter(id).await?.is_some() {
                    return Err(Error::ObservatoryFilterAlreadyExists(id));
                }
                id
            }
            None => ObservatoryFilterId::random(),
        };

        let filter = ObservatoryFilter {
            id,
            observatory_id: command.observatory_id,
            label,
            created_by: command.contributor,
            created_at: self.ctx.now(),
            path: command.path.into_iter().collect(),
            range: command.range,
            exact: command.exact,
            featured: command.featured,
        };
        self.ctx.repository.save_observatory_filter(filter).await?;
        tracing::info!(filter = %id, observatory = %command.observatory_id, "created observatory filter");
        Ok(id)
    }

    pub async fn update(&self, command: UpdateObservatoryFilterCommand) -> Result<()> {
        let mut filter = self
            .ctx
            .repository
            .find_observatory_filter(command.id)
            .await?
            .ok_or(Error::ObservatoryFilterNotFound(command.id))?;
        if let Some(label) = &command.label {
            filter.label = valid_label(label)?;
        }
        if let Some(range) = command.range {
            self.ensure_range(&range).await?;
            filter.range = range;
        }
        if let Some(path) = command.path {
            self.ensure_path(&path).await?;
            filter.path = path.into_iter().collect();
        }
        if let Some(exact) = command.exact {
            filter.exact = exact;
        }
        if let Some(featured) = command.featured {
            filter.featured = featured;
        }
        self.ctx.repository.save_observatory_filter(filter).await?;
        tracing::info!(filter = %command.id, "updated observatory filter");
        Ok(())
    }

    /// A filter of `observatory`. Filters of other observatories are not found.
    pub async fn find(&self, observatory: ObservatoryId, id: ObservatoryFilterId) -> Result<ObservatoryFilter> {
        self.observatories.find(observatory).await?;
        match self.ctx.repository.find_observatory_filter(id).await? {
            Some(filter) if filter.observatory_id == observatory => Ok(filter),
            _ => Err(Error::ObservatoryFilterNotFound(id)),
        }
    }

    pub async fn list(
        &self,
        observatory: ObservatoryId,
        featured: Option<bool>,
        page: &PageRequest,
    ) -> Result<Page<ObservatoryFilter>> {
        self.observatories.find(observatory).await?;
        self.ctx
            .repository
            .find_observatory_filters(observatory, featured, &self.ctx.page(page))
            .await
    }

    /// Deleting a filter that does not exist is a no-op.
    pub async fn delete(&self, observatory: ObservatoryId, id: ObservatoryFilterId) -> Result<()> {
        self.observatories.find(observatory).await?;
        let owned = self
            .ctx
            .repository
            .find_observatory_filter(id)
            .await?
            .is_some_and(|f| f.observatory_id == observatory);
        if owned {
            self.ctx.repository.delete_observatory_filter(id).await?;
            tracing::info!(filter = %id, %observatory, "deleted observatory filter");
        }
        Ok(())
    }

    /// Papers of the observatory whose contributions match the saved filter
    /// with `values`.
    pub async fn papers(
        &self,
        observatory: ObservatoryId,
        id: ObservatoryFilterId,
        values: Vec<FilterValue>,
        visibility: VisibilityFilter,
        page: &PageRequest,
    ) -> Result<Page<Resource>> {
        let filter = self.find(observatory, id).await?.search_filter(values)?;
        self.papers.list_by_filters(Some(observatory), &[filter], visibility, page).await
    }

    async fn ensure_range(&self, range: &ThingId) -> Result<()> {
        match self.ctx.repository.find_class(range).await? {
            Some(_) => Ok(()),
            None => Err(Error::ClassNotFound(range.clone())),
        }
    }

    async fn ensure_path(&self, path: &[ThingId]) -> Result<()> {
        if path.is_empty() || path.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidPath { length: path.len(), max: MAX_PATH_LENGTH });
        }
        for predicate in path {
            if self.ctx.repository.find_predicate(predicate).await?.is_none() {
                return Err(Error::PredicateNotFound(predicate.clone()));
            }
        }
        Ok(())
    }
}

fn valid_label(label: &str) -> Result<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(Error::InvalidParameter { name: "label".into(), reason: "must not be blank".into() });
    }
    Ok(label.to_string())
}
