//! Benchmark summaries.
//!
//! A contribution is benchmarked when it links a benchmark (`HAS_BENCHMARK`);
//! benchmarks link their datasets (`HAS_DATASET`) and contributions link
//! their source code (`HAS_SOURCE_CODE`).

use std::collections::BTreeMap;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use super::{page_resources, ServiceContext};
use crate::model::vocab::{classes, predicates};
use crate::model::*;
use crate::paging::{paged, Page, PageRequest};
use crate::query::ResourceQuery;
use crate::storage::GraphRepository;
use crate::{Error, Result};

/// Benchmark totals of one research problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub research_problem: Resource,
    pub research_fields: Vec<Resource>,
    pub total_papers: usize,
    pub total_datasets: usize,
    pub total_codes: usize,
}

#[derive(Default)]
struct Totals {
    problem: Option<Resource>,
    fields: BTreeMap<ThingId, Resource>,
    papers: HashSet<ThingId>,
    datasets: HashSet<ThingId>,
    codes: HashSet<ThingId>,
}

pub struct BenchmarkService<B: GraphRepository> {
    ctx: ServiceContext<B>,
}

impl<B: GraphRepository> BenchmarkService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        Self { ctx }
    }

    /// Summaries per research problem of the benchmarked papers of a field,
    /// ordered by problem id.
    pub async fn summaries_for_field(&self, field: &ThingId, page: &PageRequest) -> Result<Page<BenchmarkSummary>> {
        let field = self.ctx.find_classed(field, classes::RESEARCH_FIELD, Error::ResearchFieldNotFound).await?;
        let mut totals: BTreeMap<ThingId, Totals> = BTreeMap::new();

        for paper in self.papers_of(&field.id).await? {
            for contribution in self.ctx.outgoing(&paper.id, predicates::HAS_CONTRIBUTION).await? {
                let contribution = contribution.object.id();
                let benchmarks = self.ctx.outgoing(contribution, predicates::HAS_BENCHMARK).await?;
                if benchmarks.is_empty() {
                    continue;
                }
                let mut datasets = Vec::new();
                for benchmark in &benchmarks {
                    for dataset in self.ctx.outgoing(benchmark.object.id(), predicates::HAS_DATASET).await? {
                        datasets.push(dataset.object.id().clone());
                    }
                }
                let codes: Vec<ThingId> = self
                    .ctx
                    .outgoing(contribution, predicates::HAS_SOURCE_CODE)
                    .await?
                    .into_iter()
                    .map(|s| s.object.id().clone())
                    .collect();

                for problem in self.ctx.outgoing(contribution, predicates::HAS_RESEARCH_PROBLEM).await? {
                    let Some(resource) = problem.object.as_resource() else { continue };
                    let entry = totals.entry(resource.id.clone()).or_default();
                    entry.problem.get_or_insert_with(|| resource.clone());
                    entry.fields.insert(field.id.clone(), field.clone());
                    entry.papers.insert(paper.id.clone());
                    entry.datasets.extend(datasets.iter().cloned());
                    entry.codes.extend(codes.iter().cloned());
                }
            }
        }

        let summaries: Vec<BenchmarkSummary> = totals
            .into_values()
            .filter_map(|t| {
                Some(BenchmarkSummary {
                    research_problem: t.problem?,
                    research_fields: t.fields.into_values().collect(),
                    total_papers: t.papers.len(),
                    total_datasets: t.datasets.len(),
                    total_codes: t.codes.len(),
                })
            })
            .collect();
        tracing::debug!(field = %field.id, problems = summaries.len(), "summarized benchmarks");
        Ok(paged(summaries, &self.ctx.page(page)))
    }

    /// Research fields with at least one benchmarked paper.
    pub async fn fields_with_benchmarks(&self, page: &PageRequest) -> Result<Page<Resource>> {
        let query = ResourceQuery::of_class(ThingId::from_static(classes::RESEARCH_FIELD));
        let fields = self.ctx.repository.find_resources(&query, &PageRequest::unpaged()).await?;
        let mut benchmarked = Vec::new();
        for field in fields.content {
            if self.has_benchmark(&field.id).await? {
                benchmarked.push(field);
            }
        }
        page_resources(benchmarked, &self.ctx.page(page))
    }

    async fn has_benchmark(&self, field: &ThingId) -> Result<bool> {
        for paper in self.papers_of(field).await? {
            for contribution in self.ctx.outgoing(&paper.id, predicates::HAS_CONTRIBUTION).await? {
                if !self.ctx.outgoing(contribution.object.id(), predicates::HAS_BENCHMARK).await?.is_empty() {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn papers_of(&self, field: &ThingId) -> Result<Vec<Resource>> {
        Ok(self
            .ctx
            .incoming(field, predicates::HAS_RESEARCH_FIELD)
            .await?
            .into_iter()
            .filter_map(|s| s.subject.as_resource().cloned())
            .filter(|r| r.has_class(classes::PAPER))
            .collect())
    }
}
