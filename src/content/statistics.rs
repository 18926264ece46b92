//! Contributor and predicate statistics.

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::ServiceContext;
use crate::model::*;
use crate::paging::{paged, Page, PageRequest};
use crate::query::{ResourceQuery, StatementQuery};
use crate::storage::GraphRepository;
use crate::Result;

/// What one contributor created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorRecord {
    pub contributor: ContributorId,
    pub resources: u64,
    pub statements: u64,
    pub total: u64,
}

pub struct StatisticsService<B: GraphRepository> {
    ctx: ServiceContext<B>,
}

impl<B: GraphRepository> StatisticsService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        Self { ctx }
    }

    /// Resources and statements per contributor, created at or after `after`
    /// when given. Most active first; the unknown contributor is left out.
    pub async fn contributors(&self, after: Option<DateTime<Utc>>, page: &PageRequest) -> Result<Page<ContributorRecord>> {
        let resources = self
            .ctx
            .repository
            .find_resources(&ResourceQuery::new().with_created_between(after, None), &PageRequest::unpaged())
            .await?;
        let statements = self
            .ctx
            .repository
            .find_statements(
                &StatementQuery { created_at_start: after, ..StatementQuery::default() },
                &PageRequest::unpaged(),
            )
            .await?;

        let mut counts: HashMap<ContributorId, (u64, u64)> = HashMap::new();
        for resource in &resources.content {
            counts.entry(resource.created_by).or_default().0 += 1;
        }
        for statement in &statements.content {
            counts.entry(statement.created_by).or_default().1 += 1;
        }
        counts.remove(&ContributorId::UNKNOWN);

        let mut records: Vec<ContributorRecord> = counts
            .into_iter()
            .map(|(contributor, (resources, statements))| ContributorRecord {
                contributor,
                resources,
                statements,
                total: resources + statements,
            })
            .collect();
        records.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.contributor.cmp(&b.contributor)));
        Ok(paged(records, &self.ctx.page(page)))
    }

    pub async fn predicate_usage(&self, page: &PageRequest) -> Result<Page<PredicateUsage>> {
        self.ctx.repository.count_predicate_usage(&self.ctx.page(page)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::storage::MemoryGraph;
    use crate::Orkg;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_contributor_statistics() {
        let clock = Arc::new(FixedClock::epoch());
        let orkg = Orkg::with_backend(MemoryGraph::new(), clock.clone(), Default::default()).await.unwrap();
        let alice = ContributorId::random();
        let bob = ContributorId::random();

        orkg.research_problems().create("old problem", alice).await.unwrap();
        clock.advance(Duration::days(2));
        let cutoff = clock.now();
        let problem = orkg.research_problems().create("new problem", bob).await.unwrap();
        let field = orkg.research_fields().create("field", None, bob).await.unwrap();
        orkg.research_fields().create("subfield", Some(&field), alice).await.unwrap();

        let all = orkg.statistics().contributors(None, &PageRequest::default()).await.unwrap();
        assert_eq!(all.total_elements(), 2);
        // alice: two resources and one statement; bob: two resources
        assert_eq!(all.content[0], ContributorRecord { contributor: alice, resources: 2, statements: 1, total: 3 });

        let recent = orkg.statistics().contributors(Some(cutoff), &PageRequest::default()).await.unwrap();
        let bob_record = recent.content.iter().find(|r| r.contributor == bob).unwrap();
        assert_eq!(bob_record.resources, 2);
        let alice_record = recent.content.iter().find(|r| r.contributor == alice).unwrap();
        assert_eq!((alice_record.resources, alice_record.statements), (1, 1));
        assert!(orkg.research_problems().find(&problem).await.is_ok());
    }
}
