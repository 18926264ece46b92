//! Tables and visualizations: classed resources with their own not-found
//! errors and filtered listings.

use super::ServiceContext;
use crate::model::vocab::{classes, predicates};
use crate::model::*;
use crate::paging::{Page, PageRequest};
use crate::query::ResourceQuery;
use crate::storage::{BundleConfig, GraphRepository};
use crate::{Error, Result};

pub struct TableService<B: GraphRepository> {
    ctx: ServiceContext<B>,
}

impl<B: GraphRepository> TableService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        Self { ctx }
    }

    /// Create a table whose rows are the given `(predicate, object)` cells
    /// of a single row resource each.
    pub async fn create(&self, label: &str, rows: &[Vec<(ThingId, ThingId)>], contributor: ContributorId) -> Result<ThingId> {
        for (predicate, object) in rows.iter().flatten() {
            self.ctx.ensure_linkable(predicate, object).await?;
        }
        let table = self
            .ctx
            .create_resource(label, [ThingId::from_static(classes::TABLE)], contributor)
            .await?;
        let has_row = ThingId::from_static(predicates::HAS_ROW);
        for (i, cells) in rows.iter().enumerate() {
            let row = self.ctx.create_resource(format!("Row {}", i + 1), [ThingId::from_static(classes::ROW)], contributor).await?;
            self.ctx.link(&table.id, &has_row, &row.id, contributor).await?;
            for (predicate, object) in cells {
                self.ctx.link(&row.id, predicate, object, contributor).await?;
            }
        }
        tracing::info!(table = %table.id, rows = rows.len(), "created table");
        Ok(table.id)
    }

    pub async fn find(&self, id: &ThingId) -> Result<Resource> {
        self.ctx.find_classed(id, classes::TABLE, Error::TableNotFound).await
    }

    /// Rows of a table with their cell statements, in creation order.
    pub async fn rows(&self, id: &ThingId) -> Result<Vec<(Resource, Vec<Statement>)>> {
        self.find(id).await?;
        let mut rows = Vec::new();
        for statement in self.ctx.outgoing(id, predicates::HAS_ROW).await? {
            if let Some(row) = statement.object.as_resource() {
                let cells = self.ctx.repository.fetch_bundle(&row.id, &row_bundle()).await?;
                rows.push((row.clone(), cells));
            }
        }
        Ok(rows)
    }

    pub async fn list(&self, mut query: ResourceQuery, page: &PageRequest) -> Result<Page<Resource>> {
        query.include_classes.insert(ThingId::from_static(classes::TABLE));
        self.ctx.repository.find_resources(&query, &self.ctx.page(page)).await
    }
}

fn row_bundle() -> BundleConfig {
    BundleConfig { max_level: Some(1), ..BundleConfig::default() }
}

pub struct VisualizationService<B: GraphRepository> {
    ctx: ServiceContext<B>,
}

impl<B: GraphRepository> VisualizationService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, label: &str, description: Option<&str>, contributor: ContributorId) -> Result<ThingId> {
        let visualization = self
            .ctx
            .create_resource(label, [ThingId::from_static(classes::VISUALIZATION)], contributor)
            .await?;
        if let Some(description) = description {
            let literal = self.ctx.create_string_literal(description, contributor).await?;
            self.ctx
                .link(
                    &visualization.id,
                    &ThingId::from_static(predicates::DESCRIPTION),
                    &literal.id,
                    contributor,
                )
                .await?;
        }
        tracing::info!(visualization = %visualization.id, "created visualization");
        Ok(visualization.id)
    }

    pub async fn find(&self, id: &ThingId) -> Result<Resource> {
        self.ctx.find_classed(id, classes::VISUALIZATION, Error::VisualizationNotFound).await
    }

    pub async fn list(&self, mut query: ResourceQuery, page: &PageRequest) -> Result<Page<Resource>> {
        query.include_classes.insert(ThingId::from_static(classes::VISUALIZATION));
        self.ctx.repository.find_resources(&query, &self.ctx.page(page)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryGraph;
    use crate::Orkg;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_tables() {
        let orkg: Orkg<MemoryGraph> = Orkg::open_memory().await.unwrap();
        let who = ContributorId::random();
        let name = orkg.create_predicate("name").await.unwrap();
        let alice = orkg.create_literal("Alice").await.unwrap();
        let bob = orkg.create_literal("Bob").await.unwrap();
        let table = orkg
            .tables()
            .create("People", &[vec![(name.clone(), alice)], vec![(name, bob)]], who)
            .await
            .unwrap();

        let rows = orkg.tables().rows(&table).await.unwrap();
        let cells: Vec<&str> = rows.iter().map(|(_, cells)| cells[0].object.label()).collect();
        assert_eq!(cells, vec!["Alice", "Bob"]);

        let listed = orkg.tables().list(ResourceQuery::new().with_created_by(who), &PageRequest::default()).await.unwrap();
        assert_eq!(listed.total_elements(), 1);

        let err = orkg.tables().find(&ThingId::from_static("R404")).await.unwrap_err();
        assert!(matches!(err, Error::TableNotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_table_create_writes_nothing() {
        let orkg: Orkg<MemoryGraph> = Orkg::open_memory().await.unwrap();
        let name = orkg.create_predicate("name").await.unwrap();
        let alice = orkg.create_literal("Alice").await.unwrap();
        let things = orkg.repository().thing_count();
        let statements = orkg.repository().statement_count();

        let rows = vec![vec![(name.clone(), alice)], vec![(name, ThingId::from_static("L404"))]];
        let err = orkg.tables().create("People", &rows, ContributorId::UNKNOWN).await.unwrap_err();
        assert!(matches!(err, Error::ThingNotFound(ref id) if id.as_str() == "L404"));
        assert_eq!(orkg.repository().thing_count(), things);
        assert_eq!(orkg.repository().statement_count(), statements);
        let listed = orkg.tables().list(ResourceQuery::new(), &PageRequest::default()).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_visualizations() {
        let orkg: Orkg<MemoryGraph> = Orkg::open_memory().await.unwrap();
        let id = orkg.visualizations().create("Chart", Some("bar chart"), ContributorId::UNKNOWN).await.unwrap();
        assert_eq!(orkg.visualizations().find(&id).await.unwrap().label, "Chart");

        let paper = orkg.create_resource("Paper", "Paper").await.unwrap();
        let err = orkg.visualizations().find(&paper).await.unwrap_err();
        assert_eq!(err.to_string(), format!(r#"Visualization "{paper}" not found."#));
    }
}
