//! Rosetta-stone templates and their versioned statements.
//!
//! A rosetta-stone statement fills the input positions of its template with
//! things. Statements are never changed in place: every update and the soft
//! delete append a new version.

use super::ServiceContext;
use crate::model::vocab::classes;
use crate::model::*;
use crate::paging::{Page, PageRequest};
use crate::storage::GraphRepository;
use crate::{Error, Result};

// ============================================================================
// Templates
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreateRosettaStoneTemplateCommand {
    pub label: String,
    pub description: String,
    /// Label pattern with one `{i}` placeholder per input position.
    pub formatted_label: String,
    /// Input positions; the first is the subject position.
    pub properties: Vec<TemplateProperty>,
    pub contributor: ContributorId,
}

pub struct RosettaStoneTemplateService<B: GraphRepository> {
    ctx: ServiceContext<B>,
}

impl<B: GraphRepository> RosettaStoneTemplateService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, command: CreateRosettaStoneTemplateCommand) -> Result<ThingId> {
        if command.properties.is_empty() {
            return Err(Error::InvalidParameter {
                name: "properties".into(),
                reason: "a subject position is required".into(),
            });
        }
        if let Some(i) = placeholders(&command.formatted_label).find(|i| *i >= command.properties.len()) {
            return Err(Error::InvalidParameter {
                name: "formatted_label".into(),
                reason: format!("placeholder {{{i}}} has no input position"),
            });
        }
        for property in &command.properties {
            if self.ctx.repository.find_predicate(&property.path).await?.is_none() {
                return Err(Error::PredicateNotFound(property.path.clone()));
            }
        }

        let repo = &self.ctx.repository;
        let class_id = repo.next_thing_id().await?;
        let mut class = Class::new(class_id.clone(), format!("{} (class)", command.label), self.ctx.now());
        class.created_by = command.contributor;
        repo.save_thing(class.into()).await?;

        let shape = self
            .ctx
            .create_resource(&command.label, [ThingId::from_static(classes::ROSETTA_NODE_SHAPE)], command.contributor)
            .await?;
        let template = RosettaStoneTemplate {
            id: shape.id.clone(),
            label: command.label,
            description: command.description,
            formatted_label: command.formatted_label,
            target_class: class_id,
            properties: command.properties,
            created_at: shape.created_at,
            created_by: command.contributor,
            modifiable: true,
        };
        repo.save_rosetta_template(template).await?;
        tracing::info!(template = %shape.id, "created rosetta stone template");
        Ok(shape.id)
    }

    pub async fn find(&self, id: &ThingId) -> Result<RosettaStoneTemplate> {
        self.ctx
            .repository
            .find_rosetta_template(id)
            .await?
            .ok_or_else(|| Error::RosettaStoneTemplateNotFound(id.clone()))
    }
}

/// Indices of the `{i}` placeholders of a formatted label.
fn placeholders(pattern: &str) -> impl Iterator<Item = usize> + '_ {
    pattern
        .split('{')
        .skip(1)
        .filter_map(|rest| rest.split_once('}'))
        .filter_map(|(index, _)| index.parse().ok())
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreateRosettaStoneStatementCommand {
    pub template_id: ThingId,
    pub context: Option<ThingId>,
    pub input_positions: Vec<Vec<ThingId>>,
    pub certainty: Certainty,
    pub negated: bool,
    pub visibility: Visibility,
    pub modifiable: bool,
    pub contributor: ContributorId,
}

impl CreateRosettaStoneStatementCommand {
    pub fn new(template_id: ThingId, input_positions: Vec<Vec<ThingId>>, contributor: ContributorId) -> Self {
        Self {
            template_id,
            context: None,
            input_positions,
            certainty: Certainty::High,
            negated: false,
            visibility: Visibility::Default,
            modifiable: true,
            contributor,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateRosettaStoneStatementCommand {
    pub input_positions: Vec<Vec<ThingId>>,
    pub certainty: Certainty,
    pub negated: bool,
    pub contributor: ContributorId,
}

pub struct RosettaStoneStatementService<B: GraphRepository> {
    ctx: ServiceContext<B>,
    templates: RosettaStoneTemplateService<B>,
}

impl<B: GraphRepository> RosettaStoneStatementService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        let templates = RosettaStoneTemplateService::new(ctx.clone());
        Self { ctx, templates }
    }

    /// Check arity, per-position counts and that every input exists.
    async fn validate_inputs(&self, template: &RosettaStoneTemplate, inputs: &[Vec<ThingId>]) -> Result<()> {
        let expected = template.properties.len();
        let actual = inputs.len();
        if actual > expected {
            return Err(Error::TooManyInputPositions { expected, actual, template_id: template.id.clone() });
        }
        if actual < expected {
            return Err(Error::MissingInputPositions { expected, actual, template_id: template.id.clone() });
        }
        for (property, things) in template.properties.iter().zip(inputs) {
            let count = things.len() as u32;
            let too_few = property.min_count.is_some_and(|min| count < min);
            let too_many = property.max_count.is_some_and(|max| count > max);
            if too_few || too_many {
                return Err(Error::InvalidParameter {
                    name: property.label.clone(),
                    reason: format!(
                        "expected between {} and {} values, got {count}",
                        property.min_count.unwrap_or(0),
                        property.max_count.map_or_else(|| "unbounded".to_string(), |m| m.to_string()),
                    ),
                });
            }
            for id in things {
                if !self.ctx.repository.exists(id).await? {
                    return Err(Error::ThingNotFound(id.clone()));
                }
            }
        }
        Ok(())
    }

    pub async fn create(&self, command: CreateRosettaStoneStatementCommand) -> Result<ThingId> {
        let template = self.templates.find(&command.template_id).await?;
        if let Some(context) = &command.context {
            if !self.ctx.repository.exists(context).await? {
                return Err(Error::ThingNotFound(context.clone()));
            }
        }
        self.validate_inputs(&template, &command.input_positions).await?;

        let label = self.render_label(&template, &command.input_positions).await?;
        let resource = self
            .ctx
            .create_resource(
                label,
                [ThingId::from_static(classes::ROSETTA_STONE_STATEMENT), template.target_class.clone()],
                command.contributor,
            )
            .await?;
        let version_id = self.ctx.repository.next_thing_id().await?;
        let statement = RosettaStoneStatement {
            id: resource.id.clone(),
            version_id,
            template_id: template.id,
            context: command.context,
            input_positions: command.input_positions,
            certainty: command.certainty,
            negated: command.negated,
            created_at: resource.created_at,
            created_by: command.contributor,
            visibility: command.visibility,
            modifiable: command.modifiable,
            deleted_by: None,
            deleted_at: None,
        };
        self.ctx.repository.save_rosetta_statement(statement).await?;
        tracing::info!(statement = %resource.id, "created rosetta stone statement");
        Ok(resource.id)
    }

    /// Latest version of a statement.
    pub async fn find(&self, id: &ThingId) -> Result<RosettaStoneStatement> {
        self.versions(id)
            .await?
            .pop()
            .ok_or_else(|| Error::RosettaStoneStatementNotFound(id.clone()))
    }

    /// All versions, oldest first.
    pub async fn versions(&self, id: &ThingId) -> Result<Vec<RosettaStoneStatement>> {
        self.ctx.repository.find_rosetta_statement_versions(id).await
    }

    pub async fn find_version(&self, id: &ThingId, version_id: &ThingId) -> Result<RosettaStoneStatement> {
        self.versions(id)
            .await?
            .into_iter()
            .find(|v| &v.version_id == version_id)
            .ok_or_else(|| Error::RosettaStoneStatementNotFound(version_id.clone()))
    }

    pub async fn list(
        &self,
        template: Option<&ThingId>,
        visibility: VisibilityFilter,
        page: &PageRequest,
    ) -> Result<Page<RosettaStoneStatement>> {
        self.ctx
            .repository
            .find_rosetta_statements(template, visibility, &self.ctx.page(page))
            .await
    }

    /// Append a new version with new inputs.
    pub async fn update(&self, id: &ThingId, command: UpdateRosettaStoneStatementCommand) -> Result<ThingId> {
        let latest = self.find(id).await?;
        if !latest.modifiable || latest.deleted_at.is_some() {
            return Err(Error::RosettaStoneStatementNotModifiable(id.clone()));
        }
        let template = self.templates.find(&latest.template_id).await?;
        self.validate_inputs(&template, &command.input_positions).await?;

        let version_id = self.ctx.repository.next_thing_id().await?;
        let version = RosettaStoneStatement {
            version_id: version_id.clone(),
            input_positions: command.input_positions,
            certainty: command.certainty,
            negated: command.negated,
            created_at: self.ctx.now(),
            created_by: command.contributor,
            ..latest
        };
        self.ctx.repository.save_rosetta_statement(version).await?;
        tracing::info!(statement = %id, version = %version_id, "updated rosetta stone statement");
        Ok(version_id)
    }

    /// Soft delete: appends a version marked deleted. Deleting twice is a no-op.
    pub async fn delete(&self, id: &ThingId, contributor: ContributorId) -> Result<()> {
        let latest = self.find(id).await?;
        if latest.deleted_at.is_some() {
            return Ok(());
        }
        if !latest.modifiable {
            return Err(Error::RosettaStoneStatementNotModifiable(id.clone()));
        }
        let now = self.ctx.now();
        let version = RosettaStoneStatement {
            version_id: self.ctx.repository.next_thing_id().await?,
            visibility: Visibility::Deleted,
            deleted_by: Some(contributor),
            deleted_at: Some(now),
            ..latest
        };
        self.ctx.repository.save_rosetta_statement(version).await?;
        tracing::info!(statement = %id, %contributor, "deleted rosetta stone statement");
        Ok(())
    }

    /// Human-readable label of the latest version.
    pub async fn label(&self, id: &ThingId) -> Result<String> {
        let latest = self.find(id).await?;
        let template = self.templates.find(&latest.template_id).await?;
        self.render_label(&template, &latest.input_positions).await
    }

    async fn render_label(&self, template: &RosettaStoneTemplate, inputs: &[Vec<ThingId>]) -> Result<String> {
        let mut labels = Vec::with_capacity(inputs.len());
        for position in inputs {
            let mut position_labels = Vec::with_capacity(position.len());
            for id in position {
                let thing = self.ctx.repository.find_thing(id).await?;
                position_labels.push(thing.map_or_else(|| id.to_string(), |t| t.label().to_string()));
            }
            labels.push(position_labels);
        }
        Ok(template.format_label(&labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryGraph;
    use crate::Orkg;
    use pretty_assertions::assert_eq;

    async fn setup() -> (Orkg<MemoryGraph>, ThingId) {
        let orkg = Orkg::open_memory().await.unwrap();
        let subject = orkg.create_predicate("subject").await.unwrap();
        let object = orkg.create_predicate("object").await.unwrap();
        let template = orkg
            .rosetta_templates()
            .create(CreateRosettaStoneTemplateCommand {
                label: "uses".into(),
                description: "Something uses something".into(),
                formatted_label: "{0} uses {1}".into(),
                properties: vec![
                    TemplateProperty::new("subject", subject).with_counts(Some(1), Some(1)),
                    TemplateProperty::new("object", object).with_counts(Some(1), None),
                ],
                contributor: ContributorId::UNKNOWN,
            })
            .await
            .unwrap();
        (orkg, template)
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("{0} uses {1} in {x}").collect::<Vec<_>>(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_input_position_arity() {
        let (orkg, template) = setup().await;
        let a = orkg.create_resource("Rust", "Software").await.unwrap();

        let err = orkg
            .rosetta_statements()
            .create(CreateRosettaStoneStatementCommand::new(template.clone(), vec![vec![a.clone()]; 3], ContributorId::UNKNOWN))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TooManyInputPositions { expected: 2, actual: 3, .. }));

        let err = orkg
            .rosetta_statements()
            .create(CreateRosettaStoneStatementCommand::new(template.clone(), vec![vec![a]], ContributorId::UNKNOWN))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingInputPositions { expected: 2, actual: 1, .. }));
        assert_eq!(err.status(), 400);
    }

    #[tokio::test]
    async fn test_versions_and_soft_delete() {
        let (orkg, template) = setup().await;
        let rust = orkg.create_resource("Rust", "Software").await.unwrap();
        let llvm = orkg.create_resource("LLVM", "Software").await.unwrap();
        let gcc = orkg.create_resource("GCC", "Software").await.unwrap();
        let who = ContributorId::random();
        let statements = orkg.rosetta_statements();

        let id = statements
            .create(CreateRosettaStoneStatementCommand::new(template.clone(), vec![vec![rust.clone()], vec![llvm]], who))
            .await
            .unwrap();
        assert_eq!(statements.label(&id).await.unwrap(), "Rust uses LLVM");

        let update = UpdateRosettaStoneStatementCommand {
            input_positions: vec![vec![rust], vec![gcc]],
            certainty: Certainty::Moderate,
            negated: false,
            contributor: who,
        };
        statements.update(&id, update.clone()).await.unwrap();
        assert_eq!(statements.label(&id).await.unwrap(), "Rust uses GCC");
        assert_eq!(statements.versions(&id).await.unwrap().len(), 2);

        statements.delete(&id, who).await.unwrap();
        let latest = statements.find(&id).await.unwrap();
        assert_eq!(latest.visibility, Visibility::Deleted);
        assert_eq!(latest.deleted_by, Some(who));

        let listed = statements.list(Some(&template), VisibilityFilter::AllListed, &PageRequest::default()).await.unwrap();
        assert!(listed.is_empty());
        let deleted = statements.list(None, VisibilityFilter::Deleted, &PageRequest::default()).await.unwrap();
        assert_eq!(deleted.total_elements(), 1);

        let err = statements.update(&id, update).await.unwrap_err();
        assert!(matches!(err, Error::RosettaStoneStatementNotModifiable(ref s) if *s == id));
        assert_eq!(err.status(), 403);
        assert_eq!(statements.versions(&id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unmodifiable_statement() {
        let (orkg, template) = setup().await;
        let a = orkg.create_resource("A", "Software").await.unwrap();
        let mut command = CreateRosettaStoneStatementCommand::new(template, vec![vec![a.clone()], vec![a.clone()]], ContributorId::UNKNOWN);
        command.modifiable = false;
        let id = orkg.rosetta_statements().create(command).await.unwrap();

        let update = UpdateRosettaStoneStatementCommand {
            input_positions: vec![vec![a.clone()], vec![a]],
            certainty: Certainty::High,
            negated: true,
            contributor: ContributorId::UNKNOWN,
        };
        let err = orkg.rosetta_statements().update(&id, update).await.unwrap_err();
        assert!(matches!(err, Error::RosettaStoneStatementNotModifiable(_)));
        assert_eq!(err.status(), 403);

        let err = orkg.rosetta_statements().delete(&id, ContributorId::UNKNOWN).await.unwrap_err();
        assert!(matches!(err, Error::RosettaStoneStatementNotModifiable(_)));
        assert_eq!(err.status(), 403);
        assert_eq!(orkg.rosetta_statements().versions(&id).await.unwrap().len(), 1);
    }
}
