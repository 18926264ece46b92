//! Templates: per-class descriptions of which properties an instance has.

use hashbrown::HashSet;

use super::ServiceContext;
use crate::model::vocab::classes;
use crate::model::*;
use crate::storage::GraphRepository;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct CreateTemplateCommand {
    pub label: String,
    pub description: Option<String>,
    pub target_class: ThingId,
    pub properties: Vec<TemplateProperty>,
    pub is_closed: bool,
    pub contributor: ContributorId,
}

impl CreateTemplateCommand {
    pub fn new(label: impl Into<String>, target_class: ThingId, contributor: ContributorId) -> Self {
        Self {
            label: label.into(),
            description: None,
            target_class,
            properties: Vec::new(),
            is_closed: false,
            contributor,
        }
    }

    pub fn with_property(mut self, property: TemplateProperty) -> Self {
        self.properties.push(property);
        self
    }
}

pub struct TemplateService<B: GraphRepository> {
    ctx: ServiceContext<B>,
}

impl<B: GraphRepository> TemplateService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, command: CreateTemplateCommand) -> Result<ThingId> {
        let repo = &self.ctx.repository;
        match repo.find_thing(&command.target_class).await? {
            Some(Thing::Class(_)) => {}
            _ => return Err(Error::ThingNotFound(command.target_class)),
        }
        if let Some(existing) = repo.find_template_by_target_class(&command.target_class).await? {
            return Err(Error::TemplateAlreadyExistsForClass {
                class_id: command.target_class,
                template_id: existing.id,
            });
        }
        for property in &command.properties {
            if repo.find_predicate(&property.path).await?.is_none() {
                return Err(Error::PredicateNotFound(property.path.clone()));
            }
            if let (Some(min), Some(max)) = (property.min_count, property.max_count) {
                if min > max {
                    return Err(Error::InvalidParameter {
                        name: "min_count".into(),
                        reason: format!("{min} exceeds max_count {max} for property \"{}\"", property.label),
                    });
                }
            }
        }

        // The node shape resource reserves the id in the graph.
        let shape = self
            .ctx
            .create_resource(&command.label, [ThingId::from_static(classes::NODE_SHAPE)], command.contributor)
            .await?;
        let template = Template {
            id: shape.id.clone(),
            label: command.label,
            description: command.description,
            target_class: command.target_class,
            properties: command.properties,
            is_closed: command.is_closed,
            created_at: shape.created_at,
            created_by: command.contributor,
            visibility: Visibility::Default,
        };
        repo.save_template(template).await?;
        tracing::info!(template = %shape.id, "created template");
        Ok(shape.id)
    }

    pub async fn find(&self, id: &ThingId) -> Result<Template> {
        self.ctx
            .repository
            .find_template(id)
            .await?
            .ok_or_else(|| Error::TemplateNotFound(id.clone()))
    }

    /// The resource seen through the template, or `None` when the resource or
    /// template is missing or the template does not apply.
    pub async fn find_instance(&self, template_id: &ThingId, resource_id: &ThingId) -> Result<Option<TemplateInstance>> {
        let Some(template) = self.ctx.repository.find_template(template_id).await? else {
            return Ok(None);
        };
        let Some(root) = self.ctx.repository.find_resource(resource_id).await? else {
            return Ok(None);
        };
        if !root.classes.contains(&template.target_class) {
            return Ok(None);
        }
        let paths: HashSet<&ThingId> = template.properties.iter().map(|p| &p.path).collect();
        let mut statements = Vec::new();
        for path in paths {
            statements.extend(self.ctx.outgoing(&root.id, path.as_str()).await?);
        }
        // template property order, creation order within a property
        statements.sort_by_key(|s| {
            template.properties.iter().position(|p| p.path == s.predicate.id).unwrap_or(usize::MAX)
        });
        Ok(Some(TemplateInstance { root, statements }))
    }

    /// Like [`Self::find_instance`], reporting why there is no instance.
    pub async fn instance(&self, template_id: &ThingId, resource_id: &ThingId) -> Result<TemplateInstance> {
        let template = self.find(template_id).await?;
        let resource = self
            .ctx
            .repository
            .find_resource(resource_id)
            .await?
            .ok_or_else(|| Error::ResourceNotFound(resource_id.clone()))?;
        if !resource.classes.contains(&template.target_class) {
            return Err(Error::TemplateNotApplicable {
                template_id: template.id,
                resource_id: resource.id,
            });
        }
        self.find_instance(template_id, resource_id)
            .await?
            .ok_or_else(|| Error::TemplateInstanceNotFound {
                template_id: template_id.clone(),
                resource_id: resource_id.clone(),
            })
    }
}
