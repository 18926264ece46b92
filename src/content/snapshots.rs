//! Immutable snapshots of template instances.

use super::templates::TemplateService;
use super::ServiceContext;
use crate::model::*;
use crate::paging::{Page, PageRequest};
use crate::storage::GraphRepository;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct CreateSnapshotCommand {
    pub resource_id: ThingId,
    pub template_id: ThingId,
    pub contributor: ContributorId,
    /// Register a persistent handle pointing at the snapshot.
    pub register_handle: bool,
}

pub struct SnapshotService<B: GraphRepository> {
    ctx: ServiceContext<B>,
    templates: TemplateService<B>,
}

impl<B: GraphRepository> SnapshotService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        let templates = TemplateService::new(ctx.clone());
        Self { ctx, templates }
    }

    pub async fn create(&self, command: CreateSnapshotCommand) -> Result<SnapshotId> {
        let repo = &self.ctx.repository;
        let resource = repo
            .find_resource(&command.resource_id)
            .await?
            .ok_or_else(|| Error::ResourceNotFound(command.resource_id.clone()))?;
        let template = repo
            .find_template(&command.template_id)
            .await?
            .ok_or_else(|| Error::TemplateNotFound(command.template_id.clone()))?;
        if !resource.classes.contains(&template.target_class) {
            return Err(Error::TemplateNotApplicable {
                template_id: template.id,
                resource_id: resource.id,
            });
        }
        let data = self
            .templates
            .find_instance(&template.id, &resource.id)
            .await?
            .ok_or_else(|| Error::TemplateInstanceNotFound {
                template_id: template.id.clone(),
                resource_id: resource.id.clone(),
            })?;

        let id = SnapshotId::random();
        let handle = if command.register_handle { self.register_handle(&resource.id, &id) } else { None };
        let snapshot = Snapshot {
            id: id.clone(),
            created_at: self.ctx.now(),
            created_by: command.contributor,
            resource_id: resource.id,
            template_id: template.id,
            data,
            handle,
        };
        repo.save_snapshot(snapshot).await?;
        tracing::info!(snapshot = %id, resource = %command.resource_id, "created snapshot");
        Ok(id)
    }

    /// `<prefix>/<snapshot id>`, targeting the configured snapshot URL.
    fn register_handle(&self, resource: &ThingId, snapshot: &SnapshotId) -> Option<String> {
        let Some(prefix) = self.ctx.config.handle_prefix.as_deref() else {
            tracing::warn!(%snapshot, "handle requested but no handle prefix configured");
            return None;
        };
        let target = self
            .ctx
            .config
            .snapshot_url_template
            .replace("{id}", resource.as_str())
            .replace("{snapshotId}", &snapshot.0);
        let handle = format!("{prefix}/{snapshot}");
        tracing::debug!(%handle, %target, "registered handle");
        Some(handle)
    }

    pub async fn find(&self, id: &SnapshotId) -> Result<Snapshot> {
        self.ctx
            .repository
            .find_snapshot(id)
            .await?
            .ok_or_else(|| Error::SnapshotNotFound(id.clone()))
    }

    /// Snapshots of a resource, newest first.
    pub async fn list_by_resource(&self, resource: &ThingId, page: &PageRequest) -> Result<Page<Snapshot>> {
        self.ctx
            .repository
            .find_snapshots_by_resource(resource, &self.ctx.page(page))
            .await
    }
}
