//! In-memory storage backend.
//!
//! This is the reference implementation of `GraphRepository`.
//! It uses hash maps protected by `RwLock`.
//!
//! ## Limitations
//!
//! - **Embedded copies**: statements hold copies of their subject, predicate
//!   and object. `save_thing()` refreshes those copies with a full scan.
//! - **No indexes beyond subjects**: every query other than outgoing edges
//!   is a full scan.
//!
//! Lock order is always `things` before `statements`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;

use crate::model::vocab::{classes, predicates};
use crate::model::*;
use crate::paging::{paged, Page, PageRequest, Sort, SortDirection, SortKey};
use crate::query::{ResourceQuery, StatementQuery};
use crate::search::{matches_all, GraphView, SearchFilter};
use crate::{Error, Result};
use super::{sort_resources, BundleConfig, GraphRepository, STATEMENT_SORT_PROPERTIES};

// ============================================================================
// MemoryGraph
// ============================================================================

/// In-memory knowledge graph storage.
#[derive(Clone)]
pub struct MemoryGraph {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    things: RwLock<HashMap<ThingId, Thing>>,
    statements: RwLock<StatementStore>,
    templates: RwLock<HashMap<ThingId, Template>>,
    snapshots: RwLock<HashMap<SnapshotId, Snapshot>>,
    rosetta_templates: RwLock<HashMap<ThingId, RosettaStoneTemplate>>,
    /// statement id → versions, oldest first
    rosetta_statements: RwLock<HashMap<ThingId, Vec<RosettaStoneStatement>>>,
    observatories: RwLock<HashMap<ObservatoryId, Observatory>>,
    observatory_filters: RwLock<HashMap<ObservatoryFilterId, ObservatoryFilter>>,
    next_thing_id: AtomicU64,
    next_statement_id: AtomicU64,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                things: RwLock::new(HashMap::new()),
                statements: RwLock::new(StatementStore::default()),
                templates: RwLock::new(HashMap::new()),
                snapshots: RwLock::new(HashMap::new()),
                rosetta_templates: RwLock::new(HashMap::new()),
                rosetta_statements: RwLock::new(HashMap::new()),
                observatories: RwLock::new(HashMap::new()),
                observatory_filters: RwLock::new(HashMap::new()),
                next_thing_id: AtomicU64::new(1),
                next_statement_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn thing_count(&self) -> usize {
        self.inner.things.read().len()
    }

    pub fn statement_count(&self) -> usize {
        self.inner.statements.read().by_id.len()
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// StatementStore
// ============================================================================

#[derive(Default)]
struct StatementStore {
    by_id: HashMap<StatementId, Statement>,
    /// subject id → statement ids
    by_subject: HashMap<ThingId, Vec<StatementId>>,
}

impl StatementStore {
    fn insert(&mut self, statement: Statement) {
        self.remove(&statement.id);
        self.by_subject
            .entry(statement.subject.id().clone())
            .or_default()
            .push(statement.id.clone());
        self.by_id.insert(statement.id.clone(), statement);
    }

    fn remove(&mut self, id: &StatementId) -> Option<Statement> {
        let removed = self.by_id.remove(id)?;
        if let Some(ids) = self.by_subject.get_mut(removed.subject.id()) {
            ids.retain(|sid| sid != id);
        }
        Some(removed)
    }

    /// Replace embedded copies of `thing` in all statements.
    fn refresh(&mut self, thing: &Thing) {
        let id = thing.id();
        for statement in self.by_id.values_mut() {
            if statement.subject.id() == id {
                statement.subject = thing.clone();
            }
            if statement.object.id() == id {
                statement.object = thing.clone();
            }
            if let Thing::Predicate(p) = thing {
                if &statement.predicate.id == id {
                    statement.predicate = p.clone();
                }
            }
        }
    }

    /// Depth-first expansion below `root`. `expand` receives each candidate
    /// statement with its level (1 for statements of the root) and decides
    /// whether it is part of the subgraph.
    ///
    /// A statement first reached on a long path is expanded again when a
    /// shorter path reaches it, so level bounds see its shortest level.
    fn subgraph(&self, root: &ThingId, mut expand: impl FnMut(&Statement, usize) -> bool) -> Vec<&Statement> {
        let mut best: HashMap<&StatementId, usize> = HashMap::new();
        let mut emitted: HashSet<&StatementId> = HashSet::new();
        let mut result = Vec::new();
        let mut frontier: Vec<(&Statement, usize)> = Vec::new();

        for statement in self.outgoing(root) {
            if expand(statement, 1) {
                best.insert(&statement.id, 1);
                frontier.push((statement, 1));
            }
        }

        while let Some((statement, level)) = frontier.pop() {
            if best.get(&statement.id).is_some_and(|b| *b < level) {
                continue;
            }
            if emitted.insert(&statement.id) {
                result.push(statement);
            }
            let level = level + 1;
            for next in self.outgoing(statement.object.id()) {
                if best.get(&next.id).is_some_and(|b| *b <= level) {
                    continue;
                }
                if expand(next, level) {
                    best.insert(&next.id, level);
                    frontier.push((next, level));
                }
            }
        }

        result
    }
}

impl GraphView for StatementStore {
    fn outgoing(&self, subject: &ThingId) -> Vec<&Statement> {
        self.by_subject
            .get(subject)
            .map(|ids| ids.iter().filter_map(|id| self.by_id.get(id)).collect())
            .unwrap_or_default()
    }
}

// ============================================================================
// Sorting helpers
// ============================================================================

fn newest_first() -> Sort {
    Sort::by("created_at", SortDirection::Desc)
}

fn thing_key(thing: &Thing, property: &str) -> Option<SortKey> {
    match property {
        "id" => Some(thing.id().as_str().into()),
        "label" => Some(thing.label().into()),
        "created_at" => Some(thing.created_at().into()),
        "created_by" => Some(thing.created_by().to_string().into()),
        _ => None,
    }
}

fn statement_key(statement: &Statement, property: &str) -> Option<SortKey> {
    match property {
        // S<n> ids order by sequence number
        "id" => Some(match statement.id.0.strip_prefix('S').and_then(|n| n.parse::<i64>().ok()) {
            Some(n) => SortKey::Int(n),
            None => statement.id.0.as_str().into(),
        }),
        "created_at" => Some(statement.created_at.into()),
        "created_by" => Some(statement.created_by.to_string().into()),
        "index" => statement.index.map(|i| SortKey::Int(i64::from(i))),
        _ => {
            if let Some(rest) = property.strip_prefix("sub.") {
                thing_key(&statement.subject, rest)
            } else if let Some(rest) = property.strip_prefix("obj.") {
                thing_key(&statement.object, rest)
            } else {
                None
            }
        }
    }
}

/// Collapse a timestamp to minute precision in UTC.
fn to_minute(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:00Z").to_string()
}

fn object_allowed(object: &Thing, config: &BundleConfig) -> bool {
    let in_list = |list: &[ThingId]| match object {
        Thing::Resource(r) => list.iter().any(|c| r.classes.contains(c) || c == classes::RESOURCE),
        Thing::Literal(_) => list.iter().any(|c| c == classes::LITERAL),
        Thing::Predicate(_) => list.iter().any(|c| c == "Predicate"),
        Thing::Class(_) => list.iter().any(|c| c == "Class"),
    };
    if !config.blacklist.is_empty() && in_list(&config.blacklist) {
        return false;
    }
    config.whitelist.is_empty() || in_list(&config.whitelist)
}

// ============================================================================
// GraphRepository impl
// ============================================================================

#[async_trait]
impl GraphRepository for MemoryGraph {
    // ========================================================================
    // Things
    // ========================================================================

    async fn save_thing(&self, thing: Thing) -> Result<()> {
        let mut things = self.inner.things.write();
        let replaced = things.insert(thing.id().clone(), thing.clone()).is_some();
        if replaced {
            self.inner.statements.write().refresh(&thing);
        }
        Ok(())
    }

    async fn find_thing(&self, id: &ThingId) -> Result<Option<Thing>> {
        Ok(self.inner.things.read().get(id).cloned())
    }

    async fn next_thing_id(&self) -> Result<ThingId> {
        let things = self.inner.things.read();
        loop {
            let n = self.inner.next_thing_id.fetch_add(1, Ordering::Relaxed);
            let id = ThingId::new(format!("R{n}"))?;
            if !things.contains_key(&id) {
                return Ok(id);
            }
        }
    }

    async fn find_resources(&self, query: &ResourceQuery, page: &PageRequest) -> Result<Page<Resource>> {
        let resources: Vec<Resource> = self
            .inner
            .things
            .read()
            .values()
            .filter_map(Thing::as_resource)
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        Ok(paged(sort_resources(resources, page)?, page))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    async fn save_statement(&self, statement: Statement) -> Result<()> {
        {
            let things = self.inner.things.read();
            if !things.contains_key(statement.subject.id()) {
                return Err(Error::ThingNotFound(statement.subject.id().clone()));
            }
            if !things.contains_key(&statement.predicate.id) {
                return Err(Error::PredicateNotFound(statement.predicate.id.clone()));
            }
            if !things.contains_key(statement.object.id()) {
                return Err(Error::ThingNotFound(statement.object.id().clone()));
            }
        }
        self.inner.statements.write().insert(statement);
        Ok(())
    }

    async fn find_statement(&self, id: &StatementId) -> Result<Option<Statement>> {
        Ok(self.inner.statements.read().by_id.get(id).cloned())
    }

    async fn delete_statement(&self, id: &StatementId) -> Result<bool> {
        Ok(self.inner.statements.write().remove(id).is_some())
    }

    async fn next_statement_id(&self) -> Result<StatementId> {
        let store = self.inner.statements.read();
        loop {
            let id = StatementId::from_sequence(self.inner.next_statement_id.fetch_add(1, Ordering::Relaxed));
            if !store.by_id.contains_key(&id) {
                return Ok(id);
            }
        }
    }

    async fn find_statements(&self, query: &StatementQuery, page: &PageRequest) -> Result<Page<Statement>> {
        query.validate()?;
        page.sort.validate(STATEMENT_SORT_PROPERTIES)?;
        let sort = page.sort.or_else(newest_first);
        let mut statements: Vec<Statement> = self
            .inner
            .statements
            .read()
            .by_id
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        statements.sort_by(|a, b| sort.compare(a, b, statement_key));
        Ok(paged(statements, page))
    }

    async fn count_incoming(&self, id: &ThingId) -> Result<u64> {
        let store = self.inner.statements.read();
        Ok(store.by_id.values().filter(|s| s.object.id() == id).count() as u64)
    }

    // ========================================================================
    // Graph queries
    // ========================================================================

    async fn find_papers_by_filters(
        &self,
        observatory: Option<ObservatoryId>,
        filters: &[SearchFilter],
        visibility: VisibilityFilter,
        page: &PageRequest,
    ) -> Result<Page<Resource>> {
        let papers: Vec<Resource> = {
            let things = self.inner.things.read();
            let store = self.inner.statements.read();
            things
                .values()
                .filter_map(Thing::as_resource)
                .filter(|r| {
                    r.has_class(classes::PAPER)
                        && observatory.is_none_or(|o| r.observatory_id == o)
                        && visibility.matches(r.visibility)
                })
                .filter(|paper| {
                    filters.is_empty()
                        || store.outgoing(&paper.id).into_iter().any(|s| {
                            s.predicate.id == predicates::HAS_CONTRIBUTION
                                && s.object.as_resource().is_some_and(|c| c.has_class(classes::CONTRIBUTION))
                                && matches_all(filters, &*store, &s.object)
                        })
                })
                .cloned()
                .collect()
        };
        tracing::debug!(
            filters = filters.len(),
            %visibility,
            matched = papers.len(),
            "searched papers by contribution filters"
        );
        Ok(paged(sort_resources(papers, page)?, page))
    }

    async fn fetch_bundle(&self, root: &ThingId, config: &BundleConfig) -> Result<Vec<Statement>> {
        let store = self.inner.statements.read();
        let mut excluded: HashSet<StatementId> = HashSet::new();
        let found = store.subgraph(root, |s, level| {
            if config.max_level.is_some_and(|max| level > max) {
                return false;
            }
            if config.min_level.is_some_and(|min| level <= min) {
                excluded.insert(s.id.clone());
            }
            object_allowed(&s.object, config)
        });
        let mut bundle: Vec<Statement> = found
            .into_iter()
            .filter(|s| !excluded.contains(&s.id))
            .cloned()
            .collect();
        let sort = newest_first();
        bundle.sort_by(|a, b| sort.compare(a, b, statement_key));
        Ok(bundle)
    }

    async fn find_contributors(&self, resource: &ThingId, page: &PageRequest) -> Result<Page<ContributorId>> {
        let store = self.inner.statements.read();
        let mut contributors: Vec<ContributorId> = store
            .subgraph(resource, |s, _| !s.object.is_subgraph_boundary())
            .into_iter()
            .flat_map(|s| [s.subject.created_by(), s.object.created_by(), s.created_by])
            .filter(|c| *c != ContributorId::UNKNOWN)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        contributors.sort_by_key(|c| c.to_string());
        Ok(paged(contributors, page))
    }

    async fn find_timeline(&self, resource: &ThingId, page: &PageRequest) -> Result<Page<ResourceContributor>> {
        let root = self
            .find_resource(resource)
            .await?
            .ok_or_else(|| Error::ResourceNotFound(resource.clone()))?;
        let store = self.inner.statements.read();
        let mut edits: Vec<ResourceContributor> = store
            .subgraph(resource, |s, _| !s.object.is_subgraph_boundary())
            .into_iter()
            .flat_map(|s| {
                [
                    (s.subject.created_by(), s.subject.created_at()),
                    (s.object.created_by(), s.object.created_at()),
                    (s.created_by, s.created_at),
                ]
            })
            .filter(|(by, at)| *by != ContributorId::UNKNOWN && *at >= root.created_at)
            .map(|(created_by, at)| ResourceContributor { created_by, created_at: to_minute(at) })
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        edits.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.created_by.cmp(&b.created_by))
        });
        Ok(paged(edits, page))
    }

    async fn find_by_doi(&self, doi: &str, classes: &[ThingId]) -> Result<Option<Resource>> {
        let store = self.inner.statements.read();
        Ok(store
            .by_id
            .values()
            .filter(|s| s.predicate.id == predicates::HAS_DOI)
            .filter(|s| s.object.as_literal().is_some_and(|l| l.label.eq_ignore_ascii_case(doi)))
            .filter_map(|s| s.subject.as_resource())
            .filter(|r| classes.iter().any(|c| r.classes.contains(c)))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn find_problems_by_observatory(&self, observatory: ObservatoryId, page: &PageRequest) -> Result<Page<Resource>> {
        let store = self.inner.statements.read();
        let mut seen = HashSet::new();
        let problems: Vec<Resource> = store
            .by_id
            .values()
            .filter(|s| {
                s.predicate.id == predicates::HAS_CONTRIBUTION
                    && s.subject.as_resource().is_some_and(|p| {
                        p.has_class(classes::PAPER) && p.observatory_id == observatory
                    })
            })
            .flat_map(|s| store.outgoing(s.object.id()))
            .filter(|s| s.predicate.id == predicates::HAS_RESEARCH_PROBLEM)
            .filter_map(|s| s.object.as_resource())
            .filter(|r| r.has_class(classes::PROBLEM) && seen.insert(r.id.clone()))
            .cloned()
            .collect();
        drop(store);
        Ok(paged(sort_resources(problems, page)?, page))
    }

    async fn count_predicate_usage(&self, page: &PageRequest) -> Result<Page<PredicateUsage>> {
        let store = self.inner.statements.read();
        let mut counts: HashMap<&ThingId, u64> = HashMap::new();
        for statement in store.by_id.values() {
            *counts.entry(&statement.predicate.id).or_default() += 1;
        }
        let mut usage: Vec<PredicateUsage> = counts
            .into_iter()
            .map(|(id, count)| PredicateUsage { id: id.clone(), count })
            .collect();
        usage.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
        Ok(paged(usage, page))
    }

    // ========================================================================
    // Content stores
    // ========================================================================

    async fn save_template(&self, template: Template) -> Result<()> {
        self.inner.templates.write().insert(template.id.clone(), template);
        Ok(())
    }

    async fn find_template(&self, id: &ThingId) -> Result<Option<Template>> {
        Ok(self.inner.templates.read().get(id).cloned())
    }

    async fn find_template_by_target_class(&self, class: &ThingId) -> Result<Option<Template>> {
        Ok(self.inner.templates.read().values().find(|t| &t.target_class == class).cloned())
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut snapshots = self.inner.snapshots.write();
        if snapshots.contains_key(&snapshot.id) {
            return Err(Error::Storage(format!("snapshot {} already exists", snapshot.id)));
        }
        snapshots.insert(snapshot.id.clone(), snapshot);
        Ok(())
    }

    async fn find_snapshot(&self, id: &SnapshotId) -> Result<Option<Snapshot>> {
        Ok(self.inner.snapshots.read().get(id).cloned())
    }

    async fn find_snapshots_by_resource(&self, resource: &ThingId, page: &PageRequest) -> Result<Page<Snapshot>> {
        let mut snapshots: Vec<Snapshot> = self
            .inner
            .snapshots
            .read()
            .values()
            .filter(|s| &s.resource_id == resource)
            .cloned()
            .collect();
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(paged(snapshots, page))
    }

    async fn save_rosetta_template(&self, template: RosettaStoneTemplate) -> Result<()> {
        self.inner.rosetta_templates.write().insert(template.id.clone(), template);
        Ok(())
    }

    async fn find_rosetta_template(&self, id: &ThingId) -> Result<Option<RosettaStoneTemplate>> {
        Ok(self.inner.rosetta_templates.read().get(id).cloned())
    }

    async fn save_rosetta_statement(&self, version: RosettaStoneStatement) -> Result<()> {
        self.inner
            .rosetta_statements
            .write()
            .entry(version.id.clone())
            .or_default()
            .push(version);
        Ok(())
    }

    async fn find_rosetta_statement_versions(&self, id: &ThingId) -> Result<Vec<RosettaStoneStatement>> {
        Ok(self.inner.rosetta_statements.read().get(id).cloned().unwrap_or_default())
    }

    async fn find_rosetta_statements(
        &self,
        template: Option<&ThingId>,
        visibility: VisibilityFilter,
        page: &PageRequest,
    ) -> Result<Page<RosettaStoneStatement>> {
        let mut latest: Vec<RosettaStoneStatement> = self
            .inner
            .rosetta_statements
            .read()
            .values()
            .filter_map(|versions| versions.last())
            .filter(|s| template.is_none_or(|t| &s.template_id == t))
            .filter(|s| visibility.matches(s.visibility))
            .cloned()
            .collect();
        latest.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(paged(latest, page))
    }

    async fn save_observatory(&self, observatory: Observatory) -> Result<()> {
        self.inner.observatories.write().insert(observatory.id, observatory);
        Ok(())
    }

    async fn find_observatory(&self, id: ObservatoryId) -> Result<Option<Observatory>> {
        Ok(self.inner.observatories.read().get(&id).cloned())
    }

    async fn save_observatory_filter(&self, filter: ObservatoryFilter) -> Result<()> {
        self.inner.observatory_filters.write().insert(filter.id, filter);
        Ok(())
    }

    async fn find_observatory_filter(&self, id: ObservatoryFilterId) -> Result<Option<ObservatoryFilter>> {
        Ok(self.inner.observatory_filters.read().get(&id).cloned())
    }

    async fn find_observatory_filters(
        &self,
        observatory: ObservatoryId,
        featured: Option<bool>,
        page: &PageRequest,
    ) -> Result<Page<ObservatoryFilter>> {
        let mut filters: Vec<ObservatoryFilter> = self
            .inner
            .observatory_filters
            .read()
            .values()
            .filter(|f| f.observatory_id == observatory && featured.is_none_or(|featured| f.featured == featured))
            .cloned()
            .collect();
        filters.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(paged(filters, page))
    }

    async fn delete_observatory_filter(&self, id: ObservatoryFilterId) -> Result<bool> {
        Ok(self.inner.observatory_filters.write().remove(&id).is_some())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    fn id(s: &str) -> ThingId {
        ThingId::new(s).unwrap()
    }

    async fn resource(db: &MemoryGraph, rid: &str, class: &str) -> Resource {
        let r = Resource::new(id(rid), rid, t0()).with_classes([id(class)]);
        db.save_thing(r.clone().into()).await.unwrap();
        r
    }

    async fn predicate(db: &MemoryGraph, pid: &str) -> Predicate {
        let p = Predicate::new(id(pid), pid, t0());
        db.save_thing(p.clone().into()).await.unwrap();
        p
    }

    async fn link(db: &MemoryGraph, s: &Resource, p: &Predicate, o: impl Into<Thing>) -> StatementId {
        let sid = db.next_statement_id().await.unwrap();
        let statement = Statement::new(sid.clone(), s.clone(), p.clone(), o, t0());
        db.save_statement(statement).await.unwrap();
        sid
    }

    #[tokio::test]
    async fn test_save_and_find_thing() {
        let db = MemoryGraph::new();
        let r = resource(&db, "R1", "Paper").await;
        assert_eq!(db.find_resource(&r.id).await.unwrap(), Some(r.clone()));
        assert!(db.find_predicate(&r.id).await.unwrap().is_none());
        assert!(db.exists(&r.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_next_thing_id_skips_taken_ids() {
        let db = MemoryGraph::new();
        resource(&db, "R1", "Paper").await;
        resource(&db, "R2", "Paper").await;
        assert_eq!(db.next_thing_id().await.unwrap(), id("R3"));
    }

    #[tokio::test]
    async fn test_statement_requires_existing_endpoints() {
        let db = MemoryGraph::new();
        let a = resource(&db, "R1", "Paper").await;
        let p = predicate(&db, "P1").await;
        let ghost = Resource::new(id("R404"), "ghost", t0());
        let sid = db.next_statement_id().await.unwrap();
        let result = db.save_statement(Statement::new(sid, a, p, ghost, t0())).await;
        assert!(matches!(result, Err(Error::ThingNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_statement_updates_index() {
        let db = MemoryGraph::new();
        let a = resource(&db, "R1", "Paper").await;
        let b = resource(&db, "R2", "Contribution").await;
        let p = predicate(&db, "P31").await;
        let sid = link(&db, &a, &p, b.clone()).await;

        assert_eq!(db.count_incoming(&b.id).await.unwrap(), 1);
        assert!(db.delete_statement(&sid).await.unwrap());
        assert!(!db.delete_statement(&sid).await.unwrap());
        assert_eq!(db.count_incoming(&b.id).await.unwrap(), 0);
        assert!(db.inner.statements.read().outgoing(&a.id).is_empty());
    }

    #[tokio::test]
    async fn test_save_thing_refreshes_statement_copies() {
        let db = MemoryGraph::new();
        let a = resource(&db, "R1", "Paper").await;
        let b = resource(&db, "R2", "Contribution").await;
        let p = predicate(&db, "P31").await;
        let sid = link(&db, &a, &p, b).await;

        let renamed = Resource { label: "renamed".into(), ..a };
        db.save_thing(renamed.into()).await.unwrap();
        let statement = db.find_statement(&sid).await.unwrap().unwrap();
        assert_eq!(statement.subject.label(), "renamed");
    }

    #[tokio::test]
    async fn test_find_statements_sorting() {
        let db = MemoryGraph::new();
        let a = resource(&db, "R1", "Paper").await;
        let p = predicate(&db, "P1").await;
        let lit_b = Literal::new(id("L2"), "b", t0());
        let lit_a = Literal::new(id("L1"), "a", t0());
        db.save_thing(lit_b.clone().into()).await.unwrap();
        db.save_thing(lit_a.clone().into()).await.unwrap();
        link(&db, &a, &p, lit_b).await;
        link(&db, &a, &p, lit_a).await;

        let page = PageRequest::default().with_sort(Sort::by("obj.label", SortDirection::Asc));
        let found = db.find_statements(&StatementQuery::default(), &page).await.unwrap();
        let labels: Vec<&str> = found.content.iter().map(|s| s.object.label()).collect();
        assert_eq!(labels, vec!["a", "b"]);

        let bad = PageRequest::default().with_sort(Sort::by("obj.color", SortDirection::Asc));
        let err = db.find_statements(&StatementQuery::default(), &bad).await.unwrap_err();
        assert!(matches!(err, Error::UnknownSortingProperty(p) if p == "obj.color"));
    }

    #[tokio::test]
    async fn test_bundle_levels() {
        let db = MemoryGraph::new();
        let a = resource(&db, "R1", "Thing").await;
        let b = resource(&db, "R2", "Thing").await;
        let c = resource(&db, "R3", "Thing").await;
        let p = predicate(&db, "P1").await;
        let ab = link(&db, &a, &p, b.clone()).await;
        let bc = link(&db, &b, &p, c).await;

        let all = db.fetch_bundle(&a.id, &BundleConfig::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let shallow = BundleConfig { max_level: Some(1), ..BundleConfig::default() };
        let ids: Vec<StatementId> = db.fetch_bundle(&a.id, &shallow).await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![ab]);

        let deep = BundleConfig { min_level: Some(1), ..BundleConfig::default() };
        let ids: Vec<StatementId> = db.fetch_bundle(&a.id, &deep).await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![bc]);
    }

    #[tokio::test]
    async fn test_bundle_uses_shortest_level() {
        let db = MemoryGraph::new();
        let root = resource(&db, "R1", "Thing").await;
        let a = resource(&db, "R2", "Thing").await;
        let b = resource(&db, "R3", "Thing").await;
        let c = resource(&db, "R4", "Thing").await;
        let d = resource(&db, "R5", "Thing").await;
        let p = predicate(&db, "P1").await;
        // the long path R1 -> R2 -> R3 is walked first
        link(&db, &root, &p, b.clone()).await;
        link(&db, &root, &p, a.clone()).await;
        link(&db, &a, &p, b.clone()).await;
        link(&db, &b, &p, c.clone()).await;
        let cd = link(&db, &c, &p, d).await;

        let bounded = BundleConfig { max_level: Some(3), ..BundleConfig::default() };
        let bundle = db.fetch_bundle(&root.id, &bounded).await.unwrap();
        assert_eq!(bundle.len(), 5);
        assert!(bundle.iter().any(|s| s.id == cd));

        let shallow = BundleConfig { max_level: Some(2), ..BundleConfig::default() };
        let bundle = db.fetch_bundle(&root.id, &shallow).await.unwrap();
        assert_eq!(bundle.len(), 4);
        assert!(bundle.iter().all(|s| s.id != cd));
    }

    #[tokio::test]
    async fn test_bundle_blacklist() {
        let db = MemoryGraph::new();
        let a = resource(&db, "R1", "Thing").await;
        let b = resource(&db, "R2", "Problem").await;
        let p = predicate(&db, "P1").await;
        link(&db, &a, &p, b).await;
        let config = BundleConfig { blacklist: vec![id("Problem")], ..BundleConfig::default() };
        assert!(db.fetch_bundle(&a.id, &config).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeline_truncates_to_minutes() {
        let db = MemoryGraph::new();
        let alice = ContributorId::random();
        let a = Resource::new(id("R1"), "paper", t0()).with_created_by(alice);
        db.save_thing(a.clone().into()).await.unwrap();
        let p = predicate(&db, "P1").await;
        let lit = Literal::new(id("L1"), "x", t0() + Duration::seconds(90));
        db.save_thing(lit.clone().into()).await.unwrap();
        let sid = db.next_statement_id().await.unwrap();
        let s = Statement::new(sid, a.clone(), p, lit, t0() + Duration::seconds(95)).with_created_by(alice);
        db.save_statement(s).await.unwrap();

        let timeline = db.find_timeline(&a.id, &PageRequest::default()).await.unwrap();
        assert_eq!(
            timeline.content,
            vec![
                ResourceContributor { created_by: alice, created_at: "1970-01-01T00:01:00Z".into() },
                ResourceContributor { created_by: alice, created_at: "1970-01-01T00:00:00Z".into() },
            ]
        );

        let missing = db.find_timeline(&id("R404"), &PageRequest::default()).await;
        assert!(matches!(missing, Err(Error::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_predicate_usage() {
        let db = MemoryGraph::new();
        let a = resource(&db, "R1", "Thing").await;
        let b = resource(&db, "R2", "Thing").await;
        let p1 = predicate(&db, "P1").await;
        let p2 = predicate(&db, "P2").await;
        link(&db, &a, &p2, b.clone()).await;
        link(&db, &a, &p1, b.clone()).await;
        link(&db, &b, &p2, a.clone()).await;

        let usage = db.count_predicate_usage(&PageRequest::default()).await.unwrap();
        assert_eq!(
            usage.content,
            vec![PredicateUsage { id: id("P2"), count: 2 }, PredicateUsage { id: id("P1"), count: 1 }]
        );
    }
}
