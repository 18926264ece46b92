//! Statement (subject, predicate, object): the edge of the knowledge graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContributorId, Predicate, StatementId, Thing};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub id: StatementId,
    pub subject: Thing,
    pub predicate: Predicate,
    pub object: Thing,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    /// Ordering among statements of the same subject and predicate.
    pub index: Option<i32>,
    pub modifiable: bool,
}

impl Statement {
    pub fn new(
        id: StatementId,
        subject: impl Into<Thing>,
        predicate: Predicate,
        object: impl Into<Thing>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            subject: subject.into(),
            predicate,
            object: object.into(),
            created_at,
            created_by: ContributorId::UNKNOWN,
            index: None,
            modifiable: true,
        }
    }

    pub fn with_created_by(mut self, contributor: ContributorId) -> Self {
        self.created_by = contributor;
        self
    }
}
