//! Domain error taxonomy and the uniform JSON error envelope.
//!
//! Every failure is raised as soon as it is detected and carries enough
//! context (ids, counts) to render a human-readable message. Translation to
//! a transport status happens in one place: [`Error::status`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::model::{ObservatoryFilterId, ObservatoryId, SnapshotId, StatementId, ThingId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === Validation (400) ===
    #[error(r#"Invalid thing id "{0}"."#)]
    InvalidId(String),

    #[error(r#"Invalid value for parameter "{name}": {reason}."#)]
    InvalidParameter { name: String, reason: String },

    #[error(r#"Invalid visibility filter "{0}"."#)]
    InvalidVisibility(String),

    #[error("Invalid search filter path of length {length}. Paths must contain between 1 and {max} predicates.")]
    InvalidPath { length: usize, max: usize },

    #[error("Invalid search filter: {0}")]
    InvalidSearchFilter(String),

    #[error(r#"Unknown sorting property "{0}"."#)]
    UnknownSortingProperty(String),

    #[error("Too many parameters: at most {max} of {names} may be specified at once, got {actual}.")]
    TooManyParameters { max: usize, actual: usize, names: String },

    #[error(r#"The value passed as query parameter "doi" is not a valid DOI. The value sent was: {0}"#)]
    InvalidDoi(String),

    #[error(r#"Too many input positions for rosetta stone statement of template "{template_id}". Expected exactly {expected} input positions."#)]
    TooManyInputPositions { expected: usize, actual: usize, template_id: ThingId },

    #[error(r#"Missing input for rosetta stone statement of template "{template_id}". Expected exactly {expected} input positions."#)]
    MissingInputPositions { expected: usize, actual: usize, template_id: ThingId },

    #[error(r#"Template "{template_id}" cannot be applied to resource "{resource_id}" because the target resource is not an instance of the template target class."#)]
    TemplateNotApplicable { template_id: ThingId, resource_id: ThingId },

    #[error(r#"Class "{class_id}" already has template "{template_id}"."#)]
    TemplateAlreadyExistsForClass { class_id: ThingId, template_id: ThingId },

    #[error(r#"Paper with title "{0}" already exists."#)]
    PaperTitleAlreadyExists(String),

    #[error(r#"Paper with identifier "{0}" already exists."#)]
    PaperIdentifierAlreadyExists(String),

    #[error(r#"Paper "{0}" is already published."#)]
    PaperAlreadyPublished(ThingId),

    #[error(r#"A thing with id "{0}" already exists."#)]
    ThingAlreadyExists(ThingId),

    #[error(r#"Observatory filter "{0}" already exists."#)]
    ObservatoryFilterAlreadyExists(ObservatoryFilterId),

    // === Forbidden state transitions (403) ===
    #[error(r#"Paper "{0}" is not modifiable."#)]
    PaperNotModifiable(ThingId),

    #[error(r#"Rosetta stone statement "{0}" is not modifiable."#)]
    RosettaStoneStatementNotModifiable(ThingId),

    #[error(r#"Unable to delete statement "{0}" because it is not modifiable."#)]
    StatementNotModifiable(StatementId),

    // === Not found (404) ===
    #[error(r#"Thing "{0}" not found."#)]
    ThingNotFound(ThingId),

    #[error(r#"Resource "{0}" not found."#)]
    ResourceNotFound(ThingId),

    #[error(r#"Predicate "{0}" not found."#)]
    PredicateNotFound(ThingId),

    #[error(r#"Class "{0}" not found."#)]
    ClassNotFound(ThingId),

    #[error(r#"Statement "{0}" not found."#)]
    StatementNotFound(StatementId),

    #[error(r#"Paper "{0}" not found."#)]
    PaperNotFound(ThingId),

    #[error(r#"Template "{0}" not found."#)]
    TemplateNotFound(ThingId),

    #[error(r#"Template instance for resource "{resource_id}" and template id "{template_id}" not found."#)]
    TemplateInstanceNotFound { template_id: ThingId, resource_id: ThingId },

    #[error(r#"Snapshot "{0}" not found."#)]
    SnapshotNotFound(SnapshotId),

    #[error(r#"Research problem "{0}" not found."#)]
    ResearchProblemNotFound(ThingId),

    #[error(r#"Research field "{0}" not found."#)]
    ResearchFieldNotFound(ThingId),

    #[error(r#"Rosetta stone template "{0}" not found."#)]
    RosettaStoneTemplateNotFound(ThingId),

    #[error(r#"Rosetta stone statement "{0}" not found."#)]
    RosettaStoneStatementNotFound(ThingId),

    #[error(r#"Table "{0}" not found."#)]
    TableNotFound(ThingId),

    #[error(r#"Visualization "{0}" not found."#)]
    VisualizationNotFound(ThingId),

    #[error(r#"Observatory "{0}" not found."#)]
    ObservatoryNotFound(ObservatoryId),

    #[error(r#"Observatory filter "{0}" not found."#)]
    ObservatoryFilterNotFound(ObservatoryFilterId),

    // === Internal (500) ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status code this error is surfaced with.
    pub fn status(&self) -> u16 {
        use Error::*;
        match self {
            InvalidId(_)
            | InvalidParameter { .. }
            | InvalidVisibility(_)
            | InvalidPath { .. }
            | InvalidSearchFilter(_)
            | UnknownSortingProperty(_)
            | TooManyParameters { .. }
            | InvalidDoi(_)
            | TooManyInputPositions { .. }
            | MissingInputPositions { .. }
            | TemplateNotApplicable { .. }
            | TemplateAlreadyExistsForClass { .. }
            | PaperTitleAlreadyExists(_)
            | PaperIdentifierAlreadyExists(_)
            | PaperAlreadyPublished(_)
            | ThingAlreadyExists(_)
            | ObservatoryFilterAlreadyExists(_) => 400,

            PaperNotModifiable(_)
            | RosettaStoneStatementNotModifiable(_)
            | StatementNotModifiable(_) => 403,

            ThingNotFound(_)
            | ResourceNotFound(_)
            | PredicateNotFound(_)
            | ClassNotFound(_)
            | StatementNotFound(_)
            | PaperNotFound(_)
            | TemplateNotFound(_)
            | TemplateInstanceNotFound { .. }
            | SnapshotNotFound(_)
            | ResearchProblemNotFound(_)
            | ResearchFieldNotFound(_)
            | RosettaStoneTemplateNotFound(_)
            | RosettaStoneStatementNotFound(_)
            | TableNotFound(_)
            | VisualizationNotFound(_)
            | ObservatoryNotFound(_)
            | ObservatoryFilterNotFound(_) => 404,

            Config(_) | Storage(_) | Io(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == 404
    }
}

/// Reason phrase for the status codes the taxonomy produces.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// JSON error body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub path: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn from_error(error: &Error, path: impl Into<String>, clock: &dyn Clock) -> Self {
        let status = error.status();
        let path = path.into();
        if status >= 500 {
            tracing::error!(%path, error = %error, "request failed with internal error");
        } else {
            tracing::debug!(%path, status, error = %error, "request rejected");
        }
        Self {
            status,
            error: reason_phrase(status).to_string(),
            path,
            message: error.to_string(),
            timestamp: clock.now(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
