//! DOI syntax and lookup.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ServiceContext;
use crate::model::vocab::classes;
use crate::model::{Resource, ThingId};
use crate::storage::GraphRepository;
use crate::{Error, Result};

/// Registrant prefix under which published papers receive their DOI.
pub const DOI_PREFIX: &str = "10.48366";

static DOI_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^10\.\d{4,9}/[-._;()/:a-z0-9]+$").ok());

const RESOLVER_PREFIXES: [&str; 4] = ["https://doi.org/", "http://doi.org/", "https://dx.doi.org/", "doi:"];

/// A syntactically valid DOI, stored without resolver prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Doi(String);

impl Doi {
    /// Parse a DOI, accepting `https://doi.org/` and `doi:` prefixed forms.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let bare = RESOLVER_PREFIXES
            .iter()
            .find_map(|p| trimmed.strip_prefix(p))
            .unwrap_or(trimmed);
        if DOI_PATTERN.as_ref().is_some_and(|re| re.is_match(bare)) {
            Ok(Self(bare.to_string()))
        } else {
            Err(Error::InvalidDoi(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prefix(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(prefix, _)| prefix)
    }

    pub fn url(&self) -> String {
        format!("https://doi.org/{}", self.0)
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct DoiService<B: GraphRepository> {
    ctx: ServiceContext<B>,
}

impl<B: GraphRepository> DoiService<B> {
    pub fn new(ctx: ServiceContext<B>) -> Self {
        Self { ctx }
    }

    /// The newest paper or comparison carrying `doi`.
    pub async fn resolve(&self, doi: &str) -> Result<Option<Resource>> {
        let doi = Doi::parse(doi)?;
        let classes = [ThingId::from_static(classes::PAPER), ThingId::from_static(classes::COMPARISON)];
        let found = self.ctx.repository.find_by_doi(doi.as_str(), &classes).await?;
        tracing::debug!(%doi, found = found.is_some(), "resolved DOI");
        Ok(found)
    }
}
