//! Listing state of a resource and the filter over it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Publication/listing state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[default]
    Default,
    Featured,
    Unlisted,
    Deleted,
}

/// Which visibilities a listing includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisibilityFilter {
    /// Default or featured.
    #[default]
    AllListed,
    Unlisted,
    Featured,
    /// Default only.
    NonFeatured,
    Deleted,
}

impl VisibilityFilter {
    pub const ALL: [VisibilityFilter; 5] = [
        VisibilityFilter::AllListed,
        VisibilityFilter::Unlisted,
        VisibilityFilter::Featured,
        VisibilityFilter::NonFeatured,
        VisibilityFilter::Deleted,
    ];

    pub fn matches(self, visibility: Visibility) -> bool {
        match self {
            VisibilityFilter::AllListed => {
                matches!(visibility, Visibility::Default | Visibility::Featured)
            }
            VisibilityFilter::Unlisted => visibility == Visibility::Unlisted,
            VisibilityFilter::Featured => visibility == Visibility::Featured,
            VisibilityFilter::NonFeatured => visibility == Visibility::Default,
            VisibilityFilter::Deleted => visibility == Visibility::Deleted,
        }
    }

    /// Legacy `featured`/`unlisted` flag pairs used by older list endpoints.
    pub fn from_flags(featured: Option<bool>, unlisted: bool) -> Self {
        match (featured, unlisted) {
            (_, true) => VisibilityFilter::Unlisted,
            (Some(true), false) => VisibilityFilter::Featured,
            (Some(false), false) => VisibilityFilter::NonFeatured,
            (None, false) => VisibilityFilter::AllListed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VisibilityFilter::AllListed => "ALL_LISTED",
            VisibilityFilter::Unlisted => "UNLISTED",
            VisibilityFilter::Featured => "FEATURED",
            VisibilityFilter::NonFeatured => "NON_FEATURED",
            VisibilityFilter::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for VisibilityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisibilityFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidVisibility(s.to_string()))
    }
}
