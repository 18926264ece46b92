//! # Search Filters
//!
//! A [`SearchFilter`] is a declarative descriptor that selects root nodes
//! (contributions of papers) by what can be reached from them:
//!
//! ```text
//! root ─[any]→ … ─[any]→ start ─[path[0]]→ ─[path[1]]→ … ─[path[n-1]]→ target
//!      └──── 0..=(10 - n) hops, only when exact = false ───┘
//! ```
//!
//! The target must satisfy the filter's `range` and at least one of its
//! values. Values OR-combine within a filter; a list of filters AND-combines.
//! The whole walk never exceeds [`MAX_PATH_LENGTH`] hops.

mod matcher;

pub use matcher::{GraphView, matches_all};

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::ThingId;
use crate::{Error, Result};

/// Upper bound on the number of hops a filter may traverse.
pub const MAX_PATH_LENGTH: usize = 10;

/// Comparison operator of a filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Operator {
    /// Whether `actual <op> expected` holds given `actual.cmp(expected)`.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Ne => ordering != Ordering::Equal,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Le => ordering != Ordering::Greater,
            Operator::Ge => ordering != Ordering::Less,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "EQ",
            Operator::Ne => "NE",
            Operator::Lt => "LT",
            Operator::Gt => "GT",
            Operator::Le => "LE",
            Operator::Ge => "GE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "EQ" => Ok(Operator::Eq),
            "NE" => Ok(Operator::Ne),
            "LT" => Ok(Operator::Lt),
            "GT" => Ok(Operator::Gt),
            "LE" => Ok(Operator::Le),
            "GE" => Ok(Operator::Ge),
            _ => Err(Error::InvalidSearchFilter(format!("unknown operator \"{s}\""))),
        }
    }
}

/// One value a filter target is compared against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterValue {
    pub op: Operator,
    pub value: String,
}

impl FilterValue {
    pub fn new(op: Operator, value: impl Into<String>) -> Self {
        Self { op, value: value.into() }
    }

    pub fn equal_to(value: impl Into<String>) -> Self {
        Self::new(Operator::Eq, value)
    }
}

/// Declarative path + range + values descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Predicate ids to follow, in order.
    pub path: SmallVec<[ThingId; 4]>,
    /// Type constraint of the target node.
    pub range: ThingId,
    pub values: Vec<FilterValue>,
    /// When false, the path may start anywhere in the root's bounded subgraph.
    #[serde(default = "default_exact")]
    pub exact: bool,
}

fn default_exact() -> bool {
    true
}

impl SearchFilter {
    pub fn new(
        path: impl IntoIterator<Item = ThingId>,
        range: ThingId,
        values: impl IntoIterator<Item = FilterValue>,
        exact: bool,
    ) -> Result<Self> {
        let filter = Self {
            path: path.into_iter().collect(),
            range,
            values: values.into_iter().collect(),
            exact,
        };
        filter.validate()?;
        Ok(filter.deduplicated())
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() || self.path.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidPath { length: self.path.len(), max: MAX_PATH_LENGTH });
        }
        if self.values.is_empty() {
            return Err(Error::InvalidSearchFilter("values must not be empty".into()));
        }
        Ok(())
    }

    /// Hops available before the path when the filter is not exact.
    pub fn prefix_depth(&self) -> usize {
        if self.exact { 0 } else { MAX_PATH_LENGTH.saturating_sub(self.path.len()) }
    }

    fn deduplicated(mut self) -> Self {
        let mut seen = hashbrown::HashSet::with_capacity(self.values.len());
        self.values.retain(|v| seen.insert(v.clone()));
        self
    }
}

/// Parse the JSON `filter_config` parameter: an array of filter descriptors.
pub fn parse_filters(json: &str) -> Result<Vec<SearchFilter>> {
    let filters: Vec<SearchFilter> =
        serde_json::from_str(json).map_err(|e| Error::InvalidSearchFilter(e.to_string()))?;
    filters
        .into_iter()
        .map(|f| {
            f.validate()?;
            Ok(f.deduplicated())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &'static str) -> ThingId {
        ThingId::from_static(s)
    }

    #[test]
    fn test_operator_holds() {
        assert!(Operator::Lt.holds(Ordering::Less));
        assert!(!Operator::Lt.holds(Ordering::Equal));
        assert!(Operator::Ge.holds(Ordering::Equal));
        assert!(Operator::Gt.holds(Ordering::Greater));
        assert!(!Operator::Gt.holds(Ordering::Less));
        assert!(Operator::Ne.holds(Ordering::Less));
    }

    #[test]
    fn test_path_bounds() {
        let too_long: Vec<ThingId> = (0..11).map(|i| ThingId::new(format!("P{i}")).unwrap()).collect();
        let err = SearchFilter::new(too_long, id("Problem"), [FilterValue::equal_to("R1")], true).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { length: 11, max: 10 }));

        let err = SearchFilter::new(Vec::new(), id("Problem"), [FilterValue::equal_to("R1")], true).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { length: 0, .. }));
    }

    #[test]
    fn test_prefix_depth() {
        let exact = SearchFilter::new([id("P32")], id("Problem"), [FilterValue::equal_to("R1")], true).unwrap();
        assert_eq!(exact.prefix_depth(), 0);
        let loose = SearchFilter::new([id("P1"), id("P2"), id("P3")], id("Problem"), [FilterValue::equal_to("R1")], false).unwrap();
        assert_eq!(loose.prefix_depth(), 7);
    }

    #[test]
    fn test_parse_filter_config() {
        let json = r#"[
            {"path":["P32"],"range":"Problem","values":[{"op":"EQ","value":"R182085"},{"op":"EQ","value":"R182085"}],"exact":true},
            {"path":["P2","P3"],"range":"Integer","values":[{"op":"GE","value":"5"}]}
        ]"#;
        let filters = parse_filters(json).unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].values.len(), 1);
        assert!(filters[1].exact);
        assert_eq!(filters[1].values[0].op, Operator::Ge);
    }

    #[test]
    fn test_parse_filter_config_rejects_bad_input() {
        assert!(matches!(parse_filters("{"), Err(Error::InvalidSearchFilter(_))));
        assert!(matches!(
            parse_filters(r#"[{"path":[],"range":"Problem","values":[{"op":"EQ","value":"R1"}]}]"#),
            Err(Error::InvalidPath { .. })
        ));
        assert!(matches!(
            parse_filters(r#"[{"path":["P1"],"range":"Problem","values":[{"op":"LIKE","value":"R1"}]}]"#),
            Err(Error::InvalidSearchFilter(_))
        ));
    }
}
