//! Paged collections and sorting.
//!
//! Every list operation takes a [`PageRequest`] and returns a [`Page`]. The
//! serialized form of a page is the envelope list endpoints emit:
//!
//! ```text
//! { "content": [...], "page": { "number": 0, "size": 20, "total_elements": 42, "total_pages": 3 } }
//! ```

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 2500;

// ============================================================================
// Sort
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub property: String,
    pub direction: SortDirection,
}

/// Ordered list of sort criteria. Empty means "use the listing default".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sort {
    pub orders: Vec<SortOrder>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(property: impl Into<String>, direction: SortDirection) -> Self {
        Self { orders: vec![SortOrder { property: property.into(), direction }] }
    }

    pub fn then(mut self, property: impl Into<String>, direction: SortDirection) -> Self {
        self.orders.push(SortOrder { property: property.into(), direction });
        self
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    /// Parse `sort` query parameters of the form `property[,asc|desc]`.
    pub fn parse<S: AsRef<str>>(params: &[S]) -> Result<Self> {
        let mut orders = Vec::with_capacity(params.len());
        for param in params {
            let mut parts = param.as_ref().split(',').map(str::trim);
            let property = parts.next().filter(|p| !p.is_empty()).ok_or_else(|| {
                Error::InvalidParameter { name: "sort".into(), reason: "missing property".into() }
            })?;
            let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
                None | Some("asc") => SortDirection::Asc,
                Some("desc") => SortDirection::Desc,
                Some(other) => {
                    return Err(Error::InvalidParameter {
                        name: "sort".into(),
                        reason: format!("unknown direction \"{other}\""),
                    })
                }
            };
            orders.push(SortOrder { property: property.to_string(), direction });
        }
        Ok(Self { orders })
    }

    /// Reject properties the listing cannot sort by.
    pub fn validate(&self, supported: &[&str]) -> Result<()> {
        match self.orders.iter().find(|o| !supported.contains(&o.property.as_str())) {
            Some(order) => Err(Error::UnknownSortingProperty(order.property.clone())),
            None => Ok(()),
        }
    }

    pub fn or_else(&self, default: impl FnOnce() -> Sort) -> Sort {
        if self.is_unsorted() { default() } else { self.clone() }
    }

    /// Compare two items under this sort. `key` yields the value of a
    /// property for an item; missing values order last in either direction.
    pub fn compare<T>(&self, a: &T, b: &T, key: impl Fn(&T, &str) -> Option<SortKey>) -> Ordering {
        for order in &self.orders {
            let ka = key(a, &order.property);
            let kb = key(b, &order.property);
            let result = match (ka, kb) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => {
                    let ord = x.cmp(&y);
                    match order.direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                }
            };
            if result != Ordering::Equal {
                return result;
            }
        }
        Ordering::Equal
    }
}

/// A sortable property value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
}

impl From<&str> for SortKey { fn from(v: &str) -> Self { SortKey::Text(v.to_string()) } }
impl From<String> for SortKey { fn from(v: String) -> Self { SortKey::Text(v) } }
impl From<i64> for SortKey { fn from(v: i64) -> Self { SortKey::Int(v) } }
impl From<DateTime<Utc>> for SortKey { fn from(v: DateTime<Utc>) -> Self { SortKey::Time(v) } }

// ============================================================================
// PageRequest
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
    #[serde(default)]
    pub sort: Sort,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: DEFAULT_PAGE_SIZE, sort: Sort::unsorted() }
    }
}

impl PageRequest {
    pub fn of(page: usize, size: usize) -> Self {
        Self { page, size, sort: Sort::unsorted() }
    }

    pub fn first(size: usize) -> Self {
        Self::of(0, size)
    }

    /// Request everything on a single page.
    pub fn unpaged() -> Self {
        Self::of(0, usize::MAX)
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Clamp the page size to `max`; a size of zero falls back to `default`.
    pub fn clamped(mut self, default: usize, max: usize) -> Self {
        if self.size == 0 {
            self.size = default;
        }
        self.size = self.size.min(max);
        self
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

// ============================================================================
// Page
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub number: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: PageMetadata,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: usize) -> Self {
        let total_pages = if request.size == 0 {
            0
        } else {
            total_elements.div_ceil(request.size)
        };
        Self {
            content,
            page: PageMetadata {
                number: request.page,
                size: request.size,
                total_elements,
                total_pages,
            },
        }
    }

    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn total_elements(&self) -> usize {
        self.page.total_elements
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page { content: self.content.into_iter().map(f).collect(), page: self.page }
    }
}

/// Cut one page out of an already filtered and ordered sequence.
pub fn paged<T>(items: impl IntoIterator<Item = T>, request: &PageRequest) -> Page<T> {
    let all: Vec<T> = items.into_iter().collect();
    let total = all.len();
    let content = all.into_iter().skip(request.offset()).take(request.size).collect();
    Page::new(content, request, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_sort_parse() {
        let sort = Sort::parse(&["created_at,desc", "label"]).unwrap();
        assert_eq!(
            sort,
            Sort::by("created_at", SortDirection::Desc).then("label", SortDirection::Asc)
        );
        assert!(Sort::parse(&["label,sideways"]).is_err());
        assert!(Sort::parse(&[",asc"]).is_err());
    }

    #[test]
    fn test_unknown_sorting_property() {
        let sort = Sort::parse(&["foo"]).unwrap();
        let err = sort.validate(&["id", "created_at"]).unwrap_err();
        assert_eq!(err.to_string(), r#"Unknown sorting property "foo"."#);
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_missing_values_sort_last() {
        let items = vec![(1, None), (2, Some("b")), (3, Some("a"))];
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let sort = Sort::by("v", direction);
            let mut sorted = items.clone();
            sorted.sort_by(|a, b| sort.compare(a, b, |x, _| x.1.map(SortKey::from)));
            assert_eq!(sorted.last().unwrap().0, 1);
        }
    }

    #[test]
    fn test_page_envelope_shape() {
        let page = paged(0..45, &PageRequest::of(2, 20));
        assert_eq!(page.content, vec![40, 41, 42, 43, 44]);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["page"]["number"], 2);
        assert_eq!(json["page"]["size"], 20);
        assert_eq!(json["page"]["total_elements"], 45);
        assert_eq!(json["page"]["total_pages"], 3);
    }

    #[test]
    fn test_clamped() {
        assert_eq!(PageRequest::of(0, 0).clamped(20, 2500).size, 20);
        assert_eq!(PageRequest::of(0, 10_000).clamped(20, 2500).size, 2500);
    }

    proptest! {
        #[test]
        fn prop_pages_partition_items(total in 0usize..200, size in 1usize..50) {
            let pages = total.div_ceil(size).max(1);
            let mut seen = Vec::new();
            for p in 0..pages {
                let page = paged(0..total, &PageRequest::of(p, size));
                prop_assert!(page.len() <= size);
                prop_assert_eq!(page.total_elements(), total);
                seen.extend(page.content);
            }
            prop_assert_eq!(seen, (0..total).collect::<Vec<_>>());
        }
    }
}
