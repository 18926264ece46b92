//! Typed view of literal values, used when comparing filter values.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};

use super::vocab::xsd;

/// A literal label interpreted in the domain of its datatype.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

// ============================================================================
// Parsing
// ============================================================================

impl TypedValue {
    /// Interpret `raw` according to `datatype`. Returns `None` when the text
    /// does not parse in that domain.
    pub fn parse(raw: &str, datatype: &str) -> Option<Self> {
        let raw = raw.trim();
        match xsd::normalize(datatype).as_str() {
            xsd::INTEGER | xsd::INT => raw.parse().ok().map(TypedValue::Int),
            xsd::DECIMAL | xsd::FLOAT => raw.parse().ok().map(TypedValue::Float),
            xsd::BOOLEAN => match raw.to_ascii_lowercase().as_str() {
                "true" => Some(TypedValue::Bool(true)),
                "false" => Some(TypedValue::Bool(false)),
                _ => None,
            },
            xsd::DATE => DateTime::parse_from_rfc3339(raw)
                .map(|dt| TypedValue::DateTime(dt.with_timezone(&Utc)))
                .ok()
                .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(TypedValue::Date)),
            _ => Some(TypedValue::String(raw.to_string())),
        }
    }
}

// ============================================================================
// Comparison
// ============================================================================

impl TypedValue {
    /// Compare two values of the same domain. Returns None for incompatible
    /// types; ints and floats compare numerically, dates and timestamps by
    /// the start of the day in UTC.
    pub fn compare(&self, other: &TypedValue) -> Option<Ordering> {
        match (self, other) {
            (TypedValue::Bool(a), TypedValue::Bool(b)) => a.partial_cmp(b),
            (TypedValue::Int(a), TypedValue::Int(b)) => a.partial_cmp(b),
            (TypedValue::Float(a), TypedValue::Float(b)) => a.partial_cmp(b),
            (TypedValue::Int(a), TypedValue::Float(b)) => (*a as f64).partial_cmp(b),
            (TypedValue::Float(a), TypedValue::Int(b)) => a.partial_cmp(&(*b as f64)),
            (TypedValue::String(a), TypedValue::String(b)) => a.partial_cmp(b),
            (TypedValue::Date(a), TypedValue::Date(b)) => a.partial_cmp(b),
            (TypedValue::DateTime(a), TypedValue::DateTime(b)) => a.partial_cmp(b),
            (TypedValue::Date(a), TypedValue::DateTime(b)) => start_of_day(*a).partial_cmp(b),
            (TypedValue::DateTime(a), TypedValue::Date(b)) => a.partial_cmp(&start_of_day(*b)),
            _ => None,
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_datatype() {
        assert_eq!(TypedValue::parse("42", xsd::INTEGER), Some(TypedValue::Int(42)));
        assert_eq!(TypedValue::parse("4.5", "http://www.w3.org/2001/XMLSchema#decimal"), Some(TypedValue::Float(4.5)));
        assert_eq!(TypedValue::parse("TRUE", xsd::BOOLEAN), Some(TypedValue::Bool(true)));
        assert_eq!(TypedValue::parse("yes", xsd::BOOLEAN), None);
        assert_eq!(TypedValue::parse("abc", xsd::INTEGER), None);
        assert_eq!(TypedValue::parse("x", xsd::STRING), Some(TypedValue::String("x".into())));
    }

    #[test]
    fn test_date_and_timestamp_compare() {
        let d = TypedValue::parse("2023-05-01", xsd::DATE).unwrap();
        let t = TypedValue::parse("2023-05-01T12:00:00+02:00", xsd::DATE).unwrap();
        assert_eq!(d.compare(&t), Some(Ordering::Less));
    }

    #[test]
    fn test_numeric_comparison() {
        assert_eq!(TypedValue::Int(1).compare(&TypedValue::Float(1.5)), Some(Ordering::Less));
        assert_eq!(TypedValue::Int(1).compare(&TypedValue::String("1".into())), None);
    }
}
