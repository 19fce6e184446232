//! Filter evaluation against a single record.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use quarry_core::models::AnnotationRecord;

use super::parser::{Bound, Clause, Field, Filter, RangeValue};

impl Filter {
    /// Whether `record` satisfies every clause.
    pub fn matches(&self, record: &AnnotationRecord) -> bool {
        self.clauses.iter().all(|clause| clause_matches(clause, record))
    }

    /// Tightest `last_updated` interval implied by the range clauses, with
    /// inclusivity dropped. `None` leaves that side open.
    pub fn last_updated_bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let mut lower: Option<DateTime<Utc>> = None;
        let mut upper: Option<DateTime<Utc>> = None;
        for clause in &self.clauses {
            let Clause::Range {
                field: Field::LastUpdated,
                lower: from,
                upper: to,
            } = clause
            else {
                continue;
            };
            if let Bound::Inclusive(RangeValue::Time(t)) | Bound::Exclusive(RangeValue::Time(t)) = from {
                lower = Some(lower.map_or(*t, |l| l.max(*t)));
            }
            if let Bound::Inclusive(RangeValue::Time(t)) | Bound::Exclusive(RangeValue::Time(t)) = to {
                upper = Some(upper.map_or(*t, |u| u.min(*t)));
            }
        }
        (lower, upper)
    }
}

fn clause_matches(clause: &Clause, record: &AnnotationRecord) -> bool {
    match clause {
        Clause::FreeText(phrase) => record.text.to_lowercase().contains(phrase.as_str()),
        Clause::Equals { field, value } => equals(field, value, record),
        Clause::Range {
            field,
            lower,
            upper,
        } => match field_value(field, record) {
            Some(actual) => within(&actual, lower, upper),
            None => false,
        },
    }
}

fn equals(field: &Field, expected: &str, record: &AnnotationRecord) -> bool {
    let Some(actual) = field_value(field, record) else {
        return false;
    };
    if expected == "*" {
        return true;
    }
    match (field, actual) {
        (Field::Status, RangeValue::Text(actual)) => actual.eq_ignore_ascii_case(expected),
        (Field::Text, RangeValue::Text(actual)) => {
            actual.to_lowercase().contains(&expected.to_lowercase())
        }
        (_, RangeValue::Number(actual)) => expected
            .parse::<f64>()
            .map(|e| e == actual)
            .unwrap_or(false),
        (_, RangeValue::Text(actual)) => actual == expected,
        (_, RangeValue::Time(actual)) => chrono::DateTime::parse_from_rfc3339(expected)
            .map(|e| e == actual)
            .unwrap_or(false),
    }
}

/// The record's value for `field`, typed for comparison. `None` when absent.
fn field_value(field: &Field, record: &AnnotationRecord) -> Option<RangeValue> {
    match field {
        Field::Id => Some(RangeValue::Text(record.id.to_string())),
        Field::Text => Some(RangeValue::Text(record.text.clone())),
        Field::Annotation => record.annotation.clone().map(RangeValue::Text),
        Field::Status => Some(RangeValue::Text(record.status.as_str().to_string())),
        Field::LastUpdated => record.last_updated.map(RangeValue::Time),
        Field::Metadata(key) => record.metadata.get(key).and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_f64().map(RangeValue::Number),
            serde_json::Value::String(s) => Some(RangeValue::Text(s.clone())),
            serde_json::Value::Bool(b) => Some(RangeValue::Text(b.to_string())),
            serde_json::Value::Null => None,
            other => Some(RangeValue::Text(other.to_string())),
        }),
    }
}

fn compare(actual: &RangeValue, bound: &RangeValue) -> Option<Ordering> {
    match (actual, bound) {
        (RangeValue::Time(a), RangeValue::Time(b)) => Some(a.cmp(b)),
        (RangeValue::Number(a), RangeValue::Number(b)) => a.partial_cmp(b),
        (RangeValue::Text(a), RangeValue::Number(b)) => {
            a.parse::<f64>().ok().and_then(|a| a.partial_cmp(b))
        }
        (RangeValue::Number(a), RangeValue::Text(b)) => {
            Some(a.to_string().as_str().cmp(b.as_str()))
        }
        (RangeValue::Text(a), RangeValue::Text(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

fn within(actual: &RangeValue, lower: &Bound, upper: &Bound) -> bool {
    let lower_ok = match lower {
        Bound::Unbounded => true,
        Bound::Inclusive(b) => matches!(
            compare(actual, b),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Bound::Exclusive(b) => matches!(compare(actual, b), Some(Ordering::Greater)),
    };
    let upper_ok = match upper {
        Bound::Unbounded => true,
        Bound::Inclusive(b) => {
            matches!(compare(actual, b), Some(Ordering::Less | Ordering::Equal))
        }
        Bound::Exclusive(b) => matches!(compare(actual, b), Some(Ordering::Less)),
    };
    lower_ok && upper_ok
}
