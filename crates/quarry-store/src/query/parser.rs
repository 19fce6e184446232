//! Filter expression parser.
//!
//! Grammar: `term (AND term)*`, where a term is a bare word, a quoted
//! phrase, `field:value`, `field:"quoted value"`, or a range
//! `field:[lower TO upper]`. Square brackets are inclusive, curly braces
//! exclusive, and `*` leaves a side open. `AND` is case-insensitive;
//! `OR` and `NOT` are rejected.

use chrono::{DateTime, Utc};

use quarry_core::constants::LAST_UPDATED_FIELD;
use quarry_core::errors::{QuarryError, QuarryResult};

/// A record field a clause can address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Id,
    Text,
    Annotation,
    Status,
    LastUpdated,
    Metadata(String),
}

impl Field {
    fn parse(name: &str, query: &str) -> QuarryResult<Self> {
        match name {
            "id" => Ok(Field::Id),
            "text" => Ok(Field::Text),
            "annotation" => Ok(Field::Annotation),
            "status" => Ok(Field::Status),
            LAST_UPDATED_FIELD => Ok(Field::LastUpdated),
            other => match other.strip_prefix("metadata.") {
                Some(key) if !key.is_empty() => Ok(Field::Metadata(key.to_string())),
                _ => Err(invalid(query, format!("unknown field `{other}`"))),
            },
        }
    }
}

/// One end of a range clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Unbounded,
    Inclusive(RangeValue),
    Exclusive(RangeValue),
}

/// Range endpoint, typed at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeValue {
    Time(DateTime<Utc>),
    Number(f64),
    Text(String),
}

/// A single conjunct of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Case-insensitive phrase search over the record text.
    FreeText(String),
    /// Field equality; `*` only requires the field to be present.
    Equals { field: Field, value: String },
    Range {
        field: Field,
        lower: Bound,
        upper: Bound,
    },
}

/// A parsed filter: every clause must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub clauses: Vec<Clause>,
}

impl Filter {
    /// Parse a filter expression. An empty expression or `*` matches everything.
    pub fn parse(query: &str) -> QuarryResult<Self> {
        let terms = split_terms(query)?;
        let mut clauses = Vec::new();
        let mut expect_term = true;

        for term in terms {
            if term.eq_ignore_ascii_case("AND") {
                if expect_term {
                    return Err(invalid(query, "`AND` without a left-hand term"));
                }
                expect_term = true;
                continue;
            }
            if term.eq_ignore_ascii_case("OR") || term.eq_ignore_ascii_case("NOT") {
                return Err(invalid(query, format!("`{term}` is not supported")));
            }
            if term == "*" {
                expect_term = false;
                continue;
            }
            // Adjacent terms without AND are an implicit conjunction.
            clauses.push(parse_term(&term, query)?);
            expect_term = false;
        }

        if expect_term && !clauses.is_empty() {
            return Err(invalid(query, "dangling `AND`"));
        }
        Ok(Self { clauses })
    }
}

fn invalid(query: &str, reason: impl Into<String>) -> QuarryError {
    QuarryError::InvalidQuery {
        query: query.to_string(),
        reason: reason.into(),
    }
}

/// Split on whitespace, keeping quoted strings and bracketed ranges whole.
fn split_terms(query: &str) -> QuarryResult<Vec<String>> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
            }
            '"' => {
                current.push(c);
                let mut closed = false;
                for inner in chars.by_ref() {
                    current.push(inner);
                    if inner == '"' {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(invalid(query, "unterminated quote"));
                }
            }
            '[' | '{' => {
                current.push(c);
                let mut closed = false;
                for inner in chars.by_ref() {
                    current.push(inner);
                    if inner == ']' || inner == '}' {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(invalid(query, "unterminated range"));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        terms.push(current);
    }
    Ok(terms)
}

fn parse_term(term: &str, query: &str) -> QuarryResult<Clause> {
    if let Some(phrase) = unquote(term) {
        return Ok(Clause::FreeText(phrase.to_lowercase()));
    }

    let Some((name, raw_value)) = term.split_once(':') else {
        return Ok(Clause::FreeText(term.to_lowercase()));
    };
    if name.is_empty() || raw_value.is_empty() {
        return Err(invalid(query, format!("malformed term `{term}`")));
    }
    let field = Field::parse(name, query)?;

    if raw_value.starts_with('[') || raw_value.starts_with('{') {
        let (lower, upper) = parse_range(raw_value, &field, query)?;
        return Ok(Clause::Range {
            field,
            lower,
            upper,
        });
    }

    let value = unquote(raw_value).unwrap_or(raw_value).to_string();
    Ok(Clause::Equals { field, value })
}

fn unquote(s: &str) -> Option<&str> {
    s.strip_prefix('"').and_then(|s| s.strip_suffix('"'))
}

fn parse_range(raw: &str, field: &Field, query: &str) -> QuarryResult<(Bound, Bound)> {
    let lower_inclusive = raw.starts_with('[');
    let upper_inclusive = raw.ends_with(']');
    if !(raw.ends_with(']') || raw.ends_with('}')) {
        return Err(invalid(query, format!("malformed range `{raw}`")));
    }
    let body = &raw[1..raw.len() - 1];
    let parts: Vec<&str> = body.split(" TO ").map(str::trim).collect();
    if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(invalid(query, format!("range `{raw}` needs `lower TO upper`")));
    }

    let lower = parse_bound(parts[0], lower_inclusive, field, query)?;
    let upper = parse_bound(parts[1], upper_inclusive, field, query)?;
    Ok((lower, upper))
}

fn parse_bound(raw: &str, inclusive: bool, field: &Field, query: &str) -> QuarryResult<Bound> {
    if raw == "*" {
        return Ok(Bound::Unbounded);
    }
    let raw = unquote(raw).unwrap_or(raw);
    let value = if *field == Field::LastUpdated {
        let time = DateTime::parse_from_rfc3339(raw)
            .map_err(|e| invalid(query, format!("bad timestamp `{raw}`: {e}")))?;
        RangeValue::Time(time.with_timezone(&Utc))
    } else if let Ok(number) = raw.parse::<f64>() {
        RangeValue::Number(number)
    } else {
        RangeValue::Text(raw.to_string())
    };
    Ok(if inclusive {
        Bound::Inclusive(value)
    } else {
        Bound::Exclusive(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_and_metadata_conjunction() {
        let filter = Filter::parse("status:Validated and metadata.batch_id:3").unwrap();
        assert_eq!(
            filter.clauses,
            vec![
                Clause::Equals {
                    field: Field::Status,
                    value: "Validated".to_string()
                },
                Clause::Equals {
                    field: Field::Metadata("batch_id".to_string()),
                    value: "3".to_string()
                },
            ]
        );
    }

    #[test]
    fn parses_half_open_time_window() {
        let filter = Filter::parse(
            "status:Validated AND last_updated:[2026-01-01T00:00:00Z TO 2026-01-01T00:00:10Z}",
        )
        .unwrap();
        match &filter.clauses[1] {
            Clause::Range {
                field: Field::LastUpdated,
                lower: Bound::Inclusive(RangeValue::Time(_)),
                upper: Bound::Exclusive(RangeValue::Time(_)),
            } => {}
            other => panic!("unexpected clause: {other:?}"),
        }
    }

    #[test]
    fn open_range_ends_are_unbounded() {
        let filter = Filter::parse("last_updated:[* TO 2026-01-01T00:00:00Z}").unwrap();
        assert!(matches!(
            &filter.clauses[0],
            Clause::Range {
                lower: Bound::Unbounded,
                ..
            }
        ));
    }

    #[test]
    fn bare_and_quoted_words_are_free_text() {
        let filter = Filter::parse("\"Capital City\" AND moon").unwrap();
        assert_eq!(
            filter.clauses,
            vec![
                Clause::FreeText("capital city".to_string()),
                Clause::FreeText("moon".to_string()),
            ]
        );
    }

    #[test]
    fn empty_and_star_match_everything() {
        assert!(Filter::parse("").unwrap().clauses.is_empty());
        assert!(Filter::parse("*").unwrap().clauses.is_empty());
    }

    #[test]
    fn rejects_unsupported_and_malformed_input() {
        assert!(Filter::parse("status:Validated OR status:Pending").is_err());
        assert!(Filter::parse("status:Validated AND").is_err());
        assert!(Filter::parse("AND status:Validated").is_err());
        assert!(Filter::parse("colour:red").is_err());
        assert!(Filter::parse("last_updated:[yesterday TO *]").is_err());
        assert!(Filter::parse("text:\"unterminated").is_err());
        assert!(Filter::parse("metadata.batch_id:[1 TO 3").is_err());
    }
}
