//! Filter compiler — turns declarative per-field comparison specs into one
//! query document and one sort document.
//!
//! Each [`FilterSpec`] names a column, an operator, and up to two values; the
//! compiler maps recognized operators to their query clauses and combines
//! multiple clauses under `$and`. A raw custom-query override, when present,
//! replaces every comparison clause wholesale. Individually incomplete specs
//! (missing column, unknown operator, missing value) are skipped so a partial
//! filter list still compiles; a malformed custom query or sort literal is a
//! hard error the caller must surface.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constructors::evaluate_call;
use crate::decoder::{parse_document, parse_value, DEFAULT_MAX_DEPTH};
use crate::error::FilterError;
use crate::types::Value;

/// A declarative per-field comparison request. Constructed by the caller per
/// query execution and consumed once by [`compile`]; the core does not
/// retain it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub column: String,
    #[serde(default)]
    pub compare: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub value2: Option<String>,
    #[serde(default)]
    pub is_custom_query: bool,
    #[serde(default)]
    pub custom_query: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
}

/// Sort direction for the fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Fallback sort applied when no spec carries an explicit `sort_by`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSpec {
    pub column: String,
    pub direction: Direction,
}

impl Direction {
    fn as_value(self) -> Value {
        Value::int(match self {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        })
    }
}

/// Compile filter specs into a `(query, sort)` pair of documents.
///
/// Precedence: a spec with `is_custom_query` and non-empty `custom_query`
/// wins outright — its text parses as the whole query and every comparison
/// clause is ignored. Otherwise each complete spec contributes one clause;
/// zero clauses yield `{}`, one clause stands alone, several are wrapped in
/// `$and`.
pub fn compile(
    filters: &[FilterSpec],
    fallback_order: Option<&OrderSpec>,
) -> Result<(Value, Value), FilterError> {
    let query = compile_query(filters)?;
    let sort = compile_sort(filters, fallback_order)?;
    Ok((query, sort))
}

fn compile_query(filters: &[FilterSpec]) -> Result<Value, FilterError> {
    if let Some(raw) = filters
        .iter()
        .filter(|f| f.is_custom_query)
        .find_map(|f| f.custom_query.as_deref().map(str::trim).filter(|s| !s.is_empty()))
    {
        return parse_document(raw, DEFAULT_MAX_DEPTH).map_err(FilterError::CustomQuery);
    }

    let now = Utc::now();
    let mut clauses: Vec<Value> = filters
        .iter()
        .filter_map(|spec| compile_clause(spec, now))
        .collect();
    Ok(match clauses.len() {
        0 => Value::Object(Vec::new()),
        1 => clauses.remove(0),
        _ => obj1("$and", Value::Array(clauses)),
    })
}

fn compile_sort(
    filters: &[FilterSpec],
    fallback_order: Option<&OrderSpec>,
) -> Result<Value, FilterError> {
    if let Some(raw) = filters
        .iter()
        .find_map(|f| f.sort_by.as_deref().map(str::trim).filter(|s| !s.is_empty()))
    {
        return parse_document(raw, DEFAULT_MAX_DEPTH).map_err(FilterError::SortSpec);
    }
    if let Some(order) = fallback_order {
        return Ok(obj1(&order.column, order.direction.as_value()));
    }
    Ok(Value::Object(Vec::new()))
}

/// Recognized comparison operators, parsed from a spec's operator name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Between,
    NotBetween,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    IsTrue,
    IsFalse,
    IsEmpty,
    IsNotEmpty,
    IsToday,
    IsThisWeek,
    IsThisMonth,
    IsThisYear,
    HasLength,
}

impl CompareOp {
    fn from_name(name: &str) -> Option<CompareOp> {
        Some(match name.trim().to_ascii_lowercase().as_str() {
            "equals" => CompareOp::Equals,
            "not equals" => CompareOp::NotEquals,
            "contains" => CompareOp::Contains,
            "not contains" => CompareOp::NotContains,
            "starts with" => CompareOp::StartsWith,
            "ends with" => CompareOp::EndsWith,
            "regex" => CompareOp::Regex,
            "greater than" => CompareOp::GreaterThan,
            "greater than or equals" => CompareOp::GreaterOrEqual,
            "less than" => CompareOp::LessThan,
            "less than or equals" => CompareOp::LessOrEqual,
            "between" => CompareOp::Between,
            "not between" => CompareOp::NotBetween,
            "in" => CompareOp::In,
            "not in" => CompareOp::NotIn,
            "is null" => CompareOp::IsNull,
            "is not null" => CompareOp::IsNotNull,
            "is true" => CompareOp::IsTrue,
            "is false" => CompareOp::IsFalse,
            "is empty" => CompareOp::IsEmpty,
            "is not empty" => CompareOp::IsNotEmpty,
            "is today" => CompareOp::IsToday,
            "is this week" => CompareOp::IsThisWeek,
            "is this month" => CompareOp::IsThisMonth,
            "is this year" => CompareOp::IsThisYear,
            "has length" => CompareOp::HasLength,
            _ => return None,
        })
    }

    /// Operators that compile without a value.
    fn is_nullary(self) -> bool {
        matches!(
            self,
            CompareOp::IsNull
                | CompareOp::IsNotNull
                | CompareOp::IsTrue
                | CompareOp::IsFalse
                | CompareOp::IsEmpty
                | CompareOp::IsNotEmpty
                | CompareOp::IsToday
                | CompareOp::IsThisWeek
                | CompareOp::IsThisMonth
                | CompareOp::IsThisYear
        )
    }
}

/// One spec → one clause, or `None` when the spec is incomplete (missing
/// column, unknown operator, missing value where one is needed).
fn compile_clause(spec: &FilterSpec, now: DateTime<Utc>) -> Option<Value> {
    let column = spec.column.trim();
    if column.is_empty() {
        return None;
    }
    let op = CompareOp::from_name(&spec.compare)?;
    let value = spec.value.trim();
    if value.is_empty() && !op.is_nullary() {
        return None;
    }

    Some(match op {
        CompareOp::Equals => field(column, coerce_scalar(column, value)),
        CompareOp::NotEquals => field(column, obj1("$ne", coerce_scalar(column, value))),
        CompareOp::Contains => field(column, ci_regex(regex::escape(value))),
        CompareOp::NotContains => field(column, obj1("$not", ci_regex(regex::escape(value)))),
        CompareOp::StartsWith => field(column, ci_regex(format!("^{}", regex::escape(value)))),
        CompareOp::EndsWith => field(column, ci_regex(format!("{}$", regex::escape(value)))),
        CompareOp::Regex => field(column, obj1("$regex", Value::Str(value.to_string()))),
        CompareOp::GreaterThan => field(column, obj1("$gt", coerce_scalar(column, value))),
        CompareOp::GreaterOrEqual => field(column, obj1("$gte", coerce_scalar(column, value))),
        CompareOp::LessThan => field(column, obj1("$lt", coerce_scalar(column, value))),
        CompareOp::LessOrEqual => field(column, obj1("$lte", coerce_scalar(column, value))),
        CompareOp::Between => {
            let high = second_value(spec)?;
            field(
                column,
                Value::Object(vec![
                    ("$gte".to_string(), coerce_scalar(column, value)),
                    ("$lte".to_string(), coerce_scalar(column, high)),
                ]),
            )
        }
        CompareOp::NotBetween => {
            let high = second_value(spec)?;
            obj1(
                "$or",
                Value::Array(vec![
                    field(column, obj1("$lt", coerce_scalar(column, value))),
                    field(column, obj1("$gt", coerce_scalar(column, high))),
                ]),
            )
        }
        CompareOp::In => field(column, obj1("$in", list_values(column, value))),
        CompareOp::NotIn => field(column, obj1("$nin", list_values(column, value))),
        CompareOp::IsNull => field(column, Value::Null),
        CompareOp::IsNotNull => field(column, obj1("$ne", Value::Null)),
        CompareOp::IsTrue => field(column, Value::Bool(true)),
        CompareOp::IsFalse => field(column, Value::Bool(false)),
        CompareOp::IsEmpty => obj1(
            "$or",
            Value::Array(vec![
                field(column, Value::Null),
                field(column, Value::Str(String::new())),
            ]),
        ),
        CompareOp::IsNotEmpty => obj1(
            "$and",
            Value::Array(vec![
                field(column, obj1("$ne", Value::Null)),
                field(column, obj1("$ne", Value::Str(String::new()))),
            ]),
        ),
        CompareOp::IsToday | CompareOp::IsThisWeek | CompareOp::IsThisMonth | CompareOp::IsThisYear => {
            date_window(column, op, now)?
        }
        CompareOp::HasLength => {
            let len: i64 = value.parse().ok()?;
            field(column, obj1("$size", Value::int(len)))
        }
    })
}

fn second_value(spec: &FilterSpec) -> Option<&str> {
    spec.value2.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Interpret a filter value the way the document grammar would: numbers,
/// booleans, and null keep their literal type; everything else is a string.
///
/// Identifier columns (`_id` or a `_id`-suffixed path) first try ObjectId
/// canonicalization of the string; when the value is not a valid 24-hex id,
/// the raw string is embedded rather than failing the whole compile.
fn coerce_scalar(column: &str, text: &str) -> Value {
    if is_identifier_column(column) {
        return match canonicalize_object_id(text) {
            Some(oid) => oid,
            None => Value::Str(text.to_string()),
        };
    }
    match parse_value(text) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => v,
        _ => Value::Str(text.to_string()),
    }
}

fn is_identifier_column(column: &str) -> bool {
    column.ends_with("_id")
}

/// Build an `ObjectId(...)` call for a value the registry accepts.
fn canonicalize_object_id(text: &str) -> Option<Value> {
    let arg = Value::Str(text.to_string());
    evaluate_call("ObjectId", std::slice::from_ref(&arg)).ok()?;
    Some(Value::Call {
        name: "ObjectId".to_string(),
        args: vec![arg],
    })
}

/// Comma-split a value into a coerced list for `$in`/`$nin`.
fn list_values(column: &str, value: &str) -> Value {
    Value::Array(
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| coerce_scalar(column, s))
            .collect(),
    )
}

/// Case-insensitive regex clause body.
fn ci_regex(pattern: String) -> Value {
    Value::Object(vec![
        ("$regex".to_string(), Value::Str(pattern)),
        ("$options".to_string(), Value::Str("i".to_string())),
    ])
}

fn field(column: &str, value: Value) -> Value {
    Value::Object(vec![(column.to_string(), value)])
}

fn obj1(key: &str, value: Value) -> Value {
    Value::Object(vec![(key.to_string(), value)])
}

/// Half-open `[$gte start, $lt end)` window anchored to the evaluation-time
/// calendar date. Weeks are ISO weeks (Monday start).
fn date_window(column: &str, op: CompareOp, now: DateTime<Utc>) -> Option<Value> {
    let today = now.date_naive();
    let (start, end) = match op {
        CompareOp::IsToday => (today, today.succ_opt()?),
        CompareOp::IsThisWeek => {
            let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            (start, start + Duration::days(7))
        }
        CompareOp::IsThisMonth => {
            let start = today.with_day(1)?;
            let end = if start.month() == 12 {
                NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)?
            };
            (start, end)
        }
        CompareOp::IsThisYear => (
            NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
            NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?,
        ),
        _ => return None,
    };
    Some(field(
        column,
        Value::Object(vec![
            ("$gte".to_string(), iso_call(start)),
            ("$lt".to_string(), iso_call(end)),
        ]),
    ))
}

/// Date boundaries ride as `ISODate("...")` calls so the execution layer
/// receives real date values, not strings.
fn iso_call(date: NaiveDate) -> Value {
    Value::Call {
        name: "ISODate".to_string(),
        args: vec![Value::Str(format!("{date}T00:00:00Z"))],
    }
}
