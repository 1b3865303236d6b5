//! Constructor registry and evaluator — resolves `Call` nodes to canonical
//! extended values.
//!
//! The registry is a fixed table: [`Constructor::from_name`] is the single
//! point where a call name resolves to a typed builder, and each builder
//! enforces its own arity rule and argument validation. Evaluation recurses
//! into nested `Call` arguments (a `DBRef` id may itself be an `ObjectId`
//! call) before the outer canonical value is built.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::ConstructorError;
use crate::types::Value;

/// Evaluated form of a constructor call.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    /// 24 hexadecimal characters.
    ObjectId(String),
    Date(DateTime<Utc>),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    /// Decimal text carried verbatim; no numeric validation beyond shape.
    Decimal128(String),
    Binary {
        /// Base64 payload.
        payload: String,
        subtype: u8,
    },
    Regex {
        pattern: String,
        options: String,
    },
    Timestamp {
        time: u32,
        increment: u32,
    },
    Code {
        code: String,
        scope: Value,
    },
    DBRef {
        collection: String,
        id: Value,
        db: Option<String>,
    },
    MinKey,
    MaxKey,
}

/// The fixed constructor table. The decoder consults `from_name` to decide
/// whether `Identifier(args)` is a call literal at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constructor {
    ObjectId,
    IsoDate,
    NumberInt,
    NumberLong,
    NumberDouble,
    NumberDecimal,
    Binary,
    Timestamp,
    RegExp,
    MinKey,
    MaxKey,
    Code,
    DbRef,
}

impl Constructor {
    pub(crate) fn from_name(name: &str) -> Option<Constructor> {
        Some(match name {
            "ObjectId" => Constructor::ObjectId,
            "ISODate" => Constructor::IsoDate,
            "NumberInt" => Constructor::NumberInt,
            "NumberLong" => Constructor::NumberLong,
            "NumberDouble" => Constructor::NumberDouble,
            "NumberDecimal" => Constructor::NumberDecimal,
            "Binary" => Constructor::Binary,
            "Timestamp" => Constructor::Timestamp,
            "RegExp" => Constructor::RegExp,
            "MinKey" => Constructor::MinKey,
            "MaxKey" => Constructor::MaxKey,
            "Code" => Constructor::Code,
            "DBRef" => Constructor::DbRef,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Constructor::ObjectId => "ObjectId",
            Constructor::IsoDate => "ISODate",
            Constructor::NumberInt => "NumberInt",
            Constructor::NumberLong => "NumberLong",
            Constructor::NumberDouble => "NumberDouble",
            Constructor::NumberDecimal => "NumberDecimal",
            Constructor::Binary => "Binary",
            Constructor::Timestamp => "Timestamp",
            Constructor::RegExp => "RegExp",
            Constructor::MinKey => "MinKey",
            Constructor::MaxKey => "MaxKey",
            Constructor::Code => "Code",
            Constructor::DbRef => "DBRef",
        }
    }

    /// Inclusive argument-count bounds.
    fn arity(self) -> (usize, usize) {
        match self {
            Constructor::ObjectId | Constructor::IsoDate => (0, 1),
            Constructor::NumberInt
            | Constructor::NumberLong
            | Constructor::NumberDouble
            | Constructor::NumberDecimal => (1, 1),
            Constructor::Binary | Constructor::RegExp | Constructor::Code => (1, 2),
            Constructor::Timestamp => (0, 2),
            Constructor::MinKey | Constructor::MaxKey => (0, 0),
            Constructor::DbRef => (2, 3),
        }
    }

    fn arity_text(self) -> &'static str {
        match self.arity() {
            (0, 0) => "no",
            (0, 1) => "0 or 1",
            (0, 2) => "0 to 2",
            (1, 1) => "exactly 1",
            (1, 2) => "1 or 2",
            (2, 3) => "2 or 3",
            _ => "a different number of",
        }
    }
}

/// Evaluate a constructor call to its canonical extended value.
pub fn evaluate_call(name: &str, args: &[Value]) -> Result<CanonicalValue, ConstructorError> {
    let ctor =
        Constructor::from_name(name).ok_or_else(|| ConstructorError::Unknown(name.to_string()))?;
    let (min, max) = ctor.arity();
    if args.len() < min || args.len() > max {
        return Err(ConstructorError::WrongArity {
            name: ctor.name(),
            expected: ctor.arity_text(),
            got: args.len(),
        });
    }
    match ctor {
        Constructor::ObjectId => build_object_id(args),
        Constructor::IsoDate => build_iso_date(args),
        Constructor::NumberInt => {
            let text = number_text(ctor, &args[0])?;
            let n = text
                .trim()
                .parse::<i32>()
                .map_err(|_| ConstructorError::InvalidNumber(text.to_string()))?;
            Ok(CanonicalValue::Int32(n))
        }
        Constructor::NumberLong => {
            let text = number_text(ctor, &args[0])?;
            let n = text
                .trim()
                .parse::<i64>()
                .map_err(|_| ConstructorError::InvalidNumber(text.to_string()))?;
            Ok(CanonicalValue::Int64(n))
        }
        Constructor::NumberDouble => {
            let text = number_text(ctor, &args[0])?;
            let f = text
                .trim()
                .parse::<f64>()
                .map_err(|_| ConstructorError::InvalidNumber(text.to_string()))?;
            Ok(CanonicalValue::Float64(f))
        }
        Constructor::NumberDecimal => {
            let text = number_text(ctor, &args[0])?;
            Ok(CanonicalValue::Decimal128(text.to_string()))
        }
        Constructor::Binary => build_binary(args),
        Constructor::Timestamp => build_timestamp(args),
        Constructor::RegExp => {
            let pattern = string_arg(ctor, &args[0])?.to_string();
            let options = match args.get(1) {
                Some(arg) => string_arg(ctor, arg)?.to_string(),
                None => String::new(),
            };
            Ok(CanonicalValue::Regex { pattern, options })
        }
        Constructor::MinKey => Ok(CanonicalValue::MinKey),
        Constructor::MaxKey => Ok(CanonicalValue::MaxKey),
        Constructor::Code => build_code(args),
        Constructor::DbRef => build_dbref(args),
    }
}

/// Walk a tree and evaluate every constructor call, surfacing the first
/// failure. Lets the editing surface vet a document before execution without
/// materializing canonical values.
pub fn validate(value: &Value) -> Result<(), ConstructorError> {
    match value {
        Value::Call { name, args } => evaluate_call(name, args).map(|_| ()),
        Value::Array(items) => items.iter().try_for_each(validate),
        Value::Object(entries) => entries.iter().try_for_each(|(_, v)| validate(v)),
        _ => Ok(()),
    }
}

/// Render a tree as MongoDB extended JSON, evaluating every constructor
/// call along the way.
pub fn canonical_json(value: &Value) -> Result<serde_json::Value, ConstructorError> {
    use serde_json::{json, Map, Value as Json};
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(text) => number_to_json(text)?,
        Value::Str(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(
            items
                .iter()
                .map(canonical_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Object(entries) => {
            let mut map = Map::new();
            for (key, child) in entries {
                map.insert(key.clone(), canonical_json(child)?);
            }
            Json::Object(map)
        }
        Value::Call { name, args } => match evaluate_call(name, args)? {
            CanonicalValue::ObjectId(hex) => json!({ "$oid": hex }),
            CanonicalValue::Date(dt) => {
                json!({ "$date": dt.to_rfc3339_opts(SecondsFormat::Millis, true) })
            }
            CanonicalValue::Int32(n) => json!(n),
            CanonicalValue::Int64(n) => json!(n),
            CanonicalValue::Float64(f) => match serde_json::Number::from_f64(f) {
                Some(n) => Json::Number(n),
                None => Json::Null,
            },
            CanonicalValue::Decimal128(text) => json!({ "$numberDecimal": text }),
            CanonicalValue::Binary { payload, subtype } => {
                json!({ "$binary": { "base64": payload, "subType": format!("{subtype:02x}") } })
            }
            CanonicalValue::Regex { pattern, options } => {
                json!({ "$regularExpression": { "pattern": pattern, "options": options } })
            }
            CanonicalValue::Timestamp { time, increment } => {
                json!({ "$timestamp": { "t": time, "i": increment } })
            }
            CanonicalValue::Code { code, scope } => {
                json!({ "$code": code, "$scope": canonical_json(&scope)? })
            }
            CanonicalValue::DBRef { collection, id, db } => {
                let mut map = Map::new();
                map.insert("$ref".to_string(), Json::String(collection));
                map.insert("$id".to_string(), canonical_json(&id)?);
                if let Some(db) = db {
                    map.insert("$db".to_string(), Json::String(db));
                }
                Json::Object(map)
            }
            CanonicalValue::MinKey => json!({ "$minKey": 1 }),
            CanonicalValue::MaxKey => json!({ "$maxKey": 1 }),
        },
    })
}

fn number_to_json(text: &str) -> Result<serde_json::Value, ConstructorError> {
    if let Ok(n) = text.parse::<i64>() {
        return Ok(serde_json::Value::Number(n.into()));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .ok_or_else(|| ConstructorError::InvalidNumber(text.to_string()))
}

fn build_object_id(args: &[Value]) -> Result<CanonicalValue, ConstructorError> {
    match args.first() {
        None => Ok(CanonicalValue::ObjectId(synthesize_object_id())),
        Some(arg) => {
            let hex = string_arg(Constructor::ObjectId, arg)?;
            if hex.len() == 24 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                Ok(CanonicalValue::ObjectId(hex.to_string()))
            } else {
                Err(ConstructorError::InvalidArgument {
                    name: "ObjectId",
                    reason: format!("`{hex}` is not a 24-character hex string"),
                })
            }
        }
    }
}

/// Counter segment for synthesized ObjectIds, randomly seeded once per
/// process and incremented per synthesis.
static OBJECT_ID_COUNTER: Lazy<AtomicU32> =
    Lazy::new(|| AtomicU32::new(rand::random::<u32>() & 0x00ff_ffff));

/// Synthesize a fixed-width 24-hex-character ObjectId:
/// 8 hex chars of unix-epoch seconds, 10 random hex chars, and 6 hex chars
/// of the process-wide counter.
fn synthesize_object_id() -> String {
    let seconds = Utc::now().timestamp().max(0) as u32;
    let random = rand::random::<u64>() & 0x00ff_ffff_ffff;
    let counter = OBJECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;
    format!("{seconds:08x}{random:010x}{counter:06x}")
}

fn build_iso_date(args: &[Value]) -> Result<CanonicalValue, ConstructorError> {
    match args.first() {
        None => Ok(CanonicalValue::Date(Utc::now())),
        Some(arg) => {
            let text = string_arg(Constructor::IsoDate, arg)?;
            parse_iso_date(text).map(CanonicalValue::Date)
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`, and bare
/// `YYYY-MM-DD`; naive forms are taken as UTC.
fn parse_iso_date(text: &str) -> Result<DateTime<Utc>, ConstructorError> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(ConstructorError::InvalidDate(trimmed.to_string()))
}

fn build_binary(args: &[Value]) -> Result<CanonicalValue, ConstructorError> {
    let raw = string_arg(Constructor::Binary, &args[0])?;
    let payload = if is_base64_shaped(raw) {
        raw.to_string()
    } else {
        BASE64.encode(raw)
    };
    let subtype = match args.get(1) {
        Some(arg) => {
            let text = number_text(Constructor::Binary, arg)?;
            text.trim()
                .parse::<u8>()
                .map_err(|_| ConstructorError::InvalidNumber(text.to_string()))?
        }
        None => 0,
    };
    Ok(CanonicalValue::Binary { payload, subtype })
}

/// Already-encoded payloads are detected by shape (base64 alphabet, length a
/// multiple of 4) and carried verbatim; anything else gets encoded.
fn is_base64_shaped(s: &str) -> bool {
    !s.is_empty()
        && s.len() % 4 == 0
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

fn build_timestamp(args: &[Value]) -> Result<CanonicalValue, ConstructorError> {
    let time = match args.first() {
        Some(arg) => {
            let text = number_text(Constructor::Timestamp, arg)?;
            text.trim()
                .parse::<u32>()
                .map_err(|_| ConstructorError::InvalidNumber(text.to_string()))?
        }
        None => Utc::now().timestamp().max(0) as u32,
    };
    let increment = match args.get(1) {
        Some(arg) => {
            let text = number_text(Constructor::Timestamp, arg)?;
            text.trim()
                .parse::<u32>()
                .map_err(|_| ConstructorError::InvalidNumber(text.to_string()))?
        }
        None => 1,
    };
    Ok(CanonicalValue::Timestamp { time, increment })
}

fn build_code(args: &[Value]) -> Result<CanonicalValue, ConstructorError> {
    let code = string_arg(Constructor::Code, &args[0])?.to_string();
    let scope = match args.get(1) {
        Some(scope @ Value::Object(_)) => {
            validate(scope)?;
            scope.clone()
        }
        Some(other) => {
            return Err(ConstructorError::InvalidArgument {
                name: "Code",
                reason: format!("scope must be an object, got {}", kind(other)),
            })
        }
        None => Value::Object(Vec::new()),
    };
    Ok(CanonicalValue::Code { code, scope })
}

fn build_dbref(args: &[Value]) -> Result<CanonicalValue, ConstructorError> {
    let collection = string_arg(Constructor::DbRef, &args[0])?.to_string();
    // The id is carried structurally, but a nested call must still be valid.
    validate(&args[1])?;
    let id = args[1].clone();
    let db = match args.get(2) {
        Some(arg) => Some(string_arg(Constructor::DbRef, arg)?.to_string()),
        None => None,
    };
    Ok(CanonicalValue::DBRef { collection, id, db })
}

/// A required string argument; anything else is an invalid argument.
fn string_arg<'a>(ctor: Constructor, arg: &'a Value) -> Result<&'a str, ConstructorError> {
    match arg {
        Value::Str(s) => Ok(s),
        other => Err(ConstructorError::InvalidArgument {
            name: ctor.name(),
            reason: format!("expected a string, got {}", kind(other)),
        }),
    }
}

/// A numeric-or-string argument, borrowed as its literal text.
fn number_text<'a>(ctor: Constructor, arg: &'a Value) -> Result<&'a str, ConstructorError> {
    match arg {
        Value::Number(text) => Ok(text),
        Value::Str(s) => Ok(s),
        other => Err(ConstructorError::InvalidArgument {
            name: ctor.name(),
            reason: format!("expected a number or string, got {}", kind(other)),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::Str(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
        Value::Call { .. } => "a constructor call",
    }
}
