//! # shelldoc-core
//!
//! Parser, evaluator, serializer, and filter compiler for **relaxed
//! Mongo-shell document literals** — the text grammar with unquoted keys,
//! single- or double-quoted strings, and embedded constructor calls such as
//! `ObjectId("...")`, `ISODate("...")`, or `NumberInt(42)`.
//!
//! ## Quick start
//!
//! ```rust
//! use shelldoc_core::{parse_value, serialize, Value};
//!
//! let doc = parse_value(r#"{name: "Ada", scores: [95, 87]}"#).unwrap();
//! assert_eq!(doc.get("name"), Some(&Value::Str("Ada".to_string())));
//!
//! // The serializer is a semantic inverse of the parser.
//! let text = serialize(&doc);
//! assert_eq!(parse_value(&text).unwrap(), doc);
//! ```
//!
//! Compiling filters into a query/sort pair:
//!
//! ```rust
//! use shelldoc_core::{compile, serialize, FilterSpec};
//!
//! let filters = vec![FilterSpec {
//!     column: "age".to_string(),
//!     compare: "between".to_string(),
//!     value: "18".to_string(),
//!     value2: Some("30".to_string()),
//!     ..Default::default()
//! }];
//! let (query, _sort) = compile(&filters, None).unwrap();
//! assert!(serialize(&query).contains("$gte"));
//! ```
//!
//! ## Modules
//!
//! - [`decoder`] — structural splitter + recursive-descent parser, plus the
//!   never-failing [`safe_parse`] entry with strict-JSON fallback
//! - [`constructors`] — registry/evaluator for constructor-call literals,
//!   tree validation, and the extended-JSON adapter
//! - [`encoder`] — `Value` tree → shell-style text
//! - [`filter`] — declarative filter specs → query + sort documents
//! - [`error`] — the error taxonomy (structural / literal / constructor /
//!   depth / filter)
//! - [`types`] — the `Value` tree everything operates on

pub mod constructors;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod types;

pub use constructors::{canonical_json, evaluate_call, validate, CanonicalValue};
pub use decoder::{
    from_json, parse_document, parse_value, safe_parse, ParseOutcome, DEFAULT_MAX_DEPTH,
};
pub use encoder::serialize;
pub use error::{
    ConstructorError, FilterError, LiteralError, ParseError, StructuralError,
};
pub use filter::{compile, Direction, FilterSpec, OrderSpec};
pub use types::Value;
