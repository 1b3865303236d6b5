use shelldoc_core::{
    parse_document, parse_value, safe_parse, ConstructorError, LiteralError, ParseError,
    StructuralError, Value, DEFAULT_MAX_DEPTH,
};

/// Helper: parse with the default depth, panicking with the error message on
/// failure so test output shows what went wrong.
fn parse_ok(text: &str) -> Value {
    parse_value(text).unwrap_or_else(|e| panic!("parse failed for {text:?}: {e}"))
}

// ============================================================================
// Scalar literals
// ============================================================================

#[test]
fn parse_null() {
    assert_eq!(parse_ok("null"), Value::Null);
}

#[test]
fn parse_undefined_as_null() {
    assert_eq!(parse_ok("undefined"), Value::Null);
}

#[test]
fn parse_bools() {
    assert_eq!(parse_ok("true"), Value::Bool(true));
    assert_eq!(parse_ok("false"), Value::Bool(false));
}

#[test]
fn parse_integer() {
    assert_eq!(parse_ok("42"), Value::Number("42".to_string()));
}

#[test]
fn parse_negative_integer() {
    assert_eq!(parse_ok("-7"), Value::Number("-7".to_string()));
}

#[test]
fn parse_float() {
    assert_eq!(parse_ok("3.14"), Value::Number("3.14".to_string()));
}

#[test]
fn parse_exponent_forms() {
    assert_eq!(parse_ok("1e9"), Value::Number("1e9".to_string()));
    assert_eq!(parse_ok("-2.5E-3"), Value::Number("-2.5E-3".to_string()));
}

#[test]
fn parse_double_quoted_string() {
    assert_eq!(parse_ok(r#""hello world""#), Value::Str("hello world".to_string()));
}

#[test]
fn parse_single_quoted_string() {
    assert_eq!(parse_ok("'hello'"), Value::Str("hello".to_string()));
}

#[test]
fn parse_string_escapes() {
    assert_eq!(
        parse_ok(r#""line1\nline2\ttab""#),
        Value::Str("line1\nline2\ttab".to_string())
    );
    assert_eq!(parse_ok(r#""say \"hi\"""#), Value::Str("say \"hi\"".to_string()));
    assert_eq!(parse_ok(r#"'it\'s'"#), Value::Str("it's".to_string()));
    assert_eq!(
        parse_ok(r#""path\\to\\file""#),
        Value::Str("path\\to\\file".to_string())
    );
}

#[test]
fn parse_unicode_string() {
    assert_eq!(parse_ok("\"caf\u{00e9}\""), Value::Str("caf\u{00e9}".to_string()));
}

// ============================================================================
// Objects and arrays
// ============================================================================

#[test]
fn parse_flat_object() {
    let value = parse_ok(r#"{name: "Ada", age: 36, active: true}"#);
    assert_eq!(
        value,
        Value::Object(vec![
            ("name".to_string(), Value::Str("Ada".to_string())),
            ("age".to_string(), Value::Number("36".to_string())),
            ("active".to_string(), Value::Bool(true)),
        ])
    );
}

#[test]
fn parse_empty_object_and_array() {
    assert_eq!(parse_ok("{}"), Value::Object(vec![]));
    assert_eq!(parse_ok("[]"), Value::Array(vec![]));
}

#[test]
fn parse_nested_structures() {
    let value = parse_ok(r#"{a: {b: [1, {c: null}]}}"#);
    let inner = value.get("a").and_then(|a| a.get("b"));
    match inner {
        Some(Value::Array(items)) => {
            assert_eq!(items[0], Value::Number("1".to_string()));
            assert_eq!(items[1].get("c"), Some(&Value::Null));
        }
        other => panic!("expected array under a.b, got {other:?}"),
    }
}

#[test]
fn unquoted_and_quoted_keys_are_equivalent() {
    assert_eq!(parse_ok("{a: 1}"), parse_ok(r#"{"a": 1}"#));
    assert_eq!(parse_ok("{a: 1}"), parse_ok("{'a': 1}"));
}

#[test]
fn quoted_key_escapes_are_decoded() {
    let value = parse_ok(r#"{"a\nb": 1}"#);
    assert_eq!(value.get("a\nb"), Some(&Value::Number("1".to_string())));
}

#[test]
fn dollar_and_dotted_keys_are_valid_bare_keys() {
    let value = parse_ok(r#"{$and: [], a.b: 1}"#);
    assert!(value.get("$and").is_some());
    assert!(value.get("a.b").is_some());
}

#[test]
fn whitespace_is_insignificant() {
    let compact = parse_ok(r#"{a:1,b:[1,2],c:"x"}"#);
    let spaced = parse_ok("{\n  a : 1 ,\n  b : [ 1 , 2 ] ,\n  c : \"x\"\n}");
    assert_eq!(compact, spaced);
}

#[test]
fn trailing_commas_are_tolerated() {
    assert_eq!(parse_ok("[1, 2,]"), parse_ok("[1, 2]"));
    assert_eq!(parse_ok("{a: 1,}"), parse_ok("{a: 1}"));
}

#[test]
fn duplicate_keys_last_assignment_wins_in_place() {
    let value = parse_ok("{a: 1, b: 2, a: 3}");
    assert_eq!(
        value,
        Value::Object(vec![
            ("a".to_string(), Value::Number("3".to_string())),
            ("b".to_string(), Value::Number("2".to_string())),
        ])
    );
}

#[test]
fn strings_containing_structural_characters() {
    let value = parse_ok(r#"{a: "b,c{}[]()", b: "x:y"}"#);
    assert_eq!(value.get("a"), Some(&Value::Str("b,c{}[]()".to_string())));
    assert_eq!(value.get("b"), Some(&Value::Str("x:y".to_string())));
}

// ============================================================================
// Constructor-call literals
// ============================================================================

#[test]
fn parse_object_id_call() {
    let value = parse_ok(r#"ObjectId("507f1f77bcf86cd799439011")"#);
    assert_eq!(
        value,
        Value::Call {
            name: "ObjectId".to_string(),
            args: vec![Value::Str("507f1f77bcf86cd799439011".to_string())],
        }
    );
}

#[test]
fn parse_zero_argument_call() {
    assert_eq!(
        parse_ok("MinKey()"),
        Value::Call {
            name: "MinKey".to_string(),
            args: vec![],
        }
    );
}

#[test]
fn call_arguments_may_contain_commas() {
    // The splitter must not cut the object entry at the comma inside parens.
    let value = parse_ok("{ts: Timestamp(5, 1), x: 2}");
    assert_eq!(
        value.get("ts"),
        Some(&Value::Call {
            name: "Timestamp".to_string(),
            args: vec![
                Value::Number("5".to_string()),
                Value::Number("1".to_string())
            ],
        })
    );
    assert_eq!(value.get("x"), Some(&Value::Number("2".to_string())));
}

#[test]
fn calls_nest() {
    let value = parse_ok(r#"DBRef("users", ObjectId("507f1f77bcf86cd799439011"))"#);
    match value {
        Value::Call { name, args } => {
            assert_eq!(name, "DBRef");
            assert_eq!(args[0], Value::Str("users".to_string()));
            assert!(matches!(&args[1], Value::Call { name, .. } if name == "ObjectId"));
        }
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn whitespace_inside_call_is_tolerated() {
    assert_eq!(
        parse_ok(r#"ObjectId ( "507f1f77bcf86cd799439011" )"#),
        parse_ok(r#"ObjectId("507f1f77bcf86cd799439011")"#)
    );
}

#[test]
fn unknown_constructor_name_is_reported_by_name() {
    match parse_value("Frobnicate(1)") {
        Err(ParseError::Constructor(ConstructorError::Unknown(name))) => {
            assert_eq!(name, "Frobnicate");
        }
        other => panic!("expected unknown-constructor error, got {other:?}"),
    }
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn bare_word_is_unrecognized() {
    assert!(matches!(
        parse_value("hello"),
        Err(ParseError::Literal(LiteralError::Unrecognized(_)))
    ));
}

#[test]
fn empty_input_is_unrecognized() {
    assert!(matches!(
        parse_value(""),
        Err(ParseError::Literal(LiteralError::Unrecognized(_)))
    ));
}

#[test]
fn malformed_numbers_are_rejected() {
    for bad in ["1.2.3", "12ab", "-", "1e", "--1", "1.e5"] {
        assert!(
            matches!(
                parse_value(bad),
                Err(ParseError::Literal(LiteralError::InvalidNumber(_)))
            ),
            "expected invalid-number error for {bad:?}"
        );
    }
}

#[test]
fn unbalanced_delimiters_are_structural_errors() {
    for bad in ["{a: [1, 2}", "[1, 2", "{a: 1", "{a: (1}", "[)]"] {
        assert!(
            matches!(
                parse_value(bad),
                Err(ParseError::Structural(StructuralError::Unbalanced(_)))
            ),
            "expected unbalanced error for {bad:?}"
        );
    }
}

#[test]
fn unterminated_string_is_a_structural_error() {
    assert!(matches!(
        parse_value(r#"{a: "oops}"#),
        Err(ParseError::Structural(StructuralError::Unbalanced(_)))
    ));
}

#[test]
fn entry_without_colon_is_malformed() {
    for bad in ["{a}", "{: 1}", "{\"a\" 1}"] {
        assert!(
            matches!(
                parse_value(bad),
                Err(ParseError::Structural(StructuralError::MalformedEntry(_)))
            ),
            "expected malformed-entry error for {bad:?}"
        );
    }
}

#[test]
fn depth_limit_is_enforced() {
    // `{a: {b: {c: 1}}}` needs depth 4: the scalar sits three levels down.
    let text = "{a: {b: {c: 1}}}";
    assert!(parse_document(text, 4).is_ok());
    assert_eq!(parse_document(text, 3), Err(ParseError::DepthLimit(3)));
}

#[test]
fn default_depth_guards_adversarial_nesting() {
    let deep = format!("{}{}", "[".repeat(100), "]".repeat(100));
    assert_eq!(
        parse_value(&deep),
        Err(ParseError::DepthLimit(DEFAULT_MAX_DEPTH))
    );
}

#[test]
fn parse_document_rejects_scalar_top_level() {
    assert!(matches!(
        parse_document("42", DEFAULT_MAX_DEPTH),
        Err(ParseError::Literal(LiteralError::Unrecognized(_)))
    ));
}

#[test]
fn parse_document_accepts_array_top_level() {
    assert!(parse_document("[1, 2]", DEFAULT_MAX_DEPTH).is_ok());
}

// ============================================================================
// safe_parse
// ============================================================================

#[test]
fn safe_parse_success_on_relaxed_grammar() {
    let outcome = safe_parse(r#"{name: "Ada"}"#);
    assert!(outcome.success);
    assert!(outcome.error.is_none());
    assert_eq!(
        outcome.value.unwrap().get("name"),
        Some(&Value::Str("Ada".to_string()))
    );
}

#[test]
fn safe_parse_falls_back_to_strict_json() {
    // Top-level scalars are rejected by the relaxed document grammar but are
    // valid JSON documents.
    let outcome = safe_parse("42");
    assert!(outcome.success);
    assert_eq!(outcome.value, Some(Value::Number("42".to_string())));

    let outcome = safe_parse(r#""hello""#);
    assert!(outcome.success);
    assert_eq!(outcome.value, Some(Value::Str("hello".to_string())));
}

#[test]
fn safe_parse_failure_reports_line() {
    let outcome = safe_parse("{\n  name: \"Ada\",\n  age: @@\n}");
    assert!(!outcome.success);
    assert!(outcome.value.is_none());
    assert!(outcome.error.is_some());
    assert_eq!(outcome.error_line, Some(3));
}

#[test]
fn safe_parse_failure_on_first_line() {
    let outcome = safe_parse("{broken");
    assert!(!outcome.success);
    assert_eq!(outcome.error_line, Some(1));
}

// ============================================================================
// from_json
// ============================================================================

#[test]
fn from_json_preserves_order_and_types() {
    let json: serde_json::Value =
        serde_json::from_str(r#"{"z": 1, "a": [true, null, "x"], "n": 2.5}"#).unwrap();
    let value = shelldoc_core::from_json(json);
    assert_eq!(
        value,
        Value::Object(vec![
            ("z".to_string(), Value::Number("1".to_string())),
            (
                "a".to_string(),
                Value::Array(vec![
                    Value::Bool(true),
                    Value::Null,
                    Value::Str("x".to_string())
                ])
            ),
            ("n".to_string(), Value::Number("2.5".to_string())),
        ])
    );
}
