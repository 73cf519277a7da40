//! Unit tests for JSON extraction

use credmint::protocol::{extract_json, MAX_NESTING_DEPTH};
use serde_json::json;

#[test]
fn test_extracts_from_realistic_terminal_capture() {
    // A capture shaped like the real generation run: echoes, banners,
    // delimiters, then the result, then a prompt
    let capture = "python3 /tmp/generate_account.py\n\
                   Starting account generation for Ada Lovelace\n\
                   Looking for Auto-Gmail-Creator scripts...\n\
                   Found script: main.py\n\
                   \n\
                   ==================================================\n\
                   ACCOUNT GENERATION RESULT:\n\
                   ==================================================\n\
                   {\n\
                     \"email\": \"ada.lovelace42@gmail.com\",\n\
                     \"password\": \"s3cret!\",\n\
                     \"firstName\": \"Ada\",\n\
                     \"lastName\": \"Lovelace\",\n\
                     \"status\": \"generated\"\n\
                   }\n\
                   ==================================================\n\
                   user@debian:~$ ";
    let value = extract_json(capture).expect("result should be carved out");
    assert_eq!(value["email"], "ada.lovelace42@gmail.com");
    assert_eq!(value["status"], "generated");
}

#[test]
fn test_ansi_escape_noise_tolerated() {
    let capture = "\x1b[32m✓\x1b[0m done\n{\"ok\":true}\n\x1b[1m$\x1b[0m ";
    assert_eq!(extract_json(capture), Some(json!({"ok": true})));
}

#[test]
fn test_crlf_line_endings_tolerated() {
    let capture = "result follows\r\n{\"a\": [1, 2, 3]}\r\n$ ";
    assert_eq!(extract_json(capture), Some(json!({"a": [1, 2, 3]})));
}

#[test]
fn test_arrays_and_nested_payloads() {
    let capture = r#"{"error_details": ["main.py timed out", "retry failed"], "meta": {"attempt": 2}}"#;
    let value = extract_json(capture).unwrap();
    assert_eq!(value["error_details"][1], "retry failed");
    assert_eq!(value["meta"]["attempt"], 2);
}

#[test]
fn test_partial_object_waits_for_more_output() {
    // Mid-print: the object is not yet closed
    let partial = "RESULT:\n{\n  \"email\": \"x@y.z\",\n  \"password\": \"p";
    assert_eq!(extract_json(partial), None);

    // Once the rest arrives, the same scan succeeds
    let complete = format!("{}w\"\n}}\n$ ", partial);
    assert!(extract_json(&complete).is_some());
}

#[test]
fn test_empty_and_whitespace_only() {
    assert_eq!(extract_json(""), None);
    assert_eq!(extract_json("   \n\t  "), None);
}

#[test]
fn test_empty_object_is_a_result() {
    assert_eq!(extract_json("noise {} noise"), Some(json!({})));
}

#[test]
fn test_first_balanced_span_wins_even_if_unparsable() {
    // Deliberate simplification: the first balanced span is the only
    // attempt, so earlier garbage masks a later valid object
    let capture = "{broken} {\"valid\": 1}";
    assert_eq!(extract_json(capture), None);
}

#[test]
fn test_depth_cap_rejects_pathological_nesting() {
    let mut pathological = String::new();
    for _ in 0..=MAX_NESTING_DEPTH {
        pathological.push_str("{\"x\":");
    }
    pathological.push_str("null");
    for _ in 0..=MAX_NESTING_DEPTH {
        pathological.push('}');
    }
    assert_eq!(extract_json(&pathological), None);
}

#[test]
fn test_nesting_just_under_the_cap_parses() {
    let mut nested = String::new();
    for _ in 0..(MAX_NESTING_DEPTH - 1) {
        nested.push_str("{\"x\":");
    }
    nested.push_str("null");
    for _ in 0..(MAX_NESTING_DEPTH - 1) {
        nested.push('}');
    }
    assert!(extract_json(&nested).is_some());
}
