//! Unit tests for result projection

use credmint::models::{AccountStatus, GenerationRequest};
use credmint::projector::{ResultProjector, DEFAULT_GENERATED_PASSWORD};
use credmint::protocol::RaceOutcome;
use serde_json::json;

fn request() -> GenerationRequest {
    GenerationRequest::new("Grace", "Hopper")
}

#[test]
fn test_every_outcome_projects_to_a_record() {
    // Totality: no outcome shape may panic or fail
    let outcomes = vec![
        RaceOutcome::Succeeded(json!({})),
        RaceOutcome::Succeeded(json!({"email": "g@h.i"})),
        RaceOutcome::Succeeded(json!({"unexpected": {"deep": [1, 2]}})),
        RaceOutcome::Exhausted {
            raw: String::new(),
        },
        RaceOutcome::Failed {
            reason: "anything".to_string(),
        },
    ];
    for outcome in &outcomes {
        let record = ResultProjector::project(outcome, &request());
        assert!(!record.email.is_empty(), "record must carry an email");
        let serialized = serde_json::to_string(&record).unwrap();
        assert!(serialized.contains("\"status\""));
    }
}

#[test]
fn test_success_statuses_pass_through() {
    for (status_str, status) in [
        ("generated", AccountStatus::Generated),
        ("verified", AccountStatus::Verified),
        ("completed", AccountStatus::Completed),
        ("failed", AccountStatus::Failed),
    ] {
        let outcome = RaceOutcome::Succeeded(json!({"status": status_str}));
        let record = ResultProjector::project(&outcome, &request());
        assert_eq!(record.status, status);
    }
}

#[test]
fn test_unknown_status_defaults_to_generated() {
    let outcome = RaceOutcome::Succeeded(json!({"status": "???"}));
    let record = ResultProjector::project(&outcome, &request());
    assert_eq!(record.status, AccountStatus::Generated);
}

#[test]
fn test_script_failure_object_maps_to_failed_record() {
    // The in-VM driver reports its own failures as JSON; they project to
    // failed records with the details retained
    let outcome = RaceOutcome::Succeeded(json!({
        "error": "account creator script not found or execution failed",
        "firstName": "Grace",
        "lastName": "Hopper",
        "status": "failed",
        "error_details": ["main.py: timeout"]
    }));
    let record = ResultProjector::project(&outcome, &request());

    assert_eq!(record.status, AccountStatus::Failed);
    assert!(record.error.as_deref().unwrap().contains("not found"));
    assert_eq!(record.extra["error_details"][0], "main.py: timeout");
}

#[test]
fn test_defaults_are_deterministic() {
    let outcome = RaceOutcome::Succeeded(json!({}));
    let a = ResultProjector::project(&outcome, &request());
    let b = ResultProjector::project(&outcome, &request());

    assert_eq!(a.email, "GraceHopper@gmail.com");
    assert_eq!(a.email, b.email);
    assert_eq!(a.password, DEFAULT_GENERATED_PASSWORD);
    assert_eq!(a.password, b.password);
}

#[test]
fn test_camel_and_snake_name_fields_both_accepted() {
    let camel = RaceOutcome::Succeeded(json!({"firstName": "Ada", "lastName": "L"}));
    let snake = RaceOutcome::Succeeded(json!({"first_name": "Ada", "last_name": "L"}));
    for outcome in [camel, snake] {
        let record = ResultProjector::project(&outcome, &request());
        assert_eq!(record.first_name.as_deref(), Some("Ada"));
        assert_eq!(record.last_name.as_deref(), Some("L"));
    }
}

#[test]
fn test_exhausted_and_failed_are_distinguishable() {
    let exhausted = ResultProjector::project(
        &RaceOutcome::Exhausted {
            raw: "$ noise".to_string(),
        },
        &request(),
    );
    let failed = ResultProjector::project(
        &RaceOutcome::Failed {
            reason: "dispatch died".to_string(),
        },
        &request(),
    );

    assert_eq!(exhausted.status, AccountStatus::Completed);
    assert!(exhausted.error.is_none());
    assert_eq!(failed.status, AccountStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("dispatch died"));
}
