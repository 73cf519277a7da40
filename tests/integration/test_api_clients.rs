//! Integration Tests for the HTTP API Backends
//!
//! Runs the mailbox and lab flows against a canned local responder and
//! checks the records they assemble.

use credmint::api::{LabClient, MailboxClient, MailboxRequest, RecaptchaTokens};
use credmint::config::{LabConfig, MailboxConfig};
use credmint::models::AccountStatus;

#[path = "../test_utils/mod.rs"]
mod test_utils;
use test_utils::spawn_canned_api;

fn mailbox_config(base_url: String) -> MailboxConfig {
    MailboxConfig {
        base_url,
        api_key: "test-key".to_string(),
        inbox_poll_secs: 0,
        inbox_attempts: 2,
        inbox_limit: 5,
    }
}

#[tokio::test]
async fn test_mailbox_flow_with_verification() {
    let base_url = spawn_canned_api(vec![
        (
            "/generate-email".to_string(),
            200,
            r#"{"email": "temp123@gmail.com"}"#.to_string(),
        ),
        (
            "/inbox".to_string(),
            200,
            r#"{"data": [{"subject": "Password Reset", "body": "your password was changed"}]}"#
                .to_string(),
        ),
    ])
    .await;

    let client = MailboxClient::new(mailbox_config(base_url)).unwrap();
    let record = client
        .generate_account(&MailboxRequest {
            options: vec![1, 2],
            password: "NewPw1!".to_string(),
            password_change_url: None,
        })
        .await;

    assert_eq!(record.email, "temp123@gmail.com");
    assert_eq!(record.password, "NewPw1!");
    assert_eq!(record.status, AccountStatus::Verified);
    assert_eq!(record.extra["verificationFound"], true);
    assert!(record.is_usable());
}

#[tokio::test]
async fn test_mailbox_flow_without_verification() {
    let base_url = spawn_canned_api(vec![
        (
            "/generate-email".to_string(),
            200,
            r#"{"data": {"email": "nested@gmail.com"}}"#.to_string(),
        ),
        ("/inbox".to_string(), 200, r#"{"data": []}"#.to_string()),
    ])
    .await;

    let client = MailboxClient::new(mailbox_config(base_url)).unwrap();
    let record = client
        .generate_account(&MailboxRequest {
            options: vec![3],
            password: "NewPw1!".to_string(),
            password_change_url: None,
        })
        .await;

    // Address came from the nested response shape; no confirmation seen
    assert_eq!(record.email, "nested@gmail.com");
    assert_eq!(record.status, AccountStatus::Generated);
    assert_eq!(record.extra["verificationFound"], false);
}

#[tokio::test]
async fn test_mailbox_api_failure_becomes_failed_record() {
    let base_url = spawn_canned_api(vec![(
        "/generate-email".to_string(),
        500,
        r#"{"message": "upstream exploded"}"#.to_string(),
    )])
    .await;

    let client = MailboxClient::new(mailbox_config(base_url)).unwrap();
    let record = client
        .generate_account(&MailboxRequest {
            options: vec![1],
            password: "pw".to_string(),
            password_change_url: None,
        })
        .await;

    assert_eq!(record.status, AccountStatus::Failed);
    assert!(record.error.as_deref().unwrap().contains("500"));
}

#[tokio::test]
async fn test_lab_flow_assembles_record() {
    let base_url = spawn_canned_api(vec![(
        "/focuses/run/".to_string(),
        200,
        r#"{
            "labDetails": [
                {"type": "credential", "label": "GCP Console",
                 "username": "student-01@qwiklabs.net", "password": "labpw"}
            ],
            "project_0": {"project_id": "warm-forest-123"},
            "labInstanceId": "inst-42"
        }"#
        .to_string(),
    )])
    .await;

    let client = LabClient::new(LabConfig {
        base_url,
        ..Default::default()
    })
    .unwrap();
    let record = client.generate_account(&RecaptchaTokens::default()).await;

    assert_eq!(record.email, "student-01@qwiklabs.net");
    assert_eq!(record.password, "labpw");
    assert_eq!(record.status, AccountStatus::Generated);
    assert_eq!(record.extra["projectId"], "warm-forest-123");
    assert_eq!(record.extra["labInstanceId"], "inst-42");
    assert!(record.extra["allCredentials"].is_array());
}

#[tokio::test]
async fn test_lab_captcha_wall_is_reported() {
    let base_url = spawn_canned_api(vec![(
        "/focuses/run/".to_string(),
        403,
        r#"{"error": "recaptcha verification required"}"#.to_string(),
    )])
    .await;

    let client = LabClient::new(LabConfig {
        base_url,
        ..Default::default()
    })
    .unwrap();
    let record = client.generate_account(&RecaptchaTokens::default()).await;

    assert_eq!(record.status, AccountStatus::Failed);
    assert!(record.note.as_deref().unwrap().contains("captcha"));
}

#[tokio::test]
async fn test_lab_empty_response_keeps_evidence() {
    let base_url = spawn_canned_api(vec![(
        "/focuses/run/".to_string(),
        200,
        r#"{"labDetails": [{"type": "video", "url": "https://example.test"}]}"#.to_string(),
    )])
    .await;

    let client = LabClient::new(LabConfig {
        base_url,
        ..Default::default()
    })
    .unwrap();
    let record = client.generate_account(&RecaptchaTokens::default()).await;

    assert_eq!(record.status, AccountStatus::Failed);
    assert!(record.extra["response"]
        .as_str()
        .unwrap()
        .contains("labDetails"));
}
