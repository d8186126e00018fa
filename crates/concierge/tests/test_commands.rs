//! Command behaviour against an isolated data directory

mod common;

use common::TestEnv;
use predicates::prelude::*;

use concierge_session::{ConversationStore, Role};

#[test]
fn test_init_writes_config_and_dirs() {
    let env = TestEnv::default();

    env.command()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initializing Concierge"));

    assert!(env.config_file().exists());
    assert!(env.conversations_dir().is_dir());

    let content = std::fs::read_to_string(env.config_file()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["model"]["model"], "gpt-4o-mini");
    assert_eq!(json["assistant"]["prompt_variant"], "default");
}

#[test]
fn test_init_keeps_existing_config() {
    let env = TestEnv::default();
    env.write_config(r#"{"model": {"model": "gpt-4o"}}"#).unwrap();

    env.command().arg("init").assert().success();

    let content = std::fs::read_to_string(env.config_file()).unwrap();
    assert!(content.contains("gpt-4o"));
    assert!(!content.contains("gpt-4o-mini"));
}

#[test]
fn test_status_without_config() {
    let env = TestEnv::default();

    env.command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("[Missing]"))
        .stdout(predicate::str::contains("API Key:       [Missing]"))
        .stdout(predicate::str::contains("[Not configured]"));
}

#[test]
fn test_status_reports_configured_collaborators() {
    let env = TestEnv::default();
    env.write_config(
        r#"{
  "model": {"api_key": "sk-test"},
  "retrieval": {"api_key": "pc-test", "index_name": "spa-kb"},
  "assistant": {"prompt_variant": "detailed"}
}"#,
    )
    .unwrap();

    env.command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("API Key:       [Set]"))
        .stdout(predicate::str::contains("[Configured] index spa-kb"))
        .stdout(predicate::str::contains("Prompt:        detailed"));
}

#[test]
fn test_status_picks_up_env_key() {
    let env = TestEnv::default();

    env.command()
        .env("OPENAI_API_KEY", "sk-from-env")
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("API Key:       [Set]"));
}

#[test]
fn test_prompt_default_and_variants() {
    let env = TestEnv::default();

    env.command()
        .arg("prompt")
        .assert()
        .success()
        .stdout(predicate::str::contains("System prompt: default"))
        .stdout(predicate::str::contains("helpful booking assistant"))
        .stdout(predicate::str::contains("Variants: default, minimal, detailed"));

    env.command()
        .args(["prompt", "detailed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("booking concierge"));
}

#[test]
fn test_prompt_unknown_variant_fails() {
    let env = TestEnv::default();

    env.command()
        .args(["prompt", "pirate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown prompt variant"));
}

#[test]
fn test_tools_lists_catalog() {
    let env = TestEnv::default();

    env.command()
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("create_booking - Create a new booking"))
        .stdout(predicate::str::contains("update_booking - Update an existing booking"))
        .stdout(predicate::str::contains("get_booking - Retrieve booking information"))
        .stdout(predicate::str::contains("required: booking_id"));
}

#[test]
fn test_chat_without_api_key_fails() {
    let env = TestEnv::default();

    env.command()
        .args(["chat", "-m", "Book a massage"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no model API key configured"));
}

#[test]
fn test_chat_blank_message_creates_nothing() {
    let env = TestEnv::default();
    env.write_config(r#"{"model": {"api_key": "sk-test"}}"#).unwrap();

    env.command()
        .args(["chat", "-m", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("message is empty"));

    let stored = std::fs::read_dir(env.conversations_dir())
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(stored, 0);

    env.command()
        .args(["conversations", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No conversations"));
}

#[test]
fn test_conversations_list_empty() {
    let env = TestEnv::default();

    env.command()
        .args(["conversations", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No conversations"));
}

#[tokio::test]
async fn test_conversations_list_and_show() {
    let env = TestEnv::default();
    let mut store = ConversationStore::new(env.conversations_dir());
    let spa = store
        .create(Some("Spa day".into()), Some("kiosk-1".into()))
        .await
        .unwrap();
    store
        .append_message(spa.id, Role::User, "Do you have saunas?")
        .await
        .unwrap();
    store
        .append_message(spa.id, Role::Assistant, "Yes, two of them.")
        .await
        .unwrap();
    store.create(Some("Gym".into()), None).await.unwrap();

    env.command()
        .args(["conversations", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Spa day (2 messages"))
        .stdout(predicate::str::contains("Gym (0 messages"));

    env.command()
        .args(["conversations", "list", "--session", "kiosk-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Spa day"))
        .stdout(predicate::str::contains("Gym").not());

    env.command()
        .args(["conversations", "show", &spa.id.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("◆ Spa day"))
        .stdout(predicate::str::contains("Session: kiosk-1"))
        .stdout(predicate::str::contains("[you] Do you have saunas?"))
        .stdout(predicate::str::contains("[concierge] Yes, two of them."));
}

#[tokio::test]
async fn test_conversations_delete() {
    let env = TestEnv::default();
    let mut store = ConversationStore::new(env.conversations_dir());
    let conversation = store.create(None, None).await.unwrap();
    let id = conversation.id.to_string();

    env.command()
        .args(["conversations", "delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted"));

    env.command()
        .args(["conversations", "delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn test_conversations_show_invalid_id() {
    let env = TestEnv::default();

    env.command()
        .args(["conversations", "show", "not-a-uuid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid conversation id"));
}

#[test]
fn test_conversations_show_unknown_id() {
    let env = TestEnv::default();

    env.command()
        .args([
            "conversations",
            "show",
            "1f0e2d3c-4b5a-4697-8a8b-9c0d1e2f3a4b",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
