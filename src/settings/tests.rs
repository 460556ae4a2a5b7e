//! Unit tests for token validation, masking, and the file store.

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::{
    InstallReason, JsonFileSettingsStore, MemorySettingsStore, SettingsError, SettingsStore,
    load_masked_token, mask_token, save_token, should_open_settings, validate_token,
};

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("temp dir should be created")
}

#[rstest]
#[case::classic("ghp_abc")]
#[case::fine_grained("github_pat_abc")]
#[case::legacy_forty_chars("0123456789012345678901234567890123456789")]
#[case::surrounding_whitespace("  ghp_abc  ")]
fn accepts_token_shapes(#[case] raw: &str) {
    let token = validate_token(raw).expect("token should be accepted");
    assert_eq!(token, raw.trim());
}

#[rstest]
#[case::blank("   ")]
#[case::empty("")]
fn rejects_blank_tokens(#[case] raw: &str) {
    assert!(matches!(validate_token(raw), Err(SettingsError::Empty)));
}

#[rstest]
#[case::short_unprefixed("abc123")]
#[case::thirty_nine_chars("012345678901234567890123456789012345678")]
fn rejects_unrecognised_tokens(#[case] raw: &str) {
    assert!(matches!(
        validate_token(raw),
        Err(SettingsError::InvalidFormat)
    ));
}

#[rstest]
#[case::long("ghp_1234567890abcd", "ghp_...abcd")]
#[case::nine_chars("123456789", "1234...6789")]
#[case::eight_chars("12345678", "12345678")]
#[case::short("abc", "abc")]
fn masks_tokens(#[case] token: &str, #[case] expected: &str) {
    assert_eq!(mask_token(token), expected);
}

#[rstest]
fn only_fresh_installs_open_settings() {
    assert!(should_open_settings(InstallReason::Install));
    assert!(!should_open_settings(InstallReason::Update));
}

#[rstest]
#[tokio::test]
async fn file_store_round_trips_token(temp_dir: TempDir) {
    let store = JsonFileSettingsStore::new(temp_dir.path().join("nested/settings.json"));
    assert!(!store.exists().await, "file should not exist yet");
    assert_eq!(store.load_token().await.expect("load should succeed"), None);

    let masked = save_token(&store, " ghp_abcdefghijkl ")
        .await
        .expect("save should succeed");

    assert_eq!(masked, "ghp_...ijkl");
    assert_eq!(
        store.load_token().await.expect("load should succeed"),
        Some("ghp_abcdefghijkl".to_owned())
    );
    let written = std::fs::read_to_string(store.path()).expect("settings file should exist");
    assert!(written.contains("\"githubToken\""), "key mismatch: {written}");
}

#[rstest]
#[tokio::test]
async fn file_store_preserves_unknown_keys(temp_dir: TempDir) {
    let path = temp_dir.path().join("settings.json");
    std::fs::write(&path, r#"{"theme": "dark"}"#).expect("seed settings");
    let store = JsonFileSettingsStore::new(&path);

    store
        .store_token("ghp_abcdefghijkl")
        .await
        .expect("store should succeed");

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read settings"))
            .expect("settings should stay JSON");
    assert_eq!(written.get("theme"), Some(&serde_json::json!("dark")));
}

#[rstest]
#[tokio::test]
async fn file_store_reports_corrupt_settings(temp_dir: TempDir) {
    let path = temp_dir.path().join("settings.json");
    std::fs::write(&path, "not json").expect("seed settings");
    let store = JsonFileSettingsStore::new(&path);

    let result = store.load_token().await;
    assert!(
        matches!(result, Err(SettingsError::Serialisation { .. })),
        "expected Serialisation error, got {result:?}"
    );
}

#[rstest]
#[tokio::test]
async fn invalid_tokens_are_not_persisted() {
    let store = MemorySettingsStore::default();

    let result = save_token(&store, "short").await;

    assert!(matches!(result, Err(SettingsError::InvalidFormat)));
    assert_eq!(store.load_token().await.expect("load should succeed"), None);
}

#[rstest]
#[tokio::test]
async fn masked_token_is_loaded_from_store() {
    let store = MemorySettingsStore::with_token("github_pat_0123456789");
    let masked = load_masked_token(&store)
        .await
        .expect("load should succeed");
    assert_eq!(masked.as_deref(), Some("gith...6789"));
}
