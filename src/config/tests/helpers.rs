//! Shared test helpers for configuration tests.

use std::ffi::OsString;

use ortho_config::{MergeComposer, OrthoConfig};
use serde_json::Value;

use crate::ReviewLensConfig;

/// Applies a configuration layer to the composer based on the layer type.
pub fn apply_layer(composer: &mut MergeComposer, layer_type: &str, value: Value) {
    match layer_type {
        "defaults" => composer.push_defaults(value),
        "file" => composer.push_file(value, None),
        "environment" => composer.push_environment(value),
        "cli" => composer.push_cli(value),
        _ => panic!("unknown layer type: {layer_type}"),
    }
}

/// Helper to compose a [`ReviewLensConfig`] from a sequence of `(layer_type, value)` pairs.
pub fn build_config_from_layers(layers: &[(&str, Value)]) -> ReviewLensConfig {
    let mut composer = MergeComposer::new();

    for (layer_type, value) in layers {
        apply_layer(&mut composer, layer_type, value.clone());
    }

    ReviewLensConfig::merge_from_layers(composer.layers()).expect("merge should succeed")
}

/// Loads configuration from `cli_args` with an isolated home directory and
/// the given `REVIEWLENS_*` environment overrides.
pub fn load_isolated(env: &[(&str, Option<&str>)], cli_args: &[&str]) -> ReviewLensConfig {
    let temp_dir = tempfile::TempDir::new().expect("temp dir should be created");
    let home = temp_dir.path().to_string_lossy().to_string();

    let cleared = [
        "REVIEWLENS_PAGE_URL",
        "REVIEWLENS_PR_NUMBERS",
        "REVIEWLENS_API_BASE",
        "REVIEWLENS_CACHE_TTL_SECONDS",
        "REVIEWLENS_ROW_SELECTOR",
        "REVIEWLENS_POLL_INTERVAL_MS",
        "REVIEWLENS_SETTLE_DELAY_MS",
    ];
    let mut vars: Vec<(&str, Option<&str>)> = vec![
        ("HOME", Some(home.as_str())),
        ("XDG_CONFIG_HOME", Some(home.as_str())),
    ];
    vars.extend(
        cleared
            .into_iter()
            .filter(|name| env.iter().all(|(key, _)| key != name))
            .map(|name| (name, None)),
    );
    vars.extend_from_slice(env);
    let _guard = env_lock::lock_env(vars);

    let mut args: Vec<OsString> = vec![OsString::from("reviewlens")];
    args.extend(cli_args.iter().map(OsString::from));

    ReviewLensConfig::load_from_iter(args).expect("config should load")
}
