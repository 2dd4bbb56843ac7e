//! Environment layering for settings.
//!
//! Kept in its own test binary: environment variables are process-wide.

use ragline::Settings;
use ragline::documents::OverlapPolicy;
use ragline::store::DistanceMetric;
use std::env;
use tempfile::TempDir;

#[test]
fn test_env_overrides_file_and_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.toml");
    std::fs::write(
        &config_path,
        r#"
collection = "from_file"

[retrieval]
top_k = 7
n_best = 4
"#,
    )
    .unwrap();

    unsafe {
        // Double underscore separates nested levels
        env::set_var("RAGLINE_RETRIEVAL__TOP_K", "12");
        env::set_var("RAGLINE_RETRIEVAL__SIMILARITY_THRESHOLD", "0.45");
        env::set_var("RAGLINE_CHUNKING__OVERLAP_POLICY", "carry");
        env::set_var("RAGLINE_STORE__METRIC", "squared_l2");
    }

    let settings = Settings::load_from(&config_path);

    unsafe {
        env::remove_var("RAGLINE_RETRIEVAL__TOP_K");
        env::remove_var("RAGLINE_RETRIEVAL__SIMILARITY_THRESHOLD");
        env::remove_var("RAGLINE_CHUNKING__OVERLAP_POLICY");
        env::remove_var("RAGLINE_STORE__METRIC");
    }

    let settings = settings.unwrap();

    // Env beats file
    assert_eq!(settings.retrieval.top_k, 12);
    // File beats defaults
    assert_eq!(settings.collection, "from_file");
    assert_eq!(settings.retrieval.n_best, 4);
    // Env beats defaults
    assert!((settings.retrieval.similarity_threshold - 0.45).abs() < 1e-6);
    assert_eq!(settings.chunking.overlap_policy, OverlapPolicy::Carry);
    assert_eq!(settings.store.metric, DistanceMetric::SquaredL2);
    // Untouched
    assert_eq!(settings.chunking.chunk_size, 1000);
    assert!(settings.validate().is_ok());
}

#[test]
fn test_missing_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.collection, "rag_collection");
    assert_eq!(settings.llm.model, "gemini-1.5-flash");
}
