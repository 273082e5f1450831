//! Checks the shipped configuration file.

use qg_bot::AppConfig;
use qg_filter::SubmitMode;

fn shipped_config_path() -> String {
    format!("{}/../../config/default.toml", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn test_default_toml_parses_and_validates() {
    let config = AppConfig::from_file(&shipped_config_path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.venue.kind, "p2pb2b");
    assert!(config.venue.simulated);
    assert_eq!(config.venue.credentials.len(), 1);
    assert_eq!(config.filter.submit_mode, SubmitMode::MakerOnly);
    assert_eq!(config.filter.book_depth, 50);
    assert!(config.egress.routes.is_empty());
}

#[test]
fn test_explicit_missing_path_is_an_error() {
    assert!(AppConfig::load(Some("/nonexistent/qg.toml".to_string())).is_err());
}

#[test]
fn test_simulated_app_builds_without_network() {
    let mut config = AppConfig::from_file(&shipped_config_path()).unwrap();
    config.venue.credentials.clear();

    let app = qg_bot::Application::new(config).unwrap();
    assert_eq!(app.pair().to_string(), "XLM/BTC");
}
