//! Integration tests for loading the office table from disk

use std::path::Path;

use office_traffic::core::config::GameConfig;
use office_traffic::core::error::TrafficError;
use office_traffic::simulation::SessionController;

fn data_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

#[test]
fn test_shipped_config_matches_defaults() {
    let loaded = GameConfig::load(&data_path("office.toml")).unwrap();
    assert_eq!(loaded, GameConfig::default());
}

#[test]
fn test_missing_file_is_io_error() {
    let result = GameConfig::load(&data_path("does-not-exist.toml"));
    assert!(matches!(result, Err(TrafficError::IoError(_))));
}

#[test]
fn test_overlapping_phases_are_accepted() {
    let config = GameConfig::from_toml_str(
        r#"
        [[phases]]
        index = 1
        label = "Early"
        start_secs = 0
        end_secs = 50
        arrival_interval_ms = 6000

        [[phases]]
        index = 2
        label = "Overlap"
        start_secs = 40
        end_secs = 120
        arrival_interval_ms = 2000
        "#,
    )
    .unwrap();

    let mut controller = SessionController::with_seed(config, 3).unwrap();
    let generation = controller.start();
    for _ in 0..45 {
        controller.on_clock_tick(generation);
    }
    assert_eq!(controller.state().clock.current_phase().index, 2);
}

#[test]
fn test_invalid_table_is_rejected_on_load() {
    let result = GameConfig::from_toml_str(
        r#"
        total_entities = 20
        "#,
    );
    match result {
        Err(TrafficError::InvalidConfig(msg)) => assert!(msg.contains("roster")),
        other => panic!("expected invalid config, got {:?}", other),
    }
}
