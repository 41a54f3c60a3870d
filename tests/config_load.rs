use std::fs;

use sphere_drop::core::config::GameConfig;

#[test]
fn load_overrides_and_defaults_coexist() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("game.ron");
    fs::write(
        &path,
        r#"(
            window: (
                width: 640.0,
                height: 480.0,
                title: "Test Flask",
                autoClose: 1.5,
            ),
            tiers: (
                base_radius: 10.0,
            ),
            danger: (
                grace_period: 2.0,
                game_over_after: 4.0,
            ),
        )"#,
    )
    .expect("write config");

    let cfg = GameConfig::load_from_file(&path).expect("parse");
    assert_eq!(cfg.window.title, "Test Flask");
    assert_eq!(cfg.window.auto_close, 1.5);
    assert_eq!(cfg.tiers.base_radius, 10.0);
    // Section fields not present in the file keep their defaults.
    assert_eq!(cfg.tiers.mass_base, 1.5);
    assert_eq!(cfg.danger.grace_period, 2.0);
    assert_eq!(cfg.danger.game_over_after, 4.0);
    assert_eq!(cfg.danger.height, 80.0);
}

#[test]
fn missing_file_degrades_to_defaults() {
    let (cfg, err) = GameConfig::load_or_default("/nonexistent/game.ron");
    assert!(err.is_some());
    assert_eq!(cfg, GameConfig::default());
}

#[test]
fn garbage_file_degrades_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.ron");
    fs::write(&path, "not ron at all {{{{").expect("write config");
    let (cfg, err) = GameConfig::load_or_default(&path);
    assert!(err.is_some());
    assert_eq!(cfg, GameConfig::default());
}

#[test]
fn shipped_config_parses_and_validates_clean() {
    let cfg = GameConfig::load_from_file("assets/config/game.ron").expect("shipped config");
    let warnings = cfg.validate();
    assert!(warnings.is_empty(), "shipped config warned: {warnings:?}");
    assert_eq!(cfg, GameConfig::default());
}
