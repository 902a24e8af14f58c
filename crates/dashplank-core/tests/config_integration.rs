use std::fs;
use std::path::PathBuf;

use dashplank_core::config::Config;
use dashplank_core::error::Error;
use dashplank_core::{DockAlignment, DockLayout, DockPosition, RestorePolicy, ThemeParameters};

fn write_config(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dashplank-config-{}-{}", std::process::id(), name));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_explicit_config_overrides_defaults() {
    let path = write_config(
        "override",
        r#"
[dock]
id = "dock2"

[sync]
pinned_only_restore = "activation"

[launcher]
enabled = false
"#,
    );

    let result = Config::find_and_load(Some(path.as_path())).unwrap();

    assert!(!result.used_defaults);
    assert_eq!(result.source.as_deref(), Some(path.as_path()));
    let config = result.config;
    assert_eq!(config.dock_settings_path(), "/net/launchpad/plank/docks/dock2/");
    assert_eq!(config.dock.bus_name, "net.launchpad.plank");
    assert_eq!(config.restore_policy(), RestorePolicy::Activation);
    assert!(!config.launcher.enabled);
    assert!(config.validate().is_ok());

    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_explicit_missing_config_is_an_error() {
    let path = std::env::temp_dir().join("dashplank-definitely-missing/config.toml");
    match Config::find_and_load(Some(path.as_path())) {
        Err(Error::ConfigNotFound(p)) => assert_eq!(p, path),
        other => panic!("expected ConfigNotFound, got {:?}", other),
    }
}

#[test]
fn test_invalid_values_fail_validation() {
    let path = write_config(
        "invalid",
        r#"
[dock]
call_timeout_ms = -5

[theme]
name = ""
"#,
    );

    let config = Config::load(&path).unwrap();
    match config.validate() {
        Err(Error::ConfigValidation(errors)) => {
            assert_eq!(errors.len(), 2);
            assert!(errors.iter().any(|e| e.starts_with("dock.call_timeout_ms")));
            assert!(errors.iter().any(|e| e.starts_with("theme.name")));
        }
        other => panic!("expected validation errors, got {:?}", other),
    }

    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_malformed_toml_is_a_parse_error() {
    let path = write_config("malformed", "[dock\nid = 1");
    assert!(matches!(Config::load(&path), Err(Error::TomlParse(_))));
    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_configured_panel_height_feeds_theme() {
    let path = write_config("theme", "[theme]\npanel_height = 64\n");
    let config = Config::load(&path).unwrap();

    let layout = DockLayout {
        icon_size: 64,
        position: DockPosition::Right,
        alignment: DockAlignment::Fill,
    };
    let params = ThemeParameters::compute(&layout, config.theme.panel_height).unwrap();
    assert_eq!(params.horiz_padding, 10.0);

    let _ = fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_repo_config_matches_built_in_defaults() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config.toml");

    let config = Config::load(&path).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config, Config::default());
    assert_eq!(config, Config::from_default_toml().unwrap());
}
