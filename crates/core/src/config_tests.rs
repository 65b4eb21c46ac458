// SPDX-License-Identifier: MIT

use super::*;
use std::path::PathBuf;

fn config() -> SessionConfig {
    SessionConfig::new(
        PathBuf::from("/tmp/src"),
        PathBuf::from("/tmp/work"),
        PathBuf::from("/tmp/data"),
        PathBuf::from("/tmp/temp"),
    )
}

#[test]
fn defaults_use_hs_and_lhs_extensions() {
    let cfg = config();
    assert_eq!(cfg.source_extensions, vec!["hs".to_string(), "lhs".to_string()]);
    assert!(cfg.delete_temp_files_on_shutdown);
}

#[test]
fn load_static_options_parses_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ics.toml");
    std::fs::write(
        &path,
        r#"
        static_options = ["-Wall", "-O2"]
        source_extensions = ["hs"]
        "#,
    )
    .unwrap();

    let file = load_static_options(&path).unwrap();
    assert_eq!(file.static_options, vec!["-Wall".to_string(), "-O2".to_string()]);
    assert_eq!(file.source_extensions, vec!["hs".to_string()]);
}

#[test]
fn merge_static_options_file_overrides_only_populated_fields() {
    let cfg = config().merge_static_options_file(StaticOptionsFile {
        static_options: vec!["-O2".to_string()],
        package_db_stack: vec![],
        source_extensions: vec![],
    });
    assert_eq!(cfg.initial_static_options, vec!["-O2".to_string()]);
    // source_extensions left at the default since the file didn't set it.
    assert_eq!(cfg.source_extensions, vec!["hs".to_string(), "lhs".to_string()]);
}

#[test]
fn load_static_options_rejects_invalid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "not valid = [").unwrap();
    let err = load_static_options(&path).unwrap_err();
    assert!(matches!(err, crate::error::SessionError::Config(_)));
}
