//! Integration Tests for Error Handling
//!
//! Every failure reaches the caller as text beginning with `Error: `, and
//! validation failures leave no side effects.

use std::fs;

use repotools::config::loader::ConfigLoader;
use repotools::config::Config;
use repotools::tools::{
    ListDirParams, Patterns, ReplaceParams, SearchTextParams, Toolbox, ViewFileParams,
    WalkTreeParams, ERROR_PREFIX,
};
use repotools::Error;

fn toolbox() -> (tempfile::TempDir, Toolbox) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello\n").unwrap();
    fs::write(dir.path().join("bin.dat"), b"\x00\x01\x02").unwrap();
    fs::write(dir.path().join("latin1.txt"), b"caf\xe9\n").unwrap();
    let toolbox = Toolbox::with_root(dir.path()).unwrap();
    (dir, toolbox)
}

#[test]
fn test_validation_messages() {
    let (_dir, toolbox) = toolbox();

    let text = toolbox.view_file(ViewFileParams {
        file_path: "a.txt".to_string(),
        start_line: Some(0),
        ..ViewFileParams::default()
    });
    assert_eq!(text, "Error: start_line must be a positive integer if provided.");

    let text = toolbox.view_file(ViewFileParams::default());
    assert_eq!(text, "Error: file_path must be a non-empty string.");

    let text = toolbox.replace_in_file(ReplaceParams {
        file_path: "a.txt".to_string(),
        old_str: String::new(),
        new_str: "x".to_string(),
        occurrence_index: 0,
    });
    assert_eq!(
        text,
        "Error: old_str empty is only allowed when the file is empty; use a non-empty old_str or a full-file write tool."
    );

    let text = toolbox.search_text(SearchTextParams {
        query: "hello".to_string(),
        max_matches: Some(-5),
        ..SearchTextParams::default()
    });
    assert_eq!(text, "Error: max_matches must be non-negative or omitted.");

    let text = toolbox.list_dir(ListDirParams {
        include_files: false,
        include_dirs: false,
        ..ListDirParams::default()
    });
    assert_eq!(
        text,
        "Error: include_files/include_dirs are both false; at least one must be true."
    );
}

#[test]
fn test_sandbox_and_lookup_errors_are_rendered() {
    let (_dir, toolbox) = toolbox();

    let outside = toolbox.view_file(ViewFileParams {
        file_path: "../../etc/passwd".to_string(),
        ..ViewFileParams::default()
    });
    assert!(outside.starts_with("Error: file_path '"), "{}", outside);
    assert!(outside.contains("is outside the project root"));

    let missing = toolbox.view_file(ViewFileParams {
        file_path: "nope.txt".to_string(),
        ..ViewFileParams::default()
    });
    assert!(missing.starts_with("Error: file not found:"), "{}", missing);

    let binary = toolbox.replace_in_file(ReplaceParams {
        file_path: "bin.dat".to_string(),
        old_str: "a".to_string(),
        new_str: "b".to_string(),
        occurrence_index: 0,
    });
    assert!(binary.contains("cannot be edited as text"), "{}", binary);

    let not_found = toolbox.replace_in_file(ReplaceParams {
        file_path: "a.txt".to_string(),
        old_str: "absent".to_string(),
        new_str: "b".to_string(),
        occurrence_index: 0,
    });
    assert_eq!(not_found, "Error: old_str not found in file; no changes applied.");

    let missing_dir = toolbox.walk_tree(WalkTreeParams {
        root: "missing".to_string(),
        ..WalkTreeParams::default()
    });
    assert!(missing_dir.starts_with("Error: Directory not found:"), "{}", missing_dir);
}

#[test]
fn test_decode_and_pattern_errors() {
    let (_dir, toolbox) = toolbox();

    let text = toolbox.view_file(ViewFileParams {
        file_path: "latin1.txt".to_string(),
        ..ViewFileParams::default()
    });
    assert!(text.starts_with(ERROR_PREFIX), "{}", text);

    let text = toolbox.search_text(SearchTextParams {
        query: "caf".to_string(),
        glob: Some(Patterns::One("*.txt".to_string())),
        ..SearchTextParams::default()
    });
    assert!(text.starts_with(ERROR_PREFIX), "{}", text);

    let text = toolbox.list_dir(ListDirParams {
        patterns: Some(Patterns::Many(vec!["[".to_string()])),
        ..ListDirParams::default()
    });
    assert!(text.starts_with(ERROR_PREFIX), "{}", text);
}

#[test]
fn test_error_display_without_prefix() {
    let err = Error::OccurrenceOutOfRange { index: 3, found: 1 };
    assert_eq!(
        err.to_string(),
        "occurrence_index 3 out of range; found 1 occurrence(s)."
    );
    assert!(!Error::EmptyCommand.to_string().starts_with(ERROR_PREFIX));
}

#[test]
fn test_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repotools.toml");

    fs::write(&path, "[shell]\ncommand_timeout_ms = 0\n").unwrap();
    assert!(matches!(
        ConfigLoader::load_from_path(&path),
        Err(Error::ConfigValidationFailed { .. })
    ));

    fs::write(&path, "[shell\n").unwrap();
    assert!(matches!(
        ConfigLoader::load_from_path(&path),
        Err(Error::ConfigLoadFailed { .. })
    ));

    assert!(matches!(
        ConfigLoader::load_from_path(&dir.path().join("absent.toml")),
        Err(Error::ConfigLoadFailed { .. })
    ));

    let config = Config::default().with_project_root(dir.path().join("absent"));
    assert!(Toolbox::new(&config).is_err());
}
