//! Integration Tests for the Text Editor
//!
//! Viewing and replacement through the sandbox, checked against the file
//! contents on disk.

use std::fs;

use repotools::editor::{replace_in_file, view_file, EditKind, Sandbox, ViewRange};
use repotools::editor::replace::SNIPPET_RADIUS;
use repotools::tools::{ReplaceParams, Toolbox, ViewFileParams};
use repotools::Error;

fn sandbox_with(name: &str, content: &str) -> (tempfile::TempDir, Sandbox) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(name), content).unwrap();
    let sandbox = Sandbox::new(dir.path()).unwrap();
    (dir, sandbox)
}

#[test]
fn test_unsliced_view_returns_raw_content() {
    let content = "first\n\tsecond  \r\nthird without newline";
    let (_dir, sandbox) = sandbox_with("notes.md", content);

    let view = view_file(&sandbox, "notes.md", ViewRange::default()).unwrap();
    let rendered = view.to_string();
    let (_header, body) = rendered.split_once("\n\n").unwrap();
    assert_eq!(body, content);
}

#[test]
fn test_replace_then_reverse_restores_original() {
    let original = "let a = 1;\nlet b = 2;\nlet a = 3;\n";
    let (dir, sandbox) = sandbox_with("code.rs", original);

    replace_in_file(&sandbox, "code.rs", "let a", "let alpha", 1, SNIPPET_RADIUS).unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("code.rs")).unwrap(),
        "let a = 1;\nlet b = 2;\nlet alpha = 3;\n"
    );

    replace_in_file(&sandbox, "code.rs", "let alpha", "let a", 0, SNIPPET_RADIUS).unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("code.rs")).unwrap(), original);
}

#[test]
fn test_single_occurrence_replaced_once() {
    let (_dir, sandbox) = sandbox_with("f.txt", "before FOO after");
    let report = replace_in_file(&sandbox, "f.txt", "FOO", "BAR", 0, SNIPPET_RADIUS).unwrap();
    assert_eq!(
        report.kind,
        EditKind::Replaced {
            occurrence: 0,
            start: 7,
            end: 10
        }
    );
    assert!(matches!(
        replace_in_file(&sandbox, "f.txt", "FOO", "BAR", 0, SNIPPET_RADIUS),
        Err(Error::NoOccurrence)
    ));
}

#[test]
fn test_unicode_offsets_are_characters() {
    let (_dir, sandbox) = sandbox_with("u.txt", "héllo wörld");
    let report = replace_in_file(&sandbox, "u.txt", "wörld", "world", 0, SNIPPET_RADIUS).unwrap();
    assert_eq!(
        report.kind,
        EditKind::Replaced {
            occurrence: 0,
            start: 6,
            end: 11
        }
    );
    assert_eq!(report.delta, 0);
    assert_eq!(report.new_size, 11);
}

#[test]
fn test_sandbox_blocks_escape_through_symlink() {
    let outside = tempfile::tempdir().unwrap();
    fs::write(outside.path().join("secret.txt"), "secret").unwrap();
    let (dir, sandbox) = sandbox_with("ok.txt", "ok");

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt"))
            .unwrap();
        assert!(matches!(
            view_file(&sandbox, "link.txt", ViewRange::default()),
            Err(Error::PathOutsideRoot { .. })
        ));
    }

    assert!(matches!(
        replace_in_file(&sandbox, "../x.txt", "a", "b", 0, SNIPPET_RADIUS),
        Err(Error::PathOutsideRoot { .. })
    ));
    assert_eq!(
        fs::read_to_string(outside.path().join("secret.txt")).unwrap(),
        "secret"
    );
}

#[test]
fn test_toolbox_renders_view_and_edit() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "l1\nl2\nl3\n").unwrap();
    let toolbox = Toolbox::with_root(dir.path()).unwrap();

    let text = toolbox.view_file(ViewFileParams {
        file_path: "a.txt".to_string(),
        start_line: Some(2),
        end_line: Some(2),
        max_characters: None,
    });
    let expected_path = toolbox.root().join("a.txt");
    assert_eq!(
        text,
        format!("Path: {}\nLines: 2-2 (total 3)\n\nl2\n", expected_path.display())
    );

    let text = toolbox.replace_in_file(ReplaceParams {
        file_path: "a.txt".to_string(),
        old_str: "l2".to_string(),
        new_str: "line two".to_string(),
        occurrence_index: 0,
    });
    assert!(text.contains("Replaced occurrence #0 (chars 3-5)"), "{}", text);
    assert!(text.contains("Delta size: +6 chars"), "{}", text);
    assert!(text.contains("New file size: 15 chars"), "{}", text);

    let text = toolbox.view_file(ViewFileParams {
        file_path: "a.txt".to_string(),
        start_line: Some(3),
        end_line: Some(1),
        max_characters: None,
    });
    assert_eq!(
        text,
        "Error: end_line must be greater than or equal to start_line."
    );
}

#[test]
fn test_failed_edit_leaves_file_untouched() {
    let (dir, sandbox) = sandbox_with("f.txt", "keep me");
    let before = fs::read(dir.path().join("f.txt")).unwrap();

    assert!(replace_in_file(&sandbox, "f.txt", "", "x", 0, SNIPPET_RADIUS).is_err());
    assert!(replace_in_file(&sandbox, "f.txt", "absent", "x", 0, SNIPPET_RADIUS).is_err());
    assert!(replace_in_file(&sandbox, "f.txt", "keep", "x", 5, SNIPPET_RADIUS).is_err());

    assert_eq!(fs::read(dir.path().join("f.txt")).unwrap(), before);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}
