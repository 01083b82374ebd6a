//! Integration Tests for Filesystem Queries
//!
//! These tests exercise listing, tree walks and text search against
//! temporary directory fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use repotools::fs::{
    list_dir, search_text, walk_tree, ListOptions, SearchOptions, TreeOptions,
};
use repotools::Error;

/// root/
///   a.txt        "one\ntwo\nhello world\n"
///   b.txt        "nothing here\n"
///   blob.bin     binary with "hello"
///   src/
///     lib.rs     "fn hello() {}\n"
///     nested/
///       deep/
///         x.rs   "hello hello\n"
fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("a.txt"), "one\ntwo\nhello world\n").unwrap();
    fs::write(root.join("b.txt"), "nothing here\n").unwrap();
    fs::write(root.join("blob.bin"), b"hello\x00world").unwrap();
    fs::create_dir_all(root.join("src/nested/deep")).unwrap();
    fs::write(root.join("src/lib.rs"), "fn hello() {}\n").unwrap();
    fs::write(root.join("src/nested/deep/x.rs"), "hello hello\n").unwrap();
    dir
}

fn relative_paths(root: &Path, paths: impl Iterator<Item = PathBuf>) -> Vec<String> {
    paths
        .map(|p| {
            p.strip_prefix(root)
                .unwrap_or(&p)
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

#[test]
fn test_search_single_match_with_span() {
    let dir = fixture();
    let options = SearchOptions {
        globs: vec!["*.txt".to_string()],
        ..SearchOptions::default()
    };
    let matches = search_text(dir.path(), "hello", &options).unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].path, dir.path().join("a.txt"));
    assert_eq!(matches[0].line_number, 3);
    assert_eq!(matches[0].line_text, "hello world");
    assert_eq!(matches[0].spans, vec![(0, 5)]);
}

#[test]
fn test_search_skips_binary_unless_asked() {
    let dir = fixture();
    let text_only = search_text(dir.path(), "hello", &SearchOptions::default()).unwrap();
    assert!(text_only.iter().all(|m| !m.path.ends_with("blob.bin")));

    let with_binary = search_text(
        dir.path(),
        "world",
        &SearchOptions {
            include_binary: true,
            globs: vec!["*.bin".to_string()],
            ..SearchOptions::default()
        },
    )
    .unwrap();
    assert_eq!(with_binary.len(), 1);
}

#[test]
fn test_search_order_and_recursive_glob() {
    let dir = fixture();
    let options = SearchOptions {
        globs: vec!["**/*.rs".to_string()],
        ..SearchOptions::default()
    };
    let matches = search_text(dir.path(), "hello", &options).unwrap();
    assert_eq!(
        relative_paths(dir.path(), matches.into_iter().map(|m| m.path)),
        vec!["src/lib.rs", "src/nested/deep/x.rs"]
    );
}

#[test]
fn test_search_path_aware_star() {
    let dir = fixture();
    let options = SearchOptions {
        globs: vec!["*.rs".to_string()],
        ..SearchOptions::default()
    };
    // `*` does not cross directories when searching
    assert!(search_text(dir.path(), "hello", &options).unwrap().is_empty());
}

#[test]
fn test_search_case_folding_and_regex() {
    let dir = fixture();
    let insensitive = SearchOptions {
        case_sensitive: false,
        ..SearchOptions::default()
    };
    let matches = search_text(dir.path(), "HELLO WORLD", &insensitive).unwrap();
    assert_eq!(matches.len(), 1);

    let regex = SearchOptions {
        use_regex: true,
        ..SearchOptions::default()
    };
    let matches = search_text(dir.path(), r"^fn \w+", &regex).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].spans, vec![(0, 8)]);
}

#[test]
fn test_search_cap_counts_spans() {
    let dir = fixture();
    let options = SearchOptions {
        globs: vec!["**/x.rs".to_string()],
        max_matches: Some(1),
        ..SearchOptions::default()
    };
    let matches = search_text(dir.path(), "hello", &options).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].spans, vec![(0, 5)]);

    let zero = SearchOptions {
        max_matches: Some(0),
        ..SearchOptions::default()
    };
    assert!(search_text(dir.path(), "hello", &zero).unwrap().is_empty());
}

#[test]
fn test_search_errors() {
    let dir = fixture();
    let negative = SearchOptions {
        max_matches: Some(-1),
        ..SearchOptions::default()
    };
    assert!(matches!(
        search_text(dir.path(), "x", &negative),
        Err(Error::InvalidArgument { .. })
    ));

    let bad_regex = SearchOptions {
        use_regex: true,
        ..SearchOptions::default()
    };
    assert!(matches!(
        search_text(dir.path(), "(", &bad_regex),
        Err(Error::Regex(_))
    ));

    assert!(matches!(
        search_text(&dir.path().join("a.txt"), "x", &SearchOptions::default()),
        Err(Error::NotADirectory { .. })
    ));
    assert!(matches!(
        search_text(&dir.path().join("missing"), "x", &SearchOptions::default()),
        Err(Error::DirectoryNotFound { .. })
    ));
}

#[test]
fn test_list_dir_sorted_and_filtered() {
    let dir = fixture();
    let entries = list_dir(dir.path(), &ListOptions::default()).unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "blob.bin", "src"]);
    assert!(entries[3].is_dir);
    assert_eq!(entries[0].path, PathBuf::from("a.txt"));

    let dirs_only = list_dir(
        dir.path(),
        &ListOptions {
            include_files: false,
            ..ListOptions::default()
        },
    )
    .unwrap();
    assert_eq!(dirs_only.len(), 1);

    let absolute = list_dir(
        dir.path(),
        &ListOptions {
            patterns: vec!["*.txt".to_string()],
            absolute_paths: true,
            ..ListOptions::default()
        },
    )
    .unwrap();
    assert_eq!(absolute.len(), 2);
    assert!(absolute.iter().all(|e| e.path.is_absolute()));
}

#[test]
fn test_walk_tree_depth_bound() {
    let dir = fixture();
    let entries = walk_tree(
        dir.path(),
        &TreeOptions {
            max_depth: 2,
            ..TreeOptions::default()
        },
    )
    .unwrap();
    assert!(entries.iter().all(|e| e.depth <= 2));
    assert!(entries.iter().any(|e| e.path == Path::new("src/nested")));
    assert!(!entries.iter().any(|e| e.name == "deep"));
}

#[test]
fn test_walk_tree_descends_hidden_dirs() {
    let dir = fixture();
    let files = walk_tree(
        dir.path(),
        &TreeOptions {
            max_depth: 2,
            include_dirs: false,
            ..TreeOptions::default()
        },
    )
    .unwrap();
    assert!(files.iter().all(|e| !e.is_dir));
    assert!(files.iter().any(|e| e.path == Path::new("src/lib.rs")));
}

#[test]
fn test_walk_tree_loose_patterns_cross_directories() {
    let dir = fixture();
    let entries = walk_tree(
        dir.path(),
        &TreeOptions {
            patterns: vec!["*.rs".to_string()],
            ..TreeOptions::default()
        },
    )
    .unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    // src/nested/deep/x.rs sits at depth 4, below the default bound
    assert_eq!(names, vec!["lib.rs"]);

    let deeper = walk_tree(dir.path(), &TreeOptions::default()).unwrap();
    assert!(deeper.iter().all(|e| e.depth <= 3));
    assert!(deeper.iter().any(|e| e.path == Path::new("src/nested/deep")));
    assert!(!deeper.iter().any(|e| e.name == "x.rs"));
}

#[test]
fn test_not_a_directory_errors() {
    let dir = fixture();
    let file = dir.path().join("a.txt");
    assert!(matches!(
        list_dir(&file, &ListOptions::default()),
        Err(Error::NotADirectory { .. })
    ));
    assert!(matches!(
        walk_tree(&file, &TreeOptions::default()),
        Err(Error::NotADirectory { .. })
    ));
    assert!(matches!(
        walk_tree(
            dir.path(),
            &TreeOptions {
                max_depth: 4,
                ..TreeOptions::default()
            }
        ),
        Err(Error::InvalidArgument { .. })
    ));
    assert!(matches!(
        list_dir(
            dir.path(),
            &ListOptions {
                include_files: false,
                include_dirs: false,
                ..ListOptions::default()
            }
        ),
        Err(Error::InvalidArgument { .. })
    ));
}
