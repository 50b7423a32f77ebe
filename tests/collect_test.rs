//! Tests for input collection and the shared key base

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use blok_sync::collect::{build_excludes, collect_paths, common_base};
use blok_sync::KeyMapper;

fn write_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn theme_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_file(&temp_dir.path().join("dist/app.js"), "console.log(1);");
    write_file(&temp_dir.path().join("dist/css/site.css"), "body {}");
    write_file(&temp_dir.path().join("assets/logo.svg"), "<svg/>");
    temp_dir
}

fn keys_for(inputs: &[PathBuf], excludes: &[String]) -> Vec<String> {
    let base = common_base(inputs).unwrap();
    let mapper = KeyMapper::with_base_path(&base).unwrap();
    let excludes = build_excludes(excludes).unwrap();

    collect_paths(inputs, &excludes)
        .iter()
        .map(|path| mapper.make_asset_key(path, &base).unwrap().to_string())
        .collect()
}

#[test]
fn test_two_input_directories_share_their_parent() {
    let temp_dir = theme_dir();
    let inputs = vec![temp_dir.path().join("dist"), temp_dir.path().join("assets")];

    assert_eq!(
        common_base(&inputs).unwrap(),
        temp_dir.path().to_path_buf()
    );
    assert_eq!(
        keys_for(&inputs, &[]),
        vec!["dist/app.js", "dist/css/site.css", "assets/logo.svg"]
    );
}

#[test]
fn test_single_input_directory_is_the_base() {
    let temp_dir = theme_dir();
    let inputs = vec![temp_dir.path().join("dist")];

    assert_eq!(keys_for(&inputs, &[]), vec!["app.js", "css/site.css"]);
}

#[test]
fn test_file_input_uses_its_parent() {
    let temp_dir = theme_dir();
    let inputs = vec![
        temp_dir.path().join("assets/logo.svg"),
        temp_dir.path().join("dist"),
    ];

    assert_eq!(
        keys_for(&inputs, &[]),
        vec!["assets/logo.svg", "dist/app.js", "dist/css/site.css"]
    );
}

#[test]
fn test_excludes_match_relative_to_input() {
    let temp_dir = theme_dir();
    let inputs = vec![temp_dir.path().join("dist")];

    assert_eq!(keys_for(&inputs, &["css/**".to_string()]), vec!["app.js"]);
}

#[test]
fn test_invalid_exclude_pattern_fails() {
    assert!(build_excludes(&["a[".to_string()]).is_err());
}
