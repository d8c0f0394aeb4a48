//! Loading a directory of MSBuild files into a host.

use std::fs;

use msproj::ide::AnalysisHost;
use msproj::project::{LoadError, WorkspaceLoader};
use tempfile::TempDir;

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("src/app")).unwrap();
    fs::write(
        root.join("Directory.Build.props"),
        "<Project><PropertyGroup><Root>1</Root></PropertyGroup></Project>",
    )
    .unwrap();
    fs::write(
        root.join("src/app/app.csproj"),
        "<Project><Import Project=\"../../Directory.Build.props\" /></Project>",
    )
    .unwrap();
    fs::write(root.join("src/app/broken.targets"), "<Project><Target").unwrap();
    fs::write(root.join("src/app/Program.cs"), "class Program {}").unwrap();
    fs::write(root.join("README.md"), "# readme").unwrap();
    dir
}

#[test]
fn test_loads_msbuild_files_only() {
    let dir = workspace();
    let host = AnalysisHost::default();

    let (files, errors) = WorkspaceLoader::new()
        .load_directory_into_host(dir.path(), &host)
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(files.len(), 3);

    let mut names: Vec<_> = files
        .iter()
        .map(|&file| {
            let snapshot = host.snapshot(file).unwrap();
            assert_eq!(snapshot.version(), 0);
            snapshot.path().file_name().unwrap().to_string_lossy().into_owned()
        })
        .collect();
    names.sort();
    assert_eq!(names, ["Directory.Build.props", "app.csproj", "broken.targets"]);
}

#[test]
fn test_malformed_file_is_still_opened() {
    let dir = workspace();
    let host = AnalysisHost::default();
    WorkspaceLoader::new()
        .load_directory_into_host(dir.path(), &host)
        .unwrap();

    let broken = host
        .files()
        .into_iter()
        .filter_map(|file| host.snapshot(file))
        .find(|s| s.path().ends_with("broken.targets"))
        .unwrap();
    assert!(!broken.tree().is_valid());
    assert!(broken.locator().is_err());
}

#[test]
fn test_missing_directory() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    let host = AnalysisHost::default();

    let err = WorkspaceLoader::new()
        .load_directory_into_host(&missing, &host)
        .unwrap_err();
    assert!(matches!(err, LoadError::NotADirectory(path) if path == missing));
}

#[test]
fn test_unreadable_file_reports_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("binary.proj");
    fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
    let host = AnalysisHost::default();

    let err = WorkspaceLoader::new()
        .load_file_into_host(&path, &host)
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert!(host.files().is_empty());
}
