use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::base::FileId;
use crate::ide::AnalysisHost;

/// Extensions of MSBuild files other than project files.
const IMPORT_EXTENSIONS: &[&str] = &["props", "targets"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("directory not found: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Whether `path` names an MSBuild file: `*.*proj`, `*.props` or `*.targets`.
pub fn is_msbuild_file(path: &Path) -> bool {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let extension = extension.to_ascii_lowercase();
    extension.ends_with("proj") || IMPORT_EXTENSIONS.contains(&extension.as_str())
}

/// Loads workspace files into an [`AnalysisHost`].
#[derive(Debug, Default)]
pub struct WorkspaceLoader;

impl WorkspaceLoader {
    pub fn new() -> Self {
        Self
    }

    /// Opens every MSBuild file under `path`, reading files in parallel.
    ///
    /// A file that cannot be read does not stop the others; its error is
    /// returned alongside the ids of the files that were opened.
    #[instrument(skip_all, fields(dir = %path.as_ref().display()))]
    pub fn load_directory_into_host(
        &self,
        path: impl AsRef<Path>,
        host: &AnalysisHost,
    ) -> Result<(Vec<FileId>, Vec<LoadError>), LoadError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(LoadError::NotADirectory(path.to_owned()));
        }
        let started = Instant::now();

        let paths = collect_file_paths(path);
        let results: Vec<_> = paths
            .par_iter()
            .map(|path| self.load_file_into_host(path, host))
            .collect();

        let mut files = Vec::new();
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(file) => files.push(file),
                Err(error) => {
                    warn!(%error, "skipping file");
                    errors.push(error);
                }
            }
        }

        info!(
            files = files.len(),
            errors = errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded workspace"
        );
        Ok((files, errors))
    }

    /// Opens a single file at version 0.
    pub fn load_file_into_host(&self, path: &Path, host: &AnalysisHost) -> Result<FileId, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;
        let (file, outcome) = host.open(path, &text, 0);
        debug!(file = %path.display(), errors = outcome.syntax_errors.len(), "opened");
        Ok(file)
    }
}

/// MSBuild files under `dir`, sorted. Unreadable directory entries are
/// skipped.
fn collect_file_paths(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_msbuild_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_msbuild_file() {
        assert!(is_msbuild_file(Path::new("a.csproj")));
        assert!(is_msbuild_file(Path::new("a.vcxproj")));
        assert!(is_msbuild_file(Path::new("dirs.proj")));
        assert!(is_msbuild_file(Path::new("Directory.Build.props")));
        assert!(is_msbuild_file(Path::new("x.TARGETS")));
        assert!(!is_msbuild_file(Path::new("a.proj.bak")));
        assert!(!is_msbuild_file(Path::new("README")));
        assert!(!is_msbuild_file(Path::new("x.json")));
    }
}
