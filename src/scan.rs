//! Directory scanner for episode files
//!
//! Walks a directory tree and collects every video file whose name looks
//! like a TV episode. Detection is by extension; the episode-shape check
//! uses the filename patterns so that loose video files (trailers, home
//! movies) are not dragged into a rename run.

use crate::patterns::valid_episode_file;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions treated as video containers.
const VIDEO_EXTENSIONS: &[&str] = &[
    "avi", "divx", "flv", "m2ts", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "ts", "webm", "wmv",
];

/// Errors that can occur while scanning for episode files
#[derive(Debug, Error)]
pub enum ScanError {
    /// Path is neither a file nor a directory
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    /// Failed to read directory
    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed { path: PathBuf, source: io::Error },

    /// Failed to read directory entry
    #[error("Failed to read directory entry: {0}")]
    ReadEntryFailed(#[from] io::Error),
}

/// Collects all episode video files below `path`.
///
/// A single file path is accepted too and yields at most one entry. The
/// result is sorted so runs over the same tree are deterministic.
pub(crate) fn scan_for_episodes(path: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();
    if path.is_file() {
        if is_episode_file(path) {
            files.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        scan_directory_recursive(path, &mut files)?;
    } else {
        return Err(ScanError::NotFound(path.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(dir_path: &Path, files: &mut Vec<PathBuf>) -> Result<(), ScanError> {
    for entry in fs::read_dir(dir_path).map_err(|e| ScanError::ReadDirectoryFailed {
        path: dir_path.to_path_buf(),
        source: e,
    })? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if path.is_file() && is_episode_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// A video file counts as an episode when its extension is a known video
/// container and its name matches one of the episode patterns.
fn is_episode_file(path: &Path) -> bool {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    if !VIDEO_EXTENSIONS
        .iter()
        .any(|known| extension.eq_ignore_ascii_case(known))
    {
        return false;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(valid_episode_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_scan_nonexistent_path() {
        let result = scan_for_episodes(Path::new("/nonexistent/path/that/does/not/exist"));
        assert!(matches!(result, Err(ScanError::NotFound(_))));
    }

    #[test]
    fn test_recursive_scan_filters_non_episodes() {
        let dir = tempfile::tempdir().unwrap();
        let season = dir.path().join("Castle").join("Season 1");
        fs::create_dir_all(&season).unwrap();

        File::create(season.join("Castle - S01E01 - Pilot.mkv")).unwrap();
        File::create(season.join("Castle - S01E02 - Nanny McDead.mkv")).unwrap();
        // Wrong extension and non-episode names must be skipped.
        File::create(season.join("Castle - S01E01 - Pilot.srt")).unwrap();
        File::create(season.join("holiday footage.mkv")).unwrap();

        let files = scan_for_episodes(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("Castle - S01E01 - Pilot.mkv"));
        assert!(files[1].ends_with("Castle - S01E02 - Nanny McDead.mkv"));
    }

    #[test]
    fn test_single_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Castle - S01E01 - Pilot.mkv");
        File::create(&file).unwrap();

        let files = scan_for_episodes(&file).unwrap();
        assert_eq!(files, vec![file]);
    }
}
