// Local filesystem adapter

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::ports::*;

/// Filesystem adapter backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFsAdapter;

impl LocalFsAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl FsPort for LocalFsAdapter {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        fs::create_dir_all(path)
    }

    fn segment_files(&self, dir: &Path, stem: &OsStr) -> Vec<PathBuf> {
        let prefix = format!("{}_", stem.to_string_lossy());
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy();
                name.strip_prefix(&prefix)
                    .and_then(|rest| rest.strip_suffix(".mp4"))
                    .map(|seq| seq.len() >= 3 && seq.chars().all(|c| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect();
        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_dir_all_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        let fs = LocalFsAdapter::new();
        fs.create_dir_all(&nested).unwrap();
        fs.create_dir_all(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_is_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("tool");
        std::fs::write(&file, b"#!/bin/sh\n").unwrap();
        let fs = LocalFsAdapter::new();
        assert!(fs.is_file(&file));
        assert!(!fs.is_file(temp.path()));
        assert!(!fs.is_file(&temp.path().join("missing")));
    }

    #[test]
    fn test_segment_files_filters_and_sorts() {
        let temp = TempDir::new().unwrap();
        for name in [
            "movie_001.mp4",
            "movie_000.mp4",
            "movie_002.mp4",
            "movie.mp4",
            "movie_abc.mp4",
            "other_000.mp4",
            "movie_000.mov",
        ] {
            std::fs::write(temp.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(temp.path().join("movie_003.mp4")).unwrap();

        let names: Vec<String> = LocalFsAdapter::new()
            .segment_files(temp.path(), OsStr::new("movie"))
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["movie_000.mp4", "movie_001.mp4", "movie_002.mp4"]);
    }

    #[test]
    fn test_segment_files_missing_dir() {
        assert!(LocalFsAdapter::new()
            .segment_files(Path::new("/definitely/not/here"), OsStr::new("movie"))
            .is_empty());
    }
}
