//! Source directory enumeration.
//!
//! Produces the initial token set for a feed. By default this is a plain
//! listing of the directory's direct entries (files and sub-directories alike).
//! [`ScanOptions`] can narrow that down to audio files or walk the tree.
//!
//! # Note on Ordering
//!
//! The returned order is whatever the filesystem and the parallel walk happen
//! to produce. Callers must treat the result as an unordered set.

use crate::constants::SKIP_DIRECTORIES;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Filters applied while enumerating a source.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Walk sub-directories and yield the files inside them.
    pub recursive: bool,
    /// Drop entries whose name starts with '.'.
    pub skip_hidden: bool,
    /// Keep only files with one of these lowercase extensions.
    pub extensions: Option<HashSet<String>>,
}

impl ScanOptions {
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = Some(
            extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        );
        self
    }

    fn accepts_file(&self, path: &Path) -> bool {
        match &self.extensions {
            None => true,
            Some(exts) => path
                .extension()
                .map(|ext| exts.contains(&ext.to_string_lossy().to_lowercase()))
                .unwrap_or(false),
        }
    }
}

/// Check if a file or directory is hidden (starts with '.')
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Check if a directory should be skipped during a recursive walk
pub fn should_skip_directory(name: &str) -> bool {
    SKIP_DIRECTORIES.contains(&name)
}

/// Enumerate the entries of `dir` according to `options`.
///
/// Failing to read `dir` itself is an error. During a recursive walk,
/// sub-directories that cannot be read are logged and skipped so the rest of
/// the tree is still collected.
pub fn list_entries(dir: &Path, options: &ScanOptions) -> io::Result<Vec<PathBuf>> {
    if options.recursive {
        let mut files = Vec::new();
        walk_directory(dir, options, &mut files)?;
        Ok(files)
    } else {
        list_direct_entries(dir, options)
    }
}

fn list_direct_entries(dir: &Path, options: &ScanOptions) -> io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if options.skip_hidden && is_hidden_file(&path) {
            continue;
        }

        // An extension filter implies files only
        if options.extensions.is_some() && !(path.is_file() && options.accepts_file(&path)) {
            continue;
        }

        entries.push(path);
    }

    Ok(entries)
}

fn walk_directory(dir: &Path, options: &ScanOptions, files: &mut Vec<PathBuf>) -> io::Result<()> {
    let entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;

    let mut directories = Vec::new();

    for entry in entries {
        let path = entry.path();

        if options.skip_hidden && is_hidden_file(&path) {
            continue;
        }

        // file_type() does not follow symlinks; linked directories could loop
        let file_type = entry.file_type()?;
        if file_type.is_symlink() && path.is_dir() {
            log::debug!("Not following directory link '{}'", path.display());
            continue;
        }

        if file_type.is_dir() {
            let dir_name = match path.file_name() {
                Some(name) => name.to_string_lossy(),
                None => continue,
            };
            if !should_skip_directory(&dir_name) {
                directories.push(path);
            }
        } else if path.is_file() && options.accepts_file(&path) {
            files.push(path);
        }
    }

    if directories.len() > 1 {
        let nested: Vec<Vec<PathBuf>> = directories
            .par_iter()
            .filter_map(|subdir| {
                let mut found = Vec::new();
                match walk_directory(subdir, options, &mut found) {
                    Ok(()) => Some(found),
                    Err(e) => {
                        log::warn!("Failed to scan directory '{}': {}", subdir.display(), e);
                        None
                    }
                }
            })
            .collect();

        for found in nested {
            files.extend(found);
        }
    } else {
        for subdir in directories {
            if let Err(e) = walk_directory(&subdir, options, files) {
                log::warn!("Failed to scan directory '{}': {}", subdir.display(), e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf]) -> HashSet<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_is_hidden_file() {
        assert!(is_hidden_file(Path::new(".hidden")));
        assert!(is_hidden_file(Path::new("/path/.hidden")));
        assert!(!is_hidden_file(Path::new("visible")));
    }

    #[test]
    fn test_should_skip_directory() {
        assert!(should_skip_directory("node_modules"));
        assert!(should_skip_directory(".git"));
        assert!(!should_skip_directory("src"));
    }

    #[test]
    fn test_list_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let entries = list_entries(temp_dir.path(), &ScanOptions::default()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_default_lists_every_direct_entry() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.wav"), b"fake").unwrap();
        fs::write(temp_dir.path().join(".hidden"), b"fake").unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("sub").join("nested.wav"), b"fake").unwrap();

        let entries = list_entries(temp_dir.path(), &ScanOptions::default()).unwrap();
        let expected: HashSet<String> = ["a.wav", ".hidden", "sub"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names(&entries), expected);
    }

    #[test]
    fn test_skip_hidden() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("visible.wav"), b"fake").unwrap();
        fs::write(temp_dir.path().join(".hidden.wav"), b"fake").unwrap();

        let options = ScanOptions {
            skip_hidden: true,
            ..Default::default()
        };
        let entries = list_entries(temp_dir.path(), &options).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("one.WAV"), b"fake").unwrap();
        fs::write(temp_dir.path().join("two.flac"), b"fake").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"fake").unwrap();
        fs::create_dir(temp_dir.path().join("dir.wav")).unwrap();

        let options = ScanOptions::default().with_extensions([".wav", "flac"]);
        let entries = list_entries(temp_dir.path(), &options).unwrap();
        let expected: HashSet<String> = ["one.WAV", "two.flac"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names(&entries), expected);
    }

    #[test]
    fn test_recursive_collects_nested_files() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::create_dir(&a).unwrap();
        fs::create_dir(&b).unwrap();
        fs::write(temp_dir.path().join("root.wav"), b"fake").unwrap();
        fs::write(a.join("one.wav"), b"fake").unwrap();
        fs::write(b.join("two.wav"), b"fake").unwrap();

        let skip = temp_dir.path().join("node_modules");
        fs::create_dir(&skip).unwrap();
        fs::write(skip.join("ignored.wav"), b"fake").unwrap();

        let options = ScanOptions {
            recursive: true,
            ..Default::default()
        };
        let entries = list_entries(temp_dir.path(), &options).unwrap();
        let expected: HashSet<String> = ["root.wav", "one.wav", "two.wav"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names(&entries), expected);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let result = list_entries(
            Path::new("/this/path/does/not/exist/hopefully/12345"),
            &ScanOptions::default(),
        );
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_recursive_walk_ignores_directory_links() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::create_dir(&a).unwrap();
        fs::create_dir(&b).unwrap();
        fs::write(a.join("one.wav"), b"fake").unwrap();
        fs::write(b.join("two.wav"), b"fake").unwrap();

        // a/up -> root and b/self -> b would recurse forever if followed
        symlink(temp_dir.path(), a.join("up")).unwrap();
        symlink(&b, b.join("self")).unwrap();
        // links to files are still entries
        symlink(a.join("one.wav"), b.join("linked.wav")).unwrap();

        let options = ScanOptions {
            recursive: true,
            ..Default::default()
        };
        let entries = list_entries(temp_dir.path(), &options).unwrap();
        let expected: HashSet<String> = ["one.wav", "two.wav", "linked.wav"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names(&entries), expected);
        assert_eq!(entries.len(), 3);
    }
}
