//! Input directory listing

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// List processable files in `dir`, sorted by path.
///
/// Dotfiles, directories and extensions outside `extensions` are skipped.
pub fn scan_input_dir(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::Config(format!("'{}' is not a valid directory", dir.display())));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || !path.is_file() {
            continue;
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext)) {
            files.push(path);
        } else {
            tracing::debug!("Skipping unsupported file: {}", path.display());
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        ["txt", "md", "pdf"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.md", ".hidden.txt", "image.png", "C.PDF"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let files = scan_input_dir(dir.path(), &exts()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["C.PDF", "a.md", "b.txt"]);
    }

    #[test]
    fn test_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_input_dir(&dir.path().join("nope"), &exts()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
