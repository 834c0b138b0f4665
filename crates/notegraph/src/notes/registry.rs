//! Registry of note titles already present in the output directory

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::types::WriteOutcome;

use super::sanitize::sanitize_title;

/// Known note titles, keyed by sanitized title.
///
/// Owned by the pipeline and lent `&mut` to the note writer.
#[derive(Debug)]
pub struct TitleRegistry {
    titles: HashSet<String>,
    output_dir: PathBuf,
}

impl TitleRegistry {
    /// Load the stems of existing `*.md` files, creating `output_dir` if needed.
    ///
    /// Stems are keyed by their sanitized form, so a hand-named `a:b.md`
    /// blocks a generated `a:b` note.
    pub fn seed(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;

        let mut titles = HashSet::new();
        for entry in std::fs::read_dir(&output_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_markdown = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("md"));
            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if is_markdown && !stem.starts_with('.') => stem,
                _ => continue,
            };
            titles.insert(sanitize_title(stem));
        }

        tracing::info!(
            "Seeded title registry with {} note(s) from {}",
            titles.len(),
            output_dir.display()
        );
        Ok(Self { titles, output_dir })
    }

    /// Whether a note with this title is known
    pub fn contains(&self, title: &str) -> bool {
        self.titles.contains(&sanitize_title(title))
    }

    /// Register a title; returns false if it was already known
    pub fn add(&mut self, title: &str) -> bool {
        self.titles.insert(sanitize_title(title))
    }

    /// Known titles, sorted
    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self.titles.iter().cloned().collect();
        titles.sort();
        titles
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File a note with `title` would be written to
    pub fn path_for(&self, title: &str) -> PathBuf {
        self.output_dir.join(format!("{}.md", sanitize_title(title)))
    }

    /// Check, write and register in one step.
    ///
    /// `write` is only called when neither the registry nor the disk knows the
    /// title, and must create the file without replacing an existing one. An
    /// `AlreadyExists` error from it counts as a collision. The title is
    /// registered only after `write` succeeds.
    pub fn claim<F>(&mut self, title: &str, write: F) -> Result<WriteOutcome>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let key = sanitize_title(title);
        let path = self.output_dir.join(format!("{}.md", key));

        if self.titles.contains(&key) || path.exists() {
            return Ok(WriteOutcome::Skipped { title: key });
        }

        match write(&path) {
            Ok(()) => {}
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Ok(WriteOutcome::Skipped { title: key });
            }
            Err(e) => return Err(e),
        }

        self.titles.insert(key.clone());
        Ok(WriteOutcome::Written { title: key, path })
    }
}

/// Write `body` to `path` atomically, failing with `AlreadyExists` instead of
/// replacing an existing file.
pub fn persist_new(path: &Path, body: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::internal(format!("'{}' has no parent directory", path.display())))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(body.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist_noclobber(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
