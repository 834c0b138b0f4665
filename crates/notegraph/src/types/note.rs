//! Generated notes and the outcome of persisting them

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

// [[Target]], [[Target|alias]], [[Target#Heading]]
static WIKILINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([^\[\]|#]+)(?:#[^\[\]|]*)?(?:\|[^\[\]]*)?\]\]").expect("Invalid wikilink regex")
});

/// A generated note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Title as produced by the model
    pub title: String,
    /// Markdown body
    #[serde(rename = "note_text")]
    pub body: String,
}

impl Note {
    /// Create a note
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Targets of all wikilinks in the body, deduplicated
    pub fn wikilinks(&self) -> BTreeSet<String> {
        WIKILINK
            .captures_iter(&self.body)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Result of a note write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new file was created
    Written {
        /// Sanitized title, now in the registry
        title: String,
        /// Path of the created file
        path: PathBuf,
    },
    /// A note with this title already exists
    Skipped {
        /// Sanitized title that collided
        title: String,
    },
}

impl WriteOutcome {
    /// Sanitized title of the note
    pub fn title(&self) -> &str {
        match self {
            Self::Written { title, .. } | Self::Skipped { title } => title,
        }
    }

    /// Whether a file was created
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wikilinks() {
        let note = Note::new(
            "Graph Theory",
            "See [[Graphs]] and [[Trees|rooted trees]], also [[Graphs#Cycles]] and [[ Paths ]].",
        );
        let links: Vec<_> = note.wikilinks().into_iter().collect();
        assert_eq!(links, vec!["Graphs", "Paths", "Trees"]);
    }

    #[test]
    fn test_no_wikilinks() {
        let note = Note::new("Plain", "No links [here] or [[]].");
        assert!(note.wikilinks().is_empty());
    }

    #[test]
    fn test_deserialize_from_model_schema() {
        let note: Note =
            serde_json::from_str(r##"{"title": "Graphs", "note_text": "# Graphs"}"##).unwrap();
        assert_eq!(note, Note::new("Graphs", "# Graphs"));
    }
}
