//! Label vocabulary pinned alongside the model artifact
//!
//! The ordering must match the model's training-time label order exactly;
//! a mismatch silently produces wrong labels with no runtime error, which
//! is why the vocabulary ships as a JSON sidecar next to the model file.

use anyhow::{Context, Result};
use std::path::Path;

/// Training-time label order of the bundled doodle classifier
pub const DEFAULT_LABELS: [&str; 16] = [
    "circle",
    "square",
    "triangle",
    "star",
    "axis",
    "bat",
    "car",
    "cat",
    "eyeglasses",
    "moon",
    "sailboat",
    "dog",
    "tree",
    "cloud",
    "house",
    "other",
];

/// Fixed, ordered set of class names the classifier can output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LabelVocabulary {
    /// Build a vocabulary from an explicit ordered label list
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Load the vocabulary from a JSON array sidecar file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read label file {:?}", path))?;
        let labels: Vec<String> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse label file {:?}", path))?;
        anyhow::ensure!(!labels.is_empty(), "Label file {:?} is empty", path);
        Ok(Self { labels })
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the vocabulary is empty
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label name at a class index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// All labels in training order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
