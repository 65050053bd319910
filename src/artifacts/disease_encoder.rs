//! Label encoder mapping classifier output indices to disease names.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::{read_json, ArtifactError, InferenceError};

#[derive(Deserialize)]
struct EncoderFile {
    classes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DiseaseEncoder {
    classes: Vec<String>,
}

impl DiseaseEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ArtifactError> {
        if classes.is_empty() {
            return Err(ArtifactError::Invalid {
                artifact: "disease encoder",
                reason: "label set is empty".into(),
            });
        }
        let mut seen = HashSet::with_capacity(classes.len());
        if let Some(dup) = classes.iter().find(|label| !seen.insert(label.as_str())) {
            return Err(ArtifactError::Invalid {
                artifact: "disease encoder",
                reason: format!("duplicate label {dup:?}"),
            });
        }
        Ok(Self { classes })
    }

    pub fn from_file(path: &Path) -> Result<Self, ArtifactError> {
        let file: EncoderFile = read_json(path)?;
        Self::new(file.classes)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.classes.iter().any(|c| c == label)
    }

    /// Decode a batch of label indices. Fails on the first unseen index.
    pub fn inverse_transform(&self, indices: &[usize]) -> Result<Vec<String>, InferenceError> {
        indices
            .iter()
            .map(|&index| {
                self.classes
                    .get(index)
                    .cloned()
                    .ok_or(InferenceError::UnknownLabel {
                        index,
                        known: self.classes.len(),
                    })
            })
            .collect()
    }
}
