//! Multi-label binarizer over the symptom vocabulary.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use ndarray::Array2;
use serde::Deserialize;

use super::{read_json, ArtifactError};

#[derive(Deserialize)]
struct EncoderFile {
    classes: Vec<String>,
}

/// Fixed, ordered symptom vocabulary. Position `i` of every multi-hot
/// vector corresponds to `classes()[i]`.
#[derive(Debug, Clone)]
pub struct SymptomEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
    sorted: Vec<String>,
}

impl SymptomEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ArtifactError> {
        if classes.is_empty() {
            return Err(ArtifactError::Invalid {
                artifact: "symptom encoder",
                reason: "vocabulary is empty".into(),
            });
        }

        let mut index = HashMap::with_capacity(classes.len());
        for (i, token) in classes.iter().enumerate() {
            if index.insert(token.clone(), i).is_some() {
                return Err(ArtifactError::Invalid {
                    artifact: "symptom encoder",
                    reason: format!("duplicate token {token:?}"),
                });
            }
        }

        let mut sorted = classes.clone();
        sorted.sort();

        Ok(Self {
            classes,
            index,
            sorted,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ArtifactError> {
        let file: EncoderFile = read_json(path)?;
        Self::new(file.classes)
    }

    /// Vocabulary in encoder (column) order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Vocabulary in lexicographic order.
    pub fn sorted(&self) -> &[String] {
        &self.sorted
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Encode a batch of token lists as multi-hot rows.
    ///
    /// Tokens outside the vocabulary are ignored. Repeated tokens set the
    /// same column once.
    pub fn transform<R, S>(&self, batch: &[R]) -> Array2<f32>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut features = Array2::<f32>::zeros((batch.len(), self.classes.len()));
        let mut unknown: HashSet<&str> = HashSet::new();

        for (row, tokens) in batch.iter().enumerate() {
            for token in tokens.as_ref() {
                let token = token.as_ref();
                match self.index.get(token) {
                    Some(&col) => features[[row, col]] = 1.0,
                    None => {
                        unknown.insert(token);
                    }
                }
            }
        }

        if !unknown.is_empty() {
            tracing::debug!(?unknown, "Ignoring tokens outside the symptom vocabulary");
        }
        features
    }
}
