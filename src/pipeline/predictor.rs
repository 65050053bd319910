//! Symptom normalizer & predictor.
//!
//! Flow for one request:
//! raw entries → alias expansion + normalization → vocabulary filter
//! → multi-hot encoding → classifier → disease label.

use serde::Serialize;
use thiserror::Error;

use super::alias::AliasTable;
use super::normalize::expand_symptoms;
use crate::artifacts::{ArtifactSet, InferenceError};

/// Vocabulary sample size in the "no recognized symptoms" diagnostic.
pub const KNOWN_SYMPTOMS_EXAMPLE_LEN: usize = 20;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("symptoms must be a list of strings")]
    InvalidInput,

    #[error("no recognized symptoms")]
    NoRecognizedSymptoms {
        received: Vec<Option<String>>,
        normalized: Vec<String>,
        known_symptoms_example: Vec<String>,
    },

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),
}

/// Successful prediction, serialized as the `/predict` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub predicted_disease: String,
    pub recognized_symptoms: Vec<String>,
}

/// Extract the `symptoms` field from a JSON request body.
///
/// A missing field is an empty list. Each element must be a string or
/// null; anything else, including a body that isn't a JSON object, is
/// `InvalidInput`.
pub fn parse_symptoms(body: &[u8]) -> Result<Vec<Option<String>>, PredictError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| PredictError::InvalidInput)?;
    let object = value.as_object().ok_or(PredictError::InvalidInput)?;

    let Some(symptoms) = object.get("symptoms") else {
        return Ok(Vec::new());
    };
    let entries = symptoms.as_array().ok_or(PredictError::InvalidInput)?;

    entries
        .iter()
        .map(|entry| match entry {
            serde_json::Value::String(s) => Ok(Some(s.clone())),
            serde_json::Value::Null => Ok(None),
            _ => Err(PredictError::InvalidInput),
        })
        .collect()
}

/// Loaded artifacts plus the validated alias table. Immutable after
/// construction.
#[derive(Debug)]
pub struct Predictor {
    artifacts: ArtifactSet,
    aliases: AliasTable,
}

impl Predictor {
    pub fn new(artifacts: ArtifactSet, aliases: AliasTable) -> Self {
        Self { artifacts, aliases }
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Candidate tokens before the vocabulary filter.
    pub fn normalize(&self, raw: &[Option<String>]) -> Vec<String> {
        expand_symptoms(raw, &self.aliases)
    }

    /// Keep candidates the symptom encoder knows. Order and duplicates kept.
    pub fn recognize(&self, candidates: &[String]) -> Vec<String> {
        let vocabulary = self.artifacts.symptoms();
        candidates
            .iter()
            .filter(|token| vocabulary.contains(token))
            .cloned()
            .collect()
    }

    /// First vocabulary tokens in lexicographic order.
    pub fn known_symptoms_example(&self) -> Vec<String> {
        self.artifacts
            .symptoms()
            .sorted()
            .iter()
            .take(KNOWN_SYMPTOMS_EXAMPLE_LEN)
            .cloned()
            .collect()
    }

    /// Encode recognized tokens as one row, predict, decode the label.
    pub fn classify(&self, recognized: &[String]) -> Result<String, InferenceError> {
        let features = self.artifacts.symptoms().transform(&[recognized]);
        let indices = self.artifacts.classifier().predict(features.view())?;
        let index = match indices.as_slice() {
            [index] => *index,
            other => return Err(InferenceError::UnexpectedBatch(other.len())),
        };
        let mut labels = self.artifacts.diseases().inverse_transform(&[index])?;
        labels.pop().ok_or(InferenceError::UnexpectedBatch(0))
    }

    /// Run the full pipeline on raw request entries.
    pub fn predict(&self, raw: &[Option<String>]) -> Result<Prediction, PredictError> {
        let normalized = self.normalize(raw);
        let recognized = self.recognize(&normalized);

        if recognized.is_empty() {
            return Err(PredictError::NoRecognizedSymptoms {
                received: raw.to_vec(),
                normalized,
                known_symptoms_example: self.known_symptoms_example(),
            });
        }

        let predicted_disease = self.classify(&recognized)?;
        tracing::debug!(
            recognized = recognized.len(),
            disease = %predicted_disease,
            "Prediction complete"
        );

        Ok(Prediction {
            predicted_disease,
            recognized_symptoms: recognized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_aliases, test_predictor, TEST_DISEASES};

    fn raw(entries: &[Option<&str>]) -> Vec<Option<String>> {
        entries.iter().map(|e| e.map(str::to_string)).collect()
    }

    #[test]
    fn canonical_input_passes_filter_unchanged() {
        let predictor = test_predictor();
        let input = vec!["fever".to_string(), "cough".to_string()];
        let normalized = predictor.normalize(&raw(&[Some("fever"), Some("cough")]));
        assert_eq!(normalized, input);
        assert_eq!(predictor.recognize(&normalized), input);
    }

    #[test]
    fn unknown_tokens_dropped_silently() {
        let predictor = test_predictor();
        let prediction = predictor.predict(&raw(&[Some("flying"), Some("cough")])).unwrap();
        assert_eq!(prediction.recognized_symptoms, vec!["cough"]);
        assert!(TEST_DISEASES.contains(&prediction.predicted_disease.as_str()));
    }

    #[test]
    fn joint_pain_and_fatigue_predict_arthritis() {
        let predictor = test_predictor();
        let prediction = predictor
            .predict(&raw(&[Some("joint pain"), Some("fatigue")]))
            .unwrap();
        assert_eq!(prediction.recognized_symptoms, vec!["joint_pain", "fatigue"]);
        assert_eq!(prediction.predicted_disease, "Arthritis");
    }

    #[test]
    fn alias_expansion_reaches_the_classifier() {
        let predictor = test_predictor();
        let prediction = predictor
            .predict(&raw(&[Some("Nausea and Vomiting")]))
            .unwrap();
        assert_eq!(prediction.recognized_symptoms, vec!["nausea", "vomiting"]);
        assert_eq!(prediction.predicted_disease, "Gastroenteritis");
    }

    #[test]
    fn duplicates_survive_the_filter() {
        let predictor = test_predictor();
        let prediction = predictor
            .predict(&raw(&[Some("cough"), Some(" Cough ")]))
            .unwrap();
        assert_eq!(prediction.recognized_symptoms, vec!["cough", "cough"]);
    }

    #[test]
    fn empty_and_falsy_inputs_never_predict() {
        let predictor = test_predictor();
        for input in [raw(&[]), raw(&[Some(""), None])] {
            match predictor.predict(&input) {
                Err(PredictError::NoRecognizedSymptoms { received, .. }) => {
                    assert_eq!(received, input);
                }
                other => panic!("expected NoRecognizedSymptoms, got {other:?}"),
            }
        }
    }

    #[test]
    fn gibberish_returns_diagnostics() {
        let predictor = test_predictor();
        let err = predictor
            .predict(&raw(&[Some("Gibberish Token")]))
            .unwrap_err();
        match err {
            PredictError::NoRecognizedSymptoms {
                received,
                normalized,
                known_symptoms_example,
            } => {
                assert_eq!(received, vec![Some("Gibberish Token".to_string())]);
                assert_eq!(normalized, vec!["gibberish_token"]);
                assert_eq!(known_symptoms_example.len(), KNOWN_SYMPTOMS_EXAMPLE_LEN);
                let mut sorted = known_symptoms_example.clone();
                sorted.sort();
                assert_eq!(known_symptoms_example, sorted);
                assert_eq!(known_symptoms_example[0], "abdominal_pain");
            }
            other => panic!("expected NoRecognizedSymptoms, got {other:?}"),
        }
    }

    #[test]
    fn predicted_disease_always_known() {
        let predictor = test_predictor();
        let vocabulary: Vec<String> = predictor.artifacts().symptoms().classes().to_vec();
        for token in vocabulary {
            let prediction = predictor.predict(&[Some(token)]).unwrap();
            assert!(predictor
                .artifacts()
                .diseases()
                .contains(&prediction.predicted_disease));
        }
    }

    #[test]
    fn aliases_are_the_validated_table() {
        let predictor = test_predictor();
        assert_eq!(predictor.aliases(), &test_aliases());
    }

    #[test]
    fn parse_symptoms_accepts_strings_and_nulls() {
        let parsed = parse_symptoms(br#"{"symptoms": ["cough", null, ""]}"#).unwrap();
        assert_eq!(parsed, vec![Some("cough".into()), None, Some(String::new())]);
    }

    #[test]
    fn parse_symptoms_missing_field_is_empty() {
        assert!(parse_symptoms(br#"{}"#).unwrap().is_empty());
        assert!(parse_symptoms(br#"{"other": 1}"#).unwrap().is_empty());
    }

    #[test]
    fn parse_symptoms_rejects_non_lists() {
        for body in [
            &br#"{"symptoms": "cough"}"#[..],
            br#"{"symptoms": {"a": "cough"}}"#,
            br#"{"symptoms": null}"#,
            br#"{"symptoms": ["cough", 3]}"#,
            br#"{"symptoms": [["cough"]]}"#,
            br#"["cough"]"#,
            b"not json",
            b"",
        ] {
            assert!(
                matches!(parse_symptoms(body), Err(PredictError::InvalidInput)),
                "body {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }
}
