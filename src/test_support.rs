//! Shared fixtures for unit tests: a small vocabulary, a linear model
//! that maps each symptom group to one disease, and helpers to write the
//! same artifacts to disk.

use std::path::Path;
use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView2};

use crate::artifacts::{
    ArtifactSet, Classifier, DiseaseEncoder, InferenceError, LinearModel, SymptomEncoder,
};
use crate::core_state::CoreState;
use crate::pipeline::{AliasTable, Predictor};

pub(crate) const TEST_DISEASES: &[&str] =
    &["Arthritis", "Common Cold", "Fungal infection", "Gastroenteritis"];

/// Vocabulary in encoder order, with the disease index each token votes for.
pub(crate) const TEST_VOCABULARY: &[(&str, usize)] = &[
    ("itching", 2),
    ("skin_rash", 2),
    ("continuous_sneezing", 1),
    ("chills", 1),
    ("joint_pain", 0),
    ("stomach_pain", 3),
    ("vomiting", 3),
    ("fatigue", 0),
    ("cough", 1),
    ("high_fever", 1),
    ("fever", 1),
    ("breathlessness", 1),
    ("sweating", 1),
    ("headache", 1),
    ("nausea", 3),
    ("loss_of_appetite", 3),
    ("abdominal_pain", 3),
    ("diarrhoea", 3),
    ("mild_fever", 1),
    ("congestion", 1),
    ("runny_nose", 1),
    ("throat_irritation", 1),
    ("muscle_pain", 0),
    ("swelling_joints", 0),
    ("knee_pain", 0),
];

pub(crate) fn test_symptom_encoder() -> SymptomEncoder {
    SymptomEncoder::new(TEST_VOCABULARY.iter().map(|(t, _)| t.to_string()).collect())
        .expect("test vocabulary")
}

pub(crate) fn test_disease_encoder() -> DiseaseEncoder {
    DiseaseEncoder::new(TEST_DISEASES.iter().map(|d| d.to_string()).collect())
        .expect("test diseases")
}

fn test_weights() -> Array2<f32> {
    let mut coef = Array2::<f32>::zeros((TEST_DISEASES.len(), TEST_VOCABULARY.len()));
    for (col, (_, class)) in TEST_VOCABULARY.iter().enumerate() {
        coef[[*class, col]] = 1.0;
    }
    coef
}

pub(crate) fn test_classifier() -> LinearModel {
    LinearModel::new(test_weights(), Array1::zeros(TEST_DISEASES.len())).expect("test model")
}

pub(crate) fn test_artifacts() -> ArtifactSet {
    ArtifactSet::new(
        Box::new(test_classifier()),
        test_symptom_encoder(),
        test_disease_encoder(),
    )
    .expect("test artifacts")
}

/// Built-in aliases pruned to the test vocabulary.
pub(crate) fn test_aliases() -> AliasTable {
    AliasTable::builtin()
        .validated(&test_symptom_encoder(), false)
        .expect("non-strict validation")
        .0
}

pub(crate) fn test_predictor() -> Predictor {
    Predictor::new(test_artifacts(), test_aliases())
}

pub(crate) fn test_core() -> Arc<CoreState> {
    Arc::new(CoreState::new(test_predictor()))
}

/// Claims one class but predicts an index the disease encoder can't decode.
pub(crate) struct UndecodableClassifier;

impl Classifier for UndecodableClassifier {
    fn n_features(&self) -> usize {
        TEST_VOCABULARY.len()
    }

    fn n_classes(&self) -> usize {
        1
    }

    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Vec<usize>, InferenceError> {
        Ok(vec![TEST_DISEASES.len() + 5; features.nrows()])
    }
}

pub(crate) fn failing_core() -> Arc<CoreState> {
    let artifacts = ArtifactSet::new(
        Box::new(UndecodableClassifier),
        test_symptom_encoder(),
        test_disease_encoder(),
    )
    .expect("failing artifacts");
    Arc::new(CoreState::new(Predictor::new(artifacts, test_aliases())))
}

/// Write the test artifacts as JSON files into `dir`.
pub(crate) fn write_test_artifacts(dir: &Path) {
    let classes: Vec<&str> = TEST_VOCABULARY.iter().map(|(t, _)| *t).collect();
    let coef: Vec<Vec<f32>> = test_weights().outer_iter().map(|r| r.to_vec()).collect();

    std::fs::write(
        dir.join(crate::config::SYMPTOM_ENCODER_FILE),
        serde_json::json!({ "classes": classes }).to_string(),
    )
    .expect("write symptom encoder");
    std::fs::write(
        dir.join(crate::config::DISEASE_ENCODER_FILE),
        serde_json::json!({ "classes": TEST_DISEASES }).to_string(),
    )
    .expect("write disease encoder");
    std::fs::write(
        dir.join(crate::config::CLASSIFIER_FILE),
        serde_json::json!({
            "kind": "linear",
            "coef": coef,
            "intercept": vec![0.0f32; TEST_DISEASES.len()],
        })
        .to_string(),
    )
    .expect("write classifier");
}
