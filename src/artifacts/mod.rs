//! Trained model artifacts: classifier, symptom encoder, disease encoder.
//!
//! All three are produced by an external training process and read once
//! at startup. After `ArtifactSet::load` returns they are never mutated,
//! so they can be shared across request handlers without locking.

pub mod classifier;
pub mod disease_encoder;
pub mod symptom_encoder;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

pub use classifier::{Classifier, ClassifierModel, DecisionTree, LinearModel, RandomForest, TreeNode};
pub use disease_encoder::DiseaseEncoder;
pub use symptom_encoder::SymptomEncoder;

use crate::config::ServiceConfig;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {artifact}: {reason}")]
    Invalid {
        artifact: &'static str,
        reason: String,
    },

    #[error("Artifacts disagree: {0}")]
    Mismatch(String),
}

/// Failures while encoding, predicting, or decoding a single request.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Feature width mismatch: classifier expects {expected}, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("Label index {index} is outside the {known} known diseases")]
    UnknownLabel { index: usize, known: usize },

    #[error("Classifier returned {0} predictions for a single-row batch")]
    UnexpectedBatch(usize),

    #[error("Malformed model: {0}")]
    MalformedModel(String),
}

/// Read and deserialize one JSON artifact file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }
    let raw = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The three loaded artifacts, checked against each other.
pub struct ArtifactSet {
    classifier: Box<dyn Classifier>,
    symptoms: SymptomEncoder,
    diseases: DiseaseEncoder,
}

impl std::fmt::Debug for ArtifactSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactSet")
            .field("n_features", &self.classifier.n_features())
            .field("n_classes", &self.classifier.n_classes())
            .field("vocabulary", &self.symptoms.len())
            .field("diseases", &self.diseases.len())
            .finish()
    }
}

impl ArtifactSet {
    /// Combine already-loaded artifacts.
    ///
    /// The classifier must consume exactly one feature per vocabulary token
    /// and must not predict more classes than the disease encoder can decode.
    pub fn new(
        classifier: Box<dyn Classifier>,
        symptoms: SymptomEncoder,
        diseases: DiseaseEncoder,
    ) -> Result<Self, ArtifactError> {
        if classifier.n_classes() == 0 {
            return Err(ArtifactError::Mismatch(
                "classifier predicts no classes".into(),
            ));
        }
        if classifier.n_features() != symptoms.len() {
            return Err(ArtifactError::Mismatch(format!(
                "classifier expects {} features but the symptom encoder knows {} tokens",
                classifier.n_features(),
                symptoms.len()
            )));
        }
        if classifier.n_classes() > diseases.len() {
            return Err(ArtifactError::Mismatch(format!(
                "classifier predicts {} classes but the disease encoder knows {} labels",
                classifier.n_classes(),
                diseases.len()
            )));
        }
        Ok(Self {
            classifier,
            symptoms,
            diseases,
        })
    }

    /// Load all three artifacts from the configured model directory.
    pub fn load(config: &ServiceConfig) -> Result<Self, ArtifactError> {
        let classifier_path = config.classifier_path();
        let symptoms_path = config.symptom_encoder_path();
        let diseases_path = config.disease_encoder_path();

        let symptoms = SymptomEncoder::from_file(&symptoms_path)?;
        tracing::info!(
            path = %symptoms_path.display(),
            tokens = symptoms.len(),
            "Symptom encoder loaded"
        );

        let diseases = DiseaseEncoder::from_file(&diseases_path)?;
        tracing::info!(
            path = %diseases_path.display(),
            labels = diseases.len(),
            "Disease encoder loaded"
        );

        let model = ClassifierModel::from_file(&classifier_path)?;
        tracing::info!(
            path = %classifier_path.display(),
            kind = model.kind(),
            features = model.n_features(),
            classes = model.n_classes(),
            "Classifier loaded"
        );

        Self::new(Box::new(model), symptoms, diseases)
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn symptoms(&self) -> &SymptomEncoder {
        &self.symptoms
    }

    pub fn diseases(&self) -> &DiseaseEncoder {
        &self.diseases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn config_for(dir: &Path) -> ServiceConfig {
        ServiceConfig {
            model_dir: dir.to_path_buf(),
            ..ServiceConfig::default()
        }
    }

    fn write_valid_artifacts(dir: &Path) {
        write(dir, "symptom_encoder.json", r#"{"classes":["cough","fever","rash"]}"#);
        write(dir, "disease_encoder.json", r#"{"classes":["Flu","Measles"]}"#);
        write(
            dir,
            "disease_model.json",
            r#"{
                "kind": "linear",
                "coef": [[1.0, 1.0, 0.0], [0.0, 0.5, 2.0]],
                "intercept": [0.0, 0.0]
            }"#,
        );
    }

    #[test]
    fn loads_consistent_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        write_valid_artifacts(tmp.path());

        let set = ArtifactSet::load(&config_for(tmp.path())).unwrap();
        assert_eq!(set.symptoms().len(), 3);
        assert_eq!(set.diseases().len(), 2);
        assert_eq!(set.classifier().n_features(), 3);
        assert_eq!(set.classifier().n_classes(), 2);
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        write_valid_artifacts(tmp.path());
        fs::remove_file(tmp.path().join("disease_model.json")).unwrap();

        let err = ArtifactSet::load(&config_for(tmp.path())).unwrap_err();
        match err {
            ArtifactError::NotFound(path) => assert!(path.ends_with("disease_model.json")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_valid_artifacts(tmp.path());
        write(tmp.path(), "disease_encoder.json", "{not json");

        let err = ArtifactSet::load(&config_for(tmp.path())).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { .. }));
        assert!(err.to_string().contains("disease_encoder.json"));
    }

    #[test]
    fn feature_width_must_match_vocabulary() {
        let tmp = tempfile::tempdir().unwrap();
        write_valid_artifacts(tmp.path());
        write(
            tmp.path(),
            "symptom_encoder.json",
            r#"{"classes":["cough","fever","rash","sneezing"]}"#,
        );

        let err = ArtifactSet::load(&config_for(tmp.path())).unwrap_err();
        assert!(matches!(err, ArtifactError::Mismatch(_)));
    }

    #[test]
    fn classifier_cannot_outgrow_disease_labels() {
        let tmp = tempfile::tempdir().unwrap();
        write_valid_artifacts(tmp.path());
        write(tmp.path(), "disease_encoder.json", r#"{"classes":["Flu"]}"#);

        let err = ArtifactSet::load(&config_for(tmp.path())).unwrap_err();
        assert!(err.to_string().contains("disease encoder knows 1 labels"));
    }

    #[test]
    fn zero_class_tree_aborts_load() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "symptom_encoder.json", r#"{"classes":["cough"]}"#);
        write(tmp.path(), "disease_encoder.json", r#"{"classes":["Flu"]}"#);
        write(
            tmp.path(),
            "disease_model.json",
            r#"{"kind":"decision_tree","n_features":1,"n_classes":0,"nodes":[{"value":[]}]}"#,
        );

        let err = ArtifactSet::load(&config_for(tmp.path())).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::Invalid {
                artifact: "decision tree",
                ..
            }
        ));
    }

    struct NoClasses;

    impl Classifier for NoClasses {
        fn n_features(&self) -> usize {
            1
        }

        fn n_classes(&self) -> usize {
            0
        }

        fn predict(
            &self,
            features: ndarray::ArrayView2<'_, f32>,
        ) -> Result<Vec<usize>, InferenceError> {
            Ok(vec![0; features.nrows()])
        }
    }

    #[test]
    fn classifier_without_classes_is_rejected() {
        let err = ArtifactSet::new(
            Box::new(NoClasses),
            SymptomEncoder::new(vec!["cough".into()]).unwrap(),
            DiseaseEncoder::new(vec!["Flu".into()]).unwrap(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("predicts no classes"));
    }

    #[test]
    fn unknown_classifier_kind_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_valid_artifacts(tmp.path());
        write(tmp.path(), "disease_model.json", r#"{"kind":"svm"}"#);

        let err = ArtifactSet::load(&config_for(tmp.path())).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { .. }));
    }
}
