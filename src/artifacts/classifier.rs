//! Disease classifier.
//!
//! `Classifier` is the seam between the request pipeline and whatever
//! trained model is on disk. The serialized form (`disease_model.json`)
//! is one of three model kinds, tagged by `"kind"`:
//!
//! - `linear`: one weight row + intercept per class, argmax of scores
//! - `decision_tree`: binary tree, `x[feature] <= threshold` goes left
//! - `random_forest`: mean of per-tree leaf distributions, then argmax
//!
//! Ties resolve to the lowest class index.

use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::Deserialize;

use super::{read_json, ArtifactError, InferenceError};

/// A trained model mapping multi-hot symptom rows to class indices.
pub trait Classifier: Send + Sync {
    /// Width of each feature row.
    fn n_features(&self) -> usize;

    /// Number of distinct class indices the model can emit.
    fn n_classes(&self) -> usize;

    /// Predict one class index per row.
    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Vec<usize>, InferenceError>;
}

fn check_width(expected: usize, features: &ArrayView2<'_, f32>) -> Result<(), InferenceError> {
    if features.ncols() != expected {
        return Err(InferenceError::FeatureMismatch {
            expected,
            actual: features.ncols(),
        });
    }
    Ok(())
}

/// Index of the first maximum. NaN entries never win.
fn argmax<I: IntoIterator<Item = f32>>(values: I) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, v) in values.into_iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

// ═══════════════════════════════════════════════════════════
// Linear model
// ═══════════════════════════════════════════════════════════

#[derive(Deserialize)]
struct LinearParams {
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
}

/// One-vs-rest linear model: `scores = X · coefᵀ + intercept`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "LinearParams")]
pub struct LinearModel {
    coef: Array2<f32>,
    intercept: Array1<f32>,
}

impl TryFrom<LinearParams> for LinearModel {
    type Error = String;

    fn try_from(params: LinearParams) -> Result<Self, Self::Error> {
        let n_classes = params.coef.len();
        let n_features = params.coef.first().map(Vec::len).unwrap_or(0);
        if n_classes == 0 || n_features == 0 {
            return Err("linear model needs at least one class and one feature".into());
        }
        if let Some(row) = params.coef.iter().position(|r| r.len() != n_features) {
            return Err(format!(
                "coef row {row} has {} weights, expected {n_features}",
                params.coef[row].len()
            ));
        }
        if params.intercept.len() != n_classes {
            return Err(format!(
                "intercept has {} entries, expected {n_classes}",
                params.intercept.len()
            ));
        }

        let flat: Vec<f32> = params.coef.into_iter().flatten().collect();
        let coef = Array2::from_shape_vec((n_classes, n_features), flat)
            .map_err(|e| e.to_string())?;
        Ok(Self {
            coef,
            intercept: Array1::from(params.intercept),
        })
    }
}

impl LinearModel {
    /// `coef` is `(n_classes, n_features)`, `intercept` is `(n_classes,)`.
    pub fn new(coef: Array2<f32>, intercept: Array1<f32>) -> Result<Self, ArtifactError> {
        if coef.nrows() == 0 || coef.ncols() == 0 || intercept.len() != coef.nrows() {
            return Err(ArtifactError::Invalid {
                artifact: "linear classifier",
                reason: format!(
                    "coef shape {:?} does not fit intercept length {}",
                    coef.shape(),
                    intercept.len()
                ),
            });
        }
        Ok(Self { coef, intercept })
    }
}

impl Classifier for LinearModel {
    fn n_features(&self) -> usize {
        self.coef.ncols()
    }

    fn n_classes(&self) -> usize {
        self.coef.nrows()
    }

    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Vec<usize>, InferenceError> {
        check_width(self.n_features(), &features)?;
        let mut scores = features.dot(&self.coef.t());
        scores += &self.intercept;

        scores
            .axis_iter(Axis(0))
            .map(|row| {
                argmax(row.iter().copied())
                    .ok_or_else(|| InferenceError::MalformedModel("no finite class score".into()))
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════
// Trees
// ═══════════════════════════════════════════════════════════

/// One node of a flattened binary tree. Children always come after
/// their parent in the node array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Per-class sample counts or probabilities.
        value: Vec<f32>,
    },
}

fn validate_nodes(
    nodes: &[TreeNode],
    n_features: usize,
    n_classes: usize,
) -> Result<(), String> {
    if n_features == 0 || n_classes == 0 {
        return Err(format!(
            "model needs at least one feature and one class, got {n_features} and {n_classes}"
        ));
    }
    if nodes.is_empty() {
        return Err("tree has no nodes".into());
    }
    for (i, node) in nodes.iter().enumerate() {
        match node {
            TreeNode::Split {
                feature,
                left,
                right,
                ..
            } => {
                if *feature >= n_features {
                    return Err(format!(
                        "node {i} splits on feature {feature}, model has {n_features}"
                    ));
                }
                for child in [*left, *right] {
                    if child <= i || child >= nodes.len() {
                        return Err(format!("node {i} has invalid child index {child}"));
                    }
                }
            }
            TreeNode::Leaf { value } => {
                if value.len() != n_classes {
                    return Err(format!(
                        "leaf {i} has {} class values, expected {n_classes}",
                        value.len()
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Walk one row down the tree and return the leaf's class values.
fn leaf_value<'a>(
    nodes: &'a [TreeNode],
    row: ArrayView1<'_, f32>,
) -> Result<&'a [f32], InferenceError> {
    let mut idx = 0;
    loop {
        let node = nodes
            .get(idx)
            .ok_or_else(|| InferenceError::MalformedModel(format!("missing tree node {idx}")))?;
        match node {
            TreeNode::Leaf { value } => return Ok(value.as_slice()),
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let x = row.get(*feature).copied().ok_or_else(|| {
                    InferenceError::MalformedModel(format!("feature {feature} out of range"))
                })?;
                let next = if x <= *threshold { *left } else { *right };
                if next <= idx {
                    return Err(InferenceError::MalformedModel(format!(
                        "tree node {idx} points back to {next}"
                    )));
                }
                idx = next;
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    pub n_classes: usize,
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        validate_nodes(&self.nodes, self.n_features, self.n_classes).map_err(|reason| {
            ArtifactError::Invalid {
                artifact: "decision tree",
                reason,
            }
        })
    }
}

impl Classifier for DecisionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Vec<usize>, InferenceError> {
        check_width(self.n_features, &features)?;
        features
            .axis_iter(Axis(0))
            .map(|row| {
                let value = leaf_value(&self.nodes, row)?;
                argmax(value.iter().copied())
                    .ok_or_else(|| InferenceError::MalformedModel("empty leaf".into()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<Vec<TreeNode>>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.trees.is_empty() {
            return Err(ArtifactError::Invalid {
                artifact: "random forest",
                reason: "forest has no trees".into(),
            });
        }
        for (t, nodes) in self.trees.iter().enumerate() {
            validate_nodes(nodes, self.n_features, self.n_classes).map_err(|reason| {
                ArtifactError::Invalid {
                    artifact: "random forest",
                    reason: format!("tree {t}: {reason}"),
                }
            })?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Vec<usize>, InferenceError> {
        check_width(self.n_features, &features)?;
        features
            .axis_iter(Axis(0))
            .map(|row| {
                let mut proba = Array1::<f32>::zeros(self.n_classes);
                for nodes in &self.trees {
                    let value = ArrayView1::from(leaf_value(nodes, row)?);
                    let total = value.sum();
                    if total > 0.0 {
                        proba.scaled_add(1.0 / total, &value);
                    } else {
                        proba += &value;
                    }
                }
                argmax(proba.iter().copied())
                    .ok_or_else(|| InferenceError::MalformedModel("empty forest vote".into()))
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════
// Serialized model
// ═══════════════════════════════════════════════════════════

/// The classifier as stored in `disease_model.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    Linear(LinearModel),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl ClassifierModel {
    pub fn from_file(path: &Path) -> Result<Self, ArtifactError> {
        let model: Self = read_json(path)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            ClassifierModel::Linear(_) => Ok(()),
            ClassifierModel::DecisionTree(tree) => tree.validate(),
            ClassifierModel::RandomForest(forest) => forest.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierModel::Linear(_) => "linear",
            ClassifierModel::DecisionTree(_) => "decision_tree",
            ClassifierModel::RandomForest(_) => "random_forest",
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            ClassifierModel::Linear(m) => m,
            ClassifierModel::DecisionTree(m) => m,
            ClassifierModel::RandomForest(m) => m,
        }
    }
}

impl Classifier for ClassifierModel {
    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn n_classes(&self) -> usize {
        self.inner().n_classes()
    }

    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Vec<usize>, InferenceError> {
        self.inner().predict(features)
    }
}
