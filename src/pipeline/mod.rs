//! Request pipeline: alias expansion, normalization, vocabulary filter,
//! encoding, prediction, decoding.

pub mod alias;
pub mod normalize;
pub mod predictor;

pub use alias::{AliasError, AliasTable, StaleAlias};
pub use predictor::{parse_symptoms, PredictError, Prediction, Predictor};
