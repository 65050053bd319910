//! Vocabulary listing, for clients that offer a symptom pick list.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct SymptomsResponse {
    /// Full vocabulary, lexicographic order.
    pub symptoms: Vec<String>,
    pub alias_version: u32,
    /// Effective aliases after startup validation.
    pub aliases: BTreeMap<String, Vec<String>>,
}

/// `GET /symptoms`: recognized tokens and the alias table.
pub async fn list(State(ctx): State<ApiContext>) -> Json<SymptomsResponse> {
    let predictor = ctx.core.predictor();
    let aliases = predictor.aliases();

    Json(SymptomsResponse {
        symptoms: predictor.artifacts().symptoms().sorted().to_vec(),
        alias_version: aliases.version,
        aliases: aliases
            .iter()
            .map(|(phrase, tokens)| (phrase.to_string(), tokens.to_vec()))
            .collect(),
    })
}
