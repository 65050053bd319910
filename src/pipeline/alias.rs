//! Alias table: user-facing symptom phrases → canonical vocabulary tokens.
//!
//! One phrase may expand to several tokens ("nausea and vomiting" →
//! `nausea`, `vomiting`). The table is versioned and ships with a built-in
//! default; an override file with the same JSON shape can replace it:
//!
//! ```json
//! { "version": 2, "aliases": { "throwing up": ["vomiting"] } }
//! ```
//!
//! At startup the table is checked against the encoder vocabulary. Stale
//! targets are pruned with a warning, or rejected outright in strict mode.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::artifacts::SymptomEncoder;

/// Version of the built-in alias table.
pub const DEFAULT_ALIAS_VERSION: u32 = 1;

/// Built-in alias table. Keys are lowercase, space-separated phrases.
/// Phrases that already become a canonical token after underscoring
/// (e.g. "joint pain") do not need an entry.
const DEFAULT_ALIASES: &[(&str, &[&str])] = &[
    ("aching joints", &["joint_pain"]),
    ("acne", &["pus_filled_pimples", "blackheads"]),
    ("anxious", &["anxiety"]),
    ("back ache", &["back_pain"]),
    ("backache", &["back_pain"]),
    ("belly ache", &["belly_pain"]),
    ("bloating", &["distention_of_abdomen"]),
    ("blocked nose", &["congestion"]),
    ("blurred vision", &["blurred_and_distorted_vision"]),
    ("blurry vision", &["blurred_and_distorted_vision"]),
    ("body aches", &["muscle_pain"]),
    ("body pain", &["muscle_pain"]),
    ("burning urination", &["burning_micturition"]),
    ("chills and shivering", &["chills", "shivering"]),
    ("cold hands and feet", &["cold_hands_and_feets"]),
    ("cold sweats", &["sweating", "chills"]),
    ("constipated", &["constipation"]),
    ("coughing blood", &["blood_in_sputum"]),
    ("depressed", &["depression"]),
    ("diarrhea", &["diarrhoea"]),
    ("difficulty breathing", &["breathlessness"]),
    ("dizzy", &["dizziness"]),
    ("exhaustion", &["fatigue"]),
    ("fever and chills", &["high_fever", "chills"]),
    ("frequent urination", &["polyuria"]),
    ("gaining weight", &["weight_gain"]),
    ("gas", &["passage_of_gases"]),
    ("headaches", &["headache"]),
    ("heart palpitations", &["palpitations"]),
    ("heartburn", &["acidity"]),
    ("high temperature", &["high_fever"]),
    ("itchy skin", &["itching"]),
    ("jaundice", &["yellowish_skin", "yellowing_of_eyes"]),
    ("lightheaded", &["dizziness"]),
    ("loose motions", &["diarrhoea"]),
    ("losing weight", &["weight_loss"]),
    ("low grade fever", &["mild_fever"]),
    ("migraine", &["headache"]),
    ("nausea and vomiting", &["nausea", "vomiting"]),
    ("no appetite", &["loss_of_appetite"]),
    ("painful urination", &["burning_micturition"]),
    ("pimples", &["pus_filled_pimples"]),
    ("poor appetite", &["loss_of_appetite"]),
    ("puffy face", &["puffy_face_and_eyes"]),
    ("racing heart", &["fast_heart_rate"]),
    ("rash", &["skin_rash"]),
    ("red eyes", &["redness_of_eyes"]),
    ("shortness of breath", &["breathlessness"]),
    ("sneezing", &["continuous_sneezing"]),
    ("sore throat", &["throat_irritation"]),
    ("stomach ache", &["stomach_pain"]),
    ("stuffy nose", &["congestion"]),
    ("swollen glands", &["swelled_lymph_nodes"]),
    ("swollen joints", &["swelling_joints"]),
    ("swollen lymph nodes", &["swelled_lymph_nodes"]),
    ("throwing up", &["vomiting"]),
    ("tired", &["fatigue"]),
    ("tiredness", &["fatigue"]),
    ("trouble concentrating", &["lack_of_concentration"]),
    ("tummy ache", &["abdominal_pain"]),
    ("vertigo", &["spinning_movements"]),
    ("vomiting and diarrhea", &["vomiting", "diarrhoea"]),
    ("watery eyes", &["watering_from_eyes"]),
    ("yellow eyes", &["yellowing_of_eyes"]),
    ("yellow skin", &["yellowish_skin"]),
];

#[derive(Error, Debug)]
pub enum AliasError {
    #[error("Failed to read alias table {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse alias table {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Alias phrase is empty")]
    EmptyPhrase,

    #[error("Alias {0:?} appears more than once after normalization")]
    DuplicatePhrase(String),

    #[error("Alias {0:?} has no target tokens")]
    NoTargets(String),

    #[error("{} alias target(s) missing from the symptom vocabulary: {}", .0.len(), format_stale(.0))]
    Stale(Vec<StaleAlias>),
}

/// An alias target the encoder doesn't know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleAlias {
    pub phrase: String,
    pub token: String,
}

fn format_stale(stale: &[StaleAlias]) -> String {
    stale
        .iter()
        .map(|s| format!("{:?} -> {:?}", s.phrase, s.token))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Deserialize)]
struct AliasFile {
    version: u32,
    aliases: BTreeMap<String, Vec<String>>,
}

/// Versioned phrase → token mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    pub version: u32,
    aliases: BTreeMap<String, Vec<String>>,
}

impl AliasTable {
    /// The table compiled into the binary.
    pub fn builtin() -> Self {
        let aliases = DEFAULT_ALIASES
            .iter()
            .map(|(phrase, tokens)| {
                (
                    (*phrase).to_string(),
                    tokens.iter().map(|t| (*t).to_string()).collect(),
                )
            })
            .collect();
        Self {
            version: DEFAULT_ALIAS_VERSION,
            aliases,
        }
    }

    /// Build a table from raw entries. Phrases are trimmed and lowercased.
    pub fn from_entries<I, P, T>(version: u32, entries: I) -> Result<Self, AliasError>
    where
        I: IntoIterator<Item = (P, Vec<T>)>,
        P: AsRef<str>,
        T: Into<String>,
    {
        let mut aliases = BTreeMap::new();
        for (phrase, tokens) in entries {
            let phrase = phrase.as_ref().trim().to_lowercase();
            if phrase.is_empty() {
                return Err(AliasError::EmptyPhrase);
            }
            let tokens: Vec<String> = tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect();
            if tokens.is_empty() {
                return Err(AliasError::NoTargets(phrase));
            }
            if aliases.contains_key(&phrase) {
                return Err(AliasError::DuplicatePhrase(phrase));
            }
            aliases.insert(phrase, tokens);
        }
        Ok(Self { version, aliases })
    }

    /// Load an override table from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, AliasError> {
        let raw = std::fs::read(path).map_err(|source| AliasError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: AliasFile = serde_json::from_slice(&raw).map_err(|source| AliasError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_entries(file.version, file.aliases)
    }

    /// Tokens for an already-normalized phrase.
    pub fn get(&self, phrase: &str) -> Option<&[String]> {
        self.aliases.get(phrase).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Every (phrase, token) pair whose token is not in the vocabulary.
    pub fn stale_targets(&self, vocabulary: &SymptomEncoder) -> Vec<StaleAlias> {
        self.iter()
            .flat_map(|(phrase, tokens)| {
                tokens
                    .iter()
                    .filter(move |t| !vocabulary.contains(t))
                    .map(move |t| StaleAlias {
                        phrase: phrase.to_string(),
                        token: t.clone(),
                    })
            })
            .collect()
    }

    /// Check the table against the vocabulary.
    ///
    /// Strict: any stale target is an error. Otherwise stale targets are
    /// dropped, aliases left without targets are removed, and the pruned
    /// pairs are returned alongside the table.
    pub fn validated(
        mut self,
        vocabulary: &SymptomEncoder,
        strict: bool,
    ) -> Result<(Self, Vec<StaleAlias>), AliasError> {
        let stale = self.stale_targets(vocabulary);
        if stale.is_empty() {
            return Ok((self, stale));
        }
        if strict {
            return Err(AliasError::Stale(stale));
        }

        for entry in &stale {
            tracing::warn!(
                alias = %entry.phrase,
                token = %entry.token,
                "Alias target missing from symptom vocabulary, dropping"
            );
        }
        self.aliases.retain(|_, tokens| {
            tokens.retain(|t| vocabulary.contains(t));
            !tokens.is_empty()
        });
        Ok((self, stale))
    }
}
