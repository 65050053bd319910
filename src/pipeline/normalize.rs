//! Raw symptom entries → candidate vocabulary tokens.

use super::alias::AliasTable;

/// Trim surrounding whitespace and lowercase.
pub fn normalize_phrase(entry: &str) -> String {
    entry.trim().to_lowercase()
}

/// Canonical token form of a normalized phrase: every space becomes `_`.
pub fn to_token(phrase: &str) -> String {
    phrase.replace(' ', "_")
}

/// Expand raw entries into candidate tokens.
///
/// Null and empty entries are skipped. Each remaining entry is normalized;
/// an alias contributes all of its tokens in table order, anything else
/// contributes its underscored form. Input order is kept and duplicates
/// are not removed. Whitespace-only entries are not skipped: they become
/// `""` here and never match the vocabulary later.
pub fn expand_symptoms(raw: &[Option<String>], aliases: &AliasTable) -> Vec<String> {
    let mut candidates = Vec::with_capacity(raw.len());
    for entry in raw.iter().flatten() {
        if entry.is_empty() {
            continue;
        }
        let phrase = normalize_phrase(entry);
        match aliases.get(&phrase) {
            Some(tokens) => candidates.extend(tokens.iter().cloned()),
            None => candidates.push(to_token(&phrase)),
        }
    }
    candidates
}
