use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

// Maximal runs of letters and digits; everything else separates tokens.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("token pattern is valid"));

/// Unique lowercase tokens of a piece of indexed text.
pub fn tokenize_text(text: &str) -> HashSet<String> {
    TOKEN
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Query tokens in order of first appearance, without duplicates.
pub fn tokenize_query(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    TOKEN
        .find_iter(&query.to_lowercase())
        .map(|m| m.as_str().to_string())
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

/// Adds the tokens of every string, number and boolean leaf of a JSON document.
pub fn tokenize_document(value: &Value, tokens: &mut HashSet<String>) {
    match value {
        Value::String(s) => tokens.extend(tokenize_text(s)),
        Value::Number(n) => tokens.extend(tokenize_text(&n.to_string())),
        Value::Bool(b) => {
            tokens.insert(b.to_string());
        }
        Value::Array(items) => items.iter().for_each(|v| tokenize_document(v, tokens)),
        Value::Object(fields) => fields.values().for_each(|v| tokenize_document(v, tokens)),
        Value::Null => {}
    }
}
