//! Name and text normalization shared by the matcher, the category map
//! and the cache.

/// Legal-form suffixes stripped before comparing company names.
const LEGAL_FORM_SUFFIXES: &[&str] = &[
    "asa", "as", "ans", "da", "enk", "sa", "ba", "nuf", "ks", "iks", "se", "ab", "oy", "aps",
    "gmbh", "ltd", "inc", "llc", "plc",
];

/// Cache key form of a company name: lowercase, trimmed, internal
/// whitespace collapsed to single spaces.
pub fn cache_key(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase alphanumeric tokens. Anything that is not a letter or digit
/// (including `&`, `-`, `.`) separates tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokens of a company name with one trailing legal-form suffix removed.
///
/// The suffix is kept when it is the only token, so `"AS"` alone does not
/// normalize to nothing.
pub fn company_tokens(raw: &str) -> Vec<String> {
    let mut tokens = tokenize(raw);
    if tokens.len() > 1 {
        if let Some(last) = tokens.last() {
            if LEGAL_FORM_SUFFIXES.contains(&last.as_str()) {
                tokens.pop();
            }
        }
    }
    tokens
}
