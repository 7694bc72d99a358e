use codeharvest_common::NormalizeRules;

/// Canonicalize a raw candidate: decode entities, trim, uppercase, keep only
/// `A-Z 0-9 _ !`. No length check.
pub fn canonicalize(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    decoded
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '_' || *c == '!')
        .collect()
}

/// Decides which candidates become codes. Rejection is `None`, never an error.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rules: NormalizeRules,
}

impl Normalizer {
    pub fn new(rules: NormalizeRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &NormalizeRules {
        &self.rules
    }

    pub fn normalize(&self, raw: &str) -> Option<String> {
        let code = canonicalize(raw);
        // ASCII only from here on, so len() is the char count
        let len = code.len();
        if len < self.rules.min_len || len > self.rules.max_len {
            return None;
        }
        if self.rules.require_alpha_first && !code.starts_with(|c: char| c.is_ascii_uppercase()) {
            return None;
        }
        Some(code)
    }
}
