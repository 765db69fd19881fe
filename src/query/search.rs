//! Full-text search term compilation.
//!
//! A raw search term is reduced to plain word tokens and rendered as a prefix
//! `tsquery` (`'foo':* & 'bar':*`). Anything outside `[A-Za-z0-9_]` (quotes,
//! backslashes, tsquery operators, SQL comment markers) separates tokens and
//! never reaches the store. The compiled text is always bound as a parameter.

pub const TEXT_SEARCH_CONFIG: &str = "english";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<String>,
}

impl SearchQuery {
    /// Returns `None` when nothing searchable is left after normalisation.
    pub fn compile(raw: &str) -> Option<Self> {
        let terms: Vec<String> = raw
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();

        if terms.is_empty() {
            None
        } else {
            Some(Self { terms })
        }
    }

    /// Text handed to `to_tsquery`.
    pub fn to_tsquery(&self) -> String {
        self.terms
            .iter()
            .map(|t| format!("'{}':*", t))
            .collect::<Vec<_>>()
            .join(" & ")
    }
}
