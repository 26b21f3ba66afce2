// metadata.rs - Header tokenizer producing typed sequence metadata

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::data::country::{CountryNormalizer, UNKNOWN};

static YEAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(19|20)\d{2}(-\d{2}){0,2}$").expect("static regex"));

/// Metadata derived from a free-form sequence header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceMetadata {
    /// Country token as it appeared in the header, before normalization
    pub raw_country: Option<String>,
    pub country: String,
    pub continent: String,
    pub year: Option<u16>,
    pub subgenotype: Option<String>,
}

impl SequenceMetadata {
    pub fn unknown() -> Self {
        Self {
            raw_country: None,
            country: UNKNOWN.to_string(),
            continent: UNKNOWN.to_string(),
            year: None,
            subgenotype: None,
        }
    }

    pub fn has_known_country(&self) -> bool {
        self.country != UNKNOWN
    }

    /// Year as printed in group names and reports.
    pub fn year_label(&self) -> String {
        self.year
            .map(|y| y.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Header layouts the tokenizer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPattern {
    /// `accession|country|year` and variations
    PipeDelimited,
    /// Strain names such as `EV71/SARAWAK/MY104/97`
    SlashDelimited,
    /// Anything else; metadata falls back to `Unknown`
    Unstructured,
}

impl HeaderPattern {
    pub fn classify(body: &str) -> Self {
        if body.contains('|') {
            HeaderPattern::PipeDelimited
        } else if body.contains('/') {
            HeaderPattern::SlashDelimited
        } else {
            HeaderPattern::Unstructured
        }
    }
}

/// Turns raw identifiers into [`SequenceMetadata`]. Extraction is total: any
/// input string yields a record, with undeterminable fields set to `Unknown`.
pub struct HeaderMetadataExtractor<'a> {
    normalizer: &'a dyn CountryNormalizer,
}

impl<'a> HeaderMetadataExtractor<'a> {
    pub fn new(normalizer: &'a dyn CountryNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn extract(&self, header: &str) -> SequenceMetadata {
        let header = header.trim().trim_start_matches('>').trim();
        let subgenotype = extract_subgenotype(header);
        let body = match header.split_once('#') {
            Some((_, rest)) => rest,
            None => header,
        };

        let pattern = HeaderPattern::classify(body);
        let (raw_country, country, year) = match pattern {
            HeaderPattern::PipeDelimited => self.parse_pipe_tokens(body),
            HeaderPattern::SlashDelimited => self.parse_slash_tokens(body),
            HeaderPattern::Unstructured => (None, None, None),
        };

        let country = country.unwrap_or_else(|| UNKNOWN.to_string());
        let continent = self
            .normalizer
            .continent(&country)
            .unwrap_or_else(|| UNKNOWN.to_string());

        debug!(
            "{} → pattern={:?}, raw={}, country={}, year={}",
            header,
            pattern,
            raw_country.as_deref().unwrap_or(UNKNOWN),
            country,
            year.map(|y| y.to_string()).unwrap_or_else(|| UNKNOWN.to_string())
        );

        SequenceMetadata {
            raw_country,
            country,
            continent,
            year,
            subgenotype,
        }
    }

    /// The last token that resolves to a country wins, so trailing fields
    /// such as a host species do not mask it.
    fn parse_pipe_tokens(&self, body: &str) -> (Option<String>, Option<String>, Option<u16>) {
        let mut last_alpha: Option<&str> = None;
        let mut resolved: Option<(String, String)> = None;
        let mut year = None;

        for token in body.split('|').map(str::trim) {
            if YEAR_TOKEN.is_match(token) {
                year = token.get(..4).and_then(|y| y.parse().ok());
            } else if is_alphabetic_token(token) || is_underscored_place(token) {
                last_alpha = Some(token);
                if let Some(country) = self.normalizer.normalize(token) {
                    resolved = Some((token.to_string(), country));
                }
            }
        }

        match resolved {
            Some((raw, country)) => (Some(raw), Some(country), year),
            None => (last_alpha.map(str::to_string), None, year),
        }
    }

    fn parse_slash_tokens(&self, body: &str) -> (Option<String>, Option<String>, Option<u16>) {
        let tokens: Vec<&str> = body.split('/').map(str::trim).collect();

        let mut first_alpha: Option<&str> = None;
        let mut resolved: Option<(String, String)> = None;
        for token in tokens.iter().filter(|t| is_alphabetic_token(t)) {
            first_alpha.get_or_insert(*token);
            if let Some(country) = self.normalizer.normalize(token) {
                resolved = Some((token.to_string(), country));
                break;
            }
        }

        let year = tokens
            .iter()
            .rev()
            .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()))
            .find_map(|t| parse_short_or_long_year(t));

        match resolved {
            Some((raw, country)) => (Some(raw), Some(country), year),
            None => (first_alpha.map(str::to_string), None, year),
        }
    }
}

/// Subgenotype label: the text before the first `#`, if any.
pub fn extract_subgenotype(header: &str) -> Option<String> {
    let (prefix, _) = header.split_once('#')?;
    let prefix = prefix.trim().trim_start_matches('>');
    if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    }
}

fn is_alphabetic_token(token: &str) -> bool {
    !token.is_empty()
        && token.chars().any(|c| c.is_alphabetic())
        && token.chars().all(|c| c.is_alphabetic() || c == ' ')
}

fn is_underscored_place(token: &str) -> bool {
    match token.split_once('_') {
        Some((head, _)) => is_alphabetic_token(head),
        None => false,
    }
}

/// `97` → 1997, `04` → 2004, `2016` → 2016.
fn parse_short_or_long_year(token: &str) -> Option<u16> {
    let value: u16 = token.parse().ok()?;
    match token.len() {
        2 if value >= 50 => Some(1900 + value),
        2 => Some(2000 + value),
        4 if (1900..2100).contains(&value) => Some(value),
        _ => None,
    }
}
