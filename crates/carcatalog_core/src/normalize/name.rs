//! Canonical identity derivation for (maker, model) pairs.
//!
//! # Responsibility
//! - Turn free-text maker/model input into the `MAKER_MODEL` identity key.
//! - Keep the verbatim display string next to the key.
//!
//! # Invariants
//! - Pure string transform: deterministic, never fails, never panics.
//! - Maker casing does not affect the identity.
//! - Known maker spellings typed into the model field are removed as whole
//!   words, even when they form part of a legitimate model name.

use crate::normalize::tables::{all_maker_spellings, MODEL_TRANSLATIONS};
use once_cell::sync::Lazy;
use regex::Regex;

static PUNCTUATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-_().,]").expect("valid punctuation regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static MAKER_WORD_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    all_maker_spellings()
        .filter_map(|maker| {
            Regex::new(&format!(r"\b{}\b", regex::escape(&maker.to_lowercase()))).ok()
        })
        .collect()
});

const FULL_WIDTH_OFFSET: u32 = 0xFEE0;
const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// Identity and display strings derived from one (maker, model) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    /// `"<MAKER>_<MODELTOKEN>"`, the catalog key.
    pub normalized_name: String,
    /// Verbatim `"<maker> <model>"`.
    pub display_name: String,
    /// Verbatim maker.
    pub maker_name: String,
}

/// Derives the canonical identity for a maker/model pair.
///
/// Empty input still yields a deterministic (degenerate) identity; callers
/// reject blank names before reaching this point.
pub fn normalize_car_name(maker_name: &str, model_name: &str) -> NormalizedName {
    NormalizedName {
        normalized_name: format!(
            "{}_{}",
            maker_name.to_uppercase(),
            normalize_model_token(model_name)
        ),
        display_name: format!("{maker_name} {model_name}"),
        maker_name: maker_name.to_string(),
    }
}

/// Reduces a free-text model name to its upper-case, space-free token.
///
/// Also used to normalize search terms.
pub fn normalize_model_token(model_name: &str) -> String {
    let folded = fold_full_width(model_name).to_lowercase();
    let stripped = PUNCTUATION_RE.replace_all(&folded, "");
    let mut working = WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string();

    for maker_re in MAKER_WORD_RES.iter() {
        working = maker_re.replace_all(&working, "").trim().to_string();
    }

    for (japanese, english) in MODEL_TRANSLATIONS {
        let needle = japanese.to_lowercase();
        if working.contains(needle.as_str()) {
            working = working.replacen(needle.as_str(), &english.to_lowercase(), 1);
        }
    }

    WHITESPACE_RE.replace_all(&working, "").to_uppercase()
}

/// Maps full-width Latin letters, digits and the ideographic space to ASCII.
fn fold_full_width(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            'Ａ'..='Ｚ' | 'ａ'..='ｚ' | '０'..='９' => {
                char::from_u32(ch as u32 - FULL_WIDTH_OFFSET).unwrap_or(ch)
            }
            IDEOGRAPHIC_SPACE => ' ',
            other => other,
        })
        .collect()
}
