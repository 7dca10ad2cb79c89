//! Search alias generation for catalog entries.
//!
//! The alias set backs exact and substring lookups and is over-inclusive.

use crate::normalize::name::{normalize_car_name, normalize_model_token};
use crate::normalize::tables::{english_maker, english_model, japanese_maker, japanese_model};
use std::collections::BTreeSet;

/// Generates every searchable alias for a maker/model pair.
///
/// Returns a sorted, deduplicated list without empty strings.
pub fn generate_aliases(maker_name: &str, model_name: &str) -> Vec<String> {
    let mut aliases = BTreeSet::new();
    let identity = normalize_car_name(maker_name, model_name);

    let maker_forms = name_forms(maker_name, english_maker(maker_name), japanese_maker(maker_name));
    let model_forms = name_forms(model_name, english_model(model_name), japanese_model(model_name));

    for maker in &maker_forms {
        aliases.insert(maker.clone());
        aliases.insert(maker.to_uppercase());
        aliases.insert(maker.to_lowercase());
    }

    for model in &model_forms {
        let unspaced = remove_whitespace(model);
        aliases.insert(model.clone());
        aliases.insert(model.to_uppercase());
        aliases.insert(model.to_lowercase());
        aliases.insert(unspaced.to_lowercase());
        aliases.insert(unspaced);
    }

    for maker in &maker_forms {
        for model in &model_forms {
            aliases.insert(format!("{maker} {model}"));
            aliases.insert(format!("{model} {maker}"));
            aliases.insert(format!("{maker}{model}"));
            aliases.insert(format!("{model}{maker}"));
        }
    }

    aliases.insert(normalize_model_token(model_name));
    aliases.insert(identity.normalized_name);
    aliases.insert(identity.display_name);

    aliases
        .into_iter()
        .filter(|alias| !alias.trim().is_empty())
        .collect()
}

fn name_forms(
    original: &str,
    english: Option<&'static str>,
    japanese: Option<&'static str>,
) -> Vec<String> {
    let mut forms = vec![original.to_string()];
    for translated in [english, japanese].into_iter().flatten() {
        if !forms.iter().any(|form| form == translated) {
            forms.push(translated.to_string());
        }
    }
    forms
}

fn remove_whitespace(value: &str) -> String {
    value.chars().filter(|ch| !ch.is_whitespace()).collect()
}
