use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::models::SeasonLabel;

/// Split-year season labels and the single year each one is stored under.
static SEASON_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("2007/08", "2008"),
        ("2009/10", "2010"),
        ("2020/21", "2020"),
    ])
});

pub const UNKNOWN_SEASON: &str = "Unknown";

/// Canonical season key for a raw label.
pub fn normalize_season(raw: &str) -> String {
    let trimmed = raw.trim();
    SEASON_ALIASES
        .get(trimmed)
        .map(|year| year.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

pub fn season_key(label: Option<&SeasonLabel>) -> String {
    match label {
        Some(label) => normalize_season(&label.raw()),
        None => UNKNOWN_SEASON.to_string(),
    }
}
