//! Lightweight entity extraction.
//!
//! An entity is any run of one ASCII letter followed by up to nine letters,
//! digits or underscores, optionally wrapped in `$` as in inline math
//! (`$x$`). Longer words are cut into consecutive runs.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$?([A-Za-z][A-Za-z0-9_]{0,9})\$?").unwrap());

/// Extract entity tokens from `text`, sorted and deduplicated.
pub fn extract_entities(text: &str) -> Vec<String> {
    ENTITY_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
