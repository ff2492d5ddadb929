//! GUID marker extraction from serialized asset text.

use std::collections::HashSet;
use std::sync::LazyLock;

use asset_guid::{AssetGuid, GUID_MARKER_PATTERN};
use regex::Regex;

static GUID_MARKER: LazyLock<Regex> = LazyLock::new(|| match Regex::new(GUID_MARKER_PATTERN) {
    Ok(regex) => regex,
    Err(err) => panic!("Invalid GUID marker regex: {err}"),
});

/// Extract every `guid: <token>` marker from `text`.
///
/// Tokens are returned in order of first occurrence with repeats removed, so a
/// GUID referenced twice by the same file is reported once. The nil GUID is
/// skipped.
#[must_use]
pub fn extract_guids(text: &str) -> Vec<AssetGuid> {
    let mut seen = HashSet::new();
    let mut guids = Vec::new();

    for caps in GUID_MARKER.captures_iter(text) {
        let Some(token) = caps.get(1) else {
            continue;
        };
        // The regex already enforces 32 hex digits.
        let Ok(guid) = AssetGuid::parse(token.as_str()) else {
            continue;
        };
        if guid.is_nil() {
            continue;
        }
        if seen.insert(guid.clone()) {
            guids.push(guid);
        }
    }

    guids
}
