//! Cookie header parsing.

use std::collections::{BTreeMap, HashMap};

/// Parse the `Cookie` header into name/value pairs.
///
/// A missing header yields an empty map; malformed pairs are skipped.
pub fn parse_cookies(headers: &HashMap<String, String>) -> BTreeMap<String, String> {
    let Some(header) = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("cookie"))
        .map(|(_, value)| value)
    else {
        return BTreeMap::new();
    };

    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
