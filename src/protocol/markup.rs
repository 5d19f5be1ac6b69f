//! Minimal HTML form scraping.
//!
//! Only what the Blesta verification page needs: find an `<input>` by its
//! `name` attribute and read its `value`.

use once_cell::sync::Lazy;
use regex::Regex;

static INPUT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<input\b[^>]*>").expect("input tag pattern is valid")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("attribute pattern is valid")
});

/// Return the `value` of the first `<input>` whose `name` equals `name`.
///
/// An input that has the name but no `value` attribute yields an empty
/// string, matching how browsers submit it.
pub fn find_input_value(html: &str, name: &str) -> Option<String> {
    INPUT_TAG.find_iter(html).find_map(|tag| {
        let attributes = parse_attributes(tag.as_str());
        let matches_name = attributes
            .iter()
            .any(|(key, value)| key.eq_ignore_ascii_case("name") && value == name);
        if !matches_name {
            return None;
        }
        Some(
            attributes
                .into_iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("value"))
                .map(|(_, value)| value)
                .unwrap_or_default(),
        )
    })
}

fn parse_attributes(tag: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(tag)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_string();
            let raw = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            Some((key, decode_entities(raw)))
        })
        .collect()
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
