use once_cell::sync::Lazy;
use regex::Regex;

/// Everything from the first `{` to the last `}`, across newlines.
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Locate the JSON object inside free-form model output.
///
/// The match is greedy: two separate objects in one answer come back as a
/// single span covering both, which then fails to parse.
pub fn find_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|m| m.as_str())
}
