//! `{{slot}}` templates

use serde_json::Value;
use url::form_urlencoded;

use super::state::ScenarioState;

/// Split the next `{{ key }}` out of `input`: (text before, key, rest)
fn next_placeholder(input: &str) -> Option<(&str, &str, &str)> {
    let start = input.find("{{")?;
    let (before, after_start) = input.split_at(start);
    let after = &after_start[2..];
    let end = after.find("}}")?;
    let (key, after_end) = after.split_at(end);
    Some((before, key.trim(), &after_end[2..]))
}

/// Names of all placeholders in a template, in order of appearance
pub fn placeholders(input: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = input;
    while let Some((_, key, remaining)) = next_placeholder(rest) {
        found.push(key.to_string());
        rest = remaining;
    }
    found
}

/// Render a string template; unknown placeholders are kept verbatim
pub fn render_str(input: &str, state: &ScenarioState) -> String {
    render_with(input, state, |value| value)
}

/// Render a URL or path template
///
/// Slot values are percent-encoded as single components, so an extracted
/// value containing `/`, `?` or `#` cannot change the route.
pub fn render_url(input: &str, state: &ScenarioState) -> String {
    render_with(input, state, |value| encode_component(&value))
}

/// Percent-encode everything but unreserved characters (space as `%20`)
fn encode_component(value: &str) -> String {
    // byte_serialize turns a literal '+' into %2B, so any '+' left is a space
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn render_with<F>(input: &str, state: &ScenarioState, encode: F) -> String
where
    F: Fn(String) -> String,
{
    let mut rest = input;
    let mut output = String::with_capacity(input.len());

    while let Some((before, key, remaining)) = next_placeholder(rest) {
        output.push_str(before);
        match state.text(key) {
            Some(value) => output.push_str(&encode(value)),
            None => {
                output.push_str("{{");
                output.push_str(key);
                output.push_str("}}");
            }
        }
        rest = remaining;
    }
    output.push_str(rest);

    output
}

/// Render a JSON body template
///
/// A string that is exactly one placeholder is replaced by the slot's JSON
/// value, so numeric identifiers stay numeric.
pub fn render_value(template: &Value, state: &ScenarioState) -> Value {
    match template {
        Value::String(s) => {
            if let Some(("", key, "")) = next_placeholder(s.trim()) {
                if let Some(value) = state.get(key) {
                    return value.clone();
                }
            }
            Value::String(render_str(s, state))
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| render_value(v, state)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, state)))
                .collect(),
        ),
        other => other.clone(),
    }
}
