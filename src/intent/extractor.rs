use crate::intent::scoring::is_function_word;
use crate::script::types::{ParamMap, Parameter, ParameterKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};
use tracing::{debug, warn};

static TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:today|tonight|tomorrow|(?:next|this)\s+[a-z]+|on\s+[a-z]+)\s+)?(?:at\s+)?(?:\d{1,2}(?::\d{2})?\s*(?:am|pm)|\d{1,2}:\d{2}|noon|midnight)\b",
    )
    .expect("time pattern is valid")
});

static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}(?:/\d{2,4})?|today|tomorrow|yesterday|(?:next\s+)?(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday))\b",
    )
    .expect("date pattern is valid")
});

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\b\d+(?:\.\d+)?\b").expect("number pattern is valid"));

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+").expect("email pattern is valid"));

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("url pattern is valid"));

/// A required parameter that has no value yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingParameter {
    pub name: String,
    pub prompt: String,
}

/// Best-effort parameter extraction from free text.
///
/// Extraction never fails: a parameter without a locatable value is simply
/// absent from the result.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str, parameters: &[Parameter]) -> ParamMap {
        let mut values = ParamMap::new();
        for parameter in parameters {
            if let Some(value) = self.locate(text, parameter) {
                values.insert(parameter.name.clone(), value);
            }
        }
        debug!(located = values.len(), declared = parameters.len(), "Extracted parameters");
        values
    }

    /// Required parameters without a key in `collected`, in declared order.
    pub fn missing(&self, parameters: &[Parameter], collected: &ParamMap) -> Vec<MissingParameter> {
        parameters
            .iter()
            .filter(|p| p.required && !collected.contains_key(&p.name))
            .map(|p| MissingParameter {
                name: p.name.clone(),
                prompt: p.prompt.clone(),
            })
            .collect()
    }

    /// Extraction for a continuation turn answering a single prompt.
    ///
    /// Lossy on purpose: when nothing structured is found the whole input
    /// becomes the value, so a collection session always moves forward.
    pub fn extract_single(&self, text: &str, parameter: &Parameter) -> Value {
        if let Some(value) = self.locate(text, parameter) {
            return value;
        }
        let trimmed = text.trim();
        let literal = if trimmed.is_empty() { text } else { trimmed };
        Value::String(literal.to_string())
    }

    fn locate(&self, text: &str, parameter: &Parameter) -> Option<Value> {
        if let Some(pattern) = &parameter.pattern {
            match Regex::new(pattern) {
                Ok(re) => {
                    if let Some(caps) = re.captures(text) {
                        let raw = caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str().trim());
                        if let Some(value) = raw.and_then(|r| coerce(parameter.kind, r)) {
                            return Some(value);
                        }
                    }
                }
                Err(e) => warn!(parameter = %parameter.name, "Ignoring invalid parameter pattern: {}", e),
            }
        }

        for anchor in anchors(parameter) {
            if let Some(raw) = anchored_value(text, &anchor, parameter.kind) {
                if let Some(value) = coerce(parameter.kind, &raw) {
                    return Some(value);
                }
            }
        }

        by_kind(text, parameter.kind)
    }
}

fn anchors(parameter: &Parameter) -> Vec<String> {
    let mut anchors: Vec<String> = parameter
        .keywords
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    let name = parameter.name.replace(['_', '-'], " ");
    if !anchors.iter().any(|a| a.eq_ignore_ascii_case(&name)) {
        anchors.push(name);
    }
    anchors
}

// "<anchor> [:|=|is|to|as] <value>", value quoted or a single token.
// An unquoted function word ("time is it") is not a text value.
fn anchored_value(text: &str, anchor: &str, kind: ParameterKind) -> Option<String> {
    let pattern = format!(
        r#"(?i)\b{}\b\s*(?:[:=]|is\b|to\b|as\b)?\s*("[^"]+"|'[^']+'|[^\s,;]+)"#,
        regex::escape(anchor)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(text)?;
    let raw = caps.get(1)?.as_str();
    let quoted = raw.starts_with('"') || raw.starts_with('\'');
    let value = raw
        .trim_matches(|c| c == '"' || c == '\'')
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?'))
        .trim();
    let text_like = !matches!(kind, ParameterKind::Number | ParameterKind::Boolean);
    if value.is_empty() || (!quoted && text_like && is_function_word(value)) {
        None
    } else {
        Some(value.to_string())
    }
}

fn by_kind(text: &str, kind: ParameterKind) -> Option<Value> {
    match kind {
        ParameterKind::Text => None,
        ParameterKind::Number => NUMBER.find(text).and_then(|m| parse_number(m.as_str())),
        ParameterKind::Time => TIME.find(text).map(|m| {
            let found = m.as_str().trim();
            let found = strip_prefix_ignore_case(found, "at ").unwrap_or(found);
            Value::String(found.trim().to_string())
        }),
        ParameterKind::Date => DATE.find(text).map(|m| Value::String(m.as_str().to_string())),
        ParameterKind::Email => EMAIL.find(text).map(|m| Value::String(m.as_str().to_string())),
        ParameterKind::Url => URL
            .find(text)
            .map(|m| Value::String(m.as_str().trim_end_matches(['.', ',', ')']).to_string())),
        ParameterKind::Boolean => text.split_whitespace().find_map(parse_bool),
    }
}

fn coerce(kind: ParameterKind, raw: &str) -> Option<Value> {
    match kind {
        ParameterKind::Number => parse_number(raw),
        ParameterKind::Boolean => parse_bool(raw),
        _ => Some(Value::String(raw.to_string())),
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::from(int));
    }
    raw.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
}

fn parse_bool(raw: &str) -> Option<Value> {
    let word = raw
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    match word.as_str() {
        "yes" | "true" | "on" | "enable" | "enabled" => Some(Value::Bool(true)),
        "no" | "false" | "off" | "disable" | "disabled" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}
