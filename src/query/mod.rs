//! Key-value payload codec used to pass data between flow steps.
//!
//! A payload is a plain `k=v&k2=v2` string. Decoding produces a typed
//! [`QueryMap`]: values are recognized as booleans, integers, floats, or
//! embedded JSON objects before falling back to percent-decoded strings.
//! The coordinator itself never interprets payloads; it stores, forwards,
//! and diff-tests them through this module.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Opaque payload passed between steps.
pub type Query = String;

/// Decoded form of a payload.
pub type QueryMap = Map<String, Value>;

/// Decode a payload into a typed map.
///
/// Pairs without `=` are skipped; an embedded `=` stays in the value; `?` is
/// stripped from keys and newlines from values. A non-empty payload that
/// yields no pairs at all is considered undecodable and returns `None`.
pub fn decode(payload: &str) -> Option<QueryMap> {
    let mut map = QueryMap::new();
    for pair in payload.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.replace('?', "");
        if key.is_empty() {
            continue;
        }
        let value = value.replace('\n', "");
        map.insert(key, typed_value(&value));
    }
    if map.is_empty() && !payload.trim().is_empty() {
        return None;
    }
    Some(map)
}

/// Encode a map back into payload form. Nested objects are emitted as
/// compact JSON; everything else as plain text.
pub fn encode_map(map: &QueryMap) -> Query {
    map.iter()
        .map(|(key, value)| format!("{key}={}", value_text(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Structural inequality of two payloads, irrespective of key order.
///
/// An absent or undecodable payload differs from everything, including
/// another undecodable payload.
pub fn payloads_differ(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.and_then(decode), b.and_then(decode)) {
        (Some(a), Some(b)) => a != b,
        _ => true,
    }
}

/// Screen-side change test: does `query` carry different inputs than the
/// payload the screen was entered with? A missing initial payload always
/// counts as changed.
pub fn has_changes(initial: Option<&str>, query: &str) -> bool {
    match initial {
        Some(initial) => payloads_differ(Some(initial), Some(query)),
        None => true,
    }
}

/// Types that can round-trip through a payload via their serde
/// representation. Both methods have default implementations; adopters only
/// declare conformance.
pub trait QueryRepresentable: Serialize + DeserializeOwned {
    fn to_query(&self) -> Option<Query> {
        match serde_json::to_value(self).ok()? {
            Value::Object(map) => Some(encode_map(&map)),
            _ => None,
        }
    }

    fn from_query(payload: Option<&str>) -> Option<Self> {
        let map = decode(payload?)?;
        serde_json::from_value(Value::Object(map)).ok()
    }
}

/// Right-biased key union over the serde representations of two values.
pub trait Mergeable: Serialize + DeserializeOwned {
    fn merge(&self, other: &Self) -> Option<Self> {
        let Value::Object(mut base) = serde_json::to_value(self).ok()? else {
            return None;
        };
        let Value::Object(overlay) = serde_json::to_value(other).ok()? else {
            return None;
        };
        for (key, value) in overlay {
            base.insert(key, value);
        }
        serde_json::from_value(Value::Object(base)).ok()
    }
}

fn typed_value(raw: &str) -> Value {
    let lower = raw.to_ascii_lowercase();
    if lower == "true" || lower == "false" {
        return Value::Bool(lower == "true");
    }

    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit() || c == '-') {
        if let Ok(n) = raw.parse::<i64>() {
            return Value::from(n);
        }
    }

    if !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '.' | ','))
    {
        if let Ok(f) = raw.parse::<f64>() {
            return Value::from(f);
        }
    }

    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(raw) {
        return Value::Object(object);
    }

    Value::String(unquote_and_decode(raw))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn unquote_and_decode(raw: &str) -> String {
    let quoted = raw.len() >= 2
        && ((raw.starts_with('\'') && raw.ends_with('\''))
            || (raw.starts_with('"') && raw.ends_with('"')));
    let inner = if quoted { &raw[1..raw.len() - 1] } else { raw };
    percent_decode(inner)
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push((high << 4) | low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| input.to_string())
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
