//! Identifier casing and model-type mapping for generated sources.
//!
//! Every function here is pure and total: the same model name always maps to
//! the same generated identifier.

use super::text::quoted;
use crate::base::constants::QNAME_SEPARATOR;

// ============================================================================
// CASING
// ============================================================================

/// `PascalCase` → `SCREAMING_SNAKE` for enum members.
///
/// An underscore is inserted before every capital that follows a lowercase
/// letter or digit, so `HTTPIdle` stays one word: `HTTPIDLE`.
pub fn to_screaming_snake(name: &str) -> String {
    let name = sanitize_identifier(name);
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
            out.push('_');
        }
        out.extend(c.to_uppercase());
        prev = Some(c);
    }
    out
}

/// Lowercase the first character.
pub fn to_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Class name of a component: `Lamp Controller` → `LampController`,
/// `mllpReceiver` → `MllpReceiver`.
pub fn to_class_name(name: &str) -> String {
    let words: Vec<&str> = name
        .split(|c: char| !unicode_ident::is_xid_continue(c))
        .filter(|w| !w.is_empty())
        .collect();
    let class = if words.len() > 1 {
        words.iter().map(|w| capitalize_word(w)).collect()
    } else {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    };
    sanitize_identifier(&class)
}

/// `MllpReceiver` → `mllp_receiver`, `HTTPForwarder` → `http_forwarder`.
pub fn to_snake(name: &str) -> String {
    let name = sanitize_identifier(name);
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_lower);
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Replace characters that cannot appear in an identifier with `_`.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        let ok = if i == 0 {
            unicode_ident::is_xid_start(c) || c == '_' || c == '$'
        } else {
            unicode_ident::is_xid_continue(c) || c == '$'
        };
        if ok {
            out.push(c);
        } else if i == 0 && unicode_ident::is_xid_continue(c) {
            out.push('_');
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// Object property key: bare when it is an identifier, quoted otherwise.
pub fn property_name(name: &str) -> String {
    if sanitize_identifier(name) == name {
        name.to_string()
    } else {
        quoted(name)
    }
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

// ============================================================================
// TYPE MAPPING
// ============================================================================

/// What to do with a model type the fixed table does not know
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownType {
    /// Map to `string` (configuration shapes)
    AsString,
    /// Keep the model name (signatures)
    PassThrough,
}

/// Map a model type name to a TypeScript type.
///
/// Default values and bodies trailing the type (`Integer = 5`) are ignored and
/// qualified names map by their last segment. A missing type maps to
/// `string`.
pub fn map_type(ty: Option<&str>, unknown: UnknownType) -> String {
    let Some(ty) = ty else {
        return "string".to_string();
    };
    let clean = ty
        .split('=')
        .next()
        .unwrap_or_default()
        .split('{')
        .next()
        .unwrap_or_default()
        .trim();
    let clean = clean
        .rsplit(|c| c == QNAME_SEPARATOR || c == ':')
        .next()
        .unwrap_or_default()
        .trim();
    if clean.is_empty() {
        return "string".to_string();
    }
    match clean.to_ascii_lowercase().as_str() {
        "string" | "str" => "string".to_string(),
        "integer" | "int" | "natural" | "real" | "float" | "double" => "number".to_string(),
        "boolean" | "bool" => "boolean".to_string(),
        "buffer" => "Buffer".to_string(),
        _ => match unknown {
            UnknownType::AsString => "string".to_string(),
            UnknownType::PassThrough => clean.to_string(),
        },
    }
}

/// First pair of distinct names that collide after `f`, in input order.
pub fn find_collision<'a, F>(names: &[&'a str], f: F) -> Option<(&'a str, &'a str, String)>
where
    F: Fn(&str) -> String,
{
    let mut seen: Vec<(String, &str)> = Vec::with_capacity(names.len());
    for &name in names {
        let mapped = f(name);
        if let Some((_, first)) = seen.iter().find(|(m, n)| *m == mapped && *n != name) {
            return Some((*first, name, mapped));
        }
        seen.push((mapped, name));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Idle", "IDLE")]
    #[case("WaitingForAck", "WAITING_FOR_ACK")]
    #[case("State2Ready", "STATE2_READY")]
    #[case("HTTPIdle", "HTTPIDLE")]
    #[case("Awaiting Reply", "AWAITING_REPLY")]
    fn test_screaming_snake(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(to_screaming_snake(input), expected);
    }

    #[rstest]
    #[case("MllpReceiver", "mllp_receiver")]
    #[case("HTTPForwarder", "http_forwarder")]
    #[case("Hl7Parser", "hl7_parser")]
    #[case("lamp", "lamp")]
    fn test_snake(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(to_snake(input), expected);
    }

    #[rstest]
    #[case("Lamp Controller", "LampController")]
    #[case("MLLP Receiver", "MllpReceiver")]
    #[case("mllpReceiver", "MllpReceiver")]
    #[case("HTTPForwarder", "HTTPForwarder")]
    fn test_class_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(to_class_name(input), expected);
    }

    #[test]
    fn test_camel_and_sanitize() {
        assert_eq!(to_camel("LampController"), "lampController");
        assert_eq!(to_camel(""), "");
        assert_eq!(sanitize_identifier("9lives"), "_9lives");
        assert_eq!(sanitize_identifier("a-b c"), "a_b_c");
    }

    #[test]
    fn test_property_name() {
        assert_eq!(property_name("listenPort"), "listenPort");
        assert_eq!(property_name("listen port"), "'listen port'");
        assert_eq!(property_name("2fa"), "'2fa'");
    }

    #[rstest]
    #[case(Some("String"), UnknownType::AsString, "string")]
    #[case(Some("ScalarValues::Integer"), UnknownType::AsString, "number")]
    #[case(Some("Real = 1.5"), UnknownType::AsString, "number")]
    #[case(Some("Boolean"), UnknownType::PassThrough, "boolean")]
    #[case(Some("Buffer"), UnknownType::AsString, "Buffer")]
    #[case(Some("Frame"), UnknownType::AsString, "string")]
    #[case(Some("Msgs.Frame"), UnknownType::PassThrough, "Frame")]
    #[case(None, UnknownType::PassThrough, "string")]
    fn test_map_type(
        #[case] ty: Option<&str>,
        #[case] unknown: UnknownType,
        #[case] expected: &str,
    ) {
        assert_eq!(map_type(ty, unknown), expected);
    }

    #[test]
    fn test_find_collision() {
        let names = ["WaitingAck", "Idle", "Waiting_Ack"];
        let hit = find_collision(&names, to_screaming_snake);
        assert_eq!(hit, Some(("WaitingAck", "Waiting_Ack", "WAITING_ACK".to_string())));
        assert_eq!(find_collision(&["A", "B"], to_screaming_snake), None);
    }
}
