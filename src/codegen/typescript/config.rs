//! Shared artifacts of the TypeScript target: header, `index.ts`, `config.json`.

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::codegen::components::Component;
use crate::codegen::naming::{UnknownType, map_type, to_camel};
use crate::syntax::Attribute;

/// Two-line banner at the top of every generated source.
pub fn generated_header(version: &str) -> String {
    format!("// Generated from SysML model. Do not edit by hand.\n// Version: {version}\n\n")
}

/// Re-export of every emitted component class, in component order.
pub fn build_index(components: &[&Component<'_>]) -> String {
    let mut out = String::new();
    for component in components {
        out.push_str(&format!(
            "export {{ {} }} from './{}';\n",
            component.class_name, component.module_name
        ));
    }
    out
}

/// Runtime configuration keyed by camelCase class name.
///
/// Components without attributes get no entry.
pub fn build_config_json(components: &[&Component<'_>]) -> Result<String, serde_json::Error> {
    let mut config: IndexMap<String, IndexMap<String, Value>> = IndexMap::new();
    for component in components {
        let attributes = component.part.data().attributes();
        if attributes.is_empty() {
            continue;
        }
        let entry = config.entry(to_camel(&component.class_name)).or_default();
        for attr in attributes {
            entry.insert(attr.name.to_string(), default_value(attr));
        }
    }
    let mut json = serde_json::to_string_pretty(&config)?;
    json.push('\n');
    Ok(json)
}

/// The attribute default coerced to its mapped type, or the type's zero value.
fn default_value(attr: &Attribute) -> Value {
    let ty = map_type(attr.ty.as_deref(), UnknownType::AsString);
    let raw = attr.default.as_deref().map(str::trim).filter(|d| !d.is_empty());
    match (ty.as_str(), raw) {
        ("number", Some(raw)) => coerce_number(raw),
        ("number", None) => Value::from(0),
        ("boolean", Some(raw)) => Value::Bool(matches!(
            raw.to_ascii_lowercase().as_str(),
            "true" | "1" | "yes"
        )),
        ("boolean", None) => Value::Bool(false),
        (_, Some(raw)) => Value::String(raw.trim_matches(|c| c == '\'' || c == '"').to_string()),
        (_, None) => Value::String(String::new()),
    }
}

fn coerce_number(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0))
}
