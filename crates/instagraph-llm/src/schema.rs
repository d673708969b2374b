//! JSON Schema for forced tool calls.
//!
//! `schemars` emits shared sub-schemas under `definitions` and points at them
//! with `$ref`. Several OpenAI-compatible gateways do not resolve refs inside
//! tool parameters, so every ref is inlined.

use schemars::{schema_for, JsonSchema};
use serde_json::{Map, Value};

/// A single function the model is forced to call.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSpec {
    /// Build a tool whose arguments are exactly `T`.
    pub fn for_type<T: JsonSchema>() -> Self {
        let mut parameters = inlined_schema::<T>();
        let description = parameters
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if let Value::Object(map) = &mut parameters {
            map.remove("title");
        }
        Self {
            name: T::schema_name(),
            description,
            parameters,
        }
    }
}

/// `schema_for!(T)` with every `$ref` replaced by its definition.
pub fn inlined_schema<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schema_for!(T)).unwrap_or_default();
    let definitions = match &mut value {
        Value::Object(map) => {
            map.remove("$schema");
            map.remove("definitions")
        }
        _ => None,
    };
    if let Some(Value::Object(defs)) = definitions {
        inline_refs(&mut value, &defs);
    }
    value
}

fn inline_refs(value: &mut Value, defs: &Map<String, Value>) {
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix("#/definitions/"))
                .and_then(|name| defs.get(name))
                .cloned();

            if let Some(mut resolved) = target {
                inline_refs(&mut resolved, defs);
                map.remove("$ref");
                // Keep sibling keywords (e.g. `description`) next to the inlined body.
                if let Value::Object(body) = resolved {
                    for (k, v) in body {
                        map.entry(k).or_insert(v);
                    }
                }
            }

            // schemars wraps described refs in `allOf: [{"$ref": ...}]`.
            let single_all_of = matches!(map.get("allOf"), Some(Value::Array(a)) if a.len() == 1);
            if single_all_of {
                if let Some(Value::Array(mut all_of)) = map.remove("allOf") {
                    if let Some(mut inner) = all_of.pop() {
                        inline_refs(&mut inner, defs);
                        if let Value::Object(body) = inner {
                            for (k, v) in body {
                                map.entry(k).or_insert(v);
                            }
                        }
                    }
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs(v, defs);
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_refs(item, defs);
            }
        }
        _ => {}
    }
}
