//! Design Token round-trip renderers
//!
//! Serializes token variables back into the Design Token JSON format, so a
//! token set can be re-emitted as a specification document (e.g. to split a
//! theme across several files, or to persist tokens extracted from another
//! source). Each token becomes a `{$value, $type, $description, $extensions}`
//! node re-nested under its path; the leading path segments can be joined
//! into a single grouping key to keep structurally related tokens together in
//! the output file.
//!
//! The content updater deep-merges all fragments into one pretty-printed
//! document.

use serde_json::{Map, Value};

use crate::renderers::{DesignContentUpdater, TokenDefinitionRenderer};
use crate::spec::{DESCRIPTION_KEY, EXTENSIONS_KEY, TYPE_KEY, VALUE_KEY};
use crate::template;

/// Options of the Design Token definition renderer
pub struct DesignTokenTokenDefinitionRendererOptions {
    /// Number of leading path segments joined into the grouping key; a depth
    /// exceeding the token's path length folds the whole name into a single
    /// dotted key
    pub group_depth: usize,
}

impl Default for DesignTokenTokenDefinitionRendererOptions {
    fn default() -> Self {
        Self { group_depth: 1 }
    }
}

/// Build the Design Token round-trip definition renderer.
pub fn get_design_token_definition_renderer(
    options: DesignTokenTokenDefinitionRendererOptions,
) -> TokenDefinitionRenderer {
    let group_depth = options.group_depth;
    Box::new(move |variable, _set| {
        let mut body = Map::new();
        if !variable.node.value.is_null() {
            body.insert(VALUE_KEY.to_string(), variable.node.value.clone());
        }
        if let Some(token_type) = &variable.node.token_type {
            body.insert(TYPE_KEY.to_string(), Value::String(token_type.clone()));
        }
        if let Some(description) = &variable.description {
            body.insert(
                DESCRIPTION_KEY.to_string(),
                Value::String(description.clone()),
            );
        }
        if let Some(extensions) = &variable.node.raw_extensions {
            body.insert(
                EXTENSIONS_KEY.to_string(),
                Value::Object(extensions.clone()),
            );
        }

        let segments: Vec<&str> = variable.token_reference_name.split('.').collect();
        let fragment = if group_depth >= segments.len() {
            let mut root = Map::new();
            root.insert(variable.token_reference_name.clone(), Value::Object(body));
            root
        } else {
            let group_key = segments[..group_depth].join(".");
            let nested = segments[group_depth..]
                .iter()
                .rev()
                .fold(Value::Object(body), |inner, segment| {
                    let mut level = Map::new();
                    level.insert((*segment).to_string(), inner);
                    Value::Object(level)
                });
            let mut root = Map::new();
            root.insert(group_key, nested);
            root
        };
        Ok(Some(serde_json::to_string(&Value::Object(fragment))?))
    })
}

/// Build the Design Token content updater: deep-merges the fragments into one
/// pretty-printed specification document.
pub fn get_design_token_style_content_updater() -> DesignContentUpdater {
    Box::new(|variables, _file, _content| {
        let fragments: Vec<Value> = variables
            .iter()
            .filter_map(|fragment| serde_json::from_str(fragment).ok())
            .collect();
        let merged = template::merge_all(&fragments);
        let mut rendered =
            serde_json::to_string_pretty(&merged).unwrap_or_else(|_| "{}".to_string());
        rendered.push('\n');
        rendered
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_design_token;
    use crate::variable::TokenVariableSet;
    use serde_json::json;
    use std::path::Path;

    fn parse(document: serde_json::Value) -> TokenVariableSet {
        parse_design_token(&document, None).unwrap()
    }

    fn render_fragment(set: &TokenVariableSet, name: &str, group_depth: usize) -> Value {
        let renderer = get_design_token_definition_renderer(
            DesignTokenTokenDefinitionRendererOptions { group_depth },
        );
        serde_json::from_str(&renderer(&set[name], set).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn test_token_serialized_under_grouping_key() {
        let set = parse(json!({
            "example": {
                "test": {
                    "height": {"$value": "2.3", "$type": "number", "$description": "height"}
                }
            }
        }));
        let fragment = render_fragment(&set, "example.test.height", 2);
        assert_eq!(
            fragment,
            json!({
                "example.test": {
                    "height": {"$value": "2.3", "$type": "number", "$description": "height"}
                }
            })
        );
    }

    #[test]
    fn test_depth_overflow_folds_to_single_key() {
        let set = parse(json!({
            "example": {"var1": {"$value": "#000", "$type": "color"}}
        }));
        let fragment = render_fragment(&set, "example.var1", 5);
        assert_eq!(
            fragment,
            json!({"example.var1": {"$value": "#000", "$type": "color"}})
        );
    }

    #[test]
    fn test_own_extensions_round_trip() {
        let set = parse(json!({
            "example": {
                "$extensions": {"o3rImportant": true},
                "var1": {
                    "$value": "#000",
                    "$type": "color",
                    "$extensions": {"o3rPrivate": true}
                }
            }
        }));
        let fragment = render_fragment(&set, "example.var1", 1);
        // Only the token's own bag is serialized, not the folded ancestors
        assert_eq!(
            fragment["example"]["var1"]["$extensions"],
            json!({"o3rPrivate": true})
        );
    }

    #[test]
    fn test_updater_rebuilds_parseable_document() {
        let source = json!({
            "example": {
                "var1": {"$value": "#000", "$type": "color"},
                "test": {"height": {"$value": "2.3", "$type": "number"}}
            }
        });
        let set = parse(source);
        let renderer = get_design_token_definition_renderer(Default::default());
        let fragments: Vec<String> = set
            .values()
            .filter_map(|variable| renderer(variable, &set).unwrap())
            .collect();
        let updater = get_design_token_style_content_updater();
        let content = updater(&fragments, Path::new("theme.json"), "");
        let document: Value = serde_json::from_str(&content).unwrap();

        let reparsed = parse_design_token(&document, None).unwrap();
        assert!(reparsed.contains_key("example.var1"));
        assert!(reparsed.contains_key("example.test.height"));
    }
}
