//! JSON Schema fragment renderers
//!
//! Each token emits a schema fragment mirroring its ancestor path as nested
//! `properties` objects, terminating in a `oneOf` over two schema references:
//! a generic "any token" definition and the definition matching the token's
//! resolved type. A token without a resolvable type terminates in a single
//! reference to the generic definition. The content updater wraps all
//! fragments in a draft-07 document under a top-level `anyOf`.
//!
//! The definitions live in an external schema document addressed by the
//! configurable base URI (empty by default, producing document-local
//! `#/definitions/...` references).

use serde_json::{json, Map, Value};

use crate::renderers::{DesignContentUpdater, TokenDefinitionRenderer};

/// Options of the JSON Schema definition renderer
#[derive(Default)]
pub struct JsonSchemaTokenDefinitionRendererOptions {
    /// Base URI of the schema document holding the token definitions
    pub base_schema_uri: Option<String>,
}

/// Build the JSON Schema definition renderer.
pub fn get_json_schema_token_definition_renderer(
    options: JsonSchemaTokenDefinitionRendererOptions,
) -> TokenDefinitionRenderer {
    let base_schema_uri = options.base_schema_uri.unwrap_or_default();
    Box::new(move |variable, set| {
        let leaf = match variable.resolved_type(set, true)? {
            Some(token_type) => json!({
                "oneOf": [
                    {"$ref": format!("{base_schema_uri}#/definitions/token")},
                    {"$ref": format!("{base_schema_uri}#/definitions/{token_type}Token")}
                ]
            }),
            None => json!({"$ref": format!("{base_schema_uri}#/definitions/token")}),
        };

        let mut segments: Vec<&str> = variable.ancestors.iter().map(String::as_str).collect();
        segments.push(
            variable
                .token_reference_name
                .rsplit('.')
                .next()
                .unwrap_or(&variable.token_reference_name),
        );
        let fragment = segments.iter().rev().fold(leaf, |inner, segment| {
            let mut properties = Map::new();
            properties.insert((*segment).to_string(), inner);
            json!({"type": "object", "properties": properties})
        });
        Ok(Some(serde_json::to_string(&fragment)?))
    })
}

/// Build the JSON Schema content updater: wraps the fragments in a draft-07
/// document under a top-level `anyOf`.
pub fn get_json_schema_style_content_updater() -> DesignContentUpdater {
    Box::new(|variables, _file, _content| {
        let fragments: Vec<Value> = variables
            .iter()
            .filter_map(|fragment| serde_json::from_str(fragment).ok())
            .collect();
        let document = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "anyOf": fragments
        });
        let mut rendered =
            serde_json::to_string_pretty(&document).unwrap_or_else(|_| "{}".to_string());
        rendered.push('\n');
        rendered
    })
}
