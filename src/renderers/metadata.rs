//! Style metadata renderers
//!
//! Emits one JSON fragment per token describing its public contract: rendered
//! key, default CSS value, description, resolved type, the keys of the tokens
//! it references and the free-form `o3rMetadata` payload. The content updater
//! deep-merges all fragments into a single pretty-printed JSON document,
//! ignoring any previous file content (metadata is fully regenerated on every
//! run).
//!
//! With `ignore_private` enabled, private tokens are dropped from the output
//! and reference lists are flattened through them, so a public token
//! referencing a private one reports the private token's own public
//! references instead.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::renderers::css::{get_css_token_value_renderer, CssTokenValueRendererOptions};
use crate::renderers::{DesignContentUpdater, TokenDefinitionRenderer, TokenValueRenderer};
use crate::template;
use crate::variable::{TokenKeyRenderer, TokenVariable, TokenVariableSet};

/// Options of the metadata definition renderer
#[derive(Default)]
pub struct MetadataTokenDefinitionRendererOptions {
    /// Value renderer used for the `defaultValue` field, defaulting to the
    /// CSS one
    pub token_value_renderer: Option<TokenValueRenderer>,
    /// Custom key renderer for the emitted token keys
    pub token_variable_name_renderer: Option<TokenKeyRenderer>,
    /// Drop private tokens and flatten reference lists through them
    pub ignore_private: bool,
}

/// Build the metadata definition renderer.
pub fn get_metadata_token_definition_renderer(
    options: MetadataTokenDefinitionRendererOptions,
) -> TokenDefinitionRenderer {
    let MetadataTokenDefinitionRendererOptions {
        token_value_renderer,
        token_variable_name_renderer,
        ignore_private,
    } = options;
    let token_value_renderer = token_value_renderer.unwrap_or_else(|| {
        get_css_token_value_renderer(CssTokenValueRendererOptions {
            unregistered_reference_renderer: None,
            token_variable_name_renderer: token_variable_name_renderer.clone(),
        })
    });
    Box::new(move |variable, set| {
        if ignore_private && variable.extensions.is_private() {
            return Ok(None);
        }
        let key = variable.key(token_variable_name_renderer.as_ref());

        let mut fields = Map::new();
        fields.insert("name".to_string(), Value::String(key.clone()));
        fields.insert(
            "defaultValue".to_string(),
            Value::String(token_value_renderer(variable, set, false)?),
        );
        if let Some(description) = &variable.description {
            fields.insert(
                "description".to_string(),
                Value::String(description.clone()),
            );
        }
        if let Some(token_type) = variable.resolved_type(set, true)? {
            fields.insert("type".to_string(), Value::String(token_type));
        }
        let references = reference_keys(
            variable,
            set,
            token_variable_name_renderer.as_ref(),
            ignore_private,
            &mut vec![variable.token_reference_name.clone()],
        )?;
        if !references.is_empty() {
            fields.insert(
                "references".to_string(),
                Value::Array(references.into_iter().map(Value::String).collect()),
            );
        }
        for (meta_key, meta_value) in &variable.extensions.metadata {
            fields.insert(meta_key.clone(), meta_value.clone());
        }

        let mut fragment = Map::new();
        fragment.insert(key, Value::Object(fields));
        Ok(Some(serde_json::to_string(&Value::Object(fragment))?))
    })
}

/// Build the metadata content updater: deep-merges the fragments into one
/// pretty-printed JSON document.
pub fn get_metadata_style_content_updater() -> DesignContentUpdater {
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

/// Rendered keys of the referenced tokens, in order of appearance without
/// duplicates, flattening private targets when `ignore_private` is set.
fn reference_keys(
    variable: &TokenVariable,
    set: &TokenVariableSet,
    key_renderer: Option<&TokenKeyRenderer>,
    ignore_private: bool,
    visited: &mut Vec<String>,
) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    for target in variable.references_node(set)? {
        if visited.contains(&target.token_reference_name) {
            continue;
        }
        if ignore_private && target.extensions.is_private() {
            visited.push(target.token_reference_name.clone());
            for key in reference_keys(target, set, key_renderer, ignore_private, visited)? {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        } else {
            let key = target.key(key_renderer);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    Ok(keys)
}
