//! Specification graph builder
//!
//! Single depth-first walk over a specification document producing the flat
//! [`TokenVariableSet`]. Each node is classified exactly once (see
//! [`crate::spec`]); Groups recurse into their named children, Tokens are
//! registered under their dotted reference name, and a node carrying both
//! shapes does both.
//!
//! While walking, the extension bags of all ancestor Groups are folded
//! root-first into the token's [`Extensions`], interleaved with the template
//! overlay attached to the parse [`Context`]: at every level of the ancestor
//! path the template nodes addressing that path (by explicit name and by `*`
//! wildcard) contribute their defaults before the document node's own bag.
//! The `o3rMetadata` field merges per metadata key instead of being replaced
//! wholesale.
//!
//! Two conditions abort the whole parse: a node that classifies neither as
//! Token nor as Group, and a Token found at the document root. There is no
//! partial graph on error.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::renderers::ReadFileFn;
use crate::spec::{classify, Context, Extensions, NodeKind, TokenNode};
use crate::spec::{EXTENSIONS_KEY, TEMPLATE_WILDCARD_KEY};
use crate::variable::{TokenVariable, TokenVariableSet};

/// Named reference to a node on the current ancestor path.
#[derive(Clone, Copy)]
struct NodeRef<'a> {
    name: &'a str,
    node: &'a Value,
}

/// Options of [`parse_design_token_file`]
#[derive(Default)]
pub struct ParseDesignTokenFileOptions {
    /// Custom function to read the specification file, defaulting to
    /// [`std::fs::read_to_string`]
    pub read_file: Option<ReadFileFn>,
    /// Context overriding the information determined from the file itself
    /// (the base path defaults to the file's directory)
    pub specification_context: Option<Context>,
}

/// Parse a specification document into the flat set of token variables.
///
/// A document whose top-level keys are all reserved (`$`-prefixed) yields an
/// empty set.
///
/// # Errors
///
/// Returns [`Error::Parse`] when a node cannot be classified or when the
/// document root is itself a token.
pub fn parse_design_token(
    document: &Value,
    context: Option<Context>,
) -> Result<TokenVariableSet> {
    let mut set = TokenVariableSet::new();
    if let Some(obj) = document.as_object() {
        if obj.keys().all(|key| key.starts_with('$')) {
            return Ok(set);
        }
    }
    let context = context.map(Arc::new);
    walk(document, None, &[], context.as_ref(), &mut set)?;
    Ok(set)
}

/// Read, JSON-parse and graph-build a specification file.
///
/// The context base path defaults to the file's parent directory so relative
/// `o3rTargetFile` paths resolve next to the specification; the provided
/// context overrides field by field.
pub fn parse_design_token_file(
    specification_file_path: &Path,
    options: ParseDesignTokenFileOptions,
) -> Result<TokenVariableSet> {
    let content = match &options.read_file {
        Some(read_file) => read_file(specification_file_path)?,
        None => std::fs::read_to_string(specification_file_path)?,
    };
    let document: Value = serde_json::from_str(&content)?;

    let mut context = Context {
        base_path: specification_file_path.parent().map(Path::to_path_buf),
        template: None,
    };
    if let Some(overrides) = options.specification_context {
        if let Some(base_path) = overrides.base_path {
            context.base_path = Some(base_path);
        }
        context.template = overrides.template;
    }
    parse_design_token(&document, Some(context))
}

fn walk(
    node: &Value,
    node_name: Option<&str>,
    ancestors: &[NodeRef<'_>],
    context: Option<&Arc<Context>>,
    set: &mut TokenVariableSet,
) -> Result<()> {
    let Some(kind) = classify(node) else {
        return Err(Error::Parse {
            message: "Fail to determine the design token node type".to_string(),
        });
    };

    if matches!(kind, NodeKind::Group | NodeKind::TokenGroup) {
        // Group shape implies an object node
        let obj = node.as_object().ok_or_else(|| Error::Parse {
            message: "Fail to determine the design token node type".to_string(),
        })?;
        let mut child_ancestors = ancestors.to_vec();
        if let Some(name) = node_name {
            child_ancestors.push(NodeRef { name, node });
        }
        for (child_name, child_node) in obj.iter().filter(|(key, _)| !key.starts_with('$')) {
            walk(child_node, Some(child_name), &child_ancestors, context, set)?;
        }
    }

    if matches!(kind, NodeKind::Token | NodeKind::TokenGroup) {
        let Some(name) = node_name else {
            return Err(Error::Parse {
                message: "The first node of the design specification cannot be a token"
                    .to_string(),
            });
        };
        let mut chain = ancestors.to_vec();
        chain.push(NodeRef { name, node });

        let token_reference_name = chain
            .iter()
            .map(|node_ref| node_ref.name)
            .collect::<Vec<_>>()
            .join(".");
        let token_node = TokenNode::from_node(node);
        let variable = TokenVariable {
            description: token_node.description.clone(),
            extensions: fold_extensions(&chain, context.map(Arc::as_ref)),
            node: token_node,
            ancestors: ancestors
                .iter()
                .map(|node_ref| node_ref.name.to_string())
                .collect(),
            parent: ancestors.last().map(|node_ref| node_ref.name.to_string()),
            context: context.cloned(),
            token_reference_name: token_reference_name.clone(),
        };
        set.insert(token_reference_name, variable);
    }

    Ok(())
}

/// Fold the extension bags of the ancestor chain (self included), root first.
///
/// At every level, the template nodes addressing that level's path contribute
/// first, then the document node's own bag. `o3rMetadata` merges per key so
/// ancestor metadata survives unless overridden: template metadata, then the
/// accumulated metadata, then the node's own.
fn fold_extensions(chain: &[NodeRef<'_>], context: Option<&Context>) -> Extensions {
    let template = context.and_then(|c| c.template.as_ref());
    let mut acc = Extensions::default();

    for i in 0..chain.len() {
        let path: Vec<&str> = chain[..=i].iter().map(|node_ref| node_ref.name).collect();
        let template_nodes = template_nodes_for_path(template, &path);

        // Precedence within one level: template defaults, then the values
        // accumulated so far, then the node's own bag.
        let mut level = Extensions::default();
        let mut metadata = Map::new();
        for template_node in &template_nodes {
            if let Some(bag) = node_extensions(template_node) {
                merge_metadata(&mut metadata, bag);
                level.apply_bag(bag);
            }
        }
        level.apply_overrides(&acc);
        for (key, value) in &acc.metadata {
            metadata.insert(key.clone(), value.clone());
        }
        if let Some(bag) = node_extensions(chain[i].node) {
            level.apply_bag(bag);
            merge_metadata(&mut metadata, bag);
        }
        level.metadata = metadata;
        acc = level;
    }
    acc
}

/// Template nodes addressing a document path, explicit name first then the
/// `*` wildcard, at every level.
fn template_nodes_for_path<'a>(template: Option<&'a Value>, path: &[&str]) -> Vec<&'a Value> {
    let Some(template) = template else {
        return Vec::new();
    };
    let mut nodes = vec![template];
    for name in path {
        nodes = nodes
            .iter()
            .flat_map(|node| [node.get(*name), node.get(TEMPLATE_WILDCARD_KEY)])
            .flatten()
            .collect();
    }
    nodes
}

fn node_extensions(node: &Value) -> Option<&Map<String, Value>> {
    node.get(EXTENSIONS_KEY).and_then(Value::as_object)
}

fn merge_metadata(metadata: &mut Map<String, Value>, bag: &Map<String, Value>) {
    if let Some(meta) = bag.get("o3rMetadata").and_then(Value::as_object) {
        for (key, value) in meta {
            metadata.insert(key.clone(), value.clone());
        }
    }
}
