//! Design token specification model
//!
//! Data shapes of the Design Token Community Group format as consumed by the
//! parser. A specification document is an arbitrary JSON tree; every node is
//! either a *Token* (a leaf holding a `$value` and optionally a `$type`) or a
//! *Group* (a container of named child nodes). Classification is duck-typed
//! on the node shape and computed exactly once per node during the parse
//! walk:
//!
//! - a node exposing a `$type`, or a string-typed `$value`, is a Token;
//! - an object with at least one key not starting with `$` is a Group;
//! - a node matching both rules is both (the group children are walked and
//!   the node itself is registered as a token);
//! - a node matching neither rule is a hard parse error.
//!
//! The module also defines the [`Extensions`] bag: per-node metadata
//! inherited down the tree (target file, private, important, scope,
//! unit/ratio conversion hints, free-form metadata, expect-override).

use std::path::PathBuf;

use serde_json::{Map, Value};

/// Reserved key holding a token value.
pub const VALUE_KEY: &str = "$value";
/// Reserved key holding an explicit token type.
pub const TYPE_KEY: &str = "$type";
/// Reserved key holding a node description.
pub const DESCRIPTION_KEY: &str = "$description";
/// Reserved key holding the node extension bag.
pub const EXTENSIONS_KEY: &str = "$extensions";
/// Template key matching all children not explicitly addressed at a level.
pub const TEMPLATE_WILDCARD_KEY: &str = "*";

/// Classification of a specification node, computed once per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Leaf node holding a value
    Token,
    /// Container of named child nodes
    Group,
    /// Node holding a value and also carrying named children
    TokenGroup,
}

/// Determine if the node is a Token (exposes a `$type` or a string `$value`).
pub fn is_token(node: &Value) -> bool {
    node.as_object().is_some_and(|obj| {
        obj.contains_key(TYPE_KEY) || matches!(obj.get(VALUE_KEY), Some(Value::String(_)))
    })
}

/// Determine if the node is a Group (an object with at least one non-`$` key).
pub fn is_group(node: &Value) -> bool {
    node.as_object()
        .is_some_and(|obj| obj.keys().any(|k| !k.starts_with('$')))
}

/// Classify a specification node, or `None` when the node matches neither shape.
pub fn classify(node: &Value) -> Option<NodeKind> {
    match (is_token(node), is_group(node)) {
        (true, true) => Some(NodeKind::TokenGroup),
        (true, false) => Some(NodeKind::Token),
        (false, true) => Some(NodeKind::Group),
        (false, false) => None,
    }
}

/// Owned view of a Token node's reserved fields
///
/// The raw `$value` is kept as JSON: its concrete shape depends on the token
/// type and is only interpreted at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenNode {
    /// Raw `$value` of the token (`Value::Null` when absent)
    pub value: Value,
    /// Explicit `$type`, when declared
    pub token_type: Option<String>,
    /// `$description` of the token
    pub description: Option<String>,
    /// The token's own (unfolded) `$extensions` bag
    pub raw_extensions: Option<Map<String, Value>>,
}

impl TokenNode {
    /// Extract the reserved fields of a Token node.
    pub fn from_node(node: &Value) -> Self {
        let obj = node.as_object();
        Self {
            value: obj
                .and_then(|o| o.get(VALUE_KEY))
                .cloned()
                .unwrap_or(Value::Null),
            token_type: obj
                .and_then(|o| o.get(TYPE_KEY))
                .and_then(Value::as_str)
                .map(str::to_string),
            description: obj
                .and_then(|o| o.get(DESCRIPTION_KEY))
                .and_then(Value::as_str)
                .map(str::to_string),
            raw_extensions: obj
                .and_then(|o| o.get(EXTENSIONS_KEY))
                .and_then(Value::as_object)
                .cloned(),
        }
    }
}

/// Context of a specification document
///
/// Carries the information determined (or overridden) when the document was
/// loaded: the base path used to resolve relative target-file paths, and the
/// default template overlay applied during extension folding.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Base path used to resolve relative output file paths
    pub base_path: Option<PathBuf>,
    /// Template tree providing default common fields per node path
    pub template: Option<Value>,
}

/// Folded extension bag of a token
///
/// Extension bags are inherited down the tree: ancestor Group bags are folded
/// root-first with a shallow per-key merge, the token's own bag last. The
/// `o3rMetadata` field is the exception: it merges per metadata key so
/// ancestor metadata survives unless a descendant overrides a given key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions {
    /// File where the token definition should be generated (`o3rTargetFile`)
    pub target_file: Option<String>,
    /// The token does not get a public, reference-able definition (`o3rPrivate`)
    pub private: Option<bool>,
    /// Append a forced-priority marker to the rendered value (`o3rImportant`)
    pub important: Option<bool>,
    /// Free-form descriptive payload merged across ancestors (`o3rMetadata`)
    pub metadata: Map<String, Value>,
    /// Scope block wrapping the emitted definition (`o3rScope`)
    pub scope: Option<String>,
    /// Unit replacing the one of the numeric value (`o3rUnit`)
    pub unit: Option<String>,
    /// Ratio applied to the numeric value (`o3rRatio`)
    pub ratio: Option<f64>,
    /// Force reference-style emission with the value as fallback (`o3rExpectOverride`)
    pub expect_override: Option<bool>,
    /// Reserved flag for structural expansion of composite types (`o3rExplodeComplexTypes`)
    pub explode_complex_types: Option<bool>,
}

impl Extensions {
    /// Overlay the scalar fields of a raw `$extensions` bag onto this bag.
    ///
    /// Keys present in `bag` overwrite the current values; absent keys leave
    /// them untouched. The `o3rMetadata` field is not handled here: its
    /// nested merge order differs from the scalar fields and is driven by the
    /// parser's fold.
    pub fn apply_bag(&mut self, bag: &Map<String, Value>) {
        if let Some(v) = bag.get("o3rTargetFile").and_then(Value::as_str) {
            self.target_file = Some(v.to_string());
        }
        if let Some(v) = bag.get("o3rPrivate").and_then(Value::as_bool) {
            self.private = Some(v);
        }
        if let Some(v) = bag.get("o3rImportant").and_then(Value::as_bool) {
            self.important = Some(v);
        }
        if let Some(v) = bag.get("o3rScope").and_then(Value::as_str) {
            self.scope = Some(v.to_string());
        }
        if let Some(v) = bag.get("o3rUnit").and_then(Value::as_str) {
            self.unit = Some(v.to_string());
        }
        if let Some(v) = bag.get("o3rRatio").and_then(Value::as_f64) {
            self.ratio = Some(v);
        }
        if let Some(v) = bag.get("o3rExpectOverride").and_then(Value::as_bool) {
            self.expect_override = Some(v);
        }
        if let Some(v) = bag.get("o3rExplodeComplexTypes").and_then(Value::as_bool) {
            self.explode_complex_types = Some(v);
        }
    }

    /// Overlay the fields set in `overrides` onto this bag, leaving the other
    /// fields untouched.
    ///
    /// Used by the extension fold where values accumulated from the document
    /// take precedence over the template defaults of a deeper level. The
    /// `o3rMetadata` field is excluded, as for [`Extensions::apply_bag`].
    pub fn apply_overrides(&mut self, overrides: &Extensions) {
        if let Some(v) = &overrides.target_file {
            self.target_file = Some(v.clone());
        }
        if let Some(v) = overrides.private {
            self.private = Some(v);
        }
        if let Some(v) = overrides.important {
            self.important = Some(v);
        }
        if let Some(v) = &overrides.scope {
            self.scope = Some(v.clone());
        }
        if let Some(v) = &overrides.unit {
            self.unit = Some(v.clone());
        }
        if let Some(v) = overrides.ratio {
            self.ratio = Some(v);
        }
        if let Some(v) = overrides.expect_override {
            self.expect_override = Some(v);
        }
        if let Some(v) = overrides.explode_complex_types {
            self.explode_complex_types = Some(v);
        }
    }

    /// Shortcut for `private == Some(true)`.
    pub fn is_private(&self) -> bool {
        self.private.unwrap_or(false)
    }

    /// Shortcut for `important == Some(true)`.
    pub fn is_important(&self) -> bool {
        self.important.unwrap_or(false)
    }

    /// Shortcut for `expect_override == Some(true)`.
    pub fn is_expect_override(&self) -> bool {
        self.expect_override.unwrap_or(false)
    }
}
