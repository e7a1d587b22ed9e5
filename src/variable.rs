//! Token variables and the computed-value protocol
//!
//! A [`TokenVariable`] is the parsed, queryable representation of one Token
//! within a specific graph: its dotted reference name, a handle to the source
//! node, the folded extension bag and the ancestor path. The flat mapping of
//! all variables produced by one parse pass is the [`TokenVariableSet`].
//!
//! The derived operations (`css_raw_value`, `references`, `is_alias`,
//! `references_node`, `resolved_type`, `key`) are recomputed on demand and
//! take the *current* set as a parameter rather than capturing it, so a
//! variable can be queried against a different set (e.g. a filtered or merged
//! one) without re-parsing, and the graph stays serializable.
//!
//! ## Value rendering
//!
//! `css_raw_value` turns the raw `$value` into an implementation-agnostic
//! literal string according to the token's *declared* type only; references
//! embedded in the value are left as `{dotted.name}` expressions for the
//! format renderers to substitute. Composite types (border, gradient, shadow,
//! transition, typography, strokeStyle, cubicBezier) are flattened to their
//! canonical space/comma-joined form. A declared type outside the supported
//! list is a fatal rendering error.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::spec::{Context, Extensions, TokenNode};

/// Pattern matching a `{dotted.name}` reference inside a raw value.
static TOKEN_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("invalid token reference pattern"));

/// Pattern matching a value that is, in its entirety, a single reference.
static ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{[^}]*\}$").expect("invalid alias pattern"));

/// Pattern splitting a leading numeric part from its unit.
static SPLIT_NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?\d+[,.]?\d*)\s*([^\s,.;]+)?").expect("invalid numeric split pattern")
});

/// Pattern collapsing separators when rendering a reference name as a key.
static KEY_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ .]+").expect("invalid key separator pattern"));

/// Pattern stripping bracket characters from a rendered key.
static KEY_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[()\[\]]+").expect("invalid key strip pattern"));

/// Complete flat mapping of the parsed design tokens, keyed by reference name.
pub type TokenVariableSet = BTreeMap<String, TokenVariable>;

/// Function rendering the key of a token variable (e.g. to add a prefix).
///
/// Reference-counted so one key renderer can drive both the value and the
/// definition renderer of a format.
pub type TokenKeyRenderer = Rc<dyn Fn(&TokenVariable) -> String>;

/// Parsed design token variable
#[derive(Debug, Clone)]
pub struct TokenVariable {
    /// Name of the token in references (dotted ancestor path + own name)
    pub token_reference_name: String,
    /// Reserved fields of the source Token node
    pub node: TokenNode,
    /// Description of the token
    pub description: Option<String>,
    /// Extension bag folded over all ancestors, root first
    pub extensions: Extensions,
    /// Names of the ancestor groups, outermost first
    pub ancestors: Vec<String>,
    /// Name of the direct parent group, if any
    pub parent: Option<String>,
    /// Context of the specification document the token was parsed from
    pub context: Option<Arc<Context>>,
}

impl TokenVariable {
    /// Raw value of the token rendered as a literal string for its declared type.
    ///
    /// References embedded in the value are kept verbatim; substituting them
    /// is the responsibility of the per-format value renderers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] when the declared `$type` is not
    /// supported, or when the token has neither a type nor a value.
    pub fn css_raw_value(&self, _set: &TokenVariableSet) -> Result<String> {
        let value = &self.node.value;
        let Some(token_type) = self.node.token_type.as_deref() else {
            if !value.is_null() {
                return Ok(value_to_string(value));
            }
            return Err(self.unsupported_type_error("unknown"));
        };

        match token_type {
            "string" => Ok(format!(
                "\"{}\"",
                apply_conversion(
                    &self.extensions,
                    &sanitize_string_value(&value_to_string(value))
                )
            )),
            "color" | "number" | "duration" | "fontWeight" | "fontFamily" | "dimension" => {
                Ok(apply_conversion(&self.extensions, &value_to_string(value)))
            }
            "strokeStyle" => Ok(render_stroke_style(value)),
            "cubicBezier" => match value {
                Value::Array(items) => Ok(items
                    .iter()
                    .map(|item| apply_conversion(&self.extensions, &value_to_string(item)))
                    .collect::<Vec<_>>()
                    .join(", ")),
                other => Ok(value_to_string(other)),
            },
            "border" => match value {
                Value::String(s) => Ok(s.clone()),
                other => Ok(format!(
                    "{} {} {}",
                    apply_conversion(&self.extensions, &field_string(other, "width")),
                    other
                        .get("style")
                        .map(render_stroke_style)
                        .unwrap_or_default(),
                    field_string(other, "color")
                )),
            },
            "gradient" => match value {
                Value::String(s) => Ok(s.clone()),
                other => Ok(self.render_gradient(other)),
            },
            "shadow" => match value {
                Value::String(s) => Ok(s.clone()),
                other => Ok(self.render_shadow(other)),
            },
            "transition" => match value {
                Value::String(s) => Ok(s.clone()),
                other => Ok(self.render_transition(other)),
            },
            "typography" => match value {
                Value::String(s) => Ok(s.clone()),
                other => Ok(self.render_typography(other)),
            },
            unsupported => Err(self.unsupported_type_error(unsupported)),
        }
    }

    /// List of the `{dotted.name}` references found in the raw value, in
    /// order of appearance, duplicates included.
    pub fn references(&self, set: &TokenVariableSet) -> Result<Vec<String>> {
        let raw_value = self.css_raw_value(set)?;
        Ok(TOKEN_REFERENCE_RE
            .captures_iter(&raw_value)
            .map(|caps| caps[1].to_string())
            .collect())
    }

    /// Determine if the token is an alias: its entire value is a single
    /// reference expression, nothing else.
    pub fn is_alias(&self, set: &TokenVariableSet) -> Result<bool> {
        Ok(self.references(set)?.len() == 1
            && matches!(&self.node.value, Value::String(s) if ALIAS_RE.is_match(s)))
    }

    /// Referenced variables registered in `set`, in order of appearance.
    ///
    /// References to names missing from `set` are silently dropped here;
    /// unregistered references are a renderer-level concern.
    pub fn references_node<'a>(&self, set: &'a TokenVariableSet) -> Result<Vec<&'a TokenVariable>> {
        Ok(self
            .references(set)?
            .iter()
            .filter_map(|name| set.get(name))
            .collect())
    }

    /// Type calculated for the token.
    ///
    /// The explicit `$type` wins. When `follow_reference` is enabled and the
    /// token is a pure alias, the type of the alias target is used; failing
    /// that, the type of the direct parent group's own entry in `set` (looked
    /// up by the parent's short name). Cyclic alias chains terminate the
    /// lookup instead of recursing forever.
    pub fn resolved_type(
        &self,
        set: &TokenVariableSet,
        follow_reference: bool,
    ) -> Result<Option<String>> {
        let mut seen = HashSet::new();
        self.resolved_type_guarded(set, follow_reference, &mut seen)
    }

    fn resolved_type_guarded(
        &self,
        set: &TokenVariableSet,
        follow_reference: bool,
        seen: &mut HashSet<String>,
    ) -> Result<Option<String>> {
        if let Some(token_type) = &self.node.token_type {
            return Ok(Some(token_type.clone()));
        }
        if !follow_reference || !seen.insert(self.token_reference_name.clone()) {
            return Ok(None);
        }
        if self.is_alias(set)? {
            if let Some(target) = self.references_node(set)?.first() {
                if let Some(token_type) =
                    target.resolved_type_guarded(set, follow_reference, seen)?
                {
                    return Ok(Some(token_type));
                }
            }
        }
        if let Some(parent_name) = &self.parent {
            if let Some(parent_variable) = set.get(parent_name) {
                if let Some(token_type) =
                    parent_variable.resolved_type_guarded(set, follow_reference, seen)?
                {
                    return Ok(Some(token_type));
                }
            }
        }
        Ok(None)
    }

    /// Key of the token as rendered by the provided renderer, defaulting to
    /// the sanitized reference name (`.`/space runs become `-`, brackets are
    /// stripped).
    pub fn key(&self, key_renderer: Option<&TokenKeyRenderer>) -> String {
        match key_renderer {
            Some(renderer) => renderer(self),
            None => sanitize_key_name(&self.token_reference_name),
        }
    }

    fn render_gradient(&self, value: &Value) -> String {
        let angle = match value.get("angle") {
            Some(Value::Number(n)) => format!("{}deg", number_to_string(n)),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => "0deg".to_string(),
        };
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("linear");
        let stops = value
            .get("stops")
            .and_then(Value::as_array)
            .map(|stops| {
                stops
                    .iter()
                    .map(|stop| {
                        let position = match stop.get("position") {
                            Some(Value::Number(n)) => format!("{}%", number_to_string(n)),
                            Some(other) => value_to_string(other),
                            None => String::new(),
                        };
                        format!("{} {}", field_string(stop, "color"), position)
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        format!("{kind}-gradient({angle}, {stops})")
    }

    fn render_shadow(&self, value: &Value) -> String {
        let layers: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        layers
            .iter()
            .map(|layer| {
                // The double space before the spread is legacy formatting kept
                // for output compatibility.
                format!(
                    "{} {} {}  {} {}",
                    apply_conversion(&self.extensions, &field_string(layer, "offsetX")),
                    apply_conversion(&self.extensions, &field_string(layer, "offsetY")),
                    apply_conversion(&self.extensions, &field_string(layer, "blur")),
                    apply_conversion(&self.extensions, &field_string(layer, "spread")),
                    field_string(layer, "color")
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn render_transition(&self, value: &Value) -> String {
        let timing_function = match value.get("timingFunction") {
            Some(Value::Array(items)) => items
                .iter()
                .map(value_to_string)
                .collect::<Vec<_>>()
                .join(" "),
            Some(other) => value_to_string(other),
            None => String::new(),
        };
        format!(
            "{} {} {}",
            timing_function,
            apply_conversion(&self.extensions, &field_string(value, "duration")),
            apply_conversion(&self.extensions, &field_string(value, "delay"))
        )
    }

    fn render_typography(&self, value: &Value) -> String {
        format!(
            "{} {} {} {} {}",
            apply_conversion(&self.extensions, &field_string(value, "fontWeight")),
            field_string(value, "fontFamily"),
            apply_conversion(&self.extensions, &field_string(value, "fontSize")),
            apply_conversion(&self.extensions, &field_string(value, "letterSpacing")),
            apply_conversion(&self.extensions, &field_string(value, "lineHeight"))
        )
    }

    fn unsupported_type_error(&self, type_name: &str) -> Error {
        let value = value_to_string(&self.node.value);
        Error::UnsupportedType {
            token: self.token_reference_name.clone(),
            type_name: type_name.to_string(),
            value: if value.is_empty() {
                "unknown".to_string()
            } else {
                value
            },
        }
    }
}

/// Render a reference name as a key: separators become `-`, brackets are stripped.
pub fn sanitize_key_name(name: &str) -> String {
    let dashed = KEY_SEPARATOR_RE.replace_all(name, "-");
    KEY_STRIP_RE.replace_all(&dashed, "").to_string()
}

/// Stroke styles are either a keyword string or a `{dashArray, lineCap}`
/// object flattened to `<lineCap> <dash...>`.
fn render_stroke_style(value: &Value) -> String {
    match value {
        Value::Object(_) => {
            let line_cap = field_string(value, "lineCap");
            let dash_array = value
                .get("dashArray")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .map(value_to_string)
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            format!("{line_cap} {dash_array}").trim().to_string()
        }
        other => value_to_string(other),
    }
}

/// Escape backslashes and double quotes for quoted string values.
fn sanitize_string_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Apply the unit/ratio numeric conversion hints to a rendered value.
///
/// Both `o3rUnit` and `o3rRatio` must be present for the conversion to apply.
/// The leading numeric part is multiplied by the ratio (rounded to three
/// decimals) and the trailing unit is replaced (or appended to a bare number).
pub(crate) fn apply_conversion(extensions: &Extensions, value: &str) -> String {
    let (Some(unit), Some(ratio)) = (extensions.unit.as_deref(), extensions.ratio) else {
        return value.to_string();
    };
    let Some(caps) = SPLIT_NUMERIC_RE.captures(value) else {
        return value.to_string();
    };

    let Some(float_match) = caps.get(1) else {
        return value.to_string();
    };
    let float_str = float_match.as_str();
    // A comma terminates the numeric part, matching lenient float parsing
    let numeric: f64 = float_str
        .split(',')
        .next()
        .unwrap_or(float_str)
        .parse()
        .unwrap_or(0.0);
    let converted = (numeric * ratio * 1000.0).round() / 1000.0;
    let new_value = value.replacen(float_str, &format_number(converted), 1);

    if let Some(unit_match) = caps.get(2) {
        new_value.replacen(unit_match.as_str(), unit, 1)
    } else if float_str == value {
        format!("{new_value}{unit}")
    } else {
        new_value
    }
}

/// String form of a JSON value, shaped like dynamic stringification:
/// arrays comma-join their items, objects fall back to their JSON form.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_to_string(n),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
        Value::Null => String::new(),
    }
}

fn number_to_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(f) = n.as_f64() {
        return format_number(f);
    }
    n.to_string()
}

fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

fn field_string(value: &Value, field: &str) -> String {
    value.get(field).map(value_to_string).unwrap_or_default()
}
