//! CSS custom-property renderers
//!
//! The default output format: one `--key: value;` statement per public token,
//! merged into the target style sheet between a pair of comment tags. On
//! first emission into an unmanaged file the block is appended wrapped in a
//! `:root` rule; afterwards only the content between the tags is replaced.
//!
//! Reference substitution addresses public registered tokens as
//! `var(--key)`. A private or expect-override target is not independently
//! addressable in the output, so the reference keeps the `var()` form but
//! carries the target's resolved value as fallback:
//! `var(--key, <fallback>)`. References to names missing from the set fall
//! back to a plain `var(--key)` and are reported through the `log` facade.

use crate::error::Result;
use crate::renderers::{
    DesignContentUpdater, TokenDefinitionRenderer, TokenValueRenderer,
    UnregisteredReferenceRenderer,
};
use crate::variable::{sanitize_key_name, TokenKeyRenderer, TokenVariable, TokenVariableSet};

/// Default tag opening the managed block of a style sheet.
pub const CSS_START_TAG: &str = "/* --- BEGIN THEME Auto-generated --- */";
/// Default tag closing the managed block of a style sheet.
pub const CSS_END_TAG: &str = "/* --- END THEME Auto-generated --- */";

/// Options of the CSS value renderer
#[derive(Default)]
pub struct CssTokenValueRendererOptions {
    /// Renderer substituting references to unregistered token names,
    /// defaulting to a plain `var(--key)` plus a warning
    pub unregistered_reference_renderer: Option<UnregisteredReferenceRenderer>,
    /// Custom key renderer for the substituted references
    pub token_variable_name_renderer: Option<TokenKeyRenderer>,
}

/// Options of the CSS definition renderer
#[derive(Default)]
pub struct CssTokenDefinitionRendererOptions {
    /// Value renderer, defaulting to the CSS one with the same key renderer
    pub token_value_renderer: Option<TokenValueRenderer>,
    /// Custom key renderer for the emitted variable names
    pub token_variable_name_renderer: Option<TokenKeyRenderer>,
    /// Renderer receiving the private tokens (e.g. the Sass definition
    /// renderer); private tokens are skipped entirely when absent
    pub private_definition_renderer: Option<TokenDefinitionRenderer>,
}

/// Options of the CSS content updater
#[derive(Default)]
pub struct CssStyleContentUpdaterOptions {
    /// Tag opening the managed block, defaulting to [`CSS_START_TAG`]
    pub start_tag: Option<String>,
    /// Tag closing the managed block, defaulting to [`CSS_END_TAG`]
    pub end_tag: Option<String>,
}

/// Build the CSS value renderer.
pub fn get_css_token_value_renderer(options: CssTokenValueRendererOptions) -> TokenValueRenderer {
    let CssTokenValueRendererOptions {
        unregistered_reference_renderer,
        token_variable_name_renderer,
    } = options;
    Box::new(move |variable, set, enforce_reference| {
        let mut visited = vec![variable.token_reference_name.clone()];
        let mut value = substitute_references(
            variable,
            set,
            token_variable_name_renderer.as_ref(),
            unregistered_reference_renderer.as_ref(),
            &mut visited,
        )?;
        if enforce_reference {
            value = format!(
                "var(--{}, {})",
                variable.key(token_variable_name_renderer.as_ref()),
                value
            );
        }
        if variable.extensions.is_important() && !value.is_empty() {
            value.push_str(" !important");
        }
        Ok(value)
    })
}

/// Build the CSS definition renderer.
///
/// Private tokens are delegated to the optional private-definition renderer,
/// or skipped when none is configured. A token flagged expect-override emits
/// its own key as reference with the value as fallback, and the scope
/// extension wraps the final statement.
pub fn get_css_token_definition_renderer(
    options: CssTokenDefinitionRendererOptions,
) -> TokenDefinitionRenderer {
    let CssTokenDefinitionRendererOptions {
        token_value_renderer,
        token_variable_name_renderer,
        private_definition_renderer,
    } = options;
    let token_value_renderer = token_value_renderer.unwrap_or_else(|| {
        get_css_token_value_renderer(CssTokenValueRendererOptions {
            unregistered_reference_renderer: None,
            token_variable_name_renderer: token_variable_name_renderer.clone(),
        })
    });
    Box::new(move |variable, set| {
        if variable.extensions.is_private() {
            return match &private_definition_renderer {
                Some(renderer) => renderer(variable, set),
                None => Ok(None),
            };
        }
        let key = variable.key(token_variable_name_renderer.as_ref());
        let value = token_value_renderer(variable, set, variable.extensions.is_expect_override())?;
        let mut statement = format!("--{key}: {value};");
        if let Some(scope) = &variable.extensions.scope {
            statement = format!("{scope} {{ {statement} }}");
        }
        Ok(Some(statement))
    })
}

/// Build the CSS content updater.
///
/// When the current content carries both tags, everything between them is
/// replaced; otherwise a new managed block wrapped in a `:root` rule is
/// appended. Updating twice with the same statements is byte-stable.
pub fn get_css_style_content_updater(
    options: CssStyleContentUpdaterOptions,
) -> DesignContentUpdater {
    let start_tag = options.start_tag.unwrap_or_else(|| CSS_START_TAG.to_string());
    let end_tag = options.end_tag.unwrap_or_else(|| CSS_END_TAG.to_string());
    Box::new(move |variables, _file, content| {
        let block = variables.join("\n");
        if let (Some(start), Some(end)) = (content.find(&start_tag), content.find(&end_tag)) {
            if start < end {
                return format!(
                    "{}{}\n{}\n{}",
                    &content[..start],
                    start_tag,
                    block,
                    &content[end..]
                );
            }
        }
        format!("{content}\n:root {{\n{start_tag}\n{block}\n{end_tag}\n}}\n")
    })
}

fn substitute_references(
    variable: &TokenVariable,
    set: &TokenVariableSet,
    key_renderer: Option<&TokenKeyRenderer>,
    unregistered_reference_renderer: Option<&UnregisteredReferenceRenderer>,
    visited: &mut Vec<String>,
) -> Result<String> {
    let mut value = variable.css_raw_value(set)?;
    for reference in variable.references(set)? {
        let expression = format!("{{{reference}}}");
        let replacement = match set.get(&reference) {
            Some(target) => {
                let key = target.key(key_renderer);
                let inlined =
                    target.extensions.is_private() || target.extensions.is_expect_override();
                if inlined && !visited.contains(&target.token_reference_name) {
                    visited.push(target.token_reference_name.clone());
                    let fallback = substitute_references(
                        target,
                        set,
                        key_renderer,
                        unregistered_reference_renderer,
                        visited,
                    )?;
                    visited.pop();
                    format!("var(--{key}, {fallback})")
                } else {
                    format!("var(--{key})")
                }
            }
            None => match unregistered_reference_renderer {
                Some(renderer) => renderer(&reference),
                None => {
                    log::warn!("Token {reference} is not registered");
                    format!("var(--{})", sanitize_key_name(&reference))
                }
            },
        };
        value = value.replacen(&expression, &replacement, 1);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_design_token;
    use serde_json::json;
    use std::path::Path;
    use std::rc::Rc;

    fn parse(document: serde_json::Value) -> TokenVariableSet {
        parse_design_token(&document, None).unwrap()
    }

    fn render(set: &TokenVariableSet, name: &str) -> Option<String> {
        let renderer = get_css_token_definition_renderer(Default::default());
        renderer(&set[name], set).unwrap()
    }

    mod value_renderer_tests {
        use super::*;

        #[test]
        fn test_public_reference_addressed() {
            let set = parse(json!({
                "example": {
                    "var1": {"$value": "#000", "$type": "color"},
                    "color": {"$value": "{example.var1}"}
                }
            }));
            assert_eq!(
                render(&set, "example.color").unwrap(),
                "--example-color: var(--example-var1);"
            );
        }

        #[test]
        fn test_private_reference_carries_fallback() {
            let set = parse(json!({
                "example": {
                    "test": {
                        "height": {
                            "$value": "2.3",
                            "$type": "number",
                            "$extensions": {"o3rPrivate": true}
                        },
                        "width": {"$value": "{example.test.height}"}
                    }
                }
            }));
            assert_eq!(
                render(&set, "example.test.width").unwrap(),
                "--example-test-width: var(--example-test-height, 2.3);"
            );
            assert_eq!(render(&set, "example.test.height"), None);
        }

        #[test]
        fn test_unregistered_reference_warns_and_falls_back() {
            testing_logger::setup();
            let set = parse(json!({
                "example": {
                    "wrong-ref": {"$value": "{example.missing}"}
                }
            }));
            assert_eq!(
                render(&set, "example.wrong-ref").unwrap(),
                "--example-wrong-ref: var(--example-missing);"
            );
            testing_logger::validate(|captured_logs| {
                assert!(captured_logs
                    .iter()
                    .any(|log| log.level == log::Level::Warn
                        && log.body.contains("example.missing")));
            });
        }

        #[test]
        fn test_custom_unregistered_renderer() {
            let set = parse(json!({
                "broken": {"$value": "{missing}"}
            }));
            let value_renderer = get_css_token_value_renderer(CssTokenValueRendererOptions {
                unregistered_reference_renderer: Some(Box::new(|name| {
                    format!("var(--{name}, inherit)")
                })),
                token_variable_name_renderer: None,
            });
            assert_eq!(
                value_renderer(&set["broken"], &set, false).unwrap(),
                "var(--missing, inherit)"
            );
        }

        #[test]
        fn test_important_flag_appended() {
            let set = parse(json!({
                "example": {
                    "var-important": {
                        "$value": "#000",
                        "$type": "color",
                        "$extensions": {"o3rImportant": true}
                    }
                }
            }));
            assert_eq!(
                render(&set, "example.var-important").unwrap(),
                "--example-var-important: #000 !important;"
            );
        }

        #[test]
        fn test_reference_cycle_degrades_to_plain_reference() {
            let set = parse(json!({
                "a": {"$value": "{b}", "$extensions": {"o3rPrivate": false}},
                "b": {"$value": "{a}", "$extensions": {"o3rPrivate": true}}
            }));
            // b is private so a wants b's value inlined, which references a again
            let statement = render(&set, "a").unwrap();
            assert_eq!(statement, "--a: var(--b, var(--a));");
        }
    }

    mod definition_renderer_tests {
        use super::*;

        #[test]
        fn test_scope_wraps_statement() {
            let set = parse(json!({
                "var1": {
                    "$value": "#000",
                    "$type": "color",
                    "$extensions": {"o3rScope": ".dark-theme"}
                }
            }));
            assert_eq!(
                render(&set, "var1").unwrap(),
                ".dark-theme { --var1: #000; }"
            );
        }

        #[test]
        fn test_expect_override_emits_self_reference() {
            let set = parse(json!({
                "var1": {
                    "$value": "#000",
                    "$type": "color",
                    "$extensions": {"o3rExpectOverride": true}
                }
            }));
            assert_eq!(
                render(&set, "var1").unwrap(),
                "--var1: var(--var1, #000);"
            );
        }

        #[test]
        fn test_custom_name_renderer_prefixes_key() {
            let set = parse(json!({
                "example": {"var1": {"$value": "#000", "$type": "color"}}
            }));
            let name_renderer: TokenKeyRenderer =
                Rc::new(|variable| format!("prefix-{}", variable.key(None)));
            let renderer = get_css_token_definition_renderer(CssTokenDefinitionRendererOptions {
                token_variable_name_renderer: Some(name_renderer),
                ..Default::default()
            });
            assert_eq!(
                renderer(&set["example.var1"], &set).unwrap().unwrap(),
                "--prefix-example-var1: #000;"
            );
        }
    }

    mod content_updater_tests {
        use super::*;

        #[test]
        fn test_append_wraps_in_root_rule() {
            let updater = get_css_style_content_updater(Default::default());
            let statements = vec!["--var1: #000;".to_string()];
            let content = updater(&statements, Path::new("styles.scss"), "");
            assert!(content.contains(":root {"));
            assert!(content.contains(CSS_START_TAG));
            assert!(content.contains("--var1: #000;"));
            assert!(content.contains(CSS_END_TAG));
        }

        #[test]
        fn test_replace_between_existing_tags() {
            let updater = get_css_style_content_updater(Default::default());
            let existing = format!(
                "// CSS\n:root {{\n{CSS_START_TAG}\n--some-var: #fff;\n{CSS_END_TAG}\n}}\n"
            );
            let statements = vec!["--var1: #000;".to_string()];
            let content = updater(&statements, Path::new("styles.scss"), &existing);
            assert!(!content.contains("--some-var: #fff;"));
            assert!(content.contains("--var1: #000;"));
            assert!(content.starts_with("// CSS\n"));
        }

        #[test]
        fn test_update_is_idempotent() {
            let updater = get_css_style_content_updater(Default::default());
            let statements = vec!["--var1: #000;".to_string(), "--var2: #fff;".to_string()];
            let first = updater(&statements, Path::new("styles.scss"), "");
            let second = updater(&statements, Path::new("styles.scss"), &first);
            assert_eq!(first, second);
        }

        #[test]
        fn test_custom_tags() {
            let updater = get_css_style_content_updater(CssStyleContentUpdaterOptions {
                start_tag: Some("/* --- BEGIN THEME Test --- */".to_string()),
                end_tag: Some("/* --- END THEME Test --- */".to_string()),
            });
            let statements = vec!["--var1: #000;".to_string()];
            let content = updater(&statements, Path::new("styles.scss"), "");
            assert!(content.contains("/* --- BEGIN THEME Test --- */"));
        }
    }
}
