//! Sass variable renderers
//!
//! Emits `$key: value;` statements, with keys camel-cased from the dotted
//! reference name and private tokens prefixed with `_` following the Sass
//! convention for internal variables. The definition renderer does not skip
//! private tokens: it is the usual delegate of the CSS renderer's private
//! branch, giving private tokens a preprocessor-only definition.
//!
//! References substitute the target's Sass variable name directly; a
//! reference to an unregistered name degrades to a guarded existence check so
//! the emitted sheet stays compilable, and is reported through the `log`
//! facade.

use crate::renderers::{
    DesignContentUpdater, TokenDefinitionRenderer, TokenValueRenderer,
    UnregisteredReferenceRenderer,
};
use crate::variable::{TokenKeyRenderer, TokenVariable};

/// Default tag opening the managed block of a Sass sheet.
pub const SASS_START_TAG: &str = "// --- BEGIN THEME Auto-generated ---";
/// Default tag closing the managed block of a Sass sheet.
pub const SASS_END_TAG: &str = "// --- END THEME Auto-generated ---";

/// Options of the Sass value renderer
#[derive(Default)]
pub struct SassTokenValueRendererOptions {
    /// Renderer substituting references to unregistered token names,
    /// defaulting to a `variable-exists` guard plus a warning
    pub unregistered_reference_renderer: Option<UnregisteredReferenceRenderer>,
    /// Custom key renderer for the substituted references
    pub token_variable_name_renderer: Option<TokenKeyRenderer>,
}

/// Options of the Sass definition renderer
#[derive(Default)]
pub struct SassTokenDefinitionRendererOptions {
    /// Value renderer, defaulting to the Sass one with the same key renderer
    pub token_value_renderer: Option<TokenValueRenderer>,
    /// Custom key renderer for the emitted variable names
    pub token_variable_name_renderer: Option<TokenKeyRenderer>,
}

/// Options of the Sass content updater
#[derive(Default)]
pub struct SassStyleContentUpdaterOptions {
    /// Tag opening the managed block, defaulting to [`SASS_START_TAG`]
    pub start_tag: Option<String>,
    /// Tag closing the managed block, defaulting to [`SASS_END_TAG`]
    pub end_tag: Option<String>,
}

/// Default Sass key renderer: camel-cased reference name, `_`-prefixed for
/// private tokens.
pub fn get_sass_token_key_renderer() -> TokenKeyRenderer {
    std::rc::Rc::new(sass_variable_name)
}

/// Build the Sass value renderer.
pub fn get_sass_token_value_renderer(
    options: SassTokenValueRendererOptions,
) -> TokenValueRenderer {
    let SassTokenValueRendererOptions {
        unregistered_reference_renderer,
        token_variable_name_renderer,
    } = options;
    Box::new(move |variable, set, _enforce_reference| {
        let mut value = variable.css_raw_value(set)?;
        for reference in variable.references(set)? {
            let expression = format!("{{{reference}}}");
            let replacement = match set.get(&reference) {
                Some(target) => match &token_variable_name_renderer {
                    Some(renderer) => format!("${}", target.key(Some(renderer))),
                    None => format!("${}", sass_variable_name(target)),
                },
                None => match &unregistered_reference_renderer {
                    Some(renderer) => renderer(&reference),
                    None => {
                        log::warn!("Token {reference} is not registered");
                        let key = camelize(&reference);
                        format!("if(variable-exists({key}), ${key}, null)")
                    }
                },
            };
            value = value.replacen(&expression, &replacement, 1);
        }
        if variable.extensions.is_important() && !value.is_empty() {
            value.push_str(" !important");
        }
        Ok(value)
    })
}

/// Build the Sass definition renderer.
pub fn get_sass_token_definition_renderer(
    options: SassTokenDefinitionRendererOptions,
) -> TokenDefinitionRenderer {
    let SassTokenDefinitionRendererOptions {
        token_value_renderer,
        token_variable_name_renderer,
    } = options;
    let key_renderer = token_variable_name_renderer.unwrap_or_else(get_sass_token_key_renderer);
    let token_value_renderer = token_value_renderer.unwrap_or_else(|| {
        get_sass_token_value_renderer(SassTokenValueRendererOptions {
            unregistered_reference_renderer: None,
            token_variable_name_renderer: Some(key_renderer.clone()),
        })
    });
    Box::new(move |variable, set| {
        let key = variable.key(Some(&key_renderer));
        let value = token_value_renderer(variable, set, false)?;
        Ok(Some(format!("${key}: {value};")))
    })
}

/// Build the Sass content updater: same replace-or-append contract as the CSS
/// one, without the `:root` wrapper on first emission.
pub fn get_sass_style_content_updater(
    options: SassStyleContentUpdaterOptions,
) -> DesignContentUpdater {
    let start_tag = options.start_tag.unwrap_or_else(|| SASS_START_TAG.to_string());
    let end_tag = options.end_tag.unwrap_or_else(|| SASS_END_TAG.to_string());
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
        format!("{content}\n{start_tag}\n{block}\n{end_tag}\n")
    })
}

fn sass_variable_name(variable: &TokenVariable) -> String {
    let camel = camelize(&variable.token_reference_name);
    if variable.extensions.is_private() {
        format!("_{camel}")
    } else {
        camel
    }
}

fn camelize(name: &str) -> String {
    name.split(['.', ' ', '-'])
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(i, part)| {
            if i == 0 {
                part.to_string()
            } else {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            }
        })
        .collect()
}
