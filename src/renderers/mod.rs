//! Render pipeline and per-format renderers
//!
//! The pipeline entry point is [`render_design_tokens`]: group the token
//! variables by target file, order each file's list, render every token to a
//! definition statement, then merge the statements into the target files
//! through a content updater. Rendering and writing are two separate passes:
//! every file of the batch is rendered before the first write, so a failing
//! token aborts the whole invocation without leaving partially updated files
//! behind.
//!
//! Every stage is a boxed function carried by [`DesignTokenRendererOptions`]
//! and has a documented default (CSS variables merged into `styles.scss`,
//! sorted by name), so a caller overrides only what differs. File access goes
//! through injected read/exists/write functions, which keeps the pipeline
//! usable against virtual file systems.
//!
//! The per-format submodules each provide a *value renderer* (resolved value
//! to format literal/reference syntax) and a *definition renderer* (token to
//! one emittable statement, `None` meaning "skip this token in this file"),
//! plus the matching content updater.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::Result;
use crate::ordering::{token_sorter_by_name, TokenListTransform};
use crate::variable::{TokenVariable, TokenVariableSet};

pub mod css;
pub mod design_token;
pub mod json_schema;
pub mod metadata;
pub mod sass;

/// Function reading a file to a string.
pub type ReadFileFn = Box<dyn Fn(&Path) -> io::Result<String>>;
/// Function determining if a file exists.
pub type ExistsFileFn = Box<dyn Fn(&Path) -> bool>;
/// Function writing a file.
pub type WriteFileFn = Box<dyn Fn(&Path, &str) -> io::Result<()>>;
/// Function determining the file a token definition should be written to.
pub type FileRouter = Box<dyn Fn(&TokenVariable) -> PathBuf>;
/// Function rendering the value of a token in a given format.
///
/// The boolean parameter enforces reference-style emission (the token's own
/// definition rendered as a reference with its value as fallback).
pub type TokenValueRenderer =
    Box<dyn for<'a> Fn(&'a TokenVariable, &'a TokenVariableSet, bool) -> Result<String>>;
/// Function rendering the full definition statement of a token, `None` to
/// skip the token.
pub type TokenDefinitionRenderer =
    Box<dyn for<'a> Fn(&'a TokenVariable, &'a TokenVariableSet) -> Result<Option<String>>>;
/// Function substituting a reference to a token name missing from the set.
pub type UnregisteredReferenceRenderer = Box<dyn Fn(&str) -> String>;
/// Function merging rendered statements into the current content of a file.
pub type DesignContentUpdater = Box<dyn Fn(&[String], &Path, &str) -> String>;
/// Comparator over token variables, applied before the list transforms.
pub type VariableSortComparator = Box<dyn Fn(&TokenVariable, &TokenVariable) -> Ordering>;

/// Default file receiving the tokens that do not request a target file.
pub const DEFAULT_STYLE_FILE: &str = "styles.scss";

/// Options of [`render_design_tokens`]; every field has a documented default.
#[derive(Default)]
pub struct DesignTokenRendererOptions {
    /// File reader, defaulting to [`std::fs::read_to_string`]
    pub read_file: Option<ReadFileFn>,
    /// File existence check, defaulting to [`Path::exists`]
    pub exists_file: Option<ExistsFileFn>,
    /// File writer, defaulting to [`default_file_writer`]
    pub write_file: Option<WriteFileFn>,
    /// Target file router, defaulting to
    /// `compute_file_to_update_path(".", DEFAULT_STYLE_FILE)`
    pub determine_file_to_update: Option<FileRouter>,
    /// Definition renderer, defaulting to the CSS one
    pub token_definition_renderer: Option<TokenDefinitionRenderer>,
    /// Content updater, defaulting to the CSS one
    pub style_content_updater: Option<DesignContentUpdater>,
    /// Comparator applied to each file's token list before the transforms
    pub variable_sort_comparator: Option<VariableSortComparator>,
    /// Ordered list transforms, defaulting to the sort-by-name transform
    pub token_list_transforms: Option<Vec<TokenListTransform>>,
}

/// Render a set of parsed token variables into their target files.
///
/// # Errors
///
/// Fails on the first definition that cannot be rendered, before any file is
/// written, and propagates I/O errors of the injected functions unchanged.
pub fn render_design_tokens(
    variable_set: &TokenVariableSet,
    options: DesignTokenRendererOptions,
) -> Result<()> {
    let DesignTokenRendererOptions {
        read_file,
        exists_file,
        write_file,
        determine_file_to_update,
        token_definition_renderer,
        style_content_updater,
        variable_sort_comparator,
        token_list_transforms,
    } = options;
    let read_file =
        read_file.unwrap_or_else(|| Box::new(|path: &Path| std::fs::read_to_string(path)));
    let exists_file = exists_file.unwrap_or_else(|| Box::new(|path: &Path| path.exists()));
    let write_file = write_file.unwrap_or_else(default_file_writer);
    let determine_file_to_update = determine_file_to_update
        .unwrap_or_else(|| compute_file_to_update_path(".", DEFAULT_STYLE_FILE));
    let token_definition_renderer = token_definition_renderer
        .unwrap_or_else(|| css::get_css_token_definition_renderer(Default::default()));
    let style_content_updater =
        style_content_updater.unwrap_or_else(|| css::get_css_style_content_updater(Default::default()));
    let token_list_transforms =
        token_list_transforms.unwrap_or_else(|| vec![token_sorter_by_name()]);

    let mut token_per_file: BTreeMap<PathBuf, Vec<&TokenVariable>> = BTreeMap::new();
    for variable in variable_set.values() {
        token_per_file
            .entry(determine_file_to_update(variable))
            .or_default()
            .push(variable);
    }

    // First pass: render everything so a bad token aborts before any write
    let mut updates: Vec<(PathBuf, Vec<String>)> = Vec::with_capacity(token_per_file.len());
    for (file, mut tokens) in token_per_file {
        if let Some(comparator) = &variable_sort_comparator {
            tokens.sort_by(|a, b| comparator(a, b));
        }
        let tokens = token_list_transforms
            .iter()
            .fold(tokens, |acc, transform| transform(variable_set, acc));

        let mut statements = Vec::with_capacity(tokens.len());
        for token in tokens {
            if let Some(statement) = token_definition_renderer(token, variable_set)? {
                statements.push(statement);
            }
        }
        updates.push((file, statements));
    }

    // Second pass: merge into each target file
    for (file, statements) in updates {
        let is_file_existing = exists_file(&file);
        if !is_file_existing && statements.is_empty() {
            continue;
        }
        let content = if is_file_existing {
            read_file(&file)?
        } else {
            String::new()
        };
        let new_content = style_content_updater(&statements, &file, &content);
        write_file(&file, &new_content)?;
        log::info!("Updated {} with design token content", file.display());
    }
    Ok(())
}

/// Router resolving each token's target file.
///
/// The token's target-file extension wins when present: kept as-is when
/// absolute, otherwise resolved against the token's context base path (or
/// `root`) with lexical `.`/`..` normalization. Tokens without a target file
/// all route to `default_file`.
pub fn compute_file_to_update_path(
    root: impl Into<PathBuf>,
    default_file: impl Into<PathBuf>,
) -> FileRouter {
    let root = root.into();
    let default_file = default_file.into();
    Box::new(move |token| match &token.extensions.target_file {
        Some(target_file) => {
            let target_path = Path::new(target_file);
            if target_path.is_absolute() {
                target_path.to_path_buf()
            } else {
                let base = token
                    .context
                    .as_ref()
                    .and_then(|context| context.base_path.clone())
                    .unwrap_or_else(|| root.clone());
                normalize_path(&base.join(target_path))
            }
        }
        None => default_file.clone(),
    })
}

/// Default file writer: creates missing parent directories before writing.
pub fn default_file_writer() -> WriteFileFn {
    Box::new(|path, content| {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)
    })
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_design_token;
    use crate::spec::Context;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn parse(document: serde_json::Value) -> TokenVariableSet {
        parse_design_token(&document, None).unwrap()
    }

    mod file_router_tests {
        use super::*;

        #[test]
        fn test_default_file_when_no_target() {
            let set = parse(json!({"var1": {"$value": "#000", "$type": "color"}}));
            let router = compute_file_to_update_path("/", "test-result.json");
            assert_eq!(router(&set["var1"]), PathBuf::from("test-result.json"));
        }

        #[test]
        fn test_target_file_resolved_against_root() {
            let set = parse(json!({
                "var1": {
                    "$value": "#000",
                    "$type": "color",
                    "$extensions": {"o3rTargetFile": "file.scss"}
                }
            }));
            let router = compute_file_to_update_path("/theme", DEFAULT_STYLE_FILE);
            assert_eq!(router(&set["var1"]), PathBuf::from("/theme/file.scss"));
        }

        #[test]
        fn test_target_file_resolved_against_context_base_path() {
            let set = parse_design_token(
                &json!({
                    "var1": {
                        "$value": "#000",
                        "$type": "color",
                        "$extensions": {"o3rTargetFile": "../file.scss"}
                    }
                }),
                Some(Context {
                    base_path: Some("/specs/theme".into()),
                    template: None,
                }),
            )
            .unwrap();
            let router = compute_file_to_update_path(".", DEFAULT_STYLE_FILE);
            assert_eq!(router(&set["var1"]), PathBuf::from("/specs/file.scss"));
        }

        #[test]
        fn test_absolute_target_file_kept() {
            let set = parse(json!({
                "var1": {
                    "$value": "#000",
                    "$type": "color",
                    "$extensions": {"o3rTargetFile": "/absolute/file.scss"}
                }
            }));
            let router = compute_file_to_update_path("/theme", DEFAULT_STYLE_FILE);
            assert_eq!(router(&set["var1"]), PathBuf::from("/absolute/file.scss"));
        }
    }

    mod pipeline_tests {
        use super::*;

        type Written = Rc<RefCell<Vec<(PathBuf, String)>>>;

        fn capture_writes() -> (Written, WriteFileFn) {
            let written: Written = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&written);
            let write_file: WriteFileFn = Box::new(move |path, content| {
                sink.borrow_mut().push((path.to_path_buf(), content.to_string()));
                Ok(())
            });
            (written, write_file)
        }

        fn in_memory_options(written_sink: WriteFileFn) -> DesignTokenRendererOptions {
            DesignTokenRendererOptions {
                read_file: Some(Box::new(|_| Ok(String::new()))),
                exists_file: Some(Box::new(|_| true)),
                write_file: Some(written_sink),
                ..Default::default()
            }
        }

        #[test]
        fn test_renders_all_tokens_into_single_file() {
            let set = parse(json!({
                "example": {
                    "var1": {"$value": "#000", "$type": "color"},
                    "color": {"$value": "{example.var1}"}
                }
            }));
            let (written, write_file) = capture_writes();
            render_design_tokens(&set, in_memory_options(write_file)).unwrap();

            let written = written.borrow();
            assert_eq!(written.len(), 1);
            assert_eq!(written[0].0, PathBuf::from(DEFAULT_STYLE_FILE));
            assert!(written[0].1.contains("--example-var1: #000;"));
            assert!(written[0].1.contains("--example-color: var(--example-var1);"));
        }

        #[test]
        fn test_routes_tokens_to_requested_files() {
            let set = parse(json!({
                "example": {
                    "var1": {"$value": "#000", "$type": "color"},
                    "var2": {
                        "$value": "#fff",
                        "$type": "color",
                        "$extensions": {"o3rTargetFile": "file.scss"}
                    }
                }
            }));
            let (written, write_file) = capture_writes();
            render_design_tokens(&set, in_memory_options(write_file)).unwrap();

            let written = written.borrow();
            assert_eq!(written.len(), 2);
            let files: Vec<_> = written.iter().map(|(path, _)| path.clone()).collect();
            assert!(files.contains(&PathBuf::from("file.scss")));
            assert!(files.contains(&PathBuf::from(DEFAULT_STYLE_FILE)));
        }

        #[test]
        fn test_default_order_is_by_name() {
            let set = parse(json!({
                "example": {
                    "var10": {"$value": "#000", "$type": "color"},
                    "var2": {"$value": "#111", "$type": "color"}
                }
            }));
            let (written, write_file) = capture_writes();
            render_design_tokens(&set, in_memory_options(write_file)).unwrap();

            let content = &written.borrow()[0].1;
            let first = content.find("--example-var2").unwrap();
            let second = content.find("--example-var10").unwrap();
            assert!(first < second);
        }

        #[test]
        fn test_missing_file_without_tokens_is_skipped() {
            let set = parse(json!({
                "var1": {
                    "$value": "#000",
                    "$type": "color",
                    "$extensions": {"o3rPrivate": true}
                }
            }));
            // Private token without a private renderer emits nothing
            let (written, write_file) = capture_writes();
            let options = DesignTokenRendererOptions {
                read_file: Some(Box::new(|_| Ok(String::new()))),
                exists_file: Some(Box::new(|_| false)),
                write_file: Some(write_file),
                ..Default::default()
            };
            render_design_tokens(&set, options).unwrap();
            assert!(written.borrow().is_empty());
        }

        #[test]
        fn test_existing_file_rewritten_even_when_empty() {
            let set = parse(json!({
                "var1": {
                    "$value": "#000",
                    "$type": "color",
                    "$extensions": {"o3rPrivate": true}
                }
            }));
            let (written, write_file) = capture_writes();
            render_design_tokens(&set, in_memory_options(write_file)).unwrap();
            // The managed block is cleared rather than left stale
            assert_eq!(written.borrow().len(), 1);
        }

        #[test]
        fn test_bad_token_aborts_before_any_write() {
            let set = parse(json!({
                "bad": {"$value": "12", "$type": "grid"},
                "good": {"$value": "#000", "$type": "color"}
            }));
            let (written, write_file) = capture_writes();
            let result = render_design_tokens(&set, in_memory_options(write_file));
            assert!(result.is_err());
            assert!(written.borrow().is_empty());
        }

        #[test]
        fn test_transforms_applied_in_given_order() {
            let set = parse(json!({
                "a": {"$value": "#000", "$type": "color"},
                "b": {"$value": "#111", "$type": "color"}
            }));
            let (written, write_file) = capture_writes();
            let reverse: TokenListTransform = Box::new(|_, mut tokens| {
                tokens.reverse();
                tokens
            });
            let options = DesignTokenRendererOptions {
                token_list_transforms: Some(vec![token_sorter_by_name(), reverse]),
                ..in_memory_options(write_file)
            };
            render_design_tokens(&set, options).unwrap();

            let content = &written.borrow()[0].1;
            assert!(content.find("--b").unwrap() < content.find("--a").unwrap());
        }

        #[test]
        fn test_comparator_option_overrides_order() {
            let set = parse(json!({
                "a": {"$value": "#000", "$type": "color"},
                "b": {"$value": "#111", "$type": "color"}
            }));
            let (written, write_file) = capture_writes();
            let options = DesignTokenRendererOptions {
                variable_sort_comparator: Some(Box::new(|a, b| {
                    b.token_reference_name.cmp(&a.token_reference_name)
                })),
                token_list_transforms: Some(vec![]),
                ..in_memory_options(write_file)
            };
            render_design_tokens(&set, options).unwrap();

            let content = &written.borrow()[0].1;
            assert!(content.find("--b").unwrap() < content.find("--a").unwrap());
        }
    }
}
