//! # Design Tokens Library
//!
//! This library parses [Design Token](https://design-tokens.github.io/community-group/format/)
//! specification documents into a flat, queryable set of token variables and
//! renders them to the stylesheet and metadata formats of a design system
//! build: CSS custom properties, Sass variables, JSON Schema fragments, style
//! metadata JSON and the Design Token format itself.
//!
//! ## Quick Example
//!
//! ```
//! use design_tokens::parser::parse_design_token;
//! use design_tokens::renderers::{render_design_tokens, DesignTokenRendererOptions};
//! use serde_json::json;
//!
//! let document = json!({
//!     "color": {"$value": "#000", "$type": "color"},
//!     "alias": {"$value": "{color}"}
//! });
//!
//! // Parse the document into the flat token variable set
//! let tokens = parse_design_token(&document, None).unwrap();
//! assert!(tokens["alias"].is_alias(&tokens).unwrap());
//!
//! // Render CSS variables into an in-memory sink
//! let mut options = DesignTokenRendererOptions::default();
//! options.exists_file = Some(Box::new(|_| false));
//! options.write_file = Some(Box::new(|_, content| {
//!     assert!(content.contains("--alias: var(--color);"));
//!     Ok(())
//! }));
//! render_design_tokens(&tokens, options).unwrap();
//! ```
//!
//! ## Core Concepts
//!
//! The library is built around a few key concepts:
//!
//! - **Specification model (`spec`)**: The node shapes of the Design Token
//!   format, the Token/Group duck-typed classification and the inheritable
//!   extension bag.
//! - **Template overlay (`template`)**: Deep-merge of default common fields
//!   into the document tree, with `*` wildcard matching per level.
//! - **Graph builder (`parser`)**: The single-pass walk producing the flat
//!   mapping from dotted reference name to token variable.
//! - **Token variables (`variable`)**: The parsed records and their computed
//!   protocol (raw value, references, alias detection, type resolution).
//! - **Ordering (`ordering`)**: Interchangeable list transforms ordering the
//!   tokens of one target file.
//! - **Renderers (`renderers`)**: The render pipeline, the per-format
//!   value/definition renderers and the tagged-block content updaters.
//!
//! ## Execution Flow
//!
//! A typical generation run executes the following steps:
//!
//! 1. **Parse**: Load the specification document(s) with
//!    [`parser::parse_design_token_file`].
//! 2. **Route**: Group the variables by target file from their
//!    target-file extension.
//! 3. **Order**: Apply the configured list transforms per file.
//! 4. **Render**: Run the definition renderer over each variable.
//! 5. **Update**: Merge the statements into each file's managed block and
//!    write, only after the whole batch rendered successfully.

pub mod error;
pub mod ordering;
pub mod parser;
pub mod renderers;
pub mod spec;
pub mod template;
pub mod variable;

#[cfg(test)]
mod parser_proptest;

pub use error::{Error, Result};
pub use parser::{parse_design_token, parse_design_token_file, ParseDesignTokenFileOptions};
pub use renderers::{render_design_tokens, DesignTokenRendererOptions};
pub use spec::{Context, Extensions};
pub use variable::{TokenVariable, TokenVariableSet};
