//! # Error Handling
//!
//! Centralized error type for the design token engine, built with the
//! `thiserror` library. Every fatal condition carries enough context to
//! identify the offending token or node in the source specification.
//!
//! ## Taxonomy
//!
//! - **Parse errors** abort the whole parse: a node that cannot be classified
//!   as Token or Group, a token found at the document root, or malformed JSON
//!   when parsing from a file.
//! - **Render errors** abort the current invocation before any file of the
//!   batch is written: an unsupported or unresolvable `$type` during raw
//!   value rendering.
//! - **I/O failures** are propagated unchanged from the injected read/write
//!   functions; the engine adds no retry semantics.
//!
//! Non-fatal conditions (references to unregistered token names) are not
//! errors: renderers substitute a defensive fallback and report through the
//! `log` facade.

use thiserror::Error;

/// Main error type for design token operations
#[derive(Error, Debug)]
pub enum Error {
    /// The specification document contains a node that could not be parsed.
    ///
    /// Raised for nodes that classify neither as Token nor as Group, and for
    /// a token found at the document root.
    #[error("Design token parsing error: {message}")]
    Parse { message: String },

    /// A token declares (or resolves to) a `$type` the renderer does not support.
    #[error("Not supported type {type_name} (value: {value}) on token '{token}'")]
    UnsupportedType {
        token: String,
        type_name: String,
        value: String,
    },

    /// An error occurred while rendering a token definition.
    #[error("Rendering error for token '{token}': {message}")]
    Render { token: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    ///
    /// Raised by the injected read/write functions during the render pipeline.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
