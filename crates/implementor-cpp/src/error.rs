//! Error types for implementor-cpp.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for front-end operations.
pub type Result<T> = std::result::Result<T, FrontendError>;

/// Errors that can occur while building or querying a translation unit.
#[derive(Error, Diagnostic, Debug)]
pub enum FrontendError {
    /// The tree-sitter grammar could not be loaded.
    #[error("Failed to load the C++ grammar: {0}")]
    #[diagnostic(code(implementor::cpp::language))]
    Language(#[from] tree_sitter::LanguageError),

    /// tree-sitter gave up on the source.
    #[error("Failed to parse C++ source")]
    #[diagnostic(code(implementor::cpp::parse))]
    Parse,

    /// No class or struct definition matches the requested name.
    #[error("No class or struct definition named `{name}`")]
    #[diagnostic(
        code(implementor::cpp::record_not_found),
        help("only definitions with a body are considered; try the qualified name, e.g. `ns::Name`")
    )]
    RecordNotFound { name: String },

    /// More than one definition matches the requested name.
    #[error("`{name}` is ambiguous, candidates: {}", candidates.join(", "))]
    #[diagnostic(
        code(implementor::cpp::ambiguous_record),
        help("use one of the qualified names")
    )]
    AmbiguousRecord {
        name: String,
        candidates: Vec<String>,
    },
}
