//! Error types for implementor-assist.

use implementor_cpp::FrontendError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for assist operations.
pub type Result<T> = std::result::Result<T, AssistError>;

#[derive(Error, Diagnostic, Debug)]
pub enum AssistError {
    /// The lexer found no token where one was required.
    #[error("Can't unpack token; token empty (after offset {offset})")]
    #[diagnostic(
        code(implementor::assist::empty_token),
        help("the class may be incomplete; check that its body is closed")
    )]
    EmptyToken { offset: u32 },

    /// A location needed for the edit does not point into the source.
    #[error("Can't unpack token; token holds invalid location")]
    #[diagnostic(code(implementor::assist::invalid_token))]
    InvalidToken,

    /// An insertion does not fall on a character boundary of the buffer.
    #[error("Insertion offset {offset} is outside of the {len} byte buffer")]
    #[diagnostic(code(implementor::assist::invalid_offset))]
    InvalidOffset { offset: u32, len: usize },

    /// A class was asked to implement itself.
    #[error("`{name}` can't implement itself")]
    #[diagnostic(code(implementor::assist::self_implementation))]
    SelfImplementation { name: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Frontend(#[from] FrontendError),
}
