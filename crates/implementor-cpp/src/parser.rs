use tree_sitter::{Parser, Tree};

use crate::error::{FrontendError, Result};

/// Parse C++ source code into a tree-sitter Tree.
///
/// Parsing is error tolerant: malformed regions show up as `ERROR` nodes and
/// the rest of the tree stays usable.
pub fn parse(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    let language = tree_sitter_cpp::LANGUAGE;
    parser.set_language(&language.into())?;

    parser.parse(source, None).ok_or(FrontendError::Parse)
}
