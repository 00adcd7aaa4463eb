use implementor_common::{SourceFile, SourceLocation, SourceRange};
use tree_sitter::Tree;

use crate::lexer::{collect_tokens, Token};

/// Maps locations of a single translation unit to offsets, lines, text and
/// tokens.
#[derive(Debug, Clone)]
pub struct SourceManager {
    file: SourceFile,
    tokens: Vec<Token>,
}

impl SourceManager {
    /// `tree` must be the parse of `file`'s content.
    pub fn new(file: SourceFile, tree: &Tree) -> Self {
        let tokens = collect_tokens(tree, file.content());
        Self { file, tokens }
    }

    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// The raw buffer of the translation unit.
    pub fn buffer(&self) -> &str {
        self.file.content()
    }

    pub fn location_for_offset(&self, offset: u32) -> SourceLocation {
        debug_assert!(offset <= self.file.len());
        SourceLocation::new(offset)
    }

    pub fn file_offset(&self, loc: SourceLocation) -> u32 {
        debug_assert!(loc.is_valid(), "file offset of an invalid location");
        loc.offset()
    }

    /// 1-based line the location is spelled on.
    pub fn spelling_line_number(&self, loc: SourceLocation) -> u32 {
        self.file.line_number(loc.offset().min(self.file.len()))
    }

    /// Text covered by the range; empty for invalid or out-of-buffer ranges.
    pub fn text(&self, range: SourceRange) -> &str {
        if range.is_invalid() {
            return "";
        }
        let begin = range.begin().offset() as usize;
        let end = range.end().offset() as usize;
        self.buffer().get(begin..end).unwrap_or("")
    }

    /// Tokens of the buffer in source order.
    pub(crate) fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn manager(source: &str) -> SourceManager {
        SourceManager::new(SourceFile::new(source), &parse(source).unwrap())
    }

    #[test]
    fn test_text_of_ranges() {
        let sm = manager("int foo() noexcept;");
        assert_eq!(sm.text(SourceRange::from_offsets(10, 18)), "noexcept");
        assert_eq!(sm.text(SourceRange::invalid()), "");
        assert_eq!(sm.text(SourceRange::from_offsets(10, 99)), "");
    }

    #[test]
    fn test_spelling_line_number() {
        let sm = manager("struct A\n{\n};\n");
        assert_eq!(sm.spelling_line_number(SourceLocation::new(0)), 1);
        assert_eq!(sm.spelling_line_number(SourceLocation::new(9)), 2);
        assert_eq!(sm.spelling_line_number(SourceLocation::new(11)), 3);
    }
}
