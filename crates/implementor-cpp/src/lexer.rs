//! Token-level view of the translation unit.
//!
//! Tokens are the leaves of the tree-sitter syntax tree, in source order.
//! Comments and whitespace are not tokens, and a string or character literal
//! is one token even though the grammar splits it into pieces. Queries work
//! on locations, e.g. to find the token following a method or the opening
//! brace of a class body.

use implementor_common::{SourceLocation, SourceRange};
use tree_sitter::{Node, Tree};

use crate::source_manager::SourceManager;

/// Kinds of tokens we distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword
    Identifier,
    /// Numeric literal
    NumericConstant,
    /// Character literal, with optional encoding prefix
    CharConstant,
    /// String literal, raw or not, with optional encoding prefix
    StringLiteral,
    /// ;
    Semi,
    /// {
    LBrace,
    /// }
    RBrace,
    /// (
    LParen,
    /// )
    RParen,
    /// [
    LSquare,
    /// ]
    RSquare,
    /// :
    Colon,
    /// ::
    ColonColon,
    /// ,
    Comma,
    /// <
    Less,
    /// >
    Greater,
    /// &
    Amp,
    /// &&
    AmpAmp,
    /// *
    Star,
    /// =
    Equal,
    /// ~
    Tilde,
    /// `#` and preprocessor directives such as `#ifdef`
    Hash,
    /// Any other punctuator
    Punctuation,
}

/// A token: its kind and the bytes it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    location: SourceLocation,
    length: u32,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_not(&self, kind: TokenKind) -> bool {
        self.kind != kind
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// Location just past the last byte of the token.
    pub fn end_location(&self) -> SourceLocation {
        SourceLocation::new(self.location.offset() + self.length)
    }

    pub fn range(&self) -> SourceRange {
        SourceRange::new(self.location, self.end_location())
    }
}

/// Nodes that are kept whole although the grammar gives them children.
const LITERAL_KINDS: &[&str] = &[
    "string_literal",
    "raw_string_literal",
    "char_literal",
    "user_defined_literal",
];

/// Collect the tokens of `tree`, whose text is `source`.
pub(crate) fn collect_tokens(tree: &Tree, source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut cursor = tree.walk();
    'walk: loop {
        let node = cursor.node();
        if !LITERAL_KINDS.contains(&node.kind()) && cursor.goto_first_child() {
            continue;
        }
        if let Some(token) = leaf_token(node, source) {
            tokens.push(token);
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }
    tokens
}

fn leaf_token(node: Node, source: &str) -> Option<Token> {
    if node.kind() == "comment" || node.is_missing() {
        return None;
    }
    let text = source.get(node.start_byte()..node.end_byte())?;
    if text.trim().is_empty() {
        return None;
    }
    Some(Token {
        kind: token_kind(node, text),
        location: SourceLocation::new(node.start_byte() as u32),
        length: text.len() as u32,
    })
}

fn token_kind(node: Node, text: &str) -> TokenKind {
    match node.kind() {
        "number_literal" => return TokenKind::NumericConstant,
        "char_literal" => return TokenKind::CharConstant,
        "string_literal" | "raw_string_literal" | "system_lib_string" => {
            return TokenKind::StringLiteral
        }
        "user_defined_literal" => {
            if let Some(literal) = node.child(0) {
                return token_kind(literal, text);
            }
        }
        _ => {}
    }

    match text {
        ";" => TokenKind::Semi,
        "{" => TokenKind::LBrace,
        "}" => TokenKind::RBrace,
        "(" => TokenKind::LParen,
        ")" => TokenKind::RParen,
        "[" => TokenKind::LSquare,
        "]" => TokenKind::RSquare,
        ":" => TokenKind::Colon,
        "::" => TokenKind::ColonColon,
        "," => TokenKind::Comma,
        "<" => TokenKind::Less,
        ">" => TokenKind::Greater,
        "&" => TokenKind::Amp,
        "&&" => TokenKind::AmpAmp,
        "*" => TokenKind::Star,
        "=" => TokenKind::Equal,
        "~" => TokenKind::Tilde,
        _ => match text.chars().next() {
            Some('#') => TokenKind::Hash,
            Some(c) if c.is_ascii_digit() => TokenKind::NumericConstant,
            Some(c) if c == '_' || c == '$' || c.is_alphabetic() => TokenKind::Identifier,
            _ => TokenKind::Punctuation,
        },
    }
}

/// Stateless entry points mirroring the queries editors need.
pub struct Lexer;

impl Lexer {
    /// The token covering `loc`, or the first one after it.
    pub fn token_at(loc: SourceLocation, sm: &SourceManager) -> Option<Token> {
        let index = Self::index_at(loc, sm)?;
        sm.tokens().get(index).copied()
    }

    /// The token following the one at `loc`.
    pub fn find_next_token(loc: SourceLocation, sm: &SourceManager) -> Option<Token> {
        let index = Self::index_at(loc, sm)?;
        sm.tokens().get(index + 1).copied()
    }

    /// Location just past the token starting at `loc`.
    ///
    /// Returns `loc` unchanged when no token starts there.
    pub fn loc_for_end_of_token(loc: SourceLocation, sm: &SourceManager) -> SourceLocation {
        match Self::token_at(loc, sm) {
            Some(token) if token.location() == loc => token.end_location(),
            _ => loc,
        }
    }

    /// All tokens that start inside `range`.
    pub fn tokenize(range: SourceRange, sm: &SourceManager) -> Vec<Token> {
        if range.is_invalid() {
            return Vec::new();
        }
        let tokens = sm.tokens();
        let first = tokens.partition_point(|token| token.location() < range.begin());
        let last = tokens.partition_point(|token| token.location() < range.end());
        tokens[first..last.max(first)].to_vec()
    }

    fn index_at(loc: SourceLocation, sm: &SourceManager) -> Option<usize> {
        if loc.is_invalid() {
            return None;
        }
        let index = sm
            .tokens()
            .partition_point(|token| token.end_location().offset() <= loc.offset());
        (index < sm.tokens().len()).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use implementor_common::SourceFile;
    use pretty_assertions::assert_eq;

    fn manager(source: &str) -> SourceManager {
        let tree = parse(source).unwrap();
        SourceManager::new(SourceFile::new(source), &tree)
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        let sm = manager(source);
        let range = SourceRange::from_offsets(0, source.len() as u32);
        Lexer::tokenize(range, &sm).iter().map(Token::kind).collect()
    }

    #[test]
    fn test_skips_comments_and_whitespace() {
        use TokenKind::*;
        assert_eq!(
            kinds("int /* block */ x; // line\nint y;"),
            vec![Identifier, Identifier, Semi, Identifier, Identifier, Semi]
        );
    }

    #[test]
    fn test_punctuators() {
        use TokenKind::*;
        assert_eq!(
            kinds("void f(ns::T &&a, int &b, int *c) {}"),
            vec![
                Identifier, Identifier, LParen, Identifier, ColonColon, Identifier, AmpAmp,
                Identifier, Comma, Identifier, Amp, Identifier, Comma, Identifier, Star,
                Identifier, RParen, LBrace, RBrace
            ]
        );
    }

    #[test]
    fn test_literals_are_single_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("const char *s = u8\"s;\";\nchar c = 'c';\ndouble d = 1.5;"),
            vec![
                Identifier, Identifier, Star, Identifier, Equal, StringLiteral, Semi, Identifier,
                Identifier, Equal, CharConstant, Semi, Identifier, Identifier, Equal,
                NumericConstant, Semi
            ]
        );
        assert_eq!(
            kinds("auto r = R\"x(a)\" b)x\";"),
            vec![Identifier, Identifier, Equal, StringLiteral, Semi]
        );
    }

    #[test]
    fn test_preprocessor_directives() {
        use TokenKind::*;
        assert_eq!(
            kinds("#ifdef FEATURE\nint x;\n#endif\n"),
            vec![Hash, Identifier, Identifier, Identifier, Semi, Hash]
        );
    }

    #[test]
    fn test_find_next_token() {
        let source = "void f() const;\nint x;";
        let sm = manager(source);
        let const_offset = source.find("const").unwrap() as u32;
        let next = Lexer::find_next_token(SourceLocation::new(const_offset), &sm).unwrap();
        assert!(next.is(TokenKind::Semi));
        assert_eq!(next.location().offset(), const_offset + 5);

        let semi = next.location();
        let after = Lexer::find_next_token(semi, &sm).unwrap();
        assert_eq!(sm.text(after.range()), "int");
    }

    #[test]
    fn test_token_at_skips_whitespace() {
        let source = "int   x;";
        let sm = manager(source);
        let token = Lexer::token_at(SourceLocation::new(4), &sm).unwrap();
        assert_eq!(token.location().offset(), 6);
        assert_eq!(sm.text(token.range()), "x");
    }

    #[test]
    fn test_find_next_token_at_end_of_buffer() {
        let sm = manager("x;");
        assert_eq!(Lexer::find_next_token(SourceLocation::new(1), &sm), None);
        assert_eq!(Lexer::find_next_token(SourceLocation::INVALID, &sm), None);
    }

    #[test]
    fn test_loc_for_end_of_token() {
        let source = "void f() noexcept(true);";
        let sm = manager(source);
        let noexcept = source.find("noexcept").unwrap() as u32;
        let end = Lexer::loc_for_end_of_token(SourceLocation::new(noexcept), &sm);
        assert_eq!(end.offset(), noexcept + 8);
        let inside = SourceLocation::new(noexcept + 2);
        assert_eq!(Lexer::loc_for_end_of_token(inside, &sm), inside);
    }
}
