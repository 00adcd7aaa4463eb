//! Choosing where new public methods go inside a class body.
//!
//! Three strategies are tried in order:
//!
//! 1. After the last method of the first chain of explicit public methods,
//!    at the start of the line following its terminating `;`.
//! 2. After an existing `public:` label inside the class.
//! 3. After the opening brace of the class body; a `class` then needs a new
//!    `public:` section, a `struct` does not.

use std::sync::LazyLock;

use implementor_cpp::{
    AccessSpecifier, AsFunctionDecl, CxxMethodDecl, CxxRecordDecl, Lexer, SourceLocation,
    SourceManager, SourceRange, Token, TokenKind,
};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::{AssistError, Result};

/// Upper bound on the number of `;` tokens skipped after a method.
const MAX_SKIPPED_SEMICOLONS: usize = 1000;

static PUBLIC_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpublic\s*:").expect("public label pattern is valid"));

/// Where to insert new public method declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuitablePublicMethodPlaceInCppFile {
    /// Byte offset into the source buffer
    pub offset: u32,
    /// The inserted text must open with `public:`
    pub is_public_section_needed: bool,
}

#[tracing::instrument(skip_all, fields(record = %record.qualified_name_as_string()))]
pub fn find_suitable_place_in_class_for_public_method(
    cpp_file_content: &str,
    record: &CxxRecordDecl,
    source_manager: &SourceManager,
) -> Result<SuitablePublicMethodPlaceInCppFile> {
    let finder = SuitablePlaceInClassFinder {
        content: cpp_file_content,
        record,
        sm: source_manager,
    };
    let place = finder.find()?;
    debug!(
        offset = place.offset,
        public_section = place.is_public_section_needed,
        "found place for public methods"
    );
    Ok(place)
}

struct SuitablePlaceInClassFinder<'a> {
    content: &'a str,
    record: &'a CxxRecordDecl,
    sm: &'a SourceManager,
}

impl SuitablePlaceInClassFinder<'_> {
    fn find(&self) -> Result<SuitablePublicMethodPlaceInCppFile> {
        if let Some(method) = self.last_public_method_in_first_chain() {
            trace!(method = %method.as_function_decl().name(), "after public method chain");
            return Ok(SuitablePublicMethodPlaceInCppFile {
                offset: self.insert_offset_after(method.as_function_decl().end_loc())?,
                is_public_section_needed: false,
            });
        }

        if let Some(offset) = self.offset_after_public_label()? {
            trace!("after public label");
            return Ok(SuitablePublicMethodPlaceInCppFile {
                offset,
                is_public_section_needed: false,
            });
        }

        trace!("after opening brace");
        Ok(SuitablePublicMethodPlaceInCppFile {
            offset: self.offset_after_opening_brace()?,
            is_public_section_needed: !self.record.is_struct(),
        })
    }

    fn last_public_method_in_first_chain(&self) -> Option<&CxxMethodDecl> {
        let is_explicit_public = |method: &&CxxMethodDecl| {
            method.access() == AccessSpecifier::Public && !method.is_implicit()
        };

        let mut methods = self.record.methods().skip_while(|m| !is_explicit_public(m));
        let first = methods.next()?;
        Some(methods.take_while(is_explicit_public).last().unwrap_or(first))
    }

    /// Offset of the line after the declaration ending at `location`, skipping
    /// the `;` tokens that terminate it.
    fn insert_offset_after(&self, location: SourceLocation) -> Result<u32> {
        if location.is_invalid() {
            return Err(AssistError::InvalidToken);
        }
        let Some(first) = Lexer::find_next_token(location, self.sm) else {
            return Ok(self.sm.file_offset(location));
        };
        let begin = unpack_location(&first)?;

        let mut end = begin;
        if first.is(TokenKind::Semi) {
            let mut skipped = 0;
            loop {
                if skipped == MAX_SKIPPED_SEMICOLONS {
                    warn!(
                        offset = self.sm.file_offset(begin),
                        "gave up skipping semicolons"
                    );
                    break;
                }
                skipped += 1;
                let Some(token) = Lexer::find_next_token(end, self.sm) else {
                    break;
                };
                end = unpack_location(&token)?;
                if token.is_not(TokenKind::Semi) {
                    break;
                }
            }
        }

        let begin_offset = self.sm.file_offset(begin);
        let end_offset = self.sm.file_offset(end);
        let between = self
            .content
            .get(begin_offset as usize..end_offset as usize)
            .ok_or(AssistError::InvalidToken)?;
        Ok(match between.find('\n') {
            Some(newline) => begin_offset + newline as u32 + 1,
            None => end_offset,
        })
    }

    /// Just after the first `public:` label inside the class: the start of
    /// the next line, or the end of the label if the class closes on the
    /// same line.
    fn offset_after_public_label(&self) -> Result<Option<u32>> {
        let body_begin = find_opening_brace(self.record, self.sm)?.end_location();
        let body_offset = self.sm.file_offset(body_begin) as usize;
        let close = self.record.end_loc();
        let close_offset = self.sm.file_offset(close) as usize;
        let end_loc = Lexer::loc_for_end_of_token(close, self.sm);
        let begin_line = self.sm.spelling_line_number(self.record.begin_loc());
        let end_line = self.sm.spelling_line_number(end_loc);

        let label = PUBLIC_LABEL.find_iter(self.content).find(|label| {
            let start = SourceLocation::new(label.start() as u32);
            (begin_line..=end_line).contains(&self.sm.spelling_line_number(start))
                && (body_offset..close_offset).contains(&label.start())
                && !self.content[label.end()..].starts_with(':')
                && self.is_member_of_body(body_begin, start)
        });
        let Some(label) = label else {
            return Ok(None);
        };

        let label_end = label.end();
        Ok(Some(match self.content[label_end..].find('\n') {
            Some(newline) if label_end + newline < close_offset => (label_end + newline + 1) as u32,
            _ => label_end as u32,
        }))
    }

    /// `label` is a token of the class body itself: not commented out and
    /// not inside the braces of a nested class or function.
    fn is_member_of_body(&self, body_begin: SourceLocation, label: SourceLocation) -> bool {
        if !Lexer::token_at(label, self.sm).is_some_and(|token| token.location() == label) {
            return false;
        }
        let depth = Lexer::tokenize(SourceRange::new(body_begin, label), self.sm)
            .iter()
            .fold(0i32, |depth, token| match token.kind() {
                TokenKind::LBrace => depth + 1,
                TokenKind::RBrace => depth - 1,
                _ => depth,
            });
        depth == 0
    }

    /// Just after the `{` opening the class body: the start of the next line
    /// when the brace ends its line, otherwise the offset past the brace.
    fn offset_after_opening_brace(&self) -> Result<u32> {
        let brace = find_opening_brace(self.record, self.sm)?;
        let past_brace = brace.end_location().offset() as usize;
        let rest = self.content.get(past_brace..).ok_or(AssistError::InvalidToken)?;
        let line_rest = rest.split('\n').next().unwrap_or_default();
        if line_rest.trim().is_empty() && rest.len() > line_rest.len() {
            Ok((past_brace + line_rest.len() + 1) as u32)
        } else {
            Ok(past_brace as u32)
        }
    }
}

/// Walk the class head from the class-key to the `{` opening its body.
/// Returns the brace and the last head token before it.
pub(crate) fn walk_class_head(
    record: &CxxRecordDecl,
    sm: &SourceManager,
) -> Result<(Token, Token)> {
    let begin = record.begin_loc();
    if begin.is_invalid() {
        return Err(AssistError::InvalidToken);
    }
    let mut previous = Lexer::token_at(begin, sm).ok_or(AssistError::EmptyToken {
        offset: begin.offset(),
    })?;
    loop {
        let location = unpack_location(&previous)?;
        let token = Lexer::find_next_token(location, sm).ok_or(AssistError::EmptyToken {
            offset: location.offset(),
        })?;
        if token.is(TokenKind::LBrace) {
            return Ok((token, previous));
        }
        previous = token;
    }
}

fn find_opening_brace(record: &CxxRecordDecl, sm: &SourceManager) -> Result<Token> {
    walk_class_head(record, sm).map(|(brace, _)| brace)
}

fn unpack_location(token: &Token) -> Result<SourceLocation> {
    let location = token.location();
    if location.is_invalid() {
        return Err(AssistError::InvalidToken);
    }
    Ok(location)
}
