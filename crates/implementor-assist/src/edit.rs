//! Text insertions into a source buffer.

use serde::Serialize;

use crate::error::{AssistError, Result};

/// Insert `text` at byte `offset` of the original buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeInsertion {
    pub offset: u32,
    pub text: String,
}

impl CodeInsertion {
    pub fn new(offset: u32, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: text.into(),
        }
    }
}

/// Apply insertions whose offsets refer to the original `content`.
///
/// Insertions are applied from the highest offset down, so every offset stays
/// valid; insertions sharing an offset end up in the order they were given.
pub fn apply_insertions(content: &str, insertions: &[CodeInsertion]) -> Result<String> {
    let mut ordered: Vec<(usize, &CodeInsertion)> = insertions.iter().enumerate().collect();
    ordered.sort_by(|(a_index, a), (b_index, b)| {
        b.offset.cmp(&a.offset).then(b_index.cmp(a_index))
    });

    let mut result = content.to_string();
    for (_, insertion) in ordered {
        let offset = insertion.offset as usize;
        if !content.is_char_boundary(offset) {
            return Err(AssistError::InvalidOffset {
                offset: insertion.offset,
                len: content.len(),
            });
        }
        result.insert_str(offset, &insertion.text);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_offsets_refer_to_original_content() {
        let result = apply_insertions(
            "class D {};",
            &[
                CodeInsertion::new(9, "\nvoid f();\n"),
                CodeInsertion::new(7, " : public I"),
            ],
        )
        .unwrap();
        assert_eq!(result, "class D : public I {\nvoid f();\n};");
    }

    #[test]
    fn test_equal_offsets_keep_order() {
        let result = apply_insertions(
            "ac",
            &[CodeInsertion::new(1, "b"), CodeInsertion::new(1, "B")],
        )
        .unwrap();
        assert_eq!(result, "abBc");
    }

    #[test]
    fn test_end_of_buffer() {
        assert_eq!(
            apply_insertions("a", &[CodeInsertion::new(1, "b")]).unwrap(),
            "ab"
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let err = apply_insertions("a", &[CodeInsertion::new(5, "b")]).unwrap_err();
        assert!(matches!(err, AssistError::InvalidOffset { offset: 5, len: 1 }));
    }

    #[test]
    fn test_inside_multibyte_character() {
        let err = apply_insertions("é", &[CodeInsertion::new(1, "x")]).unwrap_err();
        assert!(matches!(err, AssistError::InvalidOffset { .. }));
    }
}
