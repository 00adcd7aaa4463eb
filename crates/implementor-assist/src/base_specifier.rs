//! Attaching a base class to the base-clause of a deriving class.

use implementor_cpp::{CxxRecordDecl, PrintingPolicy, SourceManager};
use tracing::debug;

use crate::edit::CodeInsertion;
use crate::error::{AssistError, Result};

/// Build the edit that makes `deriving_class` derive publicly from
/// `base_class`.
///
/// The text goes right after the last token of the class head (the name,
/// `final` or the last base specifier), leaving the whitespace before `{`
/// untouched: `, ns::Base` when a base-clause exists, ` : public ns::Base`
/// otherwise.
#[tracing::instrument(skip_all, fields(
    deriving = %deriving_class.qualified_name_as_string(),
    base = %base_class.qualified_name_as_string(),
))]
pub fn resolve_base_specifier(
    cpp_file_content: &str,
    deriving_class: &CxxRecordDecl,
    base_class: &CxxRecordDecl,
    source_manager: &SourceManager,
) -> Result<CodeInsertion> {
    let (_, last_head_token) = crate::placement::walk_class_head(deriving_class, source_manager)?;
    let offset = last_head_token.end_location().offset();
    if offset as usize > cpp_file_content.len() {
        return Err(AssistError::InvalidToken);
    }

    let base_name = spelled_name(base_class);
    let text = if deriving_class.bases().is_empty() {
        format!(" : public {base_name}")
    } else {
        format!(", {base_name}")
    };
    debug!(offset, %text, "base specifier");
    Ok(CodeInsertion { offset, text })
}

/// Qualified name usable in source; members of unnamed namespaces are
/// reachable without their namespace.
fn spelled_name(record: &CxxRecordDecl) -> String {
    let mut policy = PrintingPolicy::as_written();
    policy.adjust_for_cplusplus();
    policy
        .spell_scopes(record.qualified_name_as_string())
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::apply_insertions;
    use implementor_cpp::TranslationUnit;
    use pretty_assertions::assert_eq;

    fn derive(source: &str, deriving: &str, base: &str) -> String {
        let tu = TranslationUnit::parse(source).unwrap();
        let deriving = tu.find_record(deriving).unwrap();
        let base = tu.find_record(base).unwrap();
        let insertion = resolve_base_specifier(source, deriving, base, tu.source_manager()).unwrap();
        apply_insertions(source, &[insertion]).unwrap()
    }

    #[test]
    fn test_without_base_clause() {
        assert_eq!(
            derive("struct I {};\nclass D {\n};\n", "D", "I"),
            "struct I {};\nclass D : public I {\n};\n"
        );
    }

    #[test]
    fn test_brace_on_its_own_line() {
        assert_eq!(
            derive("struct I {};\nclass D\n{\n};\n", "D", "I"),
            "struct I {};\nclass D : public I\n{\n};\n"
        );
    }

    #[test]
    fn test_with_base_clause() {
        assert_eq!(
            derive("struct A {};\nstruct I {};\nclass D : public A {};\n", "D", "I"),
            "struct A {};\nstruct I {};\nclass D : public A, I {};\n"
        );
    }

    #[test]
    fn test_final_class() {
        assert_eq!(
            derive("struct I {};\nclass D final {};\n", "D", "I"),
            "struct I {};\nclass D final : public I {};\n"
        );
    }

    #[test]
    fn test_qualified_base_name() {
        let source = "namespace ns { namespace { struct I {}; } struct Outer { struct J {}; }; }\nstruct D {};\n";
        assert_eq!(
            derive(source, "D", "ns::Outer::J"),
            "namespace ns { namespace { struct I {}; } struct Outer { struct J {}; }; }\nstruct D : public ns::Outer::J {};\n"
        );
        assert_eq!(
            derive(source, "D", "I"),
            "namespace ns { namespace { struct I {}; } struct Outer { struct J {}; }; }\nstruct D : public ns::I {};\n"
        );
    }
}
