//! Making a class implement an interface in one step.

use implementor_cpp::{CxxRecordDecl, TranslationUnit};
use serde::Serialize;
use tracing::debug;

use crate::base_specifier::resolve_base_specifier;
use crate::edit::{apply_insertions, CodeInsertion};
use crate::error::{AssistError, Result};
use crate::expander::ExpanderOptions;
use crate::overrides::{
    pure_virtual_functions_to_override_declarations_with_options, OverrideDeclarations,
};
use crate::placement::find_suitable_place_in_class_for_public_method;

/// The edits that make a class implement an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceImplementation {
    /// Override declarations, in insertion order
    pub declarations: OverrideDeclarations,
    /// Adds the interface to the base-clause; absent when it already is a base
    pub base_specifier: Option<CodeInsertion>,
    /// Inserts the declarations; absent when there is nothing to override
    pub overrides: Option<CodeInsertion>,
    pub is_public_section_needed: bool,
}

impl InterfaceImplementation {
    pub fn insertions(&self) -> Vec<CodeInsertion> {
        self.base_specifier
            .iter()
            .chain(self.overrides.iter())
            .cloned()
            .collect()
    }

    /// Apply the edits to the buffer they were computed for.
    pub fn apply(&self, content: &str) -> Result<String> {
        apply_insertions(content, &self.insertions())
    }
}

/// Compute the edits that make `deriving` derive from `interface` and declare
/// an override for each of its pure virtual methods.
#[tracing::instrument(skip_all, fields(
    deriving = %deriving.qualified_name_as_string(),
    interface = %interface.qualified_name_as_string(),
))]
pub fn implement_interface(
    tu: &TranslationUnit,
    deriving: &CxxRecordDecl,
    interface: &CxxRecordDecl,
    options: &ExpanderOptions,
) -> Result<InterfaceImplementation> {
    if deriving.id() == interface.id() {
        return Err(AssistError::SelfImplementation {
            name: deriving.qualified_name_as_string().to_string(),
        });
    }

    let sm = tu.source_manager();
    let content = sm.buffer();

    let base_specifier = if tu.is_derived_from(deriving, interface) {
        debug!("interface is already a base");
        None
    } else {
        Some(resolve_base_specifier(content, deriving, interface, sm)?)
    };

    let declarations =
        pure_virtual_functions_to_override_declarations_with_options(tu, interface, options);
    let (overrides, is_public_section_needed) = if declarations.is_empty() {
        (None, false)
    } else {
        let place = find_suitable_place_in_class_for_public_method(content, deriving, sm)?;
        let text = override_section_text(
            &declarations,
            place.is_public_section_needed,
            is_line_start(content, place.offset),
        );
        (
            Some(CodeInsertion::new(place.offset, text)),
            place.is_public_section_needed,
        )
    };

    debug!(
        declarations = declarations.len(),
        base_specifier = base_specifier.is_some(),
        "computed interface implementation"
    );
    Ok(InterfaceImplementation {
        declarations,
        base_specifier,
        overrides,
        is_public_section_needed,
    })
}

fn override_section_text(
    declarations: &[String],
    is_public_section_needed: bool,
    at_line_start: bool,
) -> String {
    let mut text = String::new();
    if !at_line_start {
        text.push('\n');
    }
    if is_public_section_needed {
        text.push_str("public:\n");
    }
    for declaration in declarations {
        text.push_str(declaration);
        text.push('\n');
    }
    text
}

fn is_line_start(content: &str, offset: u32) -> bool {
    let offset = offset as usize;
    offset == 0 || content.as_bytes().get(offset - 1) == Some(&b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_override_section_text() {
        let declarations = vec!["void f() override;".to_string()];
        assert_eq!(
            override_section_text(&declarations, true, false),
            "\npublic:\nvoid f() override;\n"
        );
        assert_eq!(
            override_section_text(&declarations, false, true),
            "void f() override;\n"
        );
    }

    #[test]
    fn test_is_line_start() {
        assert!(is_line_start("a\nb", 0));
        assert!(is_line_start("a\nb", 2));
        assert!(!is_line_start("a\nb", 1));
        assert!(!is_line_start("a\nb", 3));
    }

    #[test]
    fn test_implement_in_struct() {
        let source = "struct I { virtual void f() = 0; };\nstruct D {};\n";
        let tu = TranslationUnit::parse(source).unwrap();
        let deriving = tu.find_record("D").unwrap();
        let interface = tu.find_record("I").unwrap();
        let implementation =
            implement_interface(&tu, deriving, interface, &ExpanderOptions::default()).unwrap();
        assert!(!implementation.is_public_section_needed);
        assert_eq!(
            implementation.apply(source).unwrap(),
            "struct I { virtual void f() = 0; };\nstruct D : public I {\nvoid f() override;\n};\n"
        );
    }

    #[test]
    fn test_existing_base_is_not_added_again() {
        let source = "struct I { virtual void f() = 0; };\nstruct D : I {\n};\n";
        let tu = TranslationUnit::parse(source).unwrap();
        let deriving = tu.find_record("D").unwrap();
        let interface = tu.find_record("I").unwrap();
        let implementation =
            implement_interface(&tu, deriving, interface, &ExpanderOptions::default()).unwrap();
        assert_eq!(implementation.base_specifier, None);
        assert_eq!(
            implementation.apply(source).unwrap(),
            "struct I { virtual void f() = 0; };\nstruct D : I {\nvoid f() override;\n};\n"
        );
    }

    #[test]
    fn test_interface_without_pure_methods() {
        let source = "struct I { virtual void f(); };\nclass D {};\n";
        let tu = TranslationUnit::parse(source).unwrap();
        let deriving = tu.find_record("D").unwrap();
        let interface = tu.find_record("I").unwrap();
        let implementation =
            implement_interface(&tu, deriving, interface, &ExpanderOptions::default()).unwrap();
        assert!(implementation.declarations.is_empty());
        assert_eq!(implementation.overrides, None);
        assert_eq!(implementation.insertions().len(), 1);
    }

    #[test]
    fn test_self_implementation() {
        let tu = TranslationUnit::parse("struct I { virtual void f() = 0; };").unwrap();
        let interface = tu.find_record("I").unwrap();
        let err = implement_interface(&tu, interface, interface, &ExpanderOptions::default())
            .unwrap_err();
        assert!(matches!(err, AssistError::SelfImplementation { .. }));
    }
}
