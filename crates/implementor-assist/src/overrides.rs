//! Override declarations for the pure virtual methods of an interface.

use implementor_cpp::{CxxRecordDecl, PrintingPolicy, TranslationUnit};
use tracing::{debug, trace};

use crate::expander::{fully_expand_function_declaration, ExpanderOptions};

/// Suffix of every generated declaration.
pub const OVERRIDE_SUFFIX: &str = " override;";

/// Ordered override declarations, each ending in ` override;`.
pub type OverrideDeclarations = Vec<String>;

/// Collect the pure virtual methods of `record` and its transitive bases and
/// render each as an `override;` declaration.
///
/// Bases come first, in the order [`TranslationUnit::forall_bases`] visits
/// them, followed by the record's own pure virtual methods. Within a class
/// methods keep their declaration order.
pub fn pure_virtual_functions_to_override_declarations(
    tu: &TranslationUnit,
    record: &CxxRecordDecl,
) -> OverrideDeclarations {
    pure_virtual_functions_to_override_declarations_with_options(
        tu,
        record,
        &ExpanderOptions::default(),
    )
}

#[tracing::instrument(skip_all, fields(record = %record.qualified_name_as_string()))]
pub fn pure_virtual_functions_to_override_declarations_with_options(
    tu: &TranslationUnit,
    record: &CxxRecordDecl,
    options: &ExpanderOptions,
) -> OverrideDeclarations {
    let mut declarations = OverrideDeclarations::new();
    tu.forall_bases(record, |base| {
        collect_override_declarations(tu, base, options, &mut declarations);
        true
    });
    collect_override_declarations(tu, record, options, &mut declarations);
    debug!(count = declarations.len(), "generated override declarations");
    declarations
}

fn collect_override_declarations(
    tu: &TranslationUnit,
    record: &CxxRecordDecl,
    options: &ExpanderOptions,
    declarations: &mut OverrideDeclarations,
) {
    let mut policy = PrintingPolicy::as_written();
    policy.adjust_for_cplusplus();
    let nesting_prefix = format!("{}::", policy.spell_scopes(record.qualified_name_as_string()));
    for method in record.methods().filter(|method| method.is_pure()) {
        let declaration = fully_expand_function_declaration(method, tu.source_manager(), options);
        let mut declaration = strip_nesting_prefix(&declaration, &nesting_prefix);
        declaration.push_str(OVERRIDE_SUFFIX);
        trace!(%declaration, "pure virtual method");
        declarations.push(declaration);
    }
}

/// Remove every occurrence of `prefix` that starts a name, i.e. is not
/// preceded by an identifier character or `:`. `I::` is stripped from
/// `I::Kind` but not from `XI::Kind` or `ns::I::Kind`.
fn strip_nesting_prefix(text: &str, prefix: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut copied = 0;
    for (index, _) in text.match_indices(prefix) {
        let starts_name = text[..index]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == ':'));
        if starts_name {
            stripped.push_str(&text[copied..index]);
            copied = index + prefix.len();
        }
    }
    stripped.push_str(&text[copied..]);
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn overrides(source: &str, record: &str) -> Vec<String> {
        let tu = TranslationUnit::parse(source).unwrap();
        let record = tu.find_record(record).unwrap();
        pure_virtual_functions_to_override_declarations(&tu, record)
    }

    #[test]
    fn test_strip_nesting_prefix() {
        assert_eq!(strip_nesting_prefix("void I::f(I::Kind k)", "I::"), "void f(Kind k)");
        assert_eq!(strip_nesting_prefix("XI::Kind I::f()", "I::"), "XI::Kind f()");
        assert_eq!(
            strip_nesting_prefix("ns::I::Kind ns::I::f()", "ns::I::"),
            "Kind f()"
        );
        assert_eq!(
            strip_nesting_prefix("other::ns::I::Kind ns::I::f()", "ns::I::"),
            "other::ns::I::Kind f()"
        );
        assert_eq!(
            strip_nesting_prefix("(anonymous namespace)::I::f()", "(anonymous namespace)::I::"),
            "f()"
        );
        assert_eq!(strip_nesting_prefix("I::Kind I::f(I::I::T)", "I::"), "Kind f(I::T)");
        assert_eq!(strip_nesting_prefix("void f()", "I::"), "void f()");
    }

    #[test]
    fn test_anonymous_namespace_types_are_spelled_as_written() {
        let source = "namespace { struct Arg {}; struct I { virtual void f(Arg a) = 0; }; } struct D {};";
        assert_eq!(overrides(source, "I"), vec!["void f(Arg a) override;"]);
    }

    #[test]
    fn test_function_pointer_parameters() {
        let source = "struct I { virtual void on(void (*callback)(int)) = 0; };";
        assert_eq!(overrides(source, "I"), vec!["void on(void (*callback)(int)) override;"]);
    }

    #[test]
    fn test_basic_override() {
        assert_eq!(
            overrides(
                "struct I { virtual int foo(const std::string& s) const noexcept = 0; };",
                "I"
            ),
            vec!["int foo(const std::string & s) const noexcept override;"]
        );
    }

    #[test]
    fn test_namespace_outside_the_interface_is_kept() {
        let source = r#"
namespace app {
struct Config {};
namespace api {
class Service {
public:
    struct Request {};
    virtual Config configure(const Request &request) = 0;
};
}
}
"#;
        assert_eq!(
            overrides(source, "Service"),
            vec!["app::Config configure(const Request & request) override;"]
        );
    }

    #[test]
    fn test_bases_come_before_the_record() {
        let source = r#"
struct A { virtual void a() = 0; };
struct B : A { virtual void b1() = 0; virtual void b2() = 0; };
struct C : B { virtual void c() = 0; void not_pure(); };
"#;
        assert_eq!(
            overrides(source, "C"),
            vec![
                "void b1() override;",
                "void b2() override;",
                "void a() override;",
                "void c() override;",
            ]
        );
    }

    #[test]
    fn test_diamond_bases_are_visited_once() {
        let source = r#"
struct Root { virtual void root() = 0; };
struct Left : virtual Root { virtual void left() = 0; };
struct Right : virtual Root { virtual void right() = 0; };
struct Both : Left, Right {};
"#;
        assert_eq!(
            overrides(source, "Both"),
            vec![
                "void left() override;",
                "void right() override;",
                "void root() override;",
            ]
        );
    }

    #[test]
    fn test_redeclared_pure_methods_are_not_deduplicated() {
        let source = r#"
struct A { virtual void f() = 0; };
struct B : A { void f() override = 0; };
"#;
        assert_eq!(
            overrides(source, "B"),
            vec!["void f() override;", "void f() override;"]
        );
    }

    #[test]
    fn test_no_pure_methods() {
        assert!(overrides("struct P { virtual void f(); void g(); };", "P").is_empty());
    }

    #[test]
    fn test_every_declaration_ends_with_override() {
        let source = r#"
namespace n {
struct I {
    virtual I &self() = 0;
    virtual void take(I &&other) && = 0;
};
}
"#;
        let declarations = overrides(source, "n::I");
        assert_eq!(
            declarations,
            vec![
                "n::I & self() override;",
                "void take(n::I && other) && override;",
            ]
        );
        for declaration in &declarations {
            assert!(declaration.ends_with(OVERRIDE_SUFFIX));
            assert!(!declaration.contains("n::I::"));
        }
    }
}
