//! Rendering of function declarations as self-contained, single-line text.
//!
//! The rendered declaration is built from fragments joined by one space:
//! standard attributes, return type, qualified name with parameters, and for
//! methods the `const`, ref-qualifier and exception specification. Empty
//! fragments are dropped. Attributes and exception specifications are copied
//! from the source buffer; everything else is printed from the declaration
//! model with fully qualified names.

use implementor_cpp::{
    AsFunctionDecl, FunctionDecl, PrintingPolicy, Qualified, RefQualifierKind, SourceManager,
};
use serde::{Deserialize, Serialize};

/// Switches for [`fully_expand_function_declaration`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderOptions {
    /// Leave out `[[...]]` attributes.
    pub ignore_attribute_specifiers: bool,
}

/// Render `function` as a declaration that can be pasted into a class body.
///
/// ```text
/// [[nodiscard]] int ns::I::foo(const std::string & s) const & noexcept
/// ```
pub fn fully_expand_function_declaration<F>(
    function: &F,
    source_manager: &SourceManager,
    options: &ExpanderOptions,
) -> String
where
    F: AsFunctionDecl + ?Sized,
{
    let decl = function.as_function_decl();
    let mut policy = PrintingPolicy::as_written();
    policy.adjust_for_cplusplus();

    let mut fragments = Vec::with_capacity(6);
    if !options.ignore_attribute_specifiers {
        fragments.push(standard_attributes(decl, source_manager));
    }
    fragments.push(return_type(decl, source_manager, &policy));
    fragments.push(format!(
        "{}{}",
        policy.spell_scopes(decl.qualified_name_as_string()),
        parameters(decl, &policy)
    ));

    if let Some(method) = function.as_method_decl() {
        fragments.push(if method.is_const() { "const" } else { "" }.to_string());
        fragments.push(
            match method.ref_qualifier() {
                RefQualifierKind::None => "",
                RefQualifierKind::LValue => "&",
                RefQualifierKind::RValue => "&&",
            }
            .to_string(),
        );
        fragments.push(
            source_manager
                .text(decl.exception_spec_source_range())
                .to_string(),
        );
    }

    fragments.retain(|fragment| !fragment.is_empty());
    fragments.join(" ")
}

fn standard_attributes(decl: &FunctionDecl, sm: &SourceManager) -> String {
    decl.attrs()
        .iter()
        .filter(|attr| attr.is_standard_attribute_syntax())
        .map(|attr| format!("[[{}]]", sm.text(attr.range())))
        .collect::<Vec<_>>()
        .join(" ")
}

fn return_type(decl: &FunctionDecl, sm: &SourceManager, policy: &PrintingPolicy) -> String {
    if sm.text(decl.return_type_source_range()).trim().is_empty() {
        return String::new();
    }

    let ty = decl.return_type();
    match ty.as_template_specialization() {
        Some(spec) => {
            let mut text = String::new();
            if ty.is_const() {
                text.push_str("const ");
            }
            if ty.is_volatile() {
                text.push_str("volatile ");
            }
            text.push_str(&spec.print_template_name(policy, Qualified::Fully));
            text.push_str(&spec.print_template_argument_list(policy));
            text
        }
        None => ty.as_string(policy),
    }
}

fn parameters(decl: &FunctionDecl, policy: &PrintingPolicy) -> String {
    let mut params: Vec<String> = decl
        .parameters()
        .iter()
        .map(|param| {
            param
                .ty()
                .as_declaration(policy, &param.qualified_name_as_string())
        })
        .collect();
    if decl.is_variadic() {
        params.push("...".to_string());
    }
    format!("({})", params.join(", "))
}
