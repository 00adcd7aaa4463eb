//! C++ type representation and printing.
//!
//! Types are printed the way clang prints them for C++: `const std::string &`,
//! `int *const`, `void (*)(int)`. Named types print as written unless the
//! printing policy asks for fully qualified names.

use std::borrow::Cow;

use smol_str::SmolStr;

use crate::lower::ANONYMOUS_NAMESPACE;

/// Controls how types are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrintingPolicy {
    fully_qualified_names: bool,
    suppress_unwritten_scope: bool,
}

impl PrintingPolicy {
    /// Policy that prints every name as it was written.
    pub fn as_written() -> Self {
        Self::default()
    }

    /// Adjust the policy to print C++ the way a declaration is written by
    /// tooling: names qualified from the global namespace, leaving out
    /// scopes that cannot be spelled such as `(anonymous namespace)`.
    pub fn adjust_for_cplusplus(&mut self) {
        self.fully_qualified_names = true;
        self.suppress_unwritten_scope = true;
    }

    pub fn fully_qualified_names(&self) -> bool {
        self.fully_qualified_names
    }

    pub fn suppress_unwritten_scope(&self) -> bool {
        self.suppress_unwritten_scope
    }

    /// `name` without the scopes the policy suppresses.
    pub fn spell_scopes<'a>(&self, name: &'a str) -> Cow<'a, str> {
        let anonymous = format!("{ANONYMOUS_NAMESPACE}::");
        if self.suppress_unwritten_scope && name.contains(&anonymous) {
            Cow::Owned(name.replace(&anonymous, ""))
        } else {
            Cow::Borrowed(name)
        }
    }
}

/// A reference to a named type (class, struct, enum, alias).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    /// Spelling in the source, whitespace normalized
    written: String,
    /// Name qualified from the global namespace, when the declaration is known
    qualified: Option<String>,
}

impl NamedType {
    pub fn new(written: impl Into<String>, qualified: Option<String>) -> Self {
        Self {
            written: written.into(),
            qualified,
        }
    }

    pub fn written(&self) -> &str {
        &self.written
    }

    /// Fully qualified name; falls back to the written spelling for names
    /// whose declaration is not part of the translation unit.
    pub fn qualified_name(&self) -> &str {
        self.qualified.as_deref().unwrap_or(&self.written)
    }

    pub fn is_resolved(&self) -> bool {
        self.qualified.is_some()
    }

    pub fn print(&self, policy: &PrintingPolicy) -> Cow<'_, str> {
        if policy.fully_qualified_names() {
            policy.spell_scopes(self.qualified_name())
        } else {
            Cow::Borrowed(&self.written)
        }
    }

    /// Last component of the name, without any scope.
    pub fn unqualified_name(&self) -> &str {
        let name = self.qualified_name();
        name.rsplit("::").next().unwrap_or(name)
    }
}

/// One argument of a template specialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateArgument {
    Type(QualType),
    /// Non-type argument, kept as its normalized spelling
    Expression(String),
}

impl TemplateArgument {
    pub fn as_string(&self, policy: &PrintingPolicy) -> String {
        match self {
            TemplateArgument::Type(ty) => ty.as_string(policy),
            TemplateArgument::Expression(text) => text.clone(),
        }
    }
}

/// How the template name of a specialization is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualified {
    /// Follow the printing policy
    AsPolicy,
    /// Always qualify from the global namespace
    Fully,
}

/// A template specialization type: `std::vector<int>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpecialization {
    template: NamedType,
    args: Vec<TemplateArgument>,
}

impl TemplateSpecialization {
    pub fn new(template: NamedType, args: Vec<TemplateArgument>) -> Self {
        Self { template, args }
    }

    pub fn template_name(&self) -> &NamedType {
        &self.template
    }

    pub fn template_arguments(&self) -> &[TemplateArgument] {
        &self.args
    }

    pub fn print_template_name(&self, policy: &PrintingPolicy, qualified: Qualified) -> String {
        match qualified {
            Qualified::Fully => policy
                .spell_scopes(self.template.qualified_name())
                .into_owned(),
            Qualified::AsPolicy => self.template.print(policy).into_owned(),
        }
    }

    /// `<int, std::string>`
    pub fn print_template_argument_list(&self, policy: &PrintingPolicy) -> String {
        let args: Vec<String> = self.args.iter().map(|arg| arg.as_string(policy)).collect();
        format!("<{}>", args.join(", "))
    }

    fn print(&self, policy: &PrintingPolicy) -> String {
        format!(
            "{}{}",
            self.print_template_name(policy, Qualified::AsPolicy),
            self.print_template_argument_list(policy)
        )
    }
}

/// A C++ type without its top-level cv-qualifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CppType {
    /// void
    Void,
    /// bool
    Bool,
    /// char, signed char, unsigned char. Plain char has no signedness.
    Char { signed: Option<bool> },
    /// short, unsigned short
    Short { signed: bool },
    /// int, unsigned int
    Int { signed: bool },
    /// long, unsigned long
    Long { signed: bool },
    /// long long, unsigned long long
    LongLong { signed: bool },
    /// float
    Float,
    /// double
    Double,
    /// long double
    LongDouble,
    /// Other builtin or well-known spelling: size_t, wchar_t, char8_t...
    Primitive(SmolStr),
    /// Named type (class, struct, enum, alias)
    Named(NamedType),
    /// Template specialization: T<Args...>
    TemplateSpecialization(TemplateSpecialization),
    /// Pointer type: T*
    Pointer(Box<QualType>),
    /// Lvalue reference: T&
    LValueReference(Box<QualType>),
    /// Rvalue reference: T&&
    RValueReference(Box<QualType>),
    /// Array type: T[N]
    Array {
        element: Box<QualType>,
        size: Option<String>,
    },
    /// Function type: R(Args...)
    Function {
        return_type: Box<QualType>,
        params: Vec<QualType>,
        is_variadic: bool,
    },
    /// Anything we only know by its spelling: auto, decltype(...), packs
    Spelled(String),
}

impl CppType {
    fn builtin_name(&self) -> Option<&str> {
        let name = match self {
            CppType::Void => "void",
            CppType::Bool => "bool",
            CppType::Char { signed: None } => "char",
            CppType::Char { signed: Some(true) } => "signed char",
            CppType::Char { signed: Some(false) } => "unsigned char",
            CppType::Short { signed: true } => "short",
            CppType::Short { signed: false } => "unsigned short",
            CppType::Int { signed: true } => "int",
            CppType::Int { signed: false } => "unsigned int",
            CppType::Long { signed: true } => "long",
            CppType::Long { signed: false } => "unsigned long",
            CppType::LongLong { signed: true } => "long long",
            CppType::LongLong { signed: false } => "unsigned long long",
            CppType::Float => "float",
            CppType::Double => "double",
            CppType::LongDouble => "long double",
            CppType::Primitive(name) => name.as_str(),
            _ => return None,
        };
        Some(name)
    }

    /// Map a `primitive_type` spelling.
    pub fn from_primitive(spelling: &str) -> Self {
        match spelling {
            "void" => CppType::Void,
            "bool" => CppType::Bool,
            "char" => CppType::Char { signed: None },
            "int" => CppType::Int { signed: true },
            "float" => CppType::Float,
            "double" => CppType::Double,
            other => CppType::Primitive(SmolStr::new(other)),
        }
    }
}

/// A type together with its top-level cv-qualifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualType {
    ty: CppType,
    is_const: bool,
    is_volatile: bool,
}

impl QualType {
    pub fn new(ty: CppType) -> Self {
        Self {
            ty,
            is_const: false,
            is_volatile: false,
        }
    }

    pub fn with_qualifiers(mut self, is_const: bool, is_volatile: bool) -> Self {
        self.is_const |= is_const;
        self.is_volatile |= is_volatile;
        self
    }

    pub fn ty(&self) -> &CppType {
        &self.ty
    }

    pub fn is_const(&self) -> bool {
        self.is_const
    }

    pub fn is_volatile(&self) -> bool {
        self.is_volatile
    }

    pub fn pointer_to(self) -> Self {
        QualType::new(CppType::Pointer(Box::new(self)))
    }

    pub fn as_template_specialization(&self) -> Option<&TemplateSpecialization> {
        match &self.ty {
            CppType::TemplateSpecialization(spec) => Some(spec),
            _ => None,
        }
    }

    /// The pointee/referent of pointer and reference types.
    pub fn pointee(&self) -> Option<&QualType> {
        match &self.ty {
            CppType::Pointer(inner)
            | CppType::LValueReference(inner)
            | CppType::RValueReference(inner) => Some(inner),
            _ => None,
        }
    }

    /// Parameter type adjustment: arrays and functions decay to pointers,
    /// top-level cv-qualifiers stay as written.
    pub fn decayed(self) -> Self {
        let (is_const, is_volatile) = (self.is_const, self.is_volatile);
        match self.ty {
            CppType::Array { element, .. } => {
                element.pointer_to().with_qualifiers(is_const, is_volatile)
            }
            ty @ CppType::Function { .. } => QualType::new(ty).pointer_to(),
            ty => QualType {
                ty,
                is_const,
                is_volatile,
            },
        }
    }

    /// Prefix for leaf types, suffix of the sigil for pointers.
    fn qualifier_words(&self) -> Vec<&'static str> {
        let mut words = Vec::new();
        if self.is_const {
            words.push("const");
        }
        if self.is_volatile {
            words.push("volatile");
        }
        words
    }

    pub fn as_string(&self, policy: &PrintingPolicy) -> String {
        self.print_with_declarator(policy, "")
    }

    /// Print a declaration of `name` with this type: `const char * fmt`, or
    /// `void (*cb)(int)` when the name has to sit inside the declarator.
    pub fn as_declaration(&self, policy: &PrintingPolicy, name: &str) -> String {
        if name.is_empty() {
            self.as_string(policy)
        } else if self.has_inner_declarator() {
            self.print_with_declarator(policy, name)
        } else {
            format!("{} {name}", self.as_string(policy))
        }
    }

    fn has_inner_declarator(&self) -> bool {
        match &self.ty {
            CppType::Array { .. } | CppType::Function { .. } => true,
            CppType::Pointer(inner)
            | CppType::LValueReference(inner)
            | CppType::RValueReference(inner) => inner.has_inner_declarator(),
            _ => false,
        }
    }

    /// Print the type around an (abstract) declarator, inside out.
    fn print_with_declarator(&self, policy: &PrintingPolicy, declarator: &str) -> String {
        match &self.ty {
            CppType::Pointer(pointee) => {
                let mut inner = String::from("*");
                let qualifiers = self.qualifier_words();
                if !qualifiers.is_empty() {
                    inner.push_str(&qualifiers.join(" "));
                }
                pointee.wrap(policy, inner, declarator)
            }
            CppType::LValueReference(referent) => referent.wrap(policy, "&".into(), declarator),
            CppType::RValueReference(referent) => referent.wrap(policy, "&&".into(), declarator),
            CppType::Array { element, size } => {
                let suffix = format!("[{}]", size.as_deref().unwrap_or(""));
                let declarator = if declarator.is_empty() {
                    suffix
                } else {
                    format!("{declarator}{suffix}")
                };
                element.print_with_declarator(policy, &declarator)
            }
            CppType::Function {
                return_type,
                params,
                is_variadic,
            } => {
                let mut params: Vec<String> =
                    params.iter().map(|param| param.as_string(policy)).collect();
                if *is_variadic {
                    params.push("...".into());
                }
                let declarator = format!("{declarator}({})", params.join(", "));
                return_type.print_with_declarator(policy, &declarator)
            }
            leaf => {
                let mut text = self.qualifier_words().join(" ");
                if !text.is_empty() {
                    text.push(' ');
                }
                match leaf {
                    CppType::Named(named) => text.push_str(&named.print(policy)),
                    CppType::TemplateSpecialization(spec) => text.push_str(&spec.print(policy)),
                    CppType::Spelled(spelling) => text.push_str(spelling),
                    builtin => text.push_str(builtin.builtin_name().unwrap_or_default()),
                }
                if declarator.is_empty() {
                    text
                } else if declarator.starts_with('[') || declarator.starts_with('(') {
                    format!("{text} {declarator}")
                } else {
                    join_declarator(text, declarator)
                }
            }
        }
    }

    /// Print `self` as the target of a pointer or reference whose sigil is
    /// `inner`, with `declarator` already built around it.
    fn wrap(&self, policy: &PrintingPolicy, inner: String, declarator: &str) -> String {
        let inner = if inner.ends_with(|c: char| c.is_ascii_alphabetic())
            && declarator.starts_with(['*', '&'])
        {
            format!("{inner} {declarator}")
        } else {
            format!("{inner}{declarator}")
        };
        match &self.ty {
            CppType::Array { .. } | CppType::Function { .. } => {
                self.print_with_declarator(policy, &format!("({inner})"))
            }
            _ => self.print_with_declarator(policy, &inner),
        }
    }
}

/// Attach a pointer/reference declarator, gluing consecutive sigils.
fn join_declarator(text: String, declarator: &str) -> String {
    if text.ends_with('*') || text.ends_with('&') {
        format!("{text}{declarator}")
    } else {
        format!("{text} {declarator}")
    }
}
