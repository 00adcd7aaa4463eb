//! Declaration model of a C++ translation unit.
//!
//! A deliberately small subset of what a compiler front-end records: classes
//! and structs with their bases and member functions, and free functions. Each
//! declaration keeps the source locations needed to reproduce or extend the
//! text it was written with.

use implementor_common::{SourceLocation, SourceRange};
use smol_str::SmolStr;

use crate::types::QualType;

/// Index of a record in its translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u32);

impl RecordId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// C++ access specifier for class members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessSpecifier {
    /// Public access - accessible from anywhere
    Public,
    /// Private access - accessible only from within the class
    #[default]
    Private,
    /// Protected access - accessible from class and derived classes
    Protected,
}

impl AccessSpecifier {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "public" => Some(AccessSpecifier::Public),
            "private" => Some(AccessSpecifier::Private),
            "protected" => Some(AccessSpecifier::Protected),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessSpecifier::Public => "public",
            AccessSpecifier::Private => "private",
            AccessSpecifier::Protected => "protected",
        }
    }
}

/// Class-key of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Class,
    Struct,
}

impl TagKind {
    /// Access of members declared before any access label.
    pub fn default_access(self) -> AccessSpecifier {
        match self {
            TagKind::Class => AccessSpecifier::Private,
            TagKind::Struct => AccessSpecifier::Public,
        }
    }
}

/// Ref-qualifier of a non-static member function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefQualifierKind {
    #[default]
    None,
    /// `&`
    LValue,
    /// `&&`
    RValue,
}

/// Syntax an attribute was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrSyntax {
    /// `[[...]]`
    Cxx11,
    /// `__attribute__((...))`
    Gnu,
    /// `__declspec(...)`
    Declspec,
    /// Keywords behaving like attributes: `override`, `final`
    Keyword,
}

/// An attribute attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub(crate) name: SmolStr,
    pub(crate) syntax: AttrSyntax,
    pub(crate) range: SourceRange,
}

impl Attr {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn syntax(&self) -> AttrSyntax {
        self.syntax
    }

    /// Range of the attribute itself, without `[[` `]]` or `__attribute__((` `))`.
    pub fn range(&self) -> SourceRange {
        self.range
    }

    pub fn is_standard_attribute_syntax(&self) -> bool {
        self.syntax == AttrSyntax::Cxx11
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParmVarDecl {
    pub(crate) name: SmolStr,
    pub(crate) ty: QualType,
    pub(crate) range: SourceRange,
}

impl ParmVarDecl {
    /// Parameter name; empty for unnamed parameters.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters live in function prototype scope, so their qualified name
    /// is the plain name.
    pub fn qualified_name_as_string(&self) -> String {
        self.name.to_string()
    }

    /// Type after array and function decay.
    pub fn ty(&self) -> &QualType {
        &self.ty
    }

    pub fn range(&self) -> SourceRange {
        self.range
    }
}

/// A function declaration, free or member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub(crate) name: SmolStr,
    pub(crate) qualified_name: String,
    pub(crate) return_type: QualType,
    pub(crate) return_type_range: SourceRange,
    pub(crate) params: Vec<ParmVarDecl>,
    pub(crate) is_variadic: bool,
    pub(crate) exception_spec_range: SourceRange,
    pub(crate) attrs: Vec<Attr>,
    pub(crate) begin_loc: SourceLocation,
    pub(crate) end_loc: SourceLocation,
}

impl FunctionDecl {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name_as_string(&self) -> &str {
        &self.qualified_name
    }

    pub fn return_type(&self) -> &QualType {
        &self.return_type
    }

    /// Range of the written return type; invalid when there is none
    /// (constructors, destructors, conversion functions).
    pub fn return_type_source_range(&self) -> SourceRange {
        self.return_type_range
    }

    pub fn parameters(&self) -> &[ParmVarDecl] {
        &self.params
    }

    /// Whether the parameter list ends with a C-style `...`.
    pub fn is_variadic(&self) -> bool {
        self.is_variadic
    }

    /// Range of `noexcept(...)` or `throw(...)`; invalid when absent.
    pub fn exception_spec_source_range(&self) -> SourceRange {
        self.exception_spec_range
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn has_attrs(&self) -> bool {
        !self.attrs.is_empty()
    }

    /// First token of the declaration.
    pub fn begin_loc(&self) -> SourceLocation {
        self.begin_loc
    }

    /// Last token of the declaration, not counting a terminating `;`: the
    /// closing brace of a body, the `0` of a pure specifier, and so on.
    pub fn end_loc(&self) -> SourceLocation {
        self.end_loc
    }
}

/// What kind of special member a method is, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Ordinary,
    Constructor,
    Destructor,
    Conversion,
}

/// A member function of a class or struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CxxMethodDecl {
    pub(crate) function: FunctionDecl,
    pub(crate) parent: RecordId,
    pub(crate) kind: MethodKind,
    pub(crate) access: AccessSpecifier,
    pub(crate) is_virtual: bool,
    pub(crate) is_pure: bool,
    pub(crate) is_static: bool,
    pub(crate) is_const: bool,
    pub(crate) is_volatile: bool,
    pub(crate) ref_qualifier: RefQualifierKind,
    pub(crate) is_implicit: bool,
}

impl CxxMethodDecl {
    pub fn parent(&self) -> RecordId {
        self.parent
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn access(&self) -> AccessSpecifier {
        self.access
    }

    /// Declared `virtual` in this class.
    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// Declared with a pure specifier (`= 0`).
    pub fn is_pure(&self) -> bool {
        self.is_pure
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_const(&self) -> bool {
        self.is_const
    }

    pub fn is_volatile(&self) -> bool {
        self.is_volatile
    }

    pub fn ref_qualifier(&self) -> RefQualifierKind {
        self.ref_qualifier
    }

    /// Declared by the compiler rather than written in the source.
    pub fn is_implicit(&self) -> bool {
        self.is_implicit
    }
}

/// Access to the function part of free functions and methods alike.
pub trait AsFunctionDecl {
    fn as_function_decl(&self) -> &FunctionDecl;

    fn as_method_decl(&self) -> Option<&CxxMethodDecl> {
        None
    }
}

impl AsFunctionDecl for FunctionDecl {
    fn as_function_decl(&self) -> &FunctionDecl {
        self
    }
}

impl AsFunctionDecl for CxxMethodDecl {
    fn as_function_decl(&self) -> &FunctionDecl {
        &self.function
    }

    fn as_method_decl(&self) -> Option<&CxxMethodDecl> {
        Some(self)
    }
}

/// One entry of a base-clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CxxBaseSpecifier {
    pub(crate) written_name: String,
    pub(crate) access: AccessSpecifier,
    pub(crate) is_virtual: bool,
    pub(crate) range: SourceRange,
    pub(crate) record: Option<RecordId>,
}

impl CxxBaseSpecifier {
    pub fn written_name(&self) -> &str {
        &self.written_name
    }

    /// Access as written, or the default of the deriving class-key.
    pub fn access(&self) -> AccessSpecifier {
        self.access
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    pub fn range(&self) -> SourceRange {
        self.range
    }

    /// The base class definition, when it is part of the translation unit.
    pub fn record(&self) -> Option<RecordId> {
        self.record
    }
}

/// A class or struct definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CxxRecordDecl {
    pub(crate) id: RecordId,
    pub(crate) name: SmolStr,
    pub(crate) qualified_name: String,
    pub(crate) tag: TagKind,
    pub(crate) begin_loc: SourceLocation,
    pub(crate) end_loc: SourceLocation,
    pub(crate) bases: Vec<CxxBaseSpecifier>,
    pub(crate) methods: Vec<CxxMethodDecl>,
    pub(crate) is_dynamic: bool,
}

impl CxxRecordDecl {
    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name_as_string(&self) -> &str {
        &self.qualified_name
    }

    pub fn tag_kind(&self) -> TagKind {
        self.tag
    }

    pub fn is_struct(&self) -> bool {
        self.tag == TagKind::Struct
    }

    pub fn is_class(&self) -> bool {
        self.tag == TagKind::Class
    }

    /// Location of the class-key.
    pub fn begin_loc(&self) -> SourceLocation {
        self.begin_loc
    }

    /// Location of the closing brace of the body.
    pub fn end_loc(&self) -> SourceLocation {
        self.end_loc
    }

    pub fn bases(&self) -> &[CxxBaseSpecifier] {
        &self.bases
    }

    /// Member functions in declaration order, implicit ones last.
    pub fn methods(&self) -> impl Iterator<Item = &CxxMethodDecl> {
        self.methods.iter()
    }

    /// Whether the class has virtual functions or virtual bases, directly or
    /// through its bases.
    pub fn is_dynamic_class(&self) -> bool {
        self.is_dynamic
    }
}
