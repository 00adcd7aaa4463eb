//! C++ front-end for implementor.
//!
//! Parses C++ with tree-sitter and lowers the syntax tree into a small
//! declaration model: records, their bases and member functions, and free
//! functions, each with the source locations editor tooling needs. The
//! source manager and the token view built from the tree's leaves give access
//! to the text around declarations.

mod ast;
mod error;
mod lexer;
mod lower;
mod parser;
mod source_manager;
mod types;
mod unit;

pub use ast::{
    AccessSpecifier, AsFunctionDecl, Attr, AttrSyntax, CxxBaseSpecifier, CxxMethodDecl,
    CxxRecordDecl, FunctionDecl, MethodKind, ParmVarDecl, RecordId, RefQualifierKind, TagKind,
};
pub use error::{FrontendError, Result};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::parse;
pub use source_manager::SourceManager;
pub use types::{
    CppType, NamedType, PrintingPolicy, QualType, Qualified, TemplateArgument,
    TemplateSpecialization,
};
pub use unit::TranslationUnit;

pub use implementor_common::{SourceFile, SourceLocation, SourceRange};
