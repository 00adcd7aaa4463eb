//! Editor assists for implementing C++ interfaces.
//!
//! Given a parsed translation unit, a deriving class and an interface, this
//! crate produces the source edits that attach the interface to the
//! base-clause and declare an override for each pure virtual method the
//! interface (or any of its bases) declares:
//!
//! - [`fully_expand_function_declaration`] renders a function as a single line
//!   declaration with fully qualified names.
//! - [`pure_virtual_functions_to_override_declarations`] collects the pure
//!   virtual methods of a class and its bases as `override;` declarations.
//! - [`find_suitable_place_in_class_for_public_method`] finds the offset in a
//!   class body where public declarations belong.
//! - [`resolve_base_specifier`] builds the base-clause edit.
//! - [`implement_interface`] does all of the above.

mod base_specifier;
mod edit;
mod error;
mod expander;
mod implement;
mod overrides;
mod placement;

pub use base_specifier::resolve_base_specifier;
pub use edit::{apply_insertions, CodeInsertion};
pub use error::{AssistError, Result};
pub use expander::{fully_expand_function_declaration, ExpanderOptions};
pub use implement::{implement_interface, InterfaceImplementation};
pub use overrides::{
    pure_virtual_functions_to_override_declarations,
    pure_virtual_functions_to_override_declarations_with_options, OverrideDeclarations,
    OVERRIDE_SUFFIX,
};
pub use placement::{
    find_suitable_place_in_class_for_public_method, SuitablePublicMethodPlaceInCppFile,
};
