mod location;
mod source;

pub use location::{SourceLocation, SourceRange};
pub use source::SourceFile;
