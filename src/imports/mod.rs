//! Import Merge Resolver.
//!
//! Decides how a requested [`ImportSpec`] combines with the import statements a
//! file already has for the same module path: append to an existing statement,
//! emit a new one, or report an [`ImportConflict`].

pub mod existing;
pub mod resolver;
pub mod spec;

pub use existing::{ExistingImport, ImportStyle, NamedSpecifier, Quote};
pub use resolver::{
    group_by_module, placement, render_statements, resolve_import, ImportConflict,
    ImportPlacement, ImportResolution, SpecifierKind,
};
pub use spec::{AmbiguousImportCombination, ImportSpec};
