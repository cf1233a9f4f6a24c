//! TSX Patcher: structural source transformation for TSX/JSX components
//!
//! Parses one component file, queues typed modification requests against the
//! parsed tree, and regenerates source text that reflects all of them.
//!
//! # Architecture
//!
//! Every structural request compiles down to [`Edit`]s: verified byte-span
//! replacements against the original text. Intelligence lives in span
//! acquisition (tree-sitter node lookups, ast-grep patterns, import analysis),
//! not in the application logic, which sorts edits and splices them
//! right-to-left.
//!
//! - [`ts`]: parser, S-expression queries, the node query layer
//! - [`imports`]: reading existing imports and merging requested ones
//! - [`session`]: the request queue and the code generator
//! - [`text_patch`]: literal search-and-replace fallback
//! - [`config`]: TOML plan files applied through a session
//!
//! # Example
//!
//! ```no_run
//! use tsx_patcher::session::{Session, StateVariable, WrapOptions};
//! use tsx_patcher::ts::ElementLocator;
//!
//! let mut session = Session::initialize(
//!     "export default function App() {\n  return <div>hi</div>;\n}\n",
//! );
//! session.add_state_variable(StateVariable::new("count", "setCount", "0"));
//! session
//!     .wrap_element(
//!         ElementLocator::tag("div"),
//!         WrapOptions::new("AuthGuard").default_import_from("@/components/AuthGuard"),
//!     )
//!     .expect("default-only import is unambiguous");
//!
//! let result = session.generate();
//! if let Some(code) = &result.code {
//!     println!("{code}");
//! }
//! for error in &result.errors {
//!     eprintln!("skipped: {error}");
//! }
//! ```

pub mod cache;
pub mod config;
pub mod edit;
pub mod imports;
pub mod pool;
pub mod session;
pub mod sg;
pub mod text_patch;
pub mod ts;
pub mod validate;

// Re-exports
pub use config::{apply_plan, load_from_path, load_from_str, ConfigError, PlanConfig, PlanError};
pub use edit::{Edit, EditError, EditVerification};
pub use imports::{AmbiguousImportCombination, ImportConflict, ImportSpec};
pub use session::{
    ElementTarget, GenerationError, GenerationResult, InsertPosition, ModificationRequest, Session,
    SessionOptions, StateVariable, UseEffect, WrapOptions,
};
pub use text_patch::{replace_all, TextPatch, TextPatchError};
pub use ts::{ElementLocator, NodeQuery, NodeSpan, SyntaxTree, TreeSitterError};
pub use validate::{ErrorLocation, ValidationError};
