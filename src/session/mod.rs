//! Modification sessions.
//!
//! A [`Session`] parses one source text once, queues [`ModificationRequest`]s
//! through builder calls, and turns the whole queue into a [`GenerationResult`]
//! in a single pass over the original text:
//!
//! 1. structural requests are resolved against the tree and planned as edits,
//! 2. each plan is screened for syntax and checked against earlier plans,
//! 3. queued imports are merged per module into the existing import block,
//! 4. all edits are spliced right-to-left, then text substitutions run.

mod builder;
mod generator;
mod layout;
pub mod options;
pub mod request;
pub mod result;

pub use builder::Session;
pub use options::{HookConfig, SessionOptions};
pub use request::{
    ElementTarget, InsertPosition, ModificationRequest, StateVariable, UseEffect, WrapOptions,
};
pub use result::{GenerationError, GenerationResult};
