//! Procedural filter engine.
//!
//! Compiles `{type, arg}` rule lists into operator pipelines,
//! evaluates them against any `TreeBackend`, and keeps a hide/restore
//! session in sync with the match set as the tree changes.

pub mod eval;
pub mod filter;
pub mod operator;
pub mod session;

pub use filter::CompiledFilter;
pub use operator::{Operator, SubFilter, UpwardInstruction};
pub use session::{run, CancelHandle, HideSession, ReconcileOutcome};
