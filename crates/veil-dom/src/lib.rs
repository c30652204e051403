//! In-memory tree backend for the Veil engine.
//!
//! Implements the `TreeBackend` capability interface over a flat
//! element store: a small CSS selector engine, a mini XPath
//! evaluator, a px-based media-query evaluator, and mutable
//! attributes/styles/text so tests and embedding hosts can exercise
//! live-tree behavior without a real renderer.

pub mod document;
mod media;
mod selector;
mod xpath;

pub use document::{Document, NodeId};

#[cfg(test)]
mod tests;
