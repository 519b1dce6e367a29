//! Expression chains and their resolution.
//!
//! A node is turned into a `Chain` of links by `node_chainer`. The
//! `Resolver` walks the links left to right against the symbol index,
//! yielding the pins the chain denotes or the type it evaluates to.

pub mod chain;
pub mod link;
pub mod node_chainer;
pub mod resolver;

pub use chain::Chain;
pub use link::{Link, VariableKind, UNDEFINED_WORD};
pub use resolver::{arity_compatible, Frame, Resolver, DEFAULT_MAX_PROBE_DEPTH};

#[cfg(test)]
mod tests;
