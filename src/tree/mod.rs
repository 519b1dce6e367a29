//! Generic syntax tree input.
//!
//! The engine does not parse host-language source. It consumes a tree of
//! `Node`s, each carrying a kind tag, ordered children and a source range,
//! plus the comments found in the source. Trees can be built directly or
//! read from an s-expression rendering:
//!
//! ```text
//! (begin
//!   ; @return [Hash]
//!   (def foo (args) (hash)))
//! ```
//!
//! Each node's range is its textual extent in that rendering, and `;`
//! lines become comments.

pub mod node;
pub mod reader;
pub mod source;

pub use node::{Child, Node};
pub use reader::{read, MAX_NESTING};
pub use source::{Comment, Source};

#[cfg(test)]
mod tests;
