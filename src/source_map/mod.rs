//! Per-file mapping and position queries.
//!
//! - `mapper` walks a syntax tree and produces pins
//! - `source_map` holds a file's pins and answers lexical questions about them
//! - `clip` binds a position to its lexical context for completion, definition,
//!   inference and signature queries

mod mapper;
pub mod clip;
pub mod source_map;

pub use clip::Clip;
pub use source_map::SourceMap;
