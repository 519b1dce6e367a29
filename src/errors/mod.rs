//! Error types for the analysis engine.
//!
//! Resolution itself never fails: anything it cannot determine degrades to
//! an empty pin list or an undefined type. The errors here cover the few
//! genuine contract violations:
//!
//! - Malformed syntax tree fixtures handed to the tree reader
//! - Checker requests for files that were never mapped
//! - Invalid configuration values

pub mod errors;

#[cfg(test)]
mod tests;
