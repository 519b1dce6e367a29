//! Consistency checking of documented types.
//!
//! The checker walks the method pins and call sites of one mapped file and
//! reports `Problem`s where the documentation and the code disagree:
//!
//! - `@param` tags naming parameters that do not exist
//! - missing or unresolvable `@return` and `@param` types
//! - declared return types that the inferred type does not fit
//! - call arguments whose inferred type differs from the parameter's
//!
//! Which checks run is chosen by the `CheckLevel` in `CheckerConfig`.

pub mod config;
pub mod problem;
pub mod type_checker;

pub use config::{CheckLevel, CheckerConfig};
pub use problem::Problem;
pub use type_checker::{check_string, TypeChecker};
