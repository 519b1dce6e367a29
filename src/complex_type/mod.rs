//! Type algebra.
//!
//! A `ComplexType` is a union of zero or more `UniqueType` atoms parsed
//! from documentation tag strings such as `Array<String>`,
//! `Hash{Symbol => Integer}` or `String, nil`. The module has no
//! knowledge of the symbol index; qualification goes through the
//! `ConstantResolver` trait.
//!
//! - `lexer` splits tag strings into tokens with anchored regex patterns
//! - `parser` builds atoms from the token stream
//! - `complex_type` holds the value types and their operations

pub mod complex_type;
pub mod lexer;
pub mod parser;

pub use complex_type::{ComplexType, ConstantResolver, ParametersKind, Scope, UniqueType};
