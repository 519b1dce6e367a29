//! Symbol table entries.
//!
//! A `Pin` describes one declared name. The variant set is closed; shared
//! fields live in an embedded `Common` record. Relations to other pins
//! (the lexical closure, alias targets, superclasses, mixins) are stored as
//! paths and resolved through the symbol index on demand.

pub mod docstring;
pub mod parameter;
pub mod pin;

pub use docstring::{Docstring, Tag, TagKind};
pub use parameter::{Parameter, ParameterKind};
pub use pin::{
    binder_type, Attribute, AttributeAccess, Block, Common, Constant, Method, MethodAlias,
    Namespace, NamespaceKind, Pin, PinKind, ProxyType, Symbol, Variable, Visibility,
};

pub use crate::complex_type::Scope;

#[cfg(test)]
mod tests;
