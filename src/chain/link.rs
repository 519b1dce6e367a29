use std::fmt::Display;

use crate::complex_type::ComplexType;

use super::chain::Chain;

/// The word of a link standing in for syntax that could not be resolved.
pub const UNDEFINED_WORD: &str = "<undefined>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Local,
    Instance,
    Class,
    Global,
}

impl VariableKind {
    pub fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "lvar" | "lvasgn" => Some(VariableKind::Local),
            "ivar" | "ivasgn" => Some(VariableKind::Instance),
            "cvar" | "cvasgn" => Some(VariableKind::Class),
            "gvar" | "gvasgn" => Some(VariableKind::Global),
            _ => None,
        }
    }
}

/// One resolution step of a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    /// A constant reference. A leading `::` marks it rooted.
    Constant(String),
    Call {
        name: String,
        arguments: Vec<Chain>,
        with_block: bool,
    },
    Literal(ComplexType),
    Array(Vec<Chain>),
    /// A hash literal. Pair types are not tracked.
    Hash,
    Variable {
        kind: VariableKind,
        name: String,
    },
    SelfRef,
    ZSuper,
    Super(Vec<Chain>),
    BlockPass,
    /// Alternative values, e.g. the branches of a conditional.
    Union(Vec<Chain>),
    Undefined,
}

impl Link {
    pub fn constant(name: &str) -> Self {
        Link::Constant(name.to_string())
    }

    pub fn call(name: &str) -> Self {
        Link::Call {
            name: name.to_string(),
            arguments: vec![],
            with_block: false,
        }
    }

    pub fn call_with(name: &str, arguments: Vec<Chain>) -> Self {
        Link::Call {
            name: name.to_string(),
            arguments,
            with_block: false,
        }
    }

    pub fn literal(tag: &str) -> Self {
        Link::Literal(ComplexType::parse(tag))
    }

    pub fn variable(kind: VariableKind, name: &str) -> Self {
        Link::Variable {
            kind,
            name: name.to_string(),
        }
    }

    pub fn word(&self) -> String {
        match self {
            Link::Constant(name) => name.clone(),
            Link::Call { name, .. } => name.clone(),
            Link::Literal(complex_type) => format!("<{}>", complex_type),
            Link::Array(_) => String::from("<Array>"),
            Link::Hash => String::from("<Hash>"),
            Link::Variable { name, .. } => name.clone(),
            Link::SelfRef => String::from("self"),
            Link::ZSuper | Link::Super(_) => String::from("super"),
            Link::BlockPass => String::from("<block_pass>"),
            Link::Union(_) => String::from("<union>"),
            Link::Undefined => String::from(UNDEFINED_WORD),
        }
    }

    pub fn is_undefined(&self) -> bool {
        match self {
            Link::Undefined => true,
            Link::Constant(name) | Link::Call { name, .. } => name == UNDEFINED_WORD,
            _ => false,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Link::Constant(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Link::Literal(_) | Link::Array(_) | Link::Hash)
    }

    pub fn is_block_pass(&self) -> bool {
        matches!(self, Link::BlockPass)
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.word())
    }
}
