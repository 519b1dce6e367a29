use std::{fmt::Display, sync::Arc};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{tree::Node, Range};

use super::pin::Common;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Required,
    Optional,
    Rest,
    Keyword,
    KeywordOptional,
    KeywordRest,
    Block,
}

lazy_static! {
    static ref KEYWORD_WITH_DEFAULT: Regex = Regex::new(r"^[a-z0-9_]+:\s*\S").unwrap();
}

impl ParameterKind {
    /// Classifies a parameter from its declaration text, e.g. `*args`,
    /// `opts = {}`, `key:` or `key: 1`.
    pub fn from_declaration(declaration: &str) -> Self {
        let declaration = declaration.trim();
        if declaration.starts_with("**") {
            ParameterKind::KeywordRest
        } else if declaration.starts_with('*') {
            ParameterKind::Rest
        } else if declaration.starts_with('&') {
            ParameterKind::Block
        } else if declaration.contains('=') {
            ParameterKind::Optional
        } else if declaration.ends_with(':') {
            ParameterKind::Keyword
        } else if KEYWORD_WITH_DEFAULT.is_match(declaration) {
            ParameterKind::KeywordOptional
        } else {
            ParameterKind::Required
        }
    }

    /// The tree node kind that declares a parameter of this kind.
    pub fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "arg" => Some(ParameterKind::Required),
            "optarg" => Some(ParameterKind::Optional),
            "restarg" => Some(ParameterKind::Rest),
            "kwarg" => Some(ParameterKind::Keyword),
            "kwoptarg" => Some(ParameterKind::KeywordOptional),
            "kwrestarg" => Some(ParameterKind::KeywordRest),
            "blockarg" => Some(ParameterKind::Block),
            _ => None,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, ParameterKind::Rest | ParameterKind::KeywordRest)
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            ParameterKind::Keyword | ParameterKind::KeywordOptional | ParameterKind::KeywordRest
        )
    }
}

/// A method or block parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub common: Common,
    pub kind: ParameterKind,
    /// Source text of the default value, if any.
    pub default: Option<String>,
    pub index: usize,
    /// Where the parameter is visible as a local.
    pub presence: Option<Range>,
    pub value: Option<Arc<Node>>,
}

impl Parameter {
    /// Builds a parameter from a declaration such as `*args` or `sep = nil`.
    pub fn declared(declaration: &str, index: usize) -> Self {
        let kind = ParameterKind::from_declaration(declaration);
        let trimmed = declaration.trim();
        let (head, default) = match trimmed.split_once('=') {
            Some((head, default)) => (head.trim(), Some(default.trim().to_string())),
            None => match trimmed.split_once(':') {
                Some((head, rest)) if !rest.trim().is_empty() => {
                    (head.trim(), Some(rest.trim().to_string()))
                }
                _ => (trimmed, None),
            },
        };
        let name = head.trim_start_matches(['*', '&']).trim_end_matches(':');

        Parameter {
            common: Common {
                name: name.to_string(),
                ..Default::default()
            },
            kind,
            default,
            index,
            presence: None,
            value: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.common.name
    }

    /// The parameter as it would be declared.
    pub fn full(&self) -> String {
        let name = self.name();
        match (self.kind, &self.default) {
            (ParameterKind::Required, _) => name.to_string(),
            (ParameterKind::Optional, Some(default)) => format!("{} = {}", name, default),
            (ParameterKind::Optional, None) => format!("{} = nil", name),
            (ParameterKind::Rest, _) => format!("*{}", name),
            (ParameterKind::Keyword, _) => format!("{}:", name),
            (ParameterKind::KeywordOptional, Some(default)) => format!("{}: {}", name, default),
            (ParameterKind::KeywordOptional, None) => format!("{}: nil", name),
            (ParameterKind::KeywordRest, _) => format!("**{}", name),
            (ParameterKind::Block, _) => format!("&{}", name),
        }
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full())
    }
}
