use std::{fmt::Display, str::FromStr};

use crate::{
    chain::DEFAULT_MAX_PROBE_DEPTH,
    errors::errors::{Error, ErrorImpl},
    Position,
};

/// How much the checker reports. Each level includes the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CheckLevel {
    /// Documented parameters must exist.
    Normal,
    /// Return and parameter types must be documented and resolvable.
    Typed,
    /// Declared return types must match the inferred ones and call
    /// arguments must match parameter types.
    #[default]
    Strict,
}

impl FromStr for CheckLevel {
    type Err = Error;

    fn from_str(level: &str) -> Result<Self, Self::Err> {
        match level.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(CheckLevel::Normal),
            "typed" => Ok(CheckLevel::Typed),
            "strict" => Ok(CheckLevel::Strict),
            _ => Err(Error::new(
                ErrorImpl::InvalidCheckLevel {
                    level: level.to_string(),
                },
                Position::default(),
            )),
        }
    }
}

impl Display for CheckLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckLevel::Normal => write!(f, "normal"),
            CheckLevel::Typed => write!(f, "typed"),
            CheckLevel::Strict => write!(f, "strict"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckerConfig {
    pub level: CheckLevel,
    /// How many nested method bodies a probe may enter.
    pub max_probe_depth: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfig {
            level: CheckLevel::default(),
            max_probe_depth: DEFAULT_MAX_PROBE_DEPTH,
        }
    }
}

impl CheckerConfig {
    pub fn with_level(level: CheckLevel) -> Self {
        CheckerConfig {
            level,
            ..Default::default()
        }
    }
}
