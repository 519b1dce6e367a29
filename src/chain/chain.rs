use std::{fmt::Display, sync::Arc};

use crate::{api_map::ApiMap, complex_type::ComplexType, pin::Pin};

use super::{link::Link, resolver::Resolver};

/// An ordered sequence of links describing one expression, e.g.
/// `Foo::Bar.new.baz`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chain {
    links: Vec<Link>,
}

impl Chain {
    pub fn new(links: Vec<Link>) -> Self {
        Chain { links }
    }

    /// A chain of a single placeholder link.
    pub fn undefined() -> Self {
        Chain::new(vec![Link::Undefined])
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn last(&self) -> Option<&Link> {
        self.links.last()
    }

    /// The chain without its last link. Single-link chains have an
    /// undefined base.
    pub fn base(&self) -> Chain {
        if self.links.len() <= 1 {
            return Chain::undefined();
        }
        Chain::new(self.links[..self.links.len() - 1].to_vec())
    }

    pub fn is_undefined(&self) -> bool {
        self.links.is_empty() || self.links.iter().any(Link::is_undefined)
    }

    pub fn is_constant(&self) -> bool {
        self.last().map(Link::is_constant).unwrap_or(false)
    }

    pub fn is_literal(&self) -> bool {
        self.last().map(Link::is_literal).unwrap_or(false)
    }

    /// The pins this chain denotes.
    pub fn define(&self, api_map: &ApiMap, closure: &Pin, locals: &[Arc<Pin>]) -> Vec<Arc<Pin>> {
        Resolver::new(api_map).define(self, closure, locals)
    }

    /// The type this chain's value would have.
    pub fn infer(&self, api_map: &ApiMap, closure: &Pin, locals: &[Arc<Pin>]) -> ComplexType {
        Resolver::new(api_map).infer(self, closure, locals)
    }
}

impl Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let words = self
            .links
            .iter()
            .map(Link::word)
            .collect::<Vec<String>>()
            .join(".");
        write!(f, "{}", words)
    }
}
