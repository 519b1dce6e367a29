use std::{collections::HashSet, sync::Arc};

use crate::{
    api_map::ApiMap,
    chain::{node_chainer, Chain, Frame, Resolver},
    complex_type::ComplexType,
    pin::{Pin, Visibility},
    tree::Node,
    Position,
};

use super::source_map::SourceMap;

/// Node kinds a cursor can resolve through.
const CHAINABLE: &[&str] = &[
    "send", "csend", "block", "const", "lvar", "ivar", "cvar", "gvar", "self", "sym", "str",
    "dstr", "int", "float", "array", "hash", "nil", "true", "false", "zsuper", "super",
];

/// Queries bound to one position in a mapped source.
pub struct Clip<'a> {
    api_map: &'a ApiMap,
    source_map: &'a SourceMap,
    position: Position,
}

impl<'a> Clip<'a> {
    pub fn new(api_map: &'a ApiMap, source_map: &'a SourceMap, position: Position) -> Self {
        Clip {
            api_map,
            source_map,
            position,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    fn in_comment(&self) -> bool {
        self.source_map.comment_at(self.position).is_some()
    }

    fn node_path(&self) -> Vec<&'a Node> {
        match self.source_map.node() {
            Some(node) => node.path_to(self.position),
            None => vec![],
        }
    }

    /// The innermost resolvable node under the cursor.
    fn cursor_node(&self) -> Option<&'a Node> {
        self.node_path()
            .into_iter()
            .rev()
            .find(|node| CHAINABLE.contains(&node.kind.as_str()))
    }

    pub fn closure(&self) -> Arc<Pin> {
        self.source_map.locate_closure_pin(self.position)
    }

    pub fn locals(&self) -> Vec<Arc<Pin>> {
        self.source_map.locals_at(self.position)
    }

    /// The chain under the cursor.
    pub fn chain(&self) -> Chain {
        match self.cursor_node() {
            Some(node) => node_chainer::chain(node),
            None => Chain::undefined(),
        }
    }

    fn frame(&self) -> Frame {
        Resolver::new(self.api_map).frame(&self.closure())
    }

    pub fn define(&self) -> Vec<Arc<Pin>> {
        if self.in_comment() {
            return vec![];
        }
        Resolver::new(self.api_map).define(&self.chain(), &self.closure(), &self.locals())
    }

    pub fn infer(&self) -> ComplexType {
        if self.in_comment() {
            return ComplexType::UNDEFINED;
        }
        Resolver::new(self.api_map).infer(&self.chain(), &self.closure(), &self.locals())
    }

    /// The methods called by the innermost call whose arguments contain the cursor.
    pub fn signify(&self) -> Vec<Arc<Pin>> {
        if self.in_comment() {
            return vec![];
        }
        let call = self.node_path().into_iter().rev().find(|node| {
            (node.is("send") || node.is("csend"))
                && !node
                    .node_at(0)
                    .map(|receiver| receiver.range.contains(self.position))
                    .unwrap_or(false)
        });
        match call {
            Some(call) => {
                let mut resolver = Resolver::new(self.api_map).without_arity_check();
                resolver.define(&node_chainer::chain(call), &self.closure(), &self.locals())
            }
            None => vec![],
        }
    }

    /// Completion candidates for the word under the cursor.
    pub fn complete(&self) -> Vec<Arc<Pin>> {
        if self.in_comment() {
            return vec![];
        }
        let Some(node) = self.cursor_node() else {
            return vec![];
        };

        let candidates = match node.kind.as_str() {
            "str" | "dstr" => return vec![],
            "const" => self.complete_constant(node),
            "ivar" => {
                let binder = self.frame().binder;
                self.api_map
                    .instance_variable_pins(&binder.namespace(), binder.scope())
            }
            "cvar" => self.api_map.class_variable_pins(&self.frame().namespace),
            "gvar" => self.api_map.global_variable_pins(),
            "sym" => {
                return filter_prefix(self.api_map.symbols(), &format!(":{}", word(node)));
            }
            "send" | "csend" => match node.node_at(0) {
                Some(receiver) => self.complete_methods(receiver),
                None => self.complete_word(),
            },
            "lvar" => self.complete_word(),
            _ => vec![],
        };
        filter_prefix(candidates, word(node))
    }

    fn complete_constant(&self, node: &Node) -> Vec<Arc<Pin>> {
        match node.node_at(0) {
            None => self.api_map.visible_constants(&self.frame().namespace),
            Some(scope) if scope.is("cbase") => self.api_map.get_constants(""),
            Some(scope) => {
                let namespace = self.resolver_infer(scope);
                if namespace.is_undefined() {
                    vec![]
                } else {
                    self.api_map.get_constants(&namespace.namespace())
                }
            }
        }
    }

    fn complete_methods(&self, receiver: &Node) -> Vec<Arc<Pin>> {
        let receiver_type = self.resolver_infer(receiver);
        if receiver_type.is_undefined() {
            return vec![];
        }
        let frame = self.frame();
        let ceiling = if receiver.is("self") {
            Visibility::Private
        } else if self
            .api_map
            .super_and_sub(&receiver_type.namespace(), &frame.binder.namespace())
        {
            Visibility::Protected
        } else {
            Visibility::Public
        };
        self.api_map.get_complex_type_methods(&receiver_type, ceiling)
    }

    /// Locals first, then methods callable on `self`, then constants.
    fn complete_word(&self) -> Vec<Arc<Pin>> {
        let frame = self.frame();
        let mut result: Vec<Arc<Pin>> = self.locals().into_iter().rev().collect();
        let ceiling = if frame.public_only {
            Visibility::Public
        } else {
            Visibility::Private
        };
        result.extend(self.api_map.get_complex_type_methods(&frame.binder, ceiling));
        result.extend(self.api_map.visible_constants(&frame.namespace));
        result
    }

    fn resolver_infer(&self, node: &Node) -> ComplexType {
        Resolver::new(self.api_map).infer(&node_chainer::chain(node), &self.closure(), &self.locals())
    }
}

/// The name token of a cursor node.
fn word(node: &Node) -> &str {
    let index = match node.kind.as_str() {
        "send" | "csend" | "const" => 1,
        _ => 0,
    };
    node.token_at(index).unwrap_or_default()
}

/// Pins whose name starts with `prefix`, first of each name only.
fn filter_prefix(pins: Vec<Arc<Pin>>, prefix: &str) -> Vec<Arc<Pin>> {
    let mut seen = HashSet::new();
    pins.into_iter()
        .filter(|pin| pin.name().starts_with(prefix))
        .filter(|pin| seen.insert(pin.name().to_string()))
        .collect()
}
