//! Chain resolution: links to pins, pins to types.
//!
//! A `Resolver` carries the guards for one query: the variables whose
//! assignments are being inferred and the methods being probed. Both break
//! cycles by yielding `undefined`.

use std::{collections::HashSet, sync::Arc};

use tracing::trace;

use crate::{
    api_map::ApiMap,
    complex_type::{ComplexType, Scope, UniqueType},
    pin::{binder_type, AttributeAccess, ParameterKind, Pin, TagKind, Visibility},
    Position,
};

use super::{
    chain::Chain,
    link::{Link, VariableKind},
    node_chainer::{self, returns_from},
};

pub const DEFAULT_MAX_PROBE_DEPTH: usize = 2;

/// The lexical context a closure provides to the links resolved inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// The type of `self`.
    pub binder: ComplexType,
    /// The namespace used for constant lookup.
    pub namespace: String,
    /// Implicit calls only see public methods (`@yieldpublic`).
    pub public_only: bool,
}

pub struct Resolver<'a> {
    api_map: &'a ApiMap,
    max_probe_depth: usize,
    check_arity: bool,
    probing: Vec<String>,
    variables: HashSet<(String, String)>,
    rebinding: HashSet<(String, Position)>,
}

impl<'a> Resolver<'a> {
    pub fn new(api_map: &'a ApiMap) -> Self {
        Resolver {
            api_map,
            max_probe_depth: DEFAULT_MAX_PROBE_DEPTH,
            check_arity: true,
            probing: vec![],
            variables: HashSet::new(),
            rebinding: HashSet::new(),
        }
    }

    pub fn with_max_probe_depth(mut self, depth: usize) -> Self {
        self.max_probe_depth = depth;
        self
    }

    /// Keeps call candidates whose parameters do not fit the arguments.
    pub fn without_arity_check(mut self) -> Self {
        self.check_arity = false;
        self
    }

    pub fn define(&mut self, chain: &Chain, closure: &Pin, locals: &[Arc<Pin>]) -> Vec<Arc<Pin>> {
        if chain.is_undefined() {
            return vec![];
        }
        let frame = self.frame(closure);
        let links = chain.links();
        let Some((last, base)) = links.split_last() else {
            return vec![];
        };

        if base.is_empty() {
            return self.resolve_link(last, &frame.binder, true, closure, &frame, locals);
        }
        let receiver = self.infer_links(base, closure, &frame, locals);
        if receiver.is_undefined() {
            return vec![];
        }
        self.resolve_link(last, &receiver, false, closure, &frame, locals)
    }

    pub fn infer(&mut self, chain: &Chain, closure: &Pin, locals: &[Arc<Pin>]) -> ComplexType {
        if chain.is_undefined() {
            return ComplexType::UNDEFINED;
        }
        let frame = self.frame(closure);
        self.infer_links(chain.links(), closure, &frame, locals)
    }

    fn infer_links(&mut self, links: &[Link], closure: &Pin, frame: &Frame, locals: &[Arc<Pin>]) -> ComplexType {
        let mut receiver = frame.binder.clone();
        for (index, link) in links.iter().enumerate() {
            let pins = self.resolve_link(link, &receiver, index == 0, closure, frame, locals);
            let resolved = pins
                .iter()
                .map(|pin| self.type_of(pin, link, &receiver))
                .find(|complex_type| !complex_type.is_undefined())
                .unwrap_or(ComplexType::UNDEFINED);
            if resolved.is_undefined() {
                trace!(target: "chain", link = %link, "unresolved link");
                return ComplexType::UNDEFINED;
            }
            receiver = resolved;
        }
        receiver
    }

    /// The context `closure` gives to code inside it. Blocks passed to a
    /// method tagged `@yieldself`/`@yieldpublic` are rebound to that type.
    pub fn frame(&mut self, closure: &Pin) -> Frame {
        match closure {
            Pin::Namespace(_) => Frame {
                binder: closure
                    .namespace_type()
                    .filter(|_| !closure.path().is_empty())
                    .unwrap_or_else(|| closure.context().clone()),
                namespace: closure.path(),
                public_only: false,
            },
            Pin::Block(_) => self.rebind(closure).unwrap_or_else(|| Frame {
                binder: closure.context().clone(),
                namespace: closure.namespace().to_string(),
                public_only: false,
            }),
            _ => Frame {
                binder: closure.context().clone(),
                namespace: closure.namespace().to_string(),
                public_only: false,
            },
        }
    }

    fn rebind(&mut self, block: &Pin) -> Option<Frame> {
        let Pin::Block(inner) = block else {
            return None;
        };
        let receiver = inner.receiver.as_deref()?;
        let api_map = self.api_map;
        let filename = block.filename()?;
        let source_map = api_map.source_map(filename)?;

        let key = (filename.to_string(), receiver.range.start);
        if !self.rebinding.insert(key.clone()) {
            trace!(target: "chain", filename, "block rebinding cycle broken");
            return None;
        }

        let outer = source_map.locate_closure_pin(receiver.range.start);
        let locals = source_map.locals_at(receiver.range.start);
        let call = node_chainer::chain(receiver);
        let targets = self.define(&call, &outer, &locals);

        let mut result = None;
        for target in targets {
            let docstring = target.docstring();
            let Some(tag) = docstring
                .tag(TagKind::YieldSelf)
                .or_else(|| docstring.tag(TagKind::YieldPublic))
            else {
                continue;
            };
            let declared = tag.declared_type();
            let binder = if declared.references_self() {
                let base = call.base();
                let receiver_type = if base.is_undefined() {
                    self.frame(&outer).binder
                } else {
                    self.infer(&base, &outer, &locals)
                };
                declared.self_to(&receiver_type)
            } else {
                declared.qualify(api_map, target.namespace())
            };
            if binder.is_undefined() {
                continue;
            }
            result = Some(Frame {
                namespace: binder.namespace(),
                binder,
                public_only: tag.kind == TagKind::YieldPublic,
            });
            break;
        }

        self.rebinding.remove(&key);
        result
    }

    fn resolve_link(
        &mut self,
        link: &Link,
        receiver: &ComplexType,
        first: bool,
        closure: &Pin,
        frame: &Frame,
        locals: &[Arc<Pin>],
    ) -> Vec<Arc<Pin>> {
        match link {
            Link::Constant(name) => {
                if first {
                    self.api_map.resolve_constant(name, &frame.namespace)
                } else if receiver.scope() == Scope::Class {
                    self.api_map.resolve_member(&receiver.namespace(), name)
                } else {
                    vec![]
                }
            }
            Link::Call { name, arguments, .. } => {
                let ceiling = if first {
                    if frame.public_only {
                        Visibility::Public
                    } else {
                        Visibility::Private
                    }
                } else if self
                    .api_map
                    .super_and_sub(&receiver.namespace(), &frame.binder.namespace())
                {
                    Visibility::Protected
                } else {
                    Visibility::Public
                };

                let mut pins = vec![];
                for unique in receiver {
                    if unique.is_undefined() || unique.is_void() {
                        continue;
                    }
                    pins.extend(self.api_map.method_pins(&unique.namespace(), name, unique.scope(), ceiling));
                }
                if self.check_arity {
                    pins.retain(|pin| arity_compatible(pin, arguments));
                }
                pins
            }
            Link::Literal(complex_type) => {
                vec![Arc::new(Pin::proxy(complex_type.qualify(self.api_map, "")))]
            }
            Link::Array(elements) => {
                let types: Vec<ComplexType> = elements
                    .iter()
                    .map(|element| self.infer(element, closure, locals))
                    .collect();
                vec![Arc::new(Pin::proxy(self.container_type("Array", &types)))]
            }
            Link::Hash => vec![Arc::new(Pin::proxy(ComplexType::parse("::Hash")))],
            Link::Variable { kind, name } => self.variable_pins(*kind, name, frame, locals),
            Link::SelfRef => vec![Arc::new(Pin::proxy(frame.binder.clone()))],
            Link::ZSuper | Link::Super(_) => self.super_pins(closure),
            Link::Union(chains) => {
                let types: Vec<ComplexType> = chains
                    .iter()
                    .map(|chain| self.infer(chain, closure, locals))
                    .collect();
                vec![Arc::new(Pin::proxy(ComplexType::union(types)))]
            }
            Link::BlockPass | Link::Undefined => vec![],
        }
    }

    fn variable_pins(&self, kind: VariableKind, name: &str, frame: &Frame, locals: &[Arc<Pin>]) -> Vec<Arc<Pin>> {
        let candidates = match kind {
            VariableKind::Local => {
                let mut matching: Vec<Arc<Pin>> = locals.to_vec();
                matching.reverse();
                matching
            }
            VariableKind::Instance => self
                .api_map
                .instance_variable_pins(&frame.binder.namespace(), frame.binder.scope()),
            VariableKind::Class => self.api_map.class_variable_pins(&frame.namespace),
            VariableKind::Global => self.api_map.global_variable_pins(),
        };
        candidates.into_iter().filter(|pin| pin.name() == name).collect()
    }

    fn super_pins(&self, closure: &Pin) -> Vec<Arc<Pin>> {
        let method = match closure {
            Pin::Method(_) => Some(Arc::new(closure.clone())),
            _ => self
                .api_map
                .lookup(closure.closure())
                .into_iter()
                .find(|pin| matches!(pin.as_ref(), Pin::Method(_))),
        };
        match method {
            Some(method) => self
                .api_map
                .super_method_pins(&method.owner(), method.name(), method.scope()),
            None => vec![],
        }
    }

    fn container_type(&self, name: &str, elements: &[ComplexType]) -> ComplexType {
        let mut unique = match uniform(elements) {
            Some(element) => UniqueType::with_subtypes(name, element.items().to_vec()),
            None => UniqueType::new(name),
        };
        unique.rooted = true;
        ComplexType::from_unique(unique)
    }

    /// The type a resolved pin gives to `link`.
    fn type_of(&mut self, pin: &Pin, link: &Link, receiver: &ComplexType) -> ComplexType {
        match pin {
            Pin::Namespace(_) => pin.namespace_type().unwrap_or(ComplexType::UNDEFINED),
            Pin::ProxyType(_) => pin.return_type().clone(),
            Pin::Method(_) | Pin::Attribute(_) => {
                let mut result = self.declared_return(pin, link);
                if result.is_undefined() {
                    result = self.probe(pin);
                }
                if pin.path() == "Class#new" {
                    result = instance_of(receiver);
                }
                if result.references_self() {
                    result = result.self_to(receiver);
                }
                result
            }
            Pin::Symbol(_) => ComplexType::parse("::Symbol"),
            Pin::Block(_) | Pin::MethodAlias(_) => ComplexType::UNDEFINED,
            _ => {
                let declared = self.typify(pin);
                if declared.is_undefined() {
                    self.probe(pin)
                } else {
                    declared
                }
            }
        }
    }

    /// A method's declared return type, with macro arguments substituted.
    fn declared_return(&self, pin: &Pin, link: &Link) -> ComplexType {
        let docstring = pin.docstring();
        let Some(tag) = docstring.tag(TagKind::Return) else {
            return self.typify(pin);
        };
        if !tag.types.iter().any(|t| t.contains('$')) {
            return self.typify(pin);
        }

        let words: Vec<String> = match link {
            Link::Call { arguments, .. } => arguments
                .iter()
                .map(|argument| argument.last().map(Link::word).unwrap_or_default())
                .collect(),
            _ => vec![],
        };
        let substituted: Vec<String> = tag
            .types
            .iter()
            .map(|t| substitute_macro_arguments(t, pin.name(), &words))
            .collect();
        ComplexType::try_parse(&substituted).qualify(self.api_map, pin.namespace())
    }

    /// The declared type of a pin, qualified in its lexical namespace.
    pub fn typify(&self, pin: &Pin) -> ComplexType {
        pin.return_type().qualify(self.api_map, pin.namespace())
    }

    /// Infers a type from a pin's implementation: a method's terminal
    /// expressions, or a variable's assigned value.
    pub fn probe(&mut self, pin: &Pin) -> ComplexType {
        match pin {
            Pin::Method(method) => {
                let path = pin.path();
                if self.probing.len() >= self.max_probe_depth || self.probing.contains(&path) {
                    trace!(target: "chain", method = %path, depth = self.probing.len(), "probe cut off");
                    return ComplexType::UNDEFINED;
                }
                let Some(body) = method.body() else {
                    return ComplexType::UNDEFINED;
                };
                let api_map = self.api_map;
                let Some(source_map) = pin.filename().and_then(|filename| api_map.source_map(filename)) else {
                    return ComplexType::UNDEFINED;
                };

                self.probing.push(path);
                let mut types = vec![];
                for node in returns_from(body) {
                    let closure = source_map.locate_closure_pin(node.range.start);
                    let locals = source_map.locals_at(node.range.start);
                    types.push(self.infer(&node_chainer::chain(node), &closure, &locals));
                }
                self.probing.pop();
                ComplexType::union(types)
            }
            Pin::Attribute(attribute) if attribute.access == AttributeAccess::Reader => {
                let name = format!("@{}", pin.name());
                let candidates = self.api_map.instance_variable_pins(&pin.owner(), attribute.scope);
                candidates
                    .iter()
                    .filter(|candidate| candidate.name() == name)
                    .map(|candidate| self.type_of(candidate, &Link::Undefined, &ComplexType::UNDEFINED))
                    .find(|complex_type| !complex_type.is_undefined())
                    .unwrap_or(ComplexType::UNDEFINED)
            }
            _ => self.probe_assignment(pin),
        }
    }

    fn probe_assignment(&mut self, pin: &Pin) -> ComplexType {
        let Some(assignment) = pin.assignment() else {
            return ComplexType::UNDEFINED;
        };
        let Some(filename) = pin.filename() else {
            return ComplexType::UNDEFINED;
        };
        let api_map = self.api_map;
        let Some(source_map) = api_map.source_map(filename) else {
            return ComplexType::UNDEFINED;
        };

        let key = (filename.to_string(), pin.name().to_string());
        if !self.variables.insert(key.clone()) {
            trace!(target: "chain", filename, variable = pin.name(), "variable cycle broken");
            return ComplexType::UNDEFINED;
        }
        let closure = source_map.locate_closure_pin(assignment.range.start);
        let locals = source_map.locals_at(assignment.range.start);
        let result = self.infer(&node_chainer::chain(assignment), &closure, &locals);
        self.variables.remove(&key);
        result
    }
}

/// True if a call with `arguments` fits the pin's parameters.
pub fn arity_compatible(pin: &Pin, arguments: &[Chain]) -> bool {
    let count = arguments
        .iter()
        .filter(|argument| !argument.last().map(Link::is_block_pass).unwrap_or(false))
        .count();

    match pin {
        Pin::Attribute(attribute) => {
            return match attribute.access {
                AttributeAccess::Reader => count == 0,
                AttributeAccess::Writer => count == 1,
            }
        }
        Pin::Method(_) => {}
        _ => return true,
    }

    let parameters = pin.parameters();
    let required = parameters
        .iter()
        .filter(|parameter| parameter.kind == ParameterKind::Required)
        .count();
    if parameters.iter().any(|parameter| parameter.kind == ParameterKind::Rest) {
        return count >= required;
    }
    let optional = parameters
        .iter()
        .filter(|parameter| parameter.kind == ParameterKind::Optional)
        .count();
    let keywords = usize::from(parameters.iter().any(|parameter| parameter.kind.is_keyword()));
    required <= count && count <= required + optional + keywords
}

/// The shared type of every element, if all are defined and agree.
fn uniform(types: &[ComplexType]) -> Option<&ComplexType> {
    let first = types.first()?;
    if types
        .iter()
        .all(|t| !t.is_undefined() && t.rooted_tag() == first.rooted_tag())
    {
        Some(first)
    } else {
        None
    }
}

/// `Class#new` on `Class<X>` yields an `X`; on a bare class, an `Object`.
fn instance_of(receiver: &ComplexType) -> ComplexType {
    match receiver.first() {
        Some(unique) if unique.is_namespace_reference() => {
            binder_type(&unique.subtypes[0].name, Scope::Instance)
        }
        _ => binder_type("Object", Scope::Instance),
    }
}

/// Replaces `$0` with the method name and `$n` with the n-th argument.
fn substitute_macro_arguments(tag: &str, name: &str, words: &[String]) -> String {
    let mut result = String::new();
    let mut chars = tag.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        let mut digits = String::new();
        while let Some(digit) = chars.peek().filter(|d| d.is_ascii_digit()) {
            digits.push(*digit);
            chars.next();
        }
        match digits.parse::<usize>() {
            Ok(0) => result.push_str(name),
            Ok(index) => result.push_str(words.get(index - 1).map(String::as_str).unwrap_or("undefined")),
            Err(_) => result.push('$'),
        }
    }
    result
}
