//! The mapping pass: walks a syntax tree and produces the pins it declares.
//!
//! A `Region` carries the lexical state of the walk. Sibling statements
//! share one region so that a bare `private` affects the definitions that
//! follow it; nested scopes get a fresh region.

use std::{collections::HashMap, sync::Arc};

use crate::{
    complex_type::{ComplexType, Scope},
    pin::{
        binder_type, Attribute, AttributeAccess, Block, Common, Constant, Docstring, Method,
        MethodAlias, Namespace, NamespaceKind, Parameter, ParameterKind, Pin, Symbol, Tag,
        TagKind, Variable, Visibility,
    },
    tree::{Comment, Node, Source},
    Location, Range,
};

#[derive(Debug, Clone)]
struct Region {
    /// Path of the enclosing namespace or method.
    closure: String,
    namespace: String,
    /// The type of `self`.
    context: ComplexType,
    /// Scope given to `def` inside the region.
    scope: Scope,
    visibility: Visibility,
    /// The innermost scope, hard or block, bounding local variables.
    extent: Range,
    namespace_pin: Option<usize>,
}

pub(crate) struct Mapper<'a> {
    filename: &'a str,
    comments: &'a [Comment],
    macros: HashMap<String, Vec<Tag>>,
    pins: Vec<Pin>,
    locals: Vec<Pin>,
}

/// Maps a source into its pins and its local variables and parameters.
pub(crate) fn map(source: &Source) -> (Vec<Pin>, Vec<Pin>) {
    let mut macros = HashMap::new();
    for comment in &source.comments {
        macros.extend(Docstring::parse(&comment.text).macro_definitions());
    }

    let mut mapper = Mapper {
        filename: &source.filename,
        comments: &source.comments,
        macros,
        pins: vec![],
        locals: vec![],
    };

    if let Some(node) = &source.node {
        let mut region = Region {
            closure: String::new(),
            namespace: String::new(),
            context: binder_type("", Scope::Instance),
            scope: Scope::Instance,
            visibility: Visibility::Private,
            extent: node.range,
            namespace_pin: None,
        };
        mapper.process(node, &mut region);
    }

    (mapper.pins, mapper.locals)
}

fn join_path(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", namespace, name)
    }
}

/// The constant path a `const` node spells, e.g. `Foo::Bar` or `::Foo`.
pub(crate) fn const_name(node: &Node) -> Option<String> {
    if !node.is("const") {
        return None;
    }
    let name = node.token_at(1).filter(|name| !name.is_empty())?;
    match node.node_at(0) {
        None => Some(name.to_string()),
        Some(scope) if scope.is("cbase") => Some(format!("::{}", name)),
        Some(scope) => Some(format!("{}::{}", const_name(scope)?, name)),
    }
}

/// Bare `foo`, or `self.foo`.
fn is_implicit_call(node: &Node) -> bool {
    node.is("send") && node.node_at(0).map(|receiver| receiver.is("self")).unwrap_or(true)
}

fn symbol_name(node: &Node) -> Option<&str> {
    match node.kind.as_str() {
        "sym" | "str" => node.token_at(0),
        _ => None,
    }
}

/// A short rendering of a default value.
fn default_text(node: &Node) -> String {
    match (node.kind.as_str(), node.token_at(0)) {
        ("int" | "float", Some(value)) => value.to_string(),
        ("str", Some(value)) => format!("'{}'", value),
        ("sym", Some(value)) => format!(":{}", value),
        ("nil" | "true" | "false" | "self", _) => node.kind.clone(),
        ("array", _) if node.children.is_empty() => String::from("[]"),
        ("hash", _) if node.children.is_empty() => String::from("{}"),
        ("const", _) => const_name(node).unwrap_or_else(|| String::from("...")),
        _ => String::from("..."),
    }
}

impl<'a> Mapper<'a> {
    fn location(&self, range: Range) -> Option<Location> {
        Some(Location::new(self.filename, range))
    }

    /// The docstring of the comment block ending on the line before `node`.
    fn docstring_for(&self, node: &Node) -> Docstring {
        let Some(comment) = self
            .comments
            .iter()
            .find(|comment| comment.range.end.line + 1 == node.range.start.line)
        else {
            return Docstring::default();
        };

        let parsed = Docstring::parse(&comment.text);
        let mut tags = parsed.expand_macros(&self.macros).all().to_vec();
        for directive in parsed.tags(TagKind::MacroDirective) {
            tags.extend(directive.nested.iter().cloned());
        }
        Docstring::new(tags)
    }

    fn process_children(&mut self, node: &Node, region: &mut Region) {
        for child in node.child_nodes() {
            self.process(child, region);
        }
    }

    fn process(&mut self, node: &Node, region: &mut Region) {
        match node.kind.as_str() {
            "class" | "module" => self.process_namespace(node, region),
            "sclass" => self.process_sclass(node, region),
            "def" => self.process_def(node, region, false, None),
            "defs" => self.process_def(node, region, true, None),
            "send" => self.process_send(node, region),
            "block" => self.process_block(node, region),
            "casgn" => self.process_constant(node, region),
            "lvasgn" | "ivasgn" | "cvasgn" | "gvasgn" => {
                let value = node.node_at(1);
                self.process_variable(node, value, node.range, region);
                if let Some(value) = value {
                    self.process(value, region);
                }
            }
            "or_asgn" | "and_asgn" | "op_asgn" => {
                let value_index = if node.is("op_asgn") { 2 } else { 1 };
                let value = node.node_at(value_index);
                if let Some(target) = node.node_at(0) {
                    self.process_variable(target, value, node.range, region);
                }
                if let Some(value) = value {
                    self.process(value, region);
                }
            }
            "alias" => {
                let names: Vec<&str> = node.child_nodes().filter_map(symbol_name).collect();
                if let [new_name, original] = names[..] {
                    self.push_alias(new_name, original, node.range, region);
                }
            }
            "sym" => {
                if let Some(name) = node.token_at(0) {
                    let common = Common::new(&format!(":{}", name), self.location(node.range), &region.closure, &region.namespace)
                        .with_context(region.context.clone());
                    self.pins.push(Pin::Symbol(Symbol { common }));
                }
            }
            _ => self.process_children(node, region),
        }
    }

    fn process_namespace(&mut self, node: &Node, region: &mut Region) {
        let Some(written) = node.node_at(0).and_then(const_name) else {
            return;
        };
        let path = match written.strip_prefix("::") {
            Some(rooted) => rooted.to_string(),
            None => join_path(&region.namespace, &written),
        };
        let (parent, name) = match path.rsplit_once("::") {
            Some((parent, name)) => (parent.to_string(), name.to_string()),
            None => (String::new(), path.clone()),
        };

        let is_class = node.is("class");
        let superclass = if is_class { node.node_at(1).and_then(const_name) } else { None };
        let body_index = if is_class { 2 } else { 1 };

        let common = Common::new(&name, self.location(node.range), &region.closure, &parent)
            .with_context(binder_type(&path, Scope::Class))
            .with_docstring(self.docstring_for(node));
        self.pins.push(Pin::Namespace(Namespace {
            common,
            kind: if is_class { NamespaceKind::Class } else { NamespaceKind::Module },
            visibility: Visibility::Public,
            superclass,
            includes: vec![],
            extends: vec![],
        }));

        let mut inner = Region {
            closure: path.clone(),
            namespace: path.clone(),
            context: binder_type(&path, Scope::Class),
            scope: Scope::Instance,
            visibility: Visibility::Public,
            extent: node.range,
            namespace_pin: Some(self.pins.len() - 1),
        };
        if let Some(body) = node.node_at(body_index) {
            self.process(body, &mut inner);
        }
    }

    fn process_sclass(&mut self, node: &Node, region: &mut Region) {
        if !node.node_at(0).map(|target| target.is("self")).unwrap_or(false) {
            return;
        }
        let mut inner = Region {
            scope: Scope::Class,
            visibility: Visibility::Public,
            ..region.clone()
        };
        if let Some(body) = node.node_at(1) {
            self.process(body, &mut inner);
        }
    }

    fn process_def(&mut self, node: &Node, region: &mut Region, singleton: bool, visibility: Option<Visibility>) {
        let name_index = if singleton { 1 } else { 0 };
        let Some(name) = node.token_at(name_index) else {
            return;
        };
        if singleton && !node.node_at(0).map(|target| target.is("self")).unwrap_or(false) {
            return;
        }

        let scope = if singleton { Scope::Class } else { region.scope };
        let context = binder_type(&region.namespace, scope);
        let visibility = visibility.unwrap_or(match (singleton, name) {
            (false, "initialize") => Visibility::Private,
            (false, _) => region.visibility,
            (true, _) => Visibility::Public,
        });
        let docstring = self.docstring_for(node);
        let return_type = docstring
            .tag(TagKind::Return)
            .map(Tag::declared_type)
            .unwrap_or(ComplexType::UNDEFINED);
        let common = Common::new(name, self.location(node.range), &region.closure, &region.namespace)
            .with_context(context.clone())
            .with_docstring(docstring)
            .with_return_type(return_type);

        let mut method = Method {
            common,
            scope,
            visibility,
            parameters: vec![],
            node: Some(Arc::new(node.clone())),
        };
        let path = Pin::Method(method.clone()).path();

        let mut inner = Region {
            closure: path.clone(),
            namespace: region.namespace.clone(),
            context,
            scope,
            visibility: Visibility::Public,
            extent: node.range,
            namespace_pin: None,
        };
        if let Some(args) = node.node_at(name_index + 1) {
            method.parameters = self.parameters(args, &method.common.docstring, &inner, node.range);
        }
        self.pins.push(Pin::Method(method));

        if node.children.len() > name_index + 2 {
            if let Some(body) = node.node_at(node.children.len() - 1) {
                self.process(body, &mut inner);
            }
        }
    }

    /// Builds parameters from an `args` node and registers each as a local
    /// visible throughout `presence`.
    fn parameters(&mut self, args: &Node, docstring: &Docstring, region: &Region, presence: Range) -> Vec<Parameter> {
        let mut result = vec![];
        for (index, arg) in args.child_nodes().enumerate() {
            let Some(kind) = ParameterKind::from_node_kind(&arg.kind) else {
                continue;
            };
            let Some(name) = arg.token_at(0) else {
                continue;
            };
            let value = arg.node_at(1);
            let return_type = docstring
                .param(name)
                .map(Tag::declared_type)
                .unwrap_or(ComplexType::UNDEFINED);
            let parameter = Parameter {
                common: Common::new(name, self.location(arg.range), &region.closure, &region.namespace)
                    .with_context(region.context.clone())
                    .with_return_type(return_type),
                kind,
                default: value.map(default_text),
                index,
                presence: Some(presence),
                value: value.map(|value| Arc::new(value.clone())),
            };
            self.locals.push(Pin::Parameter(parameter.clone()));
            result.push(parameter);
        }
        result
    }

    fn process_block(&mut self, node: &Node, region: &mut Region) {
        let Some(call) = node.node_at(0) else {
            return;
        };
        self.process(call, region);

        let range = Range::new(call.range.end, node.range.end);
        let mut inner = Region {
            extent: range,
            ..region.clone()
        };

        let parameters = match node.node_at(1) {
            Some(args) => self.parameters(args, &Docstring::default(), &inner, range),
            None => vec![],
        };
        let common = Common::new("", self.location(range), &region.closure, &region.namespace)
            .with_context(region.context.clone());
        self.pins.push(Pin::Block(Block {
            common,
            receiver: Some(Arc::new(call.clone())),
            parameters,
        }));

        if let Some(body) = node.node_at(2) {
            self.process(body, &mut inner);
        }
    }

    fn process_send(&mut self, node: &Node, region: &mut Region) {
        if !is_implicit_call(node) {
            self.process_children(node, region);
            return;
        }
        let name = node.token_at(1).unwrap_or_default();
        let arguments: Vec<&Node> = node.children.iter().skip(2).filter_map(|child| child.as_node()).collect();

        match name {
            "private" | "protected" | "public" => {
                let Some(visibility) = Visibility::from_name(name) else {
                    return;
                };
                if arguments.is_empty() {
                    region.visibility = visibility;
                    return;
                }
                for argument in arguments {
                    match argument.kind.as_str() {
                        "def" => self.process_def(argument, region, false, Some(visibility)),
                        "defs" => self.process_def(argument, region, true, Some(visibility)),
                        _ => {
                            if let Some(target) = symbol_name(argument) {
                                self.change_visibility(target, visibility, region);
                            }
                            self.process(argument, region);
                        }
                    }
                }
                return;
            }
            "attr_reader" | "attr_writer" | "attr_accessor" => {
                for argument in &arguments {
                    if let Some(attribute) = symbol_name(argument) {
                        if name != "attr_writer" {
                            self.push_attribute(attribute, AttributeAccess::Reader, node, region);
                        }
                        if name != "attr_reader" {
                            self.push_attribute(attribute, AttributeAccess::Writer, node, region);
                        }
                    }
                }
            }
            "include" | "extend" => {
                let names: Vec<String> = arguments.iter().filter_map(|argument| const_name(argument)).collect();
                if let Some(Pin::Namespace(namespace)) = region.namespace_pin.and_then(|index| self.pins.get_mut(index)) {
                    if name == "include" {
                        namespace.includes.extend(names);
                    } else {
                        namespace.extends.extend(names);
                    }
                }
            }
            "alias_method" => {
                let names: Vec<&str> = arguments.iter().filter_map(|argument| symbol_name(argument)).collect();
                if let [new_name, original] = names[..] {
                    self.push_alias(new_name, original, node.range, region);
                }
            }
            _ => {}
        }
        self.process_children(node, region);
    }

    /// `private :foo` applies to an earlier method of the same region.
    fn change_visibility(&mut self, name: &str, visibility: Visibility, region: &Region) {
        let owner = binder_type(&region.namespace, region.scope).namespace();
        let target = self.pins.iter_mut().rev().find(|pin| {
            pin.name() == name && pin.owner() == owner && pin.scope() == region.scope
        });
        match target {
            Some(Pin::Method(method)) => method.visibility = visibility,
            Some(Pin::Attribute(attribute)) => attribute.visibility = visibility,
            _ => {}
        }
    }

    fn push_attribute(&mut self, name: &str, access: AttributeAccess, node: &Node, region: &Region) {
        let docstring = self.docstring_for(node);
        let return_type = docstring
            .tag(TagKind::Return)
            .map(Tag::declared_type)
            .unwrap_or(ComplexType::UNDEFINED);
        let name = match access {
            AttributeAccess::Reader => name.to_string(),
            AttributeAccess::Writer => format!("{}=", name),
        };
        let common = Common::new(&name, self.location(node.range), &region.closure, &region.namespace)
            .with_context(binder_type(&region.namespace, region.scope))
            .with_docstring(docstring)
            .with_return_type(return_type);
        self.pins.push(Pin::Attribute(Attribute {
            common,
            scope: region.scope,
            visibility: region.visibility,
            access,
        }));
    }

    fn push_alias(&mut self, name: &str, original: &str, range: Range, region: &Region) {
        let common = Common::new(name, self.location(range), &region.closure, &region.namespace)
            .with_context(binder_type(&region.namespace, region.scope));
        self.pins.push(Pin::MethodAlias(MethodAlias {
            common,
            scope: region.scope,
            original: original.to_string(),
        }));
    }

    fn process_constant(&mut self, node: &Node, region: &mut Region) {
        let Some(name) = node.token_at(1) else {
            return;
        };
        let namespace = match node.node_at(0) {
            None => region.namespace.clone(),
            Some(scope) if scope.is("cbase") => String::new(),
            Some(scope) => match const_name(scope) {
                Some(written) => match written.strip_prefix("::") {
                    Some(rooted) => rooted.to_string(),
                    None => join_path(&region.namespace, &written),
                },
                None => return,
            },
        };
        let value = node.node_at(2);
        let docstring = self.docstring_for(node);
        let return_type = declared_variable_type(&docstring);

        let common = Common::new(name, self.location(node.range), &region.closure, &namespace)
            .with_context(region.context.clone())
            .with_docstring(docstring)
            .with_return_type(return_type);
        self.pins.push(Pin::Constant(Constant {
            common,
            visibility: Visibility::Public,
            assignment: value.map(|value| Arc::new(value.clone())),
        }));

        if let Some(value) = value {
            self.process(value, region);
        }
    }

    /// Declares the variable assigned by `target`. `range` is the whole
    /// assignment; local variables are visible from its start to the end
    /// of the enclosing scope.
    fn process_variable(&mut self, target: &Node, value: Option<&Node>, range: Range, region: &Region) {
        let Some(name) = target.token_at(0) else {
            return;
        };
        let docstring = self.docstring_for(target);
        let return_type = declared_variable_type(&docstring);
        let common = Common::new(name, self.location(range), &region.closure, &region.namespace)
            .with_context(region.context.clone())
            .with_docstring(docstring)
            .with_return_type(return_type);
        let assignment = value.map(|value| Arc::new(value.clone()));

        match target.kind.as_str() {
            "lvasgn" => self.locals.push(Pin::LocalVariable(Variable {
                common,
                assignment,
                presence: Some(Range::new(range.start, region.extent.end)),
            })),
            "ivasgn" => self.pins.push(Pin::InstanceVariable(Variable {
                common,
                assignment,
                presence: None,
            })),
            "cvasgn" => self.pins.push(Pin::ClassVariable(Variable {
                common,
                assignment,
                presence: None,
            })),
            "gvasgn" => self.pins.push(Pin::GlobalVariable(Variable {
                common,
                assignment,
                presence: None,
            })),
            _ => {}
        }
    }
}

/// `@type [T]` declares a variable's type; `@return [T]` is accepted too.
fn declared_variable_type(docstring: &Docstring) -> ComplexType {
    docstring
        .tag(TagKind::Type)
        .or_else(|| docstring.tag(TagKind::Return))
        .map(Tag::declared_type)
        .unwrap_or(ComplexType::UNDEFINED)
}
