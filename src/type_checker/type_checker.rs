use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::{
    api_map::ApiMap,
    chain::{node_chainer, Resolver},
    complex_type::{ComplexType, UniqueType},
    errors::errors::{Error, ErrorImpl},
    pin::{ParameterKind, Pin, TagKind},
    source_map::SourceMap,
    tree::{self, Node},
    Location, Position,
};

use super::{
    config::{CheckLevel, CheckerConfig},
    problem::Problem,
};

/// Cross-checks documented types against inferred ones for one mapped file.
pub struct TypeChecker<'a> {
    filename: String,
    api_map: &'a ApiMap,
    source_map: &'a SourceMap,
    config: CheckerConfig,
}

impl<'a> TypeChecker<'a> {
    pub fn new(filename: &str, api_map: &'a ApiMap, config: CheckerConfig) -> Result<Self, Error> {
        let source_map = api_map.source_map(filename).ok_or_else(|| {
            Error::new(
                ErrorImpl::UnknownSource {
                    filename: filename.to_string(),
                },
                Position::default(),
            )
        })?;

        Ok(TypeChecker {
            filename: filename.to_string(),
            api_map,
            source_map,
            config,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.api_map).with_max_probe_depth(self.config.max_probe_depth)
    }

    fn method_pins(&self) -> impl Iterator<Item = &Arc<Pin>> {
        self.source_map
            .pins()
            .iter()
            .filter(|pin| matches!(pin.as_ref(), Pin::Method(_) | Pin::Attribute(_)))
    }

    /// Runs every check the configured level includes.
    pub fn run(&self) -> Vec<Problem> {
        let mut problems = self.param_tag_problems();
        if self.config.level >= CheckLevel::Typed {
            problems.extend(self.return_type_problems());
            problems.extend(self.param_type_problems());
        }
        if self.config.level >= CheckLevel::Strict {
            problems.extend(self.strict_type_problems());
        }

        debug!(
            target: "type_checker",
            filename = self.filename.as_str(),
            level = %self.config.level,
            problems = problems.len(),
            "checked file"
        );
        problems
    }

    /// Methods whose `@return` type is missing or cannot be resolved.
    pub fn return_type_problems(&self) -> Vec<Problem> {
        let mut resolver = self.resolver();
        let mut result = vec![];
        for pin in self.method_pins() {
            let tagged = resolver.typify(pin);
            if !tagged.is_undefined() {
                continue;
            }
            if pin.return_type().is_undefined() {
                let probed = resolver.probe(pin);
                let problem = Problem::new(pin.location().cloned(), format!("{} has undefined @return type", pin.name()));
                result.push(if probed.is_undefined() {
                    problem
                } else {
                    problem.with_suggestion(probed.to_string())
                });
            } else {
                result.push(Problem::new(
                    pin.location().cloned(),
                    format!("{} has unresolved @return type {}", pin.name(), pin.return_type()),
                ));
            }
        }
        result
    }

    /// `@param` tags naming parameters the method does not declare.
    pub fn param_tag_problems(&self) -> Vec<Problem> {
        let mut result = vec![];
        for pin in self.method_pins() {
            let names = pin.parameter_names();
            for tag in pin.docstring().tags(TagKind::Param) {
                let Some(name) = tag.name.as_deref() else {
                    continue;
                };
                if !names.contains(&name) {
                    result.push(Problem::new(
                        pin.location().cloned(),
                        format!("{} has unknown @param {}", pin.name(), name),
                    ));
                }
            }
        }
        result
    }

    /// Method parameters whose type is missing or cannot be resolved.
    pub fn param_type_problems(&self) -> Vec<Problem> {
        let resolver = self.resolver();
        let mut result = vec![];
        for method in self.method_pins() {
            for parameter in method.parameters() {
                let pin = Pin::Parameter(parameter.clone());
                if !resolver.typify(&pin).is_undefined() {
                    continue;
                }
                let state = if pin.return_type().is_undefined() { "undefined" } else { "unresolved" };
                result.push(Problem::new(
                    pin.location().cloned(),
                    format!("{} has {} @param type for {}", method.name(), state, pin.name()),
                ));
            }
        }
        result
    }

    /// Declared return types that disagree with the inferred ones, and
    /// call arguments that disagree with parameter types.
    pub fn strict_type_problems(&self) -> Vec<Problem> {
        let mut result = vec![];
        for pin in self.method_pins() {
            result.extend(self.confirm_return_type(pin));
        }
        if let Some(node) = self.source_map.node() {
            result.extend(self.check_send_args(node));
        }
        result
    }

    fn confirm_return_type(&self, pin: &Pin) -> Vec<Problem> {
        if matches!(pin, Pin::Attribute(_)) {
            return vec![];
        }
        let mut resolver = self.resolver();
        let tagged = resolver.typify(pin);
        if tagged.is_void() || tagged.is_undefined() {
            return vec![];
        }
        let probed = resolver.probe(pin);
        if probed.is_undefined() || tagged.to_string() == probed.to_string() {
            return vec![];
        }
        if probed.name() == "Array" && probed.subtypes().is_empty() && tagged.name() == "Array" {
            return vec![];
        }
        if probed.name() == "Hash" && probed.value_types().is_empty() && tagged.name() == "Hash" {
            return vec![];
        }
        if self.compatible(&tagged, &probed) {
            return vec![];
        }

        vec![Problem::new(
            pin.location().cloned(),
            format!("@return type `{}` does not match inferred type `{}`", tagged, probed),
        )
        .with_suggestion(probed.to_string())]
    }

    /// True if every inferred member fits the declared type.
    fn compatible(&self, tagged: &ComplexType, probed: &ComplexType) -> bool {
        let tagged_namespaces = tagged.namespaces();
        let tagged_tags: Vec<String> = tagged.iter().map(UniqueType::tag).collect();

        for pt in probed {
            for tt in tagged {
                let same_name = pt.name == tt.name;
                let fits = if same_name && ["Array", "Class", "Module"].contains(&pt.name.as_str()) {
                    self.any_super_and_sub(&tt.subtypes, &pt.subtypes)
                } else if same_name && pt.name == "Hash" {
                    let keys = (tt.key_types.is_empty() && !pt.key_types.is_empty())
                        || self.any_super_and_sub(&tt.key_types, &pt.key_types);
                    let values = (tt.value_types.is_empty() && !pt.value_types.is_empty())
                        || self.any_super_and_sub(&tt.value_types, &pt.value_types);
                    keys || values
                } else if same_name {
                    self.api_map.super_and_sub(&tt.namespace(), &pt.namespace())
                        || tagged_namespaces.contains(&pt.namespace())
                } else {
                    self.api_map.super_and_sub(&tt.tag(), &pt.tag()) || tagged_tags.contains(&pt.tag())
                };
                if !fits {
                    return false;
                }
            }
        }
        true
    }

    fn any_super_and_sub(&self, sups: &[UniqueType], subs: &[UniqueType]) -> bool {
        sups.iter()
            .any(|sup| subs.iter().any(|sub| self.api_map.super_and_sub(&sup.tag(), &sub.tag())))
    }

    /// `@param` types of a method, qualified in its namespace.
    fn param_tags(&self, pin: &Pin) -> HashMap<String, ComplexType> {
        pin.docstring()
            .tags(TagKind::Param)
            .filter_map(|tag| {
                let name = tag.name.clone()?;
                Some((name, tag.declared_type().qualify(self.api_map, &pin.owner())))
            })
            .collect()
    }

    /// Missing parameter types are only reported for this file and the core catalogue.
    fn report_location(&self, pin: &Pin) -> bool {
        match pin.filename() {
            Some(filename) => filename == self.filename || self.api_map.bundled(filename),
            None => false,
        }
    }

    fn check_send_args(&self, node: &Node) -> Vec<Problem> {
        let mut result = vec![];
        if node.is("send") {
            result.extend(self.check_send(node));
        }
        for child in node.child_nodes() {
            result.extend(self.check_send_args(child));
        }
        result
    }

    fn check_send(&self, node: &Node) -> Vec<Problem> {
        let location = Some(Location::new(self.filename.as_str(), node.range));
        let closure = self.source_map.locate_closure_pin(node.range.start);
        let locals = self.source_map.locals_at(node.range.start);
        let chain = node_chainer::chain(node);

        let mut resolver = self.resolver().without_arity_check();
        let pins = resolver.define(&chain, &closure, &locals);
        let Some(pin) = pins.first() else {
            return vec![Problem::new(location, format!("Unresolved call to {}", chain))];
        };
        if !matches!(pin.as_ref(), Pin::Method(_)) {
            return vec![];
        }

        let path = pin.path();
        let parameters = pin.parameters();
        let tags = self.param_tags(pin);
        let has_keyword_rest = parameters
            .iter()
            .any(|parameter| parameter.kind == ParameterKind::KeywordRest);

        let mut result = vec![];
        let mut check = |name: &str, argument: &Node, result: &mut Vec<Problem>| match tags.get(name) {
            None => {
                if self.report_location(pin) {
                    result.push(Problem::new(location.clone(), format!("No @param type for {} in {}", name, path)));
                }
            }
            Some(declared) => {
                let inferred = resolver.infer(&node_chainer::chain(argument), &closure, &locals);
                if inferred.tag() != declared.tag() {
                    result.push(Problem::new(
                        location.clone(),
                        format!(
                            "Wrong parameter type for {}: {} expected {}, received {}",
                            path, name, declared, inferred
                        ),
                    ));
                }
            }
        };

        let arguments = node
            .children
            .iter()
            .skip(2)
            .filter_map(|child| child.as_node())
            .filter(|argument| !argument.is("block_pass"));
        for (index, argument) in arguments.enumerate() {
            let Some(parameter) = parameters.get(index) else {
                result.push(Problem::new(location.clone(), format!("Too many arguments to {}", path)));
                break;
            };
            if parameter.kind.is_rest() || parameter.kind == ParameterKind::Block {
                break;
            }
            if argument.is("splat") {
                result.push(Problem::new(
                    location.clone(),
                    format!("Can't handle splat in {} {}", parameter.name(), path),
                ));
                break;
            }
            if argument.is("hash") && parameter.kind.is_keyword() {
                for pair in argument.child_nodes().filter(|pair| pair.is("pair")) {
                    let (Some(key), Some(value)) = (pair.node_at(0), pair.node_at(1)) else {
                        continue;
                    };
                    let Some(name) = key.token_at(0) else {
                        continue;
                    };
                    if !tags.contains_key(name) && has_keyword_rest {
                        continue;
                    }
                    check(name, value, &mut result);
                }
                break;
            }
            check(parameter.name(), argument, &mut result);
        }
        result
    }
}

/// Maps `text` as `filename` into a fresh index and checks it.
pub fn check_string(filename: &str, text: &str, config: CheckerConfig) -> Result<Vec<Problem>, Error> {
    let mut api_map = ApiMap::new();
    api_map.map(tree::read(filename, text)?);
    let checker = TypeChecker::new(filename, &api_map, config)?;
    Ok(checker.run())
}
