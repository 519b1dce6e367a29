//! The derived lookup tables of an `ApiMap` generation.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tracing::trace;

use crate::{
    complex_type::Scope,
    pin::{NamespaceKind, Pin, PinKind},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct NamespaceInfo {
    pub kind: Option<NamespaceKind>,
    pub superclass: Option<String>,
    pub includes: Vec<String>,
    pub extends: Vec<String>,
}

/// Lookup tables rebuilt from scratch whenever the pin set changes.
#[derive(Debug, Default)]
pub(crate) struct Store {
    pub pins: Vec<Arc<Pin>>,
    pub by_path: HashMap<String, Vec<Arc<Pin>>>,
    /// Namespace and constant pins keyed by their parent namespace.
    pub children: HashMap<String, Vec<Arc<Pin>>>,
    /// Method-like pins keyed by owner and scope.
    pub methods: HashMap<(String, Scope), Vec<Arc<Pin>>>,
    pub namespaces: HashMap<String, NamespaceInfo>,
    pub ancestors: HashMap<String, Vec<String>>,
    pub instance_variables: Vec<Arc<Pin>>,
    pub class_variables: Vec<Arc<Pin>>,
    pub global_variables: Vec<Arc<Pin>>,
    pub symbols: Vec<Arc<Pin>>,
}

pub(crate) fn join_path(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", namespace, name)
    }
}

/// Lexical gates for constant lookup, innermost first: `A::B` yields
/// `A::B`, `A` and the root.
pub(crate) fn gates(context: &str) -> Vec<String> {
    let mut gates = vec![];
    let mut current = context;
    while !current.is_empty() {
        gates.push(current.to_string());
        current = match current.rfind("::") {
            Some(index) => &current[..index],
            None => "",
        };
    }
    gates.push(String::new());
    gates
}

impl Store {
    pub fn build(pins: Vec<Arc<Pin>>) -> Self {
        let mut store = Store::default();

        for pin in &pins {
            match pin.kind() {
                PinKind::Namespace | PinKind::Constant => {
                    store
                        .children
                        .entry(pin.namespace().to_string())
                        .or_default()
                        .push(Arc::clone(pin));
                }
                PinKind::Method | PinKind::MethodAlias | PinKind::Attribute => {
                    store
                        .methods
                        .entry((pin.owner(), pin.scope()))
                        .or_default()
                        .push(Arc::clone(pin));
                }
                PinKind::InstanceVariable => store.instance_variables.push(Arc::clone(pin)),
                PinKind::ClassVariable => store.class_variables.push(Arc::clone(pin)),
                PinKind::GlobalVariable => store.global_variables.push(Arc::clone(pin)),
                PinKind::Symbol => store.symbols.push(Arc::clone(pin)),
                _ => {}
            }

            let path = pin.path();
            if !path.is_empty() {
                store.by_path.entry(path).or_default().push(Arc::clone(pin));
            }
        }

        for pin in &pins {
            if let Pin::Namespace(namespace) = pin.as_ref() {
                let path = pin.path();
                if path.is_empty() {
                    continue;
                }
                let superclass = namespace
                    .superclass
                    .as_ref()
                    .and_then(|name| store.qualify_lexical(name, pin.namespace()));
                let includes: Vec<String> = namespace
                    .includes
                    .iter()
                    .filter_map(|name| store.qualify_lexical(name, &path))
                    .collect();
                let extends: Vec<String> = namespace
                    .extends
                    .iter()
                    .filter_map(|name| store.qualify_lexical(name, &path))
                    .collect();

                let info = store.namespaces.entry(path).or_default();
                info.kind.get_or_insert(namespace.kind);
                if info.superclass.is_none() {
                    info.superclass = superclass;
                }
                info.includes.extend(includes);
                info.extends.extend(extends);
            }
        }

        let paths: Vec<String> = store.namespaces.keys().cloned().collect();
        for path in paths {
            let mut visited = HashSet::new();
            let ancestors = store.linearize(&path, &mut visited);
            store.ancestors.insert(path, ancestors);
        }

        store.pins = pins;
        store
    }

    /// The path of a namespace or constant named `name` directly inside `namespace`.
    pub fn child_path(&self, namespace: &str, name: &str) -> Option<String> {
        let path = join_path(namespace, name);
        let found = self.by_path.get(&path)?.iter().any(|pin| {
            matches!(pin.kind(), PinKind::Namespace | PinKind::Constant)
        });
        found.then_some(path)
    }

    /// Lexical-only resolution, used while the ancestor tables do not exist yet.
    fn qualify_lexical(&self, name: &str, context: &str) -> Option<String> {
        let (name, gates) = match name.strip_prefix("::") {
            Some(rooted) => (rooted, vec![String::new()]),
            None => (name, gates(context)),
        };
        let mut segments = name.split("::");
        let first = segments.next()?;
        let mut current = gates
            .iter()
            .find_map(|gate| self.child_path(gate, first))?;
        for segment in segments {
            current = self.child_path(&current, segment)?;
        }
        Some(current)
    }

    fn linearize(&self, path: &str, visited: &mut HashSet<String>) -> Vec<String> {
        if !visited.insert(path.to_string()) {
            trace!(target: "api_map", namespace = path, "ancestor cycle broken");
            return vec![];
        }

        let mut result = vec![path.to_string()];
        let Some(info) = self.namespaces.get(path) else {
            return result;
        };

        for include in info.includes.iter().rev() {
            result.extend(self.linearize(include, visited));
        }
        match (&info.superclass, info.kind) {
            (Some(superclass), _) => result.extend(self.linearize(superclass, visited)),
            (None, Some(NamespaceKind::Class)) if path != "BasicObject" && path != "Object" => {
                if self.namespaces.contains_key("Object") {
                    result.extend(self.linearize("Object", visited));
                }
            }
            _ => {}
        }

        let mut seen = HashSet::new();
        result.retain(|name| seen.insert(name.clone()));
        result
    }
}
