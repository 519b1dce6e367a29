use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tracing::{debug, trace};

use crate::{
    complex_type::{ComplexType, ConstantResolver, Scope},
    errors::errors::{Error, ErrorImpl},
    pin::{NamespaceKind, Pin, PinKind, Visibility},
    source_map::{Clip, SourceMap},
    tree::Source,
    Position,
};

use super::{
    catalogue::{core, CoreCatalogue},
    store::{gates, Store},
};

/// The symbol index: every pin visible to a program, project pins plus the
/// core catalogue.
///
/// Pins are held in per-file buckets. Indexing a file replaces its bucket
/// and rebuilds the derived tables, so indexing the same pins twice is
/// indistinguishable from indexing them once.
#[derive(Debug)]
pub struct ApiMap {
    core: Arc<CoreCatalogue>,
    buckets: Vec<(String, Vec<Arc<Pin>>)>,
    source_maps: HashMap<String, SourceMap>,
    store: Store,
}

impl Default for ApiMap {
    fn default() -> Self {
        ApiMap::new()
    }
}

impl ApiMap {
    pub fn new() -> Self {
        ApiMap::with_core(core())
    }

    pub fn with_core(core: Arc<CoreCatalogue>) -> Self {
        let mut api_map = ApiMap {
            core,
            buckets: vec![],
            source_maps: HashMap::new(),
            store: Store::default(),
        };
        api_map.rebuild();
        api_map
    }

    /// Adds or replaces pins, grouped by the file they come from.
    pub fn index(&mut self, pins: &[Arc<Pin>]) {
        let mut grouped: Vec<(String, Vec<Arc<Pin>>)> = vec![];
        for pin in pins {
            let filename = pin.filename().unwrap_or_default().to_string();
            match grouped.iter_mut().find(|(name, _)| *name == filename) {
                Some((_, bucket)) => bucket.push(Arc::clone(pin)),
                None => grouped.push((filename, vec![Arc::clone(pin)])),
            }
        }
        for (filename, bucket) in grouped {
            self.replace_bucket(filename, bucket);
        }
        self.rebuild();
    }

    /// Maps a source and indexes its pins, replacing any earlier version of the file.
    pub fn map(&mut self, source: Source) {
        self.catalog(vec![source]);
    }

    /// Maps several sources with a single rebuild.
    pub fn catalog(&mut self, sources: Vec<Source>) {
        for source in sources {
            let source_map = SourceMap::map(source);
            let filename = source_map.filename().to_string();
            self.replace_bucket(filename.clone(), source_map.pins().to_vec());
            self.source_maps.insert(filename, source_map);
        }
        self.rebuild();
    }

    fn replace_bucket(&mut self, filename: String, pins: Vec<Arc<Pin>>) {
        match self.buckets.iter_mut().find(|(name, _)| *name == filename) {
            Some((_, bucket)) => *bucket = pins,
            None => self.buckets.push((filename, pins)),
        }
    }

    fn rebuild(&mut self) {
        let pins: Vec<Arc<Pin>> = self
            .core
            .pins()
            .iter()
            .chain(self.buckets.iter().flat_map(|(_, bucket)| bucket.iter()))
            .cloned()
            .collect();
        self.store = Store::build(pins);
        debug!(
            target: "api_map",
            pins = self.store.pins.len(),
            files = self.buckets.len(),
            namespaces = self.store.namespaces.len(),
            "rebuilt symbol index"
        );
    }

    pub fn pins(&self) -> &[Arc<Pin>] {
        &self.store.pins
    }

    pub fn source_map(&self, filename: &str) -> Option<&SourceMap> {
        self.source_maps.get(filename)
    }

    /// A query bound to a position in a mapped file.
    pub fn clip_at(&self, filename: &str, position: Position) -> Result<Clip<'_>, Error> {
        let source_map = self.source_map(filename).ok_or_else(|| {
            Error::new(
                ErrorImpl::UnknownSource {
                    filename: filename.to_string(),
                },
                position,
            )
        })?;
        Ok(Clip::new(self, source_map, position))
    }

    /// True if `filename` belongs to the core catalogue.
    pub fn bundled(&self, filename: &str) -> bool {
        self.core.includes_file(filename)
    }

    pub fn lookup(&self, path: &str) -> Vec<Arc<Pin>> {
        self.store.by_path.get(path).cloned().unwrap_or_default()
    }

    pub fn namespace_exists(&self, path: &str) -> bool {
        self.store.namespaces.contains_key(path)
    }

    pub fn namespace_kind(&self, path: &str) -> Option<NamespaceKind> {
        self.store.namespaces.get(path).and_then(|info| info.kind)
    }

    /// Resolves a constant reference by lexical scope: the innermost
    /// enclosing namespace outward to the root, then the ancestors of the
    /// context. A leading `::` looks only at the root.
    pub fn resolve_constant(&self, name: &str, context: &str) -> Vec<Arc<Pin>> {
        match self.qualify_constant(name, context) {
            Some(path) => self
                .lookup(&path)
                .into_iter()
                .filter(|pin| matches!(pin.kind(), PinKind::Namespace | PinKind::Constant))
                .collect(),
            None => vec![],
        }
    }

    /// The fully qualified path a constant reference denotes.
    pub fn qualify_constant(&self, name: &str, context: &str) -> Option<String> {
        let (name, rooted) = match name.strip_prefix("::") {
            Some(stripped) => (stripped, true),
            None => (name, false),
        };
        let mut segments = name.split("::");
        let first = segments.next().filter(|first| !first.is_empty())?;

        let lexical = if rooted {
            self.store.child_path("", first)
        } else {
            gates(context)
                .iter()
                .find_map(|gate| self.store.child_path(gate, first))
        };
        let mut current = match lexical {
            Some(path) => path,
            None if !rooted => self.member_path(context, first)?,
            None => return None,
        };

        for segment in segments {
            current = self.member_path(&current, segment)?;
        }
        Some(current)
    }

    /// Resolves `name` as a member of `namespace`, as in `Foo::Bar`.
    pub fn resolve_member(&self, namespace: &str, name: &str) -> Vec<Arc<Pin>> {
        match self.member_path(namespace, name) {
            Some(path) => self
                .lookup(&path)
                .into_iter()
                .filter(|pin| matches!(pin.kind(), PinKind::Namespace | PinKind::Constant))
                .collect(),
            None => vec![],
        }
    }

    /// A constant defined in `namespace` or inherited from its ancestors.
    fn member_path(&self, namespace: &str, name: &str) -> Option<String> {
        if namespace.is_empty() {
            return self.store.child_path("", name);
        }
        self.ancestors(namespace)
            .iter()
            .find_map(|ancestor| self.store.child_path(ancestor, name))
    }

    /// Namespaces and constants declared directly inside `namespace`.
    pub fn get_constants(&self, namespace: &str) -> Vec<Arc<Pin>> {
        let mut seen = HashSet::new();
        self.store
            .children
            .get(namespace)
            .map(|children| {
                children
                    .iter()
                    .filter(|pin| seen.insert(pin.path()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Constants reachable by an unqualified name inside `context`: each
    /// lexical gate outward, then the ancestors of the innermost one.
    pub fn visible_constants(&self, context: &str) -> Vec<Arc<Pin>> {
        let mut namespaces = gates(context);
        if !context.is_empty() {
            namespaces.extend(self.ancestors(context).into_iter().skip(1));
        }

        let mut seen = HashSet::new();
        let mut result = vec![];
        for namespace in namespaces {
            for pin in self.get_constants(&namespace) {
                if seen.insert(pin.name().to_string()) {
                    result.push(pin);
                }
            }
        }
        result
    }

    /// The linearized ancestry of a namespace, starting with itself.
    pub fn ancestors(&self, namespace: &str) -> Vec<String> {
        let namespace = if namespace.is_empty() { "Object" } else { namespace };
        self.store
            .ancestors
            .get(namespace)
            .cloned()
            .unwrap_or_else(|| vec![namespace.to_string()])
    }

    /// True if `sub` is `sup` or one of its descendants.
    pub fn super_and_sub(&self, sup: &str, sub: &str) -> bool {
        let sup = bare_name(sup);
        let sub = bare_name(sub);
        sup == sub || self.ancestors(sub).iter().any(|ancestor| ancestor == sup)
    }

    /// Namespace/scope pairs searched for methods, in lookup order.
    fn method_sources(&self, namespace: &str, scope: Scope) -> Vec<(String, Scope)> {
        let namespace = if namespace.is_empty() { "Object" } else { namespace };
        let mut sources: Vec<(String, Scope)> = vec![];

        match scope {
            Scope::Instance => {
                sources.extend(
                    self.ancestors(namespace)
                        .into_iter()
                        .map(|ancestor| (ancestor, Scope::Instance)),
                );
                if !sources.iter().any(|(name, _)| name == "Object") && namespace != "BasicObject" {
                    sources.extend(
                        self.ancestors("Object")
                            .into_iter()
                            .map(|ancestor| (ancestor, Scope::Instance)),
                    );
                }
            }
            Scope::Class => {
                for ancestor in self.ancestors(namespace) {
                    let is_class = self.namespace_kind(&ancestor) != Some(NamespaceKind::Module);
                    if ancestor != namespace && !is_class {
                        continue;
                    }
                    sources.push((ancestor.clone(), Scope::Class));
                    if let Some(info) = self.store.namespaces.get(&ancestor) {
                        for extended in &info.extends {
                            sources.extend(
                                self.ancestors(extended)
                                    .into_iter()
                                    .map(|name| (name, Scope::Instance)),
                            );
                        }
                    }
                }
                let meta = match self.namespace_kind(namespace) {
                    Some(NamespaceKind::Module) => "Module",
                    _ => "Class",
                };
                sources.extend(
                    self.ancestors(meta)
                        .into_iter()
                        .map(|name| (name, Scope::Instance)),
                );
            }
        }

        let mut seen = HashSet::new();
        sources.retain(|source| seen.insert(source.clone()));
        sources
    }

    /// Method pins named `name`, from the first namespace in the lookup
    /// order that defines the name, narrowed to the visibility ceiling.
    /// A definition above the ceiling hides inherited ones. Within one
    /// namespace, later definitions come first.
    pub fn method_pins(&self, namespace: &str, name: &str, scope: Scope, ceiling: Visibility) -> Vec<Arc<Pin>> {
        let mut visited = HashSet::new();
        self.method_pins_guarded(namespace, name, scope, ceiling, &mut visited)
    }

    fn method_pins_guarded(
        &self,
        namespace: &str,
        name: &str,
        scope: Scope,
        ceiling: Visibility,
        visited: &mut HashSet<(String, String, Scope)>,
    ) -> Vec<Arc<Pin>> {
        for (owner, source_scope) in self.method_sources(namespace, scope) {
            let Some(candidates) = self.store.methods.get(&(owner.clone(), source_scope)) else {
                continue;
            };
            let mut named = candidates.iter().rev().filter(|pin| pin.name() == name).peekable();
            if named.peek().is_none() {
                continue;
            }
            let mut result = vec![];
            for pin in named.filter(|pin| pin.visibility() <= ceiling) {
                match pin.as_ref() {
                    Pin::MethodAlias(alias) => {
                        result.extend(self.resolve_alias(pin, &alias.original, &owner, source_scope, visited));
                    }
                    _ => result.push(Arc::clone(pin)),
                }
            }
            if result.is_empty() {
                trace!(target: "api_map", owner = owner.as_str(), name, "method hidden by visibility");
            }
            return result;
        }
        vec![]
    }

    /// Looks up an alias target from the alias's namespace and renames it.
    fn resolve_alias(
        &self,
        alias: &Arc<Pin>,
        original: &str,
        owner: &str,
        scope: Scope,
        visited: &mut HashSet<(String, String, Scope)>,
    ) -> Vec<Arc<Pin>> {
        if !visited.insert((owner.to_string(), alias.name().to_string(), scope)) {
            trace!(target: "api_map", alias = alias.name(), owner, "alias cycle broken");
            return vec![];
        }
        self.method_pins_guarded(owner, original, scope, Visibility::Private, visited)
            .into_iter()
            .map(|target| {
                let mut renamed = (*target).clone();
                let common = renamed.common_mut();
                common.name = alias.name().to_string();
                common.location = alias.location().cloned();
                Arc::new(renamed)
            })
            .collect()
    }

    /// Every method available on a namespace at a scope, first definition
    /// of each name winning.
    pub fn get_methods(&self, namespace: &str, scope: Scope, ceiling: Visibility) -> Vec<Arc<Pin>> {
        let mut seen = HashSet::new();
        let mut result = vec![];
        for (owner, source_scope) in self.method_sources(namespace, scope) {
            let Some(candidates) = self.store.methods.get(&(owner.clone(), source_scope)) else {
                continue;
            };
            for pin in candidates.iter().rev() {
                if !seen.insert(pin.name().to_string()) || pin.visibility() > ceiling {
                    continue;
                }
                let resolved = match pin.as_ref() {
                    Pin::MethodAlias(alias) => {
                        let mut visited = HashSet::new();
                        self.resolve_alias(pin, &alias.original, &owner, source_scope, &mut visited)
                            .into_iter()
                            .next()
                    }
                    _ => Some(Arc::clone(pin)),
                };
                if let Some(resolved) = resolved {
                    result.push(resolved);
                }
            }
        }
        result
    }

    /// Methods available on every member of a type.
    pub fn get_complex_type_methods(&self, complex_type: &ComplexType, ceiling: Visibility) -> Vec<Arc<Pin>> {
        let mut seen = HashSet::new();
        let mut result = vec![];
        for unique in complex_type {
            if unique.is_undefined() || unique.is_void() {
                continue;
            }
            for pin in self.get_methods(&unique.namespace(), unique.scope(), ceiling) {
                if seen.insert(pin.path()) {
                    result.push(pin);
                }
            }
        }
        result
    }

    /// Methods named `name` on the ancestors of `namespace`, skipping `namespace` itself.
    pub fn super_method_pins(&self, namespace: &str, name: &str, scope: Scope) -> Vec<Arc<Pin>> {
        self.method_sources(namespace, scope)
            .into_iter()
            .skip(1)
            .find_map(|(owner, source_scope)| {
                let found: Vec<Arc<Pin>> = self
                    .store
                    .methods
                    .get(&(owner, source_scope))?
                    .iter()
                    .rev()
                    .filter(|pin| pin.name() == name)
                    .cloned()
                    .collect();
                (!found.is_empty()).then_some(found)
            })
            .unwrap_or_default()
    }

    /// Instance variables declared where `self` is `namespace` at `scope`.
    pub fn instance_variable_pins(&self, namespace: &str, scope: Scope) -> Vec<Arc<Pin>> {
        self.store
            .instance_variables
            .iter()
            .filter(|pin| pin.context().namespace() == namespace && pin.context().scope() == scope)
            .cloned()
            .collect()
    }

    pub fn class_variable_pins(&self, namespace: &str) -> Vec<Arc<Pin>> {
        self.store
            .class_variables
            .iter()
            .filter(|pin| pin.namespace() == namespace)
            .cloned()
            .collect()
    }

    pub fn global_variable_pins(&self) -> Vec<Arc<Pin>> {
        self.store.global_variables.clone()
    }

    pub fn symbols(&self) -> Vec<Arc<Pin>> {
        let mut seen = HashSet::new();
        self.store
            .symbols
            .iter()
            .filter(|pin| seen.insert(pin.name().to_string()))
            .cloned()
            .collect()
    }
}

impl ConstantResolver for ApiMap {
    fn qualify(&self, name: &str, context: &str) -> Option<String> {
        self.qualify_constant(name, context)
    }
}

/// `Array<String>` and `::Foo` reduce to `Array` and `Foo`.
fn bare_name(tag: &str) -> &str {
    let tag = tag.strip_prefix("::").unwrap_or(tag);
    let end = tag.find(['<', '{']).unwrap_or(tag.len());
    &tag[..end]
}
