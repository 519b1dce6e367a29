use std::fmt::Display;

use super::parser::parse_type;

/// Whether a type or symbol lives on instances or on the namespace itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    Instance,
    Class,
}

impl Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Instance => write!(f, "instance"),
            Scope::Class => write!(f, "class"),
        }
    }
}

/// Resolves constant names against lexical scope.
///
/// The symbol index implements this; the type algebra only needs the
/// answer to "what fully qualified name does `name` denote inside
/// `context`".
pub trait ConstantResolver {
    fn qualify(&self, name: &str, context: &str) -> Option<String>;
}

/// How an atom's generic parameters were written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParametersKind {
    #[default]
    None,
    /// `Name<A, B>`
    List,
    /// `Name{K => V}`
    Hash,
}

const SPECIAL_NAMES: &[&str] = &[
    "undefined", "void", "nil", "self", "Boolean", "true", "false",
];
const MAPPING_NAMES: &[&str] = &["Hash"];

/// One member of a union type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueType {
    pub name: String,
    pub rooted: bool,
    pub subtypes: Vec<UniqueType>,
    pub key_types: Vec<UniqueType>,
    pub value_types: Vec<UniqueType>,
    pub parameters: ParametersKind,
}

impl UniqueType {
    /// Creates an atom without generic parameters. A leading `::` marks it rooted.
    pub fn new(name: &str) -> Self {
        let (name, rooted) = match name.strip_prefix("::") {
            Some(stripped) => (stripped, true),
            None => (name, false),
        };

        UniqueType {
            name: name.to_string(),
            rooted,
            subtypes: vec![],
            key_types: vec![],
            value_types: vec![],
            parameters: ParametersKind::None,
        }
    }

    pub fn undefined() -> Self {
        UniqueType::new("undefined")
    }

    pub fn nil() -> Self {
        UniqueType::new("nil")
    }

    /// Creates `name<subtypes...>`. Mapping-like names with exactly two
    /// parameters take them as key and value types.
    pub fn with_subtypes(name: &str, subtypes: Vec<UniqueType>) -> Self {
        let mut unique = UniqueType::new(name);
        if subtypes.is_empty() {
            return unique;
        }
        if unique.is_mapping_like() && subtypes.len() == 2 {
            unique.key_types = vec![subtypes[0].clone()];
            unique.value_types = vec![subtypes[1].clone()];
        }
        unique.subtypes = subtypes;
        unique.parameters = ParametersKind::List;
        unique
    }

    /// Creates `name{keys => values}`.
    pub fn mapping(name: &str, key_types: Vec<UniqueType>, value_types: Vec<UniqueType>) -> Self {
        let mut unique = UniqueType::new(name);
        unique.key_types = key_types;
        unique.value_types = value_types;
        unique.parameters = ParametersKind::Hash;
        unique
    }

    pub fn is_undefined(&self) -> bool {
        self.name == "undefined"
    }

    pub fn is_void(&self) -> bool {
        self.name == "void"
    }

    pub fn is_nil(&self) -> bool {
        self.name == "nil" || self.name == "NilClass"
    }

    pub fn is_self(&self) -> bool {
        self.name == "self"
    }

    pub fn is_mapping_like(&self) -> bool {
        MAPPING_NAMES.contains(&self.name.as_str())
    }

    /// `Class<X>` and `Module<X>` describe the namespace `X` itself.
    pub fn is_namespace_reference(&self) -> bool {
        (self.name == "Class" || self.name == "Module") && !self.subtypes.is_empty()
    }

    /// True when no element, key or value type is known.
    pub fn is_bare(&self) -> bool {
        self.subtypes.is_empty() && self.key_types.is_empty() && self.value_types.is_empty()
    }

    pub fn namespace(&self) -> String {
        if self.is_namespace_reference() {
            return self.subtypes[0].name.clone();
        }
        if self.is_nil() {
            return String::from("NilClass");
        }
        match self.name.as_str() {
            "undefined" | "void" => String::new(),
            _ => self.name.clone(),
        }
    }

    pub fn scope(&self) -> Scope {
        if self.is_namespace_reference() {
            Scope::Class
        } else {
            Scope::Instance
        }
    }

    pub fn tag(&self) -> String {
        self.render(false)
    }

    pub fn rooted_tag(&self) -> String {
        self.render(true)
    }

    fn render(&self, with_root: bool) -> String {
        let mut result = String::new();
        if with_root && self.rooted {
            result.push_str("::");
        }
        result.push_str(&self.name);

        let join = |types: &[UniqueType]| {
            types
                .iter()
                .map(|t| t.render(with_root))
                .collect::<Vec<String>>()
                .join(", ")
        };

        match self.parameters {
            ParametersKind::None => {}
            ParametersKind::List => {
                result.push('<');
                result.push_str(&join(&self.subtypes));
                result.push('>');
            }
            ParametersKind::Hash => {
                result.push('{');
                result.push_str(&join(&self.key_types));
                result.push_str(" => ");
                result.push_str(&join(&self.value_types));
                result.push('}');
            }
        }

        result
    }

    /// Resolves this atom and its parameters to rooted, fully qualified names.
    ///
    /// Atoms that do not resolve become `undefined`.
    pub fn qualify(&self, resolver: &dyn ConstantResolver, context: &str) -> UniqueType {
        let qualify_all = |types: &[UniqueType]| {
            types
                .iter()
                .map(|t| t.qualify(resolver, context))
                .collect::<Vec<UniqueType>>()
        };

        let mut qualified = if SPECIAL_NAMES.contains(&self.name.as_str()) {
            self.clone()
        } else {
            let lookup = if self.rooted {
                format!("::{}", self.name)
            } else {
                self.name.clone()
            };
            match resolver.qualify(&lookup, context) {
                Some(path) => {
                    let mut resolved = self.clone();
                    resolved.name = path;
                    resolved.rooted = true;
                    resolved
                }
                None => return UniqueType::undefined(),
            }
        };

        qualified.subtypes = qualify_all(&self.subtypes);
        qualified.key_types = qualify_all(&self.key_types);
        qualified.value_types = qualify_all(&self.value_types);
        qualified
    }

    fn self_to(&self, receiver: &UniqueType) -> UniqueType {
        if self.is_self() {
            return receiver.clone();
        }
        let replace = |types: &[UniqueType]| {
            types
                .iter()
                .map(|t| t.self_to(receiver))
                .collect::<Vec<UniqueType>>()
        };
        let mut result = self.clone();
        result.subtypes = replace(&self.subtypes);
        result.key_types = replace(&self.key_types);
        result.value_types = replace(&self.value_types);
        result
    }
}

impl Display for UniqueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A union of possible runtime types. Zero atoms means undefined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ComplexType {
    items: Vec<UniqueType>,
}

impl ComplexType {
    pub const UNDEFINED: ComplexType = ComplexType { items: Vec::new() };

    /// Builds a union, dropping atoms whose tag repeats an earlier one.
    pub fn new(items: Vec<UniqueType>) -> Self {
        let mut unique: Vec<UniqueType> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.iter().any(|existing| existing.rooted_tag() == item.rooted_tag()) {
                unique.push(item);
            }
        }
        ComplexType { items: unique }
    }

    pub fn from_unique(item: UniqueType) -> Self {
        ComplexType { items: vec![item] }
    }

    /// Parses a type tag. Malformed tags yield `UNDEFINED`.
    pub fn parse(tag: &str) -> Self {
        match parse_type(tag) {
            Some(items) => ComplexType::new(items),
            None => ComplexType::UNDEFINED,
        }
    }

    /// Parses several tag strings as one union, as they appear in a
    /// documentation tag's type list.
    pub fn try_parse<S: AsRef<str>>(tags: &[S]) -> Self {
        let joined = tags
            .iter()
            .map(|tag| tag.as_ref())
            .collect::<Vec<&str>>()
            .join(", ");
        ComplexType::parse(&joined)
    }

    /// Merges the defined members of several types in order.
    pub fn union<I: IntoIterator<Item = ComplexType>>(types: I) -> Self {
        let items = types
            .into_iter()
            .filter(|t| !t.is_undefined())
            .flat_map(|t| t.items)
            .collect();
        ComplexType::new(items)
    }

    pub fn is_undefined(&self) -> bool {
        self.items.is_empty() || self.items.iter().any(UniqueType::is_undefined)
    }

    pub fn is_void(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(UniqueType::is_void)
    }

    pub fn is_rooted(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|item| item.rooted)
    }

    pub fn items(&self) -> &[UniqueType] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UniqueType> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&UniqueType> {
        self.items.first()
    }

    pub fn name(&self) -> &str {
        self.items.first().map(|t| t.name.as_str()).unwrap_or("undefined")
    }

    pub fn namespace(&self) -> String {
        self.items.first().map(UniqueType::namespace).unwrap_or_default()
    }

    /// The namespace of every member, in order.
    pub fn namespaces(&self) -> Vec<String> {
        self.items.iter().map(UniqueType::namespace).collect()
    }

    pub fn scope(&self) -> Scope {
        self.items.first().map(UniqueType::scope).unwrap_or_default()
    }

    pub fn subtypes(&self) -> &[UniqueType] {
        self.items.first().map(|t| t.subtypes.as_slice()).unwrap_or(&[])
    }

    pub fn key_types(&self) -> &[UniqueType] {
        self.items.first().map(|t| t.key_types.as_slice()).unwrap_or(&[])
    }

    pub fn value_types(&self) -> &[UniqueType] {
        self.items.first().map(|t| t.value_types.as_slice()).unwrap_or(&[])
    }

    pub fn tag(&self) -> String {
        self.to_string()
    }

    pub fn rooted_tag(&self) -> String {
        if self.items.is_empty() {
            return String::from("undefined");
        }
        self.items
            .iter()
            .map(UniqueType::rooted_tag)
            .collect::<Vec<String>>()
            .join(", ")
    }

    pub fn qualify(&self, resolver: &dyn ConstantResolver, context: &str) -> ComplexType {
        if self.items.is_empty() {
            return ComplexType::UNDEFINED;
        }
        ComplexType::new(
            self.items
                .iter()
                .map(|item| item.qualify(resolver, context))
                .collect(),
        )
    }

    /// Replaces `self` references with the receiver's type.
    pub fn self_to(&self, receiver: &ComplexType) -> ComplexType {
        let Some(first) = receiver.first() else {
            return self.clone();
        };
        let mut items = vec![];
        for item in &self.items {
            if item.is_self() {
                items.extend(receiver.items.iter().cloned());
            } else {
                items.push(item.self_to(first));
            }
        }
        ComplexType::new(items)
    }

    pub fn references_self(&self) -> bool {
        fn walk(item: &UniqueType) -> bool {
            item.is_self()
                || item.subtypes.iter().any(walk)
                || item.key_types.iter().any(walk)
                || item.value_types.iter().any(walk)
        }
        self.items.iter().any(walk)
    }
}

impl Display for ComplexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.items.is_empty() {
            return write!(f, "undefined");
        }
        let tags = self
            .items
            .iter()
            .map(UniqueType::tag)
            .collect::<Vec<String>>()
            .join(", ");
        write!(f, "{}", tags)
    }
}

impl<'a> IntoIterator for &'a ComplexType {
    type Item = &'a UniqueType;
    type IntoIter = std::slice::Iter<'a, UniqueType>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
