use std::{fmt::Display, sync::Arc};

use crate::{
    complex_type::{ComplexType, Scope, UniqueType},
    tree::Node,
    Location, Range,
};

use super::{docstring::Docstring, parameter::Parameter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

impl Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinKind {
    Namespace,
    Method,
    MethodAlias,
    Attribute,
    Parameter,
    Constant,
    LocalVariable,
    InstanceVariable,
    ClassVariable,
    GlobalVariable,
    Block,
    Symbol,
    ProxyType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceKind {
    Class,
    Module,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeAccess {
    Reader,
    Writer,
}

/// Fields shared by every pin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Common {
    pub name: String,
    /// `None` for synthetic pins.
    pub location: Option<Location>,
    /// Path of the lexical owner: a namespace or method path, `""` at the root.
    pub closure: String,
    /// Lexical namespace used for constant lookup.
    pub namespace: String,
    /// Type of `self` where the pin is declared.
    pub context: ComplexType,
    pub docstring: Docstring,
    /// Declared type, unqualified.
    pub return_type: ComplexType,
}

impl Common {
    pub fn new(name: &str, location: Option<Location>, closure: &str, namespace: &str) -> Self {
        Common {
            name: name.to_string(),
            location,
            closure: closure.to_string(),
            namespace: namespace.to_string(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: ComplexType) -> Self {
        self.context = context;
        self
    }

    pub fn with_docstring(mut self, docstring: Docstring) -> Self {
        self.docstring = docstring;
        self
    }

    pub fn with_return_type(mut self, return_type: ComplexType) -> Self {
        self.return_type = return_type;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub common: Common,
    pub kind: NamespaceKind,
    pub visibility: Visibility,
    /// Superclass as written at the declaration.
    pub superclass: Option<String>,
    pub includes: Vec<String>,
    pub extends: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub common: Common,
    pub scope: Scope,
    pub visibility: Visibility,
    pub parameters: Vec<Parameter>,
    /// The `def`/`defs` node, kept for probing the body.
    pub node: Option<Arc<Node>>,
}

impl Method {
    pub fn body(&self) -> Option<&Node> {
        let node = self.node.as_deref()?;
        node.children.last().and_then(|child| child.as_node())
    }
}

/// An alias resolved lazily by looking up `original` from the same namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodAlias {
    pub common: Common,
    pub scope: Scope,
    pub original: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub common: Common,
    pub scope: Scope,
    pub visibility: Visibility,
    pub access: AttributeAccess,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub common: Common,
    pub visibility: Visibility,
    pub assignment: Option<Arc<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub common: Common,
    pub assignment: Option<Arc<Node>>,
    /// Where a local variable is visible. Unused for other variable kinds.
    pub presence: Option<Range>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub common: Common,
    /// The call the block is passed to.
    pub receiver: Option<Arc<Node>>,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub common: Common,
}

/// A pin that only carries a type, e.g. the result of a literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyType {
    pub common: Common,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pin {
    Namespace(Namespace),
    Method(Method),
    MethodAlias(MethodAlias),
    Attribute(Attribute),
    Parameter(Parameter),
    Constant(Constant),
    LocalVariable(Variable),
    InstanceVariable(Variable),
    ClassVariable(Variable),
    GlobalVariable(Variable),
    Block(Block),
    Symbol(Symbol),
    ProxyType(ProxyType),
}

fn join_path(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", namespace, name)
    }
}

impl Pin {
    /// The top-level namespace. Its `self` is an instance of `Object`.
    pub fn root() -> Pin {
        Pin::Namespace(Namespace {
            common: Common::default().with_context(ComplexType::parse("::Object")),
            kind: NamespaceKind::Class,
            visibility: Visibility::Public,
            superclass: None,
            includes: vec![],
            extends: vec![],
        })
    }

    /// A location-less pin carrying only `return_type`.
    pub fn proxy(return_type: ComplexType) -> Pin {
        Pin::ProxyType(ProxyType {
            common: Common::default().with_return_type(return_type),
        })
    }

    /// A proxy standing in for code inside `namespace`, as a closure.
    pub fn proxy_in(namespace: &str, return_type: ComplexType) -> Pin {
        Pin::ProxyType(ProxyType {
            common: Common::new("", None, namespace, namespace)
                .with_context(return_type.clone())
                .with_return_type(return_type),
        })
    }

    pub fn common(&self) -> &Common {
        match self {
            Pin::Namespace(pin) => &pin.common,
            Pin::Method(pin) => &pin.common,
            Pin::MethodAlias(pin) => &pin.common,
            Pin::Attribute(pin) => &pin.common,
            Pin::Parameter(pin) => &pin.common,
            Pin::Constant(pin) => &pin.common,
            Pin::LocalVariable(pin)
            | Pin::InstanceVariable(pin)
            | Pin::ClassVariable(pin)
            | Pin::GlobalVariable(pin) => &pin.common,
            Pin::Block(pin) => &pin.common,
            Pin::Symbol(pin) => &pin.common,
            Pin::ProxyType(pin) => &pin.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut Common {
        match self {
            Pin::Namespace(pin) => &mut pin.common,
            Pin::Method(pin) => &mut pin.common,
            Pin::MethodAlias(pin) => &mut pin.common,
            Pin::Attribute(pin) => &mut pin.common,
            Pin::Parameter(pin) => &mut pin.common,
            Pin::Constant(pin) => &mut pin.common,
            Pin::LocalVariable(pin)
            | Pin::InstanceVariable(pin)
            | Pin::ClassVariable(pin)
            | Pin::GlobalVariable(pin) => &mut pin.common,
            Pin::Block(pin) => &mut pin.common,
            Pin::Symbol(pin) => &mut pin.common,
            Pin::ProxyType(pin) => &mut pin.common,
        }
    }

    pub fn kind(&self) -> PinKind {
        match self {
            Pin::Namespace(_) => PinKind::Namespace,
            Pin::Method(_) => PinKind::Method,
            Pin::MethodAlias(_) => PinKind::MethodAlias,
            Pin::Attribute(_) => PinKind::Attribute,
            Pin::Parameter(_) => PinKind::Parameter,
            Pin::Constant(_) => PinKind::Constant,
            Pin::LocalVariable(_) => PinKind::LocalVariable,
            Pin::InstanceVariable(_) => PinKind::InstanceVariable,
            Pin::ClassVariable(_) => PinKind::ClassVariable,
            Pin::GlobalVariable(_) => PinKind::GlobalVariable,
            Pin::Block(_) => PinKind::Block,
            Pin::Symbol(_) => PinKind::Symbol,
            Pin::ProxyType(_) => PinKind::ProxyType,
        }
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    pub fn location(&self) -> Option<&Location> {
        self.common().location.as_ref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.location().map(|location| location.filename.as_str())
    }

    pub fn closure(&self) -> &str {
        &self.common().closure
    }

    pub fn namespace(&self) -> &str {
        &self.common().namespace
    }

    pub fn context(&self) -> &ComplexType {
        &self.common().context
    }

    pub fn docstring(&self) -> &Docstring {
        &self.common().docstring
    }

    pub fn return_type(&self) -> &ComplexType {
        &self.common().return_type
    }

    /// The namespace that owns a method-like pin: the namespace of its context.
    pub fn owner(&self) -> String {
        self.context().namespace()
    }

    /// Fully qualified identifier: `Ns#meth`, `Ns.meth`, `Ns::CONST` or `Ns`.
    pub fn path(&self) -> String {
        match self {
            Pin::Namespace(_) | Pin::Constant(_) => join_path(self.namespace(), self.name()),
            Pin::Method(_) | Pin::MethodAlias(_) | Pin::Attribute(_) => {
                let separator = match self.scope() {
                    Scope::Instance => '#',
                    Scope::Class => '.',
                };
                format!("{}{}{}", self.owner(), separator, self.name())
            }
            Pin::ProxyType(_) | Pin::Block(_) => String::new(),
            _ => self.name().to_string(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Pin::Namespace(_) => Scope::Class,
            Pin::Method(pin) => pin.scope,
            Pin::MethodAlias(pin) => pin.scope,
            Pin::Attribute(pin) => pin.scope,
            _ => self.context().scope(),
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Pin::Namespace(pin) => pin.visibility,
            Pin::Method(pin) => pin.visibility,
            Pin::Attribute(pin) => pin.visibility,
            Pin::Constant(pin) => pin.visibility,
            _ => Visibility::Public,
        }
    }

    pub fn is_method_like(&self) -> bool {
        matches!(self, Pin::Method(_) | Pin::MethodAlias(_) | Pin::Attribute(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            Pin::LocalVariable(_)
                | Pin::InstanceVariable(_)
                | Pin::ClassVariable(_)
                | Pin::GlobalVariable(_)
        )
    }

    /// True for pins that can be visible as locals: local variables and parameters.
    pub fn is_local(&self) -> bool {
        matches!(self, Pin::LocalVariable(_) | Pin::Parameter(_))
    }

    pub fn parameters(&self) -> &[Parameter] {
        match self {
            Pin::Method(pin) => &pin.parameters,
            Pin::Block(pin) => &pin.parameters,
            _ => &[],
        }
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters().iter().map(Parameter::name).collect()
    }

    /// The assigned value of a variable or constant.
    pub fn assignment(&self) -> Option<&Node> {
        match self {
            Pin::Constant(pin) => pin.assignment.as_deref(),
            Pin::LocalVariable(pin)
            | Pin::InstanceVariable(pin)
            | Pin::ClassVariable(pin)
            | Pin::GlobalVariable(pin) => pin.assignment.as_deref(),
            Pin::Parameter(pin) => pin.value.as_deref(),
            _ => None,
        }
    }

    /// The range in which a local variable or parameter is visible.
    pub fn presence(&self) -> Option<Range> {
        match self {
            Pin::LocalVariable(pin) => pin.presence,
            Pin::Parameter(pin) => pin.presence,
            _ => None,
        }
    }

    /// `Class<Path>` for namespaces: the type of the constant that names them.
    pub fn namespace_type(&self) -> Option<ComplexType> {
        match self {
            Pin::Namespace(pin) => {
                let container = match pin.kind {
                    NamespaceKind::Class => "Class",
                    NamespaceKind::Module => "Module",
                };
                let mut inner = UniqueType::new(&self.path());
                inner.rooted = true;
                let mut outer = UniqueType::with_subtypes(container, vec![inner]);
                outer.rooted = true;
                Some(ComplexType::from_unique(outer))
            }
            _ => None,
        }
    }
}

impl Display for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pin::Method(pin) => {
                let parameters = pin
                    .parameters
                    .iter()
                    .map(Parameter::full)
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "{}({})", self.path(), parameters)
            }
            _ => write!(f, "{}", self.path()),
        }
    }
}

/// The type of `self` inside `namespace` at `scope`. The root namespace
/// behaves as an instance of `Object`.
pub fn binder_type(namespace: &str, scope: Scope) -> ComplexType {
    if namespace.is_empty() {
        return ComplexType::parse("::Object");
    }
    let mut inner = UniqueType::new(namespace);
    inner.rooted = true;
    let unique = match scope {
        Scope::Instance => inner,
        Scope::Class => {
            let mut outer = UniqueType::with_subtypes("Class", vec![inner]);
            outer.rooted = true;
            outer
        }
    };
    ComplexType::from_unique(unique)
}
