//! The preloaded core catalogue.
//!
//! A read-only set of pins describing the standard library surface. It is
//! built once per process and shared by every `ApiMap` through an `Arc`.

use std::sync::Arc;

use lazy_static::lazy_static;

use crate::{
    complex_type::{ComplexType, Scope},
    pin::{
        binder_type, Common, Constant, Docstring, Method, Namespace, NamespaceKind, Parameter,
        Pin, Tag, TagKind, Visibility,
    },
    Location, Range,
};

pub const CORE_FILENAME: &str = "<core>";

#[derive(Debug, Clone, Default)]
pub struct CoreCatalogue {
    pins: Vec<Arc<Pin>>,
    filenames: Vec<String>,
}

lazy_static! {
    static ref CORE: Arc<CoreCatalogue> = Arc::new(CoreCatalogue::standard());
}

/// The process-wide standard catalogue.
pub fn core() -> Arc<CoreCatalogue> {
    Arc::clone(&CORE)
}

impl CoreCatalogue {
    /// A catalogue from arbitrary pins. Every file the pins come from counts
    /// as bundled.
    pub fn new(pins: Vec<Pin>) -> Self {
        let mut filenames: Vec<String> = vec![String::from(CORE_FILENAME)];
        for pin in &pins {
            if let Some(filename) = pin.filename() {
                if !filenames.iter().any(|known| known == filename) {
                    filenames.push(filename.to_string());
                }
            }
        }

        CoreCatalogue {
            pins: pins.into_iter().map(Arc::new).collect(),
            filenames,
        }
    }

    pub fn pins(&self) -> &[Arc<Pin>] {
        &self.pins
    }

    pub fn includes_file(&self, filename: &str) -> bool {
        self.filenames.iter().any(|known| known == filename)
    }

    pub fn standard() -> Self {
        let mut builder = Builder::default();

        builder.class("BasicObject", None, &[]);
        builder.instance("BasicObject", "initialize", &[], "");
        builder.instance("BasicObject", "==", &["other"], "Boolean");
        builder.instance("BasicObject", "!", &[], "Boolean");
        builder.instance("BasicObject", "__send__", &["name", "*args"], "");
        builder.yielding("BasicObject", "instance_eval", &["*args"], TagKind::YieldSelf, "self");

        builder.module("Kernel", &[]);
        for name in ["puts", "print", "p"] {
            builder.instance("Kernel", name, &["*args"], "nil");
        }
        builder.instance("Kernel", "require", &["path"], "Boolean");
        builder.instance("Kernel", "raise", &["*args"], "void");
        builder.instance("Kernel", "format", &["format", "*args"], "String");
        builder.instance("Kernel", "rand", &["max = nil"], "Float");
        builder.instance("Kernel", "lambda", &["&block"], "Proc");
        builder.instance("Kernel", "proc", &["&block"], "Proc");
        builder.instance("Kernel", "loop", &["&block"], "nil");

        builder.class("Object", Some("BasicObject"), &["Kernel"]);
        builder.instance("Object", "class", &[], "Class");
        builder.instance("Object", "to_s", &[], "String");
        builder.instance("Object", "inspect", &[], "String");
        builder.instance("Object", "nil?", &[], "Boolean");
        builder.instance("Object", "frozen?", &[], "Boolean");
        builder.instance("Object", "is_a?", &["klass"], "Boolean");
        builder.instance("Object", "respond_to?", &["name", "include_all = false"], "Boolean");
        builder.instance("Object", "freeze", &[], "self");
        builder.instance("Object", "dup", &[], "self");
        builder.instance("Object", "tap", &["&block"], "self");
        builder.instance("Object", "send", &["name", "*args"], "");

        builder.class("Module", Some("Object"), &[]);
        builder.yielding("Module", "class_eval", &["*args"], TagKind::YieldSelf, "self");
        builder.yielding("Module", "module_eval", &["*args"], TagKind::YieldSelf, "self");
        for name in ["attr_reader", "attr_writer", "attr_accessor", "private_constant"] {
            builder.instance("Module", name, &["*names"], "nil");
        }
        for name in ["private", "protected", "public", "module_function"] {
            builder.instance("Module", name, &["*names"], "self");
        }
        builder.instance("Module", "include", &["*modules"], "self");
        builder.instance("Module", "extend", &["*modules"], "self");
        builder.instance("Module", "alias_method", &["new_name", "old_name"], "Symbol");
        builder.instance("Module", "name", &[], "String");
        builder.instance("Module", "const_get", &["name"], "");
        builder.instance("Module", "instance_methods", &["include_super = true"], "Array<Symbol>");
        builder.instance("Module", "define_method", &["name", "&block"], "Symbol");

        builder.class("Class", Some("Module"), &[]);
        builder.instance("Class", "new", &["*args"], "Object");
        builder.instance("Class", "allocate", &[], "Object");
        builder.instance("Class", "superclass", &[], "Class, nil");
        builder.singleton("Class", "new", &["superclass = Object"], "Class");

        builder.module("Comparable", &[]);
        for name in ["<", "<=", ">", ">="] {
            builder.instance("Comparable", name, &["other"], "Boolean");
        }
        builder.instance("Comparable", "between?", &["min", "max"], "Boolean");

        builder.module("Enumerable", &[]);
        builder.instance("Enumerable", "map", &["&block"], "Array");
        builder.instance("Enumerable", "select", &["&block"], "Array");
        builder.instance("Enumerable", "to_a", &[], "Array");
        builder.instance("Enumerable", "count", &["*args"], "Integer");
        builder.instance("Enumerable", "include?", &["object"], "Boolean");
        builder.instance("Enumerable", "each_with_index", &["&block"], "self");
        builder.instance("Enumerable", "first", &["count = nil"], "");
        builder.instance("Enumerable", "find", &["&block"], "");

        builder.class("String", Some("Object"), &["Comparable"]);
        for name in ["upcase", "downcase", "strip", "to_s", "capitalize", "reverse"] {
            builder.instance("String", name, &[], "String");
        }
        builder.instance("String", "split", &["pattern = nil", "limit = 0"], "Array<String>");
        builder.instance("String", "chars", &[], "Array<String>");
        builder.instance("String", "length", &[], "Integer");
        builder.instance("String", "size", &[], "Integer");
        builder.instance("String", "to_i", &[], "Integer");
        builder.instance("String", "to_f", &[], "Float");
        builder.instance("String", "to_sym", &[], "Symbol");
        builder.instance("String", "+", &["other"], "String");
        builder.instance("String", "empty?", &[], "Boolean");
        builder.instance("String", "include?", &["other"], "Boolean");
        builder.instance("String", "start_with?", &["*prefixes"], "Boolean");
        builder.instance("String", "gsub", &["pattern", "replacement = nil"], "String");

        builder.class("Symbol", Some("Object"), &["Comparable"]);
        builder.instance("Symbol", "to_s", &[], "String");
        builder.instance("Symbol", "to_proc", &[], "Proc");
        builder.instance("Symbol", "length", &[], "Integer");

        builder.class("Numeric", Some("Object"), &["Comparable"]);
        builder.instance("Numeric", "to_i", &[], "Integer");
        builder.instance("Numeric", "to_f", &[], "Float");
        builder.instance("Numeric", "zero?", &[], "Boolean");
        builder.instance("Numeric", "abs", &[], "self");
        builder.class("Integer", Some("Numeric"), &[]);
        builder.instance("Integer", "+", &["other"], "Integer");
        builder.instance("Integer", "succ", &[], "Integer");
        builder.instance("Integer", "even?", &[], "Boolean");
        builder.instance("Integer", "times", &["&block"], "self");
        builder.instance("Integer", "to_s", &["base = 10"], "String");
        builder.class("Float", Some("Numeric"), &[]);
        builder.instance("Float", "round", &["digits = 0"], "Float");
        builder.instance("Float", "floor", &[], "Integer");
        builder.instance("Float", "ceil", &[], "Integer");

        builder.class("Array", Some("Object"), &["Enumerable"]);
        builder.instance("Array", "each", &["&block"], "self");
        builder.instance("Array", "length", &[], "Integer");
        builder.instance("Array", "size", &[], "Integer");
        builder.instance("Array", "empty?", &[], "Boolean");
        builder.instance("Array", "push", &["*objects"], "self");
        builder.instance("Array", "<<", &["object"], "self");
        builder.instance("Array", "join", &["separator = nil"], "String");
        builder.instance("Array", "compact", &[], "self");
        builder.instance("Array", "last", &["count = nil"], "");

        builder.class("Hash", Some("Object"), &["Enumerable"]);
        builder.instance("Hash", "each", &["&block"], "self");
        builder.instance("Hash", "keys", &[], "Array");
        builder.instance("Hash", "values", &[], "Array");
        builder.instance("Hash", "[]", &["key"], "");
        builder.instance("Hash", "fetch", &["key", "default = nil"], "");
        builder.instance("Hash", "key?", &["key"], "Boolean");
        builder.instance("Hash", "merge", &["*others"], "self");
        builder.instance("Hash", "length", &[], "Integer");

        builder.class("NilClass", Some("Object"), &[]);
        builder.instance("NilClass", "to_s", &[], "String");
        builder.instance("NilClass", "to_a", &[], "Array");
        builder.class("Boolean", Some("Object"), &[]);
        builder.class("TrueClass", Some("Object"), &[]);
        builder.class("FalseClass", Some("Object"), &[]);
        for class in ["Boolean", "TrueClass", "FalseClass"] {
            builder.instance(class, "&", &["other"], "Boolean");
            builder.instance(class, "|", &["other"], "Boolean");
            builder.instance(class, "to_s", &[], "String");
        }

        builder.class("Proc", Some("Object"), &[]);
        builder.instance("Proc", "call", &["*args"], "");
        builder.instance("Proc", "arity", &[], "Integer");

        builder.class("Exception", Some("Object"), &[]);
        builder.instance("Exception", "message", &[], "String");
        builder.instance("Exception", "backtrace", &[], "Array<String>");
        builder.class("StandardError", Some("Exception"), &[]);
        builder.class("RuntimeError", Some("StandardError"), &[]);
        builder.class("ArgumentError", Some("StandardError"), &[]);

        builder.class("IO", Some("Object"), &["Enumerable"]);
        builder.instance("IO", "puts", &["*args"], "nil");
        builder.instance("IO", "read", &["length = nil"], "String");
        builder.instance("IO", "write", &["*args"], "Integer");
        builder.instance("IO", "close", &[], "nil");
        builder.singleton("IO", "read", &["name"], "String");
        builder.class("File", Some("IO"), &[]);
        builder.constant("File", "SEPARATOR", "String");
        builder.constant("File", "ALT_SEPARATOR", "String, nil");
        builder.singleton("File", "dirname", &["path"], "String");
        builder.singleton("File", "basename", &["path", "suffix = nil"], "String");
        builder.singleton("File", "join", &["*parts"], "String");
        builder.singleton("File", "exist?", &["path"], "Boolean");
        builder.instance("File", "path", &[], "String");

        builder.constant("", "ARGV", "Array<String>");
        builder.constant("", "ENV", "Hash{String => String}");

        CoreCatalogue::new(builder.pins)
    }
}

#[derive(Default)]
struct Builder {
    pins: Vec<Pin>,
}

fn core_location() -> Option<Location> {
    Some(Location::new(CORE_FILENAME, Range::default()))
}

fn split_path(path: &str) -> (&str, &str) {
    match path.rfind("::") {
        Some(index) => (&path[..index], &path[index + 2..]),
        None => ("", path),
    }
}

fn return_docstring(return_type: &str) -> Docstring {
    if return_type.is_empty() {
        Docstring::default()
    } else {
        Docstring::new(vec![Tag::returns(&[return_type])])
    }
}

impl Builder {
    fn namespace(&mut self, path: &str, kind: NamespaceKind, superclass: Option<&str>, includes: &[&str]) {
        let (namespace, name) = split_path(path);
        self.pins.push(Pin::Namespace(Namespace {
            common: Common::new(name, core_location(), namespace, namespace)
                .with_context(binder_type(path, Scope::Class)),
            kind,
            visibility: Visibility::Public,
            superclass: superclass.map(|superclass| format!("::{}", superclass)),
            includes: includes.iter().map(|include| format!("::{}", include)).collect(),
            extends: vec![],
        }));
    }

    fn class(&mut self, path: &str, superclass: Option<&str>, includes: &[&str]) {
        self.namespace(path, NamespaceKind::Class, superclass, includes);
    }

    fn module(&mut self, path: &str, includes: &[&str]) {
        self.namespace(path, NamespaceKind::Module, None, includes);
    }

    fn method(&mut self, owner: &str, scope: Scope, name: &str, parameters: &[&str], docstring: Docstring) {
        let return_type = docstring
            .tag(TagKind::Return)
            .map(Tag::declared_type)
            .unwrap_or(ComplexType::UNDEFINED);

        self.pins.push(Pin::Method(Method {
            common: Common::new(name, core_location(), owner, owner)
                .with_context(binder_type(owner, scope))
                .with_docstring(docstring)
                .with_return_type(return_type),
            scope,
            visibility: Visibility::Public,
            parameters: parameters
                .iter()
                .enumerate()
                .map(|(index, declaration)| Parameter::declared(declaration, index))
                .collect(),
            node: None,
        }));
    }

    fn instance(&mut self, owner: &str, name: &str, parameters: &[&str], return_type: &str) {
        self.method(owner, Scope::Instance, name, parameters, return_docstring(return_type));
    }

    fn singleton(&mut self, owner: &str, name: &str, parameters: &[&str], return_type: &str) {
        self.method(owner, Scope::Class, name, parameters, return_docstring(return_type));
    }

    /// A method whose block runs with a rebound `self`.
    fn yielding(&mut self, owner: &str, name: &str, parameters: &[&str], kind: TagKind, binder: &str) {
        let docstring = Docstring::new(vec![Tag::new(kind, None, &[binder])]);
        self.method(owner, Scope::Instance, name, parameters, docstring);
    }

    fn constant(&mut self, namespace: &str, name: &str, return_type: &str) {
        self.pins.push(Pin::Constant(Constant {
            common: Common::new(name, core_location(), namespace, namespace)
                .with_context(binder_type(namespace, Scope::Class))
                .with_docstring(Docstring::new(vec![Tag::new(TagKind::Type, None, &[return_type])]))
                .with_return_type(ComplexType::parse(return_type)),
            visibility: Visibility::Public,
            assignment: None,
        }));
    }
}
