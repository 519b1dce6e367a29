//! Unit tests for chains and their resolution.

use crate::{
    api_map::ApiMap,
    complex_type::Scope,
    pin::{binder_type, Pin, PinKind},
    position_at_offset, tree, Position,
};

use super::{node_chainer, Chain, Link, Resolver, VariableKind, UNDEFINED_WORD};

fn mapped(text: &str) -> ApiMap {
    let mut api_map = ApiMap::new();
    api_map.map(tree::read("test.rb", text).unwrap());
    api_map
}

fn position_of(text: &str, needle: &str) -> Position {
    position_at_offset(text, text.find(needle).unwrap())
}

#[test]
fn test_undefined_link_resolves_to_nothing() {
    let api_map = ApiMap::new();
    let chain = Chain::undefined();
    assert!(chain.is_undefined());
    assert!(chain.define(&api_map, &Pin::root(), &[]).is_empty());
    assert!(chain.infer(&api_map, &Pin::root(), &[]).is_undefined());
    assert!(chain.base().is_undefined());
}

#[test]
fn test_define_core_namespace() {
    let api_map = ApiMap::new();
    let chain = Chain::new(vec![Link::constant("String")]);
    let pins = chain.define(&api_map, &Pin::root(), &[]);
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].kind(), PinKind::Namespace);
    assert_eq!(pins[0].path(), "String");
}

#[test]
fn test_infer_constant_is_the_namespace_itself() {
    let api_map = ApiMap::new();
    let chain = Chain::new(vec![Link::constant("String")]);
    let inferred = chain.infer(&api_map, &Pin::root(), &[]);
    assert_eq!(inferred.namespace(), "String");
    assert_eq!(inferred.scope(), Scope::Class);
}

#[test]
fn test_infer_new_instance() {
    let api_map = ApiMap::new();
    let chain = Chain::new(vec![Link::constant("String"), Link::call("new")]);
    let inferred = chain.infer(&api_map, &Pin::root(), &[]);
    assert_eq!(inferred.namespace(), "String");
    assert_eq!(inferred.scope(), Scope::Instance);
}

#[test]
fn test_recognizes_literals_and_constants() {
    let literal = Chain::new(vec![Link::literal("String")]);
    assert!(literal.is_literal());
    assert!(!literal.is_constant());

    let constant = Chain::new(vec![Link::constant("Foo"), Link::constant("Bar")]);
    assert!(constant.is_constant());
    assert!(!constant.is_literal());
}

#[test]
fn test_unfinished_constant_chain() {
    let chain = Chain::new(vec![Link::constant("Foo"), Link::constant(UNDEFINED_WORD)]);
    assert!(chain.is_undefined());
    assert!(!chain.base().is_undefined());
    assert_eq!(chain.to_string(), "Foo.<undefined>");
}

#[test]
fn test_chain_from_nodes() {
    let source = tree::read("test.rb", "(send (send (const (cbase) Foo) new) bar (int 1))").unwrap();
    let chain = node_chainer::chain(source.node.as_ref().unwrap());
    let words: Vec<String> = chain.links().iter().map(Link::word).collect();
    assert_eq!(words, vec!["::Foo", "new", "bar"]);

    match chain.last() {
        Some(Link::Call { arguments, .. }) => {
            assert_eq!(arguments.len(), 1);
            assert!(arguments[0].is_literal());
        }
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn test_empty_constant_name_is_undefined() {
    let source = tree::read("test.rb", "(const (const nil Foo) \"\")").unwrap();
    let chain = node_chainer::chain(source.node.as_ref().unwrap());
    assert!(chain.is_undefined());
    assert_eq!(chain.base(), Chain::new(vec![Link::constant("Foo")]));
}

#[test]
fn test_new_on_subclass_returns_subclass() {
    let api_map = mapped(
        "(begin
  (class (const nil Sup) nil
    (def initialize (args) nil))
  (class (const nil Sub) (const nil Sup)
    (def foo (args) nil)))",
    );
    let chain = Chain::new(vec![Link::constant("Sub"), Link::call("new")]);
    let inferred = chain.infer(&api_map, &Pin::root(), &[]);
    assert_eq!(inferred.namespace(), "Sub");
    assert_eq!(inferred.scope(), Scope::Instance);
}

#[test]
fn test_probe_unions_branches() {
    let api_map = mapped(
        "(class (const nil Foo) nil
  (def bar (args)
    (if (true) (str \"x\") (int 1))))",
    );
    let chain = Chain::new(vec![Link::constant("Foo"), Link::call("new"), Link::call("bar")]);
    let inferred = chain.infer(&api_map, &Pin::root(), &[]);
    assert_eq!(inferred.to_string(), "String, Integer");
    assert_eq!(inferred.len(), 2);
}

#[test]
fn test_probe_follows_explicit_returns() {
    let api_map = mapped(
        "(class (const nil Foo) nil
  (def bar (args)
    (begin
      (if (true) (return (sym a)) nil)
      (str \"x\"))))",
    );
    let chain = Chain::new(vec![Link::constant("Foo"), Link::call("new"), Link::call("bar")]);
    let inferred = chain.infer(&api_map, &Pin::root(), &[]);
    assert_eq!(inferred.to_string(), "String, Symbol");
}

#[test]
fn test_recursive_instance_variables_terminate() {
    let api_map = mapped(
        "(begin
  (ivasgn @foo (ivar @bar))
  (ivasgn @bar (send (ivar @foo) quz)))",
    );
    let chain = Chain::new(vec![Link::variable(VariableKind::Instance, "@foo")]);
    assert_eq!(chain.define(&api_map, &Pin::root(), &[]).len(), 1);
    assert!(chain.infer(&api_map, &Pin::root(), &[]).is_undefined());
}

#[test]
fn test_mutually_assigned_locals_terminate() {
    let text = "(begin
  (lvasgn a (lvar b))
  (lvasgn b (send (lvar a) x))
  (lvar a))";
    let api_map = mapped(text);
    let source_map = api_map.source_map("test.rb").unwrap();
    let position = position_of(text, "(lvar a))");
    let locals = source_map.locals_at(position);
    let chain = Chain::new(vec![Link::variable(VariableKind::Local, "a")]);

    assert!(chain.infer(&api_map, &Pin::root(), &locals).is_undefined());
    let chain = Chain::new(vec![Link::variable(VariableKind::Local, "b")]);
    assert!(chain.infer(&api_map, &Pin::root(), &locals).is_undefined());
}

#[test]
fn test_nested_constant_chains() {
    let api_map = mapped(
        "(module (const nil Foo)
  (begin
    (class (const nil Bar) nil
      (class (const nil Baz) nil nil))
    (class (const nil Other) nil nil)))",
    );

    let chain = Chain::new(vec![Link::constant("Foo"), Link::constant("Bar")]);
    let pins = chain.define(&api_map, &Pin::root(), &[]);
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].path(), "Foo::Bar");

    let rooted = Chain::new(vec![Link::constant("::Foo"), Link::constant("Bar"), Link::constant("Baz")]);
    assert_eq!(rooted.define(&api_map, &Pin::root(), &[])[0].path(), "Foo::Bar::Baz");

    let closure = Pin::proxy_in("Foo::Other", binder_type("Foo::Other", Scope::Class));
    let relative = Chain::new(vec![Link::constant("Bar"), Link::constant("Baz")]);
    assert_eq!(relative.define(&api_map, &closure, &[])[0].path(), "Foo::Bar::Baz");

    let missing = Chain::new(vec![Link::constant("Foo"), Link::constant("Nope")]);
    assert!(missing.define(&api_map, &Pin::root(), &[]).is_empty());
    assert!(missing.infer(&api_map, &Pin::root(), &[]).is_undefined());
}

#[test]
fn test_literal_containers() {
    let api_map = ApiMap::new();
    let root = Pin::root();

    let strings = Chain::new(vec![Link::Array(vec![
        Chain::new(vec![Link::literal("String")]),
        Chain::new(vec![Link::literal("String")]),
    ])]);
    assert_eq!(strings.infer(&api_map, &root, &[]).to_string(), "Array<String>");

    let mixed = Chain::new(vec![Link::Array(vec![
        Chain::new(vec![Link::literal("String")]),
        Chain::new(vec![Link::literal("Integer")]),
    ])]);
    assert_eq!(mixed.infer(&api_map, &root, &[]).to_string(), "Array");

    let hash = Chain::new(vec![Link::Hash]);
    assert_eq!(hash.infer(&api_map, &root, &[]).to_string(), "Hash");

    let source = tree::read("test.rb", "(hash (pair (sym a) (int 1)))").unwrap();
    let filled = node_chainer::chain(source.node.as_ref().unwrap());
    assert_eq!(filled.links(), &[Link::Hash]);
    assert_eq!(filled.infer(&api_map, &root, &[]).rooted_tag(), "::Hash");
}

#[test]
fn test_declared_return_self_resolves_to_receiver() {
    let api_map = ApiMap::new();
    let chain = Chain::new(vec![Link::constant("String"), Link::call("new"), Link::call("dup")]);
    assert_eq!(chain.infer(&api_map, &Pin::root(), &[]).to_string(), "String");
}

#[test]
fn test_call_arity_filters_candidates() {
    let api_map = ApiMap::new();
    let receiver = vec![Link::constant("String"), Link::call("new")];

    let mut fits = receiver.clone();
    fits.push(Link::call_with("include?", vec![Chain::new(vec![Link::literal("String")])]));
    assert_eq!(Chain::new(fits).infer(&api_map, &Pin::root(), &[]).to_string(), "Boolean");

    let mut too_few = receiver;
    too_few.push(Link::call("include?"));
    let chain = Chain::new(too_few);
    assert!(chain.define(&api_map, &Pin::root(), &[]).is_empty());
    assert_eq!(
        Resolver::new(&api_map)
            .without_arity_check()
            .define(&chain, &Pin::root(), &[])
            .len(),
        1
    );
}

#[test]
fn test_private_methods_need_implicit_receiver() {
    let api_map = mapped(
        "(class (const nil Foo) nil
  (begin
    (send nil private)
    (def secret (args) (int 1))))",
    );
    let explicit = Chain::new(vec![Link::constant("Foo"), Link::call("new"), Link::call("secret")]);
    assert!(explicit.define(&api_map, &Pin::root(), &[]).is_empty());

    let closure = Pin::proxy_in("Foo", binder_type("Foo", Scope::Instance));
    let implicit = Chain::new(vec![Link::call("secret")]);
    assert_eq!(implicit.define(&api_map, &closure, &[])[0].path(), "Foo#secret");
}

#[test]
fn test_private_override_is_not_callable_from_outside() {
    let api_map = mapped(
        "(begin
  (class (const nil Sup) nil
    (def greet (args) (str \"hi\")))
  (class (const nil Sub) (const nil Sup)
    (begin
      (send nil private)
      (def greet (args) nil))))",
    );
    let chain = Chain::new(vec![Link::constant("Sub"), Link::call("new"), Link::call("greet")]);
    assert!(chain.define(&api_map, &Pin::root(), &[]).is_empty());
    assert!(chain.infer(&api_map, &Pin::root(), &[]).is_undefined());

    let inherited = Chain::new(vec![Link::constant("Sup"), Link::call("new"), Link::call("greet")]);
    assert_eq!(inherited.infer(&api_map, &Pin::root(), &[]).to_string(), "String");
}

#[test]
fn test_protected_methods_callable_from_subclasses() {
    let api_map = mapped(
        "(begin
  (class (const nil Sup) nil
    (begin
      (send nil protected)
      (def token (args) (int 1))))
  (class (const nil Sub) (const nil Sup) nil)
  (class (const nil Other) nil nil))",
    );
    let chain = Chain::new(vec![Link::constant("Sup"), Link::call("new"), Link::call("token")]);
    let inside = |namespace: &str| {
        let closure = Pin::proxy_in(namespace, binder_type(namespace, Scope::Instance));
        chain.define(&api_map, &closure, &[]).len()
    };

    assert_eq!(inside("Sup"), 1);
    assert_eq!(inside("Sub"), 1);
    assert_eq!(inside("Other"), 0);
    assert!(chain.define(&api_map, &Pin::root(), &[]).is_empty());
}

#[test]
fn test_macro_return_type_substitution() {
    let text = "(begin
  ; @!macro make
  ;   @return [$1]
  (def make (args (arg klass)) nil)
  (send nil make (const nil String)))";
    let api_map = mapped(text);
    let source = tree::read("test.rb", text).unwrap();
    let call = source.node.as_ref().unwrap().node_at(1).unwrap();
    let chain = node_chainer::chain(call);
    assert_eq!(chain.infer(&api_map, &Pin::root(), &[]).to_string(), "String");
}

#[test]
fn test_max_probe_depth_cuts_off_nested_probes() {
    let api_map = mapped(
        "(class (const nil Foo) nil
  (begin
    (def a (args) (send nil b))
    (def b (args) (send nil c))
    (def c (args) (int 1))))",
    );
    let closure = Pin::proxy_in("Foo", binder_type("Foo", Scope::Instance));
    let chain = Chain::new(vec![Link::call("a")]);

    let shallow = Resolver::new(&api_map).with_max_probe_depth(2).infer(&chain, &closure, &[]);
    assert!(shallow.is_undefined());

    let deep = Resolver::new(&api_map).with_max_probe_depth(3).infer(&chain, &closure, &[]);
    assert_eq!(deep.rooted_tag(), "::Integer");
}
