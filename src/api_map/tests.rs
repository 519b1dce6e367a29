use std::sync::Arc;

use crate::{
    complex_type::{ComplexType, ConstantResolver, Scope},
    pin::{PinKind, Visibility},
    tree, Position,
};

use super::{core, ApiMap, CoreCatalogue, CORE_FILENAME};

fn mapped(text: &str) -> ApiMap {
    let mut api_map = ApiMap::new();
    api_map.map(tree::read("test.rb", text).unwrap());
    api_map
}

fn paths(pins: &[Arc<crate::pin::Pin>]) -> Vec<String> {
    pins.iter().map(|pin| pin.path()).collect()
}

const HIERARCHY: &str = "(begin
  (module (const nil A) nil)
  (module (const nil B) nil)
  (class (const nil Base) nil nil)
  (class (const nil Foo) (const nil Base)
    (begin
      (send nil include (const nil A))
      (send nil include (const nil B)))))";

#[test]
fn test_ancestors_order() {
    let api_map = mapped(HIERARCHY);
    assert_eq!(
        api_map.ancestors("Foo"),
        vec!["Foo", "B", "A", "Base", "Object", "Kernel", "BasicObject"]
    );
    assert_eq!(api_map.ancestors("A"), vec!["A"]);
    assert_eq!(api_map.ancestors(""), api_map.ancestors("Object"));
}

#[test]
fn test_super_and_sub() {
    let api_map = mapped(HIERARCHY);
    assert!(api_map.super_and_sub("Base", "Foo"));
    assert!(api_map.super_and_sub("::Object", "::Foo"));
    assert!(api_map.super_and_sub("A", "Foo"));
    assert!(api_map.super_and_sub("Foo", "Foo"));
    assert!(!api_map.super_and_sub("Foo", "Base"));
    assert!(!api_map.super_and_sub("String", "Foo"));
}

#[test]
fn test_qualify_constant() {
    let api_map = mapped(
        "(module (const nil Foo)
  (begin
    (class (const nil Bar) nil nil)
    (casgn nil LIMIT (int 10))))",
    );
    assert_eq!(api_map.qualify_constant("Bar", "Foo"), Some(String::from("Foo::Bar")));
    assert_eq!(api_map.qualify_constant("Foo::Bar", ""), Some(String::from("Foo::Bar")));
    assert_eq!(api_map.qualify_constant("::Foo::Bar", "Foo::Bar"), Some(String::from("Foo::Bar")));
    assert_eq!(api_map.qualify_constant("LIMIT", "Foo::Bar"), Some(String::from("Foo::LIMIT")));
    assert_eq!(api_map.qualify_constant("String", "Foo"), Some(String::from("String")));
    assert_eq!(api_map.qualify_constant("::Bar", "Foo"), None);
    assert_eq!(api_map.qualify_constant("Nope", "Foo"), None);
    assert_eq!(api_map.qualify_constant("", "Foo"), None);

    let resolved = api_map.resolve_constant("LIMIT", "Foo");
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].kind(), PinKind::Constant);
}

#[test]
fn test_inherited_constants() {
    let api_map = mapped(
        "(begin
  (class (const nil Base) nil
    (casgn nil DEFAULT (str \"x\")))
  (class (const nil Sub) (const nil Base) nil))",
    );
    assert_eq!(api_map.qualify_constant("DEFAULT", "Sub"), Some(String::from("Base::DEFAULT")));
    assert_eq!(paths(&api_map.resolve_member("Sub", "DEFAULT")), vec!["Base::DEFAULT"]);
    assert!(api_map.resolve_member("Sub", "MISSING").is_empty());
}

#[test]
fn test_type_qualification_through_resolver() {
    let api_map = mapped("(module (const nil Foo) (class (const nil Bar) nil nil))");
    let qualified = ComplexType::parse("Array<Bar>, nil").qualify(&api_map, "Foo");
    assert_eq!(qualified.rooted_tag(), "::Array<::Foo::Bar>, nil");
    assert_eq!(ConstantResolver::qualify(&api_map, "Bar", ""), None);
    assert!(ComplexType::parse("Missing").qualify(&api_map, "Foo").is_undefined());
}

#[test]
fn test_mapping_twice_is_idempotent() {
    let text = "(class (const nil Foo) nil (def bar (args) nil))";
    let mut api_map = ApiMap::new();
    api_map.map(tree::read("test.rb", text).unwrap());
    let count = api_map.pins().len();
    api_map.map(tree::read("test.rb", text).unwrap());
    assert_eq!(api_map.pins().len(), count);
    assert_eq!(api_map.lookup("Foo#bar").len(), 1);

    let pins = api_map.source_map("test.rb").unwrap().pins().to_vec();
    api_map.index(&pins);
    api_map.index(&pins);
    assert_eq!(api_map.pins().len(), count);
}

#[test]
fn test_remapping_replaces_file_pins() {
    let mut api_map = ApiMap::new();
    api_map.map(tree::read("test.rb", "(class (const nil Foo) nil (def bar (args) nil))").unwrap());
    api_map.map(tree::read("test.rb", "(class (const nil Foo) nil (def baz (args) nil))").unwrap());
    assert!(api_map.lookup("Foo#bar").is_empty());
    assert_eq!(api_map.lookup("Foo#baz").len(), 1);
}

#[test]
fn test_bundled_files() {
    let api_map = ApiMap::new();
    assert!(api_map.bundled(CORE_FILENAME));
    assert!(!api_map.bundled("test.rb"));
    assert!(Arc::ptr_eq(&core(), &core()));

    let custom = ApiMap::with_core(Arc::new(CoreCatalogue::new(vec![])));
    assert!(!custom.namespace_exists("String"));
    assert!(api_map.namespace_exists("String"));
}

#[test]
fn test_method_pins_visibility_ceiling() {
    let api_map = mapped(
        "(class (const nil Foo) nil
  (begin
    (def open (args) nil)
    (send nil protected)
    (def guarded (args) nil)
    (send nil private)
    (def hidden (args) nil)))",
    );
    let find = |name: &str, ceiling: Visibility| api_map.method_pins("Foo", name, Scope::Instance, ceiling).len();

    assert_eq!(find("open", Visibility::Public), 1);
    assert_eq!(find("guarded", Visibility::Public), 0);
    assert_eq!(find("guarded", Visibility::Protected), 1);
    assert_eq!(find("hidden", Visibility::Protected), 0);
    assert_eq!(find("hidden", Visibility::Private), 1);
}

#[test]
fn test_private_override_hides_inherited_method() {
    let api_map = mapped(
        "(begin
  (class (const nil Sup) nil
    (def greet (args) (str \"hi\")))
  (class (const nil Sub) (const nil Sup)
    (begin
      (send nil private)
      (def greet (args) nil))))",
    );
    assert!(api_map.method_pins("Sub", "greet", Scope::Instance, Visibility::Public).is_empty());
    assert_eq!(
        paths(&api_map.method_pins("Sub", "greet", Scope::Instance, Visibility::Private)),
        vec!["Sub#greet"]
    );
    assert_eq!(
        paths(&api_map.method_pins("Sup", "greet", Scope::Instance, Visibility::Public)),
        vec!["Sup#greet"]
    );
    assert!(!api_map
        .get_methods("Sub", Scope::Instance, Visibility::Public)
        .iter()
        .any(|pin| pin.name() == "greet"));
}

#[test]
fn test_method_lookup_follows_ancestry() {
    let api_map = mapped(
        "(begin
  (module (const nil Greeting)
    (def greet (args) (str \"hi\")))
  (module (const nil Helpers)
    (def helper (args) nil))
  (class (const nil Foo) nil
    (begin
      (send nil include (const nil Greeting))
      (send nil extend (const nil Helpers))
      (def to_s (args) (str \"foo\"))
      (defs (self) make (args) nil))))",
    );

    assert_eq!(paths(&api_map.method_pins("Foo", "greet", Scope::Instance, Visibility::Public)), vec!["Greeting#greet"]);
    assert_eq!(paths(&api_map.method_pins("Foo", "to_s", Scope::Instance, Visibility::Public)), vec!["Foo#to_s"]);
    assert_eq!(paths(&api_map.method_pins("Foo", "make", Scope::Class, Visibility::Public)), vec!["Foo.make"]);
    assert_eq!(paths(&api_map.method_pins("Foo", "helper", Scope::Class, Visibility::Public)), vec!["Helpers#helper"]);
    assert_eq!(paths(&api_map.method_pins("Foo", "new", Scope::Class, Visibility::Public)), vec!["Class#new"]);
    assert!(api_map.method_pins("Foo", "helper", Scope::Instance, Visibility::Public).is_empty());

    let methods = api_map.get_methods("Foo", Scope::Instance, Visibility::Public);
    let to_s: Vec<String> = methods.iter().filter(|pin| pin.name() == "to_s").map(|pin| pin.path()).collect();
    assert_eq!(to_s, vec!["Foo#to_s"]);
    assert!(methods.iter().any(|pin| pin.path() == "Object#inspect"));
}

#[test]
fn test_later_definition_wins() {
    let api_map = mapped(
        "(class (const nil Foo) nil
  (begin
    (def bar (args) (int 1))
    (def bar (args) (str \"x\"))))",
    );
    let pins = api_map.method_pins("Foo", "bar", Scope::Instance, Visibility::Public);
    assert_eq!(pins.len(), 2);
    assert_eq!(pins[0].location().unwrap().range.start, Position::new(3, 4));
}

#[test]
fn test_alias_resolution() {
    let api_map = mapped(
        "(class (const nil Foo) nil
  (begin
    (def original (args (arg value)) nil)
    (alias (sym copy) (sym original))
    (send nil alias_method (sym other) (sym original))))",
    );
    for name in ["copy", "other"] {
        let pins = api_map.method_pins("Foo", name, Scope::Instance, Visibility::Public);
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].kind(), PinKind::Method);
        assert_eq!(pins[0].path(), format!("Foo#{}", name));
        assert_eq!(pins[0].parameter_names(), vec!["value"]);
    }
}

#[test]
fn test_alias_cycle_yields_nothing() {
    let api_map = mapped(
        "(class (const nil Foo) nil
  (begin
    (alias (sym a) (sym b))
    (alias (sym b) (sym a))))",
    );
    assert!(api_map.method_pins("Foo", "a", Scope::Instance, Visibility::Public).is_empty());
    assert!(!api_map
        .get_methods("Foo", Scope::Instance, Visibility::Public)
        .iter()
        .any(|pin| pin.name() == "a"));
}

#[test]
fn test_super_method_pins() {
    let api_map = mapped(
        "(begin
  (class (const nil Sup) nil (def name (args) nil))
  (class (const nil Sub) (const nil Sup) (def name (args) nil)))",
    );
    assert_eq!(paths(&api_map.super_method_pins("Sub", "name", Scope::Instance)), vec!["Sup#name"]);
    assert!(api_map.super_method_pins("Sup", "name", Scope::Instance).is_empty());
}

#[test]
fn test_visible_constants() {
    let api_map = mapped(
        "(module (const nil Foo)
  (begin
    (class (const nil Bar) nil nil)
    (class (const nil Other) nil nil)))",
    );
    let names: Vec<String> = api_map
        .visible_constants("Foo::Other")
        .iter()
        .map(|pin| pin.name().to_string())
        .collect();
    assert!(names.contains(&String::from("Bar")));
    assert!(names.contains(&String::from("Foo")));
    assert!(names.contains(&String::from("String")));
    assert_eq!(names.iter().filter(|name| *name == "Other").count(), 1);

    let root: Vec<String> = api_map.get_constants("").iter().map(|pin| pin.path()).collect();
    assert!(root.contains(&String::from("Foo")));
    assert!(!root.contains(&String::from("Foo::Bar")));
}

#[test]
fn test_variable_pins() {
    let api_map = mapped(
        "(begin
  (gvasgn $count (int 0))
  (class (const nil Foo) nil
    (begin
      (cvasgn @@total (int 0))
      (def bar (args) (ivasgn @name (str \"x\")))
      (defs (self) baz (args) (ivasgn @cache (hash))))))",
    );
    let names = |pins: Vec<Arc<crate::pin::Pin>>| pins.iter().map(|pin| pin.name().to_string()).collect::<Vec<String>>();

    assert_eq!(names(api_map.instance_variable_pins("Foo", Scope::Instance)), vec!["@name"]);
    assert_eq!(names(api_map.instance_variable_pins("Foo", Scope::Class)), vec!["@cache"]);
    assert_eq!(names(api_map.class_variable_pins("Foo")), vec!["@@total"]);
    assert_eq!(names(api_map.global_variable_pins()), vec!["$count"]);
}

#[test]
fn test_clip_at_unknown_file() {
    let api_map = ApiMap::new();
    assert!(api_map.clip_at("missing.rb", Position::default()).is_err());
}
