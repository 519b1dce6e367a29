use crate::{
    complex_type::{ComplexType, Scope},
    pin::{
        Common, Docstring, Method, MethodAlias, Parameter, ParameterKind, Pin, PinKind, Tag,
        TagKind, Visibility,
    },
};

fn method(name: &str, context: &str, scope: Scope, parameters: &[&str]) -> Pin {
    Pin::Method(Method {
        common: Common::new(name, None, "Foo", "Foo").with_context(ComplexType::parse(context)),
        scope,
        visibility: Visibility::Public,
        parameters: parameters
            .iter()
            .enumerate()
            .map(|(index, declaration)| Parameter::declared(declaration, index))
            .collect(),
        node: None,
    })
}

#[test]
fn test_method_paths() {
    let instance = method("bar", "Foo", Scope::Instance, &[]);
    assert_eq!(instance.path(), "Foo#bar");
    assert_eq!(instance.kind(), PinKind::Method);

    let singleton = method("baz", "Class<Foo>", Scope::Class, &[]);
    assert_eq!(singleton.path(), "Foo.baz");
}

#[test]
fn test_alias_path_uses_alias_name() {
    let alias = Pin::MethodAlias(MethodAlias {
        common: Common::new("other", None, "Foo", "Foo").with_context(ComplexType::parse("Foo")),
        scope: Scope::Instance,
        original: String::from("bar"),
    });
    assert_eq!(alias.path(), "Foo#other");
    assert_eq!(alias.visibility(), Visibility::Public);
}

#[test]
fn test_root_pin() {
    let root = Pin::root();
    assert_eq!(root.path(), "");
    assert_eq!(root.context().namespace(), "Object");
    assert!(root.context().is_rooted());
}

#[test]
fn test_parameter_kinds_from_declarations() {
    assert_eq!(ParameterKind::from_declaration("a"), ParameterKind::Required);
    assert_eq!(ParameterKind::from_declaration("b = 1"), ParameterKind::Optional);
    assert_eq!(ParameterKind::from_declaration("*rest"), ParameterKind::Rest);
    assert_eq!(ParameterKind::from_declaration("key:"), ParameterKind::Keyword);
    assert_eq!(ParameterKind::from_declaration("key: 1"), ParameterKind::KeywordOptional);
    assert_eq!(ParameterKind::from_declaration("**opts"), ParameterKind::KeywordRest);
    assert_eq!(ParameterKind::from_declaration("&block"), ParameterKind::Block);
}

#[test]
fn test_parameter_rendering() {
    let pin = method("bar", "Foo", Scope::Instance, &["a", "b = 1", "*c", "d:", "e: 2", "**f", "&g"]);
    assert_eq!(pin.parameter_names(), vec!["a", "b", "c", "d", "e", "f", "g"]);
    assert_eq!(pin.to_string(), "Foo#bar(a, b = 1, *c, d:, e: 2, **f, &g)");
}

#[test]
fn test_visibility_order() {
    assert!(Visibility::Public < Visibility::Protected);
    assert!(Visibility::Protected < Visibility::Private);
    assert_eq!(Visibility::from_name("protected"), Some(Visibility::Protected));
    assert_eq!(Visibility::from_name("module_function"), None);
}

#[test]
fn test_docstring_tags() {
    let docstring = Docstring::parse(
        "Does things.\n@param name [String] the name\n@param opts [Hash{Symbol => Integer}, nil]\n@return [Array<String, Integer>]",
    );

    let name = docstring.param("name").unwrap();
    assert_eq!(name.types, vec!["String"]);
    assert_eq!(
        docstring.param("opts").unwrap().types,
        vec!["Hash{Symbol => Integer}", "nil"]
    );

    let returns = docstring.tag(TagKind::Return).unwrap();
    assert_eq!(returns.types, vec!["Array<String, Integer>"]);
    assert_eq!(returns.declared_type().to_string(), "Array<String, Integer>");
}

#[test]
fn test_docstring_type_without_brackets() {
    let docstring = Docstring::parse("@type String");
    let tag = docstring.tag(TagKind::Type).unwrap();
    assert!(tag.types.is_empty());
    assert!(tag.declared_type().is_undefined());
}

#[test]
fn test_macro_definitions_and_expansion() {
    let definitions = Docstring::parse("@!macro firstarg\n  @return [$1]").macro_definitions();
    assert_eq!(definitions["firstarg"], vec![Tag::returns(&["$1"])]);

    let reference = Docstring::parse("@macro firstarg");
    assert!(reference.tag(TagKind::Macro).is_some());
    let expanded = reference.expand_macros(&definitions);
    assert_eq!(expanded.tag(TagKind::Return).unwrap().types, vec!["$1"]);
}

#[test]
fn test_yield_tags() {
    let docstring = Docstring::parse("@yieldself [Par]\n@yieldpublic [Other]");
    assert_eq!(docstring.tag(TagKind::YieldSelf).unwrap().types, vec!["Par"]);
    assert_eq!(docstring.tag(TagKind::YieldPublic).unwrap().types, vec!["Other"]);
}
