//! Documentation tag records.
//!
//! Tags normally arrive already extracted. `Docstring::parse` is a thin
//! adapter for plain comment text in the usual `@tag name [Types]` form.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::complex_type::ComplexType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Param,
    Return,
    Type,
    YieldSelf,
    YieldPublic,
    /// A reference to a named macro (`@macro name`).
    Macro,
    /// A macro definition (`@!macro name` followed by indented tags).
    MacroDirective,
}

impl TagKind {
    fn from_name(name: &str, directive: bool) -> Option<Self> {
        match (name, directive) {
            ("param", false) => Some(TagKind::Param),
            ("return", false) => Some(TagKind::Return),
            ("type", false) => Some(TagKind::Type),
            ("yieldself", false) => Some(TagKind::YieldSelf),
            ("yieldpublic", false) => Some(TagKind::YieldPublic),
            ("macro", false) => Some(TagKind::Macro),
            ("macro", true) => Some(TagKind::MacroDirective),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub kind: TagKind,
    pub name: Option<String>,
    pub types: Vec<String>,
    pub nested: Vec<Tag>,
}

impl Tag {
    pub fn new(kind: TagKind, name: Option<&str>, types: &[&str]) -> Self {
        Tag {
            kind,
            name: name.map(String::from),
            types: types.iter().map(|t| t.to_string()).collect(),
            nested: vec![],
        }
    }

    pub fn param(name: &str, types: &[&str]) -> Self {
        Tag::new(TagKind::Param, Some(name), types)
    }

    pub fn returns(types: &[&str]) -> Self {
        Tag::new(TagKind::Return, None, types)
    }

    pub fn declared_type(&self) -> ComplexType {
        ComplexType::try_parse(&self.types)
    }
}

lazy_static! {
    static ref TAG_LINE: Regex = Regex::new(r"^(\s*)@(!?)([a-z_]+)\s*(.*)$").unwrap();
    static ref TYPES: Regex = Regex::new(r"\[([^\]]*)\]").unwrap();
    static ref WORD: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap();
}

/// Splits a type list on commas that are not nested inside `<>` or `{}`.
fn split_types(list: &str) -> Vec<String> {
    let mut result = vec![];
    let mut depth = 0i32;
    let mut current = String::new();
    let mut previous = ' ';
    for c in list.chars() {
        match c {
            '<' | '{' => depth += 1,
            '>' if previous == '=' => {}
            '>' | '}' => depth -= 1,
            ',' if depth == 0 => {
                result.push(current.trim().to_string());
                current.clear();
                previous = c;
                continue;
            }
            _ => {}
        }
        current.push(c);
        previous = c;
    }
    if !current.trim().is_empty() {
        result.push(current.trim().to_string());
    }
    result
}

fn parse_tag(kind: TagKind, rest: &str) -> Tag {
    let types = TYPES
        .captures(rest)
        .map(|captures| split_types(&captures[1]))
        .unwrap_or_default();
    let without_types = TYPES.replace(rest, "");
    let name = match kind {
        TagKind::Param | TagKind::Macro | TagKind::MacroDirective => WORD
            .find(without_types.trim_start())
            .map(|m| m.as_str().to_string()),
        _ => None,
    };

    Tag {
        kind,
        name,
        types,
        nested: vec![],
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Docstring {
    tags: Vec<Tag>,
}

impl Docstring {
    pub fn new(tags: Vec<Tag>) -> Self {
        Docstring { tags }
    }

    /// Extracts tags from comment text. Lines that are not tags are ignored;
    /// indented tag lines after `@!macro` belong to that macro.
    pub fn parse(text: &str) -> Self {
        let mut tags: Vec<Tag> = vec![];
        let mut in_directive = false;

        for line in text.lines() {
            let Some(captures) = TAG_LINE.captures(line) else {
                in_directive = false;
                continue;
            };
            let indented = !captures[1].is_empty();
            let Some(kind) = TagKind::from_name(&captures[3], !captures[2].is_empty()) else {
                continue;
            };
            let tag = parse_tag(kind, &captures[4]);

            if in_directive && indented {
                if let Some(directive) = tags.last_mut() {
                    directive.nested.push(tag);
                    continue;
                }
            }
            in_directive = kind == TagKind::MacroDirective;
            tags.push(tag);
        }

        Docstring { tags }
    }

    pub fn all(&self) -> &[Tag] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self, kind: TagKind) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(move |tag| tag.kind == kind)
    }

    pub fn tag(&self, kind: TagKind) -> Option<&Tag> {
        self.tags(kind).next()
    }

    pub fn param(&self, name: &str) -> Option<&Tag> {
        self.tags(TagKind::Param)
            .find(|tag| tag.name.as_deref() == Some(name))
    }

    /// Macro definitions declared in this docstring, by name.
    pub fn macro_definitions(&self) -> HashMap<String, Vec<Tag>> {
        self.tags(TagKind::MacroDirective)
            .filter_map(|tag| Some((tag.name.clone()?, tag.nested.clone())))
            .collect()
    }

    /// Appends the tags of every referenced macro found in `definitions`.
    pub fn expand_macros(&self, definitions: &HashMap<String, Vec<Tag>>) -> Docstring {
        let mut tags = self.tags.clone();
        for reference in self.tags(TagKind::Macro) {
            if let Some(expansion) = reference
                .name
                .as_ref()
                .and_then(|name| definitions.get(name))
            {
                tags.extend(expansion.iter().cloned());
            }
        }
        Docstring { tags }
    }
}
