//! Builds chains from syntax tree nodes.

use crate::tree::{Child, Node};

use super::{
    chain::Chain,
    link::{Link, VariableKind, UNDEFINED_WORD},
};

const ASSIGNMENTS: &[&str] = &["lvasgn", "ivasgn", "cvasgn", "gvasgn", "casgn"];

/// The chain for the expression rooted at `node`.
pub fn chain(node: &Node) -> Chain {
    Chain::new(links(node))
}

/// Chains for each argument of a call node, block passes included.
pub fn arguments(node: &Node) -> Vec<Chain> {
    node.children
        .iter()
        .skip(2)
        .filter_map(Child::as_node)
        .map(chain)
        .collect()
}

fn literal(tag: &str) -> Vec<Link> {
    vec![Link::literal(tag)]
}

fn links(node: &Node) -> Vec<Link> {
    match node.kind.as_str() {
        "send" | "csend" => {
            let name = node.token_at(1).unwrap_or(UNDEFINED_WORD);
            let call = Link::call_with(name, arguments(node));
            let mut result = match node.node_at(0) {
                Some(receiver) => links(receiver),
                None => vec![],
            };
            result.push(call);
            result
        }
        "block" => {
            let mut result = match node.node_at(0) {
                Some(call) => links(call),
                None => vec![Link::Undefined],
            };
            if let Some(Link::Call { with_block, .. }) = result.last_mut() {
                *with_block = true;
            }
            result
        }
        "const" => {
            let name = match node.token_at(1) {
                Some("") | None => UNDEFINED_WORD,
                Some(name) => name,
            };
            match node.node_at(0) {
                None => vec![Link::constant(name)],
                Some(scope) if scope.is("cbase") => vec![Link::Constant(format!("::{}", name))],
                Some(scope) => {
                    let mut result = links(scope);
                    result.push(Link::constant(name));
                    result
                }
            }
        }
        "lvar" | "ivar" | "cvar" | "gvar" => match (VariableKind::from_node_kind(&node.kind), node.token_at(0)) {
            (Some(kind), Some(name)) => vec![Link::variable(kind, name)],
            _ => vec![Link::Undefined],
        },
        kind if ASSIGNMENTS.contains(&kind) => {
            let value = if kind == "casgn" { node.node_at(2) } else { node.node_at(1) };
            match value {
                Some(value) => links(value),
                None => vec![Link::Undefined],
            }
        }
        "or_asgn" | "and_asgn" => match (node.node_at(0), node.node_at(1)) {
            (Some(target), Some(value)) => vec![Link::Union(vec![target_chain(target), chain(value)])],
            _ => vec![Link::Undefined],
        },
        "self" => vec![Link::SelfRef],
        "zsuper" => vec![Link::ZSuper],
        "super" => vec![Link::Super(node.child_nodes().map(chain).collect())],
        "block_pass" => vec![Link::BlockPass],
        "str" | "dstr" | "xstr" => literal("String"),
        "int" => literal("Integer"),
        "float" => literal("Float"),
        "sym" | "dsym" => literal("Symbol"),
        "true" | "false" => literal("Boolean"),
        "nil" => literal("nil"),
        "regexp" => literal("Regexp"),
        "array" => vec![Link::Array(node.child_nodes().map(chain).collect())],
        "hash" => vec![Link::Hash],
        "begin" | "kwbegin" => match node.child_nodes().last() {
            Some(last) => links(last),
            None => literal("nil"),
        },
        "if" | "case" | "return" => {
            let branches: Vec<Chain> = returns_from(node).into_iter().map(chain).collect();
            if branches.is_empty() {
                vec![Link::Undefined]
            } else {
                vec![Link::Union(branches)]
            }
        }
        "def" | "defs" => literal("Symbol"),
        _ => vec![Link::Undefined],
    }
}

/// `@foo ||= x` reads `@foo` before assigning it.
fn target_chain(target: &Node) -> Chain {
    match (VariableKind::from_node_kind(&target.kind), target.token_at(0)) {
        (Some(kind), Some(name)) => Chain::new(vec![Link::variable(kind, name)]),
        _ => Chain::undefined(),
    }
}

/// The nodes whose values can become the value of `node`: the last
/// expression of a sequence and every branch of a conditional, plus
/// explicit `return`s. Nested scopes are not entered.
pub fn returns_from(node: &Node) -> Vec<&Node> {
    let mut result = vec![];
    collect_returns(node, &mut result);
    collect_explicit_returns(node, &mut result);
    result.dedup_by(|a, b| std::ptr::eq(*a, *b));
    result
}

fn collect_returns<'a>(node: &'a Node, result: &mut Vec<&'a Node>) {
    match node.kind.as_str() {
        "begin" | "kwbegin" => {
            if let Some(last) = node.child_nodes().last() {
                collect_returns(last, result);
            }
        }
        "if" => {
            for branch in node.children.iter().skip(1).filter_map(Child::as_node) {
                collect_returns(branch, result);
            }
        }
        "case" => {
            for branch in node.children.iter().skip(1).filter_map(Child::as_node) {
                if branch.is("when") {
                    if let Some(body) = branch.children.last().and_then(Child::as_node) {
                        if branch.children.len() > 1 {
                            collect_returns(body, result);
                        }
                    }
                } else {
                    collect_returns(branch, result);
                }
            }
        }
        "return" => {
            if let Some(value) = node.node_at(0) {
                collect_returns(value, result);
            }
        }
        _ => result.push(node),
    }
}

fn collect_explicit_returns<'a>(node: &'a Node, result: &mut Vec<&'a Node>) {
    for child in node.child_nodes() {
        match child.kind.as_str() {
            "def" | "defs" | "class" | "module" | "sclass" | "block" => {}
            "return" => {
                if let Some(value) = child.node_at(0) {
                    if !result.iter().any(|known| std::ptr::eq(*known, value)) {
                        collect_returns(value, result);
                    }
                }
            }
            _ => collect_explicit_returns(child, result),
        }
    }
}
