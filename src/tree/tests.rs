//! Unit tests for the tree reader.

use crate::{errors::errors::ErrorImpl, Position, Range};

use super::{read, Child, MAX_NESTING};

#[test]
fn test_read_nested_nodes_with_ranges() {
    let text = "(begin\n  (lvasgn x (str \"123\"))\n  (lvar x))";
    let source = read("test.rb", text).unwrap();
    let root = source.node.unwrap();

    assert_eq!(root.kind, "begin");
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.range.start, Position::new(0, 0));
    assert_eq!(root.range.end, Position::new(2, 11));

    let assignment = root.node_at(0).unwrap();
    assert_eq!(assignment.kind, "lvasgn");
    assert_eq!(assignment.range.start, Position::new(1, 2));
    assert_eq!(assignment.token_at(0), Some("x"));
    assert_eq!(assignment.node_at(1).unwrap().token_at(0), Some("123"));

    let reference = root.node_at(1).unwrap();
    assert_eq!(reference.range, Range::from_to(2, 2, 2, 10));
}

#[test]
fn test_read_nil_children() {
    let source = read("test.rb", "(send nil puts)").unwrap();
    let node = source.node.unwrap();
    assert_eq!(node.children, vec![Child::Nil, Child::Token("puts".to_string())]);
}

#[test]
fn test_read_escaped_and_empty_strings() {
    let source = read("test.rb", r#"(send (lvar foo) "" (str "a\"b"))"#).unwrap();
    let node = source.node.unwrap();
    assert_eq!(node.token_at(1), Some(""));
    assert_eq!(node.node_at(2).unwrap().token_at(0), Some("a\"b"));
}

#[test]
fn test_path_to_position() {
    let text = "(begin\n  (lvasgn x (str \"123\"))\n  (lvar x))";
    let root = read("test.rb", text).unwrap().node.unwrap();

    let kinds: Vec<&str> = root
        .path_to(Position::new(1, 13))
        .iter()
        .map(|n| n.kind.as_str())
        .collect();
    assert_eq!(kinds, vec!["begin", "lvasgn", "str"]);

    assert!(root.path_to(Position::new(5, 0)).is_empty());
}

#[test]
fn test_read_collects_comment_blocks() {
    let text = "(begin\n  ; @return [Hash]\n  ; second\n  (def foo (args) (hash)))";
    let source = read("test.rb", text).unwrap();

    assert_eq!(source.comments.len(), 1);
    let comment = &source.comments[0];
    assert_eq!(comment.text, "@return [Hash]\nsecond");
    assert_eq!(comment.range.start, Position::new(1, 2));
    assert_eq!(comment.range.end.line, 2);
    assert!(source.comment_at(Position::new(1, 6)).is_some());
    assert!(source.comment_at(Position::new(3, 4)).is_none());
}

#[test]
fn test_multiple_roots_are_wrapped() {
    let source = read("test.rb", "(int 1)\n(int 2)").unwrap();
    let root = source.node.unwrap();
    assert_eq!(root.kind, "begin");
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.range, Range::from_to(0, 0, 1, 7));
}

#[test]
fn test_read_errors() {
    let unbalanced = read("test.rb", "(begin (lvar x)").unwrap_err();
    assert_eq!(
        *unbalanced.get_internal_error(),
        ErrorImpl::UnbalancedParens { open: 1 }
    );

    let kindless = read("test.rb", "(\"x\")").unwrap_err();
    assert_eq!(kindless.get_error_name(), "UnexpectedToken");

    let empty = read("test.rb", "  ; just a comment\n").unwrap_err();
    assert_eq!(*empty.get_internal_error(), ErrorImpl::EmptyTree);

    let unterminated = read("test.rb", "(str \"abc)").unwrap_err();
    assert_eq!(*unterminated.get_internal_error(), ErrorImpl::UnterminatedString);

    let stray = read("test.rb", ")").unwrap_err();
    assert_eq!(stray.get_error_name(), "UnexpectedToken");
}

#[test]
fn test_read_limits_nesting() {
    let nested = |depth: usize| format!("{}{}", "(begin ".repeat(depth), ")".repeat(depth));

    assert!(read("test.rb", &nested(MAX_NESTING)).is_ok());

    let error = read("test.rb", &nested(MAX_NESTING + 1)).unwrap_err();
    assert_eq!(
        *error.get_internal_error(),
        ErrorImpl::NestingTooDeep { limit: MAX_NESTING }
    );
    assert_eq!(error.get_position().line, 0);
}
