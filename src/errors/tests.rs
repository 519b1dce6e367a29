//! Unit tests for error handling.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Position;

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: ")".to_string(),
        },
        Position::new(3, 4),
    );

    assert_eq!(error.get_error_name(), "UnexpectedToken");
    assert_eq!(*error.get_position(), Position::new(3, 4));
}

#[test]
fn test_unknown_source_error() {
    let error = Error::new(
        ErrorImpl::UnknownSource {
            filename: "missing.rb".to_string(),
        },
        Position::default(),
    );

    assert_eq!(error.get_error_name(), "UnknownSource");
    assert_eq!(
        error.get_tip().to_string(),
        "Map `missing.rb` into the index before checking it"
    );
}

#[test]
fn test_unbalanced_parens_error() {
    let error = Error::new(ErrorImpl::UnbalancedParens { open: 2 }, Position::new(0, 9));

    assert_eq!(error.get_error_name(), "UnbalancedParens");
    assert_eq!(error.to_string(), "unbalanced parentheses: 2 left open at 0:9");
}

#[test]
fn test_invalid_level_error() {
    let error = Error::new(
        ErrorImpl::InvalidCheckLevel {
            level: "pedantic".to_string(),
        },
        Position::default(),
    );

    assert_eq!(error.get_error_name(), "InvalidCheckLevel");
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(ErrorImpl::EmptyTree, Position::default());

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}
