use crate::{Position, Range};

use super::node::Node;

/// A comment as it appears in the source, with its raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub range: Range,
    pub text: String,
}

impl Comment {
    pub fn new(range: Range, text: &str) -> Self {
        Comment {
            range,
            text: text.to_string(),
        }
    }
}

/// A parsed source unit handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub filename: String,
    pub node: Option<Node>,
    pub comments: Vec<Comment>,
}

impl Source {
    pub fn new(filename: &str, node: Option<Node>, comments: Vec<Comment>) -> Self {
        Source {
            filename: filename.to_string(),
            node,
            comments,
        }
    }

    pub fn comment_at(&self, position: Position) -> Option<&Comment> {
        self.comments.iter().find(|c| c.range.contains(position))
    }
}
