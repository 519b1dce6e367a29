use crate::{Position, Range};

/// One child slot of a node: a nested node, a bare token such as a name
/// or literal value, or an empty slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Node(Node),
    Token(String),
    Nil,
}

impl Child {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&str> {
        match self {
            Child::Token(token) => Some(token),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: String,
    pub children: Vec<Child>,
    pub range: Range,
}

impl Node {
    pub fn new(kind: &str, children: Vec<Child>, range: Range) -> Self {
        Node {
            kind: kind.to_string(),
            children,
            range,
        }
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn child(&self, index: usize) -> Option<&Child> {
        self.children.get(index)
    }

    pub fn node_at(&self, index: usize) -> Option<&Node> {
        self.children.get(index).and_then(Child::as_node)
    }

    pub fn token_at(&self, index: usize) -> Option<&str> {
        self.children.get(index).and_then(Child::as_token)
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(Child::as_node)
    }

    /// Nodes from this one down to the innermost node containing `position`.
    ///
    /// Empty if `position` is outside this node.
    pub fn path_to(&self, position: Position) -> Vec<&Node> {
        let mut path = vec![];
        if !self.range.contains(position) {
            return path;
        }

        let mut current = self;
        path.push(current);
        while let Some(next) = current.child_nodes().find(|c| c.range.contains(position)) {
            path.push(next);
            current = next;
        }
        path
    }
}
