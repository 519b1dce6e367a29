use std::sync::Arc;

use tracing::debug;

use crate::{
    pin::{Pin, PinKind},
    tree::{Comment, Node, Source},
    Position,
};

use super::mapper;

/// The pins one source declares, and the lexical queries over them.
#[derive(Debug, Clone)]
pub struct SourceMap {
    source: Source,
    pins: Vec<Arc<Pin>>,
    locals: Vec<Arc<Pin>>,
}

impl SourceMap {
    pub fn map(source: Source) -> Self {
        let (pins, locals) = mapper::map(&source);
        debug!(
            target: "source_map",
            filename = source.filename.as_str(),
            pins = pins.len(),
            locals = locals.len(),
            "mapped source"
        );
        SourceMap {
            source,
            pins: pins.into_iter().map(Arc::new).collect(),
            locals: locals.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.source.filename
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn node(&self) -> Option<&Node> {
        self.source.node.as_ref()
    }

    /// Every pin except local variables and parameters.
    pub fn pins(&self) -> &[Arc<Pin>] {
        &self.pins
    }

    /// Local variables and parameters.
    pub fn locals(&self) -> &[Arc<Pin>] {
        &self.locals
    }

    pub fn comment_at(&self, position: Position) -> Option<&Comment> {
        self.source.comment_at(position)
    }

    /// The innermost pin of one of `kinds` whose location contains `position`.
    fn innermost(&self, position: Position, kinds: &[PinKind]) -> Option<Arc<Pin>> {
        self.pins
            .iter()
            .filter(|pin| kinds.contains(&pin.kind()))
            .filter(|pin| pin.location().map(|location| location.range.contains(position)).unwrap_or(false))
            .max_by_key(|pin| {
                let range = pin.location().map(|location| location.range).unwrap_or_default();
                (range.start, std::cmp::Reverse(range.end))
            })
            .cloned()
    }

    /// The namespace, method or block enclosing `position`, or the root
    /// namespace.
    pub fn locate_closure_pin(&self, position: Position) -> Arc<Pin> {
        self.innermost(position, &[PinKind::Namespace, PinKind::Method, PinKind::Block])
            .unwrap_or_else(|| Arc::new(Pin::root()))
    }

    /// Like `locate_closure_pin`, skipping blocks.
    pub fn locate_named_closure(&self, position: Position) -> Arc<Pin> {
        self.innermost(position, &[PinKind::Namespace, PinKind::Method])
            .unwrap_or_else(|| Arc::new(Pin::root()))
    }

    /// Locals visible at `position`: declared earlier in the same hard
    /// scope and not inside a block that has already closed.
    pub fn locals_at(&self, position: Position) -> Vec<Arc<Pin>> {
        let closure = self.locate_named_closure(position).path();
        self.locals
            .iter()
            .filter(|pin| pin.closure() == closure)
            .filter(|pin| pin.presence().map(|presence| presence.contains(position)).unwrap_or(false))
            .cloned()
            .collect()
    }
}
