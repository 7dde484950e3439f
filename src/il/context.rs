use std::{collections::HashSet, fmt::Write};

use crate::{prelude::*, types::TypeId};

use super::{Node, NodeId, NodeKind, Operand};

/// Owns every node created during one compilation. Node identity is an index into the
/// context, so separate compilations never interfere with each other.
///
/// Ids are only meaningful for the context that handed them out. Looking up an id this context
/// does not know fails with [`IrError::UnknownNode`].
#[derive(Debug, Default)]
pub struct IrContext {
    nodes: Vec<Node>,
}

impl IrContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with the next ordinal. If `parent` is given, the node is spliced in
    /// directly after it.
    pub fn create<S: Into<String>>(
        &mut self,
        name: S,
        kind: NodeKind,
        parent: Option<NodeId>,
    ) -> IrResult<NodeId> {
        if let Some(parent) = parent {
            self.node(parent)?;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            name: name.into(),
            parent: None,
            next: None,
            kind,
        });
        if let Some(parent) = parent {
            self.insert_after(parent, id)?;
        }
        Ok(id)
    }

    /// Create a node linked between `parent` and `next`. Whatever previously followed
    /// `parent`, or preceded `next`, is unlinked from them.
    pub fn create_between<S: Into<String>>(
        &mut self,
        name: S,
        kind: NodeKind,
        parent: NodeId,
        next: NodeId,
    ) -> IrResult<NodeId> {
        self.node(next)?;
        let id = self.create(name, kind, Some(parent))?;
        self.link(id, next)?;
        Ok(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> IrResult<&Node> {
        self.nodes.get(id.0).ok_or(IrError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> IrResult<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(IrError::UnknownNode(id))
    }

    pub fn kind(&self, id: NodeId) -> IrResult<&NodeKind> {
        self.node(id).map(Node::kind)
    }

    pub fn kind_mut(&mut self, id: NodeId) -> IrResult<&mut NodeKind> {
        self.node_mut(id).map(|node| &mut node.kind)
    }

    /// The successor of `id`. Unknown ids have none.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(Node::next)
    }

    /// The predecessor of `id`. Unknown ids have none.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(Node::parent)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn operand(&self, id: NodeId) -> IrResult<&Operand> {
        self.node(id)?
            .as_operand()
            .ok_or(IrError::NotAnOperand(id))
    }

    pub fn operand_mut(&mut self, id: NodeId) -> IrResult<&mut Operand> {
        match self.kind_mut(id)? {
            NodeKind::Operand(operand) => Ok(operand),
            _ => Err(IrError::NotAnOperand(id)),
        }
    }

    pub fn type_of(&self, id: NodeId) -> IrResult<TypeId> {
        self.operand(id).map(|operand| operand.ty)
    }

    pub fn num_operands(&self, id: NodeId) -> IrResult<usize> {
        self.operand(id).map(Operand::num_operands)
    }

    /// The `index`-th node consumed by operand `id`.
    pub fn get_operand(&self, id: NodeId, index: usize) -> IrResult<NodeId> {
        let operands = self.operand(id)?.operands();
        operands
            .get(index)
            .copied()
            .ok_or(IrError::OperandIndex {
                node: id,
                index,
                arity: operands.len(),
            })
    }

    /// Splice `node` in directly after `anchor`. `node` is first unlinked from wherever it
    /// currently is.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> IrResult<()> {
        self.node(anchor)?;
        self.node(node)?;
        if anchor == node {
            return Ok(());
        }
        self.detach(node)?;
        let old_next = self.next(anchor);
        self.link(anchor, node)?;
        if let Some(old_next) = old_next {
            self.link(node, old_next)?;
        }
        Ok(())
    }

    /// Splice `node` in directly before `anchor`. `node` is first unlinked from wherever it
    /// currently is.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> IrResult<()> {
        self.node(anchor)?;
        self.node(node)?;
        if anchor == node {
            return Ok(());
        }
        self.detach(node)?;
        if let Some(old_parent) = self.parent(anchor) {
            self.link(old_parent, node)?;
        }
        self.link(node, anchor)
    }

    /// Unlink a node, joining its former neighbours to each other.
    pub fn detach(&mut self, node: NodeId) -> IrResult<()> {
        let parent = self.node_mut(node)?.parent.take();
        let next = self.next(node);
        self.set_next(node, None);
        match (parent, next) {
            (Some(parent), Some(next)) if parent == node || next == node => {
                // A node that links to itself forms a ring of one.
                self.set_next(parent, None);
                self.nodes[next.0].parent = None;
            }
            (Some(parent), Some(next)) => self.link(parent, next)?,
            (Some(parent), None) => self.set_next(parent, None),
            (None, Some(next)) => self.nodes[next.0].parent = None,
            (None, None) => (),
        }
        Ok(())
    }

    /// Make `b` the successor of `a`, clearing the stale links on both sides.
    pub fn link(&mut self, a: NodeId, b: NodeId) -> IrResult<()> {
        self.node(a)?;
        self.node(b)?;
        if let Some(old_next) = self.nodes[a.0].next {
            if old_next != b {
                self.nodes[old_next.0].parent = None;
            }
        }
        if let Some(old_parent) = self.nodes[b.0].parent {
            if old_parent != a {
                self.set_next(old_parent, None);
            }
        }
        self.set_next(a, Some(b));
        self.nodes[b.0].parent = Some(a);
        Ok(())
    }

    /// Replace the successor link of a known node. A join's fall-through edge follows its
    /// physical predecessor: it is recorded when a node that can fall through is linked in
    /// front of the join, and forgotten when that link is broken.
    fn set_next(&mut self, a: NodeId, next: Option<NodeId>) {
        let old = self.nodes[a.0].next;
        if old == next {
            return;
        }
        if let Some(old) = old {
            self.forget_fall_through(a, old);
        }
        self.nodes[a.0].next = next;
        if let Some(next) = next {
            self.record_fall_through(a, next);
        }
    }

    fn falls_through(&self, id: NodeId) -> bool {
        match &self.nodes[id.0].kind {
            NodeKind::Branch(branch) => branch.is_conditional(),
            NodeKind::Return(_) => false,
            _ => true,
        }
    }

    fn record_fall_through(&mut self, from: NodeId, join: NodeId) {
        if !self.falls_through(from) {
            return;
        }
        if let NodeKind::Join(join_node) = &mut self.nodes[join.0].kind {
            if !join_node.predecessors.contains(&from) {
                trace!("{} falls through into {}", from, join);
                join_node.predecessors.push(from);
            }
        }
    }

    fn forget_fall_through(&mut self, from: NodeId, join: NodeId) {
        let targets_join = match &self.nodes[from.0].kind {
            NodeKind::Branch(branch) => branch.target == join,
            _ => false,
        };
        if targets_join || !self.falls_through(from) {
            return;
        }
        if let NodeKind::Join(join_node) = &mut self.nodes[join.0].kind {
            join_node.predecessors.retain(|edge| *edge != from);
        }
    }

    /// Iterate over the chain starting at `start`, following successor links. Stops before
    /// a node is visited a second time.
    pub fn chain(&self, start: NodeId) -> Chain {
        Chain {
            context: self,
            current: Some(start),
            seen: HashSet::new(),
        }
    }

    /// Render the chain starting at `start`, one node per line. Stops at the first join, so a
    /// continuation shared by several branches is not printed once per branch.
    pub fn dump(&self, start: NodeId, prefix: &str) -> String {
        let mut out = String::new();
        let mut seen = HashSet::new();
        let mut current = Some(start);

        while let Some(node) = current.and_then(|id| self.nodes.get(id.0)) {
            if !seen.insert(node.id) {
                break;
            }
            debug!("{}{}", prefix, node);
            // Writing to a string cannot fail.
            let _ = writeln!(out, "{}{}", prefix, node);

            current = node.next.filter(|next| !self.nodes[next.0].is_join());
        }
        out
    }
}

pub struct Chain<'c> {
    context: &'c IrContext,
    current: Option<NodeId>,
    seen: HashSet<NodeId>,
}
impl<'c> Iterator for Chain<'c> {
    type Item = &'c Node;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current.filter(|id| self.seen.insert(*id))?;
        let node = self.context.nodes.get(id.0)?;
        self.current = node.next;
        Some(node)
    }
}
