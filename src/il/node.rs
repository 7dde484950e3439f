use std::fmt::{self, Display, Formatter};

use super::{Operand, Symbol};

/// The identity of a node: its index in the owning [`super::IrContext`]. Ordinals are handed
/// out in creation order and are unique within one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);
impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An instruction, linked to at most one predecessor and one successor.
#[derive(Debug, Clone)]
pub struct Node {
    pub(super) id: NodeId,
    pub(super) name: String,
    pub(super) parent: Option<NodeId>,
    pub(super) next: Option<NodeId>,
    pub(super) kind: NodeKind,
}
impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn as_operand(&self) -> Option<&Operand> {
        match &self.kind {
            NodeKind::Operand(operand) => Some(operand),
            _ => None,
        }
    }

    pub fn is_join(&self) -> bool {
        matches!(self.kind, NodeKind::Join(_))
    }
}
impl Display for Node {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} {}: {}", self.id, self.name, self.kind)
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// An addressable position that branches may target.
    Label(LabelNode),
    Branch(Branch),
    /// A point where several control-flow paths merge.
    Join(Join),
    Return(Option<NodeId>),
    /// An instruction that yields a typed value.
    Operand(Operand),
}
impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Label(LabelNode { symbol: Some(symbol) }) => write!(f, "{}:", symbol),
            Self::Label(LabelNode { symbol: None }) => f.write_str("label"),
            Self::Branch(branch) => branch.fmt(f),
            Self::Join(join) => {
                let edges = join
                    .predecessors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "join [{}]", edges)
            }
            Self::Return(None) => f.write_str("return"),
            Self::Return(Some(value)) => write!(f, "return {}", value),
            Self::Operand(operand) => operand.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabelNode {
    /// Assigned by a backend pass.
    pub symbol: Option<Symbol>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    /// Jump unconditionally.
    Goto,
    /// Jump if the condition is true, fall through otherwise.
    IfTrue(NodeId),
    /// Jump if the condition is false, fall through otherwise.
    IfFalse(NodeId),
}

/// A control-flow split. Conditional branches fall through to their successor when not taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branch {
    pub kind: BranchKind,
    /// The label or join jumped to.
    pub target: NodeId,
}
impl Branch {
    pub fn condition(&self) -> Option<NodeId> {
        match self.kind {
            BranchKind::Goto => None,
            BranchKind::IfTrue(cond) | BranchKind::IfFalse(cond) => Some(cond),
        }
    }

    pub fn is_conditional(&self) -> bool {
        self.kind != BranchKind::Goto
    }
}
impl Display for Branch {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.kind {
            BranchKind::Goto => write!(f, "goto {}", self.target),
            BranchKind::IfTrue(cond) => write!(f, "if_true {} goto {}", cond, self.target),
            BranchKind::IfFalse(cond) => write!(f, "if_false {} goto {}", cond, self.target),
        }
    }
}

/// A merge point. The chain reaches a join through a single link, so the incoming edges are
/// recorded explicitly: every branch targeting the join, plus the node falling through into
/// it. The context keeps the fall-through edge current as nodes are spliced in front of the
/// join or detached from it. Edges from branches stay until removed by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Join {
    pub predecessors: Vec<NodeId>,
}
