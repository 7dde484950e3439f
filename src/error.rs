use thiserror::Error;

use crate::{il::NodeId, types::TypeError};

pub type IrResult<T> = Result<T, IrError>;

/// A structural or internal-consistency error raised while building or traversing the IR.
/// None of these are user diagnostics: they abort lowering of the current compilation unit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IrError {
    #[error("call {call} passes {found} argument(s), but its signature declares {expected}")]
    ArgumentCount {
        call: String,
        expected: usize,
        found: usize,
    },
    #[error("argument {index} of call {call} has type '{found}', which does not conform to '{expected}'")]
    NonConformantArgument {
        call: String,
        index: usize,
        expected: String,
        found: String,
    },
    #[error("node {node} is not supported by {context}")]
    UnsupportedKind { node: NodeId, context: &'static str },
    #[error("type '{ty}' cannot be used as {context}")]
    UnsupportedType { ty: String, context: &'static str },
    #[error("operand index {index} is out of range for node {node} with {arity} operand(s)")]
    OperandIndex {
        node: NodeId,
        index: usize,
        arity: usize,
    },
    #[error("node {node} has an unresolved type")]
    UnresolvedType { node: NodeId },
    #[error("phi at join {join} has {found} incoming value(s), but the join has {expected} incoming edge(s)")]
    PhiArity {
        join: NodeId,
        expected: usize,
        found: usize,
    },
    #[error("node {0} is not a join")]
    NotAJoin(NodeId),
    #[error("node {0} is not a label")]
    NotALabel(NodeId),
    #[error("node {0} does not produce a value")]
    NotAnOperand(NodeId),
    #[error("node {0} does not belong to this context")]
    UnknownNode(NodeId),
    #[error("node {node} was visited outside of any scope")]
    NoScope { node: NodeId },
    #[error(transparent)]
    Type(#[from] TypeError),
}
