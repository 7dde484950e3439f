//! Three-address code.
//!
//! Instructions form chains of [`Node`]s owned by an [`IrContext`]. Every chain has a single
//! successor link per node; control flow is expressed with [`Branch`], [`Join`] and label
//! nodes placed on the chain, and values merge at joins through ɸ operands.

mod build;
mod context;
mod literal;
mod merge;
mod module;
mod node;
mod operand;
mod prepare;
mod symbol_generator;
mod visitor;

pub use context::{Chain, IrContext};
pub use literal::{Literal, Value, ValueError};
pub use merge::Variables;
pub use module::{AllocationTable, TacMethod, TacModule};
pub use node::{Branch, BranchKind, Join, LabelNode, Node, NodeId, NodeKind};
pub use operand::{
    Allocation, ArrayAllocation, BinaryOp, Call, CmpOp, Operand, OperandKind, Phi, UnaryOp,
};
pub use prepare::SymbolAllocator;
pub use symbol_generator::{Symbol, SymbolGenerator, SymbolStyle};
pub use visitor::{visit, walk, walk_module, TacVisitor};
