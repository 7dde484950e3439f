use std::fmt::{self, Display, Formatter};

use crate::types::{MethodSignature, TypeId};

use super::{Literal, NodeId, Symbol};

/// An instruction that yields a value of a resolved type.
#[derive(Debug, Clone)]
pub struct Operand {
    pub ty: TypeId,
    pub kind: OperandKind,
    /// Backend names, one slot per produced value.
    pub(super) symbols: Vec<Option<Symbol>>,
}
impl Operand {
    pub fn new(ty: TypeId, kind: OperandKind) -> Self {
        let slots = match &kind {
            OperandKind::Call(call) => call.returns.len().max(1),
            _ => 1,
        };
        Self {
            ty,
            kind,
            symbols: vec![None; slots],
        }
    }

    pub fn symbol(&self) -> Option<Symbol> {
        self.symbol_at(0)
    }

    pub fn symbol_at(&self, index: usize) -> Option<Symbol> {
        self.symbols.get(index).copied().flatten()
    }

    pub fn set_symbol(&mut self, index: usize, symbol: Symbol) {
        if index >= self.symbols.len() {
            self.symbols.resize(index + 1, None);
        }
        self.symbols[index] = Some(symbol);
    }

    /// The nodes this operand consumes, in operand order.
    pub fn operands(&self) -> Vec<NodeId> {
        match &self.kind {
            OperandKind::Literal(_)
            | OperandKind::Parameter(_)
            | OperandKind::MethodRef(_)
            | OperandKind::ClassData(_)
            | OperandKind::MethodTable(_) => vec![],
            OperandKind::Call(call) => {
                let mut operands = vec![call.method];
                operands.extend(call.args.iter().copied());
                operands
            }
            OperandKind::NewObject(alloc) => vec![alloc.class_data, alloc.method_table],
            OperandKind::NewArray(alloc) => vec![alloc.class_data, alloc.length],
            OperandKind::Unary(_, value) | OperandKind::Cast(value) => vec![*value],
            OperandKind::SequenceElement(call, _) => vec![*call],
            OperandKind::Binary(_, lhs, rhs) | OperandKind::Comparison(_, lhs, rhs) => {
                vec![*lhs, *rhs]
            }
            OperandKind::Phi(phi) => phi.values.clone(),
        }
    }

    pub fn num_operands(&self) -> usize {
        self.operands().len()
    }

    /// Whether every use of this operand may be replaced by the operand itself, without
    /// recomputation.
    pub fn can_propagate(&self) -> bool {
        matches!(self.kind, OperandKind::Literal(_))
    }

    pub fn as_call(&self) -> Option<&Call> {
        match &self.kind {
            OperandKind::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            OperandKind::Literal(literal) => Some(literal),
            _ => None,
        }
    }
}
impl Display for Operand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let assigned: Vec<_> = self.symbols.iter().flatten().map(ToString::to_string).collect();
        if !assigned.is_empty() {
            write!(f, "{} = ", assigned.join(", "))?;
        }
        self.kind.fmt(f)
    }
}

#[derive(Debug, Clone)]
pub enum OperandKind {
    Literal(Literal),
    /// The method parameter at the given position.
    Parameter(usize),
    MethodRef(MethodSignature),
    Call(Call),
    /// One of the values returned by a call, selected by position.
    SequenceElement(NodeId, usize),
    NewObject(Allocation),
    NewArray(ArrayAllocation),
    /// Class metadata of a type.
    ClassData(TypeId),
    /// The dispatch table of a class.
    MethodTable(TypeId),
    Unary(UnaryOp, NodeId),
    Binary(BinaryOp, NodeId, NodeId),
    Comparison(CmpOp, NodeId, NodeId),
    /// Conversion of a value to the operand's type.
    Cast(NodeId),
    Phi(Phi),
}
impl Display for OperandKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Literal(literal) => literal.fmt(f),
            Self::Parameter(index) => write!(f, "param {}", index),
            Self::MethodRef(signature) => write!(f, "&{}", signature.name),
            Self::Call(call) => write!(f, "call {}({})", call.name, join_ids(&call.args)),
            Self::SequenceElement(call, index) => write!(f, "{}[{}]", call, index),
            Self::NewObject(alloc) => write!(
                f,
                "{}:create({}, {})",
                alloc.class, alloc.class_data, alloc.method_table
            ),
            Self::NewArray(alloc) => write!(
                f,
                "{}:create[{}]({})",
                alloc.element, alloc.length, alloc.class_data
            ),
            Self::ClassData(ty) => write!(f, "class {}", ty),
            Self::MethodTable(ty) => write!(f, "methods {}", ty),
            Self::Unary(op, value) => write!(f, "{}{}", op, value),
            Self::Binary(op, lhs, rhs) => write!(f, "{} {} {}", lhs, op, rhs),
            Self::Comparison(op, lhs, rhs) => write!(f, "{} {} {}", lhs, op, rhs),
            Self::Cast(value) => write!(f, "cast {}", value),
            Self::Phi(phi) => write!(f, "ɸ({})", join_ids(&phi.values)),
        }
    }
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A method invocation. The argument count always equals the signature's parameter count.
#[derive(Debug, Clone)]
pub struct Call {
    /// The method reference being invoked.
    pub method: NodeId,
    /// The qualified method name, for diagnostics.
    pub name: String,
    pub args: Vec<NodeId>,
    /// The types of the returned values, in order.
    pub returns: Vec<TypeId>,
}
impl Call {
    pub fn num_parameters(&self) -> usize {
        self.args.len()
    }

    pub fn parameter(&self, index: usize) -> Option<NodeId> {
        self.args.get(index).copied()
    }
}

/// A heap allocation site for an object. Its class data and method table are separate
/// operands, so later lowering can initialize the object header from them.
#[derive(Debug, Clone, Copy)]
pub struct Allocation {
    pub class: TypeId,
    pub class_data: NodeId,
    pub method_table: NodeId,
}

#[derive(Debug, Clone, Copy)]
pub struct ArrayAllocation {
    pub element: TypeId,
    pub class_data: NodeId,
    pub length: NodeId,
}

/// Selects one incoming value per edge into `join`.
#[derive(Debug, Clone)]
pub struct Phi {
    pub join: NodeId,
    pub values: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    Complement,
}
impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
            UnaryOp::Complement => "~",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
}
impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use BinaryOp::*;
        let sym = match self {
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Modulus => "%",
            BitAnd => "&",
            BitOr => "|",
            BitXor => "^",
            ShiftLeft => "<<",
            ShiftRight => ">>",
        };
        f.write_str(sym)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    /// Reference identity.
    Is,
}
impl Display for CmpOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use CmpOp::*;
        let sym = match self {
            Equal => "==",
            NotEqual => "!=",
            LessThan => "<",
            LessThanEqual => "<=",
            GreaterThan => ">",
            GreaterThanEqual => ">=",
            Is => "===",
        };
        f.write_str(sym)
    }
}
