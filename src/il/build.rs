//! Typed constructors for every node kind.

use crate::{
    prelude::*,
    types::{MethodSignature, Modifiers, Primitive, TypeId, TypeKind, TypeSystem},
};

use super::{
    Allocation, ArrayAllocation, BinaryOp, Branch, BranchKind, Call, CmpOp, IrContext, Join,
    LabelNode, Literal, NodeId, NodeKind, Operand, OperandKind, Phi, UnaryOp, Value,
};

impl IrContext {
    fn create_operand(
        &mut self,
        name: &str,
        ty: TypeId,
        kind: OperandKind,
        parent: Option<NodeId>,
    ) -> IrResult<NodeId> {
        self.create(name, NodeKind::Operand(Operand::new(ty, kind)), parent)
    }

    pub fn label(&mut self, parent: Option<NodeId>) -> IrResult<NodeId> {
        self.create("label", NodeKind::Label(LabelNode::default()), parent)
    }

    /// Create a join. Whichever node ends up directly in front of it, if that node can fall
    /// through, is tracked as one of its incoming edges.
    pub fn join(&mut self, parent: Option<NodeId>) -> IrResult<NodeId> {
        self.create("join", NodeKind::Join(Join::default()), parent)
    }

    /// Record an incoming control-flow edge from `from` into `join`. Recording an edge twice
    /// has no effect.
    pub fn add_predecessor(&mut self, join: NodeId, from: NodeId) -> IrResult<()> {
        self.node(from)?;
        match self.kind_mut(join)? {
            NodeKind::Join(join) => {
                if !join.predecessors.contains(&from) {
                    join.predecessors.push(from);
                }
                Ok(())
            }
            _ => Err(IrError::NotAJoin(join)),
        }
    }

    /// Create a branch to `target`, which must be a label or a join. Branches into a join are
    /// recorded as one of its incoming edges.
    pub fn branch(
        &mut self,
        parent: Option<NodeId>,
        kind: BranchKind,
        target: NodeId,
    ) -> IrResult<NodeId> {
        let branch = Branch { kind, target };
        if let Some(condition) = branch.condition() {
            self.operand(condition)?;
        }
        let targets_join = match self.kind(target)? {
            NodeKind::Label(_) => false,
            NodeKind::Join(_) => true,
            _ => return Err(IrError::NotALabel(target)),
        };

        let id = self.create("branch", NodeKind::Branch(branch), parent)?;
        if targets_join {
            self.add_predecessor(target, id)?;
        }
        Ok(id)
    }

    pub fn goto(&mut self, parent: Option<NodeId>, target: NodeId) -> IrResult<NodeId> {
        self.branch(parent, BranchKind::Goto, target)
    }

    pub fn ret(&mut self, parent: Option<NodeId>, value: Option<NodeId>) -> IrResult<NodeId> {
        if let Some(value) = value {
            self.operand(value)?;
        }
        self.create("return", NodeKind::Return(value), parent)
    }

    /// Create a literal typed by its value's natural type.
    pub fn literal(
        &mut self,
        types: &dyn TypeSystem,
        parent: Option<NodeId>,
        value: Value,
        modifiers: Modifiers,
    ) -> IrResult<NodeId> {
        let ty = value.natural_type(types.builtins());
        let literal = Literal {
            value,
            ty,
            modifiers,
        };
        self.create_operand("literal", ty, OperandKind::Literal(literal), parent)
    }

    pub fn parameter(
        &mut self,
        parent: Option<NodeId>,
        index: usize,
        ty: TypeId,
    ) -> IrResult<NodeId> {
        self.create_operand("parameter", ty, OperandKind::Parameter(index), parent)
    }

    pub fn method_ref(
        &mut self,
        types: &dyn TypeSystem,
        parent: Option<NodeId>,
        signature: MethodSignature,
    ) -> IrResult<NodeId> {
        let ty = types.builtins().method_table();
        self.create_operand("method", ty, OperandKind::MethodRef(signature), parent)
    }

    /// Create a call through the method reference `method`.
    ///
    /// The number of arguments must match the signature exactly. Each argument must have the
    /// declared parameter type, or a subtype of it; subtypes are converted by a cast spliced in
    /// ahead of the call. Nothing is created if any argument is rejected.
    pub fn call(
        &mut self,
        types: &dyn TypeSystem,
        parent: Option<NodeId>,
        method: NodeId,
        args: Vec<NodeId>,
    ) -> IrResult<NodeId> {
        let signature = match &self.operand(method)?.kind {
            OperandKind::MethodRef(signature) => signature.clone(),
            _ => {
                return Err(IrError::UnsupportedKind {
                    node: method,
                    context: "call construction",
                })
            }
        };
        if let Some(parent) = parent {
            self.node(parent)?;
        }
        let name = format!("{}.{}", types.name(signature.owner), signature.name);

        if args.len() != signature.params.len() {
            return Err(IrError::ArgumentCount {
                call: name,
                expected: signature.params.len(),
                found: args.len(),
            });
        }

        let mut coercions = Vec::with_capacity(args.len());
        for (index, (arg, param)) in args.iter().zip(&signature.params).enumerate() {
            let arg_ty = self.type_of(*arg)?;
            if arg_ty == *param {
                coercions.push(None);
            } else if types.is_subtype(arg_ty, *param) {
                coercions.push(Some(*param));
            } else {
                return Err(IrError::NonConformantArgument {
                    call: name,
                    index,
                    expected: types.name(*param).to_string(),
                    found: types.name(arg_ty).to_string(),
                });
            }
        }

        let mut cursor = parent;
        let mut checked = Vec::with_capacity(args.len());
        for (arg, coercion) in args.into_iter().zip(coercions) {
            match coercion {
                None => checked.push(arg),
                Some(ty) => {
                    let cast = self.create_operand("cast", ty, OperandKind::Cast(arg), cursor)?;
                    trace!("Coerce {} to {} for {}", arg, types.name(ty), name);
                    cursor = Some(cast);
                    checked.push(cast);
                }
            }
        }

        let call = Call {
            method,
            name,
            args: checked,
            returns: signature.returns.clone(),
        };
        self.create_operand("call", signature.return_type, OperandKind::Call(call), cursor)
    }

    /// Select the value a call returned at position `index`. It is typed by that return
    /// value.
    pub fn sequence_element(
        &mut self,
        parent: Option<NodeId>,
        call: NodeId,
        index: usize,
    ) -> IrResult<NodeId> {
        let returns = match self.operand(call)?.as_call() {
            Some(details) => &details.returns,
            None => {
                return Err(IrError::UnsupportedKind {
                    node: call,
                    context: "a sequence element",
                })
            }
        };
        let ty = *returns.get(index).ok_or(IrError::OperandIndex {
            node: call,
            index,
            arity: returns.len(),
        })?;
        self.create_operand(
            "element",
            ty,
            OperandKind::SequenceElement(call, index),
            parent,
        )
    }

    /// Create an object allocation. Its class data and method table are created first and
    /// precede the allocation in the chain.
    pub fn new_object(
        &mut self,
        types: &dyn TypeSystem,
        parent: Option<NodeId>,
        class: TypeId,
    ) -> IrResult<NodeId> {
        if !matches!(types.descriptor(class).kind, TypeKind::Class(_)) {
            return Err(IrError::UnsupportedType {
                ty: types.name(class).to_string(),
                context: "an allocated object",
            });
        }
        let builtins = types.builtins();
        let class_data = self.create_operand(
            "class",
            builtins.class(),
            OperandKind::ClassData(class),
            parent,
        )?;
        let method_table = self.create_operand(
            "methods",
            builtins.method_table(),
            OperandKind::MethodTable(class),
            Some(class_data),
        )?;
        let alloc = Allocation {
            class,
            class_data,
            method_table,
        };
        self.create_operand("new", class, OperandKind::NewObject(alloc), Some(method_table))
    }

    /// Create an array allocation of type `array`, holding `length` elements.
    pub fn new_array(
        &mut self,
        types: &dyn TypeSystem,
        parent: Option<NodeId>,
        array: TypeId,
        length: NodeId,
    ) -> IrResult<NodeId> {
        let element = match types.descriptor(array).kind {
            TypeKind::Array(element) => element,
            _ => {
                return Err(IrError::UnsupportedType {
                    ty: types.name(array).to_string(),
                    context: "an allocated array",
                })
            }
        };
        self.operand(length)?;

        let class_data = self.create_operand(
            "class",
            types.builtins().class(),
            OperandKind::ClassData(element),
            parent,
        )?;
        let alloc = ArrayAllocation {
            element,
            class_data,
            length,
        };
        self.create_operand("new[]", array, OperandKind::NewArray(alloc), Some(class_data))
    }

    pub fn unary(
        &mut self,
        types: &dyn TypeSystem,
        parent: Option<NodeId>,
        op: UnaryOp,
        value: NodeId,
    ) -> IrResult<NodeId> {
        let ty = match op {
            UnaryOp::Not => types.builtins().primitive(Primitive::Boolean),
            UnaryOp::Negate | UnaryOp::Complement => self.type_of(value)?,
        };
        self.create_operand("unary", ty, OperandKind::Unary(op, value), parent)
    }

    /// Create a binary operation, typed by its left-hand side.
    pub fn binary(
        &mut self,
        parent: Option<NodeId>,
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    ) -> IrResult<NodeId> {
        let ty = self.type_of(lhs)?;
        self.operand(rhs)?;
        self.create_operand("binary", ty, OperandKind::Binary(op, lhs, rhs), parent)
    }

    pub fn comparison(
        &mut self,
        types: &dyn TypeSystem,
        parent: Option<NodeId>,
        op: CmpOp,
        lhs: NodeId,
        rhs: NodeId,
    ) -> IrResult<NodeId> {
        self.operand(lhs)?;
        self.operand(rhs)?;
        let ty = types.builtins().primitive(Primitive::Boolean);
        self.create_operand("compare", ty, OperandKind::Comparison(op, lhs, rhs), parent)
    }

    pub fn cast(&mut self, parent: Option<NodeId>, value: NodeId, ty: TypeId) -> IrResult<NodeId> {
        self.operand(value)?;
        self.create_operand("cast", ty, OperandKind::Cast(value), parent)
    }

    /// Create a phi selecting one of `values` at `join`. There must be exactly one value per
    /// incoming edge of the join. The phi takes the type of the first value, and every other
    /// value must have that type or a subtype of it.
    pub fn phi(
        &mut self,
        types: &dyn TypeSystem,
        parent: Option<NodeId>,
        join: NodeId,
        values: Vec<NodeId>,
    ) -> IrResult<NodeId> {
        let expected = match self.kind(join)? {
            NodeKind::Join(join) => join.predecessors.len(),
            _ => return Err(IrError::NotAJoin(join)),
        };
        if values.is_empty() || values.len() != expected {
            return Err(IrError::PhiArity {
                join,
                expected,
                found: values.len(),
            });
        }
        let ty = self.type_of(values[0])?;
        for (index, value) in values.iter().enumerate().skip(1) {
            let value_ty = self.type_of(*value)?;
            if value_ty != ty && !types.is_subtype(value_ty, ty) {
                return Err(IrError::NonConformantArgument {
                    call: format!("ɸ at {}", join),
                    index,
                    expected: types.name(ty).to_string(),
                    found: types.name(value_ty).to_string(),
                });
            }
        }
        self.create_operand("phi", ty, OperandKind::Phi(Phi { join, values }), parent)
    }
}
