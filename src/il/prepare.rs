//! Backend preparation: deterministic symbols for temporaries and labels.

use crate::prelude::*;

use super::{
    AllocationTable, IrContext, NodeId, NodeKind, OperandKind, Symbol, SymbolGenerator, SymbolStyle,
    TacMethod, TacModule, TacVisitor,
};

/// Symbol state for one scope: the field initializers, or a single method body.
struct Scope {
    generator: SymbolGenerator,
    allocations: AllocationTable,
}

/// Assigns a symbol to every value-producing node and every label, one scope at a time. The
/// counters restart at zero in each scope, and at the end of a scope its allocation table is
/// handed to the owner of that scope.
pub struct SymbolAllocator {
    style: SymbolStyle,
    scope: Option<Scope>,
}

impl SymbolAllocator {
    pub fn new() -> Self {
        Self::with_style(SymbolStyle::default())
    }

    pub fn with_style(style: SymbolStyle) -> Self {
        Self { style, scope: None }
    }

    fn begin_scope(&mut self) {
        self.scope = Some(Scope {
            generator: SymbolGenerator::new(self.style),
            allocations: AllocationTable::default(),
        });
    }

    fn end_scope(&mut self) -> AllocationTable {
        let allocations = self
            .scope
            .take()
            .map(|scope| scope.allocations)
            .unwrap_or_default();
        debug!("Scope closed with {} allocation(s)", allocations.len());
        allocations
    }

    fn scope(&mut self, node: NodeId) -> IrResult<&mut Scope> {
        self.scope.as_mut().ok_or(IrError::NoScope { node })
    }

    /// Give `node` a fresh temporary, unless it already has one. Returns the node's symbol.
    pub fn allocate(&mut self, ctx: &mut IrContext, node: NodeId) -> IrResult<Symbol> {
        let operand = ctx.operand_mut(node)?;
        if let Some(symbol) = operand.symbol() {
            return Ok(symbol);
        }

        let scope = self.scope(node)?;
        let symbol = scope.generator.next_temp();
        scope.allocations.insert(symbol, operand.ty);
        operand.set_symbol(0, symbol);
        trace!("Allocate {} for {}", symbol, node);
        Ok(symbol)
    }
}

impl Default for SymbolAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl TacVisitor for SymbolAllocator {
    fn start_fields(&mut self, _module: &TacModule) -> IrResult<()> {
        self.begin_scope();
        Ok(())
    }

    fn end_fields(&mut self, module: &mut TacModule) -> IrResult<()> {
        module.set_field_allocations(self.end_scope());
        Ok(())
    }

    fn start_method(&mut self, _method: &TacMethod) -> IrResult<()> {
        self.begin_scope();
        Ok(())
    }

    fn end_method(&mut self, method: &mut TacMethod) -> IrResult<()> {
        method.set_allocations(self.end_scope());
        Ok(())
    }

    fn abort_scope(&mut self) {
        if let Some(scope) = self.scope.take() {
            debug!("Scope dropped with {} allocation(s)", scope.allocations.len());
        }
    }

    /// Every label marks a unique position, so it always gets a fresh symbol.
    fn visit_label(&mut self, ctx: &mut IrContext, node: NodeId) -> IrResult<()> {
        let symbol = self.scope(node)?.generator.next_label();
        match ctx.kind_mut(node)? {
            NodeKind::Label(label) => {
                label.symbol = Some(symbol);
                Ok(())
            }
            _ => Err(IrError::NotALabel(node)),
        }
    }

    /// A call gets one temporary per returned value, for each position that has none yet.
    fn visit_call(&mut self, ctx: &mut IrContext, node: NodeId) -> IrResult<()> {
        let operand = ctx.operand_mut(node)?;
        let returns = match operand.as_call() {
            Some(call) => call.returns.clone(),
            None => {
                return Err(IrError::UnsupportedKind {
                    node,
                    context: "call symbol allocation",
                })
            }
        };

        let scope = self.scope(node)?;
        for (index, ty) in returns.into_iter().enumerate() {
            if operand.symbol_at(index).is_none() {
                let symbol = scope.generator.next_temp();
                scope.allocations.insert(symbol, ty);
                operand.set_symbol(index, symbol);
                trace!("Allocate {} for return {} of {}", symbol, index, node);
            }
        }
        Ok(())
    }

    /// An element names the call's value at its position, allocating it if the call has not
    /// been visited yet.
    fn visit_sequence_element(&mut self, ctx: &mut IrContext, node: NodeId) -> IrResult<()> {
        let element = ctx.operand(node)?;
        if element.symbol().is_some() {
            return Ok(());
        }
        let (call, index) = match element.kind {
            OperandKind::SequenceElement(call, index) => (call, index),
            _ => {
                return Err(IrError::UnsupportedKind {
                    node,
                    context: "element symbol allocation",
                })
            }
        };
        let ty = element.ty;

        let scope = self.scope(node)?;
        let source = ctx.operand_mut(call)?;
        let symbol = match source.symbol_at(index) {
            Some(symbol) => symbol,
            None => {
                let symbol = scope.generator.next_temp();
                scope.allocations.insert(symbol, ty);
                source.set_symbol(index, symbol);
                trace!("Allocate {} for return {} of {}", symbol, index, call);
                symbol
            }
        };
        ctx.operand_mut(node)?.set_symbol(0, symbol);
        Ok(())
    }

    fn visit_new_object(&mut self, ctx: &mut IrContext, node: NodeId) -> IrResult<()> {
        self.allocate(ctx, node).map(|_| ())
    }

    fn visit_new_array(&mut self, ctx: &mut IrContext, node: NodeId) -> IrResult<()> {
        self.allocate(ctx, node).map(|_| ())
    }

    fn visit_unary(&mut self, ctx: &mut IrContext, node: NodeId) -> IrResult<()> {
        self.allocate(ctx, node).map(|_| ())
    }

    fn visit_binary(&mut self, ctx: &mut IrContext, node: NodeId) -> IrResult<()> {
        self.allocate(ctx, node).map(|_| ())
    }

    fn visit_comparison(&mut self, ctx: &mut IrContext, node: NodeId) -> IrResult<()> {
        self.allocate(ctx, node).map(|_| ())
    }

    fn visit_cast(&mut self, ctx: &mut IrContext, node: NodeId) -> IrResult<()> {
        self.allocate(ctx, node).map(|_| ())
    }

    fn visit_phi(&mut self, ctx: &mut IrContext, node: NodeId) -> IrResult<()> {
        self.allocate(ctx, node).map(|_| ())
    }
}
