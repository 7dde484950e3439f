//! The traversal protocol shared by every backend.

use std::collections::HashSet;

use crate::{prelude::*, types::TypeSystem};

use super::{IrContext, NodeId, NodeKind, Operand, OperandKind, TacMethod, TacModule};

type Visit = IrResult<()>;

/// A backend pass over the IR. Every node kind has its own method, and every method defaults
/// to doing nothing, so a pass only implements the kinds it cares about.
///
/// The `start_*`/`end_*` hooks bracket scopes. State set up in a `start_*` hook must be torn
/// down by the matching `end_*` hook. When walking the body of a scope fails, the end hook is
/// skipped and [`TacVisitor::abort_scope`] is called instead.
#[allow(unused_variables)]
pub trait TacVisitor {
    fn start_module(&mut self, module: &TacModule) -> Visit {
        Ok(())
    }
    fn end_module(&mut self, module: &mut TacModule) -> Visit {
        Ok(())
    }
    fn start_fields(&mut self, module: &TacModule) -> Visit {
        Ok(())
    }
    fn end_fields(&mut self, module: &mut TacModule) -> Visit {
        Ok(())
    }
    fn start_method(&mut self, method: &TacMethod) -> Visit {
        Ok(())
    }
    fn end_method(&mut self, method: &mut TacMethod) -> Visit {
        Ok(())
    }
    /// Discard whatever the innermost open scope set up, after its walk failed.
    fn abort_scope(&mut self) {}

    fn visit_label(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_branch(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_join(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_return(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_literal(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_parameter(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_method_ref(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_call(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_sequence_element(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_new_object(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_new_array(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_class_data(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_method_table(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_unary(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_binary(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_comparison(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_cast(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
    fn visit_phi(&mut self, ctx: &mut IrContext, node: NodeId) -> Visit {
        Ok(())
    }
}

/// Dispatch a single node to the visitor method for its kind. Operands must have a resolved
/// type by the time they are visited.
pub fn visit<V: TacVisitor + ?Sized>(
    visitor: &mut V,
    ctx: &mut IrContext,
    types: &dyn TypeSystem,
    node: NodeId,
) -> Visit {
    if let NodeKind::Operand(operand) = ctx.kind(node)? {
        if !types.is_resolved(operand.ty) {
            return Err(IrError::UnresolvedType { node });
        }
    }

    use OperandKind as O;
    match ctx.kind(node)? {
        NodeKind::Label(_) => visitor.visit_label(ctx, node),
        NodeKind::Branch(_) => visitor.visit_branch(ctx, node),
        NodeKind::Join(_) => visitor.visit_join(ctx, node),
        NodeKind::Return(_) => visitor.visit_return(ctx, node),
        NodeKind::Operand(Operand { kind: O::Literal(_), .. }) => visitor.visit_literal(ctx, node),
        NodeKind::Operand(Operand { kind: O::Parameter(_), .. }) => {
            visitor.visit_parameter(ctx, node)
        }
        NodeKind::Operand(Operand { kind: O::MethodRef(_), .. }) => {
            visitor.visit_method_ref(ctx, node)
        }
        NodeKind::Operand(Operand { kind: O::Call(_), .. }) => visitor.visit_call(ctx, node),
        NodeKind::Operand(Operand { kind: O::SequenceElement(..), .. }) => {
            visitor.visit_sequence_element(ctx, node)
        }
        NodeKind::Operand(Operand { kind: O::NewObject(_), .. }) => {
            visitor.visit_new_object(ctx, node)
        }
        NodeKind::Operand(Operand { kind: O::NewArray(_), .. }) => {
            visitor.visit_new_array(ctx, node)
        }
        NodeKind::Operand(Operand { kind: O::ClassData(_), .. }) => {
            visitor.visit_class_data(ctx, node)
        }
        NodeKind::Operand(Operand { kind: O::MethodTable(_), .. }) => {
            visitor.visit_method_table(ctx, node)
        }
        NodeKind::Operand(Operand { kind: O::Unary(..), .. }) => visitor.visit_unary(ctx, node),
        NodeKind::Operand(Operand { kind: O::Binary(..), .. }) => visitor.visit_binary(ctx, node),
        NodeKind::Operand(Operand { kind: O::Comparison(..), .. }) => {
            visitor.visit_comparison(ctx, node)
        }
        NodeKind::Operand(Operand { kind: O::Cast(_), .. }) => visitor.visit_cast(ctx, node),
        NodeKind::Operand(Operand { kind: O::Phi(_), .. }) => visitor.visit_phi(ctx, node),
    }
}

/// Visit every node on the chain starting at `start`, following successor links. The walk ends
/// at the end of the chain, or when it comes back around to a node it has already visited, so
/// each node is visited at most once. Returns the number of nodes visited.
pub fn walk<V: TacVisitor + ?Sized>(
    visitor: &mut V,
    ctx: &mut IrContext,
    types: &dyn TypeSystem,
    start: NodeId,
) -> IrResult<usize> {
    let mut visited = HashSet::new();
    let mut current = Some(start);

    while let Some(node) = current {
        if !visited.insert(node) {
            break;
        }
        trace!("Visit {}", ctx.node(node)?);
        visit(visitor, ctx, types, node)?;
        current = ctx.next(node);
    }

    Ok(visited.len())
}

/// Walk a whole compilation unit: the field initializers between the field hooks, then each
/// method body between its method hooks, all bracketed by the module hooks.
pub fn walk_module<V: TacVisitor + ?Sized>(
    visitor: &mut V,
    ctx: &mut IrContext,
    types: &dyn TypeSystem,
    module: &mut TacModule,
) -> Visit {
    debug!("Walk module {}", module.qualified_name());
    visitor.start_module(module)?;

    visitor.start_fields(module)?;
    walk_scope(visitor, ctx, types, module.field_init())?;
    visitor.end_fields(module)?;

    for method in module.methods_mut() {
        debug!("Walk method {}", method.name());
        visitor.start_method(method)?;
        walk_scope(visitor, ctx, types, method.entry())?;
        visitor.end_method(method)?;
    }

    visitor.end_module(module)
}

/// Walk the body of an open scope, aborting the scope if the walk fails.
fn walk_scope<V: TacVisitor + ?Sized>(
    visitor: &mut V,
    ctx: &mut IrContext,
    types: &dyn TypeSystem,
    entry: Option<NodeId>,
) -> Visit {
    let entry = match entry {
        Some(entry) => entry,
        None => return Ok(()),
    };
    if let Err(err) = walk(visitor, ctx, types, entry) {
        debug!("Abort scope at {}: {}", entry, err);
        visitor.abort_scope();
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        il::{BinaryOp, Value},
        testing::{diamond, fixture},
        types::{Modifiers, TypeKind, TypeTable},
    };

    use super::*;

    /// Records every hook and visit, in order.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }
    impl Recorder {
        fn record(&mut self, event: &str, node: NodeId) -> Visit {
            self.events.push(format!("{} {}", event, node));
            Ok(())
        }
    }
    impl TacVisitor for Recorder {
        fn start_module(&mut self, module: &TacModule) -> Visit {
            self.events.push(format!("start_module {}", module.qualified_name()));
            Ok(())
        }
        fn end_module(&mut self, module: &mut TacModule) -> Visit {
            self.events.push(format!("end_module {}", module.qualified_name()));
            Ok(())
        }
        fn start_fields(&mut self, _module: &TacModule) -> Visit {
            self.events.push("start_fields".to_string());
            Ok(())
        }
        fn end_fields(&mut self, _module: &mut TacModule) -> Visit {
            self.events.push("end_fields".to_string());
            Ok(())
        }
        fn start_method(&mut self, method: &TacMethod) -> Visit {
            self.events.push(format!("start_method {}", method.name()));
            Ok(())
        }
        fn end_method(&mut self, method: &mut TacMethod) -> Visit {
            self.events.push(format!("end_method {}", method.name()));
            Ok(())
        }
        fn abort_scope(&mut self) {
            self.events.push("abort_scope".to_string());
        }

        fn visit_label(&mut self, _ctx: &mut IrContext, node: NodeId) -> Visit {
            self.record("label", node)
        }
        fn visit_branch(&mut self, _ctx: &mut IrContext, node: NodeId) -> Visit {
            self.record("branch", node)
        }
        fn visit_join(&mut self, _ctx: &mut IrContext, node: NodeId) -> Visit {
            self.record("join", node)
        }
        fn visit_return(&mut self, _ctx: &mut IrContext, node: NodeId) -> Visit {
            self.record("return", node)
        }
        fn visit_literal(&mut self, _ctx: &mut IrContext, node: NodeId) -> Visit {
            self.record("literal", node)
        }
        fn visit_binary(&mut self, _ctx: &mut IrContext, node: NodeId) -> Visit {
            self.record("binary", node)
        }
        fn visit_sequence_element(&mut self, _ctx: &mut IrContext, node: NodeId) -> Visit {
            self.record("element", node)
        }
        fn visit_phi(&mut self, _ctx: &mut IrContext, node: NodeId) -> Visit {
            self.record("phi", node)
        }
    }

    /// Ignores everything.
    struct Nothing;
    impl TacVisitor for Nothing {}

    #[test]
    fn nodes_are_dispatched_by_kind() -> anyhow::Result<()> {
        let f = fixture();
        let mut ctx = IrContext::new();
        let d = diamond(&mut ctx, &f.table);
        let mut recorder = Recorder::default();

        let visited = walk(&mut recorder, &mut ctx, &f.table, d.cond)?;

        assert_eq!(9, visited);
        let expected: Vec<_> = [
            ("literal", d.cond),
            ("branch", d.branch),
            ("literal", d.then_value),
            ("branch", d.goto),
            ("label", d.else_label),
            ("literal", d.else_value),
            ("join", d.join),
            ("phi", d.phi),
            ("return", d.ret),
        ]
        .iter()
        .map(|(event, node)| format!("{} {}", event, node))
        .collect();
        assert_eq!(expected, recorder.events);
        Ok(())
    }

    #[test]
    fn walking_a_ring_stops_at_the_start() -> anyhow::Result<()> {
        let f = fixture();
        let mut ctx = IrContext::new();
        let a = ctx.label(None)?;
        let b = ctx.literal(&f.table, Some(a), Value::Int(1), Modifiers::NONE)?;
        let c = ctx.label(Some(b))?;
        ctx.link(c, a)?;
        let mut recorder = Recorder::default();

        assert_eq!(3, walk(&mut recorder, &mut ctx, &f.table, b)?);
        assert_eq!(
            vec![format!("literal {}", b), format!("label {}", c), format!("label {}", a)],
            recorder.events
        );
        Ok(())
    }

    #[test]
    fn default_visitor_accepts_every_kind() -> anyhow::Result<()> {
        let f = fixture();
        let mut ctx = IrContext::new();
        let d = diamond(&mut ctx, &f.table);
        let start = ctx.label(None)?;
        ctx.insert_before(d.cond, start)?;
        let object = ctx.new_object(&f.table, Some(start), f.dog)?;
        ctx.cast(Some(object), object, f.animal)?;

        // label, class data, method table, object, cast, then the diamond
        assert_eq!(14, walk(&mut Nothing, &mut ctx, &f.table, start)?);
        Ok(())
    }

    #[test]
    fn unresolved_operands_are_rejected() -> anyhow::Result<()> {
        let mut table = TypeTable::standard();
        let pending = table.declare("Pending")?;
        let mut ctx = IrContext::new();
        let start = ctx.label(None)?;
        let value = ctx.parameter(Some(start), 0, pending)?;
        let mut recorder = Recorder::default();

        assert_eq!(
            Err(IrError::UnresolvedType { node: value }),
            walk(&mut recorder, &mut ctx, &table, start)
        );
        assert_eq!(vec![format!("label {}", start)], recorder.events);

        table.complete(pending, TypeKind::Class(Default::default()))?;
        assert_eq!(2, walk(&mut recorder, &mut ctx, &table, start)?);
        Ok(())
    }

    #[test]
    fn module_hooks_bracket_fields_and_methods() -> anyhow::Result<()> {
        let mut f = fixture();
        let mut ctx = IrContext::new();
        let mut module = TacModule::new(&f.table, f.dog)?;

        let field = ctx.literal(&f.table, None, Value::Int(0), Modifiers::NONE)?;
        module.set_field_init(field);
        let a = ctx.literal(&f.table, None, Value::Int(1), Modifiers::NONE)?;
        let sum = ctx.binary(Some(a), BinaryOp::Add, a, a)?;
        let bark = f.table.signature(f.dog, "bark", vec![], vec![]);
        let sit = f.table.signature(f.dog, "sit", vec![], vec![]);
        module.add_method(TacMethod::new(bark, Some(a)));
        module.add_method(TacMethod::new(sit, None));
        let mut recorder = Recorder::default();

        walk_module(&mut recorder, &mut ctx, &f.table, &mut module)?;

        let expected = vec![
            "start_module Dog".to_string(),
            "start_fields".to_string(),
            format!("literal {}", field),
            "end_fields".to_string(),
            "start_method bark".to_string(),
            format!("literal {}", a),
            format!("binary {}", sum),
            "end_method bark".to_string(),
            "start_method sit".to_string(),
            "end_method sit".to_string(),
            "end_module Dog".to_string(),
        ];
        assert_eq!(expected, recorder.events);
        Ok(())
    }

    #[test]
    fn walks_from_a_foreign_node_fail() {
        let f = fixture();
        let mut ctx = IrContext::new();
        let mut recorder = Recorder::default();

        assert_eq!(
            Err(IrError::UnknownNode(NodeId(3))),
            walk(&mut recorder, &mut ctx, &f.table, NodeId(3))
        );
        assert!(recorder.events.is_empty());
    }

    #[test]
    fn returned_values_are_dispatched_as_elements() -> anyhow::Result<()> {
        let mut f = fixture();
        let sig = f.table.signature(f.dog, "split", vec![], vec![f.int, f.boolean]);
        let mut ctx = IrContext::new();
        let method = ctx.method_ref(&f.table, None, sig)?;
        let call = ctx.call(&f.table, Some(method), method, vec![])?;
        let element = ctx.sequence_element(Some(call), call, 1)?;
        let mut recorder = Recorder::default();

        assert_eq!(3, walk(&mut recorder, &mut ctx, &f.table, method)?);
        assert_eq!(vec![format!("element {}", element)], recorder.events);
        Ok(())
    }

    #[test]
    fn failed_method_walk_aborts_its_scope() -> anyhow::Result<()> {
        let mut f = fixture();
        let pending = f.table.declare("Pending")?;
        let mut ctx = IrContext::new();
        let mut module = TacModule::new(&f.table, f.dog)?;

        let start = ctx.label(None)?;
        let value = ctx.parameter(Some(start), 0, pending)?;
        let bark = f.table.signature(f.dog, "bark", vec![], vec![]);
        let sit = f.table.signature(f.dog, "sit", vec![], vec![]);
        module.add_method(TacMethod::new(bark, Some(start)));
        module.add_method(TacMethod::new(sit, None));
        let mut recorder = Recorder::default();

        assert_eq!(
            Err(IrError::UnresolvedType { node: value }),
            walk_module(&mut recorder, &mut ctx, &f.table, &mut module)
        );
        let expected = vec![
            "start_module Dog".to_string(),
            "start_fields".to_string(),
            "end_fields".to_string(),
            "start_method bark".to_string(),
            format!("label {}", start),
            "abort_scope".to_string(),
        ];
        assert_eq!(expected, recorder.events);
        Ok(())
    }
}
