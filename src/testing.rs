//! Fixtures shared by the unit tests.

use crate::{
    il::{BranchKind, IrContext, NodeId, Value},
    types::{ClassInfo, InterfaceInfo, Modifiers, Primitive, TypeId, TypeKind, TypeSystem, TypeTable},
};

/// A small class hierarchy:
///
/// ```text
/// Object <- Animal <- Dog { owner: Person }
/// Object <- Person
/// Pet (interface)
/// ```
pub struct Fixture {
    pub table: TypeTable,
    pub object: TypeId,
    pub animal: TypeId,
    pub dog: TypeId,
    pub person: TypeId,
    pub pet: TypeId,
    pub int: TypeId,
    pub boolean: TypeId,
}

pub fn fixture() -> Fixture {
    let mut table = TypeTable::standard();
    let object = table.builtins().object();
    let int = table.builtins().primitive(Primitive::Int);
    let boolean = table.builtins().primitive(Primitive::Boolean);

    let pet = table
        .define("Pet", TypeKind::Interface(InterfaceInfo::default()))
        .unwrap();
    let person = table
        .define("Person", TypeKind::Class(ClassInfo::extending(object)))
        .unwrap();
    let animal = table
        .define("Animal", TypeKind::Class(ClassInfo::extending(object)))
        .unwrap();
    let dog = table
        .define(
            "Dog",
            TypeKind::Class(ClassInfo::extending(animal).with_field("owner", person)),
        )
        .unwrap();

    Fixture {
        table,
        object,
        animal,
        dog,
        person,
        pet,
        int,
        boolean,
    }
}

/// The nodes of an if/else whose branches merge at a join:
///
/// ```text
/// cond = true
/// if_false cond goto else
/// then_value = 1
/// goto join
/// else:
/// else_value = 2
/// join
/// phi = ɸ(then_value, else_value)
/// return phi
/// ```
pub struct Diamond {
    pub cond: NodeId,
    pub branch: NodeId,
    pub then_value: NodeId,
    pub goto: NodeId,
    pub else_label: NodeId,
    pub else_value: NodeId,
    pub join: NodeId,
    pub phi: NodeId,
    pub ret: NodeId,
}

pub fn diamond(ctx: &mut IrContext, types: &dyn TypeSystem) -> Diamond {
    let cond = ctx
        .literal(types, None, Value::Boolean(true), Modifiers::NONE)
        .unwrap();
    let else_label = ctx.label(None).unwrap();
    let join = ctx.join(None).unwrap();

    let branch = ctx
        .branch(Some(cond), BranchKind::IfFalse(cond), else_label)
        .unwrap();
    let then_value = ctx
        .literal(types, Some(branch), Value::Int(1), Modifiers::NONE)
        .unwrap();
    let goto = ctx.goto(Some(then_value), join).unwrap();
    ctx.insert_after(goto, else_label).unwrap();
    let else_value = ctx
        .literal(types, Some(else_label), Value::Int(2), Modifiers::NONE)
        .unwrap();
    ctx.insert_after(else_value, join).unwrap();

    let phi = ctx
        .phi(types, Some(join), join, vec![then_value, else_value])
        .unwrap();
    let ret = ctx.ret(Some(phi), Some(phi)).unwrap();

    Diamond {
        cond,
        branch,
        then_value,
        goto,
        else_label,
        else_value,
        join,
        phi,
        ret,
    }
}
