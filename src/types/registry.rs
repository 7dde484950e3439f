use std::collections::HashMap;

use super::{Primitive, TypeError, TypeId, TypeKind, TypeDescriptor};

pub const OBJECT: &str = "Object";
pub const STRING: &str = "String";
pub const CLASS: &str = "Class";
pub const METHOD_TABLE: &str = "MethodTable";
pub const VOID: &str = "void";

/// Well-known types, bound once after the standard library has been defined. The registry is
/// never modified afterwards.
#[derive(Debug, Clone)]
pub struct BuiltinTypes {
    primitives: HashMap<Primitive, TypeId>,
    object: TypeId,
    string: TypeId,
    class: TypeId,
    method_table: TypeId,
    void: TypeId,
}
impl BuiltinTypes {
    /// Bind every well-known type by name. Fails if the standard library did not define one of
    /// them, or defined it with the wrong kind.
    pub(super) fn bind<'a, F>(lookup: F) -> Result<Self, TypeError>
    where
        F: Fn(&str) -> Option<(TypeId, &'a TypeDescriptor)>,
    {
        let class_named = |name: &'static str| match lookup(name) {
            Some((ty, desc)) if matches!(desc.kind, TypeKind::Class(_)) => Ok(ty),
            Some(_) => Err(TypeError::WellKnownKind {
                name,
                expected: "a class",
            }),
            None => Err(TypeError::MissingWellKnown(name)),
        };

        let mut primitives = HashMap::new();
        for primitive in Primitive::ALL {
            let name = primitive.name();
            match lookup(name) {
                Some((ty, desc)) if desc.kind == TypeKind::Primitive(primitive) => {
                    primitives.insert(primitive, ty);
                }
                Some(_) => {
                    return Err(TypeError::WellKnownKind {
                        name,
                        expected: "a primitive",
                    })
                }
                None => return Err(TypeError::MissingWellKnown(name)),
            }
        }

        let void = match lookup(VOID) {
            Some((ty, desc)) if desc.kind == TypeKind::Sequence(vec![]) => ty,
            Some(_) => {
                return Err(TypeError::WellKnownKind {
                    name: VOID,
                    expected: "the empty sequence",
                })
            }
            None => return Err(TypeError::MissingWellKnown(VOID)),
        };

        Ok(Self {
            primitives,
            object: class_named(OBJECT)?,
            string: class_named(STRING)?,
            class: class_named(CLASS)?,
            method_table: class_named(METHOD_TABLE)?,
            void,
        })
    }

    pub fn primitive(&self, primitive: Primitive) -> TypeId {
        self.primitives[&primitive]
    }

    /// The built-in scalar types, in declaration order.
    pub fn scalars(&self) -> impl Iterator<Item = TypeId> + '_ {
        Primitive::ALL.into_iter().map(|p| self.primitive(p))
    }

    pub fn object(&self) -> TypeId {
        self.object
    }

    pub fn string(&self) -> TypeId {
        self.string
    }

    /// The type of class-metadata operands.
    pub fn class(&self) -> TypeId {
        self.class
    }

    /// The type of dispatch-table operands.
    pub fn method_table(&self) -> TypeId {
        self.method_table
    }

    /// The type of a call to a method that returns nothing.
    pub fn void(&self) -> TypeId {
        self.void
    }
}
