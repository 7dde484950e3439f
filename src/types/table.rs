use std::collections::HashMap;

use crate::prelude::*;

use super::{
    registry::{self, BuiltinTypes},
    ClassInfo, MethodSignature, Primitive, TypeDescriptor, TypeError, TypeId, TypeKind,
    TypeSystem,
};

/// Storage shared by both initialization phases.
#[derive(Debug, Default)]
struct TypeStore {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, TypeId>,
}
impl TypeStore {
    fn push(&mut self, name: String, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len());
        self.by_name.insert(name.clone(), id);
        self.types.push(TypeDescriptor { name, kind });
        id
    }

    fn define(&mut self, name: String, kind: TypeKind) -> Result<TypeId, TypeError> {
        if self.by_name.contains_key(&name) {
            return Err(TypeError::DuplicateType(name));
        }
        Ok(self.push(name, kind))
    }

    fn complete(&mut self, ty: TypeId, kind: TypeKind) -> Result<(), TypeError> {
        let descriptor = &mut self.types[ty.0];
        if descriptor.kind != TypeKind::Unresolved {
            return Err(TypeError::AlreadyResolved(descriptor.name.clone()));
        }
        descriptor.kind = kind;
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Find a structurally identical anonymous type, or add it.
    fn intern(&mut self, kind: TypeKind) -> TypeId {
        let name = match &kind {
            TypeKind::Array(inner) => format!("{}[]", self.types[inner.0].name),
            TypeKind::Sequence(items) => {
                let names: Vec<_> = items
                    .iter()
                    .map(|item| self.types[item.0].name.as_str())
                    .collect();
                format!("({})", names.join(", "))
            }
            _ => unreachable!("only arrays and sequences are interned"),
        };
        if let Some(existing) = self.lookup(&name) {
            if self.types[existing.0].kind == kind {
                return existing;
            }
        }
        self.push(name, kind)
    }
}

/// First initialization phase: the standard library and any other types are defined, then
/// [`TypeTableBuilder::finish`] binds the well-known types into an immutable registry.
#[derive(Debug, Default)]
pub struct TypeTableBuilder {
    store: TypeStore,
}
impl TypeTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder that already defines every type the registry needs.
    pub fn with_standard_types() -> Self {
        let mut builder = Self::new();
        let mut define = |name: &str, kind| {
            builder
                .store
                .define(name.to_string(), kind)
                .expect("standard type names are distinct")
        };
        for primitive in Primitive::ALL {
            define(primitive.name(), TypeKind::Primitive(primitive));
        }
        let object = define(registry::OBJECT, TypeKind::Class(ClassInfo::default()));
        for name in [registry::STRING, registry::CLASS, registry::METHOD_TABLE] {
            define(name, TypeKind::Class(ClassInfo::extending(object)));
        }
        define(registry::VOID, TypeKind::Sequence(vec![]));
        builder
    }

    pub fn define<S: Into<String>>(&mut self, name: S, kind: TypeKind) -> Result<TypeId, TypeError> {
        self.store.define(name.into(), kind)
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.store.lookup(name)
    }

    pub fn finish(self) -> Result<TypeTable, TypeError> {
        let store = self.store;
        let builtins = BuiltinTypes::bind(|name| {
            store.lookup(name).map(|ty| (ty, &store.types[ty.0]))
        })?;
        debug!("Bound well-known types over {} definitions", store.types.len());

        Ok(TypeTable { store, builtins })
    }
}

/// A reference implementation of [`TypeSystem`].
#[derive(Debug)]
pub struct TypeTable {
    store: TypeStore,
    builtins: BuiltinTypes,
}
impl TypeTable {
    /// A table holding only the standard types.
    pub fn standard() -> Self {
        TypeTableBuilder::with_standard_types()
            .finish()
            .expect("the standard types bind every well-known type")
    }

    pub fn define<S: Into<String>>(&mut self, name: S, kind: TypeKind) -> Result<TypeId, TypeError> {
        self.store.define(name.into(), kind)
    }

    /// Declare a type whose definition is not known yet. Its kind stays
    /// [`TypeKind::Unresolved`] until it is completed.
    pub fn declare<S: Into<String>>(&mut self, name: S) -> Result<TypeId, TypeError> {
        self.store.define(name.into(), TypeKind::Unresolved)
    }

    pub fn complete(&mut self, ty: TypeId, kind: TypeKind) -> Result<(), TypeError> {
        self.store.complete(ty, kind)
    }

    pub fn lookup(&self, name: &str) -> Result<TypeId, TypeError> {
        self.store
            .lookup(name)
            .ok_or_else(|| TypeError::UnknownType(name.to_string()))
    }

    pub fn array_of(&mut self, element: TypeId) -> TypeId {
        self.store.intern(TypeKind::Array(element))
    }

    pub fn sequence_of(&mut self, items: Vec<TypeId>) -> TypeId {
        if items.is_empty() {
            return self.builtins.void();
        }
        self.store.intern(TypeKind::Sequence(items))
    }

    pub fn signature<S: Into<String>>(
        &mut self,
        owner: TypeId,
        name: S,
        params: Vec<TypeId>,
        returns: Vec<TypeId>,
    ) -> MethodSignature {
        let return_type = match returns.as_slice() {
            [single] => *single,
            _ => self.sequence_of(returns.clone()),
        };
        MethodSignature {
            owner,
            name: name.into(),
            params,
            returns,
            return_type,
        }
    }

    fn supertypes(&self, ty: TypeId) -> Vec<TypeId> {
        match &self.descriptor(ty).kind {
            TypeKind::Class(class) => class
                .extends
                .iter()
                .chain(class.interfaces.iter())
                .copied()
                .collect(),
            TypeKind::Interface(interface) => interface.extends.clone(),
            _ => vec![],
        }
    }
}
impl TypeSystem for TypeTable {
    fn descriptor(&self, ty: TypeId) -> &TypeDescriptor {
        &self.store.types[ty.0]
    }

    fn builtins(&self) -> &BuiltinTypes {
        &self.builtins
    }

    fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        if !self.is_resolved(sub) || !self.is_resolved(sup) {
            return false;
        }
        if sub == sup {
            return true;
        }
        match (&self.descriptor(sub).kind, &self.descriptor(sup).kind) {
            (TypeKind::Array(a), TypeKind::Array(b)) => return a == b,
            (TypeKind::Sequence(a), TypeKind::Sequence(b)) => {
                return a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| self.is_subtype(*x, *y))
            }
            _ => (),
        }

        let mut worklist = self.supertypes(sub);
        let mut seen = vec![sub];
        while let Some(candidate) = worklist.pop() {
            if candidate == sup {
                return true;
            }
            if !seen.contains(&candidate) {
                seen.push(candidate);
                worklist.extend(self.supertypes(candidate));
            }
        }
        false
    }

    fn replace(
        &mut self,
        ty: TypeId,
        params: &[TypeId],
        args: &[TypeId],
    ) -> Result<TypeId, TypeError> {
        if params.len() != args.len() {
            return Err(TypeError::ArgumentCount {
                params: params.len(),
                args: args.len(),
            });
        }
        if let Some(position) = params.iter().position(|p| *p == ty) {
            return Ok(args[position]);
        }

        match self.descriptor(ty).kind.clone() {
            TypeKind::Array(element) => {
                let element = self.replace(element, params, args)?;
                Ok(self.array_of(element))
            }
            TypeKind::Sequence(items) => {
                let items = items
                    .into_iter()
                    .map(|item| self.replace(item, params, args))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.sequence_of(items))
            }
            _ => Ok(ty),
        }
    }
}
