//! The type-system capability consumed by the IR.
//!
//! Semantic checking lives outside this crate; the IR only needs to resolve, compare and
//! instantiate types. [`TypeSystem`] is that seam, and [`TypeTable`] is a reference
//! implementation of it.

mod primitive;
mod registry;
mod table;

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

pub use primitive::Primitive;
pub use registry::BuiltinTypes;
pub use table::{TypeTable, TypeTableBuilder};

/// A handle to a type owned by a [`TypeSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);
impl Display for TypeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// A built-in scalar type.
    Primitive(Primitive),
    Class(ClassInfo),
    Interface(InterfaceInfo),
    Array(TypeId),
    /// An ordered sequence of types, as produced by a method returning several values.
    Sequence(Vec<TypeId>),
    /// A generic type parameter, substituted by [`TypeSystem::replace`].
    Parameter,
    /// A type that has been declared but not yet resolved.
    Unresolved,
}
impl TypeKind {
    /// Class-like types take part in a compilation unit's reference set.
    pub fn is_class_like(&self) -> bool {
        matches!(self, Self::Primitive(_) | Self::Class(_) | Self::Interface(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassInfo {
    pub extends: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    /// Declared fields, in declaration order.
    pub fields: Vec<(String, TypeId)>,
    /// Types referenced by the class's methods that do not appear in its fields.
    pub referenced: Vec<TypeId>,
}
impl ClassInfo {
    pub fn extending(extends: TypeId) -> Self {
        Self {
            extends: Some(extends),
            ..Default::default()
        }
    }

    pub fn with_field<S: Into<String>>(mut self, name: S, ty: TypeId) -> Self {
        self.fields.push((name.into(), ty));
        self
    }

    pub fn referencing(mut self, ty: TypeId) -> Self {
        self.referenced.push(ty);
        self
    }

    /// All types this class mentions, excluding its supertype.
    pub fn referenced_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.interfaces
            .iter()
            .copied()
            .chain(self.fields.iter().map(|(_, ty)| *ty))
            .chain(self.referenced.iter().copied())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub extends: Vec<TypeId>,
}

/// Type modifiers attached to values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub nullable: bool,
    pub immutable: bool,
}
impl Modifiers {
    pub const NONE: Self = Self {
        nullable: false,
        immutable: false,
    };
    pub const NULLABLE: Self = Self {
        nullable: true,
        immutable: false,
    };
    pub const IMMUTABLE: Self = Self {
        nullable: false,
        immutable: true,
    };
}
impl Display for Modifiers {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.immutable {
            f.write_str("immutable ")?;
        }
        if self.nullable {
            f.write_str("nullable ")?;
        }
        Ok(())
    }
}

/// The signature of a method: its owner, parameters and (possibly several) return values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub owner: TypeId,
    pub name: String,
    pub params: Vec<TypeId>,
    pub returns: Vec<TypeId>,
    /// The type of a call to this method: the single return type, or the sequence of all of
    /// them.
    pub return_type: TypeId,
}
impl MethodSignature {
    /// Instantiate a generic signature by substituting `args` for `params`.
    pub fn replace(
        &self,
        types: &mut dyn TypeSystem,
        params: &[TypeId],
        args: &[TypeId],
    ) -> Result<MethodSignature, TypeError> {
        let mut replace_all = |tys: &[TypeId]| -> Result<Vec<TypeId>, TypeError> {
            tys.iter().map(|ty| types.replace(*ty, params, args)).collect()
        };
        let new_params = replace_all(&self.params)?;
        let new_returns = replace_all(&self.returns)?;
        let return_type = types.replace(self.return_type, params, args)?;

        Ok(MethodSignature {
            owner: self.owner,
            name: self.name.clone(),
            params: new_params,
            returns: new_returns,
            return_type,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown type '{0}'")]
    UnknownType(String),
    #[error("type '{0}' is defined more than once")]
    DuplicateType(String),
    #[error("type '{0}' is already resolved")]
    AlreadyResolved(String),
    #[error("cannot instantiate {params} type parameter(s) with {args} argument(s)")]
    ArgumentCount { params: usize, args: usize },
    #[error("well-known type '{0}' was not defined by the standard library")]
    MissingWellKnown(&'static str),
    #[error("well-known type '{name}' must be {expected}")]
    WellKnownKind { name: &'static str, expected: &'static str },
}

/// The capability through which the IR consults the type system.
pub trait TypeSystem {
    fn descriptor(&self, ty: TypeId) -> &TypeDescriptor;

    /// The immutable registry of well-known types.
    fn builtins(&self) -> &BuiltinTypes;

    fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool;

    /// Substitute each of `params` by the argument at the same position, wherever it occurs in
    /// `ty`.
    fn replace(
        &mut self,
        ty: TypeId,
        params: &[TypeId],
        args: &[TypeId],
    ) -> Result<TypeId, TypeError>;

    fn name(&self, ty: TypeId) -> &str {
        &self.descriptor(ty).name
    }

    /// Whether a call with argument types `args` may bind to parameters `params`.
    fn can_accept(&self, params: &[TypeId], args: &[TypeId]) -> bool {
        params.len() == args.len()
            && params
                .iter()
                .zip(args)
                .all(|(param, arg)| self.is_subtype(*arg, *param))
    }

    /// A type is resolved if neither it nor any type it is built from is a placeholder.
    fn is_resolved(&self, ty: TypeId) -> bool {
        match &self.descriptor(ty).kind {
            TypeKind::Unresolved => false,
            TypeKind::Array(inner) => self.is_resolved(*inner),
            TypeKind::Sequence(items) => items.iter().all(|item| self.is_resolved(*item)),
            _ => true,
        }
    }
}
