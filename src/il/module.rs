use crate::{
    ext::{OrderedHashMap, OrderedHashSet},
    prelude::*,
    types::{MethodSignature, TypeId, TypeKind, TypeSystem},
};

use super::{NodeId, Symbol};

/// The symbols a backend pass allocated within one scope, with their types.
pub type AllocationTable = OrderedHashMap<Symbol, TypeId>;

/// Everything the code emitter needs for one class or interface: the type itself, every type
/// it depends on, its fields and its method bodies.
#[derive(Debug)]
pub struct TacModule {
    ty: TypeId,
    name: String,
    is_class: bool,
    references: OrderedHashSet<TypeId>,
    fields: OrderedHashMap<String, TypeId>,
    methods: Vec<TacMethod>,
    field_init: Option<NodeId>,
    field_allocations: Option<AllocationTable>,
}

impl TacModule {
    /// Create the module for a class or interface. The reference set is seeded with the type
    /// itself and the built-in scalars, then closed over supertypes and referenced types.
    pub fn new(types: &dyn TypeSystem, ty: TypeId) -> IrResult<Self> {
        let descriptor = types.descriptor(ty);
        let (is_class, fields) = match &descriptor.kind {
            TypeKind::Class(class) => (true, class.fields.iter().cloned().collect()),
            TypeKind::Interface(_) => (false, OrderedHashMap::default()),
            _ => {
                return Err(IrError::UnsupportedType {
                    ty: descriptor.name.clone(),
                    context: "a compilation unit",
                })
            }
        };

        let mut module = Self {
            ty,
            name: descriptor.name.clone(),
            is_class,
            references: Default::default(),
            fields,
            methods: vec![],
            field_init: None,
            field_allocations: None,
        };

        module.add_reference(types, ty);
        for scalar in types.builtins().scalars() {
            module.add_reference(types, scalar);
        }
        debug!(
            "Module {} references {} type(s)",
            module.name,
            module.references.len()
        );

        Ok(module)
    }

    /// Add a type and everything reachable from it. Classes contribute their supertype and
    /// every class-like type they reference; interfaces are not expanded. Types already in the
    /// set are skipped, so cycles terminate.
    fn add_reference(&mut self, types: &dyn TypeSystem, root: TypeId) {
        let mut worklist = vec![root];

        while let Some(ty) = worklist.pop() {
            if !self.references.insert(ty) {
                continue;
            }
            trace!("{} references {}", self.name, types.name(ty));

            if let TypeKind::Class(class) = &types.descriptor(ty).kind {
                let mut found: Vec<TypeId> = class.extends.into_iter().collect();
                found.extend(
                    class
                        .referenced_types()
                        .map(|referenced| element_type(types, referenced))
                        .filter(|referenced| types.descriptor(*referenced).kind.is_class_like()),
                );
                // Reversed, so types are added in the order they were found.
                worklist.extend(found.into_iter().rev());
            }
        }
    }

    pub fn ty(&self) -> TypeId {
        self.ty
    }

    pub fn qualified_name(&self) -> &str {
        &self.name
    }

    pub fn is_class(&self) -> bool {
        self.is_class
    }

    pub fn is_interface(&self) -> bool {
        !self.is_class
    }

    pub fn references(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.references.iter().copied()
    }

    pub fn references_type(&self, ty: TypeId) -> bool {
        self.references.contains(&ty)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    pub fn field_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.fields.iter().map(|(_, ty)| *ty)
    }

    /// The declared type of a field, if the module has a field with that name.
    pub fn field_type(&self, name: &str) -> Option<TypeId> {
        self.fields.get(name).copied()
    }

    pub fn add_method(&mut self, method: TacMethod) {
        self.methods.push(method);
    }

    pub fn methods(&self) -> &[TacMethod] {
        &self.methods
    }

    pub fn methods_mut(&mut self) -> &mut [TacMethod] {
        &mut self.methods
    }

    /// The chain initializing the module's fields.
    pub fn field_init(&self) -> Option<NodeId> {
        self.field_init
    }

    pub fn set_field_init(&mut self, entry: NodeId) {
        self.field_init = Some(entry);
    }

    pub fn field_allocations(&self) -> Option<&AllocationTable> {
        self.field_allocations.as_ref()
    }

    pub fn set_field_allocations(&mut self, allocations: AllocationTable) {
        self.field_allocations = Some(allocations);
    }
}

/// Arrays reference their element type.
fn element_type(types: &dyn TypeSystem, mut ty: TypeId) -> TypeId {
    while let TypeKind::Array(element) = types.descriptor(ty).kind {
        ty = element;
    }
    ty
}

/// A method body: its signature and the chain of instructions implementing it.
#[derive(Debug)]
pub struct TacMethod {
    signature: MethodSignature,
    entry: Option<NodeId>,
    allocations: Option<AllocationTable>,
}
impl TacMethod {
    pub fn new(signature: MethodSignature, entry: Option<NodeId>) -> Self {
        Self {
            signature,
            entry,
            allocations: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub fn entry(&self) -> Option<NodeId> {
        self.entry
    }

    /// Symbols allocated for this body by a preparation pass.
    pub fn allocations(&self) -> Option<&AllocationTable> {
        self.allocations.as_ref()
    }

    pub fn set_allocations(&mut self, allocations: AllocationTable) {
        self.allocations = Some(allocations);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::{
        testing::fixture,
        types::{ClassInfo, InterfaceInfo, TypeTable},
    };

    use super::*;

    #[test]
    fn references_close_over_supertypes_and_fields() -> anyhow::Result<()> {
        let f = fixture();

        let module = TacModule::new(&f.table, f.dog)?;

        let expected: HashSet<_> = [f.dog, f.animal, f.object, f.person]
            .into_iter()
            .chain(f.table.builtins().scalars())
            .collect();
        let found: Vec<_> = module.references().collect();
        assert_eq!(16, found.len());
        assert_eq!(expected, found.iter().copied().collect::<HashSet<_>>());
        assert_eq!(f.dog, found[0]);
        assert!(!module.references_type(f.pet));
        assert!(module.is_class());
        assert_eq!("Dog", module.qualified_name());
        Ok(())
    }

    #[test]
    fn reference_set_does_not_depend_on_definition_order() -> anyhow::Result<()> {
        let mut table = TypeTable::standard();
        let object = table.builtins().object();
        let owner = table.declare("Owner")?;
        let pet = table.define(
            "Cat",
            TypeKind::Class(ClassInfo::extending(object).with_field("owner", owner)),
        )?;
        table.complete(owner, TypeKind::Class(ClassInfo::extending(object)))?;

        let module = TacModule::new(&table, pet)?;

        assert!(module.references_type(owner));
        assert!(module.references_type(object));
        assert_eq!(15, module.references().count());
        Ok(())
    }

    #[test]
    fn cyclic_references_terminate() -> anyhow::Result<()> {
        let mut table = TypeTable::standard();
        let object = table.builtins().object();
        let node = table.declare("Node")?;
        let list = table.define(
            "List",
            TypeKind::Class(ClassInfo::extending(object).with_field("head", node)),
        )?;
        let nodes = table.array_of(node);
        table.complete(
            node,
            TypeKind::Class(
                ClassInfo::extending(object)
                    .with_field("owner", list)
                    .with_field("children", nodes),
            ),
        )?;

        let module = TacModule::new(&table, list)?;

        assert!(module.references_type(node));
        assert!(!module.references_type(nodes));
        assert_eq!(15, module.references().count());
        Ok(())
    }

    #[test]
    fn interfaces_are_not_expanded() -> anyhow::Result<()> {
        let mut f = fixture();
        let named = f.table.define(
            "Named",
            TypeKind::Interface(InterfaceInfo {
                extends: vec![f.pet],
            }),
        )?;

        let module = TacModule::new(&f.table, named)?;

        assert!(module.is_interface());
        assert!(!module.references_type(f.pet));
        assert_eq!(13, module.references().count());
        assert_eq!(0, module.field_names().count());
        Ok(())
    }

    #[test]
    fn fields_are_looked_up_by_name() -> anyhow::Result<()> {
        let f = fixture();

        let module = TacModule::new(&f.table, f.dog)?;

        assert_eq!(vec!["owner"], module.field_names().collect::<Vec<_>>());
        assert_eq!(vec![f.person], module.field_types().collect::<Vec<_>>());
        assert_eq!(Some(f.person), module.field_type("owner"));
        assert_eq!(None, module.field_type("name"));
        Ok(())
    }

    #[test]
    fn only_classes_and_interfaces_are_compilation_units() {
        let mut f = fixture();
        let ints = f.table.array_of(f.int);

        for ty in [f.int, ints] {
            assert!(matches!(
                TacModule::new(&f.table, ty),
                Err(IrError::UnsupportedType { .. })
            ));
        }
    }

    #[test]
    fn methods_are_kept_in_order() -> anyhow::Result<()> {
        let mut f = fixture();
        let mut module = TacModule::new(&f.table, f.dog)?;
        let bark = f.table.signature(f.dog, "bark", vec![], vec![]);
        let sit = f.table.signature(f.dog, "sit", vec![], vec![]);

        module.add_method(TacMethod::new(bark, None));
        module.add_method(TacMethod::new(sit, None));

        let names: Vec<_> = module.methods().iter().map(TacMethod::name).collect();
        assert_eq!(vec!["bark", "sit"], names);
        assert!(module.methods()[0].allocations().is_none());
        Ok(())
    }
}
