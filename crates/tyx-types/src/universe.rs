//! The bundled type universe.
//!
//! Operations that need more than one store at once - interface
//! completion needs method names, instantiation needs object identity -
//! live here rather than on the individual stores.

use crate::object::{Object, ObjectId, ObjectKind, ObjectStore};
use crate::package::{PackageId, PackageStore};
use crate::store::TypeStore;
use crate::types::{InterfaceData, NamedData, NamedInfo, TypeData, TypeId};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

#[derive(Debug)]
pub struct Universe {
    pub types: TypeStore,
    pub objects: ObjectStore,
    pub packages: PackageStore,
}

impl Universe {
    pub fn new() -> Universe {
        Universe {
            types: TypeStore::new_universe(),
            objects: ObjectStore::new(),
            packages: PackageStore::new(),
        }
    }

    /// Predeclared types visible in every scope.
    pub fn universe_type(name: &str) -> Option<TypeId> {
        Some(match name {
            "bool" => TypeId::BOOL,
            "int" => TypeId::INT,
            "int8" => TypeId::INT8,
            "int16" => TypeId::INT16,
            "int32" | "rune" => TypeId::INT32,
            "int64" => TypeId::INT64,
            "uint" => TypeId::UINT,
            "uint8" | "byte" => TypeId::UINT8,
            "uint16" => TypeId::UINT16,
            "uint32" => TypeId::UINT32,
            "uint64" => TypeId::UINT64,
            "uintptr" => TypeId::UINTPTR,
            "float32" => TypeId::FLOAT32,
            "float64" => TypeId::FLOAT64,
            "complex64" => TypeId::COMPLEX64,
            "complex128" => TypeId::COMPLEX128,
            "string" => TypeId::STRING,
            "any" => TypeId::ANY,
            _ => return None,
        })
    }

    /// Look up a name in a package's scope.
    pub fn lookup(&self, pkg: PackageId, name: &str) -> Option<ObjectId> {
        self.packages.get(pkg).scope.lookup(name)
    }

    /// Insert an object into its package's scope. Returns the previous
    /// occupant on collision, leaving it in place.
    pub fn declare(&mut self, pkg: PackageId, name: &str, obj: ObjectId) -> Option<ObjectId> {
        self.packages.get_mut(pkg).scope.insert(name, obj)
    }

    /// The Named type a method receiver hangs off: strip one pointer, then
    /// expect a Named. Returns `None` for anything else.
    pub fn base_named(&self, t: TypeId) -> Option<TypeId> {
        let t = match self.types.get(t) {
            &TypeData::Pointer { elem } => elem,
            _ => t,
        };
        self.types.is_named(t).then_some(t)
    }

    /// The method set of a type. Instantiations share the methods of the
    /// type they instantiate.
    pub fn named_methods(&self, t: TypeId) -> &[ObjectId] {
        let n = self.types.named(t);
        if n.methods.is_empty() && !n.targs.is_empty() {
            if let Some(base) = n.from_rhs {
                if self.types.is_named(base) {
                    return &self.types.named(base).methods;
                }
            }
        }
        &n.methods
    }

    /// Apply type arguments to a generic named type.
    ///
    /// The instance shares the base type's identity object and methods; it
    /// records the arguments and defers its underlying to the base, which
    /// may still be a stub at this point.
    pub fn instantiate(&mut self, base: TypeId, targs: SmallVec<[TypeId; 4]>) -> TypeId {
        match self.types.get(base) {
            TypeData::Named(n) => {
                let data = NamedData {
                    obj: n.obj,
                    underlying: None,
                    from_rhs: Some(base),
                    methods: Vec::new(),
                    tparams: n.tparams.clone(),
                    targs,
                    info: NamedInfo::Unknown,
                };
                self.types.alloc(TypeData::Named(data))
            }
            _ => TypeId::INVALID,
        }
    }

    /// Finalise an interface: flatten methods of embedded interfaces into
    /// the method set, deduplicate by name, and sort. Idempotent.
    pub fn complete_interface(&mut self, t: TypeId) {
        if self.types.interface(t).complete {
            return;
        }
        let mut methods = Vec::new();
        let mut seen_types = FxHashSet::default();
        self.flatten_interface(t, &mut methods, &mut seen_types);

        let mut seen_names = FxHashSet::default();
        methods.retain(|&m| seen_names.insert(self.objects.get(m).name.clone()));
        methods.sort_by(|&a, &b| self.objects.get(a).name.cmp(&self.objects.get(b).name));

        let iface = self.types.interface_mut(t);
        iface.all_methods = methods;
        iface.complete = true;
    }

    fn flatten_interface(
        &self,
        t: TypeId,
        out: &mut Vec<ObjectId>,
        seen: &mut FxHashSet<TypeId>,
    ) {
        if !seen.insert(t) {
            return;
        }
        let iface = self.types.interface(t);
        out.extend_from_slice(&iface.methods);
        let embeddeds = iface.embeddeds.clone();
        for e in embeddeds {
            let u = self.types.under(e);
            if self.types.is_interface(u) {
                self.flatten_interface(u, out, seen);
            }
        }
    }

    /// Allocate a fresh interface type, not yet completed.
    pub fn new_interface(&mut self, methods: Vec<ObjectId>, embeddeds: Vec<TypeId>) -> TypeId {
        self.types.alloc(TypeData::Interface(InterfaceData {
            methods,
            embeddeds,
            complete: false,
            all_methods: Vec::new(),
        }))
    }

    /// Convenience constructor for objects that also fixes up the value
    /// slot for constants.
    pub fn new_object(
        &mut self,
        kind: ObjectKind,
        pos: tyx_common::Pos,
        pkg: PackageId,
        name: impl Into<String>,
        typ: Option<TypeId>,
    ) -> ObjectId {
        self.objects.alloc(Object::new(kind, pos, pkg, name, typ))
    }

}

impl Default for Universe {
    fn default() -> Self {
        Universe::new()
    }
}
