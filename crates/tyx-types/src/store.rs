//! The type arena.
//!
//! `TypeStore` owns every `TypeData` node and hands out `TypeId` handles.
//! Named and TypeParam nodes are patched in place after allocation, which
//! is what lets a stub be published before its body is decoded.

use crate::types::{
    basic_info, BasicKind, InterfaceData, NamedData, SignatureData, TypeData, TypeId,
    TypeParamData,
};

#[derive(Debug)]
pub struct TypeStore {
    items: Vec<TypeData>,
}

impl TypeStore {
    /// Create a store seeded with the predeclared types at their fixed ids.
    pub fn new_universe() -> TypeStore {
        use crate::types::basic_info::*;
        use crate::types::BasicKind::*;

        let mut store = TypeStore { items: Vec::new() };
        let mut basic = |kind, info, name| {
            store.items.push(TypeData::Basic { kind, info, name });
        };

        basic(Invalid, 0, "invalid type");
        basic(Bool, IS_BOOLEAN, "bool");
        basic(Int, IS_INTEGER, "int");
        basic(Int8, IS_INTEGER, "int8");
        basic(Int16, IS_INTEGER, "int16");
        basic(Int32, IS_INTEGER, "int32");
        basic(Int64, IS_INTEGER, "int64");
        basic(Uint, IS_INTEGER | IS_UNSIGNED, "uint");
        basic(Uint8, IS_INTEGER | IS_UNSIGNED, "uint8");
        basic(Uint16, IS_INTEGER | IS_UNSIGNED, "uint16");
        basic(Uint32, IS_INTEGER | IS_UNSIGNED, "uint32");
        basic(Uint64, IS_INTEGER | IS_UNSIGNED, "uint64");
        basic(Uintptr, IS_INTEGER | IS_UNSIGNED, "uintptr");
        basic(Float32, IS_FLOAT, "float32");
        basic(Float64, IS_FLOAT, "float64");
        basic(Complex64, IS_COMPLEX, "complex64");
        basic(Complex128, IS_COMPLEX, "complex128");
        basic(String, IS_STRING, "string");
        basic(UntypedBool, IS_BOOLEAN | IS_UNTYPED, "untyped bool");
        basic(UntypedInt, IS_INTEGER | IS_UNTYPED, "untyped int");
        basic(UntypedRune, IS_INTEGER | IS_UNTYPED, "untyped rune");
        basic(UntypedFloat, IS_FLOAT | IS_UNTYPED, "untyped float");
        basic(UntypedComplex, IS_COMPLEX | IS_UNTYPED, "untyped complex");
        basic(UntypedString, IS_STRING | IS_UNTYPED, "untyped string");
        basic(UntypedNil, IS_UNTYPED, "untyped nil");

        // the empty interface, predeclared as `any`
        store.items.push(TypeData::Interface(InterfaceData {
            methods: Vec::new(),
            embeddeds: Vec::new(),
            complete: true,
            all_methods: Vec::new(),
        }));

        debug_assert_eq!(store.items.len() as u32, TypeId::NUM_PREDECLARED);
        store
    }

    pub fn alloc(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(self.items.len() as u32);
        self.items.push(data);
        id
    }

    pub fn get(&self, t: TypeId) -> &TypeData {
        &self.items[t.0 as usize]
    }

    pub fn get_mut(&mut self, t: TypeId) -> &mut TypeData {
        &mut self.items[t.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // Kind-checked accessors. Internal invariants guarantee the kind; a
    // mismatch is a bug in the caller, hence the panic.

    pub fn named(&self, t: TypeId) -> &NamedData {
        match self.get(t) {
            TypeData::Named(n) => n,
            other => panic!("type {t:?} is not a named type: {other:?}"),
        }
    }

    pub fn named_mut(&mut self, t: TypeId) -> &mut NamedData {
        match self.get_mut(t) {
            TypeData::Named(n) => n,
            other => panic!("type {t:?} is not a named type: {other:?}"),
        }
    }

    pub fn type_param(&self, t: TypeId) -> &TypeParamData {
        match self.get(t) {
            TypeData::TypeParam(p) => p,
            other => panic!("type {t:?} is not a type parameter: {other:?}"),
        }
    }

    pub fn type_param_mut(&mut self, t: TypeId) -> &mut TypeParamData {
        match self.get_mut(t) {
            TypeData::TypeParam(p) => p,
            other => panic!("type {t:?} is not a type parameter: {other:?}"),
        }
    }

    pub fn interface(&self, t: TypeId) -> &InterfaceData {
        match self.get(t) {
            TypeData::Interface(i) => i,
            other => panic!("type {t:?} is not an interface: {other:?}"),
        }
    }

    pub fn interface_mut(&mut self, t: TypeId) -> &mut InterfaceData {
        match self.get_mut(t) {
            TypeData::Interface(i) => i,
            other => panic!("type {t:?} is not an interface: {other:?}"),
        }
    }

    pub fn signature(&self, t: TypeId) -> &SignatureData {
        match self.get(t) {
            TypeData::Signature(s) => s,
            other => panic!("type {t:?} is not a signature: {other:?}"),
        }
    }

    pub fn signature_mut(&mut self, t: TypeId) -> &mut SignatureData {
        match self.get_mut(t) {
            TypeData::Signature(s) => s,
            other => panic!("type {t:?} is not a signature: {other:?}"),
        }
    }

    pub fn is_interface(&self, t: TypeId) -> bool {
        matches!(self.get(t), TypeData::Interface(_))
    }

    pub fn is_named(&self, t: TypeId) -> bool {
        matches!(self.get(t), TypeData::Named(_))
    }

    pub fn basic_info(&self, t: TypeId) -> Option<(BasicKind, u32)> {
        match self.get(t) {
            &TypeData::Basic { kind, info, .. } => Some((kind, info)),
            _ => None,
        }
    }

    /// Resolve a forward chain of Named types to the first non-Named type,
    /// following resolved underlying links and, failing that, declared
    /// right-hand sides. Returns `None` when the chain reaches a Named
    /// whose body is not yet known.
    ///
    /// A lap around the arena means a Named-only cycle (no structural
    /// constructor in between); the chain then resolves to Invalid.
    pub fn resolve_under(&self, t: TypeId) -> Option<TypeId> {
        let mut cur = t;
        for _ in 0..=self.items.len() {
            match self.get(cur) {
                TypeData::Named(n) => match (n.underlying, n.from_rhs) {
                    (Some(u), _) if u != cur => cur = u,
                    (Some(_), _) => return Some(TypeId::INVALID),
                    (None, Some(rhs)) => cur = rhs,
                    (None, None) => return None,
                },
                _ => return Some(cur),
            }
        }
        Some(TypeId::INVALID)
    }

    /// The structural type behind `t`: `t` itself unless it is a Named,
    /// in which case the forward chain is resolved. An incomplete chain
    /// yields Invalid.
    pub fn under(&self, t: TypeId) -> TypeId {
        if self.is_named(t) {
            self.resolve_under(t).unwrap_or(TypeId::INVALID)
        } else {
            t
        }
    }
}
