//! Type representation.
//!
//! Types are lightweight `TypeId` handles that point into a `TypeStore`
//! arena. The actual structure is stored in `TypeData`. Predeclared basic
//! types occupy a fixed block of low ids so that importer offsets and
//! store handles line up.

use crate::object::ObjectId;
use crate::package::PackageId;
use serde::Serialize;
use smallvec::SmallVec;
use tyx_common::Pos;

/// A lightweight handle to a type in the `TypeStore`.
/// Equality check is O(1) - just compare the u32 values.
///
/// `TypeId::INVALID` is the error sentinel: once a declaration goes wrong
/// its type becomes INVALID and downstream consumers short-circuit instead
/// of piling up follow-on diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Default)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Error sentinel - declaration resolution failed.
    pub const INVALID: TypeId = TypeId(0);

    pub const BOOL: TypeId = TypeId(1);
    pub const INT: TypeId = TypeId(2);
    pub const INT8: TypeId = TypeId(3);
    pub const INT16: TypeId = TypeId(4);
    pub const INT32: TypeId = TypeId(5);
    pub const INT64: TypeId = TypeId(6);
    pub const UINT: TypeId = TypeId(7);
    pub const UINT8: TypeId = TypeId(8);
    pub const UINT16: TypeId = TypeId(9);
    pub const UINT32: TypeId = TypeId(10);
    pub const UINT64: TypeId = TypeId(11);
    pub const UINTPTR: TypeId = TypeId(12);
    pub const FLOAT32: TypeId = TypeId(13);
    pub const FLOAT64: TypeId = TypeId(14);
    pub const COMPLEX64: TypeId = TypeId(15);
    pub const COMPLEX128: TypeId = TypeId(16);
    pub const STRING: TypeId = TypeId(17);

    pub const UNTYPED_BOOL: TypeId = TypeId(18);
    pub const UNTYPED_INT: TypeId = TypeId(19);
    pub const UNTYPED_RUNE: TypeId = TypeId(20);
    pub const UNTYPED_FLOAT: TypeId = TypeId(21);
    pub const UNTYPED_COMPLEX: TypeId = TypeId(22);
    pub const UNTYPED_STRING: TypeId = TypeId(23);
    pub const UNTYPED_NIL: TypeId = TypeId(24);

    /// The empty interface, predeclared as `any`.
    pub const ANY: TypeId = TypeId(25);

    /// Number of predeclared types seeded by `TypeStore::new_universe`.
    pub const NUM_PREDECLARED: u32 = 26;
}

/// Properties of basic types, used to classify constant expressions.
pub mod basic_info {
    pub const IS_BOOLEAN: u32 = 1 << 0;
    pub const IS_INTEGER: u32 = 1 << 1;
    pub const IS_UNSIGNED: u32 = 1 << 2;
    pub const IS_FLOAT: u32 = 1 << 3;
    pub const IS_COMPLEX: u32 = 1 << 4;
    pub const IS_STRING: u32 = 1 << 5;
    pub const IS_UNTYPED: u32 = 1 << 6;

    pub const IS_ORDERED: u32 = IS_INTEGER | IS_FLOAT | IS_STRING;
    pub const IS_NUMERIC: u32 = IS_INTEGER | IS_FLOAT | IS_COMPLEX;
    pub const IS_CONST_TYPE: u32 = IS_BOOLEAN | IS_NUMERIC | IS_STRING;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BasicKind {
    Invalid,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

/// Channel direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ChanDir {
    SendRecv,
    SendOnly,
    RecvOnly,
}

impl ChanDir {
    /// Wire encoding: send=1, recv=2, both=3.
    pub fn from_wire(v: u64) -> Option<ChanDir> {
        match v {
            1 => Some(ChanDir::SendOnly),
            2 => Some(ChanDir::RecvOnly),
            3 => Some(ChanDir::SendRecv),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u64 {
        match self {
            ChanDir::SendOnly => 1,
            ChanDir::RecvOnly => 2,
            ChanDir::SendRecv => 3,
        }
    }
}

/// A function or method parameter (also used for receivers and results).
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub pos: Pos,
    pub pkg: PackageId,
    pub name: String,
    pub typ: TypeId,
}

/// A struct field.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub pos: Pos,
    pub pkg: PackageId,
    pub name: String,
    pub typ: TypeId,
    pub embedded: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SignatureData {
    pub recv: Option<Param>,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub variadic: bool,
    pub tparams: SmallVec<[TypeId; 4]>,
    /// Receiver type parameters of a method on a parameterized type.
    pub rparams: SmallVec<[TypeId; 4]>,
}

/// An interface type. Mutable while its declaration is decoded or checked;
/// `complete` is set once embedded interfaces have been flattened into
/// `all_methods`.
#[derive(Clone, Debug, Default)]
pub struct InterfaceData {
    pub methods: Vec<ObjectId>,
    pub embeddeds: Vec<TypeId>,
    pub complete: bool,
    pub all_methods: Vec<ObjectId>,
}

/// Resolution state of a Named type's structural validity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum NamedInfo {
    Unknown,
    Marked,
    Valid,
    Invalid,
}

/// A named (defined) type. Allocated as a stub before its right-hand side
/// is known so that recursive references resolve to the same handle.
#[derive(Clone, Debug)]
pub struct NamedData {
    pub obj: ObjectId,
    /// The structural underlying type; never itself a Named once resolved.
    pub underlying: Option<TypeId>,
    /// The declared right-hand side, which may be another Named.
    pub from_rhs: Option<TypeId>,
    pub methods: Vec<ObjectId>,
    pub tparams: SmallVec<[TypeId; 4]>,
    /// Type arguments; non-empty for instantiations.
    pub targs: SmallVec<[TypeId; 4]>,
    pub info: NamedInfo,
}

impl NamedData {
    pub fn stub(obj: ObjectId) -> Self {
        NamedData {
            obj,
            underlying: None,
            from_rhs: None,
            methods: Vec::new(),
            tparams: SmallVec::new(),
            targs: SmallVec::new(),
            info: NamedInfo::Unknown,
        }
    }
}

/// A type parameter. Its constraint may reference the parameter itself, so
/// the node is published before the constraint is read.
#[derive(Clone, Debug)]
pub struct TypeParamData {
    pub obj: ObjectId,
    /// Always an interface (possibly Invalid) once resolution finishes.
    pub constraint: Option<TypeId>,
    /// Unique id; on the wire this is the subscript suffix of the name.
    pub id: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnionTerm {
    pub tilde: bool,
    pub typ: TypeId,
}

/// The structure behind a `TypeId`.
#[derive(Clone, Debug)]
pub enum TypeData {
    Basic {
        kind: BasicKind,
        info: u32,
        name: &'static str,
    },
    Pointer {
        elem: TypeId,
    },
    Slice {
        elem: TypeId,
    },
    Array {
        len: u64,
        elem: TypeId,
    },
    Chan {
        dir: ChanDir,
        elem: TypeId,
    },
    Map {
        key: TypeId,
        value: TypeId,
    },
    Signature(SignatureData),
    Struct {
        fields: Vec<Field>,
        tags: Vec<String>,
    },
    Interface(InterfaceData),
    Named(NamedData),
    TypeParam(TypeParamData),
    Union {
        terms: Vec<UnionTerm>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chan_dir_wire_round_trip() {
        for dir in [ChanDir::SendOnly, ChanDir::RecvOnly, ChanDir::SendRecv] {
            assert_eq!(ChanDir::from_wire(dir.to_wire()), Some(dir));
        }
        assert_eq!(ChanDir::from_wire(0), None);
        assert_eq!(ChanDir::from_wire(4), None);
    }

    #[test]
    fn test_const_type_mask() {
        use crate::types::basic_info::*;
        assert_ne!(IS_CONST_TYPE & IS_BOOLEAN, 0);
        assert_ne!(IS_CONST_TYPE & IS_INTEGER, 0);
        assert_ne!(IS_CONST_TYPE & IS_STRING, 0);
        assert_eq!(IS_CONST_TYPE & IS_UNTYPED, 0);
        assert_eq!(IS_CONST_TYPE & IS_UNSIGNED, 0);
    }
}
