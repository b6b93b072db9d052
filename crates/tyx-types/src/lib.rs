//! Type universe for the tyx toolkit.
//!
//! This crate provides the shared object graph that both the binary
//! importer and the declaration checker produce:
//! - `TypeStore` - arena of `TypeData` nodes addressed by `TypeId`
//! - `ObjectStore` - declared objects (consts, vars, funcs, type names)
//! - `PackageStore` - packages and their scopes
//! - `Value` - constant values with arbitrary-width integers
//! - `Universe` - the three stores bundled with cross-store operations
//!   (interface completion, instantiation, receiver base lookup)
//!
//! Recursive types are representable because `Named` and `TypeParam` nodes
//! are allocated as arena slots that can be published before their bodies
//! are known and patched in place afterwards.

pub mod object;
pub mod package;
pub mod store;
pub mod types;
pub mod universe;
pub mod value;

pub use object::{Color, Object, ObjectId, ObjectKind, ObjectStore, Scope};
pub use package::{Package, PackageId, PackageStore};
pub use store::TypeStore;
pub use types::{
    basic_info, BasicKind, ChanDir, Field, InterfaceData, NamedData, NamedInfo, Param,
    SignatureData, TypeData, TypeId, TypeParamData, UnionTerm,
};
pub use universe::Universe;
pub use value::{FloatVal, IntVal, Value};
