//! Declared objects and scopes.
//!
//! An `Object` is a named program entity: constant, variable, function,
//! or type name. Objects are created white by the checker's collector and
//! driven to black as their types are resolved; the importer creates them
//! with their types already known.

use crate::package::PackageId;
use crate::types::TypeId;
use crate::value::Value;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tyx_common::Pos;

/// Unique identifier for an object in the `ObjectStore`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Const,
    Var,
    Func,
    TypeName,
    PkgName,
    Label,
    Builtin,
}

/// Resolution phase of an object.
///
/// - `White`: type unknown, not being resolved
/// - `Grey(i)`: in progress; `i` is the object's index in the checker's
///   object path, which is how a re-entry finds the cycle
/// - `Black`: type fully known
///
/// Transitions are strictly White -> Grey(i) -> Black.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Color {
    White,
    Grey(usize),
    Black,
}

#[derive(Clone, Debug)]
pub struct Object {
    pub kind: ObjectKind,
    pub pos: Pos,
    pub pkg: PackageId,
    pub name: String,
    pub typ: Option<TypeId>,
    pub color: Color,
    /// Constant value; `Unknown` for everything but resolved constants.
    /// For a collected-but-unchecked constant this temporarily holds the
    /// spec's iota ordinal.
    pub value: Value,
    /// Where the object becomes visible in its scope.
    pub scope_pos: Pos,
}

impl Object {
    /// Objects created with a type start out black; the rest start white.
    pub fn new(
        kind: ObjectKind,
        pos: Pos,
        pkg: PackageId,
        name: impl Into<String>,
        typ: Option<TypeId>,
    ) -> Object {
        let color = if typ.is_some() {
            Color::Black
        } else {
            Color::White
        };
        Object {
            kind,
            pos,
            pkg,
            name: name.into(),
            typ,
            color,
            value: Value::Unknown,
            scope_pos: Pos::NONE,
        }
    }
}

/// Arena of objects.
#[derive(Debug, Default)]
pub struct ObjectStore {
    items: Vec<Object>,
}

impl ObjectStore {
    pub fn new() -> Self {
        ObjectStore { items: Vec::new() }
    }

    pub fn alloc(&mut self, obj: Object) -> ObjectId {
        let id = ObjectId(self.items.len() as u32);
        self.items.push(obj);
        id
    }

    pub fn get(&self, id: ObjectId) -> &Object {
        &self.items[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.items[id.0 as usize]
    }

    /// Assign a type and promote the object to black.
    pub fn set_type(&mut self, id: ObjectId, typ: TypeId) {
        let obj = self.get_mut(id);
        obj.typ = Some(typ);
        obj.color = Color::Black;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, obj)| (ObjectId(i as u32), obj))
    }
}

/// Maps names to objects. Scopes form a tree through the checker's scope
/// stack; the package scope is owned by its `Package`.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    elems: FxHashMap<String, ObjectId>,
}

impl Scope {
    pub fn new() -> Self {
        Scope {
            elems: FxHashMap::default(),
        }
    }

    /// Insert `obj` under `name` unless the name is already bound.
    /// Returns the previous occupant on collision, leaving it in place.
    pub fn insert(&mut self, name: &str, obj: ObjectId) -> Option<ObjectId> {
        if let Some(&alt) = self.elems.get(name) {
            return Some(alt);
        }
        self.elems.insert(name.to_string(), obj);
        None
    }

    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        self.elems.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.elems.keys()
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }
}
