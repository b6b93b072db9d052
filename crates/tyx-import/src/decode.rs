//! Per-declaration decoding.
//!
//! Each declaration record starts with a one-byte tag and a delta-encoded
//! position, followed by a tag-specific payload. Types referenced inside
//! payloads are materialised through the offset cache, which is what makes
//! recursive and mutually recursive graphs come out right: a named type
//! publishes a stub before its body is read.

use crate::error::{consistency_err, format_err, ImportError};
use crate::importer::{Importer, VERSION_GENERICS, VERSION_POS_COL};
use crate::reader::DeclReader;
use smallvec::SmallVec;
use tracing::trace;
use tyx_common::Pos;
use tyx_types::{
    basic_info, BasicKind, ChanDir, Field, FloatVal, IntVal, NamedData, Object, ObjectKind,
    Param, PackageId, SignatureData, TypeData, TypeId, TypeParamData, UnionTerm, Value,
};

/// Position deltas switch files with this sentinel in the v0 encoding.
const DELTA_NEW_FILE: i64 = -64;

/// Type kind tags in the declaration pool.
mod type_tag {
    pub const DEFINED: u64 = 0;
    pub const POINTER: u64 = 1;
    pub const SLICE: u64 = 2;
    pub const ARRAY: u64 = 3;
    pub const CHAN: u64 = 4;
    pub const MAP: u64 = 5;
    pub const SIGNATURE: u64 = 6;
    pub const STRUCT: u64 = 7;
    pub const INTERFACE: u64 = 8;
    pub const TYPE_PARAM: u64 = 9;
    pub const INSTANCE: u64 = 10;
    pub const UNION: u64 = 11;
}

/// Cursor state for one declaration record: the reader, the package
/// context types are attributed to, and the position decoder's
/// previous-file/line/column registers.
pub(crate) struct DeclState {
    pub(crate) r: DeclReader,
    pub(crate) curr_pkg: Option<PackageId>,
    prev_file: String,
    prev_line: i64,
    prev_column: i64,
}

impl DeclState {
    pub(crate) fn new(r: DeclReader, curr_pkg: Option<PackageId>) -> DeclState {
        DeclState {
            r,
            curr_pkg,
            prev_file: String::new(),
            prev_line: 0,
            prev_column: 0,
        }
    }

    fn pkg(&self) -> Result<PackageId, ImportError> {
        self.curr_pkg
            .ok_or_else(|| consistency_err("declaration read outside a package context"))
    }
}

impl Importer<'_> {
    /// Decode the object named `name` at the state's cursor and install it
    /// in the current package's scope.
    pub(crate) fn decode_obj(
        &mut self,
        st: &mut DeclState,
        name: &str,
    ) -> Result<(), ImportError> {
        let tag = st.r.read_byte()?;
        let pos = self.decode_pos(st)?;
        let pkg = st.pkg()?;
        trace!(tag = %(tag as char), name, "object");

        match tag {
            b'A' => {
                let typ = self.read_type(st)?;
                let obj = self
                    .uni
                    .objects
                    .alloc(Object::new(ObjectKind::TypeName, pos, pkg, name, Some(typ)));
                self.declare(pkg, name, obj);
            }

            b'C' => {
                let (typ, val) = self.decode_value(st)?;
                let obj = self
                    .uni
                    .objects
                    .alloc(Object::new(ObjectKind::Const, pos, pkg, name, Some(typ)));
                self.uni.objects.get_mut(obj).value = val;
                self.declare(pkg, name, obj);
            }

            b'F' | b'G' => {
                let tparams = if tag == b'G' {
                    self.decode_tparam_list(st)?
                } else {
                    SmallVec::new()
                };
                let sig = self.decode_signature(st, None)?;
                self.uni.types.signature_mut(sig).tparams = tparams;
                let obj = self
                    .uni
                    .objects
                    .alloc(Object::new(ObjectKind::Func, pos, pkg, name, Some(sig)));
                self.declare(pkg, name, obj);
            }

            b'T' | b'U' => {
                let tparams = if tag == b'U' {
                    self.decode_tparam_list(st)?
                } else {
                    SmallVec::new()
                };

                // Types can be recursive, so declare a stub before the body.
                let obj = self
                    .uni
                    .objects
                    .alloc(Object::new(ObjectKind::TypeName, pos, pkg, name, None));
                let mut stub = NamedData::stub(obj);
                stub.tparams = tparams;
                let named = self.uni.types.alloc(TypeData::Named(stub));
                self.uni.objects.set_type(obj, named);
                self.declare(pkg, name, obj);

                let under_off = st.r.read_uvarint()?;
                let decoded = self.typ_at(under_off, Some(named))?;
                let underlying = self.uni.types.under(decoded);
                self.uni.types.named_mut(named).underlying = Some(underlying);

                if !self.uni.types.is_interface(underlying) {
                    let n = st.r.read_uvarint()?;
                    for _ in 0..n {
                        let mpos = self.decode_pos(st)?;
                        let mname = self.read_string(st)?;
                        let recv = self.decode_param(st)?;
                        let recv_typ = recv.typ;
                        let msig = self.decode_signature(st, Some(recv))?;

                        // A receiver instantiated with type arguments means
                        // those are the type parameters used by the method.
                        if let Some(base) = self.uni.base_named(recv_typ) {
                            let targs = self.uni.types.named(base).targs.clone();
                            if !targs.is_empty() {
                                let rparams: SmallVec<[TypeId; 4]> = targs
                                    .iter()
                                    .copied()
                                    .filter(|&t| {
                                        matches!(self.uni.types.get(t), TypeData::TypeParam(_))
                                    })
                                    .collect();
                                self.uni.types.signature_mut(msig).rparams = rparams;
                            }
                        }

                        let fobj = self.uni.objects.alloc(Object::new(
                            ObjectKind::Func,
                            mpos,
                            pkg,
                            mname,
                            Some(msig),
                        ));
                        self.uni.types.named_mut(named).methods.push(fobj);
                    }
                }
            }

            b'P' => {
                if self.version < VERSION_GENERICS || !self.allow_generics {
                    return Err(format_err("unexpected type parameter declaration"));
                }
                let (short, sub) = parse_subscript(name);
                if sub == 0 {
                    return Err(format_err(format!(
                        "missing subscript in type parameter name {name:?}"
                    )));
                }
                let obj = self
                    .uni
                    .objects
                    .alloc(Object::new(ObjectKind::TypeName, pos, pkg, short, None));
                let tp = self.uni.types.alloc(TypeData::TypeParam(TypeParamData {
                    obj,
                    constraint: None,
                    id: sub,
                }));
                self.uni.objects.set_type(obj, tp);

                // Publish before reading the constraint so recursive
                // references to the parameter resolve.
                let key = (self.uni.packages.get(pkg).name.clone(), name.to_string());
                self.tparam_index.insert(key, tp);

                let constraint = self.read_type(st)?;
                self.uni.types.type_param_mut(tp).constraint = Some(constraint);
            }

            b'V' => {
                let typ = self.read_type(st)?;
                let obj = self
                    .uni
                    .objects
                    .alloc(Object::new(ObjectKind::Var, pos, pkg, name, Some(typ)));
                self.declare(pkg, name, obj);
            }

            _ => {
                return Err(format_err(format!("unexpected tag: {}", tag as char)));
            }
        }
        Ok(())
    }

    fn declare(&mut self, pkg: PackageId, name: &str, obj: tyx_types::ObjectId) {
        // do_decl guarantees the name is not yet present
        let _ = self.uni.declare(pkg, name, obj);
    }

    // ----- types -----------------------------------------------------

    /// Read a type offset and materialise it (no receiver context).
    pub(crate) fn read_type(&mut self, st: &mut DeclState) -> Result<TypeId, ImportError> {
        let off = st.r.read_uvarint()?;
        self.typ_at(off, None)
    }

    /// Decode one type record at the state's cursor.
    pub(crate) fn do_type(
        &mut self,
        st: &mut DeclState,
        base: Option<TypeId>,
    ) -> Result<TypeId, ImportError> {
        let kind = st.r.read_uvarint()?;
        match kind {
            type_tag::DEFINED => {
                let pkg = self.read_pkg(st)?;
                let name = self.read_string(st)?;
                self.do_decl(pkg, &name)?;
                let obj = self.uni.lookup(pkg, &name).ok_or_else(|| {
                    consistency_err(format!("defined type {name:?} did not resolve"))
                })?;
                let o = self.uni.objects.get(obj);
                if o.kind != ObjectKind::TypeName {
                    return Err(consistency_err(format!("{name:?} is not a type name")));
                }
                o.typ
                    .ok_or_else(|| consistency_err(format!("type name {name:?} has no type")))
            }

            type_tag::POINTER => {
                let elem = self.read_type(st)?;
                Ok(self.uni.types.alloc(TypeData::Pointer { elem }))
            }

            type_tag::SLICE => {
                let elem = self.read_type(st)?;
                Ok(self.uni.types.alloc(TypeData::Slice { elem }))
            }

            type_tag::ARRAY => {
                let len = st.r.read_uvarint()?;
                let elem = self.read_type(st)?;
                Ok(self.uni.types.alloc(TypeData::Array { len, elem }))
            }

            type_tag::CHAN => {
                let dir = st.r.read_uvarint()?;
                let dir = ChanDir::from_wire(dir)
                    .ok_or_else(|| format_err(format!("invalid channel direction {dir}")))?;
                let elem = self.read_type(st)?;
                Ok(self.uni.types.alloc(TypeData::Chan { dir, elem }))
            }

            type_tag::MAP => {
                let key = self.read_type(st)?;
                let value = self.read_type(st)?;
                Ok(self.uni.types.alloc(TypeData::Map { key, value }))
            }

            type_tag::SIGNATURE => {
                let pkg = self.read_pkg(st)?;
                st.curr_pkg = Some(pkg);
                self.decode_signature(st, None)
            }

            type_tag::STRUCT => {
                let pkg = self.read_pkg(st)?;
                st.curr_pkg = Some(pkg);
                let n = st.r.read_uvarint()?;
                let mut fields = Vec::with_capacity(n as usize);
                let mut tags = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    let fpos = self.decode_pos(st)?;
                    let fname = self.read_string(st)?;
                    let ftyp = self.read_type(st)?;
                    let embedded = self.read_bool(st)?;
                    let tag = self.read_string(st)?;
                    fields.push(Field {
                        pos: fpos,
                        pkg,
                        name: fname,
                        typ: ftyp,
                        embedded,
                    });
                    tags.push(tag);
                }
                Ok(self.uni.types.alloc(TypeData::Struct { fields, tags }))
            }

            type_tag::INTERFACE => {
                let pkg = self.read_pkg(st)?;
                st.curr_pkg = Some(pkg);

                let n_embeds = st.r.read_uvarint()?;
                let mut embeddeds = Vec::with_capacity(n_embeds as usize);
                for _ in 0..n_embeds {
                    let _ = self.decode_pos(st)?;
                    embeddeds.push(self.read_type(st)?);
                }

                let n_methods = st.r.read_uvarint()?;
                let mut methods = Vec::with_capacity(n_methods as usize);
                for _ in 0..n_methods {
                    let mpos = self.decode_pos(st)?;
                    let mname = self.read_string(st)?;
                    // Methods of an interface decoded under a named stub
                    // get a synthetic unnamed receiver of the stub type.
                    // Kept for wire compatibility.
                    let recv = base.map(|b| Param {
                        pos: Pos::NONE,
                        pkg,
                        name: String::new(),
                        typ: b,
                    });
                    let msig = self.decode_signature(st, recv)?;
                    methods.push(self.uni.objects.alloc(Object::new(
                        ObjectKind::Func,
                        mpos,
                        pkg,
                        mname,
                        Some(msig),
                    )));
                }

                let t = self.uni.new_interface(methods, embeddeds);
                self.interface_list.push(t);
                Ok(t)
            }

            type_tag::TYPE_PARAM => {
                if self.version < VERSION_GENERICS || !self.allow_generics {
                    return Err(format_err("unexpected type parameter type"));
                }
                let pkg = self.read_pkg(st)?;
                let name = self.read_string(st)?;
                let key = (self.uni.packages.get(pkg).name.clone(), name.clone());
                if let Some(&t) = self.tparam_index.get(&key) {
                    // already being imported
                    return Ok(t);
                }
                self.do_decl(pkg, &name)?;
                self.tparam_index.get(&key).copied().ok_or_else(|| {
                    consistency_err(format!("type parameter {name:?} did not resolve"))
                })
            }

            type_tag::INSTANCE => {
                if self.version < VERSION_GENERICS || !self.allow_generics {
                    return Err(format_err("unexpected instantiation type"));
                }
                // instances are positioned on their original type
                let _ = self.decode_pos(st)?;
                let n = st.r.read_uvarint()?;
                let mut targs: SmallVec<[TypeId; 4]> = SmallVec::with_capacity(n as usize);
                for _ in 0..n {
                    targs.push(self.read_type(st)?);
                }
                let base_typ = self.read_type(st)?;
                // Methods always come from the base type.
                Ok(self.uni.instantiate(base_typ, targs))
            }

            type_tag::UNION => {
                if self.version < VERSION_GENERICS || !self.allow_generics {
                    return Err(format_err("unexpected union type"));
                }
                let n = st.r.read_uvarint()?;
                let mut terms = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    let tilde = self.read_bool(st)?;
                    let typ = self.read_type(st)?;
                    terms.push(UnionTerm { tilde, typ });
                }
                Ok(self.uni.types.alloc(TypeData::Union { terms }))
            }

            k => Err(format_err(format!(
                "unexpected kind tag in {:?}: {k}",
                self.path
            ))),
        }
    }

    fn decode_signature(
        &mut self,
        st: &mut DeclState,
        recv: Option<Param>,
    ) -> Result<TypeId, ImportError> {
        let params = self.decode_param_list(st)?;
        let results = self.decode_param_list(st)?;
        let variadic = !params.is_empty() && self.read_bool(st)?;
        Ok(self.uni.types.alloc(TypeData::Signature(SignatureData {
            recv,
            params,
            results,
            variadic,
            tparams: SmallVec::new(),
            rparams: SmallVec::new(),
        })))
    }

    fn decode_param_list(&mut self, st: &mut DeclState) -> Result<Vec<Param>, ImportError> {
        let n = st.r.read_uvarint()?;
        let mut params = Vec::with_capacity(n as usize);
        for _ in 0..n {
            params.push(self.decode_param(st)?);
        }
        Ok(params)
    }

    fn decode_param(&mut self, st: &mut DeclState) -> Result<Param, ImportError> {
        let pos = self.decode_pos(st)?;
        let name = self.read_string(st)?;
        let typ = self.read_type(st)?;
        Ok(Param {
            pos,
            pkg: st.pkg()?,
            name,
            typ,
        })
    }

    fn decode_tparam_list(
        &mut self,
        st: &mut DeclState,
    ) -> Result<SmallVec<[TypeId; 4]>, ImportError> {
        let n = st.r.read_uvarint()?;
        let mut out = SmallVec::with_capacity(n as usize);
        for _ in 0..n {
            let t = self.read_type(st)?;
            if !matches!(self.uni.types.get(t), TypeData::TypeParam(_)) {
                return Err(consistency_err("type parameter list entry is not a type parameter"));
            }
            out.push(t);
        }
        Ok(out)
    }

    // ----- values ----------------------------------------------------

    /// Decode a constant: its type, then a value whose encoding depends on
    /// the underlying basic type's class.
    pub(crate) fn decode_value(
        &mut self,
        st: &mut DeclState,
    ) -> Result<(TypeId, Value), ImportError> {
        let typ = self.read_type(st)?;
        let under = self.uni.types.under(typ);
        let (kind, info) = self
            .uni
            .types
            .basic_info(under)
            .ok_or_else(|| format_err("constant type is not a basic type"))?;

        let val = match info & basic_info::IS_CONST_TYPE {
            basic_info::IS_BOOLEAN => Value::Bool(self.read_bool(st)?),
            basic_info::IS_STRING => Value::Str(self.read_string(st)?),
            basic_info::IS_INTEGER => Value::Int(self.decode_mpint(st, kind, info)?),
            basic_info::IS_FLOAT => Value::Float(self.decode_mpfloat(st, kind, info)?),
            basic_info::IS_COMPLEX => {
                let re = self.decode_mpfloat(st, kind, info)?;
                let im = self.decode_mpfloat(st, kind, info)?;
                Value::Complex { re, im }
            }
            _ => {
                return Err(format_err(format!(
                    "unexpected constant type kind {kind:?}"
                )))
            }
        };
        Ok((typ, val))
    }

    /// Decode a multi-precision integer whose encoding exploits the known
    /// byte width of the target type: small values fit one byte, larger
    /// ones are a length byte followed by a big-endian magnitude.
    fn decode_mpint(
        &mut self,
        st: &mut DeclState,
        kind: BasicKind,
        info: u32,
    ) -> Result<IntVal, ImportError> {
        let (signed, max_bytes) = int_size(kind, info);

        let mut max_small: u32 = 256 - max_bytes;
        if signed {
            max_small = 256 - 2 * max_bytes;
        }
        if max_bytes == 1 {
            max_small = 256;
        }

        let n = u32::from(st.r.read_byte()?);
        if n < max_small {
            let mut v = i64::from(n);
            if signed {
                v >>= 1;
                if n & 1 != 0 {
                    v = !v;
                }
            }
            return Ok(IntVal::from_i64(v));
        }

        let len = if signed {
            (256 - (n & !1)) >> 1
        } else {
            256 - n
        };
        if len < 1 || len > max_bytes {
            return Err(format_err(format!(
                "weird decoding: {n} {signed} => {len}"
            )));
        }
        let bytes = st.r.read_bytes(len as usize)?;
        let neg = signed && n & 1 != 0;
        Ok(IntVal::from_bytes(neg, &bytes))
    }

    /// A float is an integer mantissa followed, when non-zero, by a binary
    /// exponent: value = mant * 2^exp.
    fn decode_mpfloat(
        &mut self,
        st: &mut DeclState,
        kind: BasicKind,
        info: u32,
    ) -> Result<FloatVal, ImportError> {
        let mant = self.decode_mpint(st, kind, info)?;
        if mant.is_zero() {
            return Ok(FloatVal::zero());
        }
        let exp = st.r.read_varint()?;
        Ok(FloatVal { mant, exp })
    }

    // ----- positions -------------------------------------------------

    pub(crate) fn decode_pos(&mut self, st: &mut DeclState) -> Result<Pos, ImportError> {
        if self.version >= VERSION_POS_COL {
            self.pos_v1(st)?;
        } else {
            self.pos_v0(st)?;
        }
        if st.prev_file.is_empty() && st.prev_line == 0 && st.prev_column == 0 {
            return Ok(Pos::NONE);
        }
        let file = st.prev_file.clone();
        Ok(self
            .fset
            .pos(&file, st.prev_line as u32, st.prev_column as u32))
    }

    fn pos_v0(&mut self, st: &mut DeclState) -> Result<(), ImportError> {
        let delta = st.r.read_varint()?;
        if delta != DELTA_NEW_FILE {
            st.prev_line += delta;
        } else {
            let l = st.r.read_varint()?;
            if l == -1 {
                st.prev_line += DELTA_NEW_FILE;
            } else {
                st.prev_file = self.read_string(st)?;
                st.prev_line = l;
            }
        }
        Ok(())
    }

    fn pos_v1(&mut self, st: &mut DeclState) -> Result<(), ImportError> {
        let delta = st.r.read_varint()?;
        st.prev_column += delta >> 1;
        if delta & 1 != 0 {
            let delta = st.r.read_varint()?;
            st.prev_line += delta >> 1;
            if delta & 1 != 0 {
                st.prev_file = self.read_string(st)?;
            }
        }
        Ok(())
    }

    // ----- scalars ---------------------------------------------------

    pub(crate) fn read_string(&mut self, st: &mut DeclState) -> Result<String, ImportError> {
        let off = st.r.read_uvarint()?;
        self.string_at(off)
    }

    fn read_pkg(&mut self, st: &mut DeclState) -> Result<PackageId, ImportError> {
        let off = st.r.read_uvarint()?;
        self.pkg_at(off)
    }

    fn read_bool(&mut self, st: &mut DeclState) -> Result<bool, ImportError> {
        Ok(st.r.read_uvarint()? != 0)
    }
}

/// Split a trailing subscript-digit run off a type parameter name.
/// Subscript digits U+2080..U+2089 encode the parameter's unique id;
/// `0` means no subscript was present.
pub(crate) fn parse_subscript(name: &str) -> (String, u64) {
    let mut sub: u64 = 0;
    let mut start = None;
    for (i, r) in name.char_indices() {
        if ('₀'..='₉').contains(&r) {
            if start.is_none() {
                start = Some(i);
            }
            sub = sub * 10 + u64::from(r) - u64::from('₀');
        }
    }
    match start {
        Some(i) => (name[..i].to_string(), sub),
        None => (name.to_string(), 0),
    }
}

/// Whether the integer encoding for this basic type is signed, and how
/// many magnitude bytes it may occupy. Floats store their mantissa with an
/// effective width of 3 (32-bit) or 7 (64-bit) bytes; untyped constants
/// default to the widest integer.
fn int_size(kind: BasicKind, info: u32) -> (bool, u32) {
    if info & basic_info::IS_UNTYPED != 0 {
        return (true, 8);
    }
    match kind {
        BasicKind::Float32 | BasicKind::Complex64 => return (true, 3),
        BasicKind::Float64 | BasicKind::Complex128 => return (true, 7),
        _ => {}
    }
    let signed = info & basic_info::IS_UNSIGNED == 0;
    let max_bytes = match kind {
        BasicKind::Int8 | BasicKind::Uint8 => 1,
        BasicKind::Int16 | BasicKind::Uint16 => 2,
        BasicKind::Int32 | BasicKind::Uint32 => 4,
        _ => 8,
    };
    (signed, max_bytes)
}
