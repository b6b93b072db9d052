//! End-to-end importer scenarios over hand-built export data.

mod common;

use common::{mpfloat, mpint_i64, ExportBuilder, Tok};
use tyx_common::{FileSet, Position};
use tyx_import::reader::write_uvarint;
use tyx_import::{import_package, ImportError, ImportMap};
use tyx_types::{ObjectKind, TypeData, TypeId, Universe, Value};

fn import(
    uni: &mut Universe,
    imports: &mut ImportMap,
    data: &[u8],
    path: &str,
) -> Result<tyx_types::PackageId, ImportError> {
    let mut fset = FileSet::new();
    import_package(uni, &mut fset, imports, data, path)
}

#[test]
fn test_empty_package() {
    // version 1, one-byte string pool holding "", one package with
    // pathOff=0, nameOff=0, height=0, symCount=0
    let mut data = Vec::new();
    write_uvarint(&mut data, 1); // version
    write_uvarint(&mut data, 1); // sLen
    write_uvarint(&mut data, 5); // dLen
    data.push(0x00); // string pool: ""
    data.extend_from_slice(&[1, 0, 0, 0, 0]);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let pkg = import(&mut uni, &mut imports, &data, "empty").expect("import");

    let p = uni.packages.get(pkg);
    assert_eq!(p.path, "empty");
    assert_eq!(p.name, "");
    assert!(p.scope.is_empty());
    assert!(p.imports.is_empty());
    assert!(p.complete);
    assert_eq!(imports.get("empty"), Some(&pkg));
}

#[test]
fn test_single_int_const() {
    // package p; const Pi = 3
    let mut b = ExportBuilder::new();
    let p = b.add_pkg("", "p");
    let mut val = Vec::new();
    mpint_i64(&mut val, 3, true, 8);
    let pi = b.add_decl(vec![
        Tok::B(b'C'),
        Tok::V(0),
        Tok::U(TypeId::UNTYPED_INT.0 as u64),
        Tok::Raw(val),
    ]);
    b.add_sym(p, "Pi", pi);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let pkg = import(&mut uni, &mut imports, &b.finish(), "p").expect("import");

    let obj = uni.lookup(pkg, "Pi").expect("Pi in scope");
    let o = uni.objects.get(obj);
    assert_eq!(o.kind, ObjectKind::Const);
    assert_eq!(o.typ, Some(TypeId::UNTYPED_INT));
    assert_eq!(o.value, Value::int(3));
}

/// Builds `type A struct { b *B }; type B struct { a *A }`.
fn mutual_structs() -> Vec<u8> {
    let mut b = ExportBuilder::new();
    let p = b.add_pkg("", "p");
    let local = b.s("");

    // declaration indices are assigned up front so records can refer
    // forwards; add_decl order must match
    let defined_a = 0;
    let defined_b = 1;
    let ptr_a = 2;
    let ptr_b = 3;
    let struct_a = 4;
    let struct_b = 5;
    let decl_a = 6;
    let decl_b = 7;

    let name_a = b.s("A");
    let name_b = b.s("B");
    let field_a = b.s("a");
    let field_b = b.s("b");
    let no_tag = b.s("");

    assert_eq!(b.add_decl(vec![Tok::U(0), local.clone(), name_a]), defined_a);
    assert_eq!(b.add_decl(vec![Tok::U(0), local.clone(), name_b]), defined_b);
    assert_eq!(b.add_decl(vec![Tok::U(1), Tok::T(defined_a)]), ptr_a);
    assert_eq!(b.add_decl(vec![Tok::U(1), Tok::T(defined_b)]), ptr_b);
    assert_eq!(
        b.add_decl(vec![
            Tok::U(7),
            local.clone(),
            Tok::U(1),
            Tok::V(0),
            field_b,
            Tok::T(ptr_b),
            Tok::U(0),
            no_tag.clone(),
        ]),
        struct_a
    );
    assert_eq!(
        b.add_decl(vec![
            Tok::U(7),
            local.clone(),
            Tok::U(1),
            Tok::V(0),
            field_a,
            Tok::T(ptr_a),
            Tok::U(0),
            no_tag,
        ]),
        struct_b
    );
    assert_eq!(
        b.add_decl(vec![Tok::B(b'T'), Tok::V(0), Tok::T(struct_a), Tok::U(0)]),
        decl_a
    );
    assert_eq!(
        b.add_decl(vec![Tok::B(b'T'), Tok::V(0), Tok::T(struct_b), Tok::U(0)]),
        decl_b
    );
    b.add_sym(p, "A", decl_a);
    b.add_sym(p, "B", decl_b);
    b.finish()
}

#[test]
fn test_mutually_recursive_structs() {
    let data = mutual_structs();
    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let pkg = import(&mut uni, &mut imports, &data, "p").expect("import");

    let a = uni.lookup(pkg, "A").expect("A in scope");
    let b = uni.lookup(pkg, "B").expect("B in scope");
    let a_named = uni.objects.get(a).typ.expect("A typed");
    let b_named = uni.objects.get(b).typ.expect("B typed");

    // A's single field has type *B, and B's has type *A
    let a_under = uni.types.under(a_named);
    let TypeData::Struct { fields, .. } = uni.types.get(a_under) else {
        panic!("A's underlying is not a struct");
    };
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "b");
    let TypeData::Pointer { elem } = uni.types.get(fields[0].typ) else {
        panic!("A.b is not a pointer");
    };
    assert_eq!(*elem, b_named);

    let b_under = uni.types.under(b_named);
    let TypeData::Struct { fields, .. } = uni.types.get(b_under) else {
        panic!("B's underlying is not a struct");
    };
    assert_eq!(fields[0].name, "a");
    let TypeData::Pointer { elem } = uni.types.get(fields[0].typ) else {
        panic!("B.a is not a pointer");
    };
    assert_eq!(*elem, a_named);
}

#[test]
fn test_import_twice_is_idempotent() {
    let data = mutual_structs();
    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let first = import(&mut uni, &mut imports, &data, "p").expect("first import");
    let objects = uni.objects.len();
    let types = uni.types.len();

    let second = import(&mut uni, &mut imports, &data, "p").expect("second import");
    assert_eq!(first, second);
    // nothing is re-created: every declaration was found in the scope
    assert_eq!(uni.objects.len(), objects);
    assert_eq!(uni.types.len(), types);
}

#[test]
fn test_generic_identity_function() {
    // func Id[T any](x T) T
    let mut b = ExportBuilder::new();
    let p = b.add_pkg("", "p");
    let local = b.s("");
    let tparam_name = b.s("T₁");
    let x = b.s("x");
    let blank = b.s("");

    let tp_ref = b.add_decl(vec![Tok::U(9), local, tparam_name.clone()]);
    let tp_decl = b.add_decl(vec![Tok::B(b'P'), Tok::V(0), Tok::U(TypeId::ANY.0 as u64)]);
    let id_decl = b.add_decl(vec![
        Tok::B(b'G'),
        Tok::V(0),
        // type parameters
        Tok::U(1),
        Tok::T(tp_ref),
        // params: (x T)
        Tok::U(1),
        Tok::V(0),
        x,
        Tok::T(tp_ref),
        // results: (T)
        Tok::U(1),
        Tok::V(0),
        blank,
        Tok::T(tp_ref),
        // variadic
        Tok::U(0),
    ]);
    b.add_sym(p, "Id", id_decl);
    b.add_sym(p, "T₁", tp_decl);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let pkg = import(&mut uni, &mut imports, &b.finish(), "p").expect("import");

    let id = uni.lookup(pkg, "Id").expect("Id in scope");
    let sig = uni.objects.get(id).typ.expect("Id typed");
    let sig = uni.types.signature(sig);
    assert_eq!(sig.tparams.len(), 1);
    let tp = sig.tparams[0];

    let tp_data = uni.types.type_param(tp);
    assert_eq!(tp_data.id, 1);
    assert_eq!(uni.objects.get(tp_data.obj).name, "T");
    assert_eq!(tp_data.constraint, Some(TypeId::ANY));

    assert_eq!(sig.params.len(), 1);
    assert_eq!(sig.params[0].name, "x");
    assert_eq!(sig.params[0].typ, tp);
    assert_eq!(sig.results.len(), 1);
    assert_eq!(sig.results[0].typ, tp);
    assert!(!sig.variadic);
}

#[test]
fn test_self_referential_type_parameter() {
    // type T[P interface{ *T[P] | int }] int
    let mut b = ExportBuilder::new();
    let p = b.add_pkg("", "p");
    let local = b.s("");
    let pname = b.s("P₁");
    let tname = b.s("T");

    let tp_ref = 0;
    let defined_t = 1;
    let inst = 2;
    let ptr_inst = 3;
    let union_rec = 4;
    let iface = 5;
    let p_decl = 6;
    let t_decl = 7;

    assert_eq!(b.add_decl(vec![Tok::U(9), local.clone(), pname]), tp_ref);
    assert_eq!(b.add_decl(vec![Tok::U(0), local.clone(), tname]), defined_t);
    assert_eq!(
        b.add_decl(vec![
            Tok::U(10),
            Tok::V(0),
            Tok::U(1),
            Tok::T(tp_ref),
            Tok::T(defined_t),
        ]),
        inst
    );
    assert_eq!(b.add_decl(vec![Tok::U(1), Tok::T(inst)]), ptr_inst);
    assert_eq!(
        b.add_decl(vec![
            Tok::U(11),
            Tok::U(2),
            Tok::U(0),
            Tok::T(ptr_inst),
            Tok::U(0),
            Tok::U(TypeId::INT.0 as u64),
        ]),
        union_rec
    );
    assert_eq!(
        b.add_decl(vec![Tok::U(8), local, Tok::U(1), Tok::V(0), Tok::T(union_rec), Tok::U(0)]),
        iface
    );
    assert_eq!(
        b.add_decl(vec![Tok::B(b'P'), Tok::V(0), Tok::T(iface)]),
        p_decl
    );
    assert_eq!(
        b.add_decl(vec![
            Tok::B(b'U'),
            Tok::V(0),
            Tok::U(1),
            Tok::T(tp_ref),
            Tok::U(TypeId::INT.0 as u64),
            Tok::U(0),
        ]),
        t_decl
    );
    b.add_sym(p, "T", t_decl);
    b.add_sym(p, "P₁", p_decl);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let pkg = import(&mut uni, &mut imports, &b.finish(), "p").expect("import");

    let t = uni.lookup(pkg, "T").expect("T in scope");
    let t_named = uni.objects.get(t).typ.expect("T typed");
    let tparams = uni.types.named(t_named).tparams.clone();
    assert_eq!(tparams.len(), 1);
    let tp = tparams[0];

    // P's constraint is an interface embedding the union *T[P] | int
    let constraint = uni.types.type_param(tp).constraint.expect("bound set");
    let embeds = uni.types.interface(constraint).embeddeds.clone();
    assert_eq!(embeds.len(), 1);
    let TypeData::Union { terms } = uni.types.get(embeds[0]) else {
        panic!("embedded constraint is not a union");
    };
    assert_eq!(terms.len(), 2);
    assert_eq!(terms[1].typ, TypeId::INT);

    let TypeData::Pointer { elem } = uni.types.get(terms[0].typ) else {
        panic!("first union term is not a pointer");
    };
    let inst = uni.types.named(*elem);
    assert_eq!(inst.targs.as_slice(), &[tp]);
    assert_eq!(inst.from_rhs, Some(t_named));
}

#[test]
fn test_interface_type_with_base_receiver() {
    // type I interface { M(x int) }; var V I  (same interface offset)
    let mut b = ExportBuilder::new();
    let p = b.add_pkg("", "p");
    let local = b.s("");
    let m = b.s("M");
    let x = b.s("x");

    let iface = b.add_decl(vec![
        Tok::U(8),
        local,
        Tok::U(0), // no embeds
        Tok::U(1), // one method
        Tok::V(0),
        m,
        // signature: (x int) -> ()
        Tok::U(1),
        Tok::V(0),
        x,
        Tok::U(TypeId::INT.0 as u64),
        Tok::U(0),
        Tok::U(0), // variadic
    ]);
    let i_decl = b.add_decl(vec![Tok::B(b'T'), Tok::V(0), Tok::T(iface)]);
    let v_decl = b.add_decl(vec![Tok::B(b'V'), Tok::V(0), Tok::T(iface)]);
    b.add_sym(p, "I", i_decl);
    b.add_sym(p, "V", v_decl);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let pkg = import(&mut uni, &mut imports, &b.finish(), "p").expect("import");

    let i = uni.lookup(pkg, "I").expect("I in scope");
    let i_named = uni.objects.get(i).typ.expect("I typed");
    let i_under = uni.types.named(i_named).underlying.expect("underlying set");
    assert!(uni.types.is_interface(i_under));
    // the named type itself carries no methods; they live in the interface
    assert!(uni.types.named(i_named).methods.is_empty());

    // decoded under a named base: the method has a synthetic receiver
    let iface_data = uni.types.interface(i_under);
    assert!(iface_data.complete);
    assert_eq!(iface_data.all_methods.len(), 1);
    let m_obj = iface_data.all_methods[0];
    let m_sig = uni.types.signature(uni.objects.get(m_obj).typ.expect("method typed"));
    let recv = m_sig.recv.as_ref().expect("synthetic receiver");
    assert_eq!(recv.name, "");
    assert_eq!(recv.typ, i_named);

    // the same offset read without a base is a distinct interface whose
    // methods have no receiver
    let v = uni.lookup(pkg, "V").expect("V in scope");
    let v_typ = uni.objects.get(v).typ.expect("V typed");
    assert_ne!(v_typ, i_under, "interface with base receiver must not be shared");
    let v_iface = uni.types.interface(v_typ);
    let vm_sig = uni
        .types
        .signature(uni.objects.get(v_iface.all_methods[0]).typ.expect("typed"));
    assert!(vm_sig.recv.is_none());
}

#[test]
fn test_structural_types_share_cache_entries() {
    // var A []int; var B []int  (same slice offset)
    let mut b = ExportBuilder::new();
    let p = b.add_pkg("", "p");
    let slice = b.add_decl(vec![Tok::U(2), Tok::U(TypeId::INT.0 as u64)]);
    let a = b.add_decl(vec![Tok::B(b'V'), Tok::V(0), Tok::T(slice)]);
    let bb = b.add_decl(vec![Tok::B(b'V'), Tok::V(0), Tok::T(slice)]);
    b.add_sym(p, "A", a);
    b.add_sym(p, "B", bb);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let pkg = import(&mut uni, &mut imports, &b.finish(), "p").expect("import");

    let ta = uni.objects.get(uni.lookup(pkg, "A").unwrap()).typ;
    let tb = uni.objects.get(uni.lookup(pkg, "B").unwrap()).typ;
    assert_eq!(ta, tb, "same offset must decode to the same type");
}

#[test]
fn test_mpint_all_widths() {
    struct Case {
        name: &'static str,
        typ: TypeId,
        value: i64,
        signed: bool,
        max_bytes: u32,
    }
    let cases = [
        Case { name: "I8", typ: TypeId::INT8, value: -5, signed: true, max_bytes: 1 },
        Case { name: "U8", typ: TypeId::UINT8, value: 250, signed: false, max_bytes: 1 },
        // single-byte magnitude forced onto the large path by zigzag
        Case { name: "I16", typ: TypeId::INT16, value: 200, signed: true, max_bytes: 2 },
        Case { name: "U16", typ: TypeId::UINT16, value: 65535, signed: false, max_bytes: 2 },
        Case { name: "I32", typ: TypeId::INT32, value: -(1 << 25), signed: true, max_bytes: 4 },
        Case { name: "U32", typ: TypeId::UINT32, value: 1 << 31, signed: false, max_bytes: 4 },
        Case { name: "I64", typ: TypeId::INT64, value: i64::MIN, signed: true, max_bytes: 8 },
        Case { name: "U64", typ: TypeId::UINT64, value: 1 << 40, signed: false, max_bytes: 8 },
        // untyped default width, small and large paths
        Case { name: "UD1", typ: TypeId::UNTYPED_INT, value: -7, signed: true, max_bytes: 8 },
        Case { name: "UD2", typ: TypeId::UNTYPED_INT, value: 1 << 50, signed: true, max_bytes: 8 },
    ];

    let mut b = ExportBuilder::new();
    let p = b.add_pkg("", "p");
    for c in &cases {
        let mut val = Vec::new();
        mpint_i64(&mut val, c.value, c.signed, c.max_bytes);
        let d = b.add_decl(vec![
            Tok::B(b'C'),
            Tok::V(0),
            Tok::U(c.typ.0 as u64),
            Tok::Raw(val),
        ]);
        b.add_sym(p, c.name, d);
    }

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let pkg = import(&mut uni, &mut imports, &b.finish(), "p").expect("import");

    for c in &cases {
        let obj = uni.lookup(pkg, c.name).expect("const in scope");
        let o = uni.objects.get(obj);
        assert_eq!(o.typ, Some(c.typ), "{}", c.name);
        let Value::Int(v) = &o.value else {
            panic!("{} has no integer value", c.name);
        };
        assert_eq!(v.to_i64(), Some(c.value), "{}", c.name);
    }
}

#[test]
fn test_float_and_complex_constants() {
    let mut b = ExportBuilder::new();
    let p = b.add_pkg("", "p");

    // const Half float64 = 0.5  (mantissa 1, exponent -1)
    let mut half = Vec::new();
    mpfloat(&mut half, 1, -1, 7);
    let half_decl = b.add_decl(vec![
        Tok::B(b'C'),
        Tok::V(0),
        Tok::U(TypeId::FLOAT64.0 as u64),
        Tok::Raw(half),
    ]);
    b.add_sym(p, "Half", half_decl);

    // const Zero float32 = 0  (no exponent follows a zero mantissa)
    let mut zero = Vec::new();
    mpfloat(&mut zero, 0, 0, 3);
    let zero_decl = b.add_decl(vec![
        Tok::B(b'C'),
        Tok::V(0),
        Tok::U(TypeId::FLOAT32.0 as u64),
        Tok::Raw(zero),
    ]);
    b.add_sym(p, "Zero", zero_decl);

    // const C complex128 = 3 + 2i
    let mut c = Vec::new();
    mpfloat(&mut c, 3, 0, 7);
    mpfloat(&mut c, 2, 0, 7);
    let c_decl = b.add_decl(vec![
        Tok::B(b'C'),
        Tok::V(0),
        Tok::U(TypeId::COMPLEX128.0 as u64),
        Tok::Raw(c),
    ]);
    b.add_sym(p, "C", c_decl);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let pkg = import(&mut uni, &mut imports, &b.finish(), "p").expect("import");

    let half = &uni.objects.get(uni.lookup(pkg, "Half").unwrap()).value;
    let Value::Float(f) = half else { panic!("Half is not a float") };
    assert_eq!(f.mant.to_i64(), Some(1));
    assert_eq!(f.exp, -1);

    let zero = &uni.objects.get(uni.lookup(pkg, "Zero").unwrap()).value;
    let Value::Float(f) = zero else { panic!("Zero is not a float") };
    assert!(f.mant.is_zero());

    let c = &uni.objects.get(uni.lookup(pkg, "C").unwrap()).value;
    let Value::Complex { re, im } = c else { panic!("C is not complex") };
    assert_eq!(re.mant.to_i64(), Some(3));
    assert_eq!(im.mant.to_i64(), Some(2));
}

#[test]
fn test_unknown_tag() {
    let mut b = ExportBuilder::new();
    let p = b.add_pkg("", "p");
    let d = b.add_decl(vec![Tok::B(b'Z'), Tok::V(0)]);
    b.add_sym(p, "X", d);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let err = import(&mut uni, &mut imports, &b.finish(), "p").unwrap_err();
    assert_eq!(err, ImportError::Format("unexpected tag: Z".to_string()));
}

#[test]
fn test_newer_version_is_distinguished() {
    let mut data = Vec::new();
    write_uvarint(&mut data, 9);
    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let err = import(&mut uni, &mut imports, &data, "p").unwrap_err();
    assert_eq!(err, ImportError::NewerVersion(9));
}

#[test]
fn test_truncated_pools() {
    let mut data = Vec::new();
    write_uvarint(&mut data, 1);
    write_uvarint(&mut data, 100); // sLen longer than the input
    write_uvarint(&mut data, 5);
    data.push(0);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let err = import(&mut uni, &mut imports, &data, "p").unwrap_err();
    assert!(matches!(err, ImportError::Format(_)), "got {err:?}");
}

#[test]
fn test_missing_package_reference() {
    let mut b = ExportBuilder::new();
    let p = b.add_pkg("", "p");
    let ghost = b.s("ghost");
    let strct = b.add_decl(vec![Tok::U(7), ghost, Tok::U(0)]);
    let v = b.add_decl(vec![Tok::B(b'V'), Tok::V(0), Tok::T(strct)]);
    b.add_sym(p, "X", v);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let err = import(&mut uni, &mut imports, &b.finish(), "p").unwrap_err();
    assert!(
        matches!(&err, ImportError::Consistency(msg) if msg.contains("missing package")),
        "got {err:?}"
    );
}

#[test]
fn test_conflicting_package_names() {
    let mut first = ExportBuilder::new();
    first.add_pkg("", "p1");
    first.add_pkg("dep", "a");

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    import(&mut uni, &mut imports, &first.finish(), "p1").expect("first import");

    let mut second = ExportBuilder::new();
    second.add_pkg("", "p2");
    second.add_pkg("dep", "b");
    let err = import(&mut uni, &mut imports, &second.finish(), "p2").unwrap_err();
    assert!(
        matches!(&err, ImportError::Consistency(msg) if msg.contains("conflicting names")),
        "got {err:?}"
    );
}

#[test]
fn test_imports_are_sorted_by_path() {
    let mut b = ExportBuilder::new();
    b.add_pkg("", "p");
    b.add_pkg("zeta", "z");
    b.add_pkg("alpha", "a");

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let pkg = import(&mut uni, &mut imports, &b.finish(), "p").expect("import");

    let paths: Vec<&str> = uni
        .packages
        .get(pkg)
        .imports
        .iter()
        .map(|&p| uni.packages.get(p).path.as_str())
        .collect();
    assert_eq!(paths, ["alpha", "zeta"]);
}

#[test]
fn test_missing_subscript_rejected() {
    let mut b = ExportBuilder::new();
    let p = b.add_pkg("", "p");
    let d = b.add_decl(vec![Tok::B(b'P'), Tok::V(0), Tok::U(TypeId::ANY.0 as u64)]);
    b.add_sym(p, "P", d);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let err = import(&mut uni, &mut imports, &b.finish(), "p").unwrap_err();
    assert!(
        matches!(&err, ImportError::Format(msg) if msg.contains("missing subscript")),
        "got {err:?}"
    );
}

#[test]
fn test_positions_v1() {
    let mut b = ExportBuilder::new();
    let p = b.add_pkg("", "p");
    let file = b.s("a.src");
    // column +3 with the continue bit, line +5 with the file bit
    let d = b.add_decl(vec![
        Tok::B(b'V'),
        Tok::V((3 << 1) | 1),
        Tok::V((5 << 1) | 1),
        file,
        Tok::U(TypeId::INT.0 as u64),
    ]);
    b.add_sym(p, "X", d);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let mut fset = FileSet::new();
    let pkg = import_package(&mut uni, &mut fset, &mut imports, &b.finish(), "p")
        .expect("import");

    let obj = uni.lookup(pkg, "X").unwrap();
    let pos = uni.objects.get(obj).pos;
    assert_eq!(
        fset.position(pos),
        Some(Position {
            file: "a.src".to_string(),
            line: 5,
            column: 3,
        })
    );
}

#[test]
fn test_positions_v0() {
    let mut b = ExportBuilder::new().with_version(0);
    let p = b.add_pkg("", "p");
    let file = b.s("f.src");
    // new-file escape: delta -64, then an absolute line and the file
    let d = b.add_decl(vec![
        Tok::B(b'V'),
        Tok::V(-64),
        Tok::V(3),
        file,
        Tok::U(TypeId::INT.0 as u64),
    ]);
    b.add_sym(p, "X", d);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let mut fset = FileSet::new();
    let pkg = import_package(&mut uni, &mut fset, &mut imports, &b.finish(), "p")
        .expect("import");

    let obj = uni.lookup(pkg, "X").unwrap();
    let pos = uni.objects.get(obj).pos;
    assert_eq!(
        fset.position(pos),
        Some(Position {
            file: "f.src".to_string(),
            line: 3,
            column: 0,
        })
    );
}

#[test]
fn test_generics_rejected_at_version_zero() {
    let mut b = ExportBuilder::new().with_version(0);
    let p = b.add_pkg("", "p");
    let d = b.add_decl(vec![Tok::B(b'P'), Tok::V(0), Tok::U(TypeId::ANY.0 as u64)]);
    b.add_sym(p, "T₁", d);

    let mut uni = Universe::new();
    let mut imports = ImportMap::default();
    let err = import(&mut uni, &mut imports, &b.finish(), "p").unwrap_err();
    assert!(
        matches!(&err, ImportError::Format(msg) if msg.contains("type parameter")),
        "got {err:?}"
    );
}
