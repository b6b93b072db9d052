//! Declaration AST for the tyx declaration checker.
//!
//! Parsing is not part of this workspace; these are the nodes a front end
//! hands to the checker. Only the declaration surface is modelled -
//! grouped const/var/type specs, function declarations with receivers and
//! type parameters, structural type expressions, and the small expression
//! grammar constant initializers need.

use tyx_common::Pos;
use tyx_types::ChanDir;

/// A positioned name.
#[derive(Clone, Debug, PartialEq)]
pub struct Ident {
    pub pos: Pos,
    pub name: String,
}

impl Ident {
    pub fn new(pos: Pos, name: impl Into<String>) -> Ident {
        Ident {
            pos,
            name: name.into(),
        }
    }
}

/// A top-level declaration.
#[derive(Clone, Debug)]
pub enum Decl {
    Gen(GenDecl),
    Func(FuncDecl),
    /// Produced by a front end for unparsable input; ignored here.
    Bad { pos: Pos },
}

/// The keyword that introduced a declaration group.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeclTok {
    Import,
    Const,
    Var,
    Type,
}

/// A grouped (or single-spec) declaration.
#[derive(Clone, Debug)]
pub struct GenDecl {
    pub pos: Pos,
    pub tok: DeclTok,
    pub specs: Vec<Spec>,
}

#[derive(Clone, Debug)]
pub enum Spec {
    Import(ImportSpec),
    Value(ValueSpec),
    Type(TypeSpec),
}

#[derive(Clone, Debug)]
pub struct ImportSpec {
    pub pos: Pos,
    pub path: String,
    pub name: Option<Ident>,
}

/// One const or var spec: `names [typ] [= values]`.
#[derive(Clone, Debug, Default)]
pub struct ValueSpec {
    pub pos: Pos,
    pub names: Vec<Ident>,
    pub typ: Option<TypeExpr>,
    pub values: Vec<Expr>,
}

/// One type spec: `name [tparams] rhs` or, with `assign`, `name = rhs`.
#[derive(Clone, Debug)]
pub struct TypeSpec {
    pub pos: Pos,
    pub name: Ident,
    /// True when the declaration uses the alias form.
    pub assign: bool,
    pub tparams: Vec<TypeParamDecl>,
    pub rhs: TypeExpr,
}

/// One group of a type parameter list: `names [bound]`.
#[derive(Clone, Debug)]
pub struct TypeParamDecl {
    pub pos: Pos,
    pub names: Vec<Ident>,
    pub bound: Option<TypeExpr>,
}

#[derive(Clone, Debug)]
pub struct FuncDecl {
    pub pos: Pos,
    pub name: Ident,
    pub recv: Option<FieldDecl>,
    pub tparams: Vec<TypeParamDecl>,
    pub sig: FuncSig,
    pub has_body: bool,
}

/// A parameter, result, or receiver field.
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub pos: Pos,
    pub name: Option<Ident>,
    pub typ: TypeExpr,
}

#[derive(Clone, Debug, Default)]
pub struct FuncSig {
    pub params: Vec<FieldDecl>,
    pub results: Vec<FieldDecl>,
    pub variadic: bool,
}

/// A struct field group: `names typ [tag]`, or an embedded type when
/// `names` is empty.
#[derive(Clone, Debug)]
pub struct StructField {
    pub pos: Pos,
    pub names: Vec<Ident>,
    pub typ: TypeExpr,
    pub tag: Option<String>,
}

/// An interface method: `name signature`.
#[derive(Clone, Debug)]
pub struct InterfaceMethod {
    pub pos: Pos,
    pub name: Ident,
    pub sig: FuncSig,
}

/// One term of a union constraint: `[~]typ`.
#[derive(Clone, Debug)]
pub struct UnionTermExpr {
    pub tilde: bool,
    pub typ: TypeExpr,
}

/// A type expression.
#[derive(Clone, Debug)]
pub enum TypeExpr {
    Name(Ident),
    Pointer {
        pos: Pos,
        elem: Box<TypeExpr>,
    },
    Slice {
        pos: Pos,
        elem: Box<TypeExpr>,
    },
    Array {
        pos: Pos,
        len: Box<Expr>,
        elem: Box<TypeExpr>,
    },
    Map {
        pos: Pos,
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Chan {
        pos: Pos,
        dir: ChanDir,
        elem: Box<TypeExpr>,
    },
    Struct {
        pos: Pos,
        fields: Vec<StructField>,
    },
    Interface {
        pos: Pos,
        embeds: Vec<TypeExpr>,
        methods: Vec<InterfaceMethod>,
    },
    Func {
        pos: Pos,
        sig: Box<FuncSig>,
    },
    Union {
        pos: Pos,
        terms: Vec<UnionTermExpr>,
    },
}

impl TypeExpr {
    pub fn pos(&self) -> Pos {
        match self {
            TypeExpr::Name(id) => id.pos,
            TypeExpr::Pointer { pos, .. }
            | TypeExpr::Slice { pos, .. }
            | TypeExpr::Array { pos, .. }
            | TypeExpr::Map { pos, .. }
            | TypeExpr::Chan { pos, .. }
            | TypeExpr::Struct { pos, .. }
            | TypeExpr::Interface { pos, .. }
            | TypeExpr::Func { pos, .. }
            | TypeExpr::Union { pos, .. } => *pos,
        }
    }
}

/// A (constant) expression.
#[derive(Clone, Debug)]
pub enum Expr {
    IntLit { pos: Pos, value: i64 },
    FloatLit { pos: Pos, value: f64 },
    StrLit { pos: Pos, value: String },
    BoolLit { pos: Pos, value: bool },
    /// The per-spec ordinal inside a const block.
    Iota { pos: Pos },
    Name(Ident),
    /// A call; stands in for multi-valued initializers.
    Call { pos: Pos, func: Ident, args: Vec<Expr> },
    Paren { pos: Pos, inner: Box<Expr> },
}

impl Expr {
    pub fn pos(&self) -> Pos {
        match self {
            Expr::IntLit { pos, .. }
            | Expr::FloatLit { pos, .. }
            | Expr::StrLit { pos, .. }
            | Expr::BoolLit { pos, .. }
            | Expr::Iota { pos }
            | Expr::Call { pos, .. }
            | Expr::Paren { pos, .. } => *pos,
            Expr::Name(id) => id.pos,
        }
    }
}

/// Convenience constructors used by front ends and tests.
impl TypeExpr {
    pub fn name(n: impl Into<String>) -> TypeExpr {
        TypeExpr::Name(Ident::new(Pos::NONE, n))
    }

    pub fn pointer(elem: TypeExpr) -> TypeExpr {
        TypeExpr::Pointer {
            pos: Pos::NONE,
            elem: Box::new(elem),
        }
    }
}

impl Expr {
    pub fn int(v: i64) -> Expr {
        Expr::IntLit {
            pos: Pos::NONE,
            value: v,
        }
    }

    pub fn name(n: impl Into<String>) -> Expr {
        Expr::Name(Ident::new(Pos::NONE, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions() {
        let e = Expr::Name(Ident::new(Pos(7), "x"));
        assert_eq!(e.pos(), Pos(7));
        let t = TypeExpr::Pointer {
            pos: Pos(9),
            elem: Box::new(TypeExpr::name("T")),
        };
        assert_eq!(t.pos(), Pos(9));
    }
}
