//! Expression AST nodes.

use crate::infrastructure::Spanned;
use crate::items::{Param, Stmt};
use crate::types::TypeNode;

/// Integer literal suffix / inferred width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

/// Float literal suffix / inferred width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    F32,
    F64,
}

/// Binary operator. Kept coarse — the guesser only needs to know an
/// expression *is* a binary op, not which one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Eq,
    Lt,
    Gt,
    Other,
}

/// One segment of a string interpolation: `"hi #{name}"`.
#[derive(Debug, Clone, PartialEq)]
pub enum StringInterpPart {
    Lit(String),
    Expr(Box<Spanned<Expr>>),
}

/// One `when` arm of a `case` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct WhenClause {
    pub conditions: Vec<Spanned<Expr>>,
    pub body: Vec<Spanned<Stmt>>,
}

/// A block passed to a call: `arr.each { |x| ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub args: Vec<Param>,
    pub body: Vec<Spanned<Stmt>>,
}

/// An argument passed `out`-by-reference to a foreign-library call, e.g.
/// `LibC.frexp(x, out exp)` — see `spec.md` §4.1.2.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArg {
    pub value: Spanned<Expr>,
    pub is_out: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLiteral(IntKind),
    FloatLiteral(FloatKind),
    CharLiteral(char),
    BoolLiteral(bool),
    NilLiteral,
    StringLiteral(String),
    StringInterp(Vec<StringInterpPart>),
    SymbolLiteral(String),
    RegexLiteral(String),

    /// `a..b` / `a...b`
    Range {
        from: Option<Box<Spanned<Expr>>>,
        to: Option<Box<Spanned<Expr>>>,
        exclusive: bool,
    },

    /// `[a, b, c]`, `[a, b] of T`, or `Set{a, b}` (explicit constructor —
    /// `ctor` holds the written type when present).
    ArrayLiteral {
        elements: Vec<Spanned<Expr>>,
        of: Option<Spanned<TypeNode>>,
        ctor: Option<Spanned<TypeNode>>,
    },

    /// `{a => 1, b => 2}` / `{} of K => V`
    HashLiteral {
        entries: Vec<(Spanned<Expr>, Spanned<Expr>)>,
        of: Option<(Spanned<TypeNode>, Spanned<TypeNode>)>,
    },

    TupleLiteral(Vec<Spanned<Expr>>),
    NamedTupleLiteral(Vec<(Spanned<String>, Spanned<Expr>)>),

    Binary {
        op: BinOp,
        left: Box<Spanned<Expr>>,
        right: Box<Spanned<Expr>>,
    },
    Not(Box<Spanned<Expr>>),

    If {
        cond: Box<Spanned<Expr>>,
        then: Vec<Spanned<Stmt>>,
        else_: Option<Vec<Spanned<Stmt>>>,
    },
    Unless {
        cond: Box<Spanned<Expr>>,
        then: Vec<Spanned<Stmt>>,
        else_: Option<Vec<Spanned<Stmt>>>,
    },
    /// `case subject; when a, b then ...; else ...; end`. `subject` is
    /// `None` for a subject-less case (a chain of boolean `when`s).
    Case {
        subject: Option<Box<Spanned<Expr>>>,
        whens: Vec<WhenClause>,
        else_: Option<Vec<Spanned<Stmt>>>,
    },

    IsA {
        obj: Box<Spanned<Expr>>,
        ty: Spanned<TypeNode>,
    },
    RespondsTo {
        obj: Box<Spanned<Expr>>,
        name: String,
    },
    SizeOf(Spanned<TypeNode>),
    InstanceSizeOf(Spanned<TypeNode>),
    Nop,

    /// `uninitialized T` used as a value, e.g. `x = uninitialized Int32`.
    Uninitialized(Spanned<TypeNode>),

    /// `e.as(T)`
    Cast {
        obj: Box<Spanned<Expr>>,
        to: Spanned<TypeNode>,
    },
    /// `e.as?(T)`
    NilableCast {
        obj: Box<Spanned<Expr>>,
        to: Spanned<TypeNode>,
    },

    /// A name reference. `self` is represented as `Var("self")` rather
    /// than a dedicated node, matching how the pass's self-detector
    /// (`spec.md` §4.6) looks for it.
    Var(String),
    InstanceVar(String),
    ClassVar(String),
    Global(String),
    /// A constant path: `Foo`, `Foo::Bar`.
    Path(Vec<String>),
    /// A generic instantiation used in expression position, e.g.
    /// `Pointer(Int32)` as the receiver of `.malloc`.
    Generic {
        base: Box<Spanned<Expr>>,
        type_vars: Vec<Spanned<TypeNode>>,
    },

    Call {
        obj: Option<Box<Spanned<Expr>>>,
        name: String,
        args: Vec<CallArg>,
        block: Option<Block>,
    },

    Assign {
        target: Box<Spanned<Expr>>,
        value: Box<Spanned<Expr>>,
    },
    MultiAssign {
        targets: Vec<Spanned<Expr>>,
        values: Vec<Spanned<Expr>>,
    },
    /// `v :: T` — declared but not assigned.
    UninitializedDeclaration {
        target: Box<Spanned<Expr>>,
        declared_type: Spanned<TypeNode>,
    },
    /// `v : T = e`
    TypeDeclaration {
        target: Box<Spanned<Expr>>,
        declared_type: Spanned<TypeNode>,
        value: Box<Spanned<Expr>>,
    },

    /// A bare sequence of statements used as an expression (the body of a
    /// `begin ... end`, or the top level of a parenthesized group).
    Expressions(Vec<Spanned<Stmt>>),

    /// A macro-expanded node the parser already expanded but kept as a
    /// marker so outside-def traversal can still walk into it.
    MacroLike(Box<Spanned<Expr>>),

    /// `return e` (bare `return` carries `None`).
    Return(Option<Box<Spanned<Expr>>>),
}
