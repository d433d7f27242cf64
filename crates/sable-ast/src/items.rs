//! Declarations: methods, classes/modules/enums, and the statement/module
//! shells that hold them together.

use crate::expressions::Expr;
use crate::generics::GenericParam;
use crate::infrastructure::Spanned;
use crate::types::TypeNode;

/// A formal parameter, a block parameter, or a block argument restriction.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Spanned<String>,
    pub restriction: Option<Spanned<TypeNode>>,
    pub default_value: Option<Box<Spanned<Expr>>>,
    pub is_splat: bool,
    pub is_double_splat: bool,
}

impl Param {
    pub fn simple(name: impl Into<String>) -> Self {
        Param {
            name: Spanned::new(name.into(), Default::default()),
            restriction: None,
            default_value: None,
            is_splat: false,
            is_double_splat: false,
        }
    }
}

/// A method definition: `def initialize(x : Int32); @x = x; end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Def {
    pub name: Spanned<String>,
    pub args: Vec<Param>,
    pub block_arg: Option<Param>,
    pub return_type: Option<Spanned<TypeNode>>,
    pub body: Vec<Spanned<Stmt>>,
    pub is_abstract: bool,
    /// The definition this one shadows, if any — `spec.md` §4.1's Def rule
    /// walks this chain to decide whether a redefinition "reaches back" to
    /// an earlier one instead of hiding it outright.
    pub previous: Option<Box<Spanned<Def>>>,
}

/// What kind of type-like scope a `TypeDef` introduces. Only `Class` and
/// `Struct` are concrete-value owners; `Module` may or may not own instance
/// variables depending on whether it is ever included as a mixin (that
/// distinction is resolved downstream — this pass only needs to know it is
/// not the top-level program, so instance vars are legal on it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDefKind {
    Class,
    Struct,
    Module,
    Enum,
}

/// A class/struct/module/enum definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub kind: TypeDefKind,
    pub name: Spanned<String>,
    pub generics: Vec<GenericParam>,
    pub superclass: Option<Spanned<TypeNode>>,
    pub body: Vec<Spanned<Stmt>>,
}

impl TypeDef {
    pub fn is_generic(&self) -> bool {
        !self.generics.is_empty()
    }
}

/// A statement: an expression, or a nested declaration. Declarations are
/// statements (not a separate "item" tier) because Sable, like the
/// language this pass's original implementation targets, allows classes
/// and methods to be defined anywhere a statement may appear.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Spanned<Expr>),
    TypeDef(Spanned<TypeDef>),
    Def(Spanned<Def>),
}

/// A whole compilation unit: the implicit top-level program body.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Spanned<Stmt>>,
}
