//! Sable Abstract Syntax Tree.
//!
//! This crate only defines node shapes. Producing a tree (lexing, parsing,
//! macro expansion) is someone else's job — see `spec.md` §1, which lists
//! the parser as an external collaborator the type-guessing pass consumes
//! but does not implement.

mod expressions;
mod generics;
mod infrastructure;
mod items;
mod types;

pub use expressions::{
    BinOp, Block, CallArg, Expr, FloatKind, IntKind, StringInterpPart, WhenClause,
};
pub use generics::GenericParam;
pub use infrastructure::{Span, Spanned};
pub use items::{Def, Module, Param, Stmt, TypeDef, TypeDefKind};
pub use types::TypeNode;
