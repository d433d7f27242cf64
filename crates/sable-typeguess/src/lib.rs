//! Variable-type guessing: the semantic pass that assigns a best-effort
//! type to every global, class variable, and instance variable that has
//! no explicit type annotation.
//!
//! The pass is a single pre-order traversal (`attribution`, C5) over the
//! program, dispatching each assignment's right-hand side through one of
//! two pure guessers — [`guess::concrete::guess_type`] (C3) for a
//! concrete owner, [`guess::expr_vars::guess_type_vars`] (C4) for a
//! generic one — after running it past the self-detector (`self_detect`,
//! C1), the return-gatherer (`returns`, C2), and the generics-legality
//! check (`legality`, C7). Everything the pass needs from the rest of the
//! compiler — name resolution, the type algebra, the symbol table — is
//! named as a trait in `oracle` and supplied by the caller.

pub mod attribution;
pub mod context;
pub mod error;
pub mod guess;
pub mod legality;
pub mod model;
pub mod oracle;
pub mod returns;
pub mod self_detect;

#[cfg(test)]
pub(crate) mod testutil;

#[cfg(test)]
mod scenarios;


pub use attribution::run;
pub use context::{OwnerGuard, PassCtx};
pub use error::{DisallowedVariableType, GuessResult, InstanceVarForbiddenHere};
pub use model::{
    Buckets, DisallowedKind, ErrorRecord, ExplicitInstanceVars, InitializeInfo, InstanceVarTypeInfo, ResolvedType, TypeDeclarationWithLocation, TypeExpr, TypeInfo,
};
pub use oracle::{ConstantRef, DefCandidate, ForeignFnSig, ForeignLibrary, LookupRoot, OwnerKind, Resolver, SymbolTable, TypeAlgebra};
