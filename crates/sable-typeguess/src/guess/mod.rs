//! C3 and C4 — the two type-guessers (`spec.md` §4.2, §4.3), plus the
//! resolution/body-inference machinery (§4.2.1 rule 6, §4.2.5) they share.

pub mod concrete;
pub mod expr_vars;
mod shared;

pub use concrete::guess_type;
pub use expr_vars::guess_type_vars;

use crate::model::{Buckets, ExplicitInstanceVars};

/// Read-only access to the state built up so far by the attribution
/// visitor, needed by `@x = @y`-style self-referential guesses
/// (`spec.md` §4.2.3) and by body inference recursing back through
/// already-declared instance variables.
pub struct GuessInputs<'a> {
    pub explicit: &'a ExplicitInstanceVars,
    pub buckets: &'a Buckets,
}
