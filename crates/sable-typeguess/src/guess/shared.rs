//! Machinery shared by C3 and C4: the legality-checked name lookup every
//! resolution in both guessers funnels through, and call-guessing rule 6's
//! body inference (`spec.md` §4.2.1, §4.2.5), which recurses back into C3
//! regardless of which guesser triggered it (the declared return type of a
//! method is always concrete).

use sable_ast::{Expr, Spanned, Stmt, TypeNode};

use crate::context::PassCtx;
use crate::legality;
use crate::model::ResolvedType;
use crate::oracle::{DefCandidate, LookupRoot};
use crate::returns;

use super::concrete::guess_type;
use super::GuessInputs;

/// Resolve `node` from `root`, then run it through the legality check
/// (C7). On rejection, records the error on `ctx.error_slot` and returns
/// `None` — exactly like any other resolution that "doesn't know".
pub(crate) fn resolve_and_check(
    ctx: &mut PassCtx,
    root: &LookupRoot,
    node: &TypeNode,
    allow_typeof: bool,
    site: sable_ast::Span,
) -> Option<ResolvedType> {
    let resolved = ctx.resolver.lookup(root, node, allow_typeof)?;
    let (ok, err) = legality::check(ctx.resolver, resolved, site);
    if let Some(e) = err {
        ctx.record_error(e);
    }
    ok
}

/// Merges every `Some` in `types`, or returns `None` if all of them were
/// `None` — the "merge of N branches, any subset allowed" shape that
/// shows up for `Binary`/`If`/`Unless`/`Case`/array-literal element lists.
pub(crate) fn merge_some(ctx: &PassCtx, types: Vec<ResolvedType>) -> Option<ResolvedType> {
    if types.is_empty() {
        None
    } else {
        Some(ctx.algebra.merge(&types))
    }
}

/// The last `Stmt::Expr` in a body, if the body ends in one — used to
/// guess the "falls off the end" value of an `if`/`case`/method body.
pub(crate) fn last_expr(body: &[Spanned<Stmt>]) -> Option<&Spanned<Expr>> {
    body.iter().rev().find_map(|s| match &s.node {
        Stmt::Expr(e) => Some(e),
        Stmt::TypeDef(_) | Stmt::Def(_) => None,
    })
}

/// `spec.md` §4.2.1 rule 6 / §4.2.5: guess the type of calling `name` on
/// `owner`, with `arg_count` arguments and `has_block` indicating a block
/// was passed. Looks up candidate definitions, prefers a unanimous
/// declared return type, and falls back to guessing through a single
/// candidate's body.
pub(crate) fn guess_from_method_annotation(
    ctx: &mut PassCtx,
    inputs: &GuessInputs,
    owner: &ResolvedType,
    name: &str,
    arg_count: usize,
    has_block: bool,
) -> Option<ResolvedType> {
    let metaclass = ctx.resolver.metaclass_of(owner);
    let mut candidates = ctx.resolver.candidate_defs(&metaclass, name, has_block, arg_count);
    if candidates.is_empty() {
        return None;
    }

    // `new` with no arguments and no block: only the first (most-derived)
    // candidate is considered — an inherited no-arg `initialize` further up
    // the chain is not also guessed through. `spec.md` §9's design note.
    if name == "new" && arg_count == 0 && !has_block {
        candidates.truncate(1);
    }

    if let Some(unanimous) = unanimous_declared_return(&candidates) {
        return Some(unanimous);
    }

    if candidates.len() == 1 {
        return infer_from_body(ctx, inputs, &candidates[0]);
    }

    None
}

fn unanimous_declared_return(candidates: &[DefCandidate]) -> Option<ResolvedType> {
    let mut types = candidates.iter().map(|c| c.declared_return.as_ref());
    let first = types.next()??.clone();
    if types.all(|t| t == Some(&first)) {
        Some(first)
    } else {
        None
    }
}

fn infer_from_body(ctx: &mut PassCtx, inputs: &GuessInputs, candidate: &DefCandidate) -> Option<ResolvedType> {
    if ctx.method_cycle_contains(&candidate.def) {
        return None;
    }
    ctx.push_method(&candidate.def);

    let saved_args = std::mem::replace(&mut ctx.current_args, candidate.def.node.args.clone());
    let saved_block_arg = std::mem::replace(&mut ctx.current_block_arg, candidate.def.node.block_arg.clone());
    let owner_guard = ctx.push_owner(candidate.owner.clone());

    let mut gathered = Vec::new();
    for ret in returns::gather_returns(&candidate.def.node.body) {
        match ret {
            Some(e) => {
                if let Some(t) = guess_type(ctx, inputs, e) {
                    gathered.push(t);
                }
            }
            None => gathered.push(ResolvedType::Nil),
        }
    }
    if let Some(tail) = last_expr(&candidate.def.node.body) {
        if let Some(t) = guess_type(ctx, inputs, tail) {
            gathered.push(t);
        }
    }

    ctx.pop_owner(owner_guard);
    ctx.current_args = saved_args;
    ctx.current_block_arg = saved_block_arg;
    ctx.pop_method();

    merge_some(ctx, gathered)
}
