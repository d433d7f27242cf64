//! C4 — the type-expression-guesser (`spec.md` §4.3). The parallel of C3
//! for a generic owner: since a generic class's instance variables can't
//! be resolved to a concrete type until the class is instantiated, this
//! guesser produces a list of type *expressions* (resolved where it can
//! be, left as syntax where it mentions the owner's own type parameters)
//! instead of a single `ResolvedType`.
//!
//! Only the node shapes that can actually reference a generic owner's type
//! parameters get their own case; everything else falls back to C3 and
//! wraps the single resolved type it produces.

use sable_ast::{Expr, Spanned, TypeNode};

use crate::context::PassCtx;
use crate::model::TypeExpr;

use super::concrete::guess_type;
use super::shared::resolve_and_check;
use super::GuessInputs;

pub fn guess_type_vars(ctx: &mut PassCtx, inputs: &GuessInputs, expr: &Spanned<Expr>) -> Option<Vec<TypeExpr>> {
    match &expr.node {
        Expr::Var(name) => guess_var_vars(ctx, inputs, name),
        Expr::InstanceVar(name) => guess_instance_var_vars(ctx, inputs, name),
        Expr::ArrayLiteral { elements, of, ctor } if ctor.is_none() => guess_array_vars(ctx, inputs, elements, of),

        _ => guess_type(ctx, inputs, expr).map(|t| vec![TypeExpr::Resolved(t)]),
    }
}

fn guess_var_vars(ctx: &mut PassCtx, inputs: &GuessInputs, name: &str) -> Option<Vec<TypeExpr>> {
    if name == "self" {
        return None;
    }
    if let Some(param) = ctx.lookup_block_param(name).cloned() {
        if let Some(restriction) = param.restriction {
            return Some(vec![TypeExpr::Unresolved(restriction)]);
        }
        if let Some(default) = &param.default_value {
            return guess_type_vars(ctx, inputs, default);
        }
        return None;
    }
    if let Some(block_arg) = ctx.current_block_arg.clone() {
        if block_arg.name.node == name {
            return match &block_arg.restriction {
                Some(r) => Some(vec![TypeExpr::Unresolved(r.clone())]),
                None => Some(vec![TypeExpr::Resolved(ctx.algebra.proc_void())]),
            };
        }
    }
    let param = ctx.current_args.iter().find(|p| p.name.node == name)?.clone();
    if let Some(restriction) = param.restriction {
        return Some(vec![TypeExpr::Unresolved(restriction)]);
    }
    if let Some(default) = &param.default_value {
        return guess_type_vars(ctx, inputs, default);
    }
    None
}

fn guess_instance_var_vars(ctx: &mut PassCtx, inputs: &GuessInputs, name: &str) -> Option<Vec<TypeExpr>> {
    let owner = ctx.current_owner()?.clone();
    if let Some(decl) = inputs.explicit.get(&owner, name) {
        return Some(vec![TypeExpr::Resolved(decl.ty.clone())]);
    }
    let info = inputs.buckets.guessed_instance_vars.get(&owner)?.get(name)?;
    Some(info.type_vars.clone())
}

fn guess_array_vars(
    ctx: &mut PassCtx,
    inputs: &GuessInputs,
    elements: &[Spanned<Expr>],
    of: &Option<Spanned<TypeNode>>,
) -> Option<Vec<TypeExpr>> {
    if let Some(of) = of {
        return match resolve_and_check(ctx, &ctx.lookup_root(), &of.node, false, of.span) {
            Some(elem) => Some(vec![TypeExpr::Resolved(ctx.algebra.array(elem))]),
            None => Some(vec![TypeExpr::Unresolved(Spanned::new(
                TypeNode::Path {
                    names: vec!["Array".into()],
                    type_vars: vec![of.clone()],
                },
                of.span,
            ))]),
        };
    }
    let mut out = Vec::new();
    for e in elements {
        if let Some(mut parts) = guess_type_vars(ctx, inputs, e) {
            out.append(&mut parts);
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
