//! C2 — the return-gatherer (`spec.md` §4.7).
//!
//! Collects every explicit `return e` in a method body, with a `nil`
//! placeholder for bare `return`, for use by the body-inference step of
//! `guess_type`'s call-guessing rule (`spec.md` §4.2.5).

use sable_ast::{Expr, Spanned, Stmt};

/// A gathered `return`. `None` stands for a bare `return` (guesses as nil).
pub type GatheredReturn<'a> = Option<&'a Spanned<Expr>>;

pub fn gather_returns(body: &[Spanned<Stmt>]) -> Vec<GatheredReturn<'_>> {
    let mut out = Vec::new();
    for stmt in body {
        walk_stmt(stmt, &mut out);
    }
    out
}

fn walk_stmt<'a>(stmt: &'a Spanned<Stmt>, out: &mut Vec<GatheredReturn<'a>>) {
    match &stmt.node {
        Stmt::Expr(e) => walk_expr(e, out),
        // A nested def/class has its own return targets.
        Stmt::TypeDef(_) | Stmt::Def(_) => {}
    }
}

fn walk_stmts<'a>(stmts: &'a [Spanned<Stmt>], out: &mut Vec<GatheredReturn<'a>>) {
    for s in stmts {
        walk_stmt(s, out);
    }
}

fn walk_expr<'a>(expr: &'a Spanned<Expr>, out: &mut Vec<GatheredReturn<'a>>) {
    match &expr.node {
        Expr::Return(inner) => out.push(inner.as_deref()),

        Expr::Binary { left, right, .. } => {
            walk_expr(left, out);
            walk_expr(right, out);
        }
        Expr::Not(inner) => walk_expr(inner, out),

        Expr::If { cond, then, else_ } | Expr::Unless { cond, then, else_ } => {
            walk_expr(cond, out);
            walk_stmts(then, out);
            if let Some(e) = else_ {
                walk_stmts(e, out);
            }
        }
        Expr::Case { subject, whens, else_ } => {
            if let Some(s) = subject {
                walk_expr(s, out);
            }
            for w in whens {
                for c in &w.conditions {
                    walk_expr(c, out);
                }
                walk_stmts(&w.body, out);
            }
            if let Some(e) = else_ {
                walk_stmts(e, out);
            }
        }

        Expr::Call { obj, args, block, .. } => {
            if let Some(o) = obj {
                walk_expr(o, out);
            }
            for a in args {
                walk_expr(&a.value, out);
            }
            if let Some(b) = block {
                walk_stmts(&b.body, out);
            }
        }

        Expr::Assign { target, value } => {
            walk_expr(target, out);
            walk_expr(value, out);
        }
        Expr::MultiAssign { targets, values } => {
            for t in targets {
                walk_expr(t, out);
            }
            for v in values {
                walk_expr(v, out);
            }
        }
        Expr::TypeDeclaration { target, value, .. } => {
            walk_expr(target, out);
            walk_expr(value, out);
        }
        Expr::UninitializedDeclaration { target, .. } => walk_expr(target, out),

        Expr::ArrayLiteral { elements, .. } => {
            for e in elements {
                walk_expr(e, out);
            }
        }
        Expr::HashLiteral { entries, .. } => {
            for (k, v) in entries {
                walk_expr(k, out);
                walk_expr(v, out);
            }
        }
        Expr::TupleLiteral(elements) => {
            for e in elements {
                walk_expr(e, out);
            }
        }
        Expr::NamedTupleLiteral(fields) => {
            for (_, v) in fields {
                walk_expr(v, out);
            }
        }
        Expr::Range { from, to, .. } => {
            if let Some(f) = from {
                walk_expr(f, out);
            }
            if let Some(t) = to {
                walk_expr(t, out);
            }
        }
        Expr::Cast { obj, .. } | Expr::NilableCast { obj, .. } => walk_expr(obj, out),
        Expr::IsA { obj, .. } | Expr::RespondsTo { obj, .. } => walk_expr(obj, out),
        Expr::Generic { base, .. } => walk_expr(base, out),
        Expr::Expressions(stmts) => walk_stmts(stmts, out),
        Expr::MacroLike(inner) => walk_expr(inner, out),
        Expr::StringInterp(parts) => {
            for p in parts {
                if let sable_ast::StringInterpPart::Expr(e) = p {
                    walk_expr(e, out);
                }
            }
        }

        Expr::IntLiteral(_)
        | Expr::FloatLiteral(_)
        | Expr::CharLiteral(_)
        | Expr::BoolLiteral(_)
        | Expr::NilLiteral
        | Expr::StringLiteral(_)
        | Expr::SymbolLiteral(_)
        | Expr::RegexLiteral(_)
        | Expr::Nop
        | Expr::Path(_)
        | Expr::Var(_)
        | Expr::InstanceVar(_)
        | Expr::ClassVar(_)
        | Expr::Global(_)
        | Expr::Uninitialized(_)
        | Expr::SizeOf(_)
        | Expr::InstanceSizeOf(_) => {}
    }
}
