//! C3 — the type-guesser (`spec.md` §4.2): a pure dispatch from an AST
//! node to a concrete type, or none. Pure over the read-only AST and
//! symbol table; the only mutation is to the two cycle-breaking stacks and
//! `ctx.error_slot` when a sub-resolution is legality-rejected.

use sable_ast::{CallArg, Expr, Spanned, TypeNode};

use crate::context::PassCtx;
use crate::oracle::{LookupRoot, OwnerKind};

use super::shared::{guess_from_method_annotation, last_expr, merge_some, resolve_and_check};
use super::GuessInputs;
use crate::model::ResolvedType;

pub fn guess_type(ctx: &mut PassCtx, inputs: &GuessInputs, expr: &Spanned<Expr>) -> Option<ResolvedType> {
    match &expr.node {
        Expr::IntLiteral(k) => Some(ResolvedType::Int(*k)),
        Expr::FloatLiteral(k) => Some(ResolvedType::Float(*k)),
        Expr::CharLiteral(_) => Some(ResolvedType::Char),
        Expr::BoolLiteral(_) => Some(ResolvedType::Bool),
        Expr::NilLiteral => Some(ResolvedType::Nil),
        Expr::StringLiteral(_) | Expr::StringInterp(_) => Some(ResolvedType::Str),
        Expr::SymbolLiteral(_) => Some(ResolvedType::Symbol),
        Expr::RegexLiteral(_) => Some(ResolvedType::Regex),

        Expr::Range { from, to, .. } => {
            let (Some(f), Some(t)) = (from, to) else { return None };
            let f = guess_type(ctx, inputs, f)?;
            let t = guess_type(ctx, inputs, t)?;
            Some(ctx.algebra.range(f, t))
        }

        Expr::ArrayLiteral { elements, of, ctor } => guess_array(ctx, inputs, elements, of, ctor, expr.span),
        Expr::HashLiteral { entries, of } => guess_hash(ctx, inputs, entries, of),

        Expr::TupleLiteral(elements) => {
            let guessed = elements
                .iter()
                .map(|e| guess_type(ctx, inputs, e))
                .collect::<Option<Vec<_>>>()?;
            Some(ctx.algebra.tuple(guessed))
        }
        Expr::NamedTupleLiteral(fields) => {
            let guessed = fields
                .iter()
                .map(|(name, e)| guess_type(ctx, inputs, e).map(|t| (name.node.clone(), t)))
                .collect::<Option<Vec<_>>>()?;
            Some(ctx.algebra.named_tuple(guessed))
        }

        Expr::Binary { left, right, .. } => {
            let l = guess_type(ctx, inputs, left);
            let r = guess_type(ctx, inputs, right);
            merge_some(ctx, l.into_iter().chain(r).collect())
        }
        Expr::If { then, else_, .. } | Expr::Unless { then, else_, .. } => {
            let a = last_expr(then).and_then(|e| guess_type(ctx, inputs, e));
            let b = else_.as_deref().and_then(last_expr).and_then(|e| guess_type(ctx, inputs, e));
            merge_some(ctx, a.into_iter().chain(b).collect())
        }
        Expr::Case { whens, else_, .. } => {
            let mut guessed = Vec::new();
            for w in whens {
                if let Some(t) = last_expr(&w.body).and_then(|e| guess_type(ctx, inputs, e)) {
                    guessed.push(t);
                }
            }
            if let Some(t) = else_.as_deref().and_then(last_expr).and_then(|e| guess_type(ctx, inputs, e)) {
                guessed.push(t);
            }
            merge_some(ctx, guessed)
        }

        Expr::Not(_) | Expr::IsA { .. } | Expr::RespondsTo { .. } => Some(ResolvedType::Bool),
        Expr::SizeOf(_) | Expr::InstanceSizeOf(_) => Some(ResolvedType::Int(sable_ast::IntKind::I32)),
        Expr::Nop => Some(ResolvedType::Nil),

        Expr::Uninitialized(declared) => resolve_and_check(ctx, &ctx.lookup_root(), &declared.node, false, declared.span),

        Expr::Cast { obj, to } => {
            if let TypeNode::TypeOf(exprs) = &to.node {
                if let [single] = exprs.as_slice() {
                    return guess_type(ctx, inputs, single);
                }
            }
            resolve_and_check(ctx, &ctx.lookup_root(), &to.node, true, to.span)
        }
        Expr::NilableCast { to, .. } => {
            let resolved = resolve_and_check(ctx, &ctx.lookup_root(), &to.node, true, to.span)?;
            Some(ctx.algebra.nilable(resolved))
        }

        Expr::Var(name) => guess_var(ctx, inputs, name),
        Expr::InstanceVar(name) => guess_instance_var(ctx, inputs, name),
        Expr::Path(names) => guess_path(ctx, inputs, names, expr.span),

        Expr::Call { obj, name, args, block } => guess_call(ctx, inputs, obj.as_deref(), name, args, block.is_some(), expr.span),

        Expr::Expressions(stmts) => last_expr(stmts).and_then(|e| guess_type(ctx, inputs, e)),

        Expr::ClassVar(_)
        | Expr::Global(_)
        | Expr::Generic { .. }
        | Expr::Assign { .. }
        | Expr::MultiAssign { .. }
        | Expr::UninitializedDeclaration { .. }
        | Expr::TypeDeclaration { .. }
        | Expr::MacroLike(_)
        | Expr::Return(_) => None,
    }
}

fn guess_array(
    ctx: &mut PassCtx,
    inputs: &GuessInputs,
    elements: &[Spanned<Expr>],
    of: &Option<Spanned<TypeNode>>,
    ctor: &Option<Spanned<TypeNode>>,
    site: sable_ast::Span,
) -> Option<ResolvedType> {
    if let Some(ctor) = ctor {
        let base = ctx.resolver.lookup(&ctx.lookup_root(), &ctor.node, false)?;
        if ctx.resolver.is_uninstantiated_generic(&base) {
            let elem = merge_elements(ctx, inputs, elements)?;
            let ResolvedType::Named { name, .. } = base else {
                return None;
            };
            return Some(ResolvedType::Named { name, generics: vec![elem] });
        }
        let (ok, err) = crate::legality::check(ctx.resolver, base, ctor.span);
        if let Some(e) = err {
            ctx.record_error(e);
        }
        return ok;
    }
    if let Some(of) = of {
        let elem = resolve_and_check(ctx, &ctx.lookup_root(), &of.node, false, of.span)?;
        return Some(ctx.algebra.array(elem));
    }
    let elem = merge_elements(ctx, inputs, elements)?;
    let _ = site;
    Some(ctx.algebra.array(elem))
}

fn merge_elements(ctx: &mut PassCtx, inputs: &GuessInputs, elements: &[Spanned<Expr>]) -> Option<ResolvedType> {
    let guessed: Vec<ResolvedType> = elements.iter().filter_map(|e| guess_type(ctx, inputs, e)).collect();
    merge_some(ctx, guessed)
}

fn guess_hash(
    ctx: &mut PassCtx,
    inputs: &GuessInputs,
    entries: &[(Spanned<Expr>, Spanned<Expr>)],
    of: &Option<(Spanned<TypeNode>, Spanned<TypeNode>)>,
) -> Option<ResolvedType> {
    if let Some((k, v)) = of {
        let key = resolve_and_check(ctx, &ctx.lookup_root(), &k.node, false, k.span)?;
        let value = resolve_and_check(ctx, &ctx.lookup_root(), &v.node, false, v.span)?;
        return Some(ctx.algebra.hash(key, value));
    }
    let keys: Vec<ResolvedType> = entries.iter().filter_map(|(k, _)| guess_type(ctx, inputs, k)).collect();
    let key = merge_some(ctx, keys)?;
    let values: Vec<ResolvedType> = entries.iter().filter_map(|(_, v)| guess_type(ctx, inputs, v)).collect();
    let value = merge_some(ctx, values)?;
    Some(ctx.algebra.hash(key, value))
}

fn guess_var(ctx: &mut PassCtx, inputs: &GuessInputs, name: &str) -> Option<ResolvedType> {
    if name == "self" {
        let owner = ctx.current_owner()?.clone();
        return match ctx.resolver.owner_kind(&owner) {
            OwnerKind::Concrete | OwnerKind::ConcreteModule => Some(ctx.resolver.virtualized(&owner)),
            OwnerKind::TopLevel | OwnerKind::Generic => None,
        };
    }
    if let Some(param) = ctx.lookup_block_param(name).cloned() {
        if let Some(restriction) = &param.restriction {
            return resolve_and_check(ctx, &ctx.lookup_root(), &restriction.node, false, restriction.span);
        }
        if let Some(default) = &param.default_value {
            return guess_type(ctx, inputs, default);
        }
        return None;
    }
    if let Some(block_arg) = ctx.current_block_arg.clone() {
        if block_arg.name.node == name {
            return match &block_arg.restriction {
                Some(r) => resolve_and_check(ctx, &ctx.lookup_root(), &r.node, false, r.span),
                None => Some(ctx.algebra.proc_void()),
            };
        }
    }
    let param = ctx.current_args.iter().find(|p| p.name.node == name)?.clone();
    if let Some(restriction) = &param.restriction {
        return resolve_and_check(ctx, &ctx.lookup_root(), &restriction.node, false, restriction.span);
    }
    if let Some(default) = &param.default_value {
        return guess_type(ctx, inputs, default);
    }
    None
}

fn guess_instance_var(ctx: &mut PassCtx, inputs: &GuessInputs, name: &str) -> Option<ResolvedType> {
    let owner = ctx.current_owner()?.clone();
    if let Some(decl) = inputs.explicit.get(&owner, name) {
        return Some(decl.ty.clone());
    }
    let info = inputs.buckets.guessed_instance_vars.get(&owner)?.get(name)?;
    match info.type_vars.first()? {
        crate::model::TypeExpr::Resolved(t) => Some(t.clone()),
        crate::model::TypeExpr::Unresolved(_) => None,
    }
}

fn guess_path(ctx: &mut PassCtx, inputs: &GuessInputs, names: &[String], site: sable_ast::Span) -> Option<ResolvedType> {
    let root = ctx.lookup_root();
    let as_type_node = TypeNode::Path { names: names.to_vec(), type_vars: vec![] };
    if let Some(ty) = resolve_and_check(ctx, &root, &as_type_node, false, site) {
        return Some(ctx.resolver.metaclass_of(&ty));
    }

    let constant = ctx.resolver.resolve_constant(&root, names)?;
    if let Some(enum_ty) = &constant.enum_member_type {
        return Some(enum_ty.clone());
    }
    if ctx.constant_cycle_contains(&constant.id) {
        return None;
    }
    ctx.push_constant(constant.id.clone());
    let result = guess_type(ctx, inputs, &constant.value);
    ctx.pop_constant();
    result
}

fn guess_call(
    ctx: &mut PassCtx,
    inputs: &GuessInputs,
    obj: Option<&Spanned<Expr>>,
    name: &str,
    args: &[CallArg],
    has_block: bool,
    site: sable_ast::Span,
) -> Option<ResolvedType> {
    let root = ctx.lookup_root();

    // Rule 1: `T.new` / `T(X).new`.
    if name == "new" {
        if let Some(receiver_names) = path_like(obj) {
            return match resolve_and_check(ctx, &root, &receiver_names, false, site) {
                Some(ty) => guess_from_method_annotation(ctx, inputs, &ty, "new", args.len(), has_block).or(Some(ty)),
                None => None,
            };
        }
    }

    // Rule 2: unqualified `new` inside a concrete owner.
    if obj.is_none() && name == "new" {
        if let Some(owner) = ctx.current_owner().cloned() {
            if matches!(ctx.resolver.owner_kind(&owner), OwnerKind::Concrete | OwnerKind::ConcreteModule) {
                return guess_from_method_annotation(ctx, inputs, &owner, "new", args.len(), has_block).or(Some(owner));
            }
        }
    }

    // Rule 3: `Pointer(T).malloc` / `Pointer(T).null`.
    if (name == "malloc" || name == "null") && args.len() <= 1 {
        if let Some(Expr::Generic { base, type_vars }) = obj.map(|o| &o.node) {
            if let Expr::Path(p) = &base.node {
                if p.len() == 1 && p[0] == "Pointer" {
                    if let [elem] = type_vars.as_slice() {
                        let node = TypeNode::Path {
                            names: vec!["Pointer".into()],
                            type_vars: vec![elem.clone()],
                        };
                        if let Some(ty) = resolve_and_check(ctx, &root, &node, false, site) {
                            return Some(ty);
                        }
                    }
                }
            }
        }
    }

    // Rule 4: two-argument `Pointer.malloc(n, v)`.
    if name == "malloc" && args.len() == 2 {
        if let Some(Expr::Path(p)) = obj.map(|o| &o.node) {
            if ctx.resolver.is_pointer_type_path(p) {
                let elem = guess_type(ctx, inputs, &args[1].value)?;
                return Some(ctx.algebra.pointer(elem));
            }
        }
    }

    // Rule 5: foreign-library function / external variable.
    if let Some(receiver_names) = path_like(obj) {
        let path_names = match &receiver_names {
            TypeNode::Path { names, .. } => names.as_slice(),
            _ => &[],
        };
        if let Some(lib) = ctx.resolver.foreign_library(&root, path_names) {
            if let Some(sig) = ctx.resolver.foreign_fn(&lib, name) {
                return match sig.return_type {
                    Some(t) => {
                        let (ok, err) = crate::legality::check(ctx.resolver, t, site);
                        if let Some(e) = err {
                            ctx.record_error(e);
                        }
                        ok
                    }
                    None => None,
                };
            }
            if args.is_empty() && !has_block {
                if let Some(t) = ctx.resolver.foreign_var(&lib, name) {
                    let (ok, err) = crate::legality::check(ctx.resolver, t, site);
                    if let Some(e) = err {
                        ctx.record_error(e);
                    }
                    return ok;
                }
            }
        }
    }

    // Rule 6: `T.method(...)` through the method's own annotation/body.
    if let Some(receiver_names) = path_like(obj) {
        if let Some(ty) = resolve_and_check(ctx, &root, &receiver_names, false, site) {
            return guess_from_method_annotation(ctx, inputs, &ty, name, args.len(), has_block);
        }
    }

    None
}

/// If `obj` is a bare constant path (`Foo`, `Foo::Bar`) or a generic
/// instantiation of one (`Foo(Int32)`), the `TypeNode` it denotes.
fn path_like(obj: Option<&Spanned<Expr>>) -> Option<TypeNode> {
    match &obj?.node {
        Expr::Path(names) => Some(TypeNode::Path {
            names: names.clone(),
            type_vars: vec![],
        }),
        Expr::Generic { base, type_vars } => match &base.node {
            Expr::Path(names) => Some(TypeNode::Path {
                names: names.clone(),
                type_vars: type_vars.clone(),
            }),
            _ => None,
        },
        _ => None,
    }
}
