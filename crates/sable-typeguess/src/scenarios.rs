//! End-to-end scenario tests, one per worked example the rest of the
//! crate's documentation cites by name (S1–S8). Each builds a tiny module,
//! runs the whole pass over it through [`crate::run`], and checks the
//! resulting buckets the way the module docs describe them.

use pretty_assertions::assert_eq;

use sable_ast::{Def, Expr, GenericParam, IntKind, Module, Param, Span, Spanned, Stmt, TypeDef, TypeDefKind, TypeNode};

use crate::context::PassCtx;
use crate::model::{Buckets, ExplicitInstanceVars, ResolvedType, TypeExpr};
use crate::oracle::OwnerKind;
use crate::testutil::{FakeAlgebra, FakeResolver, FakeSymbolTable};

fn sp<T>(node: T) -> Spanned<T> {
    Spanned::new(node, Span::new(0, 1))
}

fn global_assign(name: &str, value: Expr) -> Spanned<Stmt> {
    sp(Stmt::Expr(sp(Expr::Assign {
        target: Box::new(sp(Expr::Global(name.into()))),
        value: Box::new(sp(value)),
    })))
}

fn class_var_assign(name: &str, value: Expr) -> Spanned<Stmt> {
    sp(Stmt::Expr(sp(Expr::Assign {
        target: Box::new(sp(Expr::ClassVar(name.into()))),
        value: Box::new(sp(value)),
    })))
}

fn ivar_assign(name: &str, value: Expr) -> Spanned<Stmt> {
    sp(Stmt::Expr(sp(Expr::Assign {
        target: Box::new(sp(Expr::InstanceVar(name.into()))),
        value: Box::new(sp(value)),
    })))
}

fn call_stmt(name: &str, args: Vec<sable_ast::CallArg>) -> Spanned<Stmt> {
    sp(Stmt::Expr(sp(Expr::Call { obj: None, name: name.into(), args, block: None })))
}

fn def(name: &str, args: Vec<Param>, body: Vec<Spanned<Stmt>>) -> Def {
    Def { name: sp(name.into()), args, block_arg: None, return_type: None, body, is_abstract: false, previous: None }
}

fn class(name: &str, generics: Vec<&str>, body: Vec<Spanned<Stmt>>) -> Spanned<TypeDef> {
    let generics = generics.into_iter().map(|g| GenericParam { name: sp(g.into()) }).collect();
    sp(TypeDef { kind: TypeDefKind::Class, name: sp(name.into()), generics, superclass: None, body })
}

fn named(name: &str) -> ResolvedType {
    ResolvedType::Named { name: name.into(), generics: vec![] }
}

struct Fixture {
    resolver: FakeResolver,
    algebra: FakeAlgebra,
    symbols: FakeSymbolTable,
}

impl Fixture {
    fn new() -> Self {
        Self { resolver: FakeResolver::new(), algebra: FakeAlgebra, symbols: FakeSymbolTable::default() }
    }

    fn ctx(&self) -> PassCtx<'_> {
        PassCtx::new(&self.resolver, &self.algebra, &self.symbols)
    }
}

fn run_program(fx: &Fixture, explicit: &ExplicitInstanceVars, body: Vec<Spanned<Stmt>>) -> Buckets {
    let mut ctx = fx.ctx();
    let module = Module { body };
    crate::run(&mut ctx, explicit, &module).unwrap()
}

/// S1 — simple int global: `$x = 42`.
#[test]
fn s1_simple_int_global() {
    let fx = Fixture::new();
    let explicit = ExplicitInstanceVars::new();
    let buckets = run_program(&fx, &explicit, vec![global_assign("x", Expr::IntLiteral(IntKind::I32))]);
    let info = buckets.globals.get("x").unwrap();
    assert_eq!(info.ty, ResolvedType::Int(IntKind::I32));
    assert!(info.outside_def);
}

/// S2 — merged global: `$x = 1` then `$x = "s"` widens to a union.
#[test]
fn s2_merged_global() {
    let fx = Fixture::new();
    let explicit = ExplicitInstanceVars::new();
    let buckets = run_program(
        &fx,
        &explicit,
        vec![global_assign("x", Expr::IntLiteral(IntKind::I32)), global_assign("x", Expr::StringLiteral("s".into()))],
    );
    let info = buckets.globals.get("x").unwrap();
    assert_eq!(info.ty, ResolvedType::Union(vec![ResolvedType::Int(IntKind::I32), ResolvedType::Str]));
    assert!(info.outside_def);
}

/// S3 — definite vs. indefinite initialization: a `self`-escaping call
/// between two instance-var assignments stops the second from being
/// counted as definitely initialized, while both still get guessed types.
#[test]
fn s3_definite_vs_indefinite_initialization() {
    let mut fx = Fixture::new();
    fx.resolver.set_owner_kind(named("C"), OwnerKind::Concrete);
    let explicit = ExplicitInstanceVars::new();
    let body = vec![
        ivar_assign("a", Expr::IntLiteral(IntKind::I32)),
        call_stmt("some_call", vec![sable_ast::CallArg { value: sp(Expr::Var("self".into())), is_out: false }]),
        ivar_assign("b", Expr::IntLiteral(IntKind::I32)),
    ];
    let buckets = run_program(
        &fx,
        &explicit,
        vec![Stmt::TypeDef(class("C", vec![], vec![sp(Stmt::Def(sp(def("initialize", vec![], body))))]))]
            .into_iter()
            .map(sp)
            .collect(),
    );

    let infos = buckets.initialize_infos.get(&named("C")).unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].instance_vars.iter().cloned().collect::<Vec<_>>(), vec!["a".to_string()]);

    let ivars = buckets.guessed_instance_vars.get(&named("C")).unwrap();
    assert_eq!(ivars.get("a").unwrap().type_vars, vec![TypeExpr::Resolved(ResolvedType::Int(IntKind::I32))]);
    assert_eq!(ivars.get("b").unwrap().type_vars, vec![TypeExpr::Resolved(ResolvedType::Int(IntKind::I32))]);
    assert!(buckets.instance_vars_outside.get(&named("C")).is_none());
}

/// S4 — a class variable assigned at the class body's top level, outside
/// any method.
#[test]
fn s4_class_var_outside_any_def() {
    let mut fx = Fixture::new();
    fx.resolver.set_owner_kind(named("C"), OwnerKind::Concrete);
    let explicit = ExplicitInstanceVars::new();
    let buckets = run_program(
        &fx,
        &explicit,
        vec![Stmt::TypeDef(class("C", vec![], vec![class_var_assign("count", Expr::IntLiteral(IntKind::I32))]))]
            .into_iter()
            .map(sp)
            .collect(),
    );
    let info = buckets.class_vars.get(&named("C")).unwrap().get("count").unwrap();
    assert_eq!(info.ty, ResolvedType::Int(IntKind::I32));
    assert!(info.outside_def);
}

/// S5 — a declared-but-forbidden type (a bare, uninstantiated generic)
/// is rejected and recorded as a soft error, leaving the var unguessed.
#[test]
fn s5_forbidden_type_is_recorded_not_guessed() {
    let mut fx = Fixture::new();
    fx.resolver.set_owner_kind(named("C"), OwnerKind::Concrete);
    fx.resolver.register_type("Array", named("Array"));
    fx.resolver.mark_uninstantiated_generic(named("Array"));
    let explicit = ExplicitInstanceVars::new();
    let decl = sp(Stmt::Expr(sp(Expr::UninitializedDeclaration {
        target: Box::new(sp(Expr::InstanceVar("x".into()))),
        declared_type: sp(TypeNode::simple("Array")),
    })));
    let buckets = run_program(
        &fx,
        &explicit,
        vec![Stmt::TypeDef(class("C", vec![], vec![sp(Stmt::Def(sp(def("initialize", vec![], vec![decl]))))]))]
            .into_iter()
            .map(sp)
            .collect(),
    );
    let err = buckets.errors.get(&named("C")).and_then(|e| e.get("x")).unwrap();
    assert_eq!(err.kind, crate::model::DisallowedKind::UninstantiatedGeneric);
    assert_eq!(err.offending_type, named("Array"));
    assert!(buckets.guessed_instance_vars.get(&named("C")).and_then(|b| b.get("x")).is_none());
}

/// S6 — tuple destructuring: `@a, @b = some_call_returning_tuple_of(...)`.
#[test]
fn s6_tuple_destructuring() {
    let mut fx = Fixture::new();
    fx.resolver.set_owner_kind(named("C"), OwnerKind::Concrete);
    let explicit = ExplicitInstanceVars::new();
    // Stands in for a call's return value — the guesser only cares about
    // the tuple shape reaching the multi-assign, not how it was produced.
    let tuple = sp(Expr::TupleLiteral(vec![sp(Expr::StringLiteral("s".into())), sp(Expr::IntLiteral(IntKind::I32))]));
    let multi = sp(Stmt::Expr(sp(Expr::MultiAssign {
        targets: vec![sp(Expr::InstanceVar("a".into())), sp(Expr::InstanceVar("b".into()))],
        values: vec![tuple],
    })));
    let buckets = run_program(
        &fx,
        &explicit,
        vec![Stmt::TypeDef(class("C", vec![], vec![sp(Stmt::Def(sp(def("initialize", vec![], vec![multi]))))]))]
            .into_iter()
            .map(sp)
            .collect(),
    );
    let ivars = buckets.guessed_instance_vars.get(&named("C")).unwrap();
    assert!(ivars.get("a").unwrap().type_vars.contains(&TypeExpr::Resolved(ResolvedType::Str)));
    assert!(ivars.get("b").unwrap().type_vars.contains(&TypeExpr::Resolved(ResolvedType::Int(IntKind::I32))));
}

/// S7 — a constant cycle (`A = B`, `B = A`) breaks instead of looping
/// forever, and a global that depends on it is simply left unguessed.
#[test]
fn s7_constant_cycle_breaks_without_a_guess() {
    use crate::oracle::ConstantRef;
    use std::rc::Rc;

    let mut fx = Fixture::new();
    fx.resolver.register_constant(
        "A",
        ConstantRef { id: "A".into(), enum_member_type: None, value: Rc::new(sp(Expr::Path(vec!["B".into()]))) },
    );
    fx.resolver.register_constant(
        "B",
        ConstantRef { id: "B".into(), enum_member_type: None, value: Rc::new(sp(Expr::Path(vec!["A".into()]))) },
    );
    let explicit = ExplicitInstanceVars::new();
    let buckets = run_program(&fx, &explicit, vec![global_assign("x", Expr::Path(vec!["A".into()]))]);
    assert!(buckets.globals.get("x").is_none());
}

/// S8 — a generic owner's instance variable guesses to the *unresolved*
/// type-parameter syntax rather than a resolved concrete type.
#[test]
fn s8_generic_owner_guesses_an_unresolved_type_var() {
    let mut fx = Fixture::new();
    fx.resolver.set_owner_kind(named("G"), OwnerKind::Generic);
    let explicit = ExplicitInstanceVars::new();
    let mut x = Param::simple("x");
    x.restriction = Some(sp(TypeNode::simple("T")));
    let body = vec![ivar_assign("v", Expr::Var("x".into()))];
    let buckets = run_program(
        &fx,
        &explicit,
        vec![Stmt::TypeDef(class("G", vec!["T"], vec![sp(Stmt::Def(sp(def("initialize", vec![x], body))))]))]
            .into_iter()
            .map(sp)
            .collect(),
    );
    let info = buckets.guessed_instance_vars.get(&named("G")).unwrap().get("v").unwrap();
    assert_eq!(info.type_vars, vec![TypeExpr::Unresolved(sp(TypeNode::simple("T")))]);
}
