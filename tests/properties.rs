//! The universal testable properties from spec §8.

use openabl::analyze_source;
use openabl::ast::Expr;
use openabl::constfold::{fold, refold_literal};
use std::collections::{HashMap, HashSet};

const BOIDS_SRC: &str = r#"
    agent Boid { position vec2 p; vec2 v; }
    step boid_step(Boid self) {
        for (Boid o in near(self, 1.0)) {
            self.v = self.v + (o.p - self.p);
        }
        self.p = self.p + self.v;
    }
"#;

/// Lex/parse round-trip: a valid program parses, and its re-print through
/// every backend is non-empty and brace-balanced.
#[test]
fn reprint_through_every_backend_is_balanced_and_nonempty() {
    let script = analyze_source(BOIDS_SRC, HashMap::new()).unwrap();

    let c_source = openabl::printer::c_backend::generate(&script);
    assert!(!c_source.is_empty());
    assert_eq!(c_source.matches('{').count(), c_source.matches('}').count());

    let flame_source = openabl::printer::flame_backend::generate(&script);
    assert!(!flame_source.is_empty());
    assert_eq!(flame_source.matches('{').count(), flame_source.matches('}').count());
}

/// Type soundness: every expression node ends up with a resolved type.
#[test]
fn every_expression_has_a_resolved_type_after_analysis() {
    let script = analyze_source(BOIDS_SRC, HashMap::new()).unwrap();
    let func = &script.functions[0];
    assert_all_exprs_typed(&func.body);
}

fn assert_all_exprs_typed(stmt: &openabl::ast::StmtNode) {
    use openabl::ast::Stmt;
    match &stmt.kind {
        Stmt::Expr(e) | Stmt::Simulate(e) => assert_expr_typed(e),
        Stmt::Assign(l, r) | Stmt::AssignOp(_, l, r) => {
            assert_expr_typed(l);
            assert_expr_typed(r);
        }
        Stmt::Block(stmts) => stmts.iter().for_each(assert_all_exprs_typed),
        Stmt::VarDecl(decl) => {
            if let Some(init) = &decl.init {
                assert_expr_typed(init);
            }
        }
        Stmt::If(cond, then_b, else_b) => {
            assert_expr_typed(cond);
            assert_all_exprs_typed(then_b);
            if let Some(e) = else_b {
                assert_all_exprs_typed(e);
            }
        }
        Stmt::While(cond, body) => {
            assert_expr_typed(cond);
            assert_all_exprs_typed(body);
        }
        Stmt::For(for_stmt) => {
            match &for_stmt.kind {
                openabl::ast::ForKind::Range { from, to } => {
                    assert_expr_typed(from);
                    assert_expr_typed(to);
                }
                openabl::ast::ForKind::Collection { collection } => assert_expr_typed(collection),
                openabl::ast::ForKind::Near { agent, radius } => {
                    assert_expr_typed(agent);
                    assert_expr_typed(radius);
                }
            }
            assert_all_exprs_typed(&for_stmt.body);
        }
        Stmt::Return(Some(e)) => assert_expr_typed(e),
        Stmt::Return(None) => {}
    }
}

fn assert_expr_typed(expr: &openabl::ast::ExprNode) {
    assert!(expr.ty.is_some(), "expression at {:?} has no resolved type", expr.span);
    match &expr.kind {
        Expr::Unary(_, inner) => assert_expr_typed(inner),
        Expr::Binary(_, l, r) | Expr::Assign(l, r) | Expr::AssignOp(_, l, r) => {
            assert_expr_typed(l);
            assert_expr_typed(r);
        }
        Expr::Call(call) => call.args.iter().for_each(|a| assert_expr_typed(&a.expr)),
        Expr::Member(base, _) => assert_expr_typed(base),
        Expr::Index(base, index) => {
            assert_expr_typed(base);
            assert_expr_typed(index);
        }
        Expr::Ternary(c, t, e) => {
            assert_expr_typed(c);
            assert_expr_typed(t);
            assert_expr_typed(e);
        }
        Expr::AgentCreation(creation) => creation.members.values().for_each(assert_expr_typed),
        Expr::ArrayInit(items) => items.iter().for_each(assert_expr_typed),
        Expr::NewArray(_, size) => assert_expr_typed(size),
        _ => {}
    }
}

/// Scope uniqueness: every var-use resolves to exactly one VarId, densely
/// over `[0, N)`.
#[test]
fn var_ids_are_dense_and_unique() {
    let script = analyze_source(BOIDS_SRC, HashMap::new()).unwrap();
    let mut ids = HashSet::new();
    let func = &script.functions[0];
    for param in &func.params {
        ids.insert(param.var_id.unwrap());
    }
    collect_var_ids(&func.body, &mut ids);

    let max = *ids.iter().max().unwrap();
    assert_eq!(ids.len(), max + 1, "var ids should be dense over [0, N)");
}

fn collect_var_ids(stmt: &openabl::ast::StmtNode, ids: &mut HashSet<usize>) {
    use openabl::ast::Stmt;
    match &stmt.kind {
        Stmt::Block(stmts) => stmts.iter().for_each(|s| collect_var_ids(s, ids)),
        Stmt::VarDecl(decl) => {
            ids.insert(decl.var_id.unwrap());
        }
        Stmt::If(_, then_b, else_b) => {
            collect_var_ids(then_b, ids);
            if let Some(e) = else_b {
                collect_var_ids(e, ids);
            }
        }
        Stmt::While(_, body) => collect_var_ids(body, ids),
        Stmt::For(for_stmt) => {
            ids.insert(for_stmt.var_id.unwrap());
            collect_var_ids(&for_stmt.body, ids);
        }
        _ => {}
    }
}

/// Overload determinism: resolving the same builtin call twice yields the
/// same signature.
#[test]
fn resolving_the_same_builtin_twice_is_deterministic() {
    use openabl::builtins::BuiltinFunctions;
    use openabl::types::Type;

    let funcs = BuiltinFunctions::new();
    let first = funcs.resolve("dot", &[Type::Vec2, Type::Vec2]);
    let second = funcs.resolve("dot", &[Type::Vec2, Type::Vec2]);
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].signature.emit_name, second[0].signature.emit_name);
    assert_eq!(first[0].return_type, second[0].return_type);
}

/// Neighbor-loop recognition: the radius of every `near` loop in a step
/// function appears in that function's recorded radius list, and the loop
/// variable's type equals the step-agent type.
#[test]
fn near_loop_radius_and_variable_type_are_recorded() {
    let script = analyze_source(BOIDS_SRC, HashMap::new()).unwrap();
    let func = &script.functions[0];
    assert_eq!(func.radii, vec![1.0]);

    let for_var_type = match &func.body.kind {
        openabl::ast::Stmt::Block(stmts) => match &stmts[0].kind {
            openabl::ast::Stmt::For(for_stmt) => for_stmt.var_type.clone().unwrap(),
            _ => panic!("expected a for-statement"),
        },
        _ => panic!("expected a block body"),
    };
    assert_eq!(for_var_type, openabl::types::Type::Agent(func.step_agent.unwrap()));
}

/// Constant folding idempotence: folding a folded literal returns an equal
/// literal.
#[test]
fn folding_is_idempotent() {
    use openabl::ast::Literal;
    for lit in [
        Literal::Int(7),
        Literal::Float(2.5),
        Literal::Bool(true),
        Literal::Vec2(1.0, 2.0),
        Literal::Vec3(1.0, 2.0, 3.0),
    ] {
        let refolded = refold_literal(&lit);
        assert_eq!(fold(&refolded, &HashMap::new()), Some(lit));
    }
}
