//! The FlameGPU-style backend (spec §4.6, "partial" backend per REDESIGN
//! FLAGS): message-passing neighbor loops, getter/setter member access.
//!
//! Grounded on `original_source/src/backend/FlamePrinter.cpp`. Only a
//! subset of node kinds are supported — anything outside
//! [`supported_kinds`] must be rejected by the pre-analysis check in
//! [`crate::backend`] before this module is ever asked to print it, so the
//! functions below assume their inputs are already restricted to that
//! subset.

use super::{escape_string_literal, NodeKind, Printer};
use crate::ast::*;
use crate::types::Type;
use std::collections::HashSet;

/// FlameGPU's message-passing model has no notion of heap arrays, dynamic
/// agent creation, or a driving `simulate` statement (those are host-side
/// concerns in a generated FlameGPU model.xml, not something a step
/// function can express) — this backend only ever sees range/collection/near
/// loops and ternaries.
pub fn supported_kinds() -> HashSet<NodeKind> {
    [
        NodeKind::RangeFor,
        NodeKind::CollectionFor,
        NodeKind::NearFor,
        NodeKind::Ternary,
    ]
    .into_iter()
    .collect()
}

pub fn print_type(ty: &Type) -> String {
    match ty {
        Type::Void => "void".to_string(),
        Type::Bool => "bool".to_string(),
        Type::Int32 => "int".to_string(),
        Type::Float32 => "float".to_string(),
        Type::String => "char*".to_string(),
        Type::Vec2 => "glm::vec2".to_string(),
        Type::Vec3 => "glm::vec3".to_string(),
        Type::Array(_) => "/* unsupported: array */".to_string(),
        Type::Agent(_) => "/* unsupported: agent handle */".to_string(),
    }
}

pub fn generate(script: &Script) -> String {
    let mut printer = Printer::new();

    for func in &script.functions {
        if func.is_step {
            print_step_function(&mut printer, script, func);
        }
    }

    printer.finish()
}

fn agent_for_step(script: &Script, func: &FunctionDecl) -> &AgentDecl {
    &script.agents[func.step_agent.expect("is_step implies step_agent is set")]
}

fn print_step_function(printer: &mut Printer, script: &Script, func: &FunctionDecl) {
    let agent = agent_for_step(script, func);
    printer.write(&format!(
        "FLAME_GPU_AGENT_FUNCTION {} {}_func(xmachine_memory_{} *self",
        "int", func.name, agent.name
    ));
    printer.write(") {");
    printer.indent();
    print_block_body(printer, script, agent, &func.body);
    printer.newline();
    printer.write("return 0;");
    printer.outdent();
    printer.newline();
    printer.write("}");
    printer.newline();
    printer.newline();
}

fn print_block_body(printer: &mut Printer, script: &Script, agent: &AgentDecl, body: &StmtNode) {
    if let Stmt::Block(stmts) = &body.kind {
        for stmt in stmts {
            printer.newline();
            print_stmt(printer, script, agent, stmt);
        }
    } else {
        printer.newline();
        print_stmt(printer, script, agent, body);
    }
}

fn print_stmt(printer: &mut Printer, script: &Script, agent: &AgentDecl, stmt: &StmtNode) {
    match &stmt.kind {
        Stmt::Expr(e) => {
            print_expr(printer, agent, e);
            printer.write(";");
        }
        Stmt::Assign(lhs, rhs) => print_assign(printer, agent, lhs, rhs),
        Stmt::AssignOp(op, lhs, rhs) => {
            // Desugar `lhs op= rhs` into a read-modify-write through the
            // getter/setter pair, since FlameGPU has no compound-assignment
            // member operator.
            let synthetic_rhs = ExprNode {
                kind: Expr::Binary(*op, Box::new(lhs.clone()), Box::new(rhs.clone())),
                span: stmt.span,
                ty: lhs.ty.clone(),
            };
            print_assign(printer, agent, lhs, &synthetic_rhs);
        }
        Stmt::Block(stmts) => {
            printer.write("{");
            printer.indent();
            for s in stmts {
                printer.newline();
                print_stmt(printer, script, agent, s);
            }
            printer.outdent();
            printer.newline();
            printer.write("}");
        }
        Stmt::VarDecl(decl) => {
            printer.write(&format!(
                "{} {}",
                print_type(decl.type_spec.resolved.as_ref().unwrap()),
                decl.name
            ));
            if let Some(init) = &decl.init {
                printer.write(" = ");
                print_expr(printer, agent, init);
            }
            printer.write(";");
        }
        Stmt::If(cond, then_branch, else_branch) => {
            printer.write("if (");
            print_expr(printer, agent, cond);
            printer.write(") ");
            print_stmt(printer, script, agent, then_branch);
            if let Some(else_branch) = else_branch {
                printer.write(" else ");
                print_stmt(printer, script, agent, else_branch);
            }
        }
        Stmt::While(cond, body) => {
            printer.write("while (");
            print_expr(printer, agent, cond);
            printer.write(") ");
            print_stmt(printer, script, agent, body);
        }
        Stmt::For(for_stmt) => print_for(printer, script, agent, for_stmt),
        Stmt::Simulate(_) => unreachable!("rejected pre-analysis: Simulate is not in supported_kinds"),
        Stmt::Return(Some(e)) => {
            printer.write("return ");
            print_expr(printer, agent, e);
            printer.write(";");
        }
        Stmt::Return(None) => printer.write("return;"),
    }
}

fn print_assign(printer: &mut Printer, agent: &AgentDecl, lhs: &ExprNode, rhs: &ExprNode) {
    if let Expr::Member(base, member) = &lhs.kind {
        if is_self_ref(base) {
            let member_decl = agent.member(member);
            let is_vec = member_decl
                .map(|m| m.type_spec.resolved.as_ref().unwrap().is_vec())
                .unwrap_or(false);
            if is_vec {
                for component in ['x', 'y', 'z'] {
                    if component == 'z' && member_decl.unwrap().type_spec.resolved == Some(Type::Vec2) {
                        continue;
                    }
                    printer.write(&format!("set_{}_{}(", member, component));
                    print_component_of(printer, agent, rhs, component);
                    printer.write(");");
                    printer.newline();
                }
                return;
            }
            printer.write(&format!("set_{}(", member));
            print_expr(printer, agent, rhs);
            printer.write(");");
            return;
        }
    }
    print_expr(printer, agent, lhs);
    printer.write(" = ");
    print_expr(printer, agent, rhs);
    printer.write(";");
}

fn is_self_ref(expr: &ExprNode) -> bool {
    matches!(&expr.kind, Expr::Var(v) if v.name == "self")
}

/// Prints `rhs`'s `component` (x/y/z) value — used when desugaring a vector
/// member write into per-component `set_<member>_<c>()` calls.
fn print_component_of(printer: &mut Printer, agent: &AgentDecl, rhs: &ExprNode, component: char) {
    printer.write(&format!("("));
    print_expr(printer, agent, rhs);
    printer.write(&format!(").{}", component));
}

fn print_for(printer: &mut Printer, script: &Script, agent: &AgentDecl, for_stmt: &ForStmt) {
    match &for_stmt.kind {
        ForKind::Range { from, to } => {
            printer.write(&format!("for (int {} = ", for_stmt.var_name));
            print_expr(printer, agent, from);
            printer.write(&format!("; {} < ", for_stmt.var_name));
            print_expr(printer, agent, to);
            printer.write(&format!("; {}++) ", for_stmt.var_name));
            print_stmt(printer, script, agent, &for_stmt.body);
        }
        ForKind::Collection { collection } => {
            printer.write("/* unsupported on this backend: iterating a host array */ for (");
            print_expr(printer, agent, collection);
            printer.write(") ");
            print_stmt(printer, script, agent, &for_stmt.body);
        }
        ForKind::Near { agent: near_agent, radius } => {
            let other = near_agent_name(script, for_stmt);
            printer.write(&format!("START_{}_MESSAGE_LOOP", other.to_uppercase()));
            printer.newline();
            printer.write(&format!(
                "xmachine_message_{}_location *{} = &{}_message;",
                other.to_lowercase(),
                for_stmt.var_name,
                other.to_lowercase()
            ));
            printer.newline();
            printer.write("/* radius: ");
            print_expr(printer, agent, radius);
            printer.write(" */");
            printer.newline();
            print_stmt(printer, script, agent, &for_stmt.body);
            printer.newline();
            let _ = near_agent;
            printer.write(&format!("FINISH_{}_MESSAGE_LOOP", other.to_uppercase()));
        }
    }
}

fn near_agent_name(script: &Script, for_stmt: &ForStmt) -> String {
    for_stmt
        .var_type
        .as_ref()
        .and_then(|t| t.agent_decl())
        .map(|id| script.agents[id].name.clone())
        .unwrap_or_else(|| "agent".to_string())
}

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
        BinOp::Range => "..",
    }
}

fn print_expr(printer: &mut Printer, agent: &AgentDecl, expr: &ExprNode) {
    match &expr.kind {
        Expr::IntLit(n) => printer.write(&n.to_string()),
        Expr::FloatLit(n) => printer.write(&format!("{}f", n)),
        Expr::BoolLit(b) => printer.write(&b.to_string()),
        Expr::StringLit(s) => printer.write(&escape_string_literal(s)),
        Expr::Var(v) => printer.write(&v.name),
        Expr::Unary(op, inner) => {
            printer.write(match op {
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
            });
            print_expr(printer, agent, inner);
        }
        Expr::Binary(op, lhs, rhs) => {
            printer.write("(");
            print_expr(printer, agent, lhs);
            printer.write(&format!(" {} ", op_symbol(*op)));
            print_expr(printer, agent, rhs);
            printer.write(")");
        }
        Expr::Assign(..) | Expr::AssignOp(..) => {
            // Only reachable as a sub-expression (e.g. inside a ternary
            // branch); assignment statements are handled by `print_assign`.
            printer.write("/* unsupported: nested assignment */");
        }
        Expr::Call(call) => print_call(printer, agent, call),
        Expr::Member(base, member) => {
            if is_self_ref(base) {
                let member_decl = agent.member(member);
                let is_vec = member_decl
                    .map(|m| m.type_spec.resolved.as_ref().unwrap().is_vec())
                    .unwrap_or(false);
                if is_vec {
                    let ty = member_decl.unwrap().type_spec.resolved.as_ref().unwrap();
                    let ctor = print_type(ty);
                    printer.write(&format!("{}(get_{}_x(), get_{}_y()", ctor, member, member));
                    if *ty == Type::Vec3 {
                        printer.write(&format!(", get_{}_z()", member));
                    }
                    printer.write(")");
                } else {
                    printer.write(&format!("get_{}()", member));
                }
            } else {
                print_expr(printer, agent, base);
                printer.write(&format!(".{}", member));
            }
        }
        Expr::Index(base, index) => {
            printer.write("/* unsupported: array index */ ");
            print_expr(printer, agent, base);
            printer.write("[");
            print_expr(printer, agent, index);
            printer.write("]");
        }
        Expr::Ternary(cond, then_branch, else_branch) => {
            printer.write("(");
            print_expr(printer, agent, cond);
            printer.write(" ? ");
            print_expr(printer, agent, then_branch);
            printer.write(" : ");
            print_expr(printer, agent, else_branch);
            printer.write(")");
        }
        Expr::AgentCreation(_) => printer.write("/* unsupported: agent creation */"),
        Expr::ArrayInit(_) => printer.write("/* unsupported: array literal */"),
        Expr::NewArray(..) => printer.write("/* unsupported: new array */"),
    }
}

fn print_call(printer: &mut Printer, agent: &AgentDecl, call: &Call) {
    let emit_name = match &call.resolved {
        Some(CalledSig::Builtin(sig)) => sig.emit_name.to_string(),
        Some(CalledSig::User(_)) | None => call.name.clone(),
    };
    printer.write(&emit_name);
    printer.write("(");
    for (i, arg) in call.args.iter().enumerate() {
        if i > 0 {
            printer.write(", ");
        }
        print_expr(printer, agent, &arg.expr);
    }
    printer.write(")");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::parser::parse;
    use std::collections::HashMap;

    fn compile(src: &str) -> String {
        let mut script = parse(src).unwrap();
        analyze(&mut script, HashMap::new()).unwrap();
        generate(&script)
    }

    #[test]
    fn vector_member_write_desugars_to_per_component_setters() {
        let out = compile(
            r#"
                agent Boid { position vec2 p; vec2 v; }
                void boid_step(Boid self) { self.p = self.p + self.v; }
            "#,
        );
        assert!(out.contains("set_p_x("));
        assert!(out.contains("set_p_y("));
        assert!(!out.contains("set_p_z("));
    }

    #[test]
    fn scalar_member_read_uses_plain_getter() {
        let out = compile(
            r#"
                agent Boid { position vec2 p; float speed; }
                void boid_step(Boid self) { float s = self.speed; }
            "#,
        );
        assert!(out.contains("get_speed()"));
    }

    #[test]
    fn near_loop_is_wrapped_in_message_loop_macros() {
        let out = compile(
            r#"
                agent Boid { position vec2 p; vec2 v; }
                void boid_step(Boid self) {
                    for (Boid o in near(self, 1.0)) {
                        self.v = self.v + o.v;
                    }
                }
            "#,
        );
        assert!(out.contains("START_BOID_MESSAGE_LOOP"));
        assert!(out.contains("FINISH_BOID_MESSAGE_LOOP"));
    }
}
