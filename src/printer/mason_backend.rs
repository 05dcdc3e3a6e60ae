//! The Mason-style JVM backend (spec §4.6, "partial" backend per REDESIGN
//! FLAGS): agents become Java classes, vector ops become method calls,
//! globals become static fields on a driver class.
//!
//! Grounded on `original_source/src/backend/MasonPrinter.cpp`.

use super::{escape_string_literal, NodeKind, Printer};
use crate::ast::*;
use crate::types::Type;
use std::collections::HashSet;

/// Mason has no message-passing neighbor primitive of its own (the original
/// emits a naive O(n^2) scan for `near`, which this backend chooses not to
/// reproduce) and no bare collection-for over a raw array type; only range
/// loops, agent creation, and ternaries are supported.
pub fn supported_kinds() -> HashSet<NodeKind> {
    [NodeKind::RangeFor, NodeKind::AgentCreation, NodeKind::Ternary]
        .into_iter()
        .collect()
}

pub fn print_type(ty: &Type) -> String {
    match ty {
        Type::Void => "void".to_string(),
        Type::Bool => "boolean".to_string(),
        Type::Int32 => "int".to_string(),
        Type::Float32 => "double".to_string(),
        Type::String => "String".to_string(),
        Type::Vec2 => "Double2D".to_string(),
        Type::Vec3 => "Double3D".to_string(),
        Type::Array(elem) => format!("{}[]", print_type(elem)),
        Type::Agent(_) => "Object".to_string(),
    }
}

pub fn generate(script: &Script) -> String {
    let mut printer = Printer::new();

    for agent in &script.agents {
        print_agent_class(&mut printer, agent, script);
    }
    print_driver_class(&mut printer, script);

    printer.finish()
}

fn agent_functions<'a>(script: &'a Script, agent_id: usize) -> Vec<&'a FunctionDecl> {
    script
        .functions
        .iter()
        .filter(|f| f.is_step && f.step_agent == Some(agent_id))
        .collect()
}

fn print_agent_class(printer: &mut Printer, agent: &AgentDecl, script: &Script) {
    printer.write(&format!("public class {} implements Steppable {{", agent.name));
    printer.indent();
    for member in &agent.members {
        printer.newline();
        printer.write(&format!(
            "public {} {};",
            print_type(member.type_spec.resolved.as_ref().unwrap()),
            member.name
        ));
    }

    printer.newline();
    printer.newline();
    printer.write(&format!("public {}(", agent.name));
    for (i, member) in agent.members.iter().enumerate() {
        if i > 0 {
            printer.write(", ");
        }
        printer.write(&format!(
            "{} {}",
            print_type(member.type_spec.resolved.as_ref().unwrap()),
            member.name
        ));
    }
    printer.write(") {");
    printer.indent();
    for member in &agent.members {
        printer.newline();
        printer.write(&format!("this.{m} = {m};", m = member.name));
    }
    printer.outdent();
    printer.newline();
    printer.write("}");

    for func in agent_functions(script, script.agent_by_name(&agent.name).unwrap()) {
        printer.newline();
        printer.newline();
        print_step_method(printer, script, agent, func);
    }

    printer.outdent();
    printer.newline();
    printer.write("}");
    printer.newline();
    printer.newline();
}

fn print_step_method(printer: &mut Printer, script: &Script, agent: &AgentDecl, func: &FunctionDecl) {
    printer.write(&format!("public void {}(SimState state) {{", func.name));
    printer.indent();
    print_block_body(printer, script, Some(agent), &func.body);
    printer.outdent();
    printer.newline();
    printer.write("}");
}

fn print_driver_class(printer: &mut Printer, script: &Script) {
    printer.write("public class Sim extends SimState {");
    printer.indent();

    for c in &script.consts {
        printer.newline();
        let value = c
            .folded
            .as_ref()
            .map(print_literal)
            .unwrap_or_else(|| "/* unresolved */".to_string());
        printer.write(&format!(
            "public static final {} {} = {};",
            print_type(c.type_spec.resolved.as_ref().unwrap()),
            c.name,
            value
        ));
    }

    if let Some(env) = &script.environment {
        for (name, expr) in &env.bounds {
            printer.newline();
            printer.write(&format!("public static double {} = ", name));
            print_expr(printer, None, expr);
            printer.write(";");
        }
    }

    for func in script.functions.iter().filter(|f| !f.is_step) {
        printer.newline();
        printer.newline();
        print_free_function(printer, script, func);
    }

    printer.outdent();
    printer.newline();
    printer.write("}");
    printer.newline();
}

fn print_free_function(printer: &mut Printer, script: &Script, func: &FunctionDecl) {
    let ret = func
        .ret_type
        .as_ref()
        .and_then(|t| t.resolved.as_ref())
        .map(print_type)
        .unwrap_or_else(|| "void".to_string());
    let params: Vec<String> = func
        .params
        .iter()
        .map(|p| format!("{} {}", print_type(p.type_spec.resolved.as_ref().unwrap()), p.name))
        .collect();
    printer.write(&format!(
        "public static {} {}({}) {{",
        ret,
        func.name,
        params.join(", ")
    ));
    printer.indent();
    print_block_body(printer, script, None, &func.body);
    printer.outdent();
    printer.newline();
    printer.write("}");
}

fn print_literal(lit: &Literal) -> String {
    match lit {
        Literal::Int(n) => n.to_string(),
        Literal::Float(n) => n.to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::String(s) => escape_string_literal(s),
        Literal::Vec2(x, y) => format!("new Double2D({}, {})", x, y),
        Literal::Vec3(x, y, z) => format!("new Double3D({}, {}, {})", x, y, z),
    }
}

fn print_block_body(
    printer: &mut Printer,
    script: &Script,
    agent: Option<&AgentDecl>,
    body: &StmtNode,
) {
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

fn print_stmt(printer: &mut Printer, script: &Script, agent: Option<&AgentDecl>, stmt: &StmtNode) {
    match &stmt.kind {
        Stmt::Expr(e) => {
            print_expr(printer, agent, e);
            printer.write(";");
        }
        Stmt::Assign(lhs, rhs) => {
            print_expr(printer, agent, lhs);
            printer.write(" = ");
            print_expr(printer, agent, rhs);
            printer.write(";");
        }
        Stmt::AssignOp(op, lhs, rhs) => {
            print_expr(printer, agent, lhs);
            printer.write(&format!(" {}= ", op_symbol(*op)));
            print_expr(printer, agent, rhs);
            printer.write(";");
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
        Stmt::Simulate(_) => {
            printer.write("/* unsupported: simulate driven by Mason's own scheduler */;");
        }
        Stmt::Return(Some(e)) => {
            printer.write("return ");
            print_expr(printer, agent, e);
            printer.write(";");
        }
        Stmt::Return(None) => printer.write("return;"),
    }
}

fn print_for(printer: &mut Printer, script: &Script, agent: Option<&AgentDecl>, for_stmt: &ForStmt) {
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
            printer.write(&format!("for ({} {} : ", "var", for_stmt.var_name));
            print_expr(printer, agent, collection);
            printer.write(") ");
            print_stmt(printer, script, agent, &for_stmt.body);
        }
        ForKind::Near { .. } => {
            printer.write("/* unsupported on this backend: near() neighbor query */");
        }
    }
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

fn print_expr(printer: &mut Printer, agent: Option<&AgentDecl>, expr: &ExprNode) {
    match &expr.kind {
        Expr::IntLit(n) => printer.write(&n.to_string()),
        Expr::FloatLit(n) => printer.write(&n.to_string()),
        Expr::BoolLit(b) => printer.write(&b.to_string()),
        Expr::StringLit(s) => printer.write(&escape_string_literal(s)),
        Expr::Var(v) => printer.write(&v.name),
        Expr::Unary(UnaryOp::Not, inner) => {
            printer.write("!");
            print_expr(printer, agent, inner);
        }
        Expr::Unary(UnaryOp::Neg, inner) => {
            if inner.ty.as_ref().map(Type::is_vec).unwrap_or(false) {
                print_expr(printer, agent, inner);
                printer.write(".negate()");
            } else {
                printer.write("-");
                print_expr(printer, agent, inner);
            }
        }
        Expr::Binary(op, lhs, rhs) => print_binary(printer, agent, *op, lhs, rhs),
        Expr::Assign(lhs, rhs) => {
            print_expr(printer, agent, lhs);
            printer.write(" = ");
            print_expr(printer, agent, rhs);
        }
        Expr::AssignOp(op, lhs, rhs) => {
            print_expr(printer, agent, lhs);
            printer.write(&format!(" {}= ", op_symbol(*op)));
            print_expr(printer, agent, rhs);
        }
        Expr::Call(call) => print_call(printer, agent, call),
        Expr::Member(base, member) => {
            print_expr(printer, agent, base);
            printer.write(&format!(".{}", member));
        }
        Expr::Index(base, index) => {
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
        Expr::AgentCreation(creation) => {
            printer.write(&format!("new {}(", creation.agent_name));
            for (i, value) in creation.members.values().enumerate() {
                if i > 0 {
                    printer.write(", ");
                }
                print_expr(printer, agent, value);
            }
            printer.write(")");
        }
        Expr::ArrayInit(items) => {
            printer.write("{ ");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    printer.write(", ");
                }
                print_expr(printer, agent, item);
            }
            printer.write(" }");
        }
        Expr::NewArray(type_node, size) => {
            printer.write(&format!("new {}[", print_type(type_node.resolved.as_ref().unwrap())));
            print_expr(printer, agent, size);
            printer.write("]");
        }
    }
}

fn print_binary(printer: &mut Printer, agent: Option<&AgentDecl>, op: BinOp, lhs: &ExprNode, rhs: &ExprNode) {
    let lt = lhs.ty.clone().unwrap_or(Type::Void);
    let rt = rhs.ty.clone().unwrap_or(Type::Void);

    if lt.is_vec() || rt.is_vec() {
        let method = match op {
            BinOp::Add => "add",
            BinOp::Sub => "subtract",
            BinOp::Mul | BinOp::Div => "multiply",
            _ => unreachable!("analysis rejects other vector operators"),
        };
        if op == BinOp::Mul && lt.is_numeric() && rt.is_vec() {
            // Normalize `scalar * vec` to `vec.multiply(scalar)`.
            print_expr(printer, agent, rhs);
            printer.write(&format!(".{}(", method));
            print_expr(printer, agent, lhs);
            printer.write(")");
            return;
        }
        print_expr(printer, agent, lhs);
        printer.write(&format!(".{}(", method));
        if op == BinOp::Div {
            printer.write("1.0 / (");
            print_expr(printer, agent, rhs);
            printer.write(")");
        } else {
            print_expr(printer, agent, rhs);
        }
        printer.write(")");
        return;
    }

    printer.write("(");
    print_expr(printer, agent, lhs);
    printer.write(&format!(" {} ", op_symbol(op)));
    print_expr(printer, agent, rhs);
    printer.write(")");
}

fn print_call(printer: &mut Printer, agent: Option<&AgentDecl>, call: &Call) {
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
    fn agent_becomes_steppable_class_with_positional_constructor() {
        let out = compile(
            r#"
                agent Boid { position vec2 p; vec2 v; }
                void boid_step(Boid self) { self.p = self.p; }
            "#,
        );
        assert!(out.contains("public class Boid implements Steppable"));
        assert!(out.contains("public Boid(Double2D p, Double2D v)"));
    }

    #[test]
    fn vector_addition_becomes_method_call() {
        let out = compile(
            r#"
                agent Boid { position vec2 p; vec2 v; }
                void boid_step(Boid self) { self.p = self.p + self.v; }
            "#,
        );
        assert!(out.contains(".add("));
    }

    #[test]
    fn consts_become_public_static_final_fields() {
        let out = compile("const int N = 10;");
        assert!(out.contains("public static final int N = 10;"));
    }
}
