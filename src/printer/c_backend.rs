//! The C/OpenMP backend (spec §4.6, "representative" backend).
//!
//! Arrays and agents are heap storage accessed via pointers (`dyn_array*` /
//! `Agent*`); a step function's implicit parallelization double-buffers the
//! agent array and swaps input/output at the end; vector arithmetic
//! compiles to named helper functions (`float2_add`, `float3_mul_scalar`,
//! …) with `scalar * vec` normalized to right-multiplication. Grounded
//! line-for-line on `original_source/src/backend/CPrinter.cpp`.

use super::{escape_string_literal, NodeKind, Printer};
use crate::ast::*;
use crate::types::Type;
use std::collections::HashSet;

pub fn supported_kinds() -> HashSet<NodeKind> {
    // The C backend is the full, unrestricted backend: every node kind
    // appearing in spec §3 is supported.
    [
        NodeKind::RangeFor,
        NodeKind::CollectionFor,
        NodeKind::NearFor,
        NodeKind::Simulate,
        NodeKind::NewArray,
        NodeKind::ArrayInit,
        NodeKind::AgentCreation,
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
        Type::Vec2 => "float2".to_string(),
        Type::Vec3 => "float3".to_string(),
        Type::Array(_) => "dyn_array*".to_string(),
        Type::Agent(_) => "Agent*".to_string(),
    }
}

/// Generates the C/OpenMP source for `script`. Returns the contents of the
/// single generated translation unit; the backend facade is responsible for
/// substituting it into the asset template.
pub fn generate(script: &Script) -> String {
    let mut printer = Printer::new();

    for agent in &script.agents {
        print_agent_struct(&mut printer, agent);
    }
    for c in &script.consts {
        print_const(&mut printer, c);
    }
    for func in &script.functions {
        print_function(&mut printer, script, func);
    }

    printer.finish()
}

fn print_agent_struct(printer: &mut Printer, agent: &AgentDecl) {
    printer.write(&format!("typedef struct {{"));
    printer.indent();
    for member in &agent.members {
        printer.newline();
        printer.write(&format!(
            "{} {};",
            print_type(member.type_spec.resolved.as_ref().unwrap()),
            member.name
        ));
    }
    printer.outdent();
    printer.newline();
    printer.write(&format!("}} {};", agent.name));
    printer.newline();
    printer.newline();
}

fn print_const(printer: &mut Printer, c: &ConstDecl) {
    let value = match c.folded.as_ref() {
        Some(lit) => print_literal(lit),
        None => "/* unresolved */".to_string(),
    };
    printer.write(&format!(
        "const {} {} = {};",
        print_type(c.type_spec.resolved.as_ref().unwrap()),
        c.name,
        value
    ));
    printer.newline();
}

fn print_literal(lit: &Literal) -> String {
    match lit {
        Literal::Int(n) => n.to_string(),
        Literal::Float(n) => format!("{}f", n),
        Literal::Bool(b) => b.to_string(),
        Literal::String(s) => escape_string_literal(s),
        Literal::Vec2(x, y) => format!("float2_make({}f, {}f)", x, y),
        Literal::Vec3(x, y, z) => format!("float3_make({}f, {}f, {}f)", x, y, z),
    }
}

fn print_function(printer: &mut Printer, script: &Script, func: &FunctionDecl) {
    let ret = func
        .ret_type
        .as_ref()
        .and_then(|t| t.resolved.as_ref())
        .map(print_type)
        .unwrap_or_else(|| "void".to_string());
    // A step function's agent parameter (`self`) is not passed in: the
    // parallel-for header below hoists it from the double-buffered input
    // array instead, so it is dropped from the signature to avoid
    // redeclaring it as a local.
    let params: Vec<String> = func
        .params
        .iter()
        .filter(|p| !(func.is_step && p.var_id == func.step_param_id))
        .map(|p| format!("{} {}", print_type(p.type_spec.resolved.as_ref().unwrap()), p.name))
        .collect();
    printer.write(&format!("{} {}({}) {{", ret, func.name, params.join(", ")));
    printer.indent();

    if func.is_step {
        print_parallel_for_header(printer, func);
    }

    print_block_body(printer, script, &func.body);

    if func.is_step {
        printer.newline();
        printer.write("#pragma omp barrier");
        printer.newline();
        printer.write("swap_buffers(&in, &out);");
    }

    printer.outdent();
    printer.newline();
    printer.write("}");
    printer.newline();
    printer.newline();
}

fn print_parallel_for_header(printer: &mut Printer, func: &FunctionDecl) {
    let self_name = func
        .params
        .iter()
        .find(|p| p.var_id == func.step_param_id)
        .map(|p| p.name.as_str())
        .unwrap_or("self");
    printer.newline();
    printer.write("#pragma omp parallel for");
    printer.newline();
    printer.write("for (int __i = 0; __i < in.size; __i++) {");
    printer.indent();
    printer.newline();
    printer.write(&format!("Agent *{} = &in.values[__i];", self_name));
}

fn print_block_body(printer: &mut Printer, script: &Script, body: &StmtNode) {
    if let Stmt::Block(stmts) = &body.kind {
        for stmt in stmts {
            printer.newline();
            print_stmt(printer, script, stmt);
        }
    } else {
        printer.newline();
        print_stmt(printer, script, body);
    }
}

fn print_stmt(printer: &mut Printer, script: &Script, stmt: &StmtNode) {
    match &stmt.kind {
        Stmt::Expr(e) => {
            print_expr(printer, e);
            printer.write(";");
        }
        Stmt::Assign(lhs, rhs) => {
            print_expr(printer, lhs);
            printer.write(" = ");
            print_expr(printer, rhs);
            printer.write(";");
        }
        Stmt::AssignOp(op, lhs, rhs) => {
            print_expr(printer, lhs);
            printer.write(&format!(" {}= ", op_symbol(*op)));
            print_expr(printer, rhs);
            printer.write(";");
        }
        Stmt::Block(stmts) => {
            printer.write("{");
            printer.indent();
            for s in stmts {
                printer.newline();
                print_stmt(printer, script, s);
            }
            printer.outdent();
            printer.newline();
            printer.write("}");
        }
        Stmt::VarDecl(decl) => {
            let ty = decl.type_spec.resolved.as_ref().unwrap();
            if ty.is_array() || ty.is_agent() {
                printer.write(&format!(
                    "{} __{}_storage = ",
                    print_type(ty),
                    decl.name
                ));
                match &decl.init {
                    Some(init) => print_expr(printer, init),
                    None => printer.write("NULL"),
                }
                printer.write(";");
                printer.newline();
                printer.write(&format!("{} {} = &__{}_storage;", print_type(ty), decl.name, decl.name));
            } else {
                printer.write(&format!("{} {}", print_type(ty), decl.name));
                if let Some(init) = &decl.init {
                    printer.write(" = ");
                    print_expr(printer, init);
                }
                printer.write(";");
            }
        }
        Stmt::If(cond, then_branch, else_branch) => {
            printer.write("if (");
            print_expr(printer, cond);
            printer.write(") ");
            print_stmt(printer, script, then_branch);
            if let Some(else_branch) = else_branch {
                printer.write(" else ");
                print_stmt(printer, script, else_branch);
            }
        }
        Stmt::While(cond, body) => {
            printer.write("while (");
            print_expr(printer, cond);
            printer.write(") ");
            print_stmt(printer, script, body);
        }
        Stmt::For(for_stmt) => print_for(printer, script, for_stmt),
        Stmt::Simulate(e) => {
            printer.write("simulate(");
            print_expr(printer, e);
            printer.write(");");
        }
        Stmt::Return(Some(e)) => {
            printer.write("return ");
            print_expr(printer, e);
            printer.write(";");
        }
        Stmt::Return(None) => printer.write("return;"),
    }
}

fn print_for(printer: &mut Printer, script: &Script, for_stmt: &ForStmt) {
    match &for_stmt.kind {
        ForKind::Range { from, to } => {
            let bound = printer.make_anon_label();
            printer.write(&format!("int {} = ", bound));
            print_expr(printer, to);
            printer.write(";");
            printer.newline();
            printer.write(&format!("for (int {} = ", for_stmt.var_name));
            print_expr(printer, from);
            printer.write(&format!("; {} < {}; {}++) ", for_stmt.var_name, bound, for_stmt.var_name));
            print_stmt(printer, script, &for_stmt.body);
        }
        ForKind::Collection { collection } => {
            let coll = printer.make_anon_label();
            let idx = printer.make_anon_label();
            printer.write(&format!("dyn_array *{} = ", coll));
            print_expr(printer, collection);
            printer.write(";");
            printer.newline();
            printer.write(&format!(
                "for (int {i} = 0; {i} < {c}->size; {i}++) {{",
                i = idx,
                c = coll
            ));
            printer.indent();
            printer.newline();
            printer.write(&format!(
                "{} {} = {}->values[{}];",
                print_type(for_stmt.var_type.as_ref().unwrap()),
                for_stmt.var_name,
                coll,
                idx
            ));
            printer.newline();
            print_stmt(printer, script, &for_stmt.body);
            printer.outdent();
            printer.newline();
            printer.write("}");
        }
        ForKind::Near { agent, radius } => {
            printer.write(&format!(
                "for (Agent *{} = neighbors_begin(",
                for_stmt.var_name
            ));
            print_expr(printer, agent);
            printer.write(", ");
            print_expr(printer, radius);
            printer.write(&format!("); {} != NULL; {} = neighbors_next()) ", for_stmt.var_name, for_stmt.var_name));
            print_stmt(printer, script, &for_stmt.body);
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

fn print_expr(printer: &mut Printer, expr: &ExprNode) {
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
            print_expr(printer, inner);
        }
        Expr::Binary(op, lhs, rhs) => print_binary(printer, *op, lhs, rhs),
        Expr::Assign(lhs, rhs) => {
            print_expr(printer, lhs);
            printer.write(" = ");
            print_expr(printer, rhs);
        }
        Expr::AssignOp(op, lhs, rhs) => {
            print_expr(printer, lhs);
            printer.write(&format!(" {}= ", op_symbol(*op)));
            print_expr(printer, rhs);
        }
        Expr::Call(call) => print_call(printer, call),
        Expr::Member(base, member) => {
            print_expr(printer, base);
            let via_pointer = matches!(base.ty, Some(Type::Agent(_)));
            printer.write(if via_pointer { "->" } else { "." });
            printer.write(member);
        }
        Expr::Index(base, index) => {
            print_expr(printer, base);
            printer.write("->values[");
            print_expr(printer, index);
            printer.write("]");
        }
        Expr::Ternary(cond, then_branch, else_branch) => {
            printer.write("(");
            print_expr(printer, cond);
            printer.write(" ? ");
            print_expr(printer, then_branch);
            printer.write(" : ");
            print_expr(printer, else_branch);
            printer.write(")");
        }
        Expr::AgentCreation(creation) => {
            printer.write(&format!("({}){{ ", creation.agent_name));
            for (i, (name, value)) in creation.members.iter().enumerate() {
                if i > 0 {
                    printer.write(", ");
                }
                printer.write(&format!(".{} = ", name));
                print_expr(printer, value);
            }
            printer.write(" }");
        }
        Expr::ArrayInit(items) => {
            printer.write("{ ");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    printer.write(", ");
                }
                print_expr(printer, item);
            }
            printer.write(" }");
        }
        Expr::NewArray(type_node, size) => {
            printer.write(&format!(
                "dyn_array_new(sizeof({}), ",
                print_type(type_node.resolved.as_ref().unwrap())
            ));
            print_expr(printer, size);
            printer.write(")");
        }
    }
}

fn print_binary(printer: &mut Printer, op: BinOp, lhs: &ExprNode, rhs: &ExprNode) {
    let lt = lhs.ty.clone().unwrap_or(Type::Void);
    let rt = rhs.ty.clone().unwrap_or(Type::Void);

    if op == BinOp::Mul && lt.is_numeric() && rt.is_vec() {
        // `scalar * vec` is normalized to right-multiplication: emit as
        // `float{2,3}_mul_scalar(vec, scalar)`.
        let width = rt.vec_width().unwrap();
        printer.write(&format!("float{}_mul_scalar(", width));
        print_expr(printer, rhs);
        printer.write(", ");
        print_expr(printer, lhs);
        printer.write(")");
        return;
    }

    if lt.is_vec() {
        let width = lt.vec_width().unwrap();
        let helper = match op {
            BinOp::Add => format!("float{}_add", width),
            BinOp::Sub => format!("float{}_sub", width),
            BinOp::Mul => format!("float{}_mul_scalar", width),
            BinOp::Div => format!("float{}_div_scalar", width),
            _ => unreachable!("analysis rejects other vector operators"),
        };
        printer.write(&format!("{}(", helper));
        print_expr(printer, lhs);
        printer.write(", ");
        print_expr(printer, rhs);
        printer.write(")");
        return;
    }

    printer.write("(");
    print_expr(printer, lhs);
    printer.write(&format!(" {} ", op_symbol(op)));
    print_expr(printer, rhs);
    printer.write(")");
}

fn print_call(printer: &mut Printer, call: &Call) {
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
        print_expr(printer, &arg.expr);
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
    fn minimal_step_emits_pointer_member_access() {
        let out = compile(
            r#"
                agent Boid { position vec2 p; vec2 v; }
                void boid_step(Boid self) { self.p = self.p + self.v; }
            "#,
        );
        assert!(out.contains("self->p"));
        assert!(out.contains("self->v"));
        assert!(out.contains("float2_add"));
    }

    #[test]
    fn scalar_left_multiply_normalizes_to_right_multiplication() {
        let out = compile(
            r#"
                void f() {
                    vec2 a = vec2(1.0, 2.0);
                    float s = 2.0;
                    vec2 b = s * a;
                }
            "#,
        );
        assert!(out.contains("float2_mul_scalar(a, s)"));
    }

    #[test]
    fn braces_are_balanced() {
        let out = compile(
            r#"
                agent Boid { position vec2 p; }
                void f(Boid self) { if (true) { self.p = self.p; } }
            "#,
        );
        assert_eq!(out.matches('{').count(), out.matches('}').count());
    }
}
