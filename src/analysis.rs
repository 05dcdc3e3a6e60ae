//! The single-pass analysis visitor (spec §4.4).
//!
//! Registers agent/function names up front so forward references resolve,
//! then walks every declaration once: resolving names against the active
//! scope frame, assigning expression types, validating statement shapes,
//! and recording side information on step functions (accessed members,
//! neighbor radii). Context the original kept as mutable fields on the
//! visitor (`currentFunc`, `collectAccessVar`) is threaded explicitly
//! through an [`AnalysisCtx`] parameter instead, per REDESIGN FLAGS.

use crate::ast::*;
use crate::builtins::BuiltinFunctions;
use crate::constfold;
use crate::error::{ErrorStream, Location, OpenABLError};
use crate::scope::{Scope, VarMapStack};
use crate::types::{AgentId, Type};
use std::collections::HashMap;

pub struct Analyzer<'a> {
    script: &'a mut Script,
    scope: Scope,
    vars: VarMapStack,
    builtins: BuiltinFunctions,
    errors: ErrorStream,
    folded_consts: HashMap<String, Literal>,
    param_overrides: HashMap<String, String>,
}

/// Context for the portion of the walk inside a single function body: which
/// function we're in (for `isStep`/`radii`/`accessedMembers` bookkeeping)
/// and which variable, if any, member-accesses should be collected against
/// (the step parameter, once a `near(...)` call confirms step-ness).
#[derive(Clone, Copy, Default)]
struct FnCtx {
    func: Option<FuncId>,
    collect_access_var: Option<crate::scope::VarId>,
}

pub fn analyze(
    script: &mut Script,
    param_overrides: HashMap<String, String>,
) -> Result<(), Vec<OpenABLError>> {
    let mut analyzer = Analyzer {
        script,
        scope: Scope::new(),
        vars: VarMapStack::new(),
        builtins: BuiltinFunctions::new(),
        errors: ErrorStream::new(),
        folded_consts: HashMap::new(),
        param_overrides,
    };
    analyzer.run();
    if analyzer.errors.is_empty() {
        Ok(())
    } else {
        Err(analyzer.errors.into_errors())
    }
}

impl<'a> Analyzer<'a> {
    fn run(&mut self) {
        self.register_names();
        self.resolve_member_types();

        for i in 0..self.script.consts.len() {
            self.visit_const(i);
        }
        if let Some(env) = self.script.environment.take() {
            let env = self.visit_environment(env);
            self.script.environment = Some(env);
        }
        for i in 0..self.script.functions.len() {
            self.visit_function(i);
        }
    }

    fn error(&mut self, err: OpenABLError) {
        self.errors.push(err);
    }

    // -----------------------------------------------------------------
    // Pass 0: register names so forward references resolve
    // -----------------------------------------------------------------

    fn register_names(&mut self) {
        let mut seen_agents = HashMap::new();
        for (i, agent) in self.script.agents.iter().enumerate() {
            if seen_agents.insert(agent.name.clone(), i).is_some() {
                self.errors.push(OpenABLError::Redeclaration {
                    name: agent.name.clone(),
                    loc: Location::new(agent.span),
                });
            }
        }
        let mut seen_funcs = HashMap::new();
        for (i, func) in self.script.functions.iter().enumerate() {
            if seen_funcs.insert(func.name.clone(), i).is_some() {
                self.errors.push(OpenABLError::Redeclaration {
                    name: func.name.clone(),
                    loc: Location::new(func.span),
                });
            }
        }
    }

    /// Resolves every `TypeExpr::Named` against the agent table, filling
    /// `TypeNode::resolved` everywhere a type appears (members, params,
    /// return types, var-decls).
    fn resolve_member_types(&mut self) {
        let agent_names: HashMap<String, AgentId> = self
            .script
            .agents
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), i))
            .collect();

        for agent in &mut self.script.agents {
            for member in &mut agent.members {
                Self::resolve_type_node(&mut member.type_spec, &agent_names, &mut self.errors);
            }
        }
        for func in &mut self.script.functions {
            for param in &mut func.params {
                Self::resolve_type_node(&mut param.type_spec, &agent_names, &mut self.errors);
            }
            if let Some(ret) = &mut func.ret_type {
                Self::resolve_type_node(ret, &agent_names, &mut self.errors);
            }
        }
        for c in &mut self.script.consts {
            Self::resolve_type_node(&mut c.type_spec, &agent_names, &mut self.errors);
        }
    }

    fn resolve_type_node(
        node: &mut TypeNode,
        agent_names: &HashMap<String, AgentId>,
        errors: &mut ErrorStream,
    ) {
        node.resolved = Self::resolve_type_expr(&node.expr, agent_names, node.span, errors);
    }

    fn resolve_type_expr(
        expr: &TypeExpr,
        agent_names: &HashMap<String, AgentId>,
        span: Span,
        errors: &mut ErrorStream,
    ) -> Option<Type> {
        Some(match expr {
            TypeExpr::Void => Type::Void,
            TypeExpr::Bool => Type::Bool,
            TypeExpr::Int => Type::Int32,
            TypeExpr::Float => Type::Float32,
            TypeExpr::String => Type::String,
            TypeExpr::Vec2 => Type::Vec2,
            TypeExpr::Vec3 => Type::Vec3,
            TypeExpr::Array(elem) => Type::Array(Box::new(Self::resolve_type_expr(
                elem,
                agent_names,
                span,
                errors,
            )?)),
            TypeExpr::Named(name) => match agent_names.get(name) {
                Some(id) => Type::Agent(*id),
                None => {
                    errors.push(OpenABLError::UndeclaredVariable {
                        name: name.clone(),
                        loc: Location::new(span),
                    });
                    return None;
                }
            },
        })
    }

    // -----------------------------------------------------------------
    // Consts
    // -----------------------------------------------------------------

    fn visit_const(&mut self, idx: usize) {
        let (name, ty, init, span) = {
            let c = &self.script.consts[idx];
            (c.name.clone(), c.type_spec.resolved.clone(), c.init.clone(), c.span)
        };

        let mut init = init;
        self.visit_expr(&mut init, &FnCtx::default());

        let declared_ty = ty.unwrap_or(Type::Void);
        if let Some(actual) = &init.ty {
            if *actual != declared_ty {
                self.error(OpenABLError::TypeMismatch {
                    expected: declared_ty.to_string(),
                    found: actual.to_string(),
                    loc: Location::new(init.span),
                });
            }
        }

        let folded = if let Some(raw) = self.param_overrides.get(&name) {
            match parse_literal_override(raw, &declared_ty) {
                Some(lit) => Some(lit),
                None => {
                    self.error(OpenABLError::InvalidParamLiteral {
                        name: name.clone(),
                        value: raw.clone(),
                        loc: Location::new(span),
                    });
                    None
                }
            }
        } else {
            match constfold::fold(&init, &self.folded_consts) {
                Some(lit) => Some(lit),
                None => {
                    self.error(OpenABLError::NonConstInitializer {
                        name: name.clone(),
                        loc: Location::new(span),
                    });
                    None
                }
            }
        };

        if let Some(lit) = &folded {
            self.folded_consts.insert(name.clone(), lit.clone());
        }

        let var_id = self.scope.declare(name.clone(), declared_ty, true);
        self.vars.declare(&name, var_id);

        let c = &mut self.script.consts[idx];
        c.var_id = Some(var_id);
        c.init = init;
        c.folded = folded;
    }

    fn visit_environment(&mut self, mut env: EnvironmentDecl) -> EnvironmentDecl {
        for (_, expr) in &mut env.bounds {
            self.visit_expr(expr, &FnCtx::default());
        }
        env
    }

    // -----------------------------------------------------------------
    // Functions
    // -----------------------------------------------------------------

    fn visit_function(&mut self, idx: usize) {
        self.vars.push();

        let params = self.script.functions[idx].params.clone();
        let mut param_ids = Vec::with_capacity(params.len());
        for param in &params {
            let ty = param.type_spec.resolved.clone().unwrap_or(Type::Void);
            let id = self.scope.declare(param.name.clone(), ty, false);
            if !self.vars.declare(&param.name, id) {
                self.error(OpenABLError::Redeclaration {
                    name: param.name.clone(),
                    loc: Location::new(param.type_spec.span),
                });
            }
            param_ids.push(id);
        }
        for (param, id) in self.script.functions[idx].params.iter_mut().zip(&param_ids) {
            param.var_id = Some(*id);
        }

        // A function taking an agent-typed parameter is a step function
        // over that agent (its first agent-typed parameter, by
        // convention named `self`): set this up before the body is
        // walked, both so `is_step`/`step_agent` are known for scenarios
        // that never call `near` at all, and so a `near(self, r)`
        // for-loop inside the body (parsed straight into `ForKind::Near`,
        // never an `Expr::Call` — see `classify_for_source`) has a step
        // parameter to confirm itself against. The `step` keyword is kept
        // only as a human-readable hint (`has_step_keyword`); it plays no
        // part in this determination.
        let first_agent_param = self.script.functions[idx]
            .params
            .iter()
            .find_map(|p| match p.type_spec.resolved {
                Some(Type::Agent(agent_id)) => p.var_id.map(|id| (agent_id, id)),
                _ => None,
            });
        if let Some((agent_id, param_id)) = first_agent_param {
            let func = &mut self.script.functions[idx];
            func.is_step = true;
            func.step_agent = Some(agent_id);
            func.step_param_id = Some(param_id);
        }

        let ctx = FnCtx {
            func: Some(idx),
            collect_access_var: None,
        };

        let mut body = self.script.functions[idx].body.clone();
        self.visit_stmt(&mut body, ctx);
        self.script.functions[idx].body = body;

        self.vars.pop();
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn visit_stmt(&mut self, stmt: &mut StmtNode, ctx: FnCtx) {
        match &mut stmt.kind {
            Stmt::Expr(e) => self.visit_expr(e, &ctx),
            Stmt::Assign(lhs, rhs) => self.visit_assign(lhs, rhs, &ctx, stmt.span),
            Stmt::AssignOp(_, lhs, rhs) => self.visit_assign(lhs, rhs, &ctx, stmt.span),
            Stmt::Block(stmts) => {
                self.vars.push();
                for s in stmts {
                    self.visit_stmt(s, ctx);
                }
                self.vars.pop();
            }
            Stmt::VarDecl(decl) => self.visit_var_decl(decl, &ctx, stmt.span),
            Stmt::If(cond, then_branch, else_branch) => {
                self.visit_expr(cond, &ctx);
                self.visit_stmt(then_branch, ctx);
                if let Some(else_branch) = else_branch {
                    self.visit_stmt(else_branch, ctx);
                }
            }
            Stmt::While(cond, body) => {
                self.visit_expr(cond, &ctx);
                self.visit_stmt(body, ctx);
            }
            Stmt::For(for_stmt) => self.visit_for(for_stmt, ctx, stmt.span),
            Stmt::Simulate(e) => self.visit_expr(e, &ctx),
            Stmt::Return(Some(e)) => self.visit_expr(e, &ctx),
            Stmt::Return(None) => {}
        }
    }

    fn visit_assign(&mut self, lhs: &mut ExprNode, rhs: &mut ExprNode, ctx: &FnCtx, span: Span) {
        self.visit_expr(lhs, ctx);
        self.visit_expr(rhs, ctx);

        if !lhs.is_assignable() {
            self.error(OpenABLError::TypeMismatch {
                expected: "assignable location".into(),
                found: "expression".into(),
                loc: Location::new(lhs.span),
            });
            return;
        }

        if let Expr::Var(var_use) = &lhs.kind {
            if let Some(id) = var_use.id {
                if self.scope.get(id).is_const {
                    self.error(OpenABLError::AssignToConst {
                        name: var_use.name.clone(),
                        loc: Location::new(span),
                    });
                }
            }
        }

        // Foreign-agent-member-write rejection (SPEC_FULL §B.4): inside a
        // step function, a member write's base must resolve to the step
        // parameter itself, not some other agent expression.
        if let Expr::Member(base, _) = &lhs.kind {
            if let Some(step_param) = ctx.func.and_then(|f| self.script.functions[f].step_param_id)
            {
                if !matches!(&base.kind, Expr::Var(v) if v.id == Some(step_param)) {
                    self.error(OpenABLError::ForeignAgentWrite {
                        loc: Location::new(lhs.span),
                    });
                }
            }
        }

        if let (Some(lt), Some(rt)) = (&lhs.ty, &rhs.ty) {
            if lt != rt {
                self.error(OpenABLError::TypeMismatch {
                    expected: lt.to_string(),
                    found: rt.to_string(),
                    loc: Location::new(rhs.span),
                });
            }
        }
    }

    fn visit_var_decl(&mut self, decl: &mut VarDecl, ctx: &FnCtx, span: Span) {
        if let Some(init) = &mut decl.init {
            self.visit_expr(init, ctx);
        }
        let declared = decl.type_spec.resolved.clone().unwrap_or(Type::Void);
        if let Some(init) = &decl.init {
            if let Some(actual) = &init.ty {
                if *actual != declared {
                    self.error(OpenABLError::TypeMismatch {
                        expected: declared.to_string(),
                        found: actual.to_string(),
                        loc: Location::new(init.span),
                    });
                }
            }
        }
        let id = self.scope.declare(decl.name.clone(), declared, false);
        if !self.vars.declare(&decl.name, id) {
            self.error(OpenABLError::Redeclaration {
                name: decl.name.clone(),
                loc: Location::new(span),
            });
        }
        decl.var_id = Some(id);
    }

    fn visit_for(&mut self, for_stmt: &mut ForStmt, ctx: FnCtx, span: Span) {
        self.vars.push();

        let var_ty = match &mut for_stmt.kind {
            ForKind::Range { from, to } => {
                self.visit_expr(from, &ctx);
                self.visit_expr(to, &ctx);
                let ok = matches!(from.ty, Some(Type::Int32)) && matches!(to.ty, Some(Type::Int32));
                if !ok {
                    self.error(OpenABLError::IllegalForForm { loc: Location::new(span) });
                }
                Type::Int32
            }
            ForKind::Collection { collection } => {
                self.visit_expr(collection, &ctx);
                match &collection.ty {
                    Some(Type::Array(elem)) => (**elem).clone(),
                    _ => {
                        self.error(OpenABLError::IllegalForForm { loc: Location::new(span) });
                        Type::Void
                    }
                }
            }
            ForKind::Near { agent, radius } => {
                self.visit_expr(agent, &ctx);
                self.visit_expr(radius, &ctx);

                let step_param = ctx.func.and_then(|f| self.script.functions[f].step_param_id);
                let is_self = matches!(&agent.kind, Expr::Var(v) if v.id == step_param && step_param.is_some());
                let radius_is_float = matches!(radius.ty, Some(Type::Float32));

                if !is_self || !radius_is_float {
                    self.error(OpenABLError::IllegalForForm { loc: Location::new(span) });
                    Type::Void
                } else {
                    if let Some(f) = ctx.func {
                        if let Some(agent_id) = self.script.functions[f].step_agent {
                            // `is_step`/`step_agent` are already set by the
                            // structural pre-pass in `visit_function`; a
                            // qualifying near-loop only contributes its radius.
                            if let Some(lit) = constfold::fold(radius, &self.folded_consts) {
                                if let Literal::Float(v) = lit {
                                    self.script.functions[f].radii.push(v);
                                } else if let Literal::Int(v) = lit {
                                    self.script.functions[f].radii.push(v as f64);
                                }
                            }
                            Type::Agent(agent_id)
                        } else {
                            Type::Void
                        }
                    } else {
                        Type::Void
                    }
                }
            }
        };

        let id = self.scope.declare(for_stmt.var_name.clone(), var_ty.clone(), false);
        self.vars.declare(&for_stmt.var_name, id);
        for_stmt.var_id = Some(id);
        for_stmt.var_type = Some(var_ty);

        self.visit_stmt(&mut for_stmt.body, ctx);
        self.vars.pop();
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    fn visit_expr(&mut self, expr: &mut ExprNode, ctx: &FnCtx) {
        let ty = match &mut expr.kind {
            Expr::IntLit(_) => Type::Int32,
            Expr::FloatLit(_) => Type::Float32,
            Expr::BoolLit(_) => Type::Bool,
            Expr::StringLit(_) => Type::String,

            Expr::Var(var_use) => {
                match self.vars.lookup(&var_use.name) {
                    Some(id) => {
                        var_use.id = Some(id);
                        // Record member accesses against the step parameter
                        // as plain var reads happen one level up, in
                        // `Expr::Member`; nothing to do here.
                        self.scope.get(id).ty.clone()
                    }
                    None => {
                        self.error(OpenABLError::UndeclaredVariable {
                            name: var_use.name.clone(),
                            loc: Location::new(expr.span),
                        });
                        Type::Void
                    }
                }
            }

            Expr::Unary(op, inner) => {
                self.visit_expr(inner, ctx);
                let inner_ty = inner.ty.clone().unwrap_or(Type::Void);
                match op {
                    UnaryOp::Neg if inner_ty.is_numeric() || inner_ty.is_vec() => inner_ty,
                    UnaryOp::Not if inner_ty == Type::Bool => Type::Bool,
                    _ => {
                        self.error(OpenABLError::TypeMismatch {
                            expected: "numeric or vec (-) / bool (!)".into(),
                            found: inner_ty.to_string(),
                            loc: Location::new(expr.span),
                        });
                        Type::Void
                    }
                }
            }

            Expr::Binary(op, lhs, rhs) => {
                self.visit_expr(lhs, ctx);
                self.visit_expr(rhs, ctx);
                self.binary_result_type(*op, lhs, rhs, expr.span)
            }

            Expr::Assign(lhs, rhs) => {
                self.visit_assign(lhs, rhs, ctx, expr.span);
                lhs.ty.clone().unwrap_or(Type::Void)
            }
            Expr::AssignOp(_, lhs, rhs) => {
                self.visit_assign(lhs, rhs, ctx, expr.span);
                lhs.ty.clone().unwrap_or(Type::Void)
            }

            Expr::Call(call) => self.visit_call(call, ctx, expr.span),

            Expr::Member(base, member) => {
                self.visit_expr(base, ctx);
                self.record_member_access(base, member, ctx);
                self.member_type(base, member, expr.span)
            }

            Expr::Index(base, index) => {
                self.visit_expr(base, ctx);
                self.visit_expr(index, ctx);
                match &base.ty {
                    Some(Type::Array(elem)) => (**elem).clone(),
                    _ => {
                        self.error(OpenABLError::TypeMismatch {
                            expected: "array".into(),
                            found: base.ty.clone().unwrap_or(Type::Void).to_string(),
                            loc: Location::new(base.span),
                        });
                        Type::Void
                    }
                }
            }

            Expr::Ternary(cond, then_branch, else_branch) => {
                self.visit_expr(cond, ctx);
                self.visit_expr(then_branch, ctx);
                self.visit_expr(else_branch, ctx);
                let then_ty = then_branch.ty.clone().unwrap_or(Type::Void);
                let else_ty = else_branch.ty.clone().unwrap_or(Type::Void);
                if then_ty != else_ty {
                    self.error(OpenABLError::TypeMismatch {
                        expected: then_ty.to_string(),
                        found: else_ty.to_string(),
                        loc: Location::new(expr.span),
                    });
                }
                then_ty
            }

            Expr::AgentCreation(creation) => {
                for value in creation.members.values_mut() {
                    self.visit_expr(value, ctx);
                }
                match self.script.agent_by_name(&creation.agent_name) {
                    Some(id) => {
                        creation.agent_id = Some(id);
                        Type::Agent(id)
                    }
                    None => {
                        self.error(OpenABLError::UndeclaredVariable {
                            name: creation.agent_name.clone(),
                            loc: Location::new(expr.span),
                        });
                        Type::Void
                    }
                }
            }

            Expr::ArrayInit(items) => {
                for item in items.iter_mut() {
                    self.visit_expr(item, ctx);
                }
                let elem_ty = items
                    .first()
                    .and_then(|i| i.ty.clone())
                    .unwrap_or(Type::Void);
                Type::Array(Box::new(elem_ty))
            }

            Expr::NewArray(type_node, size) => {
                self.visit_expr(size, ctx);
                Type::Array(Box::new(type_node.resolved.clone().unwrap_or(Type::Void)))
            }
        };
        expr.ty = Some(ty);
    }

    fn binary_result_type(&mut self, op: BinOp, lhs: &ExprNode, rhs: &ExprNode, span: Span) -> Type {
        let lt = lhs.ty.clone().unwrap_or(Type::Void);
        let rt = rhs.ty.clone().unwrap_or(Type::Void);

        let mismatch = |analyzer: &mut Self| {
            analyzer.error(OpenABLError::TypeMismatch {
                expected: lt.to_string(),
                found: rt.to_string(),
                loc: Location::new(span),
            });
            Type::Void
        };

        if op.is_comparison() {
            if lt.is_vec() || rt.is_vec() {
                return mismatch(self);
            }
            return if lt == rt { Type::Bool } else { mismatch(self) };
        }

        match op {
            BinOp::And | BinOp::Or => {
                if lt == Type::Bool && rt == Type::Bool {
                    Type::Bool
                } else {
                    mismatch(self)
                }
            }
            BinOp::Range => {
                if lt == Type::Int32 && rt == Type::Int32 {
                    Type::Int32
                } else {
                    mismatch(self)
                }
            }
            BinOp::Mul if lt.is_vec() && rt == Type::Float32 => lt,
            BinOp::Mul if lt == Type::Float32 && rt.is_vec() => rt,
            BinOp::Div if lt.is_vec() && rt == Type::Float32 => lt,
            BinOp::Add | BinOp::Sub if lt.is_vec() && lt == rt => lt,
            _ if lt.is_numeric() && lt == rt => lt,
            _ => mismatch(self),
        }
    }

    fn record_member_access(&mut self, base: &ExprNode, member: &str, ctx: &FnCtx) {
        let Some(step_param) = ctx.collect_access_var.or_else(|| {
            ctx.func.and_then(|f| self.script.functions[f].step_param_id)
        }) else {
            return;
        };
        if matches!(&base.kind, Expr::Var(v) if v.id == Some(step_param)) {
            if let Some(func) = ctx.func {
                let accessed = &mut self.script.functions[func].accessed_members;
                if !accessed.iter().any(|m| m == member) {
                    accessed.push(member.to_string());
                }
            }
        }
    }

    fn member_type(&mut self, base: &ExprNode, member: &str, span: Span) -> Type {
        match &base.ty {
            Some(Type::Vec2) if matches!(member, "x" | "y") => Type::Float32,
            Some(Type::Vec3) if matches!(member, "x" | "y" | "z") => Type::Float32,
            Some(Type::Agent(id)) => {
                let agent = &self.script.agents[*id];
                match agent.member(member) {
                    Some(m) => m.type_spec.resolved.clone().unwrap_or(Type::Void),
                    None => {
                        self.error(OpenABLError::UnknownMember {
                            ty: agent.name.clone(),
                            member: member.to_string(),
                            loc: Location::new(span),
                        });
                        Type::Void
                    }
                }
            }
            other => {
                self.error(OpenABLError::UnknownMember {
                    ty: other.clone().unwrap_or(Type::Void).to_string(),
                    member: member.to_string(),
                    loc: Location::new(span),
                });
                Type::Void
            }
        }
    }

    fn visit_call(&mut self, call: &mut Call, ctx: &FnCtx, span: Span) -> Type {
        for arg in &mut call.args {
            self.visit_expr(&mut arg.expr, ctx);
            if let Some(out) = &mut arg.out_expr {
                self.visit_expr(out, ctx);
            }
        }
        let arg_types: Vec<Type> = call
            .args
            .iter()
            .map(|a| a.expr.ty.clone().unwrap_or(Type::Void))
            .collect();

        if let Some(func_id) = self.script.function_by_name(&call.name) {
            let func = &self.script.functions[func_id];
            let expected: Vec<Type> = func
                .params
                .iter()
                .map(|p| p.type_spec.resolved.clone().unwrap_or(Type::Void))
                .collect();
            if expected == arg_types {
                call.resolved = Some(CalledSig::User(func_id));
                return func
                    .ret_type
                    .as_ref()
                    .and_then(|t| t.resolved.clone())
                    .unwrap_or(Type::Void);
            }
            self.error(OpenABLError::NoMatchingOverload {
                name: call.name.clone(),
                loc: Location::new(span),
            });
            return Type::Void;
        }

        self.visit_builtin_call(call, ctx, &arg_types, span)
    }

    fn visit_builtin_call(
        &mut self,
        call: &mut Call,
        ctx: &FnCtx,
        arg_types: &[Type],
        span: Span,
    ) -> Type {
        let matches = self.builtins.resolve(&call.name, arg_types);
        match matches.len() {
            0 => {
                self.error(OpenABLError::NoMatchingOverload {
                    name: call.name.clone(),
                    loc: Location::new(span),
                });
                Type::Void
            }
            1 => {
                let resolved = matches.into_iter().next().unwrap();
                call.resolved = Some(CalledSig::Builtin(resolved.signature.clone()));

                if call.name == "near" {
                    self.confirm_step_function(call, ctx, arg_types);
                }

                resolved.return_type
            }
            _ => {
                self.error(OpenABLError::AmbiguousOverload {
                    name: call.name.clone(),
                    loc: Location::new(span),
                });
                Type::Void
            }
        }
    }

    /// Marks the enclosing function as a step function the first time its
    /// body calls `near(p, r)` on one of its parameters, per spec §4.4.
    fn confirm_step_function(&mut self, call: &Call, ctx: &FnCtx, arg_types: &[Type]) {
        let Some(func_id) = ctx.func else { return };
        let Some(Type::Agent(agent_id)) = arg_types.first() else {
            return;
        };
        let Expr::Var(var_use) = &call.args[0].expr.kind else {
            return;
        };
        let func = &mut self.script.functions[func_id];
        if !func.is_step {
            func.is_step = true;
            func.step_agent = Some(*agent_id);
            func.step_param_id = var_use.id;
        }
    }
}

fn parse_literal_override(raw: &str, ty: &Type) -> Option<Literal> {
    match ty {
        Type::Int32 => raw.parse::<i64>().ok().map(Literal::Int),
        Type::Float32 => raw.parse::<f64>().ok().map(Literal::Float),
        Type::Bool => raw.parse::<bool>().ok().map(Literal::Bool),
        Type::String => Some(Literal::String(raw.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn analyze_source(src: &str) -> Result<Script, Vec<OpenABLError>> {
        let mut script = parse(src).expect("parses");
        analyze(&mut script, HashMap::new())?;
        Ok(script)
    }

    #[test]
    fn minimal_step_scenario() {
        let script = analyze_source(
            r#"
                agent Boid { position vec2 p; vec2 v; }
                void boid_step(Boid self) { self.p = self.p + self.v; }
            "#,
        )
        .expect("analysis should succeed");
        let func = &script.functions[0];
        assert!(func.is_step);
        assert_eq!(func.step_agent, Some(0));
        let mut members = func.accessed_members.clone();
        members.sort();
        assert_eq!(members, vec!["p".to_string(), "v".to_string()]);
    }

    #[test]
    fn neighborhood_loop_records_radius() {
        let script = analyze_source(
            r#"
                agent Boid { position vec2 p; vec2 v; }
                void s(Boid self) {
                    for (Boid o in near(self, 1.5)) {
                        self.v = self.v + (o.p - self.p);
                    }
                }
            "#,
        )
        .expect("analysis should succeed");
        assert_eq!(script.functions[0].radii, vec![1.5]);
    }

    #[test]
    fn redeclared_agent_is_an_error() {
        let result = analyze_source(
            r#"
                agent Boid { position vec2 p; }
                agent Boid { position vec2 q; }
            "#,
        );
        assert!(matches!(
            result.unwrap_err().as_slice(),
            [OpenABLError::Redeclaration { .. }]
        ));
    }

    #[test]
    fn const_param_override_wins_over_initializer() {
        let mut script = parse("const int N = 100;").unwrap();
        let mut overrides = HashMap::new();
        overrides.insert("N".to_string(), "1024".to_string());
        analyze(&mut script, overrides).unwrap();
        assert_eq!(script.consts[0].folded, Some(Literal::Int(1024)));
    }

    #[test]
    fn undeclared_variable_is_an_error() {
        let result = analyze_source("void f() { return x; }");
        assert!(matches!(
            result.unwrap_err().as_slice(),
            [OpenABLError::UndeclaredVariable { .. }]
        ));
    }

    #[test]
    fn assigning_to_foreign_agent_member_is_rejected() {
        let result = analyze_source(
            r#"
                agent Boid { position vec2 p; }
                void s(Boid self, Boid other) {
                    for (Boid o in near(self, 1.0)) {
                        other.p = self.p;
                    }
                }
            "#,
        );
        assert!(result
            .unwrap_err()
            .iter()
            .any(|e| matches!(e, OpenABLError::ForeignAgentWrite { .. })));
    }
}
