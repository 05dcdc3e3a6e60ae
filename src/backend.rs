//! The backend facade: picks a printer, checks the analyzed script against
//! that backend's supported node kinds, generates source, and lays out the
//! asset template into the output directory.
//!
//! Grounded on `original_source/src/main.cpp`'s `-b`/`--backend`,
//! `-A`/`--asset-dir` handling and `Backend::generate(script, outputDir,
//! assetDir)` call, and on the pre-analysis rejection strategy decided for
//! the Open Question on partial-backend support (see DESIGN.md).

use crate::ast::*;
use crate::error::{Location, OpenABLError};
use crate::printer::{c_backend, flame_backend, mason_backend, NodeKind};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    C,
    Flame,
    Mason,
}

impl BackendKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "c" => Some(Self::C),
            "flame" => Some(Self::Flame),
            "mason" => Some(Self::Mason),
            _ => None,
        }
    }

    /// Directory name of this backend's asset template and the name used in
    /// `OpenABLError::UnsupportedBackend`.
    pub fn name(self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Flame => "flame",
            Self::Mason => "mason",
        }
    }

    fn supported_kinds(self) -> HashSet<NodeKind> {
        match self {
            Self::C => c_backend::supported_kinds(),
            Self::Flame => flame_backend::supported_kinds(),
            Self::Mason => mason_backend::supported_kinds(),
        }
    }

    /// Output file name within the generated output directory for this
    /// backend's single emitted translation unit.
    fn output_file_name(self) -> &'static str {
        match self {
            Self::C => "model.c",
            Self::Flame => "FlameModel.cu",
            Self::Mason => "Sim.java",
        }
    }

    fn generate_source(self, script: &Script) -> String {
        match self {
            Self::C => c_backend::generate(script),
            Self::Flame => flame_backend::generate(script),
            Self::Mason => mason_backend::generate(script),
        }
    }
}

/// Generates `backend`'s output for `script` into `output_dir`, first
/// copying `asset_dir`'s template tree (spec §4.6's "asset pipeline"; the
/// original's `-A`/`--asset-dir`, default `./asset`).
pub fn generate(
    backend: BackendKind,
    script: &Script,
    output_dir: &Path,
    asset_dir: &Path,
) -> Result<(), OpenABLError> {
    check_supported(backend, script)?;

    fs::create_dir_all(output_dir).map_err(|e| OpenABLError::Io(e.to_string()))?;

    if asset_dir.is_dir() {
        let template_dir = asset_dir.join(backend.name());
        if template_dir.is_dir() {
            copy_dir_recursive(&template_dir, output_dir)?;
        }
    }

    let source = backend.generate_source(script);
    let out_path = output_dir.join(backend.output_file_name());
    fs::write(&out_path, source).map_err(|e| OpenABLError::Io(e.to_string()))?;

    Ok(())
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<(), OpenABLError> {
    fs::create_dir_all(to).map_err(|e| OpenABLError::Io(e.to_string()))?;
    for entry in fs::read_dir(from).map_err(|e| OpenABLError::Io(e.to_string()))? {
        let entry = entry.map_err(|e| OpenABLError::Io(e.to_string()))?;
        let src_path = entry.path();
        let dst_path = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| OpenABLError::Io(e.to_string()))?;
        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).map_err(|e| OpenABLError::Io(e.to_string()))?;
        }
    }
    Ok(())
}

/// Walks the analyzed script and reports the first construct the chosen
/// backend doesn't advertise support for. This is the pre-analysis
/// rejection resolving the Open Question on partial backends (DESIGN.md):
/// a script is checked against `supported_kinds()` before any printer code
/// runs, rather than the printer silently no-op'ing unsupported nodes.
fn check_supported(backend: BackendKind, script: &Script) -> Result<(), OpenABLError> {
    let supported = backend.supported_kinds();
    for func in &script.functions {
        check_stmt(backend, &supported, &func.body)?;
    }
    Ok(())
}

fn check_stmt(backend: BackendKind, supported: &HashSet<NodeKind>, stmt: &StmtNode) -> Result<(), OpenABLError> {
    match &stmt.kind {
        Stmt::Expr(e) => check_expr(backend, supported, e)?,
        Stmt::Simulate(e) => {
            check_expr(backend, supported, e)?;
            require(backend, supported, NodeKind::Simulate, stmt.span)?;
        }
        Stmt::Assign(lhs, rhs) | Stmt::AssignOp(_, lhs, rhs) => {
            check_expr(backend, supported, lhs)?;
            check_expr(backend, supported, rhs)?;
        }
        Stmt::Block(stmts) => {
            for s in stmts {
                check_stmt(backend, supported, s)?;
            }
        }
        Stmt::VarDecl(decl) => {
            if let Some(init) = &decl.init {
                check_expr(backend, supported, init)?;
            }
        }
        Stmt::If(cond, then_branch, else_branch) => {
            check_expr(backend, supported, cond)?;
            check_stmt(backend, supported, then_branch)?;
            if let Some(else_branch) = else_branch {
                check_stmt(backend, supported, else_branch)?;
            }
        }
        Stmt::While(cond, body) => {
            check_expr(backend, supported, cond)?;
            check_stmt(backend, supported, body)?;
        }
        Stmt::For(for_stmt) => {
            let kind = match &for_stmt.kind {
                ForKind::Range { from, to } => {
                    check_expr(backend, supported, from)?;
                    check_expr(backend, supported, to)?;
                    NodeKind::RangeFor
                }
                ForKind::Collection { collection } => {
                    check_expr(backend, supported, collection)?;
                    NodeKind::CollectionFor
                }
                ForKind::Near { agent, radius } => {
                    check_expr(backend, supported, agent)?;
                    check_expr(backend, supported, radius)?;
                    NodeKind::NearFor
                }
            };
            require(backend, supported, kind, stmt.span)?;
            check_stmt(backend, supported, &for_stmt.body)?;
        }
        Stmt::Return(Some(e)) => check_expr(backend, supported, e)?,
        Stmt::Return(None) => {}
    }
    Ok(())
}

fn check_expr(backend: BackendKind, supported: &HashSet<NodeKind>, expr: &ExprNode) -> Result<(), OpenABLError> {
    match &expr.kind {
        Expr::IntLit(_)
        | Expr::FloatLit(_)
        | Expr::BoolLit(_)
        | Expr::StringLit(_)
        | Expr::Var(_) => {}
        Expr::Unary(_, inner) => check_expr(backend, supported, inner)?,
        Expr::Binary(_, lhs, rhs) | Expr::Assign(lhs, rhs) | Expr::AssignOp(_, lhs, rhs) => {
            check_expr(backend, supported, lhs)?;
            check_expr(backend, supported, rhs)?;
        }
        Expr::Call(call) => {
            for arg in &call.args {
                check_expr(backend, supported, &arg.expr)?;
                if let Some(out) = &arg.out_expr {
                    check_expr(backend, supported, out)?;
                }
            }
        }
        Expr::Member(base, _) => check_expr(backend, supported, base)?,
        Expr::Index(base, index) => {
            check_expr(backend, supported, base)?;
            check_expr(backend, supported, index)?;
        }
        Expr::Ternary(cond, then_branch, else_branch) => {
            check_expr(backend, supported, cond)?;
            check_expr(backend, supported, then_branch)?;
            check_expr(backend, supported, else_branch)?;
            require(backend, supported, NodeKind::Ternary, expr.span)?;
        }
        Expr::AgentCreation(creation) => {
            for value in creation.members.values() {
                check_expr(backend, supported, value)?;
            }
            require(backend, supported, NodeKind::AgentCreation, expr.span)?;
        }
        Expr::ArrayInit(items) => {
            for item in items {
                check_expr(backend, supported, item)?;
            }
            require(backend, supported, NodeKind::ArrayInit, expr.span)?;
        }
        Expr::NewArray(_, size) => {
            check_expr(backend, supported, size)?;
            require(backend, supported, NodeKind::NewArray, expr.span)?;
        }
    }
    Ok(())
}

fn require(
    backend: BackendKind,
    supported: &HashSet<NodeKind>,
    kind: NodeKind,
    span: Span,
) -> Result<(), OpenABLError> {
    if supported.contains(&kind) {
        Ok(())
    } else {
        Err(OpenABLError::UnsupportedNodeKind {
            backend: backend.name().to_string(),
            kind: format!("{:?}", kind),
            loc: Location::new(span),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::parser::parse;
    use std::collections::HashMap;

    fn analyzed(src: &str) -> Script {
        let mut script = parse(src).unwrap();
        analyze(&mut script, HashMap::new()).unwrap();
        script
    }

    #[test]
    fn c_backend_accepts_every_construct() {
        let script = analyzed(
            r#"
                agent Boid { position vec2 p; vec2 v; }
                void boid_step(Boid self) {
                    for (Boid o in near(self, 1.0)) {
                        self.v = self.v + o.v;
                    }
                    simulate(self);
                }
            "#,
        );
        assert!(check_supported(BackendKind::C, &script).is_ok());
    }

    #[test]
    fn mason_backend_rejects_near_loop() {
        let script = analyzed(
            r#"
                agent Boid { position vec2 p; vec2 v; }
                void boid_step(Boid self) {
                    for (Boid o in near(self, 1.0)) {
                        self.v = self.v + o.v;
                    }
                }
            "#,
        );
        let result = check_supported(BackendKind::Mason, &script);
        assert!(matches!(result, Err(OpenABLError::UnsupportedNodeKind { .. })));
    }

    #[test]
    fn flame_backend_rejects_simulate_statement() {
        let script = analyzed(
            r#"
                agent Boid { position vec2 p; }
                void driver() { simulate(1); }
            "#,
        );
        let result = check_supported(BackendKind::Flame, &script);
        assert!(matches!(result, Err(OpenABLError::UnsupportedNodeKind { .. })));
    }
}
