//! # openabl
//!
//! A source-to-source compiler for agent-based simulation models: parses an
//! OpenABL script, analyzes and type-checks it, then lowers it to one of
//! several backend targets (plain C/OpenMP, FlameGPU-style, Mason-style
//! JVM).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use openabl::{compile, backend::BackendKind};
//! use std::path::Path;
//!
//! compile(
//!     source,
//!     BackendKind::C,
//!     Default::default(),
//!     Path::new("./out"),
//!     Path::new("./asset"),
//! )?;
//! ```

pub mod analysis;
pub mod ast;
pub mod backend;
pub mod builtins;
pub mod constfold;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod scope;
pub mod serializer;
pub mod types;

use backend::BackendKind;
use error::OpenABLError;
use std::collections::HashMap;
use std::path::Path;

/// Runs the full pipeline — parse, analyze, generate — for one source file.
///
/// `param_overrides` supplies `-p name=value` const overrides (SPEC_FULL
/// §B.3); an empty map means "use the source's own const initializers".
pub fn compile(
    source: &str,
    backend: BackendKind,
    param_overrides: HashMap<String, String>,
    output_dir: &Path,
    asset_dir: &Path,
) -> Result<ast::Script, Vec<OpenABLError>> {
    let mut script = parser::parse(source).map_err(|e| vec![e])?;
    analysis::analyze(&mut script, param_overrides)?;
    backend::generate(backend, &script, output_dir, asset_dir).map_err(|e| vec![e])?;
    Ok(script)
}

/// Parses and analyzes a source file without generating backend output —
/// used by `--dump-ast` and by anything that only needs the annotated tree.
pub fn analyze_source(
    source: &str,
    param_overrides: HashMap<String, String>,
) -> Result<ast::Script, Vec<OpenABLError>> {
    let mut script = parser::parse(source).map_err(|e| vec![e])?;
    analysis::analyze(&mut script, param_overrides)?;
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_source_reports_type_errors() {
        let result = analyze_source("void f() { int x = true; }", HashMap::new());
        assert!(result.is_err());
    }

    #[test]
    fn analyze_source_succeeds_on_a_minimal_boid() {
        let result = analyze_source(
            r#"
                agent Boid { position vec2 p; vec2 v; }
                void boid_step(Boid self) { self.p = self.p + self.v; }
            "#,
            HashMap::new(),
        );
        assert!(result.is_ok());
    }
}
