//! Parser for OpenABL source code.
//!
//! Two-phase, like the teacher: lex the whole source into a token vector
//! first, then run a chumsky token parser over it. Syntax errors abort
//! immediately (spec §4.1/§7 — no recovery attempted), matching the
//! original's `ParserContext::parse() -> bool`.

mod declarations;
mod expressions;
mod primitives;
mod statements;

use crate::ast::Script;
use crate::error::{Location, OpenABLError};
use crate::lexer::{lexer, Span};
use chumsky::input::Input;
use chumsky::Parser;
use declarations::TopLevel;

pub use expressions::{expr, type_expr};
pub use statements::stmt;

/// Parses a complete OpenABL source file into a [`Script`].
///
/// Returns the first lex or parse error encountered; the grammar does not
/// attempt error recovery, matching spec §4.1 ("first error aborts").
pub fn parse(source: &str) -> Result<Script, OpenABLError> {
    let tokens = lexer().parse(source).into_result().map_err(|errs| {
        let err = &errs[0];
        OpenABLError::Syntax {
            message: err.to_string(),
            loc: Location::new(*err.span()),
        }
    })?;

    let eoi: Span = Span::new(source.len(), source.len());
    let token_stream = tokens.as_slice().map(eoi, |(tok, span)| (tok, span));

    let top_levels = declarations::top_level()
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(chumsky::prelude::end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| {
            let err = &errs[0];
            OpenABLError::Syntax {
                message: err.to_string(),
                loc: Location::new(*err.span()),
            }
        })?;

    let mut script = Script::new();
    for top in top_levels {
        match top {
            TopLevel::Agent(agent) => script.agents.push(agent),
            TopLevel::Const(c) => script.consts.push(c),
            TopLevel::Environment(environment) => script.environment = Some(environment),
            TopLevel::Function(f) => script.functions.push(f),
        }
    }
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_agent_and_step() {
        let src = r#"
            agent Boid { position vec2 p; vec2 v; }
            void boid_step(Boid self) { self.p = self.p + self.v; }
        "#;
        let script = parse(src).expect("should parse");
        assert_eq!(script.agents.len(), 1);
        assert_eq!(script.agents[0].name, "Boid");
        assert_eq!(script.functions.len(), 1);
        assert_eq!(script.functions[0].name, "boid_step");
    }

    #[test]
    fn parses_const_and_environment() {
        let src = r#"
            const int N = 100;
            environment { width = 10.0; height = 10.0; }
        "#;
        let script = parse(src).expect("should parse");
        assert_eq!(script.consts.len(), 1);
        assert_eq!(script.consts[0].name, "N");
        assert!(script.environment.is_some());
        assert_eq!(script.environment.unwrap().bounds.len(), 2);
    }

    #[test]
    fn parses_neighborhood_loop() {
        let src = r#"
            agent Boid { position vec2 p; vec2 v; }
            void s(Boid self) {
                for (Boid o in near(self, 1.5)) {
                    self.v = self.v + (o.p - self.p);
                }
            }
        "#;
        let script = parse(src).expect("should parse");
        assert_eq!(script.functions.len(), 1);
    }

    #[test]
    fn syntax_error_aborts_on_first_failure() {
        let src = "agent Boid { vec2 p; ";
        assert!(parse(src).is_err());
    }
}
