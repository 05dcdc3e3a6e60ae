//! AST-to-JSON serialization for the `--dump-ast` debug flag.
//!
//! One-way only: [`Script`] derives `Serialize` but deliberately not
//! `Deserialize` (SPEC_FULL §B.5 — there is no JSON-to-OpenABL reader, so
//! round-trip support would be dead code).

use crate::ast::Script;

/// Serializes `script` as pretty-printed JSON.
pub fn to_json_pretty(script: &Script) -> serde_json::Result<String> {
    serde_json::to_string_pretty(script)
}

/// Serializes `script` as compact single-line JSON.
pub fn to_json_compact(script: &Script) -> serde_json::Result<String> {
    serde_json::to_string(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn dump_includes_agent_and_function_names() {
        let script = parse(
            r#"
                agent Boid { position vec2 p; }
                void boid_step(Boid self) { }
            "#,
        )
        .unwrap();
        let json = to_json_pretty(&script).unwrap();
        assert!(json.contains("\"Boid\""));
        assert!(json.contains("\"boid_step\""));
    }

    #[test]
    fn compact_dump_is_single_line() {
        let script = parse("const int N = 1;").unwrap();
        let json = to_json_compact(&script).unwrap();
        assert!(!json.contains('\n'));
    }
}
