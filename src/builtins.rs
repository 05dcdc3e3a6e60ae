//! The builtin function registry.
//!
//! OpenABL exposes a small fixed set of builtin functions (`dot`, `length`,
//! `dist`, `random`, plus the agent-specific `add`/`near`/`save`). Each name
//! maps to one or more overloads; resolution picks the overload whose
//! parameter kinds match the call-site argument types exactly or through a
//! wildcard (`AnyAgent`, matched and recorded so the return type can be
//! concretized from it).

use crate::types::{AgentId, Type};
use indexmap::IndexMap;
use serde::Serialize;

/// A parameter or return slot that may match any concrete type in a class,
/// with the match recorded so a later slot (typically the return type) can
/// reuse it. Mirrors the original's implicit "agent" placeholder in
/// `near`'s `{ Type::ARRAY, Type::AGENT }` return spec, made explicit here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParamKind {
    Exact(Type),
    AnyAgent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RetKind {
    Exact(Type),
    ArrayOfMatchedAgent,
    MatchedAgent,
}

#[derive(Debug, Clone, Serialize)]
pub struct Signature {
    /// Name emitted in generated code (the C backend's free-function name,
    /// e.g. `dot_float2`); distinct overloads of the same OpenABL name emit
    /// distinct C symbols.
    pub emit_name: &'static str,
    pub params: Vec<ParamKind>,
    pub ret: RetKind,
}

impl Signature {
    fn new(emit_name: &'static str, params: Vec<ParamKind>, ret: RetKind) -> Self {
        Self {
            emit_name,
            params,
            ret,
        }
    }
}

/// Outcome of a successful overload resolution: which overload matched, and
/// the concrete return type after resolving any wildcard against the actual
/// argument types.
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    pub signature: &'a Signature,
    pub return_type: Type,
}

#[derive(Debug, Default)]
pub struct BuiltinFunctions {
    overloads: IndexMap<String, Vec<Signature>>,
}

impl BuiltinFunctions {
    pub fn new() -> Self {
        let mut funcs = Self::default();
        funcs.register_defaults();
        funcs
    }

    pub fn add(&mut self, name: &str, emit_name: &'static str, params: Vec<ParamKind>, ret: RetKind) {
        self.overloads
            .entry(name.to_string())
            .or_default()
            .push(Signature::new(emit_name, params, ret));
    }

    fn register_defaults(&mut self) {
        use ParamKind::*;
        use Type::*;

        self.add("vec2", "float2_make", vec![Exact(Float32), Exact(Float32)], RetKind::Exact(Vec2));
        self.add(
            "vec3",
            "float3_make",
            vec![Exact(Float32), Exact(Float32), Exact(Float32)],
            RetKind::Exact(Vec3),
        );
        self.add("dot", "dot_float2", vec![Exact(Vec2), Exact(Vec2)], RetKind::Exact(Float32));
        self.add("dot", "dot_float3", vec![Exact(Vec3), Exact(Vec3)], RetKind::Exact(Float32));
        self.add("length", "length_float2", vec![Exact(Vec2)], RetKind::Exact(Float32));
        self.add("length", "length_float3", vec![Exact(Vec3)], RetKind::Exact(Float32));
        self.add("dist", "dist_float2", vec![Exact(Vec2), Exact(Vec2)], RetKind::Exact(Float32));
        self.add("dist", "dist_float3", vec![Exact(Vec3), Exact(Vec3)], RetKind::Exact(Float32));
        self.add(
            "random",
            "random_float",
            vec![Exact(Float32), Exact(Float32)],
            RetKind::Exact(Float32),
        );
        self.add("random", "random_float2", vec![Exact(Vec2), Exact(Vec2)], RetKind::Exact(Vec2));
        self.add("random", "random_float3", vec![Exact(Vec3), Exact(Vec3)], RetKind::Exact(Vec3));

        // Agent-specific functions.
        self.add("add", "add", vec![AnyAgent], RetKind::Exact(Void));
        self.add("near", "near", vec![AnyAgent, Exact(Float32)], RetKind::ArrayOfMatchedAgent);
        self.add("save", "save", vec![Exact(String)], RetKind::Exact(Void));
    }

    /// Resolves `name` against `arg_types`. Returns `None` when no overload
    /// has a matching arity/parameter shape (caller reports
    /// `NoMatchingOverload`); returns multiple-match ambiguity by returning
    /// more than one entry (caller reports `AmbiguousOverload`).
    pub fn resolve(&self, name: &str, arg_types: &[Type]) -> Vec<Resolved<'_>> {
        let Some(candidates) = self.overloads.get(name) else {
            return Vec::new();
        };

        candidates
            .iter()
            .filter_map(|sig| Self::match_signature(sig, arg_types))
            .collect()
    }

    fn match_signature<'a>(sig: &'a Signature, arg_types: &[Type]) -> Option<Resolved<'a>> {
        if sig.params.len() != arg_types.len() {
            return None;
        }

        let mut matched_agent: Option<AgentId> = None;
        for (param, arg) in sig.params.iter().zip(arg_types) {
            match param {
                ParamKind::Exact(expected) => {
                    if expected != arg {
                        return None;
                    }
                }
                ParamKind::AnyAgent => {
                    let id = arg.agent_decl()?;
                    matched_agent = Some(id);
                }
            }
        }

        let return_type = match &sig.ret {
            RetKind::Exact(ty) => ty.clone(),
            RetKind::MatchedAgent => Type::Agent(matched_agent?),
            RetKind::ArrayOfMatchedAgent => Type::Array(Box::new(Type::Agent(matched_agent?))),
        };

        Some(Resolved {
            signature: sig,
            return_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_overload_picks_right_vector_width() {
        let funcs = BuiltinFunctions::new();
        let resolved = funcs.resolve("dot", &[Type::Vec2, Type::Vec2]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].signature.emit_name, "dot_float2");
        assert_eq!(resolved[0].return_type, Type::Float32);
    }

    #[test]
    fn near_concretizes_wildcard_to_matched_agent() {
        let funcs = BuiltinFunctions::new();
        let resolved = funcs.resolve("near", &[Type::Agent(3), Type::Float32]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].return_type, Type::Array(Box::new(Type::Agent(3))));
    }

    #[test]
    fn wrong_arity_does_not_match() {
        let funcs = BuiltinFunctions::new();
        assert!(funcs.resolve("dot", &[Type::Vec2]).is_empty());
    }

    #[test]
    fn unknown_name_resolves_to_nothing() {
        let funcs = BuiltinFunctions::new();
        assert!(funcs.resolve("frobnicate", &[]).is_empty());
    }

    #[test]
    fn save_requires_agent_but_not_vector_types() {
        let funcs = BuiltinFunctions::new();
        assert!(funcs.resolve("save", &[Type::String]).len() == 1);
        assert!(funcs.resolve("save", &[Type::Int32]).is_empty());
    }
}
