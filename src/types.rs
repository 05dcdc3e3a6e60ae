//! The OpenABL type system.
//!
//! A [`Type`] is a small tagged value: scalars, the two vector widths, array
//! types, and agent types. Agents are identified by [`AgentId`], a dense
//! index into the [`crate::ast::Script`]'s agent table, rather than by a raw
//! pointer/reference to the declaration — this is what survives AST moves
//! and keeps the type cheap to clone.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an [`crate::ast::AgentDecl`] within a [`crate::ast::Script`].
pub type AgentId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Bool,
    Int32,
    Float32,
    String,
    Vec2,
    Vec3,
    Array(Box<Type>),
    Agent(AgentId),
}

/// Coarse type-id used by builtin overload matching and vector-width
/// dispatch in the printers (mirrors `Type::getTypeId()` in the original).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeId {
    Void,
    Bool,
    Int32,
    Float32,
    String,
    Vec2,
    Vec3,
    Array,
    Agent,
}

impl Type {
    pub fn is_vec(&self) -> bool {
        matches!(self, Type::Vec2 | Type::Vec3)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn is_agent(&self) -> bool {
        matches!(self, Type::Agent(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int32 | Type::Float32)
    }

    /// Valid only when [`Type::is_agent`] holds.
    pub fn agent_decl(&self) -> Option<AgentId> {
        match self {
            Type::Agent(id) => Some(*id),
            _ => None,
        }
    }

    /// Valid only when [`Type::is_array`] holds.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn type_id(&self) -> TypeId {
        match self {
            Type::Void => TypeId::Void,
            Type::Bool => TypeId::Bool,
            Type::Int32 => TypeId::Int32,
            Type::Float32 => TypeId::Float32,
            Type::String => TypeId::String,
            Type::Vec2 => TypeId::Vec2,
            Type::Vec3 => TypeId::Vec3,
            Type::Array(_) => TypeId::Array,
            Type::Agent(_) => TypeId::Agent,
        }
    }

    /// The vector width, if this is a vector type.
    pub fn vec_width(&self) -> Option<u8> {
        match self {
            Type::Vec2 => Some(2),
            Type::Vec3 => Some(3),
            _ => None,
        }
    }
}

/// Spelling used verbatim by the generic "C-like" printer.
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int32 => write!(f, "int"),
            Type::Float32 => write!(f, "float"),
            Type::String => write!(f, "char*"),
            Type::Vec2 => write!(f, "float2"),
            Type::Vec3 => write!(f, "float3"),
            Type::Array(elem) => write!(f, "{}[]", elem),
            Type::Agent(id) => write!(f, "agent#{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates() {
        assert!(Type::Vec2.is_vec());
        assert!(Type::Vec3.is_vec());
        assert!(!Type::Int32.is_vec());
        assert!(Type::Array(Box::new(Type::Int32)).is_array());
        assert!(Type::Agent(0).is_agent());
    }

    #[test]
    fn structural_equality() {
        assert_eq!(Type::Agent(3), Type::Agent(3));
        assert_ne!(Type::Agent(3), Type::Agent(4));
        assert_eq!(
            Type::Array(Box::new(Type::Vec2)),
            Type::Array(Box::new(Type::Vec2))
        );
    }

    #[test]
    fn display_matches_generic_c_spelling() {
        assert_eq!(Type::Bool.to_string(), "bool");
        assert_eq!(Type::Int32.to_string(), "int");
        assert_eq!(Type::Float32.to_string(), "float");
        assert_eq!(Type::String.to_string(), "char*");
    }
}
