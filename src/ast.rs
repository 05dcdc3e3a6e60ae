//! The OpenABL abstract syntax tree.
//!
//! Every node is wrapped with its source [`Span`] and carries an
//! analysis-fill slot (a plain `Option<T>`, set once by [`crate::analysis`]
//! and read thereafter) rather than a back-pointer into another structure.
//! Cross-references — a variable use's declaration, a call's resolved
//! signature, a step function's target agent — are all small dense indices
//! (`VarId`, `AgentId`, `FuncId`) into tables owned by the [`Script`], never
//! raw references, so the tree stays trivially movable.

use crate::builtins::Signature;
use crate::scope::VarId;
use crate::types::{AgentId, Type};
use indexmap::IndexMap;
use serde::Serialize;

pub type Span = chumsky::span::SimpleSpan<usize>;
pub type FuncId = usize;

fn span_is_dummy(span: &Span) -> bool {
    span.start == 0 && span.end == 0
}

#[derive(Debug, Clone, Serialize)]
pub struct Spanned<T> {
    pub node: T,
    #[serde(skip_serializing_if = "span_is_dummy", default)]
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

// ---------------------------------------------------------------------
// Types as written in source, before agent-name resolution
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeExpr {
    Void,
    Bool,
    Int,
    Float,
    String,
    Vec2,
    Vec3,
    Array(Box<TypeExpr>),
    /// An identifier that must name an agent; resolved to `Type::Agent(id)`
    /// during analysis once all agent declarations are registered.
    Named(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeNode {
    pub expr: TypeExpr,
    pub span: Span,
    pub resolved: Option<Type>,
}

impl TypeNode {
    pub fn new(expr: TypeExpr, span: Span) -> Self {
        Self {
            expr,
            span,
            resolved: None,
        }
    }
}

// ---------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Range,
}

impl BinOp {
    /// Lower binds looser; used by the precedence-climbing parser, not by
    /// analysis or printing.
    pub fn precedence(self) -> u8 {
        use BinOp::*;
        match self {
            Or => 1,
            And => 2,
            Eq | Ne | Lt | Le | Gt | Ge => 3,
            Range => 4,
            Add | Sub => 5,
            Mul | Div | Mod => 6,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

// ---------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct VarUse {
    pub name: String,
    pub id: Option<VarId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Arg {
    pub expr: Box<ExprNode>,
    /// An `out` argument (a second expression receiving a value alongside
    /// the primary one), per spec §3's "expression plus optional out
    /// expression" call-argument shape.
    pub out_expr: Option<Box<ExprNode>>,
}

/// The overload a [`Expr::Call`] resolved to, recorded by analysis.
#[derive(Debug, Clone, Serialize)]
pub enum CalledSig {
    User(FuncId),
    Builtin(Signature),
}

#[derive(Debug, Clone, Serialize)]
pub struct Call {
    pub name: String,
    pub args: Vec<Arg>,
    pub resolved: Option<CalledSig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentCreation {
    pub agent_name: String,
    pub agent_id: Option<AgentId>,
    pub members: IndexMap<String, ExprNode>,
}

#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    StringLit(String),
    Var(VarUse),
    Unary(UnaryOp, Box<ExprNode>),
    Binary(BinOp, Box<ExprNode>, Box<ExprNode>),
    Assign(Box<ExprNode>, Box<ExprNode>),
    AssignOp(BinOp, Box<ExprNode>, Box<ExprNode>),
    Call(Call),
    Member(Box<ExprNode>, String),
    Index(Box<ExprNode>, Box<ExprNode>),
    Ternary(Box<ExprNode>, Box<ExprNode>, Box<ExprNode>),
    AgentCreation(AgentCreation),
    ArrayInit(Vec<ExprNode>),
    NewArray(TypeNode, Box<ExprNode>),
}

#[derive(Debug, Clone, Serialize)]
pub struct ExprNode {
    pub kind: Expr,
    pub span: Span,
    pub ty: Option<Type>,
}

impl ExprNode {
    pub fn new(kind: Expr, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
        }
    }

    pub fn ty(&self) -> &Type {
        self.ty.as_ref().expect("expression not yet analyzed")
    }

    /// Whether this expression names an assignable location: a variable, a
    /// member access, or an array index.
    pub fn is_assignable(&self) -> bool {
        matches!(self.kind, Expr::Var(_) | Expr::Member(..) | Expr::Index(..))
    }
}

// ---------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct VarDecl {
    pub name: String,
    pub var_id: Option<VarId>,
    pub type_spec: TypeNode,
    pub init: Option<ExprNode>,
}

#[derive(Debug, Clone, Serialize)]
pub enum ForKind {
    Range { from: ExprNode, to: ExprNode },
    Collection { collection: ExprNode },
    Near { agent: ExprNode, radius: ExprNode },
}

#[derive(Debug, Clone, Serialize)]
pub struct ForStmt {
    pub var_name: String,
    pub var_id: Option<VarId>,
    pub var_type: Option<Type>,
    pub kind: ForKind,
    pub body: Box<StmtNode>,
}

#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    Expr(ExprNode),
    Assign(ExprNode, ExprNode),
    AssignOp(BinOp, ExprNode, ExprNode),
    Block(Vec<StmtNode>),
    VarDecl(VarDecl),
    If(ExprNode, Box<StmtNode>, Option<Box<StmtNode>>),
    While(ExprNode, Box<StmtNode>),
    For(ForStmt),
    Simulate(ExprNode),
    Return(Option<ExprNode>),
}

#[derive(Debug, Clone, Serialize)]
pub struct StmtNode {
    pub kind: Stmt,
    pub span: Span,
}

impl StmtNode {
    pub fn new(kind: Stmt, span: Span) -> Self {
        Self { kind, span }
    }
}

// ---------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub name: String,
    pub var_id: Option<VarId>,
    pub type_spec: TypeNode,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub ret_type: Option<TypeNode>,
    pub body: StmtNode,
    pub span: Span,
    /// Whether the source spelled this function with a leading `step`
    /// token. A human-readable hint only — analysis confirms `is_step`
    /// independently from the signature and body, per spec §4.4.
    pub has_step_keyword: bool,

    // Analysis-fill slots (spec §3's `isStep`/`stepAgent`/`accessedMembers`).
    pub is_step: bool,
    pub step_agent: Option<AgentId>,
    pub step_param_id: Option<VarId>,
    pub accessed_members: Vec<String>,
    pub radii: Vec<f64>,
}

impl FunctionDecl {
    pub fn new(
        name: String,
        params: Vec<Param>,
        ret_type: Option<TypeNode>,
        body: StmtNode,
        span: Span,
        has_step_keyword: bool,
    ) -> Self {
        Self {
            name,
            params,
            ret_type,
            body,
            span,
            has_step_keyword,
            is_step: false,
            step_agent: None,
            step_param_id: None,
            accessed_members: Vec::new(),
            radii: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentMember {
    pub name: String,
    pub type_spec: TypeNode,
    pub is_position: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentDecl {
    pub name: String,
    pub members: Vec<AgentMember>,
    pub span: Span,
}

impl AgentDecl {
    pub fn position_member(&self) -> Option<&AgentMember> {
        self.members.iter().find(|m| m.is_position)
    }

    pub fn member(&self, name: &str) -> Option<&AgentMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// A literal value produced by constant folding (spec §4.4's constant
/// folder). Distinct from [`Expr`] so folded consts don't carry dead span
/// bookkeeping once resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Vec2(f64, f64),
    Vec3(f64, f64, f64),
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstDecl {
    pub name: String,
    pub var_id: Option<VarId>,
    pub type_spec: TypeNode,
    pub init: ExprNode,
    pub folded: Option<Literal>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentDecl {
    pub bounds: Vec<(String, ExprNode)>,
    pub span: Span,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Script {
    pub consts: Vec<ConstDecl>,
    pub agents: Vec<AgentDecl>,
    pub functions: Vec<FunctionDecl>,
    pub environment: Option<EnvironmentDecl>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent_by_name(&self, name: &str) -> Option<AgentId> {
        self.agents.iter().position(|a| a.name == name)
    }

    pub fn function_by_name(&self, name: &str) -> Option<FuncId> {
        self.functions.iter().position(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_span() -> Span {
        Span::new(0, 0)
    }

    #[test]
    fn script_looks_up_agents_and_functions_by_name() {
        let mut script = Script::new();
        script.agents.push(AgentDecl {
            name: "Boid".into(),
            members: Vec::new(),
            span: dummy_span(),
        });
        assert_eq!(script.agent_by_name("Boid"), Some(0));
        assert_eq!(script.agent_by_name("Other"), None);
    }

    #[test]
    fn position_member_lookup() {
        let agent = AgentDecl {
            name: "Boid".into(),
            members: vec![
                AgentMember {
                    name: "p".into(),
                    type_spec: TypeNode::new(TypeExpr::Vec2, dummy_span()),
                    is_position: true,
                },
                AgentMember {
                    name: "v".into(),
                    type_spec: TypeNode::new(TypeExpr::Vec2, dummy_span()),
                    is_position: false,
                },
            ],
            span: dummy_span(),
        };
        assert_eq!(agent.position_member().unwrap().name, "p");
        assert!(agent.member("v").is_some());
        assert!(agent.member("missing").is_none());
    }

    #[test]
    fn is_assignable_matches_spec_assignable_kinds() {
        let var = ExprNode::new(Expr::Var(VarUse { name: "x".into(), id: None }), dummy_span());
        assert!(var.is_assignable());
        let lit = ExprNode::new(Expr::IntLit(1), dummy_span());
        assert!(!lit.is_assignable());
    }
}
