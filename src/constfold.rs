//! Constant folding for const initializers, `near()` radii, and CLI
//! parameter overrides (spec §4.4's "Constant folder").
//!
//! Handles literals, integer/float arithmetic, vector constructors, unary
//! negation, and reads of already-folded consts. Anything else signals
//! failure rather than partially folding — callers turn that into
//! `NonConstInitializer`.

use crate::ast::{BinOp, Expr, ExprNode, Literal, UnaryOp};
use std::collections::HashMap;

/// Folds `expr` to a literal. `consts` supplies the already-folded values of
/// previously declared `const`s, so later consts can reference earlier ones.
pub fn fold(expr: &ExprNode, consts: &HashMap<String, Literal>) -> Option<Literal> {
    match &expr.kind {
        Expr::IntLit(n) => Some(Literal::Int(*n)),
        Expr::FloatLit(n) => Some(Literal::Float(*n)),
        Expr::BoolLit(b) => Some(Literal::Bool(*b)),
        Expr::StringLit(s) => Some(Literal::String(s.clone())),

        Expr::Var(var_use) => consts.get(&var_use.name).cloned(),

        Expr::Unary(UnaryOp::Neg, inner) => match fold(inner, consts)? {
            Literal::Int(n) => Some(Literal::Int(-n)),
            Literal::Float(n) => Some(Literal::Float(-n)),
            Literal::Vec2(x, y) => Some(Literal::Vec2(-x, -y)),
            Literal::Vec3(x, y, z) => Some(Literal::Vec3(-x, -y, -z)),
            _ => None,
        },
        Expr::Unary(UnaryOp::Not, inner) => match fold(inner, consts)? {
            Literal::Bool(b) => Some(Literal::Bool(!b)),
            _ => None,
        },

        Expr::Binary(op, lhs, rhs) => fold_binary(*op, fold(lhs, consts)?, fold(rhs, consts)?),

        // `vec2(x, y)` / `vec3(x, y, z)` constructors are calls, folded here
        // from their (already-foldable) argument literals.
        Expr::Call(call) if call.name == "vec2" && call.args.len() == 2 => {
            let x = as_f64(fold(&call.args[0].expr, consts)?)?;
            let y = as_f64(fold(&call.args[1].expr, consts)?)?;
            Some(Literal::Vec2(x, y))
        }
        Expr::Call(call) if call.name == "vec3" && call.args.len() == 3 => {
            let x = as_f64(fold(&call.args[0].expr, consts)?)?;
            let y = as_f64(fold(&call.args[1].expr, consts)?)?;
            let z = as_f64(fold(&call.args[2].expr, consts)?)?;
            Some(Literal::Vec3(x, y, z))
        }

        _ => None,
    }
}

fn as_f64(lit: Literal) -> Option<f64> {
    match lit {
        Literal::Int(n) => Some(n as f64),
        Literal::Float(n) => Some(n),
        _ => None,
    }
}

fn fold_binary(op: BinOp, lhs: Literal, rhs: Literal) -> Option<Literal> {
    use Literal::*;
    match (op, lhs, rhs) {
        (BinOp::Add, Int(a), Int(b)) => Some(Int(a + b)),
        (BinOp::Sub, Int(a), Int(b)) => Some(Int(a - b)),
        (BinOp::Mul, Int(a), Int(b)) => Some(Int(a * b)),
        (BinOp::Div, Int(a), Int(b)) if b != 0 => Some(Int(a / b)),
        (BinOp::Mod, Int(a), Int(b)) if b != 0 => Some(Int(a % b)),

        (BinOp::Add, Float(a), Float(b)) => Some(Float(a + b)),
        (BinOp::Sub, Float(a), Float(b)) => Some(Float(a - b)),
        (BinOp::Mul, Float(a), Float(b)) => Some(Float(a * b)),
        (BinOp::Div, Float(a), Float(b)) => Some(Float(a / b)),

        (BinOp::Add, Vec2(ax, ay), Vec2(bx, by)) => Some(Vec2(ax + bx, ay + by)),
        (BinOp::Sub, Vec2(ax, ay), Vec2(bx, by)) => Some(Vec2(ax - bx, ay - by)),
        (BinOp::Mul, Vec2(x, y), Float(s)) | (BinOp::Mul, Float(s), Vec2(x, y)) => {
            Some(Vec2(x * s, y * s))
        }
        (BinOp::Div, Vec2(x, y), Float(s)) => Some(Vec2(x / s, y / s)),

        (BinOp::Add, Vec3(ax, ay, az), Vec3(bx, by, bz)) => {
            Some(Vec3(ax + bx, ay + by, az + bz))
        }
        (BinOp::Sub, Vec3(ax, ay, az), Vec3(bx, by, bz)) => {
            Some(Vec3(ax - bx, ay - by, az - bz))
        }
        (BinOp::Mul, Vec3(x, y, z), Float(s)) | (BinOp::Mul, Float(s), Vec3(x, y, z)) => {
            Some(Vec3(x * s, y * s, z * s))
        }
        (BinOp::Div, Vec3(x, y, z), Float(s)) => Some(Vec3(x / s, y / s, z / s)),

        _ => None,
    }
}

/// Re-folds a literal that is already folded. Should be the identity,
/// exercising the "constant folding idempotence" testable property from
/// spec §8.
pub fn refold_literal(lit: &Literal) -> ExprNode {
    use chumsky::span::SimpleSpan;
    let dummy = SimpleSpan::new(0, 0);
    let kind = match lit {
        Literal::Int(n) => Expr::IntLit(*n),
        Literal::Float(n) => Expr::FloatLit(*n),
        Literal::Bool(b) => Expr::BoolLit(*b),
        Literal::String(s) => Expr::StringLit(s.clone()),
        Literal::Vec2(x, y) => Expr::Call(crate::ast::Call {
            name: "vec2".into(),
            args: vec![
                arg(Expr::FloatLit(*x), dummy),
                arg(Expr::FloatLit(*y), dummy),
            ],
            resolved: None,
        }),
        Literal::Vec3(x, y, z) => Expr::Call(crate::ast::Call {
            name: "vec3".into(),
            args: vec![
                arg(Expr::FloatLit(*x), dummy),
                arg(Expr::FloatLit(*y), dummy),
                arg(Expr::FloatLit(*z), dummy),
            ],
            resolved: None,
        }),
    };
    ExprNode::new(kind, dummy)
}

fn arg(kind: Expr, span: chumsky::span::SimpleSpan<usize>) -> crate::ast::Arg {
    crate::ast::Arg {
        expr: Box::new(ExprNode::new(kind, span)),
        out_expr: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chumsky::span::SimpleSpan;

    fn dummy() -> SimpleSpan<usize> {
        SimpleSpan::new(0, 0)
    }

    #[test]
    fn folds_integer_arithmetic() {
        let lhs = ExprNode::new(Expr::IntLit(3), dummy());
        let rhs = ExprNode::new(Expr::IntLit(4), dummy());
        let add = ExprNode::new(
            Expr::Binary(BinOp::Add, Box::new(lhs), Box::new(rhs)),
            dummy(),
        );
        assert_eq!(fold(&add, &HashMap::new()), Some(Literal::Int(7)));
    }

    #[test]
    fn folds_unary_negation() {
        let inner = ExprNode::new(Expr::FloatLit(2.5), dummy());
        let neg = ExprNode::new(Expr::Unary(UnaryOp::Neg, Box::new(inner)), dummy());
        assert_eq!(fold(&neg, &HashMap::new()), Some(Literal::Float(-2.5)));
    }

    #[test]
    fn folds_vec2_constructor() {
        let call = ExprNode::new(
            Expr::Call(crate::ast::Call {
                name: "vec2".into(),
                args: vec![
                    arg(Expr::FloatLit(1.0), dummy()),
                    arg(Expr::FloatLit(2.0), dummy()),
                ],
                resolved: None,
            }),
            dummy(),
        );
        assert_eq!(fold(&call, &HashMap::new()), Some(Literal::Vec2(1.0, 2.0)));
    }

    #[test]
    fn resolves_previously_folded_const() {
        let mut consts = HashMap::new();
        consts.insert("N".to_string(), Literal::Int(10));
        let var = ExprNode::new(
            Expr::Var(crate::ast::VarUse {
                name: "N".into(),
                id: None,
            }),
            dummy(),
        );
        assert_eq!(fold(&var, &consts), Some(Literal::Int(10)));
    }

    #[test]
    fn non_foldable_expression_fails() {
        let call = ExprNode::new(
            Expr::Call(crate::ast::Call {
                name: "random".into(),
                args: vec![],
                resolved: None,
            }),
            dummy(),
        );
        assert_eq!(fold(&call, &HashMap::new()), None);
    }

    #[test]
    fn folding_idempotent_on_refolded_literal() {
        let lit = Literal::Vec2(1.0, 2.0);
        let refolded_expr = refold_literal(&lit);
        assert_eq!(fold(&refolded_expr, &HashMap::new()), Some(lit));
    }
}
