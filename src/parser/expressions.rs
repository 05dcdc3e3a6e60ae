//! Expression and type-spec grammar.
//!
//! Built the way the teacher's expression parser is: a `recursive()` root
//! and a precedence-climbing chain of `foldl_with` stages from tightest to
//! loosest binding, each stage `.boxed()` to keep monomorphization (and
//! therefore compile time) from blowing up across the chain.

use super::primitives::{ident, ParserInput, Span};
use crate::ast::{AgentCreation, Arg, BinOp, Call, Expr, ExprNode, TypeExpr, UnaryOp};
use crate::lexer::Token;
use chumsky::prelude::*;
use indexmap::IndexMap;

/// A type as written in source: a scalar keyword or agent name, optionally
/// followed by any number of `[]` suffixes.
pub fn type_expr<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, TypeExpr, extra::Err<Rich<'tokens, Token<'src>, Span>>> + Clone
{
    let scalar = choice((
        just(Token::Void).to(TypeExpr::Void),
        just(Token::Bool).to(TypeExpr::Bool),
        just(Token::Int).to(TypeExpr::Int),
        just(Token::Float).to(TypeExpr::Float),
        just(Token::StringTy).to(TypeExpr::String),
        just(Token::Vec2).to(TypeExpr::Vec2),
        just(Token::Vec3).to(TypeExpr::Vec3),
        ident().map(|s| TypeExpr::Named(s.to_string())),
    ));

    scalar
        .then(
            just(Token::LBracket)
                .ignore_then(just(Token::RBracket))
                .repeated()
                .count(),
        )
        .map(|(base, suffixes)| {
            let mut ty = base;
            for _ in 0..suffixes {
                ty = TypeExpr::Array(Box::new(ty));
            }
            ty
        })
        .boxed()
}

/// The full expression grammar, built around a `recursive` root so calls,
/// array/agent literals, and parenthesized sub-expressions can refer back
/// to the top.
pub fn expr<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, ExprNode, extra::Err<Rich<'tokens, Token<'src>, Span>>> + Clone
{
    recursive(|expr| {
        let ty = type_expr();

        let arg = expr
            .clone()
            .then(
                just(Token::Colon)
                    .ignore_then(expr.clone())
                    .or_not(),
            )
            .map(|(e, out)| Arg {
                expr: Box::new(e),
                out_expr: out.map(Box::new),
            });
        let args = arg
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>();

        let member_init = ident()
            .then_ignore(just(Token::Assign))
            .then(expr.clone())
            .map(|(name, value)| (name.to_string(), value));
        let member_inits = member_init
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<(String, ExprNode)>>()
            .map(|pairs| pairs.into_iter().collect::<IndexMap<_, _>>());

        let array_init = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map_with(|items, e| ExprNode::new(Expr::ArrayInit(items), e.span()));

        let new_agent = just(Token::New)
            .ignore_then(ident())
            .then(
                member_inits
                    .clone()
                    .delimited_by(just(Token::LBrace), just(Token::RBrace)),
            )
            .map_with(|(name, members), e| {
                ExprNode::new(
                    Expr::AgentCreation(AgentCreation {
                        agent_name: name.to_string(),
                        agent_id: None,
                        members,
                    }),
                    e.span(),
                )
            });

        let new_array = just(Token::New)
            .ignore_then(ty.clone())
            .then_ignore(just(Token::LBracket))
            .then(expr.clone())
            .then_ignore(just(Token::RBracket))
            .map_with(|(elem_ty, size), e| {
                let span = e.span();
                ExprNode::new(Expr::NewArray(crate::ast::TypeNode::new(elem_ty, span), Box::new(size)), span)
            });

        let call = ident()
            .then(
                args.delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map_with(|(name, args), e| {
                ExprNode::new(
                    Expr::Call(Call {
                        name: name.to_string(),
                        args,
                        resolved: None,
                    }),
                    e.span(),
                )
            });

        // `vec2(x, y)` / `vec3(x, y, z)`: the component-wise constructors.
        // `vec2`/`vec3` lex as dedicated type keywords rather than
        // identifiers, so they need their own call-shaped rule alongside
        // `call` rather than falling out of it.
        let vec_ctor = choice((
            just(Token::Vec2).to("vec2"),
            just(Token::Vec3).to("vec3"),
        ))
        .then(args.clone().delimited_by(just(Token::LParen), just(Token::RParen)))
        .map_with(|(name, args), e| {
            ExprNode::new(
                Expr::Call(Call {
                    name: name.to_string(),
                    args,
                    resolved: None,
                }),
                e.span(),
            )
        });

        let var = ident().map_with(|name, e| {
            ExprNode::new(
                Expr::Var(crate::ast::VarUse {
                    name: name.to_string(),
                    id: None,
                }),
                e.span(),
            )
        });

        let int_lit = select! { Token::IntLit(n) => n }
            .map_with(|n, e| ExprNode::new(Expr::IntLit(n), e.span()));
        let float_lit = select! { Token::FloatLit(n) => n }
            .map_with(|n, e| ExprNode::new(Expr::FloatLit(n), e.span()));
        let bool_lit = choice((
            just(Token::True).to(true),
            just(Token::False).to(false),
        ))
        .map_with(|b, e| ExprNode::new(Expr::BoolLit(b), e.span()));
        let string_lit = select! { Token::StringLit(s) => s }
            .map_with(|s, e| ExprNode::new(Expr::StringLit(s.to_string()), e.span()));

        let parenthesized = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let atom = choice((
            new_agent,
            new_array,
            vec_ctor,
            float_lit,
            int_lit,
            bool_lit,
            string_lit,
            array_init,
            call,
            var,
            parenthesized,
        ))
        .boxed();

        // Postfix: member access and indexing bind tightest.
        enum Postfix {
            Member(String),
            Index(ExprNode),
        }
        let postfix_op = choice((
            just(Token::Dot)
                .ignore_then(ident())
                .map(|s| Postfix::Member(s.to_string())),
            expr.clone()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map(Postfix::Index),
        ));
        let postfix = atom
            .foldl_with(postfix_op.repeated(), |base, op, e| match op {
                Postfix::Member(name) => ExprNode::new(Expr::Member(Box::new(base), name), e.span()),
                Postfix::Index(idx) => ExprNode::new(Expr::Index(Box::new(base), Box::new(idx)), e.span()),
            })
            .boxed();

        // Unary: `-x`, `!x`.
        let unary = choice((
            just(Token::Minus).to(UnaryOp::Neg),
            just(Token::Not).to(UnaryOp::Not),
        ))
        .repeated()
        .foldr_with(postfix, |op, operand, e| {
            ExprNode::new(Expr::Unary(op, Box::new(operand)), e.span())
        })
        .boxed();

        macro_rules! binary_level {
            ($prev:expr, $op:expr) => {
                $prev
                    .clone()
                    .foldl_with($op.then($prev).repeated(), |lhs, (op, rhs), e| {
                        ExprNode::new(Expr::Binary(op, Box::new(lhs), Box::new(rhs)), e.span())
                    })
                    .boxed()
            };
        }

        let mul_op = choice((
            just(Token::Star).to(BinOp::Mul),
            just(Token::Slash).to(BinOp::Div),
            just(Token::Percent).to(BinOp::Mod),
        ));
        let mul = binary_level!(unary, mul_op);

        let add_op = choice((
            just(Token::Plus).to(BinOp::Add),
            just(Token::Minus).to(BinOp::Sub),
        ));
        let add = binary_level!(mul, add_op);

        let range = add
            .clone()
            .then(just(Token::DotDot).ignore_then(add).or_not())
            .map_with(|(lo, hi), e| match hi {
                Some(hi) => ExprNode::new(Expr::Binary(BinOp::Range, Box::new(lo), Box::new(hi)), e.span()),
                None => lo,
            })
            .boxed();

        let cmp_op = choice((
            just(Token::Eq).to(BinOp::Eq),
            just(Token::Ne).to(BinOp::Ne),
            just(Token::Le).to(BinOp::Le),
            just(Token::Ge).to(BinOp::Ge),
            just(Token::Lt).to(BinOp::Lt),
            just(Token::Gt).to(BinOp::Gt),
        ));
        let cmp = binary_level!(range, cmp_op);

        let and_op = just(Token::AndAnd).to(BinOp::And);
        let and = binary_level!(cmp, and_op);

        let or_op = just(Token::OrOr).to(BinOp::Or);
        let or = binary_level!(and, or_op);

        let ternary = or
            .clone()
            .then(
                just(Token::Question)
                    .ignore_then(expr.clone())
                    .then_ignore(just(Token::Colon))
                    .then(expr.clone())
                    .or_not(),
            )
            .map_with(|(cond, rest), e| match rest {
                Some((then_branch, else_branch)) => ExprNode::new(
                    Expr::Ternary(Box::new(cond), Box::new(then_branch), Box::new(else_branch)),
                    e.span(),
                ),
                None => cond,
            })
            .boxed();

        // Assignment is right-associative and binds loosest; only valid
        // when the LHS is assignable, which analysis checks, not the parser.
        let assign_op = choice((
            just(Token::Assign).to(None),
            just(Token::PlusEq).to(Some(BinOp::Add)),
            just(Token::MinusEq).to(Some(BinOp::Sub)),
            just(Token::StarEq).to(Some(BinOp::Mul)),
            just(Token::SlashEq).to(Some(BinOp::Div)),
        ));

        ternary
            .clone()
            .then(assign_op.then(expr.clone()).or_not())
            .map_with(|(lhs, rest), e| match rest {
                Some((None, rhs)) => ExprNode::new(Expr::Assign(Box::new(lhs), Box::new(rhs)), e.span()),
                Some((Some(op), rhs)) => {
                    ExprNode::new(Expr::AssignOp(op, Box::new(lhs), Box::new(rhs)), e.span())
                }
                None => lhs,
            })
            .boxed()
    })
}
