//! Top-level declaration grammar: `agent`, `const`, `environment`, plain
//! functions, and `step` functions (a function whose body is expected to
//! contain a `near(...)` call — confirmed and annotated during analysis,
//! not here).

use super::expressions::{expr, type_expr};
use super::primitives::{ident, ParserInput, Span};
use super::statements::stmt;
use crate::ast::{AgentDecl, AgentMember, ConstDecl, EnvironmentDecl, FunctionDecl, Param, TypeNode};
use crate::lexer::Token;
use chumsky::prelude::*;

pub enum TopLevel {
    Agent(AgentDecl),
    Const(ConstDecl),
    Environment(EnvironmentDecl),
    Function(FunctionDecl),
}

fn typed_param<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Param, extra::Err<Rich<'tokens, Token<'src>, Span>>> + Clone
{
    type_expr()
        .then(ident())
        .map_with(|(ty, name), e| Param {
            name: name.to_string(),
            var_id: None,
            type_spec: TypeNode::new(ty, e.span()),
        })
}

fn agent_decl<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, AgentDecl, extra::Err<Rich<'tokens, Token<'src>, Span>>> + Clone
{
    let member = just(Token::Position)
        .or_not()
        .then(type_expr())
        .then(ident())
        .then_ignore(just(Token::Semicolon))
        .map_with(|((position, ty), name), e| AgentMember {
            name: name.to_string(),
            type_spec: TypeNode::new(ty, e.span()),
            is_position: position.is_some(),
        });

    just(Token::Agent)
        .ignore_then(ident())
        .then(
            member
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map_with(|(name, members), e| AgentDecl {
            name: name.to_string(),
            members,
            span: e.span(),
        })
}

fn const_decl<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, ConstDecl, extra::Err<Rich<'tokens, Token<'src>, Span>>> + Clone
{
    just(Token::Const)
        .ignore_then(type_expr())
        .then(ident())
        .then_ignore(just(Token::Assign))
        .then(expr())
        .then_ignore(just(Token::Semicolon))
        .map_with(|((ty, name), init), e| {
            let span = e.span();
            ConstDecl {
                name: name.to_string(),
                var_id: None,
                type_spec: TypeNode::new(ty, span),
                init,
                folded: None,
                span,
            }
        })
}

fn environment_decl<'tokens, 'src: 'tokens>(
) -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    EnvironmentDecl,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let bound = ident()
        .then_ignore(just(Token::Assign))
        .then(expr())
        .then_ignore(just(Token::Semicolon))
        .map(|(name, value)| (name.to_string(), value));

    just(Token::Environment)
        .ignore_then(
            bound
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map_with(|bounds, e| EnvironmentDecl { bounds, span: e.span() })
}

fn function_decl<'tokens, 'src: 'tokens>(
) -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    FunctionDecl,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    // `step` is a source-level hint only (stored as `has_step_keyword`);
    // analysis determines `isStep` structurally, from the function's
    // first agent-typed parameter, per spec §4.4.
    just(Token::Step)
        .or_not()
        .map(|step| step.is_some())
        .then(type_expr())
        .then(ident())
        .then(
            typed_param()
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .then(stmt())
        .map_with(|((((has_step_keyword, ret_ty), name), params), body), e| {
            let span = e.span();
            let ret_type = if matches!(ret_ty, crate::ast::TypeExpr::Void) {
                None
            } else {
                Some(TypeNode::new(ret_ty, span))
            };
            FunctionDecl::new(name.to_string(), params, ret_type, body, span, has_step_keyword)
        })
}

pub fn top_level<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, TopLevel, extra::Err<Rich<'tokens, Token<'src>, Span>>> + Clone
{
    choice((
        agent_decl().map(TopLevel::Agent),
        const_decl().map(TopLevel::Const),
        environment_decl().map(TopLevel::Environment),
        function_decl().map(TopLevel::Function),
    ))
}
