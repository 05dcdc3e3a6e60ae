//! Statement grammar: blocks, declarations, control flow, and the three
//! `for` forms (range / collection / neighborhood).

use super::expressions::{expr, type_expr};
use super::primitives::{ident, ParserInput, Span};
use crate::ast::{Expr, ExprNode, ForKind, ForStmt, Stmt, StmtNode, VarDecl};
use crate::lexer::Token;
use chumsky::prelude::*;

/// Promotes a bare expression statement into `Stmt::Assign`/`Stmt::AssignOp`
/// when its top-level shape is an assignment, matching spec §3's separate
/// listing of `assign`/`assign-op` among both expression *and* statement
/// kinds: the AST keeps `Expr::Assign`/`Expr::AssignOp` for use in nested
/// position (e.g. inside a call argument), while the statement level always
/// surfaces the dedicated `Stmt` variant when an expression statement's
/// outermost node is one of those two.
fn expr_to_stmt(e: ExprNode) -> Stmt {
    match e.kind {
        Expr::Assign(lhs, rhs) => Stmt::Assign(*lhs, *rhs),
        Expr::AssignOp(op, lhs, rhs) => Stmt::AssignOp(op, *lhs, *rhs),
        _ => Stmt::Expr(e),
    }
}

pub fn stmt<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, StmtNode, extra::Err<Rich<'tokens, Token<'src>, Span>>> + Clone
{
    recursive(|stmt| {
        let block = stmt
            .clone()
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map_with(|stmts, e| StmtNode::new(Stmt::Block(stmts), e.span()));

        let var_decl = type_expr()
            .then(ident())
            .then(just(Token::Assign).ignore_then(expr()).or_not())
            .then_ignore(just(Token::Semicolon))
            .map_with(|((ty, name), init), e| {
                let span = e.span();
                StmtNode::new(
                    Stmt::VarDecl(VarDecl {
                        name: name.to_string(),
                        var_id: None,
                        type_spec: crate::ast::TypeNode::new(ty, span),
                        init,
                    }),
                    span,
                )
            });

        let if_stmt = just(Token::If)
            .ignore_then(expr().delimited_by(just(Token::LParen), just(Token::RParen)))
            .then(block.clone())
            .then(just(Token::Else).ignore_then(block.clone()).or_not())
            .map_with(|((cond, then_branch), else_branch), e| {
                StmtNode::new(
                    Stmt::If(cond, Box::new(then_branch), else_branch.map(Box::new)),
                    e.span(),
                )
            });

        let while_stmt = just(Token::While)
            .ignore_then(expr().delimited_by(just(Token::LParen), just(Token::RParen)))
            .then(block.clone())
            .map_with(|(cond, body), e| StmtNode::new(Stmt::While(cond, Box::new(body)), e.span()));

        // `for (T v in <range|collection|near(...)>) { ... }`
        let for_stmt = just(Token::For)
            .ignore_then(just(Token::LParen))
            .ignore_then(type_expr().or_not())
            .then(ident())
            .then_ignore(just(Token::In))
            .then(expr())
            .then_ignore(just(Token::RParen))
            .then(block.clone())
            .map_with(|(((_ty, var_name), source), body), e| {
                let kind = classify_for_source(source);
                StmtNode::new(
                    Stmt::For(ForStmt {
                        var_name: var_name.to_string(),
                        var_id: None,
                        var_type: None,
                        kind,
                        body: Box::new(body),
                    }),
                    e.span(),
                )
            });

        let simulate_stmt = just(Token::Simulate)
            .ignore_then(expr())
            .then_ignore(just(Token::Semicolon))
            .map_with(|e_, e| StmtNode::new(Stmt::Simulate(e_), e.span()));

        let return_stmt = just(Token::Return)
            .ignore_then(expr().or_not())
            .then_ignore(just(Token::Semicolon))
            .map_with(|value, e| StmtNode::new(Stmt::Return(value), e.span()));

        let expr_stmt = expr()
            .then_ignore(just(Token::Semicolon))
            .map_with(|e_, e| StmtNode::new(expr_to_stmt(e_), e.span()));

        choice((
            block,
            if_stmt,
            while_stmt,
            for_stmt,
            simulate_stmt,
            return_stmt,
            var_decl,
            expr_stmt,
        ))
        .boxed()
    })
}

/// A `for`'s source expression determines which of the three forms (spec
/// §4.4) it is; the parser records the raw shape and leaves agent/type
/// checking itself to analysis.
fn classify_for_source(source: ExprNode) -> ForKind {
    if let Expr::Binary(crate::ast::BinOp::Range, ref from, ref to) = source.kind {
        return ForKind::Range {
            from: (**from).clone(),
            to: (**to).clone(),
        };
    }
    if let Expr::Call(ref call) = source.kind {
        if call.name == "near" && call.args.len() == 2 {
            return ForKind::Near {
                agent: (*call.args[0].expr).clone(),
                radius: (*call.args[1].expr).clone(),
            };
        }
    }
    ForKind::Collection { collection: source }
}
