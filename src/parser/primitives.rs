//! Primitive token parsers shared by the expression, statement, and
//! declaration grammars.

use crate::lexer::Token;
use chumsky::input::MappedInput;
use chumsky::prelude::*;

pub type Span = SimpleSpan<usize>;
pub type SpannedToken<'src> = (Token<'src>, Span);
pub type ParserInput<'tokens, 'src> =
    MappedInput<'tokens, Token<'src>, Span, &'tokens [SpannedToken<'src>]>;

pub fn ident<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    &'src str,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    select! { Token::Ident(s) => s }
}
