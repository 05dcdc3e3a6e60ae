//! Lexer for OpenABL source code.
//!
//! Tokenizes a curly-brace, C-like agent simulation language: keywords
//! (`agent`, `step`, `environment`, `const`, `near`, …), operators, literals,
//! and punctuation. Unlike AgentScript, OpenABL is not indentation
//! sensitive — braces delimit blocks — so there is no INDENT/DEDENT
//! post-processing pass here.

use chumsky::prelude::*;

pub type Span = SimpleSpan<usize>;
pub type Spanned<T> = (T, Span);

#[derive(Clone, Debug, PartialEq)]
pub enum Token<'src> {
    // Keywords
    Agent,
    Environment,
    Const,
    Step,
    Simulate,
    Position,
    If,
    Else,
    While,
    For,
    In,
    Return,
    New,
    Out,

    // Type keywords
    Void,
    Bool,
    Int,
    Float,
    StringTy,
    Vec2,
    Vec3,

    // Literals
    True,
    False,
    IntLit(i64),
    FloatLit(f64),
    StringLit(&'src str),

    // Identifier
    Ident(&'src str),

    // Operators
    Eq,    // ==
    Ne,    // !=
    Le,    // <=
    Ge,    // >=
    Lt,    // <
    Gt,    // >
    AndAnd, // &&
    OrOr,   // ||
    Not,    // !
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,     // =
    PlusEq,     // +=
    MinusEq,    // -=
    StarEq,     // *=
    SlashEq,    // /=
    DotDot,     // ..
    Question,
    Colon,

    // Punctuation
    Dot,
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;
        match self {
            Agent => write!(f, "agent"),
            Environment => write!(f, "environment"),
            Const => write!(f, "const"),
            Step => write!(f, "step"),
            Simulate => write!(f, "simulate"),
            Position => write!(f, "position"),
            If => write!(f, "if"),
            Else => write!(f, "else"),
            While => write!(f, "while"),
            For => write!(f, "for"),
            In => write!(f, "in"),
            Return => write!(f, "return"),
            New => write!(f, "new"),
            Out => write!(f, "out"),
            Void => write!(f, "void"),
            Bool => write!(f, "bool"),
            Int => write!(f, "int"),
            Float => write!(f, "float"),
            StringTy => write!(f, "string"),
            Vec2 => write!(f, "vec2"),
            Vec3 => write!(f, "vec3"),
            True => write!(f, "true"),
            False => write!(f, "false"),
            IntLit(n) => write!(f, "{}", n),
            FloatLit(n) => write!(f, "{}", n),
            StringLit(s) => write!(f, "\"{}\"", s),
            Ident(s) => write!(f, "{}", s),
            Eq => write!(f, "=="),
            Ne => write!(f, "!="),
            Le => write!(f, "<="),
            Ge => write!(f, ">="),
            Lt => write!(f, "<"),
            Gt => write!(f, ">"),
            AndAnd => write!(f, "&&"),
            OrOr => write!(f, "||"),
            Not => write!(f, "!"),
            Plus => write!(f, "+"),
            Minus => write!(f, "-"),
            Star => write!(f, "*"),
            Slash => write!(f, "/"),
            Percent => write!(f, "%"),
            Assign => write!(f, "="),
            PlusEq => write!(f, "+="),
            MinusEq => write!(f, "-="),
            StarEq => write!(f, "*="),
            SlashEq => write!(f, "/="),
            DotDot => write!(f, ".."),
            Question => write!(f, "?"),
            Colon => write!(f, ":"),
            Dot => write!(f, "."),
            Comma => write!(f, ","),
            Semicolon => write!(f, ";"),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            LBrace => write!(f, "{{"),
            RBrace => write!(f, "}}"),
            LBracket => write!(f, "["),
            RBracket => write!(f, "]"),
        }
    }
}

use std::fmt;

/// Build the lexer. Produces a vector of spanned tokens, or a `Rich` lex
/// error on the first invalid character sequence.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<Spanned<Token<'src>>>, extra::Err<Rich<'src, char, Span>>> {
    let ident = text::ident().map(|s: &str| match s {
        "agent" => Token::Agent,
        "environment" => Token::Environment,
        "const" => Token::Const,
        "step" => Token::Step,
        "simulate" => Token::Simulate,
        "position" => Token::Position,
        "if" => Token::If,
        "else" => Token::Else,
        "while" => Token::While,
        "for" => Token::For,
        "in" => Token::In,
        "return" => Token::Return,
        "new" => Token::New,
        "out" => Token::Out,
        "void" => Token::Void,
        "bool" => Token::Bool,
        "int" => Token::Int,
        "float" => Token::Float,
        "string" => Token::StringTy,
        "vec2" => Token::Vec2,
        "vec3" => Token::Vec3,
        "true" => Token::True,
        "false" => Token::False,
        other => Token::Ident(other),
    });

    let float_lit = text::int(10)
        .then(just('.').then(text::digits(10)))
        .to_slice()
        .map(|s: &str| Token::FloatLit(s.parse().unwrap()));

    let int_lit = text::int(10).map(|s: &str| Token::IntLit(s.parse().unwrap()));

    let string_lit = just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then_ignore(just('"'))
        .map(Token::StringLit);

    let multi_char_ops = choice((
        just("==").to(Token::Eq),
        just("!=").to(Token::Ne),
        just("<=").to(Token::Le),
        just(">=").to(Token::Ge),
        just("&&").to(Token::AndAnd),
        just("||").to(Token::OrOr),
        just("+=").to(Token::PlusEq),
        just("-=").to(Token::MinusEq),
        just("*=").to(Token::StarEq),
        just("/=").to(Token::SlashEq),
        just("..").to(Token::DotDot),
    ));

    let single_char_ops = choice((
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('!').to(Token::Not),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
        just('=').to(Token::Assign),
        just('?').to(Token::Question),
        just(':').to(Token::Colon),
        just('.').to(Token::Dot),
        just(',').to(Token::Comma),
        just(';').to(Token::Semicolon),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
    ));

    let line_comment = just("//").then(none_of('\n').repeated()).ignored();
    let block_comment = just("/*")
        .then(any().and_is(just("*/").not()).repeated())
        .then(just("*/"))
        .ignored();
    let comment = line_comment.or(block_comment);

    let token = choice((
        float_lit,
        int_lit,
        string_lit,
        multi_char_ops,
        single_char_ops,
        ident,
    ))
    .map_with(|tok, e| (tok, e.span()));

    token
        .padded_by(comment.padded().repeated())
        .padded()
        .repeated()
        .collect()
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Token<'_>> {
        lexer()
            .parse(src)
            .into_result()
            .unwrap()
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            toks("agent Boid { position vec2 p; }"),
            vec![
                Token::Agent,
                Token::Ident("Boid"),
                Token::LBrace,
                Token::Position,
                Token::Vec2,
                Token::Ident("p"),
                Token::Semicolon,
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(toks("1.5 42"), vec![Token::FloatLit(1.5), Token::IntLit(42)]);
    }

    #[test]
    fn operators() {
        assert_eq!(
            toks("a += 1 .. 2 == 3 != 4"),
            vec![
                Token::Ident("a"),
                Token::PlusEq,
                Token::IntLit(1),
                Token::DotDot,
                Token::IntLit(2),
                Token::Eq,
                Token::IntLit(3),
                Token::Ne,
                Token::IntLit(4),
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            toks("// hello\nagent /* block */ Boid"),
            vec![Token::Agent, Token::Ident("Boid")]
        );
    }

    #[test]
    fn string_literal() {
        assert_eq!(toks(r#""hello world""#), vec![Token::StringLit("hello world")]);
    }
}
