use chumsky::prelude::*;
use std::rc::Rc;

use crate::diagnostic::{Diagnostic, LineIndex, Span};
use crate::token::{Literal, Token, TokenKind};

type LexExtra<'a> = extra::Err<Rich<'a, char>>;

/// Output of a scan: the token stream (always `Eof`-terminated) plus any
/// lexical errors. Tokens around a bad character are still produced.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<Diagnostic>,
}

impl ScanResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<((TokenKind, Option<Literal>), SimpleSpan)>, LexExtra<'a>> {
    let number = text::digits(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .try_map(|s: &str, span| {
            s.parse::<f64>()
                .map(|n| (TokenKind::Number, Some(Literal::Number(n))))
                .map_err(|e| Rich::custom(span, e))
        });

    let string = just('"')
        .ignore_then(none_of("\"").repeated().to_slice())
        .then_ignore(just('"'))
        .map(|s: &str| (TokenKind::String, Some(Literal::String(Rc::from(s)))));

    let ident = text::ident().map(|s: &str| (TokenKind::keyword(s).unwrap_or(TokenKind::Identifier), None));

    let op_double = choice((
        just("!=").to(TokenKind::BangEqual),
        just("==").to(TokenKind::EqualEqual),
        just("<=").to(TokenKind::LessEqual),
        just(">=").to(TokenKind::GreaterEqual),
    ));

    let op_single = choice((
        just('(').to(TokenKind::LeftParen),
        just(')').to(TokenKind::RightParen),
        just('{').to(TokenKind::LeftBrace),
        just('}').to(TokenKind::RightBrace),
        just(',').to(TokenKind::Comma),
        just('.').to(TokenKind::Dot),
        just('-').to(TokenKind::Minus),
        just('+').to(TokenKind::Plus),
        just(';').to(TokenKind::Semicolon),
        just('/').to(TokenKind::Slash),
        just('*').to(TokenKind::Star),
        just('?').to(TokenKind::Question),
        just(':').to(TokenKind::Colon),
        just('!').to(TokenKind::Bang),
        just('=').to(TokenKind::Equal),
        just('>').to(TokenKind::Greater),
        just('<').to(TokenKind::Less),
    ));

    let op = op_double.or(op_single).map(|kind| (kind, None));

    let line_comment = just("//")
        .then(any().and_is(just('\n').not()).repeated())
        .ignored();

    // Block comments nest: every `/*` needs its own `*/`.
    let block_comment = recursive(|block| {
        just("/*")
            .then(choice((block, any().and_is(just("*/").not()).ignored())).repeated())
            .then(just("*/"))
            .ignored()
    });

    let whitespace = any().filter(|c: &char| c.is_whitespace()).ignored();
    let trivia = choice((whitespace, line_comment, block_comment)).repeated();

    let token = number
        .or(string)
        .or(ident)
        .or(op)
        .map_with(|tok, e| (tok, e.span()))
        .then_ignore(trivia.clone())
        .recover_with(skip_then_retry_until(any().ignored(), end()));

    trivia
        .ignore_then(token.repeated().collect())
        .then_ignore(end())
}

/// Scan `source` into tokens, attaching the lexeme and 1-based line to each.
pub fn scan(source: &str) -> ScanResult {
    let index = LineIndex::new(source);
    let (output, errors) = lexer().parse(source).into_output_errors();

    let mut tokens: Vec<Token> = output
        .unwrap_or_default()
        .into_iter()
        .map(|((kind, literal), span)| {
            let span = Span::new(span.start, span.end);
            let lexeme = &source[span.start..span.end];
            // Multi-line strings take the line of their closing quote.
            let line = match kind {
                TokenKind::String => index.line_of(span.end.saturating_sub(1)),
                _ => index.line_of(span.start),
            };
            Token::new(kind, lexeme, literal, line, span)
        })
        .collect();
    tokens.push(Token::eof(index.line_count(), source.len()));

    let errors = errors
        .into_iter()
        .map(|error| {
            let span = Span::new(error.span().start, error.span().end);
            let message = match error.found() {
                Some(c) => format!("Unexpected character '{}'.", c),
                None => "Unterminated string or block comment.".to_string(),
            };
            Diagnostic::syntax(message, index.line_of(span.start)).with_span(span)
        })
        .collect();

    ScanResult { tokens, errors }
}
