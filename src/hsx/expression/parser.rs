//! Expression and call parsing
//!
//! Two entry points share the same atom parser:
//! - [`parse_expression`]: a single literal or variable reference (`set variable` values)
//! - [`parse_call`]: `name` or `name(arg, ...)` (`run async` bodies)

use chumsky::prelude::*;
use chumsky::Stream;
use std::ops::Range;

use super::lexer::{tokenize, Token};
use super::{Call, Expr};
use crate::hsx::error::ExpressionError;
use crate::hsx::value::Value;

/// Type alias for parser error
type ParserError = Simple<Token>;

fn atom() -> impl Parser<Token, Expr, Error = ParserError> + Clone {
    let number = select! { Token::Number(text) => text }.try_map(|text: String, span| {
        text.parse::<f64>()
            .map(|n| Expr::Literal(Value::Number(n)))
            .map_err(|e| Simple::custom(span, e.to_string()))
    });

    let other = select! {
        Token::True => Expr::Literal(Value::Bool(true)),
        Token::False => Expr::Literal(Value::Bool(false)),
        Token::Null => Expr::Literal(Value::Null),
        Token::Str(s) => Expr::Literal(Value::Str(s)),
        Token::Ident(name) => Expr::Variable(name),
    };

    number.or(other)
}

fn expression() -> impl Parser<Token, Expr, Error = ParserError> + Clone {
    atom().then_ignore(end())
}

fn call() -> impl Parser<Token, Call, Error = ParserError> + Clone {
    let function = select! { Token::Ident(name) => name };
    let arguments = atom()
        .separated_by(just(Token::Comma))
        .delimited_by(just(Token::OpenParen), just(Token::CloseParen));

    function
        .then(arguments.or_not())
        .then_ignore(end())
        .map(|(function, arguments)| Call {
            function,
            arguments: arguments.unwrap_or_default(),
        })
}

fn run<O>(
    source: &str,
    parser: impl Parser<Token, O, Error = ParserError>,
) -> Result<O, ExpressionError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let eoi: Range<usize> = source.len()..source.len();
    parser
        .parse(Stream::from_iter(eoi, tokens.into_iter()))
        .map_err(|errors| {
            let message = errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "invalid expression".to_string());
            ExpressionError::Syntax {
                source_text: source.to_string(),
                message,
            }
        })
}

/// Parse a value expression: a literal or a variable reference.
pub fn parse_expression(source: &str) -> Result<Expr, ExpressionError> {
    run(source, expression())
}

/// Parse a `run async` body into a function call.
pub fn parse_call(source: &str) -> Result<Call, ExpressionError> {
    run(source, call())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_literals() {
        assert_eq!(
            parse_expression("42").unwrap(),
            Expr::Literal(Value::Number(42.0))
        );
        assert_eq!(
            parse_expression("'hi'").unwrap(),
            Expr::Literal(Value::Str("hi".into()))
        );
        assert_eq!(
            parse_expression("false").unwrap(),
            Expr::Literal(Value::Bool(false))
        );
    }

    #[test]
    fn test_parses_variable_reference() {
        assert_eq!(
            parse_expression("user").unwrap(),
            Expr::Variable("user".into())
        );
    }

    #[test]
    fn test_rejects_trailing_tokens() {
        assert!(matches!(
            parse_expression("1 2"),
            Err(ExpressionError::Syntax { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_source() {
        assert_eq!(parse_expression("   "), Err(ExpressionError::Empty));
    }

    #[test]
    fn test_parses_bare_call() {
        let call = parse_call("refresh").unwrap();
        assert_eq!(call.function, "refresh");
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_parses_call_with_arguments() {
        let call = parse_call(r#"update("user", name)"#).unwrap();
        assert_eq!(call.function, "update");
        assert_eq!(
            call.arguments,
            vec![
                Expr::Literal(Value::Str("user".into())),
                Expr::Variable("name".into()),
            ]
        );
    }

    #[test]
    fn test_call_requires_closing_paren() {
        assert!(parse_call("sleep(10").is_err());
    }
}
