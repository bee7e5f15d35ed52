//! Closed expression language
//!
//! Variable values and `run async` bodies are not evaluated as arbitrary code.
//! A value expression is exactly one of:
//!
//! - a number (`3`, `-1.5`)
//! - a string (`"Ann"`, `'Ann'`)
//! - `true`, `false`, `null`
//! - a variable name, read from the current [`RuntimeState`]
//!
//! A `run async` body is a call to a registered function, `name` or
//! `name(expr, ...)`; see [`crate::hsx::functions`].

pub mod lexer;
pub mod parser;

pub use parser::{parse_call, parse_expression};

use crate::hsx::error::ExpressionError;
use crate::hsx::state::RuntimeState;
use crate::hsx::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
}

impl Expr {
    /// Evaluate against a runtime state. Reactive variables yield their current value.
    pub fn evaluate(&self, state: &RuntimeState) -> Result<Value, ExpressionError> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable(name) => state
                .value(name)
                .ok_or_else(|| ExpressionError::UnknownVariable(name.clone())),
        }
    }
}

/// A parsed `run async` body.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub function: String,
    pub arguments: Vec<Expr>,
}

impl Call {
    pub fn evaluate_arguments(&self, state: &RuntimeState) -> Result<Vec<Value>, ExpressionError> {
        self.arguments
            .iter()
            .map(|arg| arg.evaluate(state))
            .collect()
    }
}

/// Parse and evaluate a value expression in one step.
pub fn evaluate(source: &str, state: &RuntimeState) -> Result<Value, ExpressionError> {
    parse_expression(source)?.evaluate(state)
}
