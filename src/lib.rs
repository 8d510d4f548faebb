//! MapXP - Vectorized call evaluation over typed sequences
//!
//! This crate applies a callable once per index of one or two input sequences and
//! collects the results into a homogeneously typed output sequence. Every result is
//! checked against a declared element kind: it must be a length 1 sequence of exactly
//! that kind, with no coercion. The opaque `list` kind accepts anything.
//!
//! ```scheme
//! ;; with x = (c 10 20 30) and double = (lambda (v) (* v 2))
//! map x double "integer"          ; => (c 20 40 60)
//! ;; with x = (c 1 2 3) and y = 100
//! map_pair x y + "integer"        ; => (c 101 102 103)
//! ```
//!
//! ## Evaluation Model
//!
//! The engine never copies its inputs into the call it evaluates. It builds a call
//! of the form `(f x[[i]] ...)` where `x` and `f` are referenced by name and `i` is a
//! loop-owned index cell. Only the cell changes between iterations. The trailing
//! `...` forwards whatever extra arguments the calling frame holds.
//!
//! ## Strict Typing
//!
//! - No implicit coercion between logical, integer, double and character results
//! - A result of length other than 1 aborts the whole call with the failing index
//! - Two inputs must have equal lengths, or one of them must have length 1
//!
//! ## Modules
//!
//! - `map`: the engine (`map`, `map_pair`, call builder, index loop, recycling)
//! - `context`: the evaluation context interface the engine consumes
//! - `ast`: values, typed vectors and element kinds
//! - `evaluator`: reference host environment and evaluator
//! - `builtinops`: builtin operations of the reference host
//! - `scheme`: S-expression parsing from text

use thiserror::Error;

use crate::ast::Kind;

/// Maximum parsing depth to prevent stack overflow attacks
pub const MAX_PARSE_DEPTH: usize = 32;

/// Maximum evaluation depth to prevent stack overflow in recursive evaluation
/// Set higher than parse depth to allow for nested function applications
pub const MAX_EVAL_DEPTH: usize = 64;

/// Error types for the engine and the reference host
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("ParseError: {0}")]
    ParseError(String),

    #[error("EvaluationError: {0}")]
    EvalError(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Unbound variable: {0}")]
    UnboundVariable(String),

    #[error("{}", arity_message(*expected, *got, expression.as_deref()))]
    ArityError {
        expected: usize,
        got: usize,
        expression: Option<String>, // Optional expression context
    },

    /// An input name resolved to something that is not a sequence
    #[error("`{arg}` is not a vector ({found})")]
    NotASequence { arg: String, found: String },

    /// Two inputs whose lengths cannot be recycled against each other
    #[error("`.x` ({x_len}) and `.y` ({y_len}) are different lengths")]
    LengthMismatch { x_len: usize, y_len: usize },

    /// The declared result kind is not one of the recognized kinds
    #[error("Unsupported type {0}")]
    UnsupportedKind(String),

    /// A single iteration produced a result that is not a length 1 value of
    /// the declared kind. `index` is 1-based.
    #[error("Result {index} is not a length 1 {expected} (got {found})")]
    ResultShapeViolation {
        index: usize,
        expected: Kind,
        found: String,
    },
}

fn arity_message(expected: usize, got: usize, expression: Option<&str>) -> String {
    match expression {
        Some(expr) => {
            format!("ArityError: expression {expr}: expected {expected} arguments, got {got}")
        }
        None => format!("ArityError: function expected {expected} arguments but got {got}"),
    }
}

impl Error {
    /// Create an ArityError without expression context
    pub fn arity_error(expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: None,
        }
    }

    /// Create an ArityError with expression context
    pub fn arity_error_with_expr(expected: usize, got: usize, expression: String) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: Some(expression),
        }
    }

    /// True for errors raised while evaluating the callable itself.
    ///
    /// These are propagated out of `map`/`map_pair` unchanged.
    pub fn is_evaluation_failure(&self) -> bool {
        matches!(
            self,
            Error::ParseError(_)
                | Error::EvalError(_)
                | Error::TypeError(_)
                | Error::UnboundVariable(_)
                | Error::ArityError { .. }
        )
    }
}

pub mod ast;
pub mod builtinops;
pub mod context;
pub mod evaluator;
pub mod map;

#[cfg(feature = "scheme")]
pub mod scheme;

pub use context::EvalContext;
pub use map::{map, map_pair};
