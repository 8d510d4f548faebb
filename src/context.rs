//! The evaluation context consumed by the map engine.
//!
//! The engine never evaluates anything itself. It resolves its inputs by name and
//! hands a call expression to whatever host implements [`EvalContext`]. The
//! reference host is [`crate::evaluator::Environment`].

use crate::Error;
use crate::ast::Value;

/// A mutable name-to-value mapping that can evaluate expressions.
pub trait EvalContext {
    /// Bind `name` to `value`, creating or overwriting the binding.
    fn define(&mut self, name: &str, value: Value);

    /// Resolve a name to its current value.
    fn lookup(&self, name: &str) -> Option<&Value>;

    /// Evaluate `expr` in this context. Errors raised by user code come back
    /// unchanged.
    fn evaluate(&mut self, expr: &Value) -> Result<Value, Error>;
}
