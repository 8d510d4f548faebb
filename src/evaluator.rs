use crate::Error;
use crate::MAX_EVAL_DEPTH;
use crate::ast::{DOTS, Value};
use crate::builtinops::{OpKind, find_scheme_op, get_builtin_ops};
use crate::context::EvalContext;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) mod intooperation;

use intooperation::{IntoOperation, OperationFn};
pub use intooperation::{NumIter, StringIter, ValueIter};

/// Number of arguments an operation accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly n arguments
    Exact(usize),
    /// n or more arguments
    AtLeast(usize),
    /// Any number of arguments
    Any,
}

impl Arity {
    pub fn validate(self, got: usize) -> Result<(), Error> {
        match self {
            Arity::Exact(expected) if got != expected => Err(Error::arity_error(expected, got)),
            Arity::AtLeast(min) if got < min => Err(Error::arity_error(min, got)),
            _ => Ok(()),
        }
    }
}

/// Environment for variable bindings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    parent: Option<Box<Environment>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    pub(crate) fn with_parent(parent: Environment) -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: Some(Box::new(parent)),
        }
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings
            .get(name)
            .or_else(|| self.parent.as_ref().and_then(|parent| parent.get(name)))
    }

    /// Register a custom builtin function that works on raw argument slices.
    ///
    /// # Example
    /// ```
    /// use mapxp::evaluator::create_global_env;
    /// use mapxp::ast::Value;
    /// use mapxp::Error;
    ///
    /// fn first_or_nothing(args: &[Value]) -> Result<Value, Error> {
    ///     Ok(args.first().cloned().unwrap_or(Value::Unspecified))
    /// }
    ///
    /// let mut env = create_global_env();
    /// env.register_builtin_function("first", first_or_nothing);
    /// ```
    pub fn register_builtin_function(
        &mut self,
        name: &str,
        func: fn(&[Value]) -> Result<Value, Error>,
    ) {
        let wrapped: Arc<OperationFn> = Arc::new(move |args: Vec<Value>| func(&args));
        self.bind_builtin(name, wrapped);
    }

    /// Register a strongly-typed Rust function or closure as a builtin.
    ///
    /// Parameters are converted from their argument values (`i64`, `f64`,
    /// `bool` and `String` scalars, `&str`, whole `Vector`s or raw `Value`s)
    /// and arity is checked automatically. The function may return anything
    /// convertible into a `Value`, or a `Result` of one.
    ///
    /// ```rust,ignore
    /// fn add(a: i64, b: i64) -> i64 { a + b }
    /// let mut env = mapxp::evaluator::create_global_env();
    /// env.register_builtin_operation::<_, (i64, i64)>("add", add);
    /// ```
    pub fn register_builtin_operation<F, Args>(&mut self, name: &str, func: F)
    where
        F: IntoOperation<Args> + 'static,
    {
        self.bind_builtin(name, func.into_operation());
    }

    fn bind_builtin(&mut self, name: &str, func: Arc<OperationFn>) {
        self.bindings.insert(
            name.to_owned(),
            Value::BuiltinFunction {
                id: name.to_owned(),
                func,
            },
        );
    }
}

impl EvalContext for Environment {
    fn define(&mut self, name: &str, value: Value) {
        Environment::define(self, name, value);
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }

    fn evaluate(&mut self, expr: &Value) -> Result<Value, Error> {
        eval(expr, self)
    }
}

/// Evaluate an expression (public API)
pub fn eval(expr: &Value, env: &mut Environment) -> Result<Value, Error> {
    eval_with_depth_tracking(expr, env, 0)
}

/// Evaluate an expression with depth tracking to prevent stack overflow
fn eval_with_depth_tracking(
    expr: &Value,
    env: &mut Environment,
    depth: usize,
) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::EvalError(format!(
            "Evaluation depth limit exceeded (max: {MAX_EVAL_DEPTH})"
        )));
    }
    match expr {
        // Self-evaluating forms (empty lists are NOT self-evaluating for strict semantics)
        Value::Vector(_)
        | Value::Dots(_)
        | Value::BuiltinFunction { .. }
        | Value::Function { .. }
        | Value::Unspecified => Ok(expr.clone()),

        // Variable lookup
        Value::Symbol(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnboundVariable(name.clone())),

        // `x[[i]]`: the sequence is looked up by name, the index read from its cell
        Value::Element { sequence, index } => {
            let target = env
                .get(sequence)
                .ok_or_else(|| Error::UnboundVariable(sequence.clone()))?;
            let Some(v) = target.as_sequence() else {
                return Err(Error::TypeError(format!(
                    "cannot subset {} `{sequence}`",
                    target.type_name()
                )));
            };
            v.element(index.current())
        }

        // List evaluation (function application or special forms)
        Value::List(elements) => {
            eval_list(elements, env, depth).map_err(|err| add_context(err, expr))
        }
    }
}

/// Helper function to add expression context to errors
fn add_context(error: Error, expr: &Value) -> Error {
    let context = format!("while evaluating: {expr}");
    match error {
        Error::EvalError(msg) => Error::EvalError(format!("{msg}\n  Context: {context}")),
        Error::TypeError(msg) => Error::TypeError(format!("{msg}\n  Context: {context}")),
        // Don't add context to parse errors, unbound variables, or arity errors (they have their own context)
        other => other,
    }
}

/// Evaluate call arguments. A `...` argument splices in the values it is
/// bound to; an unbound `...` contributes nothing.
fn eval_args(args: &[Value], env: &mut Environment, depth: usize) -> Result<Vec<Value>, Error> {
    let mut evaluated = Vec::with_capacity(args.len());
    for arg in args {
        if let Value::Symbol(name) = arg
            && name == DOTS
        {
            match env.get(DOTS) {
                Some(Value::Dots(forwarded)) => evaluated.extend(forwarded.iter().cloned()),
                Some(other) => {
                    return Err(Error::TypeError(format!(
                        "`...` is bound to {}",
                        other.type_name()
                    )));
                }
                None => {}
            }
            continue;
        }
        evaluated.push(eval_with_depth_tracking(arg, env, depth + 1)?);
    }
    Ok(evaluated)
}

/// Evaluate a call form.
///
/// A head symbol naming a special form is dispatched to it with the
/// unevaluated arguments. Anything else is a function application.
fn eval_list(elements: &[Value], env: &mut Environment, depth: usize) -> Result<Value, Error> {
    let [func_expr, arg_exprs @ ..] = elements else {
        return Err(Error::EvalError("Cannot evaluate empty list".to_owned()));
    };

    if let Value::Symbol(name) = func_expr
        && let Some(op) = find_scheme_op(name)
        && let OpKind::SpecialForm(special_form) = &op.op_kind
    {
        if let Err(Error::ArityError { expected, got, .. }) = op.validate_arity(arg_exprs.len()) {
            return Err(Error::arity_error_with_expr(
                expected,
                got,
                format!("{}", Value::List(elements.to_vec())),
            ));
        }
        return special_form(arg_exprs, env, depth);
    }

    let func = eval_with_depth_tracking(func_expr, env, depth + 1)?;
    let args = eval_args(arg_exprs, env, depth + 1)?;
    apply(&func, args, depth)
}

fn apply(func: &Value, args: Vec<Value>, depth: usize) -> Result<Value, Error> {
    match func {
        Value::BuiltinFunction { func, .. } => func(args),
        Value::Function {
            params,
            body,
            env: closure_env,
        } => {
            let (fixed, variadic) = match params.split_last() {
                Some((last, fixed)) if last == DOTS => (fixed, true),
                _ => (params.as_slice(), false),
            };
            if args.len() < fixed.len() || (!variadic && args.len() != fixed.len()) {
                return Err(Error::arity_error(fixed.len(), args.len()));
            }

            // Create new environment with closure environment as parent
            let mut new_env = Environment::with_parent(closure_env.clone());
            let mut args = args.into_iter();
            for (param, arg) in fixed.iter().zip(args.by_ref()) {
                new_env.define(param.as_str(), arg);
            }
            if variadic {
                new_env.define(DOTS, Value::Dots(args.collect()));
            }

            eval_with_depth_tracking(body, &mut new_env, depth + 1).map_err(|err| match err {
                Error::EvalError(msg) => Error::EvalError(format!("{msg}\n  In lambda: {body}")),
                Error::TypeError(msg) => Error::TypeError(format!("{msg}\n  In lambda: {body}")),
                other => other,
            })
        }
        _ => Err(Error::TypeError(format!(
            "Cannot apply non-function: {func}"
        ))),
    }
}

/// Evaluate quote special form
pub(crate) fn eval_quote(
    args: &[Value],
    _env: &mut Environment,
    _depth: usize,
) -> Result<Value, Error> {
    match args {
        [expr] => Ok(expr.clone()),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

/// Evaluate define special form
pub(crate) fn eval_define(
    args: &[Value],
    env: &mut Environment,
    depth: usize,
) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name), expr] => {
            let value = eval_with_depth_tracking(expr, env, depth + 1)?;
            env.define(name.as_str(), value);
            Ok(Value::Unspecified)
        }
        [_, _] => Err(Error::TypeError("define requires a symbol".to_owned())),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

/// Evaluate if special form
pub(crate) fn eval_if(args: &[Value], env: &mut Environment, depth: usize) -> Result<Value, Error> {
    match args {
        [condition_expr, then_expr, else_expr] => {
            let condition = eval_with_depth_tracking(condition_expr, env, depth + 1)?;
            match condition.as_bool() {
                Some(true) => eval_with_depth_tracking(then_expr, env, depth + 1),
                Some(false) => eval_with_depth_tracking(else_expr, env, depth + 1),
                None => Err(Error::TypeError(format!(
                    "if condition must be a logical scalar, got {}",
                    condition.describe()
                ))),
            }
        }
        _ => Err(Error::arity_error(3, args.len())),
    }
}

/// Evaluate lambda special form
///
/// A trailing `...` parameter collects any extra arguments, which the body
/// can forward by writing `...` in a call.
pub(crate) fn eval_lambda(
    args: &[Value],
    env: &mut Environment,
    _depth: usize,
) -> Result<Value, Error> {
    match args {
        [Value::List(param_list), body] => {
            let mut params: Vec<String> = Vec::new();
            for (position, param) in param_list.iter().enumerate() {
                match param {
                    Value::Symbol(name) if name == DOTS && position + 1 != param_list.len() => {
                        return Err(Error::EvalError(
                            "`...` must be the last parameter".to_owned(),
                        ));
                    }
                    Value::Symbol(name) => {
                        // Check for duplicate parameter names (R7RS compliant)
                        if params.contains(name) {
                            return Err(Error::EvalError(format!(
                                "Duplicate parameter name: {name}"
                            )));
                        }
                        params.push(name.clone());
                    }
                    _ => {
                        return Err(Error::TypeError(
                            "Lambda parameters must be symbols".to_owned(),
                        ));
                    }
                }
            }

            Ok(Value::Function {
                params,
                body: Box::new(body.clone()),
                env: env.clone(),
            })
        }
        [_, _] => Err(Error::TypeError(
            "Lambda parameters must be a list".to_owned(),
        )),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

/// Check if a value is obviously non-logical (before evaluation)
/// This catches literals, but can't check function call results
fn is_obviously_non_boolean(value: &Value) -> bool {
    match value {
        Value::Vector(_) => value.as_bool().is_none(),
        Value::Dots(_) | Value::Unspecified => true,
        Value::List(_)
        | Value::Symbol(_)
        | Value::Element { .. }
        | Value::BuiltinFunction { .. }
        | Value::Function { .. } => false,
    }
}

macro_rules! boolean_logic_op {
    ($name:ident, $op_name:expr, $short_circuit:literal, $default:literal) => {
        pub(crate) fn $name(
            args: &[Value],
            env: &mut Environment,
            depth: usize,
        ) -> Result<Value, Error> {
            // SCHEME-STRICT: Require at least 1 argument (Scheme R7RS allows 0 args, returns #t)
            if args.is_empty() {
                return Err(Error::arity_error(1, 0));
            }

            // First pass: check for obviously non-logical arguments before evaluation,
            // so that short-circuit evaluation doesn't hide gross errors
            if args.iter().any(is_obviously_non_boolean) {
                return Err(Error::TypeError(
                    concat!("'", $op_name, "' requires logical scalars (no truthiness)").to_owned(),
                ));
            }

            // Second pass: evaluate and short-circuit
            for arg in args {
                let result = eval_with_depth_tracking(arg, env, depth + 1)?;
                match result.as_bool() {
                    Some($short_circuit) => return Ok(Value::from($short_circuit)),
                    Some(_) => continue,
                    None => {
                        return Err(Error::TypeError(
                            concat!("'", $op_name, "' requires logical scalars (no truthiness)")
                                .to_owned(),
                        ));
                    }
                }
            }

            Ok(Value::from($default))
        }
    };
}

// Generate boolean logic functions
boolean_logic_op!(eval_and, "and", false, true);
boolean_logic_op!(eval_or, "or", true, false);

/// Create a global environment with built-in functions
pub fn create_global_env() -> Environment {
    let mut env = Environment::new();

    for builtin_op in get_builtin_ops() {
        if let OpKind::Function(func) = &builtin_op.op_kind {
            let func = Arc::clone(func);
            let arity = builtin_op.arity;
            env.bind_builtin(
                builtin_op.scheme_id,
                Arc::new(move |args: Vec<Value>| {
                    arity.validate(args.len())?;
                    func(args)
                }),
            );
        }
    }

    env
}
