//! Built-in operations registry of the reference host.
//!
//! Every operation is strictly typed. Scalars are length 1 vectors, and
//! arithmetic and comparison accept integer or double scalars as long as all
//! operands share one kind.
//!
//! ```scheme
//! (+ 1 2 3)            ; => 6
//! (* 1.5 2.0)          ; => 3.0
//! (c 1 2 3)            ; => (c 1 2 3)
//! (set-names (c 1 2) (c "a" "b"))
//! ```
//!
//! ## Functions vs Special Forms
//!
//! - **Functions**: Evaluate all arguments before application (e.g., `+`, `not`, `c`)
//! - **Special Forms**: Control evaluation of arguments (e.g., `if`, `and`, `lambda`)
//!
//! ## Error Handling
//!
//! - **Type Safety**: Operations reject incorrect types (e.g., `(not 1)` errors)
//! - **No Coercion**: Integers never become doubles, no "truthiness" conversions
//! - **Overflow Detection**: Integer arithmetic detects and reports overflow
//! - **Arity Checking**: Strict argument count validation for all operations
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** as a typed Rust function (see `evaluator::intooperation`)
//! 2. **Add to BUILTIN_OPS** with its identifier and arity
//! 3. **Add tests** covering edge cases and error conditions

use crate::Error;
use crate::ast::{Elements, FloatType, Kind, NumberType, Value, Vector};
use crate::evaluator::intooperation::{IntoOperation, IntoVariadicOperation, OperationFn};
use crate::evaluator::{
    Arity, Environment, StringIter, ValueIter, eval_and, eval_define, eval_if, eval_lambda,
    eval_or, eval_quote,
};
use std::collections::HashMap;
use std::iter;
use std::sync::{Arc, LazyLock};

/// Represents the implementation of a built-in expression (function or special form)
#[derive(Clone)]
pub enum OpKind {
    /// Regular function that takes evaluated arguments and returns a value
    Function(Arc<OperationFn>),
    /// Special form that receives the environment, unevaluated arguments and current evaluation depth
    SpecialForm(fn(&[Value], &mut Environment, usize) -> Result<Value, Error>),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::SpecialForm(_) => write!(f, "SpecialForm(<fn>)"),
        }
    }
}

/// Definition of a built-in operation
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    /// The identifier this operation is bound to
    pub scheme_id: &'static str,
    /// The implementation of this operation (function or special form)
    pub op_kind: OpKind,
    /// Expected number of arguments
    pub arity: Arity,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        self.scheme_id == other.scheme_id
    }
}

impl BuiltinOp {
    #[cfg_attr(not(test), expect(dead_code))]
    pub(crate) fn is_special_form(&self) -> bool {
        matches!(self.op_kind, OpKind::SpecialForm(_))
    }

    pub(crate) fn validate_arity(&self, arg_count: usize) -> Result<(), Error> {
        self.arity.validate(arg_count)
    }
}

//
// Builtin Function Implementations
//

/// Collect numeric scalar arguments into one typed store.
/// Mixing integers and doubles is a type error.
fn numeric_args<'a>(args: impl IntoIterator<Item = &'a Value>) -> Result<Elements, Error> {
    let mut out: Option<Elements> = None;
    for arg in args {
        let scalar = match arg.as_sequence() {
            Some(v) if v.len() == 1 && matches!(v.kind(), Kind::Integer | Kind::Float) => {
                v.elements().clone()
            }
            _ => {
                return Err(Error::TypeError(format!(
                    "expected numeric scalar, got {}",
                    arg.describe()
                )));
            }
        };
        if let Some(acc) = out.as_mut() {
            acc.append(scalar)?;
        } else {
            out = Some(scalar);
        }
    }
    Ok(out.unwrap_or(Elements::Integer(Vec::new())))
}

fn not_numeric(elements: &Elements) -> Error {
    Error::TypeError(format!("expected numeric scalars, got {}", elements.kind()))
}

fn overflow(operation: &str) -> Error {
    Error::EvalError(format!("Integer overflow in {operation}"))
}

// Comparisons chain over adjacent pairs: (< 1 2 3) holds when 1 < 2 and 2 < 3.
macro_rules! numeric_comparison {
    ($name:ident, $op:tt) => {
        fn $name(first: Value, rest: ValueIter<'_>) -> Result<bool, Error> {
            // SCHEME-STRICT: at least two operands
            if rest.len() == 0 {
                return Err(Error::arity_error(2, 1));
            }

            match numeric_args(iter::once(&first).chain(rest))? {
                Elements::Integer(xs) => Ok(xs.windows(2).all(|w| w[0] $op w[1])),
                Elements::Float(xs) => Ok(xs.windows(2).all(|w| w[0] $op w[1])),
                other => Err(not_numeric(&other)),
            }
        }
    };
}

numeric_comparison!(builtin_eq, ==);
numeric_comparison!(builtin_lt, <);
numeric_comparison!(builtin_gt, >);
numeric_comparison!(builtin_le, <=);
numeric_comparison!(builtin_ge, >=);

fn builtin_add(args: ValueIter<'_>) -> Result<Value, Error> {
    match numeric_args(args)? {
        Elements::Integer(xs) => xs
            .into_iter()
            .try_fold(0 as NumberType, NumberType::checked_add)
            .map(Value::from)
            .ok_or_else(|| overflow("addition")),
        Elements::Float(xs) => Ok(Value::from(xs.into_iter().sum::<FloatType>())),
        other => Err(not_numeric(&other)),
    }
}

fn builtin_sub(first: Value, rest: ValueIter<'_>) -> Result<Value, Error> {
    match numeric_args(iter::once(&first).chain(rest))? {
        Elements::Integer(xs) => match xs.as_slice() {
            [x] => x.checked_neg().map(Value::from).ok_or_else(|| overflow("negation")),
            [x, tail @ ..] => tail
                .iter()
                .try_fold(*x, |acc, n| acc.checked_sub(*n))
                .map(Value::from)
                .ok_or_else(|| overflow("subtraction")),
            [] => Err(Error::arity_error(1, 0)),
        },
        Elements::Float(xs) => match xs.as_slice() {
            [x] => Ok(Value::from(-x)),
            [x, tail @ ..] => Ok(Value::from(tail.iter().fold(*x, |acc, n| acc - n))),
            [] => Err(Error::arity_error(1, 0)),
        },
        other => Err(not_numeric(&other)),
    }
}

// SCHEME-STRICT: Require at least 1 argument (Scheme R7RS allows 0 args, returns 1)
fn builtin_mul(first: Value, rest: ValueIter<'_>) -> Result<Value, Error> {
    match numeric_args(iter::once(&first).chain(rest))? {
        Elements::Integer(xs) => xs
            .into_iter()
            .try_fold(1 as NumberType, NumberType::checked_mul)
            .map(Value::from)
            .ok_or_else(|| overflow("multiplication")),
        Elements::Float(xs) => Ok(Value::from(xs.into_iter().product::<FloatType>())),
        other => Err(not_numeric(&other)),
    }
}

fn builtin_not(b: bool) -> bool {
    !b
}

fn builtin_equal(first: Value, second: Value) -> Result<bool, Error> {
    // Structural equality, but only between values of the same kind
    match (&first, &second) {
        (Value::Vector(a), Value::Vector(b)) if a.kind() == b.kind() => Ok(a == b),
        (Value::Symbol(_), Value::Symbol(_)) | (Value::List(_), Value::List(_)) => {
            Ok(first == second)
        }
        _ => Err(Error::TypeError(format!(
            "equal? requires arguments of the same kind (got {} and {})",
            first.type_name(),
            second.type_name()
        ))),
    }
}

fn builtin_length(v: Vector) -> Result<NumberType, Error> {
    NumberType::try_from(v.len()).map_err(|_| Error::EvalError("length out of range".into()))
}

/// Concatenate atomic vectors of one kind. Names are kept when any part has them.
fn builtin_c(first: Value, rest: ValueIter<'_>) -> Result<Vector, Error> {
    let mut elements: Option<Elements> = None;
    let mut names: Vec<String> = Vec::new();
    let mut named = false;

    for part in iter::once(&first).chain(rest) {
        let v = match part.as_sequence() {
            Some(v) if v.kind() != Kind::Opaque => v,
            _ => {
                return Err(Error::TypeError(format!(
                    "c combines atomic vectors, got {}",
                    part.describe()
                )));
            }
        };

        match v.names() {
            Some(labels) => {
                named = true;
                names.extend(labels.iter().cloned());
            }
            None => names.extend(iter::repeat_n(String::new(), v.len())),
        }

        if let Some(acc) = elements.as_mut() {
            acc.append(v.elements().clone())?;
        } else {
            elements = Some(v.elements().clone());
        }
    }

    let Some(elements) = elements else {
        return Err(Error::arity_error(1, 0));
    };
    let mut out = Vector::new(elements);
    if named {
        out.set_names(Some(names))?;
    }
    Ok(out)
}

fn builtin_list(args: ValueIter<'_>) -> Vector {
    Vector::from(args.cloned().collect::<Vec<Value>>())
}

fn builtin_seq_len(n: NumberType) -> Result<Vector, Error> {
    if n < 0 {
        return Err(Error::EvalError(format!(
            "seq-len requires a non-negative length, got {n}"
        )));
    }
    Ok(Vector::from((1..=n).collect::<Vec<NumberType>>()))
}

fn builtin_names(v: Vector) -> Value {
    match v.names() {
        Some(labels) => Value::from(labels.to_vec()),
        None => Value::Unspecified,
    }
}

fn builtin_set_names(mut v: Vector, labels: Vector) -> Result<Vector, Error> {
    let found = labels.kind();
    let Elements::Text(labels) = labels.into_elements() else {
        return Err(Error::TypeError(format!(
            "names must be a character vector, got {found}"
        )));
    };
    v.set_names(Some(labels))?;
    Ok(v)
}

fn builtin_identity(value: Value) -> Value {
    value
}

fn builtin_string_append(args: StringIter<'_>) -> String {
    args.collect()
}

fn builtin_error(args: ValueIter<'_>) -> Result<Value, Error> {
    let parts: Vec<String> = args
        .map(|value| {
            let text: Result<String, Error> = value.clone().try_into();
            text.unwrap_or_else(|_| value.to_string())
        })
        .collect();

    let message = if parts.is_empty() {
        "Error".to_owned()
    } else {
        parts.join(" ")
    };

    Err(Error::EvalError(message))
}

/// Global registry of all built-in operations, built once on first use.
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    fn builtin_fixed<Args, F>(f: F) -> Arc<OperationFn>
    where
        F: IntoOperation<Args>,
    {
        <F as IntoOperation<Args>>::into_operation(f)
    }

    fn builtin_variadic<Args, F>(f: F) -> Arc<OperationFn>
    where
        F: IntoVariadicOperation<Args>,
    {
        <F as IntoVariadicOperation<Args>>::into_variadic_operation(f)
    }

    vec![
        // Arithmetic operations
        BuiltinOp {
            scheme_id: "+",
            op_kind: OpKind::Function(builtin_variadic::<(ValueIter<'static>,), _>(builtin_add)),
            arity: Arity::Any,
        },
        BuiltinOp {
            scheme_id: "-",
            op_kind: OpKind::Function(builtin_variadic::<(Value, ValueIter<'static>), _>(
                builtin_sub,
            )),
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            scheme_id: "*",
            op_kind: OpKind::Function(builtin_variadic::<(Value, ValueIter<'static>), _>(
                builtin_mul,
            )),
            arity: Arity::AtLeast(1), // SCHEME-STRICT: Scheme R7RS allows 0 arguments (returns 1)
        },
        // Comparison operations
        BuiltinOp {
            scheme_id: ">",
            op_kind: OpKind::Function(builtin_variadic::<(Value, ValueIter<'static>), _>(
                builtin_gt,
            )),
            arity: Arity::AtLeast(2),
        },
        BuiltinOp {
            scheme_id: ">=",
            op_kind: OpKind::Function(builtin_variadic::<(Value, ValueIter<'static>), _>(
                builtin_ge,
            )),
            arity: Arity::AtLeast(2),
        },
        BuiltinOp {
            scheme_id: "<",
            op_kind: OpKind::Function(builtin_variadic::<(Value, ValueIter<'static>), _>(
                builtin_lt,
            )),
            arity: Arity::AtLeast(2),
        },
        BuiltinOp {
            scheme_id: "<=",
            op_kind: OpKind::Function(builtin_variadic::<(Value, ValueIter<'static>), _>(
                builtin_le,
            )),
            arity: Arity::AtLeast(2),
        },
        BuiltinOp {
            scheme_id: "=",
            op_kind: OpKind::Function(builtin_variadic::<(Value, ValueIter<'static>), _>(
                builtin_eq,
            )),
            arity: Arity::AtLeast(2),
        },
        BuiltinOp {
            scheme_id: "equal?",
            op_kind: OpKind::Function(builtin_fixed::<(Value, Value), _>(builtin_equal)),
            arity: Arity::Exact(2),
        },
        // Logical operations
        BuiltinOp {
            scheme_id: "not",
            op_kind: OpKind::Function(builtin_fixed::<(bool,), _>(builtin_not)),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "and",
            op_kind: OpKind::SpecialForm(eval_and),
            arity: Arity::AtLeast(1), // SCHEME-STRICT: Scheme R7RS allows 0 arguments (returns #t)
        },
        BuiltinOp {
            scheme_id: "or",
            op_kind: OpKind::SpecialForm(eval_or),
            arity: Arity::AtLeast(1), // SCHEME-STRICT: Scheme R7RS allows 0 arguments (returns #f)
        },
        // Control flow
        BuiltinOp {
            scheme_id: "if",
            op_kind: OpKind::SpecialForm(eval_if),
            // SCHEME-STRICT: Require exactly 3 arguments
            arity: Arity::Exact(3),
        },
        // Special forms for language constructs
        BuiltinOp {
            scheme_id: "quote",
            op_kind: OpKind::SpecialForm(eval_quote),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "define",
            op_kind: OpKind::SpecialForm(eval_define),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            scheme_id: "lambda",
            op_kind: OpKind::SpecialForm(eval_lambda),
            // Fixed parameters, optionally ending in `...`
            // Duplicate parameter names are prohibited per R7RS standard
            arity: Arity::Exact(2),
        },
        // Vector operations
        BuiltinOp {
            scheme_id: "length",
            op_kind: OpKind::Function(builtin_fixed::<(Vector,), _>(builtin_length)),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "c",
            op_kind: OpKind::Function(builtin_variadic::<(Value, ValueIter<'static>), _>(
                builtin_c,
            )),
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            scheme_id: "list",
            op_kind: OpKind::Function(builtin_variadic::<(ValueIter<'static>,), _>(builtin_list)),
            arity: Arity::Any,
        },
        BuiltinOp {
            scheme_id: "seq-len",
            op_kind: OpKind::Function(builtin_fixed::<(NumberType,), _>(builtin_seq_len)),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "names",
            op_kind: OpKind::Function(builtin_fixed::<(Vector,), _>(builtin_names)),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "set-names",
            op_kind: OpKind::Function(builtin_fixed::<(Vector, Vector), _>(builtin_set_names)),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            scheme_id: "identity",
            op_kind: OpKind::Function(builtin_fixed::<(Value,), _>(builtin_identity)),
            arity: Arity::Exact(1),
        },
        // String operations
        BuiltinOp {
            scheme_id: "string-append",
            op_kind: OpKind::Function(builtin_variadic::<(StringIter<'static>,), _>(
                builtin_string_append,
            )),
            arity: Arity::Any,
        },
        // Error handling
        BuiltinOp {
            scheme_id: "error",
            op_kind: OpKind::Function(builtin_variadic::<(ValueIter<'static>,), _>(builtin_error)),
            arity: Arity::Any,
        },
    ]
});

static BUILTIN_SCHEME: LazyLock<HashMap<&'static str, &'static BuiltinOp>> = LazyLock::new(|| {
    let ops: &'static [BuiltinOp] = BUILTIN_OPS.as_slice();
    ops.iter().map(|op| (op.scheme_id, op)).collect()
});

/// Get all builtin operations (for internal use by evaluator)
pub(crate) fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS.as_slice()
}

/// Find a builtin operation by its identifier
pub(crate) fn find_scheme_op(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_SCHEME.get(id).copied()
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{sym, val};

    /// Micro-helper for success cases in comprehensive tests
    fn success<T: Into<Value>>(value: T) -> Option<Value> {
        Some(val(value))
    }

    /// Invoke a builtin through the registry with the erased signature,
    /// applying the registered arity the way the global environment does.
    fn call_builtin(name: &str, args: &[Value]) -> Result<Value, Error> {
        let op = find_scheme_op(name).expect("builtin not found");
        op.validate_arity(args.len())?;
        match &op.op_kind {
            OpKind::Function(func) => func(args.to_vec()),
            OpKind::SpecialForm(_) => {
                panic!("expected function builtin in tests, got special form: {name}")
            }
        }
    }

    #[test]
    fn test_builtin_ops_registry() {
        let not_op = find_scheme_op("not").unwrap();
        assert_eq!(not_op.arity, Arity::Exact(1));
        assert!(!not_op.is_special_form());

        let add_op = find_scheme_op("+").unwrap();
        assert_eq!(add_op.arity, Arity::Any);
        if let OpKind::Function(func) = &add_op.op_kind {
            assert_eq!(func(vec![val(1), val(2)]).unwrap(), val(3));
        } else {
            panic!("Expected Function variant");
        }

        for special in ["quote", "define", "if", "lambda", "and", "or"] {
            assert!(
                find_scheme_op(special).unwrap().is_special_form(),
                "{special} should be a special form"
            );
        }

        let all_ops = get_builtin_ops();
        assert_eq!(all_ops.len(), BUILTIN_SCHEME.len(), "duplicate identifiers");
        assert!(find_scheme_op("unknown").is_none());
    }

    /// Macro to create test cases, invoking builtins via the registry.
    macro_rules! test {
        ($name:expr, $args:expr, $expected:expr) => {
            ($name, call_builtin($name, $args), $expected)
        };
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_builtin_function_implementations() {
        type TestCase = (&'static str, Result<Value, Error>, Option<Value>);

        let many_ones: Vec<Value> = (0..100).map(|_| val(1)).collect();
        let all_fives: Vec<Value> = (0..10).map(|_| val(5)).collect();
        let mut mostly_fives = all_fives.clone();
        mostly_fives.push(val(6));

        let named = Vector::from([1, 2]).with_names(["a", "b"]).unwrap();

        let test_cases: Vec<TestCase> = vec![
            // === ARITHMETIC ===
            test!("+", &[], success(0)),
            test!("+", &[val(5)], success(5)),
            test!("+", &[val(1), val(2), val(3)], success(6)),
            test!("+", &[val(0.5), val(0.25)], success(0.75)),
            test!("+", &many_ones, success(100)),
            test!("+", &[val("not a number")], None),
            test!("+", &[val(1), val(true)], None),
            // No coercion between integer and double
            test!("+", &[val(1), val(2.0)], None),
            // Only scalars
            test!("+", &[val([1, 2])], None),
            test!("-", &[val(5)], success(-5)),
            test!("-", &[val(10), val(3), val(2)], success(5)),
            test!("-", &[val(1.5)], success(-1.5)),
            test!("-", &[val(5.0), val(0.5)], success(4.5)),
            test!("-", &[], None),
            test!("-", &[val(5), val(false)], None),
            test!("*", &[], None),
            test!("*", &[val(5)], success(5)),
            test!("*", &[val(2), val(3), val(4)], success(24)),
            test!("*", &[val(2.0), val(0.5)], success(1.0)),
            test!("*", &[val(2), val(Vector::empty(Kind::Integer))], None),
            // Integer overflow
            test!("+", &[val(NumberType::MAX), val(1)], None),
            test!("*", &[val(NumberType::MAX), val(2)], None),
            test!("-", &[val(NumberType::MIN)], None),
            test!("-", &[val(NumberType::MIN), val(1)], None),
            test!("+", &[val(NumberType::MAX), val(0)], success(NumberType::MAX)),
            // === COMPARISON ===
            test!(">", &[val(7), val(3)], success(true)),
            test!(">", &[val(4), val(4)], success(false)),
            test!(">", &[val(9), val(6), val(2)], success(true)),
            test!(">", &[val(9), val(6), val(7)], success(false)),
            test!(">", &[val(5)], None),
            test!(">", &[val("a"), val(3)], None),
            test!(">=", &[val(7), val(7)], success(true)),
            test!("<", &[val(1), val(2), val(3)], success(true)),
            test!("<", &[val(1.5), val(0.5)], success(false)),
            test!("<", &[val(1), val(1.5)], None),
            test!("<=", &[val(3), val(3)], success(true)),
            test!("=", &[val(12), val(12)], success(true)),
            test!("=", &[val(8), val(3)], success(false)),
            test!("=", &all_fives, success(true)),
            test!("=", &mostly_fives, success(false)),
            test!("=", &[val(true), val(true)], None),
            // === EQUALITY ===
            test!("equal?", &[val(11), val(11)], success(true)),
            test!("equal?", &[val("hello"), val("world")], success(false)),
            test!("equal?", &[val([1, 2]), val([1, 2])], success(true)),
            test!("equal?", &[sym("a"), sym("a")], success(true)),
            test!("equal?", &[val(5), val("5")], None),
            test!("equal?", &[val(1), val(1.0)], None),
            test!("equal?", &[val(5)], None),
            // === LOGICAL ===
            test!("not", &[val(true)], success(false)),
            test!("not", &[val(false)], success(true)),
            test!("not", &[], None),
            test!("not", &[val(1)], None),
            test!("not", &[val([true, false])], None),
            // === VECTORS ===
            test!("length", &[val([1, 2, 3])], success(3)),
            test!("length", &[val(Vec::<bool>::new())], success(0)),
            test!("length", &[sym("x")], None),
            test!("c", &[val(1), val([2, 3])], success([1, 2, 3])),
            test!("c", &[val("a"), val("b")], success(["a", "b"])),
            test!("c", &[val(1), val(2.0)], None),
            test!("c", &[val(vec![val(1)])], None),
            test!("c", &[], None),
            test!(
                "c",
                &[val(named.clone()), val(3)],
                success(Vector::from([1, 2, 3]).with_names(["a", "b", ""]).unwrap())
            ),
            test!("list", &[], success(Vector::empty(Kind::Opaque))),
            test!(
                "list",
                &[val(1), val("x"), val([true])],
                success(vec![val(1), val("x"), val(true)])
            ),
            test!("seq-len", &[val(3)], success([1, 2, 3])),
            test!("seq-len", &[val(0)], success(Vector::empty(Kind::Integer))),
            test!("seq-len", &[val(-1)], None),
            test!("names", &[val(named.clone())], success(["a", "b"])),
            test!(
                "set-names",
                &[val([1, 2]), val(["a", "b"])],
                success(named.clone())
            ),
            test!("set-names", &[val([1, 2]), val(["a"])], None),
            test!("set-names", &[val([1, 2]), val([1, 2])], None),
            test!("identity", &[val(named.clone())], success(named)),
            // === STRINGS ===
            test!("string-append", &[], success("")),
            test!(
                "string-append",
                &[val("hello"), val(" "), val("world")],
                success("hello world")
            ),
            test!("string-append", &[val("hello"), val(123)], None),
            // === ERRORS ===
            test!("error", &[], None),
            test!("error", &[val("test error")], None),
        ];

        for (test_expr, result, expected) in test_cases {
            match (result, expected) {
                (Ok(actual), Some(expected_val)) => {
                    assert_eq!(actual, expected_val, "Failed for test case: {test_expr}");
                }
                (Err(_), None) => {} // Expected error
                (actual, expected) => panic!(
                    "Unexpected result for test case: {test_expr}\nGot: {actual:?}, Expected: {expected:?}"
                ),
            }
        }
    }

    #[test]
    fn test_names_of_unnamed_vector() {
        let result = call_builtin("names", &[val([1, 2])]).unwrap();
        assert!(matches!(result, Value::Unspecified));
    }

    #[test]
    fn test_error_message_construction() {
        type ErrorTest = (Vec<Value>, &'static str);
        let test_cases: Vec<ErrorTest> = vec![
            (vec![val("Simple message")], "Simple message"),
            (
                vec![val("Code:"), val(404), val("Not Found")],
                "Code: 404 Not Found",
            ),
            (vec![val(true), val([1, 2]), val("mixed")], "#t (c 1 2) mixed"),
            (vec![], "Error"),
        ];

        for (args, expected_msg) in test_cases {
            match call_builtin("error", &args).unwrap_err() {
                Error::EvalError(msg) => {
                    assert_eq!(msg, expected_msg, "Failed for args: {args:?}");
                }
                other => panic!("Expected EvalError for args: {args:?}, got {other:?}"),
            }
        }
    }
}
