use crate::Error;
use crate::ast::{Elements, NumberType, Value, Vector};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::sync::Arc;

// Adapter layer turning strongly-typed Rust functions into the erased
// `OperationFn` stored in `Value::BuiltinFunction`. Users go through the
// registration methods on `Environment`.

/// Canonical erased builtin function type used by the evaluator.
///
/// Builtins receive ownership of their argument vector, so they can move
/// vectors out of it without cloning.
pub(crate) type OperationFn = dyn Fn(Vec<Value>) -> Result<Value, Error> + Send + Sync;

// =====================================================================
// Fixed parameters
// =====================================================================

/// Turns one argument into a typed parameter.
///
/// `Param<'a>` may borrow from the argument slot (`&str`) or take it
/// by value (`Value`, `Vector`, scalars).
pub(crate) trait FromParam {
    type Param<'a>;

    fn from_arg<'a>(value: &'a mut Value) -> Result<Self::Param<'a>, Error>;
}

impl FromParam for Value {
    type Param<'a> = Value;

    fn from_arg<'a>(value: &'a mut Value) -> Result<Self::Param<'a>, Error> {
        Ok(std::mem::replace(value, Value::Unspecified))
    }
}

// Scalars and whole vectors come through the `TryInto` impls in `ast.rs`.
impl<T> FromParam for T
where
    Value: std::convert::TryInto<T, Error = Error>,
{
    type Param<'a> = T;

    fn from_arg<'a>(value: &'a mut Value) -> Result<Self::Param<'a>, Error> {
        let owned = std::mem::replace(value, Value::Unspecified);
        <Value as std::convert::TryInto<T>>::try_into(owned)
    }
}

impl FromParam for &str {
    type Param<'a> = &'a str;

    fn from_arg<'a>(value: &'a mut Value) -> Result<Self::Param<'a>, Error> {
        let value: &'a Value = value;
        text_scalar(value).ok_or_else(|| {
            Error::TypeError(format!("expected character scalar, got {}", value.describe()))
        })
    }
}

fn text_scalar(value: &Value) -> Option<&str> {
    match value.as_sequence().map(Vector::elements) {
        Some(Elements::Text(items)) if items.len() == 1 => items.first().map(String::as_str),
        _ => None,
    }
}

fn integer_scalar(value: &Value) -> Option<NumberType> {
    match value.as_sequence().map(Vector::elements) {
        Some(Elements::Integer(items)) if items.len() == 1 => items.first().copied(),
        _ => None,
    }
}

// =====================================================================
// Rest parameters
// =====================================================================

/// How a run of arguments is viewed by a rest parameter. `precheck`
/// validates the whole run up front so that `project` cannot fail.
#[doc(hidden)]
pub trait ValueElementKind {
    type Item<'a>;

    fn precheck(slice: &[Value]) -> Result<(), Error>;
    fn project<'a>(v: &'a Value) -> Self::Item<'a>;
}

/// Iterator over the trailing arguments of a call.
#[doc(hidden)]
pub struct TypedValueIter<'a, K: ValueElementKind> {
    inner: std::slice::Iter<'a, Value>,
    _marker: PhantomData<K>,
}

impl<'a, K> TypedValueIter<'a, K>
where
    K: ValueElementKind,
{
    pub(crate) fn new(values: &'a [Value]) -> Result<Self, Error> {
        K::precheck(values)?;
        Ok(TypedValueIter {
            inner: values.iter(),
            _marker: PhantomData,
        })
    }
}

impl<'a, K> Iterator for TypedValueIter<'a, K>
where
    K: ValueElementKind,
{
    type Item = K::Item<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let v = self.inner.next()?;
        Some(K::project(v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> ExactSizeIterator for TypedValueIter<'_, K> where K: ValueElementKind {}
impl<K> FusedIterator for TypedValueIter<'_, K> where K: ValueElementKind {}

#[doc(hidden)]
pub struct ValueKind;

impl ValueElementKind for ValueKind {
    type Item<'a> = &'a Value;

    fn precheck(_slice: &[Value]) -> Result<(), Error> {
        Ok(())
    }

    fn project<'a>(v: &'a Value) -> Self::Item<'a> {
        v
    }
}

#[doc(hidden)]
pub struct IntegerKind;

impl ValueElementKind for IntegerKind {
    type Item<'a> = NumberType;

    fn precheck(slice: &[Value]) -> Result<(), Error> {
        match slice.iter().find(|v| integer_scalar(v).is_none()) {
            Some(bad) => Err(Error::TypeError(format!(
                "expected integer scalar, got {}",
                bad.describe()
            ))),
            None => Ok(()),
        }
    }

    fn project<'a>(v: &'a Value) -> Self::Item<'a> {
        debug_assert!(integer_scalar(v).is_some(), "IntegerKind precheck skipped");
        integer_scalar(v).unwrap_or_default()
    }
}

#[doc(hidden)]
pub struct TextKind;

impl ValueElementKind for TextKind {
    type Item<'a> = &'a str;

    fn precheck(slice: &[Value]) -> Result<(), Error> {
        match slice.iter().find(|v| text_scalar(v).is_none()) {
            Some(bad) => Err(Error::TypeError(format!(
                "expected character scalar, got {}",
                bad.describe()
            ))),
            None => Ok(()),
        }
    }

    fn project<'a>(v: &'a Value) -> Self::Item<'a> {
        debug_assert!(text_scalar(v).is_some(), "TextKind precheck skipped");
        text_scalar(v).unwrap_or_default()
    }
}

/// Borrowed iterator over arbitrary trailing arguments.
pub type ValueIter<'a> = TypedValueIter<'a, ValueKind>;

/// Trailing arguments that must all be integer scalars.
pub type NumIter<'a> = TypedValueIter<'a, IntegerKind>;

/// Trailing arguments that must all be character scalars.
pub type StringIter<'a> = TypedValueIter<'a, TextKind>;

/// Builds a rest parameter from the tail of the argument vector.
pub(crate) trait FromRest {
    type Param<'a>;

    fn from_rest<'a>(slice: &'a [Value]) -> Result<Self::Param<'a>, Error>;
}

impl<K> FromRest for TypedValueIter<'static, K>
where
    K: ValueElementKind,
{
    type Param<'a> = TypedValueIter<'a, K>;

    fn from_rest<'a>(slice: &'a [Value]) -> Result<Self::Param<'a>, Error> {
        TypedValueIter::<K>::new(slice)
    }
}

// =====================================================================
// Return values
// =====================================================================

/// Normalizes builtin return types to `Result<Value, Error>`.
pub(crate) trait IntoValueResult {
    fn into_value_result(self) -> Result<Value, Error>;
}

impl<T> IntoValueResult for Result<T, Error>
where
    T: Into<Value>,
{
    fn into_value_result(self) -> Result<Value, Error> {
        self.map(Into::into)
    }
}

impl<T> IntoValueResult for T
where
    T: Into<Value>,
{
    fn into_value_result(self) -> Result<Value, Error> {
        Ok(self.into())
    }
}

/// Converts a typed Rust function into the erased [`OperationFn`].
/// `Args` is the tuple of parameter types.
pub(crate) trait IntoOperation<Args> {
    fn into_operation(self) -> Arc<OperationFn>;
}

/// Like [`IntoOperation`], for functions whose last parameter is one of
/// the rest iterators above.
pub(crate) trait IntoVariadicOperation<Args> {
    fn into_variadic_operation(self) -> Arc<OperationFn>;
}

impl<F, I, R> IntoVariadicOperation<(I,)> for F
where
    I: FromRest,
    F: for<'a> Fn(<I as FromRest>::Param<'a>) -> R + Send + Sync + 'static,
    R: IntoValueResult,
{
    fn into_variadic_operation(self) -> Arc<OperationFn> {
        Arc::new(move |args: Vec<Value>| {
            let rest_param: <I as FromRest>::Param<'_> = <I as FromRest>::from_rest(&args[..])?;
            (self)(rest_param).into_value_result()
        })
    }
}

macro_rules! impl_into_variadic_operation_for_prefix_and_rest {
    ($prefix:expr, $( $v:ident, $p:ident : $A:ident ),+ ) => {
        impl<F, I, R, $( $A ),+> IntoVariadicOperation<( $( $A, )+ I, )> for F
        where
            I: FromRest,
            $( $A: FromParam, )+
            F: for<'a> Fn(
                    $( <$A as FromParam>::Param<'a> ),+,
                    <I as FromRest>::Param<'a>,
                ) -> R
                + Send
                + Sync
                + 'static,
            R: IntoValueResult,
        {
            fn into_variadic_operation(self) -> Arc<OperationFn> {
                Arc::new(move |mut args: Vec<Value>| {
                    let len = args.len();
                    match args.as_mut_slice() {
                        &mut [ $( ref mut $v ),+, ref mut rest @ .. ] => {
                            $(
                                let $p: <$A as FromParam>::Param<'_> =
                                    <$A as FromParam>::from_arg($v)?;
                            )+
                            let rest_param: <I as FromRest>::Param<'_> =
                                <I as FromRest>::from_rest(&*rest)?;

                            (self)( $( $p ),+, rest_param ).into_value_result()
                        }
                        _ => Err(Error::arity_error($prefix, len)),
                    }
                })
            }
        }
    };
}

impl_into_variadic_operation_for_prefix_and_rest!(1, v0, p0: A1);
impl_into_variadic_operation_for_prefix_and_rest!(2, v0, p0: A1, v1, p1: A2);

// Arity is checked before any conversion. Each slot is converted in
// place, so `&str` parameters borrow from the argument vector.
macro_rules! impl_into_operation_for_arity {
    ($arity:expr, $( $v:ident, $p:ident : $A:ident ),+ ) => {
        impl<F, R, $( $A ),+> IntoOperation<( $( $A, )+ )> for F
        where
            F: for<'a> Fn( $( <$A as FromParam>::Param<'a> ),+ ) -> R
                + Send
                + Sync
                + 'static,
            $( $A: FromParam, )+
            R: IntoValueResult,
        {
            fn into_operation(self) -> Arc<OperationFn> {
                Arc::new(move |mut args: Vec<Value>| {
                    let len = args.len();
                    match args.as_mut_slice() {
                        &mut [ $( ref mut $v ),+ ] => {
                            $(
                                let $p: <$A as FromParam>::Param<'_> =
                                    <$A as FromParam>::from_arg($v)?;
                            )+

                            (self)( $( $p ),+ ).into_value_result()
                        }
                        _ => Err(Error::arity_error($arity, len)),
                    }
                })
            }
        }
    };
}

impl<F, R> IntoOperation<()> for F
where
    F: Fn() -> R + Send + Sync + 'static,
    R: IntoValueResult,
{
    fn into_operation(self) -> Arc<OperationFn> {
        Arc::new(move |args: Vec<Value>| {
            if !args.is_empty() {
                return Err(Error::arity_error(0, args.len()));
            }
            (self)().into_value_result()
        })
    }
}

impl_into_operation_for_arity!(1, v0, p0: A1);
impl_into_operation_for_arity!(2, v0, p0: A1, v1, p1: A2);
impl_into_operation_for_arity!(3, v0, p0: A1, v1, p1: A2, v2, p2: A3);
impl_into_operation_for_arity!(4, v0, p0: A1, v1, p1: A2, v2, p2: A3, v3, p3: A4);

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::val;

    fn op<Args, F: IntoOperation<Args>>(f: F) -> Arc<OperationFn> {
        f.into_operation()
    }

    fn variadic<Args, F: IntoVariadicOperation<Args>>(f: F) -> Arc<OperationFn> {
        f.into_variadic_operation()
    }

    #[test]
    fn test_fixed_parameters() {
        fn add(a: i64, b: i64) -> i64 {
            a + b
        }
        fn shout(s: &str) -> String {
            s.to_uppercase()
        }
        fn count(v: Vector) -> i64 {
            v.len() as i64
        }
        fn checked_sqrt(x: f64) -> Result<f64, Error> {
            if x < 0.0 {
                Err(Error::EvalError("negative".into()))
            } else {
                Ok(x.sqrt())
            }
        }
        fn always() -> bool {
            true
        }

        let add = op::<(i64, i64), _>(add);
        assert_eq!(add(vec![val(2), val(3)]).unwrap(), val(5));
        assert_eq!(add(vec![val(2)]).unwrap_err(), Error::arity_error(2, 1));
        assert!(matches!(
            add(vec![val(2), val(1.5)]),
            Err(Error::TypeError(_))
        ));

        let shout = op::<(&str,), _>(shout);
        assert_eq!(shout(vec![val("hi")]).unwrap(), val("HI"));
        assert!(shout(vec![val(["a", "b"])]).is_err());

        let count = op::<(Vector,), _>(count);
        assert_eq!(count(vec![val([true, false, true])]).unwrap(), val(3));

        let checked_sqrt = op::<(f64,), _>(checked_sqrt);
        assert_eq!(checked_sqrt(vec![val(4.0)]).unwrap(), val(2.0));
        assert_eq!(
            checked_sqrt(vec![val(-1.0)]).unwrap_err(),
            Error::EvalError("negative".into())
        );

        let always = op::<(), _>(always);
        assert_eq!(always(vec![]).unwrap(), val(true));
        assert_eq!(always(vec![val(1)]).unwrap_err(), Error::arity_error(0, 1));
    }

    #[test]
    fn test_rest_parameters() {
        fn sum(nums: NumIter<'_>) -> i64 {
            nums.sum()
        }
        fn join(sep: &str, parts: StringIter<'_>) -> String {
            parts.collect::<Vec<_>>().join(sep)
        }
        fn count(rest: ValueIter<'_>) -> i64 {
            rest.len() as i64
        }

        let sum = variadic::<(NumIter<'static>,), _>(sum);
        assert_eq!(sum(vec![]).unwrap(), val(0));
        assert_eq!(sum(vec![val(1), val(2), val(3)]).unwrap(), val(6));
        // Only scalars count
        assert!(sum(vec![val([1, 2])]).is_err());

        let join = variadic::<(&str, StringIter<'static>), _>(join);
        assert_eq!(join(vec![val("-"), val("a"), val("b")]).unwrap(), val("a-b"));
        assert_eq!(join(vec![]).unwrap_err(), Error::arity_error(1, 0));

        let count = variadic::<(ValueIter<'static>,), _>(count);
        assert_eq!(
            count(vec![val(1), val("x"), val(vec![val(1)])]).unwrap(),
            val(3)
        );
    }
}
