//! This module defines the core value types of the reference host. The main enum,
//! [`Value`], covers typed vectors (scalars are vectors of length 1), symbols,
//! unevaluated call forms, by-name element access, forwarded arguments and functions.
//! [`Vector`] pairs a typed [`Elements`] store with optional name metadata, and
//! [`Kind`] is the closed set of element kinds a vector (or a declared map result)
//! can have. Conversion traits from Rust literals, arrays and vectors make it easy to
//! build values in code and tests.

use std::fmt;
use std::sync::Arc;

use crate::Error;
use crate::evaluator::intooperation::OperationFn;
use crate::map::IndexRef;

/// Type alias for integer values in interpreter
pub(crate) type NumberType = i64;

/// Type alias for floating-point values in interpreter
pub(crate) type FloatType = f64;

/// Allowed non-alphanumeric characters in symbol names
/// "." is allowed so that `...` and dotted names such as `.x` are symbols
#[cfg_attr(not(feature = "scheme"), expect(dead_code))]
pub(crate) const SYMBOL_SPECIAL_CHARS: &str = "+-*/<>=!?_$.";

/// Symbol that forwards the extra arguments of the calling frame
pub(crate) const DOTS: &str = "...";

/// Check if a string is a valid symbol name
/// Valid: non-empty, no leading digit, no "-digit" prefix, alphanumeric + SYMBOL_SPECIAL_CHARS
#[cfg_attr(not(feature = "scheme"), expect(dead_code))]
pub(crate) fn is_valid_symbol(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        None => false, // name is empty
        Some(first_char) => {
            if first_char.is_ascii_digit() {
                return false;
            }

            if first_char == '-'
                && let Some(second_char) = chars.next()
                && second_char.is_ascii_digit()
            {
                return false;
            }

            name.chars()
                .all(|c| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c))
        }
    }
}

/// Element kind of a vector, and the declared kind of a map result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Boolean,
    Integer,
    Float,
    Text,
    /// Heterogeneous elements, stored as-is
    Opaque,
}

impl Kind {
    /// Canonical type name, as used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Kind::Boolean => "logical",
            Kind::Integer => "integer",
            Kind::Float => "double",
            Kind::Text => "character",
            Kind::Opaque => "list",
        }
    }

    /// Look up a kind by its runtime name. Unrecognized names yield `None`.
    pub fn from_name(name: &str) -> Option<Kind> {
        match name {
            "logical" | "boolean" => Some(Kind::Boolean),
            "integer" => Some(Kind::Integer),
            "double" | "float" => Some(Kind::Float),
            "character" | "text" => Some(Kind::Text),
            "list" | "any" => Some(Kind::Opaque),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::from_name(s).ok_or_else(|| Error::UnsupportedKind(s.to_owned()))
    }
}

/// Typed element storage of a vector
#[derive(Debug, Clone, PartialEq)]
pub enum Elements {
    Boolean(Vec<bool>),
    Integer(Vec<NumberType>),
    Float(Vec<FloatType>),
    Text(Vec<String>),
    Opaque(Vec<Value>),
}

impl Elements {
    /// Empty storage of the given kind with room for `capacity` elements
    pub fn with_capacity(kind: Kind, capacity: usize) -> Self {
        match kind {
            Kind::Boolean => Elements::Boolean(Vec::with_capacity(capacity)),
            Kind::Integer => Elements::Integer(Vec::with_capacity(capacity)),
            Kind::Float => Elements::Float(Vec::with_capacity(capacity)),
            Kind::Text => Elements::Text(Vec::with_capacity(capacity)),
            Kind::Opaque => Elements::Opaque(Vec::with_capacity(capacity)),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Elements::Boolean(_) => Kind::Boolean,
            Elements::Integer(_) => Kind::Integer,
            Elements::Float(_) => Kind::Float,
            Elements::Text(_) => Kind::Text,
            Elements::Opaque(_) => Kind::Opaque,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Elements::Boolean(items) => items.len(),
            Elements::Integer(items) => items.len(),
            Elements::Float(items) => items.len(),
            Elements::Text(items) => items.len(),
            Elements::Opaque(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append all of `other` to this storage. Both must have the same kind.
    pub fn append(&mut self, other: Elements) -> Result<(), Error> {
        match (self, other) {
            (Elements::Boolean(out), Elements::Boolean(items)) => out.extend(items),
            (Elements::Integer(out), Elements::Integer(items)) => out.extend(items),
            (Elements::Float(out), Elements::Float(items)) => out.extend(items),
            (Elements::Text(out), Elements::Text(items)) => out.extend(items),
            (Elements::Opaque(out), Elements::Opaque(items)) => out.extend(items),
            (out, items) => {
                return Err(Error::TypeError(format!(
                    "cannot combine {} with {} (no type coercion)",
                    out.kind(),
                    items.kind()
                )));
            }
        }
        Ok(())
    }

    /// Zero-based element access. Atomic elements come back as length 1 vectors,
    /// opaque elements as the stored value.
    fn get(&self, index: usize) -> Option<Value> {
        match self {
            Elements::Boolean(items) => items.get(index).map(|b| Value::from(*b)),
            Elements::Integer(items) => items.get(index).map(|n| Value::from(*n)),
            Elements::Float(items) => items.get(index).map(|x| Value::from(*x)),
            Elements::Text(items) => items.get(index).map(|s| Value::from(s.as_str())),
            Elements::Opaque(items) => items.get(index).cloned(),
        }
    }
}

/// A typed sequence with optional name metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    elements: Elements,
    names: Option<Vec<String>>,
}

impl Vector {
    pub fn new(elements: Elements) -> Self {
        Vector {
            elements,
            names: None,
        }
    }

    pub fn empty(kind: Kind) -> Self {
        Vector::new(Elements::with_capacity(kind, 0))
    }

    pub fn kind(&self) -> Kind {
        self.elements.kind()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    pub fn into_elements(self) -> Elements {
        self.elements
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    /// Replace the name metadata. Names must be parallel to the elements.
    pub fn set_names(&mut self, names: Option<Vec<String>>) -> Result<(), Error> {
        if let Some(labels) = &names
            && labels.len() != self.len()
        {
            return Err(Error::EvalError(format!(
                "'names' attribute [{}] must be the same length as the vector [{}]",
                labels.len(),
                self.len()
            )));
        }
        self.names = names;
        Ok(())
    }

    /// Builder-style variant of [`Vector::set_names`]
    pub fn with_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self, Error> {
        self.set_names(Some(names.into_iter().map(Into::into).collect()))?;
        Ok(self)
    }

    /// One-based element access (`x[[i]]`). Names are not carried over.
    pub fn element(&self, index: usize) -> Result<Value, Error> {
        index
            .checked_sub(1)
            .and_then(|zero_based| self.elements.get(zero_based))
            .ok_or_else(|| {
                Error::EvalError(format!(
                    "subscript out of bounds: {index} (length {})",
                    self.len()
                ))
            })
    }
}

impl From<Elements> for Vector {
    fn from(elements: Elements) -> Self {
        Vector::new(elements)
    }
}

/// Rust element types that can be collected into a typed vector
pub trait VectorElement: Sized {
    fn collect_elements(items: Vec<Self>) -> Elements;
}

impl VectorElement for bool {
    fn collect_elements(items: Vec<Self>) -> Elements {
        Elements::Boolean(items)
    }
}

impl VectorElement for NumberType {
    fn collect_elements(items: Vec<Self>) -> Elements {
        Elements::Integer(items)
    }
}

impl VectorElement for i32 {
    fn collect_elements(items: Vec<Self>) -> Elements {
        Elements::Integer(items.into_iter().map(NumberType::from).collect())
    }
}

impl VectorElement for FloatType {
    fn collect_elements(items: Vec<Self>) -> Elements {
        Elements::Float(items)
    }
}

impl VectorElement for String {
    fn collect_elements(items: Vec<Self>) -> Elements {
        Elements::Text(items)
    }
}

impl VectorElement for &str {
    fn collect_elements(items: Vec<Self>) -> Elements {
        Elements::Text(items.into_iter().map(str::to_owned).collect())
    }
}

impl VectorElement for Value {
    fn collect_elements(items: Vec<Self>) -> Elements {
        Elements::Opaque(items)
    }
}

impl<T: VectorElement> From<Vec<T>> for Vector {
    fn from(items: Vec<T>) -> Self {
        Vector::new(T::collect_elements(items))
    }
}

impl<T: VectorElement, const N: usize> From<[T; N]> for Vector {
    fn from(items: [T; N]) -> Self {
        Vector::new(T::collect_elements(items.into()))
    }
}

/// Core value type in interpreter
///
/// To build values, use the ergonomic helper functions:
/// - `val(42)` for scalars, `sym("name")` for symbols
/// - `val([1, 2, 3])` for typed vectors
/// - `val(vec![val(1), val("a")])` for opaque lists
#[derive(Clone)]
pub enum Value {
    /// Typed sequence; scalars are vectors of length 1
    Vector(Vector),
    /// Symbols (identifiers)
    Symbol(String),
    /// Unevaluated call form: operator followed by argument expressions
    List(Vec<Value>),
    /// Element access `sequence[[index]]`, with the sequence referenced by name
    Element { sequence: String, index: IndexRef },
    /// Arguments forwarded through `...`
    Dots(Vec<Value>),
    /// Built-in functions
    /// Uses id string for equality comparison instead of function pointer
    BuiltinFunction {
        id: String,
        func: Arc<OperationFn>,
    },
    /// User-defined functions (params, body, closure env)
    Function {
        params: Vec<String>,
        body: Box<Value>,
        env: crate::evaluator::Environment,
    },
    /// Unspecified values (e.g., return value of define)
    /// These values never equal themselves or any other value
    Unspecified,
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Vector(v) => match v.names() {
                Some(names) => write!(f, "Vector({v}, names={names:?})"),
                None => write!(f, "Vector({v})"),
            },
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::List(list) => {
                write!(f, "List(")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:?}")?;
                }
                write!(f, ")")
            }
            Value::Element { sequence, index } => write!(f, "Element({sequence}[[{index}]])"),
            Value::Dots(values) => write!(f, "Dots({values:?})"),
            Value::BuiltinFunction { id, .. } => write!(f, "BuiltinFunction({id})"),
            Value::Function { params, body, .. } => {
                write!(f, "Function(params={params:?}, body={body:?})")
            }
            Value::Unspecified => write!(f, "Unspecified"),
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Vector(Vector::from([s]))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Vector(Vector::from([s]))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Vector(Vector::from([b]))
    }
}

impl From<FloatType> for Value {
    fn from(x: FloatType) -> Self {
        Value::Vector(Vector::from([x]))
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Vector(Vector::from([NumberType::from(n)]))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl From<Vector> for Value {
    fn from(v: Vector) -> Self {
        Value::Vector(v)
    }
}

impl<T: VectorElement> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Vector(v.into())
    }
}

impl<T: VectorElement, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::Vector(arr.into())
    }
}

// Fallible conversions from length 1 vectors back into primitive Rust types.

impl std::convert::TryInto<NumberType> for Value {
    type Error = Error;

    fn try_into(self) -> Result<NumberType, Error> {
        if let Some(Elements::Integer(items)) = self.as_scalar()
            && let [n] = items.as_slice()
        {
            Ok(*n)
        } else {
            Err(Error::TypeError(format!(
                "expected integer scalar, got {}",
                self.describe()
            )))
        }
    }
}

impl std::convert::TryInto<FloatType> for Value {
    type Error = Error;

    fn try_into(self) -> Result<FloatType, Error> {
        if let Some(Elements::Float(items)) = self.as_scalar()
            && let [x] = items.as_slice()
        {
            Ok(*x)
        } else {
            Err(Error::TypeError(format!(
                "expected double scalar, got {}",
                self.describe()
            )))
        }
    }
}

impl std::convert::TryInto<bool> for Value {
    type Error = Error;

    fn try_into(self) -> Result<bool, Error> {
        self.as_bool().ok_or_else(|| {
            Error::TypeError(format!("expected logical scalar, got {}", self.describe()))
        })
    }
}

impl std::convert::TryInto<Vector> for Value {
    type Error = Error;

    fn try_into(self) -> Result<Vector, Error> {
        match self {
            Value::Vector(v) => Ok(v),
            other => Err(Error::TypeError(format!(
                "expected a vector, got {}",
                other.type_name()
            ))),
        }
    }
}

impl std::convert::TryInto<String> for Value {
    type Error = Error;

    fn try_into(self) -> Result<String, Error> {
        let found = self.describe();
        if let Value::Vector(v) = self
            && let Elements::Text(mut items) = v.into_elements()
            && items.len() == 1
            && let Some(s) = items.pop()
        {
            Ok(s)
        } else {
            Err(Error::TypeError(format!(
                "expected character scalar, got {found}"
            )))
        }
    }
}

/// Helper function for creating symbols
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values - works great in mixed lists!
/// Accepts any type that can be converted to Value
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

fn fmt_text(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in s.chars() {
        match ch {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

fn fmt_items<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    mut fmt_item: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        fmt_item(f, item)?;
    }
    Ok(())
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Elements::Opaque(items) = &self.elements {
            write!(f, "(list")?;
            for item in items {
                write!(f, " {item}")?;
            }
            return write!(f, ")");
        }

        // Length 1 vectors print as bare literals, longer ones as (c ...)
        match self.len() {
            0 => return write!(f, "{}(0)", self.kind()),
            1 => {}
            _ => write!(f, "(c ")?,
        }
        match &self.elements {
            Elements::Boolean(items) => fmt_items(f, items, |f, b| {
                write!(f, "{}", if *b { "#t" } else { "#f" })
            })?,
            Elements::Integer(items) => fmt_items(f, items, |f, n| write!(f, "{n}"))?,
            Elements::Float(items) => fmt_items(f, items, |f, x| write!(f, "{x:?}"))?,
            Elements::Text(items) => fmt_items(f, items, |f, s| fmt_text(f, s))?,
            Elements::Opaque(_) => {}
        }
        if self.len() > 1 { write!(f, ")") } else { Ok(()) }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Vector(v) => write!(f, "{v}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::List(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
            Value::Element { sequence, index } => write!(f, "{sequence}[[{index}]]"),
            Value::Dots(values) => write!(f, "#<dots:{}>", values.len()),
            Value::BuiltinFunction { id, .. } => write!(f, "#<builtin-function:{id}>"),
            Value::Function { .. } => write!(f, "#<function>"),
            Value::Unspecified => write!(f, "#<unspecified>"),
        }
    }
}

impl Value {
    /// The sequence behind this value, if it is one
    pub fn as_sequence(&self) -> Option<&Vector> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Elements of a length 1 atomic vector
    fn as_scalar(&self) -> Option<&Elements> {
        self.as_sequence()
            .filter(|v| v.len() == 1 && v.kind() != Kind::Opaque)
            .map(Vector::elements)
    }

    /// The value of a length 1 logical vector
    pub(crate) fn as_bool(&self) -> Option<bool> {
        match self.as_scalar() {
            Some(Elements::Boolean(items)) => items.first().copied(),
            _ => None,
        }
    }

    /// Type label used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Vector(v) => v.kind().name(),
            Value::Symbol(_) => "symbol",
            Value::List(_) | Value::Element { .. } => "language",
            Value::Dots(_) => "...",
            Value::BuiltinFunction { .. } => "builtin",
            Value::Function { .. } => "closure",
            Value::Unspecified => "NULL",
        }
    }

    /// Type and, for sequences, length of this value
    pub fn describe(&self) -> String {
        match self {
            Value::Vector(v) => format!("{} of length {}", v.kind(), v.len()),
            other => other.type_name().to_owned(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (
                Value::Element {
                    sequence: s1,
                    index: i1,
                },
                Value::Element {
                    sequence: s2,
                    index: i2,
                },
            ) => s1 == s2 && i1 == i2,
            (Value::Dots(a), Value::Dots(b)) => a == b,
            (Value::BuiltinFunction { id: id1, .. }, Value::BuiltinFunction { id: id2, .. }) => {
                // Compare BuiltinFunctions by id string, not function pointer
                id1 == id2
            }
            (
                Value::Function {
                    params: p1,
                    body: b1,
                    env: e1,
                },
                Value::Function {
                    params: p2,
                    body: b2,
                    env: e2,
                },
            ) => p1 == p2 && b1 == b2 && e1 == e2,
            (Value::Unspecified, _) | (_, Value::Unspecified) => false, // Unspecified never equals anything
            _ => false, // Different variants are never equal
        }
    }
}
