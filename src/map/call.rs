//! Call expressions evaluated once per index.
//!
//! A call references its callable and inputs by name and its index by handle.
//! Nothing is copied into it, so its display form stays `(f x[[i]] ...)` no
//! matter how large the inputs are.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::ast::{DOTS, Value, sym};

/// Display label of the loop index in call expressions and traces.
pub const INDEX_LABEL: &str = "i";

/// Loop-owned index cell.
///
/// Clones share the same cell. The label is only used for display; the
/// index is never bound as a name in the evaluation context.
#[derive(Clone)]
pub struct LoopIndex {
    label: Rc<str>,
    cell: Rc<Cell<usize>>,
}

impl LoopIndex {
    pub fn new() -> Self {
        LoopIndex {
            label: Rc::from(INDEX_LABEL),
            cell: Rc::new(Cell::new(0)),
        }
    }

    /// Current 1-based position. Zero before the loop starts.
    pub fn get(&self) -> usize {
        self.cell.get()
    }

    pub(crate) fn set(&self, index: usize) {
        self.cell.set(index);
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for LoopIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for LoopIndex {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl fmt::Debug for LoopIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LoopIndex({}={})", self.label, self.get())
    }
}

/// Index operand of an element access.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexRef {
    /// Fixed 1-based position, used for a recycled length 1 input
    Constant(usize),
    /// Whatever position the loop is currently at
    Loop(LoopIndex),
}

impl IndexRef {
    /// The 1-based position this operand refers to right now.
    pub fn current(&self) -> usize {
        match self {
            IndexRef::Constant(n) => *n,
            IndexRef::Loop(index) => index.get(),
        }
    }
}

impl fmt::Display for IndexRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexRef::Constant(n) => write!(f, "{n}"),
            IndexRef::Loop(index) => write!(f, "{}", index.label()),
        }
    }
}

fn access(sequence: &str, index: IndexRef) -> Value {
    Value::Element {
        sequence: sequence.to_owned(),
        index,
    }
}

/// Build `(f x[[i]] ...)`.
pub fn build_single(sequence_name: &str, index: &LoopIndex, callable_name: &str) -> Value {
    Value::List(vec![
        sym(callable_name),
        access(sequence_name, IndexRef::Loop(index.clone())),
        sym(DOTS),
    ])
}

/// Build `(f x[[ix]] y[[iy]] ...)`. A scalar side is pinned to position 1.
pub fn build_pair(
    x_name: &str,
    y_name: &str,
    index: &LoopIndex,
    callable_name: &str,
    x_is_scalar: bool,
    y_is_scalar: bool,
) -> Value {
    let operand = |scalar: bool| {
        if scalar {
            IndexRef::Constant(1)
        } else {
            IndexRef::Loop(index.clone())
        }
    };

    Value::List(vec![
        sym(callable_name),
        access(x_name, operand(x_is_scalar)),
        access(y_name, operand(y_is_scalar)),
        sym(DOTS),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_display() {
        let index = LoopIndex::new();
        let test_cases = [
            (build_single("x", &index, "f"), "(f x[[i]] ...)"),
            (
                build_pair("x", "y", &index, "+", false, false),
                "(+ x[[i]] y[[i]] ...)",
            ),
            (
                build_pair("x", "y", &index, "+", false, true),
                "(+ x[[i]] y[[1]] ...)",
            ),
            (
                build_pair(".x", ".y", &index, "g", true, false),
                "(g .x[[1]] .y[[i]] ...)",
            ),
        ];

        for (expr, expected) in test_cases {
            assert_eq!(expr.to_string(), expected);
        }
    }

    #[test]
    fn test_call_tracks_index_by_handle() {
        let index = LoopIndex::new();
        let call = build_pair("x", "y", &index, "f", false, true);
        let Value::List(items) = &call else {
            panic!("expected a call form, got {call:?}");
        };
        let positions = || -> Vec<usize> {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Element { index, .. } => Some(index.current()),
                    _ => None,
                })
                .collect()
        };

        assert_eq!(positions(), vec![0, 1]);
        index.set(3);
        assert_eq!(positions(), vec![3, 1]);
        // Same expression, only the cell moved
        assert_eq!(call, build_pair("x", "y", &index, "f", false, true));
    }

    #[test]
    fn test_loop_indices_are_distinct() {
        let a = LoopIndex::new();
        let b = LoopIndex::new();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.label(), INDEX_LABEL);
    }
}
