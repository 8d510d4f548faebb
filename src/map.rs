//! Vectorized evaluation of a callable over one or two named sequences.
//!
//! `map` evaluates `(f x[[i]] ...)` once for every position of `x` and
//! `map_pair` evaluates `(f x[[i]] y[[i]] ...)` over two sequences, pinning a
//! length 1 side to its only element. Every result must be a length 1 vector
//! of exactly the declared kind (the `list` kind takes anything). The output
//! carries the names of the first input.
//!
//! ```
//! # #[cfg(feature = "scheme")]
//! # {
//! use mapxp::ast::Vector;
//! use mapxp::evaluator::{create_global_env, eval};
//! use mapxp::scheme::parse_scheme;
//!
//! let mut env = create_global_env();
//! env.define("x", Vector::from([10, 20, 30]).into());
//! let double = eval(&parse_scheme("(lambda (v) (* v 2))").unwrap(), &mut env).unwrap();
//! env.define("double", double);
//!
//! let out = mapxp::map(&mut env, "x", "double", "integer").unwrap();
//! assert_eq!(out, Vector::from([20, 40, 60]));
//! # }
//! ```

use tracing::debug;

use crate::Error;
use crate::ast::Vector;
use crate::context::EvalContext;

mod call;
mod call_loop;
mod recycle;

pub use call::{INDEX_LABEL, IndexRef, LoopIndex, build_pair, build_single};
pub use call_loop::run;
pub use recycle::Recycling;

/// Apply the callable bound to `callable_name` to each element of the
/// sequence bound to `sequence_name`.
///
/// `result_kind` names the element kind every result must have
/// (`logical`, `integer`, `double`, `character` or `list`).
pub fn map<C: EvalContext + ?Sized>(
    ctx: &mut C,
    sequence_name: &str,
    callable_name: &str,
    result_kind: &str,
) -> Result<Vector, Error> {
    let (n, names) = resolve_sequence(ctx, sequence_name, ".x")?;
    debug!(
        sequence = sequence_name,
        callable = callable_name,
        n,
        kind = result_kind,
        "map"
    );

    let index = LoopIndex::new();
    let call = build_single(sequence_name, &index, callable_name);
    let out = run(ctx, &call, &index, n, result_kind)?;
    with_names(out, names)
}

/// Apply the callable to the elements of two sequences in parallel.
///
/// The sequences must have equal lengths, or one of them must have length 1,
/// in which case its only element is passed on every call.
pub fn map_pair<C: EvalContext + ?Sized>(
    ctx: &mut C,
    x_name: &str,
    y_name: &str,
    callable_name: &str,
    result_kind: &str,
) -> Result<Vector, Error> {
    let (len_x, names) = resolve_sequence(ctx, x_name, ".x")?;
    let (len_y, _) = resolve_sequence(ctx, y_name, ".y")?;

    let plan = Recycling::resolve(len_x, len_y)?;
    debug!(
        x = x_name,
        y = y_name,
        callable = callable_name,
        n = plan.n,
        kind = result_kind,
        "map_pair"
    );
    if plan.recycles() {
        debug!(
            len_x,
            len_y,
            x_is_scalar = plan.x_is_scalar,
            y_is_scalar = plan.y_is_scalar,
            "recycling length 1 input"
        );
    }

    let index = LoopIndex::new();
    let call = build_pair(
        x_name,
        y_name,
        &index,
        callable_name,
        plan.x_is_scalar,
        plan.y_is_scalar,
    );
    let out = run(ctx, &call, &index, plan.n, result_kind)?;
    with_names(out, names)
}

/// Length and names of the sequence bound to `name`. `arg` is the label
/// used in diagnostics.
fn resolve_sequence<C: EvalContext + ?Sized>(
    ctx: &C,
    name: &str,
    arg: &str,
) -> Result<(usize, Option<Vec<String>>), Error> {
    let value = ctx
        .lookup(name)
        .ok_or_else(|| Error::UnboundVariable(name.to_owned()))?;
    let Some(sequence) = value.as_sequence() else {
        return Err(Error::NotASequence {
            arg: arg.to_owned(),
            found: value.type_name().to_owned(),
        });
    };
    Ok((sequence.len(), sequence.names().map(<[String]>::to_vec)))
}

/// Copy the first input's names onto the output. A recycled length 1 input
/// names the first position; the rest get `""`.
fn with_names(mut out: Vector, names: Option<Vec<String>>) -> Result<Vector, Error> {
    if let Some(mut names) = names {
        names.resize(out.len(), String::new());
        out.set_names(Some(names))?;
    }
    Ok(out)
}
