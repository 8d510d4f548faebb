use tracing::{debug, trace};

use crate::Error;
use crate::ast::{Elements, Kind, Value, Vector};
use crate::context::EvalContext;
use crate::map::LoopIndex;

/// Evaluate `call` for index = 1..=n and collect the results.
///
/// The output is allocated before the first evaluation, so an unknown kind
/// fails even when `n` is zero. Each result must be a length 1 vector of
/// exactly the declared kind unless that kind is opaque.
pub fn run<C: EvalContext + ?Sized>(
    ctx: &mut C,
    call: &Value,
    index: &LoopIndex,
    n: usize,
    result_kind: &str,
) -> Result<Vector, Error> {
    let kind: Kind = result_kind.parse()?;
    let mut out = Elements::with_capacity(kind, n);

    index.set(1);
    for i in 1..=n {
        index.set(i);
        trace!(index = i, call = %call, "evaluating");

        let result = ctx.evaluate(call)?;
        store(&mut out, kind, i, result)?;
    }

    Ok(Vector::new(out))
}

fn store(out: &mut Elements, kind: Kind, index: usize, result: Value) -> Result<(), Error> {
    match (out, result) {
        (Elements::Opaque(items), result) => {
            items.push(result);
            Ok(())
        }
        (out, Value::Vector(v)) if v.len() == 1 && v.kind() == kind => {
            out.append(v.into_elements())
        }
        (_, result) => {
            let found = result.describe();
            debug!(index, expected = %kind, found = %found, "result shape violation");
            Err(Error::ResultShapeViolation {
                index,
                expected: kind,
                found,
            })
        }
    }
}
