//! Terminal values for stepped integer ranges.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundError {
    ZeroStep,
    Overflow,
}

/// The value reached by repeatedly adding `step` to `from` right after the
/// last index that does not pass `to`.
///
/// An empty range (`from` already past `to` in the stepping direction) yields
/// `from` itself, so the loop runs zero times.
pub fn stop_bound(from: i64, to: i64, step: i64) -> Result<i64, BoundError> {
    match step {
        0 => Err(BoundError::ZeroStep),
        1 => Ok(from.max(to.checked_add(1).ok_or(BoundError::Overflow)?)),
        -1 => Ok(from.min(to.checked_sub(1).ok_or(BoundError::Overflow)?)),
        step if step > 1 => {
            let dist = to
                .checked_sub(from)
                .and_then(|d| d.checked_add(step))
                .ok_or(BoundError::Overflow)?
                .max(0);
            from.checked_add(dist - dist.rem_euclid(step))
                .ok_or(BoundError::Overflow)
        }
        step => {
            let magnitude = step.checked_abs().ok_or(BoundError::Overflow)?;
            let dist = from
                .checked_sub(to)
                .and_then(|d| d.checked_add(magnitude))
                .ok_or(BoundError::Overflow)?
                .max(0);
            from.checked_sub(dist - dist.rem_euclid(magnitude))
                .ok_or(BoundError::Overflow)
        }
    }
}
