use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Round a duration up to the next multiple of `m`.
///
/// The value is first rounded half-up to the nearest multiple; if that
/// rounded down, one more `m` is added. A caller sleeping for the result
/// therefore never wakes before `d` has elapsed, and waiters queued on the
/// same limiter land on regular tick boundaries instead of all releasing
/// at the same instant.
pub fn round_up(d: Duration, m: Duration) -> Duration {
    assert!(!m.is_zero(), "rounding unit must be greater than 0");

    let d_nanos = d.as_nanos();
    let m_nanos = m.as_nanos();

    let mut rounded = (d_nanos + m_nanos / 2) / m_nanos * m_nanos;
    if rounded < d_nanos {
        rounded += m_nanos;
    }

    Duration::new((rounded / NANOS_PER_SEC) as u64, (rounded % NANOS_PER_SEC) as u32)
}
