//! Monotonic wall-clock readings.
//!
//! Session and gallery identifiers are derived from a millisecond clock
//! reading. The raw system clock can repeat a value when read twice within
//! one millisecond (or step backwards under NTP adjustment), so readings are
//! forced through a process-wide high-water mark.

use std::sync::atomic::{AtomicU64, Ordering};

static LAST_MILLIS: AtomicU64 = AtomicU64::new(0);

/// Returns the current Unix time in milliseconds, strictly greater than any
/// previous reading from this process.
pub fn monotonic_millis() -> u64 {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let mut prev = LAST_MILLIS.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(prev + 1);
        match LAST_MILLIS.compare_exchange_weak(
            prev,
            candidate,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(observed) => prev = observed,
        }
    }
}

/// Returns the current time as an RFC 3339 timestamp string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_are_strictly_increasing() {
        let mut last = 0;
        for _ in 0..1000 {
            let next = monotonic_millis();
            assert!(next > last);
            last = next;
        }
    }
}
