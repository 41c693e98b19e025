//! Epoch clock helpers
//!
//! Wire timestamps come in three granularities: milliseconds (long header
//! expiration, delivery status), whole seconds (short header expiration)
//! and whole hours (build request time). All are read from the system
//! clock at call time; this core imposes no deadlines of its own.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn millis_since_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Whole seconds since the Unix epoch.
pub fn seconds_since_epoch() -> u64 {
    millis_since_epoch() / 1000
}

/// Whole hours since the Unix epoch, as carried in build request records.
pub fn hours_since_epoch() -> u32 {
    (millis_since_epoch() / 3_600_000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granularities_agree() {
        let ms = millis_since_epoch();
        let secs = seconds_since_epoch();
        let hours = hours_since_epoch();

        // Coarser units never run ahead of finer ones.
        assert!(secs <= ms / 1000 + 1);
        assert!(u64::from(hours) <= secs / 3600 + 1);
        // Sanity: we are past 2020.
        assert!(ms > 1_577_836_800_000);
    }
}
