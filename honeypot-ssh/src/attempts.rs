use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;

/// Per-source-ip login attempt count, persisting across connections from
/// the same peer.
///
/// Scenario 1 in spec §8 opens three *separate* TCP sessions from the same
/// IP, one credential attempt each, and expects the peer banned after the
/// third — so the "three attempts" cap in §4.2 step 5 is tracked per
/// source IP across the listener's lifetime, not reset at the start of
/// each connection. A single connection can still contribute more than one
/// attempt towards that cap if the scanner sends several auth buffers
/// before disconnecting.
pub struct LoginAttemptTracker {
    counts: Mutex<HashMap<IpAddr, u32>>,
}

impl LoginAttemptTracker {
    pub fn new() -> Self {
        LoginAttemptTracker {
            counts: Mutex::new(HashMap::new()),
        }
    }

    /// Records one attempt from `ip`, returning the new cumulative count.
    pub fn record(&self, ip: IpAddr) -> u32 {
        let mut counts = self.counts.lock().expect("attempt tracker lock poisoned");
        let count = counts.entry(ip).or_insert(0);
        *count += 1;
        *count
    }
}

impl Default for LoginAttemptTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_across_calls_for_same_ip() {
        let tracker = LoginAttemptTracker::new();
        let ip: IpAddr = "10.0.0.7".parse().unwrap();
        assert_eq!(tracker.record(ip), 1);
        assert_eq!(tracker.record(ip), 2);
        assert_eq!(tracker.record(ip), 3);
    }

    #[test]
    fn counts_are_independent_per_ip() {
        let tracker = LoginAttemptTracker::new();
        let a: IpAddr = "10.0.0.7".parse().unwrap();
        let b: IpAddr = "10.0.0.8".parse().unwrap();
        assert_eq!(tracker.record(a), 1);
        assert_eq!(tracker.record(b), 1);
    }
}
