use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Process-wide `source_ip -> epoch_seconds_when_ban_lifts` map.
///
/// Single-writer (the supervisor, on `ban()`), many-reader (session
/// admission, on `is_banned()`). Expired entries are evicted lazily on
/// next lookup, per spec §3/§4.1.
pub struct BanTable {
    entries: Mutex<HashMap<IpAddr, u64>>,
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl BanTable {
    pub fn new() -> Self {
        BanTable {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Records `ip` as banned until `now + ttl_secs`.
    pub fn ban(&self, ip: IpAddr, ttl_secs: u64) {
        let expiry = now_epoch_secs() + ttl_secs;
        let mut entries = self.entries.lock().expect("ban table lock poisoned");
        entries.insert(ip, expiry);
    }

    /// Returns true if `ip` is currently banned, evicting the entry if its
    /// ban has already lifted.
    pub fn is_banned(&self, ip: IpAddr) -> bool {
        let mut entries = self.entries.lock().expect("ban table lock poisoned");
        match entries.get(&ip) {
            Some(&expiry) if expiry > now_epoch_secs() => true,
            Some(_) => {
                entries.remove(&ip);
                false
            }
            None => false,
        }
    }

    /// The epoch-second expiry for `ip`, if currently banned. Used by tests
    /// to assert the expiry window.
    pub fn expiry_of(&self, ip: IpAddr) -> Option<u64> {
        let entries = self.entries.lock().expect("ban table lock poisoned");
        entries.get(&ip).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("ban table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BanTable {
    fn default() -> Self {
        Self::new()
    }
}
