//! In-flight write tracking.
//!
//! A write cannot be retracted once sent, so the only protection against
//! duplicates is refusing to initiate a second one for the same action
//! while the first is still pending.

use alloy_primitives::Address;
use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

/// One logical on-chain action
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WriteKey {
    /// Deploying a new game from this account
    Deploy(Address),
    /// Calling `function` on a deployed game
    Call {
        contract: Address,
        function: &'static str,
    },
}

impl fmt::Display for WriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteKey::Deploy(_) => write!(f, "deploy"),
            WriteKey::Call { function, .. } => write!(f, "{function}"),
        }
    }
}

#[derive(Default)]
pub struct PendingWrites {
    in_flight: Mutex<HashSet<WriteKey>>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as in flight. `None` when it already is.
    pub fn begin(&self, key: WriteKey) -> Option<PendingGuard<'_>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        if !in_flight.insert(key.clone()) {
            return None;
        }
        Some(PendingGuard { owner: self, key })
    }

    pub fn is_pending(&self, key: &WriteKey) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(key)
    }
}

/// Releases its key when dropped, whether the write succeeded or not
pub struct PendingGuard<'a> {
    owner: &'a PendingWrites,
    key: WriteKey,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.owner
            .in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_key() -> WriteKey {
        WriteKey::Call {
            contract: Address::repeat_byte(1),
            function: "play",
        }
    }

    #[test]
    fn test_duplicate_write_is_refused() {
        let pending = PendingWrites::new();
        let guard = pending.begin(play_key());
        assert!(guard.is_some());
        assert!(pending.begin(play_key()).is_none());
        assert!(pending.is_pending(&play_key()));
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let pending = PendingWrites::new();
        drop(pending.begin(play_key()));
        assert!(!pending.is_pending(&play_key()));
        assert!(pending.begin(play_key()).is_some());
    }

    #[test]
    fn test_distinct_actions_do_not_block() {
        let pending = PendingWrites::new();
        let _play = pending.begin(play_key()).unwrap();
        let other = WriteKey::Call {
            contract: Address::repeat_byte(1),
            function: "j2Timeout",
        };
        assert!(pending.begin(other).is_some());
        assert!(pending.begin(WriteKey::Deploy(Address::repeat_byte(1))).is_some());
    }
}
