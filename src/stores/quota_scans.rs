use crate::models::quota_scan::QuotaScan;
use crate::utils::time::current_timestamp_millis;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Usernames with a quota rescan in flight.
///
/// `claim` is a single atomic test-and-insert on the map shard, so two
/// concurrent callers for the same username can never both succeed.
#[derive(Debug, Default)]
pub struct QuotaScanRegistry {
    scans: DashMap<String, i64>,
}

impl QuotaScanRegistry {
    pub fn new() -> Self {
        Self {
            scans: DashMap::new(),
        }
    }

    /// Try to start a scan for `username`.
    ///
    /// Returns false, leaving the existing claim untouched, if a scan is
    /// already running.
    pub fn claim(&self, username: &str) -> bool {
        match self.scans.entry(username.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(current_timestamp_millis());
                true
            }
        }
    }

    /// Drop the claim for `username`. Releasing an unclaimed name is a no-op.
    pub fn release(&self, username: &str) {
        self.scans.remove(username);
    }

    pub fn is_scanning(&self, username: &str) -> bool {
        self.scans.contains_key(username)
    }

    /// Active scans ordered by start time, then username.
    pub fn list(&self) -> Vec<QuotaScan> {
        let mut scans: Vec<QuotaScan> = self
            .scans
            .iter()
            .map(|entry| QuotaScan {
                username: entry.key().clone(),
                start_time: *entry.value(),
            })
            .collect();
        scans.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.username.cmp(&b.username))
        });
        scans
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }
}
