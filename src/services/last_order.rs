use dashmap::DashMap;

/// Key-value collaborator remembering the most recent order per caller
/// session, for the "thank you" / last-order convenience lookups. Scoped to
/// an opaque session key supplied by the caller.
pub trait LastOrderStore: Send + Sync {
    fn remember(&self, session_key: &str, order_id: i64);
    fn recall(&self, session_key: &str) -> Option<i64>;
}

/// In-process store. Sufficient for a single instance; a multi-instance
/// deployment would swap in a shared backend behind the same trait.
///
/// Entries are never evicted, so memory grows with the number of distinct
/// session keys seen since startup (one i64 per key). A deployment with an
/// unbounded key population wants a TTL-bearing backend behind the trait
/// instead.
#[derive(Default)]
pub struct InMemoryLastOrderStore {
    entries: DashMap<String, i64>,
}

impl InMemoryLastOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LastOrderStore for InMemoryLastOrderStore {
    fn remember(&self, session_key: &str, order_id: i64) {
        if session_key.is_empty() {
            return;
        }
        self.entries.insert(session_key.to_string(), order_id);
    }

    fn recall(&self, session_key: &str) -> Option<i64> {
        self.entries.get(session_key).map(|entry| *entry.value())
    }
}
