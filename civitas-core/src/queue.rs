use cosmwasm_std::{Order, StdResult, Storage, Timestamp};
use cw_storage_plus::{KeyDeserialize, Map, PrimaryKey};

use crate::keys::QueueTime;

/// Secondary index of records by an absolute deadline.
///
/// Entries are keyed `(QueueTime, K)` with an empty value, so iteration is
/// ascending by deadline and, for equal deadlines, by the encoded `K`.
/// Callers own the primary record and must move the index with it: remove
/// the entry at the old deadline before inserting one at the new deadline.
pub struct TimeQueue<K> {
    entries: Map<(QueueTime, K), ()>,
}

impl<K> TimeQueue<K> {
    pub const fn new(namespace: &'static str) -> Self {
        Self {
            entries: Map::new(namespace),
        }
    }
}

impl<'a, K> TimeQueue<K>
where
    K: PrimaryKey<'a> + KeyDeserialize,
    K::Output: 'static,
{
    pub fn insert(&self, store: &mut dyn Storage, at: Timestamp, key: K) -> StdResult<()> {
        self.entries.save(store, (QueueTime::new(at), key), &())
    }

    pub fn remove(&self, store: &mut dyn Storage, at: Timestamp, key: K) {
        self.entries.remove(store, (QueueTime::new(at), key));
    }

    pub fn contains(&self, store: &dyn Storage, at: Timestamp, key: K) -> bool {
        self.entries.has(store, (QueueTime::new(at), key))
    }

    /// Calls `f` for every entry with deadline `<= now`, in queue order,
    /// until `f` returns `true`.
    pub fn iterate_up_to<F>(&self, store: &dyn Storage, now: Timestamp, mut f: F) -> StdResult<()>
    where
        F: FnMut(Timestamp, K::Output) -> StdResult<bool>,
    {
        let bound = QueueTime::new(now);
        for item in self.entries.keys(store, None, None, Order::Ascending) {
            let (time, key) = item?;
            if time > bound {
                break;
            }
            if f(time.timestamp(), key)? {
                break;
            }
        }
        Ok(())
    }

    /// Snapshot of every entry due at `now`. Collected up front so callers
    /// can mutate the store while processing them.
    pub fn due(&self, store: &dyn Storage, now: Timestamp) -> StdResult<Vec<(Timestamp, K::Output)>> {
        let mut due = vec![];
        self.iterate_up_to(store, now, |time, key| {
            due.push((time, key));
            Ok(false)
        })?;
        Ok(due)
    }

    pub fn entries(&self, store: &dyn Storage) -> StdResult<Vec<(Timestamp, K::Output)>> {
        self.entries
            .keys(store, None, None, Order::Ascending)
            .map(|item| item.map(|(time, key)| (time.timestamp(), key)))
            .collect()
    }
}
