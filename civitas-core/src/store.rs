use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::ops::Bound;

use cosmwasm_std::{DepsMut, Order, Record, Storage};

/// Writes buffered by a [`StoreBranch`], kept in key order so that committing
/// them is deterministic. `None` marks a delete.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChangeSet {
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Applies every buffered write to `store`, in ascending key order.
    pub fn commit(self, store: &mut dyn Storage) {
        for (key, value) in self.writes {
            match value {
                Some(value) => store.set(&key, &value),
                None => store.remove(&key),
            }
        }
    }
}

/// Copy-on-write overlay on top of another store.
///
/// Reads check the overlay first and fall through to the base store. Writes
/// never touch the base until the branch is turned into a [`ChangeSet`] and
/// committed; dropping the branch discards them.
pub struct StoreBranch<'a> {
    base: &'a dyn Storage,
    changes: ChangeSet,
}

impl<'a> StoreBranch<'a> {
    pub fn new(base: &'a dyn Storage) -> Self {
        Self {
            base,
            changes: ChangeSet::default(),
        }
    }

    pub fn into_changes(self) -> ChangeSet {
        self.changes
    }
}

impl Storage for StoreBranch<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.changes.writes.get(key) {
            Some(value) => value.clone(),
            None => self.base.get(key),
        }
    }

    fn range<'b>(
        &'b self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn Iterator<Item = Record> + 'b> {
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                return Box::new(std::iter::empty());
            }
        }

        let lower = start.map_or(Bound::Unbounded, |s| Bound::Included(s.to_vec()));
        let upper = end.map_or(Bound::Unbounded, |e| Bound::Excluded(e.to_vec()));
        let writes = self.changes.writes.range((lower, upper));
        let overlay: Box<dyn Iterator<Item = Write<'b>> + 'b> = match order {
            Order::Ascending => Box::new(writes),
            Order::Descending => Box::new(writes.rev()),
        };

        Box::new(MergedRange {
            base: self.base.range(start, end, order).peekable(),
            overlay: overlay.peekable(),
            descending: matches!(order, Order::Descending),
        })
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.changes
            .writes
            .insert(key.to_vec(), Some(value.to_vec()));
    }

    fn remove(&mut self, key: &[u8]) {
        self.changes.writes.insert(key.to_vec(), None);
    }
}

type Write<'a> = (&'a Vec<u8>, &'a Option<Vec<u8>>);

/// Walks the base range and the overlay side by side. On equal keys the
/// overlay wins; deletes hide the base record.
struct MergedRange<'a> {
    base: Peekable<Box<dyn Iterator<Item = Record> + 'a>>,
    overlay: Peekable<Box<dyn Iterator<Item = Write<'a>> + 'a>>,
    descending: bool,
}

impl Iterator for MergedRange<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            let next = match (self.base.peek(), self.overlay.peek()) {
                (None, None) => return None,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some((base_key, _)), Some((write_key, _))) => {
                    let ord = base_key.as_slice().cmp(write_key.as_slice());
                    if self.descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                }
            };

            match next {
                Ordering::Less => return self.base.next(),
                Ordering::Equal => {
                    self.base.next();
                }
                Ordering::Greater => {}
            }
            if let Some((key, Some(value))) = self.overlay.next() {
                return Some((key.clone(), value.clone()));
            }
        }
    }
}

/// Runs `action` against a branch of `deps.storage`.
///
/// The branch is committed only when `action` returns `Ok`; on `Err` every
/// write it made (including writes by nested branches that already
/// committed into it) is dropped.
pub fn with_branch<T, E, F>(deps: DepsMut, action: F) -> Result<T, E>
where
    F: FnOnce(DepsMut) -> Result<T, E>,
{
    let DepsMut {
        storage,
        api,
        querier,
    } = deps;

    let mut branch = StoreBranch::new(&*storage);
    let out = action(DepsMut {
        storage: &mut branch,
        api,
        querier,
    })?;
    let changes = branch.into_changes();
    changes.commit(storage);
    Ok(out)
}
