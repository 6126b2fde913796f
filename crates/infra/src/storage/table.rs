use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use stockroom_core::{DomainError, DomainResult, Entity};

/// In-memory table keyed by entity id.
///
/// Rows remember the order they were inserted in; `list` returns them in
/// that order, and updates keep a row's original position.
#[derive(Debug)]
pub struct InMemoryTable<V: Entity> {
    inner: RwLock<Rows<V>>,
}

#[derive(Debug)]
struct Rows<V: Entity> {
    index: HashMap<V::Id, u64>,
    by_seq: BTreeMap<u64, V>,
    next_seq: u64,
}

impl<V: Entity> InMemoryTable<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Rows {
                index: HashMap::new(),
                by_seq: BTreeMap::new(),
                next_seq: 0,
            }),
        }
    }
}

impl<V: Entity> Default for InMemoryTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(kind: &str) -> DomainError {
    DomainError::storage(format!("{kind} table lock poisoned"))
}

impl<V> InMemoryTable<V>
where
    V: Entity + Clone,
{
    pub fn get(&self, id: &V::Id) -> DomainResult<Option<V>> {
        let rows = self.inner.read().map_err(|_| poisoned(V::KIND))?;
        Ok(rows
            .index
            .get(id)
            .and_then(|seq| rows.by_seq.get(seq))
            .cloned())
    }

    /// Insert a new row; an existing id is a `Conflict`.
    pub fn insert(&self, value: V) -> DomainResult<()> {
        let mut rows = self.inner.write().map_err(|_| poisoned(V::KIND))?;
        let id = *value.id();
        if rows.index.contains_key(&id) {
            return Err(DomainError::conflict(format!("{} {id} already exists", V::KIND)));
        }
        let seq = rows.next_seq;
        rows.next_seq += 1;
        rows.index.insert(id, seq);
        rows.by_seq.insert(seq, value);
        Ok(())
    }

    /// Replace an existing row in place; a missing id is `NotFound`.
    pub fn update(&self, value: V) -> DomainResult<()> {
        let mut rows = self.inner.write().map_err(|_| poisoned(V::KIND))?;
        let id = *value.id();
        let seq = *rows
            .index
            .get(&id)
            .ok_or_else(|| DomainError::not_found(V::KIND, id))?;
        rows.by_seq.insert(seq, value);
        Ok(())
    }

    /// Returns `false` when the id was unknown.
    pub fn delete(&self, id: &V::Id) -> DomainResult<bool> {
        let mut rows = self.inner.write().map_err(|_| poisoned(V::KIND))?;
        match rows.index.remove(id) {
            Some(seq) => {
                rows.by_seq.remove(&seq);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Rows matching `pred`, in insertion order.
    pub fn list(&self, pred: impl Fn(&V) -> bool) -> DomainResult<Vec<V>> {
        let rows = self.inner.read().map_err(|_| poisoned(V::KIND))?;
        Ok(rows.by_seq.values().filter(|v| pred(v)).cloned().collect())
    }

    pub fn count(&self, pred: impl Fn(&V) -> bool) -> DomainResult<usize> {
        let rows = self.inner.read().map_err(|_| poisoned(V::KIND))?;
        Ok(rows.by_seq.values().filter(|v| pred(v)).count())
    }

    pub fn len(&self) -> DomainResult<usize> {
        let rows = self.inner.read().map_err(|_| poisoned(V::KIND))?;
        Ok(rows.index.len())
    }

    pub fn is_empty(&self) -> DomainResult<bool> {
        Ok(self.len()? == 0)
    }
}
