use std::collections::{BTreeMap, HashMap};

use crate::models::Record;
use crate::persist::Document;

/// Live ids per (collection, scope).
///
/// The next id in a scope is one past the largest id currently stored there,
/// or the record type's `ID_BASE` when the scope holds nothing. Ids can repeat
/// inside a scope (an update may set any id), so each id carries a count and
/// only leaves the scope when its last holder is released.
#[derive(Debug, Default)]
pub struct IdAllocator {
    live: HashMap<(&'static str, Option<i64>), BTreeMap<i64, usize>>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(doc: &Document) -> Self {
        let mut ids = Self::new();
        ids.seed(&doc.users);
        ids.seed(&doc.boards);
        ids.seed(&doc.lists);
        ids.seed(&doc.tasks);
        ids.seed(&doc.tags);
        ids
    }

    pub fn seed<T: Record>(&mut self, records: &[T]) {
        for r in records {
            self.insert::<T>(r.scope(), r.id());
        }
    }

    /// Id the next record created in `scope` will get.
    pub fn peek<T: Record>(&self, scope: Option<i64>) -> i64 {
        self.live
            .get(&(T::KIND, scope))
            .and_then(|ids| ids.keys().next_back())
            .map_or(T::ID_BASE, |max| max.saturating_add(1))
    }

    /// Marks `id` as held by one more record in `scope`.
    pub fn insert<T: Record>(&mut self, scope: Option<i64>, id: i64) {
        *self
            .live
            .entry((T::KIND, scope))
            .or_default()
            .entry(id)
            .or_insert(0) += 1;
    }

    /// Drops one holder of `id` in `scope`.
    pub fn release<T: Record>(&mut self, scope: Option<i64>, id: i64) {
        let key = (T::KIND, scope);
        let Some(ids) = self.live.get_mut(&key) else {
            return;
        };
        if let Some(count) = ids.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                ids.remove(&id);
            }
        }
        if ids.is_empty() {
            self.live.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Board, List, User};

    #[test]
    fn empty_scope_starts_at_base() {
        let ids = IdAllocator::new();
        assert_eq!(ids.peek::<User>(None), 1);
        assert_eq!(ids.peek::<Board>(Some(7)), 101);
        assert_eq!(ids.peek::<List>(Some(101)), 201);
    }

    #[test]
    fn inserted_ids_advance_only_their_scope() {
        let mut ids = IdAllocator::new();
        ids.insert::<Board>(Some(1), 101);
        ids.insert::<Board>(Some(1), 104);
        ids.insert::<Board>(Some(1), 102);
        assert_eq!(ids.peek::<Board>(Some(1)), 105);
        assert_eq!(ids.peek::<Board>(Some(2)), 101);
        // same numeric scope, different collection
        assert_eq!(ids.peek::<List>(Some(1)), 201);
    }

    #[test]
    fn ids_below_base_follow_max_plus_one() {
        let mut ids = IdAllocator::new();
        ids.insert::<Board>(Some(1), 5);
        assert_eq!(ids.peek::<Board>(Some(1)), 6);
    }

    #[test]
    fn releasing_the_max_lowers_the_next_id() {
        let mut ids = IdAllocator::new();
        ids.insert::<Board>(Some(1), 101);
        ids.insert::<Board>(Some(1), 102);
        ids.release::<Board>(Some(1), 102);
        assert_eq!(ids.peek::<Board>(Some(1)), 102);
        ids.release::<Board>(Some(1), 101);
        assert_eq!(ids.peek::<Board>(Some(1)), 101);
    }

    #[test]
    fn repeated_ids_stay_until_the_last_holder_goes() {
        let mut ids = IdAllocator::new();
        ids.insert::<List>(Some(101), 201);
        ids.insert::<List>(Some(101), 203);
        ids.insert::<List>(Some(101), 203);
        ids.release::<List>(Some(101), 203);
        assert_eq!(ids.peek::<List>(Some(101)), 204);
        ids.release::<List>(Some(101), 203);
        assert_eq!(ids.peek::<List>(Some(101)), 202);
        // unknown ids are ignored
        ids.release::<List>(Some(101), 999);
        ids.release::<List>(Some(5), 201);
        assert_eq!(ids.peek::<List>(Some(101)), 202);
    }
}
