// Position Tracker - cursor over the ordered id list

use crate::domain::QueueItem;
use std::collections::HashMap;

/// Result of advancing past the current item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(usize),
    Finished,
}

/// Holds the ordered ids, the loaded items and the current position.
///
/// Items are looked up by id (never by position) because the item list may be
/// shorter than the id list: ids the store did not return have no item.
#[derive(Debug, Default)]
pub struct PositionTracker {
    ids: Vec<String>,
    index_of: HashMap<String, usize>,
    items: Vec<QueueItem>,
    item_slot: HashMap<String, usize>,
    position: Option<usize>,
}

impl PositionTracker {
    /// Build from an ordered id list. Repeated ids keep their first position.
    pub fn new(ids: Vec<String>) -> Self {
        let mut unique = Vec::with_capacity(ids.len());
        let mut index_of = HashMap::with_capacity(ids.len());
        for id in ids {
            if !index_of.contains_key(&id) {
                index_of.insert(id.clone(), unique.len());
                unique.push(id);
            }
        }

        Self {
            ids: unique,
            index_of,
            ..Self::default()
        }
    }

    /// Replace the loaded items
    pub fn set_items(&mut self, items: Vec<QueueItem>) {
        self.item_slot = items
            .iter()
            .enumerate()
            .map(|(slot, item)| (item.id.clone(), slot))
            .collect();
        self.items = items;
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// `None` until a matching id has been found
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn current_id(&self) -> Option<&str> {
        self.position.map(|p| self.ids[p].as_str())
    }

    pub fn current_item(&self) -> Option<&QueueItem> {
        self.current_id().and_then(|id| self.item(id))
    }

    pub fn item(&self, id: &str) -> Option<&QueueItem> {
        self.item_slot.get(id).map(|&slot| &self.items[slot])
    }

    /// Move to the position of `id`; unknown ids leave the position untouched
    pub fn seek(&mut self, id: &str) -> bool {
        match self.index_of.get(id) {
            Some(&index) => {
                self.position = Some(index);
                true
            }
            None => false,
        }
    }

    /// Move to `index`. Out-of-range requests are ignored.
    pub fn navigate_to(&mut self, index: usize) -> bool {
        if index >= self.ids.len() {
            return false;
        }
        self.position = Some(index);
        true
    }

    /// Move to the first loaded, incomplete item after the current position.
    /// Falls back to the next index when every later item is complete, and
    /// reports `Finished` when there is no next index.
    pub fn advance_to_next_incomplete(&mut self) -> Advance {
        let start = self.position.map_or(0, |p| p + 1);
        if start >= self.ids.len() {
            return Advance::Finished;
        }

        let target = (start..self.ids.len())
            .find(|&index| {
                self.item(&self.ids[index])
                    .is_some_and(|item| !item.completed)
            })
            .unwrap_or(start);

        self.position = Some(target);
        Advance::Moved(target)
    }

    /// Set the completed flag of one item. Returns the previous value.
    pub fn set_completed(&mut self, id: &str, completed: bool) -> Option<bool> {
        let slot = *self.item_slot.get(id)?;
        let item = &mut self.items[slot];
        Some(std::mem::replace(&mut item.completed, completed))
    }

    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.completed).count()
    }
}
