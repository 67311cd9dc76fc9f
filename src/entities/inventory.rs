use serde::Serialize;
use std::collections::BTreeMap;

/// Item stacks keyed by item id. Empty stacks are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Inventory {
    stacks: BTreeMap<String, u32>,
}

impl Inventory {
    pub fn from_stacks<'a>(stacks: impl IntoIterator<Item = (&'a String, &'a u32)>) -> Self {
        let mut inventory = Self::default();
        for (item, count) in stacks {
            inventory.add(item, *count);
        }
        inventory
    }

    pub fn count(&self, item: &str) -> u32 {
        self.stacks.get(item).copied().unwrap_or(0)
    }

    pub fn holds(&self, item: &str) -> bool {
        self.count(item) > 0
    }

    pub fn add(&mut self, item: &str, count: u32) {
        if count == 0 {
            return;
        }
        let stack = self.stacks.entry(item.to_string()).or_insert(0);
        *stack = stack.saturating_add(count);
    }

    /// Removes `count` units only if the whole amount is present.
    pub fn take(&mut self, item: &str, count: u32) -> bool {
        let Some(stack) = self.stacks.get_mut(item) else {
            return count == 0;
        };
        if *stack < count {
            return false;
        }
        *stack -= count;
        if *stack == 0 {
            self.stacks.remove(item);
        }
        true
    }

    pub fn take_one(&mut self, item: &str) -> bool {
        self.take(item, 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.stacks.iter().map(|(item, count)| (item.as_str(), *count))
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}
