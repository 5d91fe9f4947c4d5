//! Activation stack for sticky sources

/// Ordered set of sticky sources
///
/// The most recently activated entry sits on top and becomes current.
/// `next` rotates the current pointer through every entry and wraps around.
#[derive(Debug, Clone)]
pub struct CycleManager<T> {
    /// Oldest first, newest last
    items: Vec<T>,
    current: Option<usize>,
}

impl<T: PartialEq + Clone> CycleManager<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            current: None,
        }
    }

    /// Put `item` on top and make it current, moving it if already present
    pub fn activate(&mut self, item: T) {
        if let Some(pos) = self.position(&item) {
            self.items.remove(pos);
        }
        self.items.push(item);
        self.current = Some(self.items.len() - 1);
    }

    /// Remove `item`. Returns whether it was present.
    ///
    /// Only when the removed entry was current does the pointer move, to
    /// the new top of the stack.
    pub fn deactivate(&mut self, item: &T) -> bool {
        let Some(pos) = self.position(item) else {
            return false;
        };

        self.items.remove(pos);
        self.current = match self.current {
            _ if self.items.is_empty() => None,
            Some(cur) if cur == pos => Some(self.items.len() - 1),
            Some(cur) if cur > pos => Some(cur - 1),
            other => other,
        };
        true
    }

    pub fn current(&self) -> Option<&T> {
        self.current.and_then(|pos| self.items.get(pos))
    }

    /// Advance the current pointer circularly and return the new current
    pub fn next(&mut self) -> Option<&T> {
        if self.items.len() > 1 {
            let pos = self.current.unwrap_or(0);
            self.current = Some((pos + 1) % self.items.len());
        }
        self.current()
    }

    /// The entry `next` would return, without rotating
    pub fn peek_next(&self) -> Option<&T> {
        match self.items.len() {
            0 | 1 => self.current(),
            len => {
                let pos = self.current.unwrap_or(0);
                self.items.get((pos + 1) % len)
            }
        }
    }

    pub fn has(&self, item: &T) -> bool {
        self.position(item).is_some()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries, most recently activated first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().rev()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.current = None;
    }

    fn position(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|i| i == item)
    }
}

impl<T: PartialEq + Clone> Default for CycleManager<T> {
    fn default() -> Self {
        Self::new()
    }
}
