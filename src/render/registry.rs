//! Registry of renderer-owned layer handles, keyed by zone.

use hashbrown::HashMap;

use crate::models::ZoneId;

struct Entry<H> {
    handle: H,
    retained: bool,
}

/// Maps zone ids to opaque renderer handles.
///
/// A retained handle survives [`HandleRegistry::sweep`]; the render manager
/// retains the layer under edit so its edit handles are never torn down.
pub struct HandleRegistry<H> {
    entries: HashMap<ZoneId, Entry<H>>,
}

impl<H> Default for HandleRegistry<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H> HandleRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle; returns the handle previously held for `id`
    pub fn insert(&mut self, id: ZoneId, handle: H) -> Option<H> {
        self.entries
            .insert(
                id,
                Entry {
                    handle,
                    retained: false,
                },
            )
            .map(|e| e.handle)
    }

    pub fn get(&self, id: ZoneId) -> Option<&H> {
        self.entries.get(&id).map(|e| &e.handle)
    }

    pub fn contains(&self, id: ZoneId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Pin a handle so sweeps leave it alone. False if `id` is unknown.
    pub fn retain(&mut self, id: ZoneId) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.retained = true;
                true
            }
            None => false,
        }
    }

    pub fn release(&mut self, id: ZoneId) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.retained = false;
                true
            }
            None => false,
        }
    }

    pub fn is_retained(&self, id: ZoneId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.retained)
    }

    pub fn retained(&self) -> impl Iterator<Item = (ZoneId, &H)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.retained)
            .map(|(id, e)| (*id, &e.handle))
    }

    pub fn remove(&mut self, id: ZoneId) -> Option<H> {
        self.entries.remove(&id).map(|e| e.handle)
    }

    /// Remove and return every handle that is not retained
    pub fn sweep(&mut self) -> Vec<(ZoneId, H)> {
        let stale: Vec<ZoneId> = self
            .entries
            .iter()
            .filter(|(_, e)| !e.retained)
            .map(|(id, _)| *id)
            .collect();

        stale
            .into_iter()
            .filter_map(|id| self.entries.remove(&id).map(|e| (id, e.handle)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
