use super::Handle;

/// Append-only store for shared render assets (geometry, materials).
///
/// Handles are plain indices; assets live for the lifetime of the owning
/// context, so nothing is ever evicted.
pub struct AssetCache<T> {
    items: Vec<T>,
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn insert(&mut self, item: T) -> Handle<T> {
        let index = self.items.len();
        self.items.push(item);
        Handle::new(index)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index())
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.items.get_mut(handle.index())
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        handle.index() < self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (Handle::new(i), item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_items_answer_by_handle() {
        let mut cache = AssetCache::new();
        let a = cache.insert("rock");
        let b = cache.insert("tree");
        assert_eq!(cache.get(a), Some(&"rock"));
        assert_eq!(cache.get(b), Some(&"tree"));
        assert!(cache.contains(a));
        assert!(!cache.contains(Handle::new(cache.len())));
    }

    #[test]
    fn iter_walks_handles_in_insertion_order() {
        let mut cache = AssetCache::new();
        let a = cache.insert(1u32);
        let b = cache.insert(2u32);
        let collected: Vec<_> = cache.iter().collect();
        assert_eq!(collected, vec![(a, &1), (b, &2)]);
    }
}
