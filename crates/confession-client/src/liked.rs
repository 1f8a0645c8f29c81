//! Device-local set of liked posts
//!
//! Persisted under [`LIKED_KEY`] as a JSON array of post ids. The set is a UI
//! gate only: clearing storage or using a second device allows another like.

use std::collections::BTreeSet;
use std::sync::Arc;

use confession_core::PostId;

use crate::storage::{LocalStorage, StorageError};

/// Storage key of the liked-set
pub const LIKED_KEY: &str = "likedConfessions";

pub struct LikedSet {
    ids: BTreeSet<PostId>,
    storage: Arc<dyn LocalStorage>,
}

impl LikedSet {
    /// Read the set once from storage. Missing, unreadable or malformed content
    /// yields an empty set.
    pub fn load(storage: Arc<dyn LocalStorage>) -> Self {
        let ids = match storage.get(LIKED_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<PostId>>(&raw) {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    tracing::warn!(key = LIKED_KEY, error = %e, "Malformed liked-set, starting empty");
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                tracing::warn!(key = LIKED_KEY, error = %e, "Liked-set unreadable, starting empty");
                BTreeSet::new()
            }
        };

        tracing::debug!(liked = ids.len(), "Liked-set loaded");
        Self { ids, storage }
    }

    pub fn contains(&self, id: PostId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Add an id and rewrite the stored array. The in-memory set keeps the id
    /// even when the write fails.
    pub fn insert(&mut self, id: PostId) -> Result<(), StorageError> {
        if !self.ids.insert(id) {
            return Ok(());
        }
        let ids: Vec<PostId> = self.ids.iter().copied().collect();
        self.storage.set(LIKED_KEY, &serde_json::to_string(&ids)?)
    }
}

impl std::fmt::Debug for LikedSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LikedSet").field("ids", &self.ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_load_empty_storage() {
        let liked = LikedSet::load(Arc::new(MemoryStorage::new()));
        assert!(liked.is_empty());
    }

    #[test]
    fn test_load_existing_ids() {
        let id = PostId::generate();
        let storage = MemoryStorage::with_entry(LIKED_KEY, &format!("[\"{id}\"]"));
        let liked = LikedSet::load(Arc::new(storage));
        assert!(liked.contains(id));
        assert_eq!(liked.len(), 1);
    }

    #[test]
    fn test_malformed_content_is_empty() {
        for raw in ["{not json", "{\"a\": 1}", "[1, 2]", "[\"not-a-uuid\"]"] {
            let liked = LikedSet::load(Arc::new(MemoryStorage::with_entry(LIKED_KEY, raw)));
            assert!(liked.is_empty(), "expected empty set for {raw}");
        }
    }

    #[test]
    fn test_insert_persists_array() {
        let storage = Arc::new(MemoryStorage::new());
        let mut liked = LikedSet::load(storage.clone());
        let id = PostId::generate();

        liked.insert(id).unwrap();
        liked.insert(id).unwrap();

        let raw = storage.get(LIKED_KEY).unwrap().unwrap();
        let stored: Vec<PostId> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, vec![id]);

        let reloaded = LikedSet::load(storage);
        assert!(reloaded.contains(id));
    }
}
