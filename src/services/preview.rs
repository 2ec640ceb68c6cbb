use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// In-memory store backing the preview image the page shows while a dish
/// is being analyzed. Each selected image gets one token, served at
/// `/preview/{token}` until it is released. The controller guarantees at
/// most one live token at a time.
pub struct PreviewStore {
    entries: Mutex<HashMap<u64, PreviewEntry>>,
    next_token: AtomicU64,
}

struct PreviewEntry {
    mime_type: String,
    bytes: Vec<u8>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    pub fn insert(&self, mime_type: &str, bytes: Vec<u8>) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            token,
            PreviewEntry {
                mime_type: mime_type.to_string(),
                bytes,
            },
        );
        log::debug!("🖼️ Preview {} registered ({} live)", token, entries.len());
        token
    }

    pub fn get(&self, token: u64) -> Option<(String, Vec<u8>)> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&token)
            .map(|e| (e.mime_type.clone(), e.bytes.clone()))
    }

    /// Release a token. Returns true only the first time; a second call
    /// for the same token is a no-op.
    pub fn remove(&self, token: u64) -> bool {
        let removed = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.remove(&token).is_some()
        };
        if removed {
            log::debug!("🗑️ Preview {} released", token);
        }
        removed
    }

    pub fn live_count(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for PreviewStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let store = PreviewStore::new();
        let token = store.insert("image/png", vec![1, 2, 3]);

        let (mime, bytes) = store.get(token).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_tokens_are_unique() {
        let store = PreviewStore::new();
        let a = store.insert("image/png", vec![1]);
        let b = store.insert("image/jpeg", vec![2]);
        assert_ne!(a, b);
        assert_eq!(store.live_count(), 2);
    }

    #[test]
    fn test_remove_releases_exactly_once() {
        let store = PreviewStore::new();
        let token = store.insert("image/png", vec![1]);

        assert!(store.remove(token));
        assert!(!store.remove(token));
        assert!(store.get(token).is_none());
        assert_eq!(store.live_count(), 0);
    }
}
