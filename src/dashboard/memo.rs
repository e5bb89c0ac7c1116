//! Per-session memo of listings and loaded frames
//!
//! Entries are keyed by the client that produced them, so a credential or
//! region change never serves results fetched with the old client. Only
//! successful results are stored. Nothing is evicted.

use std::collections::HashMap;
use std::sync::Arc;

use crate::frame::Frame;

/// Identifies one constructed store client within a session
pub type ClientId = u64;

/// Client, bucket and prefix (for listings) or key (for frames)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoKey {
    pub client: ClientId,
    pub bucket: String,
    pub path: String,
}

impl MemoKey {
    pub fn new(client: ClientId, bucket: &str, path: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            path: path.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Memo {
    listings: HashMap<MemoKey, Vec<String>>,
    frames: HashMap<MemoKey, Arc<Frame>>,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(&self, key: &MemoKey) -> Option<&Vec<String>> {
        self.listings.get(key)
    }

    pub fn store_listing(&mut self, key: MemoKey, files: Vec<String>) {
        self.listings.insert(key, files);
    }

    pub fn frame(&self, key: &MemoKey) -> Option<Arc<Frame>> {
        self.frames.get(key).cloned()
    }

    pub fn store_frame(&mut self, key: MemoKey, frame: Arc<Frame>) {
        self.frames.insert(key, frame);
    }

    pub fn listing_count(&self) -> usize {
        self.listings.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_scoped_by_client() {
        let mut memo = Memo::new();
        memo.store_listing(MemoKey::new(1, "bucket", "data/"), vec!["data/a.csv".to_string()]);

        assert!(memo.listing(&MemoKey::new(1, "bucket", "data/")).is_some());
        assert!(memo.listing(&MemoKey::new(2, "bucket", "data/")).is_none());
        assert!(memo.listing(&MemoKey::new(1, "other", "data/")).is_none());
        assert_eq!(memo.listing_count(), 1);
    }

    #[test]
    fn test_frame_shared() {
        let mut memo = Memo::new();
        let frame = Arc::new(Frame::from_columns(Vec::new(), 0).unwrap());
        memo.store_frame(MemoKey::new(1, "bucket", "data/a.csv"), frame.clone());

        let cached = memo.frame(&MemoKey::new(1, "bucket", "data/a.csv")).unwrap();
        assert!(Arc::ptr_eq(&cached, &frame));
        assert_eq!(memo.frame_count(), 1);
    }
}
