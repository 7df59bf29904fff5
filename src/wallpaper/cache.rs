//! Decoded thumbnail cache for the carousel slots.
//!
//! Generic over the stored image so the GTK side can keep textures here
//! while tests use plain values.

use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Entries kept before the oldest are evicted.
pub const DEFAULT_CAPACITY: usize = 40;

type Key = (PathBuf, i32);

/// Thumbnails keyed by `(path, slot width)`, oldest evicted first.
#[derive(Debug)]
pub struct ThumbnailCache<T> {
    entries: HashMap<Key, T>,
    order: VecDeque<Key>,
    capacity: usize,
}

impl<T> Default for ThumbnailCache<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<T> ThumbnailCache<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, path: &Path, width: i32) -> Option<&T> {
        self.entries.get(&(path.to_path_buf(), width))
    }

    pub fn contains(&self, path: &Path, width: i32) -> bool {
        self.entries.contains_key(&(path.to_path_buf(), width))
    }

    /// Store a thumbnail.  Replacing an entry makes it the newest.
    pub fn insert(&mut self, path: PathBuf, width: i32, value: T) {
        let key = (path, width);
        if self.entries.insert(key.clone(), value).is_some() {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key);

        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            debug!("evicted thumbnail {} @{}", oldest.0.display(), oldest.1);
        }
    }

    /// Drop every entry whose path is not in `keep`, whatever its width.
    pub fn retain_window(&mut self, keep: &[&Path]) {
        let keep: HashSet<&Path> = keep.iter().copied().collect();
        let before = self.entries.len();
        self.entries.retain(|(path, _), _| keep.contains(path.as_path()));
        self.order.retain(|(path, _)| keep.contains(path.as_path()));
        if before != self.entries.len() {
            debug!("thumbnail cache {} -> {}", before, self.entries.len());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Size to scale `src` to so it covers `dst` with its aspect ratio kept.
/// The result is at least `dst` in both dimensions; the overflow is
/// cropped when drawn.
pub fn cover_size(src: (i32, i32), dst: (i32, i32)) -> (i32, i32) {
    let (sw, sh) = src;
    let (dw, dh) = dst;
    if sw <= 0 || sh <= 0 {
        return dst;
    }
    let scale = (dw as f64 / sw as f64).max(dh as f64 / sh as f64);
    let w = ((sw as f64 * scale).round() as i32).max(dw);
    let h = ((sh as f64 * scale).round() as i32).max(dh);
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> PathBuf {
        PathBuf::from(format!("/w/{}", name))
    }

    #[test]
    fn keys_by_path_and_width() {
        let mut cache = ThumbnailCache::default();
        cache.insert(p("a"), 400, "side");
        cache.insert(p("a"), 440, "centre");
        assert_eq!(cache.get(&p("a"), 400), Some(&"side"));
        assert_eq!(cache.get(&p("a"), 440), Some(&"centre"));
        assert_eq!(cache.get(&p("a"), 100), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn evicts_oldest_over_capacity() {
        let mut cache = ThumbnailCache::with_capacity(3);
        for name in ["a", "b", "c", "d"] {
            cache.insert(p(name), 400, name);
        }
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&p("a"), 400));
        assert!(cache.contains(&p("d"), 400));
    }

    #[test]
    fn replacing_refreshes_age() {
        let mut cache = ThumbnailCache::with_capacity(2);
        cache.insert(p("a"), 400, 1);
        cache.insert(p("b"), 400, 2);
        cache.insert(p("a"), 400, 3);
        cache.insert(p("c"), 400, 4);
        assert_eq!(cache.get(&p("a"), 400), Some(&3));
        assert!(!cache.contains(&p("b"), 400));
    }

    #[test]
    fn retain_window_keeps_both_sizes() {
        let mut cache = ThumbnailCache::default();
        cache.insert(p("a"), 400, ());
        cache.insert(p("a"), 440, ());
        cache.insert(p("b"), 400, ());
        cache.insert(p("c"), 440, ());
        let a = p("a");
        let c = p("c");
        cache.retain_window(&[a.as_path(), c.as_path()]);
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&p("b"), 400));

        // Order bookkeeping stays in step after retain.
        let mut small = ThumbnailCache::with_capacity(1);
        small.insert(p("x"), 1, ());
        small.retain_window(&[]);
        small.insert(p("y"), 1, ());
        assert!(small.contains(&p("y"), 1));
    }

    #[test]
    fn cover_fills_target() {
        assert_eq!(cover_size((1920, 1080), (400, 225)), (400, 225));
        assert_eq!(cover_size((1000, 1000), (400, 225)), (400, 400));
        assert_eq!(cover_size((1080, 1920), (440, 248)), (440, 782));
        assert_eq!(cover_size((3000, 1000), (400, 225)), (675, 225));
        assert_eq!(cover_size((0, 0), (400, 225)), (400, 225));
    }
}
