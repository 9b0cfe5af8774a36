use std::sync::atomic::{AtomicBool, Ordering};

use ahash::HashSet;
use parking_lot::RwLock;

use super::shader::ShaderHash;

/// Hashes the operator flagged during a hunting session.
///
/// Read on every draw (for the hide-marked check), written only on explicit operator actions.
#[derive(Default)]
pub struct MarkedSet {
    hashes: RwLock<HashSet<ShaderHash>>,
    hide_marked: AtomicBool,
}

impl MarkedSet {
    pub fn replace(&self, hashes: &HashSet<ShaderHash>) {
        let mut marked = self.hashes.write();
        marked.clear();
        marked.extend(hashes.iter().copied().filter(|hash| hash.is_valid()));
    }

    pub fn clear(&self) {
        self.hashes.write().clear();
    }

    /// Flip the membership of `hash`. Returns true if it is marked afterwards.
    pub fn toggle(&self, hash: ShaderHash) -> bool {
        if !hash.is_valid() {
            return false;
        }

        let mut marked = self.hashes.write();
        if marked.remove(&hash) {
            false
        } else {
            marked.insert(hash);
            true
        }
    }

    pub fn contains(&self, hash: ShaderHash) -> bool {
        hash.is_valid() && self.hashes.read().contains(&hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.read().is_empty()
    }

    /// The member if exactly one hash is marked.
    pub fn single(&self) -> Option<ShaderHash> {
        let marked = self.hashes.read();
        if marked.len() == 1 {
            marked.iter().next().copied()
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> HashSet<ShaderHash> {
        self.hashes.read().clone()
    }

    pub fn hide_marked(&self) -> bool {
        self.hide_marked.load(Ordering::Relaxed)
    }

    pub fn set_hide_marked(&self, hide: bool) {
        self.hide_marked.store(hide, Ordering::Relaxed);
    }

    pub fn toggle_hide_marked(&self) -> bool {
        !self.hide_marked.fetch_xor(true, Ordering::Relaxed)
    }

    /// True if marked hashes are hidden and `hash` is one of them.
    pub fn is_hidden(&self, hash: ShaderHash) -> bool {
        self.hide_marked() && self.contains(hash)
    }
}
