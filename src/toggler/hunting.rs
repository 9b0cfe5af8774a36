use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use ahash::HashSet;
use indexmap::IndexSet;
use parking_lot::RwLock;

use super::{
    marked_set::MarkedSet,
    registry::HashHandleRegistry,
    shader::{ObjectHandle, ShaderHash},
};

/// The currently hunted shader. `hash` always equals `collected[index]`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub hash: ShaderHash,
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

#[derive(Default)]
struct Collected {
    /// Ordered by first observation, with O(1) hash -> position lookups.
    hashes: IndexSet<ShaderHash, ahash::RandomState>,
    selection: Option<Selection>,
}

impl Collected {
    fn select(&mut self, index: usize) -> Option<Selection> {
        let hash = *self.hashes.get_index(index)?;
        self.selection = Some(Selection { index, hash });
        self.selection
    }

    /// Position one step from `current` in `direction`, wrapping at both ends. With no current
    /// position the first step lands on the first (forward) or last (backward) entry.
    fn step(&self, current: Option<usize>, direction: Direction) -> usize {
        let len = self.hashes.len();
        match (current, direction) {
            (None, Direction::Forward) => 0,
            (None, Direction::Backward) => len - 1,
            (Some(index), Direction::Forward) => (index + 1) % len,
            (Some(index), Direction::Backward) => (index + len - 1) % len,
        }
    }
}

/// Interactive iteration over the shaders observed during a collection window.
///
/// States are `Inactive` and `Active`. Navigation happens over a snapshot of the hashes that were
/// reported as bound while the session was collecting.
#[derive(Default)]
pub struct HuntingSession {
    active: AtomicBool,
    collected: RwLock<Collected>,
    /// Mirrors `collected.selection`'s hash so the per-draw check does not take the lock.
    selected_hash: AtomicU32,
    marked: MarkedSet,
}

impl HuntingSession {
    /// Begin a session with `seed` as the initial marked set. Returns false if already active.
    pub fn start(&self, seed: &HashSet<ShaderHash>) -> bool {
        let mut collected = self.collected.write();
        if self.active.load(Ordering::Acquire) {
            return false;
        }

        collected.hashes.clear();
        collected.selection = None;
        self.selected_hash.store(0, Ordering::Release);
        self.marked.replace(seed);
        self.marked.set_hide_marked(false);
        self.active.store(true, Ordering::Release);

        true
    }

    /// End the session. With `commit` the marked set replaces the contents of `destination`,
    /// otherwise `destination` is left untouched. Returns false if the session was not active.
    pub fn stop(&self, commit: bool, destination: &mut HashSet<ShaderHash>) -> bool {
        let mut collected = self.collected.write();
        if !self.active.load(Ordering::Acquire) {
            return false;
        }

        if commit {
            *destination = self.marked.snapshot();
        }
        self.marked.clear();
        self.marked.set_hide_marked(false);
        collected.selection = None;
        self.selected_hash.store(0, Ordering::Release);
        self.active.store(false, Ordering::Release);

        true
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Fold the hash behind `handle` into the collected set. Only has an effect while active.
    pub fn observe_bound_handle(&self, registry: &HashHandleRegistry, handle: ObjectHandle) {
        if !self.is_active() {
            return;
        }

        let hash = registry.resolve(handle);
        if !hash.is_valid() || self.collected.read().hashes.contains(&hash) {
            return;
        }

        let mut collected = self.collected.write();
        // The last object behind `hash` may have been destroyed since it was resolved.
        if registry.is_known_hash(hash) {
            collected.hashes.insert(hash);
        }
    }

    /// Drop `hash` from the collected set, keeping the selection pointed at the same hash.
    pub(crate) fn forget_hash(&self, hash: ShaderHash) {
        let mut collected = self.collected.write();
        let Some(position) = collected.hashes.get_index_of(&hash) else {
            return;
        };
        collected.hashes.shift_remove_index(position);

        match collected.selection {
            Some(selection) if selection.index == position => {
                collected.selection = None;
                self.selected_hash.store(0, Ordering::Release);
            }
            Some(selection) if selection.index > position => {
                collected.selection = Some(Selection {
                    index: selection.index - 1,
                    hash: selection.hash,
                });
            }
            _ => {}
        }
    }

    pub fn select_next(&self) {
        self.select_adjacent(Direction::Forward);
    }

    pub fn select_previous(&self) {
        self.select_adjacent(Direction::Backward);
    }

    /// Like [HuntingSession::select_next], but only stops on marked hashes.
    pub fn select_next_marked(&self) {
        self.select_adjacent_marked(Direction::Forward);
    }

    /// Like [HuntingSession::select_previous], but only stops on marked hashes.
    pub fn select_previous_marked(&self) {
        self.select_adjacent_marked(Direction::Backward);
    }

    fn select_adjacent(&self, direction: Direction) {
        if !self.is_active() {
            return;
        }

        let mut collected = self.collected.write();
        if collected.hashes.is_empty() {
            return;
        }

        let current = collected.selection.map(|selection| selection.index);
        let index = collected.step(current, direction);
        self.publish(collected.select(index));
    }

    fn select_adjacent_marked(&self, direction: Direction) {
        if !self.is_active() || self.marked.is_empty() {
            return;
        }
        if let Some(only) = self.marked.single() {
            if only == self.selected_hash() {
                return;
            }
        }

        let marked = self.marked.snapshot();
        let mut collected = self.collected.write();
        if collected.hashes.is_empty() {
            return;
        }

        let mut position = collected.selection.map(|selection| selection.index);
        for _ in 0..collected.hashes.len() {
            let candidate = collected.step(position, direction);
            if marked.contains(&collected.hashes[candidate]) {
                self.publish(collected.select(candidate));
                return;
            }
            position = Some(candidate);
        }

        tracing::trace!("No marked shader among the collected ones.");
    }

    fn publish(&self, selection: Option<Selection>) {
        let hash = selection.map_or(ShaderHash::INVALID, |selection| selection.hash);
        self.selected_hash.store(hash.0, Ordering::Release);
    }

    pub fn selection(&self) -> Option<Selection> {
        self.collected.read().selection
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selection().map(|selection| selection.index)
    }

    pub fn selected_hash(&self) -> ShaderHash {
        ShaderHash(self.selected_hash.load(Ordering::Acquire))
    }

    pub fn is_selection_marked(&self) -> bool {
        self.marked.contains(self.selected_hash())
    }

    /// Flip whether the selected hash is marked. No-op without a selection.
    pub fn toggle_mark_on_selection(&self) {
        let hash = self.selected_hash();
        if hash.is_valid() {
            self.marked.toggle(hash);
        }
    }

    /// The per-draw check: the selected shader is hidden while hunting, and marked shaders are
    /// hidden when the hide-marked flag is set.
    pub fn is_blocked(&self, hash: ShaderHash) -> bool {
        if !hash.is_valid() {
            return false;
        }
        (self.is_active() && hash == self.selected_hash()) || self.marked.is_hidden(hash)
    }

    pub fn collected_count(&self) -> usize {
        self.collected.read().hashes.len()
    }

    pub fn collected_hashes(&self) -> Vec<ShaderHash> {
        self.collected.read().hashes.iter().copied().collect()
    }

    pub fn marked(&self) -> &MarkedSet {
        &self.marked
    }
}
