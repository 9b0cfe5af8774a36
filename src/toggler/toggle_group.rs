use std::sync::atomic::{AtomicU32, Ordering};

use ahash::HashSet;
use strum::EnumCount;

use super::{
    key_chord::{KeyChord, Modifiers},
    shader::{ShaderHash, ShaderStage},
};

pub const DEFAULT_GROUP_NAME: &str = "Default";

/// Process-unique group identity. Never reused.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct GroupId(u32);

impl GroupId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named, key-bound set of shaders per stage that can be hidden with one key press.
#[derive(Clone, Debug)]
pub struct ToggleGroup {
    id: GroupId,
    name: String,
    toggle_key: KeyChord,
    hashes: [HashSet<ShaderHash>; ShaderStage::COUNT],
    /// While active the group's shaders are not drawn.
    is_active: bool,
    is_active_at_startup: bool,
    /// The group's shaders are being changed through a hunting session.
    is_editing: bool,
}

impl ToggleGroup {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: GroupId::next(),
            name: if name.is_empty() {
                DEFAULT_GROUP_NAME.to_string()
            } else {
                name
            },
            toggle_key: KeyChord::NONE,
            hashes: Default::default(),
            is_active: false,
            is_active_at_startup: false,
            is_editing: false,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blank names are ignored.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() {
            self.name = name;
        }
    }

    pub fn toggle_key(&self) -> KeyChord {
        self.toggle_key
    }

    /// Key code `0` is ignored.
    pub fn set_toggle_key(&mut self, key: u8, modifiers: Modifiers) {
        if key > 0 {
            self.toggle_key = KeyChord::new(key, modifiers);
        }
    }

    /// Apply a chord captured from the keyboard. An aborted capture leaves the binding alone.
    pub fn set_toggle_key_captured(&mut self, chord: KeyChord) {
        if chord.is_valid() {
            self.toggle_key = chord;
        }
    }

    pub fn hashes(&self, stage: ShaderStage) -> &HashSet<ShaderHash> {
        &self.hashes[stage.index()]
    }

    pub fn replace_hashes(&mut self, stage: ShaderStage, hashes: HashSet<ShaderHash>) {
        self.hashes[stage.index()] = hashes;
    }

    /// Replace all three stage sets at once so nothing from a previous hunt survives.
    pub fn store_collected_hashes(
        &mut self,
        pixel: &HashSet<ShaderHash>,
        vertex: &HashSet<ShaderHash>,
        compute: &HashSet<ShaderHash>,
    ) {
        self.clear_hashes();
        self.hashes[ShaderStage::Pixel.index()].extend(pixel);
        self.hashes[ShaderStage::Vertex.index()].extend(vertex);
        self.hashes[ShaderStage::Compute.index()].extend(compute);
    }

    pub fn clear_hashes(&mut self) {
        self.hashes.iter_mut().for_each(HashSet::clear);
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.iter().all(HashSet::is_empty)
    }

    pub fn is_blocked(&self, stage: ShaderStage, hash: ShaderHash) -> bool {
        self.is_active && self.hashes[stage.index()].contains(&hash)
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub fn toggle_active(&mut self) {
        self.is_active = !self.is_active;
    }

    pub fn is_active_at_startup(&self) -> bool {
        self.is_active_at_startup
    }

    pub fn set_active_at_startup(&mut self, active: bool) {
        self.is_active_at_startup = active;
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    pub fn set_editing(&mut self, editing: bool) {
        self.is_editing = editing;
    }
}

impl PartialEq for ToggleGroup {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ToggleGroup {}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[u32]) -> HashSet<ShaderHash> {
        values.iter().copied().map(ShaderHash).collect()
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut group = ToggleGroup::new("");
        assert_eq!(group.name(), DEFAULT_GROUP_NAME);

        group.set_name("Hud");
        group.set_name("");
        assert_eq!(group.name(), "Hud");
    }

    #[test]
    fn invalid_chords_do_not_clear_binding() {
        let mut group = ToggleGroup::new("Hud");
        group.set_toggle_key(0x48, Modifiers::CTRL);
        group.set_toggle_key(0, Modifiers::empty());
        group.set_toggle_key_captured(KeyChord::NONE);
        assert_eq!(group.toggle_key(), KeyChord::new(0x48, Modifiers::CTRL));

        group.set_toggle_key_captured(KeyChord::caps_lock());
        assert_eq!(group.toggle_key(), KeyChord::caps_lock());
    }

    #[test]
    fn store_collected_hashes_replaces_every_stage() {
        let mut group = ToggleGroup::new("Hud");
        group.store_collected_hashes(&set(&[1, 2]), &set(&[3]), &set(&[4]));
        group.store_collected_hashes(&set(&[5]), &set(&[]), &set(&[6, 7]));

        assert_eq!(group.hashes(ShaderStage::Pixel), &set(&[5]));
        assert_eq!(group.hashes(ShaderStage::Vertex), &set(&[]));
        assert_eq!(group.hashes(ShaderStage::Compute), &set(&[6, 7]));
        assert!(!group.is_empty());

        group.store_collected_hashes(&set(&[]), &set(&[]), &set(&[]));
        assert!(group.is_empty());
    }

    #[test]
    fn blocks_only_while_active_and_per_stage() {
        let mut group = ToggleGroup::new("Hud");
        group.replace_hashes(ShaderStage::Pixel, set(&[9]));
        assert!(!group.is_blocked(ShaderStage::Pixel, ShaderHash(9)));

        group.toggle_active();
        assert!(group.is_blocked(ShaderStage::Pixel, ShaderHash(9)));
        assert!(!group.is_blocked(ShaderStage::Vertex, ShaderHash(9)));

        group.toggle_active();
        assert!(!group.is_blocked(ShaderStage::Pixel, ShaderHash(9)));
    }

    #[test]
    fn equality_is_by_id() {
        let a = ToggleGroup::new("Same");
        let b = ToggleGroup::new("Same");
        let mut a_copy = a.clone();
        a_copy.set_name("Renamed");

        assert_ne!(a, b);
        assert_eq!(a, a_copy);
        assert!(b.id() > a.id());
    }
}
