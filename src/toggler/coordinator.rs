use std::sync::atomic::{AtomicU32, Ordering};

use ahash::HashSet;
use parking_lot::{Mutex, RwLock};
use strum::{EnumCount, IntoEnumIterator};

use super::{
    hunting::Selection,
    key_chord::KeyChord,
    shader::{ObjectHandle, ShaderHash, ShaderStage},
    shader_manager::ShaderManager,
    toggle_group::{GroupId, ToggleGroup},
};
use crate::{
    config::{groups, ini::IniError, settings::TogglerConfig},
    input::InputState,
};

/// Operator commands that drive a hunting session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HuntCommand {
    Previous,
    Next,
    PreviousMarked,
    NextMarked,
    ToggleMark,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StageStats {
    pub live_handles: usize,
    pub distinct_hashes: usize,
    pub collected: usize,
    pub marked: usize,
    pub hunting: bool,
    pub selection: Option<Selection>,
    pub selection_marked: bool,
    pub hide_marked: bool,
}

/// Snapshot of everything the overlay shows.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TogglerStats {
    pub stages: [StageStats; ShaderStage::COUNT],
    pub collection_frames_left: u32,
    pub hunted_group: Option<GroupId>,
}

impl TogglerStats {
    pub fn stage(&self, stage: ShaderStage) -> &StageStats {
        &self.stages[stage.index()]
    }
}

#[derive(Default)]
struct KeyCapture {
    group: Option<GroupId>,
    collector: KeyChord,
}

/// Owns one [ShaderManager] per stage together with the toggle groups, and routes host events
/// and operator input to them.
///
/// Lock order: hunted group, then groups, then the per-stage sessions.
pub struct ShaderToggler {
    config: TogglerConfig,
    managers: [ShaderManager; ShaderStage::COUNT],
    groups: RwLock<Vec<ToggleGroup>>,
    /// Frames left in the collection window. Zero when closed.
    collection_frames_left: AtomicU32,
    hunted_group: Mutex<Option<GroupId>>,
    key_capture: Mutex<KeyCapture>,
}

impl ShaderToggler {
    pub fn new(config: TogglerConfig) -> Self {
        Self {
            config,
            managers: [
                ShaderManager::new(ShaderStage::Vertex),
                ShaderManager::new(ShaderStage::Pixel),
                ShaderManager::new(ShaderStage::Compute),
            ],
            groups: RwLock::new(Vec::new()),
            collection_frames_left: AtomicU32::new(0),
            hunted_group: Mutex::new(None),
            key_capture: Mutex::new(KeyCapture::default()),
        }
    }

    pub fn config(&self) -> &TogglerConfig {
        &self.config
    }

    pub fn manager(&self, stage: ShaderStage) -> &ShaderManager {
        &self.managers[stage.index()]
    }
}

// Host events.
impl ShaderToggler {
    /// A pipeline made of several shader stages was realized under `handle`.
    pub fn on_pipeline_created(&self, handle: ObjectHandle, stages: &[(ShaderStage, ShaderHash)]) {
        for &(stage, hash) in stages {
            self.on_object_created(stage, hash, handle);
        }
    }

    pub fn on_object_created(&self, stage: ShaderStage, hash: ShaderHash, handle: ObjectHandle) {
        self.manager(stage).add_hash_handle_pair(hash, handle);
    }

    pub fn on_object_destroyed(&self, handle: ObjectHandle) {
        for manager in &self.managers {
            manager.remove_handle(handle);
        }
    }

    pub fn on_object_bound(&self, stage: ShaderStage, handle: ObjectHandle) {
        if self.is_collecting() {
            self.manager(stage).add_active_handle(handle);
        }
    }

    /// Whether a draw using the pipeline behind `handle` should be skipped.
    pub fn on_draw_block_query(&self, handle: ObjectHandle) -> bool {
        let groups = self.groups.read();
        [ShaderStage::Vertex, ShaderStage::Pixel]
            .into_iter()
            .any(|stage| self.is_stage_blocked(&groups, stage, handle))
    }

    /// Whether a dispatch using the pipeline behind `handle` should be skipped.
    pub fn on_dispatch_block_query(&self, handle: ObjectHandle) -> bool {
        let groups = self.groups.read();
        self.is_stage_blocked(&groups, ShaderStage::Compute, handle)
    }

    fn is_stage_blocked(
        &self,
        groups: &[ToggleGroup],
        stage: ShaderStage,
        handle: ObjectHandle,
    ) -> bool {
        let manager = self.manager(stage);
        let hash = manager.shader_hash(handle);
        if !hash.is_valid() {
            return false;
        }

        manager.session().is_blocked(hash)
            || groups.iter().any(|group| group.is_blocked(stage, hash))
    }

    /// Called once per presented frame with that frame's keyboard state.
    pub fn on_present(&self, input: &InputState) {
        self.tick_collection_window();

        let hunted = self.hunted_group();

        {
            let mut groups = self.groups.write();
            for group in groups.iter_mut() {
                if !group.toggle_key().is_pressed(input) {
                    continue;
                }

                group.toggle_active();
                tracing::info!(
                    "Toggle group {} is now {}",
                    group.name(),
                    if group.is_active() { "active" } else { "inactive" }
                );

                if hunted == Some(group.id()) {
                    for manager in &self.managers {
                        manager.session().marked().toggle_hide_marked();
                    }
                }
            }
        }

        if hunted.is_some() {
            self.handle_hunting_keys(input);
        }
    }

    fn tick_collection_window(&self) {
        let previous = self
            .collection_frames_left
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |frames| {
                frames.checked_sub(1)
            });

        if previous == Ok(1) {
            for manager in &self.managers {
                tracing::info!(
                    "Collected {} active {} shader(s)",
                    manager.session().collected_count(),
                    manager.stage()
                );
            }
        }
    }

    fn handle_hunting_keys(&self, input: &InputState) {
        let marked_only = !self.config.marked_only_modifier.is_empty()
            && input.modifiers().contains(self.config.marked_only_modifier);

        for stage in ShaderStage::iter() {
            let keys = self.config.hunting_keys(stage);

            if input.key_just_pressed(keys.previous) {
                self.apply(
                    stage,
                    if marked_only {
                        HuntCommand::PreviousMarked
                    } else {
                        HuntCommand::Previous
                    },
                );
            }
            if input.key_just_pressed(keys.next) {
                self.apply(
                    stage,
                    if marked_only {
                        HuntCommand::NextMarked
                    } else {
                        HuntCommand::Next
                    },
                );
            }
            if input.key_just_pressed(keys.toggle_mark) {
                self.apply(stage, HuntCommand::ToggleMark);
            }
        }
    }
}

// Hunting.
impl ShaderToggler {
    pub fn hunted_group(&self) -> Option<GroupId> {
        *self.hunted_group.lock()
    }

    /// Bound objects are only collected while the window is open.
    pub fn is_collecting(&self) -> bool {
        self.collection_frames_left.load(Ordering::Acquire) > 0
    }

    /// Start hunting shaders for the group `id`, seeding every stage's marked set with the
    /// group's current hashes. Only one group can be hunted at a time.
    pub fn start_hunting(&self, id: GroupId) -> bool {
        let mut hunted = self.hunted_group.lock();
        if let Some(current) = *hunted {
            tracing::warn!("Already hunting for group {current}, can't start hunting for {id}.");
            return false;
        }

        let mut groups = self.groups.write();
        let Some(group) = groups.iter_mut().find(|group| group.id() == id) else {
            tracing::warn!("No toggle group with id {id}.");
            return false;
        };

        group.set_editing(true);
        for manager in &self.managers {
            manager.session().start(group.hashes(manager.stage()));
        }
        self.collection_frames_left
            .store(self.config.collection_frames, Ordering::Release);
        *hunted = Some(id);

        tracing::info!(
            "Hunting shaders for group {}, collecting for {} frames",
            group.name(),
            self.config.collection_frames
        );

        true
    }

    /// Stop the current hunt. With `commit` the marked shaders replace the group's hashes.
    pub fn stop_hunting(&self, commit: bool) -> bool {
        let mut hunted = self.hunted_group.lock();
        let Some(id) = hunted.take() else {
            return false;
        };

        let mut marked: [HashSet<ShaderHash>; ShaderStage::COUNT] = Default::default();
        for manager in &self.managers {
            manager
                .session()
                .stop(commit, &mut marked[manager.stage().index()]);
        }
        self.collection_frames_left.store(0, Ordering::Release);

        let mut groups = self.groups.write();
        if let Some(group) = groups.iter_mut().find(|group| group.id() == id) {
            if commit {
                group.store_collected_hashes(
                    &marked[ShaderStage::Pixel.index()],
                    &marked[ShaderStage::Vertex.index()],
                    &marked[ShaderStage::Compute.index()],
                );
                tracing::info!(
                    "Stored {} pixel, {} vertex and {} compute shader(s) in group {}",
                    marked[ShaderStage::Pixel.index()].len(),
                    marked[ShaderStage::Vertex.index()].len(),
                    marked[ShaderStage::Compute.index()].len(),
                    group.name()
                );
            } else {
                tracing::info!("Stopped hunting for group {} without changes", group.name());
            }
            group.set_editing(false);
        }

        true
    }

    /// Run a navigation command on the session of `stage`. Ignored until collection is done.
    pub fn apply(&self, stage: ShaderStage, command: HuntCommand) {
        if self.is_collecting() {
            tracing::debug!("Still collecting shaders, ignoring {command:?}");
            return;
        }

        let session = self.manager(stage).session();
        match command {
            HuntCommand::Previous => session.select_previous(),
            HuntCommand::Next => session.select_next(),
            HuntCommand::PreviousMarked => session.select_previous_marked(),
            HuntCommand::NextMarked => session.select_next_marked(),
            HuntCommand::ToggleMark => session.toggle_mark_on_selection(),
        }
    }

    /// Flip the hide-marked flag of every stage.
    pub fn toggle_hide_marked(&self) {
        for manager in &self.managers {
            manager.session().marked().toggle_hide_marked();
        }
    }
}

// Key binding capture.
impl ShaderToggler {
    /// Start capturing a new toggle key for the group `id`. A capture in progress for another
    /// group is abandoned.
    pub fn start_key_capture(&self, id: GroupId) -> bool {
        if !self.groups.read().iter().any(|group| group.id() == id) {
            return false;
        }

        let mut capture = self.key_capture.lock();
        if let Some(previous) = capture.group {
            if previous != id {
                tracing::debug!("Abandoning key capture for group {previous}");
            }
        }
        capture.group = Some(id);
        capture.collector.clear();
        true
    }

    pub fn capture_keys(&self, input: &InputState) {
        let mut capture = self.key_capture.lock();
        if capture.group.is_some() {
            capture.collector.collect_keys_pressed(input);
        }
    }

    /// The group being bound and the chord collected so far.
    pub fn key_capture(&self) -> Option<(GroupId, KeyChord)> {
        let capture = self.key_capture.lock();
        capture.group.map(|group| (group, capture.collector))
    }

    /// Finish the capture. The chord is applied only when accepted and a key was pressed.
    pub fn end_key_capture(&self, accept: bool) -> bool {
        let (group, chord) = {
            let mut capture = self.key_capture.lock();
            let chord = capture.collector;
            capture.collector.clear();
            (capture.group.take(), chord)
        };

        let Some(id) = group else {
            return false;
        };
        if !accept || !chord.is_valid() {
            return false;
        }

        self.update_group(id, |group| {
            group.set_toggle_key_captured(chord);
            tracing::info!("Group {} is now toggled with {chord}", group.name());
        })
        .is_some()
    }
}

// Groups.
impl ShaderToggler {
    pub fn groups(&self) -> Vec<ToggleGroup> {
        self.groups.read().clone()
    }

    pub fn group(&self, id: GroupId) -> Option<ToggleGroup> {
        self.groups
            .read()
            .iter()
            .find(|group| group.id() == id)
            .cloned()
    }

    pub fn add_default_group(&self) -> GroupId {
        let group = groups::default_group();
        let id = group.id();
        tracing::info!("Added toggle group {} ({id})", group.name());
        self.groups.write().push(group);
        id
    }

    /// Remove the group `id`, ending a hunt or key capture that targets it.
    pub fn remove_group(&self, id: GroupId) -> bool {
        if self.hunted_group() == Some(id) {
            self.stop_hunting(false);
        }
        {
            let mut capture = self.key_capture.lock();
            if capture.group == Some(id) {
                capture.group = None;
                capture.collector.clear();
            }
        }

        let mut groups = self.groups.write();
        let Some(position) = groups.iter().position(|group| group.id() == id) else {
            return false;
        };
        let group = groups.remove(position);
        tracing::info!("Removed toggle group {} ({id})", group.name());
        true
    }

    pub fn update_group<R>(&self, id: GroupId, f: impl FnOnce(&mut ToggleGroup) -> R) -> Option<R> {
        self.groups
            .write()
            .iter_mut()
            .find(|group| group.id() == id)
            .map(f)
    }

    /// Replace all groups. A hunt in progress is cancelled first.
    pub fn set_groups(&self, groups: Vec<ToggleGroup>) {
        self.stop_hunting(false);
        *self.key_capture.lock() = KeyCapture::default();
        *self.groups.write() = groups;
    }

    pub fn load_groups(&self) -> Result<(), IniError> {
        let groups = groups::load_groups_file(&self.config.groups_file)?;
        self.set_groups(groups);
        Ok(())
    }

    pub fn save_groups(&self) -> Result<(), IniError> {
        groups::save_groups_file(&self.config.groups_file, &self.groups.read())
    }
}

// Overlay.
impl ShaderToggler {
    pub fn stats(&self) -> TogglerStats {
        let mut stats = TogglerStats {
            collection_frames_left: self.collection_frames_left.load(Ordering::Acquire),
            hunted_group: self.hunted_group(),
            ..Default::default()
        };

        for manager in &self.managers {
            let registry = manager.registry();
            let session = manager.session();
            stats.stages[manager.stage().index()] = StageStats {
                live_handles: registry.count(),
                distinct_hashes: registry.distinct_hash_count(),
                collected: session.collected_count(),
                marked: session.marked().len(),
                hunting: session.is_active(),
                selection: session.selection(),
                selection_marked: session.is_selection_marked(),
                hide_marked: session.marked().hide_marked(),
            };
        }

        stats
    }
}
