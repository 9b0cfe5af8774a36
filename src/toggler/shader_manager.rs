use super::{
    hunting::HuntingSession,
    registry::HashHandleRegistry,
    shader::{ObjectHandle, ShaderHash, ShaderStage},
};

/// Identity tracking and hunting for a single shader stage.
pub struct ShaderManager {
    stage: ShaderStage,
    registry: HashHandleRegistry,
    session: HuntingSession,
}

impl ShaderManager {
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            registry: HashHandleRegistry::default(),
            session: HuntingSession::default(),
        }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn registry(&self) -> &HashHandleRegistry {
        &self.registry
    }

    pub fn session(&self) -> &HuntingSession {
        &self.session
    }

    pub fn add_hash_handle_pair(&self, hash: ShaderHash, handle: ObjectHandle) {
        if let Some(orphan) = self.registry.record(hash, handle) {
            self.session.forget_hash(orphan);
        }
    }

    /// Forget `handle`. A hash whose last live object is gone can no longer be hunted.
    pub fn remove_handle(&self, handle: ObjectHandle) {
        if let Some(orphan) = self.registry.remove(handle) {
            tracing::trace!("{} shader {orphan} has no live objects left", self.stage);
            self.session.forget_hash(orphan);
        }
    }

    pub fn add_active_handle(&self, handle: ObjectHandle) {
        self.session.observe_bound_handle(&self.registry, handle);
    }

    pub fn shader_hash(&self, handle: ObjectHandle) -> ShaderHash {
        self.registry.resolve(handle)
    }

    /// Hunting block check for the object behind `handle`.
    pub fn is_blocked_handle(&self, handle: ObjectHandle) -> bool {
        self.session.is_blocked(self.registry.resolve(handle))
    }
}
