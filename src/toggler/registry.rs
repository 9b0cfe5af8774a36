use ahash::HashMap;
use parking_lot::RwLock;

use super::shader::{ObjectHandle, ShaderHash};

#[derive(Default)]
struct RegistryInner {
    /// An entry exists iff the object is live.
    handle_to_hash: HashMap<ObjectHandle, ShaderHash>,
    /// Number of live handles per hash. The key set is the set of known hashes.
    hash_refs: HashMap<ShaderHash, u32>,
}

impl RegistryInner {
    /// Drop one reference to `hash`, returning it if that was the last one.
    fn release(&mut self, hash: ShaderHash) -> Option<ShaderHash> {
        let refs = self.hash_refs.get_mut(&hash)?;
        *refs -= 1;
        if *refs == 0 {
            self.hash_refs.remove(&hash);
            Some(hash)
        } else {
            None
        }
    }
}

/// Bidirectional bookkeeping between live object handles and shader hashes for a single stage.
///
/// All operations are total. Unknown handles resolve to [ShaderHash::INVALID].
#[derive(Default)]
pub struct HashHandleRegistry {
    inner: RwLock<RegistryInner>,
}

impl HashHandleRegistry {
    /// Associate `handle` with `hash`. Ignored if either is the invalid sentinel.
    ///
    /// Returns the hash the handle previously mapped to if that hash lost its last live handle
    /// because of the overwrite.
    pub fn record(&self, hash: ShaderHash, handle: ObjectHandle) -> Option<ShaderHash> {
        if !hash.is_valid() || !handle.is_valid() {
            return None;
        }

        let mut inner = self.inner.write();
        let previous = inner.handle_to_hash.insert(handle, hash);
        if previous == Some(hash) {
            return None;
        }
        *inner.hash_refs.entry(hash).or_default() += 1;

        previous.and_then(|previous| inner.release(previous))
    }

    /// Forget `handle`. Returns its hash if no other live handle maps to it anymore.
    pub fn remove(&self, handle: ObjectHandle) -> Option<ShaderHash> {
        let mut inner = self.inner.write();
        let hash = inner.handle_to_hash.remove(&handle)?;
        inner.release(hash)
    }

    pub fn resolve(&self, handle: ObjectHandle) -> ShaderHash {
        self.inner
            .read()
            .handle_to_hash
            .get(&handle)
            .copied()
            .unwrap_or(ShaderHash::INVALID)
    }

    pub fn is_known_handle(&self, handle: ObjectHandle) -> bool {
        self.inner.read().handle_to_hash.contains_key(&handle)
    }

    pub fn is_known_hash(&self, hash: ShaderHash) -> bool {
        self.inner.read().hash_refs.contains_key(&hash)
    }

    /// Number of live handles.
    pub fn count(&self) -> usize {
        self.inner.read().handle_to_hash.len()
    }

    pub fn distinct_hash_count(&self) -> usize {
        self.inner.read().hash_refs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_resolve_remove() {
        let registry = HashHandleRegistry::default();
        registry.record(ShaderHash(111), ObjectHandle(1));
        assert_eq!(registry.resolve(ObjectHandle(1)), ShaderHash(111));
        assert!(registry.is_known_handle(ObjectHandle(1)));

        registry.remove(ObjectHandle(1));
        assert_eq!(registry.resolve(ObjectHandle(1)), ShaderHash::INVALID);
        assert!(!registry.is_known_handle(ObjectHandle(1)));
        assert_eq!(registry.count(), 0);
        assert_eq!(registry.distinct_hash_count(), 0);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let registry = HashHandleRegistry::default();
        registry.record(ShaderHash::INVALID, ObjectHandle(1));
        registry.record(ShaderHash(5), ObjectHandle::INVALID);
        assert_eq!(registry.count(), 0);
        assert_eq!(registry.distinct_hash_count(), 0);
    }

    #[test]
    fn unknown_handle_resolves_to_sentinel() {
        let registry = HashHandleRegistry::default();
        assert_eq!(registry.resolve(ObjectHandle(42)), ShaderHash::INVALID);
        assert_eq!(registry.remove(ObjectHandle(42)), None);
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = HashHandleRegistry::default();
        registry.record(ShaderHash(9), ObjectHandle(3));
        registry.record(ShaderHash(9), ObjectHandle(4));

        assert_eq!(registry.remove(ObjectHandle(3)), None);
        assert_eq!(registry.remove(ObjectHandle(3)), None);
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.distinct_hash_count(), 1);
        assert_eq!(registry.resolve(ObjectHandle(4)), ShaderHash(9));
    }

    #[test]
    fn hash_is_orphaned_only_by_last_handle() {
        let registry = HashHandleRegistry::default();
        registry.record(ShaderHash(9), ObjectHandle(1));
        registry.record(ShaderHash(9), ObjectHandle(2));
        registry.record(ShaderHash(10), ObjectHandle(3));
        assert_eq!(registry.count(), 3);
        assert_eq!(registry.distinct_hash_count(), 2);

        assert_eq!(registry.remove(ObjectHandle(1)), None);
        assert!(registry.is_known_hash(ShaderHash(9)));
        assert_eq!(registry.remove(ObjectHandle(2)), Some(ShaderHash(9)));
        assert!(!registry.is_known_hash(ShaderHash(9)));
        assert_eq!(registry.distinct_hash_count(), 1);
    }

    #[test]
    fn overwrite_follows_most_recent_record() {
        let registry = HashHandleRegistry::default();
        assert_eq!(registry.record(ShaderHash(1), ObjectHandle(8)), None);
        assert_eq!(registry.record(ShaderHash(1), ObjectHandle(8)), None);
        assert_eq!(registry.distinct_hash_count(), 1);

        assert_eq!(
            registry.record(ShaderHash(2), ObjectHandle(8)),
            Some(ShaderHash(1))
        );
        assert_eq!(registry.resolve(ObjectHandle(8)), ShaderHash(2));
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.distinct_hash_count(), 1);
        assert!(!registry.is_known_hash(ShaderHash(1)));
    }

    #[test]
    fn churn_from_several_threads_stays_consistent() {
        let registry = HashHandleRegistry::default();
        std::thread::scope(|scope| {
            for thread in 0..4u64 {
                let registry = &registry;
                scope.spawn(move || {
                    for i in 1..=500u64 {
                        let handle = ObjectHandle(thread * 1000 + i);
                        registry.record(ShaderHash((i % 17) as u32 + 1), handle);
                        if i % 2 == 0 {
                            registry.remove(handle);
                        }
                        let _ = registry.resolve(handle);
                    }
                });
            }
        });

        assert_eq!(registry.count(), 4 * 250);
        assert_eq!(registry.distinct_hash_count(), 17);
    }
}
