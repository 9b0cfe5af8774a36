use strum::{Display, EnumCount, EnumIter};

/// 32-bit fingerprint of a shader's compiled bytecode. `0` is reserved and never stored.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShaderHash(pub u32);

impl ShaderHash {
    pub const INVALID: Self = Self(0);

    /// CRC-32 of the given bytecode. Never returns [ShaderHash::INVALID].
    pub fn of_bytecode(bytecode: &[u8]) -> Self {
        match crc32fast::hash(bytecode) {
            0 => Self(1),
            hash => Self(hash),
        }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for ShaderHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// Host assigned id of a live pipeline object. Reused after the object is destroyed.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectHandle(pub u64);

impl ObjectHandle {
    pub const INVALID: Self = Self(0);

    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

#[derive(Clone, Copy, Debug, Display, EnumCount, EnumIter, Eq, Hash, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Compute,
}

impl ShaderStage {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}
