use std::path::PathBuf;

use strum::EnumCount;

use crate::{
    input::vk,
    toggler::{key_chord::Modifiers, shader::ShaderStage},
};

pub const DEFAULT_GROUPS_FILE: &str = "ShaderToggler.ini";

/// Frames to wait for a representative set of bound shaders before hunting starts.
pub const DEFAULT_COLLECTION_FRAMES: u32 = 250;

/// Keys that drive a hunting session for one shader stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HuntingKeys {
    pub previous: u8,
    pub next: u8,
    pub toggle_mark: u8,
}

#[derive(Clone, Debug)]
pub struct TogglerConfig {
    pub collection_frames: u32,
    pub groups_file: PathBuf,
    /// Indexed by [ShaderStage::index].
    pub hunting_keys: [HuntingKeys; ShaderStage::COUNT],
    /// Held together with previous/next to only visit marked shaders.
    pub marked_only_modifier: Modifiers,
}

impl TogglerConfig {
    pub fn hunting_keys(&self, stage: ShaderStage) -> HuntingKeys {
        self.hunting_keys[stage.index()]
    }
}

impl Default for TogglerConfig {
    fn default() -> Self {
        let keys = |previous, next, toggle_mark| HuntingKeys {
            previous,
            next,
            toggle_mark,
        };

        Self {
            collection_frames: DEFAULT_COLLECTION_FRAMES,
            groups_file: PathBuf::from(DEFAULT_GROUPS_FILE),
            hunting_keys: [
                // Vertex
                keys(vk::NUMPAD4, vk::NUMPAD5, vk::NUMPAD6),
                // Pixel
                keys(vk::NUMPAD1, vk::NUMPAD2, vk::NUMPAD3),
                // Compute
                keys(vk::NUMPAD7, vk::NUMPAD8, vk::NUMPAD9),
            ],
            marked_only_modifier: Modifiers::CTRL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hunting_keys_per_stage() {
        let config = TogglerConfig::default();
        assert_eq!(config.hunting_keys(ShaderStage::Pixel).next, vk::NUMPAD2);
        assert_eq!(config.hunting_keys(ShaderStage::Vertex).previous, vk::NUMPAD4);
        assert_eq!(
            config.hunting_keys(ShaderStage::Compute).toggle_mark,
            vk::NUMPAD9
        );
        assert_eq!(config.collection_frames, 250);
    }
}
