use ahash::HashSet;

use crate::toggler::key_chord::Modifiers;

/// Windows virtual-key codes used by the toggler.
pub mod vk {
    pub const SHIFT: u8 = 0x10;
    pub const CONTROL: u8 = 0x11;
    pub const MENU: u8 = 0x12;
    pub const CAPITAL: u8 = 0x14;
    pub const NUMPAD1: u8 = 0x61;
    pub const NUMPAD2: u8 = 0x62;
    pub const NUMPAD3: u8 = 0x63;
    pub const NUMPAD4: u8 = 0x64;
    pub const NUMPAD5: u8 = 0x65;
    pub const NUMPAD6: u8 = 0x66;
    pub const NUMPAD7: u8 = 0x67;
    pub const NUMPAD8: u8 = 0x68;
    pub const NUMPAD9: u8 = 0x69;
    pub const LSHIFT: u8 = 0xA0;
    pub const RSHIFT: u8 = 0xA1;
    pub const LCONTROL: u8 = 0xA2;
    pub const RCONTROL: u8 = 0xA3;
    pub const LMENU: u8 = 0xA4;
    pub const RMENU: u8 = 0xA5;
}

/// Keyboard state for the current frame, keyed by virtual-key code.
///
/// The host feeds key transitions through [InputState::handle_key] and calls
/// [InputState::reset_current_frame] once the frame has been processed.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    key_down: HashSet<u8>,
    key_just_pressed: HashSet<u8>,
}

impl InputState {
    pub fn handle_key(&mut self, key: u8, pressed: bool) {
        if pressed {
            // Auto-repeat does not count as a new press.
            if self.key_down.insert(key) {
                self.key_just_pressed.insert(key);
            }
        } else {
            self.key_down.remove(&key);
        }
    }

    /// Reset data being tracked per frame.
    pub fn reset_current_frame(&mut self) {
        self.key_just_pressed.clear();
    }
}

impl InputState {
    pub fn key_down(&self, key: u8) -> bool {
        self.key_down.contains(&key)
    }

    pub fn key_just_pressed(&self, key: u8) -> bool {
        self.key_just_pressed.contains(&key)
    }

    /// Keys currently held, in ascending code order.
    pub fn keys_down(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|key| self.key_down.contains(key))
    }

    pub fn modifiers(&self) -> Modifiers {
        let any = |keys: &[u8]| keys.iter().any(|key| self.key_down(*key));

        let mut modifiers = Modifiers::empty();
        modifiers.set(Modifiers::SHIFT, any(&[vk::SHIFT, vk::LSHIFT, vk::RSHIFT]));
        modifiers.set(
            Modifiers::CTRL,
            any(&[vk::CONTROL, vk::LCONTROL, vk::RCONTROL]),
        );
        modifiers.set(Modifiers::ALT, any(&[vk::MENU, vk::LMENU, vk::RMENU]));
        modifiers
    }
}
