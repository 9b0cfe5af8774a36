use bitflags::bitflags;

use crate::input::{InputState, vk};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct Modifiers : u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
    }
}

/// A key plus the exact set of modifiers that must be held with it.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct KeyChord {
    key: u8,
    modifiers: Modifiers,
}

impl KeyChord {
    pub const NONE: Self = Self {
        key: 0,
        modifiers: Modifiers::empty(),
    };

    pub fn new(key: u8, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn caps_lock() -> Self {
        Self::new(vk::CAPITAL, Modifiers::empty())
    }

    pub fn key(&self) -> u8 {
        self.key
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// A chord without a key can never be pressed.
    pub fn is_valid(&self) -> bool {
        self.key > 0
    }

    pub fn clear(&mut self) {
        *self = Self::NONE;
    }

    /// Packs the chord as `key << 24 | alt << 16 | ctrl << 8 | shift`.
    pub fn encode_v1(&self) -> u32 {
        let bit = |flag: Modifiers| u32::from(self.modifiers.contains(flag));
        (u32::from(self.key) << 24)
            | (bit(Modifiers::ALT) << 16)
            | (bit(Modifiers::CTRL) << 8)
            | bit(Modifiers::SHIFT)
    }

    /// Inverse of [KeyChord::encode_v1]. Values without a key decode to `None`.
    pub fn decode_v1(value: u32) -> Option<Self> {
        let key = (value >> 24) as u8;
        if key == 0 {
            return None;
        }

        let mut modifiers = Modifiers::empty();
        modifiers.set(Modifiers::ALT, (value >> 16) & 0xFF == 1);
        modifiers.set(Modifiers::CTRL, (value >> 8) & 0xFF == 1);
        modifiers.set(Modifiers::SHIFT, value & 0xFF == 1);

        Some(Self::new(key, modifiers))
    }

    /// True on the frame the key goes down while exactly the required modifiers are held.
    pub fn is_pressed(&self, input: &InputState) -> bool {
        self.is_valid()
            && input.key_just_pressed(self.key)
            && input.modifiers() == self.modifiers
    }

    /// Accumulate a chord while the user is binding a key: the highest held non-modifier key wins
    /// together with whatever modifiers are held at that moment.
    pub fn collect_keys_pressed(&mut self, input: &InputState) {
        // Codes below 7 are mouse buttons.
        if let Some(key) = input
            .keys_down()
            .filter(|key| *key >= 7 && !is_modifier_key(*key))
            .last()
        {
            self.key = key;
            self.modifiers = input.modifiers();
        }
    }
}

impl std::fmt::Display for KeyChord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.is_valid() && self.modifiers.is_empty() {
            return write!(f, "Press a key");
        }

        if self.modifiers.contains(Modifiers::ALT) {
            write!(f, "Alt + ")?;
        }
        if self.modifiers.contains(Modifiers::CTRL) {
            write!(f, "Ctrl + ")?;
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            write!(f, "Shift + ")?;
        }
        if self.is_valid() {
            write!(f, "{}", key_name(self.key))?;
        }

        Ok(())
    }
}

fn is_modifier_key(key: u8) -> bool {
    matches!(
        key,
        vk::SHIFT
            | vk::CONTROL
            | vk::MENU
            | vk::LSHIFT
            | vk::RSHIFT
            | vk::LCONTROL
            | vk::RCONTROL
            | vk::LMENU
            | vk::RMENU
    )
}

/// Human readable name of a virtual-key code. Unassigned codes have an empty name.
pub fn key_name(key: u8) -> &'static str {
    KEY_NAMES[key as usize]
}

#[rustfmt::skip]
const KEY_NAMES: [&str; 256] = [
    "", "Left Mouse", "Right Mouse", "Cancel", "Middle Mouse", "X1 Mouse", "X2 Mouse", "", "Backspace", "Tab", "", "", "Clear", "Enter", "", "",
    "Shift", "Control", "Alt", "Pause", "Caps Lock", "", "", "", "", "", "", "Escape", "", "", "", "",
    "Space", "Page Up", "Page Down", "End", "Home", "Left Arrow", "Up Arrow", "Right Arrow", "Down Arrow", "Select", "", "", "Print Screen", "Insert", "Delete", "Help",
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "", "", "", "", "", "",
    "", "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O",
    "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "Left Windows", "Right Windows", "Apps", "", "Sleep",
    "Numpad 0", "Numpad 1", "Numpad 2", "Numpad 3", "Numpad 4", "Numpad 5", "Numpad 6", "Numpad 7", "Numpad 8", "Numpad 9", "Numpad *", "Numpad +", "", "Numpad -", "Numpad Decimal", "Numpad /",
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12", "F13", "F14", "F15", "F16",
    "F17", "F18", "F19", "F20", "F21", "F22", "F23", "F24", "", "", "", "", "", "", "", "",
    "Num Lock", "Scroll Lock", "", "", "", "", "", "", "", "", "", "", "", "", "", "",
    "Left Shift", "Right Shift", "Left Control", "Right Control", "Left Menu", "Right Menu", "Browser Back", "Browser Forward", "Browser Refresh", "Browser Stop", "Browser Search", "Browser Favorites", "Browser Home", "Volume Mute", "Volume Down", "Volume Up",
    "Next Track", "Previous Track", "Media Stop", "Media Play/Pause", "Mail", "Media Select", "Launch App 1", "Launch App 2", "", "", "OEM ;", "OEM +", "OEM ,", "OEM -", "OEM .", "OEM /",
    "OEM ~", "", "", "", "", "", "", "", "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "", "", "", "", "OEM [", "OEM \\", "OEM ]", "OEM '", "OEM 8",
    "", "", "OEM <", "", "", "", "", "", "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "Attn", "CrSel", "ExSel", "Erase EOF", "Play", "Zoom", "", "PA1", "OEM Clear", "",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout() {
        let chord = KeyChord::new(0x41, Modifiers::ALT | Modifiers::SHIFT);
        assert_eq!(chord.encode_v1(), 0x4101_0001);
        assert_eq!(KeyChord::decode_v1(0x4101_0001), Some(chord));

        let chord = KeyChord::new(vk::CAPITAL, Modifiers::CTRL);
        assert_eq!(chord.encode_v1(), 0x1400_0100);
    }

    #[test]
    fn decode_without_key_is_none() {
        assert_eq!(KeyChord::decode_v1(0), None);
        assert_eq!(KeyChord::decode_v1(0x0001_0101), None);
    }

    #[test]
    fn display() {
        assert_eq!(KeyChord::NONE.to_string(), "Press a key");
        assert_eq!(KeyChord::caps_lock().to_string(), "Caps Lock");
        assert_eq!(
            KeyChord::new(0x70, Modifiers::all()).to_string(),
            "Alt + Ctrl + Shift + F1"
        );
        assert_eq!(KeyChord::new(0, Modifiers::CTRL).to_string(), "Ctrl + ");
    }

    #[test]
    fn pressed_requires_exact_modifiers() {
        let chord = KeyChord::new(0x48, Modifiers::CTRL);

        let mut input = InputState::default();
        input.handle_key(0x48, true);
        assert!(!chord.is_pressed(&input));

        let mut input = InputState::default();
        input.handle_key(vk::CONTROL, true);
        input.handle_key(0x48, true);
        assert!(chord.is_pressed(&input));

        input.handle_key(vk::SHIFT, true);
        assert!(!chord.is_pressed(&input));

        assert!(!KeyChord::NONE.is_pressed(&input));
    }

    #[test]
    fn collecting_ignores_modifier_and_mouse_keys() {
        let mut chord = KeyChord::NONE;
        let mut input = InputState::default();
        input.handle_key(1, true);
        input.handle_key(vk::LSHIFT, true);
        chord.collect_keys_pressed(&input);
        assert!(!chord.is_valid());

        input.handle_key(0x5A, true);
        chord.collect_keys_pressed(&input);
        assert_eq!(chord, KeyChord::new(0x5A, Modifiers::SHIFT));

        // The chord survives releasing the keys.
        input.handle_key(0x5A, false);
        input.handle_key(vk::LSHIFT, false);
        chord.collect_keys_pressed(&input);
        assert_eq!(chord.to_string(), "Shift + Z");
    }

    #[test]
    fn every_code_has_a_name_slot() {
        assert_eq!(key_name(0x61), "Numpad 1");
        assert_eq!(key_name(0xFE), "OEM Clear");
        assert_eq!(key_name(0xFF), "");
    }
}
