//! Tracks shaders by content hash, lets an operator hunt through the ones that are currently
//! drawn, and hides key-bound groups of them at render time.

pub mod config;
pub mod input;
pub mod toggler;

pub mod prelude {
    pub use crate::config::{ini::IniError, settings::TogglerConfig};
    pub use crate::input::InputState;
    pub use crate::toggler::prelude::*;
}
