pub mod coordinator;
pub mod hunting;
pub mod key_chord;
pub mod marked_set;
pub mod registry;
pub mod shader;
pub mod shader_manager;
pub mod toggle_group;

pub mod prelude {
    pub use super::coordinator::*;
    pub use super::hunting::Selection;
    pub use super::key_chord::*;
    pub use super::shader::*;
    pub use super::toggle_group::*;
}
