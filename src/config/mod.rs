pub mod groups;
pub mod ini;
pub mod settings;
