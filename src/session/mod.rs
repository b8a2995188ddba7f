pub mod autosave;
pub mod input;
pub mod stats;
pub mod typing;
