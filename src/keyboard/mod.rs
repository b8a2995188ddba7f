pub mod display;
pub mod mapping;
pub mod model;
