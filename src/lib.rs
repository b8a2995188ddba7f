// The binary in main.rs drives the terminal; everything it needs lives here so
// integration tests and criterion benches can reach the typing core directly.

pub mod app;
pub mod book;
pub mod config;
pub mod event;
pub mod keyboard;
pub mod logging;
pub mod session;
pub mod store;
pub mod ui;
