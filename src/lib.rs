pub mod config;
pub mod controls;
pub mod error;
pub mod overlay;
pub mod page;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod watcher;
