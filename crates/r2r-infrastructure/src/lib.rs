//! Local system adapters: configuration files, paths, file intake from the
//! terminal and the clipboard.

pub mod clipboard;
pub mod config_service;
pub mod file_source;
pub mod paths;

pub use clipboard::Osc52Clipboard;
pub use config_service::ConfigService;
pub use paths::R2rPaths;
