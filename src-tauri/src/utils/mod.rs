//! Utility modules for the host bridge.
//!
//! - `paths`: path categories and app directory resolution
//! - `initialization`: directory creation and default preferences
//! - `logger`: component-scoped logging
//! - `accent`: OS accent color lookup

pub mod accent;
pub mod initialization;
pub mod logger;
pub mod paths;

// Re-export commonly used functions
pub use initialization::initialize_app_directories;
pub use paths::{get_config_dir, get_preferences_path};
