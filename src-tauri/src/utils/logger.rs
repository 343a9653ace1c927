//! Component-scoped logging on top of the `log` facade.
//!
//! Records go to whatever logger the app installed (`tauri-plugin-log` at
//! runtime, nothing in unit tests) with the component name as the target,
//! so `[ipc]` and `[markdown]` lines can be filtered independently.

use std::fmt::Display;
use std::time::Instant;

/// Logger struct for scoped logging
#[derive(Debug, Clone)]
pub struct Logger {
    component: String,
}

impl Logger {
    /// Create a new logger for a specific component
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn debug(&self, message: impl Display) {
        log::debug!(target: &self.component, "{}", message);
    }

    pub fn info(&self, message: impl Display) {
        log::info!(target: &self.component, "{}", message);
    }

    pub fn warn(&self, message: impl Display) {
        log::warn!(target: &self.component, "{}", message);
    }

    pub fn error(&self, message: impl Display) {
        log::error!(target: &self.component, "{}", message);
    }

    /// Time an operation, logging its duration at debug level
    pub fn time<F, R>(&self, operation: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let duration = start.elapsed();

        log::debug!(
            target: &self.component,
            "{} completed in {:.2}ms",
            operation,
            duration.as_secs_f64() * 1000.0
        );

        result
    }
}
