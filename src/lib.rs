// Re-export modules needed by the console binary
pub mod commands;
pub mod license;
pub mod settings;

pub use license::{LicenseSnapshot, LicenseStore};
pub use settings::ConsoleSettings;
