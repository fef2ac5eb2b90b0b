// Command modules for the console panels

pub mod license;
pub mod panel;
