//! Utility functions

mod filename;
mod sanitize;

pub use filename::format_filename;
pub use sanitize::sanitize_component;
