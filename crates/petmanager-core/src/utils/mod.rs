//! Utility functions for display formatting.

pub mod format;

pub use format::{format_cpf, format_optional, format_phone, truncate_string};
