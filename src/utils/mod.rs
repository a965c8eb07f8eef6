// Utilities
pub mod error;
pub mod formatter;

pub use error::{Result, StowageError};
