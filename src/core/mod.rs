/// Core Module
///
/// Database adapter and the shared error type.
pub mod db;
pub mod error;

pub use error::{DriverError, Result};
