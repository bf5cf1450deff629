//! SQL Anywhere driver adapter.
//!
//! Builds connection strings, runs raw and prepared statements, toggles
//! transactions and reconstructs table metadata from the system catalog,
//! all on top of a native client modelled by `NativeDriver`.

pub mod config;
pub mod core;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

pub use crate::config::{Config, ConnectionSettings};
pub use crate::core::db::{
    ColumnDescriptor, Connection, ErrorInfo, ForeignKeyDescriptor, IndexDescriptor, IndexKind,
    NativeDriver, NativeSession, PreparedStatement, ResultSet, Value,
};
pub use crate::core::{DriverError, Result};
