/// Database Module
///
/// The adapter between generic relational operations and the SQL Anywhere
/// native client, split into focused submodules:
///
/// - **Native boundary** (`native.rs`): traits a vendor binding implements, plus values and result sets
/// - **Connection Management** (`connection.rs`): connection string, session lifecycle, version cache
/// - **Query Execution** (`query.rs`): raw statements, escaping, error state
/// - **Prepared Statements** (`prepared.rs`): placeholder slots and typed binding
/// - **Transactions** (`transaction.rs`): autocommit toggling
/// - **Schema Introspection** (`schema.rs`): catalog queries and descriptors
/// - **Dialect** (`dialect.rs`): per-engine catalog SQL
///
/// ## Error Handling
///
/// Operations return `DriverError`. Statement failures are only raised in
/// strict (`debug`) mode; otherwise they are logged and reported through
/// `Ok(None)`/`Ok(false)` plus `error_info()`.
pub mod capabilities;
pub mod connection;
pub mod dialect;
pub mod error_map;
pub mod native;
pub mod prepared;
pub mod query;
pub mod schema;
pub mod transaction;

pub use capabilities::{Connectable, Executable, Introspectable, Preparable, Transactional};
pub use connection::{connection_string, masked_connection_string, Connection, PLATFORM};
pub use dialect::{CatalogQuery, Dialect, SQL_ANYWHERE};
pub use error_map::ErrorInfo;
pub use native::{NativeDriver, NativeSession, ResultSet, Row, StatementHandle, TypeTag, Value};
pub use prepared::{count_placeholders, PreparedStatement};
pub use query::escape_like_pattern;
pub use schema::{ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, IndexKind};
