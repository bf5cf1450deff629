/// Capability Traits
///
/// The adapter surface a host framework programs against, split by concern.
/// `Connection` implements every trait by delegating to its inherent
/// methods, so hosts can write code generic over one capability instead of
/// over a concrete driver.
use crate::core::db::connection::Connection;
use crate::core::db::error_map::ErrorInfo;
use crate::core::db::native::{NativeDriver, ResultSet};
use crate::core::db::prepared::PreparedStatement;
use crate::core::db::schema::{ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor};
use crate::core::Result;
use std::collections::BTreeMap;

/// Session lifecycle
pub trait Connectable {
    fn connect(&mut self, persistent: bool) -> Result<()>;
    fn reconnect(&mut self) -> Result<()>;
    fn close(&mut self);
    fn is_connected(&self) -> bool;
    fn version(&self) -> Result<Option<String>>;
}

/// Raw statements and the helpers around them
pub trait Executable {
    fn execute(&self, sql: &str) -> Result<Option<ResultSet>>;
    fn escape(&self, text: &str) -> Result<String>;
    fn error_info(&self) -> ErrorInfo;
    fn insert_id(&self) -> Result<u64>;
    fn affected_rows(&self) -> Result<u64>;
}

/// Parameterized statements
pub trait Preparable {
    type Statement<'a>
    where
        Self: 'a;

    fn prepare(&self, sql: &str) -> Result<Self::Statement<'_>>;
}

/// Catalog introspection
pub trait Introspectable {
    fn list_tables(&self, prefix: Option<&str>, exact_name: Option<&str>) -> Result<String>;
    fn list_columns(&self, table: &str) -> Result<String>;
    fn field_data(&self, table: &str) -> Result<Vec<ColumnDescriptor>>;
    fn index_data(&self, table: &str) -> Result<BTreeMap<String, IndexDescriptor>>;
    fn foreign_key_data(&self, table: &str) -> Result<BTreeMap<String, ForeignKeyDescriptor>>;
}

/// Single-level transactions
pub trait Transactional {
    fn begin(&self) -> Result<bool>;
    fn commit(&self) -> Result<bool>;
    fn rollback(&self) -> Result<bool>;
    fn in_transaction(&self) -> bool;
}

impl<D: NativeDriver> Connectable for Connection<D> {
    fn connect(&mut self, persistent: bool) -> Result<()> {
        Connection::connect(self, persistent)
    }

    fn reconnect(&mut self) -> Result<()> {
        Connection::reconnect(self)
    }

    fn close(&mut self) {
        Connection::close(self)
    }

    fn is_connected(&self) -> bool {
        Connection::is_connected(self)
    }

    fn version(&self) -> Result<Option<String>> {
        Connection::version(self)
    }
}

impl<D: NativeDriver> Executable for Connection<D> {
    fn execute(&self, sql: &str) -> Result<Option<ResultSet>> {
        Connection::execute(self, sql)
    }

    fn escape(&self, text: &str) -> Result<String> {
        Connection::escape(self, text)
    }

    fn error_info(&self) -> ErrorInfo {
        Connection::error_info(self)
    }

    fn insert_id(&self) -> Result<u64> {
        Connection::insert_id(self)
    }

    fn affected_rows(&self) -> Result<u64> {
        Connection::affected_rows(self)
    }
}

impl<D: NativeDriver> Preparable for Connection<D> {
    type Statement<'a> = PreparedStatement<'a, D> where Self: 'a;

    fn prepare(&self, sql: &str) -> Result<PreparedStatement<'_, D>> {
        Connection::prepare(self, sql)
    }
}

impl<D: NativeDriver> Introspectable for Connection<D> {
    fn list_tables(&self, prefix: Option<&str>, exact_name: Option<&str>) -> Result<String> {
        Connection::list_tables(self, prefix, exact_name)
    }

    fn list_columns(&self, table: &str) -> Result<String> {
        Connection::list_columns(self, table)
    }

    fn field_data(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        Connection::field_data(self, table)
    }

    fn index_data(&self, table: &str) -> Result<BTreeMap<String, IndexDescriptor>> {
        Connection::index_data(self, table)
    }

    fn foreign_key_data(&self, table: &str) -> Result<BTreeMap<String, ForeignKeyDescriptor>> {
        Connection::foreign_key_data(self, table)
    }
}

impl<D: NativeDriver> Transactional for Connection<D> {
    fn begin(&self) -> Result<bool> {
        Connection::begin(self)
    }

    fn commit(&self) -> Result<bool> {
        Connection::commit(self)
    }

    fn rollback(&self) -> Result<bool> {
        Connection::rollback(self)
    }

    fn in_transaction(&self) -> bool {
        Connection::in_transaction(self)
    }
}
