//! Shared test infrastructure
//!
//! A loopback native driver backed by SQLite. It speaks the native calling
//! convention (Option/bool returns plus error state on the session) so the
//! adapter can be exercised against a real transactional engine.

#![allow(dead_code)]

use rusqlite::types::{Value as SqliteValue, ValueRef};
use sasql_adapter::core::db::{NativeDriver, NativeSession, ResultSet, StatementHandle, TypeTag, Value};
use sasql_adapter::ConnectionSettings;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Installs a test-writer subscriber once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn settings() -> ConnectionSettings {
    ConnectionSettings::new("loopback", "demo", "localhost", "dba", "secret")
}

/// A temporary database file shared by every session of a test
pub struct Scratch {
    _dir: TempDir,
    path: PathBuf,
}

impl Scratch {
    pub fn new(setup_sql: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loopback.db");
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(setup_sql).unwrap();
        Scratch { _dir: dir, path }
    }

    pub fn driver(&self) -> LoopbackDriver {
        LoopbackDriver {
            path: self.path.clone(),
        }
    }

    /// Direct access that bypasses the adapter
    pub fn count(&self, sql: &str) -> i64 {
        let conn = rusqlite::Connection::open(&self.path).unwrap();
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }
}

pub struct LoopbackDriver {
    path: PathBuf,
}

impl LoopbackDriver {
    fn open(&self, path: &Path) -> Result<LoopbackSession, String> {
        let conn = rusqlite::Connection::open(path).map_err(|e| e.to_string())?;
        Ok(LoopbackSession {
            conn,
            last_error: RefCell::new(None),
            statements: RefCell::new(HashMap::new()),
            next_handle: Cell::new(0),
            bound_tags: RefCell::new(Vec::new()),
        })
    }
}

impl NativeDriver for LoopbackDriver {
    type Session = LoopbackSession;

    fn connect(&self, _dsn: &str) -> Result<LoopbackSession, String> {
        self.open(&self.path)
    }

    fn pconnect(&self, _dsn: &str) -> Result<LoopbackSession, String> {
        self.open(&self.path)
    }
}

struct PreparedSlots {
    sql: String,
    values: Vec<SqliteValue>,
}

pub struct LoopbackSession {
    conn: rusqlite::Connection,
    last_error: RefCell<Option<(i32, String)>>,
    statements: RefCell<HashMap<StatementHandle, PreparedSlots>>,
    next_handle: Cell<u32>,
    bound_tags: RefCell<Vec<TypeTag>>,
}

impl LoopbackSession {
    /// Bind tags received so far, in call order
    pub fn bound_tags(&self) -> Vec<TypeTag> {
        self.bound_tags.borrow().clone()
    }

    fn record<T>(&self, result: rusqlite::Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error.replace(None);
                Some(value)
            }
            Err(e) => {
                let code = match &e {
                    rusqlite::Error::SqliteFailure(err, _) => err.extended_code,
                    _ => -1,
                };
                self.last_error.replace(Some((code, e.to_string())));
                None
            }
        }
    }

    fn run(&self, sql: &str) -> rusqlite::Result<ResultSet> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_sqlite(row.get_ref(i)?));
            }
            out.push(values);
        }
        Ok(ResultSet::new(columns, out))
    }
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

fn to_sqlite(value: &Value, is_null: bool) -> SqliteValue {
    if is_null {
        return SqliteValue::Null;
    }
    match value {
        Value::Integer(i) => SqliteValue::Integer(*i),
        Value::Float(f) => SqliteValue::Real(*f),
        Value::Text(t) => SqliteValue::Text(t.clone()),
        Value::Bytes(b) => SqliteValue::Blob(b.clone()),
        Value::Null => SqliteValue::Null,
    }
}

impl NativeSession for LoopbackSession {
    fn query(&self, sql: &str) -> Option<ResultSet> {
        let result = self.run(sql);
        self.record(result)
    }

    fn errorcode(&self) -> i32 {
        self.last_error.borrow().as_ref().map_or(0, |(code, _)| *code)
    }

    fn sqlstate(&self) -> String {
        match self.last_error.borrow().as_ref() {
            Some(_) => "HY000".to_string(),
            None => "00000".to_string(),
        }
    }

    fn error(&self) -> String {
        self.last_error
            .borrow()
            .as_ref()
            .map(|(_, message)| message.clone())
            .unwrap_or_default()
    }

    fn real_escape_string(&self, text: &str) -> String {
        text.replace('\'', "''")
    }

    fn insert_id(&self) -> u64 {
        self.conn.last_insert_rowid() as u64
    }

    fn affected_rows(&self) -> u64 {
        self.conn.changes() as u64
    }

    fn set_option(&self, option: &str, value: i32) -> bool {
        if option != "auto_commit" {
            return true;
        }
        let result = match (value, self.conn.is_autocommit()) {
            (0, true) => self.conn.execute_batch("BEGIN"),
            (1, false) => self.conn.execute_batch("COMMIT"),
            _ => Ok(()),
        };
        self.record(result).is_some()
    }

    fn commit(&self) -> bool {
        if self.conn.is_autocommit() {
            return true;
        }
        let result = self.conn.execute_batch("COMMIT");
        self.record(result).is_some()
    }

    fn rollback(&self) -> bool {
        if self.conn.is_autocommit() {
            return true;
        }
        let result = self.conn.execute_batch("ROLLBACK");
        self.record(result).is_some()
    }

    fn prepare(&self, sql: &str) -> Option<StatementHandle> {
        let compiled = self.conn.prepare(sql).map(|stmt| stmt.parameter_count());
        let slots = self.record(compiled)?;

        let handle = StatementHandle(self.next_handle.get() + 1);
        self.next_handle.set(handle.0);
        self.statements.borrow_mut().insert(
            handle,
            PreparedSlots {
                sql: sql.to_string(),
                values: vec![SqliteValue::Null; slots],
            },
        );
        Some(handle)
    }

    fn stmt_bind_param_ex(
        &self,
        stmt: StatementHandle,
        index: usize,
        value: &Value,
        tag: TypeTag,
        is_null: bool,
    ) -> bool {
        let mut statements = self.statements.borrow_mut();
        let slot = statements
            .get_mut(&stmt)
            .and_then(|prepared| prepared.values.get_mut(index));
        match slot {
            Some(slot) => {
                *slot = to_sqlite(value, is_null);
                self.bound_tags.borrow_mut().push(tag);
                self.last_error.replace(None);
                true
            }
            None => {
                self.last_error
                    .replace(Some((-689, "Input parameter index out of range".to_string())));
                false
            }
        }
    }

    fn stmt_execute(&self, stmt: StatementHandle) -> bool {
        let (sql, values) = match self.statements.borrow().get(&stmt) {
            Some(prepared) => (prepared.sql.clone(), prepared.values.clone()),
            None => return false,
        };
        let result = self
            .conn
            .prepare_cached(&sql)
            .and_then(|mut cached| cached.execute(rusqlite::params_from_iter(values)));
        self.record(result).is_some()
    }

    fn stmt_free_result(&self, stmt: StatementHandle) -> bool {
        self.statements.borrow_mut().remove(&stmt).is_some()
    }

    fn close(&self) {}
}
