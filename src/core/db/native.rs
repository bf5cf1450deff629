/// Native Client Boundary
///
/// This module describes the calling convention of the engine's native
/// client library. A binding to the vendor library implements
/// `NativeDriver` and `NativeSession`; everything else in the crate talks to
/// the engine only through these two traits.
///
/// The native API reports failure through `Option`/`bool` returns and keeps
/// the error state on the session, to be read back with `errorcode`,
/// `sqlstate` and `error`. `ErrorInfo::from_session` turns that state into a
/// structured value.
use crate::core::db::dialect::{Dialect, SQL_ANYWHERE};
use serde::Serialize;
use std::fmt;

/// Opaque identifier of a native prepared statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementHandle(pub u32);

/// A parameter or cell value crossing the native boundary.
///
/// The variant is chosen explicitly by the caller and decides the native
/// bind tag, so no type has to be guessed from the runtime kind of a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit integer
    Integer(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 text
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// SQL NULL
    Null,
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The native bind tag for this value.
    ///
    /// NULL binds as a string slot; the null flag passed alongside it is what
    /// tells the engine the value is absent.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Integer(_) => TypeTag::Integer,
            Value::Float(_) => TypeTag::Double,
            Value::Text(_) | Value::Null => TypeTag::String,
            Value::Bytes(_) => TypeTag::Blob,
        }
    }

    /// Integer view of the value, parsing text when needed
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            Value::Text(t) => t.trim().parse().ok(),
            Value::Bytes(_) | Value::Null => None,
        }
    }

    /// Text view of the value; NULL has none
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(t) => Some(t.clone()),
            Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Value::Null => None,
        }
    }

    /// Boolean view of the value. Catalog flags come back either as numbers
    /// or as `Y`/`N` characters.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(t) => matches!(
                t.trim().to_ascii_uppercase().as_str(),
                "1" | "Y" | "YES" | "T" | "TRUE"
            ),
            Value::Bytes(b) => !b.is_empty(),
            Value::Null => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(t) => write!(f, "{t}"),
            Value::Bytes(b) => write!(f, "<BLOB: {} bytes>", b.len()),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Bind type tag understood by the native bind call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Integer,
    Double,
    String,
    Blob,
}

impl TypeTag {
    /// The single-character code the native bind call expects
    pub fn code(self) -> char {
        match self {
            TypeTag::Integer => 'i',
            TypeTag::Double => 'd',
            TypeTag::String => 's',
            TypeTag::Blob => 'b',
        }
    }
}

/// Materialized result of a native query.
///
/// Statements that produce no rows come back as an empty set with no
/// columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Creates a new ResultSet from column names and row data
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        ResultSet { columns, rows }
    }

    /// Creates a result set with no columns and no rows
    pub fn empty() -> Self {
        ResultSet::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Iterates rows with by-name access
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row { set: self, values })
    }

    /// First row, if any
    pub fn first(&self) -> Option<Row<'_>> {
        self.rows().next()
    }
}

/// Borrowed view of one row of a `ResultSet`.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    set: &'a ResultSet,
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Raw value of a column; unknown columns read as NULL
    pub fn get(&self, column: &str) -> &'a Value {
        const NULL: &Value = &Value::Null;
        self.set
            .column_index(column)
            .and_then(|i| self.values.get(i))
            .unwrap_or(NULL)
    }

    pub fn get_string(&self, column: &str) -> Option<String> {
        self.get(column).as_string()
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).as_i64()
    }

    pub fn get_bool(&self, column: &str) -> bool {
        self.get(column).as_bool()
    }
}

/// An open native session.
///
/// Methods take `&self`: a native session is a handle owned by the client
/// library, and the adapter never hands it to two callers at once.
pub trait NativeSession {
    /// Runs raw SQL. `None` means the engine reported an error.
    fn query(&self, sql: &str) -> Option<ResultSet>;

    /// Native error number of the last call; 0 means no error
    fn errorcode(&self) -> i32;

    /// Five-character standardized status of the last call
    fn sqlstate(&self) -> String;

    /// Native error text of the last call
    fn error(&self) -> String;

    /// Escapes text for embedding inside a single-quoted literal
    fn real_escape_string(&self, text: &str) -> String;

    /// Last value generated for an autoincrement column
    fn insert_id(&self) -> u64;

    /// Rows touched by the last statement
    fn affected_rows(&self) -> u64;

    /// Sets a connection option such as `auto_commit`
    fn set_option(&self, option: &str, value: i32) -> bool;

    fn commit(&self) -> bool;

    fn rollback(&self) -> bool;

    /// Prepares SQL with `?` placeholders. `None` means the engine refused it.
    fn prepare(&self, sql: &str) -> Option<StatementHandle>;

    /// Binds one positional parameter
    fn stmt_bind_param_ex(
        &self,
        stmt: StatementHandle,
        index: usize,
        value: &Value,
        tag: TypeTag,
        is_null: bool,
    ) -> bool;

    fn stmt_execute(&self, stmt: StatementHandle) -> bool;

    /// Releases a native statement slot
    fn stmt_free_result(&self, stmt: StatementHandle) -> bool;

    fn close(&self);
}

/// Entry point of a native client library.
pub trait NativeDriver {
    type Session: NativeSession;

    /// Opens a transient session from a connection string.
    /// The error carries the native message text.
    fn connect(&self, dsn: &str) -> std::result::Result<Self::Session, String>;

    /// Opens a persistent session, reused by the client across opens.
    fn pconnect(&self, dsn: &str) -> std::result::Result<Self::Session, String>;

    /// Catalog SQL for the engine this driver talks to
    fn dialect(&self) -> &'static Dialect {
        &SQL_ANYWHERE
    }
}
