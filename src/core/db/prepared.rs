/// Prepared Statement Module
///
/// Prepares parameterized SQL, keeps one positional slot per `?` marker and
/// binds every slot with an explicit type tag on each execution.
use crate::core::db::connection::Connection;
use crate::core::db::error_map::ErrorInfo;
use crate::core::db::native::{NativeDriver, NativeSession, StatementHandle, Value};
use crate::core::{DriverError, Result};
use tracing::{debug, error};

#[derive(Clone, Copy, PartialEq)]
enum ScanState {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
}

/// Counts `?` parameter markers.
///
/// Markers inside string literals, quoted identifiers and comments (`--`,
/// `//` and `/* */`) are not parameters and are skipped.
pub fn count_placeholders(sql: &str) -> usize {
    let mut state = ScanState::Normal;
    let mut count = 0;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        state = match state {
            ScanState::Normal => match c {
                '?' => {
                    count += 1;
                    ScanState::Normal
                }
                '\'' => ScanState::SingleQuoted,
                '"' => ScanState::DoubleQuoted,
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    ScanState::LineComment
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    ScanState::LineComment
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    ScanState::BlockComment
                }
                _ => ScanState::Normal,
            },
            // a doubled quote closes and immediately reopens the literal
            ScanState::SingleQuoted if c == '\'' => ScanState::Normal,
            ScanState::DoubleQuoted if c == '"' => ScanState::Normal,
            ScanState::LineComment if c == '\n' => ScanState::Normal,
            ScanState::BlockComment if c == '*' && chars.peek() == Some(&'/') => {
                chars.next();
                ScanState::Normal
            }
            other => other,
        };
    }

    count
}

/// A statement prepared on a connection.
///
/// Slots are allocated once at prepare time and keep their values across
/// executions, so a statement can be re-run after changing only some
/// parameters. The native statement is released by `close` or on drop.
pub struct PreparedStatement<'c, D: NativeDriver> {
    conn: &'c Connection<D>,
    sql: String,
    parameters: Vec<Value>,
    handle: Option<StatementHandle>,
    error: ErrorInfo,
}

impl<D: NativeDriver> Connection<D> {
    /// Prepares SQL with `?` placeholders.
    ///
    /// A statement the engine refuses is still returned in the default mode,
    /// with its error stored; executing it fails the precondition check.
    ///
    /// # Errors
    ///
    /// `DriverError::Database` when preparation fails in strict mode,
    /// `DriverError::NotConnected` when there is no session.
    pub fn prepare(&self, sql: &str) -> Result<PreparedStatement<'_, D>> {
        let session = self.session()?;
        let slots = count_placeholders(sql);
        debug!(sql, slots, "preparing statement");

        let handle = session.prepare(sql);
        let error = match handle {
            Some(_) => ErrorInfo::none(),
            None => {
                let info = ErrorInfo::from_session(session);
                error!(code = %info.code, message = %info.message, sql, "prepare failed");
                if self.is_strict() {
                    return Err(DriverError::Database(info));
                }
                info
            }
        };

        Ok(PreparedStatement {
            conn: self,
            sql: sql.to_string(),
            parameters: vec![Value::Null; slots],
            handle,
            error,
        })
    }
}

impl<'c, D: NativeDriver> PreparedStatement<'c, D> {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of positional slots
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Current slot values
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Whether a native statement is held
    pub fn is_prepared(&self) -> bool {
        self.handle.is_some()
    }

    /// Last prepare or execute error of this statement
    pub fn error_info(&self) -> &ErrorInfo {
        &self.error
    }

    /// Sets one slot without executing
    pub fn bind(&mut self, position: usize, value: impl Into<Value>) -> Result<()> {
        let count = self.parameters.len();
        let slot = self.parameters.get_mut(position).ok_or_else(|| {
            DriverError::Parameter(format!(
                "position {position} is out of range for {count} placeholder(s)"
            ))
        })?;
        *slot = value.into();
        Ok(())
    }

    /// Merges `values` into slots `0..values.len()` and executes.
    ///
    /// Slots past the supplied values keep what earlier calls bound.
    ///
    /// # Returns
    ///
    /// `Ok(true)` on success, `Ok(false)` when binding or execution fails in
    /// the default mode.
    ///
    /// # Errors
    ///
    /// `DriverError::PreparedStatementPrecondition` without a native
    /// statement, `DriverError::Parameter` for more values than slots,
    /// `DriverError::Database` on failure in strict mode.
    pub fn bind_and_execute(&mut self, values: &[Value]) -> Result<bool> {
        if self.handle.is_none() {
            return Err(DriverError::PreparedStatementPrecondition);
        }
        if values.len() > self.parameters.len() {
            return Err(DriverError::Parameter(format!(
                "{} value(s) supplied for {} placeholder(s)",
                values.len(),
                self.parameters.len()
            )));
        }

        for (slot, value) in self.parameters.iter_mut().zip(values) {
            *slot = value.clone();
        }
        self.execute()
    }

    /// Binds every slot with its type tag and null flag, then executes
    pub fn execute(&mut self) -> Result<bool> {
        let handle = self
            .handle
            .ok_or(DriverError::PreparedStatementPrecondition)?;
        let conn: &'c Connection<D> = self.conn;
        let session = conn.session()?;

        let bound = self.parameters.iter().enumerate().all(|(index, value)| {
            session.stmt_bind_param_ex(handle, index, value, value.type_tag(), value.is_null())
        });
        if !bound {
            let info = ErrorInfo::from_session(session);
            return self.fail(info);
        }

        if !session.stmt_execute(handle) {
            let info = ErrorInfo::from_session(session);
            return self.fail(info);
        }

        self.error = ErrorInfo::none();
        Ok(true)
    }

    fn fail(&mut self, info: ErrorInfo) -> Result<bool> {
        error!(code = %info.code, message = %info.message, sql = %self.sql, "prepared statement failed");
        self.error = info.clone();
        if self.conn.is_strict() {
            return Err(DriverError::Database(info));
        }
        Ok(false)
    }

    /// Releases the native statement.
    ///
    /// Returns whether a native statement was released by this call.
    pub fn close(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };
        match self.conn.session() {
            Ok(session) => session.stmt_free_result(handle),
            Err(_) => false,
        }
    }
}

impl<'c, D: NativeDriver> Drop for PreparedStatement<'c, D> {
    fn drop(&mut self) {
        self.close();
    }
}
