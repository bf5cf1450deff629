/// Query Execution Module
///
/// Runs raw SQL through an open connection and exposes the native escaping
/// and error helpers that go with it.
use crate::core::db::connection::Connection;
use crate::core::db::dialect::CatalogQuery;
use crate::core::db::error_map::ErrorInfo;
use crate::core::db::native::{NativeDriver, NativeSession, ResultSet};
use crate::core::{DriverError, Result};
use tracing::error;

impl<D: NativeDriver> Connection<D> {
    /// Executes raw SQL.
    ///
    /// # Returns
    ///
    /// `Ok(Some(rows))` on success. On failure the error is logged and, in
    /// the default mode, `Ok(None)` is returned; inspect `error_info()` for
    /// the details.
    ///
    /// # Errors
    ///
    /// `DriverError::Statement` when the statement fails in strict mode,
    /// `DriverError::NotConnected` when there is no session.
    pub fn execute(&self, sql: &str) -> Result<Option<ResultSet>> {
        if let Some(set) = self.native_query(sql)? {
            return Ok(Some(set));
        }

        let info = self.error_info();
        error!(code = %info.code, message = %info.message, sql, "statement failed");
        if self.is_strict() {
            return Err(DriverError::Statement(info));
        }
        Ok(None)
    }

    /// Executes SQL and discards any rows
    pub fn simple_query(&self, sql: &str) -> Result<bool> {
        Ok(self.execute(sql)?.is_some())
    }

    /// Runs SQL without logging or strict-mode handling.
    /// `None` means the engine reported an error.
    pub(crate) fn native_query(&self, sql: &str) -> Result<Option<ResultSet>> {
        Ok(self.session()?.query(sql))
    }

    /// Native escaping for embedding text inside a single-quoted literal
    pub fn escape(&self, text: &str) -> Result<String> {
        Ok(self.session()?.real_escape_string(text))
    }

    /// Escaped text wrapped in single quotes
    pub fn quote(&self, text: &str) -> Result<String> {
        Ok(format!("'{}'", self.escape(text)?))
    }

    /// Escapes text for a `LIKE` pattern.
    ///
    /// The wildcards `%` and `_`, the character class opener `[` and the
    /// escape character itself are prefixed with the dialect's LIKE escape
    /// character; the pattern must be used with a matching `ESCAPE` clause.
    pub fn escape_like(&self, text: &str) -> Result<String> {
        let escaped = self.escape(text)?;
        Ok(escape_like_pattern(&escaped, self.dialect().like_escape_char))
    }

    /// Latest error of the session; the `"00000"` sentinel when there is
    /// none or no session is open
    pub fn error_info(&self) -> ErrorInfo {
        match &self.session {
            Some(session) => ErrorInfo::from_session(session),
            None => ErrorInfo::none(),
        }
    }

    /// Value generated for an autoincrement column by the last insert
    pub fn insert_id(&self) -> Result<u64> {
        Ok(self.session()?.insert_id())
    }

    /// Rows touched by the last statement
    pub fn affected_rows(&self) -> Result<u64> {
        Ok(self.session()?.affected_rows())
    }

    /// Toggles foreign key checking for the session.
    ///
    /// Disabling defers the checks to commit time.
    pub fn set_foreign_key_checks(&self, enabled: bool) -> Result<bool> {
        let query = if enabled {
            CatalogQuery::EnableForeignKeyChecks
        } else {
            CatalogQuery::DisableForeignKeyChecks
        };
        let sql = self.dialect().sql(query)?;
        self.simple_query(sql)
    }
}

/// Prefixes `%`, `_`, `[` and `escape_char` with `escape_char`
pub fn escape_like_pattern(text: &str, escape_char: char) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        if c == escape_char || matches!(c, '%' | '_' | '[') {
            out.push(escape_char);
        }
        out.push(c);
    }
    out
}
