/// Transaction Control Module
///
/// Transactions toggle the native `auto_commit` option: `begin` switches it
/// off and `commit`/`rollback` switch it back on once the native call
/// succeeds. Only one level is tracked; there are no savepoints.
use crate::core::db::connection::Connection;
use crate::core::db::error_map::ErrorInfo;
use crate::core::db::native::{NativeDriver, NativeSession};
use crate::core::{DriverError, Result};
use tracing::{debug, error, warn};

const AUTO_COMMIT: &str = "auto_commit";

impl<D: NativeDriver> Connection<D> {
    /// Starts a transaction by disabling autocommit.
    ///
    /// # Errors
    ///
    /// `DriverError::Transaction` when a transaction is already active, or
    /// when the native option cannot be set in strict mode.
    pub fn begin(&self) -> Result<bool> {
        if self.in_transaction.get() {
            warn!(database = %self.settings.database, "begin called inside an active transaction");
            return Err(DriverError::Transaction(
                "a transaction is already active".to_string(),
            ));
        }

        let session = self.session()?;
        if !session.set_option(AUTO_COMMIT, 0) {
            return self.transaction_failure("begin", ErrorInfo::from_session(session));
        }

        debug!(database = %self.settings.database, "transaction started");
        self.in_transaction.set(true);
        Ok(true)
    }

    /// Commits the active transaction and restores autocommit
    pub fn commit(&self) -> Result<bool> {
        self.finish("commit", |session| session.commit())
    }

    /// Rolls back the active transaction and restores autocommit
    pub fn rollback(&self) -> Result<bool> {
        self.finish("rollback", |session| session.rollback())
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction.get()
    }

    fn finish(&self, action: &str, end: impl FnOnce(&D::Session) -> bool) -> Result<bool> {
        if !self.in_transaction.get() {
            warn!(action, "no active transaction");
            return Err(DriverError::Transaction(format!(
                "{action} called without an active transaction"
            )));
        }

        let session = self.session()?;
        if !end(session) {
            // the transaction stays open so the caller can retry or roll back
            return self.transaction_failure(action, ErrorInfo::from_session(session));
        }

        self.in_transaction.set(false);
        if !session.set_option(AUTO_COMMIT, 1) {
            return self.transaction_failure("restore autocommit", ErrorInfo::from_session(session));
        }

        debug!(database = %self.settings.database, action, "transaction finished");
        Ok(true)
    }

    fn transaction_failure(&self, action: &str, info: ErrorInfo) -> Result<bool> {
        error!(action, code = %info.code, message = %info.message, "transaction call failed");
        if self.is_strict() {
            return Err(DriverError::Transaction(format!("{action} failed: {info}")));
        }
        Ok(false)
    }
}
