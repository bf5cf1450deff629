/// Connection Management Module
///
/// This module builds the engine connection string, opens and closes the
/// native session and keeps the per-connection state (transaction flag,
/// cached engine version).
use crate::config::ConnectionSettings;
use crate::core::db::dialect::{CatalogQuery, Dialect};
use crate::core::db::error_map::ErrorInfo;
use crate::core::db::native::{NativeDriver, NativeSession};
use crate::core::{DriverError, Result};
use once_cell::unsync::OnceCell;
use std::cell::Cell;
use tracing::{debug, error, info};

/// Seconds the native client keeps retrying a refused TCP connect.
pub const RETRY_CONNECTION_TIMEOUT: u32 = 2;

/// Name reported by `Connection::platform`.
pub const PLATFORM: &str = "SASQL";

/// Builds the engine connection string for the given settings.
///
/// The format is fixed by the native client:
/// `ServerName=..;DatabaseName=..;RetryConnTO=2;CommLinks=tcpip(Host=..;PORT=..);UID=..;ENP=..;CharSet=..`
pub fn connection_string(settings: &ConnectionSettings) -> String {
    format_connection_string(settings, &settings.password)
}

/// Connection string with the password replaced, for logging.
pub fn masked_connection_string(settings: &ConnectionSettings) -> String {
    format_connection_string(settings, "****")
}

fn format_connection_string(settings: &ConnectionSettings, password: &str) -> String {
    let password_key = if settings.password_encrypted { "ENP" } else { "PWD" };
    format!(
        "ServerName={};DatabaseName={};RetryConnTO={};CommLinks=tcpip(Host={};PORT={});UID={};{}={};CharSet={}",
        settings.engine,
        settings.database,
        RETRY_CONNECTION_TIMEOUT,
        settings.hostname,
        settings.port,
        settings.username,
        password_key,
        password,
        settings.charset,
    )
}

/// A connection to one database through a native driver.
///
/// The native session exists only between a successful `connect` and
/// `close`. Operations that need it return `DriverError::NotConnected`
/// otherwise.
pub struct Connection<D: NativeDriver> {
    pub(super) driver: D,
    pub(super) settings: ConnectionSettings,
    pub(super) session: Option<D::Session>,
    pub(super) persistent: bool,
    pub(super) in_transaction: Cell<bool>,
    pub(super) version: OnceCell<String>,
}

impl<D: NativeDriver> Connection<D> {
    /// Creates an unopened connection
    pub fn new(driver: D, settings: ConnectionSettings) -> Self {
        Connection {
            driver,
            persistent: settings.persistent,
            settings,
            session: None,
            in_transaction: Cell::new(false),
            version: OnceCell::new(),
        }
    }

    /// Creates a connection and opens it with the configured persistence
    pub fn open(driver: D, settings: ConnectionSettings) -> Result<Self> {
        let mut conn = Connection::new(driver, settings);
        let persistent = conn.settings.persistent;
        conn.connect(persistent)?;
        Ok(conn)
    }

    /// Opens a transient or persistent native session.
    ///
    /// Any open session is closed first. When an authentication token is
    /// configured, the authentication option is sent before the session is
    /// handed out; an authenticated database stalls the session after about
    /// 30 seconds without it.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Connection` with the native message when the
    /// session cannot be opened or the authentication option is refused.
    pub fn connect(&mut self, persistent: bool) -> Result<()> {
        self.close();

        let dsn = connection_string(&self.settings);
        debug!(
            dsn = %masked_connection_string(&self.settings),
            persistent,
            "opening native session"
        );

        let opened = if persistent {
            self.driver.pconnect(&dsn)
        } else {
            self.driver.connect(&dsn)
        };
        let session = opened.map_err(|message| {
            error!(engine = %self.settings.engine, %message, "native connect failed");
            DriverError::Connection(message)
        })?;

        if let Some(token) = self.settings.auth_token() {
            if let Err(e) = authenticate(self.driver.dialect(), &session, token) {
                session.close();
                return Err(e);
            }
        }

        self.session = Some(session);
        self.persistent = persistent;
        self.in_transaction.set(false);
        Ok(())
    }

    /// Closes and reopens the session with the same persistence.
    ///
    /// Used when the engine's idle timeout may have dropped the session.
    pub fn reconnect(&mut self) -> Result<()> {
        info!(engine = %self.settings.engine, database = %self.settings.database, "reconnecting");
        self.close();
        let persistent = self.persistent;
        self.connect(persistent)
    }

    /// Releases the native session. Closing a closed connection is a no-op.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            info!(database = %self.settings.database, "closing native session");
            session.close();
        }
        self.in_transaction.set(false);
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Owner name used to scope catalog queries
    pub fn schema(&self) -> &str {
        self.settings.schema()
    }

    /// Whether failures are raised (strict) instead of logged
    pub fn is_strict(&self) -> bool {
        self.settings.debug
    }

    pub fn platform(&self) -> &'static str {
        PLATFORM
    }

    pub fn dialect(&self) -> &'static Dialect {
        self.driver.dialect()
    }

    /// The open native session
    pub fn session(&self) -> Result<&D::Session> {
        self.session.as_ref().ok_or(DriverError::NotConnected)
    }

    /// Engine version from the most recent history entry.
    ///
    /// The first value found is cached for the lifetime of the connection
    /// object, reconnects included.
    pub fn version(&self) -> Result<Option<String>> {
        if let Some(version) = self.version.get() {
            return Ok(Some(version.clone()));
        }

        let sql = self.dialect().sql(CatalogQuery::Version)?;
        let found = self
            .execute(sql)?
            .and_then(|set| set.first().and_then(|row| row.get_string("VERSION")));

        if let Some(version) = &found {
            let _ = self.version.set(version.clone());
        }
        Ok(found)
    }
}

impl<D: NativeDriver> Drop for Connection<D> {
    fn drop(&mut self) {
        self.close();
    }
}

fn authenticate<S: NativeSession>(dialect: &Dialect, session: &S, token: &str) -> Result<()> {
    let literal = format!("'{}'", session.real_escape_string(token));
    let sql = dialect.render(CatalogQuery::Authenticate, &[("token", &literal)])?;

    if session.query(&sql).is_none() {
        let info = ErrorInfo::from_session(session);
        error!(code = %info.code, message = %info.message, "connection authentication refused");
        return Err(DriverError::Connection(format!(
            "connection authentication failed: {info}"
        )));
    }
    Ok(())
}
