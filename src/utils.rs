/// Maintenance Utilities
///
/// Database-level operations that sit next to the adapter surface: online
/// backup, listing the databases of an engine and validating a table.
use crate::core::db::dialect::CatalogQuery;
use crate::core::db::native::NativeDriver;
use crate::core::db::Connection;
use crate::core::{DriverError, Result};
use serde::Deserialize;
use tracing::{error, info};

/// Backup flavour.
///
/// `Archive` writes a single archive file into the directory (`TO`);
/// `Image` copies the database and log files (`DIRECTORY`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupMode {
    #[default]
    Archive,
    Image,
}

/// Settings for `backup`, usually read from the `[backup]` table of the
/// configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupPreferences {
    pub directory: Option<String>,
    #[serde(default)]
    pub mode: BackupMode,
    /// Restart the transaction log after the backup, renaming the old one
    #[serde(default)]
    pub rename_transaction_log: bool,
    /// Name the renamed log after the backup copy
    #[serde(default)]
    pub rename_transaction_log_match: bool,
}

/// Builds the `BACKUP DATABASE` statement for the preferences.
///
/// # Errors
///
/// `DriverError::Backup` when no directory is configured.
pub fn backup_statement<D: NativeDriver>(
    conn: &Connection<D>,
    prefs: &BackupPreferences,
) -> Result<String> {
    let directory = prefs
        .directory
        .as_deref()
        .filter(|dir| !dir.trim().is_empty())
        .ok_or_else(|| DriverError::Backup("Backup directory must be provided".to_string()))?;

    let target = match prefs.mode {
        BackupMode::Image => "DIRECTORY",
        BackupMode::Archive => "TO",
    };
    let mut sql = format!("BACKUP DATABASE {target} {}", conn.quote(directory)?);

    if prefs.rename_transaction_log {
        sql.push_str(" TRANSACTION LOG RENAME");
        if prefs.rename_transaction_log_match {
            sql.push_str(" MATCH");
        }
    }
    Ok(sql)
}

/// Runs an online backup as one plain statement
pub fn backup<D: NativeDriver>(conn: &Connection<D>, prefs: &BackupPreferences) -> Result<bool> {
    let sql = backup_statement(conn, prefs)?;
    info!(database = %conn.settings().database, mode = ?prefs.mode, "starting backup");
    let done = conn.simple_query(&sql)?;
    if !done {
        error!(database = %conn.settings().database, "backup failed");
    }
    Ok(done)
}

/// Names of the databases running on the connected engine
pub fn list_databases<D: NativeDriver>(conn: &Connection<D>) -> Result<Vec<String>> {
    let sql = conn.dialect().sql(CatalogQuery::ListDatabases)?;
    let names = conn
        .execute(sql)?
        .map(|set| set.rows().filter_map(|row| row.get_string("name")).collect())
        .unwrap_or_default();
    Ok(names)
}

/// Runs the engine's consistency check on one table
pub fn validate_table<D: NativeDriver>(conn: &Connection<D>, table: &str) -> Result<bool> {
    let dialect = conn.dialect();
    let sql = dialect.render(
        CatalogQuery::ValidateTable,
        &[("table", &dialect.quote_identifier(table))],
    )?;
    conn.simple_query(&sql)
}
