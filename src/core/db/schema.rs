/// Schema Introspection Module
///
/// This module reconstructs table, column, index and foreign key metadata
/// from the engine's system catalog. Every query is scoped to the
/// connection's schema (owner), so same-named tables of other owners never
/// leak into the results.
///
/// The catalog SQL lives in the dialect table; this module fills in the
/// quoted arguments, runs the query and turns the rows into descriptors.
/// Descriptors are built fresh on every call.
use crate::core::db::connection::Connection;
use crate::core::db::dialect::CatalogQuery;
use crate::core::db::native::{NativeDriver, ResultSet};
use crate::core::{DriverError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Represents a table column with its metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared domain name (e.g. "integer", "varchar")
    pub type_name: String,
    pub nullable: bool,
    /// Default value expression (if any)
    pub default: Option<String>,
    /// Character width when positive, otherwise numeric precision
    pub max_length: Option<i64>,
    /// Whether this column is part of the primary key
    pub primary_key: bool,
}

/// Classification of an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexKind {
    Primary,
    Unique,
    Index,
}

impl IndexKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IndexKind::Primary => "PRIMARY",
            IndexKind::Unique => "UNIQUE",
            IndexKind::Index => "INDEX",
        }
    }

    fn from_catalog(kind: &str) -> Self {
        match kind.trim().to_ascii_uppercase().as_str() {
            "PRIMARY" => IndexKind::Primary,
            "UNIQUE" => IndexKind::Unique,
            _ => IndexKind::Index,
        }
    }
}

/// Represents a table index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: IndexKind,
    /// Column names in key order
    pub fields: Vec<String>,
}

/// Represents a foreign key constraint.
///
/// `column_names` and `foreign_column_names` are pairwise aligned. The
/// catalog carries no referential actions, so `on_delete`, `on_update` and
/// `match_clause` are always `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignKeyDescriptor {
    pub constraint_name: String,
    pub table_name: String,
    pub column_names: Vec<String>,
    pub foreign_table_name: String,
    pub foreign_column_names: Vec<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
    #[serde(rename = "match")]
    pub match_clause: Option<String>,
}

impl<D: NativeDriver> Connection<D> {
    /// SQL listing the base tables owned by the schema.
    ///
    /// `exact_name` matches one table and takes precedence over `prefix`;
    /// a non-empty `prefix` matches by name prefix with LIKE wildcards in the
    /// prefix escaped.
    pub fn list_tables(&self, prefix: Option<&str>, exact_name: Option<&str>) -> Result<String> {
        let dialect = self.dialect();
        let filter = match (exact_name, prefix) {
            (Some(name), _) => {
                dialect.render(CatalogQuery::TableNameFilter, &[("table", &self.quote(name)?)])?
            }
            (None, Some(prefix)) if !prefix.is_empty() => {
                let like_escape = dialect.like_escape_char.to_string();
                dialect.render(
                    CatalogQuery::TablePrefixFilter,
                    &[("pattern", &self.escape_like(prefix)?), ("like_escape", &like_escape)],
                )?
            }
            _ => String::new(),
        };

        dialect.render(
            CatalogQuery::ListTables,
            &[("schema", &self.quote(self.schema())?), ("filter", &filter)],
        )
    }

    /// SQL listing the columns of `<prefix><table>` in column order
    pub fn list_columns(&self, table: &str) -> Result<String> {
        self.table_query(CatalogQuery::ListColumns, table)
    }

    /// Names of the base tables matched by `list_tables`
    pub fn table_names(&self, prefix: Option<&str>, exact_name: Option<&str>) -> Result<Vec<String>> {
        let sql = self.list_tables(prefix, exact_name)?;
        let set = self.catalog_query("tables", &sql)?;
        Ok(first_column(&set))
    }

    /// Names of the columns matched by `list_columns`
    pub fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let sql = self.list_columns(table)?;
        let set = self.catalog_query("columns", &sql)?;
        Ok(first_column(&set))
    }

    /// Column metadata of `<prefix><table>`, in column order.
    ///
    /// # Errors
    ///
    /// `DriverError::SchemaQuery` when the catalog query fails, whatever the
    /// strict mode setting.
    pub fn field_data(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let sql = self.table_query(CatalogQuery::FieldData, table)?;
        let set = self.catalog_query("field data", &sql)?;
        Ok(columns_from_rows(&set))
    }

    /// Indexes of a table keyed by index name
    pub fn index_data(&self, table: &str) -> Result<BTreeMap<String, IndexDescriptor>> {
        let sql = self.table_query(CatalogQuery::IndexData, table)?;
        let set = self.catalog_query("index data", &sql)?;
        Ok(indexes_from_rows(&set))
    }

    /// Foreign keys declared on a table keyed by constraint name
    pub fn foreign_key_data(&self, table: &str) -> Result<BTreeMap<String, ForeignKeyDescriptor>> {
        let sql = self.table_query(CatalogQuery::ForeignKeyData, table)?;
        let set = self.catalog_query("foreign key data", &sql)?;
        Ok(foreign_keys_from_rows(&set))
    }

    /// Renders a per-table catalog query for `<prefix><table>`
    fn table_query(&self, query: CatalogQuery, table: &str) -> Result<String> {
        let table = self.quote(&format!("{}{}", self.settings.prefix, table))?;
        let schema = self.quote(self.schema())?;
        self.dialect().render(query, &[("table", &table), ("schema", &schema)])
    }

    /// Runs a catalog query. Failure is always an error here: an empty
    /// answer and a broken query must not look alike.
    fn catalog_query(&self, what: &str, sql: &str) -> Result<ResultSet> {
        debug!(what, schema = %self.schema(), "running catalog query");
        match self.native_query(sql)? {
            Some(set) => Ok(set),
            None => {
                let info = self.error_info();
                error!(what, code = %info.code, message = %info.message, "catalog query failed");
                Err(DriverError::SchemaQuery(format!("{what}: {info}")))
            }
        }
    }
}

fn first_column(set: &ResultSet) -> Vec<String> {
    set.rows
        .iter()
        .filter_map(|row| row.first().and_then(|value| value.as_string()))
        .collect()
}

/// Builds column descriptors from field data rows
pub fn columns_from_rows(set: &ResultSet) -> Vec<ColumnDescriptor> {
    set.rows()
        .map(|row| {
            let width = row.get_i64("CHARACTER_MAXIMUM_LENGTH");
            let max_length = match width {
                Some(w) if w > 0 => Some(w),
                _ => row.get_i64("NUMERIC_PRECISION"),
            };

            ColumnDescriptor {
                name: row.get_string("COLUMN_NAME").unwrap_or_default(),
                type_name: row.get_string("DATA_TYPE").unwrap_or_default(),
                nullable: row.get_bool("NULLABLE"),
                default: row.get_string("COLUMN_DEFAULT"),
                max_length,
                primary_key: row.get_bool("PRIMARY_KEY"),
            }
        })
        .collect()
}

/// Builds index descriptors from index data rows.
///
/// When the catalog yields the same index name twice, the later row wins.
pub fn indexes_from_rows(set: &ResultSet) -> BTreeMap<String, IndexDescriptor> {
    let mut indexes = BTreeMap::new();
    for row in set.rows() {
        let Some(name) = row.get_string("index_name") else {
            continue;
        };
        let kind = IndexKind::from_catalog(&row.get_string("type").unwrap_or_default());
        let fields = row
            .get_string("index_keys")
            .map(|keys| split_index_keys(&keys))
            .unwrap_or_default();

        indexes.insert(name.clone(), IndexDescriptor { name, kind, fields });
    }
    indexes
}

/// Splits a `list()` aggregate into trimmed column names
pub fn split_index_keys(keys: &str) -> Vec<String> {
    keys.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accumulates one (local, referenced) column pair per row into its
/// constraint
pub fn foreign_keys_from_rows(set: &ResultSet) -> BTreeMap<String, ForeignKeyDescriptor> {
    let mut keys: BTreeMap<String, ForeignKeyDescriptor> = BTreeMap::new();
    for row in set.rows() {
        let Some(constraint_name) = row.get_string("constraint_name") else {
            continue;
        };
        let fk = keys
            .entry(constraint_name.clone())
            .or_insert_with(|| ForeignKeyDescriptor {
                constraint_name,
                table_name: row.get_string("table_name").unwrap_or_default(),
                column_names: Vec::new(),
                foreign_table_name: row.get_string("foreign_table_name").unwrap_or_default(),
                foreign_column_names: Vec::new(),
                on_delete: None,
                on_update: None,
                match_clause: None,
            });

        // both sides or neither, so the lists stay aligned
        if let (Some(local), Some(foreign)) = (
            row.get_string("column_name"),
            row.get_string("foreign_column_name"),
        ) {
            fk.column_names.push(local);
            fk.foreign_column_names.push(foreign);
        }
    }
    keys
}
