/// Catalog Dialect Module
///
/// Maps each logical catalog operation to the SQL text of one engine.
/// Templates use `{name}` placeholders which are filled with values the
/// caller has already escaped or quoted.
use crate::core::{DriverError, Result};

/// Logical operations that need engine-specific SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogQuery {
    /// Base tables owned by `{schema}`, followed by an optional `{filter}`
    ListTables,
    /// Exact table match appended to `ListTables`; `{table}` is quoted
    TableNameFilter,
    /// Prefix match appended to `ListTables`; `{pattern}` is LIKE-escaped
    TablePrefixFilter,
    ListColumns,
    FieldData,
    IndexData,
    ForeignKeyData,
    Version,
    ListDatabases,
    ValidateTable,
    DisableForeignKeyChecks,
    EnableForeignKeyChecks,
    /// Session option sent right after connecting to an authenticated database
    Authenticate,
}

/// Per-engine SQL table.
#[derive(Debug)]
pub struct Dialect {
    pub name: &'static str,
    /// Character used in `LIKE ... ESCAPE` clauses
    pub like_escape_char: char,
    /// Identifier quote character
    pub escape_char: char,
    queries: &'static [(CatalogQuery, &'static str)],
}

impl Dialect {
    /// Raw template for a query
    pub fn sql(&self, query: CatalogQuery) -> Result<&'static str> {
        self.queries
            .iter()
            .find(|(q, _)| *q == query)
            .map(|(_, sql)| *sql)
            .ok_or_else(|| {
                DriverError::Unsupported(format!("{} does not provide {:?}", self.name, query))
            })
    }

    /// Template with every `{name}` placeholder substituted from `args`
    pub fn render(&self, query: CatalogQuery, args: &[(&str, &str)]) -> Result<String> {
        render_template(self.sql(query)?, args)
    }

    /// Quotes an identifier, doubling embedded quote characters
    pub fn quote_identifier(&self, name: &str) -> String {
        let quote = self.escape_char;
        let doubled = format!("{quote}{quote}");
        format!("{quote}{}{quote}", name.replace(quote, &doubled))
    }
}

/// Single-pass placeholder substitution.
///
/// Substituted values are never rescanned, so a value containing `{table}`
/// is emitted verbatim. A `{` not followed by an identifier and `}` is kept
/// as a literal brace.
pub fn render_template(template: &str, args: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if name_len > 0 && after[name_len..].starts_with('}') {
            let name = &after[..name_len];
            let value = args
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| *v)
                .ok_or_else(|| DriverError::Dialect(format!("no value for placeholder {{{name}}}")))?;
            out.push_str(value);
            rest = &after[name_len + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// SQL Anywhere catalog queries.
pub static SQL_ANYWHERE: Dialect = Dialect {
    name: "SASQL",
    like_escape_char: '!',
    escape_char: '"',
    queries: &[
        (
            CatalogQuery::ListTables,
            "select TABLE_NAME as \"name\" \
               from SYSTABLE \
          left join SYSUSER on SYSTABLE.CREATOR = SYSUSER.USER_ID \
              where TABLE_TYPE = 'BASE' \
                and SYSUSER.USER_NAME = {schema}{filter}",
        ),
        (CatalogQuery::TableNameFilter, " and TABLE_NAME LIKE {table}"),
        (
            CatalogQuery::TablePrefixFilter,
            " and TABLE_NAME LIKE '{pattern}%' ESCAPE '{like_escape}'",
        ),
        (
            CatalogQuery::ListColumns,
            "select COLUMN_NAME \
               from SYSCOLUMN \
          left join SYSTABLE on SYSCOLUMN.TABLE_ID = SYSTABLE.TABLE_ID \
          left join SYSUSER on SYSTABLE.CREATOR = SYSUSER.USER_ID \
              where TABLE_NAME = {table} \
                and SYSUSER.USER_NAME = {schema} \
           order by SYSCOLUMN.COLUMN_ID",
        ),
        (
            CatalogQuery::FieldData,
            "select SYSTABCOL.COLUMN_NAME, SYSDOMAIN.DOMAIN_NAME as DATA_TYPE, \
                    SYSTABCOL.WIDTH as CHARACTER_MAXIMUM_LENGTH, SYSTABCOL.SCALE as NUMERIC_PRECISION, \
                    SYSTABCOL.\"DEFAULT\" as COLUMN_DEFAULT, \
                    if SYSTABCOL.NULLS = 'Y' then 1 else 0 end if as NULLABLE, \
                    if exists (select 1 from sp_pkeys({table}, {schema}) where COLUMN_NAME = SYSTABCOL.COLUMN_NAME) then 1 else 0 end if as PRIMARY_KEY \
               from SYSTABCOL \
          left join SYSTABLE on SYSTABCOL.TABLE_ID = SYSTABLE.TABLE_ID \
          left join SYSUSER on SYSTABLE.CREATOR = SYSUSER.USER_ID \
          left join SYSDOMAIN on SYSDOMAIN.DOMAIN_ID = SYSTABCOL.DOMAIN_ID \
              where SYSTABLE.TABLE_NAME = {table} \
                and SYSUSER.USER_NAME = {schema} \
           order by SYSTABCOL.COLUMN_ID",
        ),
        (
            CatalogQuery::IndexData,
            "select SYSIDX.INDEX_NAME as index_name, \
                    if SYSIDX.INDEX_ID = 0 then 'PRIMARY' else if SYSIDXCOL.PRIMARY_COLUMN_ID is null then 'UNIQUE' else 'INDEX' end if end if as type, \
                    indexType, \
                    list(SYSCOLUMN.COLUMN_NAME order by SYSIDXCOL.SEQUENCE) as index_keys \
               from SYSIDX \
          left join SYSTABLE on SYSTABLE.TABLE_ID = SYSIDX.TABLE_ID \
          left join SYSIDXCOL on SYSIDX.TABLE_ID = SYSIDXCOL.TABLE_ID and SYSIDX.INDEX_ID = SYSIDXCOL.INDEX_ID \
          left join SYSUSER on SYSTABLE.CREATOR = SYSUSER.USER_ID \
          left join SYSCOLUMN on SYSCOLUMN.TABLE_ID = SYSIDXCOL.TABLE_ID and SYSCOLUMN.COLUMN_ID = SYSIDXCOL.COLUMN_ID \
          left join dbo.sa_index_levels({table}, {schema}) on tableId = SYSIDX.TABLE_ID and IndexName = index_name \
              where TABLE_NAME = {table} \
                and SYSUSER.USER_NAME = {schema} \
           group by index_name, type, indexType",
        ),
        (
            CatalogQuery::ForeignKeyData,
            "select SYSFOREIGNKEY.ROLE as constraint_name, OWNING.TABLE_NAME as table_name, \
                    LOCALCOL.COLUMN_NAME as column_name, REFERENCED.TABLE_NAME as foreign_table_name, \
                    REFCOL.COLUMN_NAME as foreign_column_name \
               from SYSFOREIGNKEY \
          left join SYSTABLE as OWNING on OWNING.TABLE_ID = SYSFOREIGNKEY.FOREIGN_TABLE_ID \
          left join SYSUSER on OWNING.CREATOR = SYSUSER.USER_ID \
          left join SYSTABLE as REFERENCED on REFERENCED.TABLE_ID = SYSFOREIGNKEY.PRIMARY_TABLE_ID \
          left join SYSIDXCOL as FKCOL on FKCOL.TABLE_ID = SYSFOREIGNKEY.FOREIGN_TABLE_ID and FKCOL.INDEX_ID = SYSFOREIGNKEY.FOREIGN_KEY_ID \
          left join SYSCOLUMN as LOCALCOL on LOCALCOL.TABLE_ID = FKCOL.TABLE_ID and LOCALCOL.COLUMN_ID = FKCOL.COLUMN_ID \
          left join SYSCOLUMN as REFCOL on REFCOL.TABLE_ID = SYSFOREIGNKEY.PRIMARY_TABLE_ID and REFCOL.COLUMN_ID = FKCOL.PRIMARY_COLUMN_ID \
              where OWNING.TABLE_NAME = {table} \
                and SYSUSER.USER_NAME = {schema} \
           order by constraint_name, FKCOL.SEQUENCE",
        ),
        (
            CatalogQuery::Version,
            "select top 1 VERSION from SYSHISTORY order by LAST_TIME desc",
        ),
        (
            CatalogQuery::ListDatabases,
            "select DB_NAME(Number) as \"name\" from sa_db_list()",
        ),
        (CatalogQuery::ValidateTable, "VALIDATE TABLE {table}"),
        (
            CatalogQuery::DisableForeignKeyChecks,
            "set temporary option wait_for_commit = on",
        ),
        (
            CatalogQuery::EnableForeignKeyChecks,
            "set temporary option wait_for_commit = off",
        ),
        (
            CatalogQuery::Authenticate,
            "SET TEMPORARY OPTION CONNECTION_AUTHENTICATION={token}",
        ),
    ],
};
