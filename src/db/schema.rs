//! Introspection of the target schema created by the embedded migrations.

use super::Database;
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForeignKeyInfo {
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether a unique index (including SQLite's implicit ones) covers exactly `columns`.
    pub fn has_unique(&self, columns: &[&str]) -> bool {
        self.indexes
            .iter()
            .any(|i| i.unique && i.columns.iter().map(String::as_str).eq(columns.iter().copied()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetSchema {
    pub tables: Vec<TableInfo>,
}

impl TargetSchema {
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }
}

impl Database {
    /// Describe every application table (migration bookkeeping excluded).
    pub fn get_schema(&self) -> Result<TargetSchema> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table'
                 AND name NOT LIKE 'sqlite_%'
                 AND name NOT LIKE 'refinery_%'
                 ORDER BY name",
            )?;
            let names: Vec<String> = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;

            let mut tables = Vec::new();
            for name in names {
                tables.push(TableInfo {
                    columns: table_columns(conn, &name)?,
                    indexes: table_indexes(conn, &name)?,
                    foreign_keys: table_foreign_keys(conn, &name)?,
                    name,
                });
            }
            Ok(TargetSchema { tables })
        })
    }
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{}')", table))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                data_type: row.get::<_, String>(2)?.to_uppercase(),
                nullable: row.get::<_, i32>(3)? == 0,
                primary_key: row.get::<_, i32>(5)? > 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn table_indexes(conn: &Connection, table: &str) -> Result<Vec<IndexInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA index_list('{}')", table))?;
    let list: Vec<(String, bool)> = stmt
        .query_map([], |row| Ok((row.get(1)?, row.get::<_, i32>(2)? == 1)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut indexes = Vec::new();
    for (name, unique) in list {
        let mut stmt = conn.prepare(&format!("PRAGMA index_info('{}')", name))?;
        let columns = stmt
            .query_map([], |row| row.get(2))?
            .collect::<Result<Vec<String>, _>>()?;
        indexes.push(IndexInfo {
            name,
            unique,
            columns,
        });
    }
    Ok(indexes)
}

fn table_foreign_keys(conn: &Connection, table: &str) -> Result<Vec<ForeignKeyInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list('{}')", table))?;
    let keys = stmt
        .query_map([], |row| {
            Ok(ForeignKeyInfo {
                from_column: row.get(3)?,
                to_table: row.get(2)?,
                to_column: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(keys)
}
