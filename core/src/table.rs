//! In-memory record store: immutable table snapshots keyed by table kind.

use crate::{
    error::{DqError, DqResult},
    schema::TableKind,
    value::Value,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Empty table carrying the declared columns of `kind`.
    pub fn for_kind(kind: TableKind) -> Self {
        Self::new(kind.label(), &kind.column_names())
    }

    /// Append a row. Panics if the arity does not match the header;
    /// callers build rows from the same column list.
    pub fn push_row(&mut self, row: Vec<Value>) {
        assert_eq!(
            row.len(),
            self.columns.len(),
            "row arity mismatch for table {}",
            self.name
        );
        self.rows.push(row);
    }

    pub fn with_rows(mut self, rows: Vec<Vec<Value>>) -> Self {
        for row in rows {
            self.push_row(row);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> DqResult<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DqError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// All cells of one column in row order.
    pub fn column(&self, column: &str) -> DqResult<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }
}

/// The set of tables available to one evaluation pass.
///
/// A table that failed to load is kept as a fault so that checks which need
/// it report an error while unrelated checks still run.
#[derive(Debug, Default)]
pub struct RecordStore {
    tables: BTreeMap<TableKind, Table>,
    faults: BTreeMap<TableKind, String>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: TableKind, table: Table) {
        self.faults.remove(&kind);
        self.tables.insert(kind, table);
    }

    pub fn with_table(mut self, kind: TableKind, table: Table) -> Self {
        self.insert(kind, table);
        self
    }

    pub fn record_fault(&mut self, kind: TableKind, reason: impl Into<String>) {
        self.tables.remove(&kind);
        self.faults.insert(kind, reason.into());
    }

    pub fn table(&self, kind: TableKind) -> DqResult<&Table> {
        if let Some(table) = self.tables.get(&kind) {
            return Ok(table);
        }
        match self.faults.get(&kind) {
            Some(reason) => Err(DqError::TableUnavailable {
                table: kind.label().to_string(),
                reason: reason.clone(),
            }),
            None => Err(DqError::MissingTable {
                table: kind.label().to_string(),
            }),
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = TableKind> + '_ {
        self.tables.keys().copied()
    }

    pub fn faults(&self) -> impl Iterator<Item = (TableKind, &str)> + '_ {
        self.faults.iter().map(|(k, r)| (*k, r.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Fail fast when nothing at all could be loaded.
    pub fn ensure_loaded(&self) -> DqResult<()> {
        if self.tables.is_empty() {
            Err(DqError::EmptyRecordStore)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_is_reported_with_table_name() {
        let table = Table::new("Device", &["device_id"]);
        let err = table.column_index("is_verified").unwrap_err();
        assert!(matches!(err, DqError::MissingColumn { ref table, .. } if table == "Device"));
    }

    #[test]
    fn faulted_table_is_unavailable_not_missing() {
        let mut store = RecordStore::new();
        store.record_fault(TableKind::Accounts, "bad balance");
        assert!(matches!(
            store.table(TableKind::Accounts),
            Err(DqError::TableUnavailable { .. })
        ));
        assert!(matches!(
            store.table(TableKind::Devices),
            Err(DqError::MissingTable { .. })
        ));
        assert!(matches!(store.ensure_loaded(), Err(DqError::EmptyRecordStore)));
    }
}
