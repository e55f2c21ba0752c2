use super::DqStore;
use crate::{
    error::{DqError, DqResult},
    schema::{ColumnType, TableKind},
    table::{RecordStore, Table},
    value::Value,
};
use rusqlite::{params_from_iter, types::ValueRef};

impl DqStore {
    // ── Dataset ───────────────────────────────────────────────────

    /// Replace the contents of one dataset table with `table`'s rows.
    pub fn replace_table(&self, kind: TableKind, table: &Table) -> DqResult<()> {
        let columns = table
            .columns()
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>();
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>();
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            kind.sql_name(),
            columns.join(", "),
            placeholders.join(", ")
        );

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(&format!("DELETE FROM {}", kind.sql_name()), [])?;
        {
            let mut stmt = tx.prepare(&insert)?;
            for row in table.rows() {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;
        log::debug!("wrote {} rows to {}", table.len(), kind.sql_name());
        Ok(())
    }

    /// Write every loaded table of `store`. Faulted tables are skipped.
    pub fn replace_dataset(&self, store: &RecordStore) -> DqResult<()> {
        for kind in TableKind::ALL {
            if let Ok(table) = store.table(kind) {
                self.replace_table(kind, table)?;
            }
        }
        Ok(())
    }

    /// Load all six tables against their typed schema.
    ///
    /// A table that is missing, lacks a column, or holds a cell that cannot
    /// be read as its declared type is recorded as a fault; the others load
    /// normally. Fails only when no table could be loaded at all.
    pub fn load_record_store(&self) -> DqResult<RecordStore> {
        let mut store = RecordStore::new();
        for kind in TableKind::ALL {
            match self.load_table(kind) {
                Ok(table) => {
                    log::debug!("loaded {} rows from {}", table.len(), kind.sql_name());
                    store.insert(kind, table);
                }
                Err(e) if e.is_structural() => {
                    log::error!("{} could not be loaded: {e}", kind.label());
                    store.record_fault(kind, e.to_string());
                }
                Err(e) => return Err(e),
            }
        }
        store.ensure_loaded()?;
        Ok(store)
    }

    fn load_table(&self, kind: TableKind) -> DqResult<Table> {
        let present = self.table_columns(kind.sql_name())?;
        if present.is_empty() {
            return Err(DqError::MissingTable {
                table: kind.label().to_string(),
            });
        }
        let specs = kind.columns();
        if let Some(spec) = specs.iter().find(|s| !present.iter().any(|p| p == s.name)) {
            return Err(DqError::MissingColumn {
                table: kind.label().to_string(),
                column: spec.name.to_string(),
            });
        }

        let select = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            specs
                .iter()
                .map(|s| format!("\"{}\"", s.name))
                .collect::<Vec<_>>()
                .join(", "),
            kind.sql_name()
        );
        let mut stmt = self.conn.prepare(&select)?;
        let mut rows = stmt.query([])?;
        let mut table = Table::for_kind(kind);
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(specs.len());
            for (i, spec) in specs.iter().enumerate() {
                let value = coerce(spec.ty, row.get_ref(i)?).map_err(|found| {
                    DqError::TypeMismatch {
                        table: kind.label().to_string(),
                        column: spec.name.to_string(),
                        row: table.len(),
                        expected: spec.ty.name(),
                        found,
                    }
                })?;
                cells.push(value);
            }
            table.push_row(cells);
        }
        Ok(table)
    }

    /// Column names of `table`, empty when it does not exist.
    fn table_columns(&self, table: &str) -> DqResult<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

/// Read a stored cell as `ty`. The error carries the offending cell as text.
fn coerce(ty: ColumnType, raw: ValueRef<'_>) -> Result<Value, String> {
    match (ty, raw) {
        (_, ValueRef::Null) => Ok(Value::Null),
        (ColumnType::Text, ValueRef::Text(bytes)) => Ok(Value::text(utf8(bytes)?)),
        (ColumnType::Text, ValueRef::Integer(i)) => Ok(Value::text(i.to_string())),
        (ColumnType::Text, ValueRef::Real(r)) => Ok(Value::text(Value::Number(r).to_string())),
        (ColumnType::Number, ValueRef::Integer(i)) => Ok(Value::Number(i as f64)),
        (ColumnType::Number, ValueRef::Real(r)) => Ok(Value::Number(r)),
        (ColumnType::Bool, ValueRef::Integer(0)) => Ok(Value::Bool(false)),
        (ColumnType::Bool, ValueRef::Integer(1)) => Ok(Value::Bool(true)),
        (_, ValueRef::Text(bytes)) => {
            let text = utf8(bytes)?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            ty.parse_text(text).ok_or_else(|| text.to_string())
        }
        (_, ValueRef::Integer(i)) => Err(i.to_string()),
        (_, ValueRef::Real(r)) => Err(r.to_string()),
        (_, ValueRef::Blob(_)) => Err("<blob>".to_string()),
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(bytes).map_err(|_| "<invalid utf-8>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn coerces_stored_cells_by_declared_type() {
        assert_eq!(coerce(ColumnType::Number, ValueRef::Integer(5)), Ok(Value::Number(5.0)));
        assert_eq!(coerce(ColumnType::Bool, ValueRef::Integer(1)), Ok(Value::Bool(true)));
        assert_eq!(coerce(ColumnType::Text, ValueRef::Integer(123)), Ok(Value::text("123")));
        assert_eq!(coerce(ColumnType::Number, ValueRef::Text(b"  ")), Ok(Value::Null));
        assert_eq!(
            coerce(ColumnType::Date, ValueRef::Text(b"1990-02-03")),
            Ok(Value::Date(NaiveDate::from_ymd_opt(1990, 2, 3).unwrap()))
        );
    }

    #[test]
    fn text_cells_keep_their_whitespace() {
        assert_eq!(
            coerce(ColumnType::Text, ValueRef::Text(b" 0123 ")),
            Ok(Value::text(" 0123 "))
        );
    }

    #[test]
    fn unreadable_cells_report_what_was_found() {
        assert_eq!(coerce(ColumnType::Number, ValueRef::Text(b"abc")), Err("abc".into()));
        assert_eq!(coerce(ColumnType::Bool, ValueRef::Integer(7)), Err("7".into()));
    }

    #[test]
    fn dataset_round_trips_through_sqlite() {
        let store = DqStore::in_memory().unwrap();
        store.migrate().unwrap();
        let mut devices = Table::for_kind(TableKind::Devices);
        devices.push_row(vec![
            Value::text("d1"),
            Value::text("abc"),
            Value::Bool(true),
            Value::Null,
        ]);
        store.replace_table(TableKind::Devices, &devices).unwrap();

        let loaded = store.load_record_store().unwrap();
        assert_eq!(loaded.table(TableKind::Devices).unwrap(), &devices);
        // Empty tables still load.
        assert!(loaded.table(TableKind::Accounts).unwrap().is_empty());
    }
}
