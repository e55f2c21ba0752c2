//! A minimal relational frame for enriching transactions.
//!
//! Joins keep every left row (unmatched right columns become null) and keep
//! multiplicity: a left row matching two right rows appears twice.

use crate::{
    error::{DqError, DqResult},
    table::Table,
    value::{Value, ValueKey},
};
use chrono::NaiveDateTime;
use std::collections::HashMap;

const FRAME_NAME: &str = "frame";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    /// Project `columns` out of `table`, preserving row order.
    pub fn from_table(table: &Table, columns: &[&str]) -> DqResult<Self> {
        let idx = columns
            .iter()
            .map(|c| table.column_index(c))
            .collect::<DqResult<Vec<_>>>()?;
        let rows = table
            .rows()
            .iter()
            .map(|row| idx.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// Left join `right` on `(left_column, right_column)` pairs, appending
    /// the `take` columns of the right side. Null keys never match.
    pub fn left_join(self, right: &Table, on: &[(&str, &str)], take: &[&str]) -> DqResult<Self> {
        let left_keys = on
            .iter()
            .map(|(l, _)| self.column_index(l))
            .collect::<DqResult<Vec<_>>>()?;
        let right_keys = on
            .iter()
            .map(|(_, r)| right.column_index(r))
            .collect::<DqResult<Vec<_>>>()?;
        let right_take = take
            .iter()
            .map(|c| right.column_index(c))
            .collect::<DqResult<Vec<_>>>()?;

        let mut index: HashMap<Vec<ValueKey>, Vec<usize>> = HashMap::new();
        for (i, row) in right.rows().iter().enumerate() {
            if let Some(key) = join_key(row, &right_keys) {
                index.entry(key).or_default().push(i);
            }
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for row in self.rows {
            let matches = join_key(&row, &left_keys).and_then(|k| index.get(&k));
            match matches {
                Some(hits) => {
                    for &hit in hits {
                        let mut joined = row.clone();
                        joined.extend(right_take.iter().map(|&c| right.rows()[hit][c].clone()));
                        rows.push(joined);
                    }
                }
                None => {
                    let mut joined = row;
                    joined.extend(std::iter::repeat(Value::Null).take(right_take.len()));
                    rows.push(joined);
                }
            }
        }

        let mut columns = self.columns;
        columns.extend(take.iter().map(|c| c.to_string()));
        Ok(Self { columns, rows })
    }

    /// Keep rows for which `keep` returns true. Row numbers passed to the
    /// predicate are positions in this frame.
    pub fn try_filter<F>(self, mut keep: F) -> DqResult<Self>
    where
        F: FnMut(usize, &[Value]) -> DqResult<bool>,
    {
        let mut rows = Vec::new();
        for (i, row) in self.rows.into_iter().enumerate() {
            if keep(i, &row)? {
                rows.push(row);
            }
        }
        Ok(Self {
            columns: self.columns,
            rows,
        })
    }

    pub fn column_index(&self, column: &str) -> DqResult<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DqError::MissingColumn {
                table: FRAME_NAME.to_string(),
                column: column.to_string(),
            })
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
}

fn join_key(row: &[Value], cols: &[usize]) -> Option<Vec<ValueKey>> {
    cols.iter()
        .map(|&c| Some(row[c].key()).filter(|k| !k.is_null()))
        .collect()
}

fn mismatch(column: &str, row: usize, expected: &'static str, found: &Value) -> DqError {
    DqError::TypeMismatch {
        table: FRAME_NAME.to_string(),
        column: column.to_string(),
        row,
        expected,
        found: found.to_string(),
    }
}

/// Numeric cell; null is `None`, any other type is a fault.
pub fn number_at(row: &[Value], idx: usize, column: &str, n: usize) -> DqResult<Option<f64>> {
    match &row[idx] {
        Value::Null => Ok(None),
        Value::Number(x) => Ok(Some(*x)),
        other => Err(mismatch(column, n, "number", other)),
    }
}

pub fn bool_at(row: &[Value], idx: usize, column: &str, n: usize) -> DqResult<Option<bool>> {
    match &row[idx] {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        other => Err(mismatch(column, n, "bool", other)),
    }
}

pub fn timestamp_at(
    row: &[Value],
    idx: usize,
    column: &str,
    n: usize,
) -> DqResult<Option<NaiveDateTime>> {
    match &row[idx] {
        Value::Null => Ok(None),
        Value::Timestamp(ts) => Ok(Some(*ts)),
        Value::Date(d) => Ok(d.and_hms_opt(0, 0, 0)),
        other => Err(mismatch(column, n, "timestamp", other)),
    }
}
