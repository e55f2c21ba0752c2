//! Typed schema of the six banking tables.
//!
//! Column names are the external contract with whatever produced the data
//! files. Every cell is coerced to its declared type when a table is loaded,
//! so checks never have to guess at types during comparison.

use crate::value::{Value, DATE_FORMAT, TIMESTAMP_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Customers,
    Devices,
    Accounts,
    Transactions,
    AuthLogs,
    CustomerDevice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Number,
    Bool,
    Timestamp,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub ty: ColumnType,
}

const fn col(name: &'static str, ty: ColumnType) -> ColumnSpec {
    ColumnSpec { name, ty }
}

use ColumnType::{Bool, Date, Number, Text, Timestamp};

const CUSTOMERS: &[ColumnSpec] = &[
    col("customer_id", Text),
    col("full_name", Text),
    col("gender", Text),
    col("national_id", Text),
    col("national_number", Text),
    col("date_of_birth", Date),
    col("country", Text),
    col("address", Text),
    col("email", Text),
    col("phone_number", Text),
    col("created_at", Timestamp),
];

const DEVICES: &[ColumnSpec] = &[
    col("device_id", Text),
    col("device_code", Text),
    col("is_verified", Bool),
    col("created_at", Timestamp),
];

const ACCOUNTS: &[ColumnSpec] = &[
    col("account_id", Text),
    col("customer_id", Text),
    col("account_type", Text),
    col("balance", Number),
    col("status", Text),
    col("created_at", Timestamp),
];

const TRANSACTIONS: &[ColumnSpec] = &[
    col("transaction_id", Text),
    col("account_id", Text),
    col("device_id", Text),
    col("amount", Number),
    col("transaction_type", Text),
    col("state", Text),
    col("timestamp", Timestamp),
];

const AUTH_LOGS: &[ColumnSpec] = &[
    col("auth_log_id", Text),
    col("transaction_id", Text),
    col("auth_method", Text),
    col("auth_success", Bool),
    col("auth_timestamp", Timestamp),
];

const CUSTOMER_DEVICE: &[ColumnSpec] = &[
    col("customer_id", Text),
    col("device_id", Text),
    col("is_trusted", Bool),
    col("added_at", Timestamp),
];

impl TableKind {
    /// Load and evaluation order. Never reorder: result order depends on it.
    pub const ALL: [TableKind; 6] = [
        Self::Customers,
        Self::Devices,
        Self::Accounts,
        Self::Transactions,
        Self::AuthLogs,
        Self::CustomerDevice,
    ];

    /// Name of the backing table in the dataset file.
    pub fn sql_name(&self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Devices => "devices",
            Self::Accounts => "accounts",
            Self::Transactions => "transactions",
            Self::AuthLogs => "auth_logs",
            Self::CustomerDevice => "customer_device",
        }
    }

    /// Name used in emitted results.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Customers => "Customer",
            Self::Devices => "Device",
            Self::Accounts => "Account",
            Self::Transactions => "Transaction",
            Self::AuthLogs => "AuthLog",
            Self::CustomerDevice => "CustomerDevice",
        }
    }

    pub fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            Self::Customers => CUSTOMERS,
            Self::Devices => DEVICES,
            Self::Accounts => ACCOUNTS,
            Self::Transactions => TRANSACTIONS,
            Self::AuthLogs => AUTH_LOGS,
            Self::CustomerDevice => CUSTOMER_DEVICE,
        }
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.name).collect()
    }
}

impl ColumnType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
        }
    }

    /// Parse a textual cell into this type. `None` means the text cannot
    /// represent a value of this type.
    pub fn parse_text(&self, raw: &str) -> Option<Value> {
        let raw = raw.trim();
        match self {
            Self::Text => Some(Value::text(raw)),
            Self::Number => raw.parse::<f64>().ok().map(Value::Number),
            Self::Bool => match raw {
                "true" | "True" | "TRUE" | "1" => Some(Value::Bool(true)),
                "false" | "False" | "FALSE" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            Self::Timestamp => parse_timestamp(raw).map(Value::Timestamp),
            Self::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .map(Value::Date),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    [TIMESTAMP_FORMAT, "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
