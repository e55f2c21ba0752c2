//! Synthetic banking dataset generation.
//!
//! Produces the six input tables in memory. Generation is deterministic:
//! the same config (seed included) always yields the same tables. The
//! generator makes no attempt at referential or format cleanliness beyond
//! what random draws give; finding what is wrong is the checks' job.

pub mod name_generator;
pub mod rng;

use crate::{
    config::GeneratorConfig,
    schema::TableKind,
    table::{RecordStore, Table},
    types::EntityId,
    value::Value,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use name_generator::NameGenerator;
use rng::{RngBank, TableRng, TableSlot};
use std::collections::HashSet;

const GENDERS: &[&str] = &["male", "female"];
const NATIONAL_ID_TYPES: &[&str] = &["CCCD", "PASSPORT"];
const ACCOUNT_TYPES: &[&str] = &["SAVINGS", "CURRENT", "CREDIT"];
const ACCOUNT_STATUSES: &[&str] = &["ACTIVE", "INACTIVE", "BLOCKED"];
const TRANSACTION_TYPES: &[&str] = &["TRANSFER", "PAYMENT", "WITHDRAWAL", "TOPUP"];
const TRANSACTION_STATES: &[&str] = &["PENDING", "COMPLETED", "FAILED"];

const NATIONAL_NUMBER_SPACE: u64 = 1_000_000_000_000; // up to 12 digits
const BALANCE_RANGE: (f64, f64) = (1_000.0, 100_000_000.0);
const AMOUNT_RANGE: (f64, f64) = (1_000.0, 50_000_000.0);
const MIN_AGE_YEARS: i64 = 18;
const MAX_AGE_YEARS: i64 = 70;

/// An entity's id plus the time stamp later tables borrow from it.
struct Generated {
    id: EntityId,
    at: NaiveDateTime,
}

pub struct DatasetGenerator {
    config: GeneratorConfig,
    bank: RngBank,
}

impl DatasetGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        let bank = RngBank::new(config.seed);
        Self { config, bank }
    }

    /// Generate all six tables.
    pub fn generate(&self) -> RecordStore {
        let (customers, customer_ids) = self.customers();
        let (devices, device_ids) = self.devices();
        let (accounts, account_ids) = self.accounts(&customer_ids);
        let (transactions, txns) = self.transactions(&account_ids, &device_ids);
        let auth_logs = self.auth_logs(&txns);
        let customer_device = self.customer_device(&customer_ids, &device_ids);

        log::info!(
            "generated {} customers, {} devices, {} accounts, {} transactions, {} auth logs, {} device links",
            customers.len(),
            devices.len(),
            accounts.len(),
            transactions.len(),
            auth_logs.len(),
            customer_device.len()
        );

        RecordStore::new()
            .with_table(TableKind::Customers, customers)
            .with_table(TableKind::Devices, devices)
            .with_table(TableKind::Accounts, accounts)
            .with_table(TableKind::Transactions, transactions)
            .with_table(TableKind::AuthLogs, auth_logs)
            .with_table(TableKind::CustomerDevice, customer_device)
    }

    fn year_start(&self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(self.config.year, 1, 1)
            .unwrap_or_default()
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
    }

    /// Uniform second within the configured year.
    fn time_in_year(&self, rng: &mut TableRng) -> NaiveDateTime {
        let start = self.year_start();
        let end = NaiveDate::from_ymd_opt(self.config.year + 1, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(start + Duration::days(365));
        let span = (end - start).num_seconds().max(1) as u64;
        start + Duration::seconds(rng.next_u64_below(span) as i64)
    }

    fn customers(&self) -> (Table, Vec<EntityId>) {
        let mut rng = self.bank.for_table(TableSlot::Customers);
        let mut table = Table::for_kind(TableKind::Customers);
        let mut ids = Vec::with_capacity(self.config.customers);
        let mut numbers = HashSet::new();
        let reference = self.year_start().date();

        for _ in 0..self.config.customers {
            let customer_id = rng.uuid().to_string();
            let full_name = NameGenerator::full_name(&mut rng);

            // Unique, but not zero padded: small draws give short numbers.
            let national_number = loop {
                let n = rng.next_u64_below(NATIONAL_NUMBER_SPACE);
                if numbers.insert(n) {
                    break n;
                }
            };

            let age_days = 365 * MIN_AGE_YEARS
                + rng.next_u64_below((365 * (MAX_AGE_YEARS - MIN_AGE_YEARS)) as u64) as i64;
            let email = NameGenerator::email(&mut rng, &full_name);

            table.push_row(vec![
                Value::text(customer_id.clone()),
                Value::text(full_name),
                Value::from(*rng.pick(GENDERS)),
                Value::from(*rng.pick(NATIONAL_ID_TYPES)),
                Value::text(national_number.to_string()),
                Value::Date(reference - Duration::days(age_days)),
                Value::from(NameGenerator::country(&mut rng)),
                Value::text(NameGenerator::address(&mut rng)),
                Value::text(email),
                Value::text(NameGenerator::phone_number(&mut rng)),
                Value::Timestamp(self.time_in_year(&mut rng)),
            ]);
            ids.push(customer_id);
        }
        (table, ids)
    }

    fn devices(&self) -> (Table, Vec<EntityId>) {
        let mut rng = self.bank.for_table(TableSlot::Devices);
        let mut table = Table::for_kind(TableKind::Devices);
        let mut ids = Vec::with_capacity(self.config.devices);

        for _ in 0..self.config.devices {
            let device_id = rng.uuid().to_string();
            table.push_row(vec![
                Value::text(device_id.clone()),
                Value::text(rng.hex(64)),
                Value::Bool(rng.chance(0.5)),
                Value::Timestamp(self.time_in_year(&mut rng)),
            ]);
            ids.push(device_id);
        }
        (table, ids)
    }

    fn accounts(&self, customers: &[EntityId]) -> (Table, Vec<EntityId>) {
        let mut rng = self.bank.for_table(TableSlot::Accounts);
        let mut table = Table::for_kind(TableKind::Accounts);
        let mut ids = Vec::with_capacity(self.config.accounts);
        if customers.is_empty() {
            return (table, ids);
        }

        for _ in 0..self.config.accounts {
            let account_id = rng.uuid().to_string();
            let owner = rng.pick(customers).clone();
            let balance = round_cents(rng.uniform(BALANCE_RANGE.0, BALANCE_RANGE.1));
            table.push_row(vec![
                Value::text(account_id.clone()),
                Value::text(owner),
                Value::from(*rng.pick(ACCOUNT_TYPES)),
                Value::Number(balance),
                Value::from(*rng.pick(ACCOUNT_STATUSES)),
                Value::Timestamp(self.time_in_year(&mut rng)),
            ]);
            ids.push(account_id);
        }
        (table, ids)
    }

    fn transactions(&self, accounts: &[EntityId], devices: &[EntityId]) -> (Table, Vec<Generated>) {
        let mut rng = self.bank.for_table(TableSlot::Transactions);
        let mut table = Table::for_kind(TableKind::Transactions);
        let mut txns = Vec::with_capacity(self.config.transactions);
        if accounts.is_empty() || devices.is_empty() {
            return (table, txns);
        }

        for _ in 0..self.config.transactions {
            let transaction_id = rng.uuid().to_string();
            let account = rng.pick(accounts).clone();
            let device = rng.pick(devices).clone();
            let amount = round_cents(rng.uniform(AMOUNT_RANGE.0, AMOUNT_RANGE.1));
            let at = self.time_in_year(&mut rng);
            table.push_row(vec![
                Value::text(transaction_id.clone()),
                Value::text(account),
                Value::text(device),
                Value::Number(amount),
                Value::from(*rng.pick(TRANSACTION_TYPES)),
                Value::from(*rng.pick(TRANSACTION_STATES)),
                Value::Timestamp(at),
            ]);
            txns.push(Generated {
                id: transaction_id,
                at,
            });
        }
        (table, txns)
    }

    fn auth_logs(&self, txns: &[Generated]) -> Table {
        let mut rng = self.bank.for_table(TableSlot::AuthLogs);
        let mut table = Table::for_kind(TableKind::AuthLogs);
        if txns.is_empty() || self.config.auth_methods.is_empty() {
            return table;
        }

        for _ in 0..self.config.auth_logs {
            let auth_log_id = rng.uuid().to_string();
            let txn = rng.pick(txns);
            let method = rng.pick(&self.config.auth_methods).clone();
            table.push_row(vec![
                Value::text(auth_log_id),
                Value::text(txn.id.clone()),
                Value::text(method),
                Value::Bool(rng.chance(0.5)),
                Value::Timestamp(txn.at),
            ]);
        }
        table
    }

    fn customer_device(&self, customers: &[EntityId], devices: &[EntityId]) -> Table {
        let mut rng = self.bank.for_table(TableSlot::CustomerDevice);
        let mut table = Table::for_kind(TableKind::CustomerDevice);
        if customers.is_empty() || devices.is_empty() {
            return table;
        }

        for _ in 0..customers.len() * self.config.links_per_customer {
            let customer = rng.pick(customers).clone();
            let device = rng.pick(devices).clone();
            table.push_row(vec![
                Value::text(customer),
                Value::text(device),
                Value::Bool(rng.chance(0.5)),
                Value::Timestamp(self.time_in_year(&mut rng)),
            ]);
        }
        table
    }
}

fn round_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DqConfig;

    #[test]
    fn generates_configured_row_counts() {
        let config = DqConfig::default_test().generator;
        let store = DatasetGenerator::new(config.clone()).generate();

        let len = |kind| store.table(kind).unwrap().len();
        assert_eq!(len(TableKind::Customers), config.customers);
        assert_eq!(len(TableKind::Devices), config.devices);
        assert_eq!(len(TableKind::Accounts), config.accounts);
        assert_eq!(len(TableKind::Transactions), config.transactions);
        assert_eq!(len(TableKind::AuthLogs), config.auth_logs);
        assert_eq!(
            len(TableKind::CustomerDevice),
            config.customers * config.links_per_customer
        );
    }

    #[test]
    fn timestamps_fall_in_the_configured_year() {
        let config = DqConfig::default_test().generator;
        let store = DatasetGenerator::new(config.clone()).generate();
        let txns = store.table(TableKind::Transactions).unwrap();
        for ts in txns.column("timestamp").unwrap() {
            let year = ts.as_timestamp().unwrap().date().format("%Y").to_string();
            assert_eq!(year, config.year.to_string());
        }
    }

    #[test]
    fn auth_log_time_copies_its_transaction() {
        let store = DatasetGenerator::new(DqConfig::default_test().generator).generate();
        let txns = store.table(TableKind::Transactions).unwrap();
        let logs = store.table(TableKind::AuthLogs).unwrap();
        let id = txns.column_index("transaction_id").unwrap();
        let ts = txns.column_index("timestamp").unwrap();
        for log in logs.rows() {
            let txn = txns.rows().iter().find(|r| r[id] == log[1]).unwrap();
            assert_eq!(txn[ts], log[4]);
        }
    }

    #[test]
    fn national_numbers_are_unique() {
        let store = DatasetGenerator::new(DqConfig::default_test().generator).generate();
        let customers = store.table(TableKind::Customers).unwrap();
        let numbers: HashSet<String> = customers
            .column("national_number")
            .unwrap()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(numbers.len(), customers.len());
    }
}
