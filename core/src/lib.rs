pub mod aggregator;
pub mod checks;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod generator;
pub mod pipeline;
pub mod result;
pub mod risk;
pub mod schema;
pub mod store;
pub mod table;
pub mod types;
pub mod value;
