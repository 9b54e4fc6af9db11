pub mod calendar;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod limits;
pub mod model;
pub mod observability;
pub mod snapshot;
