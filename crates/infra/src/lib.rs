//! Infrastructure layer: SQLite persistence, the inventory ledger, the movement log,
//! unit-of-work coordination and configuration.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod movement_log;
pub mod movement_processor;
pub mod unit_of_work;


pub use catalog::CatalogStore;
pub use config::AppConfig;
pub use movement_processor::MovementProcessor;
pub use unit_of_work::{TransactionCoordinator, UnitOfWork};
