//! Inventory domain module.
//!
//! Business rules for stock movements, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage): request validation, the ledger postings each movement
//! type produces, and replay of the movement log into a quantity.

pub mod movement;
pub mod reconstruct;
pub mod record;

pub use movement::{
    MovementOutcome, MovementRequest, MovementType, Posting, Postings, StockMovement,
    ValidatedMovement, REASON_MAX, REF_NO_MAX,
};
pub use reconstruct::{net_effect, replay};
pub use record::{quantity_overflow, InventoryRecord};
