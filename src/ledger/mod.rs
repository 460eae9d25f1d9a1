//! Ledger module containing the exchange, transfer, accrual and scheduling
//! operations plus the orchestrator that commits them

pub mod accrual;
pub mod core;
pub mod exchange;
pub mod schedule;
pub mod state;
pub mod transfer;

pub use accrual::*;
pub use self::core::*;
pub use exchange::*;
pub use schedule::*;
pub use transfer::*;
