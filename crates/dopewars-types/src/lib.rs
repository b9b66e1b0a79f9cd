//! Shared type definitions for the Dope Wars turn engine.
//!
//! This crate is the single source of truth for the data carried between
//! the market, the turn orchestrator, and the binary. Types flow downstream
//! to `TypeScript` via `ts-rs` for client tooling.
//!
//! # Modules
//!
//! - [`ids`] -- Integer id wrappers for players, locations, and items
//! - [`enums`] -- Trade direction and the eleven turn events
//! - [`structs`] -- Market pools, user accounts, turn requests, and turn logs

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Direction, EventKind};
pub use ids::{ItemId, LocationId, TurnId, UserId};
pub use structs::{
    AmountTrail, MarketPool, NEUTRAL_FACTOR, RegionalAdjustment, TURN_LOG_FIELDS, TurnEvents,
    TurnFactors, TurnLog, TurnLogDecodeError, TurnRecord, TurnRequest, UserAccount,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Types carrying #[ts(export)] write their bindings to `bindings/`
        // relative to the crate root when exported here.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::UserId::export_all();
        let _ = crate::ids::LocationId::export_all();
        let _ = crate::ids::ItemId::export_all();
        let _ = crate::ids::TurnId::export_all();

        // Enums
        let _ = crate::enums::Direction::export_all();
        let _ = crate::enums::EventKind::export_all();

        // Structs
        let _ = crate::structs::MarketPool::export_all();
        let _ = crate::structs::UserAccount::export_all();
        let _ = crate::structs::TurnRequest::export_all();
        let _ = crate::structs::TurnLog::export_all();
        let _ = crate::structs::TurnRecord::export_all();
        let _ = crate::structs::RegionalAdjustment::export_all();
    }
}
