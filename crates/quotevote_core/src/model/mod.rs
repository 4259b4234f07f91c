//! Domain model for quotes and ballots.
//!
//! # Responsibility
//! - Define canonical data structures used by the board's business logic.
//! - Own input validation that must hold before anything is persisted.
//!
//! # Invariants
//! - Every quote is identified by a stable, never-reused `QuoteId`.
//! - A ballot is identified by its `(QuoteId, VoterIdentity)` pair.

pub mod ballot;
pub mod page;
pub mod quote;
pub mod tally;
pub mod validation;
