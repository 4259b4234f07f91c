//! Core domain logic for the quote voting board.
//! This crate is the single source of truth for ballot and ranking invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
mod repo;
pub mod service;

pub use config::{BoardConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::ballot::{Ballot, BallotId, VoterIdentity, UNKNOWN_VOTER};
pub use model::page::{PageRequest, QuotePage, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
pub use model::quote::{NewQuote, Quote, QuoteId};
pub use model::tally::TallyMismatch;
pub use model::validation::ValidationError;
pub use service::board_service::{
    error_chain, BoardError, BoardResult, ErrorKind, QuoteBoard, StorageError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
