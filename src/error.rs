//! Error types for the split ledger.

use crate::model::{GroupId, MemberId};
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while splitting, balancing, or storing group data.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to open, read, or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A monetary amount could not be parsed
    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },

    /// A monetary amount does not fit in the cent representation
    #[error("Amount {0} is out of range")]
    AmountOutOfRange(String),

    /// Member and weight lists have different lengths
    #[error("Got {members} members but {weights} weights")]
    LengthMismatch { members: usize, weights: usize },

    /// A weight below zero was supplied for a member
    #[error("Negative weight {weight} for member {member}")]
    NegativeWeight { member: MemberId, weight: String },

    /// Weights too large or too precise for exact apportionment
    #[error("Weights are out of range for exact allocation")]
    WeightOutOfRange,

    /// A record references a member that is not part of the group
    #[error("Unknown member {member} referenced by {record}")]
    UnknownMember { member: MemberId, record: String },

    /// The requested group does not exist in the store
    #[error("Group {0} not found")]
    GroupNotFound(GroupId),

    /// An expense draft failed validation
    #[error("Invalid expense: {0}")]
    InvalidExpense(String),

    /// A payment between members failed validation
    #[error("Invalid settlement: {0}")]
    InvalidSettlement(String),

    /// Settings file could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}
