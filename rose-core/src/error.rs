//! Error types for the terminal

use thiserror::Error;

/// Terminal-wide error type
///
/// Every variant maps onto a recovery policy: user input and wallet state
/// errors become a formatted output line, balance errors block a transaction
/// before submission, transaction errors are classified at the orchestration
/// boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminalError {
    #[error("{0}")]
    UserInput(String),

    #[error("{0}")]
    WalletState(String),

    #[error("{0}")]
    Balance(String),

    #[error("{0}")]
    Transaction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TerminalError {
    pub fn user_input(msg: impl Into<String>) -> Self {
        TerminalError::UserInput(msg.into())
    }

    pub fn wallet_state(msg: impl Into<String>) -> Self {
        TerminalError::WalletState(msg.into())
    }

    pub fn balance(msg: impl Into<String>) -> Self {
        TerminalError::Balance(msg.into())
    }

    pub fn transaction(msg: impl Into<String>) -> Self {
        TerminalError::Transaction(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        TerminalError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        TerminalError::Internal(msg.into())
    }
}

/// Result type alias for terminal operations
pub type TerminalResult<T> = Result<T, TerminalError>;
