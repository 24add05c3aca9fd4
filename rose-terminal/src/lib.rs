//! Rose Terminal - command interpreter and panels
//!
//! The binary in `main.rs` wires these to a line-oriented REPL; a graphical
//! front end drives the same interpreter through [`interpreter::Key`] events.

pub mod commands;
pub mod config;
pub mod interpreter;
pub mod panels;
pub mod recall;

pub use commands::CommandName;
pub use config::{ChainConfig, ConfigError, TerminalConfig};
pub use interpreter::{CommandInterpreter, Completion, Key, PanelKind};
pub use panels::{PanelContext, TradePanel, TransferPanel};
pub use recall::CommandHistory;
