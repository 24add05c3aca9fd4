//! The fixed command table

use std::fmt;
use std::str::FromStr;

/// Every command the terminal understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Trade,
    Transfer,
    Balance,
    Address,
    Snake,
    Clear,
    Exit,
}

impl CommandName {
    /// Table order, also the order offered by completion
    pub const ALL: [CommandName; 7] = [
        CommandName::Trade,
        CommandName::Transfer,
        CommandName::Balance,
        CommandName::Address,
        CommandName::Snake,
        CommandName::Clear,
        CommandName::Exit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Trade => "trade",
            CommandName::Transfer => "transfer",
            CommandName::Balance => "balance",
            CommandName::Address => "address",
            CommandName::Snake => "snake",
            CommandName::Clear => "clear",
            CommandName::Exit => "exit",
        }
    }

    /// Reply to a command invoked with arguments
    pub fn usage_message(&self) -> String {
        format!(
            "{name} does not take additional arguments.\nusage: {name}",
            name = self.as_str()
        )
    }

    /// Commands whose name starts with `prefix`, in table order
    pub fn completions(prefix: &str) -> Vec<CommandName> {
        let prefix = prefix.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .filter(|c| c.as_str().starts_with(&prefix))
            .collect()
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        for command in CommandName::ALL {
            assert_eq!(command.as_str().parse::<CommandName>(), Ok(command));
        }
        assert!("sell".parse::<CommandName>().is_err());
    }

    #[test]
    fn test_usage_message() {
        assert_eq!(
            CommandName::Trade.usage_message(),
            "trade does not take additional arguments.\nusage: trade"
        );
    }

    #[test]
    fn test_completions() {
        assert_eq!(
            CommandName::completions("t"),
            vec![CommandName::Trade, CommandName::Transfer]
        );
        assert_eq!(CommandName::completions("").len(), 7);
        assert!(CommandName::completions("xyz").is_empty());
    }
}
