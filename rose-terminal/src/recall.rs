//! Submitted-command recall

/// Submitted commands and a cursor walking back through them
///
/// The cursor counts back from the most recent entry; `None` means the user
/// is not recalling.
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    entries: Vec<String>,
    cursor: Option<usize>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted line and stop recalling
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        if !line.is_empty() {
            self.entries.push(line);
        }
        self.cursor = None;
    }

    /// Step to an older entry, saturating at the oldest
    ///
    /// Returns the text to place in the input, or `None` to leave it alone.
    pub fn older(&mut self) -> Option<&str> {
        let next = match self.cursor {
            None if self.entries.is_empty() => return None,
            None => 0,
            Some(c) if c + 1 < self.entries.len() => c + 1,
            Some(_) => return None,
        };
        self.cursor = Some(next);
        self.entry_at(next)
    }

    /// Step to a newer entry; stepping past the newest clears the input
    pub fn newer(&mut self) -> Option<&str> {
        match self.cursor {
            None => None,
            Some(0) => {
                self.cursor = None;
                Some("")
            }
            Some(c) => {
                self.cursor = Some(c - 1);
                self.entry_at(c - 1)
            }
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_at(&self, back: usize) -> Option<&str> {
        self.entries
            .len()
            .checked_sub(back + 1)
            .and_then(|i| self.entries.get(i))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recall_walks_back_and_saturates() {
        let mut history = CommandHistory::new();
        history.push("balance");
        history.push("address");

        assert_eq!(history.older(), Some("address"));
        assert_eq!(history.older(), Some("balance"));
        assert_eq!(history.older(), None);
        assert_eq!(history.cursor(), Some(1));
    }

    #[test]
    fn test_recall_forward_clears_input() {
        let mut history = CommandHistory::new();
        history.push("balance");
        history.push("address");

        history.older();
        history.older();
        assert_eq!(history.newer(), Some("address"));
        assert_eq!(history.newer(), Some(""));
        assert_eq!(history.cursor(), None);
        assert_eq!(history.newer(), None);
    }

    #[test]
    fn test_push_resets_cursor() {
        let mut history = CommandHistory::new();
        assert_eq!(history.older(), None);

        history.push("trade");
        history.older();
        history.push("exit");
        assert_eq!(history.cursor(), None);
        assert_eq!(history.older(), Some("exit"));
    }
}
