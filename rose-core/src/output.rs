//! Output log entries
//!
//! Output is kept renderer-agnostic: text plus inline glyph tokens that a
//! rendering collaborator maps onto icons.

use serde::{Deserialize, Serialize};

/// Icon a renderer may draw inline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    NativeCoin,
    Token,
}

impl Glyph {
    /// Fallback symbol for plain-text renderers
    pub fn symbol(&self) -> &'static str {
        match self {
            Glyph::NativeCoin => "ETH",
            Glyph::Token => "🌹",
        }
    }
}

/// Glyph anchored at a byte offset in the output text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineToken {
    pub offset: usize,
    pub glyph: Glyph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Plain,
    Info,
    Pending,
    Success,
    Error,
}

/// A rendered result: `{kind, text, inline_tokens}`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Output {
    pub kind: OutputKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inline_tokens: Vec<InlineToken>,
}

impl Output {
    pub fn new(kind: OutputKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            inline_tokens: Vec::new(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Plain, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Info, text)
    }

    pub fn pending(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Pending, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(OutputKind::Error, text)
    }

    /// Append text after any glyphs already placed
    pub fn text(mut self, more: &str) -> Self {
        self.text.push_str(more);
        self
    }

    /// Anchor a glyph at the current end of the text
    pub fn glyph(mut self, glyph: Glyph) -> Self {
        self.inline_tokens.push(InlineToken {
            offset: self.text.len(),
            glyph,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.inline_tokens.is_empty()
    }

    /// Render with the given glyph mapping
    pub fn render_with<F>(&self, mut map: F) -> String
    where
        F: FnMut(Glyph) -> String,
    {
        let mut rendered = String::with_capacity(self.text.len() + self.inline_tokens.len() * 4);
        let mut cursor = 0;
        for token in &self.inline_tokens {
            let offset = token.offset.min(self.text.len());
            if offset >= cursor {
                rendered.push_str(&self.text[cursor..offset]);
                cursor = offset;
            }
            rendered.push_str(&map(token.glyph));
        }
        rendered.push_str(&self.text[cursor..]);
        rendered
    }

    /// Render glyphs with their plain-text symbols
    pub fn to_plain_string(&self) -> String {
        self.render_with(|glyph| glyph.symbol().to_string())
    }
}

impl From<&str> for Output {
    fn from(text: &str) -> Self {
        Output::plain(text)
    }
}

impl From<String> for Output {
    fn from(text: String) -> Self {
        Output::plain(text)
    }
}

// ============================================================================
// History
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Command,
    Output,
}

/// One item of the terminal's output log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum HistoryEntry {
    /// Echo of a submitted line
    Command(String),
    Output(Output),
}

impl HistoryEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            HistoryEntry::Command(_) => EntryKind::Command,
            HistoryEntry::Output(_) => EntryKind::Output,
        }
    }

    pub fn is_command(&self) -> bool {
        self.kind() == EntryKind::Command
    }
}
