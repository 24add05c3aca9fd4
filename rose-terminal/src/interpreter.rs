//! Command interpreter - input line editing, recall, completion and dispatch

use rose_chain::{WalletHandle, WalletSession};
use rose_core::{
    format_amount, Glyph, HistoryEntry, Output, SupportedNetworks, CHANGE_NETWORK_MESSAGE,
};
use rose_services::SessionLog;
use tracing::debug;

use crate::commands::CommandName;
use crate::recall::CommandHistory;

pub const NOT_CONNECTED_MESSAGE: &str = "Please connect your wallet.";
pub const NO_WALLET_MESSAGE: &str = "No wallet connected.";
pub const INPUT_HINT: &str = "press tab to see options";

/// Key events the interpreter reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Tab,
    Escape,
    ArrowUp,
    ArrowDown,
    Backspace,
    Char(char),
}

/// Sub-panel opened by a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Trade,
    Transfer,
}

/// Open completion surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    options: Vec<CommandName>,
    selected: usize,
}

impl Completion {
    fn for_prefix(prefix: &str) -> Self {
        Self {
            options: CommandName::completions(prefix),
            selected: 0,
        }
    }

    pub fn options(&self) -> &[CommandName] {
        &self.options
    }

    pub fn selected(&self) -> Option<CommandName> {
        self.options.get(self.selected).copied()
    }

    fn select_next(&mut self) {
        if !self.options.is_empty() {
            self.selected = (self.selected + 1) % self.options.len();
        }
    }

    fn select_previous(&mut self) {
        if !self.options.is_empty() {
            self.selected = (self.selected + self.options.len() - 1) % self.options.len();
        }
    }
}

/// What a handler asks the interpreter to do besides printing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    None,
    OpenPanel(PanelKind),
    StartSnake,
    ClearLog,
    Close,
}

/// The terminal's command line and output log
pub struct CommandInterpreter {
    wallet: WalletHandle,
    networks: SupportedNetworks,
    session_log: SessionLog,
    history: Vec<HistoryEntry>,
    recall: CommandHistory,
    input: String,
    show_hint: bool,
    completion: Option<Completion>,
    panel: Option<PanelKind>,
    snake_running: bool,
    closed: bool,
    clears: u64,
}

impl CommandInterpreter {
    pub fn new(wallet: WalletHandle, networks: SupportedNetworks, session_log: SessionLog) -> Self {
        Self {
            wallet,
            networks,
            session_log,
            history: Vec::new(),
            recall: CommandHistory::new(),
            input: String::new(),
            show_hint: true,
            completion: None,
            panel: None,
            snake_running: false,
            closed: false,
            clears: 0,
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn recall(&self) -> &CommandHistory {
        &self.recall
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.show_hint = self.input.is_empty();
    }

    /// Hint shown under an empty input
    pub fn input_hint(&self) -> Option<&'static str> {
        self.show_hint.then_some(INPUT_HINT)
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    pub fn active_panel(&self) -> Option<PanelKind> {
        self.panel
    }

    pub fn close_panel(&mut self) {
        self.panel = None;
    }

    pub fn snake_running(&self) -> bool {
        self.snake_running
    }

    pub fn end_snake(&mut self) {
        self.snake_running = false;
    }

    /// Times the log has been cleared; renderers restart when it changes
    pub fn clear_count(&self) -> u64 {
        self.clears
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Keys are ignored while a panel or the game owns the screen
    pub fn input_enabled(&self) -> bool {
        self.panel.is_none() && !self.snake_running && !self.closed
    }

    /// Move results from background transactions into the history
    pub fn drain_session_log(&mut self) -> usize {
        let entries = self.session_log.drain();
        let count = entries.len();
        self.history
            .extend(entries.into_iter().map(HistoryEntry::Output));
        count
    }

    // ========================================================================
    // Keys
    // ========================================================================

    pub fn handle_key(&mut self, key: Key) {
        if !self.input_enabled() {
            return;
        }

        match key {
            Key::Enter => {
                if let Some(selected) = self.completion.take().and_then(|c| c.selected()) {
                    self.input = selected.as_str().to_string();
                    self.show_hint = false;
                    return;
                }
                let line = std::mem::take(&mut self.input);
                self.submit_line(&line);
            }
            Key::Tab => match self.completion.as_mut() {
                Some(completion) => completion.select_next(),
                None => self.completion = Some(Completion::for_prefix(&self.input)),
            },
            Key::Escape => self.completion = None,
            Key::ArrowUp => match self.completion.as_mut() {
                Some(completion) => completion.select_previous(),
                None => {
                    if let Some(line) = self.recall.older() {
                        self.input = line.to_string();
                        self.show_hint = false;
                    }
                }
            },
            Key::ArrowDown => match self.completion.as_mut() {
                Some(completion) => completion.select_next(),
                None => {
                    if let Some(line) = self.recall.newer() {
                        self.input = line.to_string();
                        self.show_hint = self.input.is_empty();
                    }
                }
            },
            Key::Backspace => {
                self.input.pop();
                self.show_hint = self.input.is_empty();
                self.refilter();
            }
            Key::Char(c) => {
                self.input.push(c);
                self.show_hint = false;
                self.refilter();
            }
        }
    }

    fn refilter(&mut self) {
        if self.completion.is_some() {
            self.completion = Some(Completion::for_prefix(&self.input));
        }
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Echo and execute one line
    ///
    /// Blank lines are ignored. Never fails: every problem becomes an output
    /// entry.
    pub fn submit_line(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() {
            return;
        }

        self.recall.push(line);
        self.history.push(HistoryEntry::Command(line.to_string()));

        let mut tokens = line.split_whitespace();
        let name = tokens.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = tokens.collect();

        let (output, effect) = self.dispatch(&name, &args);
        debug!("Dispatched {} -> {:?}", name, effect);

        match effect {
            Effect::None => {}
            Effect::OpenPanel(panel) => self.panel = Some(panel),
            Effect::StartSnake => self.snake_running = true,
            Effect::ClearLog => {
                self.history.clear();
                self.clears += 1;
            }
            Effect::Close => self.closed = true,
        }

        if let Some(output) = output {
            self.history.push(HistoryEntry::Output(output));
        }

        self.input.clear();
        self.show_hint = true;
        self.completion = None;
    }

    fn dispatch(&self, name: &str, args: &[&str]) -> (Option<Output>, Effect) {
        let session = self.wallet.current();

        let Some(session) = session else {
            if name != CommandName::Exit.as_str() {
                return (Some(Output::error(NOT_CONNECTED_MESSAGE)), Effect::None);
            }
            return self.run(CommandName::Exit, args, None);
        };

        if !self.networks.allows(session.chain_id()) {
            return (Some(Output::error(CHANGE_NETWORK_MESSAGE)), Effect::None);
        }

        match name.parse::<CommandName>() {
            Ok(command) => self.run(command, args, Some(session.as_ref())),
            Err(()) => (
                Some(Output::error(format!("Command not found: {}", name))),
                Effect::None,
            ),
        }
    }

    fn run(
        &self,
        command: CommandName,
        args: &[&str],
        session: Option<&WalletSession>,
    ) -> (Option<Output>, Effect) {
        if !args.is_empty() {
            return (Some(Output::error(command.usage_message())), Effect::None);
        }

        match command {
            CommandName::Trade => (
                Some(Output::info("Opening trade interface...")),
                Effect::OpenPanel(PanelKind::Trade),
            ),
            CommandName::Transfer => (
                Some(Output::info("Opening transfer interface...")),
                Effect::OpenPanel(PanelKind::Transfer),
            ),
            CommandName::Balance => (Some(balance_output(session)), Effect::None),
            CommandName::Address => {
                let output = match session {
                    Some(session) => Output::plain(format!(
                        "Wallet address: {}",
                        session.address().to_checksum(None)
                    )),
                    None => Output::plain(NO_WALLET_MESSAGE),
                };
                (Some(output), Effect::None)
            }
            CommandName::Snake => (
                Some(Output::info("Starting Snake game...")),
                Effect::StartSnake,
            ),
            CommandName::Clear => (None, Effect::ClearLog),
            CommandName::Exit => (Some(Output::info("Closing terminal...")), Effect::Close),
        }
    }
}

fn balance_output(session: Option<&WalletSession>) -> Output {
    match session.and_then(|s| s.balances()) {
        Some(balances) => Output::plain(format!(
            "Current ETH balance: {}\nCurrent ROSE balance: {}",
            format_amount(balances.native),
            format_amount(balances.token)
        ))
        .glyph(Glyph::Token),
        None => Output::plain(NO_WALLET_MESSAGE),
    }
}

impl std::fmt::Debug for CommandInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandInterpreter")
            .field("connected", &self.wallet.is_connected())
            .field("history_len", &self.history.len())
            .field("input", &self.input)
            .field("panel", &self.panel)
            .field("closed", &self.closed)
            .finish()
    }
}
