//! The [`Command`] value type and the per-execution [`InterpreterState`].

use std::time::Duration;

/// An executed script command, as remembered by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Type the text literally, one character at a time.
    Text(String),
    /// Press and release one chord.
    KeyPress { modifiers: u8, keycode: u8 },
    /// Pause once for the given number of milliseconds.
    Delay(u64),
    /// A command that configures state rather than acting.
    Unsupported,
}

impl Command {
    /// Whether `REPEAT` can replay this command.
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Text(_) | Self::KeyPress { .. })
    }
}

/// Interpreter state owned by a single in-flight execution.
#[derive(Debug, Clone, Default)]
pub struct InterpreterState {
    default_delay_ms: u64,
    last_command: Option<Command>,
}

impl InterpreterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wait applied after every line and every `REPEAT` iteration.
    pub fn default_delay(&self) -> Duration {
        Duration::from_millis(self.default_delay_ms)
    }

    pub fn default_delay_ms(&self) -> u64 {
        self.default_delay_ms
    }

    pub fn set_default_delay_ms(&mut self, ms: u64) {
        self.default_delay_ms = ms;
    }

    /// Record the command a line executed. Non-actionable commands are stored
    /// as [`Command::Unsupported`] so they block a following `REPEAT`.
    pub fn record(&mut self, command: Command) {
        self.last_command = Some(if command.is_actionable() {
            command
        } else {
            Command::Unsupported
        });
    }

    pub fn last_command(&self) -> Option<&Command> {
        self.last_command.as_ref()
    }

    /// The command `REPEAT` would replay, if any.
    pub fn last_actionable(&self) -> Option<&Command> {
        self.last_command.as_ref().filter(|c| c.is_actionable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actionable_variants() {
        assert!(Command::Text("hi".into()).is_actionable());
        assert!(
            Command::KeyPress {
                modifiers: 0,
                keycode: 4
            }
            .is_actionable()
        );
        assert!(!Command::Delay(100).is_actionable());
        assert!(!Command::Unsupported.is_actionable());
    }

    #[test]
    fn test_record_masks_non_actionable() {
        let mut state = InterpreterState::new();
        assert!(state.last_actionable().is_none());

        state.record(Command::Text("hi".into()));
        assert_eq!(state.last_actionable(), Some(&Command::Text("hi".into())));

        state.record(Command::Delay(500));
        assert_eq!(state.last_command(), Some(&Command::Unsupported));
        assert!(state.last_actionable().is_none());
    }

    #[test]
    fn test_default_delay() {
        let mut state = InterpreterState::new();
        assert_eq!(state.default_delay(), Duration::ZERO);
        state.set_default_delay_ms(50);
        assert_eq!(state.default_delay(), Duration::from_millis(50));
        assert_eq!(state.default_delay_ms(), 50);
    }
}
