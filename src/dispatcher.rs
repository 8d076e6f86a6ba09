//! Executes parsed script lines against a [`HidKeyboard`].

use crate::command::{Command, InterpreterState};
use crate::error::{Error, Result};
use crate::event::Hooks;
use crate::hid::{HidKeyboard, ReportSink};
use crate::parser::{self, Statement};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Interprets one script line at a time and tracks the interpreter state
/// (default delay and the command `REPEAT` replays).
pub struct Dispatcher<'a, S> {
    keyboard: &'a mut HidKeyboard<S>,
    state: InterpreterState,
    hooks: Hooks,
    cancel: CancellationToken,
}

impl<'a, S: ReportSink> Dispatcher<'a, S> {
    pub fn new(
        keyboard: &'a mut HidKeyboard<S>,
        hooks: Hooks,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            keyboard,
            state: InterpreterState::new(),
            hooks,
            cancel,
        }
    }

    pub fn state(&self) -> &InterpreterState {
        &self.state
    }

    /// Parse and execute a single script line.
    pub async fn dispatch(&mut self, line: &str) -> Result<()> {
        let statement = parser::parse_line(line)?;
        self.execute(statement).await
    }

    /// Execute an already parsed line.
    pub async fn execute(&mut self, statement: Statement) -> Result<()> {
        debug!(?statement, "dispatch");
        match statement {
            Statement::Blank => {}
            Statement::Run(command) => {
                self.state.record(command.clone());
                self.run_command(&command).await?;
            }
            Statement::SetDefaultDelay(ms) => {
                self.state.record(Command::Unsupported);
                self.state.set_default_delay_ms(ms);
            }
            Statement::Rem(text) => {
                info!(remark = %text, "REM");
                self.hooks.log(&format!("REM: {text}"));
            }
            Statement::Repeat(count) => self.repeat(count).await?,
            Statement::Unknown(name) => {
                warn!(command = %name, "unknown command");
                self.hooks.log(&format!("Unknown command: {name}"));
            }
        }
        Ok(())
    }

    /// Wait out the default delay, returning early if the execution is cancelled.
    pub async fn wait_default_delay(&self) {
        self.wait(self.state.default_delay()).await;
    }

    async fn run_command(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Text(text) => {
                self.keyboard.type_string(text).await?;
            }
            Command::KeyPress { modifiers, keycode } => {
                self.keyboard.send_key(*modifiers, *keycode).await?;
            }
            Command::Delay(ms) => self.wait(Duration::from_millis(*ms)).await,
            Command::Unsupported => {}
        }
        Ok(())
    }

    /// Replay the last actionable command `count` times.
    ///
    /// The wait after each iteration is not cut short by cancellation; a
    /// running `REPEAT` finishes before the next line observes it.
    async fn repeat(&mut self, count: u64) -> Result<()> {
        let Some(command) = self.state.last_actionable().cloned() else {
            return Err(Error::State(
                "Cannot repeat: no valid previous command".to_string(),
            ));
        };
        debug!(?command, count, "repeat");
        for _ in 0..count {
            self.run_command(&command).await?;
            sleep(self.state.default_delay()).await;
        }
        Ok(())
    }

    async fn wait(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::select! {
            _ = sleep(duration) => {}
            _ = self.cancel.cancelled() => {
                debug!("wait interrupted by cancellation");
            }
        }
    }
}
