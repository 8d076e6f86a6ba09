//! The execution loop: runs a whole script line by line.

use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::event::Hooks;
use crate::hid::{DeviceFile, HidKeyboard, ReportSink};
use crate::parser;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Message reported for a cancelled execution.
pub const STOPPED_MESSAGE: &str = "Execution stopped";

/// How an execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
    Failed,
}

/// The result of one [`Engine::execute`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    /// Lines processed, including a line that failed.
    pub lines_executed: usize,
    pub error: Option<String>,
    pub was_cancelled: bool,
}

impl ExecutionResult {
    fn completed(lines: usize) -> Self {
        Self {
            success: true,
            lines_executed: lines,
            error: None,
            was_cancelled: false,
        }
    }

    fn cancelled(lines: usize) -> Self {
        Self {
            success: false,
            lines_executed: lines,
            error: Some(STOPPED_MESSAGE.to_string()),
            was_cancelled: true,
        }
    }

    fn failed(lines: usize, message: String) -> Self {
        Self {
            success: false,
            lines_executed: lines,
            error: Some(message),
            was_cancelled: false,
        }
    }

    pub fn outcome(&self) -> Outcome {
        if self.success {
            Outcome::Completed
        } else if self.was_cancelled {
            Outcome::Cancelled
        } else {
            Outcome::Failed
        }
    }
}

/// Device paths with an execution in flight.
static ACTIVE_DEVICES: LazyLock<Mutex<HashSet<PathBuf>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Exclusive claim on a device path, released on drop.
struct DeviceLease {
    path: PathBuf,
}

impl DeviceLease {
    fn acquire(path: &Path) -> Result<Self, Error> {
        let mut active = ACTIVE_DEVICES
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !active.insert(path.to_path_buf()) {
            return Err(Error::Busy(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        ACTIVE_DEVICES
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.path);
    }
}

/// Runs scripts against a keyboard.
///
/// Cancellation is cooperative: it is checked before each line, and the wait
/// between lines returns early once the token is cancelled. A keystroke that
/// has started always finishes with its release report.
pub struct Engine<S> {
    keyboard: HidKeyboard<S>,
    hooks: Hooks,
    cancel: CancellationToken,
}

impl Engine<DeviceFile> {
    /// Engine writing to the HID gadget device at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(HidKeyboard::open(path))
    }
}

impl<S: ReportSink> Engine<S> {
    pub fn new(keyboard: HidKeyboard<S>) -> Self {
        Self {
            keyboard,
            hooks: Hooks::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Use `token` to stop executions. A cancelled token stays cancelled, so
    /// pass a fresh one before reusing the engine.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that stops the current execution when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn keyboard_mut(&mut self) -> &mut HidKeyboard<S> {
        &mut self.keyboard
    }

    /// Execute `script` to completion, failure or cancellation.
    pub async fn execute(&mut self, script: &str) -> ExecutionResult {
        let _lease = match self.keyboard.sink().device_path().map(DeviceLease::acquire) {
            Some(Err(e)) => {
                warn!(error = %e, "execution rejected");
                return ExecutionResult::failed(0, e.to_string());
            }
            Some(Ok(lease)) => Some(lease),
            None => None,
        };

        let lines = parser::script_lines(script);
        let total = lines.len();
        info!(total, "execution started");

        let mut dispatcher =
            Dispatcher::new(&mut self.keyboard, self.hooks.clone(), self.cancel.clone());
        let mut executed = 0;

        for (idx, line) in lines.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(lines = executed, "execution stopped");
                return ExecutionResult::cancelled(executed);
            }

            let line_no = idx + 1;
            executed = line_no;
            if let Err(e) = dispatcher.dispatch(line).await {
                warn!(line = line_no, error = %e, "execution failed");
                return ExecutionResult::failed(executed, format!("Line {line_no}: {e}"));
            }

            self.hooks.progress(line_no, total);
            dispatcher.wait_default_delay().await;
        }

        info!(lines = total, "execution completed");
        ExecutionResult::completed(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::MemorySink;
    use crate::keycodes::{KEY_A, KEY_ENTER, KEY_H, KEY_I, MOD_LEFT_SHIFT};
    use crate::report::HidReport;
    use std::sync::Arc;
    use std::time::Duration;

    fn engine(sink: &MemorySink) -> Engine<MemorySink> {
        Engine::new(HidKeyboard::with_settle(sink.clone(), Duration::ZERO))
    }

    #[tokio::test]
    async fn test_completed() {
        let sink = MemorySink::new();
        let result = engine(&sink).execute("STRING hi\nREPEAT 3\n").await;
        assert_eq!(
            result,
            ExecutionResult {
                success: true,
                lines_executed: 2,
                error: None,
                was_cancelled: false,
            }
        );
        assert_eq!(result.outcome(), Outcome::Completed);
        assert_eq!(sink.presses().len(), 8);
    }

    #[tokio::test]
    async fn test_empty_script() {
        let result = engine(&MemorySink::new()).execute("").await;
        assert!(result.success);
        assert_eq!(result.lines_executed, 0);
    }

    #[tokio::test]
    async fn test_failure_reports_line() {
        let sink = MemorySink::new();
        let result = engine(&sink)
            .execute("STRING a\nREM ok\nRAW 0x02\nSTRING never")
            .await;
        assert_eq!(result.outcome(), Outcome::Failed);
        assert_eq!(result.lines_executed, 3);
        let error = result.error.unwrap();
        assert!(error.starts_with("Line 3: RAW requires"), "got: {error}");
        assert_eq!(sink.presses().len(), 1);
    }

    #[tokio::test]
    async fn test_repeat_first_fails_without_writing() {
        let sink = MemorySink::new();
        let result = engine(&sink).execute("REPEAT 2\nSTRING a").await;
        assert!(!result.success);
        assert!(!result.was_cancelled);
        assert_eq!(result.lines_executed, 1);
        assert_eq!(
            result.error.as_deref(),
            Some("Line 1: Cannot repeat: no valid previous command")
        );
        assert!(sink.reports().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_is_not_fatal() {
        let sink = MemorySink::new();
        let result = engine(&sink).execute("FOO bar\nSTRING A").await;
        assert!(result.success);
        assert_eq!(result.lines_executed, 2);
        assert_eq!(sink.presses(), vec![HidReport::press(MOD_LEFT_SHIFT, KEY_A)]);
    }

    #[tokio::test]
    async fn test_progress_reports_every_line() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_hook = seen.clone();
        let hooks = Hooks::new().on_progress(move |cur, total| {
            seen_in_hook.lock().unwrap().push((cur, total));
        });
        let result = engine(&MemorySink::new())
            .with_hooks(hooks)
            .execute("STRING a\n\nREM x")
            .await;
        assert!(result.success);
        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_cancel_between_lines() {
        let sink = MemorySink::new();
        let engine = engine(&sink);
        let token = engine.cancel_token();
        let hooks = Hooks::new().on_progress(move |cur, _| {
            if cur == 2 {
                token.cancel();
            }
        });
        let mut engine = engine.with_hooks(hooks);

        let result = engine
            .execute("STRING h\nSTRING i\nSTRING a\nSTRING b\nSTRING c")
            .await;
        assert_eq!(
            result,
            ExecutionResult {
                success: false,
                lines_executed: 2,
                error: Some(STOPPED_MESSAGE.to_string()),
                was_cancelled: true,
            }
        );
        let keys: Vec<u8> = sink.presses().iter().map(|r| r.keycode).collect();
        assert_eq!(keys, vec![KEY_H, KEY_I]);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let sink = MemorySink::new();
        let mut engine = engine(&sink);
        engine.cancel_token().cancel();
        let result = engine.execute("STRING a").await;
        assert_eq!(result.outcome(), Outcome::Cancelled);
        assert_eq!(result.lines_executed, 0);
        assert!(sink.reports().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_default_delay() {
        let sink = MemorySink::new();
        let engine = engine(&sink);
        let token = engine.cancel_token();
        let hooks = Hooks::new().on_progress(move |cur, _| {
            if cur == 2 {
                token.cancel();
            }
        });
        let mut engine = engine.with_hooks(hooks);

        let start = tokio::time::Instant::now();
        let result = engine
            .execute("DEFAULT_DELAY 600000\nSTRING a\nSTRING b")
            .await;
        assert!(result.was_cancelled);
        assert_eq!(result.lines_executed, 2);
        // One full default delay after line 1, the one after line 2 is cut short.
        assert!(start.elapsed() < Duration::from_secs(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_delay_between_lines() {
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let stamps_in_hook = stamps.clone();
        let hooks = Hooks::new().on_progress(move |_, _| {
            stamps_in_hook.lock().unwrap().push(tokio::time::Instant::now());
        });
        let result = engine(&MemorySink::new())
            .with_hooks(hooks)
            .execute("DEFAULT_DELAY 50\nSTRING a\nENTER\nTAB")
            .await;
        assert!(result.success);

        let stamps = stamps.lock().unwrap();
        for pair in stamps[1..].windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(50));
        }
    }

    #[tokio::test]
    async fn test_busy_device_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let _held = DeviceLease::acquire(file.path()).unwrap();

        let result = Engine::open(file.path()).execute("STRING a").await;
        assert_eq!(result.outcome(), Outcome::Failed);
        assert_eq!(result.lines_executed, 0);
        assert!(result.error.unwrap().contains("busy"));
        assert!(std::fs::read(file.path()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_device_error_carries_os_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-hidg");
        let result = Engine::open(&path).execute("STRING a").await;
        assert_eq!(result.lines_executed, 1);
        let error = result.error.unwrap();
        assert!(error.starts_with("Line 1: Failed to write to HID device"));
        assert!(error.contains("os error"), "got: {error}");
    }

    #[test]
    fn test_lease_released_on_drop() {
        let path = Path::new("/tmp/duckhid-lease-test");
        {
            let _lease = DeviceLease::acquire(path).unwrap();
            assert!(matches!(DeviceLease::acquire(path), Err(Error::Busy(_))));
        }
        assert!(DeviceLease::acquire(path).is_ok());
    }

    #[tokio::test]
    async fn test_keys_h_i_in_order() {
        let sink = MemorySink::new();
        engine(&sink).execute("STRING hi").await;
        let keys: Vec<u8> = sink.presses().iter().map(|r| r.keycode).collect();
        assert_eq!(keys, vec![KEY_H, KEY_I]);
    }

    #[tokio::test]
    async fn test_bare_cr_separates_lines() {
        let sink = MemorySink::new();
        let result = engine(&sink).execute("STRING hi\rENTER").await;
        assert!(result.success);
        assert_eq!(result.lines_executed, 2);
        let keys: Vec<u8> = sink.presses().iter().map(|r| r.keycode).collect();
        assert_eq!(keys, vec![KEY_H, KEY_I, KEY_ENTER]);
    }
}
