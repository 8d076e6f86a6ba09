use std::fmt;
use std::sync::Arc;

type ProgressHandler = Arc<dyn Fn(usize, usize) + Send + Sync>;
type LogHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Callbacks an execution reports through.
///
/// Both callbacks are optional. They are invoked from the executing task and
/// should return quickly.
#[derive(Clone, Default)]
pub struct Hooks {
    on_progress: Option<ProgressHandler>,
    on_log: Option<LogHandler>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per processed line with `(current_line, total_lines)`, 1-indexed.
    pub fn on_progress(mut self, f: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }

    /// Called for `REM` lines and unknown commands.
    pub fn on_log(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_log = Some(Arc::new(f));
        self
    }

    pub(crate) fn progress(&self, current: usize, total: usize) {
        if let Some(f) = &self.on_progress {
            f(current, total);
        }
    }

    pub(crate) fn log(&self, message: &str) {
        if let Some(f) = &self.on_log {
            f(message);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_progress", &self.on_progress.is_some())
            .field("on_log", &self.on_log.is_some())
            .finish()
    }
}
