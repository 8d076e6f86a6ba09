//! # duckhid
//!
//! A keystroke-injection script interpreter for USB HID gadget keyboards.
//!
//! duckhid reads a line-oriented script and turns it into timed 8-byte HID
//! boot-keyboard reports written to a gadget character device such as
//! `/dev/hidg0`. The host on the other end of the USB cable sees an ordinary
//! keyboard typing.
//!
//! ## Quick start
//!
//! ```no_run
//! use duckhid::Engine;
//!
//! #[tokio::main]
//! async fn main() {
//!     let script = "\
//! REM open the run dialog
//! GUI r
//! DELAY 300
//! STRING notepad
//! ENTER
//! ";
//!
//!     let mut engine = Engine::open("/dev/hidg0");
//!     let result = engine.execute(script).await;
//!     println!("{} lines, success: {}", result.lines_executed, result.success);
//! }
//! ```
//!
//! ## Script syntax
//!
//! Keywords are case-insensitive. Everything after the first run of whitespace
//! is the argument.
//!
//! Lines end at `\n`, `\r\n` or a bare `\r`. A terminator on the last line
//! does not add an empty line, so `"STRING a\n"` is one line and the progress
//! total is 1.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `STRING text` | Type `text` literally; characters with no key are skipped |
//! | `ENTER`, `TAB`, `ESC`, `F1`..`F12`, ... | Press a named key |
//! | `GUI r`, `CTRL c`, `ALT F4`, `SHIFT TAB` | Modifier plus key; a bare modifier taps it alone |
//! | `RCTRL`, `RALT`/`ALTGR` | Right-hand modifiers |
//! | `SHIFT GUI s` | Shift and GUI together |
//! | `CTRL-ALT DELETE`, `CTRL-SHIFT`, `ALT-SHIFT` | Two modifiers plus an optional key |
//! | `DELAY 500` | Pause for 500 ms |
//! | `DEFAULT_DELAY 50` | Pause 50 ms after every following line |
//! | `REPEAT 3` | Replay the last `STRING` or key command three more times |
//! | `RAW 0x02 0x04` | Send a raw modifier byte and keycode |
//! | `REM text` | Comment, forwarded to the log callback |
//!
//! ## Progress, logs and cancellation
//!
//! [`Hooks`] carries a progress callback and a log callback. Cancel a running
//! script through the token from [`Engine::cancel_token`]; the engine stops at
//! the next line boundary and reports `was_cancelled`.
//!
//! ```no_run
//! use duckhid::{Engine, Hooks};
//!
//! #[tokio::main]
//! async fn main() {
//!     let hooks = Hooks::new()
//!         .on_progress(|line, total| eprintln!("[{line}/{total}]"))
//!         .on_log(|msg| eprintln!("{msg}"));
//!     let mut engine = Engine::open("/dev/hidg0").with_hooks(hooks);
//!
//!     let stop = engine.cancel_token();
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         stop.cancel();
//!     });
//!
//!     let result = engine.execute("STRING hello\nREPEAT 10").await;
//!     assert!(result.success || result.was_cancelled);
//! }
//! ```
//!
//! ## Writing somewhere else
//!
//! [`HidKeyboard`] writes through the [`ReportSink`] trait. [`DeviceFile`] is
//! the gadget device; [`MemorySink`] records reports for inspection.

pub mod command;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod event;
pub mod hid;
pub mod keycodes;
pub mod parser;
pub mod report;
pub mod store;

pub use command::{Command, InterpreterState};
pub use dispatcher::Dispatcher;
pub use engine::{Engine, ExecutionResult, Outcome};
pub use error::{Error, Result};
pub use event::Hooks;
pub use hid::{DEFAULT_DEVICE_PATH, DeviceFile, HidKeyboard, MemorySink, ReportSink};
pub use parser::{Statement, parse_file, parse_line, parse_str};
pub use report::HidReport;
pub use store::{Script, ScriptStore};
