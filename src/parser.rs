//! Line parser for keystroke-injection scripts.
//!
//! Each line is a keyword followed by optional arguments. [`parse_line`]
//! resolves a single line into a [`Statement`]; [`parse_str`] and
//! [`parse_file`] check a whole script up front without touching a device.

use crate::command::Command;
use crate::error::{Error, Result};
use crate::keycodes::{self, KEY_NONE, MOD_NONE};
use crate::keycodes::{
    MOD_LEFT_ALT, MOD_LEFT_CTRL, MOD_LEFT_GUI, MOD_LEFT_SHIFT, MOD_RIGHT_ALT, MOD_RIGHT_CTRL,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// An empty or whitespace-only line.
    Blank,
    /// A command with a device or timing effect.
    Run(Command),
    /// `DEFAULT_DELAY ms`
    SetDefaultDelay(u64),
    /// `REM text`
    Rem(String),
    /// `REPEAT n`
    Repeat(u64),
    /// A keyword with no registry entry, upper-cased.
    Unknown(String),
}

/// What a keyword does, independent of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    String,
    Delay,
    DefaultDelay,
    /// One or more modifiers held together, optionally with a named key.
    Modifier(u8),
    /// `SHIFT`, which also understands `SHIFT GUI <key>`.
    Shift,
    /// A fixed key with no modifier.
    Key(u8),
    Rem,
    Repeat,
    Raw,
}

static KEYWORDS: &[(&str, Keyword)] = &[
    ("STRING", Keyword::String),
    ("DELAY", Keyword::Delay),
    ("DEFAULT_DELAY", Keyword::DefaultDelay),
    ("DEFAULTDELAY", Keyword::DefaultDelay),
    ("REM", Keyword::Rem),
    ("REPEAT", Keyword::Repeat),
    ("RAW", Keyword::Raw),
    // Modifiers
    ("GUI", Keyword::Modifier(MOD_LEFT_GUI)),
    ("WINDOWS", Keyword::Modifier(MOD_LEFT_GUI)),
    ("CTRL", Keyword::Modifier(MOD_LEFT_CTRL)),
    ("CONTROL", Keyword::Modifier(MOD_LEFT_CTRL)),
    ("RCTRL", Keyword::Modifier(MOD_RIGHT_CTRL)),
    ("RCONTROL", Keyword::Modifier(MOD_RIGHT_CTRL)),
    ("RIGHT-CTRL", Keyword::Modifier(MOD_RIGHT_CTRL)),
    ("RIGHT-CONTROL", Keyword::Modifier(MOD_RIGHT_CTRL)),
    ("ALT", Keyword::Modifier(MOD_LEFT_ALT)),
    ("RALT", Keyword::Modifier(MOD_RIGHT_ALT)),
    ("RIGHT-ALT", Keyword::Modifier(MOD_RIGHT_ALT)),
    ("ALTGR", Keyword::Modifier(MOD_RIGHT_ALT)),
    ("SHIFT", Keyword::Shift),
    ("CTRL-ALT", Keyword::Modifier(MOD_LEFT_CTRL | MOD_LEFT_ALT)),
    ("CTRL-SHIFT", Keyword::Modifier(MOD_LEFT_CTRL | MOD_LEFT_SHIFT)),
    ("ALT-SHIFT", Keyword::Modifier(MOD_LEFT_ALT | MOD_LEFT_SHIFT)),
    // Named keys
    ("ENTER", Keyword::Key(keycodes::KEY_ENTER)),
    ("RETURN", Keyword::Key(keycodes::KEY_ENTER)),
    ("DOWNARROW", Keyword::Key(keycodes::KEY_DOWN_ARROW)),
    ("DOWN", Keyword::Key(keycodes::KEY_DOWN_ARROW)),
    ("UPARROW", Keyword::Key(keycodes::KEY_UP_ARROW)),
    ("UP", Keyword::Key(keycodes::KEY_UP_ARROW)),
    ("LEFTARROW", Keyword::Key(keycodes::KEY_LEFT_ARROW)),
    ("LEFT", Keyword::Key(keycodes::KEY_LEFT_ARROW)),
    ("RIGHTARROW", Keyword::Key(keycodes::KEY_RIGHT_ARROW)),
    ("RIGHT", Keyword::Key(keycodes::KEY_RIGHT_ARROW)),
    ("TAB", Keyword::Key(keycodes::KEY_TAB)),
    ("SPACE", Keyword::Key(keycodes::KEY_SPACE)),
    ("BACKSPACE", Keyword::Key(keycodes::KEY_BACKSPACE)),
    ("DELETE", Keyword::Key(keycodes::KEY_DELETE)),
    ("INSERT", Keyword::Key(keycodes::KEY_INSERT)),
    ("HOME", Keyword::Key(keycodes::KEY_HOME)),
    ("END", Keyword::Key(keycodes::KEY_END)),
    ("PAGEUP", Keyword::Key(keycodes::KEY_PAGE_UP)),
    ("PAGEDOWN", Keyword::Key(keycodes::KEY_PAGE_DOWN)),
    ("ESC", Keyword::Key(keycodes::KEY_ESCAPE)),
    ("ESCAPE", Keyword::Key(keycodes::KEY_ESCAPE)),
    ("PAUSE", Keyword::Key(keycodes::KEY_PAUSE)),
    ("BREAK", Keyword::Key(keycodes::KEY_PAUSE)),
    ("CAPSLOCK", Keyword::Key(keycodes::KEY_CAPS_LOCK)),
    ("NUMLOCK", Keyword::Key(keycodes::KEY_NUM_LOCK)),
    ("SCROLLLOCK", Keyword::Key(keycodes::KEY_SCROLL_LOCK)),
    ("PRINTSCREEN", Keyword::Key(keycodes::KEY_PRINT_SCREEN)),
    ("MENU", Keyword::Key(keycodes::KEY_MENU)),
    ("APP", Keyword::Key(keycodes::KEY_MENU)),
    ("F1", Keyword::Key(keycodes::KEY_F1)),
    ("F2", Keyword::Key(keycodes::KEY_F2)),
    ("F3", Keyword::Key(keycodes::KEY_F3)),
    ("F4", Keyword::Key(keycodes::KEY_F4)),
    ("F5", Keyword::Key(keycodes::KEY_F5)),
    ("F6", Keyword::Key(keycodes::KEY_F6)),
    ("F7", Keyword::Key(keycodes::KEY_F7)),
    ("F8", Keyword::Key(keycodes::KEY_F8)),
    ("F9", Keyword::Key(keycodes::KEY_F9)),
    ("F10", Keyword::Key(keycodes::KEY_F10)),
    ("F11", Keyword::Key(keycodes::KEY_F11)),
    ("F12", Keyword::Key(keycodes::KEY_F12)),
];

/// Keyword lookup, built on first use.
///
/// To add a command, add one entry to [`KEYWORDS`].
static REGISTRY: LazyLock<HashMap<&'static str, Keyword>> =
    LazyLock::new(|| KEYWORDS.iter().copied().collect());

/// Split a script into lines at `\r\n`, `\n` or a bare `\r`.
///
/// A terminator at the very end does not start another line.
pub fn script_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = content;
    while let Some(end) = rest.find(['\r', '\n']) {
        lines.push(&rest[..end]);
        let width = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + width..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}

/// Parse one script line.
///
/// The line is trimmed and split at the first run of whitespace. The keyword
/// is matched case-insensitively; the arguments are kept as written.
///
/// # Errors
///
/// Only `RAW` can fail, when an argument is missing or not a number.
pub fn parse_line(line: &str) -> Result<Statement> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Statement::Blank);
    }

    let (name, args) = match line.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim_start()),
        None => (line, ""),
    };
    let name = name.to_uppercase();

    let Some(&keyword) = REGISTRY.get(name.as_str()) else {
        return Ok(Statement::Unknown(name));
    };

    let statement = match keyword {
        Keyword::String => Statement::Run(Command::Text(args.to_string())),
        Keyword::Delay => Statement::Run(Command::Delay(parse_millis(args))),
        Keyword::DefaultDelay => Statement::SetDefaultDelay(parse_millis(args)),
        Keyword::Modifier(modifiers) => Statement::Run(chord(modifiers, args)),
        Keyword::Shift => Statement::Run(shift_chord(args)),
        Keyword::Key(keycode) => Statement::Run(Command::KeyPress {
            modifiers: MOD_NONE,
            keycode,
        }),
        Keyword::Rem => Statement::Rem(args.to_string()),
        Keyword::Repeat => Statement::Repeat(parse_repeat_count(args)),
        Keyword::Raw => Statement::Run(parse_raw(args)?),
    };
    Ok(statement)
}

/// Parse every line of a script, stopping at the first malformed one.
///
/// # Errors
///
/// Returns [`Error::Parse`] prefixed with the 1-indexed line number.
///
/// # Example
///
/// ```
/// use duckhid::parse_str;
///
/// let statements = parse_str("REM open a terminal\nCTRL-ALT t\nSTRING ls\nENTER\n").unwrap();
/// assert_eq!(statements.len(), 4);
/// ```
pub fn parse_str(content: &str) -> Result<Vec<Statement>> {
    script_lines(content)
        .into_iter()
        .enumerate()
        .map(|(idx, line)| {
            parse_line(line).map_err(|e| Error::Parse(format!("Line {}: {}", idx + 1, e)))
        })
        .collect()
}

/// Read a script file and parse it with [`parse_str`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<Statement>> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parse an integer literal, either decimal (`4`) or hexadecimal (`0x04`).
pub fn parse_number(s: &str) -> Result<u8> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| Error::Parse(format!("Invalid byte value in RAW: '{s}'")))
}

/// Milliseconds argument for `DELAY` and `DEFAULT_DELAY`. Anything that is not
/// a non-negative integer counts as zero.
fn parse_millis(args: &str) -> u64 {
    args.trim().parse().unwrap_or(0)
}

/// `REPEAT` count. Non-numeric counts mean once, negative counts mean never.
fn parse_repeat_count(args: &str) -> u64 {
    args.trim()
        .parse::<i64>()
        .map(|n| n.max(0) as u64)
        .unwrap_or(1)
}

fn chord(modifiers: u8, args: &str) -> Command {
    let keycode = if args.is_empty() {
        KEY_NONE
    } else {
        keycodes::name_to_key(args)
    };
    Command::KeyPress { modifiers, keycode }
}

fn shift_chord(args: &str) -> Command {
    let (first, rest) = match args.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, Some(rest)),
        None => (args, None),
    };
    if first.eq_ignore_ascii_case("WINDOWS") || first.eq_ignore_ascii_case("GUI") {
        chord(MOD_LEFT_SHIFT | MOD_LEFT_GUI, rest.unwrap_or("").trim())
    } else {
        chord(MOD_LEFT_SHIFT, args)
    }
}

fn parse_raw(args: &str) -> Result<Command> {
    let Some((modifier, keycode)) = args.trim().split_once(char::is_whitespace) else {
        return Err(Error::Parse(
            "RAW requires two arguments: modifier and keycode (e.g. RAW 0 4 or RAW 0x02 0x04)"
                .to_string(),
        ));
    };
    Ok(Command::KeyPress {
        modifiers: parse_number(modifier)?,
        keycode: parse_number(keycode)?,
    })
}
