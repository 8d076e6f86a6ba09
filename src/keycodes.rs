//! USB HID keyboard usage codes and the lookup tables that map script text onto them.
//!
//! Two lookups are provided:
//!
//! - [`char_to_key`] resolves a literal character (as typed by `STRING`) to a
//!   `(modifier, keycode)` pair for a US layout.
//! - [`name_to_key`] resolves a key name (`ENTER`, `F5`, `a`, ...) to a keycode,
//!   ignoring case.
//!
//! Neither lookup fails. Anything without an entry resolves to [`KEY_NONE`],
//! which callers treat as "no keystroke".

/// No modifier held.
pub const MOD_NONE: u8 = 0x00;
pub const MOD_LEFT_CTRL: u8 = 0x01;
pub const MOD_LEFT_SHIFT: u8 = 0x02;
pub const MOD_LEFT_ALT: u8 = 0x04;
pub const MOD_LEFT_GUI: u8 = 0x08;
pub const MOD_RIGHT_CTRL: u8 = 0x10;
pub const MOD_RIGHT_SHIFT: u8 = 0x20;
pub const MOD_RIGHT_ALT: u8 = 0x40;
pub const MOD_RIGHT_GUI: u8 = 0x80;

/// Sentinel for "no key". Also the reserved usage `0x00` on the wire.
pub const KEY_NONE: u8 = 0x00;

pub const KEY_A: u8 = 0x04;
pub const KEY_B: u8 = 0x05;
pub const KEY_C: u8 = 0x06;
pub const KEY_D: u8 = 0x07;
pub const KEY_E: u8 = 0x08;
pub const KEY_F: u8 = 0x09;
pub const KEY_G: u8 = 0x0A;
pub const KEY_H: u8 = 0x0B;
pub const KEY_I: u8 = 0x0C;
pub const KEY_J: u8 = 0x0D;
pub const KEY_K: u8 = 0x0E;
pub const KEY_L: u8 = 0x0F;
pub const KEY_M: u8 = 0x10;
pub const KEY_N: u8 = 0x11;
pub const KEY_O: u8 = 0x12;
pub const KEY_P: u8 = 0x13;
pub const KEY_Q: u8 = 0x14;
pub const KEY_R: u8 = 0x15;
pub const KEY_S: u8 = 0x16;
pub const KEY_T: u8 = 0x17;
pub const KEY_U: u8 = 0x18;
pub const KEY_V: u8 = 0x19;
pub const KEY_W: u8 = 0x1A;
pub const KEY_X: u8 = 0x1B;
pub const KEY_Y: u8 = 0x1C;
pub const KEY_Z: u8 = 0x1D;

pub const KEY_1: u8 = 0x1E;
pub const KEY_2: u8 = 0x1F;
pub const KEY_3: u8 = 0x20;
pub const KEY_4: u8 = 0x21;
pub const KEY_5: u8 = 0x22;
pub const KEY_6: u8 = 0x23;
pub const KEY_7: u8 = 0x24;
pub const KEY_8: u8 = 0x25;
pub const KEY_9: u8 = 0x26;
pub const KEY_0: u8 = 0x27;

pub const KEY_ENTER: u8 = 0x28;
pub const KEY_ESCAPE: u8 = 0x29;
pub const KEY_BACKSPACE: u8 = 0x2A;
pub const KEY_TAB: u8 = 0x2B;
pub const KEY_SPACE: u8 = 0x2C;
pub const KEY_MINUS: u8 = 0x2D;
pub const KEY_EQUAL: u8 = 0x2E;
pub const KEY_LEFT_BRACKET: u8 = 0x2F;
pub const KEY_RIGHT_BRACKET: u8 = 0x30;
pub const KEY_BACKSLASH: u8 = 0x31;
pub const KEY_SEMICOLON: u8 = 0x33;
pub const KEY_QUOTE: u8 = 0x34;
pub const KEY_BACKTICK: u8 = 0x35;
pub const KEY_COMMA: u8 = 0x36;
pub const KEY_PERIOD: u8 = 0x37;
pub const KEY_SLASH: u8 = 0x38;
pub const KEY_CAPS_LOCK: u8 = 0x39;

pub const KEY_F1: u8 = 0x3A;
pub const KEY_F2: u8 = 0x3B;
pub const KEY_F3: u8 = 0x3C;
pub const KEY_F4: u8 = 0x3D;
pub const KEY_F5: u8 = 0x3E;
pub const KEY_F6: u8 = 0x3F;
pub const KEY_F7: u8 = 0x40;
pub const KEY_F8: u8 = 0x41;
pub const KEY_F9: u8 = 0x42;
pub const KEY_F10: u8 = 0x43;
pub const KEY_F11: u8 = 0x44;
pub const KEY_F12: u8 = 0x45;

pub const KEY_PRINT_SCREEN: u8 = 0x46;
pub const KEY_SCROLL_LOCK: u8 = 0x47;
pub const KEY_PAUSE: u8 = 0x48;
pub const KEY_INSERT: u8 = 0x49;
pub const KEY_HOME: u8 = 0x4A;
pub const KEY_PAGE_UP: u8 = 0x4B;
pub const KEY_DELETE: u8 = 0x4C;
pub const KEY_END: u8 = 0x4D;
pub const KEY_PAGE_DOWN: u8 = 0x4E;
pub const KEY_RIGHT_ARROW: u8 = 0x4F;
pub const KEY_LEFT_ARROW: u8 = 0x50;
pub const KEY_DOWN_ARROW: u8 = 0x51;
pub const KEY_UP_ARROW: u8 = 0x52;
pub const KEY_NUM_LOCK: u8 = 0x53;
pub const KEY_MENU: u8 = 0x65;

/// Keys addressable by name, in addition to single letters and digits.
static NAMED_KEYS: &[(&str, u8)] = &[
    ("ENTER", KEY_ENTER),
    ("RETURN", KEY_ENTER),
    ("ESCAPE", KEY_ESCAPE),
    ("ESC", KEY_ESCAPE),
    ("BACKSPACE", KEY_BACKSPACE),
    ("TAB", KEY_TAB),
    ("SPACE", KEY_SPACE),
    ("DELETE", KEY_DELETE),
    ("INSERT", KEY_INSERT),
    ("HOME", KEY_HOME),
    ("END", KEY_END),
    ("PAGEUP", KEY_PAGE_UP),
    ("PAGEDOWN", KEY_PAGE_DOWN),
    ("UP", KEY_UP_ARROW),
    ("UPARROW", KEY_UP_ARROW),
    ("DOWN", KEY_DOWN_ARROW),
    ("DOWNARROW", KEY_DOWN_ARROW),
    ("LEFT", KEY_LEFT_ARROW),
    ("LEFTARROW", KEY_LEFT_ARROW),
    ("RIGHT", KEY_RIGHT_ARROW),
    ("RIGHTARROW", KEY_RIGHT_ARROW),
    ("PAUSE", KEY_PAUSE),
    ("BREAK", KEY_PAUSE),
    ("CAPSLOCK", KEY_CAPS_LOCK),
    ("NUMLOCK", KEY_NUM_LOCK),
    ("SCROLLLOCK", KEY_SCROLL_LOCK),
    ("PRINTSCREEN", KEY_PRINT_SCREEN),
    ("MENU", KEY_MENU),
    ("APP", KEY_MENU),
    ("F1", KEY_F1),
    ("F2", KEY_F2),
    ("F3", KEY_F3),
    ("F4", KEY_F4),
    ("F5", KEY_F5),
    ("F6", KEY_F6),
    ("F7", KEY_F7),
    ("F8", KEY_F8),
    ("F9", KEY_F9),
    ("F10", KEY_F10),
    ("F11", KEY_F11),
    ("F12", KEY_F12),
];

/// Resolve a literal character to the `(modifier, keycode)` pair that types it.
///
/// Uppercase letters and the shifted symbols carry [`MOD_LEFT_SHIFT`].
/// Characters with no entry return `(MOD_NONE, KEY_NONE)`.
pub fn char_to_key(c: char) -> (u8, u8) {
    match c {
        'a'..='z' => (MOD_NONE, KEY_A + (c as u8 - b'a')),
        'A'..='Z' => (MOD_LEFT_SHIFT, KEY_A + (c as u8 - b'A')),
        '1'..='9' => (MOD_NONE, KEY_1 + (c as u8 - b'1')),
        '0' => (MOD_NONE, KEY_0),

        '!' => (MOD_LEFT_SHIFT, KEY_1),
        '@' => (MOD_LEFT_SHIFT, KEY_2),
        '#' => (MOD_LEFT_SHIFT, KEY_3),
        '$' => (MOD_LEFT_SHIFT, KEY_4),
        '%' => (MOD_LEFT_SHIFT, KEY_5),
        '^' => (MOD_LEFT_SHIFT, KEY_6),
        '&' => (MOD_LEFT_SHIFT, KEY_7),
        '*' => (MOD_LEFT_SHIFT, KEY_8),
        '(' => (MOD_LEFT_SHIFT, KEY_9),
        ')' => (MOD_LEFT_SHIFT, KEY_0),

        ' ' => (MOD_NONE, KEY_SPACE),
        '\t' => (MOD_NONE, KEY_TAB),
        '\n' => (MOD_NONE, KEY_ENTER),

        '-' => (MOD_NONE, KEY_MINUS),
        '_' => (MOD_LEFT_SHIFT, KEY_MINUS),
        '=' => (MOD_NONE, KEY_EQUAL),
        '+' => (MOD_LEFT_SHIFT, KEY_EQUAL),
        '[' => (MOD_NONE, KEY_LEFT_BRACKET),
        '{' => (MOD_LEFT_SHIFT, KEY_LEFT_BRACKET),
        ']' => (MOD_NONE, KEY_RIGHT_BRACKET),
        '}' => (MOD_LEFT_SHIFT, KEY_RIGHT_BRACKET),
        '\\' => (MOD_NONE, KEY_BACKSLASH),
        '|' => (MOD_LEFT_SHIFT, KEY_BACKSLASH),
        ';' => (MOD_NONE, KEY_SEMICOLON),
        ':' => (MOD_LEFT_SHIFT, KEY_SEMICOLON),
        '\'' => (MOD_NONE, KEY_QUOTE),
        '"' => (MOD_LEFT_SHIFT, KEY_QUOTE),
        '`' => (MOD_NONE, KEY_BACKTICK),
        '~' => (MOD_LEFT_SHIFT, KEY_BACKTICK),
        ',' => (MOD_NONE, KEY_COMMA),
        '<' => (MOD_LEFT_SHIFT, KEY_COMMA),
        '.' => (MOD_NONE, KEY_PERIOD),
        '>' => (MOD_LEFT_SHIFT, KEY_PERIOD),
        '/' => (MOD_NONE, KEY_SLASH),
        '?' => (MOD_LEFT_SHIFT, KEY_SLASH),

        _ => (MOD_NONE, KEY_NONE),
    }
}

/// Resolve a key name to its keycode, ignoring case and surrounding whitespace.
///
/// Accepts a single letter or digit (`a`, `Z`, `7`) or one of the named keys
/// (`ENTER`, `PAGEDOWN`, `F11`, ...). Unknown names return [`KEY_NONE`].
pub fn name_to_key(name: &str) -> u8 {
    let name = name.trim();

    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return char_to_key(c.to_ascii_lowercase()).1;
        }
        return KEY_NONE;
    }

    NAMED_KEYS
        .iter()
        .find(|(key_name, _)| key_name.eq_ignore_ascii_case(name))
        .map(|&(_, code)| code)
        .unwrap_or(KEY_NONE)
}
