//! The 8-byte USB HID boot-protocol keyboard report.
//!
//! ```text
//! Byte 0:   modifier bitmask (L Ctrl, L Shift, L Alt, L GUI, R Ctrl, R Shift, R Alt, R GUI)
//! Byte 1:   reserved, always 0x00
//! Byte 2-7: up to six simultaneous keycodes
//! ```
//!
//! Only the first keycode slot is ever populated here: every keystroke is one
//! keycode plus a modifier bitmask.

/// Report size in bytes.
pub const REPORT_SIZE: usize = 8;

/// A single keyboard report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HidReport {
    pub modifier: u8,
    pub keycode: u8,
}

impl HidReport {
    /// Report with `modifier` held and `keycode` pressed.
    pub const fn press(modifier: u8, keycode: u8) -> Self {
        Self { modifier, keycode }
    }

    /// Report with every key and modifier up.
    pub const fn release() -> Self {
        Self {
            modifier: 0,
            keycode: 0,
        }
    }

    /// Serialize to the wire layout.
    pub const fn as_bytes(&self) -> [u8; REPORT_SIZE] {
        [self.modifier, 0, self.keycode, 0, 0, 0, 0, 0]
    }

    /// Decode a report previously produced by [`as_bytes`](Self::as_bytes).
    ///
    /// Returns `None` for short buffers, a non-zero reserved byte, or any
    /// populated keycode slot beyond the first.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let bytes: &[u8; REPORT_SIZE] = data.get(..REPORT_SIZE)?.try_into().ok()?;
        if bytes[1] != 0 || bytes[3..].iter().any(|&b| b != 0) {
            return None;
        }
        Some(Self::press(bytes[0], bytes[2]))
    }

    pub fn is_release(&self) -> bool {
        *self == Self::release()
    }
}
