//! Writing keyboard reports to a HID gadget device.
//!
//! [`HidKeyboard`] turns keystrokes into press/release report pairs and hands
//! them to a [`ReportSink`]. The production sink is [`DeviceFile`], which
//! writes to a character device such as `/dev/hidg0`; [`MemorySink`] captures
//! reports in memory instead.

use crate::error::{Error, Result};
use crate::keycodes::{self, KEY_NONE};
use crate::report::HidReport;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;
use tracing::trace;

/// Default device path of the first configured USB HID gadget function.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/hidg0";

/// How long a press report is held before the release, and the release before the next press.
pub const SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Destination for keyboard reports. Each call writes exactly one report.
#[async_trait]
pub trait ReportSink: Send {
    async fn write_report(&mut self, report: HidReport) -> Result<()>;

    /// The device path this sink writes to, if it is backed by one.
    fn device_path(&self) -> Option<&Path> {
        None
    }
}

/// A HID gadget character device.
///
/// Every write opens the path, writes the 8 report bytes, flushes and closes
/// again. No handle is held between writes.
#[derive(Debug, Clone)]
pub struct DeviceFile {
    path: PathBuf,
}

impl DeviceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the device exists and can be opened for writing.
    ///
    /// This is a readiness probe only; the write path does its own error handling.
    pub fn is_available(&self) -> bool {
        self.path.exists()
            && std::fs::OpenOptions::new()
                .append(true)
                .open(&self.path)
                .is_ok()
    }
}

#[async_trait]
impl ReportSink for DeviceFile {
    async fn write_report(&mut self, report: HidReport) -> Result<()> {
        let bytes = report.as_bytes();
        trace!(path = %self.path.display(), ?bytes, "write report");

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| Error::device(&self.path, e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| Error::device(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| Error::device(&self.path, e))?;
        Ok(())
    }

    fn device_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Captures reports in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    reports: Arc<Mutex<Vec<HidReport>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every report written so far.
    pub fn reports(&self) -> Vec<HidReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The non-release reports, i.e. one entry per keystroke or chord.
    pub fn presses(&self) -> Vec<HidReport> {
        self.reports()
            .into_iter()
            .filter(|r| !r.is_release())
            .collect()
    }

    /// The raw byte stream as it would appear on the device.
    pub fn bytes(&self) -> Vec<u8> {
        self.reports().iter().flat_map(|r| r.as_bytes()).collect()
    }
}

#[async_trait]
impl ReportSink for MemorySink {
    async fn write_report(&mut self, report: HidReport) -> Result<()> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report);
        Ok(())
    }
}

/// An emulated keyboard writing to a [`ReportSink`].
///
/// Methods take `&mut self`, so one keyboard never interleaves the reports of
/// two keystrokes.
pub struct HidKeyboard<S> {
    sink: S,
    settle: Duration,
}

impl HidKeyboard<DeviceFile> {
    /// Keyboard writing to the device at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(DeviceFile::new(path))
    }
}

impl<S: ReportSink> HidKeyboard<S> {
    pub fn new(sink: S) -> Self {
        Self::with_settle(sink, SETTLE_DELAY)
    }

    /// Keyboard with a custom press/release hold time.
    pub fn with_settle(sink: S, settle: Duration) -> Self {
        Self { sink, settle }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Press and release one chord: `modifier` held with `keycode`.
    ///
    /// A `keycode` of [`KEY_NONE`] taps the modifiers alone.
    pub async fn send_key(&mut self, modifier: u8, keycode: u8) -> Result<()> {
        self.sink
            .write_report(HidReport::press(modifier, keycode))
            .await?;
        sleep(self.settle).await;
        self.sink.write_report(HidReport::release()).await?;
        sleep(self.settle).await;
        Ok(())
    }

    /// Type `text` one character at a time.
    ///
    /// Characters without a key mapping are skipped. Returns the number of
    /// keystrokes sent.
    pub async fn type_string(&mut self, text: &str) -> Result<usize> {
        let mut sent = 0;
        for ch in text.chars() {
            let (modifier, keycode) = keycodes::char_to_key(ch);
            if keycode == KEY_NONE {
                trace!(?ch, "no key mapping, skipped");
                continue;
            }
            self.send_key(modifier, keycode).await?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Write a single all-keys-up report.
    pub async fn release_all(&mut self) -> Result<()> {
        self.sink.write_report(HidReport::release()).await
    }
}
