//! Recorded-session devices
//!
//! Replays a landmark recording in place of a live camera and detector. A
//! script is JSON Lines with one entry per frame:
//!
//! ```text
//! {"width": 640, "height": 480, "hand": [[0.5, 0.4, 0.0], ...]}
//! {"width": 640, "height": 480, "hand": null}
//! {"fail": "camera unplugged"}
//! ```
//!
//! Frames are blank; the detector returns the recorded hand for the frame's
//! index. The read position is shared by every camera the provider opens, so
//! reopening after a failure resumes where the previous camera stopped.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::landmarks::Hand;
use crate::platform::capture::{
    CaptureError, DeviceError, DeviceProvider, Frame, FrameSource, LandmarkSource,
};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read replay script {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid replay entry on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
    #[error("Replay entry on line {line} has a zero-sized frame")]
    EmptyFrame { line: usize },
}

/// One recorded frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplayEntry {
    Frame {
        width: u32,
        height: u32,
        #[serde(default)]
        hand: Option<Hand>,
    },
    Failure {
        fail: String,
    },
}

/// Parsed recording
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplayScript {
    entries: Vec<ReplayEntry>,
}

impl ReplayScript {
    pub fn new(entries: Vec<ReplayEntry>) -> Self {
        Self { entries }
    }

    /// Parses JSON Lines, skipping blank lines and `#` comments
    pub fn parse(content: &str) -> Result<Self, ReplayError> {
        let mut entries = Vec::new();
        for (i, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry: ReplayEntry = serde_json::from_str(line)
                .map_err(|source| ReplayError::Parse { line: i + 1, source })?;
            if let ReplayEntry::Frame { width, height, .. } = entry {
                if width == 0 || height == 0 {
                    return Err(ReplayError::EmptyFrame { line: i + 1 });
                }
            }
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let content = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let script = Self::parse(&content)?;
        log::info!("Loaded {} replay frames from {}", script.len(), path.display());
        Ok(script)
    }

    pub fn entries(&self) -> &[ReplayEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Device provider backed by a [`ReplayScript`]
#[derive(Debug, Clone)]
pub struct ReplayDevices {
    script: Arc<ReplayScript>,
    cursor: Arc<AtomicUsize>,
    frame_interval: Option<Duration>,
}

impl ReplayDevices {
    pub fn new(script: ReplayScript) -> Self {
        Self {
            script: Arc::new(script),
            cursor: Arc::new(AtomicUsize::new(0)),
            frame_interval: None,
        }
    }

    /// Paces frame reads like a camera running at a fixed rate
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    /// Number of entries consumed so far
    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl DeviceProvider for ReplayDevices {
    fn open_camera(&self) -> Result<Box<dyn FrameSource>, DeviceError> {
        if self.script.is_empty() {
            return Err(DeviceError::CameraUnavailable("replay script is empty".to_string()));
        }
        Ok(Box::new(ReplayCamera {
            script: Arc::clone(&self.script),
            cursor: Arc::clone(&self.cursor),
            frame_interval: self.frame_interval,
        }))
    }

    fn open_detector(&self) -> Result<Box<dyn LandmarkSource>, DeviceError> {
        Ok(Box::new(ReplayDetector {
            script: Arc::clone(&self.script),
        }))
    }
}

struct ReplayCamera {
    script: Arc<ReplayScript>,
    cursor: Arc<AtomicUsize>,
    frame_interval: Option<Duration>,
}

impl FrameSource for ReplayCamera {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        if let Some(interval) = self.frame_interval {
            thread::sleep(interval);
        }

        let position = self.cursor.fetch_add(1, Ordering::SeqCst);
        match self.script.entries.get(position) {
            Some(ReplayEntry::Frame { width, height, .. }) => {
                Ok(Frame::blank(position as u64, *width, *height))
            }
            Some(ReplayEntry::Failure { fail }) => Err(CaptureError::ReadFailed(fail.clone())),
            None => {
                // Park the cursor at the end so repeated reads stay exhausted
                self.cursor.store(self.script.len(), Ordering::SeqCst);
                Err(CaptureError::EndOfStream)
            }
        }
    }
}

struct ReplayDetector {
    script: Arc<ReplayScript>,
}

impl LandmarkSource for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Hand> {
        match self.script.entries.get(frame.index as usize) {
            Some(ReplayEntry::Frame { hand: Some(hand), .. }) => vec![hand.clone()],
            _ => Vec::new(),
        }
    }
}
