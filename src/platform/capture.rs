//! Camera and landmark detector contracts
//!
//! The drawing core only sees these traits. Devices are opened once per
//! frame-loop run through a [`DeviceProvider`] and wrapped in RAII guards so
//! they are released on every exit path.

use std::ops::{Deref, DerefMut};

use thiserror::Error;

use crate::domain::landmarks::Hand;

/// Frame read errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Unable to receive webcam input: {0}")]
    ReadFailed(String),

    #[error("Frame source reached the end of its stream")]
    EndOfStream,
}

/// Device acquisition errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Failed to open camera: {0}")]
    CameraUnavailable(String),

    #[error("Failed to load hand landmark model: {0}")]
    DetectorUnavailable(String),
}

/// One camera frame: tightly packed RGB, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Position of this frame in the capture sequence
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Creates a black frame
    pub fn blank(index: u64, width: u32, height: u32) -> Self {
        Self {
            index,
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 3],
        }
    }

    /// True when the pixel buffer matches the dimensions
    pub fn is_well_formed(&self) -> bool {
        self.pixels.len() == self.width as usize * self.height as usize * 3
    }
}

/// Supplies camera frames at its own cadence
pub trait FrameSource: Send {
    /// Blocks until the next frame is available
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Releases the underlying device
    fn release(&mut self) {}
}

/// Detects hands in a frame
pub trait LandmarkSource: Send {
    /// Returns every detected hand; empty when none is visible
    fn detect(&mut self, frame: &Frame) -> Vec<Hand>;

    /// Releases the model context
    fn close(&mut self) {}
}

/// Opens devices for a frame-loop run
pub trait DeviceProvider: Send + Sync {
    fn open_camera(&self) -> Result<Box<dyn FrameSource>, DeviceError>;
    fn open_detector(&self) -> Result<Box<dyn LandmarkSource>, DeviceError>;
}

/// RAII wrapper releasing the camera when dropped
pub struct CameraGuard {
    source: Box<dyn FrameSource>,
}

impl CameraGuard {
    pub fn open(devices: &dyn DeviceProvider) -> Result<Self, DeviceError> {
        let source = devices.open_camera()?;
        log::info!("Camera acquired");
        Ok(Self { source })
    }
}

impl Deref for CameraGuard {
    type Target = dyn FrameSource;

    fn deref(&self) -> &Self::Target {
        self.source.as_ref()
    }
}

impl DerefMut for CameraGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.source.as_mut()
    }
}

impl Drop for CameraGuard {
    fn drop(&mut self) {
        self.source.release();
        log::info!("Camera released");
    }
}

/// RAII wrapper closing the landmark model when dropped
pub struct DetectorGuard {
    detector: Box<dyn LandmarkSource>,
}

impl DetectorGuard {
    pub fn open(devices: &dyn DeviceProvider) -> Result<Self, DeviceError> {
        let detector = devices.open_detector()?;
        log::debug!("Hand landmark model loaded");
        Ok(Self { detector })
    }
}

impl Deref for DetectorGuard {
    type Target = dyn LandmarkSource;

    fn deref(&self) -> &Self::Target {
        self.detector.as_ref()
    }
}

impl DerefMut for DetectorGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.detector.as_mut()
    }
}

impl Drop for DetectorGuard {
    fn drop(&mut self) {
        self.detector.close();
        log::debug!("Hand landmark model closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingCamera {
        released: Arc<AtomicUsize>,
    }

    impl FrameSource for CountingCamera {
        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            Ok(Frame::blank(0, 2, 2))
        }

        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct NoDetector;

    impl LandmarkSource for NoDetector {
        fn detect(&mut self, _frame: &Frame) -> Vec<Hand> {
            Vec::new()
        }
    }

    struct Devices {
        released: Arc<AtomicUsize>,
    }

    impl DeviceProvider for Devices {
        fn open_camera(&self) -> Result<Box<dyn FrameSource>, DeviceError> {
            Ok(Box::new(CountingCamera {
                released: Arc::clone(&self.released),
            }))
        }

        fn open_detector(&self) -> Result<Box<dyn LandmarkSource>, DeviceError> {
            Ok(Box::new(NoDetector))
        }
    }

    #[test]
    fn blank_frame_is_well_formed() {
        let frame = Frame::blank(3, 4, 5);
        assert_eq!(frame.pixels.len(), 60);
        assert!(frame.is_well_formed());
    }

    #[test]
    fn camera_guard_releases_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let devices = Devices {
            released: Arc::clone(&released),
        };

        {
            let mut camera = CameraGuard::open(&devices).unwrap();
            let mut detector = DetectorGuard::open(&devices).unwrap();
            let frame = camera.read_frame().unwrap();
            assert!(detector.detect(&frame).is_empty());
            assert_eq!(released.load(Ordering::SeqCst), 0);
        }

        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
