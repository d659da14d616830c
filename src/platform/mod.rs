//! Camera and landmark detector collaborators
//!
//! This module defines the device contracts the frame loop consumes and a
//! replay implementation that stands in for a live camera.

pub mod capture;
pub mod replay;

pub use capture::{
    CameraGuard, CaptureError, DetectorGuard, DeviceError, DeviceProvider, Frame, FrameSource,
    LandmarkSource,
};
pub use replay::{ReplayDevices, ReplayEntry, ReplayError, ReplayScript};
