use crate::error::CameraError;
use std::sync::Arc;

/// One decoded RGB8 frame, rows packed without padding.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }
}

/// Opens camera devices by index.
pub trait CameraBackend: Send + Sync {
    /// Open device `index` and request `resolution`. The device may deliver a
    /// different size; callers must use the frame's own dimensions.
    fn open(&self, index: u32, resolution: (u32, u32))
        -> Result<Box<dyn CameraDevice>, CameraError>;
}

/// An open camera. Dropping it releases the device.
pub trait CameraDevice: Send {
    /// Grab the most recent frame.
    fn read_frame(&mut self) -> Result<Frame, CameraError>;
}

/// Backend used when the binary is built without camera support.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBackend;

impl CameraBackend for UnavailableBackend {
    fn open(
        &self,
        index: u32,
        _resolution: (u32, u32),
    ) -> Result<Box<dyn CameraDevice>, CameraError> {
        Err(CameraError::DeviceOpen {
            index,
            details: "built without camera support".to_string(),
        })
    }
}

/// The platform camera backend.
pub fn system_backend() -> Arc<dyn CameraBackend> {
    #[cfg(all(feature = "camera", target_os = "linux"))]
    {
        Arc::new(super::pipeline::GstCameraBackend::new())
    }

    #[cfg(not(all(feature = "camera", target_os = "linux")))]
    {
        tracing::warn!("GStreamer camera backend is only available on Linux with the camera feature");
        Arc::new(UnavailableBackend)
    }
}
